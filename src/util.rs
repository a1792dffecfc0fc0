use chrono::{DateTime, Utc};
use log::debug;

use crate::param::{CRLF, DEFAULT_MIME_TYPE, MIME_TYPES, STATUS_CODES};

/// 错误页面生成器。
///
/// 生成的文档刻意保持极简，每一行都以 CRLF 结尾，与响应头的换行风格一致。
pub struct HtmlBuilder {
    title: String,
    body: String,
}

impl HtmlBuilder {
    pub fn from_status_code(code: u16) -> Self {
        let description = match STATUS_CODES.get(&code) {
            Some(d) => *d,
            None => "Unknown Status",
        };
        Self {
            title: description.to_string(),
            body: format!("<h1>Error {}: {}</h1>", code, description),
        }
    }

    pub fn build(&self) -> String {
        [
            "<html>",
            CRLF,
            "<head>",
            CRLF,
            "<title>",
            self.title.as_str(),
            "</title>",
            CRLF,
            "</head>",
            CRLF,
            "<body>",
            CRLF,
            self.body.as_str(),
            CRLF,
            "</body>",
            CRLF,
            "</html>",
            CRLF,
        ]
        .concat()
    }
}

/// 取请求目标中最后一个 `.` 之后的部分作为扩展名。
///
/// 没有 `.` 时返回 `None`；以 `.` 结尾时返回空串。
pub fn get_extension(target: &str) -> Option<&str> {
    target.rfind('.').map(|index| &target[index + 1..])
}

/// 根据请求目标推断 MIME 类型
pub fn get_mime(target: &str) -> &'static str {
    let mime = match get_extension(target) {
        Some(extension) => MIME_TYPES
            .get(extension)
            .copied()
            .unwrap_or(DEFAULT_MIME_TYPE),
        None => DEFAULT_MIME_TYPE,
    };
    debug!("{} 的MIME类型: {}", target, mime);
    mime
}

/// 按 RFC 1123 格式化 `Date` 头，例如 `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
