use crate::{
    exception::Exception,
    param::*,
    util::{format_date, get_mime, HtmlBuilder},
};

use bytes::Bytes;
use chrono::prelude::*;
use log::{debug, error};
use tokio::fs;

use std::path::Path;

/// HTTP/1.0 响应。
///
/// `with_headers` 为假时只发送响应体，对应请求没有携带 `HTTP*` 版本号的情况。
#[derive(Debug, Clone)]
pub struct Response {
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: Option<u64>,
    date: DateTime<Utc>,
    server_name: String,
    content: Option<Bytes>,
    with_headers: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: None,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            content: None,
            with_headers: true,
        }
    }

    /// 读取整个文件构造 200 响应。`target` 用于推断 MIME 类型。
    pub async fn from_file(
        path: &Path,
        target: &str,
        with_headers: bool,
        id: u128,
    ) -> Result<Self, Exception> {
        debug!("[ID{}]读取文件: {}", id, path.display());
        let contents = match fs::read(path).await {
            Ok(c) => c,
            Err(e) => {
                error!("[ID{}]无法读取文件{}。错误：{}", id, path.display(), e);
                return Err(e.into());
            }
        };

        let mut response = Self::new();
        response.content_length = Some(contents.len() as u64);
        debug!("[ID{}]Content-length: {}", id, contents.len());
        let content_type_str = get_mime(target).to_string();
        debug!("[ID{}]Content-type: {}", id, &content_type_str);
        response.content_type = Some(content_type_str);
        response.content = Some(Bytes::from(contents));
        response.with_headers = with_headers;
        Ok(response.set_date().set_code(200).to_owned())
    }

    /// 错误页面响应，不带 `Content-length` 头
    fn from_status_code(code: u16, with_headers: bool, id: u128) -> Self {
        let mut response = Self::new();
        let html = HtmlBuilder::from_status_code(code).build();
        debug!("[ID{}]生成{}错误页面，长度: {}", id, code, html.len());
        response.content = Some(Bytes::from(html));
        response.content_type = Some("text/html".to_string());
        response.with_headers = with_headers;
        response
    }

    fn set_date(&mut self) -> &mut Self {
        self.date = Utc::now();
        self
    }

    fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&info) => info.to_string(),
            None => {
                error!("非法的状态码：{}。这条错误说明代码编写出现了错误。", code);
                "Unknown Status".to_string()
            }
        };
        self
    }

    pub fn response_404(with_headers: bool, id: u128) -> Self {
        Self::from_status_code(404, with_headers, id)
            .set_date()
            .set_code(404)
            .to_owned()
    }

    pub fn response_501(with_headers: bool, id: u128) -> Self {
        Self::from_status_code(501, with_headers, id)
            .set_date()
            .set_code(501)
            .to_owned()
    }

    /// 序列化为线上字节。响应头各行以 CRLF 结尾，之后是一个空行和原样的响应体。
    pub fn as_bytes(&self) -> Vec<u8> {
        let content: &[u8] = match &self.content {
            Some(c) => c,
            None => b"",
        };
        if !self.with_headers {
            return content.to_vec();
        }

        let status_code: &str = &self.status_code.to_string();
        let date: &str = &format_date(&self.date);
        let header = [
            HTTP_VERSION,
            " ",
            status_code,
            " ",
            self.information.as_str(),
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            self.server_name.as_str(),
            CRLF,
            match self.content_length {
                Some(l) => ["Content-length: ", l.to_string().as_str(), CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            match &self.content_type {
                Some(t) => ["Content-type: ", t.as_str(), CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            CRLF,
        ]
        .concat();
        [header.as_bytes(), content].concat()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn with_headers(&self) -> bool {
        self.with_headers
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }
}
