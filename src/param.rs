// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Web 服务器协议参数与常量模块
//!
//! 该模块定义了服务器遵循的 HTTP/1.0 协议子集相关常量，包括：
//! - 服务器支持的三种状态码及其原因短语（Reason Phrase）。
//! - 精简的 MIME 类型映射表。
//! - 端口、首页文件名、超时与线程池容量的默认值。

use std::collections::HashMap;
use std::time::Duration;

use lazy_static::lazy_static;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "WebServer";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 响应状态行使用的协议版本
pub const HTTP_VERSION: &str = "HTTP/1.0";

/// 请求中的版本记号只要以此开头，就会发送响应头
pub const HTTP_VERSION_PREFIX: &str = "HTTP";

/// 唯一支持的请求方法
pub const METHOD_GET: &str = "GET";

/// 未指定端口或端口无法解析时使用的端口
pub const DEFAULT_PORT: u16 = 8080;

/// 请求以 `/` 结尾时追加的默认文件名
pub const DEFAULT_INDEX_FILE_NAME: &str = "index.html";

/// 连接在交给处理器之前设置的无活动超时
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(3);

/// 工作池容量，即同时处理的连接数上限
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// 单个请求最多读取的字节数，超出部分不再读取
pub const MAX_REQUEST_BYTES: u64 = 64 * 1024;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "config/development.toml";

/// 默认日志配置文件路径
pub const DEFAULT_LOG_CONFIG_FILE: &str = "config/log4rs.yaml";

/// 扩展名无法识别时的 MIME 类型
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

lazy_static! {
    /// HTTP 状态码与其对应的原因短语映射表。
    ///
    /// 注意 404 使用的是 `File Not Found` 而非 RFC 中的 `Not Found`。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(200, "OK");
        map.insert(404, "File Not Found");
        map.insert(501, "Not Implemented");
        map
    };
}

lazy_static! {
    /// 文件后缀名到 MIME 类型（Media Type）的映射表。
    ///
    /// 匹配区分大小写，未出现在表中的后缀一律视为 `text/plain`。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("html", "text/html");
        map.insert("css", "text/css");
        map.insert("js", "text/javascript");
        map.insert("ico", "image/x-icon");
        map.insert("png", "image/png");
        map.insert("jpeg", "image/jpeg");
        map.insert("gif", "image/gif");
        map
    };
}

/// 单个连接的处理结果。
///
/// 处理器在关闭连接后返回该值，供日志与测试使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 未写出任何字节即关闭（空请求、畸形请求或无版本号的非 GET 请求）
    Silent,
    /// 返回了文件内容
    Ok,
    /// 文件不可读或位于文档根目录之外
    NotFound,
    /// 使用了 GET 以外的方法
    NotImplemented,
    /// 发生 I/O 错误或超时，连接被放弃，不保证写出了完整响应
    Abandoned,
}

impl Outcome {
    /// 对应的 HTTP 状态码，静默关闭时为 `None`
    pub fn status_code(&self) -> Option<u16> {
        match *self {
            Outcome::Silent | Outcome::Abandoned => None,
            Outcome::Ok => Some(200),
            Outcome::NotFound => Some(404),
            Outcome::NotImplemented => Some(501),
        }
    }
}

use std::fmt;

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code() {
            Some(code) => write!(f, "{}", code),
            None => write!(f, "-"),
        }
    }
}
