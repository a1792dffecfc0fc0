// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了 Web 服务器在启动与请求处理生命周期中可能出现的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了请求解析错误、传输层 I/O 错误以及启动配置错误。
//! - **作用域**：请求级异常只会导致当前连接被放弃；只有配置类异常会终止进程。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志。

use std::{fmt, io};

/// 服务器运行过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug)]
pub enum Exception {
    /// 请求缓冲区中没有任何记号，无法得到请求方法。连接会被静默关闭。
    EmptyRequest,
    /// GET 请求缺少请求目标。连接会被静默关闭。
    MissingTarget,
    /// 客户端在无活动超时时间内没有发送任何数据。
    ConnectionTimeout,
    /// 读写套接字或文件时发生的底层错误。
    Io(io::Error),
    /// 文档根目录不存在、不可访问或不是目录。这是致命的启动错误。
    InvalidDocumentRoot(String),
    /// 配置文件无法读取。
    ConfigUnreadable(String),
    /// 配置文件内容不是合法的 TOML，或字段类型不匹配。
    ConfigMalformed(String),
}

use Exception::*;

impl Exception {
    /// 该异常是否属于启动阶段的致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InvalidDocumentRoot(_) | ConfigUnreadable(_) | ConfigMalformed(_)
        )
    }
}

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyRequest => write!(f, "Request contains no tokens"),
            MissingTarget => write!(f, "GET request without a target"),
            ConnectionTimeout => write!(f, "Connection timed out waiting for the client"),
            Io(e) => write!(f, "I/O error: {}", e),
            InvalidDocumentRoot(msg) => write!(f, "Invalid document root: {}", msg),
            ConfigUnreadable(msg) => write!(f, "Couldn't read config file: {}", msg),
            ConfigMalformed(msg) => write!(f, "Malformed config file: {}", msg),
        }
    }
}

impl std::error::Error for Exception {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        Io(e)
    }
}
