// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责从连接中读取请求文本，并将其解析为 `Request` 结构体。
//!
//! 服务器不解释任何请求头：读取到的所有行被拼接成一个逻辑缓冲区，
//! 只有按空白切分后的前三个记号（方法、目标、版本）有意义。

use std::time::Duration;

use log::{debug, error};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time;

use crate::{exception::Exception, param::*};

/// 一次连接中解析出的请求。
///
/// 仅在处理单个连接期间存在，不会被复用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// 请求方法，原样保留大小写
    method: String,
    /// 请求目标（未经规范化）
    target: Option<String>,
    /// 协议版本记号
    version: Option<String>,
}

impl Request {
    /// 从拼接后的请求缓冲区解析请求。
    ///
    /// # 错误处理
    /// * 没有任何记号时返回 `Exception::EmptyRequest`。
    /// * GET 请求缺少目标时返回 `Exception::MissingTarget`。
    pub fn parse(buffer: &str, id: u128) -> Result<Self, Exception> {
        let mut tokens = buffer.split_whitespace();

        let method = match tokens.next() {
            Some(m) => m.to_string(),
            None => {
                error!("[ID{}]请求中没有任何记号", id);
                return Err(Exception::EmptyRequest);
            }
        };

        let target = tokens.next().map(str::to_string);
        if method == METHOD_GET && target.is_none() {
            error!("[ID{}]GET请求缺少请求目标", id);
            return Err(Exception::MissingTarget);
        }
        let version = tokens.next().map(str::to_string);

        Ok(Self {
            method,
            target,
            version,
        })
    }

    /// 从连接中读取请求文本。
    ///
    /// 逐行读取直到遇到空行或流结束，每次读取都受 `timeout` 约束。
    /// 各行之间以单个空格拼接，使行边界仍然是记号边界。
    /// 客户端在发送任何数据之前关闭连接时返回 `Ok(None)`。
    pub async fn read_from<R>(
        reader: &mut R,
        timeout: Duration,
        id: u128,
    ) -> Result<Option<String>, Exception>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut limited = reader.take(MAX_REQUEST_BYTES);
        let mut buffer = String::new();
        let mut line = Vec::new();
        let mut received_any = false;

        loop {
            line.clear();
            let n = match time::timeout(timeout, limited.read_until(b'\n', &mut line)).await {
                Ok(result) => result?,
                Err(_) => {
                    error!("[ID{}]等待客户端数据超时", id);
                    return Err(Exception::ConnectionTimeout);
                }
            };
            if n == 0 {
                break;
            }
            received_any = true;

            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(&['\r', '\n'][..]);
            if text.is_empty() {
                break;
            }
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(text);
        }

        if !received_any {
            debug!("[ID{}]客户端未发送任何数据即关闭连接", id);
            return Ok(None);
        }
        debug!("[ID{}]请求接收完毕：{}", id, buffer);
        Ok(Some(buffer))
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取请求方法
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 获取原始请求目标
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// 获取协议版本记号
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// 是否为唯一受支持的 GET 方法（区分大小写）
    pub fn is_get(&self) -> bool {
        self.method == METHOD_GET
    }

    /// 版本记号是否以 `HTTP` 开头。只有这种情况下才发送响应头。
    pub fn wants_headers(&self) -> bool {
        self.version
            .as_deref()
            .map_or(false, |v| v.starts_with(HTTP_VERSION_PREFIX))
    }
}
