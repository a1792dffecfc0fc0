// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接处理器
//!
//! 负责单个连接的完整生命周期：读取请求、解析请求行、解析路径、构建并发送响应，最后关闭连接。
//!
//! 处理器从不把错误抛给调用者。所有失败要么转换为 404/501 响应，
//! 要么记录日志后静默关闭连接，因此一个客户端的畸形请求不会影响其他连接。

use std::{fmt, time::Instant};

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{
    config::ServerConfig,
    exception::Exception,
    param::Outcome,
    request::Request,
    resolve::{normalize_target, ResolvedTarget},
    response::Response,
};

/// 单个连接的状态机。终态总是 `Closed`，连接不会被复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingRequestLine,
    MethodParsed,
    TargetResolving,
    Serving(u16),
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::AwaitingRequestLine => write!(f, "AwaitingRequestLine"),
            ConnectionState::MethodParsed => write!(f, "MethodParsed"),
            ConnectionState::TargetResolving => write!(f, "TargetResolving"),
            ConnectionState::Serving(code) => write!(f, "Serving{}", code),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

fn enter(state: ConnectionState, id: u128) {
    debug!("[ID{}]状态 -> {}", id, state);
}

/// # 连接处理入口
///
/// 接受任何可读写的字节流（生产环境中是 `TcpStream`，测试中是内存管道），
/// 执行完整的请求-响应流程后关闭流，并返回处理结果。
pub async fn handle_connection<S>(stream: S, config: &ServerConfig, id: u128) -> Outcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);
    let start_time = Instant::now();

    let outcome = match serve(&mut stream, config, id).await {
        Ok(outcome) => outcome,
        Err(e @ (Exception::EmptyRequest | Exception::MissingTarget)) => {
            warn!("[ID{}]畸形请求，静默关闭连接：{}", id, e);
            Outcome::Silent
        }
        Err(e) => {
            error!("[ID{}]处理连接时发生错误，放弃该连接：{}", id, e);
            Outcome::Abandoned
        }
    };

    if let Err(e) = stream.shutdown().await {
        debug!("[ID{}]关闭连接时出错：{}", id, e);
    }
    enter(ConnectionState::Closed, id);
    debug!(
        "[ID{}]连接处理完成，结果：{:?}，用时{}ms。",
        id,
        outcome,
        start_time.elapsed().as_millis()
    );
    outcome
}

async fn serve<S>(
    stream: &mut BufReader<S>,
    config: &ServerConfig,
    id: u128,
) -> Result<Outcome, Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // 1. 读取请求行
    enter(ConnectionState::AwaitingRequestLine, id);
    let buffer = match Request::read_from(stream, config.connection_timeout(), id).await? {
        Some(b) => b,
        None => return Ok(Outcome::Silent),
    };

    // 2. 解析方法、目标与版本
    let request = Request::parse(&buffer, id)?;
    enter(ConnectionState::MethodParsed, id);
    let with_headers = request.wants_headers();

    // 3. 方法分派：只支持 GET，其他方法不会触碰文件系统
    let (response, outcome, target) = if !request.is_get() {
        if !with_headers {
            warn!(
                "[ID{}]不支持的请求方法：{}，且没有版本号，静默关闭",
                id,
                request.method()
            );
            return Ok(Outcome::Silent);
        }
        warn!("[ID{}]不支持的请求方法：{}，返回501", id, request.method());
        (
            Response::response_501(true, id),
            Outcome::NotImplemented,
            request.target().unwrap_or("").to_string(),
        )
    } else {
        // 4. 目标规范化与路径解析
        let target = normalize_target(
            request.target().unwrap_or(""),
            config.default_file_name(),
        );
        enter(ConnectionState::TargetResolving, id);
        let resolved = ResolvedTarget::resolve(config.document_root(), &target, id).await;

        if resolved.is_servable() {
            let response =
                Response::from_file(resolved.absolute_path(), &target, with_headers, id).await?;
            (response, Outcome::Ok, target)
        } else {
            warn!("[ID{}]请求的路径：{} 无法访问，返回404", id, &target);
            (Response::response_404(with_headers, id), Outcome::NotFound, target)
        }
    };
    enter(ConnectionState::Serving(response.status_code()), id);

    // 5. 发送响应
    let response_bytes = response.as_bytes();
    debug!("[ID{}]发送全量响应，长度: {}", id, response_bytes.len());
    stream.write_all(&response_bytes).await?;
    stream.flush().await?;

    info!(
        "[ID{}] {}, {}, {}, {}, {}",
        id,
        request.method(),
        target,
        request.version().unwrap_or("-"),
        response.status_code(),
        response.information(),
    );
    Ok(outcome)
}
