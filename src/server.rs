//! # 连接分发器
//!
//! 持有监听套接字，接收新连接并把每个连接作为独立任务交给固定容量的工作池。
//!
//! - 工作池满时，接收循环会阻塞在获取许可上，而不是无限制地创建任务。
//! - 停机信号只停止接收新连接，正在处理的连接会被等待至完成。

use std::{
    future::Future,
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
    time::Duration,
};

use log::{debug, error, info};
use tokio::{net::TcpListener, sync::Semaphore, task::JoinSet, time};

use crate::{config::ServerConfig, exception::Exception, handler::handle_connection};

/// 接收连接失败（例如文件描述符耗尽）后的退避时间
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    config: Arc<ServerConfig>,
    listener: TcpListener,
    pool: Arc<Semaphore>,
}

impl Server {
    /// 按配置绑定监听地址：`local` 为真时只监听本地回环地址。
    pub async fn bind(config: ServerConfig) -> Result<Self, Exception> {
        let address = match config.local() {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        };
        let socket = SocketAddrV4::new(address, config.port());
        let listener = match TcpListener::bind(socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定端口：{}，错误：{}", config.port(), e);
                return Err(e.into());
            }
        };
        info!("服务端将在{}上监听Socket连接", socket);
        Ok(Self::from_listener(listener, config))
    }

    /// 使用已经绑定好的监听器，测试中常与 `127.0.0.1:0` 配合使用
    pub fn from_listener(listener: TcpListener, config: ServerConfig) -> Self {
        let pool = Arc::new(Semaphore::new(config.max_connections()));
        Self {
            config: Arc::new(config),
            listener,
            pool,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// # 主事件循环 (Accept Loop)
    ///
    /// 持续接收新连接，直到 `shutdown` 完成。返回前会等待所有在途连接处理完毕。
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), Exception>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();
        let mut id: u128 = 0;

        loop {
            // 先获取工作池许可，池满时在此等待
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("连接处理任务异常退出：{}", e);
                    }
                    continue;
                }
                permit = Arc::clone(&self.pool).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            let (stream, addr) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("接收连接失败：{}", e);
                        time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };
            debug!("[ID{}]新的连接：{}", id, addr);

            let config = Arc::clone(&self.config);
            tasks.spawn(async move {
                let _permit = permit;
                handle_connection(stream, &config, id).await
            });
            id += 1;
        }

        info!("停止接收新连接，等待{}个在途连接处理完毕", tasks.len());
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("连接处理任务异常退出：{}", e);
            }
        }
        info!("所有连接已处理完毕，服务端退出");
        Ok(())
    }
}
