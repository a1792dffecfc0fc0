// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP/1.0 静态文件服务器
//!
//! 该程序基于 Tokio 运行时，对每个连接执行一次“请求行 → 文件 → 响应”的处理流程。
//! 核心功能包括：
//! - 三层配置：内置默认值、TOML 配置文件、命令行位置参数
//! - 基于 log4rs 的日志系统，配置文件缺失时回退到控制台输出
//! - 固定容量的工作池与可取消的主事件循环（Ctrl-C 停止接收新连接）

use clap::{CommandFactory, Parser};
use log::{error, info, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use tokio::runtime::Builder;

use std::process;

use webserver::{param::DEFAULT_LOG_CONFIG_FILE, Cli, Exception, Server, ServerConfig};

/// # 程序入口点
///
/// 初始化日志、加载配置、构建运行时并启动主事件循环。
fn main() {
    // 1. 初始化日志系统：优先使用外部 YAML 配置
    init_logging();

    // 2. 配置加载：默认值 -> 配置文件 -> 命令行
    let cli = Cli::parse();
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => show_error(&e),
    };
    info!("配置文件已载入");
    info!("document root: {}", config.document_root().display());
    info!("default file: {}", config.default_file_name());

    // 3. 异步运行时定制：根据配置文件动态分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => show_error(&e.into()),
    };
    info!(
        "工作线程数：{}，工作池容量：{}",
        config.worker_threads(),
        config.max_connections()
    );

    // 4. 绑定端口并运行，直到收到 Ctrl-C
    let result = runtime.block_on(async move {
        let server = Server::bind(config).await?;
        server.run_until(shutdown_signal()).await
    });
    if let Err(e) = result {
        show_error(&e);
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("收到停机信号，停止接收新连接..."),
        Err(e) => {
            error!("无法监听停机信号：{}，服务器将持续运行", e);
            std::future::pending::<()>().await;
        }
    }
}

fn init_logging() {
    if let Err(e) = log4rs::init_file(DEFAULT_LOG_CONFIG_FILE, Default::default()) {
        eprintln!(
            "无法从{}加载日志配置：{}，使用控制台日志",
            DEFAULT_LOG_CONFIG_FILE, e
        );
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
            )))
            .build();
        let config = log4rs::Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info));
        match config {
            Ok(config) => {
                if let Err(e) = log4rs::init_config(config) {
                    eprintln!("无法初始化日志系统：{}", e);
                }
            }
            Err(e) => eprintln!("无法构建日志配置：{}", e),
        }
    }
}

/// 打印错误与用法后以非零状态退出
fn show_error(e: &Exception) -> ! {
    error!("{}", e);
    eprintln!("ERROR: {}", e);
    eprintln!("{}", Cli::command().render_usage());
    process::exit(1);
}
