use clap::Parser;
use log::{debug, warn};
use serde_derive::Deserialize;
use serde_derive::Serialize;

use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exception::Exception;
use crate::param::*;

/// 命令行参数。三个位置参数都可省略，省略时使用配置文件或内置默认值。
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "webserver")]
#[command(about = "A minimal HTTP/1.0 static file server")]
#[command(override_usage = "webserver [OPTIONS] [DOCUMENT_ROOT] [PORT] [INDEX_FILE]")]
pub struct Cli {
    /// 文档根目录，必须是已存在的目录
    pub document_root: Option<String>,

    /// 监听端口，无法解析时使用默认值
    pub port: Option<String>,

    /// 请求目录时返回的默认文件名
    pub index_file: Option<String>,

    /// TOML 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 配置文件中的原始字段，所有字段都可以缺省。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawConfig {
    #[serde(default = "default_www_root")]
    www_root: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_index_file")]
    index_file: String,
    #[serde(default = "default_connection_timeout_ms")]
    connection_timeout_ms: u64,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_max_connections")]
    max_connections: usize,
    #[serde(default = "default_local")]
    local: bool,
}

fn default_www_root() -> String {
    ".".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE_NAME.to_string()
}

fn default_connection_timeout_ms() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT.as_millis() as u64
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_local() -> bool {
    false
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            www_root: default_www_root(),
            port: default_port(),
            index_file: default_index_file(),
            connection_timeout_ms: default_connection_timeout_ms(),
            worker_threads: 0,
            max_connections: default_max_connections(),
            local: default_local(),
        }
    }
}

impl RawConfig {
    pub fn from_toml(filename: &Path) -> Result<Self, Exception> {
        let mut file = File::open(filename)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename.display(), e)))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename.display(), e)))?;
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Exception> {
        toml::from_str(s).map_err(|e| Exception::ConfigMalformed(e.to_string()))
    }

    /// 用命令行位置参数覆盖配置文件中的值。
    ///
    /// 端口无法解析时保留下层的值，而不是报错。
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.document_root {
            self.www_root = root.clone();
        }
        if let Some(port) = &cli.port {
            match port.parse::<u16>() {
                Ok(p) => self.port = p,
                Err(_) => warn!("无法解析端口号：{}，使用端口{}", port, self.port),
            }
        }
        if let Some(index_file) = &cli.index_file {
            self.index_file = index_file.clone();
        }
    }
}

/// 服务器运行期间不可变的配置，由所有连接处理器只读共享。
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    document_root: PathBuf,
    default_file_name: String,
    port: u16,
    connection_timeout: Duration,
    worker_threads: usize,
    max_connections: usize,
    local: bool,
}

impl ServerConfig {
    /// 以指定的文档根目录和默认文件名构造配置，其余字段取默认值。
    pub fn new(document_root: impl AsRef<Path>, default_file_name: &str) -> Result<Self, Exception> {
        let mut raw = RawConfig::default();
        raw.www_root = document_root.as_ref().to_string_lossy().into_owned();
        raw.index_file = default_file_name.to_string();
        Self::try_from_raw(raw)
    }

    /// 校验原始配置并构造最终配置。
    ///
    /// 文档根目录会被规范化为绝对路径，之后所有的包含性检查都以它为基准。
    pub fn try_from_raw(raw: RawConfig) -> Result<Self, Exception> {
        let document_root = Path::new(&raw.www_root)
            .canonicalize()
            .map_err(|e| Exception::InvalidDocumentRoot(format!("{}: {}", raw.www_root, e)))?;
        if !document_root.is_dir() {
            return Err(Exception::InvalidDocumentRoot(format!(
                "{} is not a directory",
                raw.www_root
            )));
        }
        debug!("文档根目录规范化为：{}", document_root.display());

        let worker_threads = match raw.worker_threads {
            0 => num_cpus::get(),
            n => n,
        };
        let max_connections = match raw.max_connections {
            0 => {
                warn!("max_connections被设置为0，该值将被改为{}。", DEFAULT_MAX_CONNECTIONS);
                DEFAULT_MAX_CONNECTIONS
            }
            n => n,
        };

        Ok(Self {
            document_root,
            default_file_name: raw.index_file,
            port: raw.port,
            connection_timeout: Duration::from_millis(raw.connection_timeout_ms),
            worker_threads,
            max_connections,
            local: raw.local,
        })
    }

    /// 按“内置默认值 → 配置文件 → 命令行”的顺序合并配置。
    ///
    /// 未显式指定配置文件且默认配置文件不存在时，直接使用内置默认值。
    pub fn load(cli: &Cli) -> Result<Self, Exception> {
        let mut raw = match &cli.config {
            Some(path) => RawConfig::from_toml(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    RawConfig::from_toml(path)?
                } else {
                    RawConfig::default()
                }
            }
        };
        raw.apply_cli(cli);
        Self::try_from_raw(raw)
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }
}

impl ServerConfig {
    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    pub fn default_file_name(&self) -> &str {
        &self.default_file_name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn local(&self) -> bool {
        self.local
    }
}
