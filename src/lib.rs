pub mod config;
pub mod exception;
pub mod handler;
pub mod param;
pub mod request;
pub mod resolve;
pub mod response;
pub mod server;
pub mod util;

pub use config::{Cli, ServerConfig};
pub use exception::Exception;
pub use handler::handle_connection;
pub use param::Outcome;
pub use request::Request;
pub use resolve::{normalize_target, ResolvedTarget};
pub use response::Response;
pub use server::Server;
pub use util::HtmlBuilder;
