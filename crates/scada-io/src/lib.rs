pub mod client;
pub mod error;
pub mod metrics;
#[cfg(feature = "mock")]
pub mod mock;
pub mod protocol;
pub mod tls;

pub use client::{ClientConfig, ConnectionStatus, ScadaClient, DEFAULT_BASE_URL};
pub use error::{format_error, ClientError};
pub use metrics::{init_metrics, serve_metrics};
pub use protocol::Ack;
pub use tls::{load_ca_certificates, TlsError};
