pub mod client;
mod codec;
pub mod config;
pub mod error;
pub mod progress;
pub mod request;
pub mod response;
pub mod transport;

pub use client::DavClient;
pub use config::{read_config, ClientConfig};
pub use error::{DavError, TransferError, TransportError, ValidationError};
pub use transport::{Body, HyperTransport, Transport};

pub use dav_proto;
