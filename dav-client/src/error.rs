use std::io;

use dav_proto::error::{ParsingError, ValueError};
use dav_proto::realization::All;
use dav_proto::types as dav;
use http::StatusCode;

/// The caller asked for a request that can't be sent as is.
/// Raised before the transport is touched.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{method} does not accept Depth: {depth}")]
    IllegalDepth {
        method: &'static str,
        depth: dav::Depth,
    },
    #[error("{0} requires a Depth header")]
    MissingDepth(&'static str),
    #[error("{0} requires a lock token")]
    MissingLockToken(&'static str),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("unable to build the request: {0}")]
    Http(#[from] http::Error),
}

/// Failure reported by the transport, forwarded untouched
#[derive(Debug, thiserror::Error)]
#[error("transport failure: {0}")]
pub struct TransportError(#[source] pub Box<dyn std::error::Error + Send + Sync>);
impl TransportError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("transfer cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DavError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unable to encode the request body: {0}")]
    Encode(#[from] quick_xml::Error),
    #[error("unable to decode the response body: {0}")]
    Decode(#[from] ParsingError),
    #[error("server answered {status}")]
    UnexpectedStatus {
        status: StatusCode,
        error: Option<dav::Error<All>>,
    },
    /// A LOCK on a collection was refused, the responses name the
    /// members that prevented it (423 or 424)
    #[error("lock refused for {} resource(s)", .0.responses.len())]
    LockFailed(dav::Multistatus<All>),
    #[error("transfer cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(io::Error),
}
impl From<http::Error> for DavError {
    fn from(value: http::Error) -> Self {
        DavError::Validation(value.into())
    }
}
impl From<ValueError> for DavError {
    fn from(value: ValueError) -> Self {
        DavError::Validation(value.into())
    }
}
impl From<TransferError> for DavError {
    fn from(value: TransferError) -> Self {
        match value {
            TransferError::Cancelled => DavError::Cancelled,
            TransferError::Io(e) => DavError::Io(e),
        }
    }
}
