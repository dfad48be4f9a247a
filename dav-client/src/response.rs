use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Bytes;

use dav_proto::error::ParsingError;
use dav_proto::headers::{self as hdr, Compliance};
use dav_proto::locktoken::LockToken;
use dav_proto::realization::All;
use dav_proto::types as dav;

use crate::codec;
use crate::error::DavError;
use crate::transport::Body;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StatusClass {
    Informational,
    Success,
    /// 207, partial success: every response entry carries its own status
    MultiStatus,
    Redirect,
    ClientError,
    ServerError,
}

pub fn classify(status: StatusCode) -> StatusClass {
    match status.as_u16() {
        207 => StatusClass::MultiStatus,
        100..=199 => StatusClass::Informational,
        200..=299 => StatusClass::Success,
        300..=399 => StatusClass::Redirect,
        400..=499 => StatusClass::ClientError,
        _ => StatusClass::ServerError,
    }
}

/// Status and headers of an answer, plus its body when the verb has one
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}
impl RawResponse {
    pub(crate) async fn collect(resp: http::Response<Body>) -> Result<Self, DavError> {
        let (parts, body) = resp.into_parts();
        let body = body.collect().await.map_err(DavError::Io)?.to_bytes();
        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// DELETE, COPY and MOVE report partial failures in a 207 body
    pub async fn multistatus(&self) -> Result<Option<dav::Multistatus<All>>, ParsingError> {
        match classify(self.status) {
            StatusClass::MultiStatus => Ok(Some(
                codec::deserialize_bytes::<dav::Multistatus<All>>(&self.body).await?,
            )),
            _ => Ok(None),
        }
    }
}

/// Outcome of a LOCK, new or refreshed
#[derive(Debug, PartialEq, Clone)]
pub struct LockResult {
    pub token: LockToken,
    /// The active lock that matches the token, if the server described it
    pub active_lock: Option<dav::ActiveLock>,
}

pub async fn multistatus(body: Body) -> Result<dav::Multistatus<All>, ParsingError> {
    codec::deserialize::<dav::Multistatus<All>>(body).await
}

/// A LOCK on a collection that fails for some of its members is answered
/// with a 207, turned here into [`DavError::LockFailed`].
/// `sent` is the token of the lock being refreshed, if any.
pub async fn lock_outcome(
    raw: &RawResponse,
    sent: Option<&LockToken>,
) -> Result<LockResult, DavError> {
    if let Some(ms) = raw.multistatus().await? {
        tracing::warn!(responses = ms.responses.len(), "lock refused");
        return Err(DavError::LockFailed(ms));
    }
    Ok(lock_response(&raw.headers, &raw.body, sent).await?)
}

/// The token comes from the Lock-Token header when the server sent one.
/// A refresh is usually answered without it: the token that was sent is
/// kept. Otherwise the first active lock of the `prop` body gives it.
pub async fn lock_response(
    headers: &HeaderMap,
    body: &[u8],
    sent: Option<&LockToken>,
) -> Result<LockResult, ParsingError> {
    let from_header = headers
        .get(hdr::LOCK_TOKEN)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<LockToken>().ok());

    let locks = match body.iter().all(u8::is_ascii_whitespace) {
        true => vec![],
        false => {
            let dav::PropValue(props) =
                codec::deserialize_bytes::<dav::PropValue<All>>(body).await?;
            props
                .into_iter()
                .filter_map(|p| match p {
                    dav::Property::LockDiscovery(locks) => Some(locks),
                    _ => None,
                })
                .flatten()
                .collect::<Vec<_>>()
        }
    };
    let token_of = |lock: &dav::ActiveLock| {
        lock.locktoken
            .as_ref()
            .and_then(|href| LockToken::try_from(href).ok())
    };

    let token = match from_header.or_else(|| sent.cloned()) {
        Some(token) => token,
        None => locks
            .iter()
            .find_map(token_of)
            .ok_or(ParsingError::MissingChild)?,
    };

    // other shared locks may be listed, only ours is kept
    let active_lock = locks
        .into_iter()
        .find(|l| token_of(l).is_some_and(|t| t.absolute_uri() == token.absolute_uri()));

    Ok(LockResult { token, active_lock })
}

pub async fn error_body(body: &[u8]) -> Result<dav::Error<All>, ParsingError> {
    codec::deserialize_bytes::<dav::Error<All>>(body).await
}

/// Compliance classes listed in the DAV header(s) of an OPTIONS answer
pub fn dav_compliance(headers: &HeaderMap) -> Compliance {
    let joined = headers
        .get_all(hdr::DAV)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");
    joined.parse::<Compliance>().unwrap_or_default()
}

/// Let 2xx answers through, turn everything else into `UnexpectedStatus`
/// with the `DAV:error` body when there is a readable one.
pub(crate) async fn check_status(
    resp: http::Response<Body>,
) -> Result<http::Response<Body>, DavError> {
    match classify(resp.status()) {
        StatusClass::Success | StatusClass::MultiStatus => Ok(resp),
        _ => {
            let raw = RawResponse::collect(resp).await?;
            let error = match raw.body.is_empty() {
                true => None,
                false => error_body(&raw.body).await.ok(),
            };
            tracing::debug!(status=%raw.status, dav_error=?error, "unexpected status");
            Err(DavError::UnexpectedStatus {
                status: raw.status,
                error,
            })
        }
    }
}
