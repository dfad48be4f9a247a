//! One builder per verb.
//!
//! Each builder checks the caller's options against what RFC 4918 allows
//! for the verb, then produces a transport agnostic `http::Request`.
//! Nothing here touches the network.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use http::request::Builder;
use http::uri::{PathAndQuery, Uri};
use http::{Method, Request};
use hyper::body::Bytes;

use dav_proto::headers::{self as hdr, IfHeader, Overwrite, TimeoutHeader};
use dav_proto::locktoken::LockToken;
use dav_proto::realization::All;
use dav_proto::types as dav;
use dav_proto::xml::QWrite;

use crate::codec::{self, XML_CONTENT_TYPE};
use crate::error::{DavError, ValidationError};
use crate::transport::Body;

// ---- options

#[derive(Debug, Clone, Default)]
pub struct PropfindOptions {
    /// Mandatory, a PROPFIND without Depth is refused
    pub depth: Option<dav::Depth>,
    /// `None` sends an empty body, which the server reads as allprop
    pub body: Option<dav::PropFind<All>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProppatchOptions {
    pub lock_token: Option<LockToken>,
}

#[derive(Debug, Clone, Default)]
pub struct MkcolOptions {
    pub lock_token: Option<LockToken>,
}

#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// `0` or `infinity`, infinity when omitted
    pub depth: Option<dav::Depth>,
    pub overwrite: Option<bool>,
    pub source_token: Option<LockToken>,
    pub destination_token: Option<LockToken>,
}

/// MOVE always applies to the whole subtree, Depth is not configurable
#[derive(Debug, Clone, Default)]
pub struct MoveOptions {
    pub overwrite: Option<bool>,
    pub source_token: Option<LockToken>,
    /// Only sent along a source token
    pub destination_token: Option<LockToken>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub lock_token: Option<LockToken>,
}

#[derive(Debug, Clone, Default)]
pub struct LockOptions {
    /// `0` or `infinity`, infinity when omitted
    pub depth: Option<dav::Depth>,
    pub timeout: Option<TimeoutHeader>,
    /// `None` sends an empty body (lock discovery)
    pub info: Option<dav::LockInfo>,
    pub lock_token: Option<LockToken>,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshLockOptions {
    /// Mandatory, the lock being refreshed
    pub token: Option<LockToken>,
    pub timeout: Option<TimeoutHeader>,
}

#[derive(Debug, Clone, Default)]
pub struct UnlockOptions {
    /// Mandatory, the lock being released
    pub token: Option<LockToken>,
}

/// `bytes=start-end`, both bounds inclusive, an open end reads to the last byte
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}
impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) => write!(f, "bytes={}-{}", self.start, end),
            None => write!(f, "bytes={}-", self.start),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub range: Option<ByteRange>,
}

#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub lock_token: Option<LockToken>,
}

#[derive(Debug, Clone, Default)]
pub struct PostOptions {
    pub content_type: Option<String>,
    pub lock_token: Option<LockToken>,
}

// ---- targets

/// Resolve a target against the base collection.
///
/// Absolute URLs are kept, `/path` replaces the base path,
/// anything else is appended to the base path.
pub fn resolve(base: &Uri, target: &str) -> Result<Uri, ValidationError> {
    let invalid = || ValidationError::InvalidTarget(target.to_string());

    if target.contains("://") {
        let uri = target.parse::<Uri>().map_err(|_| invalid())?;
        return match uri.scheme().is_some() && uri.authority().is_some() {
            true => Ok(uri),
            false => Err(invalid()),
        };
    }

    let path = match target.strip_prefix('/') {
        Some(_) => target.to_string(),
        None => {
            let base_path = base.path();
            match base_path.ends_with('/') {
                true => format!("{}{}", base_path, target),
                false => format!("{}/{}", base_path, target),
            }
        }
    };

    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(path.parse::<PathAndQuery>().map_err(|_| invalid())?);
    Uri::from_parts(parts).map_err(|_| invalid())
}

// ---- builders

pub async fn propfind(uri: Uri, opts: &PropfindOptions) -> Result<Request<Body>, DavError> {
    let depth = opts.depth.ok_or(ValidationError::MissingDepth("PROPFIND"))?;
    let builder = start("PROPFIND", uri)?.header(hdr::DEPTH, depth.as_str());
    match &opts.body {
        Some(propfind) => with_xml(builder, propfind).await,
        None => Ok(builder.body(codec::empty_body())?),
    }
}

pub async fn proppatch(
    uri: Uri,
    update: &dav::PropertyUpdate<All>,
    opts: &ProppatchOptions,
) -> Result<Request<Body>, DavError> {
    let builder = start("PROPPATCH", uri)?;
    let builder = with_if(builder, if_tokens(opts.lock_token.as_ref(), None));
    with_xml(builder, update).await
}

pub fn mkcol(uri: Uri, opts: &MkcolOptions) -> Result<Request<Body>, DavError> {
    let builder = start("MKCOL", uri)?;
    let builder = with_if(builder, if_tokens(opts.lock_token.as_ref(), None));
    Ok(builder.body(codec::empty_body())?)
}

pub fn copy(uri: Uri, destination: &Uri, opts: &CopyOptions) -> Result<Request<Body>, DavError> {
    let depth = match opts.depth.unwrap_or(dav::Depth::Infinity) {
        dav::Depth::One => Err(ValidationError::IllegalDepth {
            method: "COPY",
            depth: dav::Depth::One,
        }),
        depth => Ok(depth),
    }?;

    let builder = start("COPY", uri)?
        .header(hdr::DESTINATION, destination.to_string())
        .header(hdr::DEPTH, depth.as_str());
    let builder = with_overwrite(builder, opts.overwrite);
    let builder = with_if(
        builder,
        if_tokens(opts.source_token.as_ref(), opts.destination_token.as_ref()),
    );
    Ok(builder.body(codec::empty_body())?)
}

pub fn move_to(uri: Uri, destination: &Uri, opts: &MoveOptions) -> Result<Request<Body>, DavError> {
    let builder = start("MOVE", uri)?
        .header(hdr::DESTINATION, destination.to_string())
        .header(hdr::DEPTH, dav::Depth::Infinity.as_str());
    let builder = with_overwrite(builder, opts.overwrite);

    // The destination token is only considered when a source token is given:
    // a destination token on its own sends no If header at all.
    let tokens = match &opts.source_token {
        Some(source) => if_tokens(Some(source), opts.destination_token.as_ref()),
        None => None,
    };
    let builder = with_if(builder, tokens);
    Ok(builder.body(codec::empty_body())?)
}

pub fn delete(uri: Uri, opts: &DeleteOptions) -> Result<Request<Body>, DavError> {
    // no Depth: the server applies infinity
    let builder = start("DELETE", uri)?;
    let builder = with_if(builder, if_tokens(opts.lock_token.as_ref(), None));
    Ok(builder.body(codec::empty_body())?)
}

pub async fn lock(uri: Uri, opts: &LockOptions) -> Result<Request<Body>, DavError> {
    let depth = match opts.depth.unwrap_or(dav::Depth::Infinity) {
        dav::Depth::One => Err(ValidationError::IllegalDepth {
            method: "LOCK",
            depth: dav::Depth::One,
        }),
        depth => Ok(depth),
    }?;

    let builder = start("LOCK", uri)?.header(hdr::DEPTH, depth.as_str());
    let builder = with_timeout(builder, opts.timeout.as_ref());
    let builder = with_if(builder, if_tokens(opts.lock_token.as_ref(), None));
    match &opts.info {
        Some(info) => with_xml(builder, info).await,
        None => Ok(builder.body(codec::empty_body())?),
    }
}

pub fn refresh_lock(uri: Uri, opts: &RefreshLockOptions) -> Result<Request<Body>, DavError> {
    let token = opts
        .token
        .as_ref()
        .ok_or(ValidationError::MissingLockToken("LOCK"))?;

    let builder = start("LOCK", uri)?;
    let builder = with_timeout(builder, opts.timeout.as_ref());
    let builder = with_if(builder, Some(IfHeader::from(token.clone())));
    Ok(builder.body(codec::empty_body())?)
}

pub fn unlock(uri: Uri, opts: &UnlockOptions) -> Result<Request<Body>, DavError> {
    let token = opts
        .token
        .as_ref()
        .ok_or(ValidationError::MissingLockToken("UNLOCK"))?;

    let builder = start("UNLOCK", uri)?.header(hdr::LOCK_TOKEN, token.lock_token_header_form());
    Ok(builder.body(codec::empty_body())?)
}

pub fn get(uri: Uri, opts: &GetOptions) -> Result<Request<Body>, DavError> {
    let mut builder = start("GET", uri)?;
    if let Some(range) = &opts.range {
        builder = builder.header(RANGE, range.to_string());
    }
    Ok(builder.body(codec::empty_body())?)
}

pub fn head(uri: Uri) -> Result<Request<Body>, DavError> {
    Ok(start("HEAD", uri)?.body(codec::empty_body())?)
}

pub fn put(uri: Uri, body: Body, opts: &PutOptions) -> Result<Request<Body>, DavError> {
    let mut builder = start("PUT", uri)?;
    if let Some(len) = opts.content_length {
        builder = builder.header(CONTENT_LENGTH, len);
    }
    if let Some(ctype) = &opts.content_type {
        builder = builder.header(CONTENT_TYPE, ctype.as_str());
    }
    let builder = with_if(builder, if_tokens(opts.lock_token.as_ref(), None));
    Ok(builder.body(body)?)
}

pub fn post(uri: Uri, body: Bytes, opts: &PostOptions) -> Result<Request<Body>, DavError> {
    let mut builder = start("POST", uri)?.header(CONTENT_LENGTH, body.len());
    if let Some(ctype) = &opts.content_type {
        builder = builder.header(CONTENT_TYPE, ctype.as_str());
    }
    let builder = with_if(builder, if_tokens(opts.lock_token.as_ref(), None));
    Ok(builder.body(codec::bytes_body(body))?)
}

pub fn options(uri: Uri) -> Result<Request<Body>, DavError> {
    Ok(start("OPTIONS", uri)?.body(codec::empty_body())?)
}

// ---- helpers

fn start(verb: &'static str, uri: Uri) -> Result<Builder, ValidationError> {
    let method = Method::from_bytes(verb.as_bytes()).map_err(http::Error::from)?;
    Ok(Request::builder().method(method).uri(uri))
}

async fn with_xml<T: QWrite + Sync>(builder: Builder, elem: &T) -> Result<Request<Body>, DavError> {
    let body = codec::serialize(elem).await?;
    Ok(builder
        .header(CONTENT_TYPE, XML_CONTENT_TYPE)
        .header(CONTENT_LENGTH, body.len())
        .body(codec::bytes_body(body))?)
}

/// Every given token ends up in one If header, source first
fn if_tokens(source: Option<&LockToken>, destination: Option<&LockToken>) -> Option<IfHeader> {
    let tokens = source.into_iter().chain(destination).cloned().collect();
    IfHeader::new(tokens).ok()
}

fn with_if(builder: Builder, tokens: Option<IfHeader>) -> Builder {
    match tokens {
        Some(tokens) => builder.header(hdr::IF, tokens.to_string()),
        None => builder,
    }
}

fn with_overwrite(builder: Builder, overwrite: Option<bool>) -> Builder {
    match overwrite {
        Some(flag) => builder.header(hdr::OVERWRITE, Overwrite(flag).as_str()),
        None => builder,
    }
}

fn with_timeout(builder: Builder, timeout: Option<&TimeoutHeader>) -> Builder {
    match timeout {
        Some(timeout) => builder.header(hdr::TIMEOUT, timeout.to_string()),
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dav_proto::types::Timeout;
    use http_body_util::BodyExt;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    fn token(s: &str) -> LockToken {
        LockToken::new(s).unwrap()
    }

    async fn body_of(req: Request<Body>) -> String {
        let bytes = req.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn resolve_targets() {
        let base = uri("https://dav.example.com/files/");
        assert_eq!(
            resolve(&base, "docs/a.txt").unwrap(),
            uri("https://dav.example.com/files/docs/a.txt")
        );
        assert_eq!(
            resolve(&base, "/other/").unwrap(),
            uri("https://dav.example.com/other/")
        );
        assert_eq!(
            resolve(&base, "http://mirror.example.com/x").unwrap(),
            uri("http://mirror.example.com/x")
        );

        let no_slash = uri("https://dav.example.com/files");
        assert_eq!(
            resolve(&no_slash, "a.txt").unwrap(),
            uri("https://dav.example.com/files/a.txt")
        );
        assert!(matches!(
            resolve(&base, "has space"),
            Err(ValidationError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn propfind_depth_is_mandatory() {
        let res = propfind(uri("http://h/c/"), &PropfindOptions::default()).await;
        assert!(matches!(
            res,
            Err(DavError::Validation(ValidationError::MissingDepth("PROPFIND")))
        ));

        let req = propfind(
            uri("http://h/c/"),
            &PropfindOptions {
                depth: Some(dav::Depth::One),
                body: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(req.method().as_str(), "PROPFIND");
        assert_eq!(req.headers()[hdr::DEPTH], "1");
        assert!(req.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(body_of(req).await, "");
    }

    #[tokio::test]
    async fn propfind_with_body() {
        let req = propfind(
            uri("http://h/c/"),
            &PropfindOptions {
                depth: Some(dav::Depth::Zero),
                body: Some(dav::PropFind::Prop(dav::PropName(vec![
                    dav::PropertyRequest::GetEtag,
                ]))),
            },
        )
        .await
        .unwrap();
        assert_eq!(req.headers()[CONTENT_TYPE], XML_CONTENT_TYPE);
        assert_eq!(
            body_of(req).await,
            r#"<?xml version="1.0" encoding="utf-8"?><D:propfind xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:"><D:prop><D:getetag/></D:prop></D:propfind>"#
        );
    }

    #[test]
    fn copy_depth() {
        let dst = uri("http://h/dst");
        let res = copy(
            uri("http://h/src"),
            &dst,
            &CopyOptions {
                depth: Some(dav::Depth::One),
                ..CopyOptions::default()
            },
        );
        assert!(matches!(
            res,
            Err(DavError::Validation(ValidationError::IllegalDepth {
                method: "COPY",
                ..
            }))
        ));

        let req = copy(uri("http://h/src"), &dst, &CopyOptions::default()).unwrap();
        assert_eq!(req.headers()[hdr::DEPTH], "infinity");
        assert_eq!(req.headers()[hdr::DESTINATION], "http://h/dst");
        assert!(req.headers().get(hdr::OVERWRITE).is_none());

        let req = copy(
            uri("http://h/src"),
            &dst,
            &CopyOptions {
                depth: Some(dav::Depth::Zero),
                overwrite: Some(false),
                destination_token: Some(token("<urn:uuid:dst>")),
                ..CopyOptions::default()
            },
        )
        .unwrap();
        assert_eq!(req.headers()[hdr::DEPTH], "0");
        assert_eq!(req.headers()[hdr::OVERWRITE], "F");
        assert_eq!(req.headers()[hdr::IF], "(<urn:uuid:dst>)");
    }

    #[test]
    fn move_if_header() {
        let dst = uri("http://h/dst");
        let both = move_to(
            uri("http://h/src"),
            &dst,
            &MoveOptions {
                source_token: Some(token("<urn:uuid:t1>")),
                destination_token: Some(token("<urn:uuid:t2>")),
                overwrite: Some(true),
            },
        )
        .unwrap();
        assert_eq!(both.headers()[hdr::DEPTH], "infinity");
        assert_eq!(both.headers()[hdr::OVERWRITE], "T");
        assert_eq!(both.headers()[hdr::IF], "(<urn:uuid:t1>)(<urn:uuid:t2>)");

        let dst_only = move_to(
            uri("http://h/src"),
            &dst,
            &MoveOptions {
                destination_token: Some(token("<urn:uuid:t2>")),
                ..MoveOptions::default()
            },
        )
        .unwrap();
        assert!(dst_only.headers().get(hdr::IF).is_none());
    }

    #[test]
    fn delete_never_sends_depth() {
        let req = delete(
            uri("http://h/c/"),
            &DeleteOptions {
                lock_token: Some(token("<opaquelocktoken:abc>")),
            },
        )
        .unwrap();
        assert!(req.headers().get(hdr::DEPTH).is_none());
        assert_eq!(req.headers()[hdr::IF], "(<opaquelocktoken:abc>)");
    }

    #[tokio::test]
    async fn new_lock() {
        let res = lock(
            uri("http://h/doc"),
            &LockOptions {
                depth: Some(dav::Depth::One),
                ..LockOptions::default()
            },
        )
        .await;
        assert!(matches!(
            res,
            Err(DavError::Validation(ValidationError::IllegalDepth {
                method: "LOCK",
                ..
            }))
        ));

        let req = lock(
            uri("http://h/doc"),
            &LockOptions {
                depth: Some(dav::Depth::Zero),
                timeout: Some(
                    TimeoutHeader::new(vec![Timeout::Seconds(600), Timeout::Infinite]).unwrap(),
                ),
                info: Some(dav::LockInfo {
                    lockscope: dav::LockScope::Exclusive,
                    locktype: dav::LockType::Write,
                    owner: None,
                }),
                lock_token: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(req.headers()[hdr::DEPTH], "0");
        assert_eq!(req.headers()[hdr::TIMEOUT], "Second-600 Infinite");
        assert!(body_of(req).await.contains("<D:lockinfo"));

        let probe = lock(uri("http://h/doc"), &LockOptions::default()).await.unwrap();
        assert_eq!(probe.headers()[hdr::DEPTH], "infinity");
        assert_eq!(body_of(probe).await, "");
    }

    #[test]
    fn refresh_and_unlock_need_a_token() {
        assert!(matches!(
            refresh_lock(uri("http://h/doc"), &RefreshLockOptions::default()),
            Err(DavError::Validation(ValidationError::MissingLockToken("LOCK")))
        ));
        assert!(matches!(
            unlock(uri("http://h/doc"), &UnlockOptions::default()),
            Err(DavError::Validation(ValidationError::MissingLockToken("UNLOCK")))
        ));

        let t = token("<opaquelocktoken:abc123>");
        let refresh = refresh_lock(
            uri("http://h/doc"),
            &RefreshLockOptions {
                token: Some(t.clone()),
                timeout: Some(Timeout::Infinite.try_into().unwrap()),
            },
        )
        .unwrap();
        assert_eq!(refresh.headers()[hdr::IF], "(<opaquelocktoken:abc123>)");
        assert_eq!(refresh.headers()[hdr::TIMEOUT], "Infinite");
        assert!(refresh.headers().get(hdr::DEPTH).is_none());

        let req = unlock(uri("http://h/doc"), &UnlockOptions { token: Some(t) }).unwrap();
        assert_eq!(req.method().as_str(), "UNLOCK");
        assert_eq!(req.headers()[hdr::LOCK_TOKEN], "<opaquelocktoken:abc123>");
    }

    #[test]
    fn get_range_and_put_headers() {
        let req = get(
            uri("http://h/f"),
            &GetOptions {
                range: Some(ByteRange {
                    start: 100,
                    end: None,
                }),
            },
        )
        .unwrap();
        assert_eq!(req.headers()[RANGE], "bytes=100-");

        let req = put(
            uri("http://h/f"),
            codec::bytes_body("hello"),
            &PutOptions {
                content_type: Some("text/plain".into()),
                content_length: Some(5),
                lock_token: None,
            },
        )
        .unwrap();
        assert_eq!(req.headers()[CONTENT_LENGTH], "5");
        assert_eq!(req.headers()[CONTENT_TYPE], "text/plain");
        assert!(req.headers().get(hdr::IF).is_none());
    }
}
