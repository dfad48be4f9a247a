use futures::TryStreamExt;
use http::header::{HeaderValue, CONTENT_LENGTH, USER_AGENT};
use http::{Request, Response, Uri};
use http_body_util::StreamBody;
use hyper::body::{Bytes, Frame};
use tokio::io::{AsyncRead, AsyncWrite};

use dav_proto::headers::{Compliance, TimeoutHeader};
use dav_proto::realization::All;
use dav_proto::types as dav;

use crate::codec;
use crate::config::ClientConfig;
use crate::error::{DavError, ValidationError};
use crate::progress::{self, Progress, ProgressReader, TransferOptions};
use crate::request::{
    self, CopyOptions, DeleteOptions, GetOptions, LockOptions, MkcolOptions, MoveOptions,
    PostOptions, PropfindOptions, ProppatchOptions, PutOptions, RefreshLockOptions, UnlockOptions,
};
use crate::response::{self, LockResult, RawResponse};
use crate::transport::{Body, Transport};

/// A WebDAV client: builds and checks each request, hands it to the
/// transport, decodes what comes back.
pub struct DavClient<T: Transport> {
    transport: T,
    config: ClientConfig,
    base: Uri,
    user_agent: HeaderValue,
}

impl<T: Transport> DavClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Result<Self, ValidationError> {
        let base = config
            .base_url
            .parse::<Uri>()
            .ok()
            .filter(|u| u.scheme().is_some() && u.authority().is_some())
            .ok_or_else(|| ValidationError::InvalidTarget(config.base_url.clone()))?;
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(http::Error::from)?;

        Ok(Self {
            transport,
            config,
            base,
            user_agent,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn resolve(&self, target: &str) -> Result<Uri, ValidationError> {
        request::resolve(&self.base, target)
    }

    /// Fresh options for one transfer, chunked as configured
    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            chunk_size: self.config.chunk_size,
            ..TransferOptions::default()
        }
    }

    // ---- WebDAV verbs

    pub async fn propfind(
        &self,
        target: &str,
        opts: PropfindOptions,
    ) -> Result<dav::Multistatus<All>, DavError> {
        let req = request::propfind(self.resolve(target)?, &opts).await?;
        let resp = self.dispatch(req).await?;
        Ok(response::multistatus(resp.into_body()).await?)
    }

    pub async fn proppatch(
        &self,
        target: &str,
        update: &dav::PropertyUpdate<All>,
        opts: ProppatchOptions,
    ) -> Result<dav::Multistatus<All>, DavError> {
        let req = request::proppatch(self.resolve(target)?, update, &opts).await?;
        let resp = self.dispatch(req).await?;
        Ok(response::multistatus(resp.into_body()).await?)
    }

    pub async fn mkcol(&self, target: &str, opts: MkcolOptions) -> Result<RawResponse, DavError> {
        let req = request::mkcol(self.resolve(target)?, &opts)?;
        self.dispatch_raw(req).await
    }

    /// A 207 answer means some members failed, see [`RawResponse::multistatus`]
    pub async fn copy(
        &self,
        target: &str,
        destination: &str,
        opts: CopyOptions,
    ) -> Result<RawResponse, DavError> {
        let req = request::copy(self.resolve(target)?, &self.resolve(destination)?, &opts)?;
        self.dispatch_raw(req).await
    }

    /// MOVE
    pub async fn move_to(
        &self,
        target: &str,
        destination: &str,
        opts: MoveOptions,
    ) -> Result<RawResponse, DavError> {
        let req = request::move_to(self.resolve(target)?, &self.resolve(destination)?, &opts)?;
        self.dispatch_raw(req).await
    }

    pub async fn delete(&self, target: &str, opts: DeleteOptions) -> Result<RawResponse, DavError> {
        let req = request::delete(self.resolve(target)?, &opts)?;
        self.dispatch_raw(req).await
    }

    /// Take a new lock. The configured timeout and owner fill in
    /// what the options leave out.
    pub async fn lock(&self, target: &str, mut opts: LockOptions) -> Result<LockResult, DavError> {
        if opts.timeout.is_none() {
            if let Some(secs) = self.config.lock_timeout {
                opts.timeout = Some(TimeoutHeader::try_from(dav::Timeout::seconds(secs)?)?);
            }
        }
        if let (Some(info), Some(owner)) = (opts.info.as_mut(), &self.config.lock_owner) {
            if info.owner.is_none() {
                info.owner = Some(dav::Owner::Txt(owner.clone()));
            }
        }

        let req = request::lock(self.resolve(target)?, &opts).await?;
        let raw = self.dispatch_raw(req).await?;
        response::lock_outcome(&raw, None).await
    }

    pub async fn refresh_lock(
        &self,
        target: &str,
        opts: RefreshLockOptions,
    ) -> Result<LockResult, DavError> {
        let req = request::refresh_lock(self.resolve(target)?, &opts)?;
        let raw = self.dispatch_raw(req).await?;
        response::lock_outcome(&raw, opts.token.as_ref()).await
    }

    pub async fn unlock(&self, target: &str, opts: UnlockOptions) -> Result<RawResponse, DavError> {
        let req = request::unlock(self.resolve(target)?, &opts)?;
        self.dispatch_raw(req).await
    }

    // ---- plain HTTP verbs

    /// GET with the whole body kept in memory, see [`Self::download`] to stream it
    pub async fn get(&self, target: &str, opts: GetOptions) -> Result<RawResponse, DavError> {
        let req = request::get(self.resolve(target)?, &opts)?;
        self.dispatch_raw(req).await
    }

    /// GET streamed into `writer`.
    /// The returned response has an empty body, the payload went to the writer.
    pub async fn download<W, F>(
        &self,
        target: &str,
        writer: &mut W,
        opts: GetOptions,
        transfer: &TransferOptions,
        on_progress: F,
    ) -> Result<RawResponse, DavError>
    where
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(Progress),
    {
        let req = request::get(self.resolve(target)?, &opts)?;
        let resp = self.dispatch(req).await?;
        let (parts, body) = resp.into_parts();
        let total = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let mut reader = codec::body_reader(body);
        let copied = progress::copy(&mut reader, writer, total, transfer, on_progress).await?;
        tracing::debug!(copied, "download complete");

        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            body: Bytes::new(),
        })
    }

    pub async fn head(&self, target: &str) -> Result<RawResponse, DavError> {
        let req = request::head(self.resolve(target)?)?;
        self.dispatch_raw(req).await
    }

    /// PUT an in-memory payload, Content-Length defaults to its size
    pub async fn put(
        &self,
        target: &str,
        body: impl Into<Bytes>,
        mut opts: PutOptions,
    ) -> Result<RawResponse, DavError> {
        let body = body.into();
        opts.content_length = opts.content_length.or(Some(body.len() as u64));
        let req = request::put(self.resolve(target)?, codec::bytes_body(body), &opts)?;
        self.dispatch_raw(req).await
    }

    /// PUT streamed from `reader`, `opts.content_length` is reported as the total
    pub async fn upload<R, F>(
        &self,
        target: &str,
        reader: R,
        opts: PutOptions,
        transfer: &TransferOptions,
        on_progress: F,
    ) -> Result<RawResponse, DavError>
    where
        R: AsyncRead + Unpin + Send + Sync + 'static,
        F: FnMut(Progress) + Unpin + Send + Sync + 'static,
    {
        let chunks = ProgressReader::new(reader, opts.content_length, transfer, on_progress);
        let body = Body::new(StreamBody::new(chunks.map_ok(Frame::data)));
        let req = request::put(self.resolve(target)?, body, &opts)?;

        match self.dispatch_raw(req).await {
            Err(DavError::Transport(_)) if transfer.cancel.is_cancelled() => {
                Err(DavError::Cancelled)
            }
            otherwise => otherwise,
        }
    }

    pub async fn post(
        &self,
        target: &str,
        body: impl Into<Bytes>,
        opts: PostOptions,
    ) -> Result<RawResponse, DavError> {
        let req = request::post(self.resolve(target)?, body.into(), &opts)?;
        self.dispatch_raw(req).await
    }

    pub async fn options(&self, target: &str) -> Result<RawResponse, DavError> {
        let req = request::options(self.resolve(target)?)?;
        self.dispatch_raw(req).await
    }

    /// Compliance classes of a resource, from an OPTIONS request
    pub async fn compliance(&self, target: &str) -> Result<Compliance, DavError> {
        let raw = self.options(target).await?;
        Ok(response::dav_compliance(&raw.headers))
    }

    // ---- internals

    async fn dispatch(&self, mut req: Request<Body>) -> Result<Response<Body>, DavError> {
        req.headers_mut().insert(USER_AGENT, self.user_agent.clone());
        tracing::debug!(method=%req.method(), uri=%req.uri(), "dispatch");

        let resp = match self.transport.execute(req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(err=?e, "transport failed");
                return Err(e.into());
            }
        };
        tracing::debug!(status=%resp.status(), "answered");
        response::check_status(resp).await
    }

    async fn dispatch_raw(&self, req: Request<Body>) -> Result<RawResponse, DavError> {
        let resp = self.dispatch(req).await?;
        RawResponse::collect(resp).await
    }
}
