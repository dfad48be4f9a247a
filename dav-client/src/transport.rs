use futures::Future;
use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::{Request, Response};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::error::TransportError;

pub type Body = BoxBody<Bytes, std::io::Error>;

/// Whatever carries a request to the server and brings the answer back.
///
/// DNS, TLS, redirects and retries all live behind this trait.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        req: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send;
}

/// HTTP/1.1 and HTTP/2 over rustls, trusting the platform roots
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}
impl HyperTransport {
    pub fn new() -> Result<Self, TransportError> {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(TransportError::new)?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);
        Ok(Self { client })
    }
}
impl Transport for HyperTransport {
    async fn execute(&self, req: Request<Body>) -> Result<Response<Body>, TransportError> {
        let resp = self.client.request(req).await.map_err(TransportError::new)?;
        Ok(resp.map(|body| {
            body.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
                .boxed()
        }))
    }
}
