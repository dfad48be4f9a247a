use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use dav_client::{Body, ClientConfig, DavClient, Transport, TransportError};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;

/// What the mock saw of one request
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}
impl Reply {
    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: vec![],
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Records every request, answers with the queued replies (200 when empty)
#[derive(Clone, Default)]
pub struct MockTransport {
    seen: Arc<Mutex<Vec<Seen>>>,
    replies: Arc<Mutex<VecDeque<Reply>>>,
}
impl MockTransport {
    pub fn reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}
impl Transport for MockTransport {
    async fn execute(&self, req: Request<Body>) -> Result<Response<Body>, TransportError> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await.map_err(TransportError::new)?.to_bytes();
        self.seen.lock().unwrap().push(Seen {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::status(200));
        let mut builder = Response::builder()
            .status(reply.status)
            .header("content-length", reply.body.len());
        for (name, value) in reply.headers {
            builder = builder.header(name, value);
        }
        let body = Body::new(Full::new(reply.body).map_err(|e| match e {}));
        Ok(builder.body(body).unwrap())
    }
}

pub fn client() -> (DavClient<MockTransport>, MockTransport) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mock = MockTransport::default();
    let config = ClientConfig::new("https://dav.example.com/files/");
    let client = DavClient::new(mock.clone(), config).unwrap();
    (client, mock)
}

pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8).collect()
}
