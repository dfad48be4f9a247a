use futures::stream::{StreamExt, TryStreamExt};
use http_body_util::{BodyExt, BodyStream, Empty, Full};
use hyper::body::Bytes;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::reader::NsReader;
use tokio::io::AsyncBufRead;

use dav_proto::error::ParsingError;
use dav_proto::xml as dxml;

use crate::transport::Body;

pub(crate) const XML_CONTENT_TYPE: &str = "application/xml; charset=\"utf-8\"";

pub(crate) fn empty_body() -> Body {
    Body::new(Empty::<Bytes>::new().map_err(|e| match e {}))
}

pub(crate) fn bytes_body(bytes: impl Into<Bytes>) -> Body {
    Body::new(Full::new(bytes.into()).map_err(|e| match e {}))
}

/// Serialize an XML artifact, declaration included.
///
/// The root element declares the DAV: and Win32 namespaces,
/// foreign properties bring their own declaration.
pub(crate) async fn serialize<T: dxml::QWrite + Sync>(elem: &T) -> Result<Bytes, quick_xml::Error> {
    let q = quick_xml::writer::Writer::new(Vec::<u8>::new());
    let ns_to_apply = vec![
        ("xmlns:D".into(), "DAV:".into()),
        ("xmlns:Z".into(), "urn:schemas-microsoft-com:".into()),
    ];
    let mut qwriter = dxml::Writer { q, ns_to_apply };

    let decl = BytesDecl::from_start(BytesStart::from_content(
        "xml version=\"1.0\" encoding=\"utf-8\"",
        0,
    ));
    qwriter.q.write_event_async(Event::Decl(decl)).await?;
    elem.qwrite(&mut qwriter).await?;
    tracing::trace!("fully serialized object");

    Ok(Bytes::from(qwriter.q.into_inner()))
}

/// Read a streamed body as bytes
pub(crate) fn body_reader(body: Body) -> impl AsyncBufRead + Unpin + Send {
    let stream_of_bytes = BodyStream::new(body)
        .map_ok(|frame| frame.into_data())
        .map(|obj| match obj {
            Ok(Ok(v)) => Ok(v),
            // trailers carry no payload
            Ok(Err(_)) => Ok(Bytes::new()),
            Err(err) => Err(err),
        });
    tokio_util::io::StreamReader::new(stream_of_bytes)
}

/// Deserialize a streamed body into an XML artifact
pub(crate) async fn deserialize<T: dxml::Node<T>>(body: Body) -> Result<T, ParsingError> {
    let mut rdr = dxml::Reader::new(NsReader::from_reader(body_reader(body))).await?;
    rdr.find::<T>().await
}

/// Deserialize an XML artifact from an already collected body
pub(crate) async fn deserialize_bytes<T: dxml::Node<T>>(body: &[u8]) -> Result<T, ParsingError> {
    let mut rdr = dxml::Reader::new(NsReader::from_reader(body)).await?;
    rdr.find::<T>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use dav_proto::realization::All;
    use dav_proto::types as dav;

    #[tokio::test]
    async fn request_body_declares_namespaces() {
        let body = serialize(&dav::PropFind::<All>::PropName).await.unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            r#"<?xml version="1.0" encoding="utf-8"?><D:propfind xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:"><D:propname/></D:propfind>"#
        );
    }

    #[tokio::test]
    async fn streamed_body_is_decoded() {
        let src = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
    <D:response>
        <D:href>/container/</D:href>
        <D:status>HTTP/1.1 200 OK</D:status>
    </D:response>
</D:multistatus>"#;
        let got = deserialize::<dav::Multistatus<All>>(bytes_body(src))
            .await
            .unwrap();
        assert_eq!(got.responses.len(), 1);
        assert_eq!(got.responses[0].hrefs()[0].0, "/container/");

        let empty = deserialize::<dav::Multistatus<All>>(empty_body()).await;
        assert!(empty.is_err());
    }
}
