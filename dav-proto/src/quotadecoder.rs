use quick_xml::events::Event;

use super::error::ParsingError;
use super::quotatypes::*;
use super::xml::{IRead, QRead, Reader};

impl QRead<Property> for Property {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        if !matches!(xml.peek(), Event::Start(_)) {
            return Err(ParsingError::Recoverable);
        }
        let wrap: fn(u64) -> Self = match xml.dav_local().as_deref() {
            Some("quota-available-bytes") => Self::QuotaAvailableBytes,
            Some("quota-used-bytes") => Self::QuotaUsedBytes,
            _ => return Err(ParsingError::Recoverable),
        };
        let bytes = xml.element_text().await?.trim().parse::<u64>()?;
        Ok(wrap(bytes))
    }
}

impl QRead<PropertyRequest> for PropertyRequest {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        let req = match xml.dav_local().as_deref() {
            Some("quota-available-bytes") => Self::QuotaAvailableBytes,
            Some("quota-used-bytes") => Self::QuotaUsedBytes,
            _ => return Err(ParsingError::Recoverable),
        };
        xml.open_any().await?;
        xml.close().await?;
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realization::Quota;
    use crate::types as dav;
    use quick_xml::reader::NsReader;

    #[tokio::test]
    async fn quota_values_and_names() {
        let src = r#"<D:propstat xmlns:D="DAV:">
  <D:prop>
    <D:quota-available-bytes>596650</D:quota-available-bytes>
    <D:quota-used-bytes/>
  </D:prop>
  <D:status>HTTP/1.1 200 OK</D:status>
</D:propstat>"#;

        let mut rdr = Reader::new(NsReader::from_reader(src.as_bytes()))
            .await
            .unwrap();
        let got = rdr.find::<dav::PropStat<Quota>>().await.unwrap();
        assert_eq!(
            got.prop.0,
            vec![
                dav::AnyProperty::Value(dav::Property::Extension(Property::QuotaAvailableBytes(
                    596650
                ))),
                dav::AnyProperty::Request(dav::PropertyRequest::Extension(
                    PropertyRequest::QuotaUsedBytes
                )),
            ]
        );
    }
}
