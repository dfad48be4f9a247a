use quick_xml::Error as QError;

use super::quotatypes::*;
use super::xml::{IWrite, QWrite, Writer};

impl QWrite for Property {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let (name, bytes) = match self {
            Self::QuotaAvailableBytes(b) => ("quota-available-bytes", b),
            Self::QuotaUsedBytes(b) => ("quota-used-bytes", b),
        };
        let start = xml.create_dav_element(name);
        xml.text_element(start, &bytes.to_string()).await
    }
}

impl QWrite for PropertyRequest {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let empty_tag = match self {
            Self::QuotaAvailableBytes => xml.create_dav_element("quota-available-bytes"),
            Self::QuotaUsedBytes => xml.create_dav_element("quota-used-bytes"),
        };
        xml.atom(empty_tag).await
    }
}
