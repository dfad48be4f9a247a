use quick_xml::events::BytesStart;
use quick_xml::Error as QError;

use super::encoder::{flag, http_date};
use super::mstypes::*;
use super::xml::{IWrite, QWrite, Writer, WIN32_URN};

fn create_element(xml: &mut Writer<impl IWrite>, req: PropertyRequest) -> BytesStart<'static> {
    match req.namespace() == WIN32_URN {
        true => xml.create_win32_element(req.local_name()),
        false => xml.create_dav_element(req.local_name()),
    }
}

impl QWrite for Property {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        use Property::*;
        let txt = match self {
            ChildCount(n) | ObjectCount(n) | VisibleCount(n) => n.to_string(),
            IsFolder(b) | IsHidden(b) | IsStructuredDocument(b) | HasSubs(b) | NoSubs(b)
            | Reserved(b) | IsReadOnly(b) | IsRoot(b) | IsCollection(b) => flag(*b).to_string(),
            DefaultDocument(s) | Id(s) | ContentClass(s) | Name(s) | ParentName(s)
            | Win32FileAttributes(s) => s.clone(),
            LastAccessed(date) => date.to_rfc3339(),
            Win32CreationTime(date) | Win32LastAccessTime(date) | Win32LastModifiedTime(date) => {
                http_date(date)
            }
        };
        let start = create_element(xml, self.request());
        xml.text_element(start, &txt).await
    }
}

impl QWrite for PropertyRequest {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let empty_tag = create_element(xml, *self);
        xml.atom(empty_tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realization::Microsoft;
    use crate::types as dav;
    use chrono::{FixedOffset, TimeZone};

    #[tokio::test]
    async fn win32_props_use_their_namespace() {
        let mut buffer = Vec::new();
        let q = quick_xml::writer::Writer::new(&mut buffer);
        let ns_to_apply = vec![
            ("xmlns:D".into(), "DAV:".into()),
            ("xmlns:Z".into(), "urn:schemas-microsoft-com:".into()),
        ];
        let mut writer = Writer { q, ns_to_apply };

        let date = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 11, 0, 0)
            .unwrap();
        let orig = dav::PropertyUpdate::<Microsoft>(vec![dav::PropertyUpdateItem::Set(dav::Set(
            dav::PropValue(vec![
                dav::Property::Extension(Property::Win32LastModifiedTime(date)),
                dav::Property::Extension(Property::IsHidden(true)),
            ]),
        ))]);
        orig.qwrite(&mut writer).await.expect("xml serialization");

        let got = std::str::from_utf8(buffer.as_slice()).unwrap();
        assert_eq!(
            got,
            concat!(
                r#"<D:propertyupdate xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:">"#,
                "<D:set><D:prop>",
                "<Z:Win32LastModifiedTime>Fri, 01 Mar 2024 10:00:00 GMT</Z:Win32LastModifiedTime>",
                "<D:ishidden>1</D:ishidden>",
                "</D:prop></D:set></D:propertyupdate>"
            )
        );
    }
}
