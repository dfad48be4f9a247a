use chrono::DateTime;
use quick_xml::events::Event;

use super::error::ParsingError;
use super::mstypes::*;
use super::types::PropertyName;
use super::xml::{IRead, QRead, Reader};

fn request_named(name: &PropertyName) -> Option<PropertyRequest> {
    let ns = name.ns.as_deref()?.as_bytes();
    ALL_REQUESTS
        .iter()
        .copied()
        .find(|req| req.namespace() == ns && req.local_name() == name.local)
}

impl QRead<Property> for Property {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        if !matches!(xml.peek(), Event::Start(_)) {
            return Err(ParsingError::Recoverable);
        }
        let req = request_named(&xml.element_name()?).ok_or(ParsingError::Recoverable)?;
        let txt = xml.element_text().await?;
        parse_value(req, txt)
    }
}

impl QRead<PropertyRequest> for PropertyRequest {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        let req = request_named(&xml.element_name()?).ok_or(ParsingError::Recoverable)?;
        xml.open_any().await?;
        xml.close().await?;
        Ok(req)
    }
}

fn flag(txt: &str) -> Result<bool, ParsingError> {
    match txt {
        "1" => Ok(true),
        "0" => Ok(false),
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ParsingError::InvalidValue),
    }
}

fn parse_value(req: PropertyRequest, raw: String) -> Result<Property, ParsingError> {
    use PropertyRequest as R;
    let txt = raw.trim();
    let prop = match req {
        R::ChildCount => Property::ChildCount(txt.parse()?),
        R::DefaultDocument => Property::DefaultDocument(raw),
        R::Id => Property::Id(raw),
        R::IsFolder => Property::IsFolder(flag(txt)?),
        R::IsHidden => Property::IsHidden(flag(txt)?),
        R::IsStructuredDocument => Property::IsStructuredDocument(flag(txt)?),
        R::HasSubs => Property::HasSubs(flag(txt)?),
        R::NoSubs => Property::NoSubs(flag(txt)?),
        R::ObjectCount => Property::ObjectCount(txt.parse()?),
        R::Reserved => Property::Reserved(flag(txt)?),
        R::VisibleCount => Property::VisibleCount(txt.parse()?),
        R::ContentClass => Property::ContentClass(raw),
        R::LastAccessed => Property::LastAccessed(DateTime::parse_from_rfc3339(txt)?),
        R::IsReadOnly => Property::IsReadOnly(flag(txt)?),
        R::IsRoot => Property::IsRoot(flag(txt)?),
        R::IsCollection => Property::IsCollection(flag(txt)?),
        R::Name => Property::Name(raw),
        R::ParentName => Property::ParentName(raw),
        R::Win32CreationTime => Property::Win32CreationTime(DateTime::parse_from_rfc2822(txt)?),
        R::Win32LastAccessTime => {
            Property::Win32LastAccessTime(DateTime::parse_from_rfc2822(txt)?)
        }
        R::Win32LastModifiedTime => {
            Property::Win32LastModifiedTime(DateTime::parse_from_rfc2822(txt)?)
        }
        R::Win32FileAttributes => Property::Win32FileAttributes(txt.to_string()),
    };
    Ok(prop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realization::Microsoft;
    use crate::types as dav;
    use chrono::{FixedOffset, TimeZone};
    use quick_xml::reader::NsReader;

    #[tokio::test]
    async fn iis_propstat() {
        let src = r#"<D:prop xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:">
  <D:isfolder>TRUE</D:isfolder>
  <D:ishidden>0</D:ishidden>
  <D:childcount>3</D:childcount>
  <D:name>reports</D:name>
  <D:lastaccessed>2024-03-01T10:00:00Z</D:lastaccessed>
  <Z:Win32LastModifiedTime>Fri, 01 Mar 2024 10:00:00 GMT</Z:Win32LastModifiedTime>
  <Z:Win32FileAttributes>00000010</Z:Win32FileAttributes>
  <D:visiblecount>many</D:visiblecount>
</D:prop>"#;

        let mut rdr = Reader::new(NsReader::from_reader(src.as_bytes()))
            .await
            .unwrap();
        let got = rdr.find::<dav::PropValue<Microsoft>>().await.unwrap();

        let march = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .unwrap();
        assert_eq!(
            got.0,
            vec![
                dav::Property::Extension(Property::IsFolder(true)),
                dav::Property::Extension(Property::IsHidden(false)),
                dav::Property::Extension(Property::ChildCount(3)),
                dav::Property::Extension(Property::Name("reports".into())),
                dav::Property::Extension(Property::LastAccessed(march)),
                dav::Property::Extension(Property::Win32LastModifiedTime(march)),
                dav::Property::Extension(Property::Win32FileAttributes("00000010".into())),
                dav::Property::Unknown {
                    name: dav::PropertyName::new("DAV:", "visiblecount"),
                    inner: "many".into(),
                },
            ]
        );
    }
}
