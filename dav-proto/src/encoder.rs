use quick_xml::events::{BytesText, Event};
use quick_xml::Error as QError;

use super::types::*;
use super::xml::{IWrite, QWrite, Writer};

/// rfc1123-date, the format dates are read in
pub(crate) fn http_date(date: &chrono::DateTime<chrono::FixedOffset>) -> String {
    date.with_timezone(&chrono::Utc)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

pub(crate) fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

// ---- request bodies

impl<E: Extension> QWrite for PropFind<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let root = xml.create_dav_element("propfind");
        let end = xml.open(root).await?;
        match self {
            Self::PropName => {
                let propname = xml.create_dav_element("propname");
                xml.atom(propname).await?;
            }
            Self::AllProp(include) => {
                let allprop = xml.create_dav_element("allprop");
                xml.atom(allprop).await?;
                include.qwrite(xml).await?;
            }
            Self::Prop(names) => names.qwrite(xml).await?,
        }
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for Include<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("include");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for PropertyUpdate<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let root = xml.create_dav_element("propertyupdate");
        let end = xml.open(root).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for PropertyUpdateItem<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        match self {
            Self::Set(set) => set.qwrite(xml).await,
            Self::Remove(remove) => remove.qwrite(xml).await,
        }
    }
}

impl<E: Extension> QWrite for Set<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("set");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for Remove<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("remove");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl QWrite for LockInfo {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let root = xml.create_dav_element("lockinfo");
        let end = xml.open(root).await?;
        self.lockscope.qwrite(xml).await?;
        self.locktype.qwrite(xml).await?;
        self.owner.qwrite(xml).await?;
        xml.close(end).await
    }
}

// ---- responses

impl<E: Extension> QWrite for Multistatus<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let root = xml.create_dav_element("multistatus");
        let end = xml.open(root).await?;
        self.responses.qwrite(xml).await?;
        self.responsedescription.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for Response<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("response");
        let end = xml.open(start).await?;
        match &self.status_or_propstat {
            StatusOrPropstat::Status(hrefs, status) => {
                hrefs.qwrite(xml).await?;
                status.qwrite(xml).await?;
            }
            StatusOrPropstat::PropStat(href, propstats) => {
                href.qwrite(xml).await?;
                propstats.qwrite(xml).await?;
            }
        }
        self.error.qwrite(xml).await?;
        self.responsedescription.qwrite(xml).await?;
        self.location.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for PropStat<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("propstat");
        let end = xml.open(start).await?;
        self.prop.qwrite(xml).await?;
        self.status.qwrite(xml).await?;
        self.error.qwrite(xml).await?;
        self.responsedescription.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl QWrite for Status {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("status");
        let reason = self.0.canonical_reason().unwrap_or("No reason");
        let line = format!("HTTP/1.1 {} {}", self.0.as_str(), reason);
        xml.text_element(start, &line).await
    }
}

impl QWrite for ResponseDescription {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("responsedescription");
        xml.text_element(start, &self.0).await
    }
}

impl QWrite for Location {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("location");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl QWrite for Href {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("href");
        xml.text_element(start, &self.0).await
    }
}

impl<E: Extension> QWrite for Error<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let root = xml.create_dav_element("error");
        let end = xml.open(root).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for Violation<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let (code, hrefs): (&str, &[Href]) = match self {
            Self::LockTokenMatchesRequestUri => ("lock-token-matches-request-uri", &[]),
            Self::LockTokenSubmitted(hrefs) => ("lock-token-submitted", hrefs.as_slice()),
            Self::NoConflictingLock(hrefs) => ("no-conflicting-lock", hrefs.as_slice()),
            Self::NoExternalEntities => ("no-external-entities", &[]),
            Self::PreservedLiveProperties => ("preserved-live-properties", &[]),
            Self::PropfindFiniteDepth => ("propfind-finite-depth", &[]),
            Self::CannotModifyProtectedProperty => ("cannot-modify-protected-property", &[]),
            Self::Extension(inner) => return inner.qwrite(xml).await,
            Self::Unknown(name) => {
                let tag = xml.create_foreign_element(name);
                return xml.atom(tag).await;
            }
        };
        let start = xml.create_dav_element(code);
        xml.children(start, hrefs).await
    }
}

// ---- properties

impl<E: Extension> QWrite for PropName<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("prop");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for PropValue<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("prop");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for AnyProp<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("prop");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl<E: Extension> QWrite for AnyProperty<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        match self {
            Self::Request(name) => name.qwrite(xml).await,
            Self::Value(value) => value.qwrite(xml).await,
        }
    }
}

impl<E: Extension> QWrite for PropertyRequest<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let local = match self {
            Self::CreationDate => "creationdate",
            Self::DisplayName => "displayname",
            Self::GetContentLanguage => "getcontentlanguage",
            Self::GetContentLength => "getcontentlength",
            Self::GetContentType => "getcontenttype",
            Self::GetEtag => "getetag",
            Self::GetLastModified => "getlastmodified",
            Self::LockDiscovery => "lockdiscovery",
            Self::ResourceType => "resourcetype",
            Self::SupportedLock => "supportedlock",
            Self::Extension(inner) => return inner.qwrite(xml).await,
            Self::Unknown(name) => {
                let tag = xml.create_foreign_element(name);
                return xml.atom(tag).await;
            }
        };
        let tag = xml.create_dav_element(local);
        xml.atom(tag).await
    }
}

impl<E: Extension> QWrite for Property<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let (local, txt) = match self {
            Self::CreationDate(date) => ("creationdate", date.to_rfc3339()),
            Self::DisplayName(name) => ("displayname", name.clone()),
            Self::GetContentLanguage(lang) => ("getcontentlanguage", lang.clone()),
            Self::GetContentLength(len) => ("getcontentlength", len.to_string()),
            Self::GetContentType(mime) => ("getcontenttype", mime.clone()),
            Self::GetEtag(etag) => ("getetag", etag.clone()),
            Self::GetLastModified(date) => ("getlastmodified", http_date(date)),
            Self::LockDiscovery(locks) => {
                let start = xml.create_dav_element("lockdiscovery");
                let end = xml.open(start).await?;
                locks.qwrite(xml).await?;
                return xml.close(end).await;
            }
            Self::ResourceType(kinds) => {
                let start = xml.create_dav_element("resourcetype");
                return xml.children(start, kinds).await;
            }
            Self::SupportedLock(entries) => {
                let start = xml.create_dav_element("supportedlock");
                return xml.children(start, entries).await;
            }
            Self::Extension(inner) => return inner.qwrite(xml).await,
            Self::Unknown { name, inner } => {
                let start = xml.create_foreign_element(name);
                let end = xml.open(start).await?;
                if !inner.is_empty() {
                    // kept as found, already escaped
                    xml.q
                        .write_event_async(Event::Text(BytesText::from_escaped(inner.as_str())))
                        .await?;
                }
                return xml.close(end).await;
            }
        };
        let start = xml.create_dav_element(local);
        xml.text_element(start, &txt).await
    }
}

impl<E: Extension> QWrite for ResourceType<E> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let tag = match self {
            Self::Collection => xml.create_dav_element("collection"),
            Self::Extension(inner) => return inner.qwrite(xml).await,
            Self::Unknown(name) => xml.create_foreign_element(name),
        };
        xml.atom(tag).await
    }
}

// ---- locks

/// locktype comes first, as in the RFC examples
impl QWrite for ActiveLock {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("activelock");
        let end = xml.open(start).await?;
        self.locktype.qwrite(xml).await?;
        self.lockscope.qwrite(xml).await?;
        self.depth.qwrite(xml).await?;
        self.owner.qwrite(xml).await?;
        self.timeout.qwrite(xml).await?;
        self.locktoken.qwrite(xml).await?;
        self.lockroot.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl QWrite for LockEntry {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("lockentry");
        let end = xml.open(start).await?;
        self.lockscope.qwrite(xml).await?;
        self.locktype.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl QWrite for LockScope {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("lockscope");
        let end = xml.open(start).await?;
        let scope = xml.create_dav_element(match self {
            Self::Exclusive => "exclusive",
            Self::Shared => "shared",
        });
        xml.atom(scope).await?;
        xml.close(end).await
    }
}

impl QWrite for LockType {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("locktype");
        let end = xml.open(start).await?;
        let kind = xml.create_dav_element(match self {
            Self::Write => "write",
        });
        xml.atom(kind).await?;
        xml.close(end).await
    }
}

impl QWrite for Owner {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("owner");
        let end = xml.open(start).await?;
        let content = match self {
            Self::Txt(txt) => BytesText::new(txt),
            Self::Raw(markup) => BytesText::from_escaped(markup.as_str()),
            Self::Href(href) => {
                href.qwrite(xml).await?;
                return xml.close(end).await;
            }
        };
        xml.q.write_event_async(Event::Text(content)).await?;
        xml.close(end).await
    }
}

impl QWrite for Depth {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("depth");
        xml.text_element(start, self.as_str()).await
    }
}

impl QWrite for Timeout {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("timeout");
        xml.text_element(start, &self.to_string()).await
    }
}

impl QWrite for LockTokenHref {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("locktoken");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

impl QWrite for LockRoot {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("lockroot");
        let end = xml.open(start).await?;
        self.0.qwrite(xml).await?;
        xml.close(end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realization::Core;
    use crate::xml::{Node, Reader};
    use quick_xml::reader::NsReader;
    use tokio::io::AsyncWriteExt;

    async fn serialize(elem: &impl QWrite) -> String {
        let mut buffer = Vec::new();
        let mut tokio_buffer = tokio::io::BufWriter::new(&mut buffer);
        let q = quick_xml::writer::Writer::new_with_indent(&mut tokio_buffer, b' ', 4);
        let ns_to_apply = vec![("xmlns:D".into(), "DAV:".into())];
        let mut writer = Writer { q, ns_to_apply };

        elem.qwrite(&mut writer).await.expect("xml serialization");
        tokio_buffer.flush().await.expect("tokio buffer flush");
        let got = std::str::from_utf8(buffer.as_slice()).unwrap();

        return got.into();
    }

    async fn deserialize<T: Node<T>>(src: &str) -> T {
        let mut rdr = Reader::new(NsReader::from_reader(src.as_bytes()))
            .await
            .unwrap();
        rdr.find().await.unwrap()
    }

    #[tokio::test]
    async fn basic_href() {
        let orig = Href("/SOGo/dav/so/".into());

        let got = serialize(&orig).await;
        let expected = r#"<D:href xmlns:D="DAV:">/SOGo/dav/so/</D:href>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<Href>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn basic_multistatus() {
        let orig = Multistatus::<Core> {
            responses: vec![],
            responsedescription: Some(ResponseDescription("Hello world".into())),
        };
        let got = serialize(&orig).await;

        let expected = r#"<D:multistatus xmlns:D="DAV:">
    <D:responsedescription>Hello world</D:responsedescription>
</D:multistatus>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<Multistatus<Core>>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn rfc_propname_req() {
        let orig = PropFind::<Core>::PropName;

        let got = serialize(&orig).await;

        let expected = r#"<D:propfind xmlns:D="DAV:">
    <D:propname/>
</D:propfind>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<PropFind<Core>>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn rfc_allprop_include() {
        let orig = PropFind::<Core>::AllProp(Some(Include(vec![
            PropertyRequest::DisplayName,
            PropertyRequest::ResourceType,
            PropertyRequest::Unknown(
                PropertyName::new("http://ns.example.com/boxschema/", "bigbox").with_prefix("R"),
            ),
        ])));

        let got = serialize(&orig).await;

        let expected = r#"<D:propfind xmlns:D="DAV:">
    <D:allprop/>
    <D:include>
        <D:displayname/>
        <D:resourcetype/>
        <R:bigbox xmlns:R="http://ns.example.com/boxschema/"/>
    </D:include>
</D:propfind>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<PropFind<Core>>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn rfc_propertyupdate_keeps_order() {
        let orig = PropertyUpdate::<Core>(vec![
            PropertyUpdateItem::Remove(Remove(PropName(vec![PropertyRequest::Unknown(
                PropertyName::new("http://ns.example.com/z/", "Copyright-Owner").with_prefix("Z"),
            )]))),
            PropertyUpdateItem::Set(Set(PropValue(vec![Property::DisplayName(
                "Q3 report".into(),
            )]))),
        ]);

        let got = serialize(&orig).await;

        let expected = r#"<D:propertyupdate xmlns:D="DAV:">
    <D:remove>
        <D:prop>
            <Z:Copyright-Owner xmlns:Z="http://ns.example.com/z/"/>
        </D:prop>
    </D:remove>
    <D:set>
        <D:prop>
            <D:displayname>Q3 report</D:displayname>
        </D:prop>
    </D:set>
</D:propertyupdate>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<PropertyUpdate<Core>>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn rfc_lockinfo() {
        let orig = LockInfo {
            lockscope: LockScope::Exclusive,
            locktype: LockType::Write,
            owner: Some(Owner::Href(Href(
                "http://example.org/~ejw/contact.html".into(),
            ))),
        };

        let got = serialize(&orig).await;

        let expected = r#"<D:lockinfo xmlns:D="DAV:">
    <D:lockscope>
        <D:exclusive/>
    </D:lockscope>
    <D:locktype>
        <D:write/>
    </D:locktype>
    <D:owner>
        <D:href>http://example.org/~ejw/contact.html</D:href>
    </D:owner>
</D:lockinfo>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<LockInfo>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn text_owner_is_escaped() {
        let orig = LockInfo {
            lockscope: LockScope::Shared,
            locktype: LockType::Write,
            owner: Some(Owner::Txt("Tom & Jerry".into())),
        };

        let got = serialize(&orig).await;
        assert!(got.contains("<D:owner>Tom &amp; Jerry</D:owner>"), "{got}");
        assert_eq!(deserialize::<LockInfo>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn rfc_simple_lock_response() {
        let orig = PropValue::<Core>(vec![Property::LockDiscovery(vec![ActiveLock {
            lockscope: LockScope::Exclusive,
            locktype: LockType::Write,
            depth: Depth::Infinity,
            owner: Some(Owner::Href(Href(
                "http://example.org/~ejw/contact.html".into(),
            ))),
            timeout: Some(Timeout::Seconds(604800)),
            locktoken: Some(LockTokenHref(Href(
                "urn:uuid:e71d4fae-5dec-22d6-fea5-00a0c91e6be4".into(),
            ))),
            lockroot: Some(LockRoot(Href(
                "http://example.com/workspace/webdav/proposal.doc".into(),
            ))),
        }])]);

        let got = serialize(&orig).await;

        let expected = r#"<D:prop xmlns:D="DAV:">
    <D:lockdiscovery>
        <D:activelock>
            <D:locktype>
                <D:write/>
            </D:locktype>
            <D:lockscope>
                <D:exclusive/>
            </D:lockscope>
            <D:depth>infinity</D:depth>
            <D:owner>
                <D:href>http://example.org/~ejw/contact.html</D:href>
            </D:owner>
            <D:timeout>Second-604800</D:timeout>
            <D:locktoken>
                <D:href>urn:uuid:e71d4fae-5dec-22d6-fea5-00a0c91e6be4</D:href>
            </D:locktoken>
            <D:lockroot>
                <D:href>http://example.com/workspace/webdav/proposal.doc</D:href>
            </D:lockroot>
        </D:activelock>
    </D:lockdiscovery>
</D:prop>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<PropValue<Core>>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn rfc_delete_locked2() {
        let orig = Multistatus::<Core> {
            responses: vec![Response {
                status_or_propstat: StatusOrPropstat::Status(
                    vec![Href("http://example.com/container/resource3".into())],
                    Status(http::status::StatusCode::from_u16(423).unwrap()),
                ),
                error: Some(Error(vec![Violation::LockTokenSubmitted(vec![])])),
                responsedescription: None,
                location: None,
            }],
            responsedescription: None,
        };

        let got = serialize(&orig).await;

        let expected = r#"<D:multistatus xmlns:D="DAV:">
    <D:response>
        <D:href>http://example.com/container/resource3</D:href>
        <D:status>HTTP/1.1 423 Locked</D:status>
        <D:error>
            <D:lock-token-submitted/>
        </D:error>
    </D:response>
</D:multistatus>"#;

        assert_eq!(&got, expected, "\n---GOT---\n{got}\n---EXP---\n{expected}\n");
        assert_eq!(deserialize::<Multistatus<Core>>(got.as_str()).await, orig)
    }

    #[tokio::test]
    async fn unknown_property_inner_markup_is_kept() {
        let src = r#"<D:multistatus xmlns:D="DAV:"><D:response><D:href>/a</D:href><D:propstat><D:prop><x:color xmlns:x="urn:ex"><x:rgb a='1'>#ff0000 &amp; more</x:rgb></x:color></D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response></D:multistatus>"#;

        let parsed = deserialize::<Multistatus<Core>>(src).await;
        let propstats = match &parsed.responses[0].status_or_propstat {
            StatusOrPropstat::PropStat(_, propstats) => propstats,
            _ => unreachable!(),
        };
        assert_eq!(
            propstats[0].prop.0[0],
            AnyProperty::Value(Property::Unknown {
                name: PropertyName::new("urn:ex", "color"),
                inner: r#"<x:rgb a='1'>#ff0000 &amp; more</x:rgb>"#.into(),
            })
        );

        let mut buffer = Vec::new();
        let q = quick_xml::writer::Writer::new(&mut buffer);
        let mut writer = Writer {
            q,
            ns_to_apply: vec![("xmlns:D".into(), "DAV:".into())],
        };
        parsed.qwrite(&mut writer).await.expect("xml serialization");
        let got = std::str::from_utf8(buffer.as_slice()).unwrap();

        assert_eq!(got, src);
    }
}
