use chrono::DateTime;
use quick_xml::events::Event;

use super::error::ParsingError;
use super::types::*;
use super::xml::{IRead, Node, QRead, Reader, DAV_URN};

// ---- helpers

/// `<D:key>text</D:key>`, untrimmed
async fn dav_text(xml: &mut Reader<impl IRead>, key: &str) -> Result<String, ParsingError> {
    xml.open(DAV_URN, key).await?;
    let txt = xml.tag_string().await?;
    xml.close().await?;
    Ok(txt)
}

/// `<D:key>` wrapping a single `N`
async fn dav_wrapped<N: Node<N>>(
    xml: &mut Reader<impl IRead>,
    key: &str,
) -> Result<N, ParsingError> {
    xml.open(DAV_URN, key).await?;
    let inner = xml.find::<N>().await?;
    xml.close().await?;
    Ok(inner)
}

/// `<D:key>` wrapping any number of `N`
async fn dav_list<N: Node<N>>(
    xml: &mut Reader<impl IRead>,
    key: &str,
) -> Result<Vec<N>, ParsingError> {
    xml.open(DAV_URN, key).await?;
    let items = xml.collect::<N>().await?;
    xml.close().await?;
    Ok(items)
}

async fn element_list<N: Node<N>>(xml: &mut Reader<impl IRead>) -> Result<Vec<N>, ParsingError> {
    xml.open_any().await?;
    let items = xml.collect::<N>().await?;
    xml.close().await?;
    Ok(items)
}

async fn consume_element(xml: &mut Reader<impl IRead>) -> Result<(), ParsingError> {
    xml.open_any().await?;
    xml.close().await
}

/// The one `DAV:` child of the opened tag that `choose` knows about,
/// e.g. `<D:exclusive/>` in a lockscope
async fn pick<T>(
    xml: &mut Reader<impl IRead>,
    choose: fn(&str) -> Option<T>,
) -> Result<T, ParsingError> {
    if !xml.parent_has_child() {
        return Err(ParsingError::MissingChild);
    }
    loop {
        if let Some(picked) = xml.dav_local().as_deref().and_then(choose) {
            consume_element(xml).await?;
            return Ok(picked);
        }
        if xml.exhausted().await? {
            return Err(ParsingError::MissingChild);
        }
    }
}

// ---- documents

impl<E: Extension> QRead<PropFind<E>> for PropFind<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "propfind").await?;
        let request = loop {
            match xml.dav_local().as_deref() {
                Some("propname") => {
                    consume_element(xml).await?;
                    break PropFind::PropName;
                }
                Some("allprop") => {
                    consume_element(xml).await?;
                    break PropFind::AllProp(xml.maybe_find::<Include<E>>().await?);
                }
                Some("prop") => break PropFind::Prop(PropName::qread(xml).await?),
                // an empty propfind asks for everything
                _ => {
                    if xml.exhausted().await? {
                        break PropFind::AllProp(None);
                    }
                }
            }
        };
        xml.close().await?;
        Ok(request)
    }
}

impl<E: Extension> QRead<PropertyUpdate<E>> for PropertyUpdate<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_list(xml, "propertyupdate").await.map(PropertyUpdate)
    }
}

/// Responses that fail to decode are dropped, their siblings are kept
impl<E: Extension> QRead<Multistatus<E>> for Multistatus<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "multistatus").await?;
        let mut multistatus = Multistatus {
            responses: Vec::new(),
            responsedescription: None,
        };
        loop {
            match xml.dav_local().as_deref() {
                Some("response") => multistatus
                    .responses
                    .extend(xml.lenient::<Response<E>>().await?),
                Some("responsedescription") => {
                    multistatus.responsedescription = Some(ResponseDescription::qread(xml).await?)
                }
                _ => {
                    if xml.exhausted().await? {
                        break;
                    }
                }
            }
        }
        xml.close().await?;
        Ok(multistatus)
    }
}

impl QRead<LockInfo> for LockInfo {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "lockinfo").await?;
        let (mut scope, mut kind, mut owner) = (None, None, None);
        loop {
            match xml.dav_local().as_deref() {
                Some("lockscope") => scope = Some(LockScope::qread(xml).await?),
                Some("locktype") => kind = Some(LockType::qread(xml).await?),
                Some("owner") => owner = Some(Owner::qread(xml).await?),
                _ => {
                    if xml.exhausted().await? {
                        break;
                    }
                }
            }
        }
        xml.close().await?;
        Ok(LockInfo {
            lockscope: scope.ok_or(ParsingError::MissingChild)?,
            locktype: kind.ok_or(ParsingError::MissingChild)?,
            owner,
        })
    }
}

impl<E: Extension> QRead<PropValue<E>> for PropValue<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_list(xml, "prop").await.map(PropValue)
    }
}

impl<E: Extension> QRead<Error<E>> for Error<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_list(xml, "error").await.map(Error)
    }
}

// ---- multistatus content

impl<E: Extension> QRead<Response<E>> for Response<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "response").await?;
        let (mut hrefs, mut propstats) = (Vec::new(), Vec::new());
        let (mut status, mut error, mut description, mut location) = (None, None, None, None);
        loop {
            match xml.dav_local().as_deref() {
                Some("href") => hrefs.push(Href::qread(xml).await?),
                Some("status") => status = Some(Status::qread(xml).await?),
                Some("propstat") => propstats.extend(xml.lenient::<PropStat<E>>().await?),
                Some("error") => error = Some(Error::<E>::qread(xml).await?),
                Some("responsedescription") => {
                    description = Some(ResponseDescription::qread(xml).await?)
                }
                Some("location") => location = Some(Location::qread(xml).await?),
                _ => {
                    if xml.exhausted().await? {
                        break;
                    }
                }
            }
        }
        xml.close().await?;

        // either hrefs sharing a status, or a single href with its propstats
        let status_or_propstat = match (status, propstats.is_empty()) {
            (Some(_), false) => return Err(ParsingError::InvalidValue),
            (Some(status), true) if !hrefs.is_empty() => StatusOrPropstat::Status(hrefs, status),
            (None, false) => {
                let href = hrefs.into_iter().next().ok_or(ParsingError::MissingChild)?;
                StatusOrPropstat::PropStat(href, propstats)
            }
            _ => return Err(ParsingError::MissingChild),
        };

        Ok(Response {
            status_or_propstat,
            error,
            responsedescription: description,
            location,
        })
    }
}

impl<E: Extension> QRead<PropStat<E>> for PropStat<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "propstat").await?;
        let (mut prop, mut status, mut error, mut description) = (None, None, None, None);
        loop {
            match xml.dav_local().as_deref() {
                Some("prop") => prop = Some(AnyProp::<E>::qread(xml).await?),
                Some("status") => status = Some(Status::qread(xml).await?),
                Some("error") => error = Some(Error::<E>::qread(xml).await?),
                Some("responsedescription") => {
                    description = Some(ResponseDescription::qread(xml).await?)
                }
                _ => {
                    if xml.exhausted().await? {
                        break;
                    }
                }
            }
        }
        xml.close().await?;

        Ok(PropStat {
            prop: prop.ok_or(ParsingError::MissingChild)?,
            status: status.ok_or(ParsingError::MissingChild)?,
            error,
            responsedescription: description,
        })
    }
}

impl QRead<Status> for Status {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        // HTTP/1.1 404 Not Found
        let line = dav_text(xml, "status").await?;
        let code = line
            .split_whitespace()
            .nth(1)
            .ok_or(ParsingError::InvalidValue)?;
        http::StatusCode::from_bytes(code.as_bytes())
            .map(Status)
            .map_err(|_| ParsingError::InvalidValue)
    }
}

impl QRead<ResponseDescription> for ResponseDescription {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_text(xml, "responsedescription")
            .await
            .map(ResponseDescription)
    }
}

impl QRead<Location> for Location {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_wrapped(xml, "location").await.map(Location)
    }
}

impl<E: Extension> QRead<PropertyUpdateItem<E>> for PropertyUpdateItem<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        match xml.dav_local().as_deref() {
            Some("set") => Set::qread(xml).await.map(PropertyUpdateItem::Set),
            Some("remove") => Remove::qread(xml).await.map(PropertyUpdateItem::Remove),
            _ => Err(ParsingError::Recoverable),
        }
    }
}

impl<E: Extension> QRead<Remove<E>> for Remove<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_wrapped(xml, "remove").await.map(Remove)
    }
}

impl<E: Extension> QRead<Set<E>> for Set<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_wrapped(xml, "set").await.map(Set)
    }
}

/// Condition codes nobody taught us are kept by name
impl<E: Extension> QRead<Violation<E>> for Violation<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        let name = xml.element_name()?;
        let known = match name.dav_local() {
            Some("lock-token-matches-request-uri") => Some(Violation::LockTokenMatchesRequestUri),
            Some("lock-token-submitted") => Some(Violation::LockTokenSubmitted(Vec::new())),
            Some("no-conflicting-lock") => Some(Violation::NoConflictingLock(Vec::new())),
            Some("no-external-entities") => Some(Violation::NoExternalEntities),
            Some("preserved-live-properties") => Some(Violation::PreservedLiveProperties),
            Some("propfind-finite-depth") => Some(Violation::PropfindFiniteDepth),
            Some("cannot-modify-protected-property") => {
                Some(Violation::CannotModifyProtectedProperty)
            }
            _ => None,
        };

        if let Some(mut violation) = known {
            xml.open_any().await?;
            if let Violation::LockTokenSubmitted(hrefs) | Violation::NoConflictingLock(hrefs) =
                &mut violation
            {
                *hrefs = xml.collect::<Href>().await?;
            }
            xml.close().await?;
            return Ok(violation);
        }

        if let Some(ext) = xml.attempt::<E::Error>().await? {
            return Ok(Violation::Extension(ext));
        }
        consume_element(xml).await?;
        Ok(Violation::Unknown(name))
    }
}

// ---- properties

impl<E: Extension> QRead<Include<E>> for Include<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_list(xml, "include").await.map(Include)
    }
}

impl<E: Extension> QRead<PropName<E>> for PropName<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_list(xml, "prop").await.map(PropName)
    }
}

impl<E: Extension> QRead<AnyProp<E>> for AnyProp<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_list(xml, "prop").await.map(AnyProp)
    }
}

/// A tag with content is a value, a self-closed one is a name
impl<E: Extension> QRead<AnyProperty<E>> for AnyProperty<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        match xml.attempt::<Property<E>>().await? {
            Some(value) => Ok(AnyProperty::Value(value)),
            None => PropertyRequest::qread(xml).await.map(AnyProperty::Request),
        }
    }
}

fn core_request<E: Extension>(local: &str) -> Option<PropertyRequest<E>> {
    use PropertyRequest as R;
    let req = match local {
        "creationdate" => R::CreationDate,
        "displayname" => R::DisplayName,
        "getcontentlanguage" => R::GetContentLanguage,
        "getcontentlength" => R::GetContentLength,
        "getcontenttype" => R::GetContentType,
        "getetag" => R::GetEtag,
        "getlastmodified" => R::GetLastModified,
        "lockdiscovery" => R::LockDiscovery,
        "resourcetype" => R::ResourceType,
        "supportedlock" => R::SupportedLock,
        _ => return None,
    };
    Some(req)
}

impl<E: Extension> QRead<PropertyRequest<E>> for PropertyRequest<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        let name = xml.element_name()?;
        if let Some(req) = name.dav_local().and_then(core_request::<E>) {
            consume_element(xml).await?;
            return Ok(req);
        }
        if let Some(ext) = xml.attempt::<E::PropertyRequest>().await? {
            return Ok(PropertyRequest::Extension(ext));
        }
        consume_element(xml).await?;
        Ok(PropertyRequest::Unknown(name))
    }
}

/// Property values are read on a best effort basis: an element we don't
/// know, or whose content does not decode, is kept as-is with its markup.
impl<E: Extension> QRead<Property<E>> for Property<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        // a self-closed element is a property name, not a value
        if !matches!(xml.peek(), Event::Start(_)) {
            return Err(ParsingError::Recoverable);
        }
        let name = xml.element_name()?;

        let depth = xml.depth();
        xml.start_recording();
        let typed = typed_property::<E>(xml, &name).await;
        let untouched = xml.recorded_len() == 0 && xml.depth() == depth;

        let outcome = match typed {
            Ok(prop) => Ok(Some(prop)),
            Err(e) if e.is_fatal() => Err(e),
            Err(ParsingError::Recoverable) if untouched => consume_element(xml).await.map(|_| None),
            Err(e) => {
                tracing::warn!(
                    property=%name,
                    err=%e,
                    "unable to decode property value, keeping it raw"
                );
                xml.unwind(depth).await.map(|_| None)
            }
        };
        let rec = xml.stop_recording();

        match outcome? {
            Some(prop) => Ok(prop),
            None => Ok(Property::Unknown {
                name,
                inner: rec.inner().markup()?,
            }),
        }
    }
}

async fn typed_property<E: Extension>(
    xml: &mut Reader<impl IRead>,
    name: &PropertyName,
) -> Result<Property<E>, ParsingError> {
    let prop = match name.dav_local() {
        Some("creationdate") => {
            let date = xml.element_text().await?;
            Property::CreationDate(DateTime::parse_from_rfc3339(date.trim())?)
        }
        Some("displayname") => Property::DisplayName(xml.element_text().await?),
        Some("getcontentlanguage") => Property::GetContentLanguage(xml.element_text().await?),
        Some("getcontentlength") => {
            Property::GetContentLength(xml.element_text().await?.trim().parse()?)
        }
        Some("getcontenttype") => Property::GetContentType(xml.element_text().await?),
        Some("getetag") => Property::GetEtag(xml.element_text().await?),
        Some("getlastmodified") => {
            let date = xml.element_text().await?;
            Property::GetLastModified(DateTime::parse_from_rfc2822(date.trim())?)
        }
        Some("lockdiscovery") => Property::LockDiscovery(element_list(xml).await?),
        Some("resourcetype") => Property::ResourceType(element_list(xml).await?),
        Some("supportedlock") => Property::SupportedLock(element_list(xml).await?),
        _ => return E::Property::qread(xml).await.map(Property::Extension),
    };
    Ok(prop)
}

// ---- locks

impl QRead<ActiveLock> for ActiveLock {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "activelock").await?;
        let (mut scope, mut kind, mut depth, mut owner) = (None, None, None, None);
        let (mut timeout, mut token, mut root) = (None, None, None);
        loop {
            match xml.dav_local().as_deref() {
                Some("lockscope") => scope = Some(LockScope::qread(xml).await?),
                Some("locktype") => kind = Some(LockType::qread(xml).await?),
                Some("depth") => depth = Some(Depth::qread(xml).await?),
                Some("owner") => owner = Some(Owner::qread(xml).await?),
                Some("timeout") => timeout = Some(Timeout::qread(xml).await?),
                Some("locktoken") => token = Some(LockTokenHref::qread(xml).await?),
                Some("lockroot") => root = Some(LockRoot::qread(xml).await?),
                _ => {
                    if xml.exhausted().await? {
                        break;
                    }
                }
            }
        }
        xml.close().await?;

        Ok(ActiveLock {
            lockscope: scope.ok_or(ParsingError::MissingChild)?,
            locktype: kind.ok_or(ParsingError::MissingChild)?,
            depth: depth.ok_or(ParsingError::MissingChild)?,
            owner,
            timeout,
            locktoken: token,
            lockroot: root,
        })
    }
}

impl QRead<Depth> for Depth {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_text(xml, "depth").await?.trim().parse()
    }
}

impl QRead<Owner> for Owner {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "owner").await?;

        xml.start_recording();
        let scanned = scan_owner(xml).await;
        let rec = xml.stop_recording();
        let (mut hrefs, others) = scanned?;
        xml.close().await?;

        let txt = rec.text()?;
        match (hrefs.len(), others) {
            (0, 0) => Ok(Owner::Txt(txt)),
            (1, 0) if txt.trim().is_empty() => Ok(Owner::Href(hrefs.remove(0))),
            _ => Ok(Owner::Raw(rec.markup()?)),
        }
    }
}

// Walk the content of an owner element, counting hrefs and other elements
async fn scan_owner(xml: &mut Reader<impl IRead>) -> Result<(Vec<Href>, usize), ParsingError> {
    let (mut hrefs, mut others) = (Vec::new(), 0usize);
    if !xml.parent_has_child() {
        return Ok((hrefs, others));
    }

    loop {
        match xml.peek() {
            Event::End(_) => return Ok((hrefs, others)),
            Event::Start(_) | Event::Empty(_) => match xml.attempt::<Href>().await? {
                Some(href) => hrefs.push(href),
                None => {
                    others += 1;
                    xml.skip().await?;
                }
            },
            _ => xml.skip().await?,
        }
    }
}

impl QRead<Timeout> for Timeout {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_text(xml, "timeout").await?.trim().parse()
    }
}

impl QRead<LockTokenHref> for LockTokenHref {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_wrapped(xml, "locktoken").await.map(LockTokenHref)
    }
}

impl QRead<LockRoot> for LockRoot {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        dav_wrapped(xml, "lockroot").await.map(LockRoot)
    }
}

/// Any child we don't know identifies a resource type of its own
impl<E: Extension> QRead<ResourceType<E>> for ResourceType<E> {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        let name = xml.element_name()?;
        if name.dav_local() == Some("collection") {
            consume_element(xml).await?;
            return Ok(ResourceType::Collection);
        }
        if let Some(ext) = xml.attempt::<E::ResourceType>().await? {
            return Ok(ResourceType::Extension(ext));
        }
        consume_element(xml).await?;
        Ok(ResourceType::Unknown(name))
    }
}

impl QRead<LockEntry> for LockEntry {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "lockentry").await?;
        let (mut scope, mut kind) = (None, None);
        loop {
            match xml.dav_local().as_deref() {
                Some("lockscope") => scope = Some(LockScope::qread(xml).await?),
                Some("locktype") => kind = Some(LockType::qread(xml).await?),
                _ => {
                    if xml.exhausted().await? {
                        break;
                    }
                }
            }
        }
        xml.close().await?;

        Ok(LockEntry {
            lockscope: scope.ok_or(ParsingError::MissingChild)?,
            locktype: kind.ok_or(ParsingError::MissingChild)?,
        })
    }
}

impl QRead<LockScope> for LockScope {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "lockscope").await?;
        let scope = pick(xml, |local| match local {
            "exclusive" => Some(LockScope::Exclusive),
            "shared" => Some(LockScope::Shared),
            _ => None,
        })
        .await;
        xml.close().await?;
        scope
    }
}

impl QRead<LockType> for LockType {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "locktype").await?;
        let kind = pick(xml, |local| (local == "write").then_some(LockType::Write)).await;
        xml.close().await?;
        kind
    }
}

impl QRead<Href> for Href {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        let url = dav_text(xml, "href").await?;
        Ok(Href(url.trim().to_string()))
    }
}
