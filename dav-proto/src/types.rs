//! The WebDAV XML vocabulary (RFC 4918 section 14 and 15)
//!
//! Types are generic over an [`Extension`] so that a client can choose
//! which extra properties it knows how to type. Anything else stays
//! available under its [`PropertyName`].

use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use super::xml;
use chrono::{DateTime, FixedOffset};

/// The extra vocabulary understood on top of RFC 4918,
/// see [`crate::realization`] for the available sets.
pub trait Extension: std::fmt::Debug + PartialEq + Clone + Send + Sync {
    type Error: xml::Node<Self::Error>;
    type Property: xml::Node<Self::Property>;
    type PropertyRequest: xml::Node<Self::PropertyRequest>;
    type ResourceType: xml::Node<Self::ResourceType>;
}

/// Name of an element as found on the wire: the namespace it resolved to,
/// the prefix it was written with, and its local part.
///
/// Two names are equal when namespace and local part match,
/// the prefix is only kept to write the element back the same way.
#[derive(Debug, Clone)]
pub struct PropertyName {
    pub ns: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}
impl PropertyName {
    pub fn new(ns: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            ns: Some(ns.into()),
            prefix: None,
            local: local.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The local part, for names of the `DAV:` namespace only
    pub fn dav_local(&self) -> Option<&str> {
        match self.ns.as_deref() {
            Some(ns) if ns.as_bytes() == xml::DAV_URN => Some(self.local.as_str()),
            _ => None,
        }
    }
}
impl PartialEq for PropertyName {
    fn eq(&self, other: &Self) -> bool {
        self.ns == other.ns && self.local == other.local
    }
}
impl Eq for PropertyName {}
impl Hash for PropertyName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns.hash(state);
        self.local.hash(state);
    }
}
impl std::fmt::Display for PropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

// ---- request bodies

/// Body of a PROPFIND. A request without body means `AllProp(None)`.
#[derive(Debug, PartialEq, Clone)]
pub enum PropFind<E: Extension> {
    PropName,
    AllProp(Option<Include<E>>),
    Prop(PropName<E>),
}

/// Extra properties to return along with an allprop
#[derive(Debug, PartialEq, Clone)]
pub struct Include<E: Extension>(pub Vec<PropertyRequest<E>>);

/// Body of a PROPPATCH, the server applies the items in document order
#[derive(Debug, PartialEq, Clone)]
pub struct PropertyUpdate<E: Extension>(pub Vec<PropertyUpdateItem<E>>);

#[derive(Debug, PartialEq, Clone)]
pub enum PropertyUpdateItem<E: Extension> {
    Remove(Remove<E>),
    Set(Set<E>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Remove<E: Extension>(pub PropName<E>);

#[derive(Debug, PartialEq, Clone)]
pub struct Set<E: Extension>(pub PropValue<E>);

/// Body of a LOCK request creating a new lock.
/// Refreshing a lock is done without body.
#[derive(Debug, PartialEq, Clone)]
pub struct LockInfo {
    pub lockscope: LockScope,
    pub locktype: LockType,
    pub owner: Option<Owner>,
}

// ---- responses

/// A 207 Multi-Status body
#[derive(Debug, PartialEq, Clone)]
pub struct Multistatus<E: Extension> {
    pub responses: Vec<Response<E>>,
    pub responsedescription: Option<ResponseDescription>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Response<E: Extension> {
    pub status_or_propstat: StatusOrPropstat<E>,
    pub error: Option<Error<E>>,
    pub responsedescription: Option<ResponseDescription>,
    pub location: Option<Location>,
}
impl<E: Extension> Response<E> {
    pub fn hrefs(&self) -> Vec<&Href> {
        match &self.status_or_propstat {
            StatusOrPropstat::Status(hrefs, _) => hrefs.iter().collect(),
            StatusOrPropstat::PropStat(href, _) => vec![href],
        }
    }

    /// Properties returned with the given status
    pub fn properties(&self, code: http::StatusCode) -> impl Iterator<Item = &AnyProperty<E>> {
        let propstats = match &self.status_or_propstat {
            StatusOrPropstat::PropStat(_, propstats) => propstats.as_slice(),
            StatusOrPropstat::Status(..) => &[],
        };
        propstats
            .iter()
            .filter(move |ps| ps.status.0 == code)
            .flat_map(|ps| ps.prop.0.iter())
    }
}

/// A response either reports one status for one or more resources,
/// or the per-property outcome for exactly one resource.
#[derive(Debug, PartialEq, Clone)]
pub enum StatusOrPropstat<E: Extension> {
    Status(Vec<Href>, Status),
    PropStat(Href, Vec<PropStat<E>>),
}

/// Properties sharing the same outcome
#[derive(Debug, PartialEq, Clone)]
pub struct PropStat<E: Extension> {
    pub prop: AnyProp<E>,
    pub status: Status,
    pub error: Option<Error<E>>,
    pub responsedescription: Option<ResponseDescription>,
}

/// Only the code of the status line is kept,
/// the reason phrase is rebuilt when writing.
#[derive(Debug, PartialEq, Clone)]
pub struct Status(pub http::status::StatusCode);

#[derive(Debug, PartialEq, Clone)]
pub struct ResponseDescription(pub String);

/// Where the client should go next, e.g. after a 301
#[derive(Debug, PartialEq, Clone)]
pub struct Location(pub Href);

#[derive(Debug, PartialEq, Clone)]
pub struct Href(pub String);

/// Body of an error response: the pre/postconditions that failed
#[derive(Debug, PartialEq, Clone)]
pub struct Error<E: Extension>(pub Vec<Violation<E>>);

#[derive(Debug, PartialEq, Clone)]
pub enum Violation<E: Extension> {
    /// 409, the Lock-Token header does not match the request URI
    LockTokenMatchesRequestUri,
    /// 423, one of the listed resources needed a lock token
    LockTokenSubmitted(Vec<Href>),
    /// 423, a conflicting lock is held on the listed roots
    NoConflictingLock(Vec<Href>),
    /// 403
    NoExternalEntities,
    /// 409
    PreservedLiveProperties,
    /// 403, depth infinity PROPFIND refused
    PropfindFiniteDepth,
    /// 403
    CannotModifyProtectedProperty,
    Extension(E::Error),
    Unknown(PropertyName),
}

// ---- properties

/// Content of a `prop` element holding names only
#[derive(Debug, PartialEq, Clone)]
pub struct PropName<E: Extension>(pub Vec<PropertyRequest<E>>);

/// Content of a `prop` element holding values only
#[derive(Debug, PartialEq, Clone)]
pub struct PropValue<E: Extension>(pub Vec<Property<E>>);

/// Content of a `prop` element in a propstat, a 404 propstat
/// lists names while a 200 one lists values.
#[derive(Debug, PartialEq, Clone)]
pub struct AnyProp<E: Extension>(pub Vec<AnyProperty<E>>);

#[derive(Debug, PartialEq, Clone)]
pub enum AnyProperty<E: Extension> {
    Request(PropertyRequest<E>),
    Value(Property<E>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum PropertyRequest<E: Extension> {
    CreationDate,
    DisplayName,
    GetContentLanguage,
    GetContentLength,
    GetContentType,
    GetEtag,
    GetLastModified,
    LockDiscovery,
    ResourceType,
    SupportedLock,
    Extension(E::PropertyRequest),
    Unknown(PropertyName),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Property<E: Extension> {
    /// RFC 3339
    CreationDate(DateTime<FixedOffset>),
    DisplayName(String),
    GetContentLanguage(String),
    GetContentLength(u64),
    GetContentType(String),
    GetEtag(String),
    /// rfc1123-date, as in HTTP headers
    GetLastModified(DateTime<FixedOffset>),
    LockDiscovery(Vec<ActiveLock>),
    /// A collection may also carry other, unknown, resource types
    ResourceType(Vec<ResourceType<E>>),
    SupportedLock(Vec<LockEntry>),
    Extension(E::Property),
    /// A property we can't type, or whose value did not decode.
    /// `inner` is the markup found between the start and end tags,
    /// byte for byte.
    Unknown { name: PropertyName, inner: String },
}

#[derive(Debug, PartialEq, Clone)]
pub enum ResourceType<E: Extension> {
    Collection,
    Extension(E::ResourceType),
    Unknown(PropertyName),
}

// ---- locks

/// A lock as reported by lockdiscovery.
/// Some servers omit the lockroot, it is optional here.
#[derive(Debug, PartialEq, Clone)]
pub struct ActiveLock {
    pub lockscope: LockScope,
    pub locktype: LockType,
    pub depth: Depth,
    pub owner: Option<Owner>,
    pub timeout: Option<Timeout>,
    pub locktoken: Option<LockTokenHref>,
    pub lockroot: Option<LockRoot>,
}

/// A kind of lock the resource supports
#[derive(Debug, PartialEq, Clone)]
pub struct LockEntry {
    pub lockscope: LockScope,
    pub locktype: LockType,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LockScope {
    Exclusive,
    Shared,
}

/// Write locks are the only kind defined
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LockType {
    Write,
}

/// Shared by the XML element and the Depth header
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}

/// `Second-n` or `Infinite`, n fits in 32 bits.
/// Also one candidate of the Timeout header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Timeout {
    Seconds(u32),
    Infinite,
}

/// The lock owner is a dead property for the server: what can't be
/// read as plain text or as a single href is kept as raw markup.
#[derive(Debug, PartialEq, Clone)]
pub enum Owner {
    Txt(String),
    Href(Href),
    Raw(String),
}

/// The lock token URI as carried in XML,
/// see [`crate::locktoken::LockToken`] for the header side.
#[derive(Debug, PartialEq, Clone)]
pub struct LockTokenHref(pub Href);

/// The resource the lock was taken on
#[derive(Debug, PartialEq, Clone)]
pub struct LockRoot(pub Href);
