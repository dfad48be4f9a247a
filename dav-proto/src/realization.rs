//! Concrete vocabularies to instantiate the generic types with.

use super::error::ParsingError;
use super::mstypes as ms;
use super::quotatypes as quota;
use super::types as dav;
use super::xml::{IRead, IWrite, QRead, QWrite, Reader, Writer};

/// Fills the extension slots a vocabulary does not use.
/// No value of this type exists, decoding one always fails.
#[derive(Debug, PartialEq, Clone)]
pub enum Unused {}

impl QRead<Unused> for Unused {
    async fn qread(_: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        Err(ParsingError::Recoverable)
    }
}
impl QWrite for Unused {
    async fn qwrite(&self, _: &mut Writer<impl IWrite>) -> Result<(), quick_xml::Error> {
        match *self {}
    }
}

/// RFC 4918 only
#[derive(Debug, PartialEq, Clone)]
pub struct Core {}
impl dav::Extension for Core {
    type Error = Unused;
    type Property = Unused;
    type PropertyRequest = Unused;
    type ResourceType = Unused;
}

/// Adds the RFC 4331 quota properties
#[derive(Debug, PartialEq, Clone)]
pub struct Quota {}
impl dav::Extension for Quota {
    type Error = Unused;
    type Property = quota::Property;
    type PropertyRequest = quota::PropertyRequest;
    type ResourceType = Unused;
}

/// Adds the `Win32*` properties of IIS and the Windows mini-redirector
#[derive(Debug, PartialEq, Clone)]
pub struct Microsoft {}
impl dav::Extension for Microsoft {
    type Error = Unused;
    type Property = ms::Property;
    type PropertyRequest = ms::PropertyRequest;
    type ResourceType = Unused;
}

/// Quota and Microsoft together, what the client speaks
#[derive(Debug, PartialEq, Clone)]
pub struct All {}
impl dav::Extension for All {
    type Error = Unused;
    type Property = Property;
    type PropertyRequest = PropertyRequest;
    type ResourceType = Unused;
}

#[derive(Debug, PartialEq, Clone)]
pub enum Property {
    Quota(quota::Property),
    Ms(ms::Property),
}
impl QRead<Property> for Property {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        if let Some(q) = xml.attempt::<quota::Property>().await? {
            return Ok(Self::Quota(q));
        }
        ms::Property::qread(xml).await.map(Self::Ms)
    }
}
impl QWrite for Property {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), quick_xml::Error> {
        match self {
            Self::Quota(inner) => inner.qwrite(xml).await,
            Self::Ms(inner) => inner.qwrite(xml).await,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum PropertyRequest {
    Quota(quota::PropertyRequest),
    Ms(ms::PropertyRequest),
}
impl QRead<PropertyRequest> for PropertyRequest {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        if let Some(q) = xml.attempt::<quota::PropertyRequest>().await? {
            return Ok(Self::Quota(q));
        }
        ms::PropertyRequest::qread(xml).await.map(Self::Ms)
    }
}
impl QWrite for PropertyRequest {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), quick_xml::Error> {
        match self {
            Self::Quota(inner) => inner.qwrite(xml).await,
            Self::Ms(inner) => inner.qwrite(xml).await,
        }
    }
}
