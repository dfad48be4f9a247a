use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParsingError {
    /// The tag under the cursor is not the one asked for
    #[error("element not recognized here")]
    Recoverable,
    #[error("a mandatory child element is missing")]
    MissingChild,
    #[error("unexpected closing tag")]
    WrongToken,
    #[error("invalid value")]
    InvalidValue,
    #[error("invalid utf-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
    #[error("xml: {0}")]
    QuickXml(#[from] quick_xml::Error),
    #[error("date: {0}")]
    Chrono(#[from] chrono::format::ParseError),
    #[error("number: {0}")]
    Int(#[from] std::num::ParseIntError),
    #[error("document ended while expecting data")]
    Eof,
}
impl ParsingError {
    /// Fatal errors leave the reader in an unknown position: the whole
    /// document must be rejected. Other errors are raised once the faulty
    /// element has been consumed and can be isolated by the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::QuickXml(_) | Self::Utf8Error(_) | Self::WrongToken | Self::Eof
        )
    }
}
impl From<AttrError> for ParsingError {
    fn from(value: AttrError) -> Self {
        Self::QuickXml(value.into())
    }
}

/// Raised when building a header value that the protocol forbids
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValueError {
    #[error("a lock token can't be empty")]
    InvalidToken,
    #[error("a timeout of zero second is not allowed")]
    ZeroTimeout,
    #[error("a Timeout header needs at least one candidate")]
    NoTimeout,
    #[error("an If header needs at least one lock token")]
    NoToken,
}
