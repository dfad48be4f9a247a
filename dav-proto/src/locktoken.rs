use std::fmt;
use std::str::FromStr;

use super::error::ValueError;
use super::types::{Href, LockTokenHref};

/// A lock token as it travels in the If and Lock-Token headers.
///
/// The token is stored verbatim: the caller decides whether it is a
/// Coded-URL (`<urn:uuid:...>`) or a bare token, and both header forms are
/// derived from that single value.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct LockToken {
    raw: String,
}
impl LockToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, ValueError> {
        let raw = raw.into();
        match raw.trim().is_empty() {
            true => Err(ValueError::InvalidToken),
            false => Ok(Self { raw }),
        }
    }

    /// Wrap an absolute URI, as found in `DAV:locktoken/DAV:href`,
    /// into a Coded-URL
    pub fn from_absolute_uri(uri: &str) -> Result<Self, ValueError> {
        let uri = uri.trim();
        match uri.is_empty() {
            true => Err(ValueError::InvalidToken),
            false if uri.starts_with('<') && uri.ends_with('>') => Self::new(uri),
            false => Self::new(format!("<{}>", uri)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The token without its angle brackets
    pub fn absolute_uri(&self) -> &str {
        self.raw
            .strip_prefix('<')
            .and_then(|r| r.strip_suffix('>'))
            .unwrap_or(&self.raw)
    }

    /// `(token)`, one list of an If header
    pub fn if_header_form(&self) -> String {
        format!("({})", self.raw)
    }

    /// The token as the Lock-Token header expects it
    pub fn lock_token_header_form(&self) -> &str {
        &self.raw
    }
}
impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
impl FromStr for LockToken {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockToken::new(s.trim())
    }
}
impl TryFrom<&LockTokenHref> for LockToken {
    type Error = ValueError;

    fn try_from(value: &LockTokenHref) -> Result<Self, Self::Error> {
        LockToken::from_absolute_uri(&value.0 .0)
    }
}
impl From<&LockToken> for LockTokenHref {
    fn from(value: &LockToken) -> Self {
        LockTokenHref(Href(value.absolute_uri().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_forms() {
        let token = LockToken::new("opaquelocktoken:abc123").unwrap();
        assert_eq!(token.if_header_form(), "(opaquelocktoken:abc123)");
        assert_eq!(token.lock_token_header_form(), "opaquelocktoken:abc123");

        let coded = LockToken::new("<opaquelocktoken:abc123>").unwrap();
        assert_eq!(coded.if_header_form(), "(<opaquelocktoken:abc123>)");
        assert_eq!(coded.lock_token_header_form(), "<opaquelocktoken:abc123>");
        assert_ne!(token, coded);
    }

    #[test]
    fn empty_token_is_refused() {
        assert_eq!(LockToken::new(""), Err(ValueError::InvalidToken));
        assert_eq!(LockToken::new("   "), Err(ValueError::InvalidToken));
        assert_eq!(
            LockToken::from_absolute_uri(""),
            Err(ValueError::InvalidToken)
        );
    }

    #[test]
    fn from_xml_href() {
        let href = LockTokenHref(Href(
            "urn:uuid:e71d4fae-5dec-22d6-fea5-00a0c91e6be4".into(),
        ));
        let token = LockToken::try_from(&href).unwrap();
        assert_eq!(
            token.as_str(),
            "<urn:uuid:e71d4fae-5dec-22d6-fea5-00a0c91e6be4>"
        );
        assert_eq!(
            token.absolute_uri(),
            "urn:uuid:e71d4fae-5dec-22d6-fea5-00a0c91e6be4"
        );
        assert_eq!(LockTokenHref::from(&token), href);

        // already a Coded-URL
        let same = LockToken::from_absolute_uri(token.as_str()).unwrap();
        assert_eq!(same, token);
    }
}
