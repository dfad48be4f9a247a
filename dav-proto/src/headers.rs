//! Header values introduced by RFC 4918 section 10.

use std::fmt;
use std::str::FromStr;

use http::header::HeaderName;

use super::error::{ParsingError, ValueError};
use super::locktoken::LockToken;
use super::types::{Depth, Timeout};

/// 10.1 DAV Header, compliance classes of a resource
pub const DAV: HeaderName = HeaderName::from_static("dav");
/// 10.2 Depth Header
pub const DEPTH: HeaderName = HeaderName::from_static("depth");
/// 10.3 Destination Header
pub const DESTINATION: HeaderName = HeaderName::from_static("destination");
/// 10.4 If Header
pub const IF: HeaderName = HeaderName::from_static("if");
/// 10.5 Lock-Token Header
pub const LOCK_TOKEN: HeaderName = HeaderName::from_static("lock-token");
/// 10.6 Overwrite Header
pub const OVERWRITE: HeaderName = HeaderName::from_static("overwrite");
/// 10.7 Timeout Request Header
pub const TIMEOUT: HeaderName = HeaderName::from_static("timeout");

// ---- Depth

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Infinity => "infinity",
        }
    }
}
impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Depth {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Depth::Zero),
            "1" => Ok(Depth::One),
            v if v.eq_ignore_ascii_case("infinity") => Ok(Depth::Infinity),
            _ => Err(ParsingError::InvalidValue),
        }
    }
}

// ---- Overwrite

/// `T` lets the server replace an existing destination, `F` forbids it
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Overwrite(pub bool);
impl Overwrite {
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            true => "T",
            false => "F",
        }
    }
}
impl fmt::Display for Overwrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Overwrite {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "T" => Ok(Overwrite(true)),
            "F" => Ok(Overwrite(false)),
            _ => Err(ParsingError::InvalidValue),
        }
    }
}

// ---- Timeout

impl Timeout {
    /// A finite timeout, zero is refused
    pub fn seconds(secs: u32) -> Result<Self, ValueError> {
        match secs {
            0 => Err(ValueError::ZeroTimeout),
            n => Ok(Timeout::Seconds(n)),
        }
    }
}
impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(n) => write!(f, "Second-{}", n),
            Self::Infinite => f.write_str("Infinite"),
        }
    }
}
impl FromStr for Timeout {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const SEC_PFX: &str = "second-";
        if s.eq_ignore_ascii_case("infinite") {
            return Ok(Timeout::Infinite);
        }
        match s.get(..SEC_PFX.len()) {
            Some(pfx) if pfx.eq_ignore_ascii_case(SEC_PFX) => {
                Ok(Timeout::Seconds(s[SEC_PFX.len()..].parse::<u32>()?))
            }
            _ => Err(ParsingError::InvalidValue),
        }
    }
}

/// The value of a Timeout request header: candidates in order of preference
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeoutHeader(Vec<Timeout>);
impl TimeoutHeader {
    pub fn new(candidates: Vec<Timeout>) -> Result<Self, ValueError> {
        if candidates.is_empty() {
            return Err(ValueError::NoTimeout);
        }
        if candidates.iter().any(|c| *c == Timeout::Seconds(0)) {
            return Err(ValueError::ZeroTimeout);
        }
        Ok(Self(candidates))
    }

    pub fn candidates(&self) -> &[Timeout] {
        &self.0
    }
}
impl TryFrom<Timeout> for TimeoutHeader {
    type Error = ValueError;

    fn try_from(value: Timeout) -> Result<Self, Self::Error> {
        Self::new(vec![value])
    }
}
impl fmt::Display for TimeoutHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&rendered)
    }
}
impl FromStr for TimeoutHeader {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidates = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|c| !c.is_empty())
            .map(Timeout::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        TimeoutHeader::new(candidates).or(Err(ParsingError::InvalidValue))
    }
}

// ---- If

/// An untagged If header listing lock tokens, each one in its own list
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IfHeader(Vec<LockToken>);
impl IfHeader {
    pub fn new(tokens: Vec<LockToken>) -> Result<Self, ValueError> {
        match tokens.is_empty() {
            true => Err(ValueError::NoToken),
            false => Ok(Self(tokens)),
        }
    }

    pub fn tokens(&self) -> &[LockToken] {
        &self.0
    }
}
impl From<LockToken> for IfHeader {
    fn from(value: LockToken) -> Self {
        Self(vec![value])
    }
}
impl fmt::Display for IfHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.0.iter() {
            f.write_str(&token.if_header_form())?;
        }
        Ok(())
    }
}

// ---- DAV

/// Compliance classes advertised in the DAV response header,
/// e.g. `1, 2, 3, access-control`
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Compliance(pub Vec<String>);
impl Compliance {
    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Class 2 resources support LOCK and UNLOCK
    pub fn supports_locking(&self) -> bool {
        self.contains("2")
    }
}
impl FromStr for Compliance {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Compliance(
            s.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }
}
