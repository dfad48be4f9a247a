// utils
pub mod error;
pub mod xml;

// webdav
pub mod decoder;
pub mod encoder;
pub mod types;

// header values
pub mod headers;
pub mod locktoken;

// quota (RFC4331)
pub mod quotadecoder;
pub mod quotaencoder;
pub mod quotatypes;

// microsoft: collection properties, IIS, Win32
pub mod msdecoder;
pub mod msencoder;
pub mod mstypes;

// final type
pub mod realization;
