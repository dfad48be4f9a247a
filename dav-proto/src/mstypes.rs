//! Properties of the Microsoft WebDAV dialect: the collection properties
//! (draft-hopmann-collection-props), the IIS additions, both in the DAV:
//! namespace, and the Win32 attributes of `urn:schemas-microsoft-com:`.

use chrono::{DateTime, FixedOffset};

use super::xml::{DAV_URN, WIN32_URN};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PropertyRequest {
    // collection properties
    ChildCount,
    DefaultDocument,
    Id,
    IsFolder,
    IsHidden,
    IsStructuredDocument,
    HasSubs,
    NoSubs,
    ObjectCount,
    Reserved,
    VisibleCount,

    // IIS
    ContentClass,
    LastAccessed,
    IsReadOnly,
    IsRoot,
    IsCollection,
    Name,
    ParentName,

    // Win32
    Win32CreationTime,
    Win32LastAccessTime,
    Win32LastModifiedTime,
    Win32FileAttributes,
}

pub(crate) const ALL_REQUESTS: [PropertyRequest; 22] = [
    PropertyRequest::ChildCount,
    PropertyRequest::DefaultDocument,
    PropertyRequest::Id,
    PropertyRequest::IsFolder,
    PropertyRequest::IsHidden,
    PropertyRequest::IsStructuredDocument,
    PropertyRequest::HasSubs,
    PropertyRequest::NoSubs,
    PropertyRequest::ObjectCount,
    PropertyRequest::Reserved,
    PropertyRequest::VisibleCount,
    PropertyRequest::ContentClass,
    PropertyRequest::LastAccessed,
    PropertyRequest::IsReadOnly,
    PropertyRequest::IsRoot,
    PropertyRequest::IsCollection,
    PropertyRequest::Name,
    PropertyRequest::ParentName,
    PropertyRequest::Win32CreationTime,
    PropertyRequest::Win32LastAccessTime,
    PropertyRequest::Win32LastModifiedTime,
    PropertyRequest::Win32FileAttributes,
];

impl PropertyRequest {
    pub fn namespace(&self) -> &'static [u8] {
        use PropertyRequest::*;
        match self {
            Win32CreationTime | Win32LastAccessTime | Win32LastModifiedTime
            | Win32FileAttributes => WIN32_URN,
            _ => DAV_URN,
        }
    }

    pub fn local_name(&self) -> &'static str {
        use PropertyRequest::*;
        match self {
            ChildCount => "childcount",
            DefaultDocument => "defaultdocument",
            Id => "id",
            IsFolder => "isfolder",
            IsHidden => "ishidden",
            IsStructuredDocument => "isstructureddocument",
            HasSubs => "hassubs",
            NoSubs => "nosubs",
            ObjectCount => "objectcount",
            Reserved => "reserved",
            VisibleCount => "visiblecount",
            ContentClass => "contentclass",
            LastAccessed => "lastaccessed",
            IsReadOnly => "isreadonly",
            IsRoot => "isroot",
            IsCollection => "iscollection",
            Name => "name",
            ParentName => "parentname",
            Win32CreationTime => "Win32CreationTime",
            Win32LastAccessTime => "Win32LastAccessTime",
            Win32LastModifiedTime => "Win32LastModifiedTime",
            Win32FileAttributes => "Win32FileAttributes",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Property {
    ChildCount(u64),
    DefaultDocument(String),
    Id(String),
    IsFolder(bool),
    IsHidden(bool),
    IsStructuredDocument(bool),
    HasSubs(bool),
    NoSubs(bool),
    ObjectCount(u64),
    Reserved(bool),
    VisibleCount(u64),

    ContentClass(String),
    /// RFC3339 date-time
    LastAccessed(DateTime<FixedOffset>),
    IsReadOnly(bool),
    IsRoot(bool),
    IsCollection(bool),
    Name(String),
    ParentName(String),

    /// rfc1123-date, like DAV:getlastmodified
    Win32CreationTime(DateTime<FixedOffset>),
    Win32LastAccessTime(DateTime<FixedOffset>),
    Win32LastModifiedTime(DateTime<FixedOffset>),
    /// Hexadecimal attribute mask, e.g. `00000020`
    Win32FileAttributes(String),
}
impl Property {
    pub fn request(&self) -> PropertyRequest {
        use Property::*;
        match self {
            ChildCount(_) => PropertyRequest::ChildCount,
            DefaultDocument(_) => PropertyRequest::DefaultDocument,
            Id(_) => PropertyRequest::Id,
            IsFolder(_) => PropertyRequest::IsFolder,
            IsHidden(_) => PropertyRequest::IsHidden,
            IsStructuredDocument(_) => PropertyRequest::IsStructuredDocument,
            HasSubs(_) => PropertyRequest::HasSubs,
            NoSubs(_) => PropertyRequest::NoSubs,
            ObjectCount(_) => PropertyRequest::ObjectCount,
            Reserved(_) => PropertyRequest::Reserved,
            VisibleCount(_) => PropertyRequest::VisibleCount,
            ContentClass(_) => PropertyRequest::ContentClass,
            LastAccessed(_) => PropertyRequest::LastAccessed,
            IsReadOnly(_) => PropertyRequest::IsReadOnly,
            IsRoot(_) => PropertyRequest::IsRoot,
            IsCollection(_) => PropertyRequest::IsCollection,
            Name(_) => PropertyRequest::Name,
            ParentName(_) => PropertyRequest::ParentName,
            Win32CreationTime(_) => PropertyRequest::Win32CreationTime,
            Win32LastAccessTime(_) => PropertyRequest::Win32LastAccessTime,
            Win32LastModifiedTime(_) => PropertyRequest::Win32LastModifiedTime,
            Win32FileAttributes(_) => PropertyRequest::Win32FileAttributes,
        }
    }
}
