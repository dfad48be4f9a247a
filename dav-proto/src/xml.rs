use futures::Future;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::error::ParsingError;
use super::types::PropertyName;

pub const DAV_URN: &[u8] = b"DAV:";
pub const WIN32_URN: &[u8] = b"urn:schemas-microsoft-com:";

pub trait IWrite: AsyncWrite + Unpin + Send {}
impl<T: AsyncWrite + Unpin + Send> IWrite for T {}
pub trait IRead: AsyncBufRead + Unpin + Send {}
impl<T: AsyncBufRead + Unpin + Send> IRead for T {}

pub trait QWrite {
    fn qwrite(
        &self,
        xml: &mut Writer<impl IWrite>,
    ) -> impl Future<Output = Result<(), quick_xml::Error>> + Send;
}

/// `ParsingError::Recoverable` means the tag under the cursor is not a `T`,
/// in which case nothing has been consumed.
pub trait QRead<T> {
    fn qread(
        xml: &mut Reader<impl IRead>,
    ) -> impl Future<Output = Result<T, ParsingError>> + Send;
}

/// An XML element with its Rust representation
pub trait Node<T>: QRead<T> + QWrite + std::fmt::Debug + PartialEq + Clone + Send + Sync {}
impl<T: QRead<T> + QWrite + std::fmt::Debug + PartialEq + Clone + Send + Sync> Node<T> for T {}

impl<N: QWrite + Sync> QWrite for Option<N> {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), quick_xml::Error> {
        match self {
            Some(node) => node.qwrite(xml).await,
            None => Ok(()),
        }
    }
}

impl<N: QWrite + Sync> QWrite for [N] {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), quick_xml::Error> {
        for node in self {
            node.qwrite(xml).await?;
        }
        Ok(())
    }
}

// ---- writing

pub struct Writer<T: IWrite> {
    pub q: quick_xml::writer::Writer<T>,
    /// Declarations put on the next element created, usually the root
    pub ns_to_apply: Vec<(String, String)>,
}
impl<T: IWrite> Writer<T> {
    pub fn create_dav_element(&mut self, name: &str) -> BytesStart<'static> {
        self.prefixed("D", name)
    }

    pub fn create_win32_element(&mut self, name: &str) -> BytesStart<'static> {
        self.prefixed("Z", name)
    }

    /// Elements outside of the known namespaces carry their own declaration,
    /// reusing the prefix they were read with.
    pub fn create_foreign_element(&mut self, name: &PropertyName) -> BytesStart<'static> {
        let (tag, decl) = match (&name.prefix, &name.ns) {
            (Some(pfx), Some(_)) => (format!("{}:{}", pfx, name.local), format!("xmlns:{}", pfx)),
            _ => (name.local.clone(), "xmlns".to_string()),
        };
        let mut start = BytesStart::new(tag);
        if let Some(ns) = &name.ns {
            start.push_attribute((decl.as_str(), ns.as_str()));
        }
        self.declare_pending(&mut start);
        start
    }

    /// `<name/>`
    pub async fn atom(&mut self, start: BytesStart<'static>) -> Result<(), quick_xml::Error> {
        self.q.write_event_async(Event::Empty(start)).await
    }

    /// Write a start tag, the returned end tag goes to [`Self::close`]
    /// once the children are written.
    pub async fn open(
        &mut self,
        start: BytesStart<'static>,
    ) -> Result<BytesEnd<'static>, quick_xml::Error> {
        let end = start.to_end().into_owned();
        self.q.write_event_async(Event::Start(start)).await?;
        Ok(end)
    }

    pub async fn close(&mut self, end: BytesEnd<'static>) -> Result<(), quick_xml::Error> {
        self.q.write_event_async(Event::End(end)).await
    }

    /// `<name>escaped text</name>`
    pub async fn text_element(
        &mut self,
        start: BytesStart<'static>,
        txt: &str,
    ) -> Result<(), quick_xml::Error> {
        let end = self.open(start).await?;
        self.q
            .write_event_async(Event::Text(BytesText::new(txt)))
            .await?;
        self.close(end).await
    }

    /// `<name>children</name>`, or `<name/>` without children
    pub async fn children<N: QWrite + Sync>(
        &mut self,
        start: BytesStart<'static>,
        nodes: &[N],
    ) -> Result<(), quick_xml::Error> {
        if nodes.is_empty() {
            return self.atom(start).await;
        }
        let end = self.open(start).await?;
        nodes.qwrite(self).await?;
        self.close(end).await
    }

    fn prefixed(&mut self, prefix: &str, name: &str) -> BytesStart<'static> {
        let mut start = BytesStart::new(format!("{}:{}", prefix, name));
        self.declare_pending(&mut start);
        start
    }

    fn declare_pending(&mut self, start: &mut BytesStart<'static>) {
        for (key, ns) in self.ns_to_apply.drain(..) {
            start.push_attribute((key.as_str(), ns.as_str()));
        }
    }
}

// ---- reading

/// Raw events consumed while the reader was recording
#[derive(Debug, Default)]
pub struct Recording(Vec<Event<'static>>);
impl Recording {
    /// Drop the outer element, keep its content
    pub fn inner(mut self) -> Self {
        match self.0.first() {
            Some(Event::Start(_)) => {
                self.0.remove(0);
                if matches!(self.0.last(), Some(Event::End(_))) {
                    self.0.pop();
                }
                self
            }
            _ => Self::default(),
        }
    }

    /// Markup as it was found in the source document
    pub fn markup(&self) -> Result<String, ParsingError> {
        let mut out = quick_xml::writer::Writer::new(Vec::new());
        for evt in self.0.iter() {
            out.write_event(evt)?;
        }
        String::from_utf8(out.into_inner()).map_err(|e| ParsingError::Utf8Error(e.utf8_error()))
    }

    /// Unescaped text found at the top level, children excluded
    pub fn text(&self) -> Result<String, ParsingError> {
        let mut acc = String::new();
        let mut depth = 0usize;
        for evt in self.0.iter() {
            match evt {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Text(t) if depth == 0 => acc.push_str(t.unescape()?.as_ref()),
                Event::CData(c) if depth == 0 => acc.push_str(std::str::from_utf8(c.as_ref())?),
                _ => (),
            }
        }
        Ok(acc)
    }
}

/// A cursor over an XML document.
///
/// Decoders look at the event under the cursor with [`Self::peek`] or
/// [`Self::element_name`], then enter it with [`Self::open`] and leave it
/// with [`Self::close`]. Opened tags are kept on a stack.
pub struct Reader<T: IRead> {
    pub rdr: NsReader<T>,
    cur: Event<'static>,
    parents: Vec<Event<'static>>,
    buf: Vec<u8>,
    record: Vec<Event<'static>>,
    marks: Vec<usize>,
}
impl<T: IRead> Reader<T> {
    pub async fn new(mut rdr: NsReader<T>) -> Result<Self, ParsingError> {
        let mut buf = Vec::new();
        let cur = rdr.read_event_into_async(&mut buf).await?.into_owned();
        buf.clear();
        Ok(Self {
            rdr,
            cur,
            parents: Vec::new(),
            buf,
            record: Vec::new(),
            marks: Vec::new(),
        })
    }

    // move one event forward, returns the event left behind
    async fn advance(&mut self) -> Result<Event<'static>, ParsingError> {
        let next = self
            .rdr
            .read_event_into_async(&mut self.buf)
            .await?
            .into_owned();
        self.buf.clear();
        let left = std::mem::replace(&mut self.cur, next);
        if !self.marks.is_empty() {
            self.record.push(left.clone());
        }
        Ok(left)
    }

    pub fn peek(&self) -> &Event<'static> {
        &self.cur
    }

    /// Skip the node under the cursor, children included
    pub async fn skip(&mut self) -> Result<(), ParsingError> {
        let end = match &self.cur {
            Event::Start(_) if !self.marks.is_empty() => return self.skip_recorded().await,
            Event::Start(start) => start.to_end().into_owned(),
            Event::End(_) => return Err(ParsingError::WrongToken),
            Event::Eof => return Err(ParsingError::Eof),
            _ => return self.advance().await.map(drop),
        };
        self.rdr
            .read_to_end_into_async(end.name(), &mut self.buf)
            .await?;
        self.buf.clear();
        self.advance().await.map(drop)
    }

    // walk event per event so the recording stays complete
    async fn skip_recorded(&mut self) -> Result<(), ParsingError> {
        let mut open = 0usize;
        loop {
            match self.cur {
                Event::Start(_) => open += 1,
                Event::End(_) => open = open.saturating_sub(1),
                Event::Eof => return Err(ParsingError::Eof),
                _ => (),
            };
            self.advance().await?;
            if open == 0 {
                return Ok(());
            }
        }
    }

    /// Start keeping a copy of every consumed event,
    /// recordings can be nested
    pub fn start_recording(&mut self) {
        self.marks.push(self.record.len());
    }

    /// Number of events consumed since the last `start_recording`
    pub fn recorded_len(&self) -> usize {
        match self.marks.last() {
            Some(mark) => self.record.len() - mark,
            None => 0,
        }
    }

    pub fn stop_recording(&mut self) -> Recording {
        let mark = self.marks.pop().unwrap_or(self.record.len());
        let rec = Recording(self.record[mark..].to_vec());
        if self.marks.is_empty() {
            self.record.clear();
        }
        rec
    }

    /// Namespace-resolved name of the start or empty tag under the cursor
    pub fn element_name(&self) -> Result<PropertyName, ParsingError> {
        let start = match &self.cur {
            Event::Start(s) | Event::Empty(s) => s,
            _ => return Err(ParsingError::Recoverable),
        };
        let lossy = |raw: &[u8]| String::from_utf8_lossy(raw).into_owned();

        let (resolved, local) = self.rdr.resolve_element(start.name());
        let ns = match resolved {
            ResolveResult::Bound(ns) => Some(lossy(ns.into_inner())),
            _ => None,
        };
        Ok(PropertyName {
            ns,
            prefix: start.name().prefix().map(|p| lossy(p.into_inner())),
            local: lossy(local.into_inner()),
        })
    }

    /// Local name of the tag under the cursor, if it lives in `DAV:`
    pub fn dav_local(&self) -> Option<String> {
        let name = self.element_name().ok()?;
        match name.ns.as_deref() {
            Some(ns) if ns.as_bytes() == DAV_URN => Some(name.local),
            _ => None,
        }
    }

    fn is_tag(&self, ns: &[u8], key: &str) -> bool {
        let start = match &self.cur {
            Event::Start(s) | Event::Empty(s) => s,
            _ => return false,
        };
        let (resolved, local) = self.rdr.resolve_element(start.name());
        local.into_inner() == key.as_bytes()
            && matches!(resolved, ResolveResult::Bound(found) if found.into_inner() == ns)
    }

    /// False when the innermost opened tag is self-closed
    pub fn parent_has_child(&self) -> bool {
        matches!(self.parents.last(), Some(Event::Start(_)) | None)
    }

    /// Number of currently opened tags
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    /// True once the opened tag has no child left.
    /// Otherwise the node under the cursor is skipped.
    pub async fn exhausted(&mut self) -> Result<bool, ParsingError> {
        if !self.parent_has_child() || matches!(self.cur, Event::End(_)) {
            return Ok(true);
        }
        self.skip().await?;
        Ok(false)
    }

    /// Close every tag opened after `depth` was measured,
    /// used to resume after an isolated decoding failure
    pub async fn unwind(&mut self, depth: usize) -> Result<(), ParsingError> {
        while self.depth() > depth {
            self.close().await?;
        }
        Ok(())
    }

    /// Text content of the opened tag, empty for a self-closed tag
    pub async fn tag_string(&mut self) -> Result<String, ParsingError> {
        let mut acc = String::new();
        if !self.parent_has_child() {
            return Ok(acc);
        }
        loop {
            match &self.cur {
                Event::Text(escaped) => acc.push_str(escaped.unescape()?.as_ref()),
                Event::CData(raw) => acc.push_str(std::str::from_utf8(raw.as_ref())?),
                Event::Start(_) | Event::Empty(_) | Event::End(_) | Event::Eof => return Ok(acc),
                _ => (),
            };
            self.advance().await?;
        }
    }

    /// Text content of the tag under the cursor, whatever its name
    pub async fn element_text(&mut self) -> Result<String, ParsingError> {
        self.open_any().await?;
        let txt = self.tag_string().await?;
        self.close().await?;
        Ok(txt)
    }

    /// `None` when the tag under the cursor is not a `N`
    pub async fn attempt<N: Node<N>>(&mut self) -> Result<Option<N>, ParsingError> {
        match N::qread(self).await {
            Ok(node) => Ok(Some(node)),
            Err(ParsingError::Recoverable) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Like [`Self::attempt`], but a `N` that fails to decode is consumed
    /// and dropped instead of failing the document.
    pub async fn lenient<N: Node<N>>(&mut self) -> Result<Option<N>, ParsingError> {
        let depth = self.depth();
        match N::qread(self).await {
            Ok(node) => Ok(Some(node)),
            Err(ParsingError::Recoverable) if self.depth() == depth => Ok(None),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(err=%e, "dropping an element that could not be decoded");
                self.unwind(depth).await?;
                Ok(None)
            }
        }
    }

    /// First child of the opened tag that decodes as `N`
    pub async fn maybe_find<N: Node<N>>(&mut self) -> Result<Option<N>, ParsingError> {
        if !self.parent_has_child() {
            return Ok(None);
        }
        loop {
            if let Some(node) = self.attempt::<N>().await? {
                return Ok(Some(node));
            }
            if self.exhausted().await? {
                return Ok(None);
            }
        }
    }

    pub async fn find<N: Node<N>>(&mut self) -> Result<N, ParsingError> {
        self.maybe_find::<N>()
            .await?
            .ok_or(ParsingError::MissingChild)
    }

    /// Every child of the opened tag that decodes as `N`, the others are skipped
    pub async fn collect<N: Node<N>>(&mut self) -> Result<Vec<N>, ParsingError> {
        let mut acc = Vec::new();
        if !self.parent_has_child() {
            return Ok(acc);
        }
        loop {
            match self.attempt::<N>().await? {
                Some(node) => acc.push(node),
                None => {
                    if self.exhausted().await? {
                        return Ok(acc);
                    }
                }
            }
        }
    }

    /// Enter the `ns:key` tag under the cursor
    pub async fn open(&mut self, ns: &[u8], key: &str) -> Result<(), ParsingError> {
        if !self.is_tag(ns, key) {
            return Err(ParsingError::Recoverable);
        }
        self.open_any().await
    }

    /// Enter whatever tag is under the cursor
    pub async fn open_any(&mut self) -> Result<(), ParsingError> {
        let entered = match &self.cur {
            // entered and left on the same event, see `close`
            Event::Empty(_) => self.cur.clone(),
            Event::Start(_) => self.advance().await?,
            _ => return Err(ParsingError::Recoverable),
        };
        self.parents.push(entered);
        Ok(())
    }

    /// Leave the innermost opened tag, skipping what is left of it
    pub async fn close(&mut self) -> Result<(), ParsingError> {
        if self.parent_has_child() {
            while !matches!(self.cur, Event::End(_)) {
                self.skip().await?;
            }
        }
        self.parents.pop();
        self.advance().await.map(drop)
    }
}
