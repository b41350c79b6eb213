//! Writer core: bounded buffer, flush discipline, error latch.

use crate::config::{DEFAULT_BUFFER_SIZE, MIN_WRITER_BUFFER_SIZE};
use crate::error::{bug, Error, Result};
use crate::tag::{Kind, Tag};
#[cfg(feature = "ext")]
use crate::tag::{timestamp::Timestamp, EXT_TIMESTAMP};
use crate::track::Tracker;
use crate::wire::{encode_tag, Version};
use crate::write::Sink;

/// Streaming tag encoder.
///
/// Construct with [`Writer::new`] (growable buffer, collected with
/// [`Writer::into_bytes`]) or [`Writer::with_sink`] (bounded buffer flushed
/// to a sink, finished with [`Writer::finish`]).
///
/// The writer latches its first error: the optional error hook runs exactly
/// once, and every later operation is a silent no-op.  The latch is never
/// cleared.
pub struct Writer<'s> {
    /// Staged output.  `buf.len()` is the fill level; `cap` is the bound.
    buf: Vec<u8>,
    cap: usize,
    /// Growable mode doubles `cap` in place instead of flushing.
    growable: bool,
    sink: Option<Box<dyn Sink + 's>>,
    /// Bytes already handed to the sink.
    flushed: u64,
    version: Version,
    track: Tracker,
    err: Option<Error>,
    error_hook: Option<Box<dyn FnMut(Error) + 's>>,
    finished: bool,
}

impl<'s> Writer<'s> {
    /// Growable writer with the default initial capacity.
    pub fn new() -> Writer<'s> {
        Writer::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Growable writer with a chosen initial capacity.
    pub fn with_capacity(capacity: usize) -> Writer<'s> {
        let capacity = capacity.max(MIN_WRITER_BUFFER_SIZE);
        Writer {
            buf: Vec::with_capacity(capacity),
            cap: capacity,
            growable: true,
            sink: None,
            flushed: 0,
            version: Version::default(),
            track: Tracker::new(),
            err: None,
            error_hook: None,
            finished: false,
        }
    }

    /// Bounded writer flushing through `sink`.
    ///
    /// `capacity` must be at least [`MIN_WRITER_BUFFER_SIZE`] so that every
    /// tag header and every fixstr fits without straddling; smaller values
    /// latch `bug` immediately.
    pub fn with_sink<S: Sink + 's>(capacity: usize, sink: S) -> Writer<'s> {
        let mut w = Writer {
            buf: Vec::with_capacity(capacity),
            cap: capacity,
            growable: false,
            sink: Some(Box::new(sink)),
            flushed: 0,
            version: Version::default(),
            track: Tracker::new(),
            err: None,
            error_hook: None,
            finished: false,
        };
        if capacity < MIN_WRITER_BUFFER_SIZE {
            w.fail(bug!(
                "writer buffer of {capacity} bytes is below the minimum {MIN_WRITER_BUFFER_SIZE}"
            ));
        }
        w
    }

    /// Selects the wire compatibility level (default [`Version::V5`]).
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Installs a hook invoked exactly once, on the first error.
    pub fn set_error_hook<F: FnMut(Error) + 's>(&mut self, hook: F) {
        self.error_hook = Some(Box::new(hook));
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<Error> {
        self.err
    }

    /// Total bytes produced so far (flushed plus staged).
    pub fn position(&self) -> u64 {
        self.flushed + self.buf.len() as u64
    }

    /// Latches an error explicitly.
    ///
    /// The escape hatch for aborting mid-document: latching `data` lets the
    /// writer be destroyed without a structural-balance violation.
    pub fn flag_error(&mut self, err: Error) {
        self.fail(err);
    }

    // -- error latch --------------------------------------------------------

    fn fail(&mut self, err: Error) {
        if self.err.is_some() {
            return;
        }
        self.err = Some(err);
        // The hook may unwind; the latch is already set, so a writer
        // destroyed afterwards skips every further callback.
        if let Some(mut hook) = self.error_hook.take() {
            hook(err);
        }
    }

    fn ok(&self) -> bool {
        self.err.is_none()
    }

    // -- buffer management --------------------------------------------------

    /// Hands the staged bytes to the sink and empties the buffer.
    fn flush_buffer(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let sink = match self.sink.as_mut() {
            Some(sink) => sink,
            None => return,
        };
        match sink.write_all(&self.buf) {
            Ok(()) => {
                self.flushed += self.buf.len() as u64;
                self.buf.clear();
            }
            Err(e) => self.fail(e),
        }
    }

    /// Makes room for `n` more bytes, flushing or growing as the mode
    /// allows.  Latches `too_big` when the bound cannot be met.
    fn reserve(&mut self, n: usize) -> bool {
        if !self.ok() {
            return false;
        }
        if self.cap - self.buf.len() >= n {
            return true;
        }
        if self.growable {
            let mut cap = self.cap;
            while cap - self.buf.len() < n {
                cap *= 2;
            }
            self.buf.reserve(cap - self.buf.len());
            self.cap = cap;
            return true;
        }
        if self.sink.is_some() {
            self.flush_buffer();
            if self.ok() && self.cap >= n {
                return true;
            }
        }
        if self.ok() {
            self.fail(Error::TooBig);
        }
        false
    }

    /// Appends raw bytes, straddling the buffer boundary through the sink
    /// when a run is too large to stage.
    fn append(&mut self, data: &[u8]) {
        if !self.ok() {
            return;
        }
        if self.cap - self.buf.len() >= data.len() {
            self.buf.extend_from_slice(data);
            return;
        }
        if self.growable {
            if self.reserve(data.len()) {
                self.buf.extend_from_slice(data);
            }
            return;
        }
        if self.sink.is_none() {
            self.fail(Error::TooBig);
            return;
        }
        self.flush_buffer();
        if !self.ok() {
            return;
        }
        if data.len() >= self.cap {
            // Larger than the buffer: hand it to the sink directly rather
            // than staging it piecewise.
            let res = match self.sink.as_mut() {
                Some(sink) => sink.write_all(data),
                None => return,
            };
            match res {
                Ok(()) => self.flushed += data.len() as u64,
                Err(e) => self.fail(e),
            }
        } else {
            self.buf.extend_from_slice(data);
        }
    }

    /// Encodes and stages one tag header.
    fn emit(&mut self, tag: Tag) {
        if !self.ok() {
            return;
        }
        match encode_tag(tag, self.version) {
            Ok(encoded) => {
                if self.reserve(encoded.len()) {
                    self.buf.extend_from_slice(encoded.as_bytes());
                }
            }
            Err(e) => self.fail(e),
        }
    }

    fn track_element(&mut self) {
        if !self.ok() {
            return;
        }
        if let Err(e) = self.track.element(true) {
            self.fail(e);
        }
    }

    fn track_push(&mut self, kind: Kind, count: u64) {
        if !self.ok() {
            return;
        }
        if let Err(e) = self.track.push(kind, count) {
            self.fail(e);
        }
    }

    fn track_pop(&mut self, kind: Kind) {
        if !self.ok() {
            return;
        }
        if let Err(e) = self.track.pop(kind) {
            self.fail(e);
        }
    }

    // -- scalar writes ------------------------------------------------------

    pub fn write_nil(&mut self) {
        self.track_element();
        self.emit(Tag::Nil);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.track_element();
        self.emit(Tag::Bool(v));
    }

    /// Writes a signed integer in its minimal form.
    pub fn write_int(&mut self, v: i64) {
        self.track_element();
        self.emit(Tag::Int(v));
    }

    /// Writes an unsigned integer in its minimal form.
    pub fn write_uint(&mut self, v: u64) {
        self.track_element();
        self.emit(Tag::Uint(v));
    }

    pub fn write_f32(&mut self, v: f32) {
        self.track_element();
        self.emit(Tag::F32(v));
    }

    pub fn write_f64(&mut self, v: f64) {
        self.track_element();
        self.emit(Tag::F64(v));
    }

    /// Writes any tag as one element, opening compounds as needed.
    ///
    /// Equivalent to the matching `write_*`/`start_*` call; the sentinel
    /// kinds latch `bug`.
    pub fn write_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Nil => self.write_nil(),
            Tag::Bool(v) => self.write_bool(v),
            Tag::Int(v) => self.write_int(v),
            Tag::Uint(v) => self.write_uint(v),
            Tag::F32(v) => self.write_f32(v),
            Tag::F64(v) => self.write_f64(v),
            Tag::Str(n) => self.start_str(n),
            Tag::Bin(n) => self.start_bin(n),
            Tag::Array(n) => self.start_array(n),
            Tag::Map(n) => self.start_map(n),
            #[cfg(feature = "ext")]
            Tag::Ext(code, n) => self.start_ext(code, n),
            #[cfg(not(feature = "ext"))]
            Tag::Ext(..) => self.fail(Error::Unsupported),
            Tag::Missing | Tag::Noop => {
                self.fail(bug!("attempted to write the {} sentinel", tag.kind()))
            }
        }
    }

    // -- compound writes ----------------------------------------------------

    /// Opens an array of `count` elements.  Exactly `count` values must be
    /// written before [`Writer::finish_array`].
    pub fn start_array(&mut self, count: u32) {
        self.track_element();
        self.emit(Tag::Array(count));
        self.track_push(Kind::Array, count as u64);
    }

    /// Opens a map of `count` key/value pairs.
    pub fn start_map(&mut self, count: u32) {
        self.track_element();
        self.emit(Tag::Map(count));
        self.track_push(Kind::Map, count as u64);
    }

    /// Opens a string of `len` payload bytes, written via
    /// [`Writer::write_body`].
    pub fn start_str(&mut self, len: u32) {
        self.track_element();
        self.emit(Tag::Str(len));
        self.track_push(Kind::Str, len as u64);
    }

    /// Opens a binary blob of `len` payload bytes.
    pub fn start_bin(&mut self, len: u32) {
        self.track_element();
        self.emit(Tag::Bin(len));
        self.track_push(Kind::Bin, len as u64);
    }

    /// Opens an ext value of `len` payload bytes with the given type code.
    #[cfg(feature = "ext")]
    pub fn start_ext(&mut self, code: i8, len: u32) {
        self.track_element();
        self.emit(Tag::Ext(code, len));
        self.track_push(Kind::Ext, len as u64);
    }

    /// Writes payload bytes of the open str/bin/ext.
    pub fn write_body(&mut self, data: &[u8]) {
        if !self.ok() {
            return;
        }
        if let Err(e) = self.track.bytes(data.len() as u64) {
            self.fail(e);
            return;
        }
        self.append(data);
    }

    pub fn finish_array(&mut self) {
        self.track_pop(Kind::Array);
    }

    pub fn finish_map(&mut self) {
        self.track_pop(Kind::Map);
    }

    pub fn finish_str(&mut self) {
        self.track_pop(Kind::Str);
    }

    pub fn finish_bin(&mut self) {
        self.track_pop(Kind::Bin);
    }

    #[cfg(feature = "ext")]
    pub fn finish_ext(&mut self) {
        self.track_pop(Kind::Ext);
    }

    // -- whole-value conveniences -------------------------------------------

    /// Writes a complete string value.
    pub fn write_str(&mut self, s: &str) {
        self.write_str_bytes(s.as_bytes());
    }

    /// Writes a complete string value from raw bytes (the wire does not
    /// require UTF-8; readers validate on request).
    pub fn write_str_bytes(&mut self, s: &[u8]) {
        if s.len() > u32::MAX as usize {
            self.fail(Error::TooBig);
            return;
        }
        self.start_str(s.len() as u32);
        self.write_body(s);
        self.finish_str();
    }

    /// Writes a complete binary value.
    pub fn write_bin(&mut self, data: &[u8]) {
        if data.len() > u32::MAX as usize {
            self.fail(Error::TooBig);
            return;
        }
        self.start_bin(data.len() as u32);
        self.write_body(data);
        self.finish_bin();
    }

    /// Writes a complete ext value.
    #[cfg(feature = "ext")]
    pub fn write_ext(&mut self, code: i8, data: &[u8]) {
        if data.len() > u32::MAX as usize {
            self.fail(Error::TooBig);
            return;
        }
        self.start_ext(code, data.len() as u32);
        self.write_body(data);
        self.finish_ext();
    }

    /// Writes a timestamp as ext −1 in its smallest payload layout.
    #[cfg(feature = "ext")]
    pub fn write_timestamp(&mut self, ts: Timestamp) {
        let mut payload = [0u8; 12];
        let n = ts.pack(&mut payload);
        self.write_ext(EXT_TIMESTAMP, &payload[..n]);
    }

    /// Appends an already-encoded complete value as one element.
    ///
    /// The caller vouches that `data` holds exactly one well-formed value.
    pub fn write_object_bytes(&mut self, data: &[u8]) {
        self.track_element();
        self.append(data);
    }

    // -- destroy ------------------------------------------------------------

    /// Shared destroy path: balance check, final flush, teardown.
    fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.ok() {
            if let Err(e) = self.track.check_empty() {
                self.fail(e);
            }
        }
        if self.ok() {
            self.flush_buffer();
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.teardown();
        }
    }

    /// Destroys the writer: flushes staged bytes (unless an error is
    /// latched), verifies structural balance, runs teardown.
    pub fn finish(mut self) -> Result<()> {
        self.shutdown();
        match self.err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Destroys a growable writer and surrenders the encoded buffer.
    ///
    /// Only meaningful without a sink; with one installed this is `bug`.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if self.sink.is_some() {
            self.fail(bug!("into_bytes on a sink-backed writer"));
        }
        self.shutdown();
        match self.err {
            None => Ok(std::mem::take(&mut self.buf)),
            Some(e) => Err(e),
        }
    }
}

impl Drop for Writer<'_> {
    /// Best-effort destroy for writers dropped without `finish`; a latched
    /// error (including one raised here) is unreportable but all callbacks
    /// still run at most once.
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Default for Writer<'_> {
    fn default() -> Self {
        Writer::new()
    }
}
