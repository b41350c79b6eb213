//! Reader core: bounded buffer, fill/skip capabilities, straddle handling.

use crate::config::{DEFAULT_BUFFER_SIZE, MIN_READER_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::read::Source;
use crate::tag::{Kind, Tag};
#[cfg(feature = "ext")]
use crate::tag::{timestamp::Timestamp, EXT_TIMESTAMP};
use crate::track::Tracker;
use crate::utf8;
use crate::wire::{header_len, parse_tag};

/// Divisor of the small-fraction rule: a straddling read no larger than
/// `buffer / 32` refills the buffer and copies out instead of reading
/// directly into the destination.
const SMALL_READ_DIV: usize = 32;

/// Divisor of the skip heuristic: discards larger than `buffer / 16` go
/// through the source's `skip_ahead` when it has one.
const SKIP_DIV: usize = 16;

enum Input<'b> {
    /// A pre-loaded complete message; running out of bytes is `invalid`.
    Slice(&'b [u8]),
    /// A bounded buffer refilled from a pull source.
    Stream {
        buf: Box<[u8]>,
        source: Box<dyn Source + 'b>,
    },
}

/// Streaming tag reader.
///
/// Like the writer, the reader latches its first error; afterwards every
/// operation is a no-op returning zero values ([`Tag::Nil`], empty slices),
/// and [`Reader::error`] reports the latched kind.
pub struct Reader<'b> {
    input: Input<'b>,
    /// Cursor and fill level within the current window.
    pos: usize,
    end: usize,
    /// Bytes consumed before the current window start (stream mode).
    consumed_base: u64,
    track: Tracker,
    err: Option<Error>,
    error_hook: Option<Box<dyn FnMut(Error) + 'b>>,
    finished: bool,
}

impl<'b> Reader<'b> {
    /// Reader over a pre-loaded blob assumed to contain complete messages.
    pub fn from_slice(data: &'b [u8]) -> Reader<'b> {
        Reader {
            end: data.len(),
            input: Input::Slice(data),
            pos: 0,
            consumed_base: 0,
            track: Tracker::new(),
            err: None,
            error_hook: None,
            finished: false,
        }
    }

    /// Reader pulling from `source` through an owned buffer of
    /// `capacity` bytes (floored to [`MIN_READER_BUFFER_SIZE`]).
    pub fn with_source<S: Source + 'b>(capacity: usize, source: S) -> Reader<'b> {
        let capacity = capacity.max(MIN_READER_BUFFER_SIZE);
        Reader {
            input: Input::Stream {
                buf: vec![0u8; capacity].into_boxed_slice(),
                source: Box::new(source),
            },
            pos: 0,
            end: 0,
            consumed_base: 0,
            track: Tracker::new(),
            err: None,
            error_hook: None,
            finished: false,
        }
    }

    /// Reader pulling from `source` with the default buffer size.
    pub fn from_source<S: Source + 'b>(source: S) -> Reader<'b> {
        Reader::with_source(DEFAULT_BUFFER_SIZE, source)
    }

    /// Installs a hook invoked exactly once, on the first error.
    pub fn set_error_hook<F: FnMut(Error) + 'b>(&mut self, hook: F) {
        self.error_hook = Some(Box::new(hook));
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<Error> {
        self.err
    }

    /// Latches an error explicitly (mid-document abort).
    pub fn flag_error(&mut self, err: Error) {
        self.fail(err);
    }

    /// Total bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.consumed_base + self.pos as u64
    }

    /// Bytes currently buffered and unread.
    pub fn buffered(&self) -> usize {
        self.end - self.pos
    }

    // -- error latch --------------------------------------------------------

    fn fail(&mut self, err: Error) {
        if self.err.is_some() {
            return;
        }
        self.err = Some(err);
        if let Some(mut hook) = self.error_hook.take() {
            hook(err);
        }
    }

    fn window(&self) -> &[u8] {
        match &self.input {
            Input::Slice(s) => s,
            Input::Stream { buf, .. } => buf,
        }
    }

    // -- ensure / fill ------------------------------------------------------

    /// Makes at least `n` bytes resident at the cursor.
    ///
    /// `at_boundary` marks the first byte of a top-level tag, where a clean
    /// source end latches `eof` instead of `io`.
    fn ensure(&mut self, n: usize, at_boundary: bool) -> bool {
        if self.err.is_some() {
            return false;
        }
        if self.end - self.pos >= n {
            return true;
        }
        let res = match &mut self.input {
            // A pre-loaded blob is assumed complete: short is malformed.
            Input::Slice(_) => Err(Error::Invalid),
            Input::Stream { buf, source } => {
                if n > buf.len() {
                    Err(Error::TooBig)
                } else {
                    // Move the residual to the buffer start, then pull.
                    buf.copy_within(self.pos..self.end, 0);
                    self.consumed_base += self.pos as u64;
                    self.end -= self.pos;
                    self.pos = 0;
                    let mut res = Ok(());
                    while self.end < n {
                        match source.fill(&mut buf[self.end..]) {
                            Ok(0) => {
                                res = Err(Error::Io);
                                break;
                            }
                            Ok(k) => self.end += k,
                            Err(Error::Eof) => {
                                res = Err(if at_boundary && self.end == 0 {
                                    Error::Eof
                                } else {
                                    Error::Io
                                });
                                break;
                            }
                            Err(e) => {
                                res = Err(e);
                                break;
                            }
                        }
                    }
                    res
                }
            }
        };
        match res {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    // -- tags ---------------------------------------------------------------

    /// Reads the next tag, updating structural tracking.
    ///
    /// Returns [`Tag::Nil`] once an error is latched; check
    /// [`Reader::error`] to distinguish a real nil.  A clean source end at
    /// a message boundary latches `eof`.
    pub fn read_tag(&mut self) -> Tag {
        let at_boundary = self.track.depth() == 0;
        match self.parse_next(at_boundary) {
            Some((tag, consumed)) => {
                if let Err(e) = self.track.element(true) {
                    self.fail(e);
                    return Tag::Nil;
                }
                let pushed = match tag {
                    Tag::Array(n) => self.track.push(Kind::Array, n as u64),
                    Tag::Map(n) => self.track.push(Kind::Map, n as u64),
                    Tag::Str(n) => self.track.push(Kind::Str, n as u64),
                    Tag::Bin(n) => self.track.push(Kind::Bin, n as u64),
                    Tag::Ext(_, n) => self.track.push(Kind::Ext, n as u64),
                    _ => Ok(()),
                };
                if let Err(e) = pushed {
                    self.fail(e);
                    return Tag::Nil;
                }
                self.pos += consumed;
                tag
            }
            None => Tag::Nil,
        }
    }

    /// Looks at the next tag without advancing the cursor or tracking.
    pub fn peek_tag(&mut self) -> Tag {
        let at_boundary = self.track.depth() == 0;
        match self.parse_next(at_boundary) {
            Some((tag, _)) => {
                if let Err(e) = self.track.element(false) {
                    self.fail(e);
                    return Tag::Nil;
                }
                tag
            }
            None => Tag::Nil,
        }
    }

    /// Ensures and decodes the next header without consuming it.
    fn parse_next(&mut self, at_boundary: bool) -> Option<(Tag, usize)> {
        if !self.ensure(1, at_boundary) {
            return None;
        }
        let first = self.window()[self.pos];
        let len = match header_len(first) {
            Ok(len) => len,
            Err(e) => {
                self.fail(e);
                return None;
            }
        };
        if !self.ensure(len, false) {
            return None;
        }
        match parse_tag(&self.window()[self.pos..self.pos + len]) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    // -- payload bytes ------------------------------------------------------

    /// Copies the next `dst.len()` payload bytes of the open str/bin/ext.
    pub fn read_bytes(&mut self, dst: &mut [u8]) {
        if self.err.is_some() {
            return;
        }
        if let Err(e) = self.track.bytes(dst.len() as u64) {
            self.fail(e);
            return;
        }
        self.read_raw(dst);
    }

    /// Copies bytes with no structural tracking (for callers managing the
    /// framing themselves).
    fn read_raw(&mut self, dst: &mut [u8]) {
        let mut copied = 0usize;
        while copied < dst.len() && self.err.is_none() {
            let avail = self.end - self.pos;
            if avail > 0 {
                let take = avail.min(dst.len() - copied);
                let start = self.pos;
                dst[copied..copied + take]
                    .copy_from_slice(&self.window()[start..start + take]);
                self.pos += take;
                copied += take;
                continue;
            }
            let remaining = dst.len() - copied;
            let small = match &self.input {
                Input::Slice(_) => {
                    self.fail(Error::Invalid);
                    return;
                }
                Input::Stream { buf, .. } => remaining <= buf.len() / SMALL_READ_DIV,
            };
            if small {
                // Cheaper to refill and copy than to issue a tiny fill.
                if !self.ensure(remaining, false) {
                    return;
                }
            } else {
                let res = match &mut self.input {
                    Input::Stream { source, .. } => source.fill(&mut dst[copied..]),
                    Input::Slice(_) => unreachable!(),
                };
                match res {
                    Ok(0) | Err(Error::Eof) => {
                        self.fail(Error::Io);
                        return;
                    }
                    Ok(k) => {
                        copied += k;
                        self.consumed_base += k as u64;
                    }
                    Err(e) => {
                        self.fail(e);
                        return;
                    }
                }
            }
        }
    }

    /// Returns the next `n` payload bytes as a slice into the buffer.
    ///
    /// The slice is valid until the next read (the borrow enforces this).
    /// In stream mode `n` must fit the buffer, else `too_big`.  Returns an
    /// empty slice once an error is latched.
    pub fn read_bytes_inplace(&mut self, n: usize) -> &[u8] {
        if self.err.is_some() {
            return &[];
        }
        if let Err(e) = self.track.bytes(n as u64) {
            self.fail(e);
            return &[];
        }
        if !self.ensure(n, false) {
            return &[];
        }
        let start = self.pos;
        self.pos += n;
        &self.window()[start..start + n]
    }

    /// [`Reader::read_bytes`] plus strict UTF-8 validation (`type` on
    /// failure).
    pub fn read_utf8(&mut self, dst: &mut [u8]) {
        self.read_bytes(dst);
        if self.err.is_none() && !utf8::check_utf8(dst) {
            self.fail(Error::Type);
        }
    }

    /// [`Reader::read_bytes_inplace`] plus strict UTF-8 validation.
    pub fn read_utf8_inplace(&mut self, n: usize) -> &str {
        if self.err.is_some() {
            return "";
        }
        if let Err(e) = self.track.bytes(n as u64) {
            self.fail(e);
            return "";
        }
        if !self.ensure(n, false) {
            return "";
        }
        let start = self.pos;
        self.pos += n;
        // Validate before handing out the slice; the second lookup is the
        // borrow-friendly way to return text after a possible latch.
        if !utf8::check_utf8(&self.window()[start..start + n]) {
            self.fail(Error::Type);
            return "";
        }
        utf8::as_utf8(&self.window()[start..start + n]).unwrap_or("")
    }

    /// Discards the next `n` payload bytes of the open str/bin/ext.
    pub fn skip_bytes(&mut self, n: usize) {
        if self.err.is_some() {
            return;
        }
        if let Err(e) = self.track.bytes(n as u64) {
            self.fail(e);
            return;
        }
        self.skip_raw(n);
    }

    fn skip_raw(&mut self, mut n: usize) {
        // Residual buffer first.
        let take = (self.end - self.pos).min(n);
        self.pos += take;
        n -= take;
        if n == 0 {
            return;
        }
        // A large discard goes through the source's seek when it has one;
        // small ones just refill and drop.
        let chunk_cap = match &self.input {
            Input::Slice(_) => {
                self.fail(Error::Invalid);
                return;
            }
            Input::Stream { buf, .. } => buf.len(),
        };
        if n > chunk_cap / SKIP_DIV {
            let seek = match &mut self.input {
                Input::Stream { source, .. } => source.skip_ahead(n as u64),
                Input::Slice(_) => unreachable!(),
            };
            match seek {
                Ok(true) => {
                    self.consumed_base += n as u64;
                    return;
                }
                Ok(false) => {}
                Err(e) => {
                    self.fail(e);
                    return;
                }
            }
        }
        while n > 0 {
            let chunk = n.min(chunk_cap);
            if !self.ensure(chunk, false) {
                return;
            }
            self.pos += chunk;
            n -= chunk;
        }
    }

    // -- compound closes ----------------------------------------------------

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

    fn track_pop(&mut self, kind: Kind) {
        if self.err.is_some() {
            return;
        }
        if let Err(e) = self.track.pop(kind) {
            self.fail(e);
        }
    }

    // -- whole-value operations ---------------------------------------------

    /// Reads and discards the next complete value, including every child of
    /// a compound.  Iterative, so adversarial nesting depth cannot overflow
    /// the call stack.
    pub fn discard(&mut self) {
        // Open containers and the elements still owed at each (maps owe
        // two per pair).
        let mut levels: Vec<(Kind, u64)> = Vec::new();
        loop {
            if self.err.is_some() {
                return;
            }
            let tag = self.read_tag();
            if self.err.is_some() {
                return;
            }
            match tag {
                Tag::Str(n) | Tag::Bin(n) | Tag::Ext(_, n) => {
                    self.skip_bytes(n as usize);
                    self.track_pop(tag.kind());
                }
                Tag::Array(n) if n > 0 => {
                    levels.push((Kind::Array, n as u64));
                    continue;
                }
                Tag::Map(n) if n > 0 => {
                    levels.push((Kind::Map, 2 * n as u64));
                    continue;
                }
                Tag::Array(_) => self.finish_array(),
                Tag::Map(_) => self.finish_map(),
                _ => {}
            }
            if self.err.is_some() {
                return;
            }
            // One complete value just ended; unwind every level it fills.
            loop {
                match levels.last_mut() {
                    None => return,
                    Some((_, left)) => {
                        *left -= 1;
                        if *left > 0 {
                            break;
                        }
                    }
                }
                // That container is complete too; close it and continue
                // into its parent.
                if let Some((kind, _)) = levels.pop() {
                    self.track_pop(kind);
                    if self.err.is_some() {
                        return;
                    }
                }
            }
        }
    }

    /// Reads a complete timestamp (ext −1) value.
    ///
    /// Any other ext code, payload length, or nanosecond range is
    /// `invalid`.  Returns the epoch once an error is latched.
    #[cfg(feature = "ext")]
    pub fn read_timestamp(&mut self) -> Timestamp {
        let zero = Timestamp {
            seconds: 0,
            nanoseconds: 0,
        };
        let tag = self.read_tag();
        if self.err.is_some() {
            return zero;
        }
        let len = match tag {
            Tag::Ext(EXT_TIMESTAMP, n @ (4 | 8 | 12)) => n as usize,
            _ => {
                self.fail(Error::Invalid);
                return zero;
            }
        };
        let mut payload = [0u8; 12];
        self.read_bytes(&mut payload[..len]);
        if self.err.is_some() {
            return zero;
        }
        self.finish_ext();
        match Timestamp::unpack(&payload[..len]) {
            Ok(ts) => ts,
            Err(e) => {
                self.fail(e);
                zero
            }
        }
    }

    // -- destroy ------------------------------------------------------------

    fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.err.is_none() {
            if let Err(e) = self.track.check_empty() {
                self.fail(e);
            }
        }
        if let Input::Stream { source, .. } = &mut self.input {
            source.teardown();
        }
    }

    /// Destroys the reader: verifies structural balance and runs the
    /// source teardown.  Returns the latched error, if any.
    pub fn finish(mut self) -> Result<()> {
        self.shutdown();
        match self.err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl Drop for Reader<'_> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
