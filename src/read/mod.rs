//! The streaming tag reader.
//!
//! [`Reader`] parses one tag at a time from a pre-loaded blob
//! ([`Reader::from_slice`]) or from a pull-fill [`Source`]
//! ([`Reader::with_source`]), exposing a forward-only cursor over the tag
//! sequence.  The cursor never rewinds; peeking uses buffered lookahead.

pub mod reader;

pub use reader::Reader;

use crate::error::{Error, Result};

/// Capability bound to a reader's input side.
pub trait Source {
    /// Reads up to `buf.len()` bytes into `buf`.
    ///
    /// `Ok(0)` means "nothing available right now" and is only meaningful
    /// to non-blocking consumers (the tree's try-parse); blocking surfaces
    /// latch `io` when they see it.  A clean end of the stream is
    /// `Err(Error::Eof)`; any other error is latched as reported.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Discards exactly `n` bytes without delivering them, for seekable
    /// sources.  `Ok(false)` means unsupported; the reader then falls back
    /// to fill-and-drop.
    fn skip_ahead(&mut self, _n: u64) -> Result<bool> {
        Ok(false)
    }

    /// Runs once during reader destroy.
    fn teardown(&mut self) {}
}

/// Adapter making any `std::io::Read` a [`Source`]: a 0-byte read is the
/// clean end of the stream, interrupted reads retry, other errors map to
/// `io`.
pub struct IoSource<R: std::io::Read>(pub R);

impl<R: std::io::Read> Source for IoSource<R> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.0.read(buf) {
                Ok(0) => return Err(Error::Eof),
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("source read failed: {e}");
                    return Err(Error::Io);
                }
            }
        }
    }
}
