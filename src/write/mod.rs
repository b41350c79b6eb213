//! The streaming tag encoder.
//!
//! [`Writer`] emits tags and payload bytes through a bounded internal
//! buffer, either growing it in place (growable mode) or flushing it to a
//! [`Sink`] (sink mode).  Structural balance is enforced by the shared
//! tracker: every compound opened must be finished, in order, with its
//! declared count fully written.

pub mod writer;

pub use writer::Writer;

use crate::error::{Error, Result};

/// Capability bound to a writer's output side.
///
/// `write_all` must accept all bytes or fail; a partial write is a sink
/// failure.  `teardown` runs once during destroy, after the final flush.
pub trait Sink {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
    fn teardown(&mut self) {}
}

/// Adapter making any `std::io::Write` a [`Sink`]: errors map to `io` and
/// teardown becomes a best-effort flush.
pub struct IoSink<W: std::io::Write>(pub W);

impl<W: std::io::Write> Sink for IoSink<W> {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.0.write_all(data).map_err(|e| {
            log::debug!("sink write failed: {e}");
            Error::Io
        })
    }

    fn teardown(&mut self) {
        let _ = self.0.flush();
    }
}
