//! Iterative, resumable message parsing with pre-reservation accounting.
//!
//! The parser keeps a running budget, `possible`, equal to the bytes
//! resident but not yet committed to any future node.  Every node costs at
//! least one byte, so before a compound is accepted its declared child
//! count is subtracted from the budget; a header claiming more children
//! than the remaining bytes could ever hold fails immediately instead of
//! allocating.  Fills replenish the budget; `current_node_reserved` records
//! partial reservations so that a suspended non-blocking parse resumes
//! without double-counting.

use crate::config::DEFAULT_BUFFER_SIZE;
use crate::error::{Error, Result};
use crate::tag::{Kind, Tag};
use crate::tree::arena::NodeData;
use crate::tree::{ParseState, Tree, TreeData};
use crate::wire::{header_len, parse_tag};

/// One open container: where its children run lives and how many remain.
#[derive(Debug, Clone, Copy)]
struct Frame {
    page: u32,
    start: u32,
    /// Next child slot to fill.
    cursor: usize,
    /// Children still to parse.
    left: usize,
}

/// Resumable parse state.  All cursor state lives here so a try-parse can
/// return "incomplete" from any fill and be re-entered later.
pub(crate) struct ParserState {
    /// Absolute parse cursor within the message data.
    pub(crate) pos: usize,
    /// Start offset of the current message.
    pub(crate) msg_start: usize,
    /// Resident bytes not yet committed to a node (see module docs).
    possible: usize,
    /// Reservation progress of the in-flight node, across suspensions.
    current_node_reserved: usize,
    node_started: bool,
    root_reserved: bool,
    stack: Vec<Frame>,
    pub(crate) node_count: usize,
    pub(crate) root: (u32, u32),
}

impl ParserState {
    pub(crate) fn new() -> ParserState {
        ParserState {
            pos: 0,
            msg_start: 0,
            possible: 0,
            current_node_reserved: 0,
            node_started: false,
            root_reserved: false,
            stack: Vec::new(),
            node_count: 0,
            root: (0, 0),
        }
    }
}

/// Why one parse step stopped.
enum Halt {
    /// A non-blocking fill returned nothing; try again later.
    Incomplete,
    Fail(Error),
}

type Step<T> = std::result::Result<T, Halt>;

impl<'a> Tree<'a> {
    /// Parses the next message, blocking on the source as needed.
    ///
    /// A non-blocking source that reports "no data yet" here latches `io`;
    /// use [`Tree::try_parse`] for cooperative parsing.
    pub fn parse(&mut self) -> Result<()> {
        match self.try_parse() {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.fail(Error::Io);
                Err(Error::Io)
            }
            Err(e) => Err(e),
        }
    }

    /// Parses the next message cooperatively.
    ///
    /// Returns `Ok(false)` when the source has no data right now; state is
    /// preserved and the call can be repeated.  Returns `Ok(true)` once the
    /// message is complete, after which [`Tree::root`] is valid.  A clean
    /// end of data before any byte of a new message latches `eof`.
    pub fn try_parse(&mut self) -> Result<bool> {
        if let Some(e) = self.err {
            return Err(e);
        }
        if self.state != ParseState::InProgress {
            if let Err(e) = self.begin_message() {
                self.fail(e);
                return Err(e);
            }
        }
        loop {
            if self.parser.stack.is_empty() {
                self.size = self.parser.pos - self.parser.msg_start;
                self.state = ParseState::Parsed;
                log::trace!(
                    "parsed message: {} bytes, {} nodes",
                    self.size,
                    self.parser.node_count
                );
                return Ok(true);
            }
            match self.parse_one() {
                Ok(()) => {}
                Err(Halt::Incomplete) => return Ok(false),
                Err(Halt::Fail(e)) => {
                    self.fail(e);
                    return Err(e);
                }
            }
        }
    }

    /// Resets per-message state and reserves the root slot.
    fn begin_message(&mut self) -> Result<()> {
        self.arena.reset();
        let mut pos = self.parser.pos;
        // Prior-message bytes are dead once the arena resets; drop them so
        // a long-lived stream does not accumulate every message ever read.
        if let TreeData::Stream { buf, .. } = &mut self.data {
            buf.drain(..pos);
            pos = 0;
        }
        self.parser = ParserState {
            pos,
            msg_start: pos,
            possible: self.data_len() - pos,
            current_node_reserved: 0,
            node_started: false,
            root_reserved: false,
            stack: Vec::new(),
            node_count: 1,
            root: (0, 0),
        };
        if self.limits.max_nodes < 1 {
            return Err(Error::TooBig);
        }
        let (page, start) = self.arena.alloc(1)?;
        self.parser.root = (page, start);
        self.parser.stack.push(Frame {
            page,
            start,
            cursor: 0,
            left: 1,
        });
        self.state = ParseState::InProgress;
        self.size = 0;
        Ok(())
    }

    /// Parses exactly one node into its pre-allocated slot.
    fn parse_one(&mut self) -> Step<()> {
        if !self.parser.root_reserved {
            // The root has no parent to reserve its first byte.
            self.reserve(1, true)?;
            self.parser.root_reserved = true;
        }
        if !self.parser.node_started {
            self.parser.node_started = true;
            // The first byte was reserved by the parent (or just above).
            self.parser.current_node_reserved = 1;
        }

        let pos = self.parser.pos;
        let first = self.data_window()[pos];
        let hlen = header_len(first).map_err(Halt::Fail)?;
        self.reserve(hlen, false)?;
        let (tag, consumed) = parse_tag(&self.data_window()[pos..pos + hlen]).map_err(Halt::Fail)?;
        debug_assert_eq!(consumed, hlen);

        let mut payload = 0usize;
        let mut push: Option<Frame> = None;
        let node = match tag {
            Tag::Nil => NodeData::NIL,
            Tag::Bool(b) => NodeData::scalar(Kind::Bool, b as u64),
            Tag::Int(i) => NodeData::scalar(Kind::Int, i as u64),
            Tag::Uint(u) => NodeData::scalar(Kind::Uint, u),
            Tag::F32(f) => NodeData::scalar(Kind::Float32, f.to_bits() as u64),
            Tag::F64(f) => NodeData::scalar(Kind::Float64, f.to_bits()),
            Tag::Str(n) | Tag::Bin(n) | Tag::Ext(_, n) => {
                // Payload stays in the message data; the node records its
                // offset.  Reserving it keeps the budget honest and, in
                // stream mode, makes it resident.
                payload = n as usize;
                self.reserve(hlen + payload, false)?;
                NodeData::bytes(tag.kind(), n, (pos + hlen) as u64)
            }
            Tag::Array(n) | Tag::Map(n) => {
                let slots64 = match tag {
                    Tag::Map(_) => 2 * n as u64,
                    _ => n as u64,
                };
                let budget = (self.limits.max_nodes - self.parser.node_count) as u64;
                if slots64 > budget {
                    return Err(Halt::Fail(Error::TooBig));
                }
                let slots = slots64 as usize;
                // Every declared child needs at least one byte: reject a
                // lying header before allocating anything for it.
                self.reserve(hlen + slots, false)?;
                let (page, start) = self.arena.alloc(slots).map_err(Halt::Fail)?;
                self.parser.node_count += slots;
                if slots > 0 {
                    push = Some(Frame {
                        page,
                        start,
                        cursor: 0,
                        left: slots,
                    });
                }
                NodeData::container(tag.kind(), n, page, start)
            }
            // No opcode maps to the sentinels.
            Tag::Missing | Tag::Noop => unreachable!("sentinel kind on the wire"),
        };

        // Commit: everything past this point is non-suspending.
        let new_pos = pos + hlen + payload;
        if new_pos - self.parser.msg_start > self.limits.max_size {
            return Err(Halt::Fail(Error::TooBig));
        }
        self.parser.pos = new_pos;
        self.parser.node_started = false;
        self.parser.current_node_reserved = 0;

        let frame = self
            .parser
            .stack
            .last_mut()
            .expect("parse_one with an empty stack");
        let slot = (frame.page, frame.start + frame.cursor as u32);
        frame.cursor += 1;
        frame.left -= 1;
        *self.arena.node_mut(slot.0, slot.1) = node;

        if let Some(frame) = push {
            self.parser.stack.push(frame);
        }
        while self.parser.stack.last().is_some_and(|f| f.left == 0) {
            self.parser.stack.pop();
        }
        Ok(())
    }

    /// Brings the in-flight node's reservation up to `target` bytes,
    /// filling from the source as needed.
    fn reserve(&mut self, target: usize, at_boundary: bool) -> Step<()> {
        while self.parser.current_node_reserved < target {
            let want = target - self.parser.current_node_reserved;
            let take = want.min(self.parser.possible);
            self.parser.possible -= take;
            self.parser.current_node_reserved += take;
            if self.parser.current_node_reserved == target {
                break;
            }
            self.fill_more(at_boundary)?;
        }
        Ok(())
    }

    /// Pulls more bytes from the source into the growable buffer.
    fn fill_more(&mut self, at_boundary: bool) -> Step<()> {
        let msg_bytes = self.data_len() - self.parser.msg_start;
        let max_size = self.limits.max_size;
        let pos = self.parser.pos;
        match &mut self.data {
            TreeData::Slice(s) => {
                // No source: the blob is all there is.
                let clean = at_boundary && pos == s.len();
                Err(Halt::Fail(if clean { Error::Eof } else { Error::Invalid }))
            }
            TreeData::Stream { buf, source } => {
                let allowed = max_size.saturating_sub(msg_bytes);
                if allowed == 0 {
                    return Err(Halt::Fail(Error::TooBig));
                }
                let chunk = allowed.min(DEFAULT_BUFFER_SIZE);
                let old = buf.len();
                buf.resize(old + chunk, 0);
                match source.fill(&mut buf[old..]) {
                    Ok(0) => {
                        buf.truncate(old);
                        Err(Halt::Incomplete)
                    }
                    Ok(k) => {
                        buf.truncate(old + k);
                        self.parser.possible += k;
                        Ok(())
                    }
                    Err(Error::Eof) => {
                        buf.truncate(old);
                        let clean = at_boundary && pos == old;
                        Err(Halt::Fail(if clean { Error::Eof } else { Error::Io }))
                    }
                    Err(e) => {
                        buf.truncate(old);
                        Err(Halt::Fail(e))
                    }
                }
            }
        }
    }
}
