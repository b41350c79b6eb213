//! The bounded tree parser.
//!
//! A [`Tree`] materializes one complete message into an immutable,
//! random-access node graph held in a contiguous arena of 16-byte records.
//! Payload bytes are never copied into the arena: str/bin/ext nodes store an
//! offset into the underlying message data.
//!
//! Trees parse from a pre-loaded blob ([`Tree::from_slice`]) or from a
//! pull-fill source ([`Tree::from_source`]), including non-blocking sources
//! via [`Tree::try_parse`].  Each successful parse consumes one message;
//! calling [`Tree::parse`] again consumes the next message from the same
//! data and invalidates all prior nodes.

mod arena;
pub mod node;
mod parser;

pub use node::Node;

use crate::config::{DEFAULT_MAX_MESSAGE_NODES, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::{Error, Result};
use crate::read::Source;
use crate::tree::arena::Arena;
use crate::tree::parser::ParserState;

/// Bounds enforced while parsing one message.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Cap on the total wire size of one message, in bytes.
    pub max_size: usize,
    /// Cap on the number of nodes in one message (map pairs cost two).
    pub max_nodes: usize,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_nodes: DEFAULT_MAX_MESSAGE_NODES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseState {
    NotStarted,
    InProgress,
    Parsed,
}

pub(crate) enum TreeData<'a> {
    /// Pre-loaded blob; running short mid-message is `invalid`.
    Slice(&'a [u8]),
    /// Growable buffer appended to by a pull source.  Already-parsed
    /// message bytes stay resident because nodes reference them by offset.
    Stream {
        buf: Vec<u8>,
        source: Box<dyn Source + 'a>,
    },
}

/// A parsed message as an immutable node tree.
pub struct Tree<'a> {
    pub(crate) data: TreeData<'a>,
    pub(crate) arena: Arena,
    pub(crate) limits: Limits,
    pub(crate) state: ParseState,
    pub(crate) err: Option<Error>,
    pub(crate) parser: ParserState,
    /// Wire size of the most recently parsed message.
    pub(crate) size: usize,
    pub(crate) error_hook: Option<Box<dyn FnMut(Error) + 'a>>,
}

impl<'a> Tree<'a> {
    /// Tree over a pre-loaded blob, with default limits and a paged arena.
    pub fn from_slice(data: &'a [u8]) -> Tree<'a> {
        Tree::from_slice_with_limits(data, Limits::default())
    }

    pub fn from_slice_with_limits(data: &'a [u8], limits: Limits) -> Tree<'a> {
        Tree::build(TreeData::Slice(data), Arena::paged(), limits)
    }

    /// Pool mode: a single pre-sized arena of `max_nodes` records that
    /// never grows; exceeding it parses to `too_big`.
    pub fn from_slice_with_capacity(data: &'a [u8], max_nodes: usize) -> Tree<'a> {
        let limits = Limits {
            max_nodes,
            ..Limits::default()
        };
        Tree::build(TreeData::Slice(data), Arena::pool(max_nodes), limits)
    }

    /// Tree filled from a pull source, with default limits.
    pub fn from_source<S: Source + 'a>(source: S) -> Tree<'a> {
        Tree::from_source_with_limits(source, Limits::default())
    }

    pub fn from_source_with_limits<S: Source + 'a>(source: S, limits: Limits) -> Tree<'a> {
        Tree::build(
            TreeData::Stream {
                buf: Vec::new(),
                source: Box::new(source),
            },
            Arena::paged(),
            limits,
        )
    }

    fn build(data: TreeData<'a>, arena: Arena, limits: Limits) -> Tree<'a> {
        Tree {
            data,
            arena,
            limits,
            state: ParseState::NotStarted,
            err: None,
            parser: ParserState::new(),
            size: 0,
            error_hook: None,
        }
    }

    /// Installs a hook invoked exactly once, on the first error.
    pub fn set_error_hook<F: FnMut(Error) + 'a>(&mut self, hook: F) {
        self.error_hook = Some(Box::new(hook));
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<Error> {
        self.err
    }

    /// Wire size in bytes of the last parsed message.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of nodes in the last parsed message.
    pub fn node_count(&self) -> usize {
        self.parser.node_count
    }

    /// The root node of the parsed message.
    ///
    /// Fails with the latched error, or with `bug` when no parse has
    /// completed.
    pub fn root(&self) -> Result<Node<'_, 'a>> {
        if let Some(e) = self.err {
            return Err(e);
        }
        if self.state != ParseState::Parsed {
            return Err(Error::Bug);
        }
        let (page, index) = self.parser.root;
        Ok(Node::new(self, self.arena.node(page, index)))
    }

    pub(crate) fn fail(&mut self, err: Error) {
        if self.err.is_some() {
            return;
        }
        self.err = Some(err);
        if let Some(mut hook) = self.error_hook.take() {
            hook(err);
        }
    }

    pub(crate) fn data_window(&self) -> &[u8] {
        match &self.data {
            TreeData::Slice(s) => s,
            TreeData::Stream { buf, .. } => buf,
        }
    }

    pub(crate) fn data_len(&self) -> usize {
        self.data_window().len()
    }
}
