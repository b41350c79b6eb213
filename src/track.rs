//! Structural tracking of open compound types.
//!
//! Both streaming surfaces share this stack: every compound opened must be
//! closed exactly once, in LIFO order, with the matching kind, and with its
//! declared count or byte length fully consumed first.  Violations are
//! `bug`-class errors (the caller broke the contract, not the data).
//!
//! Map entries alternate between a key and a value position; the pair
//! counter only decrements once the value half has been observed.

use crate::config::INITIAL_STACK_DEPTH;
use crate::error::{bug, Result};
#[cfg(test)]
use crate::error::Error;
use crate::tag::Kind;

/// One open compound: its kind, the units left (elements for arrays, pairs
/// for maps, bytes for str/bin/ext), and the key/value phase for maps.
#[derive(Debug, Clone, Copy)]
struct Open {
    kind: Kind,
    left: u64,
    key_needs_value: bool,
}

/// Stack of open compounds.
#[derive(Debug)]
pub(crate) struct Tracker {
    stack: Vec<Open>,
}

impl Tracker {
    pub fn new() -> Tracker {
        Tracker {
            stack: Vec::with_capacity(INITIAL_STACK_DEPTH),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Opens a compound.  `count` is pairs for maps, bytes for the byte
    /// kinds, elements for arrays.
    pub fn push(&mut self, kind: Kind, count: u64) -> Result<()> {
        if !kind.is_compound() {
            return Err(bug!("cannot open non-compound kind {kind}"));
        }
        self.stack.push(Open {
            kind,
            left: count,
            key_needs_value: false,
        });
        Ok(())
    }

    /// Accounts for one element at the current position.
    ///
    /// `consume` is false for peeks, which validate that an element may
    /// appear here without spending its slot.  At the top level (empty
    /// stack) elements are always allowed.
    pub fn element(&mut self, consume: bool) -> Result<()> {
        let top = match self.stack.last_mut() {
            Some(top) => top,
            None => return Ok(()),
        };
        match top.kind {
            Kind::Array => {
                if top.left == 0 {
                    return Err(bug!("too many elements for array"));
                }
                if consume {
                    top.left -= 1;
                }
            }
            Kind::Map => {
                if !top.key_needs_value {
                    if top.left == 0 {
                        return Err(bug!("too many entries for map"));
                    }
                    if consume {
                        top.key_needs_value = true;
                    }
                } else if consume {
                    // Value half observed: the pair is complete.
                    top.key_needs_value = false;
                    top.left -= 1;
                }
            }
            kind => {
                return Err(bug!("elements are not allowed inside {kind}"));
            }
        }
        Ok(())
    }

    /// Accounts for `n` payload bytes of the open str/bin/ext.
    pub fn bytes(&mut self, n: u64) -> Result<()> {
        let top = match self.stack.last_mut() {
            Some(top) => top,
            None => return Err(bug!("byte write outside an open byte compound")),
        };
        if !top.kind.is_bytes() {
            return Err(bug!("byte write inside {}", top.kind));
        }
        if top.left < n {
            return Err(bug!(
                "{} bytes past the declared length of the open {}",
                n - top.left,
                top.kind
            ));
        }
        top.left -= n;
        Ok(())
    }

    /// Closes the innermost compound, which must match `kind` and be fully
    /// consumed.
    pub fn pop(&mut self, kind: Kind) -> Result<()> {
        let top = match self.stack.last() {
            Some(top) => *top,
            None => return Err(bug!("close of {kind} with nothing open")),
        };
        if top.kind != kind {
            return Err(bug!("close of {kind} but the open compound is {}", top.kind));
        }
        if top.key_needs_value {
            return Err(bug!("close of map with a key missing its value"));
        }
        if top.left != 0 {
            return Err(bug!("close of {kind} with {} units left", top.left));
        }
        self.stack.pop();
        Ok(())
    }

    /// Asserted at destroy time: nothing may remain open.
    pub fn check_empty(&self) -> Result<()> {
        if let Some(top) = self.stack.last() {
            return Err(bug!(
                "destroyed with {} open compound(s), innermost {}",
                self.stack.len(),
                top.kind
            ));
        }
        Ok(())
    }
}
