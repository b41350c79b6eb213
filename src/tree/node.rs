//! Random access into a parsed tree.
//!
//! A [`Node`] is a 16-byte record copied out of the arena plus a reference
//! to its tree; it is `Copy` and borrows the tree immutably, so any number
//! of nodes can be held while the tree is alive.  Queries return explicit
//! `Result`s: a mismatched getter is `type`, a bad map access is `data`.

use crate::error::{Error, Result};
use crate::tag::Kind;
#[cfg(feature = "ext")]
use crate::tag::{timestamp::Timestamp, EXT_TIMESTAMP};
use crate::tree::arena::NodeData;
use crate::tree::Tree;
use crate::utf8;

/// One value of a parsed message.
#[derive(Clone, Copy)]
pub struct Node<'t, 'a> {
    tree: &'t Tree<'a>,
    data: NodeData,
}

impl<'t, 'a> Node<'t, 'a> {
    pub(crate) fn new(tree: &'t Tree<'a>, data: NodeData) -> Node<'t, 'a> {
        Node { tree, data }
    }

    /// The missing-node sentinel, returned by optional lookups so "absent"
    /// stays distinguishable from "present nil".
    fn missing(tree: &'t Tree<'a>) -> Node<'t, 'a> {
        Node {
            tree,
            data: NodeData::MISSING,
        }
    }

    pub fn kind(&self) -> Kind {
        self.data.kind
    }

    pub fn is_nil(&self) -> bool {
        self.data.kind == Kind::Nil
    }

    pub fn is_missing(&self) -> bool {
        self.data.kind == Kind::Missing
    }

    // -- scalar getters -----------------------------------------------------

    pub fn bool_value(&self) -> Result<bool> {
        match self.data.kind {
            Kind::Bool => Ok(self.data.val != 0),
            _ => Err(Error::Type),
        }
    }

    /// The stored integer as unsigned, whatever sign kind carries it.
    fn as_u64(&self) -> Result<u64> {
        match self.data.kind {
            Kind::Uint => Ok(self.data.val),
            Kind::Int if (self.data.val as i64) >= 0 => Ok(self.data.val),
            _ => Err(Error::Type),
        }
    }

    /// The stored integer as signed, whatever sign kind carries it.
    fn as_i64(&self) -> Result<i64> {
        match self.data.kind {
            Kind::Int => Ok(self.data.val as i64),
            Kind::Uint if self.data.val <= i64::MAX as u64 => Ok(self.data.val as i64),
            _ => Err(Error::Type),
        }
    }

    pub fn u64(&self) -> Result<u64> {
        self.as_u64()
    }

    pub fn u32(&self) -> Result<u32> {
        u32::try_from(self.as_u64()?).map_err(|_| Error::Type)
    }

    pub fn u16(&self) -> Result<u16> {
        u16::try_from(self.as_u64()?).map_err(|_| Error::Type)
    }

    pub fn u8(&self) -> Result<u8> {
        u8::try_from(self.as_u64()?).map_err(|_| Error::Type)
    }

    pub fn i64(&self) -> Result<i64> {
        self.as_i64()
    }

    pub fn i32(&self) -> Result<i32> {
        i32::try_from(self.as_i64()?).map_err(|_| Error::Type)
    }

    pub fn i16(&self) -> Result<i16> {
        i16::try_from(self.as_i64()?).map_err(|_| Error::Type)
    }

    pub fn i8(&self) -> Result<i8> {
        i8::try_from(self.as_i64()?).map_err(|_| Error::Type)
    }

    /// Lenient float getter: converts from any numeric kind.
    pub fn f32(&self) -> Result<f32> {
        match self.data.kind {
            Kind::Float32 => Ok(f32::from_bits(self.data.val as u32)),
            Kind::Float64 => Ok(f64::from_bits(self.data.val) as f32),
            Kind::Int => Ok((self.data.val as i64) as f32),
            Kind::Uint => Ok(self.data.val as f32),
            _ => Err(Error::Type),
        }
    }

    /// Lenient double getter: converts from any numeric kind.
    pub fn f64(&self) -> Result<f64> {
        match self.data.kind {
            Kind::Float32 => Ok(f32::from_bits(self.data.val as u32) as f64),
            Kind::Float64 => Ok(f64::from_bits(self.data.val)),
            Kind::Int => Ok((self.data.val as i64) as f64),
            Kind::Uint => Ok(self.data.val as f64),
            _ => Err(Error::Type),
        }
    }

    /// Strict float getter: the stored kind must be float32.
    pub fn f32_strict(&self) -> Result<f32> {
        match self.data.kind {
            Kind::Float32 => Ok(f32::from_bits(self.data.val as u32)),
            _ => Err(Error::Type),
        }
    }

    /// Strict double getter: the stored kind must be float64.
    pub fn f64_strict(&self) -> Result<f64> {
        match self.data.kind {
            Kind::Float64 => Ok(f64::from_bits(self.data.val)),
            _ => Err(Error::Type),
        }
    }

    // -- arrays -------------------------------------------------------------

    pub fn array_length(&self) -> Result<u32> {
        match self.data.kind {
            Kind::Array => Ok(self.data.len),
            _ => Err(Error::Type),
        }
    }

    /// Bounds-checked element access; out of range is `data`.
    pub fn array_at(&self, index: u32) -> Result<Node<'t, 'a>> {
        if self.data.kind != Kind::Array {
            return Err(Error::Type);
        }
        if index >= self.data.len {
            return Err(Error::Data);
        }
        Ok(self.child(index))
    }

    // -- maps ---------------------------------------------------------------

    pub fn map_count(&self) -> Result<u32> {
        match self.data.kind {
            Kind::Map => Ok(self.data.len),
            _ => Err(Error::Type),
        }
    }

    /// Key of the i-th entry, in wire order.
    pub fn map_key_at(&self, index: u32) -> Result<Node<'t, 'a>> {
        if self.data.kind != Kind::Map {
            return Err(Error::Type);
        }
        if index >= self.data.len {
            return Err(Error::Data);
        }
        Ok(self.child(2 * index))
    }

    /// Value of the i-th entry, in wire order.
    pub fn map_value_at(&self, index: u32) -> Result<Node<'t, 'a>> {
        if self.data.kind != Kind::Map {
            return Err(Error::Type);
        }
        if index >= self.data.len {
            return Err(Error::Data);
        }
        Ok(self.child(2 * index + 1))
    }

    /// Linear key scan.  Exactly one match returns its value; two or more
    /// are `data`; none is `Ok(None)`.
    fn map_lookup(
        &self,
        mut matches: impl FnMut(&Node<'t, 'a>) -> bool,
    ) -> Result<Option<Node<'t, 'a>>> {
        if self.data.kind != Kind::Map {
            return Err(Error::Type);
        }
        let mut found: Option<Node<'t, 'a>> = None;
        for i in 0..self.data.len {
            let key = self.child(2 * i);
            if matches(&key) {
                if found.is_some() {
                    return Err(Error::Data);
                }
                found = Some(self.child(2 * i + 1));
            }
        }
        Ok(found)
    }

    /// Value under an unsigned integer key; a missing key is `data`.
    pub fn map_uint(&self, key: u64) -> Result<Node<'t, 'a>> {
        self.map_lookup(|k| k.as_u64() == Ok(key))?
            .ok_or(Error::Data)
    }

    /// Like [`Node::map_uint`] but a missing key returns the missing node.
    pub fn map_uint_optional(&self, key: u64) -> Result<Node<'t, 'a>> {
        Ok(self
            .map_lookup(|k| k.as_u64() == Ok(key))?
            .unwrap_or_else(|| Node::missing(self.tree)))
    }

    /// Value under a signed integer key; a missing key is `data`.
    pub fn map_int(&self, key: i64) -> Result<Node<'t, 'a>> {
        self.map_lookup(|k| k.as_i64() == Ok(key))?
            .ok_or(Error::Data)
    }

    /// Like [`Node::map_int`] but a missing key returns the missing node.
    pub fn map_int_optional(&self, key: i64) -> Result<Node<'t, 'a>> {
        Ok(self
            .map_lookup(|k| k.as_i64() == Ok(key))?
            .unwrap_or_else(|| Node::missing(self.tree)))
    }

    /// Value under a string key; a missing key is `data`.
    pub fn map_str(&self, key: &str) -> Result<Node<'t, 'a>> {
        self.map_lookup(|k| k.str_eq(key))?.ok_or(Error::Data)
    }

    /// Like [`Node::map_str`] but a missing key returns the missing node.
    pub fn map_str_optional(&self, key: &str) -> Result<Node<'t, 'a>> {
        Ok(self
            .map_lookup(|k| k.str_eq(key))?
            .unwrap_or_else(|| Node::missing(self.tree)))
    }

    fn str_eq(&self, s: &str) -> bool {
        self.data.kind == Kind::Str && self.payload() == s.as_bytes()
    }

    fn child(&self, index: u32) -> Node<'t, 'a> {
        let (page, start) = self.data.children();
        Node {
            tree: self.tree,
            data: self.tree.arena.node(page, start + index),
        }
    }

    // -- payload access -----------------------------------------------------

    pub fn str_len(&self) -> Result<u32> {
        match self.data.kind {
            Kind::Str => Ok(self.data.len),
            _ => Err(Error::Type),
        }
    }

    /// Payload byte length of a str/bin/ext node.
    pub fn data_len(&self) -> Result<u32> {
        match self.data.kind {
            Kind::Str | Kind::Bin | Kind::Ext => Ok(self.data.len),
            _ => Err(Error::Type),
        }
    }

    /// Payload bytes of a str/bin/ext node, zero-copy from the message
    /// data.
    pub fn data(&self) -> Result<&'t [u8]> {
        match self.data.kind {
            Kind::Str | Kind::Bin | Kind::Ext => Ok(self.payload()),
            _ => Err(Error::Type),
        }
    }

    /// String payload, validated as UTF-8 (`type` on failure).
    pub fn as_str(&self) -> Result<&'t str> {
        match self.data.kind {
            Kind::Str => utf8::as_utf8(self.payload()).ok_or(Error::Type),
            _ => Err(Error::Type),
        }
    }

    /// Copies the payload into `dst`, returning the byte count.  A short
    /// destination is `too_big`.
    pub fn copy_data(&self, dst: &mut [u8]) -> Result<usize> {
        let payload = self.data()?;
        if dst.len() < payload.len() {
            return Err(Error::TooBig);
        }
        dst[..payload.len()].copy_from_slice(payload);
        Ok(payload.len())
    }

    /// Copies a string payload plus a terminating NUL into `dst`.
    ///
    /// An embedded NUL is `type`; a destination shorter than length + 1 is
    /// `too_big`.  Returns the payload length (excluding the NUL).
    pub fn copy_cstr(&self, dst: &mut [u8]) -> Result<usize> {
        if self.data.kind != Kind::Str {
            return Err(Error::Type);
        }
        let payload = self.payload();
        if payload.contains(&0) {
            return Err(Error::Type);
        }
        if dst.len() < payload.len() + 1 {
            return Err(Error::TooBig);
        }
        dst[..payload.len()].copy_from_slice(payload);
        dst[payload.len()] = 0;
        Ok(payload.len())
    }

    /// Whether the payload is valid UTF-8.
    pub fn check_utf8(&self) -> Result<bool> {
        Ok(utf8::check_utf8(self.data()?))
    }

    /// Whether the payload is valid UTF-8 with no embedded NUL.
    pub fn check_utf8_cstr(&self) -> Result<bool> {
        Ok(utf8::check_utf8_cstr(self.data()?))
    }

    /// Index of the first option matching this string node, or
    /// `options.len()` when none does.
    pub fn enum_value(&self, options: &[&str]) -> Result<usize> {
        if self.data.kind != Kind::Str {
            return Err(Error::Type);
        }
        let payload = self.payload();
        Ok(options
            .iter()
            .position(|o| o.as_bytes() == payload)
            .unwrap_or(options.len()))
    }

    fn payload(&self) -> &'t [u8] {
        let offset = self.data.val as usize;
        &self.tree.data_window()[offset..offset + self.data.len as usize]
    }

    // -- ext ----------------------------------------------------------------

    /// The ext type code.  Every ext wire form places the code immediately
    /// before the payload, so it is read back from the message data.
    #[cfg(feature = "ext")]
    pub fn ext_type(&self) -> Result<i8> {
        match self.data.kind {
            Kind::Ext => {
                let offset = self.data.val as usize;
                Ok(self.tree.data_window()[offset - 1] as i8)
            }
            _ => Err(Error::Type),
        }
    }

    /// Decodes a timestamp (ext −1) node.
    #[cfg(feature = "ext")]
    pub fn timestamp(&self) -> Result<Timestamp> {
        if self.ext_type()? != EXT_TIMESTAMP {
            return Err(Error::Type);
        }
        Timestamp::unpack(self.payload())
    }
}

impl std::fmt::Debug for Node<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.data.kind)
            .field("len", &self.data.len)
            .finish()
    }
}
