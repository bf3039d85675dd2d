//! Intrusive doubly-linked list primitives (`fut0lst.h`'s `FLST_BASE_NODE` /
//! `FLST_NODE`).
//!
//! InnoDB threads several on-disk lists through otherwise unrelated pages:
//! the tablespace's free/free-frag/full-frag extent lists, a segment's
//! free/not-full/full extent lists, the list of INODE pages, and the undo
//! history list. Every one of these is built from the same two primitives:
//! a 16-byte [`BaseNode`] (length + first/last addresses) anchoring the
//! list, and a 12-byte [`ListNode`] (prev/next addresses) embedded at a
//! fixed offset inside each linked page.
//!
//! A [`FileAddr`] of `(FIL_NULL, 0)` terminates the list in either direction.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::innodb::constants::*;

/// A page number + byte offset pair addressing a list node or base node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileAddr {
    pub page_no: u32,
    pub offset: u16,
}

impl FileAddr {
    /// The null address, terminating a list in one direction.
    pub const NULL: FileAddr = FileAddr {
        page_no: FIL_NULL,
        offset: 0,
    };

    /// True if this address is the null terminator.
    pub fn is_null(&self) -> bool {
        self.page_no == FIL_NULL
    }

    /// Parse a 6-byte file address.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FIL_ADDR_SIZE {
            return None;
        }
        Some(FileAddr {
            page_no: BigEndian::read_u32(&data[0..4]),
            offset: BigEndian::read_u16(&data[4..6]),
        })
    }
}

/// A list base node (16 bytes): list length plus first/last node addresses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BaseNode {
    pub len: u32,
    pub first: FileAddr,
    pub last: FileAddr,
}

impl BaseNode {
    /// Parse a base node from a byte slice (at least 16 bytes).
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FLST_BASE_NODE_SIZE {
            return None;
        }
        Some(BaseNode {
            len: BigEndian::read_u32(&data[0..4]),
            first: FileAddr::parse(&data[4..10])?,
            last: FileAddr::parse(&data[10..16])?,
        })
    }

    /// True if the list described by this base node has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0 || self.first.is_null()
    }
}

/// A list node (12 bytes): previous and next addresses.
#[derive(Debug, Clone, Copy)]
pub struct ListNode {
    pub prev: FileAddr,
    pub next: FileAddr,
}

impl ListNode {
    /// Parse a list node from a byte slice (at least 12 bytes).
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FLST_NODE_SIZE {
            return None;
        }
        Some(ListNode {
            prev: FileAddr::parse(&data[0..6])?,
            next: FileAddr::parse(&data[6..12])?,
        })
    }
}
