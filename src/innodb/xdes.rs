//! Extent descriptor (XDES) entries.
//!
//! Every extent (64 consecutive pages) in a tablespace has a 40-byte
//! descriptor recording which file segment (if any) owns it, which of the
//! tablespace's or segment's extent lists it is linked into, its state, and
//! a 2-bit-per-page bitmap of free/used pages. Descriptors for the first
//! 256 extents of a tablespace live in the FSP header page (page 0);
//! subsequent extents get their own descriptor page every `pages_per_extent
//! * extents_per_page`-th page (the XDES array repeats at the start of
//! every extent-descriptor page, per `fsp0fsp.h`).

use byteorder::{BigEndian, ByteOrder};

use crate::innodb::constants::*;
use crate::innodb::list::ListNode;

/// The state of an extent, from `XDES_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XdesState {
    /// Not yet allocated to any segment or fragment list.
    Free,
    /// On the tablespace's FREE_FRAG list: some pages used as fragments.
    FreeFrag,
    /// On the tablespace's FULL_FRAG list: all pages used as fragments.
    FullFrag,
    /// Fully owned by a file segment.
    Fseg,
    /// Owned by a file segment, but allocated as individual fragment pages.
    FsegFrag,
    /// Unrecognized state code.
    Unknown(u32),
}

impl XdesState {
    pub fn from_u32(val: u32) -> Self {
        match val {
            1 => XdesState::Free,
            2 => XdesState::FreeFrag,
            3 => XdesState::FullFrag,
            4 => XdesState::Fseg,
            5 => XdesState::FsegFrag,
            other => XdesState::Unknown(other),
        }
    }
}

/// A parsed extent descriptor entry.
#[derive(Debug, Clone)]
pub struct XdesEntry {
    /// File segment id owning this extent (0 if unowned).
    pub seg_id: u64,
    /// Linked-list node threading this entry into an FSP or FSEG list.
    pub list_node: ListNode,
    /// Extent state.
    pub state: XdesState,
    /// Raw 16-byte per-page bitmap (2 bits per page, 64 pages per extent).
    bitmap: [u8; 16],
}

impl XdesEntry {
    /// Parse one XDES entry from a 40-byte slice.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < XDES_SIZE {
            return None;
        }
        let mut bitmap = [0u8; 16];
        bitmap.copy_from_slice(&data[XDES_BITMAP..XDES_BITMAP + 16]);

        Some(XdesEntry {
            seg_id: BigEndian::read_u64(&data[XDES_ID..XDES_ID + 8]),
            list_node: ListNode::parse(&data[XDES_FLST_NODE..XDES_FLST_NODE + FLST_NODE_SIZE])?,
            state: XdesState::from_u32(BigEndian::read_u32(
                &data[XDES_STATE..XDES_STATE + 4],
            )),
            bitmap,
        })
    }

    /// Whether the given page (0..64) within this extent is free.
    pub fn is_page_free(&self, page_index: usize) -> bool {
        self.page_bit(page_index, XDES_FREE_BIT)
    }

    fn page_bit(&self, page_index: usize, bit: usize) -> bool {
        let bit_offset = page_index * XDES_BITS_PER_PAGE + bit;
        let byte = self.bitmap[bit_offset / 8];
        (byte >> (bit_offset % 8)) & 1 != 0
    }

    /// Iterate the free/used status of every page in this extent.
    pub fn each_page_status(&self) -> impl Iterator<Item = bool> + '_ {
        (0..XDES_PAGE_COUNT).map(move |i| self.is_page_free(i))
    }

    /// Number of free pages remaining in this extent.
    pub fn free_pages(&self) -> usize {
        self.each_page_status().filter(|&free| free).count()
    }

    /// Number of used pages in this extent.
    pub fn used_pages(&self) -> usize {
        XDES_PAGE_COUNT - self.free_pages()
    }
}

/// Compute the byte offset of the XDES array on a given page.
///
/// On page 0 the array follows the 112-byte FSP header; on any other
/// extent-descriptor page it starts immediately at `FIL_PAGE_DATA`.
pub fn xdes_array_offset(is_fsp_header_page: bool) -> usize {
    if is_fsp_header_page {
        FIL_PAGE_DATA + FSP_HEADER_SIZE
    } else {
        FIL_PAGE_DATA
    }
}

/// Parse every XDES entry present in the array on this page.
///
/// `entry_count` is the number of 40-byte entries to read (bounded by how
/// many fit before the page trailer).
pub fn parse_xdes_array(
    page_data: &[u8],
    is_fsp_header_page: bool,
    entry_count: usize,
) -> Vec<XdesEntry> {
    let base = xdes_array_offset(is_fsp_header_page);
    let mut entries = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let start = base + i * XDES_SIZE;
        if start + XDES_SIZE > page_data.len() {
            break;
        }
        match XdesEntry::parse(&page_data[start..start + XDES_SIZE]) {
            Some(e) => entries.push(e),
            None => break,
        }
    }
    entries
}

/// Number of pages per extent for a given page size (1 MiB per extent for
/// pages up to 16K, 64 pages per extent above that).
pub fn pages_per_extent(page_size: u32) -> u32 {
    if page_size <= 16384 {
        (1024 * 1024) / page_size
    } else {
        64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(seg_id: u64, state: u32, free_bits: &[usize]) -> Vec<u8> {
        let mut buf = vec![0u8; XDES_SIZE];
        BigEndian::write_u64(&mut buf[XDES_ID..XDES_ID + 8], seg_id);
        BigEndian::write_u32(&mut buf[XDES_STATE..XDES_STATE + 4], state);
        for &p in free_bits {
            let bit_offset = p * XDES_BITS_PER_PAGE + XDES_FREE_BIT;
            let byte_idx = XDES_BITMAP + bit_offset / 8;
            buf[byte_idx] |= 1 << (bit_offset % 8);
        }
        buf
    }

    #[test]
    fn test_xdes_entry_parse_state() {
        let buf = make_entry(7, 4, &[0, 1, 2]);
        let entry = XdesEntry::parse(&buf).unwrap();
        assert_eq!(entry.seg_id, 7);
        assert_eq!(entry.state, XdesState::Fseg);
        assert_eq!(entry.free_pages(), 3);
        assert_eq!(entry.used_pages(), 61);
    }

    #[test]
    fn test_xdes_entry_all_used() {
        let buf = make_entry(0, 3, &[]);
        let entry = XdesEntry::parse(&buf).unwrap();
        assert_eq!(entry.state, XdesState::FullFrag);
        assert_eq!(entry.free_pages(), 0);
        assert_eq!(entry.used_pages(), 64);
    }

    #[test]
    fn test_xdes_state_unknown() {
        assert_eq!(XdesState::from_u32(99), XdesState::Unknown(99));
    }

    #[test]
    fn test_pages_per_extent() {
        assert_eq!(pages_per_extent(16384), 64);
        assert_eq!(pages_per_extent(4096), 256);
        assert_eq!(pages_per_extent(65536), 64);
    }

    #[test]
    fn test_xdes_array_offset() {
        assert_eq!(xdes_array_offset(true), FIL_PAGE_DATA + FSP_HEADER_SIZE);
        assert_eq!(xdes_array_offset(false), FIL_PAGE_DATA);
    }
}
