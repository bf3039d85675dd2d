//! File segment (FSEG) inode entries.
//!
//! A file segment is InnoDB's unit of space allocation below a whole
//! extent: every B+tree index owns two segments (leaf and non-leaf, see
//! [`crate::innodb::index::FsegHeader`]), each described by one 192-byte
//! inode entry living on an INODE page (`FIL_PAGE_INODE`, type 3). The
//! inode tracks the segment's three extent lists (free / not-full / full),
//! how many pages of its "not full" extents are in use, and up to 32
//! individual fragment pages that haven't been grouped into a whole extent
//! yet.

use byteorder::{BigEndian, ByteOrder};

use crate::innodb::constants::*;
use crate::innodb::list::BaseNode;

/// A parsed file segment inode entry.
#[derive(Debug, Clone)]
pub struct FsegInode {
    /// Segment id (matches the id stored in owned XDES entries).
    pub seg_id: u64,
    /// Pages used across this segment's not-full extents.
    pub not_full_n_used: u32,
    /// List of extents fully owned and fully free.
    pub free_list: BaseNode,
    /// List of extents fully owned, partially used.
    pub not_full_list: BaseNode,
    /// List of extents fully owned and fully used.
    pub full_list: BaseNode,
    /// Magic number; valid entries read [`FSEG_MAGIC_N_VALUE`].
    pub magic: u32,
    /// Up to 32 individually-allocated fragment pages (FIL_NULL slots unused).
    pub frag_array: Vec<u32>,
}

impl FsegInode {
    /// Parse one inode entry from a 192-byte slice.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FSEG_INODE_SIZE {
            return None;
        }

        let mut frag_array = Vec::with_capacity(FSEG_FRAG_ARR_N_SLOTS);
        for i in 0..FSEG_FRAG_ARR_N_SLOTS {
            let off = FSEG_FRAG_ARR + i * 4;
            frag_array.push(BigEndian::read_u32(&data[off..off + 4]));
        }

        Some(FsegInode {
            seg_id: BigEndian::read_u64(&data[FSEG_ID..FSEG_ID + 8]),
            not_full_n_used: BigEndian::read_u32(
                &data[FSEG_NOT_FULL_N_USED..FSEG_NOT_FULL_N_USED + 4],
            ),
            free_list: BaseNode::parse(&data[FSEG_FREE..FSEG_FREE + FLST_BASE_NODE_SIZE])?,
            not_full_list: BaseNode::parse(
                &data[FSEG_NOT_FULL..FSEG_NOT_FULL + FLST_BASE_NODE_SIZE],
            )?,
            full_list: BaseNode::parse(&data[FSEG_FULL..FSEG_FULL + FLST_BASE_NODE_SIZE])?,
            magic: BigEndian::read_u32(&data[FSEG_MAGIC_N..FSEG_MAGIC_N + 4]),
            frag_array,
        })
    }

    /// Whether the magic number matches the expected value.
    pub fn is_valid(&self) -> bool {
        self.magic == FSEG_MAGIC_N_VALUE
    }

    /// The segment's individually-allocated fragment pages, excluding unused slots.
    pub fn fragment_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.frag_array
            .iter()
            .copied()
            .filter(|&p| p != FSEG_FRAG_SLOT_NONE)
    }

    /// Total pages owned by this segment: fragment pages plus extents owned
    /// outright (free + not-full + full extent lists, 64 pages each).
    pub fn total_pages(&self) -> u64 {
        let frag = self.fragment_pages().count() as u64;
        let extents =
            self.free_list.len as u64 + self.not_full_list.len as u64 + self.full_list.len as u64;
        frag + extents * XDES_PAGE_COUNT as u64
    }
}

/// Parse the inode entry at `slot_index` on an INODE page.
pub fn read_inode_slot(page_data: &[u8], slot_index: usize) -> Option<FsegInode> {
    let start = FSEG_ARR_OFFSET + slot_index * FSEG_INODE_SIZE;
    if start + FSEG_INODE_SIZE > page_data.len() {
        return None;
    }
    FsegInode::parse(&page_data[start..start + FSEG_INODE_SIZE])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_inode_bytes(seg_id: u64, magic: u32, frag: &[u32]) -> Vec<u8> {
        let mut buf = vec![0u8; FSEG_INODE_SIZE];
        BigEndian::write_u64(&mut buf[FSEG_ID..FSEG_ID + 8], seg_id);
        BigEndian::write_u32(&mut buf[FSEG_MAGIC_N..FSEG_MAGIC_N + 4], magic);
        for i in 0..FSEG_FRAG_ARR_N_SLOTS {
            let off = FSEG_FRAG_ARR + i * 4;
            let val = frag.get(i).copied().unwrap_or(FIL_NULL);
            BigEndian::write_u32(&mut buf[off..off + 4], val);
        }
        buf
    }

    #[test]
    fn test_fseg_inode_parse() {
        let buf = make_inode_bytes(42, FSEG_MAGIC_N_VALUE, &[5, 9, 17]);
        let inode = FsegInode::parse(&buf).unwrap();
        assert_eq!(inode.seg_id, 42);
        assert!(inode.is_valid());
        assert_eq!(inode.fragment_pages().collect::<Vec<_>>(), vec![5, 9, 17]);
    }

    #[test]
    fn test_fseg_inode_invalid_magic() {
        let buf = make_inode_bytes(1, 0xDEADBEEF, &[]);
        let inode = FsegInode::parse(&buf).unwrap();
        assert!(!inode.is_valid());
        assert_eq!(inode.fragment_pages().count(), 0);
    }

    #[test]
    fn test_read_inode_slot_out_of_range() {
        let page = vec![0u8; 200];
        assert!(read_inode_slot(&page, 0).is_none());
    }
}
