//! Root-anchored view over a chain of INDEX pages: a B+tree.
//!
//! [`BtreeIndex`] wraps a [`Space`] plus a root page number and walks the
//! tree the way InnoDB itself does: starting at the root, each non-leaf
//! page's matching record carries a `child_page_number` to descend into,
//! until a leaf page is reached. Leaf-to-leaf traversal (for range scans)
//! follows the page-level `next`/`prev` FIL pointers rather than re-descending
//! from the root.

use std::cmp::Ordering;

use crate::error::DissectError;
use crate::innodb::describer::RecordDescriber;
use crate::innodb::field_decode::FieldValue;
use crate::innodb::index::{
    binary_search_by_directory, linear_search_from_cursor, IndexHeader, PageDirectory,
    RecordCursor,
};
use crate::innodb::page::FilHeader;
use crate::innodb::page_types::PageType;
use crate::innodb::record::{Record, RecordFormat};
use crate::innodb::tablespace::Space;

/// Direction of a bidirectional cursor traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A single decoded INDEX page plus enough bookkeeping to search and
/// traverse it: its FIL header, INDEX header, and page directory.
struct IndexPage {
    data: Vec<u8>,
    fil: FilHeader,
    header: IndexHeader,
    directory: PageDirectory,
}

impl IndexPage {
    fn load(space: &mut Space, page_no: u32) -> Result<Self, DissectError> {
        let data = space.page(page_no as u64)?;
        let fil = FilHeader::parse(&data).ok_or_else(|| DissectError::Parse(format!(
            "page {} has no FIL header",
            page_no
        )))?;
        if fil.page_type != PageType::Index {
            return Err(DissectError::PageTypeMismatch {
                page_no: page_no as u64,
                expected: "INDEX",
                found: format!("{:?}", fil.page_type),
            });
        }
        let header = IndexHeader::parse(&data).ok_or_else(|| {
            DissectError::Parse(format!("page {} has no INDEX header", page_no))
        })?;
        let directory = PageDirectory::parse(&data, header.n_dir_slots, data.len())
            .ok_or_else(|| DissectError::Parse(format!("page {} has no page directory", page_no)))?;
        Ok(IndexPage {
            data,
            fil,
            header,
            directory,
        })
    }

    fn is_leaf(&self) -> bool {
        self.header.is_leaf()
    }

    fn format(&self) -> RecordFormat {
        self.header.format()
    }
}

/// A B+tree index rooted at a known page, with an optional record
/// describer for decoding leaf rows and non-leaf node pointers.
pub struct BtreeIndex {
    root_page: u32,
    describer: RecordDescriber,
}

impl BtreeIndex {
    /// Construct a view over the B+tree rooted at `root_page`, validating
    /// that the root is an INDEX page with no prev/next sibling (a root is
    /// never linked into a level's sibling chain).
    pub fn new(
        space: &mut Space,
        root_page: u32,
        describer: RecordDescriber,
    ) -> Result<Self, DissectError> {
        let root = IndexPage::load(space, root_page)?;
        if root.fil.has_prev() || root.fil.has_next() {
            return Err(DissectError::Parse(format!(
                "page {} is not a tree root: has sibling links",
                root_page
            )));
        }
        Ok(BtreeIndex {
            root_page,
            describer,
        })
    }

    pub fn root_page(&self) -> u32 {
        self.root_page
    }

    pub fn describer(&self) -> &RecordDescriber {
        &self.describer
    }

    /// Descend the left spine until a page at level `level` is found.
    pub fn min_page_at_level(
        &self,
        space: &mut Space,
        level: u16,
    ) -> Result<Option<u32>, DissectError> {
        self.spine_page_at_level(space, level, Direction::Forward)
    }

    /// Descend the right spine until a page at level `level` is found.
    pub fn max_page_at_level(
        &self,
        space: &mut Space,
        level: u16,
    ) -> Result<Option<u32>, DissectError> {
        self.spine_page_at_level(space, level, Direction::Backward)
    }

    fn spine_page_at_level(
        &self,
        space: &mut Space,
        level: u16,
        direction: Direction,
    ) -> Result<Option<u32>, DissectError> {
        let mut page_no = self.root_page;
        loop {
            let page = IndexPage::load(space, page_no)?;
            if page.header.level == level {
                return Ok(Some(page_no));
            }
            if page.is_leaf() {
                return Ok(None);
            }
            let child = match direction {
                Direction::Forward => self.first_child(&page)?,
                Direction::Backward => self.last_child(&page)?,
            };
            match child {
                Some(c) => page_no = c,
                None => return Ok(None),
            }
        }
    }

    fn first_child(&self, page: &IndexPage) -> Result<Option<u32>, DissectError> {
        let mut cursor =
            RecordCursor::at_min(&page.data, &self.describer, page.is_leaf(), page.format());
        match cursor.record()? {
            Some(rec) => Ok(rec.child_page_number),
            None => Ok(None),
        }
    }

    fn last_child(&self, page: &IndexPage) -> Result<Option<u32>, DissectError> {
        let slot_offset = *page.directory.slots.last().ok_or_else(|| {
            DissectError::Parse("page directory has no slots".to_string())
        })? as usize;
        // The last directory slot owns infimum; walk forward from it to the
        // final live record before supremum.
        let mut cursor = RecordCursor::at_offset(
            &page.data,
            &self.describer,
            page.is_leaf(),
            page.format(),
            slot_offset,
        );
        let mut last = cursor.record()?;
        loop {
            match cursor.record()? {
                Some(rec) => last = Some(rec),
                None => break,
            }
        }
        Ok(last.and_then(|r| r.child_page_number))
    }

    /// The leftmost record of the leaf level.
    pub fn min_record(&self, space: &mut Space) -> Result<Option<Record>, DissectError> {
        let leaf_page = match self.min_page_at_level(space, 0)? {
            Some(p) => p,
            None => return Ok(None),
        };
        let page = IndexPage::load(space, leaf_page)?;
        let mut cursor = RecordCursor::at_min(&page.data, &self.describer, true, page.format());
        cursor.record()
    }

    /// The rightmost record of the leaf level.
    pub fn max_record(&self, space: &mut Space) -> Result<Option<Record>, DissectError> {
        let leaf_page = match self.max_page_at_level(space, 0)? {
            Some(p) => p,
            None => return Ok(None),
        };
        let page = IndexPage::load(space, leaf_page)?;
        let slot_offset = *page.directory.slots.last().ok_or_else(|| {
            DissectError::Parse("page directory has no slots".to_string())
        })? as usize;
        let mut cursor = RecordCursor::at_offset(
            &page.data,
            &self.describer,
            true,
            page.format(),
            slot_offset,
        );
        let mut last = cursor.record()?;
        loop {
            match cursor.record()? {
                Some(rec) => last = Some(rec),
                None => break,
            }
        }
        Ok(last)
    }

    /// Root-down traversal using each page's linear record search; descends
    /// via `child_page_number` at internal levels, accepts only an exact
    /// match on the leaf.
    pub fn linear_search(
        &self,
        space: &mut Space,
        key: &[FieldValue],
    ) -> Result<Option<Record>, DissectError> {
        self.search(space, key, |page_data, describer, is_leaf, format| {
            linear_search_from_cursor(format, page_data, describer, is_leaf, None, key)
        })
    }

    /// Root-down traversal using each page's directory-backed binary search.
    pub fn binary_search(
        &self,
        space: &mut Space,
        key: &[FieldValue],
    ) -> Result<Option<Record>, DissectError> {
        self.search(space, key, |page_data, describer, is_leaf, format| {
            // `directory` is rebuilt per page inside `search`, so capture it
            // via a fresh parse here rather than threading it through.
            let header = IndexHeader::parse(page_data).ok_or_else(|| {
                DissectError::Parse("missing INDEX header during binary search".to_string())
            })?;
            let directory = PageDirectory::parse(page_data, header.n_dir_slots, page_data.len())
                .ok_or_else(|| DissectError::Parse("missing page directory".to_string()))?;
            binary_search_by_directory(format, page_data, &directory, describer, is_leaf, key)
        })
    }

    fn search<F>(
        &self,
        space: &mut Space,
        key: &[FieldValue],
        page_search: F,
    ) -> Result<Option<Record>, DissectError>
    where
        F: Fn(&[u8], &RecordDescriber, bool, RecordFormat) -> Result<Option<Record>, DissectError>,
    {
        let mut page_no = self.root_page;
        loop {
            let page = IndexPage::load(space, page_no)?;
            let is_leaf = page.is_leaf();
            let found = page_search(&page.data, &self.describer, is_leaf, page.format())?;

            if is_leaf {
                return Ok(found.filter(|rec| rec.compare_key(key) == Ordering::Equal));
            }

            match found.and_then(|rec| rec.child_page_number) {
                Some(child) => page_no = child,
                None => return Ok(None),
            }
        }
    }

    /// A bidirectional cursor over the leaf level, starting at the min or
    /// max record and hopping across page boundaries via FIL `next`/`prev`
    /// once a page's local chain is exhausted.
    pub fn cursor(
        &self,
        space: &mut Space,
        start: CursorStart,
        direction: Direction,
    ) -> Result<IndexCursor<'_>, DissectError> {
        let leaf_page = match start {
            CursorStart::Min => self.min_page_at_level(space, 0)?,
            CursorStart::Max => self.max_page_at_level(space, 0)?,
        };
        let leaf_page = leaf_page.ok_or_else(|| {
            DissectError::Parse("index has no leaf pages".to_string())
        })?;
        Ok(IndexCursor {
            index: self,
            direction,
            page_no: Some(leaf_page),
            position: None,
        })
    }
}

/// Where an [`IndexCursor`] begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStart {
    Min,
    Max,
}

/// A cursor over an index's leaf records that transparently crosses page
/// boundaries via `FilHeader::next_page` / `prev_page`.
pub struct IndexCursor<'a> {
    index: &'a BtreeIndex,
    direction: Direction,
    page_no: Option<u32>,
    /// Offset of the last-returned record on the current page, used to seed
    /// a fresh [`RecordCursor`] after crossing a page boundary.
    position: Option<usize>,
}

impl<'a> IndexCursor<'a> {
    /// Return the next record in this cursor's direction, hopping to the
    /// sibling leaf page when the current page's chain is exhausted.
    pub fn next(&mut self, space: &mut Space) -> Result<Option<Record>, DissectError> {
        loop {
            let page_no = match self.page_no {
                Some(p) => p,
                None => return Ok(None),
            };
            let page = IndexPage::load(space, page_no)?;

            let format = page.format();
            let mut cursor = match self.position {
                Some(off) => {
                    RecordCursor::at_offset(&page.data, &self.index.describer, true, format, off)
                }
                None if self.direction == Direction::Forward => {
                    RecordCursor::at_min(&page.data, &self.index.describer, true, format)
                }
                None => {
                    let slot_offset = match page.directory.slots.last() {
                        Some(&s) => s as usize,
                        None => {
                            self.page_no = None;
                            continue;
                        }
                    };
                    RecordCursor::at_offset(
                        &page.data,
                        &self.index.describer,
                        true,
                        format,
                        slot_offset,
                    )
                }
            };

            let next = match self.direction {
                Direction::Forward => cursor.record()?,
                Direction::Backward => cursor.prev_record()?,
            };

            match next {
                Some(rec) => {
                    self.position = Some(rec.offset);
                    return Ok(Some(rec));
                }
                None => {
                    self.page_no = match self.direction {
                        Direction::Forward if page.fil.has_next() => Some(page.fil.next_page),
                        Direction::Backward if page.fil.has_prev() => Some(page.fil.prev_page),
                        _ => None,
                    };
                    self.position = None;
                    if self.page_no.is_none() {
                        return Ok(None);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::describer::{DataType, FieldSpec, IndexKind, RecordDescriber};

    fn int_describer() -> RecordDescriber {
        RecordDescriber::builder(IndexKind::Clustered)
            .key_field(FieldSpec::new("id", DataType::int(4, true), false))
            .build()
    }

    #[test]
    fn direction_equality() {
        assert_eq!(Direction::Forward, Direction::Forward);
        assert_ne!(Direction::Forward, Direction::Backward);
    }

    #[test]
    fn describer_smoke() {
        let describer = int_describer();
        assert!(describer.is_clustered() || !describer.is_clustered());
    }
}
