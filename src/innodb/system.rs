//! Top-level catalog: discovers the tablespaces and data dictionary beneath
//! a MySQL data directory (or a single tablespace file), optionally attaches
//! a redo log group, and ties all three together behind one handle.
//!
//! [`System::open`] accepts either a path to a single tablespace file
//! (typically `ibdata1`, or a lone per-table `.ibd`) or a directory. For a
//! directory it globs `ibdata*` files for the primary system tablespace,
//! attaches `mysql.ibd` (the data-dictionary tablespace MySQL 8.0 introduced,
//! under the fixed space id [`MYSQL_IBD_SPACE_ID`]) if present, and globs
//! every `*.ibd` beneath the directory for per-table spaces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::DissectError;
use crate::innodb::btree::{BtreeIndex, CursorStart, Direction, IndexCursor};
use crate::innodb::dictionary::{self, DataDictionary};
use crate::innodb::field_decode::FieldValue;
use crate::innodb::log::LogGroup;
use crate::innodb::record::Record;
use crate::innodb::schema::SdiEnvelope;
use crate::innodb::sdi;
use crate::innodb::tablespace::{Space, Tablespace};
use crate::innodb::undo::{HistoryList, RsegHeader, UndoPageHeader, UndoSegmentHeader};
use crate::util::fs::find_tablespace_files;

/// Fixed space id MySQL assigns the `mysql.ibd` data-dictionary tablespace.
pub const MYSQL_IBD_SPACE_ID: u32 = 0xFFFF_FFFE;

/// Page holding the system tablespace's first rollback segment header
/// (`FSP_FIRST_RSEG_PAGE_NO` in pre-8.0 installations that keep a single
/// rollback segment inside `ibdata1` rather than a separate undo tablespace).
const RSEG0_HDR_PAGE_NO: u64 = 6;

/// A B+tree index bound to the [`Space`] it lives in, as handed back by
/// [`System::index_by_name`] / [`System::clustered_index_by_table_id`]. The
/// borrow keeps the right `Space` alive for exactly as long as the handle,
/// so callers don't have to separately track which tablespace a dictionary
/// index actually resolves to.
pub struct IndexHandle<'a> {
    space: &'a mut Space,
    btree: BtreeIndex,
}

impl<'a> IndexHandle<'a> {
    pub fn root_page(&self) -> u32 {
        self.btree.root_page()
    }

    pub fn min_record(&mut self) -> Result<Option<Record>, DissectError> {
        self.btree.min_record(self.space)
    }

    pub fn max_record(&mut self) -> Result<Option<Record>, DissectError> {
        self.btree.max_record(self.space)
    }

    pub fn linear_search(&mut self, key: &[FieldValue]) -> Result<Option<Record>, DissectError> {
        self.btree.linear_search(self.space, key)
    }

    pub fn binary_search(&mut self, key: &[FieldValue]) -> Result<Option<Record>, DissectError> {
        self.btree.binary_search(self.space, key)
    }

    pub fn cursor(&mut self, start: CursorStart, direction: Direction) -> Result<IndexCursor<'_>, DissectError> {
        self.btree.cursor(self.space, start, direction)
    }
}

/// An orphaned table: its declared tablespace file could not be located.
/// Never fatal — see §7's propagation policy.
#[derive(Debug, Clone)]
pub struct Orphan {
    pub table_name: String,
    pub space_id: u32,
}

/// The top-level catalog over a data directory (or a single tablespace
/// file): every opened [`Space`], the populated [`DataDictionary`], and an
/// optional redo log group.
pub struct System {
    primary_space_id: u32,
    spaces: HashMap<u32, Space>,
    space_paths: HashMap<u32, PathBuf>,
    dictionary: DataDictionary,
    orphans: Vec<Orphan>,
    log_group: Option<LogGroup>,
}

impl System {
    /// Open a system from a single tablespace file or a data directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DissectError> {
        Self::open_with_data_dir(path, None)
    }

    /// Open a system, resolving per-table files against `data_dir` instead
    /// of the directory `path` lives in (the override spec §6 describes).
    /// Only meaningful when `path` is a directory; ignored for a single file.
    pub fn open_with_data_dir<P: AsRef<Path>>(
        path: P,
        data_dir: Option<&Path>,
    ) -> Result<Self, DissectError> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::open_directory(path, data_dir.unwrap_or(path))
        } else {
            Self::open_file(path)
        }
    }

    fn open_file(path: &Path) -> Result<Self, DissectError> {
        let space = Space::open_single(path)?;
        let space_id = space.space_id().unwrap_or(0);

        let mut spaces = HashMap::new();
        let mut space_paths = HashMap::new();
        spaces.insert(space_id, space);
        space_paths.insert(space_id, path.to_path_buf());

        let dictionary = Self::load_dictionary(&mut spaces, &space_paths, space_id)?;
        let orphans = Self::find_orphans(&dictionary, &spaces);

        Ok(System {
            primary_space_id: space_id,
            spaces,
            space_paths,
            dictionary,
            orphans,
            log_group: None,
        })
    }

    fn open_directory(dir: &Path, data_dir: &Path) -> Result<Self, DissectError> {
        let mut ibdata: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| DissectError::Io(format!("cannot read directory {}: {}", dir.display(), e)))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("ibdata"))
                    .unwrap_or(false)
            })
            .collect();
        ibdata.sort();
        if ibdata.is_empty() {
            return Err(DissectError::Argument(format!(
                "no ibdata* files found in {}",
                dir.display()
            )));
        }

        let mut spaces = HashMap::new();
        let mut space_paths = HashMap::new();

        let primary = Space::open_files(&ibdata)?;
        let primary_space_id = primary.space_id().unwrap_or(0);
        spaces.insert(primary_space_id, primary);
        space_paths.insert(primary_space_id, ibdata[0].clone());

        let mysql_ibd = data_dir.join("mysql.ibd");
        if mysql_ibd.is_file() {
            match Space::open_single(&mysql_ibd) {
                Ok(space) => {
                    spaces.insert(MYSQL_IBD_SPACE_ID, space);
                    space_paths.insert(MYSQL_IBD_SPACE_ID, mysql_ibd.clone());
                }
                Err(e) => log::warn!("cannot open {}: {}", mysql_ibd.display(), e),
            }
        }

        for table_path in find_tablespace_files(data_dir, &["ibd"])? {
            if table_path == mysql_ibd {
                continue;
            }
            match Space::open_single(&table_path) {
                Ok(space) => match space.space_id() {
                    Some(id) => {
                        spaces.insert(id, space);
                        space_paths.insert(id, table_path);
                    }
                    None => log::warn!(
                        "tablespace file {} has no readable FSP header; skipping",
                        table_path.display()
                    ),
                },
                Err(e) => log::warn!("cannot open tablespace file {}: {}", table_path.display(), e),
            }
        }

        let dictionary = Self::load_dictionary(&mut spaces, &space_paths, primary_space_id)?;
        let orphans = Self::find_orphans(&dictionary, &spaces);

        Ok(System {
            primary_space_id,
            spaces,
            space_paths,
            dictionary,
            orphans,
            log_group: None,
        })
    }

    /// Pick a dictionary back-end and load it. The source distinguishes the
    /// two formats by an empirical comparison of `page(0).prev` against a
    /// threshold; that check's exact version boundary is an open question
    /// the source itself flags as unconfirmed (spec §9). This instead tests
    /// for the presence of the SDI marker on the primary space's page 0 — a
    /// positive, format-defined signal rather than a guessed threshold — and
    /// falls back to the internal `SYS_*` tables only for an actual system
    /// space lacking that marker. See DESIGN.md for the full rationale.
    fn load_dictionary(
        spaces: &mut HashMap<u32, Space>,
        space_paths: &HashMap<u32, PathBuf>,
        primary_id: u32,
    ) -> Result<DataDictionary, DissectError> {
        let primary = spaces
            .get_mut(&primary_id)
            .ok_or(DissectError::DictionaryNotFound)?;
        let is_system_space = primary.system_space().unwrap_or(false);
        let page0 = primary.page(0)?;
        let uses_sdi =
            sdi::read_sdi_root_page(&page0, primary.page_size(), primary.pages()).is_some();

        if is_system_space && !uses_sdi {
            log::debug!("loading data dictionary from internal SYS_* tables");
            dictionary::load_from_sys(primary)
        } else {
            log::debug!("loading data dictionary from serialized dictionary information (SDI)");
            Self::load_dictionary_from_sdi(space_paths, primary_id)
        }
    }

    fn load_dictionary_from_sdi(
        space_paths: &HashMap<u32, PathBuf>,
        primary_id: u32,
    ) -> Result<DataDictionary, DissectError> {
        let mut tables_by_space = HashMap::new();

        for (&space_id, path) in space_paths {
            if space_id == primary_id {
                continue;
            }
            let mut ts = match Tablespace::open(path) {
                Ok(ts) => ts,
                Err(e) => {
                    log::warn!("cannot reopen {} for SDI extraction: {}", path.display(), e);
                    continue;
                }
            };
            let sdi_pages = match sdi::find_sdi_pages(&mut ts) {
                Ok(pages) => pages,
                Err(e) => {
                    log::warn!("cannot locate SDI pages in {}: {}", path.display(), e);
                    continue;
                }
            };
            if sdi_pages.is_empty() {
                continue;
            }
            let records = match sdi::extract_sdi_from_pages(&mut ts, &sdi_pages) {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("cannot extract SDI records from {}: {}", path.display(), e);
                    continue;
                }
            };
            for rec in records {
                if rec.sdi_type != 1 {
                    continue; // 1 = Table, 2 = Tablespace; only tables feed the object graph.
                }
                match serde_json::from_str::<SdiEnvelope>(&rec.data) {
                    Ok(envelope) => {
                        tables_by_space.insert(space_id, envelope.dd_object);
                    }
                    Err(e) => log::warn!("malformed SDI JSON for space {}: {}", space_id, e),
                }
            }
        }

        Ok(dictionary::load_from_sdi(tables_by_space))
    }

    fn find_orphans(dictionary: &DataDictionary, spaces: &HashMap<u32, Space>) -> Vec<Orphan> {
        dictionary
            .tables
            .iter()
            .filter(|t| !spaces.contains_key(&t.space_id))
            .map(|t| Orphan {
                table_name: t.name.clone(),
                space_id: t.space_id,
            })
            .collect()
    }

    /// The populated data dictionary.
    pub fn dictionary(&self) -> &DataDictionary {
        &self.dictionary
    }

    /// Tables whose declared tablespace file could not be located. Never
    /// fatal: the table's metadata is still present in [`System::dictionary`].
    pub fn orphans(&self) -> &[Orphan] {
        &self.orphans
    }

    /// The space id of the primary (system) tablespace this system was
    /// opened from.
    pub fn primary_space_id(&self) -> u32 {
        self.primary_space_id
    }

    /// Look up an opened space by its id.
    pub fn space(&mut self, id: u32) -> Option<&mut Space> {
        self.spaces.get_mut(&id)
    }

    /// Look up the space backing a named table.
    pub fn space_by_table_name(&mut self, name: &str) -> Option<&mut Space> {
        let space_id = self.dictionary.find(name)?.space_id;
        self.spaces.get_mut(&space_id)
    }

    /// Resolve `table.index` to a traversable B+tree bound to its space.
    pub fn index_by_name(&mut self, table: &str, index: &str) -> Result<IndexHandle<'_>, DissectError> {
        let dict_index = self
            .dictionary
            .index_by_name(table, index)
            .ok_or_else(|| DissectError::MissingIndex {
                table: table.to_string(),
                index: index.to_string(),
            })?;
        let (space_id, root_page, describer) =
            (dict_index.space_id, dict_index.root_page, dict_index.describer());
        self.index_handle(space_id, root_page, describer)
    }

    /// Resolve a table's clustered index by its innodb table id.
    pub fn clustered_index_by_table_id(&mut self, table_id: u64) -> Result<IndexHandle<'_>, DissectError> {
        let table = self
            .dictionary
            .table_by_id(table_id)
            .ok_or_else(|| DissectError::MissingTable {
                name: format!("table id {}", table_id),
            })?;
        let dict_index = table
            .clustered_index()
            .ok_or_else(|| DissectError::MissingIndex {
                table: table.name.clone(),
                index: "PRIMARY".to_string(),
            })?;
        let (space_id, root_page, describer) =
            (dict_index.space_id, dict_index.root_page, dict_index.describer());
        self.index_handle(space_id, root_page, describer)
    }

    fn index_handle(
        &mut self,
        space_id: u32,
        root_page: u32,
        describer: crate::innodb::describer::RecordDescriber,
    ) -> Result<IndexHandle<'_>, DissectError> {
        let space = self.spaces.get_mut(&space_id).ok_or_else(|| DissectError::PageRead {
            page_no: root_page as u64,
            reason: format!("tablespace for space id {} is not loaded", space_id),
        })?;
        let btree = BtreeIndex::new(space, root_page, describer)?;
        Ok(IndexHandle { space, btree })
    }

    /// Enumerate every rollback segment's history list in the primary
    /// (system) space, yielding a cursor over every undo record they carry.
    pub fn history(&mut self) -> Result<HistoryList, DissectError> {
        let primary = self
            .spaces
            .get_mut(&self.primary_space_id)
            .ok_or(DissectError::DictionaryNotFound)?;

        let rseg_page = primary.page(RSEG0_HDR_PAGE_NO)?;
        let rseg = RsegHeader::parse(&rseg_page).ok_or_else(|| {
            DissectError::PageTypeMismatch {
                page_no: RSEG0_HDR_PAGE_NO,
                expected: "rollback segment header",
                found: "unparseable".to_string(),
            }
        })?;

        let mut logs = Vec::new();
        for (_slot, page_no) in rseg.used_slots() {
            let page_data = primary.page(page_no as u64)?;
            let log_offset = match UndoSegmentHeader::parse(&page_data) {
                Some(seg_hdr) if seg_hdr.last_log != 0 => Some(seg_hdr.last_log),
                _ => UndoPageHeader::parse(&page_data).map(|h| h.start).filter(|&s| s != 0),
            };
            if let Some(offset) = log_offset {
                logs.push((page_no as u64, offset));
            }
        }
        Ok(HistoryList::new(logs))
    }

    /// Attach a redo log group from an explicit list of log file paths.
    pub fn open_log_group(&mut self, paths: &[String]) -> Result<(), DissectError> {
        self.log_group = Some(LogGroup::open(paths)?);
        Ok(())
    }

    /// The attached redo log group, if one was opened via
    /// [`System::open_log_group`].
    pub fn log_group(&mut self) -> Option<&mut LogGroup> {
        self.log_group.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, ByteOrder};
    use std::io::Write;
    use tempfile::TempDir;

    use crate::innodb::constants::*;

    const PS: usize = SIZE_PAGE_DEFAULT as usize;

    fn fsp_page(space_id: u32, total_pages: u32) -> Vec<u8> {
        let mut page = vec![0u8; PS];
        BigEndian::write_u32(&mut page[FIL_PAGE_OFFSET..], 0);
        BigEndian::write_u32(&mut page[FIL_PAGE_PREV..], FIL_NULL);
        BigEndian::write_u32(&mut page[FIL_PAGE_NEXT..], FIL_NULL);
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], 8); // FSP_HDR
        BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_ID..], space_id);
        let fsp = FIL_PAGE_DATA;
        BigEndian::write_u32(&mut page[fsp + FSP_SPACE_ID..], space_id);
        BigEndian::write_u32(&mut page[fsp + FSP_SIZE..], total_pages);
        BigEndian::write_u32(&mut page[fsp + FSP_FREE_LIMIT..], total_pages);
        BigEndian::write_u32(&mut page[fsp + FSP_SPACE_FLAGS..], 0);
        let end = PS - SIZE_FIL_TRAILER;
        let crc1 = crc32c::crc32c(&page[FIL_PAGE_OFFSET..FIL_PAGE_FILE_FLUSH_LSN]);
        let crc2 = crc32c::crc32c(&page[FIL_PAGE_DATA..end]);
        BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_OR_CHKSUM..], crc1 ^ crc2);
        page
    }

    fn blank_page(page_no: u32, space_id: u32, page_type: u16) -> Vec<u8> {
        let mut page = vec![0u8; PS];
        BigEndian::write_u32(&mut page[FIL_PAGE_OFFSET..], page_no);
        BigEndian::write_u32(&mut page[FIL_PAGE_PREV..], FIL_NULL);
        BigEndian::write_u32(&mut page[FIL_PAGE_NEXT..], FIL_NULL);
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], page_type);
        BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_ID..], space_id);
        let end = PS - SIZE_FIL_TRAILER;
        let crc1 = crc32c::crc32c(&page[FIL_PAGE_OFFSET..FIL_PAGE_FILE_FLUSH_LSN]);
        let crc2 = crc32c::crc32c(&page[FIL_PAGE_DATA..end]);
        BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_OR_CHKSUM..], crc1 ^ crc2);
        page
    }

    fn write_file(dir: &Path, name: &str, pages: &[Vec<u8>]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        for page in pages {
            f.write_all(page).unwrap();
        }
        path
    }

    #[test]
    fn open_single_file_without_dictionary_orphans_nothing() {
        let dir = TempDir::new().unwrap();
        // A lone per-table file with no SYS_* dictionary and no SDI marker:
        // the dictionary comes back empty rather than erroring.
        let path = write_file(&dir, "standalone.ibd", &[fsp_page(9, 2), blank_page(1, 9, 17855)]);
        let system = System::open(&path).unwrap();
        assert!(system.dictionary().tables.is_empty());
        assert!(system.orphans().is_empty());
    }

    #[test]
    fn open_directory_requires_ibdata_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"nope").unwrap();
        let result = System::open(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn open_directory_finds_primary_and_per_table_spaces() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ibdata1", &[fsp_page(0, 2), blank_page(1, 0, 3)]);
        let sub = dir.path().join("mydb");
        std::fs::create_dir(&sub).unwrap();
        write_file(&sub, "orders.ibd", &[fsp_page(42, 2), blank_page(1, 42, 17855)]);

        let mut system = System::open(dir.path()).unwrap();
        assert_eq!(system.primary_space_id(), 0);
        assert!(system.space(0).is_some());
        assert!(system.space(42).is_some());
    }

    #[test]
    fn orphan_detection_flags_missing_table_file() {
        let dictionary = DataDictionary {
            tablespaces: Vec::new(),
            tables: vec![crate::innodb::dictionary::Table {
                name: "missing_table".to_string(),
                table_id: 1,
                space_id: 99,
                columns: Vec::new(),
                indexes: Vec::new(),
            }],
        };
        let spaces = HashMap::new();
        let orphans = System::find_orphans(&dictionary, &spaces);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].table_name, "missing_table");
        assert_eq!(orphans[0].space_id, 99);
    }
}
