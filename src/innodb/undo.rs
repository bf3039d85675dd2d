//! UNDO log page parsing.
//!
//! UNDO log pages (page type 2 / `FIL_PAGE_UNDO_LOG`) store previous versions
//! of modified records for MVCC and rollback. Each undo page has an
//! [`UndoPageHeader`] at `FIL_PAGE_DATA` (byte 38) describing the undo type
//! and free space pointers, followed by an [`UndoSegmentHeader`] with the
//! segment state and transaction metadata.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::error::DissectError;
use crate::innodb::constants::FIL_PAGE_DATA;
use crate::innodb::cursor::BufferCursor;
use crate::innodb::describer::{RecordDescriber, RollPtr};
use crate::innodb::field_decode::FieldValue;
use crate::innodb::index::FsegHeader;
use crate::innodb::list::BaseNode;
use crate::innodb::page::FilHeader;
use crate::innodb::page_types::PageType;
use crate::innodb::tablespace::Space;

/// Undo log page header offsets (relative to FIL_PAGE_DATA).
///
/// From trx0undo.h in MySQL source.
const TRX_UNDO_PAGE_TYPE: usize = 0; // 2 bytes
const TRX_UNDO_PAGE_START: usize = 2; // 2 bytes
const TRX_UNDO_PAGE_FREE: usize = 4; // 2 bytes
#[allow(dead_code)]
const TRX_UNDO_PAGE_NODE: usize = 6; // 12 bytes (FLST_NODE)
const TRX_UNDO_PAGE_HDR_SIZE: usize = 18;

/// Undo segment header offsets (relative to FIL_PAGE_DATA + TRX_UNDO_PAGE_HDR_SIZE).
const TRX_UNDO_STATE: usize = 0; // 2 bytes
const TRX_UNDO_LAST_LOG: usize = 2; // 2 bytes
#[allow(dead_code)]
const TRX_UNDO_FSEG_HEADER: usize = 4; // 10 bytes (FSEG_HEADER)
#[allow(dead_code)]
const TRX_UNDO_PAGE_LIST: usize = 14; // 16 bytes (FLST_BASE_NODE)
const TRX_UNDO_SEG_HDR_SIZE: usize = 30;

/// Undo log header offsets (at the start of the undo log within the page).
const TRX_UNDO_TRX_ID: usize = 0; // 8 bytes
const TRX_UNDO_TRX_NO: usize = 8; // 8 bytes
const TRX_UNDO_DEL_MARKS: usize = 16; // 2 bytes
const TRX_UNDO_LOG_START: usize = 18; // 2 bytes
const TRX_UNDO_XID_EXISTS: usize = 20; // 1 byte
const TRX_UNDO_DICT_TRANS: usize = 21; // 1 byte
const TRX_UNDO_TABLE_ID: usize = 22; // 8 bytes
const TRX_UNDO_NEXT_LOG: usize = 30; // 2 bytes
const TRX_UNDO_PREV_LOG: usize = 32; // 2 bytes

/// Undo page types.
///
/// # Examples
///
/// ```
/// use innodb_dissect::innodb::undo::UndoPageType;
///
/// let insert = UndoPageType::from_u16(1);
/// assert_eq!(insert, UndoPageType::Insert);
/// assert_eq!(insert.name(), "INSERT");
///
/// let update = UndoPageType::from_u16(2);
/// assert_eq!(update, UndoPageType::Update);
/// assert_eq!(update.name(), "UPDATE");
///
/// let unknown = UndoPageType::from_u16(99);
/// assert_eq!(unknown, UndoPageType::Unknown(99));
/// assert_eq!(unknown.name(), "UNKNOWN");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UndoPageType {
    /// Insert undo log (INSERT operations only)
    Insert,
    /// Update undo log (UPDATE and DELETE operations)
    Update,
    /// Unknown type
    Unknown(u16),
}

impl UndoPageType {
    /// Convert a raw u16 value from the undo page header to an `UndoPageType`.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => UndoPageType::Insert,
            2 => UndoPageType::Update,
            v => UndoPageType::Unknown(v),
        }
    }

    /// Returns the MySQL source-style name for this undo page type.
    pub fn name(&self) -> &'static str {
        match self {
            UndoPageType::Insert => "INSERT",
            UndoPageType::Update => "UPDATE",
            UndoPageType::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Undo segment states.
///
/// # Examples
///
/// ```
/// use innodb_dissect::innodb::undo::UndoState;
///
/// assert_eq!(UndoState::from_u16(1), UndoState::Active);
/// assert_eq!(UndoState::from_u16(2), UndoState::Cached);
/// assert_eq!(UndoState::from_u16(3), UndoState::ToFree);
/// assert_eq!(UndoState::from_u16(4), UndoState::ToPurge);
/// assert_eq!(UndoState::from_u16(5), UndoState::Prepared);
///
/// assert_eq!(UndoState::Active.name(), "ACTIVE");
/// assert_eq!(UndoState::ToPurge.name(), "TO_PURGE");
///
/// let unknown = UndoState::from_u16(0);
/// assert_eq!(unknown, UndoState::Unknown(0));
/// assert_eq!(unknown.name(), "UNKNOWN");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UndoState {
    /// Active transaction is using this segment
    Active,
    /// Cached for reuse
    Cached,
    /// Insert undo segment can be freed
    ToFree,
    /// Update undo segment will not be freed (has delete marks)
    ToPurge,
    /// Prepared transaction undo
    Prepared,
    /// Unknown state
    Unknown(u16),
}

impl UndoState {
    /// Convert a raw u16 value from the undo segment header to an `UndoState`.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => UndoState::Active,
            2 => UndoState::Cached,
            3 => UndoState::ToFree,
            4 => UndoState::ToPurge,
            5 => UndoState::Prepared,
            v => UndoState::Unknown(v),
        }
    }

    /// Returns the MySQL source-style name for this undo state.
    pub fn name(&self) -> &'static str {
        match self {
            UndoState::Active => "ACTIVE",
            UndoState::Cached => "CACHED",
            UndoState::ToFree => "TO_FREE",
            UndoState::ToPurge => "TO_PURGE",
            UndoState::Prepared => "PREPARED",
            UndoState::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Parsed undo log page header.
#[derive(Debug, Clone, Serialize)]
pub struct UndoPageHeader {
    /// Type of undo log (INSERT or UPDATE).
    pub page_type: UndoPageType,
    /// Offset of the start of undo log records on this page.
    pub start: u16,
    /// Offset of the first free byte on this page.
    pub free: u16,
}

/// Parsed undo segment header (only on first page of undo segment).
#[derive(Debug, Clone, Serialize)]
pub struct UndoSegmentHeader {
    /// State of the undo segment.
    pub state: UndoState,
    /// Offset of the last undo log header on the segment.
    pub last_log: u16,
}

impl UndoPageHeader {
    /// Parse an undo page header from a full page buffer.
    ///
    /// The undo page header starts at FIL_PAGE_DATA (byte 38).
    ///
    /// # Examples
    ///
    /// ```
    /// use innodb_dissect::innodb::undo::{UndoPageHeader, UndoPageType};
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// // Build a minimal page buffer (at least 38 + 18 = 56 bytes).
    /// let mut page = vec![0u8; 64];
    /// let base = 38; // FIL_PAGE_DATA
    ///
    /// // Undo page type = UPDATE (2) at offset base+0
    /// BigEndian::write_u16(&mut page[base..], 2);
    /// // Start offset at base+2
    /// BigEndian::write_u16(&mut page[base + 2..], 80);
    /// // Free offset at base+4
    /// BigEndian::write_u16(&mut page[base + 4..], 160);
    ///
    /// let hdr = UndoPageHeader::parse(&page).unwrap();
    /// assert_eq!(hdr.page_type, UndoPageType::Update);
    /// assert_eq!(hdr.start, 80);
    /// assert_eq!(hdr.free, 160);
    /// ```
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = FIL_PAGE_DATA;
        if page_data.len() < base + TRX_UNDO_PAGE_HDR_SIZE {
            return None;
        }

        let d = &page_data[base..];
        Some(UndoPageHeader {
            page_type: UndoPageType::from_u16(BigEndian::read_u16(&d[TRX_UNDO_PAGE_TYPE..])),
            start: BigEndian::read_u16(&d[TRX_UNDO_PAGE_START..]),
            free: BigEndian::read_u16(&d[TRX_UNDO_PAGE_FREE..]),
        })
    }
}

impl UndoSegmentHeader {
    /// Parse an undo segment header from a full page buffer.
    ///
    /// The segment header follows the page header at FIL_PAGE_DATA + TRX_UNDO_PAGE_HDR_SIZE.
    ///
    /// # Examples
    ///
    /// ```
    /// use innodb_dissect::innodb::undo::{UndoSegmentHeader, UndoState};
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// // Need at least 38 (FIL header) + 18 (page header) + 30 (seg header) = 86 bytes.
    /// let mut page = vec![0u8; 96];
    /// let base = 38 + 18; // FIL_PAGE_DATA + TRX_UNDO_PAGE_HDR_SIZE
    ///
    /// // State = CACHED (2) at base+0
    /// BigEndian::write_u16(&mut page[base..], 2);
    /// // Last log offset at base+2
    /// BigEndian::write_u16(&mut page[base + 2..], 200);
    ///
    /// let hdr = UndoSegmentHeader::parse(&page).unwrap();
    /// assert_eq!(hdr.state, UndoState::Cached);
    /// assert_eq!(hdr.last_log, 200);
    /// ```
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = FIL_PAGE_DATA + TRX_UNDO_PAGE_HDR_SIZE;
        if page_data.len() < base + TRX_UNDO_SEG_HDR_SIZE {
            return None;
        }

        let d = &page_data[base..];
        Some(UndoSegmentHeader {
            state: UndoState::from_u16(BigEndian::read_u16(&d[TRX_UNDO_STATE..])),
            last_log: BigEndian::read_u16(&d[TRX_UNDO_LAST_LOG..]),
        })
    }
}

/// Parsed undo log record header (at the start of an undo log within the page).
#[derive(Debug, Clone, Serialize)]
pub struct UndoLogHeader {
    /// Transaction ID that created this undo log.
    pub trx_id: u64,
    /// Transaction serial number.
    pub trx_no: u64,
    /// Whether delete marks exist in this undo log.
    pub del_marks: bool,
    /// Offset of the first undo log record.
    pub log_start: u16,
    /// Whether XID info exists (distributed transactions).
    pub xid_exists: bool,
    /// Whether this is a DDL transaction.
    pub dict_trans: bool,
    /// Table ID (for insert undo logs).
    pub table_id: u64,
    /// Offset of the next undo log header (0 if last).
    pub next_log: u16,
    /// Offset of the previous undo log header (0 if first).
    pub prev_log: u16,
}

impl UndoLogHeader {
    /// Parse an undo log header from a page at the given offset.
    ///
    /// The `log_offset` is typically obtained from UndoSegmentHeader::last_log
    /// or UndoPageHeader::start.
    ///
    /// # Examples
    ///
    /// ```
    /// use innodb_dissect::innodb::undo::UndoLogHeader;
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// // The undo log header is 34 bytes starting at log_offset.
    /// let log_offset = 100;
    /// let mut page = vec![0u8; log_offset + 34];
    ///
    /// // trx_id (8 bytes) at offset 0
    /// BigEndian::write_u64(&mut page[log_offset..], 1001);
    /// // trx_no (8 bytes) at offset 8
    /// BigEndian::write_u64(&mut page[log_offset + 8..], 500);
    /// // del_marks (2 bytes) at offset 16
    /// BigEndian::write_u16(&mut page[log_offset + 16..], 1);
    /// // log_start (2 bytes) at offset 18
    /// BigEndian::write_u16(&mut page[log_offset + 18..], 120);
    /// // xid_exists (1 byte) at offset 20
    /// page[log_offset + 20] = 1;
    /// // dict_trans (1 byte) at offset 21
    /// page[log_offset + 21] = 0;
    /// // table_id (8 bytes) at offset 22
    /// BigEndian::write_u64(&mut page[log_offset + 22..], 42);
    /// // next_log (2 bytes) at offset 30
    /// BigEndian::write_u16(&mut page[log_offset + 30..], 0);
    /// // prev_log (2 bytes) at offset 32
    /// BigEndian::write_u16(&mut page[log_offset + 32..], 0);
    ///
    /// let hdr = UndoLogHeader::parse(&page, log_offset).unwrap();
    /// assert_eq!(hdr.trx_id, 1001);
    /// assert_eq!(hdr.trx_no, 500);
    /// assert!(hdr.del_marks);
    /// assert_eq!(hdr.log_start, 120);
    /// assert!(hdr.xid_exists);
    /// assert!(!hdr.dict_trans);
    /// assert_eq!(hdr.table_id, 42);
    /// assert_eq!(hdr.next_log, 0);
    /// assert_eq!(hdr.prev_log, 0);
    /// ```
    pub fn parse(page_data: &[u8], log_offset: usize) -> Option<Self> {
        if page_data.len() < log_offset + 34 {
            return None;
        }

        let d = &page_data[log_offset..];
        Some(UndoLogHeader {
            trx_id: BigEndian::read_u64(&d[TRX_UNDO_TRX_ID..]),
            trx_no: BigEndian::read_u64(&d[TRX_UNDO_TRX_NO..]),
            del_marks: BigEndian::read_u16(&d[TRX_UNDO_DEL_MARKS..]) != 0,
            log_start: BigEndian::read_u16(&d[TRX_UNDO_LOG_START..]),
            xid_exists: d[TRX_UNDO_XID_EXISTS] != 0,
            dict_trans: d[TRX_UNDO_DICT_TRANS] != 0,
            table_id: BigEndian::read_u64(&d[TRX_UNDO_TABLE_ID..]),
            next_log: BigEndian::read_u16(&d[TRX_UNDO_NEXT_LOG..]),
            prev_log: BigEndian::read_u16(&d[TRX_UNDO_PREV_LOG..]),
        })
    }
}

/// Rollback segment array page header (page type FIL_PAGE_RSEG_ARRAY, MySQL 8.0+).
///
/// This page is the first page of an undo tablespace (.ibu) and contains
/// an array of rollback segment page numbers.
#[derive(Debug, Clone, Serialize)]
pub struct RsegArrayHeader {
    /// Number of rollback segment slots.
    pub size: u32,
}

impl RsegArrayHeader {
    /// Parse a rollback segment array header from a full page buffer.
    ///
    /// RSEG array header starts at FIL_PAGE_DATA.
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = FIL_PAGE_DATA;
        if page_data.len() < base + 4 {
            return None;
        }

        Some(RsegArrayHeader {
            size: BigEndian::read_u32(&page_data[base..]),
        })
    }

    /// Read rollback segment page numbers from the array.
    ///
    /// Each slot is a 4-byte page number. Returns up to `max_slots` entries.
    pub fn read_slots(page_data: &[u8], max_slots: usize) -> Vec<u32> {
        let base = FIL_PAGE_DATA + 4; // After the size field
        let mut slots = Vec::new();

        for i in 0..max_slots {
            let offset = base + i * 4;
            if offset + 4 > page_data.len() {
                break;
            }
            let page_no = BigEndian::read_u32(&page_data[offset..]);
            if page_no != 0 && page_no != crate::innodb::constants::FIL_NULL {
                slots.push(page_no);
            }
        }

        slots
    }
}

// ---------------------------------------------------------------------------
// Rollback segment header page
// ---------------------------------------------------------------------------

const TRX_RSEG_MAX_SIZE: usize = 0; // 4 bytes
const TRX_RSEG_HISTORY_SIZE: usize = 4; // 4 bytes
const TRX_RSEG_HISTORY: usize = 8; // 16-byte list base node
const TRX_RSEG_FSEG_HEADER: usize = TRX_RSEG_HISTORY + 16; // 24, 10-byte FSEG_HEADER
const TRX_RSEG_UNDO_SLOTS: usize = TRX_RSEG_FSEG_HEADER + 10; // 34
const TRX_RSEG_SLOT_SIZE: usize = 4;
const TRX_RSEG_N_SLOTS: usize = 1024;

/// A rollback segment header page: the undo segment's free-size budget, its
/// history list (committed-but-unpurged undo logs), and the 1024-slot array
/// mapping undo segment indexes to their first page.
#[derive(Debug, Clone)]
pub struct RsegHeader {
    pub max_size: u32,
    pub history_size: u32,
    pub history_list: BaseNode,
    pub fseg: FsegHeader,
    pub undo_slots: Vec<u32>,
}

impl RsegHeader {
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = FIL_PAGE_DATA;
        if page_data.len() < base + TRX_RSEG_UNDO_SLOTS + TRX_RSEG_N_SLOTS * TRX_RSEG_SLOT_SIZE {
            return None;
        }
        let d = &page_data[base..];
        let history_list = BaseNode::parse(&d[TRX_RSEG_HISTORY..])?;
        let fseg = FsegHeader::parse(&d[TRX_RSEG_FSEG_HEADER..])?;

        let mut undo_slots = Vec::with_capacity(TRX_RSEG_N_SLOTS);
        for i in 0..TRX_RSEG_N_SLOTS {
            let off = TRX_RSEG_UNDO_SLOTS + i * TRX_RSEG_SLOT_SIZE;
            undo_slots.push(BigEndian::read_u32(&d[off..]));
        }

        Some(RsegHeader {
            max_size: BigEndian::read_u32(&d[TRX_RSEG_MAX_SIZE..]),
            history_size: BigEndian::read_u32(&d[TRX_RSEG_HISTORY_SIZE..]),
            history_list,
            fseg,
            undo_slots,
        })
    }

    /// Slots actually pointing at an undo segment (FIL_NULL marks unused).
    pub fn used_slots(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.undo_slots
            .iter()
            .enumerate()
            .filter(|(_, &p)| p != crate::innodb::constants::FIL_NULL)
            .map(|(i, &p)| (i, p))
    }
}

// ---------------------------------------------------------------------------
// Undo records
// ---------------------------------------------------------------------------

/// Undo record type, from the low 4 bits of the type/compilation-info byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UndoRecordType {
    Insert,
    UpdateExisting,
    UpdateDeleted,
    Delete,
    Unknown(u8),
}

impl UndoRecordType {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            11 => UndoRecordType::Insert,
            12 => UndoRecordType::UpdateExisting,
            13 => UndoRecordType::UpdateDeleted,
            14 => UndoRecordType::Delete,
            v => UndoRecordType::Unknown(v),
        }
    }

    pub fn carries_prior_version(&self) -> bool {
        matches!(
            self,
            UndoRecordType::UpdateExisting | UndoRecordType::UpdateDeleted | UndoRecordType::Delete
        )
    }
}

/// The 5-byte header preceding an undo record's body: prev/next offsets
/// (local to the page) plus the type/compilation-info byte. Read starting
/// two bytes *before* the record's nominal position, since the prev-offset
/// lives immediately ahead of it.
#[derive(Debug, Clone, Copy)]
pub struct UndoRecordHeader {
    pub prev_offset: u16,
    pub next_offset: u16,
    pub rec_type: UndoRecordType,
    pub extern_flag: bool,
    pub order_may_change: bool,
    pub size_may_change: bool,
}

impl UndoRecordHeader {
    pub fn parse(page_data: &[u8], position: usize) -> Result<Self, DissectError> {
        if position < 2 || position + 3 > page_data.len() {
            return Err(DissectError::OutOfBounds {
                position,
                len: page_data.len(),
                path: "undo_record_header".to_string(),
            });
        }
        let prev_offset = BigEndian::read_u16(&page_data[position - 2..]);
        let next_offset = BigEndian::read_u16(&page_data[position..]);
        let info = page_data[position + 2];
        let cmpl_info = (info >> 4) & 0x07;
        Ok(UndoRecordHeader {
            prev_offset,
            next_offset,
            rec_type: UndoRecordType::from_u8(info & 0x0F),
            extern_flag: info & 0x80 != 0,
            order_may_change: cmpl_info & 0x01 == 0,
            size_may_change: cmpl_info & 0x02 == 0,
        })
    }
}

/// One field overwritten by an UPDATE, as recorded in an update/delete undo
/// record: which field position, and its pre-image bytes.
#[derive(Debug, Clone)]
pub struct UndoRecordUpdateField {
    pub field_no: u32,
    pub value: Vec<u8>,
}

/// A single undo record: enough to reconstruct the row version it
/// superseded, and to chase `roll_ptr` back through MVCC history.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub offset: usize,
    pub header: UndoRecordHeader,
    pub undo_no: u64,
    pub table_id: u64,
    pub info_bits: Option<u8>,
    pub trx_id: Option<u64>,
    pub roll_ptr: Option<u64>,
    pub key: Vec<FieldValue>,
    pub update_fields: Vec<UndoRecordUpdateField>,
}

impl UndoRecord {
    /// Parse the undo record whose body starts at `position`. When
    /// `index_describer` is supplied (the clustered index the undo log
    /// belongs to), the clustered key fields — and, for update/delete
    /// records, the overwritten field values — are also decoded.
    pub fn parse(
        page_data: &[u8],
        position: usize,
        index_describer: Option<&RecordDescriber>,
    ) -> Result<Self, DissectError> {
        let header = UndoRecordHeader::parse(page_data, position)?;
        let mut cursor = BufferCursor::at(page_data, position + 3);
        let undo_no = cursor.read_imc_uint64()?;
        let table_id = cursor.read_imc_uint64()?;

        let mut info_bits = None;
        let mut trx_id = None;
        let mut roll_ptr = None;
        if header.rec_type.carries_prior_version() {
            info_bits = Some(cursor.read_u8()?);
            trx_id = Some(cursor.read_ic_uint64()?);
            roll_ptr = Some(cursor.read_ic_uint64()?);
        }

        let mut key = Vec::new();
        let mut update_fields = Vec::new();
        if let Some(describer) = index_describer {
            for field in &describer.key {
                let len = cursor.read_ic_uint32()? as usize;
                let bytes = cursor.read_bytes(len)?;
                key.push(field.data_type.value(bytes)?);
            }
            if header.rec_type.carries_prior_version() {
                let field_count = cursor.read_ic_uint32()?;
                for _ in 0..field_count {
                    let field_no = cursor.read_ic_uint32()?;
                    let len = cursor.read_ic_uint32()? as usize;
                    let value = cursor.read_bytes(len)?.to_vec();
                    update_fields.push(UndoRecordUpdateField { field_no, value });
                }
            }
        }

        Ok(UndoRecord {
            offset: position,
            header,
            undo_no,
            table_id,
            info_bits,
            trx_id,
            roll_ptr,
            key,
            update_fields,
        })
    }

    fn decoded_roll_ptr(&self) -> Option<RollPtr> {
        self.roll_ptr.map(|raw| RollPtr {
            is_insert: (raw >> 55) & 1 != 0,
            rseg_id: ((raw >> 48) & 0x7f) as u8,
            undo_page: ((raw >> 16) & 0xffff_ffff) as u32,
            undo_offset: (raw & 0xffff) as u16,
            raw,
        })
    }

    /// Follow `roll_ptr` to the prior version of this row in an earlier
    /// undo log. Returns `None` (rather than erroring) if the target page
    /// isn't an undo-log page, if `table_id` differs, or if the earlier
    /// record's `trx_id` is newer than this one's — both signal that the
    /// page has been recycled by purge since this pointer was written.
    pub fn prev_by_history(
        &self,
        space: &mut Space,
        index_describer: Option<&RecordDescriber>,
    ) -> Result<Option<UndoRecord>, DissectError> {
        let rp = match self.decoded_roll_ptr() {
            Some(rp) => rp,
            None => return Ok(None),
        };
        let page_data = space.page(rp.undo_page as u64)?;
        let is_undo_page = FilHeader::parse(&page_data)
            .map(|f| f.page_type == PageType::UndoLog)
            .unwrap_or(false);
        if !is_undo_page {
            return Ok(None);
        }
        let prev = UndoRecord::parse(&page_data, rp.undo_offset as usize, index_describer)?;
        if prev.table_id != self.table_id {
            return Ok(None);
        }
        if let (Some(prev_trx), Some(cur_trx)) = (prev.trx_id, self.trx_id) {
            if prev_trx > cur_trx {
                return Ok(None);
            }
        }
        Ok(Some(prev))
    }
}

/// A list of undo-log headers (per rollback segment slot), exposing a
/// cursor that transparently crosses from one undo log to the next.
pub struct HistoryList {
    pub logs: Vec<(u64, u16)>,
}

/// Which end of a history list a cursor begins at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCursorStart {
    Min,
    Max,
}

impl HistoryList {
    pub fn new(logs: Vec<(u64, u16)>) -> Self {
        HistoryList { logs }
    }

    /// A cursor over every undo record across every log in this list, in
    /// page order, starting from the given end.
    pub fn undo_record_cursor(
        &self,
        start: HistoryCursorStart,
        index_describer: Option<RecordDescriber>,
    ) -> HistoryCursor<'_> {
        let log_index = match start {
            HistoryCursorStart::Min => 0,
            HistoryCursorStart::Max => self.logs.len().saturating_sub(1),
        };
        HistoryCursor {
            list: self,
            log_index,
            position: None,
            index_describer,
        }
    }
}

/// A cursor walking undo records across a [`HistoryList`]'s logs.
pub struct HistoryCursor<'a> {
    list: &'a HistoryList,
    log_index: usize,
    position: Option<(u64, u16)>,
    index_describer: Option<RecordDescriber>,
}

impl<'a> HistoryCursor<'a> {
    pub fn next(&mut self, space: &mut Space) -> Result<Option<UndoRecord>, DissectError> {
        loop {
            if self.log_index >= self.list.logs.len() {
                return Ok(None);
            }
            let (page_no, start_offset) = self.position.unwrap_or(self.list.logs[self.log_index]);
            let page_data = space.page(page_no)?;
            let hdr = match UndoPageHeader::parse(&page_data) {
                Some(h) => h,
                None => {
                    self.log_index += 1;
                    self.position = None;
                    continue;
                }
            };
            if start_offset == 0 || start_offset as usize >= hdr.free as usize {
                self.log_index += 1;
                self.position = None;
                continue;
            }
            let rec = UndoRecord::parse(&page_data, start_offset as usize, self.index_describer.as_ref())?;
            self.position = if rec.header.next_offset == 0 {
                None
            } else {
                Some((page_no, rec.header.next_offset))
            };
            if self.position.is_none() {
                self.log_index += 1;
            }
            return Ok(Some(rec));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_page_type() {
        assert_eq!(UndoPageType::from_u16(1), UndoPageType::Insert);
        assert_eq!(UndoPageType::from_u16(2), UndoPageType::Update);
        assert_eq!(UndoPageType::from_u16(1).name(), "INSERT");
        assert_eq!(UndoPageType::from_u16(2).name(), "UPDATE");
    }

    #[test]
    fn test_undo_state() {
        assert_eq!(UndoState::from_u16(1), UndoState::Active);
        assert_eq!(UndoState::from_u16(2), UndoState::Cached);
        assert_eq!(UndoState::from_u16(3), UndoState::ToFree);
        assert_eq!(UndoState::from_u16(4), UndoState::ToPurge);
        assert_eq!(UndoState::from_u16(5), UndoState::Prepared);
        assert_eq!(UndoState::from_u16(1).name(), "ACTIVE");
    }

    #[test]
    fn test_undo_page_header_parse() {
        let mut page = vec![0u8; 256];
        let base = FIL_PAGE_DATA;

        // Set page type = INSERT (1)
        BigEndian::write_u16(&mut page[base + TRX_UNDO_PAGE_TYPE..], 1);
        // Set start offset
        BigEndian::write_u16(&mut page[base + TRX_UNDO_PAGE_START..], 100);
        // Set free offset
        BigEndian::write_u16(&mut page[base + TRX_UNDO_PAGE_FREE..], 200);

        let hdr = UndoPageHeader::parse(&page).unwrap();
        assert_eq!(hdr.page_type, UndoPageType::Insert);
        assert_eq!(hdr.start, 100);
        assert_eq!(hdr.free, 200);
    }

    #[test]
    fn test_undo_segment_header_parse() {
        let mut page = vec![0u8; 256];
        let base = FIL_PAGE_DATA + TRX_UNDO_PAGE_HDR_SIZE;

        // Set state = ACTIVE (1)
        BigEndian::write_u16(&mut page[base + TRX_UNDO_STATE..], 1);
        // Set last log offset
        BigEndian::write_u16(&mut page[base + TRX_UNDO_LAST_LOG..], 150);

        let hdr = UndoSegmentHeader::parse(&page).unwrap();
        assert_eq!(hdr.state, UndoState::Active);
        assert_eq!(hdr.last_log, 150);
    }

    #[test]
    fn undo_record_type_from_low_nibble() {
        assert_eq!(UndoRecordType::from_u8(11), UndoRecordType::Insert);
        assert_eq!(UndoRecordType::from_u8(12), UndoRecordType::UpdateExisting);
        assert_eq!(UndoRecordType::from_u8(13 | 0x80), UndoRecordType::UpdateDeleted);
        assert!(UndoRecordType::UpdateDeleted.carries_prior_version());
        assert!(!UndoRecordType::Insert.carries_prior_version());
    }

    #[test]
    fn undo_record_header_reads_two_bytes_before_position() {
        let mut page = vec![0u8; 64];
        let position = 20usize;
        BigEndian::write_u16(&mut page[position - 2..], 10); // prev_offset
        BigEndian::write_u16(&mut page[position..], 40); // next_offset
        page[position + 2] = 11; // type = Insert

        let hdr = UndoRecordHeader::parse(&page, position).unwrap();
        assert_eq!(hdr.prev_offset, 10);
        assert_eq!(hdr.next_offset, 40);
        assert_eq!(hdr.rec_type, UndoRecordType::Insert);
        assert!(!hdr.extern_flag);
    }

    #[test]
    fn undo_record_insert_has_no_prior_version_fields() {
        let mut page = vec![0u8; 64];
        let position = 20usize;
        BigEndian::write_u16(&mut page[position - 2..], 0);
        BigEndian::write_u16(&mut page[position..], 0);
        page[position + 2] = 11; // Insert
        page[position + 3] = 5; // undo_no, 1-byte compressed
        page[position + 4] = 7; // table_id, 1-byte compressed

        let rec = UndoRecord::parse(&page, position, None).unwrap();
        assert_eq!(rec.undo_no, 5);
        assert_eq!(rec.table_id, 7);
        assert!(rec.trx_id.is_none());
        assert!(rec.roll_ptr.is_none());
    }
}
