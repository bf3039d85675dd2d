//! Row-level record parsing for InnoDB compact and redundant formats.
//!
//! InnoDB stores rows in compact record format (MySQL 5.0+) by default, where
//! each record has a 5-byte header containing the info bits, record type,
//! heap number, and next-record pointer. Older tables use the 6-byte
//! redundant header instead. This module provides [`RecordType`]
//! classification, [`walk_compact_records`] to traverse the singly-linked
//! record chain within an INDEX page starting from the infimum record, and
//! [`Record`], which decodes a record's key/row/system field values using a
//! [`crate::innodb::describer::RecordDescriber`].

use byteorder::{BigEndian, ByteOrder};

use crate::error::DissectError;
use crate::innodb::constants::*;
use crate::innodb::cursor::BufferCursor;
use crate::innodb::describer::RecordDescriber;
use crate::innodb::field::{Field, RecordFieldContext};
use crate::innodb::field_decode::FieldValue;

/// Record type extracted from the info bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// Ordinary user record (leaf page).
    Ordinary,
    /// Node pointer record (non-leaf page).
    NodePtr,
    /// Infimum system record.
    Infimum,
    /// Supremum system record.
    Supremum,
}

impl RecordType {
    /// Convert a 3-bit status value from the record header to a `RecordType`.
    ///
    /// Only the lowest 3 bits of `val` are used.
    ///
    /// # Examples
    ///
    /// ```
    /// use innodb_dissect::innodb::record::RecordType;
    ///
    /// assert_eq!(RecordType::from_u8(0), RecordType::Ordinary);
    /// assert_eq!(RecordType::from_u8(1), RecordType::NodePtr);
    /// assert_eq!(RecordType::from_u8(2), RecordType::Infimum);
    /// assert_eq!(RecordType::from_u8(3), RecordType::Supremum);
    ///
    /// // Only the lowest 3 bits are used, so 0x08 maps to Ordinary
    /// assert_eq!(RecordType::from_u8(0x08), RecordType::Ordinary);
    ///
    /// assert_eq!(RecordType::from_u8(0).name(), "REC_STATUS_ORDINARY");
    /// ```
    pub fn from_u8(val: u8) -> Self {
        match val & 0x07 {
            0 => RecordType::Ordinary,
            1 => RecordType::NodePtr,
            2 => RecordType::Infimum,
            3 => RecordType::Supremum,
            _ => RecordType::Ordinary,
        }
    }

    /// Returns the MySQL source-style name for this record type (e.g. `"REC_STATUS_ORDINARY"`).
    pub fn name(&self) -> &'static str {
        match self {
            RecordType::Ordinary => "REC_STATUS_ORDINARY",
            RecordType::NodePtr => "REC_STATUS_NODE_PTR",
            RecordType::Infimum => "REC_STATUS_INFIMUM",
            RecordType::Supremum => "REC_STATUS_SUPREMUM",
        }
    }
}

/// Parsed compact (new-style) record header.
///
/// In compact format, 5 bytes precede each record:
/// - Byte 0: info bits (delete mark, min_rec flag) + n_owned upper nibble
/// - Bytes 1-2: heap_no (13 bits) + rec_type (3 bits)
/// - Bytes 3-4: next record offset (signed, relative)
#[derive(Debug, Clone)]
pub struct CompactRecordHeader {
    /// Number of records owned by this record in the page directory.
    pub n_owned: u8,
    /// Delete mark flag.
    pub delete_mark: bool,
    /// Min-rec flag (leftmost record on a non-leaf level).
    pub min_rec: bool,
    /// Record's position in the heap.
    pub heap_no: u16,
    /// Record type.
    pub rec_type: RecordType,
    /// Relative offset to the next record (signed).
    pub next_offset: i16,
}

impl CompactRecordHeader {
    /// Parse a compact record header from the 5 bytes preceding the record origin.
    ///
    /// `data` should point to the start of the 5-byte extra header.
    ///
    /// # Examples
    ///
    /// ```
    /// use innodb_dissect::innodb::record::{CompactRecordHeader, RecordType};
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// let mut data = vec![0u8; 5];
    /// // byte 0: info_bits(4) | n_owned(4)
    /// //   delete_mark=1 (bit 5), n_owned=2 (bits 0-3) => 0x22
    /// data[0] = 0x22;
    /// // bytes 1-2: heap_no=7 (7<<3=56), rec_type=0 (Ordinary) => 56
    /// BigEndian::write_u16(&mut data[1..3], 7 << 3);
    /// // bytes 3-4: next_offset = 42
    /// BigEndian::write_i16(&mut data[3..5], 42);
    ///
    /// let hdr = CompactRecordHeader::parse(&data).unwrap();
    /// assert_eq!(hdr.n_owned, 2);
    /// assert!(hdr.delete_mark);
    /// assert!(!hdr.min_rec);
    /// assert_eq!(hdr.heap_no, 7);
    /// assert_eq!(hdr.rec_type, RecordType::Ordinary);
    /// assert_eq!(hdr.next_offset, 42);
    /// ```
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < REC_N_NEW_EXTRA_BYTES {
            return None;
        }

        // Byte 0 layout: [info_bits(4) | n_owned(4)]
        // Info bits (upper nibble): bit 5 = delete_mark, bit 4 = min_rec
        // n_owned (lower nibble): bits 0-3
        let byte0 = data[0];
        let n_owned = byte0 & 0x0F;
        let delete_mark = (byte0 & 0x20) != 0;
        let min_rec = (byte0 & 0x10) != 0;

        let two_bytes = BigEndian::read_u16(&data[1..3]);
        let rec_type = RecordType::from_u8((two_bytes & 0x07) as u8);
        let heap_no = (two_bytes >> 3) & 0x1FFF;

        let next_offset = BigEndian::read_i16(&data[3..5]);

        Some(CompactRecordHeader {
            n_owned,
            delete_mark,
            min_rec,
            heap_no,
            rec_type,
            next_offset,
        })
    }
}

/// A record position on a page, with its parsed header.
#[derive(Debug, Clone)]
pub struct RecordInfo {
    /// Absolute offset of the record origin within the page.
    pub offset: usize,
    /// Parsed record header.
    pub header: CompactRecordHeader,
}

/// Walk all user records on a compact-format INDEX page.
///
/// Starts from infimum and follows next-record offsets until reaching supremum.
/// Returns a list of record positions (excluding infimum/supremum).
///
/// # Examples
///
/// ```no_run
/// use innodb_dissect::innodb::record::walk_compact_records;
/// use innodb_dissect::innodb::tablespace::Tablespace;
///
/// let mut ts = Tablespace::open("table.ibd").unwrap();
/// let page = ts.read_page(3).unwrap();
/// let records = walk_compact_records(&page);
/// for rec in &records {
///     println!("Record at offset {}, type: {}", rec.offset, rec.header.rec_type.name());
/// }
/// ```
pub fn walk_compact_records(page_data: &[u8]) -> Vec<RecordInfo> {
    let mut records = Vec::new();

    // Infimum record origin is at PAGE_NEW_INFIMUM (99)
    let infimum_origin = PAGE_NEW_INFIMUM;
    if page_data.len() < infimum_origin + 2 {
        return records;
    }

    // Read infimum's next-record offset (at infimum_origin - 2, relative to origin)
    let infimum_extra_start = infimum_origin - REC_N_NEW_EXTRA_BYTES;
    if page_data.len() < infimum_extra_start + REC_N_NEW_EXTRA_BYTES {
        return records;
    }

    let infimum_hdr = match CompactRecordHeader::parse(&page_data[infimum_extra_start..]) {
        Some(h) => h,
        None => return records,
    };

    // Follow the linked list
    let mut current_offset = infimum_origin;
    let mut next_rel = infimum_hdr.next_offset;

    // Safety: limit iterations to prevent infinite loops
    let max_iter = page_data.len();
    let mut iterations = 0;

    loop {
        if iterations > max_iter {
            break;
        }
        iterations += 1;

        // Calculate next record's absolute offset
        let next_abs = (current_offset as i32 + next_rel as i32) as usize;
        if next_abs < REC_N_NEW_EXTRA_BYTES || next_abs >= page_data.len() {
            break;
        }

        // Parse the record header (5 bytes before the origin)
        let extra_start = next_abs - REC_N_NEW_EXTRA_BYTES;
        if extra_start + REC_N_NEW_EXTRA_BYTES > page_data.len() {
            break;
        }

        let hdr = match CompactRecordHeader::parse(&page_data[extra_start..]) {
            Some(h) => h,
            None => break,
        };

        // If we've reached supremum, stop
        if hdr.rec_type == RecordType::Supremum {
            break;
        }

        next_rel = hdr.next_offset;
        records.push(RecordInfo {
            offset: next_abs,
            header: hdr,
        });
        current_offset = next_abs;

        // next_offset of 0 means end of list
        if next_rel == 0 {
            break;
        }
    }

    records
}

/// Parse the variable-length field lengths from a compact record's null bitmap
/// and variable-length header. Returns the field data starting offset.
///
/// For SDI records and other known-format records, callers can use the
/// record offset directly since field positions are fixed.
pub fn read_variable_field_lengths(
    page_data: &[u8],
    record_origin: usize,
    n_nullable: usize,
    n_variable: usize,
) -> Option<(Vec<bool>, Vec<usize>)> {
    // The variable-length header grows backwards from the record origin,
    // before the 5-byte compact extra header.
    // Layout (backwards from origin - 5):
    //   - null bitmap: ceil(n_nullable / 8) bytes
    //   - variable-length field lengths: 1 or 2 bytes each

    let null_bitmap_bytes = n_nullable.div_ceil(8);
    let mut pos = record_origin - REC_N_NEW_EXTRA_BYTES;

    // Read null bitmap
    if pos < null_bitmap_bytes {
        return None;
    }
    pos -= null_bitmap_bytes;
    let mut nulls = Vec::with_capacity(n_nullable);
    for i in 0..n_nullable {
        let byte_idx = pos + (i / 8);
        let bit_idx = i % 8;
        if byte_idx >= page_data.len() {
            return None;
        }
        nulls.push((page_data[byte_idx] & (1 << bit_idx)) != 0);
    }

    // Read variable-length field lengths
    let mut var_lengths = Vec::with_capacity(n_variable);
    for _ in 0..n_variable {
        if pos == 0 {
            return None;
        }
        pos -= 1;
        if pos >= page_data.len() {
            return None;
        }
        let len_byte = page_data[pos] as usize;
        if len_byte & 0x80 != 0 {
            // 2-byte length
            if pos == 0 {
                return None;
            }
            pos -= 1;
            if pos >= page_data.len() {
                return None;
            }
            let high_byte = page_data[pos] as usize;
            let total_len = ((len_byte & 0x3F) << 8) | high_byte;
            var_lengths.push(total_len);
        } else {
            var_lengths.push(len_byte);
        }
    }

    Some((nulls, var_lengths))
}

/// Which of the two on-disk record header layouts a page uses, per the
/// INDEX header's compact-format bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Compact,
    Redundant,
}

/// Parsed redundant (pre-5.0, "old style") record header: 6 bytes preceding
/// the record origin. Unlike the compact header, `next_offset` stores an
/// absolute page offset rather than a signed delta, and field lengths are
/// read from an explicit per-field offset array (sized by `n_fields`)
/// instead of a null-bitmap-plus-length-vector.
#[derive(Debug, Clone)]
pub struct RedundantRecordHeader {
    pub n_owned: u8,
    pub delete_mark: bool,
    pub min_rec: bool,
    pub heap_no: u16,
    pub n_fields: u16,
    /// True when each field's offset is stored in the array as a single
    /// byte (no field hits the 255-byte threshold); false when 2 bytes.
    pub short_offsets: bool,
    pub next_offset: u16,
}

impl RedundantRecordHeader {
    /// Parse a redundant record header from the 6 bytes preceding the
    /// record origin.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < REC_N_OLD_EXTRA_BYTES {
            return None;
        }
        let byte0 = data[0];
        let n_owned = byte0 & 0x0F;
        let delete_mark = (byte0 & 0x20) != 0;
        let min_rec = (byte0 & 0x10) != 0;

        let heap_no = BigEndian::read_u16(&data[1..3]) >> 3;

        let n_fields_byte = data[3];
        let short_offsets = (n_fields_byte & 0x80) == 0;
        let n_fields = (n_fields_byte & 0x7F) as u16;

        let next_offset = BigEndian::read_u16(&data[4..6]);

        Some(RedundantRecordHeader {
            n_owned,
            delete_mark,
            min_rec,
            heap_no,
            n_fields,
            short_offsets,
            next_offset,
        })
    }

    /// Infers a [`RecordType`] from the well-known heap numbers reserved for
    /// the system records (redundant format has no explicit status bits).
    pub fn rec_type(&self) -> RecordType {
        match self.heap_no {
            0 => RecordType::Infimum,
            1 => RecordType::Supremum,
            _ => RecordType::Ordinary,
        }
    }
}

/// Walk the redundant-format record chain, mirroring [`walk_compact_records`]
/// but following absolute `next_offset` pointers instead of relative deltas.
pub fn walk_redundant_records(page_data: &[u8]) -> Vec<(usize, RedundantRecordHeader)> {
    let mut records = Vec::new();
    let infimum_origin = PAGE_OLD_INFIMUM;
    let extra = REC_N_OLD_EXTRA_BYTES;
    if page_data.len() < infimum_origin {
        return records;
    }

    let mut current = infimum_origin;
    let max_iter = page_data.len();
    let mut iterations = 0;

    loop {
        if iterations > max_iter || current < extra || current + 2 > page_data.len() {
            break;
        }
        iterations += 1;

        let extra_start = current - extra;
        if extra_start + extra > page_data.len() {
            break;
        }
        let hdr = match RedundantRecordHeader::parse(&page_data[extra_start..]) {
            Some(h) => h,
            None => break,
        };

        let next = hdr.next_offset as usize;
        if current != infimum_origin {
            if hdr.rec_type() == RecordType::Supremum {
                break;
            }
            records.push((current, hdr.clone()));
        }
        if next == 0 || next == current {
            break;
        }
        current = next;
    }

    records
}

/// Compute the per-record null/extern/length context for a compact-format
/// record, given its fields in physical storage order (key fields followed
/// by row fields, exactly as declared by the describer).
///
/// Mirrors `rec_init_offsets`: the null bitmap (one bit per nullable field,
/// in field order, LSB-first) sits immediately before the 5-byte record
/// header; the variable-length array sits further back, one entry per
/// non-null variable/blob field, written in the *same* field order (so
/// reading backwards from the null bitmap yields fields in ascending
/// position order).
pub fn compact_field_context(
    page_data: &[u8],
    record_origin: usize,
    fields: &[Field],
) -> Result<RecordFieldContext, DissectError> {
    let n = fields.len();
    let nullable_count = fields.iter().filter(|f| f.nullable).count();
    let null_bitmap_bytes = nullable_count.div_ceil(8);

    let header_start = record_origin.checked_sub(REC_N_NEW_EXTRA_BYTES).ok_or_else(|| {
        DissectError::OutOfBounds {
            position: 0,
            len: REC_N_NEW_EXTRA_BYTES,
            path: "record_header".to_string(),
        }
    })?;
    let mut pos = header_start.checked_sub(null_bitmap_bytes).ok_or_else(|| {
        DissectError::OutOfBounds {
            position: 0,
            len: null_bitmap_bytes,
            path: "null_bitmap".to_string(),
        }
    })?;

    let mut nulls = vec![false; n];
    {
        let mut nullable_idx = 0usize;
        for (fi, f) in fields.iter().enumerate() {
            if f.nullable {
                let byte_idx = pos + nullable_idx / 8;
                if byte_idx >= page_data.len() {
                    return Err(DissectError::OutOfBounds {
                        position: byte_idx,
                        len: page_data.len(),
                        path: "null_bitmap".to_string(),
                    });
                }
                let bit = nullable_idx % 8;
                nulls[fi] = (page_data[byte_idx] >> bit) & 1 != 0;
                nullable_idx += 1;
            }
        }
    }

    let mut externs = vec![false; n];
    let mut lengths: Vec<Option<usize>> = vec![None; n];
    for (fi, f) in fields.iter().enumerate() {
        if nulls[fi] {
            continue;
        }
        if !(f.data_type.is_variable() || f.data_type.is_blob()) {
            continue;
        }
        if pos == 0 {
            return Err(DissectError::OutOfBounds {
                position: 0,
                len: 1,
                path: "variable_length_array".to_string(),
            });
        }
        pos -= 1;
        if pos >= page_data.len() {
            return Err(DissectError::OutOfBounds {
                position: pos,
                len: page_data.len(),
                path: "variable_length_array".to_string(),
            });
        }
        let max_len = f.data_type.max_storage_len();
        if max_len <= 255 {
            lengths[fi] = Some(page_data[pos] as usize);
        } else {
            let b0 = page_data[pos];
            if b0 & 0x80 == 0 {
                lengths[fi] = Some(b0 as usize);
            } else {
                if pos == 0 {
                    return Err(DissectError::OutOfBounds {
                        position: 0,
                        len: 1,
                        path: "variable_length_array".to_string(),
                    });
                }
                pos -= 1;
                let b1 = page_data[pos];
                let combined = ((b0 as usize) << 8) | b1 as usize;
                externs[fi] = combined & 0x4000 != 0;
                lengths[fi] = Some(combined & 0x3FFF);
            }
        }
    }

    Ok(RecordFieldContext {
        nulls,
        externs,
        lengths,
    })
}

/// Compute the per-record null/extern/length context for a redundant-format
/// record from its per-field end-offset array, given its fields in physical
/// storage order (key fields followed by row fields).
///
/// Mirrors `rec_get_nth_field_offs_old`: the array holds one entry per field
/// (not just nullable ones, unlike the compact format), closest-to-origin
/// entry first (field 0), growing backward from the 6-byte header. Each
/// entry is a cumulative end-offset from the record origin, with a null
/// flag in the top bit (1-byte form: `0x80`; 2-byte form: `0x8000`) and, in
/// the 2-byte form only, an externally-stored flag (`0x4000`). A field's
/// length is the delta between its end-offset and the previous field's.
pub fn redundant_field_context(
    record_origin: usize,
    page_data: &[u8],
    header: &RedundantRecordHeader,
    fields: &[Field],
) -> Result<RecordFieldContext, DissectError> {
    let n = fields.len();
    let header_start = record_origin.checked_sub(REC_N_OLD_EXTRA_BYTES).ok_or_else(|| {
        DissectError::OutOfBounds {
            position: 0,
            len: REC_N_OLD_EXTRA_BYTES,
            path: "record_header".to_string(),
        }
    })?;

    let mut nulls = vec![false; n];
    let mut externs = vec![false; n];
    let mut lengths: Vec<Option<usize>> = vec![None; n];

    let mut pos = header_start;
    let mut prev_end = 0usize;
    let field_count = n.min(header.n_fields as usize);
    for i in 0..field_count {
        if header.short_offsets {
            pos = pos.checked_sub(1).ok_or_else(|| DissectError::OutOfBounds {
                position: 0,
                len: 1,
                path: "redundant_offset_array".to_string(),
            })?;
            let b = *page_data.get(pos).ok_or_else(|| DissectError::OutOfBounds {
                position: pos,
                len: page_data.len(),
                path: "redundant_offset_array".to_string(),
            })?;
            let is_null = b & 0x80 != 0;
            let end = (b & 0x7F) as usize;
            nulls[i] = is_null;
            lengths[i] = Some(end.saturating_sub(prev_end));
            if !is_null {
                prev_end = end;
            }
        } else {
            pos = pos.checked_sub(2).ok_or_else(|| DissectError::OutOfBounds {
                position: 0,
                len: 2,
                path: "redundant_offset_array".to_string(),
            })?;
            if pos + 2 > page_data.len() {
                return Err(DissectError::OutOfBounds {
                    position: pos,
                    len: page_data.len(),
                    path: "redundant_offset_array".to_string(),
                });
            }
            let raw = BigEndian::read_u16(&page_data[pos..pos + 2]);
            let is_null = raw & 0x8000 != 0;
            let is_extern = raw & 0x4000 != 0;
            let end = (raw & 0x3FFF) as usize;
            nulls[i] = is_null;
            externs[i] = is_extern;
            lengths[i] = Some(end.saturating_sub(prev_end));
            if !is_null {
                prev_end = end;
            }
        }
    }

    Ok(RecordFieldContext {
        nulls,
        externs,
        lengths,
    })
}

/// Lexicographic comparison of two decoded key-value slices, per the
/// engine's record-comparison rule: a missing (nil) key sorts below any
/// real key, and a shorter key sorts below a longer key that shares its
/// prefix.
pub fn compare_key(a: Option<&[FieldValue]>, b: Option<&[FieldValue]>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };
    for i in 0..a.len().min(b.len()) {
        let ord = compare_field_value(&a[i], &b[i]);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_field_value(a: &FieldValue, b: &FieldValue) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
        (FieldValue::Null, _) => Ordering::Less,
        (_, FieldValue::Null) => Ordering::Greater,
        (FieldValue::Int(x), FieldValue::Int(y)) => x.cmp(y),
        (FieldValue::Uint(x), FieldValue::Uint(y)) => x.cmp(y),
        (FieldValue::Int(x), FieldValue::Uint(y)) => (*x as i128).cmp(&(*y as i128)),
        (FieldValue::Uint(x), FieldValue::Int(y)) => (*x as i128).cmp(&(*y as i128)),
        (FieldValue::Float(x), FieldValue::Float(y)) => x.total_cmp(y),
        (FieldValue::Double(x), FieldValue::Double(y)) => x.total_cmp(y),
        (FieldValue::Str(x), FieldValue::Str(y)) => x.cmp(y),
        (FieldValue::Hex(x), FieldValue::Hex(y)) => x.cmp(y),
        // Mismatched variants: fall back to a stable, type-tag ordering so
        // the comparison remains total even across heterogeneous columns.
        (x, y) => format!("{:?}", x).cmp(&format!("{:?}", y)),
    }
}

/// A fully decoded record: position, header, and field values, per a
/// [`RecordDescriber`].
#[derive(Debug, Clone)]
pub struct Record {
    /// Absolute offset of the record origin within the page.
    pub offset: usize,
    pub format: RecordFormat,
    pub rec_type: RecordType,
    pub delete_mark: bool,
    pub heap_no: u16,
    /// Absolute offset of the next record (resolved from the header's
    /// relative or absolute encoding).
    pub next: Option<usize>,
    pub key: Vec<FieldValue>,
    pub row: Vec<FieldValue>,
    /// Child page number, present only on non-leaf (node-pointer) records:
    /// the last row field, by convention, holds the page number.
    pub child_page_number: Option<u32>,
}

impl Record {
    /// Decode a compact-format record at `offset` using `describer`.
    ///
    /// The describer's key and row fields are concatenated in physical
    /// storage order; on a non-leaf page the row carries a single
    /// `child_page_number` field instead of the leaf row fields.
    pub fn decode_compact(
        page_data: &[u8],
        offset: usize,
        describer: &RecordDescriber,
        is_leaf: bool,
    ) -> Result<Record, DissectError> {
        let header_start = offset.checked_sub(REC_N_NEW_EXTRA_BYTES).ok_or_else(|| {
            DissectError::OutOfBounds {
                position: 0,
                len: REC_N_NEW_EXTRA_BYTES,
                path: "record_header".to_string(),
            }
        })?;
        if header_start + REC_N_NEW_EXTRA_BYTES > page_data.len() {
            return Err(DissectError::OutOfBounds {
                position: header_start,
                len: page_data.len(),
                path: "record_header".to_string(),
            });
        }
        let hdr = CompactRecordHeader::parse(&page_data[header_start..])
            .ok_or_else(|| DissectError::Parse("malformed compact record header".to_string()))?;

        let next = if hdr.next_offset == 0 {
            None
        } else {
            Some((offset as i64 + hdr.next_offset as i64) as usize)
        };

        let key_fields: Vec<Field> = describer
            .key
            .iter()
            .enumerate()
            .map(|(i, spec)| Field::new(i, spec.clone()))
            .collect();

        if !is_leaf {
            // Non-leaf (node pointer) records carry the key fields plus a
            // single trailing child page number in place of the row.
            let mut all_fields = key_fields.clone();
            let child_field = crate::innodb::describer::FieldSpec::new(
                "child_page_number",
                crate::innodb::describer::DataType::int(4, true),
                false,
            );
            all_fields.push(Field::new(all_fields.len(), child_field));

            let ctx = compact_field_context(page_data, offset, &all_fields)?;
            let mut cursor = BufferCursor::at(page_data, offset);
            let mut key = Vec::with_capacity(key_fields.len());
            for f in &all_fields[..key_fields.len()] {
                key.push(f.value(&mut cursor, &ctx)?);
            }
            let child_page_number = match all_fields.last().unwrap().value(&mut cursor, &ctx)? {
                FieldValue::Uint(v) => Some(v as u32),
                _ => None,
            };

            return Ok(Record {
                offset,
                format: RecordFormat::Compact,
                rec_type: hdr.rec_type,
                delete_mark: hdr.delete_mark,
                heap_no: hdr.heap_no,
                next,
                key,
                row: Vec::new(),
                child_page_number,
            });
        }

        let row_fields: Vec<Field> = describer
            .row
            .iter()
            .enumerate()
            .map(|(i, spec)| Field::new(key_fields.len() + i, spec.clone()))
            .collect();
        let mut all_fields = key_fields.clone();
        all_fields.extend(row_fields.clone());

        let ctx = compact_field_context(page_data, offset, &all_fields)?;
        let mut cursor = BufferCursor::at(page_data, offset);
        let mut key = Vec::with_capacity(key_fields.len());
        for f in &key_fields {
            key.push(f.value(&mut cursor, &ctx)?);
        }
        let mut row = Vec::with_capacity(row_fields.len());
        for f in &row_fields {
            row.push(f.value(&mut cursor, &ctx)?);
        }

        Ok(Record {
            offset,
            format: RecordFormat::Compact,
            rec_type: hdr.rec_type,
            delete_mark: hdr.delete_mark,
            heap_no: hdr.heap_no,
            next,
            key,
            row,
            child_page_number: None,
        })
    }

    /// Decode a redundant-format record at `offset` using `describer`.
    ///
    /// Mirrors [`Record::decode_compact`]'s field layout (key fields, then
    /// either row fields or a single trailing `child_page_number`), but reads
    /// per-field lengths from the redundant end-offset array instead of a
    /// null bitmap plus variable-length vector, and treats the header's
    /// `next_offset` as an absolute page offset rather than a signed delta.
    pub fn decode_redundant(
        page_data: &[u8],
        offset: usize,
        describer: &RecordDescriber,
        is_leaf: bool,
    ) -> Result<Record, DissectError> {
        let header_start = offset.checked_sub(REC_N_OLD_EXTRA_BYTES).ok_or_else(|| {
            DissectError::OutOfBounds {
                position: 0,
                len: REC_N_OLD_EXTRA_BYTES,
                path: "record_header".to_string(),
            }
        })?;
        if header_start + REC_N_OLD_EXTRA_BYTES > page_data.len() {
            return Err(DissectError::OutOfBounds {
                position: header_start,
                len: page_data.len(),
                path: "record_header".to_string(),
            });
        }
        let hdr = RedundantRecordHeader::parse(&page_data[header_start..])
            .ok_or_else(|| DissectError::Parse("malformed redundant record header".to_string()))?;

        let next = if hdr.next_offset == 0 {
            None
        } else {
            Some(hdr.next_offset as usize)
        };

        let key_fields: Vec<Field> = describer
            .key
            .iter()
            .enumerate()
            .map(|(i, spec)| Field::new(i, spec.clone()))
            .collect();

        if !is_leaf {
            let mut all_fields = key_fields.clone();
            let child_field = crate::innodb::describer::FieldSpec::new(
                "child_page_number",
                crate::innodb::describer::DataType::int(4, true),
                false,
            );
            all_fields.push(Field::new(all_fields.len(), child_field));

            let ctx = redundant_field_context(offset, page_data, &hdr, &all_fields)?;
            let mut cursor = BufferCursor::at(page_data, offset);
            let mut key = Vec::with_capacity(key_fields.len());
            for f in &all_fields[..key_fields.len()] {
                key.push(f.value(&mut cursor, &ctx)?);
            }
            let child_page_number = match all_fields.last().unwrap().value(&mut cursor, &ctx)? {
                FieldValue::Uint(v) => Some(v as u32),
                _ => None,
            };

            return Ok(Record {
                offset,
                format: RecordFormat::Redundant,
                rec_type: hdr.rec_type(),
                delete_mark: hdr.delete_mark,
                heap_no: hdr.heap_no,
                next,
                key,
                row: Vec::new(),
                child_page_number,
            });
        }

        let row_fields: Vec<Field> = describer
            .row
            .iter()
            .enumerate()
            .map(|(i, spec)| Field::new(key_fields.len() + i, spec.clone()))
            .collect();
        let mut all_fields = key_fields.clone();
        all_fields.extend(row_fields.clone());

        let ctx = redundant_field_context(offset, page_data, &hdr, &all_fields)?;
        let mut cursor = BufferCursor::at(page_data, offset);
        let mut key = Vec::with_capacity(key_fields.len());
        for f in &key_fields {
            key.push(f.value(&mut cursor, &ctx)?);
        }
        let mut row = Vec::with_capacity(row_fields.len());
        for f in &row_fields {
            row.push(f.value(&mut cursor, &ctx)?);
        }

        Ok(Record {
            offset,
            format: RecordFormat::Redundant,
            rec_type: hdr.rec_type(),
            delete_mark: hdr.delete_mark,
            heap_no: hdr.heap_no,
            next,
            key,
            row,
            child_page_number: None,
        })
    }

    /// Decode a record at `offset`, dispatching to [`Record::decode_compact`]
    /// or [`Record::decode_redundant`] per `format`.
    pub fn decode(
        format: RecordFormat,
        page_data: &[u8],
        offset: usize,
        describer: &RecordDescriber,
        is_leaf: bool,
    ) -> Result<Record, DissectError> {
        match format {
            RecordFormat::Compact => Record::decode_compact(page_data, offset, describer, is_leaf),
            RecordFormat::Redundant => {
                Record::decode_redundant(page_data, offset, describer, is_leaf)
            }
        }
    }

    pub fn is_system_record(&self) -> bool {
        matches!(self.rec_type, RecordType::Infimum | RecordType::Supremum)
    }

    /// Compare this record's key against another's, per
    /// [`compare_key`].
    pub fn compare_key(&self, other_key: &[FieldValue]) -> std::cmp::Ordering {
        if self.is_system_record() {
            return compare_key(None, Some(other_key));
        }
        compare_key(Some(&self.key), Some(other_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;

    #[test]
    fn test_record_type_from_u8() {
        assert_eq!(RecordType::from_u8(0), RecordType::Ordinary);
        assert_eq!(RecordType::from_u8(1), RecordType::NodePtr);
        assert_eq!(RecordType::from_u8(2), RecordType::Infimum);
        assert_eq!(RecordType::from_u8(3), RecordType::Supremum);
    }

    #[test]
    fn test_compact_record_header_parse() {
        // Build a 5-byte compact header:
        // byte0: [info_bits(4) | n_owned(4)]
        //   n_owned=1 in lower nibble, no info bits => 0x01
        // bytes 1-2: heap_no=5 (5<<3=0x0028), rec_type=0 => 0x0028
        // bytes 3-4: next_offset = 30 => 0x001E
        let mut data = vec![0u8; 5];
        data[0] = 0x01; // n_owned=1, no delete, no min_rec
        BigEndian::write_u16(&mut data[1..3], 5 << 3); // heap_no=5, type=0
        BigEndian::write_i16(&mut data[3..5], 30); // next=30

        let hdr = CompactRecordHeader::parse(&data).unwrap();
        assert_eq!(hdr.n_owned, 1);
        assert!(!hdr.delete_mark);
        assert!(!hdr.min_rec);
        assert_eq!(hdr.heap_no, 5);
        assert_eq!(hdr.rec_type, RecordType::Ordinary);
        assert_eq!(hdr.next_offset, 30);
    }

    #[test]
    fn test_compact_record_header_with_flags() {
        let mut data = vec![0u8; 5];
        // n_owned=3 (0x30), delete_mark (0x20), min_rec (0x10)
        // => 0x30 | 0x20 | 0x10 = 0x70... wait, n_owned is bits 4-7 so n_owned=3 is 0x30
        // delete_mark is bit 5 (0x20), min_rec is bit 4 (0x10)
        // But if n_owned=3 takes bits 4-7, that's 0x30, which conflicts with bit 5 for delete.
        // Actually in InnoDB: byte0 has info_bits in upper 4 bits and... let me recheck.
        // The layout is: [info_bits(4) | n_owned(4)]
        // info_bits: bit 7=unused, bit 6=unused, bit 5=delete_mark, bit 4=min_rec
        // n_owned: bits 0-3
        // So: delete_mark=1, min_rec=0, n_owned=2 => 0x20 | 0x02 = 0x22
        data[0] = 0x22; // delete_mark=1, n_owned=2
        BigEndian::write_u16(&mut data[1..3], (10 << 3) | 1); // heap_no=10, type=node_ptr
        BigEndian::write_i16(&mut data[3..5], -50); // negative offset

        let hdr = CompactRecordHeader::parse(&data).unwrap();
        assert_eq!(hdr.n_owned, 2);
        assert!(hdr.delete_mark);
        assert!(!hdr.min_rec);
        assert_eq!(hdr.heap_no, 10);
        assert_eq!(hdr.rec_type, RecordType::NodePtr);
        assert_eq!(hdr.next_offset, -50);
    }

    #[test]
    fn test_decode_compact_leaf_record() {
        use crate::innodb::describer::{DataType, FieldSpec, IndexKind, RecordDescriber};

        let describer = RecordDescriber::new(
            IndexKind::Clustered,
            vec![FieldSpec::new("id", DataType::int(4, true), false)],
            vec![FieldSpec::new(
                "name",
                DataType::Varchar { max_len: 255 },
                true,
            )],
        );

        let mut page = vec![0u8; 64];
        let origin = 20usize;
        page[13] = 2; // variable-length byte for "name" (2 bytes)
        page[14] = 0x00; // null bitmap: name is not null

        // 5-byte compact header at origin-5: n_owned=1, ordinary, next=0
        page[15] = 0x01;
        BigEndian::write_u16(&mut page[16..18], 0); // heap_no=0, type=ordinary
        BigEndian::write_i16(&mut page[18..20], 0); // next_offset terminator

        BigEndian::write_u32(&mut page[20..24], 42); // id
        page[24..26].copy_from_slice(b"hi"); // name

        let rec = Record::decode_compact(&page, origin, &describer, true).unwrap();
        assert_eq!(rec.key, vec![FieldValue::Uint(42)]);
        assert_eq!(rec.row, vec![FieldValue::Str("hi".to_string())]);
        assert!(rec.next.is_none());
    }

    #[test]
    fn test_compare_key_nil_orders_lowest() {
        use std::cmp::Ordering;
        let real = vec![FieldValue::Uint(1)];
        assert_eq!(compare_key(None, Some(&real)), Ordering::Less);
        assert_eq!(compare_key(Some(&real), None), Ordering::Greater);
        assert_eq!(compare_key(None, None), Ordering::Equal);
    }

    #[test]
    fn test_compare_key_shorter_orders_lower() {
        use std::cmp::Ordering;
        let a = vec![FieldValue::Uint(1)];
        let b = vec![FieldValue::Uint(1), FieldValue::Uint(0)];
        assert_eq!(compare_key(Some(&a), Some(&b)), Ordering::Less);
    }

    #[test]
    fn test_decode_redundant_leaf_record() {
        use crate::innodb::describer::{DataType, FieldSpec, IndexKind, RecordDescriber};

        let describer = RecordDescriber::new(
            IndexKind::Clustered,
            vec![FieldSpec::new("id", DataType::int(4, true), false)],
            vec![FieldSpec::new(
                "name",
                DataType::Varchar { max_len: 255 },
                false,
            )],
        );

        let mut page = vec![0u8; 64];
        let origin = 20usize;

        // Offset array (1 byte/field, short form), field 0 nearest the header:
        // field 0 ("id") ends at byte 4, field 1 ("name") ends at byte 6.
        page[13] = 4;
        page[12] = 6;

        // 6-byte redundant header at origin-6: n_owned=1, ordinary, n_fields=2
        // (short offsets), next_offset=0 (terminator).
        page[14] = 0x01;
        BigEndian::write_u16(&mut page[15..17], 2 << 3); // heap_no=2 (ordinary, not a system record)
        page[17] = 2; // n_fields=2, short offsets (top bit clear)
        BigEndian::write_u16(&mut page[18..20], 0); // next_offset terminator

        BigEndian::write_u32(&mut page[20..24], 42); // id
        page[24..26].copy_from_slice(b"hi"); // name

        let rec = Record::decode_redundant(&page, origin, &describer, true).unwrap();
        assert_eq!(rec.key, vec![FieldValue::Uint(42)]);
        assert_eq!(rec.row, vec![FieldValue::Str("hi".to_string())]);
        assert!(rec.next.is_none());
    }

    #[test]
    fn test_redundant_header_parse() {
        let mut data = vec![0u8; REC_N_OLD_EXTRA_BYTES];
        data[0] = 0x12; // n_owned=2, min_rec set (0x10)
        BigEndian::write_u16(&mut data[1..3], 7 << 3); // heap_no=7
        data[3] = 3; // n_fields=3, short offsets
        BigEndian::write_u16(&mut data[4..6], 150); // next_offset absolute

        let hdr = RedundantRecordHeader::parse(&data).unwrap();
        assert_eq!(hdr.n_owned, 2);
        assert!(hdr.min_rec);
        assert_eq!(hdr.heap_no, 7);
        assert_eq!(hdr.n_fields, 3);
        assert!(hdr.short_offsets);
        assert_eq!(hdr.next_offset, 150);
    }
}
