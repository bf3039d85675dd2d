//! Record describers and the data-type registry.
//!
//! An INDEX page's raw bytes carry no column metadata of their own; something
//! external has to say "this index's key is a single u64, its row is three
//! more columns" before [`crate::innodb::record::Record`] can decode a byte
//! range into field values. A [`RecordDescriber`] is that something: an
//! ordered list of key fields and an ordered list of row fields, either
//! declared statically (the built-in SYS_* schemas, see
//! [`crate::innodb::dictionary`]) or built programmatically from a loaded
//! table definition (SDI-derived schemas).
//!
//! [`DataType`] is the base-type registry referenced by each
//! [`crate::innodb::field::Field`]: it knows how wide a value is on disk and
//! how to turn its raw bytes into a [`FieldValue`].

use byteorder::{BigEndian, ByteOrder};

use crate::error::DissectError;
use crate::innodb::field_decode::FieldValue;

/// Whether a record describer's fields form a primary (clustered) key or a
/// secondary index's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Clustered,
    Secondary,
}

/// A base-type token from the data-type registry.
///
/// Each variant carries the width/precision information needed to decode a
/// value; `Char`/`Varchar`/`Blob` additionally carry the maximum on-disk
/// width used to decide the 1-byte vs. 2-byte length-prefix encoding (see
/// [`crate::innodb::field::Field::length`]).
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Int { width: usize, unsigned: bool },
    Float,
    Double,
    Char { len: usize },
    Varchar { max_len: usize },
    Blob,
    Decimal { precision: u32, scale: u32 },
    Bit { len_bits: u32 },
    Date,
    DateTime { fsp: u32 },
    Time,
    Timestamp { fsp: u32 },
    Year,
    Enum,
    Set,
    TrxId,
    RollPtr,
}

impl DataType {
    pub fn int(width: usize, unsigned: bool) -> Self {
        DataType::Int { width, unsigned }
    }

    /// Display name, as used by the cursor's diagnostic trace.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int { unsigned: true, .. } => "UINT",
            DataType::Int { unsigned: false, .. } => "INT",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Char { .. } => "CHAR",
            DataType::Varchar { .. } => "VARCHAR",
            DataType::Blob => "BLOB",
            DataType::Decimal { .. } => "DECIMAL",
            DataType::Bit { .. } => "BIT",
            DataType::Date => "DATE",
            DataType::DateTime { .. } => "DATETIME",
            DataType::Time => "TIME",
            DataType::Timestamp { .. } => "TIMESTAMP",
            DataType::Year => "YEAR",
            DataType::Enum => "ENUM",
            DataType::Set => "SET",
            DataType::TrxId => "TRX_ID",
            DataType::RollPtr => "ROLL_PTR",
        }
    }

    /// Fixed on-disk width in bytes, or `None` for variable-width types.
    pub fn length(&self) -> Option<usize> {
        match self {
            DataType::Int { width, .. } => Some(*width),
            DataType::Float => Some(4),
            DataType::Double => Some(8),
            DataType::Char { len } => Some(*len),
            DataType::Decimal { precision, scale } => Some(decimal_byte_len(*precision, *scale)),
            DataType::Bit { len_bits } => Some((*len_bits as usize).div_ceil(8)),
            DataType::Date => Some(3),
            DataType::DateTime { fsp } => Some(5 + fsp_extra_bytes(*fsp)),
            DataType::Time => Some(3),
            DataType::Timestamp { fsp } => Some(4 + fsp_extra_bytes(*fsp)),
            DataType::Year => Some(1),
            DataType::Enum => Some(2),
            DataType::Set => Some(8),
            DataType::TrxId => Some(6),
            DataType::RollPtr => Some(7),
            DataType::Varchar { .. } | DataType::Blob => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, DataType::Varchar { .. } | DataType::Blob)
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, DataType::Blob)
    }

    /// Maximum storage width; used to pick the 1- vs. 2-byte length prefix.
    /// Fixed-width types report their own length.
    pub fn max_storage_len(&self) -> usize {
        match self {
            DataType::Varchar { max_len } => *max_len,
            DataType::Blob => usize::MAX,
            other => other.length().unwrap_or(usize::MAX),
        }
    }

    /// Decode `bytes` (already trimmed to this field's exact on-disk length)
    /// per this type's rules.
    pub fn value(&self, bytes: &[u8]) -> Result<FieldValue, DissectError> {
        match self {
            DataType::Int { width, unsigned } => Ok(decode_munged_int(bytes, *width, *unsigned)),
            DataType::Float => decode_munged_float(bytes),
            DataType::Double => decode_munged_double(bytes),
            DataType::Char { .. } | DataType::Varchar { .. } => {
                Ok(FieldValue::Str(String::from_utf8_lossy(bytes).trim_end().to_string()))
            }
            DataType::Blob => Ok(FieldValue::Hex(hex_string(bytes))),
            DataType::Decimal { precision, scale } => decode_decimal(bytes, *precision, *scale),
            DataType::Bit { .. } | DataType::Enum | DataType::Set | DataType::Time => {
                Ok(FieldValue::Hex(hex_string(bytes)))
            }
            DataType::Date => decode_date(bytes),
            DataType::DateTime { fsp } => decode_datetime(bytes, *fsp),
            DataType::Timestamp { fsp } => decode_timestamp(bytes, *fsp),
            DataType::Year => decode_year(bytes),
            DataType::TrxId => {
                if bytes.len() < 6 {
                    return Err(DissectError::OutOfBounds {
                        position: 0,
                        len: bytes.len(),
                        path: "TRX_ID".to_string(),
                    });
                }
                let mut buf = [0u8; 8];
                buf[2..8].copy_from_slice(&bytes[0..6]);
                Ok(FieldValue::Uint(BigEndian::read_u64(&buf)))
            }
            DataType::RollPtr => Ok(FieldValue::Uint(decode_roll_ptr(bytes)?.raw)),
        }
    }
}

/// A decoded rollback pointer (DB_ROLL_PTR), per the packed-bitfield layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollPtr {
    pub is_insert: bool,
    pub rseg_id: u8,
    pub undo_page: u32,
    pub undo_offset: u16,
    /// The raw 56-bit value, as returned by `DataType::RollPtr::value`.
    pub raw: u64,
}

/// Decode a 7-byte DB_ROLL_PTR: is-insert @ bit 55, rseg_id @ bits 48-54,
/// undo-page @ bits 16-47, undo-offset @ bits 0-15.
pub fn decode_roll_ptr(bytes: &[u8]) -> Result<RollPtr, DissectError> {
    if bytes.len() < 7 {
        return Err(DissectError::OutOfBounds {
            position: 0,
            len: bytes.len(),
            path: "ROLL_PTR".to_string(),
        });
    }
    let mut buf = [0u8; 8];
    buf[1..8].copy_from_slice(&bytes[0..7]);
    let raw = BigEndian::read_u64(&buf);
    Ok(RollPtr {
        is_insert: (raw >> 55) & 1 != 0,
        rseg_id: ((raw >> 48) & 0x7f) as u8,
        undo_page: ((raw >> 16) & 0xffff_ffff) as u32,
        undo_offset: (raw & 0xffff) as u16,
        raw,
    })
}

fn hex_string(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2 + 2);
    s.push_str("0x");
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

fn fsp_extra_bytes(fsp: u32) -> usize {
    ((fsp as usize) + 1) / 2
}

/// Decode a big-endian integer of `width` bytes, reversing the engine's
/// "munged signed integer" convention for signed widths (stored value is
/// XOR-ed with the high bit of the field).
fn decode_munged_int(bytes: &[u8], width: usize, unsigned: bool) -> FieldValue {
    let mut buf = [0u8; 8];
    let n = width.min(8).min(bytes.len());
    buf[8 - n..].copy_from_slice(&bytes[..n]);
    let raw = BigEndian::read_u64(&buf);

    if unsigned {
        return FieldValue::Uint(raw);
    }

    let sign_bit = 1u64 << (width * 8 - 1);
    let unsigned_repr = raw ^ sign_bit;
    let shift = 64 - width * 8;
    let signed = ((unsigned_repr << shift) as i64) >> shift;
    FieldValue::Int(signed)
}

fn decode_munged_float(bytes: &[u8]) -> Result<FieldValue, DissectError> {
    if bytes.len() < 4 {
        return Err(short("FLOAT", bytes.len(), 4));
    }
    let mut raw = BigEndian::read_u32(&bytes[0..4]);
    if raw & 0x8000_0000 != 0 {
        raw &= 0x7fff_ffff;
    } else {
        raw = !raw;
    }
    Ok(FieldValue::Float(f32::from_bits(raw)))
}

fn decode_munged_double(bytes: &[u8]) -> Result<FieldValue, DissectError> {
    if bytes.len() < 8 {
        return Err(short("DOUBLE", bytes.len(), 8));
    }
    let mut raw = BigEndian::read_u64(&bytes[0..8]);
    if raw & 0x8000_0000_0000_0000 != 0 {
        raw &= 0x7fff_ffff_ffff_ffff;
    } else {
        raw = !raw;
    }
    Ok(FieldValue::Double(f64::from_bits(raw)))
}

fn short(what: &str, got: usize, need: usize) -> DissectError {
    DissectError::OutOfBounds {
        position: got,
        len: need,
        path: what.to_string(),
    }
}

fn decode_date(bytes: &[u8]) -> Result<FieldValue, DissectError> {
    if bytes.len() < 3 {
        return Err(short("DATE", bytes.len(), 3));
    }
    let raw = (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32;
    if raw == 0 {
        return Ok(FieldValue::Str("0000-00-00".to_string()));
    }
    let day = raw & 0x1f;
    let month = (raw >> 5) & 0xf;
    let year = raw >> 9;
    Ok(FieldValue::Str(format!("{:04}-{:02}-{:02}", year, month, day)))
}

fn decode_year(bytes: &[u8]) -> Result<FieldValue, DissectError> {
    if bytes.is_empty() {
        return Err(short("YEAR", 0, 1));
    }
    if bytes[0] == 0 {
        return Ok(FieldValue::Str("0000".to_string()));
    }
    Ok(FieldValue::Uint(1900 + bytes[0] as u64))
}

fn decode_datetime(bytes: &[u8], fsp: u32) -> Result<FieldValue, DissectError> {
    let need = 5 + fsp_extra_bytes(fsp);
    if bytes.len() < need {
        return Err(short("DATETIME", bytes.len(), need));
    }
    let mut buf = [0u8; 8];
    buf[3..8].copy_from_slice(&bytes[0..5]);
    let raw = BigEndian::read_u64(&buf) ^ (1u64 << 39);
    let ymd_hms = (raw >> 0) & 0xf_ffff_ffff;
    let ymd = ymd_hms >> 17;
    let hms = ymd_hms & 0x1ffff;
    let day = ymd & 0x1f;
    let month = (ymd >> 5) & 0xf;
    let year = ymd >> 9;
    let second = hms & 0x3f;
    let minute = (hms >> 6) & 0x3f;
    let hour = hms >> 12;
    Ok(FieldValue::Str(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hour, minute, second
    )))
}

fn decode_timestamp(bytes: &[u8], fsp: u32) -> Result<FieldValue, DissectError> {
    let need = 4 + fsp_extra_bytes(fsp);
    if bytes.len() < need {
        return Err(short("TIMESTAMP", bytes.len(), need));
    }
    let secs = BigEndian::read_u32(&bytes[0..4]);
    if secs == 0 {
        return Ok(FieldValue::Str("0000-00-00 00:00:00".to_string()));
    }
    Ok(FieldValue::Uint(secs as u64))
}

fn decimal_byte_len(precision: u32, scale: u32) -> usize {
    const DIG2BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];
    let int_digits = precision - scale;
    let int_full = int_digits / 9;
    let int_partial = (int_digits % 9) as usize;
    let frac_digits = scale;
    let frac_full = frac_digits / 9;
    let frac_partial = (frac_digits % 9) as usize;
    (int_full as usize) * 4 + DIG2BYTES[int_partial] + (frac_full as usize) * 4 + DIG2BYTES[frac_partial]
}

fn decode_decimal(bytes: &[u8], precision: u32, scale: u32) -> Result<FieldValue, DissectError> {
    const DIG2BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];
    let int_digits = (precision - scale) as usize;
    let frac_digits = scale as usize;

    if bytes.is_empty() {
        return Err(short("DECIMAL", 0, 1));
    }

    let negative = bytes[0] & 0x80 == 0;
    let mask: i64 = if negative { -1 } else { 0 };
    let mut buf = bytes.to_vec();
    buf[0] ^= 0x80;

    let mut pos = 0usize;
    let mut int_str = String::new();
    let int_lead = int_digits % 9;
    let mut groups: Vec<usize> = Vec::new();
    if int_lead > 0 {
        groups.push(int_lead);
    }
    for _ in 0..(int_digits / 9) {
        groups.push(9);
    }
    for (i, &digits) in groups.iter().enumerate() {
        let width = if digits == 9 { 4 } else { DIG2BYTES[digits] };
        if pos + width > buf.len() {
            return Err(short("DECIMAL", buf.len(), pos + width));
        }
        let val = read_signed_be(&buf[pos..pos + width]) ^ mask;
        pos += width;
        if i == 0 {
            int_str.push_str(&val.to_string());
        } else {
            int_str.push_str(&format!("{:09}", val));
        }
    }
    if int_str.is_empty() {
        int_str.push('0');
    }

    let mut frac_groups: Vec<usize> = Vec::new();
    for _ in 0..(frac_digits / 9) {
        frac_groups.push(9);
    }
    let frac_trail = frac_digits % 9;
    if frac_trail > 0 {
        frac_groups.push(frac_trail);
    }
    let mut frac_str = String::new();
    for &digits in &frac_groups {
        let width = if digits == 9 { 4 } else { DIG2BYTES[digits] };
        if pos + width > buf.len() {
            return Err(short("DECIMAL", buf.len(), pos + width));
        }
        let val = read_signed_be(&buf[pos..pos + width]) ^ mask;
        pos += width;
        frac_str.push_str(&format!("{:0width$}", val, width = digits));
    }

    let sign = if negative { "-" } else { "" };
    if frac_str.is_empty() {
        Ok(FieldValue::Str(format!("{}{}", sign, int_str)))
    } else {
        Ok(FieldValue::Str(format!("{}{}.{}", sign, int_str, frac_str)))
    }
}

fn read_signed_be(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    BigEndian::read_u64(&buf) as i64
}

/// A single declared column in a record describer: base type plus
/// nullability. Position and name live on [`crate::innodb::field::Field`],
/// which wraps this with per-record offset bookkeeping.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        FieldSpec {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Describes one index's record shape: key fields (in key order) and row
/// fields (the remaining, non-key columns carried by a leaf record).
#[derive(Debug, Clone)]
pub struct RecordDescriber {
    pub kind: IndexKind,
    pub key: Vec<FieldSpec>,
    pub row: Vec<FieldSpec>,
}

impl RecordDescriber {
    /// Declarative constructor, mirroring a static `type/key/row` definition.
    pub fn new(kind: IndexKind, key: Vec<FieldSpec>, row: Vec<FieldSpec>) -> Self {
        RecordDescriber { kind, key, row }
    }

    /// Programmatic constructor used by dictionary-built describers, which
    /// assemble `key`/`row` incrementally while walking column metadata.
    pub fn builder(kind: IndexKind) -> RecordDescriberBuilder {
        RecordDescriberBuilder {
            kind,
            key: Vec::new(),
            row: Vec::new(),
        }
    }

    pub fn is_clustered(&self) -> bool {
        self.kind == IndexKind::Clustered
    }
}

/// Incremental builder for a [`RecordDescriber`] (the "programmatic"
/// construction mode).
pub struct RecordDescriberBuilder {
    kind: IndexKind,
    key: Vec<FieldSpec>,
    row: Vec<FieldSpec>,
}

impl RecordDescriberBuilder {
    pub fn key_field(mut self, field: FieldSpec) -> Self {
        self.key.push(field);
        self
    }

    pub fn row_field(mut self, field: FieldSpec) -> Self {
        self.row.push(field);
        self
    }

    pub fn build(self) -> RecordDescriber {
        RecordDescriber {
            kind: self.kind,
            key: self.key,
            row: self.row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn munged_signed_int_roundtrip() {
        // -1 stored as 0x7f (0xff XOR 0x80) for a 1-byte signed field.
        let bytes = [0x7f];
        match decode_munged_int(&bytes, 1, false) {
            FieldValue::Int(v) => assert_eq!(v, -1),
            other => panic!("expected Int, got {:?}", other),
        }
    }

    #[test]
    fn munged_signed_int_positive() {
        let bytes = [0x80, 0x2a];
        match decode_munged_int(&bytes, 2, false) {
            FieldValue::Int(v) => assert_eq!(v, 42),
            other => panic!("expected Int, got {:?}", other),
        }
    }

    #[test]
    fn roll_ptr_decode() {
        // is_insert=1, rseg_id=5, undo_page=100, undo_offset=200
        let raw: u64 = (1u64 << 55) | (5u64 << 48) | (100u64 << 16) | 200u64;
        let bytes = raw.to_be_bytes();
        let rp = decode_roll_ptr(&bytes[1..8]).unwrap();
        assert!(rp.is_insert);
        assert_eq!(rp.rseg_id, 5);
        assert_eq!(rp.undo_page, 100);
        assert_eq!(rp.undo_offset, 200);
    }

    #[test]
    fn decimal_basic() {
        // DECIMAL(9,2) = 12345.67 -> single 4-byte group for int (5 digits),
        // single 2-byte group for fraction (2 digits).
        let value: i64 = 12345;
        let frac: i64 = 67;
        let mut buf = Vec::new();
        buf.extend_from_slice(&(value as i32).to_be_bytes());
        buf.extend_from_slice(&(frac as i16).to_be_bytes());
        buf[0] ^= 0x80;
        match decode_decimal(&buf, 9, 2).unwrap() {
            FieldValue::Str(s) => assert_eq!(s, "12345.67"),
            other => panic!("expected Str, got {:?}", other),
        }
    }

    #[test]
    fn data_type_length_fixed() {
        assert_eq!(DataType::int(4, false).length(), Some(4));
        assert_eq!(DataType::Varchar { max_len: 255 }.length(), None);
        assert!(DataType::Varchar { max_len: 255 }.is_variable());
        assert!(DataType::Blob.is_blob());
    }
}
