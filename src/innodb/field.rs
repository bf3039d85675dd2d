//! A single field within a record describer.
//!
//! [`Field`] pairs a [`FieldSpec`](crate::innodb::describer::FieldSpec) with
//! its ordinal position in the describer's key or row list. The position is
//! what lets per-record helpers (`null?`, `extern?`, `length`, `value`)
//! consult the record's null bitmap and variable-length vector, both of
//! which are indexed by field order rather than by name.

use crate::error::DissectError;
use crate::innodb::cursor::BufferCursor;
use crate::innodb::describer::{DataType, FieldSpec};
use crate::innodb::field_decode::FieldValue;

/// External-reference trailer size (space_id u32, page u32, offset u32,
/// length u64 with top 2 bits reserved) for off-page (extern) columns.
pub const EXTERNAL_REFERENCE_SIZE: usize = 20;

/// The per-record bookkeeping a [`Field`] needs to locate its own bytes:
/// which fields (by position) are NULL, which are stored externally, and
/// the on-disk length of each variable-width field that is present.
#[derive(Debug, Clone, Default)]
pub struct RecordFieldContext {
    pub nulls: Vec<bool>,
    pub externs: Vec<bool>,
    pub lengths: Vec<Option<usize>>,
}

/// One declared field: its position in the describer, name, base type, and
/// nullability.
#[derive(Debug, Clone)]
pub struct Field {
    pub position: usize,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(position: usize, spec: FieldSpec) -> Self {
        Field {
            position,
            name: spec.name,
            data_type: spec.data_type,
            nullable: spec.nullable,
        }
    }

    /// `null?(rec) = nullable && rec.header.nulls contains name`.
    pub fn is_null(&self, ctx: &RecordFieldContext) -> bool {
        self.nullable && ctx.nulls.get(self.position).copied().unwrap_or(false)
    }

    /// `extern?(rec) = rec.header.externs contains name`.
    pub fn is_extern(&self, ctx: &RecordFieldContext) -> bool {
        ctx.externs.get(self.position).copied().unwrap_or(false)
    }

    /// Effective on-disk byte length for this field in the given record.
    /// Uses the record's recorded length for variable fields; falls back to
    /// the type's fixed width otherwise. Subtracts the external-reference
    /// trailer size when the field is stored off-page.
    pub fn length(&self, ctx: &RecordFieldContext) -> Result<usize, DissectError> {
        let base = match ctx.lengths.get(self.position).copied().flatten() {
            Some(recorded) => recorded,
            None => self.data_type.length().ok_or_else(|| DissectError::Parse(
                format!("field {} has no recorded length and no fixed width", self.name),
            ))?,
        };

        if self.is_extern(ctx) {
            base.checked_sub(EXTERNAL_REFERENCE_SIZE).ok_or_else(|| {
                DissectError::Parse(format!(
                    "field {} marked extern but length {} is shorter than the reference trailer",
                    self.name, base
                ))
            })
        } else {
            Ok(base)
        }
    }

    /// Decode this field's value out of `cursor`, positioned at the field's
    /// start offset. Advances the cursor past the field (and, if extern,
    /// past the 20-byte reference trailer).
    pub fn value(
        &self,
        cursor: &mut BufferCursor,
        ctx: &RecordFieldContext,
    ) -> Result<FieldValue, DissectError> {
        if self.is_null(ctx) {
            return Ok(FieldValue::Null);
        }
        let len = self.length(ctx)?;
        let bytes = cursor.read_bytes(len)?.to_vec();
        let value = self.data_type.value(&bytes)?;
        if self.is_extern(ctx) {
            cursor.read_bytes(EXTERNAL_REFERENCE_SIZE)?;
        }
        Ok(value)
    }

    /// Decode the 20-byte external-reference trailer for this field, if the
    /// field is marked extern: `(space_id, page, offset, length)`.
    pub fn read_extern_reference(
        &self,
        cursor: &mut BufferCursor,
        ctx: &RecordFieldContext,
    ) -> Result<Option<ExternReference>, DissectError> {
        if !self.is_extern(ctx) {
            return Ok(None);
        }
        let bytes = cursor.read_bytes(EXTERNAL_REFERENCE_SIZE)?;
        Ok(Some(ExternReference::parse(bytes)?))
    }
}

/// A decoded 20-byte off-page (BLOB/TEXT) reference trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternReference {
    pub space_id: u32,
    pub page: u32,
    pub offset: u32,
    pub length: u64,
}

impl ExternReference {
    pub fn parse(data: &[u8]) -> Result<Self, DissectError> {
        use byteorder::{BigEndian, ByteOrder};
        if data.len() < EXTERNAL_REFERENCE_SIZE {
            return Err(DissectError::OutOfBounds {
                position: data.len(),
                len: EXTERNAL_REFERENCE_SIZE,
                path: "extern_reference".to_string(),
            });
        }
        Ok(ExternReference {
            space_id: BigEndian::read_u32(&data[0..4]),
            page: BigEndian::read_u32(&data[4..8]),
            offset: BigEndian::read_u32(&data[8..12]),
            length: BigEndian::read_u64(&data[12..20]) & 0x3fff_ffff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::describer::DataType;

    fn make_field(position: usize, data_type: DataType, nullable: bool) -> Field {
        Field::new(
            position,
            FieldSpec::new(format!("f{}", position), data_type, nullable),
        )
    }

    #[test]
    fn null_field_short_circuits() {
        let field = make_field(0, DataType::int(4, false), true);
        let ctx = RecordFieldContext {
            nulls: vec![true],
            externs: vec![false],
            lengths: vec![None],
        };
        assert!(field.is_null(&ctx));
        let buf = vec![0u8; 4];
        let mut cursor = BufferCursor::new(&buf);
        let value = field.value(&mut cursor, &ctx).unwrap();
        assert!(matches!(value, FieldValue::Null));
    }

    #[test]
    fn extern_length_subtracts_trailer() {
        let field = make_field(0, DataType::Blob, false);
        let ctx = RecordFieldContext {
            nulls: vec![false],
            externs: vec![true],
            lengths: vec![Some(40)],
        };
        assert_eq!(field.length(&ctx).unwrap(), 20);
    }

    #[test]
    fn extern_reference_parses() {
        let mut data = vec![0u8; 20];
        byteorder::BigEndian::write_u32(&mut data[0..4], 7);
        byteorder::BigEndian::write_u32(&mut data[4..8], 99);
        byteorder::BigEndian::write_u32(&mut data[8..12], 123);
        byteorder::BigEndian::write_u64(&mut data[12..20], 5000);
        let r = ExternReference::parse(&data).unwrap();
        assert_eq!(r.space_id, 7);
        assert_eq!(r.page, 99);
        assert_eq!(r.offset, 123);
        assert_eq!(r.length, 5000);
    }
}
