//! The data dictionary: an in-memory object graph of tablespaces, tables,
//! columns and indexes, populated from whichever back-end a given system
//! space actually carries.
//!
//! Older installations keep their catalog in four internal B+tree indexes —
//! `SYS_TABLES`, `SYS_COLUMNS`, `SYS_INDEXES`, `SYS_FIELDS` — rooted at page
//! numbers recorded in the system space's dictionary-header page. Newer
//! installations instead embed a serialized dictionary (SDI) JSON blob per
//! table inside the table's own tablespace; see [`crate::innodb::schema`]
//! and [`crate::innodb::sdi`] for that path. [`load_from_sys`] handles the
//! former; [`load_from_sdi`] the latter. [`crate::innodb::system::System`]
//! picks between them.

use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder};

use crate::error::DissectError;
use crate::innodb::btree::{BtreeIndex, CursorStart, Direction};
use crate::innodb::constants::PAGE_DATA;
use crate::innodb::describer::{DataType, FieldSpec, IndexKind, RecordDescriber};
use crate::innodb::field_decode::FieldValue;
use crate::innodb::schema::DdTable;
use crate::innodb::tablespace::Space;

/// Page number of the system space's dictionary header, fixed by convention.
pub const DICT_HDR_PAGE_NO: u64 = 7;

// Offsets of the dictionary header's fields, relative to PAGE_DATA on page 7.
const DICT_HDR_ROW_ID: usize = 0;
const DICT_HDR_TABLE_ID: usize = 8;
const DICT_HDR_INDEX_ID: usize = 16;
const DICT_HDR_MIX_ID: usize = 24;
const DICT_HDR_TABLES: usize = 32;
const DICT_HDR_TABLE_IDS: usize = 36;
const DICT_HDR_COLUMNS: usize = 40;
const DICT_HDR_INDEXES: usize = 44;
const DICT_HDR_FIELDS: usize = 48;

/// The four (well, six counting the row/table/index id counters) root
/// pointers recorded on the dictionary header page.
#[derive(Debug, Clone, Copy)]
pub struct DictHeader {
    pub row_id: u64,
    pub table_id: u64,
    pub index_id: u64,
    pub mix_id: u64,
    pub tables_root: u32,
    pub table_ids_root: u32,
    pub columns_root: u32,
    pub indexes_root: u32,
    pub fields_root: u32,
}

impl DictHeader {
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = PAGE_DATA;
        if page_data.len() < base + DICT_HDR_FIELDS + 4 {
            return None;
        }
        Some(DictHeader {
            row_id: BigEndian::read_u64(&page_data[base + DICT_HDR_ROW_ID..]),
            table_id: BigEndian::read_u64(&page_data[base + DICT_HDR_TABLE_ID..]),
            index_id: BigEndian::read_u64(&page_data[base + DICT_HDR_INDEX_ID..]),
            mix_id: BigEndian::read_u64(&page_data[base + DICT_HDR_MIX_ID..]),
            tables_root: BigEndian::read_u32(&page_data[base + DICT_HDR_TABLES..]),
            table_ids_root: BigEndian::read_u32(&page_data[base + DICT_HDR_TABLE_IDS..]),
            columns_root: BigEndian::read_u32(&page_data[base + DICT_HDR_COLUMNS..]),
            indexes_root: BigEndian::read_u32(&page_data[base + DICT_HDR_INDEXES..]),
            fields_root: BigEndian::read_u32(&page_data[base + DICT_HDR_FIELDS..]),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixed SYS_* describers
// ---------------------------------------------------------------------------

pub fn sys_tables_primary_describer() -> RecordDescriber {
    RecordDescriber::builder(IndexKind::Clustered)
        .key_field(FieldSpec::new("NAME", DataType::Varchar { max_len: 100 }, false))
        .row_field(FieldSpec::new("ID", DataType::int(8, true), false))
        .row_field(FieldSpec::new("N_COLS", DataType::int(4, true), false))
        .row_field(FieldSpec::new("TYPE", DataType::int(4, true), false))
        .row_field(FieldSpec::new("MIX_ID", DataType::int(8, true), false))
        .row_field(FieldSpec::new("MIX_LEN", DataType::int(4, true), false))
        .row_field(FieldSpec::new("CLUSTER_NAME", DataType::Varchar { max_len: 100 }, true))
        .row_field(FieldSpec::new("SPACE", DataType::int(4, true), false))
        .build()
}

pub fn sys_tables_id_describer() -> RecordDescriber {
    RecordDescriber::builder(IndexKind::Secondary)
        .key_field(FieldSpec::new("ID", DataType::int(8, true), false))
        .row_field(FieldSpec::new("NAME", DataType::Varchar { max_len: 100 }, false))
        .build()
}

pub fn sys_columns_primary_describer() -> RecordDescriber {
    RecordDescriber::builder(IndexKind::Clustered)
        .key_field(FieldSpec::new("TABLE_ID", DataType::int(8, true), false))
        .key_field(FieldSpec::new("POS", DataType::int(4, true), false))
        .row_field(FieldSpec::new("NAME", DataType::Varchar { max_len: 100 }, false))
        .row_field(FieldSpec::new("MTYPE", DataType::int(4, true), false))
        .row_field(FieldSpec::new("PRTYPE", DataType::int(4, true), false))
        .row_field(FieldSpec::new("LEN", DataType::int(4, true), false))
        .row_field(FieldSpec::new("PREC", DataType::int(4, true), false))
        .build()
}

pub fn sys_indexes_primary_describer() -> RecordDescriber {
    RecordDescriber::builder(IndexKind::Clustered)
        .key_field(FieldSpec::new("TABLE_ID", DataType::int(8, true), false))
        .key_field(FieldSpec::new("ID", DataType::int(8, true), false))
        .row_field(FieldSpec::new("NAME", DataType::Varchar { max_len: 100 }, false))
        .row_field(FieldSpec::new("N_FIELDS", DataType::int(4, true), false))
        .row_field(FieldSpec::new("TYPE", DataType::int(4, true), false))
        .row_field(FieldSpec::new("SPACE", DataType::int(4, true), false))
        .row_field(FieldSpec::new("PAGE_NO", DataType::int(4, true), false))
        .build()
}

pub fn sys_fields_primary_describer() -> RecordDescriber {
    RecordDescriber::builder(IndexKind::Clustered)
        .key_field(FieldSpec::new("INDEX_ID", DataType::int(8, true), false))
        .key_field(FieldSpec::new("POS", DataType::int(4, true), false))
        .row_field(FieldSpec::new("COL_NAME", DataType::Varchar { max_len: 100 }, false))
        .build()
}

// ---------------------------------------------------------------------------
// MySQL-type <-> InnoDB mtype/prtype mapping
// ---------------------------------------------------------------------------

const DATA_VARCHAR: u32 = 1;
const DATA_CHAR: u32 = 2;
const DATA_FIXBINARY: u32 = 3;
const DATA_BINARY: u32 = 4;
const DATA_BLOB: u32 = 5;
const DATA_INT: u32 = 6;
const DATA_FLOAT: u32 = 9;
const DATA_DOUBLE: u32 = 10;
const DATA_DECIMAL: u32 = 11;
const DATA_VARMYSQL: u32 = 12;
const DATA_MYSQL: u32 = 13;

const PRTYPE_NOT_NULL: u32 = 1 << 8;
const PRTYPE_UNSIGNED: u32 = 1 << 9;
const PRTYPE_BINARY: u32 = 1 << 10;
const PRTYPE_LONG_TRUE_VARCHAR: u32 = 1 << 12;

/// Convert a stored (mtype, prtype, len, prec) tuple into the `DataType`
/// token the record decoder needs. `NEWDECIMAL` columns are treated as a
/// fixed-width `CHAR(len)`: the exact precision/scale split used to pack the
/// value isn't recoverable from `SYS_COLUMNS` alone.
pub fn mtype_prtype_to_data_type(mtype: u32, _prtype: u32, len: u32, _prec: u32) -> DataType {
    match mtype {
        DATA_INT => DataType::int(len as usize, _prtype & PRTYPE_UNSIGNED != 0),
        DATA_FLOAT => DataType::Float,
        DATA_DOUBLE => DataType::Double,
        DATA_DECIMAL => DataType::Char { len: len as usize },
        DATA_VARCHAR | DATA_VARMYSQL => DataType::Varchar { max_len: len as usize },
        DATA_CHAR | DATA_MYSQL | DATA_FIXBINARY | DATA_BINARY => DataType::Char { len: len as usize },
        DATA_BLOB => DataType::Blob,
        _ => DataType::Blob,
    }
}

/// A short type-name token for `mtype`, used by [`ColumnDescription`].
fn mtype_name(mtype: u32) -> &'static str {
    match mtype {
        DATA_VARCHAR => "VARCHAR",
        DATA_CHAR => "CHAR",
        DATA_FIXBINARY => "FIXBINARY",
        DATA_BINARY => "BINARY",
        DATA_BLOB => "BLOB",
        DATA_INT => "INT",
        DATA_FLOAT => "FLOAT",
        DATA_DOUBLE => "DOUBLE",
        DATA_DECIMAL => "DECIMAL",
        DATA_VARMYSQL => "VARMYSQL",
        DATA_MYSQL => "MYSQL_STRING",
        _ => "UNKNOWN",
    }
}

// ---------------------------------------------------------------------------
// Object graph
// ---------------------------------------------------------------------------

/// A column's type token, storage modifiers, and raw flag bits — independent
/// of any one index's record layout.
#[derive(Debug, Clone)]
pub struct ColumnDescription {
    pub type_token: String,
    pub modifiers: String,
    pub flags: u32,
}

/// A table column, as recorded in `SYS_COLUMNS` (or derived from SDI).
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub mtype: u32,
    pub prtype: u32,
    pub len: u32,
    pub prec: u32,
}

impl Column {
    pub fn is_nullable(&self) -> bool {
        self.prtype & PRTYPE_NOT_NULL == 0
    }

    pub fn is_unsigned(&self) -> bool {
        self.prtype & PRTYPE_UNSIGNED != 0
    }

    pub fn data_type(&self) -> DataType {
        mtype_prtype_to_data_type(self.mtype, self.prtype, self.len, self.prec)
    }

    pub fn description(&self) -> ColumnDescription {
        ColumnDescription {
            type_token: mtype_name(self.mtype).to_string(),
            modifiers: format!("len={}, prec={}", self.len, self.prec),
            flags: self.prtype,
        }
    }
}

/// Which role a column plays within one particular index's record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnUsage {
    Key,
    Row,
    Sys,
}

/// One column reference within an index's ordered field list.
#[derive(Debug, Clone)]
pub struct IndexColumnReference {
    pub column: Column,
    pub usage: ColumnUsage,
}

/// Index-type bit flags, as stored in `SYS_INDEXES.TYPE`.
pub const IND_CLUSTERED: u32 = 1 << 0;
pub const IND_UNIQUE: u32 = 1 << 1;
pub const IND_UNIVERSAL: u32 = 1 << 2;
pub const IND_IBUF: u32 = 1 << 3;
pub const IND_CORRUPT: u32 = 1 << 4;
pub const IND_FTS: u32 = 1 << 5;

/// An index: its identity, its root page, and its ordered column references.
#[derive(Debug, Clone)]
pub struct Index {
    pub name: String,
    pub table_id: u64,
    pub index_id: u64,
    pub space_id: u32,
    pub root_page: u32,
    pub type_flags: u32,
    pub columns: Vec<IndexColumnReference>,
}

impl Index {
    pub fn kind(&self) -> IndexKind {
        if self.type_flags & IND_CLUSTERED != 0 {
            IndexKind::Clustered
        } else {
            IndexKind::Secondary
        }
    }

    pub fn is_clustered(&self) -> bool {
        self.kind() == IndexKind::Clustered
    }

    pub fn is_unique(&self) -> bool {
        self.type_flags & IND_UNIQUE != 0
    }

    /// Build the record describer this index's leaf pages decode against.
    /// `DB_TRX_ID`/`DB_ROLL_PTR` system references decode via the dedicated
    /// [`DataType::TrxId`]/[`DataType::RollPtr`] tokens rather than the
    /// column's own stored mtype.
    pub fn describer(&self) -> RecordDescriber {
        let mut builder = RecordDescriber::builder(self.kind());
        for col_ref in &self.columns {
            let field = match (col_ref.usage, col_ref.column.name.as_str()) {
                (ColumnUsage::Sys, "DB_TRX_ID") => {
                    FieldSpec::new("DB_TRX_ID", DataType::TrxId, false)
                }
                (ColumnUsage::Sys, "DB_ROLL_PTR") => {
                    FieldSpec::new("DB_ROLL_PTR", DataType::RollPtr, false)
                }
                _ => FieldSpec::new(
                    col_ref.column.name.clone(),
                    col_ref.column.data_type(),
                    col_ref.column.is_nullable(),
                ),
            };
            builder = match col_ref.usage {
                ColumnUsage::Key => builder.key_field(field),
                ColumnUsage::Row | ColumnUsage::Sys => builder.row_field(field),
            };
        }
        builder.build()
    }
}

/// A table: its identity, owned columns (in definition order) and indexes
/// (exactly one of which is clustered).
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub table_id: u64,
    pub space_id: u32,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

impl Table {
    pub fn clustered_index(&self) -> Option<&Index> {
        self.indexes.iter().find(|i| i.is_clustered())
    }

    pub fn index_by_name(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// A tablespace, as known to the dictionary: its id and a human name.
#[derive(Debug, Clone)]
pub struct TablespaceRef {
    pub space_id: u32,
    pub name: String,
}

/// The populated object graph, however it was loaded.
pub struct DataDictionary {
    pub tablespaces: Vec<TablespaceRef>,
    pub tables: Vec<Table>,
}

impl DataDictionary {
    pub fn find(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_by_id(&self, id: u64) -> Option<&Table> {
        self.tables.iter().find(|t| t.table_id == id)
    }

    pub fn index_by_name(&self, table: &str, index: &str) -> Option<&Index> {
        self.find(table)?.index_by_name(index)
    }

    pub fn index_by_space_id(&self, space_id: u32) -> Option<&Index> {
        self.tables
            .iter()
            .flat_map(|t| &t.indexes)
            .find(|i| i.space_id == space_id)
    }

    /// Look up the describer for an arbitrary index by its innodb index id,
    /// falling back to the built-in `SYS_TABLES` describer for the
    /// dictionary's own internal indexes (whose ids aren't themselves
    /// cataloged in `SYS_INDEXES`).
    pub fn record_describer_by_index_id(&self, id: u64) -> RecordDescriber {
        self.tables
            .iter()
            .flat_map(|t| &t.indexes)
            .find(|i| i.index_id == id)
            .map(|i| i.describer())
            .unwrap_or_else(sys_tables_primary_describer)
    }
}

// ---------------------------------------------------------------------------
// SYS_* back-end
// ---------------------------------------------------------------------------

struct RawTableRow {
    name: String,
    id: u64,
    space: u32,
}

struct RawColumnRow {
    table_id: u64,
    pos: u32,
    name: String,
    mtype: u32,
    prtype: u32,
    len: u32,
    prec: u32,
}

struct RawIndexRow {
    table_id: u64,
    id: u64,
    name: String,
    type_flags: u32,
    space: u32,
    page_no: u32,
}

struct RawFieldRow {
    index_id: u64,
    pos: u32,
    col_name: String,
}

fn str_field(v: &FieldValue) -> String {
    match v {
        FieldValue::Str(s) => s.clone(),
        FieldValue::Hex(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

fn uint_field(v: &FieldValue) -> u64 {
    match v {
        FieldValue::Uint(u) => *u,
        FieldValue::Int(i) => *i as u64,
        _ => 0,
    }
}

fn collect_all(
    space: &mut Space,
    index: &BtreeIndex,
) -> Result<Vec<crate::innodb::record::Record>, DissectError> {
    let mut out = Vec::new();
    let mut cursor = index.cursor(space, CursorStart::Min, Direction::Forward)?;
    while let Some(rec) = cursor.next(space)? {
        out.push(rec);
    }
    Ok(out)
}

/// Load the data dictionary from the system space's internal `SYS_*`
/// B+trees, per the roots recorded on the dictionary header page.
pub fn load_from_sys(space: &mut Space) -> Result<DataDictionary, DissectError> {
    let hdr_page = space.page(DICT_HDR_PAGE_NO)?;
    let hdr = DictHeader::parse(&hdr_page)
        .ok_or_else(|| DissectError::Parse("malformed dictionary header page".to_string()))?;

    let sys_tables = BtreeIndex::new(space, hdr.tables_root, sys_tables_primary_describer())?;
    let sys_columns = BtreeIndex::new(space, hdr.columns_root, sys_columns_primary_describer())?;
    let sys_indexes = BtreeIndex::new(space, hdr.indexes_root, sys_indexes_primary_describer())?;
    let sys_fields = BtreeIndex::new(space, hdr.fields_root, sys_fields_primary_describer())?;

    let table_rows: Vec<RawTableRow> = collect_all(space, &sys_tables)?
        .into_iter()
        .map(|rec| RawTableRow {
            name: str_field(&rec.key[0]),
            id: uint_field(&rec.row[0]),
            space: uint_field(&rec.row[6]) as u32,
        })
        .collect();

    let column_rows: Vec<RawColumnRow> = collect_all(space, &sys_columns)?
        .into_iter()
        .map(|rec| RawColumnRow {
            table_id: uint_field(&rec.key[0]),
            pos: uint_field(&rec.key[1]) as u32,
            name: str_field(&rec.row[0]),
            mtype: uint_field(&rec.row[1]) as u32,
            prtype: uint_field(&rec.row[2]) as u32,
            len: uint_field(&rec.row[3]) as u32,
            prec: uint_field(&rec.row[4]) as u32,
        })
        .collect();

    let index_rows: Vec<RawIndexRow> = collect_all(space, &sys_indexes)?
        .into_iter()
        .map(|rec| RawIndexRow {
            table_id: uint_field(&rec.key[0]),
            id: uint_field(&rec.key[1]),
            name: str_field(&rec.row[0]),
            type_flags: uint_field(&rec.row[2]) as u32,
            space: uint_field(&rec.row[3]) as u32,
            page_no: uint_field(&rec.row[4]) as u32,
        })
        .collect();

    let field_rows: Vec<RawFieldRow> = collect_all(space, &sys_fields)?
        .into_iter()
        .map(|rec| RawFieldRow {
            index_id: uint_field(&rec.key[0]),
            pos: uint_field(&rec.key[1]) as u32,
            col_name: str_field(&rec.row[0]),
        })
        .collect();

    let mut tables = Vec::new();
    for t in &table_rows {
        let mut columns: Vec<&RawColumnRow> =
            column_rows.iter().filter(|c| c.table_id == t.id).collect();
        columns.sort_by_key(|c| c.pos);
        let table_columns: Vec<Column> = columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                mtype: c.mtype,
                prtype: c.prtype,
                len: c.len,
                prec: c.prec,
            })
            .collect();

        let mut indexes = Vec::new();
        let mut clustered_key_names: Vec<String> = Vec::new();
        let table_index_rows: Vec<&RawIndexRow> =
            index_rows.iter().filter(|i| i.table_id == t.id).collect();

        // Resolve the clustered index's key column names first: secondary
        // indexes need them to build their row (non-key) columns.
        for idx in &table_index_rows {
            if idx.type_flags & IND_CLUSTERED != 0 {
                let mut fields: Vec<&RawFieldRow> =
                    field_rows.iter().filter(|f| f.index_id == idx.id).collect();
                fields.sort_by_key(|f| f.pos);
                clustered_key_names = fields.iter().map(|f| f.col_name.clone()).collect();
            }
        }

        for idx in &table_index_rows {
            let mut fields: Vec<&RawFieldRow> =
                field_rows.iter().filter(|f| f.index_id == idx.id).collect();
            fields.sort_by_key(|f| f.pos);
            let key_names: Vec<String> = fields.iter().map(|f| f.col_name.clone()).collect();

            let mut columns_ref = Vec::new();
            for name in &key_names {
                if let Some(col) = table_columns.iter().find(|c| &c.name == name) {
                    columns_ref.push(IndexColumnReference {
                        column: col.clone(),
                        usage: ColumnUsage::Key,
                    });
                }
            }

            if idx.type_flags & IND_CLUSTERED != 0 {
                for col in &table_columns {
                    if !key_names.contains(&col.name) {
                        columns_ref.push(IndexColumnReference {
                            column: col.clone(),
                            usage: ColumnUsage::Row,
                        });
                    }
                }
                columns_ref.push(IndexColumnReference {
                    column: Column {
                        name: "DB_TRX_ID".to_string(),
                        mtype: 0,
                        prtype: PRTYPE_NOT_NULL | PRTYPE_UNSIGNED,
                        len: 6,
                        prec: 0,
                    },
                    usage: ColumnUsage::Sys,
                });
                columns_ref.push(IndexColumnReference {
                    column: Column {
                        name: "DB_ROLL_PTR".to_string(),
                        mtype: 0,
                        prtype: PRTYPE_NOT_NULL | PRTYPE_UNSIGNED,
                        len: 7,
                        prec: 0,
                    },
                    usage: ColumnUsage::Sys,
                });
            } else {
                for name in &clustered_key_names {
                    if key_names.contains(name) {
                        continue;
                    }
                    if let Some(col) = table_columns.iter().find(|c| &c.name == name) {
                        columns_ref.push(IndexColumnReference {
                            column: col.clone(),
                            usage: ColumnUsage::Row,
                        });
                    }
                }
            }

            indexes.push(Index {
                name: idx.name.clone(),
                table_id: idx.table_id,
                index_id: idx.id,
                space_id: idx.space,
                root_page: idx.page_no,
                type_flags: idx.type_flags,
                columns: columns_ref,
            });
        }

        tables.push(Table {
            name: t.name.clone(),
            table_id: t.id,
            space_id: t.space,
            columns: table_columns,
            indexes,
        });
    }

    let tablespaces = table_rows
        .iter()
        .map(|t| TablespaceRef {
            space_id: t.space,
            name: t.name.clone(),
        })
        .collect();

    Ok(DataDictionary { tablespaces, tables })
}

// ---------------------------------------------------------------------------
// SDI back-end
// ---------------------------------------------------------------------------

/// Build a `Table` (and its one clustered plus any secondary indexes) from
/// an SDI-derived [`DdTable`], using [`crate::innodb::field_decode`]'s
/// storage-order layout for the clustered index's row, and reconstructing
/// secondary indexes from the table's own `DdIndex` entries.
pub fn table_from_sdi(dd: &DdTable, space_id: u32) -> Table {
    let layout = crate::innodb::field_decode::build_column_layout(dd);

    let pk_positions: Vec<u64> = dd
        .indexes
        .iter()
        .find(|i| i.index_type == 1)
        .map(|pk| {
            pk.elements
                .iter()
                .filter(|e| !e.hidden)
                .map(|e| e.column_opx)
                .collect()
        })
        .unwrap_or_default();

    let table_columns: Vec<Column> = layout
        .iter()
        .filter(|c| !c.is_system_column)
        .map(|c| dd_storage_info_to_column(c))
        .collect();

    let mut clustered_refs = Vec::new();
    for info in &layout {
        let usage = if info.is_system_column {
            ColumnUsage::Sys
        } else if pk_positions
            .iter()
            .any(|&opx| dd.columns.get(opx as usize).map(|c| c.name.as_str()) == Some(info.name.as_str()))
        {
            ColumnUsage::Key
        } else {
            ColumnUsage::Row
        };
        clustered_refs.push(IndexColumnReference {
            column: dd_storage_info_to_column(info),
            usage,
        });
    }

    let pk_index = dd.indexes.iter().find(|i| i.index_type == 1);
    let mut indexes = vec![Index {
        name: pk_index.map(|i| i.name.clone()).unwrap_or_else(|| "PRIMARY".to_string()),
        table_id: 0,
        index_id: 0,
        space_id,
        root_page: 0,
        type_flags: IND_CLUSTERED | IND_UNIQUE,
        columns: clustered_refs,
    }];

    let key_column_names: Vec<String> = indexes[0]
        .columns
        .iter()
        .filter(|r| r.usage == ColumnUsage::Key)
        .map(|r| r.column.name.clone())
        .collect();

    for sec in dd.indexes.iter().filter(|i| i.index_type != 1) {
        let mut columns_ref = Vec::new();
        let mut own_key_names = Vec::new();
        for elem in &sec.elements {
            if elem.hidden {
                continue;
            }
            if let Some(dd_col) = dd.columns.get(elem.column_opx as usize) {
                if let Some(col) = table_columns.iter().find(|c| c.name == dd_col.name) {
                    own_key_names.push(col.name.clone());
                    columns_ref.push(IndexColumnReference {
                        column: col.clone(),
                        usage: ColumnUsage::Key,
                    });
                }
            }
        }
        for name in &key_column_names {
            if own_key_names.contains(name) {
                continue;
            }
            if let Some(col) = table_columns.iter().find(|c| &c.name == name) {
                columns_ref.push(IndexColumnReference {
                    column: col.clone(),
                    usage: ColumnUsage::Row,
                });
            }
        }
        indexes.push(Index {
            name: sec.name.clone(),
            table_id: 0,
            index_id: 0,
            space_id,
            root_page: 0,
            type_flags: if sec.index_type == 2 { IND_UNIQUE } else { 0 },
            columns: columns_ref,
        });
    }

    Table {
        name: dd.name.clone(),
        table_id: 0,
        space_id,
        columns: table_columns,
        indexes,
    }
}

fn dd_storage_info_to_column(info: &crate::innodb::field_decode::ColumnStorageInfo) -> Column {
    if info.is_system_column {
        return Column {
            name: info.name.clone(),
            mtype: 0,
            prtype: PRTYPE_NOT_NULL | PRTYPE_UNSIGNED,
            len: info.fixed_len as u32,
            prec: 0,
        };
    }
    let mtype = dd_type_to_mtype(info.dd_type, info.is_variable);
    let mut prtype = 0u32;
    if !info.is_nullable {
        prtype |= PRTYPE_NOT_NULL;
    }
    if info.is_unsigned {
        prtype |= PRTYPE_UNSIGNED;
    }
    let len = if info.is_variable {
        // variable-length columns: approximate the declared max width from
        // the charset's worst-case bytes-per-character; exact recovery
        // would require re-parsing `column_type_utf8`.
        (info.charset_max_bytes.max(1) * 255) as u32
    } else {
        info.fixed_len as u32
    };
    Column {
        name: info.name.clone(),
        mtype,
        prtype,
        len,
        prec: info.numeric_precision as u32,
    }
}

fn dd_type_to_mtype(dd_type: u64, is_variable: bool) -> u32 {
    // Mirrors the `compute_storage_size` classification in `field_decode`.
    match dd_type {
        2 | 3 | 4 | 5 | 9 => DATA_INT,       // TINY/SHORT/LONG/INT24/LONGLONG
        6 => DATA_FLOAT,
        7 => DATA_DOUBLE,
        20 => DATA_DECIMAL,
        16 => DATA_VARCHAR,                 // VARCHAR
        15 => DATA_CHAR,                    // CHAR (STRING)
        19 | 21 | 25 => DATA_BLOB,           // BLOB/TEXT, JSON, GEOMETRY
        13 | 14 | 17 | 18 => {
            if is_variable {
                DATA_VARMYSQL
            } else {
                DATA_MYSQL
            }
        }
        _ => DATA_BLOB,
    }
}

/// Build the whole dictionary from per-space SDI payloads already extracted
/// by the caller (one `DdTable` per user table tablespace, keyed by the
/// owning space id).
pub fn load_from_sdi(tables_by_space: HashMap<u32, DdTable>) -> DataDictionary {
    let mut tables = Vec::new();
    let mut tablespaces = Vec::new();
    for (space_id, dd) in tables_by_space {
        tablespaces.push(TablespaceRef {
            space_id,
            name: dd.name.clone(),
        });
        tables.push(table_from_sdi(&dd, space_id));
    }
    DataDictionary { tablespaces, tables }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sys_tables_primary_has_one_key_field() {
        let d = sys_tables_primary_describer();
        assert_eq!(d.key.len(), 1);
        assert_eq!(d.row.len(), 7);
        assert!(d.is_clustered());
    }

    #[test]
    fn sys_columns_primary_has_composite_key() {
        let d = sys_columns_primary_describer();
        assert_eq!(d.key.len(), 2);
        assert_eq!(d.row.len(), 5);
    }

    #[test]
    fn mtype_mapping_int() {
        let dt = mtype_prtype_to_data_type(DATA_INT, PRTYPE_UNSIGNED, 4, 0);
        match dt {
            DataType::Int { width, unsigned } => {
                assert_eq!(width, 4);
                assert!(unsigned);
            }
            other => panic!("expected Int, got {:?}", other),
        }
    }

    #[test]
    fn mtype_mapping_decimal_is_fixed_char() {
        let dt = mtype_prtype_to_data_type(DATA_DECIMAL, 0, 5, 2);
        match dt {
            DataType::Char { len } => assert_eq!(len, 5),
            other => panic!("expected Char, got {:?}", other),
        }
    }

    #[test]
    fn index_type_flags() {
        let idx = Index {
            name: "PRIMARY".to_string(),
            table_id: 1,
            index_id: 1,
            space_id: 5,
            root_page: 3,
            type_flags: IND_CLUSTERED | IND_UNIQUE,
            columns: Vec::new(),
        };
        assert!(idx.is_clustered());
        assert!(idx.is_unique());
        assert_eq!(idx.kind(), IndexKind::Clustered);
    }

    #[test]
    fn column_nullability_from_prtype() {
        let col = Column {
            name: "x".to_string(),
            mtype: DATA_INT,
            prtype: 0,
            len: 4,
            prec: 0,
        };
        assert!(col.is_nullable());
        let col_not_null = Column {
            prtype: PRTYPE_NOT_NULL,
            ..col
        };
        assert!(!col_not_null.is_nullable());
    }
}
