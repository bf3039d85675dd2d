//! SDI (Serialized Dictionary Information) JSON deserialization.
//!
//! MySQL 8.0+ embeds complete table definitions (columns, indexes, foreign
//! keys) as SDI JSON inside every `.ibd` file and in `mysql.ibd`'s own
//! dictionary tables. This module parses that JSON into typed Rust structs;
//! [`crate::innodb::dictionary::table_from_sdi`] builds the object graph's
//! [`crate::innodb::dictionary::Table`] from the result.
//!
//! # Usage
//!
//! ```no_run
//! use innodb_dissect::innodb::tablespace::Tablespace;
//! use innodb_dissect::innodb::sdi::{find_sdi_pages, extract_sdi_from_pages};
//! use innodb_dissect::innodb::schema::SdiEnvelope;
//!
//! let mut ts = Tablespace::open("table.ibd").unwrap();
//! let sdi_pages = find_sdi_pages(&mut ts).unwrap();
//! let records = extract_sdi_from_pages(&mut ts, &sdi_pages).unwrap();
//! for rec in &records {
//!     if rec.sdi_type == 1 {
//!         let envelope: SdiEnvelope = serde_json::from_str(&rec.data).unwrap();
//!         println!("{}", envelope.dd_object.name);
//!     }
//! }
//! ```

use serde::Deserialize;

// ---------------------------------------------------------------------------
// SDI JSON deserialization structs
// ---------------------------------------------------------------------------

/// Top-level SDI envelope wrapping a dd_object.
#[derive(Debug, Deserialize)]
pub struct SdiEnvelope {
    /// MySQL server version ID (e.g., 90001 for 9.0.1).
    #[serde(default)]
    pub mysqld_version_id: u64,
    /// Object type: "Table" or "Tablespace".
    #[serde(default)]
    pub dd_object_type: String,
    /// The data dictionary object.
    #[serde(default)]
    pub dd_object: DdTable,
}

/// Data dictionary table definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdTable {
    /// Table name.
    #[serde(default)]
    pub name: String,
    /// Schema (database) name.
    #[serde(default)]
    pub schema_ref: String,
    /// Storage engine name.
    #[serde(default)]
    pub engine: String,
    /// Default collation ID.
    #[serde(default)]
    pub collation_id: u64,
    /// Row format code (1=FIXED, 2=DYNAMIC, 3=COMPRESSED, etc.).
    #[serde(default)]
    pub row_format: u64,
    /// Table comment.
    #[serde(default)]
    pub comment: String,
    /// Column definitions.
    #[serde(default)]
    pub columns: Vec<DdColumn>,
    /// Index definitions.
    #[serde(default)]
    pub indexes: Vec<DdIndex>,
    /// Foreign key definitions.
    #[serde(default)]
    pub foreign_keys: Vec<DdForeignKey>,
    /// MySQL server version ID.
    #[serde(default)]
    pub mysql_version_id: u64,
    /// Table hidden flag (1=visible for tables).
    #[serde(default)]
    pub hidden: u64,
}

/// Data dictionary column definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdColumn {
    /// Column name.
    #[serde(default)]
    pub name: String,
    /// dd_type code (internal MySQL type enumeration).
    #[serde(rename = "type", default)]
    pub dd_type: u64,
    /// SQL type string from MySQL (e.g., "varchar(255)", "int unsigned").
    #[serde(default)]
    pub column_type_utf8: String,
    /// Position in the column list (1-based).
    #[serde(default)]
    pub ordinal_position: u64,
    /// Hidden flag: 1=visible, 2=SE-hidden (DB_TRX_ID, DB_ROLL_PTR, DB_ROW_ID).
    #[serde(default)]
    pub hidden: u64,
    /// Whether the column allows NULL.
    #[serde(default)]
    pub is_nullable: bool,
    /// Whether the column is unsigned.
    #[serde(default)]
    pub is_unsigned: bool,
    /// Whether the column is AUTO_INCREMENT.
    #[serde(default)]
    pub is_auto_increment: bool,
    /// Whether the column is virtual (generated).
    #[serde(default)]
    pub is_virtual: bool,
    /// Character length.
    #[serde(default)]
    pub char_length: u64,
    /// Numeric precision.
    #[serde(default)]
    pub numeric_precision: u64,
    /// Numeric scale.
    #[serde(default)]
    pub numeric_scale: u64,
    /// Datetime fractional seconds precision.
    #[serde(default)]
    pub datetime_precision: u64,
    /// Collation ID for this column.
    #[serde(default)]
    pub collation_id: u64,
    /// Default value as UTF-8 string.
    #[serde(default)]
    pub default_value_utf8: String,
    /// Whether default_value_utf8 is NULL.
    #[serde(default)]
    pub default_value_utf8_null: bool,
    /// Whether the column has no default.
    #[serde(default)]
    pub has_no_default: bool,
    /// Default option (e.g., "CURRENT_TIMESTAMP").
    #[serde(default)]
    pub default_option: String,
    /// Update option (e.g., "CURRENT_TIMESTAMP").
    #[serde(default)]
    pub update_option: String,
    /// Generation expression (raw).
    #[serde(default)]
    pub generation_expression: String,
    /// Generation expression as UTF-8.
    #[serde(default)]
    pub generation_expression_utf8: String,
    /// ENUM/SET value elements.
    #[serde(default)]
    pub elements: Vec<DdColumnElement>,
    /// Column comment.
    #[serde(default)]
    pub comment: String,
    /// Whether the column is zerofill.
    #[serde(default)]
    pub is_zerofill: bool,
}

/// ENUM or SET value element.
#[derive(Debug, Default, Deserialize)]
pub struct DdColumnElement {
    /// The element name (value string).
    #[serde(default)]
    pub name: String,
}

/// Data dictionary index definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdIndex {
    /// Index name.
    #[serde(default)]
    pub name: String,
    /// Index type: 1=PRIMARY, 2=UNIQUE, 3=MULTIPLE (non-unique), 4=FULLTEXT, 5=SPATIAL.
    #[serde(rename = "type", default)]
    pub index_type: u64,
    /// Algorithm code (1=BTREE default, 2=BTREE explicit, 3=HASH, 4=RTREE, 5=FULLTEXT).
    #[serde(default)]
    pub algorithm: u64,
    /// Whether the index is hidden.
    #[serde(default)]
    pub hidden: bool,
    /// Index elements (columns).
    #[serde(default)]
    pub elements: Vec<DdIndexElement>,
    /// Index comment.
    #[serde(default)]
    pub comment: String,
    /// Whether the index is visible.
    #[serde(default)]
    pub is_visible: bool,
}

/// Data dictionary index element (column reference).
#[derive(Debug, Default, Deserialize)]
pub struct DdIndexElement {
    /// 0-based index into the columns array.
    #[serde(default)]
    pub column_opx: u64,
    /// Prefix length (4294967295 = full column).
    #[serde(default)]
    pub length: u64,
    /// Sort order: 2=ASC, 1=DESC.
    #[serde(default)]
    pub order: u64,
    /// Whether this element is hidden (internal).
    #[serde(default)]
    pub hidden: bool,
}

/// Data dictionary foreign key definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdForeignKey {
    /// Constraint name.
    #[serde(default)]
    pub name: String,
    /// Referenced table's schema name.
    #[serde(default)]
    pub referenced_table_schema_name: String,
    /// Referenced table name.
    #[serde(default)]
    pub referenced_table_name: String,
    /// ON UPDATE rule (0=NO ACTION, 1=RESTRICT, 2=CASCADE, 3=SET NULL, 4=SET DEFAULT).
    #[serde(default)]
    pub update_rule: u64,
    /// ON DELETE rule (same codes as update_rule).
    #[serde(default)]
    pub delete_rule: u64,
    /// Foreign key elements (column mappings).
    #[serde(default)]
    pub elements: Vec<DdForeignKeyElement>,
}

/// Data dictionary foreign key element (column mapping).
#[derive(Debug, Default, Deserialize)]
pub struct DdForeignKeyElement {
    /// 0-based index into the table's columns array.
    #[serde(default)]
    pub column_opx: u64,
    /// Name of the referenced column.
    #[serde(default)]
    pub referenced_column_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdi_envelope_parses_table_and_filters_nothing() {
        let json = r#"{
            "mysqld_version_id": 90001,
            "dd_object_type": "Table",
            "dd_object": {
                "name": "users",
                "schema_ref": "myapp",
                "engine": "InnoDB",
                "collation_id": 255,
                "row_format": 2,
                "columns": [
                    {
                        "name": "id",
                        "type": 4,
                        "column_type_utf8": "int unsigned",
                        "ordinal_position": 1,
                        "hidden": 1,
                        "is_nullable": false,
                        "is_auto_increment": true
                    },
                    {
                        "name": "email",
                        "type": 16,
                        "column_type_utf8": "varchar(255)",
                        "ordinal_position": 2,
                        "hidden": 1,
                        "is_nullable": false
                    },
                    {
                        "name": "DB_TRX_ID",
                        "type": 10,
                        "ordinal_position": 3,
                        "hidden": 2
                    },
                    {
                        "name": "DB_ROLL_PTR",
                        "type": 9,
                        "ordinal_position": 4,
                        "hidden": 2
                    }
                ],
                "indexes": [
                    {
                        "name": "PRIMARY",
                        "type": 1,
                        "hidden": false,
                        "is_visible": true,
                        "elements": [
                            { "column_opx": 0, "hidden": false, "length": 4, "order": 2 },
                            { "column_opx": 2, "hidden": true, "length": 4294967295, "order": 2 },
                            { "column_opx": 3, "hidden": true, "length": 4294967295, "order": 2 }
                        ]
                    },
                    {
                        "name": "idx_email",
                        "type": 2,
                        "hidden": false,
                        "is_visible": true,
                        "elements": [
                            { "column_opx": 1, "hidden": false, "length": 4294967295, "order": 2 },
                            { "column_opx": 0, "hidden": true, "length": 4294967295, "order": 2 }
                        ]
                    }
                ],
                "foreign_keys": []
            }
        }"#;

        let envelope: SdiEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.mysqld_version_id, 90001);
        assert_eq!(envelope.dd_object_type, "Table");

        let dd = &envelope.dd_object;
        assert_eq!(dd.name, "users");
        assert_eq!(dd.schema_ref, "myapp");
        assert_eq!(dd.columns.len(), 4);
        assert_eq!(dd.columns[0].name, "id");
        assert!(dd.columns[0].is_auto_increment);
        assert_eq!(dd.indexes.len(), 2);
        assert_eq!(dd.indexes[0].name, "PRIMARY");
        assert_eq!(dd.indexes[0].elements.len(), 3);
        assert_eq!(dd.indexes[1].elements[0].column_opx, 1);
    }

    #[test]
    fn test_sdi_envelope_parses_foreign_keys() {
        let json = r#"{
            "mysqld_version_id": 80040,
            "dd_object_type": "Table",
            "dd_object": {
                "name": "orders",
                "schema_ref": "shop",
                "engine": "InnoDB",
                "collation_id": 255,
                "row_format": 2,
                "columns": [],
                "indexes": [],
                "foreign_keys": [
                    {
                        "name": "fk_orders_user",
                        "referenced_table_schema_name": "shop",
                        "referenced_table_name": "users",
                        "update_rule": 0,
                        "delete_rule": 2,
                        "elements": [
                            { "column_opx": 1, "referenced_column_name": "id" }
                        ]
                    }
                ]
            }
        }"#;

        let envelope: SdiEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.dd_object.foreign_keys.len(), 1);
        let fk = &envelope.dd_object.foreign_keys[0];
        assert_eq!(fk.name, "fk_orders_user");
        assert_eq!(fk.referenced_table_name, "users");
        assert_eq!(fk.delete_rule, 2);
        assert_eq!(fk.elements[0].referenced_column_name, "id");
    }

    #[test]
    fn test_sdi_envelope_defaults_on_missing_fields() {
        let json = r#"{"dd_object": {"name": "bare"}}"#;
        let envelope: SdiEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.mysqld_version_id, 0);
        assert_eq!(envelope.dd_object.name, "bare");
        assert!(envelope.dd_object.columns.is_empty());
        assert!(envelope.dd_object.indexes.is_empty());
    }
}
