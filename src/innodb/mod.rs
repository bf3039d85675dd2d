//! InnoDB binary format parsing.
//!
//! This module contains types and functions for reading the on-disk structures
//! used by MySQL's InnoDB storage engine, including page headers/trailers,
//! B+Tree index pages, checksum validation, SDI metadata, redo log records,
//! undo log pages, LOB (large object) pages, and tablespace-level metadata.
//!
//! Start with [`tablespace::Tablespace`] to open a `.ibd` file, or
//! [`system::System`] to open a whole data directory.

pub mod btree;
pub mod checksum;
pub mod constants;
pub mod cursor;
pub mod describer;
pub mod dictionary;
pub mod field;
pub mod field_decode;
pub mod index;
pub mod inode;
pub mod list;
pub mod lob;
pub mod log;
pub mod page;
pub mod page_types;
pub mod record;
pub mod schema;
pub mod sdi;
pub mod system;
pub mod tablespace;
pub mod undo;
pub mod vendor;
pub mod xdes;
