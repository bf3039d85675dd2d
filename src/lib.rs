//! Offline InnoDB file decoder.
//!
//! `innodb-dissect` reads InnoDB-style tablespace files (`.ibd`), the system
//! tablespace (`ibdata1`), redo log files, and undo/rollback segments without
//! a running server and without mutating anything on disk. It is a read-only
//! library: there is no write path, no crash recovery, and no CLI.
//!
//! ## Quick example
//!
//! ```no_run
//! use innodb_dissect::innodb::tablespace::Tablespace;
//! use innodb_dissect::innodb::checksum::validate_checksum;
//! use innodb_dissect::innodb::page::FilHeader;
//!
//! // Page size is auto-detected from page 0.
//! let mut ts = Tablespace::open("table.ibd").unwrap();
//!
//! let page = ts.read_page(0).unwrap();
//! let header = FilHeader::parse(&page).unwrap();
//! println!("Page type: {}", header.page_type);
//!
//! let result = validate_checksum(&page, ts.page_size(), None);
//! println!("Checksum valid: {}", result.valid);
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`innodb::cursor`] | Big-endian buffer cursor, compressed-integer codecs |
//! | [`innodb::tablespace`] | File I/O, page size detection, multi-file spaces, page iteration |
//! | [`innodb::page`] | FIL header/trailer, FSP header parsing |
//! | [`innodb::page_types`] | Page type enum with names and descriptions |
//! | [`innodb::xdes`] | Extent descriptor entries and per-page status |
//! | [`innodb::list`] | Intrusive base-node/list-node traversal |
//! | [`innodb::inode`] | File segment (FSEG) inode entries |
//! | [`innodb::checksum`] | CRC-32C, legacy InnoDB, and MariaDB full\_crc32 checksums |
//! | [`innodb::index`] | INDEX page internals (B+Tree header, page directory, FSEG) |
//! | [`innodb::btree`] | B+tree traversal across index pages |
//! | [`innodb::record`] | Row-level record parsing (compact and redundant formats) |
//! | [`innodb::describer`] | Record describers and data type registry |
//! | [`innodb::field`] | Typed field values, including externally-stored columns |
//! | [`innodb::dictionary`] | SYS_* internal data dictionary |
//! | [`innodb::schema`] | SDI (Serialized Dictionary Information) data dictionary |
//! | [`innodb::sdi`] | SDI metadata page extraction and decompression |
//! | [`innodb::log`] | Redo log file structure, block parsing, log records |
//! | [`innodb::undo`] | Undo log pages, undo records, rollback history |
//! | [`innodb::lob`] | Large object (BLOB/LOB) page chain walking |
//! | [`innodb::vendor`] | Vendor detection (MySQL, Percona, MariaDB) and format info |
//! | [`innodb::constants`] | InnoDB page/file structure constants |
//! | [`innodb::system`] | Data directory discovery: tablespaces, dictionary, logs |

pub mod error;
pub mod innodb;
pub mod util;

pub use error::DissectError;
