//! Reference dataset loading.
//!
//! The tug requirement table is a loosely structured comma-separated file
//! maintained by hand. This module turns its raw text into an immutable
//! `Dataset` snapshot:
//!
//! - `table`: splits raw text into trimmed rows, dropping placeholder rows
//! - `header`: resolves logical columns from header aliases
//! - `loader`: builds `Band` records and the sorted location list

pub mod error;
pub mod header;
pub mod loader;
pub mod table;

pub use error::ParseError;
pub use header::{Column, ColumnMap};
pub use loader::{parse_bands, Dataset};
pub use table::split_rows;
