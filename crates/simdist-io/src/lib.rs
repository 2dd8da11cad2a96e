//! simdist-io - Data I/O for similarity score tables
//!
//! This crate loads delimited text files into memory:
//!
//! - **CSV / TSV**: header row, type inference over the leading rows
//! - **SimilarityTable**: an id-indexed view over one numeric score column
//!
//! # Design
//!
//! Readers implement the `DataReader` trait for uniform access, and
//! `SimilarityTable::from_reader` builds the analysis table from any of them.

pub mod reader;
pub mod schema;
pub mod table;

#[cfg(feature = "csv")]
pub mod csv_reader;

#[cfg(feature = "csv")]
pub mod writer;

pub use reader::*;
pub use schema::*;
pub use table::*;

#[cfg(feature = "csv")]
pub use writer::write_csv;
