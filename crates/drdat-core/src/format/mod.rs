//! DrDat binary format decoding.
//!
//! The module follows a layered structure:
//! - `layout`: field sizes and fixed values (source of truth)
//! - `reader`: bounds-checked little-endian cursor
//! - `parser`: header validation, descriptors, samples and reshape
//! - `error`: explicit, actionable errors
//!
//! Decoding is pure and contains no I/O; the `source` module handles file
//! access.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::DecodeError;
pub use parser::{DatDecoder, decode, read_descriptors};
