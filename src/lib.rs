//! Builds a typed SELECT / UNION syntax tree from pre-split SQL tokens.

pub mod error;
pub mod sql;

pub use error::{Error, Result};
pub use sql::{parse, parse_with, ParseOptions, Query};
