//! `exofile-core`: the tabular container shared by the merge engine and its
//! collaborators.
//!
//! A [`Table`] is an ordered set of named columns of nullable values, each
//! column carrying a unit and a description. It knows nothing
//! about entities, references or merging.

pub mod error;
pub mod table;
pub mod units;
pub mod value;

pub use error::TableError;
pub use table::{Column, Table};
pub use value::{ColumnMeta, Value};
