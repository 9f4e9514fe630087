// File I/O operations

pub mod csv;
pub mod error;
pub mod json;
pub mod sheet;

pub use error::{IoError, IoResult};
