//! `exofile-merge` builds one row per planet from several overlapping
//! source tables.
//!
//! Pure engine crate: receives materialised [`exofile_core::Table`]s, returns
//! a [`MergedTable`]. No file or network access.
//!
//! Pipeline: [`sanitize`] each source, [`rank`] the references of every
//! entity, fill consistency groups ([`group`]) and plain columns
//! ([`resolve`]), assemble the table ([`engine`]), then patch it with
//! [`overrides`].

pub mod config;
pub mod engine;
pub mod error;
pub mod group;
pub mod model;
pub mod overrides;
pub mod rank;
pub mod resolve;
pub mod sanitize;

pub use config::MergeConfig;
pub use engine::{merge, run};
pub use error::{MergeError, MergeResult};
pub use model::{MergeReport, MergedTable, SourceTable};
pub use overrides::{apply_overrides, OverrideEntry, OverrideSource};
