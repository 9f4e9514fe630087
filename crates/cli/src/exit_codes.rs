//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (unspecified)                           |
//! | 2    | CLI usage error (bad args, unknown setting)           |
//! | 3    | Merge config cannot be parsed or is invalid           |
//! | 4    | A source or override table cannot be merged           |
//! | 5    | File could not be read or written                     |
//! | 6    | Lookup name not found or ambiguous                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Merge config invalid (TOML syntax, unknown field, failed validation).
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A table lacks the entity or reference column, or has a bad header.
pub const EXIT_BAD_TABLE: u8 = 4;

/// Filesystem error reading inputs or writing outputs.
pub const EXIT_IO: u8 = 5;

/// `lookup` found no row, or several rows, for the given name.
pub const EXIT_LOOKUP: u8 = 6;
