//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts branch on these values, so treat them as a stable interface.
//!
//! # Exit Codes
//!
//! | Code | Domain    | Description                                    |
//! |------|-----------|------------------------------------------------|
//! | 0    | Universal | Success                                        |
//! | 1    | Universal | General error (unspecified)                    |
//! | 2    | Universal | CLI usage error (bad args, unknown scorer)     |
//! | 3    | match     | Invalid config or column mapping               |
//! | 4    | match     | Runtime error (IO, CSV, scorer)                |
//! | 5    | match     | `--fail-on-unmatched` and a left record is unmatched |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Match (3-9)
// =============================================================================

/// Config failed to parse or validate, or a mapped column is missing from a CSV header.
pub const EXIT_MATCH_INVALID_CONFIG: u8 = 3;

/// Could not read inputs, write outputs, or score.
pub const EXIT_MATCH_RUNTIME: u8 = 4;

/// Matching finished but at least one left record has no partner
/// (only with `--fail-on-unmatched`).
pub const EXIT_MATCH_UNMATCHED: u8 = 5;
