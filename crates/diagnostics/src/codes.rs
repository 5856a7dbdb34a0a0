//! Diagnostic ID constants, one per error kind raised by the core parser
//! and the catalog loader.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete.

/// Arithmetic on positions violated monotonicity (programmer error).
pub const OUT_OF_RANGE: &str = "out-of-range";
/// A stray closing bracket at depth 0, or end of file at depth > 0.
pub const UNPAIRED_BRACKET: &str = "unpaired-bracket";
/// End of file while argument-binding a command that demanded more than 0 args.
pub const UNEXPECTED_EOF: &str = "unexpected-eof";
/// A command template references a `%N` placeholder beyond its arity.
pub const BROKEN_TEMPLATE: &str = "broken-template";
/// A catalog file's structure does not match the documented shape.
pub const ILLFORMED_CATALOG: &str = "illformed-catalog";
/// A destination interval's endpoints resolve to different source files.
pub const INTERVAL_ON_TWO_FILES: &str = "interval-on-two-files";
/// A nested-root lookup named a file absent from the position map.
pub const FILE_NOT_FOUND: &str = "file-not-found";
/// Catalog discovery found no catalog file anywhere on the search path.
pub const NO_COMMAND_FILE_FOUND: &str = "no-command-file-found";
/// Generic informational note, not tied to one of the fixed error kinds.
pub const NOTE: &str = "note";

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    Some(match id {
        OUT_OF_RANGE => {
            "a position subtraction or addition would produce a position before the origin"
        }
        UNPAIRED_BRACKET => "a `}` has no matching `{`, or a `{` is never closed",
        UNEXPECTED_EOF => "the input ended while a command was still waiting for arguments",
        BROKEN_TEMPLATE => "a command's expansion template references an argument index \
             it does not have",
        ILLFORMED_CATALOG => "a command catalog file does not match the documented \
             print_last/print_name/discard/other shape",
        INTERVAL_ON_TWO_FILES => {
            "the two endpoints of a destination interval map back to different source files"
        }
        FILE_NOT_FOUND => "no transcluded file with this name appears in the position map",
        NO_COMMAND_FILE_FOUND => "catalog discovery walked the whole search path and found nothing",
        NOTE => "informational note",
        _ => return None,
    })
}
