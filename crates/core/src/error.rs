//! The core crate's error taxonomy: one variant per §7 error kind, each
//! carrying the positions/names it needs, converting losslessly into a
//! [`Diagnostic`] for display.

use std::collections::BTreeMap;
use std::path::PathBuf;

use detex_catalog::CatalogError;
use detex_diagnostics::{codes, Diagnostic, Span};
use thiserror::Error;

use crate::position::{Position, PositionError};

/// Every fatal error the core pipeline (lexer, parser, transclusion driver)
/// can raise, plus the catalog-loading kinds it can propagate from a caller
/// that wired catalog loading in before invoking the parser.
#[derive(Debug, Error)]
pub enum Error {
    /// Arithmetic on positions violated monotonicity; a programmer error.
    #[error("position arithmetic violated monotonicity")]
    OutOfRange,
    /// A stray `}` at depth 0, or end of file with unclosed `{`.
    #[error("unpaired bracket at offset {}", .0.offset)]
    UnpairedBracket(Position),
    /// End of file while argument-binding a command that needed more input.
    #[error("unexpected end of file while binding arguments for `{name}`")]
    UnexpectedEndOfFile {
        /// The command whose argument binding was cut short.
        name: String,
    },
    /// A command's template references a `%N` beyond its declared arity.
    #[error(
        "template for command `{name}` references %{n}, but it takes only {expected_narg} argument(s)"
    )]
    BrokenTemplate {
        /// The offending command's name.
        name: String,
        /// The out-of-range placeholder index.
        n: usize,
        /// The command's declared arity.
        expected_narg: usize,
    },
    /// A catalog file's structure does not match the documented shape.
    #[error("catalog file is ill-formed: {reason}")]
    IllformedCatalog {
        /// What about the file was wrong.
        reason: String,
    },
    /// `dest_to_src_interval`'s two endpoints resolved to different files.
    #[error("destination interval endpoints resolve to different source files")]
    IntervalOnTwoFiles,
    /// A nested-root lookup named a file absent from the position map.
    #[error("no transcluded file named `{0}` appears in the position map")]
    FileNotFound(String),
    /// Catalog discovery walked the whole search path and found nothing.
    #[error("no command catalog file was found on the search path")]
    NoCommandFileFound,
    /// A transcluded file could not be read.
    #[error("failed to read transcluded file {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<PositionError> for Error {
    fn from(_: PositionError) -> Self {
        Error::OutOfRange
    }
}

impl From<CatalogError> for Error {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::BrokenTemplate {
                name,
                n,
                expected_narg,
            } => Error::BrokenTemplate {
                name,
                n,
                expected_narg,
            },
            CatalogError::IllformedCatalog { reason } => Error::IllformedCatalog { reason },
            CatalogError::NoCommandFileFound => Error::NoCommandFileFound,
            CatalogError::Io { path, source } => Error::Io { path, source },
        }
    }
}

impl Error {
    /// Convert this error into a [`Diagnostic`] for display, losslessly:
    /// every piece of positional/name information this error carries ends
    /// up in either `span` or `context`.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::OutOfRange => Diagnostic::error(codes::OUT_OF_RANGE, self.to_string(), None),
            Error::UnpairedBracket(pos) => Diagnostic::error(
                codes::UNPAIRED_BRACKET,
                self.to_string(),
                Some(Span::empty(pos.offset)),
            ),
            Error::UnexpectedEndOfFile { name } => {
                Diagnostic::error(codes::UNEXPECTED_EOF, self.to_string(), None).with_context(
                    BTreeMap::from([("name".to_string(), name.clone())]),
                )
            }
            Error::BrokenTemplate {
                name,
                n,
                expected_narg,
            } => Diagnostic::error(codes::BROKEN_TEMPLATE, self.to_string(), None).with_context(
                BTreeMap::from([
                    ("name".to_string(), name.clone()),
                    ("n".to_string(), n.to_string()),
                    ("expected_narg".to_string(), expected_narg.to_string()),
                ]),
            ),
            Error::IllformedCatalog { reason } => Diagnostic::error(
                codes::ILLFORMED_CATALOG,
                self.to_string(),
                None,
            )
            .with_context(BTreeMap::from([("reason".to_string(), reason.clone())])),
            Error::IntervalOnTwoFiles => {
                Diagnostic::error(codes::INTERVAL_ON_TWO_FILES, self.to_string(), None)
            }
            Error::FileNotFound(name) => Diagnostic::error(codes::FILE_NOT_FOUND, self.to_string(), None)
                .with_context(BTreeMap::from([("filename".to_string(), name.clone())])),
            Error::NoCommandFileFound => {
                Diagnostic::error(codes::NO_COMMAND_FILE_FOUND, self.to_string(), None)
            }
            Error::Io { path, .. } => Diagnostic::error(codes::NOTE, self.to_string(), None)
                .with_context(BTreeMap::from([(
                    "path".to_string(),
                    path.display().to_string(),
                )])),
        }
    }
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::ORIGIN;

    #[test]
    fn unpaired_bracket_carries_span() {
        let err = Error::UnpairedBracket(ORIGIN + 5);
        let diag = err.to_diagnostic();
        assert_eq!(diag.id, codes::UNPAIRED_BRACKET);
        assert_eq!(diag.span, Some(Span::empty(5)));
    }

    #[test]
    fn broken_template_carries_context() {
        let err = Error::BrokenTemplate {
            name: "title".to_string(),
            n: 3,
            expected_narg: 1,
        };
        let diag = err.to_diagnostic();
        let ctx = diag.context.unwrap();
        assert_eq!(ctx.get("name").unwrap(), "title");
        assert_eq!(ctx.get("n").unwrap(), "3");
    }

    #[test]
    fn catalog_error_converts_losslessly() {
        let catalog_err = CatalogError::BrokenTemplate {
            name: "x".to_string(),
            n: 2,
            expected_narg: 1,
        };
        let err: Error = catalog_err.into();
        assert!(matches!(err, Error::BrokenTemplate { n: 2, .. }));
    }
}
