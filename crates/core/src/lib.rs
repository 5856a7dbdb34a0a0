//! LaTeX-like markup stripper core library.
//!
//! Cleans LaTeX-like markup out of text and, alongside the cleaned text,
//! builds a bidirectional position map back to the original source. The main
//! entry points are [`parse_str`] for parsing, [`render`] for producing the
//! cleaned text, and [`RootPosMap::build`] for the position map.

#![warn(missing_docs)]

/// Position algebra used throughout parsing, rendering, and the position map.
pub mod position;
/// Cleaning configuration: identifier/special characters, `\input` expansion.
pub mod config;
/// Error taxonomy and its conversion into diagnostics.
pub mod error;
/// Grammar: lexer, parser, AST, renderer, and position map.
pub mod grammar;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Position algebra
pub use position::{Delta, Position, PositionError, ORIGIN};

// Configuration
pub use config::CleanConfig;

// Errors (diagnostics re-exported from the diagnostics crate via `error`)
pub use error::{Error, Result};

// Lexer
pub use grammar::lexer::{Lexer, Token, TokenKind};

// AST
pub use grammar::ast::{Node, NodeKind, ResSpan};

// Parser
pub use grammar::parser::{parse_str, Parser};

// Renderer
pub use grammar::render::render;

// Position map
pub use grammar::posmap::{ContiguousPosMap, MapEntryJson, Rel, RootPosMap};
