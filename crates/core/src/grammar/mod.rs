/// Parsed tree: one tagged [`ast::Node`] variant per grammar production.
pub mod ast;
/// Lazy tokenizer — turns source text into a borrowed token stream.
pub mod lexer;
/// Recursive-descent parser — turns tokens into an [`ast::Node`] tree.
pub mod parser;
/// Bidirectional source/result position map built from a parsed tree.
pub mod posmap;
/// Single-pass renderer — walks a parsed tree into cleaned output text.
pub mod render;
