//! Recursive-descent parser (C4): turns a [`Lexer`] token stream into an
//! [`Node::Root`].
//!
//! The grammar needs no lookahead beyond one token: every production pulls a
//! token, dispatches on its kind, and recurses. The one irregularity is the
//! one-slot push-back a candidate pull can need (a `PlainText` sentinel
//! degrading to one character, or a fully-resolved `Group`/`Command` that
//! arrived one too many for a command's arity) — see [`Pushback`].

use std::path::{Path, PathBuf};

use detex_catalog::CommandCatalog;

use crate::config::CleanConfig;
use crate::error::{Error, Result};
use crate::grammar::ast::{Node, NodeKind};
use crate::grammar::lexer::{Lexer, Token, TokenKind};
use crate::position::{Position, ORIGIN};

/// A fully-resolved node, or a `CloseBra` that a caller still needs to act on
/// (it may be the bracket that ends the current body, or it may be a stray
/// extra one to reject).
enum Pulled<'a> {
    Node(Node),
    CloseBra(Token<'a>),
}

/// What's been pulled ahead and not yet consumed.
enum Pushback<'a> {
    Node(Node),
    CloseBra(Token<'a>),
}

/// Parses one source (or transcluded sub-source) into a [`Node::Root`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pushback: Option<Pushback<'a>>,
    catalog: &'a CommandCatalog,
    config: &'a CleanConfig,
    filename: String,
    base_dir: PathBuf,
}

impl<'a> Parser<'a> {
    /// Build a parser over `input`. `filename` names the file for `\input`
    /// error messages and the resulting `Root`; `base_dir` is where a
    /// relative `\input{path}` in this file resolves from.
    pub fn new(
        input: &'a str,
        catalog: &'a CommandCatalog,
        config: &'a CleanConfig,
        filename: impl Into<String>,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            lexer: Lexer::new(input, config),
            pushback: None,
            catalog,
            config,
            filename: filename.into(),
            base_dir,
        }
    }

    /// Parse the whole input as a top-level document.
    pub fn parse_root(&mut self) -> Result<Node> {
        let (elems, _) = self.parse_body(0)?;
        let start = elems.first().map(|n| n.src_start).unwrap_or(ORIGIN);
        let end = elems.last().map(|n| n.src_end).unwrap_or(ORIGIN);
        Ok(Node::root(self.filename.clone(), elems, start, end))
    }

    /// Pull the next fully-resolved item, honoring the push-back slot.
    /// `depth` is the brace nesting of the context this pull occurs in (used
    /// if it needs to recurse into a `Group`).
    fn pull_one(&mut self, depth: usize) -> Result<Option<Pulled<'a>>> {
        if let Some(pb) = self.pushback.take() {
            return Ok(Some(match pb {
                Pushback::Node(n) => Pulled::Node(n),
                Pushback::CloseBra(t) => Pulled::CloseBra(t),
            }));
        }
        match self.lexer.next() {
            None => Ok(None),
            Some(tok) => self.resolve_token(tok, depth).map(Some),
        }
    }

    fn push_back(&mut self, pulled: Pulled<'a>) {
        self.pushback = Some(match pulled {
            Pulled::Node(n) => Pushback::Node(n),
            Pulled::CloseBra(t) => Pushback::CloseBra(t),
        });
    }

    /// Turn one raw token into a `Pulled` value, recursing for `OpenBra` and
    /// `CommandTok`.
    fn resolve_token(&mut self, tok: Token<'a>, depth: usize) -> Result<Pulled<'a>> {
        match tok.kind {
            TokenKind::Word(w) => Ok(Pulled::Node(Node::plain_text(
                w,
                tok.src_start,
                tok.src_end,
            ))),
            TokenKind::Whitespace => Ok(Pulled::Node(Node::plain_text(
                " ",
                tok.src_start,
                tok.src_end,
            ))),
            TokenKind::NewParagraph => {
                Ok(Pulled::Node(Node::new_paragraph(tok.src_start, tok.src_end)))
            }
            TokenKind::OpenSqBra | TokenKind::CloseSqBra => {
                Ok(Pulled::Node(Node::blank(tok.src_start, tok.src_end)))
            }
            TokenKind::CloseBra => Ok(Pulled::CloseBra(tok)),
            TokenKind::OpenBra => {
                let (elems, close_end) = self.parse_body(depth + 1)?;
                Ok(Pulled::Node(Node::group(elems, tok.src_start, close_end)))
            }
            TokenKind::CommandTok(name) => self.parse_command(name, tok, depth).map(Pulled::Node),
        }
    }

    /// Consume nodes until a `CloseBra` (at `depth > 0`) or end of stream (at
    /// `depth == 0`). Returns the body's elements and the position just past
    /// its terminator (or just past the last element, at top level).
    fn parse_body(&mut self, depth: usize) -> Result<(Vec<Node>, Position)> {
        let mut elems = Vec::new();
        loop {
            match self.pull_one(depth)? {
                None => {
                    if depth > 0 {
                        return Err(Error::UnpairedBracket(
                            elems.last().map(|n: &Node| n.src_end).unwrap_or(ORIGIN),
                        ));
                    }
                    let end = elems.last().map(|n| n.src_end).unwrap_or(ORIGIN);
                    return Ok((elems, end));
                }
                Some(Pulled::CloseBra(tok)) => {
                    if depth == 0 {
                        return Err(Error::UnpairedBracket(tok.src_start));
                    }
                    return Ok((elems, tok.src_end));
                }
                Some(Pulled::Node(node)) => elems.push(node),
            }
        }
    }

    /// Build a `Command` node: fetch the prototype, bind its arguments, and
    /// span `[cmd.src_start, last_arg.src_end or cmd.src_end]`.
    fn parse_command(&mut self, name: &'a str, tok: Token<'a>, depth: usize) -> Result<Node> {
        if name == "input" {
            return self.parse_input(tok, depth);
        }
        let prototype = self.catalog.get(name).clone();
        let narg = prototype.expected_narg();
        let args = self.bind_args(name, narg, depth)?;
        let end = args.last().map(|a| a.src_end).unwrap_or(tok.src_end);
        Ok(Node::command(name, prototype, args, tok.src_start, end))
    }

    /// Bind up to `narg` argument nodes for the command `name`, per §4.4's
    /// argument-binding rules.
    fn bind_args(&mut self, name: &str, narg: usize, depth: usize) -> Result<Vec<Node>> {
        if narg == 0 {
            return Ok(Vec::new());
        }
        let mut args: Vec<Node> = Vec::new();
        loop {
            let pulled = match self.pull_one(depth) {
                Ok(None) => break,
                Ok(Some(p)) => p,
                // An unclosed brace surfaced while resolving a candidate for
                // this command's own arguments: attribute it to the command,
                // not to the bracket.
                Err(Error::UnpairedBracket(_)) => {
                    return Err(Error::UnexpectedEndOfFile {
                        name: name.to_string(),
                    });
                }
                Err(e) => return Err(e),
            };
            if args.len() == narg {
                // Already have everything this command asked for; whatever
                // we just pulled belongs to the enclosing body.
                self.push_back(pulled);
                break;
            }
            match pulled {
                Pulled::Node(node)
                    if matches!(node.kind, NodeKind::Group(_) | NodeKind::Command { .. }) =>
                {
                    args.push(node);
                }
                Pulled::Node(node) if matches!(node.kind, NodeKind::PlainText(_)) => {
                    self.bind_plaintext_sentinel(node, &mut args);
                    break;
                }
                other => {
                    self.push_back(other);
                    break;
                }
            }
        }
        Ok(args)
    }

    /// A `PlainText` sentinel stopped argument binding with fewer than `k`
    /// args bound. Degrade it: a leading non-whitespace character becomes one
    /// more argument, with the remainder (if any) pushed back; whitespace is
    /// pushed back whole.
    fn bind_plaintext_sentinel(&mut self, node: Node, args: &mut Vec<Node>) {
        let Node {
            src_start,
            src_end,
            kind,
            ..
        } = node;
        let NodeKind::PlainText(content) = kind else {
            unreachable!("bind_plaintext_sentinel called on a non-PlainText node")
        };
        let mut chars = content.chars();
        let first = chars.next().expect("PlainText content is never empty");
        if first.is_whitespace() {
            self.pushback = Some(Pushback::Node(Node::plain_text(content, src_start, src_end)));
            return;
        }
        let first_len = first.len_utf8();
        let split = src_start.advance_char(first);
        args.push(Node::plain_text(first.to_string(), src_start, split));
        let rest = content[first_len..].to_string();
        if !rest.is_empty() {
            self.pushback = Some(Pushback::Node(Node::plain_text(rest, split, src_end)));
        }
    }

    /// `\input{path}`: the next node must be a `Group` whose first child is
    /// `PlainText` naming the file. Always yields a `Blank` spanning the
    /// command and its argument group; when `config.expand_input` is set,
    /// the transcluded file's own `Root` is parsed and pushed back so the
    /// enclosing body picks it up as its next element.
    fn parse_input(&mut self, input_tok: Token<'a>, depth: usize) -> Result<Node> {
        let pulled = match self.pull_one(depth) {
            Ok(p) => p,
            Err(Error::UnpairedBracket(_)) => {
                return Err(Error::UnexpectedEndOfFile {
                    name: "input".to_string(),
                });
            }
            Err(e) => return Err(e),
        };
        let group_node = match pulled {
            Some(Pulled::Node(node)) if matches!(node.kind, NodeKind::Group(_)) => node,
            Some(other) => {
                self.push_back(other);
                return Ok(Node::blank(input_tok.src_start, input_tok.src_end));
            }
            None => return Ok(Node::blank(input_tok.src_start, input_tok.src_end)),
        };
        let path_str = match &group_node.kind {
            NodeKind::Group(elems) => elems.first().and_then(|n| match &n.kind {
                NodeKind::PlainText(s) => Some(s.clone()),
                _ => None,
            }),
            _ => None,
        };
        let Some(path_str) = path_str else {
            let end = group_node.src_end;
            self.push_back(Pulled::Node(group_node));
            return Ok(Node::blank(input_tok.src_start, end));
        };
        let blank_end = group_node.src_end;
        if !self.config.expand_input {
            return Ok(Node::blank(input_tok.src_start, blank_end));
        }
        let resolved = self.base_dir.join(&path_str);
        let content = std::fs::read_to_string(&resolved).map_err(|source| Error::Io {
            path: resolved.clone(),
            source,
        })?;
        let sub_base = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());
        let sub_root = Parser::new(
            &content,
            self.catalog,
            self.config,
            resolved.to_string_lossy().into_owned(),
            sub_base,
        )
        .parse_root()?;
        self.push_back(Pulled::Node(sub_root));
        Ok(Node::blank(input_tok.src_start, blank_end))
    }
}

/// Parse `input` into a `Root` node, as if it were the top-level document
/// named `filename`, resolving any `\input` it contains relative to
/// `base_dir`.
pub fn parse_str(
    input: &str,
    catalog: &CommandCatalog,
    config: &CleanConfig,
    filename: impl Into<String>,
    base_dir: PathBuf,
) -> Result<Node> {
    Parser::new(input, catalog, config, filename, base_dir).parse_root()
}
