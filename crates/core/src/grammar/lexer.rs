//! Lazy lexer — turns a character stream into a sequence of borrowed,
//! positioned tokens.
//!
//! [`Lexer`] is a pull-style iterator: each call to `next()` advances the
//! cursor by exactly one token's worth of input and borrows its text
//! straight out of the source, same as the reference tokenizer this was
//! grown from. The parser holds the one-slot push-back; the lexer itself
//! never looks back.

use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

use crate::config::{special_command_chars, CleanConfig};
use crate::position::{Position, ORIGIN};

/// Classification of a lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// A contiguous run of non-special, non-whitespace characters.
    Word(&'a str),
    /// One or more whitespace characters containing at most one newline.
    Whitespace,
    /// A whitespace run containing two or more newlines (a paragraph break).
    NewParagraph,
    /// `{`
    OpenBra,
    /// `}`
    CloseBra,
    /// `[`
    OpenSqBra,
    /// `]`
    CloseSqBra,
    /// `\` followed by an identifier run, or by a single special-command
    /// character. Does not include the leading `\`.
    CommandTok(&'a str),
}

/// A token with its source span. `Word`/`CommandTok` text borrows directly
/// from the lexer's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// This token's classification and borrowed payload, if any.
    pub kind: TokenKind<'a>,
    /// Position of this token's first character.
    pub src_start: Position,
    /// Position immediately after this token's last character.
    pub src_end: Position,
}

/// Turns source text into a lazy stream of [`Token`]s.
///
/// Owns its input exclusively for the duration of the scan; every token it
/// yields partitions the source exactly, except for `%`-comments, which are
/// skipped and contribute no token at all.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    pos: Position,
    ident_chars: HashSet<char>,
    special_chars: HashSet<char>,
    special_command_chars: HashSet<char>,
}

impl<'a> Lexer<'a> {
    /// Build a lexer over `input`, using `config`'s identifier/special
    /// character sets.
    pub fn new(input: &'a str, config: &CleanConfig) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            pos: ORIGIN,
            ident_chars: config.ident_chars.clone(),
            special_chars: config.special_chars.clone(),
            special_command_chars: special_command_chars(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.pos = self.pos.advance_char(ch);
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_comment(&mut self) {
        // Current char is '%'; discard through and including the next
        // newline, or through EOF if there is none.
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn lex_word(&mut self, start: Position) -> Token<'a> {
        loop {
            match self.peek() {
                Some(c) if !self.special_chars.contains(&c) && !c.is_whitespace() => {
                    self.bump();
                }
                _ => break,
            }
        }
        let text = &self.input[start.offset..self.pos.offset];
        Token {
            kind: TokenKind::Word(text),
            src_start: start,
            src_end: self.pos,
        }
    }

    /// A special character that widened `special_chars` (via
    /// [`CleanConfig::with_extra_special_chars`]) but has no dedicated
    /// bracket/command handling: it becomes its own one-character `Word`,
    /// never merged with a neighboring run.
    fn lex_one_char_word(&mut self, start: Position) -> Token<'a> {
        self.bump();
        let text = &self.input[start.offset..self.pos.offset];
        Token {
            kind: TokenKind::Word(text),
            src_start: start,
            src_end: self.pos,
        }
    }

    fn lex_whitespace(&mut self, start: Position) -> Token<'a> {
        let mut newlines = 0usize;
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            if c == '\n' {
                newlines += 1;
            }
            self.bump();
        }
        let kind = if newlines >= 2 {
            TokenKind::NewParagraph
        } else {
            TokenKind::Whitespace
        };
        Token {
            kind,
            src_start: start,
            src_end: self.pos,
        }
    }

    fn lex_command(&mut self, start: Position) -> Token<'a> {
        self.bump(); // the leading backslash
        let name_start = self.pos.offset;
        let mut consumed_ident = false;
        while let Some(c) = self.peek() {
            if self.ident_chars.contains(&c) {
                self.bump();
                consumed_ident = true;
            } else {
                break;
            }
        }
        if !consumed_ident {
            if let Some(c) = self.peek() {
                if self.special_command_chars.contains(&c) {
                    self.bump();
                }
            }
        }
        let name = &self.input[name_start..self.pos.offset];
        Token {
            kind: TokenKind::CommandTok(name),
            src_start: start,
            src_end: self.pos,
        }
    }

    fn single(&mut self, kind: TokenKind<'a>) -> Token<'a> {
        let start = self.pos;
        self.bump();
        Token {
            kind,
            src_start: start,
            src_end: self.pos,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let c = self.peek()?;
            if c == '%' {
                self.skip_comment();
                continue;
            }
            let start = self.pos;
            return Some(match c {
                '\\' => self.lex_command(start),
                '{' => self.single(TokenKind::OpenBra),
                '}' => self.single(TokenKind::CloseBra),
                '[' => self.single(TokenKind::OpenSqBra),
                ']' => self.single(TokenKind::CloseSqBra),
                c if c.is_whitespace() => self.lex_whitespace(start),
                c if self.special_chars.contains(&c) => self.lex_one_char_word(start),
                _ => self.lex_word(start),
            });
        }
    }
}
