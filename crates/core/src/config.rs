//! Knobs a caller sets before invoking the lex/parse/render pipeline.

use std::collections::HashSet;

/// Default identifier characters for command names: ASCII letters, digits,
/// and `-`, `+`, `*`.
fn default_ident_chars() -> HashSet<char> {
    let mut set: HashSet<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    set.extend(['-', '+', '*']);
    set
}

/// Default special characters: these end a `Word` run and are never part
/// of an identifier. `\`, `{`, `}`, `%`, `[`, `]`.
fn default_special_chars() -> HashSet<char> {
    HashSet::from(['\\', '{', '}', '%', '[', ']'])
}

/// Characters that, immediately following a `\` with no identifier run,
/// form a one-character command name on their own (e.g. `\_`, `\%`).
///
/// Unlike `special_chars`, this set is fixed and not exposed for widening.
pub(crate) fn special_command_chars() -> HashSet<char> {
    HashSet::from(['_', '\\', '%', '{', '}'])
}

/// The bundle of settings governing one clean pass.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Whether `\input{path}` should be resolved and spliced in (C7), or
    /// left as an ordinary discardable command.
    pub expand_input: bool,
    /// Characters that may appear in a command identifier run.
    pub ident_chars: HashSet<char>,
    /// Characters that terminate a `Word` run. Extra characters passed to
    /// [`CleanConfig::with_extra_special_chars`] widen this set; it is
    /// never narrowed below the default.
    pub special_chars: HashSet<char>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            expand_input: false,
            ident_chars: default_ident_chars(),
            special_chars: default_special_chars(),
        }
    }
}

impl CleanConfig {
    /// A config with `expand_input` enabled, otherwise default.
    pub fn with_expand_input() -> Self {
        Self {
            expand_input: true,
            ..Self::default()
        }
    }

    /// Union `extra` into the special-character set, mirroring the
    /// reference lexer's constructor-level union: extra characters widen,
    /// never narrow, the default set.
    pub fn with_extra_special_chars(mut self, extra: impl IntoIterator<Item = char>) -> Self {
        self.special_chars.extend(extra);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_special_chars_match_spec() {
        let cfg = CleanConfig::default();
        for c in ['\\', '{', '}', '%', '[', ']'] {
            assert!(cfg.special_chars.contains(&c));
        }
    }

    #[test]
    fn extra_special_chars_widen_not_replace() {
        let cfg = CleanConfig::default().with_extra_special_chars(['#']);
        assert!(cfg.special_chars.contains(&'#'));
        assert!(cfg.special_chars.contains(&'{'));
    }

    #[test]
    fn expand_input_defaults_false() {
        assert!(!CleanConfig::default().expand_input);
        assert!(CleanConfig::with_expand_input().expand_input);
    }
}
