//! Command prototype catalog: the external vocabulary that tells the core
//! parser how to expand each recognized command.
//!
//! A [`CommandCatalog`] is an immutable `name -> `[`CommandPrototype`] lookup
//! table with a single default prototype for unrecognized names. The core
//! crate only ever calls [`CommandCatalog::get`]; everything else here (file
//! parsing, directory-walk discovery) is plumbing external to the core.

#![warn(missing_docs)]

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while building, expanding, or discovering a command catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A command's expansion template references an argument index it doesn't have.
    #[error(
        "template for command `{name}` references %{n}, but it takes only {expected_narg} argument(s)"
    )]
    BrokenTemplate {
        /// Name of the offending command.
        name: String,
        /// The out-of-range placeholder index.
        n: usize,
        /// The command's declared arity.
        expected_narg: usize,
    },
    /// A catalog file's top-level structure does not match the documented shape.
    #[error("catalog file is ill-formed: {reason}")]
    IllformedCatalog {
        /// What about the file was wrong.
        reason: String,
    },
    /// Catalog discovery walked the whole search path and found nothing.
    #[error("no command catalog file was found on the search path")]
    NoCommandFileFound,
    /// A catalog file on the search path could not be read.
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// One token of a command prototype's expansion, produced by walking its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrototypeToken {
    /// Literal text to emit as-is.
    Literal(String),
    /// The zero-based index of a bound argument to emit verbatim.
    ArgRef(usize),
    /// The command's own name, emitted as literal text.
    NameRef,
    /// The last bound argument, whichever one that is.
    LastArgRef,
}

/// A large nominal arity used by [`CommandPrototype::PrintLast`] so argument
/// binding keeps collecting `Group`/`Command` arguments until a natural
/// sentinel (not an arity limit) stops it; only the last one is ever emitted.
const PRINT_LAST_NARG: usize = 100;

/// Declares how many arguments a command takes and how its expansion is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPrototype {
    /// Arbitrary arity with a `%N`-placeholder template.
    Generic {
        /// Number of arguments this command binds.
        expected_narg: usize,
        /// Template string; see [`CommandPrototype::tokens`].
        template: String,
    },
    /// Renders as its last bound argument.
    PrintLast,
    /// Renders as its own name, taking no arguments.
    PrintName,
    /// Renders as nothing, taking no arguments.
    Discard,
}

impl CommandPrototype {
    /// Number of arguments the parser should attempt to bind for this command.
    pub fn expected_narg(&self) -> usize {
        match self {
            Self::Generic { expected_narg, .. } => *expected_narg,
            Self::PrintLast => PRINT_LAST_NARG,
            Self::PrintName | Self::Discard => 0,
        }
    }

    /// Expand this prototype's template into a sequence of output tokens.
    ///
    /// `name` is the command's own name (needed for `%0`/[`PrototypeToken::NameRef`]).
    /// Fails with [`CatalogError::BrokenTemplate`] if a `%N` placeholder names an
    /// argument index beyond this prototype's arity.
    pub fn tokens(&self, name: &str) -> Result<Vec<PrototypeToken>, CatalogError> {
        match self {
            Self::Generic {
                expected_narg,
                template,
            } => parse_template(name, template, *expected_narg),
            Self::PrintLast => Ok(vec![PrototypeToken::LastArgRef]),
            Self::PrintName => Ok(vec![PrototypeToken::NameRef]),
            Self::Discard => Ok(vec![]),
        }
    }
}

fn parse_template(
    name: &str,
    template: &str,
    expected_narg: usize,
) -> Result<Vec<PrototypeToken>, CatalogError> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = Vec::new();
    let mut literal = String::new();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] != '%' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }
        if !literal.is_empty() {
            out.push(PrototypeToken::Literal(std::mem::take(&mut literal)));
        }
        if i + 1 >= chars.len() {
            out.push(PrototypeToken::Literal("%".to_string()));
            i += 1;
            continue;
        }
        if chars[i + 1] == '%' {
            out.push(PrototypeToken::Literal("%".to_string()));
            i += 2;
            continue;
        }
        let digit_start = i + 1;
        let mut j = digit_start;
        while j < chars.len() && chars[j].is_ascii_digit() {
            j += 1;
        }
        if j == digit_start {
            out.push(PrototypeToken::Literal("%".to_string()));
            i += 1;
            continue;
        }
        let n: usize = chars[digit_start..j]
            .iter()
            .collect::<String>()
            .parse()
            .expect("a non-empty digit run always parses as usize");
        if n == 0 {
            out.push(PrototypeToken::NameRef);
        } else if n <= expected_narg {
            out.push(PrototypeToken::ArgRef(n - 1));
        } else {
            return Err(CatalogError::BrokenTemplate {
                name: name.to_string(),
                n,
                expected_narg,
            });
        }
        i = j;
    }
    if !literal.is_empty() {
        out.push(PrototypeToken::Literal(literal));
    }
    Ok(out)
}

/// Immutable `name -> prototype` lookup with a default fallback for unknown names.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    commands: HashMap<String, CommandPrototype>,
    default: CommandPrototype,
}

impl CommandCatalog {
    /// Build an empty catalog that resolves every unknown name to `default`.
    pub fn new(default: CommandPrototype) -> Self {
        Self {
            commands: HashMap::new(),
            default,
        }
    }

    /// Register a single command's prototype, overwriting any prior entry for `name`.
    pub fn insert(&mut self, name: impl Into<String>, prototype: CommandPrototype) {
        self.commands.insert(name.into(), prototype);
    }

    /// Look up `name`, falling back to the catalog's default prototype.
    pub fn get(&self, name: &str) -> &CommandPrototype {
        self.commands.get(name).unwrap_or(&self.default)
    }

    /// Merge `other`'s entries into this catalog; `other`'s entries win on conflict.
    pub fn update(&mut self, other: CommandCatalog) {
        self.commands.extend(other.commands);
    }

    /// Parse a catalog file's JSON text per the documented
    /// `print_last`/`print_name`/`discard`/`other` shape.
    pub fn from_json_str(text: &str, default: CommandPrototype) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(text).map_err(|e| CatalogError::IllformedCatalog {
            reason: e.to_string(),
        })?;
        let obj = value.as_object().ok_or_else(|| CatalogError::IllformedCatalog {
            reason: "top-level value is not a JSON object".to_string(),
        })?;

        let mut catalog = Self::new(default);

        if let Some(names) = obj.get("print_last") {
            for name in string_array(names, "print_last")? {
                catalog.insert(name, CommandPrototype::PrintLast);
            }
        }
        if let Some(names) = obj.get("print_name") {
            for name in string_array(names, "print_name")? {
                catalog.insert(name, CommandPrototype::PrintName);
            }
        }
        if let Some(names) = obj.get("discard") {
            for name in string_array(names, "discard")? {
                catalog.insert(name, CommandPrototype::Discard);
            }
        }
        if let Some(other) = obj.get("other") {
            let other_obj = other.as_object().ok_or_else(|| CatalogError::IllformedCatalog {
                reason: "`other` is not a JSON object".to_string(),
            })?;
            for (name, spec) in other_obj {
                let arr = spec.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                    CatalogError::IllformedCatalog {
                        reason: format!("`other.{name}` is not a 2-element array"),
                    }
                })?;
                let expected_narg = arr[0].as_u64().ok_or_else(|| CatalogError::IllformedCatalog {
                    reason: format!("`other.{name}`[0] is not a non-negative integer"),
                })? as usize;
                let template = arr[1].as_str().ok_or_else(|| CatalogError::IllformedCatalog {
                    reason: format!("`other.{name}`[1] is not a string"),
                })?;
                catalog.insert(
                    name.clone(),
                    CommandPrototype::Generic {
                        expected_narg,
                        template: template.to_string(),
                    },
                );
            }
        }

        Ok(catalog)
    }

    /// Read and parse a catalog file from disk.
    pub fn from_file(path: &Path, default: CommandPrototype) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text, default)
    }
}

fn string_array(value: &Value, field: &str) -> Result<Vec<String>, CatalogError> {
    let arr = value.as_array().ok_or_else(|| CatalogError::IllformedCatalog {
        reason: format!("`{field}` is not a JSON array"),
    })?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| CatalogError::IllformedCatalog {
                    reason: format!("`{field}` contains a non-string entry"),
                })
        })
        .collect()
}

/// Walk from `start_dir` toward the filesystem root collecting `.{file_name}`
/// dotfiles, then `$HOME/.{file_name}`, then `packaged_default` if it exists,
/// and merge them into one catalog (closest file wins ties).
///
/// Fails with [`CatalogError::NoCommandFileFound`] if nothing is found anywhere.
pub fn discover(
    start_dir: &Path,
    file_name: &str,
    default: CommandPrototype,
    packaged_default: Option<&Path>,
) -> Result<CommandCatalog, CatalogError> {
    let hidden_name = format!(".{file_name}");

    let mut dotfiles = Vec::new();
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(&hidden_name);
        if candidate.is_file() {
            dotfiles.push(candidate);
        }
        if !current.pop() {
            break;
        }
    }
    // `dotfiles` is currently closest-to-farthest; merge farthest-first so the
    // directory walk's own "update" calls let the closest file win ties.
    dotfiles.reverse();

    let mut sources = Vec::new();
    if let Some(packaged) = packaged_default {
        if packaged.is_file() {
            sources.push(packaged.to_path_buf());
        }
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        let home_file = home.join(&hidden_name);
        if home_file.is_file() {
            sources.push(home_file);
        }
    }
    sources.extend(dotfiles);

    if sources.is_empty() {
        return Err(CatalogError::NoCommandFileFound);
    }

    let mut catalog = CommandCatalog::new(default.clone());
    for path in sources {
        let loaded = CommandCatalog::from_file(&path, default.clone())?;
        catalog.update(loaded);
    }
    Ok(catalog)
}
