//! Reader for `.properties` configuration files.
//!
//! The accepted syntax is the conventional one:
//!
//! ```text
//! # comment            ! also a comment
//! key=value            key: value            key value
//! long.value = first \
//!              second
//! escaped\ key = tab\there \u00e9
//! ```
//!
//! Keys end at the first unescaped `=`, `:` or whitespace. Leading
//! whitespace on every natural line is ignored, including continuation
//! lines. When a key repeats, the last occurrence wins.

use std::collections::btree_map::{self, BTreeMap};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// An ordered string-to-string mapping read from a properties file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a properties file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let props = Self::parse(&text)?;
        tracing::debug!(path = ?path, entries = props.len(), "loaded properties");
        Ok(props)
    }

    /// Parse properties from text.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut entries = BTreeMap::new();
        for (line_no, logical) in logical_lines(text) {
            let (raw_key, raw_value) = split_entry(&logical);
            let key = unescape(raw_key, line_no)?;
            let value = unescape(raw_value, line_no)?;
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a value by key, treating blank values as absent.
    ///
    /// The returned value is trimmed.
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Insert or replace a value. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Returns `true` if the key is present (even with an empty value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

/// Join natural lines into logical lines, dropping blanks and comments.
///
/// Each logical line is paired with the 1-based number of the natural line
/// it starts on.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut continuing = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_start_matches(is_blank);
        if !continuing {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            start = idx + 1;
        }

        // An odd run of trailing backslashes escapes the line break.
        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            current.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            current.push_str(line);
            out.push((start, std::mem::take(&mut current)));
            continuing = false;
        }
    }

    if continuing {
        out.push((start, current));
    }
    out
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> ConfigResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_hex4(&mut chars, line)?;
                let code = if (0xD800..=0xDBFF).contains(&unit) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(ConfigError::parse(line, "unpaired surrogate in \\u escape"));
                    }
                    let low = read_hex4(&mut chars, line)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(ConfigError::parse(line, "unpaired surrogate in \\u escape"));
                    }
                    0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    unit
                };
                let ch = char::from_u32(code).ok_or_else(|| {
                    ConfigError::parse(line, format!("invalid code point U+{code:04X}"))
                })?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            // A lone backslash at the very end of input.
            None => {}
        }
    }
    Ok(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>, line: usize) -> ConfigResult<u32> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.chars().count() != 4 {
        return Err(ConfigError::parse(line, "truncated \\u escape"));
    }
    u32::from_str_radix(&digits, 16)
        .map_err(|_| ConfigError::parse(line, format!("malformed \\u escape: \\u{digits}")))
}
