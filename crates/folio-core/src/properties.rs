use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Marker that turns a literal atom into the integer component.
pub const INTEGER_MARKER: char = '#';
/// Separator between atoms in literal syntax.
pub const SEPARATOR: char = ',';
/// Escape character that suppresses the special meaning of the next character.
pub const ESCAPE: char = '\\';

/// The dynamic value of a noun: an ordered set of unique text atoms and one integer.
///
/// Atoms keep their insertion order and are never empty or duplicated.
/// Mutations that change the value raise the dirty flag, which the session
/// uses to decide which variables need a history entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
    text_values: Vec<String>,
    integer: i64,
    #[serde(skip)]
    dirty: bool,
}

impl Properties {
    /// Create an empty value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a value holding a single atom.
    pub fn from_text(atom: impl Into<String>) -> Self {
        let mut value = Self::new();
        value.add_value(atom);
        value.dirty = false;
        value
    }

    /// Create a value holding only an integer.
    pub fn from_integer(integer: i64) -> Self {
        Self {
            integer,
            ..Self::default()
        }
    }

    /// Create a value from a list of atoms, skipping empties and duplicates.
    pub fn from_atoms<I, S>(atoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut value = Self::new();
        for atom in atoms {
            value.add_value(atom);
        }
        value.dirty = false;
        value
    }

    /// Parse literal syntax (`a,b,#5`) leniently.
    ///
    /// An atom starting with `#` sets the integer; one that does not hold a
    /// valid integer is dropped. Use [`Properties::try_parse`] to reject it.
    pub fn parse(literal: &str) -> Self {
        let mut value = Self::new();
        for raw in split_atoms(literal) {
            if raw.numeric {
                if let Ok(n) = raw.text.trim().parse::<i64>() {
                    value.integer = n;
                }
            } else {
                value.add_value(raw.text);
            }
        }
        value.dirty = false;
        value
    }

    /// Parse literal syntax, failing on a malformed `#` atom.
    pub fn try_parse(literal: &str) -> CoreResult<Self> {
        let mut value = Self::new();
        for raw in split_atoms(literal) {
            if raw.numeric {
                let digits = raw.text.trim();
                value.integer = digits
                    .parse::<i64>()
                    .map_err(|_| CoreError::InvalidInteger(digits.to_string()))?;
            } else {
                value.add_value(raw.text);
            }
        }
        value.dirty = false;
        Ok(value)
    }

    /// The text atoms in insertion order.
    pub fn text_values(&self) -> &[String] {
        &self.text_values
    }

    /// The integer component.
    pub fn integer(&self) -> i64 {
        self.integer
    }

    /// Replace the integer component, marking the value dirty on change.
    pub fn set_integer(&mut self, integer: i64) -> bool {
        if self.integer == integer {
            return false;
        }
        self.integer = integer;
        self.dirty = true;
        true
    }

    /// Number of text atoms.
    pub fn len(&self) -> usize {
        self.text_values.len()
    }

    /// Whether the value holds neither atoms nor a non-zero integer.
    pub fn is_empty(&self) -> bool {
        self.text_values.is_empty() && self.integer == 0
    }

    /// Integer plus the number of atoms; the truth value of an expression.
    pub fn count(&self) -> i64 {
        self.integer.saturating_add(self.text_values.len() as i64)
    }

    /// Whether the value holds the given atom.
    pub fn contains(&self, atom: &str) -> bool {
        self.text_values.iter().any(|t| t == atom)
    }

    /// Whether every atom of `other` is held by this value.
    pub fn contains_all(&self, other: &Properties) -> bool {
        other.text_values.iter().all(|t| self.contains(t))
    }

    /// Whether any atom of `other` is held by this value.
    pub fn contains_any(&self, other: &Properties) -> bool {
        other.text_values.iter().any(|t| self.contains(t))
    }

    /// Whether the value changed since the flag was last cleared.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Raise the dirty flag.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Add one atom. Returns `true` if it was not already present.
    pub fn add_value(&mut self, atom: impl Into<String>) -> bool {
        let atom = atom.into();
        if atom.is_empty() || self.contains(&atom) {
            return false;
        }
        self.text_values.push(atom);
        self.dirty = true;
        true
    }

    /// Set union with the atoms of `other`. Returns `true` if anything was added.
    pub fn add_values(&mut self, other: &Properties) -> bool {
        let mut changed = false;
        for atom in &other.text_values {
            changed |= self.add_value(atom.clone());
        }
        changed
    }

    /// Remove one atom. Returns `true` if it was present.
    pub fn remove_value(&mut self, atom: &str) -> bool {
        let before = self.text_values.len();
        self.text_values.retain(|t| t != atom);
        let changed = self.text_values.len() != before;
        self.dirty |= changed;
        changed
    }

    /// Set difference with the atoms of `other`. Returns `true` if anything was removed.
    pub fn remove_values(&mut self, other: &Properties) -> bool {
        let before = self.text_values.len();
        self.text_values.retain(|t| !other.contains(t));
        let changed = self.text_values.len() != before;
        self.dirty |= changed;
        changed
    }

    /// Keep only the atoms also held by `other`. Returns `true` if anything was removed.
    pub fn common_values(&mut self, other: &Properties) -> bool {
        let before = self.text_values.len();
        self.text_values.retain(|t| other.contains(t));
        let changed = self.text_values.len() != before;
        self.dirty |= changed;
        changed
    }

    /// Cartesian concatenation: every atom gets every incoming atom appended.
    ///
    /// An empty side is the identity, so `{} * {a}` is `{a}` and `{a} * {}` is `{a}`.
    pub fn concat_values(&mut self, other: &Properties) -> bool {
        if other.text_values.is_empty() {
            return false;
        }
        if self.text_values.is_empty() {
            return self.add_values(other);
        }

        let mut product = Vec::with_capacity(self.text_values.len() * other.text_values.len());
        for left in &self.text_values {
            for right in &other.text_values {
                let joined = format!("{left}{right}");
                if !product.contains(&joined) {
                    product.push(joined);
                }
            }
        }

        if product == self.text_values {
            return false;
        }
        self.text_values = product;
        self.dirty = true;
        true
    }

    /// Replace this value with `other` unless they are already equivalent.
    pub fn set_values(&mut self, other: &Properties) -> bool {
        if self.is_equivalent(other) {
            return false;
        }
        self.text_values = other.text_values.clone();
        self.integer = other.integer;
        self.dirty = true;
        true
    }

    /// Same integer and the same atoms, irrespective of order.
    pub fn is_equivalent(&self, other: &Properties) -> bool {
        self.integer == other.integer
            && self.text_values.len() == other.text_values.len()
            && self.contains_all(other)
    }

    /// Serialize to literal syntax: escaped atoms joined by `,` and a trailing `#<integer>`.
    ///
    /// The output never contains a raw newline and is never empty.
    pub fn print_values(&self) -> String {
        let mut out = String::new();
        for atom in &self.text_values {
            out.push_str(&escape_atom(atom));
            out.push(SEPARATOR);
        }
        out.push(INTEGER_MARKER);
        out.push_str(&self.integer.to_string());
        out
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent(other)
    }
}

impl Eq for Properties {}

impl fmt::Display for Properties {
    /// Player-facing form: atoms joined by `, `, the integer appended when non-zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.text_values.clone();
        if self.integer != 0 || parts.is_empty() {
            parts.push(self.integer.to_string());
        }
        write!(f, "{}", parts.join(", "))
    }
}

struct RawAtom {
    text: String,
    numeric: bool,
}

/// Split literal syntax on unescaped separators, resolving escapes.
fn split_atoms(literal: &str) -> Vec<RawAtom> {
    let mut atoms = Vec::new();
    let mut current = String::new();
    let mut numeric = false;
    let mut chars = literal.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some('n') => current.push('\n'),
                Some(other) => current.push(other),
                None => current.push(ESCAPE),
            },
            SEPARATOR => {
                atoms.push(finish_atom(&mut current, numeric));
                numeric = false;
            }
            INTEGER_MARKER if current.trim().is_empty() && !numeric => {
                current.clear();
                numeric = true;
            }
            _ => current.push(c),
        }
    }
    atoms.push(finish_atom(&mut current, numeric));

    atoms
        .into_iter()
        .filter(|a| a.numeric || !a.text.is_empty())
        .collect()
}

fn finish_atom(current: &mut String, numeric: bool) -> RawAtom {
    let text = current.trim().to_string();
    current.clear();
    RawAtom { text, numeric }
}

fn escape_atom(atom: &str) -> String {
    let mut out = String::with_capacity(atom.len());
    for (i, c) in atom.chars().enumerate() {
        match c {
            ESCAPE => out.push_str("\\\\"),
            SEPARATOR => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            INTEGER_MARKER if i == 0 => out.push_str("\\#"),
            _ => out.push(c),
        }
    }
    out
}
