// SPDX-License-Identifier: Apache-2.0

//! Shared types for the scanner, nodes and the cursor.

/// Absolute byte offset into a [`ByteSource`](crate::ByteSource).
pub type Position = u64;

/// The kind of a JSON value, decided from the first byte of its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// An object (`{`).
    Object,
    /// An array (`[`).
    Array,
    /// A number (`-` or a digit).
    Number,
    /// A string (`"`).
    String,
    /// The literal `true`.
    True,
    /// The literal `false`.
    False,
    /// The literal `null`.
    Null,
}

impl ValueKind {
    /// True for `Object` and `Array`.
    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Object | ValueKind::Array)
    }

    /// The literal text for `True`, `False` and `Null`.
    pub(crate) fn literal(self) -> Option<&'static [u8]> {
        match self {
            ValueKind::True => Some(b"true"),
            ValueKind::False => Some(b"false"),
            ValueKind::Null => Some(b"null"),
            _ => None,
        }
    }
}

impl core::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::True => "true",
            ValueKind::False => "false",
            ValueKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// Tuning knobs shared by every node and cursor built from the same root.
///
/// Nodes, iterators and cursors copy the config of whatever produced them,
/// so a config chosen at construction applies to the whole tree.
///
/// ```
/// use lazyjson::Config;
///
/// let config = Config {
///     max_depth: 64,
///     ..Config::default()
/// };
/// assert_eq!(config.read_chunk, 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest container nesting accepted while skipping or materializing.
    pub max_depth: usize,
    /// Number of bytes requested from the source per read (minimum 1).
    pub read_chunk: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            read_chunk: 1024,
        }
    }
}
