// SPDX-License-Identifier: Apache-2.0

use core::cell::RefCell;

use crate::error::Error;
use crate::iter::{Elements, Items, Iter, Keys, Walk};
use crate::scanner::Scanner;
use crate::{ByteSource, Config, Position, Value, ValueKind};

/// What to look up with [`Node::index`]: a (possibly negative) array
/// position or an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'k> {
    /// Array position; negative values count from the end.
    Index(i64),
    /// Object key.
    Name(&'k str),
}

impl From<i64> for Key<'_> {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

impl From<i32> for Key<'_> {
    fn from(index: i32) -> Self {
        Key::Index(i64::from(index))
    }
}

impl From<usize> for Key<'_> {
    fn from(index: usize) -> Self {
        Key::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl<'k> From<&'k str> for Key<'k> {
    fn from(name: &'k str) -> Self {
        Key::Name(name)
    }
}

impl<'k> From<&'k String> for Key<'k> {
    fn from(name: &'k String) -> Self {
        Key::Name(name)
    }
}

/// A lazy handle to one JSON value inside a [`ByteSource`].
///
/// A node is only a position and a kind. Nothing below it is parsed until an
/// operation asks for it, and nothing is cached between operations: every
/// call seeks to the node's start and scans from there, so indexing or
/// measuring a container costs time proportional to its size but no memory.
///
/// Nodes borrow the source through a [`RefCell`]. Each operation holds the
/// borrow only while it reads, so any number of nodes from the same source
/// can be alive and used one after another. Using them from several threads
/// is not possible (`RefCell` is not `Sync`).
///
/// ```
/// use std::cell::RefCell;
/// use std::io::Cursor;
/// use lazyjson::{Node, Value};
///
/// let source = RefCell::new(Cursor::new(br#"{"a": [1, 2, 3], "b": "x"}"#.to_vec()));
/// let root = Node::new(&source, 0).unwrap();
///
/// assert!(root.is_object());
/// assert_eq!(root.len().unwrap(), 2);
/// assert_eq!(root.index("a").unwrap().index(-1).unwrap().value().unwrap(), Value::Int(3));
/// ```
pub struct Node<'a, S> {
    source: &'a RefCell<S>,
    start: Position,
    kind: ValueKind,
    config: Config,
}

impl<S> Clone for Node<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Node<'_, S> {}

impl<S> core::fmt::Debug for Node<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("start", &self.start)
            .finish()
    }
}

macro_rules! is_kind {
    ($name:ident, $kind:ident) => {
        pub fn $name(&self) -> bool {
            self.kind == ValueKind::$kind
        }
    };
}

impl<'a, S: ByteSource> Node<'a, S> {
    /// The value at the first significant byte at or after `pos`.
    pub fn new(source: &'a RefCell<S>, pos: Position) -> Result<Self, Error> {
        Self::with_config(source, pos, Config::default())
    }

    /// Like [`Node::new`], with explicit limits for this node and everything
    /// derived from it.
    pub fn with_config(source: &'a RefCell<S>, pos: Position, config: Config) -> Result<Self, Error> {
        let (start, kind) = {
            let mut src = source.borrow_mut();
            let mut scanner = Scanner::new(&mut *src, pos, &config);
            (scanner.skip_trivia()?, scanner.classify()?)
        };
        Ok(Self::from_parts(source, start, kind, config))
    }

    pub(crate) fn from_parts(
        source: &'a RefCell<S>,
        start: Position,
        kind: ValueKind,
        config: Config,
    ) -> Self {
        Self {
            source,
            start,
            kind,
            config,
        }
    }

    pub(crate) fn source(&self) -> &'a RefCell<S> {
        self.source
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Position of the value's first byte.
    pub fn start(&self) -> Position {
        self.start
    }

    pub fn config(&self) -> Config {
        self.config
    }

    is_kind!(is_object, Object);
    is_kind!(is_array, Array);
    is_kind!(is_string, String);
    is_kind!(is_number, Number);
    is_kind!(is_true, True);
    is_kind!(is_false, False);
    is_kind!(is_null, Null);

    pub fn is_boolean(&self) -> bool {
        self.is_true() || self.is_false()
    }

    fn scanner_op<T>(
        &self,
        op: impl FnOnce(&mut Scanner<'_, S>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut src = self.source.borrow_mut();
        let mut scanner = Scanner::new(&mut *src, self.start, &self.config);
        op(&mut scanner)
    }

    /// Position right after the value.
    pub fn end(&self) -> Result<Position, Error> {
        self.scanner_op(|scanner| scanner.skip_value())
    }

    /// Parse the whole value into memory.
    ///
    /// Objects keep the **last** value of a repeated key, while
    /// [`index`](Node::index) returns the first. Nesting deeper than
    /// [`Config::max_depth`] fails with [`Error::MaxDepthReached`].
    pub fn value(&self) -> Result<Value, Error> {
        self.scanner_op(|scanner| scanner.parse_value())
    }

    fn walk(&self, operation: &'static str) -> Result<Walk, Error> {
        match self.kind {
            ValueKind::Array | ValueKind::Object => Ok(Walk::new(self.start, self.kind)),
            kind => Err(Error::type_mismatch(operation, kind)),
        }
    }

    /// Number of elements of an array or members of an object.
    ///
    /// Elements are skipped, not parsed. Repeated object keys are counted
    /// every time they occur.
    pub fn len(&self) -> Result<usize, Error> {
        let mut walk = self.walk("measure the length of")?;
        let mut count = 0;
        while walk.next_member(self.source, &self.config, false)?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// True for `[]` and `{}`. Reads no further than the first element.
    pub fn is_empty(&self) -> Result<bool, Error> {
        let mut walk = self.walk("check the emptiness of")?;
        Ok(walk.next_member(self.source, &self.config, false)?.is_none())
    }

    /// Look up an array element or object member.
    ///
    /// - Arrays take an integer. Non-negative positions skip the elements in
    ///   front of the target; negative positions count from the end and need
    ///   a full scan to learn the length first.
    /// - Objects take a key. The first member with that key wins and the rest
    ///   of the object is not read.
    ///
    /// ```
    /// use std::cell::RefCell;
    /// use lazyjson::{ChunkSource, Error, Node};
    ///
    /// let source = RefCell::new(ChunkSource::full_slice(br#"{"k": 1, "k": 2}"#));
    /// let obj = Node::new(&source, 0).unwrap();
    /// assert_eq!(obj.index("k").unwrap().value().unwrap(), 1);
    /// assert_eq!(obj.value().unwrap()["k"], 2);
    /// assert!(matches!(obj.index(0), Err(Error::TypeMismatch { .. })));
    /// ```
    pub fn index<'k>(&self, key: impl Into<Key<'k>>) -> Result<Node<'a, S>, Error> {
        match (self.kind, key.into()) {
            (ValueKind::Array, Key::Index(index)) if index < 0 => {
                let len = self.len()?;
                let resolved = i64::try_from(len).unwrap_or(i64::MAX).saturating_add(index);
                match usize::try_from(resolved) {
                    Ok(position) => self.nth(position, index),
                    Err(_) => Err(Error::IndexOutOfRange { index, len }),
                }
            }
            (ValueKind::Array, Key::Index(index)) => {
                let position = usize::try_from(index).unwrap_or(usize::MAX);
                self.nth(position, index)
            }
            (ValueKind::Object, Key::Name(name)) => self.member(name),
            (kind, _) => Err(Error::type_mismatch("index", kind)),
        }
    }

    fn nth(&self, position: usize, requested: i64) -> Result<Node<'a, S>, Error> {
        let mut walk = Walk::new(self.start, ValueKind::Array);
        let mut seen = 0;
        while let Some(member) = walk.next_member(self.source, &self.config, false)? {
            if seen == position {
                return Ok(Node::from_parts(self.source, member.value, member.kind, self.config));
            }
            seen += 1;
        }
        Err(Error::IndexOutOfRange {
            index: requested,
            len: seen,
        })
    }

    fn member(&self, name: &str) -> Result<Node<'a, S>, Error> {
        for item in self.items()? {
            let (key, node) = item?;
            if key == name {
                return Ok(node);
            }
        }
        Err(Error::KeyNotFound(name.to_owned()))
    }

    /// Membership test.
    ///
    /// For arrays, whether some element materializes to a value equal to
    /// `needle`. Elements whose kind cannot match are skipped without being
    /// parsed and the scan stops at the first match. For objects, whether
    /// some key equals `needle`; member values are never looked at.
    pub fn contains(&self, needle: &Value) -> Result<bool, Error> {
        match self.kind {
            ValueKind::Array => {
                for element in self.elements()? {
                    let element = element?;
                    if needle.could_equal(element.kind) && element.value()? == *needle {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            ValueKind::Object => match needle.as_str() {
                Some(name) => self.has_key(name),
                None => Ok(false),
            },
            kind => Err(Error::type_mismatch("test membership in", kind)),
        }
    }

    /// Whether an object has a member named `name`.
    pub fn has_key(&self, name: &str) -> Result<bool, Error> {
        for key in self.keys()? {
            if key? == name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Children of a container: element nodes for arrays, keys for objects.
    ///
    /// The iterator is single-pass; call `iter` again to start over.
    pub fn iter(&self) -> Result<Iter<'a, S>, Error> {
        match self.kind {
            ValueKind::Array => Ok(Iter::Elements(Elements::new(self))),
            ValueKind::Object => Ok(Iter::Keys(Keys::new(self))),
            kind => Err(Error::type_mismatch("iterate over", kind)),
        }
    }

    /// Element nodes of an array.
    pub fn elements(&self) -> Result<Elements<'a, S>, Error> {
        match self.kind {
            ValueKind::Array => Ok(Elements::new(self)),
            kind => Err(Error::type_mismatch("list the elements of", kind)),
        }
    }

    /// Keys of an object.
    pub fn keys(&self) -> Result<Keys<'a, S>, Error> {
        match self.kind {
            ValueKind::Object => Ok(Keys::new(self)),
            kind => Err(Error::type_mismatch("list the keys of", kind)),
        }
    }

    /// `(key, node)` pairs of an object.
    pub fn items(&self) -> Result<Items<'a, S>, Error> {
        match self.kind {
            ValueKind::Object => Ok(Items::new(self)),
            kind => Err(Error::type_mismatch("list the items of", kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Malformed;
    use crate::ChunkSource;
    use test_log::test;

    fn source(json: &str) -> RefCell<ChunkSource<'_>> {
        RefCell::new(ChunkSource::new(json.as_bytes(), 3))
    }

    #[test]
    fn test_node_skips_leading_trivia() {
        let src = source("  // header\n  [1]");
        let node = Node::new(&src, 0).unwrap();
        assert_eq!(node.start(), 14);
        assert!(node.is_array());
    }

    #[test]
    fn test_kind_predicates() {
        let src = source(r#"[{}, [], "s", 1, true, false, null]"#);
        let root = Node::new(&src, 0).unwrap();
        let kinds: Vec<ValueKind> = root.elements().unwrap().map(|n| n.unwrap().kind()).collect();
        assert_eq!(
            kinds,
            [
                ValueKind::Object,
                ValueKind::Array,
                ValueKind::String,
                ValueKind::Number,
                ValueKind::True,
                ValueKind::False,
                ValueKind::Null
            ]
        );
        assert!(root.index(4).unwrap().is_boolean());
        assert!(root.index(5).unwrap().is_boolean());
        assert!(!root.index(6).unwrap().is_boolean());
    }

    #[test]
    fn test_end_positions() {
        let src = source(r#"{"a": [1, 2]}  "tail""#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.end(), Ok(13));
        assert_eq!(root.index("a").unwrap().end(), Ok(12));
    }

    #[test]
    fn test_container_operations_right_after_new() {
        // Fresh nodes on single-byte reads, nothing buffered yet
        let json = r#"[1, {"a": 2}, [3, 4]]"#;
        let src = RefCell::new(ChunkSource::new(json.as_bytes(), 1));
        assert_eq!(Node::new(&src, 0).unwrap().len(), Ok(3));
        assert_eq!(Node::new(&src, 0).unwrap().is_empty(), Ok(false));
        assert_eq!(Node::new(&src, 4).unwrap().len(), Ok(1));
        assert_eq!(Node::new(&src, 0).unwrap().index(2).unwrap().len(), Ok(2));
        assert_eq!(
            Node::new(&src, 0).unwrap().value().unwrap()[1]["a"],
            Value::Int(2)
        );
    }

    #[test]
    fn test_len_and_empty() {
        let src = source(r#"{"a": [1, [2, 3], {"x": 4}], "b": {}, "c": []}"#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.len(), Ok(3));
        assert_eq!(root.index("a").unwrap().len(), Ok(3));
        assert_eq!(root.index("b").unwrap().len(), Ok(0));
        assert_eq!(root.index("c").unwrap().is_empty(), Ok(true));
        assert_eq!(root.is_empty(), Ok(false));
    }

    #[test]
    fn test_len_counts_duplicate_keys() {
        let src = source(r#"{"k": 1, "k": 2, "j": 3}"#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.len(), Ok(3));
        assert_eq!(root.value().unwrap().as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_first_match_vs_last_match() {
        let src = source(r#"{"k":1,"k":2}"#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.index("k").unwrap().value(), Ok(Value::Int(1)));
        assert_eq!(root.value().unwrap()["k"], Value::Int(2));
    }

    #[test]
    fn test_duplicate_keys_keep_first_position() {
        let src = source(r#"{"b": 1, "a": 2, "b": 3}"#);
        let value = Node::new(&src, 0).unwrap().value().unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(value["b"], 3);
    }

    #[test]
    fn test_negative_indexing() {
        let src = source("[10, 20, 30]");
        let root = Node::new(&src, 0).unwrap();
        for i in 0..3i64 {
            assert_eq!(
                root.index(i - 3).unwrap().value(),
                root.index(i).unwrap().value()
            );
        }
        assert_eq!(
            root.index(-4).unwrap_err(),
            Error::IndexOutOfRange { index: -4, len: 3 }
        );
    }

    #[test]
    fn test_index_errors() {
        let src = source(r#"{"arr": [1, 2, 3], "s": "text"}"#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(
            root.index("missing").unwrap_err(),
            Error::KeyNotFound("missing".into())
        );
        let arr = root.index("arr").unwrap();
        assert_eq!(
            arr.index(100).unwrap_err(),
            Error::IndexOutOfRange { index: 100, len: 3 }
        );
        assert_eq!(
            arr.index("x").unwrap_err(),
            Error::type_mismatch("index", ValueKind::Array)
        );
        assert_eq!(
            root.index(0).unwrap_err(),
            Error::type_mismatch("index", ValueKind::Object)
        );
        let s = root.index("s").unwrap();
        assert_eq!(
            s.len().unwrap_err(),
            Error::type_mismatch("measure the length of", ValueKind::String)
        );
        assert!(matches!(s.index(0), Err(Error::TypeMismatch { .. })));
        assert!(matches!(s.iter(), Err(Error::TypeMismatch { .. })));
        assert!(matches!(s.contains(&Value::Null), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_index_with_string_key_types() {
        let src = source(r#"{"name": "v"}"#);
        let root = Node::new(&src, 0).unwrap();
        let key = String::from("name");
        assert_eq!(root.index(&key).unwrap().value(), Ok(Value::from("v")));
    }

    #[test]
    fn test_lookup_stops_at_first_match() {
        // Everything after the match is garbage; a full scan would fail
        let src = source(r#"{"a": 1, "b": [true] ]]] garbage"#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.index("b").unwrap().index(0).unwrap().value(), Ok(Value::Bool(true)));
        assert!(matches!(root.len(), Err(Error::MalformedJson { .. })));
    }

    #[test]
    fn test_indexing_never_parses_other_elements() {
        // The neighbours carry escapes that only fail when parsed
        let src = source(r#"["\x", "ok", "\q"]"#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.index(1).unwrap().value(), Ok(Value::from("ok")));
        assert_eq!(root.len(), Ok(3));
        assert_eq!(
            root.index(0).unwrap().value().unwrap_err(),
            Error::malformed(2, Malformed::InvalidEscapeSequence)
        );
    }

    #[test]
    fn test_contains() {
        let src = source(r#"{"arr": [1, "two", [3], {"four": 4}, null], "obj": {"k": "v"}}"#);
        let root = Node::new(&src, 0).unwrap();
        let arr = root.index("arr").unwrap();
        assert_eq!(arr.contains(&Value::from(1)), Ok(true));
        assert_eq!(arr.contains(&Value::from("two")), Ok(true));
        assert_eq!(arr.contains(&Value::Array(vec![Value::from(3)])), Ok(true));
        assert_eq!(arr.contains(&Value::Null), Ok(true));
        assert_eq!(arr.contains(&Value::from("four")), Ok(false));
        assert_eq!(arr.contains(&Value::from(3)), Ok(false));

        let obj = root.index("obj").unwrap();
        assert_eq!(obj.contains(&Value::from("k")), Ok(true));
        assert_eq!(obj.contains(&Value::from("v")), Ok(false));
        assert_eq!(obj.contains(&Value::from(1)), Ok(false));
        assert_eq!(root.has_key("obj"), Ok(true));
        assert!(matches!(arr.has_key("x"), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_contains_compares_numbers_by_value() {
        let src = source("[1, 2.0, [3]]");
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.contains(&Value::Float(1.0)), Ok(true));
        assert_eq!(root.contains(&Value::Int(2)), Ok(true));
        assert_eq!(root.contains(&Value::Array(vec![Value::Float(3.0)])), Ok(true));
        assert_eq!(root.contains(&Value::Float(2.5)), Ok(false));
    }

    #[test]
    fn test_contains_short_circuits() {
        let src = source(r#"["a", "\x"]"#);
        let root = Node::new(&src, 0).unwrap();
        assert_eq!(root.contains(&Value::from("a")), Ok(true));
        assert!(matches!(
            root.contains(&Value::from("b")),
            Err(Error::MalformedJson { .. })
        ));
    }

    #[test]
    fn test_iter_restarts_by_reinvoking() {
        let src = source(r#"{"x": 1, "y": [2, 3]}"#);
        let root = Node::new(&src, 0).unwrap();

        let mut keys = root.iter().unwrap();
        assert_eq!(keys.next().unwrap().unwrap().into_key().as_deref(), Some("x"));

        let all: Vec<String> = root
            .iter()
            .unwrap()
            .map(|child| child.unwrap().into_key().unwrap())
            .collect();
        assert_eq!(all, ["x", "y"]);

        // The first iterator continues where it stopped
        assert_eq!(keys.next().unwrap().unwrap().into_key().as_deref(), Some("y"));
        assert!(keys.next().is_none());
        assert!(keys.next().is_none());

        let y = root.index("y").unwrap();
        let values: Vec<Value> = y
            .iter()
            .unwrap()
            .map(|child| child.unwrap().into_node().unwrap().value().unwrap())
            .collect();
        assert_eq!(values, [Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_items_yield_duplicates() {
        let src = source(r#"{"k": 1, "j": true, "k": 2}"#);
        let root = Node::new(&src, 0).unwrap();
        let items: Vec<(String, Value)> = root
            .items()
            .unwrap()
            .map(|item| {
                let (key, node) = item.unwrap();
                (key, node.value().unwrap())
            })
            .collect();
        assert_eq!(
            items,
            [
                ("k".to_owned(), Value::Int(1)),
                ("j".to_owned(), Value::Bool(true)),
                ("k".to_owned(), Value::Int(2)),
            ]
        );
        assert!(matches!(root.elements(), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_iterator_fuses_after_error() {
        let src = source("[1, 2 3]");
        let root = Node::new(&src, 0).unwrap();
        let mut elements = root.elements().unwrap();
        assert!(elements.next().unwrap().is_ok());
        assert!(elements.next().unwrap().is_ok());
        assert!(elements.next().unwrap().is_err());
        assert!(elements.next().is_none());
    }

    #[test]
    fn test_materialize_depth_limit() {
        let src = source("[[[]]]");
        let config = Config {
            max_depth: 2,
            ..Config::default()
        };
        let root = Node::with_config(&src, 0, config).unwrap();
        assert_eq!(
            root.value().unwrap_err(),
            Error::MaxDepthReached { position: 2 }
        );
        assert_eq!(root.index(0).unwrap().config(), config);
    }

    #[test]
    fn test_value_at_default_depth_limit() {
        let nested = |depth: usize| format!("{}{}", "[".repeat(depth), "]".repeat(depth));

        let json = nested(Config::default().max_depth - 1);
        let src = RefCell::new(ChunkSource::new(json.as_bytes(), 64));
        let value = Node::new(&src, 0).unwrap().value().unwrap();
        let mut innermost = &value;
        while let Some([inner]) = innermost.as_array() {
            innermost = inner;
        }
        assert_eq!(innermost, &Value::Array(vec![]));

        let json = nested(Config::default().max_depth + 1);
        let src = RefCell::new(ChunkSource::new(json.as_bytes(), 64));
        assert_eq!(
            Node::new(&src, 0).unwrap().value().unwrap_err(),
            Error::MaxDepthReached { position: 1024 }
        );
    }

    #[test]
    fn test_interleaved_nodes_share_source() {
        let src = source(r#"{"a": [1, 2, 3], "b": ["x", "y"]}"#);
        let root = Node::new(&src, 0).unwrap();
        let a = root.index("a").unwrap();
        let b = root.index("b").unwrap();
        let mut a_iter = a.elements().unwrap();
        let mut b_iter = b.elements().unwrap();
        assert_eq!(a_iter.next().unwrap().unwrap().value(), Ok(Value::Int(1)));
        assert_eq!(b_iter.next().unwrap().unwrap().value(), Ok(Value::from("x")));
        assert_eq!(a_iter.next().unwrap().unwrap().value(), Ok(Value::Int(2)));
        assert_eq!(b_iter.next().unwrap().unwrap().value(), Ok(Value::from("y")));
    }

    #[test]
    fn test_empty_source() {
        let src = source("   ");
        assert_eq!(
            Node::new(&src, 0).unwrap_err(),
            Error::UnexpectedEnd { position: 3 }
        );
    }
}
