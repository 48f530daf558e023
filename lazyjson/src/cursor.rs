// SPDX-License-Identifier: Apache-2.0

use core::cell::RefCell;

use crate::error::Error;
use crate::iter::{Elements, Items, Iter, Keys};
use crate::node::Key;
use crate::scanner::Scanner;
use crate::{ByteSource, Config, Node, Position, Value, ValueKind};

/// A forward-only cursor over the top-level values of one or more sources.
///
/// The sources are read as one logical stream: once a source has no further
/// value, the cursor continues at the start of the next one. Node operations
/// called on the cursor apply to the current value.
///
/// ```
/// use lazyjson::{ChunkSource, Cursor, Error, Value};
///
/// let mut cursor = Cursor::new(ChunkSource::full_slice(br#"["x"] true {"y":1}"#)).unwrap();
/// assert_eq!(cursor.index(0).unwrap().value().unwrap(), "x");
/// cursor.advance().unwrap();
/// assert_eq!(cursor.value().unwrap(), Value::Bool(true));
/// cursor.advance().unwrap();
/// assert_eq!(cursor.index("y").unwrap().value().unwrap(), 1);
/// assert_eq!(cursor.advance(), Err(Error::StreamExhausted));
/// ```
pub struct Cursor<S> {
    sources: Vec<RefCell<S>>,
    source_index: usize,
    start: Position,
    kind: ValueKind,
    /// End of the current value, once computed
    end: Option<Position>,
    value_index: usize,
    config: Config,
}

impl<S> core::fmt::Debug for Cursor<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("sources", &self.sources.len())
            .field("source_index", &self.source_index)
            .field("start", &self.start)
            .field("kind", &self.kind)
            .field("value_index", &self.value_index)
            .finish()
    }
}

/// Where a top-level value was found.
struct Found {
    source_index: usize,
    start: Position,
    kind: ValueKind,
}

impl<S: ByteSource> Cursor<S> {
    /// A cursor positioned at the first value of `source`.
    pub fn new(source: S) -> Result<Self, Error> {
        Self::from_sources([source])
    }

    /// A cursor over several sources read one after another.
    pub fn from_sources<I: IntoIterator<Item = S>>(sources: I) -> Result<Self, Error> {
        Self::with_config(sources, Config::default())
    }

    /// Like [`Cursor::from_sources`], with explicit limits for every node the
    /// cursor hands out.
    ///
    /// Fails with [`Error::InvalidArgument`] if `sources` is empty and with
    /// [`Error::StreamExhausted`] if none of them holds a value.
    pub fn with_config<I: IntoIterator<Item = S>>(sources: I, config: Config) -> Result<Self, Error> {
        let sources: Vec<RefCell<S>> = sources.into_iter().map(RefCell::new).collect();
        if sources.is_empty() {
            return Err(Error::InvalidArgument("a cursor needs at least one source"));
        }
        let found = find_value(&sources, 0, 0, &config)?.ok_or(Error::StreamExhausted)?;
        Ok(Self {
            sources,
            source_index: found.source_index,
            start: found.start,
            kind: found.kind,
            end: None,
            value_index: 0,
            config,
        })
    }

    /// The value the cursor is positioned at.
    pub fn current(&self) -> Node<'_, S> {
        Node::from_parts(&self.sources[self.source_index], self.start, self.kind, self.config)
    }

    fn current_end(&mut self) -> Result<Position, Error> {
        if let Some(end) = self.end {
            return Ok(end);
        }
        let end = self.current().end()?;
        self.end = Some(end);
        Ok(end)
    }

    /// Move to the next top-level value, possibly in a later source.
    ///
    /// Fails with [`Error::StreamExhausted`] when there is none. On any error
    /// the cursor stays where it was.
    pub fn advance(&mut self) -> Result<(), Error> {
        let end = self.current_end()?;
        let found = find_value(&self.sources, self.source_index, end, &self.config)?
            .ok_or(Error::StreamExhausted)?;
        log::trace!(
            "advanced to value {} at source {} byte {}",
            self.value_index + 1,
            found.source_index,
            found.start
        );
        self.source_index = found.source_index;
        self.start = found.start;
        self.kind = found.kind;
        self.end = None;
        self.value_index += 1;
        Ok(())
    }

    /// Call [`advance`](Cursor::advance) `n` times.
    ///
    /// Negative `n` fails with [`Error::InvalidArgument`]. If the stream runs
    /// out part way, the error is returned and the cursor stays on the last
    /// value it reached.
    pub fn advance_by(&mut self, n: i64) -> Result<(), Error> {
        if n < 0 {
            return Err(Error::InvalidArgument("advance_by count must not be negative"));
        }
        for _ in 0..n {
            self.advance()?;
        }
        Ok(())
    }

    /// True if no value follows the current one in this or any later source.
    pub fn is_finished(&mut self) -> Result<bool, Error> {
        let end = self.current_end()?;
        Ok(find_value(&self.sources, self.source_index, end, &self.config)?.is_none())
    }

    /// How many times the cursor has advanced.
    pub fn value_index(&self) -> usize {
        self.value_index
    }

    /// Index of the source holding the current value.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Give the sources back to their owner.
    pub fn into_sources(self) -> Vec<S> {
        self.sources.into_iter().map(RefCell::into_inner).collect()
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn is_object(&self) -> bool {
        self.current().is_object()
    }

    pub fn is_array(&self) -> bool {
        self.current().is_array()
    }

    pub fn is_string(&self) -> bool {
        self.current().is_string()
    }

    pub fn is_number(&self) -> bool {
        self.current().is_number()
    }

    pub fn is_true(&self) -> bool {
        self.current().is_true()
    }

    pub fn is_false(&self) -> bool {
        self.current().is_false()
    }

    pub fn is_boolean(&self) -> bool {
        self.current().is_boolean()
    }

    pub fn is_null(&self) -> bool {
        self.current().is_null()
    }

    pub fn value(&self) -> Result<Value, Error> {
        self.current().value()
    }

    pub fn len(&self) -> Result<usize, Error> {
        self.current().len()
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        self.current().is_empty()
    }

    pub fn index<'k>(&self, key: impl Into<Key<'k>>) -> Result<Node<'_, S>, Error> {
        self.current().index(key)
    }

    pub fn contains(&self, needle: &Value) -> Result<bool, Error> {
        self.current().contains(needle)
    }

    pub fn has_key(&self, name: &str) -> Result<bool, Error> {
        self.current().has_key(name)
    }

    pub fn iter(&self) -> Result<Iter<'_, S>, Error> {
        self.current().iter()
    }

    pub fn elements(&self) -> Result<Elements<'_, S>, Error> {
        self.current().elements()
    }

    pub fn keys(&self) -> Result<Keys<'_, S>, Error> {
        self.current().keys()
    }

    pub fn items(&self) -> Result<Items<'_, S>, Error> {
        self.current().items()
    }
}

/// The first value at or after `pos` in `sources[index]`, or at the start of
/// a later source.
fn find_value<S: ByteSource>(
    sources: &[RefCell<S>],
    mut index: usize,
    mut pos: Position,
    config: &Config,
) -> Result<Option<Found>, Error> {
    while let Some(source) = sources.get(index) {
        let mut source = source.borrow_mut();
        let mut scanner = Scanner::new(&mut *source, pos, config);
        match scanner.skip_trivia() {
            Ok(start) => {
                let kind = scanner.classify()?;
                return Ok(Some(Found {
                    source_index: index,
                    start,
                    kind,
                }));
            }
            Err(Error::UnexpectedEnd { .. }) => {
                log::debug!("source {index} has no further values");
                index += 1;
                pos = 0;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
