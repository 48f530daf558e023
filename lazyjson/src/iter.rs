// SPDX-License-Identifier: Apache-2.0

//! Lazy, single-pass traversal of arrays and objects.
//!
//! Every iterator here is bound to the fixed start of the container it came
//! from. It remembers where the last produced element starts and the bytes it
//! last read; each step resumes there, skips that element and reads the next
//! separator. To start over, ask the [`Node`] for a new iterator.

use core::cell::RefCell;
use core::iter::FusedIterator;

use crate::error::Error;
use crate::scanner::{Scanner, Window};
use crate::{ByteSource, Config, Node, Position, ValueKind};

#[derive(Debug, Clone, Copy)]
enum WalkState {
    /// On the opening bracket of the container
    Start(Position),
    /// On the first byte of the last produced element
    After(Position),
    Done,
}

/// One element of an array, or one member of an object.
pub(crate) struct Member {
    pub key: Option<String>,
    pub value: Position,
    pub kind: ValueKind,
}

/// Position bookkeeping shared by all container iterators.
///
/// The bytes read by one step are kept for the next, so walking a container
/// reads it from the source about once even though every step seeks.
#[derive(Debug)]
pub(crate) struct Walk {
    closer: u8,
    object: bool,
    state: WalkState,
    window: Window,
}

impl Walk {
    pub fn new(start: Position, kind: ValueKind) -> Self {
        let object = kind == ValueKind::Object;
        Self {
            closer: if object { b'}' } else { b']' },
            object,
            state: WalkState::Start(start),
            window: Window::default(),
        }
    }

    /// Move to the next element. Object keys are parsed only when
    /// `read_key` is set, otherwise they are skipped.
    ///
    /// After the end of the container or an error the walk stays finished.
    pub fn next_member<S: ByteSource>(
        &mut self,
        source: &RefCell<S>,
        config: &Config,
        read_key: bool,
    ) -> Result<Option<Member>, Error> {
        let (pos, first) = match self.state {
            WalkState::Start(pos) => (pos, true),
            WalkState::After(pos) => (pos, false),
            WalkState::Done => return Ok(None),
        };

        let mut source = source.borrow_mut();
        let window = core::mem::take(&mut self.window);
        let mut scanner = Scanner::resume(&mut *source, window, pos, config);
        let result = self.step(&mut scanner, first, read_key);
        self.window = scanner.into_window();

        match &result {
            Ok(Some(member)) => self.state = WalkState::After(member.value),
            _ => self.state = WalkState::Done,
        }
        result
    }

    fn step<S: ByteSource>(
        &self,
        scanner: &mut Scanner<'_, S>,
        first: bool,
        read_key: bool,
    ) -> Result<Option<Member>, Error> {
        let closed = if first {
            scanner.open_container(self.closer)?
        } else {
            scanner.skip_value()?;
            scanner.after_element(self.closer)?
        };
        if closed {
            return Ok(None);
        }

        let key = match (self.object, read_key) {
            (true, true) => Some(scanner.read_member_key()?),
            (true, false) => {
                scanner.skip_member_key()?;
                None
            }
            (false, _) => None,
        };
        let value = scanner.skip_trivia()?;
        let kind = scanner.classify()?;
        Ok(Some(Member { key, value, kind }))
    }
}

/// Element nodes of an array, in file order.
pub struct Elements<'a, S> {
    source: &'a RefCell<S>,
    config: Config,
    walk: Walk,
}

impl<'a, S: ByteSource> Elements<'a, S> {
    pub(crate) fn new(node: &Node<'a, S>) -> Self {
        Self {
            source: node.source(),
            config: node.config(),
            walk: Walk::new(node.start(), ValueKind::Array),
        }
    }
}

impl<'a, S: ByteSource> Iterator for Elements<'a, S> {
    type Item = Result<Node<'a, S>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walk
            .next_member(self.source, &self.config, false)
            .transpose()
            .map(|member| {
                member.map(|m| Node::from_parts(self.source, m.value, m.kind, self.config))
            })
    }
}

impl<S: ByteSource> FusedIterator for Elements<'_, S> {}

/// `(key, value)` pairs of an object, in file order. Keys are read eagerly,
/// values stay lazy. Repeated keys are yielded every time they occur.
pub struct Items<'a, S> {
    source: &'a RefCell<S>,
    config: Config,
    walk: Walk,
}

impl<'a, S: ByteSource> Items<'a, S> {
    pub(crate) fn new(node: &Node<'a, S>) -> Self {
        Self {
            source: node.source(),
            config: node.config(),
            walk: Walk::new(node.start(), ValueKind::Object),
        }
    }
}

impl<'a, S: ByteSource> Iterator for Items<'a, S> {
    type Item = Result<(String, Node<'a, S>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let member = match self.walk.next_member(self.source, &self.config, true) {
            Ok(Some(member)) => member,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        let node = Node::from_parts(self.source, member.value, member.kind, self.config);
        Some(Ok((member.key.unwrap_or_default(), node)))
    }
}

impl<S: ByteSource> FusedIterator for Items<'_, S> {}

/// Keys of an object, in file order.
pub struct Keys<'a, S> {
    items: Items<'a, S>,
}

impl<'a, S: ByteSource> Keys<'a, S> {
    pub(crate) fn new(node: &Node<'a, S>) -> Self {
        Self {
            items: Items::new(node),
        }
    }
}

impl<S: ByteSource> Iterator for Keys<'_, S> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(|item| item.map(|(key, _)| key))
    }
}

impl<S: ByteSource> FusedIterator for Keys<'_, S> {}

/// What [`Node::iter`] yields: element nodes for arrays, keys for objects.
pub enum Child<'a, S> {
    Element(Node<'a, S>),
    Key(String),
}

impl<'a, S> Child<'a, S> {
    pub fn into_node(self) -> Option<Node<'a, S>> {
        match self {
            Child::Element(node) => Some(node),
            Child::Key(_) => None,
        }
    }

    pub fn into_key(self) -> Option<String> {
        match self {
            Child::Key(key) => Some(key),
            Child::Element(_) => None,
        }
    }
}

impl<S> core::fmt::Debug for Child<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Child::Element(node) => f.debug_tuple("Element").field(node).finish(),
            Child::Key(key) => f.debug_tuple("Key").field(key).finish(),
        }
    }
}

/// Iterator over the children of a container. See [`Node::iter`].
pub enum Iter<'a, S> {
    Elements(Elements<'a, S>),
    Keys(Keys<'a, S>),
}

impl<'a, S: ByteSource> Iterator for Iter<'a, S> {
    type Item = Result<Child<'a, S>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Elements(elements) => elements.next().map(|r| r.map(Child::Element)),
            Iter::Keys(keys) => keys.next().map(|r| r.map(Child::Key)),
        }
    }
}

impl<S: ByteSource> FusedIterator for Iter<'_, S> {}
