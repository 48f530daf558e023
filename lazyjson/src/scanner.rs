// SPDX-License-Identifier: Apache-2.0

//! Byte-level scanning over a [`ByteSource`].
//!
//! A [`Scanner`] lives for one operation or one iterator step: it reads
//! forward from the position it was created at through a [`Window`] of
//! buffered bytes, seeking the source only when the window runs out. Skipping
//! never keeps parsed substructure around; it only remembers which closing
//! brackets are still outstanding.

use smallvec::SmallVec;

use crate::error::{Error, Malformed};
use crate::escape_processor::EscapeProcessor;
use crate::json_number::parse_number;
use crate::value::Map;
use crate::{ByteSource, Config, Position, Value, ValueKind};

type NumberLiteral = SmallVec<[u8; 32]>;

/// A container being built by [`Scanner::parse_value`]. Objects carry the
/// key of the member whose value is being parsed.
enum Frame {
    Array(Vec<Value>),
    Object(Map, String),
}

impl Frame {
    fn closer(&self) -> u8 {
        match self {
            Frame::Array(_) => b']',
            Frame::Object(..) => b'}',
        }
    }

    fn push(&mut self, value: Value) {
        match self {
            Frame::Array(values) => values.push(value),
            // Last occurrence of a repeated key wins
            Frame::Object(map, key) => {
                map.insert(core::mem::take(key), value);
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Frame::Array(values) => Value::Array(values),
            Frame::Object(map, _) => Value::Object(map),
        }
    }
}

/// JSON whitespace. Not `u8::is_ascii_whitespace`, which also accepts form feed.
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// The kind of value a byte starts, if any.
pub(crate) fn kind_of(b: u8) -> Option<ValueKind> {
    match b {
        b'{' => Some(ValueKind::Object),
        b'[' => Some(ValueKind::Array),
        b'"' => Some(ValueKind::String),
        b'-' | b'0'..=b'9' => Some(ValueKind::Number),
        b't' => Some(ValueKind::True),
        b'f' => Some(ValueKind::False),
        b'n' => Some(ValueKind::Null),
        _ => None,
    }
}

/// Bytes already read from a source, kept so that a later scan over the
/// same region does not read them again. Sources are never written to, so a
/// window stays valid after other scans have moved the source.
#[derive(Debug, Default)]
pub(crate) struct Window {
    buf: Vec<u8>,
    /// Absolute position of `buf[0]`
    start: Position,
    filled: usize,
    /// The source ends right after the filled bytes
    eof: bool,
}

pub(crate) struct Scanner<'s, S: ByteSource> {
    source: &'s mut S,
    window: Window,
    cursor: usize,
    read_chunk: usize,
    max_depth: usize,
}

impl<'s, S: ByteSource> Scanner<'s, S> {
    /// Start scanning `source` at `pos`. Nothing is read until a byte is
    /// needed.
    pub fn new(source: &'s mut S, pos: Position, config: &Config) -> Self {
        Self::resume(source, Window::default(), pos, config)
    }

    /// Like [`Scanner::new`], reusing the bytes of an earlier scan when `pos`
    /// falls inside them.
    pub fn resume(source: &'s mut S, mut window: Window, pos: Position, config: &Config) -> Self {
        let end = window.start + window.filled as Position;
        let cursor = if (window.start..=end).contains(&pos) {
            (pos - window.start) as usize
        } else {
            window.start = pos;
            window.filled = 0;
            window.eof = false;
            0
        };
        Self {
            source,
            window,
            cursor,
            read_chunk: config.read_chunk.max(1),
            max_depth: config.max_depth,
        }
    }

    /// Hand back the bytes read so far for a later [`Scanner::resume`].
    pub fn into_window(self) -> Window {
        self.window
    }

    /// Absolute position of the next unread byte.
    pub fn position(&self) -> Position {
        self.window.start + self.cursor as Position
    }

    fn unexpected_end(&self) -> Error {
        Error::UnexpectedEnd {
            position: self.position(),
        }
    }

    fn malformed(&self, reason: Malformed) -> Error {
        Error::malformed(self.position(), reason)
    }

    fn peek(&mut self) -> Result<Option<u8>, Error> {
        if self.cursor == self.window.filled {
            if self.window.eof {
                return Ok(None);
            }
            let next = self.position();
            self.source.seek(next)?;
            if self.window.buf.len() != self.read_chunk {
                self.window.buf.resize(self.read_chunk, 0);
            }
            self.window.start = next;
            self.window.filled = 0;
            self.cursor = 0;
            self.window.filled = self.source.read(&mut self.window.buf)?;
            if self.window.filled == 0 {
                self.window.eof = true;
                return Ok(None);
            }
        }
        Ok(self.window.buf.get(self.cursor).copied())
    }

    fn bump(&mut self) {
        self.cursor += 1;
    }

    fn next_byte(&mut self) -> Result<u8, Error> {
        let b = self.peek()?.ok_or_else(|| self.unexpected_end())?;
        self.bump();
        Ok(b)
    }

    /// Skip whitespace and `//` comments, returning the next significant byte
    /// without consuming it, or `None` at the end of the source.
    fn trivia(&mut self) -> Result<Option<u8>, Error> {
        loop {
            match self.peek()? {
                Some(b) if is_whitespace(b) => self.bump(),
                Some(b'/') => {
                    let slash = self.position();
                    self.bump();
                    if self.peek()? != Some(b'/') {
                        // A lone slash never starts a token
                        return Err(Error::malformed(slash, Malformed::UnexpectedByte(b'/')));
                    }
                    while let Some(b) = self.peek()? {
                        self.bump();
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                other => return Ok(other),
            }
        }
    }

    /// Advance to the next significant byte and return its position.
    pub fn skip_trivia(&mut self) -> Result<Position, Error> {
        match self.trivia()? {
            Some(_) => Ok(self.position()),
            None => Err(self.unexpected_end()),
        }
    }

    fn significant(&mut self) -> Result<u8, Error> {
        self.trivia()?.ok_or_else(|| self.unexpected_end())
    }

    /// Decide the kind of the value at the next significant byte.
    ///
    /// Literals are matched in full, which consumes them; every other kind
    /// leaves the scanner on the value's first byte.
    pub fn classify(&mut self) -> Result<ValueKind, Error> {
        let b = self.significant()?;
        let kind = kind_of(b).ok_or_else(|| self.malformed(Malformed::UnexpectedByte(b)))?;
        if let Some(literal) = kind.literal() {
            self.expect_literal(literal)?;
        }
        Ok(kind)
    }

    fn expect_literal(&mut self, literal: &[u8]) -> Result<(), Error> {
        let start = self.position();
        for &expected in literal {
            match self.peek()? {
                Some(b) if b == expected => self.bump(),
                Some(_) => return Err(Error::malformed(start, Malformed::InvalidLiteral)),
                None => return Err(self.unexpected_end()),
            }
        }
        Ok(())
    }

    /// Skip one complete value and return the position right after it.
    ///
    /// Containers are walked iteratively; only the pending closing brackets
    /// are remembered.
    pub fn skip_value(&mut self) -> Result<Position, Error> {
        let mut closers: SmallVec<[u8; 16]> = SmallVec::new();
        loop {
            let opened = match self.significant()? {
                b'[' => Some(b']'),
                b'{' => Some(b'}'),
                _ => None,
            };
            match opened {
                Some(closer) => {
                    if closers.len() >= self.max_depth {
                        return Err(Error::MaxDepthReached {
                            position: self.position(),
                        });
                    }
                    if !self.open_container(closer)? {
                        closers.push(closer);
                        if closer == b'}' {
                            self.skip_member_key()?;
                        }
                        continue;
                    }
                }
                None => self.skip_scalar()?,
            }

            // A value just ended, close every container it completes
            loop {
                let Some(&closer) = closers.last() else {
                    return Ok(self.position());
                };
                if self.after_element(closer)? {
                    closers.pop();
                } else {
                    if closer == b'}' {
                        self.skip_member_key()?;
                    }
                    break;
                }
            }
        }
    }

    fn skip_scalar(&mut self) -> Result<(), Error> {
        let b = self.significant()?;
        match kind_of(b) {
            Some(ValueKind::String) => self.skip_string(),
            Some(ValueKind::Number) => self.number_literal().map(|_| ()),
            Some(kind) => match kind.literal() {
                Some(literal) => self.expect_literal(literal),
                None => Err(self.malformed(Malformed::UnexpectedByte(b))),
            },
            None => Err(self.malformed(Malformed::UnexpectedByte(b))),
        }
    }

    /// Consume an opening bracket. Returns true if the container is empty, in
    /// which case its closing bracket is consumed too.
    pub fn open_container(&mut self, closer: u8) -> Result<bool, Error> {
        self.significant()?;
        self.bump();
        if self.significant()? == closer {
            self.bump();
            return Ok(true);
        }
        Ok(false)
    }

    /// After an element of a container closed by `closer`: consume the
    /// separator. Returns true if the container ended, accepting a single
    /// trailing comma before the closing bracket.
    pub fn after_element(&mut self, closer: u8) -> Result<bool, Error> {
        match self.significant()? {
            b',' => {
                self.bump();
                if self.significant()? == closer {
                    log::trace!("trailing comma before '{}'", closer as char);
                    self.bump();
                    return Ok(true);
                }
                Ok(false)
            }
            b if b == closer => {
                self.bump();
                Ok(true)
            }
            b => Err(self.malformed(Malformed::UnexpectedByte(b))),
        }
    }

    fn expect_key_start(&mut self) -> Result<(), Error> {
        let b = self.significant()?;
        if b != b'"' {
            let reason = match kind_of(b) {
                Some(kind) => Malformed::NonStringKey(kind),
                None => Malformed::UnexpectedByte(b),
            };
            return Err(self.malformed(reason));
        }
        Ok(())
    }

    fn skip_colon(&mut self) -> Result<(), Error> {
        if self.significant()? != b':' {
            return Err(self.malformed(Malformed::MissingColon));
        }
        self.bump();
        self.skip_trivia().map(|_| ())
    }

    /// Skip `"key":` and stop on the member's value.
    pub fn skip_member_key(&mut self) -> Result<(), Error> {
        self.expect_key_start()?;
        self.skip_string()?;
        self.skip_colon()
    }

    /// Read `"key":` and stop on the member's value.
    pub fn read_member_key(&mut self) -> Result<String, Error> {
        self.expect_key_start()?;
        let key = self.parse_string()?;
        self.skip_colon()?;
        Ok(key)
    }

    fn skip_string(&mut self) -> Result<(), Error> {
        self.bump(); // opening quote
        loop {
            match self.next_byte()? {
                b'"' => return Ok(()),
                b'\\' => {
                    if self.next_byte()? == b'u' {
                        for _ in 0..4 {
                            self.next_byte()?;
                        }
                    }
                }
                b if b < 0x20 => return Err(self.control_byte(b)),
                _ => {}
            }
        }
    }

    /// A raw control byte inside a string, just consumed.
    fn control_byte(&self, b: u8) -> Error {
        Error::malformed(self.position() - 1, Malformed::UnexpectedByte(b))
    }

    fn hex4(&mut self) -> Result<u32, Error> {
        let start = self.position();
        let mut hex = [0u8; 4];
        for slot in hex.iter_mut() {
            *slot = self.next_byte()?;
        }
        EscapeProcessor::decode_hex4(hex).map_err(|reason| Error::malformed(start, reason))
    }

    fn parse_string(&mut self) -> Result<String, Error> {
        let start = self.position();
        self.bump(); // opening quote
        let mut out = Vec::new();
        loop {
            match self.next_byte()? {
                b'"' => break,
                b'\\' => {
                    let escape = self.position() - 1;
                    match self.next_byte()? {
                        b'u' => {
                            let codepoint = self.hex4()?;
                            let ch = if EscapeProcessor::is_high_surrogate(codepoint) {
                                if self.next_byte()? != b'\\' || self.next_byte()? != b'u' {
                                    return Err(Error::malformed(
                                        escape,
                                        Malformed::InvalidUnicodeCodepoint,
                                    ));
                                }
                                let low = self.hex4()?;
                                EscapeProcessor::combine_surrogate_pair(codepoint, low)
                            } else {
                                EscapeProcessor::single_codepoint(codepoint)
                            };
                            let ch = ch.map_err(|reason| Error::malformed(escape, reason))?;
                            let mut utf8 = [0u8; 4];
                            out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                        }
                        c => {
                            let byte = EscapeProcessor::process_simple_escape(c)
                                .map_err(|reason| Error::malformed(escape, reason))?;
                            out.push(byte);
                        }
                    }
                }
                b if b < 0x20 => return Err(self.control_byte(b)),
                b => out.push(b),
            }
        }
        String::from_utf8(out).map_err(|_| Error::malformed(start, Malformed::InvalidUtf8))
    }

    fn digits(&mut self, literal: &mut NumberLiteral) -> Result<usize, Error> {
        let mut count = 0;
        while let Some(b @ b'0'..=b'9') = self.peek()? {
            literal.push(b);
            self.bump();
            count += 1;
        }
        Ok(count)
    }

    /// Scan `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`, stopping
    /// at the first byte outside that grammar.
    fn number_literal(&mut self) -> Result<NumberLiteral, Error> {
        let start = self.position();
        let invalid = || Error::malformed(start, Malformed::InvalidNumber);
        let mut literal = NumberLiteral::new();

        if self.peek()? == Some(b'-') {
            literal.push(b'-');
            self.bump();
        }
        match self.peek()? {
            Some(b'0') => {
                literal.push(b'0');
                self.bump();
            }
            Some(b'1'..=b'9') => {
                self.digits(&mut literal)?;
            }
            _ => return Err(invalid()),
        }
        if self.peek()? == Some(b'.') {
            literal.push(b'.');
            self.bump();
            if self.digits(&mut literal)? == 0 {
                return Err(invalid());
            }
        }
        if let Some(e @ (b'e' | b'E')) = self.peek()? {
            literal.push(e);
            self.bump();
            if let Some(sign @ (b'+' | b'-')) = self.peek()? {
                literal.push(sign);
                self.bump();
            }
            if self.digits(&mut literal)? == 0 {
                return Err(invalid());
            }
        }
        Ok(literal)
    }

    /// Parse the value at the next significant byte, containers included.
    ///
    /// Containers are built on an explicit stack, so the nesting allowed by
    /// `max_depth` never depends on the native stack. Every byte is read once.
    pub fn parse_value(&mut self) -> Result<Value, Error> {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let mut value = match self.significant()? {
                b @ (b'[' | b'{') => {
                    if stack.len() >= self.max_depth {
                        return Err(Error::MaxDepthReached {
                            position: self.position(),
                        });
                    }
                    let mut frame = if b == b'{' {
                        Frame::Object(Map::new(), String::new())
                    } else {
                        Frame::Array(Vec::new())
                    };
                    if self.open_container(frame.closer())? {
                        frame.into_value()
                    } else {
                        if let Frame::Object(_, key) = &mut frame {
                            *key = self.read_member_key()?;
                        }
                        stack.push(frame);
                        continue;
                    }
                }
                b => {
                    let kind = kind_of(b).ok_or_else(|| self.malformed(Malformed::UnexpectedByte(b)))?;
                    self.parse_scalar(kind)?
                }
            };

            // Hand the finished value to its parent, closing every container it completes
            loop {
                let Some(mut frame) = stack.pop() else {
                    return Ok(value);
                };
                frame.push(value);
                if self.after_element(frame.closer())? {
                    value = frame.into_value();
                } else {
                    if let Frame::Object(_, key) = &mut frame {
                        *key = self.read_member_key()?;
                    }
                    stack.push(frame);
                    break;
                }
            }
        }
    }

    /// Build the value of a scalar of `kind` starting at the next significant byte.
    pub fn parse_scalar(&mut self, kind: ValueKind) -> Result<Value, Error> {
        let start = self.skip_trivia()?;
        match kind {
            ValueKind::String => self.parse_string().map(Value::String),
            ValueKind::Number => {
                let literal = self.number_literal()?;
                parse_number(&literal).map_err(|reason| Error::malformed(start, reason))
            }
            ValueKind::True => self.expect_literal(b"true").map(|_| Value::Bool(true)),
            ValueKind::False => self.expect_literal(b"false").map(|_| Value::Bool(false)),
            ValueKind::Null => self.expect_literal(b"null").map(|_| Value::Null),
            ValueKind::Object | ValueKind::Array => {
                Err(Error::type_mismatch("parse as a scalar", kind))
            }
        }
    }
}
