// SPDX-License-Identifier: Apache-2.0

//! A lazy reader for large JSON documents and streams of JSON values.
//!
//! Nothing is parsed up front. A [`Node`] is just a position in a
//! [`ByteSource`] and the kind of value found there; indexing, length,
//! membership and iteration scan forward from that position only as far as
//! they need to. A [`Cursor`] walks the top-level values of one or more
//! sources in order.
//!
//! Besides plain JSON, `//` line comments are accepted wherever whitespace
//! is, and a single trailing comma may precede `]` or `}`.
//!
//! ```
//! use lazyjson::{ChunkSource, Cursor, Value};
//!
//! let json = br#"
//!     {
//!         "name": "sensor", // comment
//!         "samples": [3, 1, 4, 1, 5,],
//!     }
//! "#;
//! let cursor = Cursor::new(ChunkSource::new(json, 8)).unwrap();
//! assert_eq!(cursor.len().unwrap(), 2);
//! let samples = cursor.index("samples").unwrap();
//! assert_eq!(samples.index(-1).unwrap().value().unwrap(), Value::Int(5));
//! ```

mod byte_source;
pub use byte_source::{ByteSource, ChunkSource};

mod cursor;
pub use cursor::Cursor;

mod error;
pub use error::{Error, Malformed};

mod escape_processor;

mod iter;
pub use iter::{Child, Elements, Items, Iter, Keys};

mod json_number;

mod node;
pub use node::{Key, Node};

mod scanner;

mod shared;
pub use shared::{Config, Position, ValueKind};

mod value;
pub use value::{Map, Value};
