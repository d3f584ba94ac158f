//! A zero-copy JSON codec driven by statically declared type shapes.
//!
//! Every type that takes part in encoding or decoding declares its JSON
//! [`Kind`] up front: a plain scalar, an array, a record (object with a fixed
//! set of named fields) or a map. Records describe their fields once per type
//! through the [`Record`] trait, usually generated by `#[derive(Record)]`.
//! Decoding walks the input bytes directly and writes into caller-owned
//! memory; no intermediate JSON tree is built.
//!
//! ```rust
//! use jsonshape::{DecodeFlags, Record};
//!
//! #[derive(Debug, Default, PartialEq, Record)]
//! struct Point {
//!     x: i64,
//!     #[json(rename = "y-coord")]
//!     y: f64,
//!     #[json(skip)]
//!     hits: u32,
//! }
//!
//! let mut p = Point::default();
//! jsonshape::decode(&mut p, br#"{"x": 3, "y-coord": -1.5}"#, DecodeFlags::empty()).unwrap();
//! assert_eq!(p, Point { x: 3, y: -1.5, hits: 0 });
//!
//! let text = jsonshape::to_string(&p).unwrap();
//! assert_eq!(text, r#"{"x":3,"y-coord":-1.5}"#);
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

// Lets the derive output name `::jsonshape` from inside this crate.
extern crate self as jsonshape;

mod codec;
mod container;
mod decoder;
mod encoder;
mod error;
mod escape;
mod mapped;
mod number;
mod options;
mod record;
mod scalar;
mod scan;

#[cfg(test)]
mod tests;

pub use codec::{Decode, Encode, JsonValue, Kind};
pub use container::MapKey;
pub use decoder::{Decoder, decode, decode_with_options};
pub use encoder::{Encoder, Sink, encode, to_string, to_vec};
pub use error::{DecodeError, EncodeError, ErrorKind, MapperError};
pub use mapped::StringMapper;
pub use number::MAX_NUMBER_LEN;
pub use options::{DecodeFlags, DecodeOptions};
pub use record::{
    FieldDescriptor, FilledFields, KeyEntry, KeyIndex, KeyMatcher, Record, decode_record,
    encode_record, reset_record,
};
pub use scalar::FixedString;

#[cfg(feature = "derive")]
pub use jsonshape_derive::Record;

#[doc(hidden)]
pub mod __private {
    pub use crate::mapped::{decode_mapped, encode_mapped};
}
