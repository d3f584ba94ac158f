use crate::{
    decoder::Decoder,
    encoder::{Encoder, Sink},
    error::{DecodeError, EncodeError},
};

/// The JSON shape of a type, fixed when the type is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A scalar: boolean, number, string or custom-mapped string.
    Plain,
    /// An ordered, homogeneous sequence.
    Array,
    /// A record with a fixed set of named fields.
    Object,
    /// A string-keyed collection of homogeneous values.
    Map,
}

/// A type with a statically known JSON shape.
pub trait JsonValue {
    /// The shape this type reads and writes.
    const KIND: Kind;
}

/// A destination that can be overwritten in place from JSON text.
pub trait Decode: JsonValue {
    /// Decodes one non-null value into `self`.
    ///
    /// The decoder is positioned on the first byte of the value; leading
    /// whitespace and `null` have already been handled by the caller. On
    /// success the decoder is positioned just past the value.
    ///
    /// # Errors
    ///
    /// Returns the first structural, content, capacity or policy error
    /// encountered.
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError>;

    /// Assigns the default value, as a JSON `null` or an absent field does.
    fn reset(&mut self);
}

/// A value that can be written out as JSON text.
pub trait Encode: JsonValue {
    /// Writes `self` through the encoder's sink.
    ///
    /// # Errors
    ///
    /// Fails as soon as the sink rejects output or the value cannot be
    /// represented.
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError>;
}
