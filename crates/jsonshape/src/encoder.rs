//! Serialization through a caller-supplied sink.

use alloc::{string::String, vec::Vec};

use crate::{codec::Encode, error::EncodeError};

/// Receives encoded output.
///
/// Returning `false` aborts the encode; nothing is written after that.
pub trait Sink {
    /// Accepts the next run of output bytes.
    fn accept(&mut self, bytes: &[u8]) -> bool;
}

impl<F: FnMut(&[u8]) -> bool> Sink for F {
    fn accept(&mut self, bytes: &[u8]) -> bool {
        self(bytes)
    }
}

impl Sink for Vec<u8> {
    fn accept(&mut self, bytes: &[u8]) -> bool {
        self.extend_from_slice(bytes);
        true
    }
}

/// Write half handed to [`Encode`] impls.
pub struct Encoder<'s, S: Sink + ?Sized> {
    sink: &'s mut S,
}

impl<'s, S: Sink + ?Sized> Encoder<'s, S> {
    /// Wraps `sink`.
    pub fn new(sink: &'s mut S) -> Self {
        Self { sink }
    }

    /// Passes `bytes` to the sink.
    ///
    /// # Errors
    ///
    /// [`EncodeError::SinkRejected`] when the sink asks to stop.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        if self.sink.accept(bytes) {
            Ok(())
        } else {
            Err(EncodeError::SinkRejected)
        }
    }

    /// Writes `bytes` as a quoted, escaped JSON string.
    ///
    /// # Errors
    ///
    /// Fails on sink rejection or on a control byte JSON cannot escape.
    pub fn write_str(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        crate::escape::write_quoted(bytes, self)
    }

    /// Writes any encodable value.
    ///
    /// # Errors
    ///
    /// Propagates the value's encode error.
    pub fn write_value<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.encode(self)
    }
}

/// Encodes `value` through `sink`.
///
/// Bytes already passed to the sink before a failure stay with the caller.
///
/// # Errors
///
/// Returns [`EncodeError::SinkRejected`] as soon as the sink returns `false`,
/// or the value's own error (for example a string with a raw control byte).
///
/// # Examples
///
/// ```rust
/// let mut total = 0;
/// let mut sink = |bytes: &[u8]| {
///     total += bytes.len();
///     true
/// };
/// jsonshape::encode(&vec![1i64, 20, 300], &mut sink).unwrap();
/// assert_eq!(total, "[1,20,300]".len());
/// ```
pub fn encode<T: Encode + ?Sized, S: Sink + ?Sized>(
    value: &T,
    sink: &mut S,
) -> Result<(), EncodeError> {
    let result = value.encode(&mut Encoder::new(sink));
    if let Err(err) = &result {
        log::debug!("encode failed: {err}");
    }
    result
}

/// Encodes `value` into a new byte vector.
///
/// # Errors
///
/// See [`encode`].
pub fn to_vec<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode(value, &mut out)?;
    Ok(out)
}

/// Encodes `value` into a new string.
///
/// # Errors
///
/// See [`encode`]; additionally [`EncodeError::InvalidUtf8`] when byte-string
/// content is not UTF-8.
pub fn to_string<T: Encode + ?Sized>(value: &T) -> Result<String, EncodeError> {
    String::from_utf8(to_vec(value)?).map_err(|_| EncodeError::InvalidUtf8)
}
