//! Numeric literals: grammar validation, parsing and formatting.

use lexical_parse_float::FromLexical as _;
use lexical_parse_integer::FromLexical as _;

use crate::{
    codec::{Decode, Encode, JsonValue, Kind},
    decoder::Decoder,
    encoder::{Encoder, Sink},
    error::{DecodeError, EncodeError, ErrorKind},
    scan::is_plain_end,
};

/// Longest numeric literal a decoder accepts, in bytes.
pub const MAX_NUMBER_LEN: usize = 40;

/// Length of the JSON number at the start of `bytes`.
///
/// Returns `Err(offset)` with the offset of the first byte that breaks the
/// grammar, which may be `bytes.len()` when the literal is cut short.
pub(crate) fn grammar_len(bytes: &[u8]) -> Result<usize, usize> {
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut i = usize::from(bytes.first() == Some(&b'-'));
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = digits_from(i + 1),
        _ => return Err(i),
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        if !bytes.get(i).is_some_and(u8::is_ascii_digit) {
            return Err(i);
        }
        i = digits_from(i);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if !bytes.get(i).is_some_and(u8::is_ascii_digit) {
            return Err(i);
        }
        i = digits_from(i);
    }
    Ok(i)
}

/// Whether `literal` is exactly one JSON number.
pub(crate) fn is_valid(literal: &[u8]) -> bool {
    grammar_len(literal) == Ok(literal.len())
}

impl<'a> Decoder<'a> {
    /// Consumes the raw literal up to the next terminator and validates it.
    pub(crate) fn number_literal(&mut self) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest.iter().position(|&b| is_plain_end(b)).unwrap_or(rest.len());
        let literal = &rest[..len];
        if len == 0 || len > MAX_NUMBER_LEN || !is_valid(literal) {
            return Err(self.error(ErrorKind::IllformedNumber));
        }
        self.pos += len;
        Ok(literal)
    }

    /// Skips a number, reporting grammar violations as unexpected symbols.
    pub(crate) fn skip_number(&mut self) -> Result<(), DecodeError> {
        let rest = &self.input[self.pos..];
        match grammar_len(rest) {
            Ok(len) => {
                self.pos += len;
                match rest.get(len) {
                    Some(&b) if !is_plain_end(b) => Err(self.error(ErrorKind::UnexpectedSymbol)),
                    _ => Ok(()),
                }
            }
            Err(at) if at == rest.len() => {
                self.pos += at;
                Err(self.error(ErrorKind::UnexpectedEndOfData))
            }
            Err(at) => {
                self.pos += at;
                Err(self.error(ErrorKind::UnexpectedSymbol))
            }
        }
    }
}

macro_rules! impl_float {
    ($($ty:ty),*) => {$(
        impl JsonValue for $ty {
            const KIND: Kind = Kind::Plain;
        }

        impl Decode for $ty {
            fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
                let start = de.pos;
                let literal = de.number_literal()?;
                *self = <$ty>::from_lexical(literal)
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or(DecodeError::new(ErrorKind::IllformedNumber, start))?;
                Ok(())
            }

            fn reset(&mut self) {
                *self = 0.0;
            }
        }

        impl Encode for $ty {
            fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
                // NaN and infinities have no JSON form and collapse to zero.
                if self.is_finite() {
                    enc.write(ryu::Buffer::new().format_finite(*self).as_bytes())
                } else {
                    enc.write(b"0")
                }
            }
        }
    )*};
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl JsonValue for $ty {
            const KIND: Kind = Kind::Plain;
        }

        impl Decode for $ty {
            fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
                // `MAX as f64` may round up to the next power of two.
                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_lossless,
                    clippy::float_cmp
                )]
                fn narrow(f: f64) -> Option<$ty> {
                    if f >= <$ty>::MIN as f64 && f < <$ty>::MAX as f64 + 1.0 {
                        let v = f as $ty;
                        (v as f64 == f).then_some(v)
                    } else {
                        None
                    }
                }

                let start = de.pos;
                let literal = de.number_literal()?;
                // Exponent forms go through `f64` and are exact up to 2^53.
                *self = match <$ty>::from_lexical(literal) {
                    Ok(v) => v,
                    Err(_) => zero_fraction_prefix(literal)
                        .and_then(|int| <$ty>::from_lexical(int).ok())
                        .or_else(|| finite_float(literal).and_then(narrow))
                        .ok_or(DecodeError::new(ErrorKind::IllformedNumber, start))?,
                };
                Ok(())
            }

            fn reset(&mut self) {
                *self = 0;
            }
        }

        impl Encode for $ty {
            fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
                enc.write(itoa::Buffer::new().format(*self).as_bytes())
            }
        }
    )*};
}

/// The integer part of `literal` when its fraction is all zeros and there is
/// no exponent, so `-12.000` yields `-12`.
fn zero_fraction_prefix(literal: &[u8]) -> Option<&[u8]> {
    let dot = literal.iter().position(|&b| b == b'.')?;
    let (int, frac) = literal.split_at(dot);
    frac[1..].iter().all(|&b| b == b'0').then_some(int)
}

/// Last chance for integer destinations: literals like `1e3` or `2.5e1`.
fn finite_float(literal: &[u8]) -> Option<f64> {
    f64::from_lexical(literal).ok().filter(|f| f.is_finite())
}

impl_float!(f32, f64);
impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
