//! Booleans, strings and `Option`.

use alloc::string::String;
use core::fmt;

use bstr::{BStr, BString};

use crate::{
    codec::{Decode, Encode, JsonValue, Kind},
    decoder::Decoder,
    encoder::{Encoder, Sink},
    error::{DecodeError, EncodeError, ErrorKind},
};

impl JsonValue for bool {
    const KIND: Kind = Kind::Plain;
}

impl Decode for bool {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        let (value, len) = if de.at_literal(b"true") {
            (true, 4)
        } else if de.at_literal(b"false") {
            (false, 5)
        } else {
            return Err(de.error(ErrorKind::UnexpectedSymbol));
        };
        de.pos += len;
        *self = value;
        Ok(())
    }

    fn reset(&mut self) {
        *self = false;
    }
}

impl Encode for bool {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        enc.write(if *self { b"true" } else { b"false" })
    }
}

impl JsonValue for String {
    const KIND: Kind = Kind::Plain;
}

impl Decode for String {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        let raw = de.string_literal()?;
        let mut bytes = core::mem::take(self).into_bytes();
        bytes.clear();
        raw.unescape_into(&mut bytes)?;
        *self = String::from_utf8(bytes)
            .map_err(|_| DecodeError::new(ErrorKind::UnexpectedSymbol, raw.start))?;
        Ok(())
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl Encode for String {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        enc.write_str(self.as_bytes())
    }
}

impl JsonValue for str {
    const KIND: Kind = Kind::Plain;
}

impl Encode for str {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        enc.write_str(self.as_bytes())
    }
}

impl JsonValue for BString {
    const KIND: Kind = Kind::Plain;
}

impl Decode for BString {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        let raw = de.string_literal()?;
        self.clear();
        raw.unescape_into(&mut **self)
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl Encode for BString {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        enc.write_str(self)
    }
}

/// A string stored inline in `N` bytes.
///
/// Content shorter than `N` is padded with NUL bytes; the logical value ends
/// at the first NUL. Decoding content longer than `N` bytes fails with
/// [`ErrorKind::FixedSizeContainerOverflow`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedString<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedString<N> {
    /// An empty string.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }

    /// Copies `bytes`, or returns `None` if they do not fit.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut out = Self::new();
        out.bytes.get_mut(..bytes.len())?.copy_from_slice(bytes);
        Some(out)
    }

    /// The content up to the first NUL.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        &self.bytes[..len]
    }

    /// The content as text, if it is UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    /// The full backing storage, padding included.
    #[must_use]
    pub fn storage(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(BStr::new(self.as_bytes()), f)
    }
}

impl<const N: usize> JsonValue for FixedString<N> {
    const KIND: Kind = Kind::Plain;
}

impl<const N: usize> Decode for FixedString<N> {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        let raw = de.string_literal()?;
        let content = raw.unescaped()?;
        *self = Self::from_bytes(&content)
            .ok_or(DecodeError::new(ErrorKind::FixedSizeContainerOverflow, raw.start))?;
        Ok(())
    }

    fn reset(&mut self) {
        self.bytes = [0; N];
    }
}

impl<const N: usize> Encode for FixedString<N> {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        enc.write_str(self.as_bytes())
    }
}

impl<T: JsonValue> JsonValue for Option<T> {
    const KIND: Kind = T::KIND;
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        self.get_or_insert_with(T::default).decode(de)
    }

    fn reset(&mut self) {
        *self = None;
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        match self {
            Some(value) => value.encode(enc),
            None => enc.write(b"null"),
        }
    }
}

impl<T: JsonValue + ?Sized> JsonValue for &T {
    const KIND: Kind = T::KIND;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<S: Sink + ?Sized>(&self, enc: &mut Encoder<'_, S>) -> Result<(), EncodeError> {
        (**self).encode(enc)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use bstr::BString;
    use rstest::rstest;

    use super::FixedString;
    use crate::{DecodeFlags, ErrorKind, decode, to_string};

    fn decoded<T: crate::Decode + Default>(input: &str) -> Result<T, (ErrorKind, usize)> {
        let mut out = T::default();
        decode(&mut out, input.as_bytes(), DecodeFlags::empty())
            .map_err(|e| (e.kind(), e.offset()))?;
        Ok(out)
    }

    #[rstest]
    #[case("true", Ok(true))]
    #[case(" false ", Ok(false))]
    #[case("null", Ok(false))]
    #[case("truex", Err((ErrorKind::UnexpectedSymbol, 0)))]
    #[case("fals", Err((ErrorKind::UnexpectedSymbol, 0)))]
    #[case("1", Err((ErrorKind::UnexpectedSymbol, 0)))]
    fn decodes_booleans(#[case] input: &str, #[case] expected: Result<bool, (ErrorKind, usize)>) {
        assert_eq!(decoded::<bool>(input), expected);
    }

    #[test]
    fn string_reuses_its_allocation() {
        let mut s = String::with_capacity(64);
        s.push_str("previous content");
        let ptr = s.as_ptr();
        decode(&mut s, br#""new""#, DecodeFlags::empty()).unwrap();
        assert_eq!(s, "new");
        assert_eq!(s.as_ptr(), ptr);
    }

    #[test]
    fn string_must_be_utf8() {
        assert_eq!(decoded::<String>("  \"\u{e9}\""), Ok("\u{e9}".to_string()));
        let mut s = String::new();
        let err = decode(&mut s, b"  \"\xff\"", DecodeFlags::empty()).unwrap_err();
        assert_eq!((err.kind(), err.offset()), (ErrorKind::UnexpectedSymbol, 2));

        let mut b = BString::default();
        decode(&mut b, b"\"\xff\"", DecodeFlags::empty()).unwrap();
        assert_eq!(b, BString::from(&b"\xff"[..]));
    }

    #[test]
    fn fixed_string_pads_and_overflows() {
        let s = decoded::<FixedString<4>>(r#""ab""#).unwrap();
        assert_eq!(s.storage(), b"ab\0\0");
        assert_eq!(s.as_str(), Some("ab"));
        assert_eq!(to_string(&s).unwrap(), r#""ab""#);

        let full = decoded::<FixedString<4>>(r#""abcd""#).unwrap();
        assert_eq!(full.as_bytes(), b"abcd");

        assert_eq!(
            decoded::<FixedString<4>>(r#" "abcde""#),
            Err((ErrorKind::FixedSizeContainerOverflow, 1))
        );
    }

    #[test]
    fn option_follows_null() {
        assert_eq!(decoded::<Option<i32>>("7"), Ok(Some(7)));
        assert_eq!(decoded::<Option<i32>>("null"), Ok(None));

        let mut value = Some(3u8);
        decode(&mut value, b"null", DecodeFlags::empty()).unwrap();
        assert_eq!(value, None);

        assert_eq!(to_string(&None::<u8>).unwrap(), "null");
        assert_eq!(to_string(&Some(true)).unwrap(), "true");
    }

    #[test]
    fn null_needs_a_terminator() {
        assert_eq!(
            decoded::<Option<bool>>("nullx"),
            Err((ErrorKind::UnexpectedSymbol, 0))
        );
    }
}
