//! Lexical scanners over the decoder cursor.
//!
//! Everything here either validates or discards input; nothing writes into a
//! destination. Every advancing step checks for the end of input first and
//! reports [`ErrorKind::UnexpectedEndOfData`] instead of reading past it.

use alloc::{borrow::Cow, vec::Vec};

use crate::{
    decoder::{Decoder, Members},
    error::{DecodeError, ErrorKind},
    escape::unescape_into,
};

#[inline]
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t')
}

/// Bytes that may follow a plain value.
#[inline]
pub(crate) fn is_plain_end(b: u8) -> bool {
    matches!(b, b']' | b',' | b'}') || is_space(b)
}

/// The still-escaped content of a string literal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawStr<'a> {
    /// Bytes between the quotes.
    pub(crate) bytes: &'a [u8],
    /// Offset of the opening quote.
    pub(crate) start: usize,
    /// Whether `bytes` contains at least one escape sequence.
    pub(crate) escaped: bool,
}

impl<'a> RawStr<'a> {
    /// Offset of the first content byte.
    pub(crate) fn content_start(&self) -> usize {
        self.start + 1
    }

    /// Appends the unescaped content to `out`.
    pub(crate) fn unescape_into(&self, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        if self.escaped {
            unescape_into(self.bytes, self.content_start(), out)
        } else {
            out.extend_from_slice(self.bytes);
            Ok(())
        }
    }

    /// The unescaped content, borrowed from the input when it has no escapes.
    pub(crate) fn unescaped(&self) -> Result<Cow<'a, [u8]>, DecodeError> {
        if self.escaped {
            let mut out = Vec::with_capacity(self.bytes.len());
            unescape_into(self.bytes, self.content_start(), &mut out)?;
            Ok(Cow::Owned(out))
        } else {
            Ok(Cow::Borrowed(self.bytes))
        }
    }
}

impl<'a> Decoder<'a> {
    /// Reads a string literal whose opening quote is under the cursor.
    pub(crate) fn string_literal(&mut self) -> Result<RawStr<'a>, DecodeError> {
        if self.peek()? != b'"' {
            return Err(self.error(ErrorKind::UnexpectedSymbol));
        }
        let start = self.pos;
        let (end, escaped) = self.find_string_end(start + 1)?;
        self.pos = end + 1;
        Ok(RawStr {
            bytes: &self.input[start + 1..end],
            start,
            escaped,
        })
    }

    /// Finds the closing quote of a string whose content starts at `from`.
    ///
    /// Returns the offset of the quote and whether any escape was seen.
    /// Escape sequences are validated on the way.
    pub(crate) fn find_string_end(&self, from: usize) -> Result<(usize, bool), DecodeError> {
        let input = self.input;
        let strict = self.strict();
        let eof = || DecodeError::new(ErrorKind::UnexpectedEndOfData, input.len());
        let mut escaped = false;
        let mut i = from;
        while let Some(&b) = input.get(i) {
            match b {
                b'"' => return Ok((i, escaped)),
                b'\\' => {
                    escaped = true;
                    match *input.get(i + 1).ok_or_else(eof)? {
                        b'"' | b'/' | b'\\' | b'b' | b'f' | b'r' | b'n' | b't' => i += 2,
                        b'u' => {
                            for k in i + 2..i + 6 {
                                if !input.get(k).ok_or_else(eof)?.is_ascii_hexdigit() {
                                    return Err(DecodeError::new(ErrorKind::UnexpectedSymbol, k));
                                }
                            }
                            i += 6;
                        }
                        _ => return Err(DecodeError::new(ErrorKind::UnexpectedSymbol, i + 1)),
                    }
                }
                b if strict && b < 0x20 => {
                    return Err(DecodeError::new(ErrorKind::UnexpectedSymbol, i));
                }
                _ => i += 1,
            }
        }
        Err(eof())
    }

    /// Consumes one value of any shape without producing output.
    ///
    /// `depth` is how many levels the value may still nest, counting itself.
    pub(crate) fn skip_value(&mut self, depth: u8) -> Result<(), DecodeError> {
        let b = self.skip_whitespace()?;
        let Some(inner) = depth.checked_sub(1) else {
            return Err(self.error(ErrorKind::SkippingMaxRecursion));
        };
        match b {
            b'[' => self.skip_array(inner),
            b'{' => self.skip_object(inner),
            b'"' => self.string_literal().map(|_| ()),
            b't' => self.skip_literal(b"true"),
            b'f' => self.skip_literal(b"false"),
            b'n' => self.skip_literal(b"null"),
            _ => self.skip_number(),
        }
    }

    fn skip_literal(&mut self, literal: &[u8]) -> Result<(), DecodeError> {
        if self.at_literal(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(self.error(ErrorKind::SkippingError))
        }
    }

    fn skip_array(&mut self, depth: u8) -> Result<(), DecodeError> {
        self.bump();
        let mut members = Members::new(self);
        loop {
            if self.skip_whitespace()? == b']' {
                members.close(self)?;
                self.bump();
                return Ok(());
            }
            members.member(self)?;
            self.skip_value(depth)?;
            members.separator(self)?;
        }
    }

    fn skip_object(&mut self, depth: u8) -> Result<(), DecodeError> {
        self.bump();
        let mut members = Members::new(self);
        loop {
            if self.skip_whitespace()? == b'}' {
                members.close(self)?;
                self.bump();
                return Ok(());
            }
            members.member(self)?;
            self.string_literal()?;
            self.skip_whitespace_until(b':')?;
            self.skip_value(depth)?;
            members.separator(self)?;
        }
    }
}
