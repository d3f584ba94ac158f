//! Decode context and entry points.
//!
//! A [`Decoder`] owns the cursor over one contiguous input slice together with
//! the options of the current call. It is created by [`decode`] /
//! [`decode_with_options`], handed down through every [`Decode`] impl, and
//! dropped when the call returns. All failures are returned as
//! [`DecodeError`] values carrying the byte offset where they were detected.

use crate::{
    codec::Decode,
    error::{DecodeError, ErrorKind},
    options::{DecodeFlags, DecodeOptions},
    scan::{is_plain_end, is_space},
};

/// Cursor and policy for a single decode call.
#[derive(Debug)]
pub struct Decoder<'a> {
    pub(crate) input: &'a [u8],
    pub(crate) pos: usize,
    options: DecodeOptions,
}

/// Decodes `input` into `dest` in place.
///
/// Growable containers inside `dest` are cleared and rebuilt, fields that are
/// absent from the input are reset to their default value (unless
/// [`DecodeFlags::ALL_FIELDS_REQUIRED`] turns that into an error) and fields
/// excluded from mapping are left untouched.
///
/// # Errors
///
/// Returns the first error encountered, with its byte offset from the start
/// of `input`.
///
/// # Examples
///
/// ```rust
/// use jsonshape::{DecodeFlags, ErrorKind};
///
/// let mut ints = [0i64; 3];
/// jsonshape::decode(&mut ints, b"[1, 2, 3]", DecodeFlags::empty()).unwrap();
/// assert_eq!(ints, [1, 2, 3]);
///
/// let err = jsonshape::decode(&mut ints, b"[1, 2]", DecodeFlags::empty()).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::FixedSizeContainerUnderflow);
/// ```
pub fn decode<T: Decode + ?Sized>(
    dest: &mut T,
    input: &[u8],
    flags: DecodeFlags,
) -> Result<(), DecodeError> {
    decode_with_options(dest, input, flags.into())
}

/// Decodes `input` into `dest` in place with explicit [`DecodeOptions`].
///
/// # Errors
///
/// See [`decode`].
pub fn decode_with_options<T: Decode + ?Sized>(
    dest: &mut T,
    input: &[u8],
    options: DecodeOptions,
) -> Result<(), DecodeError> {
    let mut de = Decoder::new(input, options);
    let result = de.decode_value(dest).and_then(|()| de.finish());
    if let Err(err) = &result {
        log::debug!("decode of {} bytes failed: {err}", input.len());
    }
    result
}

impl<'a> Decoder<'a> {
    /// Creates a decoder positioned at the start of `input`.
    #[must_use]
    pub fn new(input: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            input,
            pos: 0,
            options,
        }
    }

    /// The whole input of this call.
    #[must_use]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Current byte offset from the start of input.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Policy flags of this call.
    #[must_use]
    pub fn flags(&self) -> DecodeFlags {
        self.options.flags
    }

    pub(crate) fn strict(&self) -> bool {
        self.options.flags.contains(DecodeFlags::STRICT_SYNTAX)
    }

    pub(crate) fn max_skip_depth(&self) -> u8 {
        self.options.max_skip_depth
    }

    /// An error of `kind` at the current position.
    #[must_use]
    pub fn error(&self, kind: ErrorKind) -> DecodeError {
        DecodeError::new(kind, self.pos)
    }

    /// The byte under the cursor.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnexpectedEndOfData`] when the input is exhausted.
    pub fn peek(&self) -> Result<u8, DecodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.error(ErrorKind::UnexpectedEndOfData))
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    /// Consumes `byte` if it is under the cursor.
    #[inline]
    pub(crate) fn eat(&mut self, byte: u8) -> bool {
        if self.input.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `byte`, which must be under the cursor.
    pub(crate) fn expect(&mut self, byte: u8) -> Result<(), DecodeError> {
        if self.peek()? == byte {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(ErrorKind::UnexpectedSymbol))
        }
    }

    /// Skips JSON whitespace and returns the next byte without consuming it.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnexpectedEndOfData`] if the input ends first.
    pub fn skip_whitespace(&mut self) -> Result<u8, DecodeError> {
        while let Some(&b) = self.input.get(self.pos) {
            if !is_space(b) {
                return Ok(b);
            }
            self.pos += 1;
        }
        Err(self.error(ErrorKind::UnexpectedEndOfData))
    }

    /// Skips whitespace, then requires and consumes `delim`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnexpectedSymbol`] if another byte follows the whitespace.
    pub fn skip_whitespace_until(&mut self, delim: u8) -> Result<(), DecodeError> {
        if self.skip_whitespace()? == delim {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(ErrorKind::UnexpectedSymbol))
        }
    }

    /// Whether a `null` literal followed by a terminator is under the cursor.
    #[must_use]
    pub fn at_null(&self) -> bool {
        self.at_literal(b"null")
    }

    pub(crate) fn at_literal(&self, literal: &[u8]) -> bool {
        let rest = &self.input[self.pos..];
        rest.starts_with(literal) && rest.get(literal.len()).is_none_or(|&b| is_plain_end(b))
    }

    /// Decodes one value into `dest`, handling whitespace and `null`.
    ///
    /// A `null` resets `dest` to its default value without entering its
    /// decoder.
    ///
    /// # Errors
    ///
    /// Propagates the first error from `dest`'s decoder.
    pub fn decode_value<T: Decode + ?Sized>(&mut self, dest: &mut T) -> Result<(), DecodeError> {
        self.skip_whitespace()?;
        if self.at_null() {
            self.pos += 4;
            dest.reset();
            return Ok(());
        }
        dest.decode(self)
    }

    /// Checks what follows the root value.
    fn finish(&mut self) -> Result<(), DecodeError> {
        if !self.strict() {
            return Ok(());
        }
        match self.skip_whitespace() {
            Ok(_) => Err(self.error(ErrorKind::UnexpectedSymbol)),
            Err(_) => Ok(()),
        }
    }
}

/// Separator bookkeeping for the members of one array or object.
///
/// The relaxed grammar treats `,` as optional and tolerates a trailing one;
/// with [`DecodeFlags::STRICT_SYNTAX`] exactly one `,` must sit between
/// members and none before the closing bracket.
pub(crate) struct Members {
    strict: bool,
    started: bool,
    comma: bool,
}

impl Members {
    pub(crate) fn new(de: &Decoder<'_>) -> Self {
        Self {
            strict: de.strict(),
            started: false,
            comma: false,
        }
    }

    /// Called with the cursor on the closing bracket.
    pub(crate) fn close(&self, de: &Decoder<'_>) -> Result<(), DecodeError> {
        if self.strict && self.comma {
            return Err(de.error(ErrorKind::UnexpectedSymbol));
        }
        Ok(())
    }

    /// Called with the cursor on the first byte of a member.
    pub(crate) fn member(&mut self, de: &Decoder<'_>) -> Result<(), DecodeError> {
        if self.strict && self.started && !self.comma {
            return Err(de.error(ErrorKind::UnexpectedSymbol));
        }
        self.started = true;
        self.comma = false;
        Ok(())
    }

    /// Called right after a member's value.
    pub(crate) fn separator(&mut self, de: &mut Decoder<'_>) -> Result<(), DecodeError> {
        de.skip_whitespace()?;
        self.comma = de.eat(b',');
        Ok(())
    }
}
