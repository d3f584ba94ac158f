use thiserror::Error;

/// Classification of a decode failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input ended in the middle of a value.
    #[error("unexpected end of data")]
    UnexpectedEndOfData,
    /// A byte did not fit the grammar at its position.
    #[error("unexpected symbol")]
    UnexpectedSymbol,
    /// More items than a fixed-capacity destination can hold.
    #[error("fixed-size container overflow")]
    FixedSizeContainerOverflow,
    /// Fewer items than a fixed-capacity destination requires.
    #[error("fixed-size container underflow")]
    FixedSizeContainerUnderflow,
    /// A numeric literal is malformed, too long, or out of range.
    #[error("ill-formed number")]
    IllformedNumber,
    /// A custom string mapper rejected its input.
    #[error("custom mapper error")]
    CustomMapperError,
    /// A record table referenced a field it does not have.
    #[error("internal error")]
    InternalError,
    /// A skipped value nests deeper than the configured bound.
    #[error("max skip recursion exceeded")]
    SkippingMaxRecursion,
    /// A skipped value is not a well-formed literal.
    #[error("malformed value while skipping")]
    SkippingError,
    /// An unknown field appeared while excess fields are prohibited.
    #[error("excess field")]
    ExcessField,
    /// A mapped field is absent while all fields are required.
    #[error("missing field")]
    MissingField,
}

/// A failed decode: what went wrong and where.
///
/// The offset is measured in bytes from the start of the input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("{kind} at byte {offset}")]
pub struct DecodeError {
    kind: ErrorKind,
    offset: usize,
}

impl DecodeError {
    /// Creates an error of `kind` detected at `offset`.
    #[must_use]
    pub const fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// The failure classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset from the start of input where the failure was detected.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

/// A failed encode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The sink asked to stop accepting output.
    #[error("sink rejected output")]
    SinkRejected,
    /// A string contains a control byte that JSON has no short escape for.
    #[error("control byte 0x{byte:02x} cannot be escaped")]
    ControlCharacter {
        /// The offending byte.
        byte: u8,
    },
    /// A custom string mapper failed to produce output.
    #[error("custom mapper error")]
    CustomMapper,
    /// The encoded bytes are not valid UTF-8.
    #[error("encoded output is not valid UTF-8")]
    InvalidUtf8,
}

/// Returned by [`StringMapper`](crate::StringMapper) hooks that cannot map a
/// value.
#[derive(Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("value cannot be mapped")]
pub struct MapperError;

impl From<MapperError> for EncodeError {
    fn from(_: MapperError) -> Self {
        EncodeError::CustomMapper
    }
}

impl From<core::fmt::Error> for MapperError {
    fn from(_: core::fmt::Error) -> Self {
        MapperError
    }
}
