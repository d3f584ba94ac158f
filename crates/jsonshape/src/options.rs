use bitflags::bitflags;

bitflags! {
    /// Policy flags for a single decode call.
    ///
    /// Flags combine independently. The empty set is the most lenient policy:
    /// unknown fields are skipped, missing fields silently take their default
    /// value and separators follow the relaxed grammar.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DecodeFlags: u8 {
        /// Fail with [`ErrorKind::ExcessField`](crate::ErrorKind::ExcessField)
        /// on a key that no field of the record maps.
        const EXCESS_FIELDS_PROHIBITED = 1 << 0;
        /// Fail with [`ErrorKind::MissingField`](crate::ErrorKind::MissingField)
        /// when a mapped field is absent from its object.
        const ALL_FIELDS_REQUIRED = 1 << 1;
        /// Enforce RFC 8259 separators and string content.
        ///
        /// A `,` is required between members, trailing commas are rejected,
        /// raw control bytes inside strings are rejected and only whitespace
        /// may follow the root value.
        const STRICT_SYNTAX = 1 << 2;
    }
}

/// Default bound on the nesting of a skipped value.
pub const DEFAULT_MAX_SKIP_DEPTH: u8 = 32;

/// Configuration for a decode call.
///
/// # Examples
///
/// ```rust
/// use jsonshape::{DecodeFlags, DecodeOptions};
///
/// let options = DecodeOptions {
///     flags: DecodeFlags::ALL_FIELDS_REQUIRED | DecodeFlags::STRICT_SYNTAX,
///     ..Default::default()
/// };
/// assert_eq!(options.max_skip_depth, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Policy flags.
    ///
    /// # Default
    ///
    /// Empty.
    pub flags: DecodeFlags,

    /// How deep a value of an unknown field may nest before skipping it fails
    /// with [`ErrorKind::SkippingMaxRecursion`](crate::ErrorKind::SkippingMaxRecursion).
    ///
    /// The skipped value itself counts as one level, so `[[1]]` needs a depth
    /// of at least 3.
    ///
    /// # Default
    ///
    /// `32`
    pub max_skip_depth: u8,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            flags: DecodeFlags::empty(),
            max_skip_depth: DEFAULT_MAX_SKIP_DEPTH,
        }
    }
}

impl From<DecodeFlags> for DecodeOptions {
    fn from(flags: DecodeFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }
}
