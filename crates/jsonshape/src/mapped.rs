//! Scalars carried as JSON strings through user conversion hooks.

use alloc::string::String;
use core::{
    fmt::Write as _,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
};

use crate::{
    decoder::Decoder,
    encoder::{Encoder, Sink},
    error::{DecodeError, EncodeError, ErrorKind, MapperError},
};

/// Conversion between a value and its JSON string form.
///
/// Register an implementor with [`impl_string_mapped!`](crate::impl_string_mapped)
/// to make it a plain JSON value. The text passed to [`read_mapped`] has
/// already been unescaped, and the text produced by [`write_mapped`] is
/// escaped on output.
///
/// [`read_mapped`]: StringMapper::read_mapped
/// [`write_mapped`]: StringMapper::write_mapped
///
/// # Examples
///
/// ```rust
/// use jsonshape::{DecodeFlags, MapperError, StringMapper};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Celsius(i32);
///
/// impl StringMapper for Celsius {
///     fn write_mapped(&self, out: &mut String) -> Result<(), MapperError> {
///         use std::fmt::Write;
///         Ok(write!(out, "{}C", self.0)?)
///     }
///
///     fn read_mapped(&mut self, text: &str) -> Result<(), MapperError> {
///         let digits = text.strip_suffix('C').ok_or(MapperError)?;
///         self.0 = digits.parse().map_err(|_| MapperError)?;
///         Ok(())
///     }
/// }
///
/// jsonshape::impl_string_mapped!(Celsius);
///
/// let mut t = Celsius::default();
/// jsonshape::decode(&mut t, br#""-4C""#, DecodeFlags::empty()).unwrap();
/// assert_eq!(t, Celsius(-4));
/// assert_eq!(jsonshape::to_string(&t).unwrap(), r#""-4C""#);
/// ```
pub trait StringMapper {
    /// Appends the string form of `self` to `out`.
    ///
    /// # Errors
    ///
    /// [`MapperError`] when the value has no string form.
    fn write_mapped(&self, out: &mut String) -> Result<(), MapperError>;

    /// Overwrites `self` from its string form.
    ///
    /// # Errors
    ///
    /// [`MapperError`] when `text` does not describe a value.
    fn read_mapped(&mut self, text: &str) -> Result<(), MapperError>;
}

/// Decodes a quoted string through [`StringMapper::read_mapped`].
///
/// # Errors
///
/// String scanning errors as for any string, and
/// [`ErrorKind::CustomMapperError`] at the opening quote when the content is
/// not UTF-8 or the hook rejects it.
pub fn decode_mapped<T: StringMapper + ?Sized>(
    value: &mut T,
    de: &mut Decoder<'_>,
) -> Result<(), DecodeError> {
    let raw = de.string_literal()?;
    let rejected = DecodeError::new(ErrorKind::CustomMapperError, raw.start);
    let content = raw.unescaped()?;
    let text = core::str::from_utf8(&content).map_err(|_| rejected)?;
    value.read_mapped(text).map_err(|_| rejected)
}

/// Encodes the output of [`StringMapper::write_mapped`] as a quoted string.
///
/// # Errors
///
/// [`EncodeError::CustomMapper`] when the hook fails, otherwise as for any
/// string.
pub fn encode_mapped<T: StringMapper + ?Sized, S: Sink + ?Sized>(
    value: &T,
    enc: &mut Encoder<'_, S>,
) -> Result<(), EncodeError> {
    let mut text = String::new();
    value.write_mapped(&mut text)?;
    enc.write_str(text.as_bytes())
}

/// Makes a [`StringMapper`] implementor a plain JSON value.
///
/// The one-argument form resets the value with [`Default`]; types without a
/// `Default` impl name their reset value with `default = <expr>`.
///
/// ```rust
/// # use jsonshape::{MapperError, StringMapper};
/// struct Port(u16);
/// # impl StringMapper for Port {
/// #     fn write_mapped(&self, _: &mut String) -> Result<(), MapperError> { Ok(()) }
/// #     fn read_mapped(&mut self, _: &str) -> Result<(), MapperError> { Ok(()) }
/// # }
/// jsonshape::impl_string_mapped!(Port, default = Port(80));
/// ```
#[macro_export]
macro_rules! impl_string_mapped {
    ($ty:ty) => {
        $crate::impl_string_mapped!($ty, default = <$ty as ::core::default::Default>::default());
    };
    ($ty:ty, default = $default:expr) => {
        impl $crate::JsonValue for $ty {
            const KIND: $crate::Kind = $crate::Kind::Plain;
        }

        impl $crate::Decode for $ty {
            fn decode(
                &mut self,
                de: &mut $crate::Decoder<'_>,
            ) -> ::core::result::Result<(), $crate::DecodeError> {
                $crate::__private::decode_mapped(self, de)
            }

            fn reset(&mut self) {
                *self = $default;
            }
        }

        impl $crate::Encode for $ty {
            fn encode<S: $crate::Sink + ?Sized>(
                &self,
                enc: &mut $crate::Encoder<'_, S>,
            ) -> ::core::result::Result<(), $crate::EncodeError> {
                $crate::__private::encode_mapped(self, enc)
            }
        }
    };
}

macro_rules! impl_display_parse {
    ($($ty:ty),*) => {$(
        impl StringMapper for $ty {
            fn write_mapped(&self, out: &mut String) -> Result<(), MapperError> {
                Ok(write!(out, "{self}")?)
            }

            fn read_mapped(&mut self, text: &str) -> Result<(), MapperError> {
                *self = text.parse().map_err(|_| MapperError)?;
                Ok(())
            }
        }
    )*};
}

impl_display_parse!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

impl_string_mapped!(Ipv4Addr, default = Ipv4Addr::UNSPECIFIED);
impl_string_mapped!(Ipv6Addr, default = Ipv6Addr::UNSPECIFIED);
impl_string_mapped!(IpAddr, default = IpAddr::V4(Ipv4Addr::UNSPECIFIED));
impl_string_mapped!(
    SocketAddr,
    default = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
);
