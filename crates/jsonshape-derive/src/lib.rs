//! # Record Derive
//!
//! Procedural macro behind `#[derive(jsonshape::Record)]`. It reads the field
//! list of a struct once, at compile time, and emits the field table, the
//! sorted key index and the per-field dispatch that the runtime object codec
//! drives. Use it through the `jsonshape` crate, which re-exports it.

use proc_macro::TokenStream;

mod record;

/// ## Derive `Record`
///
/// Implements `jsonshape::Record`, `JsonValue`, `Decode` and `Encode` for a
/// struct with named fields. Every field type must itself implement
/// `Decode + Encode`, except for skipped fields.
///
/// ### Field attributes
///
/// - `#[json(rename = "key")]`: read and write the field under `key` instead
///   of its Rust name.
/// - `#[json(skip)]`: leave the field out of JSON entirely. Decoding never
///   touches it and encoding never emits it.
///
/// ### Limitations
///
/// Tuple structs, unit structs, enums and unions are rejected, as are two
/// fields mapped to the same key and keys containing control characters,
/// `"` or `\`. Generic structs get a `Decode + Encode` bound per mapped field
/// type rather than per type parameter.
#[proc_macro_derive(Record, attributes(json))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    record::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
