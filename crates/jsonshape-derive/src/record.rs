//! # Record Derive Implementation
//!
//! Parses the target struct into a list of [`Field`]s and generates the
//! trait implementations from it. See [`expand`] for the entry point.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt as _;

/// ## Parsed Field
///
/// One named field of the target struct with its `#[json(...)]` options
/// applied.
struct Field {
    ident: syn::Ident,
    ty: syn::Type,
    /// JSON key, or the plain Rust name for skipped fields.
    name: String,
    /// Where errors about `name` point.
    name_span: Span,
    skip: bool,
}

impl Field {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let mut name = ident.unraw().to_string();
        let mut name_span = ident.span();
        let mut skip = false;

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("json")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    name = lit.value();
                    name_span = lit.span();
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported json attribute, expected `rename` or `skip`"))
                }
            })?;
        }

        if !skip && name.bytes().any(|b| b < 0x20 || b == b'"' || b == b'\\') {
            return Err(syn::Error::new(
                name_span,
                "JSON key must not contain control characters, `\"` or `\\`",
            ));
        }

        Ok(Self {
            ident,
            ty: field.ty.clone(),
            name,
            name_span,
            skip,
        })
    }
}

fn named_fields(input: &syn::DeriveInput) -> syn::Result<Vec<Field>> {
    match &input.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(named),
            ..
        }) => named.named.iter().map(Field::parse).collect(),
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs with named fields",
        )),
    }
}

/// Mapped fields as `(key, declaration index)`, sorted by key bytes.
fn sorted_keys(fields: &[Field]) -> syn::Result<Vec<(&Field, usize)>> {
    let mut keys: Vec<_> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.skip)
        .map(|(i, f)| (f, i))
        .collect();
    keys.sort_by(|a, b| a.0.name.as_bytes().cmp(b.0.name.as_bytes()));

    if let Some(pair) = keys.windows(2).find(|w| w[0].0.name == w[1].0.name) {
        let (later, earlier) = if pair[0].1 > pair[1].1 {
            (pair[0].0, pair[1].0)
        } else {
            (pair[1].0, pair[0].0)
        };
        return Err(syn::Error::new(
            later.name_span,
            format!(
                "duplicate JSON key `{}`, already used by field `{}`",
                later.name, earlier.ident
            ),
        ));
    }
    Ok(keys)
}

/// ## Expand `#[derive(Record)]`
///
/// Produces `JsonValue`, `Record`, `Decode` and `Encode` impls. Field indices
/// in the generated tables are declaration positions, counting skipped
/// fields.
pub fn expand(input: &syn::DeriveInput) -> syn::Result<TokenStream> {
    let krate = quote!(::jsonshape);
    let fields = named_fields(input)?;
    let keys = sorted_keys(&fields)?;
    let ident = &input.ident;

    let mut bounded = input.generics.clone();
    if !bounded.params.is_empty() {
        let clause = bounded.make_where_clause();
        for field in fields.iter().filter(|f| !f.skip) {
            let ty = &field.ty;
            clause
                .predicates
                .push(syn::parse_quote!(#ty: #krate::Decode + #krate::Encode));
        }
    }
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();
    let (plain_impl_generics, _, plain_where_clause) = input.generics.split_for_impl();

    let descriptors = fields.iter().enumerate().map(|(i, f)| {
        let name = &f.name;
        if f.skip {
            quote!(#krate::FieldDescriptor::unmapped(#name, #i))
        } else {
            let ty = &f.ty;
            quote!(#krate::FieldDescriptor::mapped(#name, #i, <#ty as #krate::JsonValue>::KIND))
        }
    });

    let entries = keys.iter().map(|(f, i)| {
        let name = &f.name;
        quote!(#krate::KeyEntry::new(#name, #i))
    });

    let mapped: Vec<(usize, &syn::Ident)> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.skip)
        .map(|(i, f)| (i, &f.ident))
        .collect();
    let indices: Vec<usize> = mapped.iter().map(|(i, _)| *i).collect();
    let idents: Vec<&syn::Ident> = mapped.iter().map(|(_, id)| *id).collect();

    Ok(quote! {
        #[automatically_derived]
        impl #plain_impl_generics #krate::JsonValue for #ident #ty_generics #plain_where_clause {
            const KIND: #krate::Kind = #krate::Kind::Object;
        }

        #[automatically_derived]
        impl #impl_generics #krate::Record for #ident #ty_generics #where_clause {
            const FIELDS: &'static [#krate::FieldDescriptor] = &[#(#descriptors),*];

            const KEYS: #krate::KeyIndex = {
                const ENTRIES: &[#krate::KeyEntry] = &[#(#entries),*];
                #krate::KeyIndex::new(ENTRIES)
            };

            fn decode_field(
                &mut self,
                field: usize,
                de: &mut #krate::Decoder<'_>,
            ) -> ::core::result::Result<(), #krate::DecodeError> {
                match field {
                    #(#indices => de.decode_value(&mut self.#idents),)*
                    _ => ::core::result::Result::Err(de.error(#krate::ErrorKind::InternalError)),
                }
            }

            fn reset_field(&mut self, field: usize) {
                match field {
                    #(#indices => #krate::Decode::reset(&mut self.#idents),)*
                    _ => {}
                }
            }

            fn encode_field<__JsonSink: #krate::Sink + ?Sized>(
                &self,
                field: usize,
                enc: &mut #krate::Encoder<'_, __JsonSink>,
            ) -> ::core::result::Result<(), #krate::EncodeError> {
                match field {
                    #(#indices => #krate::Encode::encode(&self.#idents, enc),)*
                    _ => ::core::result::Result::Ok(()),
                }
            }
        }

        #[automatically_derived]
        impl #impl_generics #krate::Decode for #ident #ty_generics #where_clause {
            fn decode(
                &mut self,
                de: &mut #krate::Decoder<'_>,
            ) -> ::core::result::Result<(), #krate::DecodeError> {
                #krate::decode_record(self, de)
            }

            fn reset(&mut self) {
                #krate::reset_record(self);
            }
        }

        #[automatically_derived]
        impl #impl_generics #krate::Encode for #ident #ty_generics #where_clause {
            fn encode<__JsonSink: #krate::Sink + ?Sized>(
                &self,
                enc: &mut #krate::Encoder<'_, __JsonSink>,
            ) -> ::core::result::Result<(), #krate::EncodeError> {
                #krate::encode_record(self, enc)
            }
        }
    })
}
