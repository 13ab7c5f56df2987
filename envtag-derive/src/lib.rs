//! Derive macro implementation for envtag

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, Generics, Type};

mod attrs;

use attrs::{FieldAttrs, StructAttrs};

/// `Unmarshal` derive macro
///
/// Implements `envtag::Unmarshal` so the struct can be populated by an
/// `EnvMarshaler` or used as a nested field of another derived struct.
///
/// # Supported Attributes
///
/// **Struct-level**:
/// - `#[env(custom)]`: Delegate to the type's `EnvUnmarshaler` implementation
///   (any struct or enum implementing `Default`)
///
/// **Field-level**:
/// - `#[env("KEY")]` / `#[env(name = "KEY")]`: Variable name, or the key
///   prefix when the field is itself a struct
///
/// Fields without a tag are left at `Default::default()`.
///
/// # Example
///
/// See the `envtag` crate documentation for usage examples.
#[proc_macro_derive(Unmarshal, attributes(env))]
pub fn derive_unmarshal(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match StructAttrs::from_attrs(&input.attrs) {
        Ok(attrs) if attrs.custom => Ok(expand_custom(&input)),
        Ok(_) => expand_struct(&input),
        Err(err) => Err(err),
    };

    expanded
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// One named field and how it binds.
struct BoundField<'a> {
    ident: &'a syn::Ident,
    ty: &'a Type,
    tag: Option<String>,
}

fn expand_struct(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Unmarshal only supports structs with named fields; use #[env(custom)] otherwise",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Unmarshal only supports structs; use #[env(custom)] otherwise",
            ));
        }
    };

    let fields = fields
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| (ident, field)))
        .map(|(ident, field)| {
            Ok(BoundField {
                ident,
                ty: &field.ty,
                tag: FieldAttrs::from_field(field)?.tag,
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let name_str = struct_name.to_string();

    // Static descriptor, one entry per declared field
    let descriptors = fields.iter().map(|field| {
        let name = field.ident.to_string();
        let tag = field.tag.clone().unwrap_or_default();
        let type_name = type_name(field.ty);
        quote! {
            ::envtag::FieldDescriptor {
                name: #name,
                tag: #tag,
                type_name: #type_name,
            }
        }
    });

    // Field initializers in declaration order; the first failure returns
    let initializers = fields.iter().map(|field| {
        let ident = field.ident;
        let ty = field.ty;
        match &field.tag {
            Some(tag) => {
                let name = ident.to_string();
                quote! {
                    #ident: ::envtag::de::unmarshal_field::<#ty>(reader, key, #tag, #name)?
                }
            }
            None => quote! {
                #ident: ::core::default::Default::default()
            },
        }
    });

    let key_collectors = fields.iter().filter_map(|field| {
        let ty = field.ty;
        field.tag.as_ref().map(|tag| {
            quote! {
                ::envtag::de::collect_field_keys::<#ty>(key, #tag, keys);
            }
        })
    });

    let mut generics = input.generics.clone();
    if !generics.params.is_empty() {
        add_field_bounds(&mut generics, &fields);
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::envtag::Unmarshal for #struct_name #ty_generics #where_clause {
            fn shape() -> ::envtag::Shape {
                static DESCRIPTOR: ::envtag::StructDescriptor = ::envtag::StructDescriptor {
                    name: #name_str,
                    fields: &[#(#descriptors),*],
                };
                ::envtag::Shape::Struct(&DESCRIPTOR)
            }

            #[allow(unused_variables)]
            fn unmarshal_key(
                reader: &dyn ::envtag::EnvReader,
                key: &str,
            ) -> ::core::result::Result<Self, ::envtag::Error> {
                ::envtag::de::enter_struct(#name_str, key);
                ::core::result::Result::Ok(Self {
                    #(#initializers),*
                })
            }

            #[allow(unused_variables)]
            fn collect_keys(key: &str, keys: &mut ::std::vec::Vec<::std::string::String>) {
                #(#key_collectors)*
            }
        }
    })
}

fn expand_custom(input: &DeriveInput) -> TokenStream2 {
    let type_name = &input.ident;

    let mut generics = input.generics.clone();
    {
        let (_, ty_generics, _) = input.generics.split_for_impl();
        let where_clause = generics.make_where_clause();
        where_clause
            .predicates
            .push(parse_quote!(#type_name #ty_generics: ::core::default::Default + ::envtag::EnvUnmarshaler));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics ::envtag::Unmarshal for #type_name #ty_generics #where_clause {
            fn shape() -> ::envtag::Shape {
                ::envtag::Shape::Custom
            }

            fn unmarshal_key(
                reader: &dyn ::envtag::EnvReader,
                key: &str,
            ) -> ::core::result::Result<Self, ::envtag::Error> {
                let mut value = <Self as ::core::default::Default>::default();
                ::envtag::de::unmarshal_custom(&mut value, reader, key)?;
                ::core::result::Result::Ok(value)
            }

            fn unmarshal_into(
                &mut self,
                reader: &dyn ::envtag::EnvReader,
                key: &str,
            ) -> ::core::result::Result<(), ::envtag::Error> {
                ::envtag::de::unmarshal_custom(self, reader, key)
            }

            fn collect_keys(_key: &str, _keys: &mut ::std::vec::Vec<::std::string::String>) {}
        }
    }
}

/// Require `Unmarshal` of tagged field types and `Default` of the rest.
fn add_field_bounds(generics: &mut Generics, fields: &[BoundField<'_>]) {
    let where_clause = generics.make_where_clause();
    for field in fields {
        let ty = field.ty;
        if field.tag.is_some() {
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::envtag::Unmarshal));
        } else {
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::core::default::Default));
        }
    }
}

/// The field type as written, without the spaces `quote` inserts around
/// punctuation. Spaces between two words (`dyn Trait`, `'static str`) stay.
fn type_name(ty: &Type) -> String {
    let tokens = quote!(#ty).to_string();
    let mut name = String::with_capacity(tokens.len());
    for piece in tokens.split_whitespace() {
        let word_boundary = name.ends_with(is_word_char) && piece.starts_with(is_word_char);
        if word_boundary {
            name.push(' ');
        }
        name.push_str(piece);
    }
    name
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
