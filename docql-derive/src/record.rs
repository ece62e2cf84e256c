//! Derive macro for the `Record` trait.

use crate::helpers::{parse_docs, TagParser};
use proc_macro2::{Span, TokenStream};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;
use syn::{Data, DataStruct, DeriveInput, Fields, Ident};

/// The attribute holding a field's naming tag.
const TAG: &str = "bson";

/// Derive a `Record` instance for a struct.
pub fn derive(
    DeriveInput {
        ident,
        generics,
        data,
        ..
    }: DeriveInput,
) -> TokenStream {
    if !generics.params.is_empty() {
        return syn::Error::new_spanned(generics, "Record cannot be derived on generic types")
            .to_compile_error();
    }
    match data {
        Data::Struct(s) => generate_struct(s, ident).unwrap_or_else(|err| err.to_compile_error()),
        _ => syn::Error::new_spanned(ident, "Record can only be derived for structs")
            .to_compile_error(),
    }
}

fn generate_struct(s: DataStruct, name: Ident) -> syn::Result<TokenStream> {
    let docql = docql_path();
    let p = TagParser::new(TAG);

    let Fields::Named(fields) = s.fields else {
        return Err(syn::Error::new_spanned(name, "Record fields must be named"));
    };

    // Describe each field in declaration order.
    let field_shapes = fields
        .named
        .iter()
        .map(|f| {
            let ident = f
                .ident
                .as_ref()
                .ok_or_else(|| syn::Error::new_spanned(f, "Record fields must be named"))?;
            let ident = ident.to_string();
            let ident = ident.strip_prefix("r#").unwrap_or(&ident).to_string();
            let ty = &f.ty;
            let tag = match p.get(&f.attrs)? {
                Some(tag) => quote!(Some(#tag)),
                None => quote!(None),
            };
            let doc = parse_docs(&f.attrs).map(|doc| quote!(.with_doc(#doc)));
            Ok(quote! {
                #docql::shape::FieldShape::new(
                    #ident,
                    #tag,
                    <#ty as #docql::shape::Reflect>::kind(),
                )
                #doc
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let type_name = name.to_string();
    Ok(quote! {
        impl #docql::shape::Record for #name {
            fn shape() -> &'static #docql::shape::Shape {
                static SHAPE: ::std::sync::OnceLock<#docql::shape::Shape> =
                    ::std::sync::OnceLock::new();
                SHAPE.get_or_init(|| {
                    #docql::shape::Shape::new(
                        concat!(module_path!(), "::", #type_name),
                        vec![#(#field_shapes),*],
                    )
                })
            }
        }

        impl #docql::shape::Reflect for #name {
            fn kind() -> #docql::shape::Kind {
                #docql::shape::Kind::Record(#docql::shape::RecordRef::of::<Self>())
            }
        }
    })
}

/// The path of the `docql` crate in the scope invoking a procedural macro.
fn docql_path() -> TokenStream {
    match crate_name("docql") {
        // `docql` declares `extern crate self as docql`, so it can refer to itself by name, and so
        // can its doctests and integration tests.
        Ok(FoundCrate::Itself) | Err(_) => quote!(::docql),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
    }
}
