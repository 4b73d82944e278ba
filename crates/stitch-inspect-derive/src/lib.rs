//! `#[derive(Inspect)]`: structural debugger visibility for user types.
//!
//! The generated implementation renders the short type name plus fields in
//! declaration order, exposes named-field (`child`) and positional
//! (`element`) access for path queries, and honours the formatter's width
//! caps: structs with more than 16 fields collapse to `Name{ ... }`, and
//! structs with more than 20 fields refuse field access entirely (path
//! resolution over such types is a compile-time-explosion guard, mirrored
//! here at derive time).
//!
//! Generated code refers to the trait by absolute path, so deriving crates
//! need `stitch_inspect` (or a runtime crate re-exporting it) as a direct
//! dependency.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Fields past this count collapse the rendering to `Name{ ... }`.
const COLLAPSE_LIMIT: usize = 16;

/// Fields past this count disable `child()` access.
const ACCESS_LIMIT: usize = 20;

/// Derive `stitch_inspect::Inspect` for a struct or enum.
#[proc_macro_derive(Inspect)]
pub fn derive_inspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let label = name.to_string();

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(syn::parse_quote!(::stitch_inspect::Inspect));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data) => expand_struct(&label, &data.fields),
        Data::Enum(data) => expand_enum(&label, data),
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Inspect cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::stitch_inspect::Inspect for #name #ty_generics #where_clause {
            fn type_label(&self) -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#label)
            }

            #body
        }
    })
}

fn expand_struct(label: &str, fields: &Fields) -> TokenStream2 {
    match fields {
        Fields::Named(named) => {
            let idents: Vec<_> =
                named.named.iter().filter_map(|f| f.ident.clone()).collect();
            let names: Vec<String> = idents.iter().map(ToString::to_string).collect();
            let count = idents.len();

            let render = if count > COLLAPSE_LIMIT {
                quote! {
                    f.write(#label);
                    f.write("{ ... }");
                }
            } else if count == 0 {
                quote! { f.write(#label); }
            } else {
                let entries = idents.iter().zip(&names).enumerate().map(|(i, (id, nm))| {
                    let first = i == 0;
                    quote! {
                        f.field(#first, #nm);
                        ::stitch_inspect::Inspect::inspect(&self.#id, f, depth - 1);
                    }
                });
                quote! {
                    f.write(#label);
                    f.begin_children();
                    #(#entries)*
                    f.end_children();
                }
            };

            let access = if count > ACCESS_LIMIT {
                quote! {
                    fn denies_field_access(&self) -> bool {
                        true
                    }
                }
            } else {
                quote! {
                    fn child(&self, name: &str) -> Option<&dyn ::stitch_inspect::Inspect> {
                        match name {
                            #(#names => Some(&self.#idents),)*
                            _ => None,
                        }
                    }
                }
            };

            quote! {
                fn inspect(&self, f: &mut ::stitch_inspect::ValueFormatter<'_>, depth: usize) {
                    if depth == 0 {
                        f.write(#label);
                        return;
                    }
                    #render
                }

                #access
            }
        }
        Fields::Unnamed(unnamed) => {
            let count = unnamed.unnamed.len();
            let indexes: Vec<syn::Index> = (0..count).map(syn::Index::from).collect();
            let positions: Vec<usize> = (0..count).collect();
            let entries = indexes.iter().enumerate().map(|(i, idx)| {
                let sep = if i == 0 {
                    quote! {}
                } else {
                    quote! { f.write(", "); }
                };
                quote! {
                    #sep
                    ::stitch_inspect::Inspect::inspect(&self.#idx, f, depth - 1);
                }
            });

            quote! {
                fn inspect(&self, f: &mut ::stitch_inspect::ValueFormatter<'_>, depth: usize) {
                    if depth == 0 {
                        f.write(#label);
                        return;
                    }
                    f.write(#label);
                    f.write("(");
                    #(#entries)*
                    f.write(")");
                }

                fn element(&self, index: usize) -> Option<&dyn ::stitch_inspect::Inspect> {
                    match index {
                        #(#positions => Some(&self.#indexes),)*
                        _ => None,
                    }
                }

                fn element_count(&self) -> Option<usize> {
                    Some(#count)
                }
            }
        }
        Fields::Unit => quote! {
            fn inspect(&self, f: &mut ::stitch_inspect::ValueFormatter<'_>, _depth: usize) {
                f.write(#label);
            }
        },
    }
}

fn expand_enum(label: &str, data: &syn::DataEnum) -> TokenStream2 {
    let mut inspect_arms = Vec::new();
    let mut child_arms = Vec::new();
    let mut element_arms = Vec::new();
    let mut count_arms = Vec::new();

    for variant in &data.variants {
        let v_ident = &variant.ident;
        let v_label = format!("{label}::{v_ident}");

        match &variant.fields {
            Fields::Unit => {
                inspect_arms.push(quote! {
                    Self::#v_ident => f.write(#v_label),
                });
            }
            Fields::Unnamed(unnamed) => {
                let count = unnamed.unnamed.len();
                let bindings: Vec<_> =
                    (0..count).map(|i| format_ident!("field_{i}")).collect();
                let positions: Vec<usize> = (0..count).collect();
                let entries = bindings.iter().enumerate().map(|(i, b)| {
                    let sep = if i == 0 {
                        quote! {}
                    } else {
                        quote! { f.write(", "); }
                    };
                    quote! {
                        #sep
                        ::stitch_inspect::Inspect::inspect(#b, f, depth.saturating_sub(1));
                    }
                });
                inspect_arms.push(quote! {
                    Self::#v_ident(#(#bindings),*) => {
                        f.write(#v_label);
                        f.write("(");
                        #(#entries)*
                        f.write(")");
                    }
                });
                element_arms.push(quote! {
                    Self::#v_ident(#(#bindings),*) => match index {
                        #(#positions => Some(#bindings as &dyn ::stitch_inspect::Inspect),)*
                        _ => None,
                    },
                });
                count_arms.push(quote! {
                    Self::#v_ident(..) => Some(#count),
                });
            }
            Fields::Named(named) => {
                let idents: Vec<_> =
                    named.named.iter().filter_map(|f| f.ident.clone()).collect();
                let names: Vec<String> = idents.iter().map(ToString::to_string).collect();
                let entries = idents.iter().zip(&names).enumerate().map(|(i, (id, nm))| {
                    let first = i == 0;
                    quote! {
                        f.field(#first, #nm);
                        ::stitch_inspect::Inspect::inspect(#id, f, depth.saturating_sub(1));
                    }
                });
                inspect_arms.push(quote! {
                    Self::#v_ident { #(#idents),* } => {
                        f.write(#v_label);
                        f.begin_children();
                        #(#entries)*
                        f.end_children();
                    }
                });
                child_arms.push(quote! {
                    Self::#v_ident { #(#idents),* } => match name {
                        #(#names => Some(#idents as &dyn ::stitch_inspect::Inspect),)*
                        _ => None,
                    },
                });
            }
        }
    }

    let child_fn = if child_arms.is_empty() {
        quote! {}
    } else {
        quote! {
            #[allow(unreachable_patterns)]
            fn child(&self, name: &str) -> Option<&dyn ::stitch_inspect::Inspect> {
                match self {
                    #(#child_arms)*
                    _ => None,
                }
            }
        }
    };

    let element_fn = if element_arms.is_empty() {
        quote! {}
    } else {
        quote! {
            #[allow(unreachable_patterns)]
            fn element(&self, index: usize) -> Option<&dyn ::stitch_inspect::Inspect> {
                match self {
                    #(#element_arms)*
                    _ => None,
                }
            }

            #[allow(unreachable_patterns)]
            fn element_count(&self) -> Option<usize> {
                match self {
                    #(#count_arms)*
                    _ => None,
                }
            }
        }
    };

    quote! {
        fn inspect(&self, f: &mut ::stitch_inspect::ValueFormatter<'_>, depth: usize) {
            match self {
                #(#inspect_arms)*
            }
        }

        #child_fn
        #element_fn
    }
}
