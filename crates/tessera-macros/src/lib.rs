// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This crate provides procedural macros for the Tessera runtime.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Meta};

/// A derive macro that implements the `tessera_data::ecs::Component` trait.
///
/// The generated `stable_name` is the struct's identifier, or the value given with
/// `#[component(name = "...")]`. That name is what registries and the network codec
/// use to identify the type, so renaming the struct (or the attribute value) is a
/// wire-breaking change.
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_component(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand_component(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut stable_name = name.to_string();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("component")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                stable_name = value.value();
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }

    Ok(quote! {
        impl #impl_generics ::tessera_data::ecs::Component for #name #ty_generics #where_clause {
            fn stable_name() -> ::core::option::Option<&'static str> {
                ::core::option::Option::Some(#stable_name)
            }
        }
    })
}

/// How a `#[sync]` field is put on the wire.
enum Encoding {
    Native,
    Varint,
}

struct SyncedField {
    ident: syn::Ident,
    ty: syn::Type,
    encoding: Encoding,
}

/// A derive macro that implements `tessera_io::sync::SyncComponent`.
///
/// Fields marked `#[sync]` are synchronized with their native wire encoding, fields
/// marked `#[sync(varint)]` as LEB128 varints. Their declaration order defines their
/// one-byte wire index. Exactly one field must be marked `#[sync(tracker)]` and hold
/// the `ChangeTracker`.
///
/// For every synchronized field a `set_<field>` method is generated that writes the
/// field and marks it dirty.
#[proc_macro_derive(Synced, attributes(sync))]
pub fn derive_synced(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_synced(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand_synced(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "`Synced` can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            name,
            "`Synced` requires a struct with named fields",
        ));
    };

    let mut tracker = None;
    let mut fields = Vec::new();
    for field in &named.named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("sync")) {
            match &attr.meta {
                Meta::Path(_) => fields.push(SyncedField {
                    ident: ident.clone(),
                    ty: field.ty.clone(),
                    encoding: Encoding::Native,
                }),
                Meta::List(_) => {
                    let mut is_tracker = false;
                    let mut encoding = Encoding::Native;
                    attr.parse_nested_meta(|meta| {
                        if meta.path.is_ident("tracker") {
                            is_tracker = true;
                            Ok(())
                        } else if meta.path.is_ident("varint") {
                            encoding = Encoding::Varint;
                            Ok(())
                        } else {
                            Err(meta.error("expected `tracker` or `varint`"))
                        }
                    })?;
                    if is_tracker {
                        if tracker.is_some() {
                            return Err(syn::Error::new_spanned(
                                attr,
                                "only one field can be `#[sync(tracker)]`",
                            ));
                        }
                        tracker = Some(ident.clone());
                    } else {
                        fields.push(SyncedField {
                            ident: ident.clone(),
                            ty: field.ty.clone(),
                            encoding,
                        });
                    }
                }
                Meta::NameValue(_) => {
                    return Err(syn::Error::new_spanned(attr, "expected `#[sync]` or `#[sync(...)]`"))
                }
            }
        }
    }

    let Some(tracker) = tracker else {
        return Err(syn::Error::new_spanned(
            name,
            "`Synced` requires one `#[sync(tracker)] ChangeTracker` field",
        ));
    };
    if fields.len() > 256 {
        return Err(syn::Error::new_spanned(
            name,
            "a synced component can have at most 256 synced fields",
        ));
    }

    let sync = quote!(::tessera_io::sync);
    let wire = quote!(::tessera_io::wire);

    let table = fields.iter().enumerate().map(|(i, f)| {
        let field_name = f.ident.to_string();
        let ty = &f.ty;
        let index = i as u8;
        let wire_type = match f.encoding {
            Encoding::Native => quote!(<#ty as #sync::WireValue>::WIRE_TYPE),
            Encoding::Varint => quote!(#sync::WireType::Varint),
        };
        quote! {
            #sync::SyncField { name: #field_name, wire_type: #wire_type, index: #index }
        }
    });

    let writes = fields.iter().enumerate().map(|(i, f)| {
        let ident = &f.ident;
        let index = i as u8;
        match f.encoding {
            Encoding::Native => quote! {
                #index => { #sync::WireValue::write(&self.#ident, writer); true }
            },
            Encoding::Varint => quote! {
                #index => { #sync::VarintValue::write_varint(&self.#ident, writer); true }
            },
        }
    });

    let reads = fields.iter().enumerate().map(|(i, f)| {
        let ident = &f.ident;
        let ty = &f.ty;
        let index = i as u8;
        match f.encoding {
            Encoding::Native => quote! {
                #index => { self.#ident = <#ty as #sync::WireValue>::read(reader)?; Ok(()) }
            },
            Encoding::Varint => quote! {
                #index => { self.#ident = <#ty as #sync::VarintValue>::read_varint(reader)?; Ok(()) }
            },
        }
    });

    let setters = fields.iter().enumerate().map(|(i, f)| {
        let ident = &f.ident;
        let ty = &f.ty;
        let index = i as u8;
        let setter = format_ident!("set_{}", ident);
        let doc = format!("Writes `{ident}` and marks it dirty for the next delta.");
        quote! {
            #[doc = #doc]
            pub fn #setter(&mut self, value: #ty) {
                self.#ident = value;
                self.#tracker.mark_dirty(#index);
            }
        }
    });

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            #(#setters)*
        }

        impl #impl_generics #sync::SyncComponent for #name #ty_generics #where_clause {
            fn sync_fields() -> &'static [#sync::SyncField] {
                const FIELDS: &[#sync::SyncField] = &[#(#table),*];
                FIELDS
            }

            fn write_field(&self, index: u8, writer: &mut #wire::ByteWriter) -> bool {
                match index {
                    #(#writes)*
                    _ => false,
                }
            }

            fn read_field(
                &mut self,
                index: u8,
                reader: &mut #wire::ByteReader<'_>,
            ) -> ::core::result::Result<(), #sync::SyncError> {
                match index {
                    #(#reads)*
                    _ => ::core::result::Result::Err(#sync::SyncError::UnknownField {
                        component: <Self as ::tessera_data::ecs::Component>::stable_name()
                            .unwrap_or(#name_str)
                            .to_string(),
                        index,
                    }),
                }
            }

            fn tracker(&self) -> &#sync::ChangeTracker {
                &self.#tracker
            }

            fn tracker_mut(&mut self) -> &mut #sync::ChangeTracker {
                &mut self.#tracker
            }
        }
    })
}
