use proc_macro::TokenStream as Ts;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput};

mod field;
use field::Field;

/// This macro generates an implementation of the `FromEnv` trait for a struct.
/// See the documentation in `bits_leaderboard::utils::from_env` for details.
#[proc_macro_derive(FromEnv, attributes(from_env))]
pub fn derive(input: Ts) -> Ts {
    let input = parse_macro_input!(input as DeriveInput);

    match Input::try_from(input) {
        Ok(input) => input.expand_mod().into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct Input {
    ident: syn::Ident,

    fields: Vec<Field>,

    crate_name: syn::Path,

    tuple_like: bool,
}

impl TryFrom<DeriveInput> for Input {
    type Error = syn::Error;

    fn try_from(input: DeriveInput) -> Result<Self, Self::Error> {
        let syn::Data::Struct(data) = &input.data else {
            return Err(syn::Error::new(
                input.ident.span(),
                "FromEnv can only be derived for structs",
            ));
        };

        // `#[from_env(crate)]` is used inside `bits_leaderboard` itself.
        let crate_name = input
            .attrs
            .iter()
            .find(|attr| attr.path().is_ident("from_env"))
            .and_then(|attr| attr.parse_args::<syn::Path>().ok())
            .unwrap_or_else(|| syn::parse_quote!(::bits_leaderboard));

        let fields = match &data.fields {
            syn::Fields::Named(fields) => fields
                .named
                .iter()
                .map(Field::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            syn::Fields::Unnamed(fields) => fields
                .unnamed
                .iter()
                .map(Field::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            syn::Fields::Unit => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "FromEnv can only be derived for structs with fields",
                ))
            }
        };

        Ok(Self {
            tuple_like: matches!(data.fields, syn::Fields::Unnamed(_)),
            ident: input.ident,
            fields,
            crate_name,
        })
    }
}

impl Input {
    fn field_names(&self) -> Vec<syn::Ident> {
        self.fields
            .iter()
            .enumerate()
            .map(|(idx, field)| field.field_name(idx))
            .collect()
    }

    fn instantiate_struct(&self) -> TokenStream {
        let struct_name = &self.ident;
        let field_names = self.field_names();

        if self.tuple_like {
            return quote! {
                #struct_name(
                    #(#field_names),*
                )
            };
        }

        quote! {
            #struct_name {
                #(#field_names),*
            }
        }
    }

    fn expand_impl(&self) -> TokenStream {
        let struct_name = &self.ident;

        let env_item_info = self.fields.iter().map(Field::expand_env_item_info);
        let item_from_envs = self
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| field.expand_item_from_env(idx));
        let struct_instantiation = self.instantiate_struct();

        quote! {
            #[automatically_derived]
            impl FromEnv for #struct_name {
                fn inventory() -> ::std::vec::Vec<&'static EnvItemInfo> {
                    let mut items = ::std::vec::Vec::new();
                    #(
                        #env_item_info
                    )*
                    items
                }

                fn from_env() -> ::std::result::Result<Self, FromEnvErr> {
                    #(
                        #item_from_envs
                    )*

                    ::std::result::Result::Ok(#struct_instantiation)
                }
            }
        }
    }

    fn expand_mod(&self) -> TokenStream {
        let expanded_impl = self.expand_impl();
        let crate_name = &self.crate_name;
        let mod_ident = format_ident!("__from_env_impls_{}", self.ident);

        quote! {
            #[allow(non_snake_case)]
            mod #mod_ident {
                use super::*;
                use #crate_name::utils::from_env::{FromEnv, FromEnvErr, FromEnvVar, EnvItemInfo};

                #expanded_impl
            }
        }
    }
}
