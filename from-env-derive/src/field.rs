use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Ident, LitStr};

/// A parsed Field of a struct
pub(crate) struct Field {
    env_var: Option<LitStr>,
    field_name: Option<Ident>,
    field_type: syn::Type,

    optional: bool,
    skip: bool,
    desc: Option<String>,
    default: Option<syn::Expr>,
}

impl TryFrom<&syn::Field> for Field {
    type Error = syn::Error;

    fn try_from(field: &syn::Field) -> Result<Self, syn::Error> {
        let mut optional = false;
        let mut env_var = None;
        let mut desc = None;
        let mut skip = false;
        let mut default = None;

        for attr in field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("from_env"))
        {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    return Ok(());
                }
                if meta.path.is_ident("optional") {
                    optional = true;
                    return Ok(());
                }
                if meta.path.is_ident("var") {
                    env_var = Some(meta.value()?.parse::<LitStr>()?);
                    return Ok(());
                }
                if meta.path.is_ident("desc") {
                    desc = Some(meta.value()?.parse::<LitStr>()?.value());
                    return Ok(());
                }
                if meta.path.is_ident("default") {
                    default = Some(meta.value()?.parse::<syn::Expr>()?);
                    return Ok(());
                }
                Err(meta.error("unknown `from_env` attribute"))
            })?;
        }

        if desc.is_none() && env_var.is_some() {
            return Err(syn::Error::new(
                field.span(),
                "Missing description for field. Use `#[from_env(desc = \"DESC\")]`",
            ));
        }

        if default.is_some() && env_var.is_none() {
            return Err(syn::Error::new(
                field.span(),
                "`default` requires a `var`. Use `#[from_env(var = \"VAR\", default = ...)]`",
            ));
        }

        Ok(Field {
            env_var,
            field_name: field.ident.clone(),
            field_type: field.ty.clone(),
            optional,
            skip,
            desc,
            default,
        })
    }
}

impl Field {
    pub(crate) fn field_name(&self, idx: usize) -> Ident {
        self.field_name
            .clone()
            .unwrap_or_else(|| format_ident!("field_{idx}"))
    }

    /// Produces a line for the `inventory` function
    pub(crate) fn expand_env_item_info(&self) -> TokenStream {
        if self.skip {
            return quote! {};
        }

        let description = self.desc.clone().unwrap_or_default();
        // A defaulted var never has to be set.
        let optional = self.optional || self.default.is_some();

        if let Some(env_var) = &self.env_var {
            let var_name = env_var.value();

            return quote! {
                items.push(&EnvItemInfo {
                    var: #var_name,
                    description: #description,
                    optional: #optional,
                });
            };
        }

        let field_ty = &self.field_type;
        quote! {
            items.extend(
                <#field_ty as FromEnv>::inventory()
            );
        }
    }

    pub(crate) fn expand_item_from_env(&self, idx: usize) -> TokenStream {
        let field_name = self.field_name(idx);

        if self.skip {
            return quote! {
                let #field_name = ::std::default::Default::default();
            };
        }

        let Some(env_var) = &self.env_var else {
            return quote! {
                let #field_name = FromEnv::from_env()?;
            };
        };

        match &self.default {
            Some(default) => quote! {
                let #field_name = match FromEnvVar::from_env_var(#env_var) {
                    ::std::result::Result::Ok(value) => value,
                    ::std::result::Result::Err(FromEnvErr::EnvError(..) | FromEnvErr::Empty(..)) => #default,
                    ::std::result::Result::Err(err) => return ::std::result::Result::Err(err),
                };
            },
            None => quote! {
                let #field_name = FromEnvVar::from_env_var(#env_var)?;
            },
        }
    }
}
