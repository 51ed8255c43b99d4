//! Derive macros for reflectmap.
//!
//! - `Record`: implements `reflectmap::reflect::Record` and `reflectmap::reflect::Field` for a struct with
//!   named fields
//! - `RecordEnum`: implements `reflectmap::reflect::Field` for a fieldless enum (or one whose variants carry
//!   a single payload)
//!
//! Both read `#[reflectmap(...)]` attributes.
//!
//! ## Field attributes (`Record`)
//! - `rename = "key"`: external key for the field
//! - `skip`: never read or written; the field type needs no `Field` impl
//! - `base`: the field embeds the record this one extends
//! - `getter = "path"`: `fn(&Self) -> Value` used when serializing
//! - `setter = "path"`: `fn(&mut Self, &Value)` used when populating
//!
//! A field with both a getter and a setter is fully custom and its type needs no `Field` impl either.
//!
//! ## Container attributes (`Record`)
//! - `refine = "path"`: `fn(&Self, &Mapping) -> Option<Box<dyn Record>>` polymorphism hook
//! - `convert_array = "path"`: `fn(&Self, &str, &[NativeRef]) -> Option<Value>` for lists of optional records
//! - `mapping = "path"`: `fn(&Self) -> Vec<PropertyMapping>`, extra renames and exclusions
//!
//! ## Enum attributes (`RecordEnum`)
//! - container `repr = "int"`: variants are represented by their discriminant
//! - variant `rename = "text"`: variant is represented by this string

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, ExprPath, Fields, LitStr};

#[derive(Default)]
struct FieldAttrs {
    rename: Option<LitStr>,
    skip: bool,
    base: bool,
    getter: Option<ExprPath>,
    setter: Option<ExprPath>,
}

#[derive(Default)]
struct ContainerAttrs {
    refine: Option<ExprPath>,
    convert_array: Option<ExprPath>,
    mapping: Option<ExprPath>,
    int_repr: bool,
}

fn parse_path(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<ExprPath> {
    let lit: LitStr = meta.value()?.parse()?;
    lit.parse()
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("reflectmap")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("base") {
                out.base = true;
            } else if meta.path.is_ident("getter") {
                out.getter = Some(parse_path(&meta)?);
            } else if meta.path.is_ident("setter") {
                out.setter = Some(parse_path(&meta)?);
            } else {
                return Err(meta.error("unsupported reflectmap field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn parse_container_attrs(attrs: &[syn::Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("reflectmap")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("refine") {
                out.refine = Some(parse_path(&meta)?);
            } else if meta.path.is_ident("convert_array") {
                out.convert_array = Some(parse_path(&meta)?);
            } else if meta.path.is_ident("mapping") {
                out.mapping = Some(parse_path(&meta)?);
            } else if meta.path.is_ident("repr") {
                let lit: LitStr = meta.value()?.parse()?;
                match lit.value().as_str() {
                    "int" => out.int_repr = true,
                    "name" => out.int_repr = false,
                    _ => return Err(syn::Error::new(lit.span(), "expected `repr = \"int\"` or `repr = \"name\"`")),
                }
            } else {
                return Err(meta.error("unsupported reflectmap container attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// Implements `Record` and `Field` for a struct with named fields.
///
/// # Example
/// ```ignore
/// #[derive(Default, Record)]
/// struct User {
///     #[reflectmap(base)]
///     entity: Entity,
///     #[reflectmap(rename = "userName")]
///     name: String,
///     #[reflectmap(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(reflectmap))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_record(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let container = parse_container_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "#[derive(Record)] requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "#[derive(Record)] only supports structs; use #[derive(RecordEnum)] for enums",
            ));
        }
    };

    let mut infos = Vec::new();
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();
    let mut nested_arms = Vec::new();
    let mut custom_get_arms = Vec::new();
    let mut custom_set_arms = Vec::new();
    let mut mappings = Vec::new();
    let mut base = None;

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;
        let ty = &field.ty;
        let field_name = ident.unraw().to_string();

        if attrs.base {
            if base.is_some() {
                return Err(syn::Error::new_spanned(ident, "a record can only have one `base` field"));
            }
            base = Some(ident.clone());
            continue;
        }

        let custom = attrs.getter.is_some() && attrs.setter.is_some();
        let kind = if attrs.skip || custom {
            quote!(::reflectmap::reflect::FieldKind::Opaque(stringify!(#ty)))
        } else {
            quote!(<#ty as ::reflectmap::reflect::Field>::kind())
        };
        let with_getter = attrs.getter.as_ref().map(|_| quote!(.with_getter()));
        let with_setter = attrs.setter.as_ref().map(|_| quote!(.with_setter()));
        infos.push(quote! {
            ::reflectmap::reflect::FieldInfo::new(#field_name, #kind) #with_getter #with_setter
        });

        if attrs.skip {
            mappings.push(quote!(::reflectmap::reflect::PropertyMapping::exclude(#field_name)));
            continue;
        }
        if let Some(rename) = &attrs.rename {
            mappings.push(quote!(::reflectmap::reflect::PropertyMapping::rename(#field_name, #rename)));
        }
        if let Some(getter) = &attrs.getter {
            custom_get_arms.push(quote! {
                #field_name => ::core::option::Option::Some(#getter(self)),
            });
        }
        if let Some(setter) = &attrs.setter {
            custom_set_arms.push(quote! {
                #field_name => {
                    #setter(self, value);
                    true
                }
            });
        }
        if custom {
            continue;
        }

        get_arms.push(quote! {
            #field_name => ::core::option::Option::Some(::reflectmap::reflect::Field::to_native(&self.#ident)),
        });
        set_arms.push(quote! {
            #field_name => {
                self.#ident = ::reflectmap::reflect::Field::from_native(value)?;
                ::core::result::Result::Ok(())
            }
        });
        nested_arms.push(quote! {
            #field_name => ::reflectmap::reflect::Field::record_mut(&mut self.#ident),
        });
    }

    let base_impl = base.map(|ident| {
        quote! {
            fn base(&self) -> ::core::option::Option<&dyn ::reflectmap::reflect::Record> {
                ::core::option::Option::Some(&self.#ident)
            }

            fn base_mut(&mut self) -> ::core::option::Option<&mut dyn ::reflectmap::reflect::Record> {
                ::core::option::Option::Some(&mut self.#ident)
            }
        }
    });

    let mapping_hook = container.mapping.as_ref().map(|hook| quote!(mappings.extend(#hook(self));));
    let mapping_impl = (!mappings.is_empty() || mapping_hook.is_some()).then(|| {
        quote! {
            fn property_mapping(&self) -> ::std::vec::Vec<::reflectmap::reflect::PropertyMapping> {
                #[allow(unused_mut)]
                let mut mappings = ::std::vec![#(#mappings),*];
                #mapping_hook
                mappings
            }
        }
    });

    let custom_get_impl = (!custom_get_arms.is_empty()).then(|| {
        quote! {
            fn custom_get(&self, name: &str) -> ::core::option::Option<::reflectmap::Value> {
                match name {
                    #(#custom_get_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    });

    let custom_set_impl = (!custom_set_arms.is_empty()).then(|| {
        quote! {
            fn custom_set(&mut self, name: &str, value: &::reflectmap::Value) -> bool {
                match name {
                    #(#custom_set_arms)*
                    _ => false,
                }
            }
        }
    });

    let refine_impl = container.refine.as_ref().map(|hook| {
        quote! {
            fn refine_type(
                &self,
                inbound: &::reflectmap::Mapping,
            ) -> ::core::option::Option<::std::boxed::Box<dyn ::reflectmap::reflect::Record>> {
                #hook(self, inbound)
            }
        }
    });

    let convert_array_impl = container.convert_array.as_ref().map(|hook| {
        quote! {
            fn convert_array(
                &self,
                field: &str,
                items: &[::reflectmap::reflect::NativeRef<'_>],
            ) -> ::core::option::Option<::reflectmap::Value> {
                #hook(self, field, items)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::reflectmap::reflect::Record for #name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #name_str
            }

            fn own_fields(&self) -> ::std::vec::Vec<::reflectmap::reflect::FieldInfo> {
                ::std::vec![#(#infos),*]
            }

            fn get_own(&self, name: &str) -> ::core::option::Option<::reflectmap::reflect::NativeRef<'_>> {
                match name {
                    #(#get_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_own(
                &mut self,
                name: &str,
                value: ::reflectmap::reflect::Native,
            ) -> ::core::result::Result<(), ::reflectmap::CoercionError> {
                match name {
                    #(#set_arms)*
                    _ => ::core::result::Result::Err(::reflectmap::CoercionError::UnknownField(name.to_string())),
                }
            }

            fn nested_mut(&mut self, name: &str) -> ::core::option::Option<&mut dyn ::reflectmap::reflect::Record> {
                match name {
                    #(#nested_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #base_impl
            #mapping_impl
            #custom_get_impl
            #custom_set_impl
            #refine_impl
            #convert_array_impl

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }

        impl #impl_generics ::reflectmap::reflect::Field for #name #ty_generics #where_clause {
            fn kind() -> ::reflectmap::reflect::FieldKind {
                ::reflectmap::reflect::FieldKind::Record(#name_str)
            }

            fn to_native(&self) -> ::reflectmap::reflect::NativeRef<'_> {
                ::reflectmap::reflect::NativeRef::Record(self)
            }

            fn from_native(value: ::reflectmap::reflect::Native) -> ::core::result::Result<Self, ::reflectmap::CoercionError> {
                ::reflectmap::reflect::record_from_native(value)
            }

            fn record_mut(&mut self) -> ::core::option::Option<&mut dyn ::reflectmap::reflect::Record> {
                ::core::option::Option::Some(self)
            }
        }
    })
}

/// Implements `Field` for an enum.
///
/// Unit variants are represented by their name, their `rename`, or (with `repr = "int"`) their discriminant,
/// and are rebuilt from any of those. A variant with a single unnamed field is represented by its payload and
/// is not rebuilt.
///
/// # Example
/// ```ignore
/// #[derive(RecordEnum)]
/// enum Status {
///     #[reflectmap(rename = "active")]
///     Active,
///     Suspended,
/// }
/// ```
#[proc_macro_derive(RecordEnum, attributes(reflectmap))]
pub fn derive_record_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_record_enum(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_record_enum(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();
    let container = parse_container_attrs(&input.attrs)?;

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(name, "#[derive(RecordEnum)] only supports enums"));
    };

    let mut to_arms = Vec::new();
    let mut text_arms = Vec::new();
    let mut int_checks = Vec::new();

    for variant in &data.variants {
        let ident = &variant.ident;
        let label = ident.unraw().to_string();
        let attrs = parse_field_attrs(&variant.attrs)?;

        match &variant.fields {
            Fields::Unit => {}
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                to_arms.push(quote! {
                    Self::#ident(payload) => ::reflectmap::reflect::EnumRepr::Associated {
                        label: #label,
                        payload: ::std::boxed::Box::new(::reflectmap::reflect::Field::to_native(payload)),
                    },
                });
                continue;
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "#[derive(RecordEnum)] supports unit variants and single-payload tuple variants",
                ));
            }
        }

        let repr = match (&attrs.rename, container.int_repr) {
            (Some(rename), _) => quote!(::reflectmap::reflect::EnumRepr::RawText(#rename)),
            (None, true) => quote!(::reflectmap::reflect::EnumRepr::RawInt(Self::#ident as i64)),
            (None, false) => quote!(::reflectmap::reflect::EnumRepr::Plain(#label)),
        };
        to_arms.push(quote!(Self::#ident => #repr,));

        let names = match &attrs.rename {
            Some(rename) => quote!(#rename | #label),
            None => quote!(#label),
        };
        text_arms.push(quote!(#names => ::core::result::Result::Ok(Self::#ident),));
        if container.int_repr {
            int_checks.push(quote! {
                if code == Self::#ident as i64 {
                    return ::core::result::Result::Ok(Self::#ident);
                }
            });
        }
    }

    let out_of_range = quote! {
        ::reflectmap::CoercionError::OutOfRange {
            value: ::std::string::ToString::to_string(&shown),
            target: #name_str,
        }
    };

    let number_arm = if container.int_repr {
        quote! {
            ::reflectmap::reflect::Native::Number(number) => {
                if let ::core::option::Option::Some(code) = number.as_i64() {
                    #(#int_checks)*
                }
                let shown = number;
                ::core::result::Result::Err(#out_of_range)
            }
        }
    } else {
        quote!()
    };

    Ok(quote! {
        impl ::reflectmap::reflect::Field for #name {
            fn kind() -> ::reflectmap::reflect::FieldKind {
                ::reflectmap::reflect::FieldKind::Enum(#name_str)
            }

            fn to_native(&self) -> ::reflectmap::reflect::NativeRef<'_> {
                let repr = match self {
                    #(#to_arms)*
                };
                ::reflectmap::reflect::NativeRef::Enum {
                    type_name: #name_str,
                    repr,
                }
            }

            fn from_native(value: ::reflectmap::reflect::Native) -> ::core::result::Result<Self, ::reflectmap::CoercionError> {
                match value {
                    ::reflectmap::reflect::Native::Text(text) => match text.as_str() {
                        #(#text_arms)*
                        _ => {
                            let shown = text;
                            ::core::result::Result::Err(#out_of_range)
                        }
                    },
                    #number_arm
                    other => ::core::result::Result::Err(::reflectmap::CoercionError::TypeMismatch {
                        expected: ::std::string::ToString::to_string(#name_str),
                        found: other.kind_name(),
                    }),
                }
            }
        }
    })
}
