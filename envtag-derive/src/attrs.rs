//! Attribute parsing

use syn::{Attribute, Field, LitStr};

/// Field attributes
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Environment variable name, or key prefix for struct fields
    pub tag: Option<String>,
}

impl FieldAttrs {
    /// Parse `#[env("KEY")]` or `#[env(name = "KEY")]` from a field.
    ///
    /// An empty tag leaves the field unbound.
    pub fn from_field(field: &Field) -> syn::Result<Self> {
        let mut attrs = Self::default();

        for attr in env_attrs(&field.attrs) {
            // #[env("KEY")]
            if let Ok(tag) = attr.parse_args::<LitStr>() {
                attrs.tag = Some(tag.value());
                continue;
            }

            attr.parse_nested_meta(|meta| {
                // name = "..."
                if meta.path.is_ident("name") {
                    let tag: LitStr = meta.value()?.parse()?;
                    attrs.tag = Some(tag.value());
                    return Ok(());
                }

                Err(meta.error("unsupported env attribute"))
            })?;
        }

        attrs.tag = attrs.tag.filter(|tag| !tag.is_empty());
        Ok(attrs)
    }
}

/// Struct attributes
#[derive(Debug, Default)]
pub struct StructAttrs {
    /// Delegate to the type's `EnvUnmarshaler` implementation
    pub custom: bool,
}

impl StructAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in env_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("custom") {
                    parsed.custom = true;
                    return Ok(());
                }

                Err(meta.error("unsupported struct-level env attribute"))
            })?;
        }

        Ok(parsed)
    }
}

fn env_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("env"))
}
