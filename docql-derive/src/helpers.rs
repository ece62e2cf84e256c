//! Utilities for parsing attributes.

use syn::{Attribute, Expr, ExprLit, Lit, LitStr, Meta};

/// Collect the documentation attached to an item.
///
/// Each line of a doc comment is a separate `#[doc = "..."]` attribute. The lines are trimmed and
/// joined with newlines. Returns [`None`] if there is no documentation.
pub fn parse_docs(attrs: &[Attribute]) -> Option<String> {
    let lines = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n").trim().to_string())
    }
}

/// Parser for a string-valued attribute with a given name.
///
/// Both `#[name("value")]` and `#[name = "value"]` are accepted.
pub struct TagParser {
    name: &'static str,
}

impl TagParser {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Get the value of the attribute, if present.
    ///
    /// If the attribute is given more than once, the last occurrence wins.
    pub fn get(&self, attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
        let mut value = None;
        for attr in attrs {
            if !attr.path().is_ident(self.name) {
                continue;
            }
            value = Some(match &attr.meta {
                Meta::List(_) => attr.parse_args::<LitStr>()?,
                Meta::NameValue(nv) => match &nv.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => s.clone(),
                    value => {
                        return Err(syn::Error::new_spanned(
                            value,
                            format!("{} tag must be a string literal", self.name),
                        ))
                    }
                },
                Meta::Path(path) => {
                    return Err(syn::Error::new_spanned(
                        path,
                        format!(
                            "{} attribute requires a tag, as in #[{}(\"name\")]",
                            self.name, self.name
                        ),
                    ))
                }
            });
        }
        Ok(value)
    }
}
