//! Binding of record fields to query arguments.
//!
//! Each collection query takes one optional argument per filterable field of the collection's
//! record. Only the top level of the record is considered, and only fields holding scalars or
//! lists of scalars can be filtered on. The arguments given in a query are passed on to the
//! backend as-is, so an argument's name is exactly the document key it filters.

use super::types::{map_kind, ScalarType, TypeMapping};
use crate::shape::{Kind, Shape};
use async_graphql::dynamic::{InputValue, TypeRef};
use indexmap::IndexMap;

/// The type of a query argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentType {
    Scalar(ScalarType),
    List(ScalarType),
}

impl ArgumentType {
    pub fn type_ref(self) -> TypeRef {
        match self {
            Self::Scalar(scalar) => TypeRef::named(scalar.type_name()),
            Self::List(scalar) => TypeRef::named_list(scalar.type_name()),
        }
    }
}

/// An argument of a collection query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    name: String,
    ty: ArgumentType,
    description: Option<&'static str>,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: ArgumentType) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ArgumentType {
        self.ty
    }

    pub fn description(&self) -> Option<&'static str> {
        self.description
    }

    /// Build the dynamic GraphQL input value for this argument.
    pub fn to_input_value(&self) -> InputValue {
        let input = InputValue::new(&self.name, self.ty.type_ref());
        match self.description {
            Some(description) => input.description(description),
            None => input,
        }
    }
}

/// The arguments of a collection query, indexed by name.
pub type Arguments = IndexMap<String, Argument>;

/// Bind the top-level fields of a record to query arguments.
///
/// A field becomes an argument if it is tagged with a name and holds, possibly optionally, a
/// scalar or a list of scalars. Nested records and lists of records are not filterable.
pub fn bind_arguments(shape: &'static Shape) -> Arguments {
    let mut args = Arguments::new();
    for field in shape.fields() {
        let name = field.directive();
        if name.is_empty() || field.is_skipped() {
            continue;
        }
        let kind = field.kind().deref_optional();
        if matches!(kind, Kind::Record(_)) {
            continue;
        }
        let ty = match map_kind(kind) {
            TypeMapping::Scalar(scalar) => ArgumentType::Scalar(scalar),
            TypeMapping::ScalarList(scalar) => ArgumentType::List(scalar),
            TypeMapping::RecordList(_) => continue,
        };
        let mut arg = Argument::new(name, ty);
        arg.description = field.doc();
        args.insert(name.into(), arg);
    }
    tracing::debug!(
        "bound arguments of {}: {:?}",
        shape.name(),
        args.keys().collect::<Vec<_>>()
    );
    args
}
