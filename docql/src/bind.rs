//! Derivation of GraphQL types from record shapes.
//!
//! Binding walks the [`Shape`](crate::shape::Shape) of a record and produces the GraphQL object
//! type used to query it ([`bind_fields`]) and the arguments used to filter it
//! ([`bind_arguments`]). Binding is a pure function of the shape and a [`TypeCache`] of list types
//! shared between all the records bound into one schema.

pub mod args;
pub mod fields;
pub mod types;

pub use args::{bind_arguments, Argument, ArgumentType, Arguments};
pub use fields::{bind_fields, TypeCache};
pub use types::{
    field_value, map_kind, map_scalar, BoundField, FieldType, Fields, ListType, ObjectType,
    ScalarType, TypeMapping,
};
