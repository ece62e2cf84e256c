//! The GraphQL types produced by binding record shapes.
//!
//! These are an intermediate representation between [`Shape`](crate::shape::Shape)s and the
//! [`async_graphql::dynamic`] types served by the schema. The dynamic types are consumed when a
//! schema is built, but a registry may build its schema many times, so the bound types are kept
//! here and converted on each build.

use crate::shape::{Kind, RecordRef, Shape};
use crate::value::{RecordValue, Value};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef};
use derive_more::Display;
use indexmap::IndexMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// A GraphQL scalar type.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarType {
    #[display(fmt = "Int")]
    Int,
    #[display(fmt = "Float")]
    Float,
    #[display(fmt = "Boolean")]
    Boolean,
    #[display(fmt = "String")]
    String,
}

impl ScalarType {
    /// The name of this type in a GraphQL schema.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Int => TypeRef::INT,
            Self::Float => TypeRef::FLOAT,
            Self::Boolean => TypeRef::BOOLEAN,
            Self::String => TypeRef::STRING,
        }
    }
}

/// The GraphQL type a [`Kind`] maps to.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeMapping {
    /// A scalar.
    Scalar(ScalarType),
    /// A list of scalars.
    ScalarList(ScalarType),
    /// A list of records, which must be bound to an object type of its own.
    RecordList(RecordRef),
}

/// Map a kind of data to a GraphQL type.
///
/// Integers, floats, booleans and strings map to the corresponding scalars, and lists of them to
/// lists of scalars. A list of records (possibly optional) maps to [`TypeMapping::RecordList`].
/// Anything else is represented as a string.
pub fn map_kind(kind: &Kind) -> TypeMapping {
    match kind {
        Kind::List(elem) => match elem.deref_optional() {
            Kind::Record(record) => TypeMapping::RecordList(*record),
            elem => TypeMapping::ScalarList(map_scalar(elem)),
        },
        kind => TypeMapping::Scalar(map_scalar(kind)),
    }
}

/// Map a kind of data to a GraphQL scalar, falling back to [`ScalarType::String`].
pub fn map_scalar(kind: &Kind) -> ScalarType {
    match kind {
        Kind::Int => ScalarType::Int,
        Kind::Float => ScalarType::Float,
        Kind::Bool => ScalarType::Boolean,
        Kind::String => ScalarType::String,
        kind => {
            tracing::warn!("no GraphQL scalar for {kind}, representing it as a string");
            ScalarType::String
        }
    }
}

/// A function which resolves the value of a field from its parent record.
pub type Resolver = Arc<dyn Fn(&RecordValue) -> Option<Value> + Send + Sync>;

/// The fields of an object type, indexed by exposed name.
pub type Fields = IndexMap<String, BoundField>;

/// A GraphQL object type bound from the fields of a record.
#[derive(Debug)]
pub struct ObjectType {
    name: String,
    shape: &'static Shape,
    description: Option<String>,
    fields: Fields,
}

impl ObjectType {
    pub fn new(name: impl Into<String>, shape: &'static Shape, fields: Fields) -> Self {
        Self {
            name: name.into(),
            shape,
            description: None,
            fields,
        }
    }

    /// Describe this object type.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The record this type was bound from.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Do `self` and `other` describe the same GraphQL type?
    ///
    /// Binding is deterministic, so two object types with the same name bound from the same record
    /// are interchangeable, even if they were bound separately.
    pub fn same_type(&self, other: &Self) -> bool {
        self.name == other.name && self.shape.name() == other.shape.name()
    }

    /// Build the dynamic GraphQL object for this type.
    pub fn to_object(&self) -> Object {
        let mut object = Object::new(&self.name);
        if let Some(description) = &self.description {
            object = object.description(description);
        }
        for field in self.fields.values() {
            object = object.field(field.to_field());
        }
        object
    }
}

/// A list of records, each resolved as the object type named [`item`](Self::item).
///
/// List types are shared through the binder's type cache, so every field listing the same record
/// type refers to the same `ListType`.
#[derive(Debug, PartialEq, Eq)]
pub struct ListType {
    item: String,
}

impl ListType {
    pub fn new(item: impl Into<String>) -> Self {
        Self { item: item.into() }
    }

    /// The name of the object type of the items in this list.
    pub fn item(&self) -> &str {
        &self.item
    }
}

/// The type of a bound field.
#[derive(Clone, Debug)]
pub enum FieldType {
    Scalar(ScalarType),
    ScalarList(ScalarType),
    /// A nested record exposed as an object of its own.
    Object(Arc<ObjectType>),
    /// A list of records.
    List(Arc<ListType>),
}

impl FieldType {
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Self::Scalar(scalar) => TypeRef::named(scalar.type_name()),
            Self::ScalarList(scalar) => TypeRef::named_list(scalar.type_name()),
            Self::Object(object) => TypeRef::named(object.name()),
            Self::List(list) => TypeRef::named_list(list.item()),
        }
    }
}

/// A field of an object type, together with the function that resolves it.
#[derive(Clone)]
pub struct BoundField {
    name: String,
    ty: FieldType,
    description: Option<String>,
    resolve: Resolver,
}

impl BoundField {
    /// A field which resolves to the value exposed as `name` on its parent record.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        let name = name.into();
        let key = name.clone();
        Self {
            name,
            ty,
            description: None,
            resolve: Arc::new(move |record| record.extract(&key).cloned()),
        }
    }

    pub fn with_description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = description.map(Into::into);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Resolve this field on a record.
    pub fn resolve(&self, record: &RecordValue) -> Option<Value> {
        (self.resolve)(record)
    }

    /// Build the dynamic GraphQL field for this field.
    pub fn to_field(&self) -> Field {
        let resolve = self.resolve.clone();
        let field = Field::new(&self.name, self.ty.type_ref(), move |ctx| {
            let resolve = resolve.clone();
            FieldFuture::new(async move {
                let record = ctx.parent_value.try_downcast_ref::<RecordValue>()?;
                Ok(resolve(record).and_then(field_value))
            })
        });
        match &self.description {
            Some(description) => field.description(description),
            None => field,
        }
    }
}

impl Debug for BoundField {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("BoundField")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("description", &self.description)
            .finish()
    }
}

/// Convert a field value into the value resolved for GraphQL.
///
/// Records are passed on as the parent value of their own fields' resolvers.
pub fn field_value(value: Value) -> Option<FieldValue<'static>> {
    match value {
        Value::Null => None,
        Value::Record(record) => Some(FieldValue::owned_any(record)),
        Value::List(items) => Some(FieldValue::list(
            items
                .into_iter()
                .map(|item| field_value(item).unwrap_or(FieldValue::NULL)),
        )),
        scalar => Some(FieldValue::value(scalar.to_graphql())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shape::{Record, Reflect};

    #[derive(Record)]
    #[allow(dead_code)]
    struct Item {
        #[bson("id")]
        id: i32,
    }

    #[test]
    fn test_map_kind() {
        assert_eq!(map_kind(&i64::kind()), TypeMapping::Scalar(ScalarType::Int));
        assert_eq!(map_kind(&u8::kind()), TypeMapping::Scalar(ScalarType::Int));
        assert_eq!(map_kind(&f32::kind()), TypeMapping::Scalar(ScalarType::Float));
        assert_eq!(map_kind(&bool::kind()), TypeMapping::Scalar(ScalarType::Boolean));
        assert_eq!(map_kind(&String::kind()), TypeMapping::Scalar(ScalarType::String));
        assert_eq!(
            map_kind(&<Vec<i32>>::kind()),
            TypeMapping::ScalarList(ScalarType::Int)
        );
        assert_eq!(
            map_kind(&<Vec<Item>>::kind()),
            TypeMapping::RecordList(RecordRef::of::<Item>())
        );
        assert_eq!(
            map_kind(&<Vec<Option<Item>>>::kind()),
            TypeMapping::RecordList(RecordRef::of::<Item>())
        );
    }

    #[test]
    fn test_map_kind_fallback() {
        assert_eq!(map_kind(&char::kind()), TypeMapping::Scalar(ScalarType::String));
        assert_eq!(
            map_kind(&<Option<Option<i32>>>::kind()),
            TypeMapping::Scalar(ScalarType::String)
        );
        assert_eq!(
            map_kind(&<Vec<Vec<i32>>>::kind()),
            TypeMapping::ScalarList(ScalarType::String)
        );
        assert_eq!(
            map_kind(&<std::collections::HashMap<String, i32>>::kind()),
            TypeMapping::Scalar(ScalarType::String)
        );
    }

    #[test]
    fn test_field_resolver() {
        let field = BoundField::new("id", FieldType::Scalar(ScalarType::Int));
        let record = RecordValue::new(Item::shape(), vec![Value::Int(3)]);
        assert_eq!(field.resolve(&record), Some(Value::Int(3)));
        assert_eq!(
            BoundField::new("other", FieldType::Scalar(ScalarType::Int)).resolve(&record),
            None
        );
    }
}
