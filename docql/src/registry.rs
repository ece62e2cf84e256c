//! Registration of collections and assembly of the query schema.
//!
//! A [`Registry`] maps collection names to the record types stored in them. Each registration
//! binds the record's fields and arguments once, and [`build_schema`](Registry::build_schema)
//! assembles the results into a schema with one root query field per collection. Each root field
//! resolves by querying the collection through the registry's [`SessionSource`].

use crate::backend::{self, SessionSource};
use crate::bind::{bind_arguments, bind_fields, Arguments, FieldType, ObjectType, TypeCache};
use crate::error::Error;
use crate::shape::{Kind, Reflect, Shape};
use crate::value::Document;
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, Schema, TypeRef};
use indexmap::IndexMap;
use std::sync::Arc;

/// The name of the root query type.
pub const ROOT_QUERY: &str = "RootQuery";

/// A registered collection.
#[derive(Clone, Debug)]
pub struct Collection {
    name: String,
    shape: &'static Shape,
    object: Arc<ObjectType>,
    args: Arguments,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shape of the records in this collection.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// The object type of the records in this collection.
    pub fn object(&self) -> &Arc<ObjectType> {
        &self.object
    }

    /// The arguments used to filter this collection.
    pub fn arguments(&self) -> &Arguments {
        &self.args
    }

    /// Build the root query field for this collection.
    fn root_field<S: SessionSource>(&self, source: Arc<S>) -> Field {
        let name = self.name.clone();
        let shape = self.shape;
        let mut field = Field::new(
            &self.name,
            TypeRef::named_list(self.object.name()),
            move |ctx| {
                let source = source.clone();
                let name = name.clone();
                FieldFuture::new(async move {
                    let query = ctx
                        .args
                        .iter()
                        .map(|(arg, value)| {
                            value
                                .deserialize::<serde_json::Value>()
                                .map(|json| (arg.to_string(), json))
                        })
                        .collect::<Result<Document, async_graphql::Error>>()?;
                    tracing::debug!("querying collection {name}: {query:?}");
                    let records = backend::find_many(&*source, &name, &query, shape).await?;
                    Ok(Some(FieldValue::list(
                        records.into_iter().map(FieldValue::owned_any),
                    )))
                })
            },
        );
        if let Some(description) = self.object.description() {
            field = field.description(description);
        }
        for arg in self.args.values() {
            field = field.argument(arg.to_input_value());
        }
        field
    }
}

/// The collections served by a schema.
#[derive(Debug)]
pub struct Registry<S> {
    source: Arc<S>,
    collections: IndexMap<String, Collection>,
    cache: TypeCache,
}

impl<S: SessionSource> Registry<S> {
    /// An empty registry whose schemas query `source`.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            collections: Default::default(),
            cache: Default::default(),
        }
    }

    /// Register a collection of records of type `T`.
    pub fn register<T: Reflect>(&mut self, name: impl Into<String>) -> Result<(), Error> {
        self.register_kind(name, T::kind())
    }

    /// Register a collection of records of the given kind.
    ///
    /// The kind must be a record, or an optional record. If registration fails, the registry is
    /// left unchanged.
    pub fn register_kind(&mut self, name: impl Into<String>, kind: Kind) -> Result<(), Error> {
        let name = name.into();
        if self.collections.contains_key(&name) {
            return Err(Error::CollectionExists { name });
        }
        let Some(record) = kind.as_record() else {
            return Err(Error::NotRecord {
                name,
                kind: kind.to_string(),
            });
        };
        let shape = record.shape();

        // Bind against a copy of the cache, so that nothing is cached if binding fails.
        let mut cache = self.cache.clone();
        let fields = bind_fields(shape, &mut cache)?;
        let args = bind_arguments(shape);
        let object = ObjectType::new(&name, shape, fields)
            .with_description(format!("Records in collection {name}"));

        tracing::debug!("registered collection {name} of {}", shape.name());
        self.cache = cache;
        self.collections.insert(
            name.clone(),
            Collection {
                name,
                shape,
                object: Arc::new(object),
                args,
            },
        );
        Ok(())
    }

    /// The collection registered as `name`, if there is one.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// All registered collections, in registration order.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    /// Build a schema serving all the registered collections.
    pub fn build_schema(&self) -> Result<Schema, Error> {
        let mut types = IndexMap::new();
        for collection in self.collections.values() {
            collect_types(&collection.object, &mut types)?;
        }
        for elem in self.cache.elements() {
            collect_types(elem, &mut types)?;
        }

        let mut query = Object::new(ROOT_QUERY);
        for collection in self.collections.values() {
            query = query.field(collection.root_field(self.source.clone()));
        }
        let mut schema = Schema::build(ROOT_QUERY, None, None).register(query);
        for ty in types.values() {
            schema = schema.register(ty.to_object());
        }
        let schema = schema.finish().map_err(Error::schema)?;

        tracing::info!(
            "built schema with {} collections and {} object types",
            self.collections.len(),
            types.len()
        );
        Ok(schema)
    }
}

/// Add `object` and every object type nested in its fields to `types`.
///
/// List element types are not followed, since they all live in the registry's type cache.
fn collect_types(
    object: &Arc<ObjectType>,
    types: &mut IndexMap<String, Arc<ObjectType>>,
) -> Result<(), Error> {
    if object.name() == ROOT_QUERY {
        return Err(Error::DuplicateType {
            name: ROOT_QUERY.into(),
        });
    }
    if let Some(existing) = types.get(object.name()) {
        if existing.same_type(object) {
            return Ok(());
        }
        return Err(Error::DuplicateType {
            name: object.name().into(),
        });
    }
    types.insert(object.name().into(), object.clone());
    for field in object.fields().values() {
        if let FieldType::Object(nested) = field.ty() {
            collect_types(nested, types)?;
        }
    }
    Ok(())
}
