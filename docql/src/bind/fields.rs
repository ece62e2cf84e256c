//! Binding of record fields to GraphQL object fields.

use super::types::{map_kind, BoundField, FieldType, Fields, ListType, ObjectType, TypeMapping};
use crate::error::Error;
use crate::shape::{Kind, RecordRef, Shape};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Types shared between every collection bound by one registry.
///
/// A list of records is bound once per element type. The list type and the object type of its
/// elements are cached here under the element's [normalized name](Shape::normalized_name), and
/// every later field listing the same element type reuses them.
#[derive(Clone, Debug, Default)]
pub struct TypeCache {
    lists: HashMap<String, Arc<ListType>>,
    elements: IndexMap<String, Arc<ObjectType>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The list type for elements with normalized name `name`, if it has been bound.
    pub fn list(&self, name: &str) -> Option<&Arc<ListType>> {
        self.lists.get(name)
    }

    /// The object type for list elements with normalized name `name`, if it has been bound.
    pub fn element(&self, name: &str) -> Option<&Arc<ObjectType>> {
        self.elements.get(name)
    }

    /// All the list element types bound so far, in the order they were bound.
    pub fn elements(&self) -> impl Iterator<Item = &Arc<ObjectType>> {
        self.elements.values()
    }
}

/// Bind the fields of a record to GraphQL fields.
///
/// The result maps each exposed name to its field, in declaration order:
/// * fields tagged [`SKIP`](crate::shape::SKIP) are omitted;
/// * an untagged nested record has its own fields spliced in, where a later field silently
///   replaces an earlier one with the same name;
/// * a tagged nested record becomes a single field, whose type is a new object named after the
///   tag;
/// * other tagged fields are typed by [`map_kind`], with lists of records bound through `cache`;
/// * other untagged fields are omitted.
///
/// A record which contains itself without a list in between cannot be represented, and is
/// rejected with [`Error::RecursiveRecord`].
pub fn bind_fields(shape: &'static Shape, cache: &mut TypeCache) -> Result<Fields, Error> {
    Binder::new(cache).fields(shape)
}

struct Binder<'a> {
    cache: &'a mut TypeCache,
    /// Records enclosing the one currently being bound.
    path: Vec<&'static str>,
}

impl<'a> Binder<'a> {
    fn new(cache: &'a mut TypeCache) -> Self {
        Self { cache, path: vec![] }
    }

    fn fields(&mut self, shape: &'static Shape) -> Result<Fields, Error> {
        self.path.push(shape.name());
        let mut fields = Fields::new();
        for field in shape.fields() {
            if field.is_skipped() {
                continue;
            }
            let directive = field.directive();
            let kind = field.kind().deref_optional();

            if let Kind::Record(nested) = kind {
                let nested = nested.shape();
                if self.path.contains(&nested.name()) {
                    return Err(Error::RecursiveRecord {
                        record: shape.name().into(),
                        field: field.ident().into(),
                    });
                }
                let nested_fields = self.fields(nested)?;
                if directive.is_empty() {
                    fields.extend(nested_fields);
                } else {
                    let object = ObjectType::new(directive, nested, nested_fields);
                    fields.insert(
                        directive.into(),
                        BoundField::new(directive, FieldType::Object(Arc::new(object)))
                            .with_description(field.doc()),
                    );
                }
                continue;
            }

            if directive.is_empty() {
                continue;
            }
            let ty = match map_kind(kind) {
                TypeMapping::Scalar(scalar) => FieldType::Scalar(scalar),
                TypeMapping::ScalarList(scalar) => FieldType::ScalarList(scalar),
                TypeMapping::RecordList(elem) => FieldType::List(self.list(elem)?),
            };
            fields.insert(
                directive.into(),
                BoundField::new(directive, ty).with_description(field.doc()),
            );
        }
        self.path.pop();

        tracing::debug!(
            "bound fields of {}: {:?}",
            shape.name(),
            fields.keys().collect::<Vec<_>>()
        );
        Ok(fields)
    }

    /// Bind a list of records.
    fn list(&mut self, elem: RecordRef) -> Result<Arc<ListType>, Error> {
        let shape = elem.shape();
        let name = shape.normalized_name();
        if let Some(list) = self.cache.list(&name) {
            return Ok(list.clone());
        }

        // Cache the list before binding its elements, so that an element which contains another
        // list of its own type finds it.
        let list = Arc::new(ListType::new(&name));
        self.cache.lists.insert(name.clone(), list.clone());

        // Each element is a record of its own, so it starts with a fresh path. A list breaks any
        // cycle between the element and the records enclosing the list.
        let fields = Binder::new(&mut *self.cache).fields(shape)?;
        self.cache
            .elements
            .insert(name.clone(), Arc::new(ObjectType::new(name, shape, fields)));
        Ok(list)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bind::types::ScalarType;
    use crate::shape::Record;

    #[derive(Record)]
    #[allow(dead_code)]
    struct Audit {
        #[bson("created")]
        created: i64,
        /// Shadowed by `Person::note`.
        #[bson("note")]
        note: String,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Address {
        #[bson("street")]
        street: String,
        #[bson("-")]
        internal: String,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Person {
        audit: Audit,
        /// The person's name.
        #[bson("name,omitempty")]
        name: String,
        #[bson("age")]
        age: Option<i32>,
        #[bson("address")]
        address: Option<Address>,
        #[bson("tags")]
        tags: Vec<String>,
        #[bson("friends")]
        friends: Vec<Person>,
        #[bson("-")]
        secret: Audit,
        #[bson("note")]
        note: String,
        untagged: i32,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Group {
        #[bson("members")]
        members: Vec<Person>,
        #[bson("leaders")]
        leaders: Vec<Option<Person>>,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Node {
        #[bson("value")]
        value: i32,
        #[bson("next")]
        next: Option<Box<Node>>,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Left {
        right: Right,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Right {
        #[bson("left")]
        left: Box<Left>,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Team {
        #[bson("name")]
        name: String,
        #[bson("players")]
        players: Vec<Player>,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Player {
        #[bson("team")]
        team: Team,
    }

    fn names(fields: &Fields) -> Vec<&str> {
        fields.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_bind_fields() {
        let mut cache = TypeCache::new();
        let fields = bind_fields(Person::shape(), &mut cache).unwrap();
        assert_eq!(
            names(&fields),
            ["created", "note", "name", "age", "address", "tags", "friends"]
        );

        assert!(matches!(fields["created"].ty(), FieldType::Scalar(ScalarType::Int)));
        assert!(matches!(fields["age"].ty(), FieldType::Scalar(ScalarType::Int)));
        assert!(matches!(
            fields["tags"].ty(),
            FieldType::ScalarList(ScalarType::String)
        ));
        assert_eq!(fields["name"].description(), Some("The person's name."));

        // The later `note` replaces the one spliced in from `audit`.
        assert_eq!(fields["note"].description(), None);

        let FieldType::Object(address) = fields["address"].ty() else {
            panic!("address is not an object");
        };
        assert_eq!(address.name(), "address");
        assert_eq!(names(address.fields()), ["street"]);
    }

    #[test]
    fn test_bind_list() {
        let mut cache = TypeCache::new();
        let fields = bind_fields(Person::shape(), &mut cache).unwrap();
        let FieldType::List(friends) = fields["friends"].ty() else {
            panic!("friends is not a list");
        };
        let name = Person::shape().normalized_name();
        assert_eq!(friends.item(), name);
        assert!(Arc::ptr_eq(friends, cache.list(&name).unwrap()));

        // The element type has the same fields as the record itself, including the recursive
        // list, which refers back to the cached list type.
        let elem = cache.element(&name).unwrap();
        assert_eq!(elem.name(), name);
        assert_eq!(names(elem.fields()), names(&fields));
        let FieldType::List(nested) = elem.fields()["friends"].ty() else {
            panic!("friends is not a list");
        };
        assert!(Arc::ptr_eq(friends, nested));
    }

    #[test]
    fn test_shared_list() {
        let mut cache = TypeCache::new();
        let people = bind_fields(Person::shape(), &mut cache).unwrap();
        let groups = bind_fields(Group::shape(), &mut cache).unwrap();

        let FieldType::List(friends) = people["friends"].ty() else {
            panic!("friends is not a list");
        };
        for field in ["members", "leaders"] {
            let FieldType::List(list) = groups[field].ty() else {
                panic!("{field} is not a list");
            };
            assert!(Arc::ptr_eq(friends, list));
        }
        assert_eq!(cache.elements().count(), 1);
    }

    #[test]
    fn test_recursive_record() {
        let mut cache = TypeCache::new();
        assert_eq!(
            bind_fields(Node::shape(), &mut cache).unwrap_err(),
            Error::RecursiveRecord {
                record: Node::shape().name().into(),
                field: "next".into(),
            }
        );
        assert_eq!(
            bind_fields(Left::shape(), &mut cache).unwrap_err(),
            Error::RecursiveRecord {
                record: Right::shape().name().into(),
                field: "left".into(),
            }
        );
    }

    #[test]
    fn test_recursion_through_list() {
        let mut cache = TypeCache::new();
        let fields = bind_fields(Team::shape(), &mut cache).unwrap();
        assert_eq!(names(&fields), ["name", "players"]);

        let player = cache.element(&Player::shape().normalized_name()).unwrap();
        let FieldType::Object(team) = player.fields()["team"].ty() else {
            panic!("team is not an object");
        };
        assert!(matches!(team.fields()["players"].ty(), FieldType::List(_)));
    }
}
