//! In-memory instantiation of the abstract [`backend`](super) interface.
//!
//! This backend keeps each collection as a list of documents in memory. It is useful for testing
//! and demos, in isolation from an actual document store.
//!
//! Queries are matched by top-level equality: a document matches a query if, for every key in the
//! query, the document has an equal value under that key. A missing key is equal to `null`, and an
//! array matches any scalar it contains. A query string also matches a stored non-string value
//! whose JSON text it is, since that is how such values are exposed. Updates replace the top-level
//! keys they name.

use super::{Session, SessionSource};
use crate::shape::Shape;
use crate::value::{DecodeError, Document, RecordValue};
use async_std::sync::{Arc, RwLock};
use async_trait::async_trait;
use serde_json::Value as Json;
use snafu::Snafu;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Errors returned by the in-memory store.
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("{source}"))]
    Decode { source: DecodeError },

    #[snafu(display("invalid data for collection {collection}: {message}"))]
    Seed { collection: String, message: String },
}

impl From<DecodeError> for Error {
    fn from(source: DecodeError) -> Self {
        Self::Decode { source }
    }
}

type Collections = HashMap<String, Vec<Document>>;

/// An in-memory document store.
///
/// Cloning the store creates a new handle to the same underlying collections.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    sessions: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of sessions which have been opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Insert documents into many collections at once.
    ///
    /// `data` maps collection names to arrays of documents.
    pub async fn seed(&self, data: Document) -> Result<(), Error> {
        let mut collections = self.collections.write().await;
        for (collection, documents) in data {
            let documents = match documents {
                Json::Array(documents) => documents,
                other => {
                    return Err(Error::Seed {
                        collection,
                        message: format!("expected an array of documents, got {other}"),
                    })
                }
            };
            let documents = documents
                .into_iter()
                .map(|document| match document {
                    Json::Object(document) => Ok(document),
                    other => Err(Error::Seed {
                        collection: collection.clone(),
                        message: format!("expected a document, got {other}"),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            tracing::info!(
                "seeding collection {collection} with {} documents",
                documents.len()
            );
            collections.entry(collection).or_default().extend(documents);
        }
        Ok(())
    }
}

impl SessionSource for MemoryStore {
    type Session = MemorySession;

    fn session(&self) -> MemorySession {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        MemorySession {
            store: self.clone(),
        }
    }
}

/// A session with a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
}

impl MemorySession {
    async fn with_matches<T>(
        &self,
        collection: &str,
        query: &Document,
        f: impl FnOnce(Vec<&Document>) -> T,
    ) -> T {
        let collections = self.store.collections.read().await;
        let documents = match collections.get(collection) {
            Some(documents) => documents
                .iter()
                .filter(|document| matches(document, query))
                .collect(),
            None => vec![],
        };
        f(documents)
    }

    async fn update(
        &mut self,
        collection: &str,
        query: &Document,
        update: &Document,
        limit: usize,
    ) -> usize {
        let mut collections = self.store.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return 0;
        };
        let mut updated = 0;
        for document in documents
            .iter_mut()
            .filter(|document| matches(document, query))
            .take(limit)
        {
            for (key, value) in update {
                document.insert(key.clone(), value.clone());
            }
            updated += 1;
        }
        updated
    }
}

#[async_trait]
impl Session for MemorySession {
    type Error = Error;

    async fn insert(&mut self, collection: &str, document: Document) -> Result<(), Error> {
        self.store
            .collections
            .write()
            .await
            .entry(collection.into())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn delete(&mut self, collection: &str, query: &Document) -> Result<usize, Error> {
        let mut collections = self.store.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|document| !matches(document, query));
        Ok(before - documents.len())
    }

    async fn find_one(
        &mut self,
        collection: &str,
        query: &Document,
        shape: &'static Shape,
    ) -> Result<Option<RecordValue>, Error> {
        self.with_matches(collection, query, |documents| {
            documents
                .first()
                .map(|document| RecordValue::decode(shape, document))
                .transpose()
                .map_err(Error::from)
        })
        .await
    }

    async fn find_many(
        &mut self,
        collection: &str,
        query: &Document,
        shape: &'static Shape,
    ) -> Result<Vec<RecordValue>, Error> {
        self.with_matches(collection, query, |documents| {
            documents
                .into_iter()
                .map(|document| RecordValue::decode(shape, document).map_err(Error::from))
                .collect()
        })
        .await
    }

    async fn update_one(
        &mut self,
        collection: &str,
        query: &Document,
        update: &Document,
    ) -> Result<bool, Error> {
        Ok(self.update(collection, query, update, 1).await == 1)
    }

    async fn update_many(
        &mut self,
        collection: &str,
        query: &Document,
        update: &Document,
    ) -> Result<usize, Error> {
        Ok(self.update(collection, query, update, usize::MAX).await)
    }

    fn close(self) {
        self.store.sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Does `document` match `query`?
fn matches(document: &Document, query: &Document) -> bool {
    query.iter().all(|(key, expected)| {
        let actual = document.get(key).unwrap_or(&Json::Null);
        match actual {
            _ if equal(actual, expected) => true,
            Json::Array(items) if !expected.is_array() => {
                items.iter().any(|item| equal(item, expected))
            }
            _ => false,
        }
    })
}

/// Is the stored value `actual` equal to the query value `expected`?
///
/// Values exposed as strings only because they have no GraphQL scalar are queried by their JSON
/// text, so a query string also equals any non-string value with that text.
fn equal(actual: &Json, expected: &Json) -> bool {
    match (actual, expected) {
        (Json::String(_), _) => actual == expected,
        (Json::Array(items), Json::Array(expected)) => {
            items.len() == expected.len()
                && items.iter().zip(expected).all(|(item, expected)| equal(item, expected))
        }
        (actual, Json::String(text)) => actual != &Json::Null && actual.to_string() == *text,
        _ => actual == expected,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shape::Record;
    use crate::value::Value;
    use serde_json::json;

    #[derive(Record)]
    #[allow(dead_code)]
    struct Person {
        #[bson("name")]
        name: String,
        #[bson("age")]
        age: Option<i32>,
        #[bson("tags")]
        tags: Vec<String>,
    }

    fn doc(value: Json) -> Document {
        match value {
            Json::Object(doc) => doc,
            _ => panic!("not a document: {value}"),
        }
    }

    async fn people() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(doc(json!({
                "people": [
                    { "name": "Alice", "age": 30, "tags": ["admin", "staff"] },
                    { "name": "Bob", "age": 42, "tags": ["staff"] },
                    { "name": "Carol", "tags": [] },
                ]
            })))
            .await
            .unwrap();
        store
    }

    async fn names(session: &mut MemorySession, query: Json) -> Vec<Value> {
        session
            .find_many("people", &doc(query), Person::shape())
            .await
            .unwrap()
            .iter()
            .map(|person| person.get("name").unwrap().clone())
            .collect()
    }

    #[async_std::test]
    async fn test_find() {
        let store = people().await;
        let mut session = store.session();

        assert_eq!(
            names(&mut session, json!({})).await,
            [Value::from("Alice"), "Bob".into(), "Carol".into()]
        );
        assert_eq!(names(&mut session, json!({ "name": "Bob" })).await, [Value::from("Bob")]);
        assert_eq!(
            names(&mut session, json!({ "tags": "staff" })).await,
            [Value::from("Alice"), "Bob".into()]
        );
        assert_eq!(
            names(&mut session, json!({ "tags": ["staff"] })).await,
            [Value::from("Bob")]
        );
        assert_eq!(names(&mut session, json!({ "age": null })).await, [Value::from("Carol")]);
        assert_eq!(
            names(&mut session, json!({ "name": "Bob", "age": 30 })).await,
            Vec::<Value>::new()
        );

        let carol = session
            .find_one("people", &doc(json!({ "name": "Carol" })), Person::shape())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(carol.get("age"), Some(&Value::Null));
        assert_eq!(
            session
                .find_one("nobody", &Document::new(), Person::shape())
                .await
                .unwrap(),
            None
        );

        session.close();
    }

    #[async_std::test]
    async fn test_find_by_text() {
        let store = people().await;
        let mut session = store.session();
        session
            .insert(
                "people",
                doc(json!({
                    "name": "Dave",
                    "tags": [],
                    "grid": [[1, 2], [3]],
                    "extra": { "a": 1 },
                })),
            )
            .await
            .unwrap();

        assert_eq!(names(&mut session, json!({ "age": "30" })).await, [Value::from("Alice")]);
        assert_eq!(
            names(&mut session, json!({ "grid": ["[1,2]", "[3]"] })).await,
            [Value::from("Dave")]
        );
        assert_eq!(names(&mut session, json!({ "grid": "[3]" })).await, [Value::from("Dave")]);
        assert_eq!(
            names(&mut session, json!({ "extra": "{\"a\":1}" })).await,
            [Value::from("Dave")]
        );

        // Stored strings and nulls are not matched by their JSON text.
        assert_eq!(
            names(&mut session, json!({ "name": "\"Bob\"" })).await,
            Vec::<Value>::new()
        );
        assert_eq!(
            names(&mut session, json!({ "age": "null" })).await,
            Vec::<Value>::new()
        );

        session.close();
    }

    #[async_std::test]
    async fn test_modify() {
        let store = people().await;
        let mut session = store.session();

        session
            .insert("people", doc(json!({ "name": "Dave", "tags": ["staff"] })))
            .await
            .unwrap();
        assert_eq!(
            session
                .update_many(
                    "people",
                    &doc(json!({ "tags": "staff" })),
                    &doc(json!({ "age": 50 }))
                )
                .await
                .unwrap(),
            3
        );
        assert!(session
            .update_one(
                "people",
                &doc(json!({ "name": "Carol" })),
                &doc(json!({ "name": "Caroline" }))
            )
            .await
            .unwrap());
        assert!(!session
            .update_one(
                "people",
                &doc(json!({ "name": "Carol" })),
                &doc(json!({ "age": 1 }))
            )
            .await
            .unwrap());
        assert_eq!(
            names(&mut session, json!({ "age": 50 })).await,
            [Value::from("Alice"), "Bob".into(), "Dave".into()]
        );

        assert_eq!(
            session
                .delete("people", &doc(json!({ "age": 50 })))
                .await
                .unwrap(),
            3
        );
        assert_eq!(names(&mut session, json!({})).await, [Value::from("Caroline")]);

        session.close();
    }

    #[async_std::test]
    async fn test_decode_error() {
        let store = people().await;
        let mut session = store.session();
        session
            .insert("people", doc(json!({ "name": 7 })))
            .await
            .unwrap();
        let err = session
            .find_many("people", &Document::new(), Person::shape())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err}");
        session.close();
    }

    #[async_std::test]
    async fn test_seed_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.seed(doc(json!({ "people": { "name": "Alice" } }))).await,
            Err(Error::Seed { .. })
        ));
        assert!(matches!(
            store.seed(doc(json!({ "people": ["Alice"] }))).await,
            Err(Error::Seed { .. })
        ));
    }

    #[async_std::test]
    async fn test_sessions() {
        let store = MemoryStore::new();
        let first = store.session();
        let second = store.clone().session();
        assert_eq!(store.open_sessions(), 2);
        first.close();
        assert_eq!(store.open_sessions(), 1);
        second.close();
        assert_eq!(store.open_sessions(), 0);
    }
}
