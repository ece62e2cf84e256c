//! Abstract interface to a document store.
//!
//! The schema never touches stored documents directly. Each query resolver asks a
//! [`SessionSource`] for a [`Session`], uses it to find the matching records of one collection,
//! and closes it. Backends are responsible for decoding their documents into [`RecordValue`]s of
//! the requested [`Shape`], usually with [`RecordValue::decode`].

use crate::shape::Shape;
use crate::value::{Document, RecordValue};
use async_trait::async_trait;

pub mod memory;

/// A session with a document store.
///
/// Queries and updates are documents, interpreted by the backend. In particular, the arguments of
/// a collection query are passed to [`find_many`](Self::find_many) unchanged, as a document mapping
/// argument names to argument values.
#[async_trait]
pub trait Session: Send {
    /// Errors returned by the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert a document into `collection`.
    async fn insert(&mut self, collection: &str, document: Document) -> Result<(), Self::Error>;

    /// Delete the documents in `collection` matching `query`.
    ///
    /// Returns the number of documents deleted.
    async fn delete(&mut self, collection: &str, query: &Document) -> Result<usize, Self::Error>;

    /// Find the first document in `collection` matching `query`, as a record of type `shape`.
    async fn find_one(
        &mut self,
        collection: &str,
        query: &Document,
        shape: &'static Shape,
    ) -> Result<Option<RecordValue>, Self::Error>;

    /// Find all the documents in `collection` matching `query`, as records of type `shape`.
    async fn find_many(
        &mut self,
        collection: &str,
        query: &Document,
        shape: &'static Shape,
    ) -> Result<Vec<RecordValue>, Self::Error>;

    /// Apply `update` to the first document in `collection` matching `query`.
    ///
    /// Returns whether a document was updated.
    async fn update_one(
        &mut self,
        collection: &str,
        query: &Document,
        update: &Document,
    ) -> Result<bool, Self::Error>;

    /// Apply `update` to every document in `collection` matching `query`.
    ///
    /// Returns the number of documents updated.
    async fn update_many(
        &mut self,
        collection: &str,
        query: &Document,
        update: &Document,
    ) -> Result<usize, Self::Error>;

    /// End the session.
    fn close(self);
}

/// A source of sessions with a document store.
pub trait SessionSource: Send + Sync + 'static {
    type Session: Session;

    /// Open a new session.
    fn session(&self) -> Self::Session;
}

/// Find the records in `collection` matching `query` using a fresh session.
///
/// The session is closed before returning, whether or not the query succeeds.
pub async fn find_many<S: SessionSource>(
    source: &S,
    collection: &str,
    query: &Document,
    shape: &'static Shape,
) -> Result<Vec<RecordValue>, <S::Session as Session>::Error> {
    let mut session = source.session();
    let res = session.find_many(collection, query, shape).await;
    session.close();
    if let Err(err) = &res {
        tracing::warn!("query of collection {collection} failed: {err}");
    }
    res
}
