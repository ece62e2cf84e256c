//! The records served by the demo GraphQL API.
// Records are only ever built by decoding stored documents, so their fields are never read
// directly.
#![allow(dead_code)]

use docql::{async_graphql::dynamic::Schema, backend::SessionSource, Record, Registry};

/// Bookkeeping fields stored with every document.
#[derive(Clone, Debug, Record)]
pub struct Audit {
    /// When the document was created, in seconds since the Unix epoch.
    #[bson("created_at")]
    pub created_at: i64,
    /// When the document was last changed, if ever.
    #[bson("updated_at,omitempty")]
    pub updated_at: Option<i64>,
}

/// A postal address.
#[derive(Clone, Debug, Record)]
pub struct Address {
    #[bson("street")]
    pub street: String,
    #[bson("city")]
    pub city: String,
    #[bson("zip")]
    pub zip: String,
}

/// A person.
#[derive(Clone, Debug, Record)]
pub struct Person {
    pub audit: Audit,
    /// The person's full name.
    #[bson("name")]
    pub name: String,
    #[bson("age,omitempty")]
    pub age: Option<u32>,
    #[bson("email")]
    pub email: String,
    /// Where the person lives, if known.
    #[bson("address,omitempty")]
    pub address: Option<Address>,
    /// Subjects the person is known for.
    #[bson("tags")]
    pub tags: Vec<String>,
    #[bson("friends")]
    pub friends: Vec<Person>,
    #[bson("-")]
    pub password_hash: String,
}

/// A published book.
#[derive(Clone, Debug, Record)]
pub struct Book {
    pub audit: Audit,
    #[bson("title")]
    pub title: String,
    /// The year of first publication.
    #[bson("year")]
    pub year: i32,
    /// Average reader rating, out of 5.
    #[bson("rating,omitempty")]
    pub rating: Option<f64>,
    #[bson("available")]
    pub available: bool,
    #[bson("authors")]
    pub authors: Vec<Person>,
}

/// Create the schema for the GraphQL API, served from `source`.
pub fn generate<S: SessionSource>(source: S) -> Result<Schema, docql::Error> {
    let mut registry = Registry::new(source);
    registry.register::<Person>("people")?;
    registry.register::<Book>("books")?;
    registry.build_schema()
}
