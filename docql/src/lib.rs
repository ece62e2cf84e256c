//! GraphQL query schemas derived from the shapes of stored records.
//!
//! Record types describe themselves with `#[derive(Record)]`, which tags each field with the name
//! it is stored under:
//!
//! ```
//! use docql::{backend::memory::MemoryStore, Record, Registry};
//!
//! #[derive(Record)]
//! struct Person {
//!     /// The person's name.
//!     #[bson("name")]
//!     name: String,
//!     #[bson("age,omitempty")]
//!     age: Option<i32>,
//!     #[bson("-")]
//!     password: String,
//! }
//!
//! let mut registry = Registry::new(MemoryStore::new());
//! registry.register::<Person>("people").unwrap();
//! let schema = registry.build_schema().unwrap();
//! assert!(schema.sdl().contains("type people"));
//! ```
//!
//! The [`Registry`] binds each registered collection's record shape to a GraphQL object type and a
//! set of filter arguments (see [`bind`]), and assembles a schema with one query per collection.
//! Queries are resolved against a document store through the [`backend`] interface.

extern crate self as docql;

pub mod backend;
pub mod bind;
pub mod error;
pub mod registry;
pub mod shape;
pub mod value;

pub use async_graphql;
pub use error::Error;
pub use registry::Registry;
pub use shape::{Kind, Record, Reflect, Shape};
pub use value::{Document, RecordValue, Value};

use tracing_subscriber::EnvFilter;

/// Install a logger which prints to stderr, filtered by `RUST_LOG`.
///
/// This may be called more than once; only the first call has any effect.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
