//! Errors reported while registering collections and building schemas.

use snafu::Snafu;

/// Errors reported by the [`Registry`](crate::registry::Registry).
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("collection {name} already exists"))]
    CollectionExists { name: String },

    #[snafu(display("shape of collection {name} is not a record (found {kind})"))]
    NotRecord { name: String, kind: String },

    #[snafu(display(
        "record {record} contains itself through field {field}; use a list to nest it"
    ))]
    RecursiveRecord { record: String, field: String },

    #[snafu(display("schema contains multiple types named {name}"))]
    DuplicateType { name: String },

    #[snafu(display("invalid schema: {message}"))]
    Schema { message: String },
}

impl Error {
    /// An error reported by the GraphQL schema builder.
    pub fn schema(message: impl ToString) -> Self {
        Self::Schema {
            message: message.to_string(),
        }
    }
}
