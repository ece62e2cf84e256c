//! Derive macros for the `docql` crate.

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod helpers;
mod record;

/// Derive an implementation of `Record`, and `Reflect`, for a struct.
///
/// The generated `Record::shape` function describes every field of the struct, in declaration
/// order, with its Rust identifier, its naming tag and its kind. The shape is built the first
/// time it is requested and cached for the rest of the process. Field kinds are computed through
/// the `Reflect` trait, so every field type must implement `Reflect`. Fields referring to other
/// records (including the struct itself) are described lazily, which makes it possible to derive
/// `Record` for recursive types.
///
/// Documentation (doc comments or the `#[doc = "..."]` attribute) on fields is carried in the
/// shape and will appear as field descriptions in the exported GraphQL schema.
///
/// # Examples
///
/// ```
/// use docql::shape::{Record, Shape};
///
/// #[derive(Record)]
/// struct Person {
///     /// The person's name.
///     #[bson("name")]
///     name: String,
///     #[bson("age,omitempty")]
///     age: Option<i32>,
///     #[bson("friends")]
///     friends: Vec<Person>,
///     #[bson("-")]
///     password_hash: String,
/// }
///
/// let shape: &Shape = Person::shape();
/// assert_eq!(shape.fields().len(), 4);
/// assert_eq!(shape.fields()[1].directive(), "age");
/// ```
///
/// # Field attributes
///
/// | Attribute     | Description                                             | Arg    | Required |
/// |---------------|---------------------------------------------------------|--------|----------|
/// | bson          | The naming tag of the field. The first comma-separated segment is the name under which the field is exposed; `"-"` hides the field. Untagged nested records are flattened into their parent. | string | no |
///
#[proc_macro_derive(Record, attributes(bson))]
pub fn record(input: TokenStream) -> TokenStream {
    record::derive(parse_macro_input!(input)).into()
}
