//! Structural descriptions of record types.
//!
//! A [`Shape`] describes the fields of a record type: the Rust identifier of each field, the raw
//! naming tag attached to it, and its [`Kind`]. Shapes are the only view of a record type that the
//! rest of this crate ever sees. They are built once per type by the [`macro@Record`] derive macro
//! and live for the rest of the process, so the schema binder, the resolvers and the backend can
//! all share them by `&'static` reference.
//!
//! The naming tag plays the role of a document field name. A field tagged `#[bson("name")]` is
//! exposed as `name`; options after the first comma (as in `#[bson("name,omitempty")]`) are
//! ignored here. A field tagged [`SKIP`] is hidden everywhere, and an untagged field holding a
//! nested record has its fields spliced into its parent.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

pub use docql_derive::Record;

/// The naming directive which hides a field.
pub const SKIP: &str = "-";

/// Get the naming directive from a field's raw tag.
///
/// This is the first comma-separated segment of the tag, or the empty string if the field has no
/// tag.
pub fn naming_directive(tag: Option<&str>) -> &str {
    match tag {
        Some(tag) => tag.split(',').next().unwrap_or_default(),
        None => "",
    }
}

/// A record type with a static [`Shape`].
///
/// This is usually implemented with `#[derive(Record)]`.
pub trait Record: Reflect {
    /// The shape describing this record type.
    fn shape() -> &'static Shape;
}

/// A type which can describe its own [`Kind`].
pub trait Reflect {
    /// The kind of data this type holds.
    fn kind() -> Kind;
}

/// The kind of data held by a field.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    /// Any integer type.
    Int,
    /// Any floating point type.
    Float,
    /// A boolean.
    Bool,
    /// A string.
    String,
    /// A value which may be absent.
    Optional(Box<Kind>),
    /// A homogenous list.
    List(Box<Kind>),
    /// A nested record.
    Record(RecordRef),
    /// A type with no direct representation in a query schema.
    Other(&'static str),
}

impl Kind {
    /// Remove one level of optionality, if there is one.
    pub fn deref_optional(&self) -> &Kind {
        match self {
            Self::Optional(inner) => inner,
            kind => kind,
        }
    }

    /// The record this kind refers to, after unwrapping one level of optionality.
    pub fn as_record(&self) -> Option<&RecordRef> {
        match self.deref_optional() {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Optional(inner) => write!(f, "optional {inner}"),
            Self::List(inner) => write!(f, "list of {inner}"),
            Self::Record(record) => write!(f, "record {}", record.name()),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// A lazy reference to the shape of a record type.
///
/// The shape is only looked up on demand, which is what allows a record to describe fields whose
/// kinds refer back to the record itself.
#[derive(Clone, Copy)]
pub struct RecordRef(fn() -> &'static Shape);

impl RecordRef {
    /// A reference to the record type `T`.
    pub fn of<T: Record>() -> Self {
        Self(T::shape)
    }

    /// The shape of the referenced record.
    pub fn shape(&self) -> &'static Shape {
        (self.0)()
    }

    /// The name of the referenced record.
    pub fn name(&self) -> &'static str {
        self.shape().name()
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Debug for RecordRef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_tuple("RecordRef").field(&self.name()).finish()
    }
}

/// The structure of a record type.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    name: &'static str,
    fields: Vec<FieldShape>,
}

impl Shape {
    /// Describe a record type.
    ///
    /// `name` should be the fully qualified path of the type, as in `crate::module::Type`.
    pub fn new(name: &'static str, fields: Vec<FieldShape>) -> Self {
        Self { name, fields }
    }

    /// The fully qualified name of this record type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name of this record type with path separators replaced by underscores.
    ///
    /// This is a valid GraphQL name, unique per Rust type, and is used to name object types built
    /// for lists of this record.
    pub fn normalized_name(&self) -> String {
        self.name.replace("::", "_")
    }

    /// The fields of this record, in declaration order.
    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }
}

/// The structure of a single field of a record type.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldShape {
    ident: &'static str,
    tag: Option<&'static str>,
    kind: Kind,
    doc: Option<&'static str>,
}

impl FieldShape {
    /// Describe a field.
    pub fn new(ident: &'static str, tag: Option<&'static str>, kind: Kind) -> Self {
        Self {
            ident,
            tag,
            kind,
            doc: None,
        }
    }

    /// Attach documentation to this field.
    ///
    /// The documentation becomes the description of the corresponding GraphQL field.
    pub fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    /// The Rust identifier of this field.
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// The raw naming tag of this field.
    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    /// The naming directive of this field.
    pub fn directive(&self) -> &'static str {
        naming_directive(self.tag)
    }

    /// Is this field hidden by the [`SKIP`] directive?
    pub fn is_skipped(&self) -> bool {
        self.directive() == SKIP
    }

    /// The kind of data held by this field.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Documentation for this field, if any.
    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }
}

macro_rules! reflect {
    ($kind:expr => $($t:ty),+ $(,)?) => {
        $(
            impl Reflect for $t {
                fn kind() -> Kind {
                    $kind
                }
            }
        )+
    };
}

reflect!(Kind::Int => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
reflect!(Kind::Float => f32, f64);
reflect!(Kind::Bool => bool);
reflect!(Kind::String => String, &'static str);
reflect!(Kind::Other("char") => char);
reflect!(Kind::Other("json") => serde_json::Value);

impl<T: Reflect> Reflect for Option<T> {
    fn kind() -> Kind {
        Kind::Optional(Box::new(T::kind()))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn kind() -> Kind {
        Kind::List(Box::new(T::kind()))
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn kind() -> Kind {
        Kind::List(Box::new(T::kind()))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn kind() -> Kind {
        Kind::List(Box::new(T::kind()))
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn kind() -> Kind {
        T::kind()
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn kind() -> Kind {
        T::kind()
    }
}

impl<K, V> Reflect for HashMap<K, V> {
    fn kind() -> Kind {
        Kind::Other("map")
    }
}

impl<K, V> Reflect for BTreeMap<K, V> {
    fn kind() -> Kind {
        Kind::Other("map")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Record)]
    #[allow(dead_code)]
    struct Inner {
        #[bson("street")]
        street: String,
    }

    #[derive(Record)]
    #[allow(dead_code)]
    struct Outer {
        /// The name.
        #[bson("name,omitempty")]
        name: String,
        #[bson("age")]
        age: Option<u8>,
        #[bson("-")]
        secret: String,
        inner: Inner,
        #[bson("children")]
        children: Vec<Outer>,
        untagged: f64,
    }

    #[test]
    fn test_naming_directive() {
        assert_eq!(naming_directive(Some("name")), "name");
        assert_eq!(naming_directive(Some("name,omitempty")), "name");
        assert_eq!(naming_directive(Some(",inline")), "");
        assert_eq!(naming_directive(Some("-")), SKIP);
        assert_eq!(naming_directive(None), "");
    }

    #[test]
    fn test_derived_shape() {
        let shape = Outer::shape();
        assert_eq!(shape.name(), concat!(module_path!(), "::Outer"));
        assert_eq!(
            shape
                .fields()
                .iter()
                .map(|f| (f.ident(), f.directive()))
                .collect::<Vec<_>>(),
            [
                ("name", "name"),
                ("age", "age"),
                ("secret", "-"),
                ("inner", ""),
                ("children", "children"),
                ("untagged", ""),
            ]
        );
        assert_eq!(shape.fields()[0].tag(), Some("name,omitempty"));
        assert_eq!(shape.fields()[0].doc(), Some("The name."));
        assert_eq!(shape.fields()[1].doc(), None);
        assert!(shape.fields()[2].is_skipped());
        assert_eq!(
            *shape.fields()[1].kind(),
            Kind::Optional(Box::new(Kind::Int))
        );
        assert_eq!(
            shape.fields()[3].kind().as_record().unwrap().name(),
            Inner::shape().name()
        );
        assert_eq!(
            *shape.fields()[4].kind(),
            Kind::List(Box::new(Kind::Record(RecordRef::of::<Outer>())))
        );

        // The shape is built once and shared.
        assert!(std::ptr::eq(shape, Outer::shape()));
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(
            Inner::shape().normalized_name(),
            concat!(module_path!(), "::Inner").replace("::", "_")
        );
        assert!(!Inner::shape().normalized_name().contains(':'));
    }

    #[test]
    fn test_reflect() {
        assert_eq!(<Box<i32>>::kind(), Kind::Int);
        assert_eq!(<[bool; 3]>::kind(), Kind::List(Box::new(Kind::Bool)));
        assert_eq!(<HashMap<String, i32>>::kind(), Kind::Other("map"));
        assert_eq!(
            <Option<Option<String>>>::kind().deref_optional(),
            &Kind::Optional(Box::new(Kind::String))
        );
    }
}
