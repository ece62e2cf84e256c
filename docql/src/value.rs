//! Dynamically typed record values.
//!
//! A [`RecordValue`] is an instance of a record type described by a [`Shape`]. Backends produce
//! record values by decoding raw documents against the shape requested by the query, and the
//! resolvers generated for the schema read field values out of them using
//! [`extract`](RecordValue::extract).

use crate::shape::{Kind, Shape};
use async_graphql::{Number, Value as GqlValue};
use derive_more::From;
use serde_json::Value as Json;
use snafu::Snafu;

/// A raw document, as stored by a backend.
pub type Document = serde_json::Map<String, Json>;

/// Errors encountered while decoding a document into a [`RecordValue`].
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
#[snafu(display("cannot decode field {path} of {record}: expected {expected}, got {got}"))]
pub struct DecodeError {
    record: &'static str,
    path: String,
    expected: String,
    got: String,
}

/// The value of a single field.
#[derive(Clone, Debug, PartialEq, From)]
pub enum Value {
    /// An absent value.
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    List(Vec<Value>),
    Record(RecordValue),
}

impl Value {
    /// Convert a scalar, or a list of scalars, to a GraphQL value.
    ///
    /// Records have no direct GraphQL representation and are converted to `null`; they are
    /// resolved field by field instead.
    pub fn to_graphql(&self) -> GqlValue {
        match self {
            Self::Null | Self::Record(_) => GqlValue::Null,
            Self::Int(i) => GqlValue::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f)
                .map(GqlValue::Number)
                .unwrap_or(GqlValue::Null),
            Self::Bool(b) => GqlValue::Boolean(*b),
            Self::String(s) => GqlValue::String(s.clone()),
            Self::List(items) => GqlValue::List(items.iter().map(Self::to_graphql).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

/// An instance of a record type.
///
/// The record holds one value for each field of its [`Shape`], in declaration order. Fields which
/// are hidden, or which cannot be represented, hold [`Value::Null`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordValue {
    shape: &'static Shape,
    values: Vec<Value>,
}

impl RecordValue {
    /// Create a record from the values of each of its fields.
    ///
    /// # Panics
    ///
    /// Panics if the number of values does not match the number of fields in `shape`.
    pub fn new(shape: &'static Shape, values: Vec<Value>) -> Self {
        assert_eq!(
            shape.fields().len(),
            values.len(),
            "wrong number of values for record {}",
            shape.name()
        );
        Self { shape, values }
    }

    /// The shape of this record.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// The value of the field with Rust identifier `ident`, if there is one.
    pub fn get(&self, ident: &str) -> Option<&Value> {
        self.shape
            .fields()
            .iter()
            .position(|field| field.ident() == ident)
            .map(|i| &self.values[i])
    }

    /// Find the value exposed under `name`.
    ///
    /// This searches the fields of this record depth first, in declaration order. A field holding
    /// a nested record is searched before its own name is compared with `name`, so the first match
    /// at any depth wins. Hidden fields are never searched. Returns [`None`] if no field in the
    /// whole tree is exposed as `name`.
    pub fn extract(&self, name: &str) -> Option<&Value> {
        for (field, value) in self.shape.fields().iter().zip(&self.values) {
            if field.is_skipped() {
                continue;
            }
            if let Value::Record(nested) = value {
                if let Some(found) = nested.extract(name) {
                    return Some(found);
                }
            }
            if field.directive() == name {
                return Some(value);
            }
        }
        None
    }

    /// Decode a document into a record of the given shape.
    ///
    /// Each field with a naming directive is read from the document key of the same name. An
    /// untagged nested record is flattened, so its fields are read from `document` itself. Missing
    /// or `null` entries decode to [`Value::Null`]; hidden and untagged scalar fields are always
    /// [`Value::Null`].
    pub fn decode(shape: &'static Shape, document: &Document) -> Result<Self, DecodeError> {
        Decoder {
            record: shape.name(),
            path: vec![],
        }
        .record(shape, document)
    }
}

struct Decoder {
    record: &'static str,
    path: Vec<String>,
}

impl Decoder {
    fn record(
        &mut self,
        shape: &'static Shape,
        document: &Document,
    ) -> Result<RecordValue, DecodeError> {
        let mut values = Vec::with_capacity(shape.fields().len());
        for field in shape.fields() {
            let directive = field.directive();
            let value = if field.is_skipped() {
                Value::Null
            } else if directive.is_empty() {
                match field.kind().as_record() {
                    Some(nested) => {
                        self.path.push(field.ident().into());
                        let nested = self.record(nested.shape(), document)?;
                        self.path.pop();
                        Value::Record(nested)
                    }
                    None => Value::Null,
                }
            } else {
                self.path.push(directive.into());
                let value = self.value(field.kind(), document.get(directive))?;
                self.path.pop();
                value
            };
            values.push(value);
        }
        Ok(RecordValue { shape, values })
    }

    /// Decode the value of a tagged field.
    ///
    /// This follows the schema types chosen by [`map_kind`](crate::bind::map_kind): one level of
    /// optionality is unwrapped, lists hold records or scalars, and anything without a GraphQL
    /// scalar is decoded as its JSON text.
    fn value(&mut self, kind: &Kind, json: Option<&Json>) -> Result<Value, DecodeError> {
        let json = match json {
            None | Some(Json::Null) => return Ok(Value::Null),
            Some(json) => json,
        };
        match (kind.deref_optional(), json) {
            (Kind::Record(record), Json::Object(doc)) => {
                self.record(record.shape(), doc).map(Value::Record)
            }
            (Kind::Record(_), json) => Err(self.mismatch(kind, json)),
            (Kind::List(elem), Json::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    self.path.push(i.to_string());
                    let value = self.element(elem, item);
                    self.path.pop();
                    value
                })
                .collect::<Result<_, _>>()
                .map(Value::List),
            (Kind::List(_), json) => Err(self.mismatch(kind, json)),
            (kind, json) => self.scalar(kind, json),
        }
    }

    fn element(&mut self, elem: &Kind, json: &Json) -> Result<Value, DecodeError> {
        match (elem.deref_optional(), json) {
            (_, Json::Null) => Ok(Value::Null),
            (Kind::Record(record), Json::Object(doc)) => {
                self.record(record.shape(), doc).map(Value::Record)
            }
            (Kind::Record(_), json) => Err(self.mismatch(elem, json)),
            (elem, json) => self.scalar(elem, json),
        }
    }

    fn scalar(&self, kind: &Kind, json: &Json) -> Result<Value, DecodeError> {
        match (kind, json) {
            (Kind::Int, Json::Number(n)) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => Err(self.mismatch(kind, json)),
            },
            (Kind::Float, Json::Number(n)) => match n.as_f64() {
                Some(f) => Ok(Value::Float(f)),
                None => Err(self.mismatch(kind, json)),
            },
            (Kind::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (Kind::String, Json::String(s)) => Ok(Value::String(s.clone())),
            (Kind::Int | Kind::Float | Kind::Bool | Kind::String, json) => {
                Err(self.mismatch(kind, json))
            }
            // Kinds with no GraphQL scalar are exposed as strings.
            (_, Json::String(s)) => Ok(Value::String(s.clone())),
            (_, json) => Ok(Value::String(json.to_string())),
        }
    }

    fn mismatch(&self, expected: &Kind, got: &Json) -> DecodeError {
        DecodeError {
            record: self.record,
            path: self.path.join("."),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}
