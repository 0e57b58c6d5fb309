//! Documents and the Walkable trait.
//!
//! The vectorizer never parses anything itself: it walks any tree that can
//! describe each of its nodes as an object, an array or a scalar. Two trees
//! are supported out of the box:
//!
//! - [`Document`], the crate's own owned tree.
//! - [`serde_json::Value`], so parsed JSON can be embedded without copying.
//!
//! Scalars are reduced to a canonical string before hashing. Strings are used
//! as-is; numbers use the shortest round-trip form of their `f64` value, so
//! `1`, `1.0` and `1e0` all canonicalize to `"1"`.
//!
//! JSON `null`, booleans and non-finite numbers fall outside the document
//! model and walk as [`Node::Unsupported`], which [`validate`] and the
//! vectorizer report as [`AnomalyError::MalformedDocument`].

use crate::error::{AnomalyError, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;

/// The shape of one node, as seen by a walker.
pub enum Node<'a, W: ?Sized + 'a> {
    /// Key/value pairs. Iteration order is irrelevant to the embedding.
    Object(Box<dyn Iterator<Item = (&'a str, &'a W)> + 'a>),
    /// Ordered elements.
    Array(Box<dyn Iterator<Item = &'a W> + 'a>),
    /// A leaf in canonical string form.
    Scalar(Cow<'a, str>),
    /// A node the document model has no place for; carries its kind.
    Unsupported(&'static str),
}

/// A tree that can be walked by the [`Vectorizer`](crate::kernel::Vectorizer).
pub trait Walkable {
    /// Describe this node.
    fn node(&self) -> Node<'_, Self>;
}

/// Canonical string form of a number.
pub fn canonical_number(n: f64) -> String {
    n.to_string()
}

/// A nested document: objects, arrays, strings and numbers.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Object(Vec<(String, Document)>),
    Array(Vec<Document>),
    String(String),
    Number(f64),
}

impl Document {
    /// Parse JSON text into a document.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Build an object from `(key, value)` pairs.
    pub fn object<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Document)>) -> Self {
        Document::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array.
    pub fn array(items: impl IntoIterator<Item = Document>) -> Self {
        Document::Array(items.into_iter().collect())
    }

    /// Serialize to compact JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Number of scalar leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Document::Object(pairs) => pairs.iter().map(|(_, v)| v.leaf_count()).sum(),
            Document::Array(items) => items.iter().map(Document::leaf_count).sum(),
            Document::String(_) | Document::Number(_) => 1,
        }
    }

    fn convert(value: Value, path: &mut Vec<String>) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (key, sub) in map {
                    path.push(key.clone());
                    let doc = Self::convert(sub, path)?;
                    path.pop();
                    pairs.push((key, doc));
                }
                Ok(Document::Object(pairs))
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| Self::convert(item, path))
                .collect::<Result<Vec<_>>>()
                .map(Document::Array),
            Value::String(s) => Ok(Document::String(s)),
            Value::Number(n) => n
                .as_f64()
                .map(Document::Number)
                .ok_or_else(|| malformed(path, "number")),
            Value::Bool(_) => Err(malformed(path, "bool")),
            Value::Null => Err(malformed(path, "null")),
        }
    }
}

pub(crate) fn malformed<S: AsRef<str>>(path: &[S], found: &'static str) -> AnomalyError {
    let path: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    AnomalyError::MalformedDocument {
        path: path.join("."),
        found,
    }
}

/// Walk `document` once and check that every node fits the document model.
///
/// # Errors
/// `MalformedDocument` at the first unsupported node, with its key path.
pub fn validate<W: Walkable + ?Sized>(document: &W) -> Result<()> {
    fn check<'d, W: Walkable + ?Sized>(node: &'d W, context: &mut Vec<&'d str>) -> Result<()> {
        match node.node() {
            Node::Object(pairs) => {
                for (key, value) in pairs {
                    context.push(key);
                    check(value, context)?;
                    context.pop();
                }
            }
            Node::Array(items) => {
                for item in items {
                    check(item, context)?;
                }
            }
            Node::Scalar(_) => {}
            Node::Unsupported(found) => return Err(malformed(context.as_slice(), found)),
        }
        Ok(())
    }
    check(document, &mut Vec::new())
}

impl TryFrom<Value> for Document {
    type Error = AnomalyError;

    fn try_from(value: Value) -> Result<Self> {
        Self::convert(value, &mut Vec::new())
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

/// Any `f64` converts, but non-finite values are rejected as malformed
/// when the document is walked or validated.
impl From<f64> for Document {
    fn from(n: f64) -> Self {
        Document::Number(n)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Document::Object(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Document::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::String(s) => serializer.serialize_str(s),
            // Integral values round-trip as JSON integers.
            Document::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Document::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl Walkable for Document {
    fn node(&self) -> Node<'_, Self> {
        match self {
            Document::Object(pairs) => {
                Node::Object(Box::new(pairs.iter().map(|(k, v)| (k.as_str(), v))))
            }
            Document::Array(items) => Node::Array(Box::new(items.iter())),
            Document::String(s) => Node::Scalar(Cow::Borrowed(s.as_str())),
            Document::Number(n) if n.is_finite() => {
                Node::Scalar(Cow::Owned(canonical_number(*n)))
            }
            // NaN and the infinities have no JSON form.
            Document::Number(_) => Node::Unsupported("number"),
        }
    }
}

impl Walkable for Value {
    fn node(&self) -> Node<'_, Self> {
        match self {
            Value::Object(map) => Node::Object(Box::new(map.iter().map(|(k, v)| (k.as_str(), v)))),
            Value::Array(items) => Node::Array(Box::new(items.iter())),
            Value::String(s) => Node::Scalar(Cow::Borrowed(s.as_str())),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Node::Scalar(Cow::Owned(canonical_number(f))),
                None => Node::Unsupported("number"),
            },
            Value::Bool(_) => Node::Unsupported("bool"),
            Value::Null => Node::Unsupported("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let doc = Document::from_json(r#"{"a": [{"b": "x"}, 2]}"#).unwrap();
        let expected = Document::object([(
            "a",
            Document::array([Document::object([("b", Document::from("x"))]), Document::from(2.0)]),
        )]);
        assert_eq!(doc, expected);
        assert_eq!(doc.leaf_count(), 2);
    }

    #[test]
    fn test_malformed_reports_path() {
        let err = Document::from_json(r#"{"a": {"b": [null]}}"#).unwrap_err();
        match err {
            AnomalyError::MalformedDocument { path, found } => {
                assert_eq!(path, "a.b");
                assert_eq!(found, "null");
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(matches!(
            Document::from_json(r#"{"flag": true}"#),
            Err(AnomalyError::MalformedDocument { found: "bool", .. })
        ));
    }

    #[test]
    fn test_canonical_numbers() {
        assert_eq!(canonical_number(1.0), "1");
        assert_eq!(canonical_number(2.5), "2.5");
        assert_eq!(canonical_number(-0.125), "-0.125");

        let value: Value = serde_json::from_str("1.0").unwrap();
        match value.node() {
            Node::Scalar(s) => assert_eq!(s, "1"),
            _ => panic!("expected scalar"),
        };
    }

    #[test]
    fn test_validate() {
        let value: Value = serde_json::from_str(r#"{"a": [{"b": "x"}, {"c": true}]}"#).unwrap();
        match validate(&value) {
            Err(AnomalyError::MalformedDocument { path, found }) => {
                assert_eq!(path, "a.c");
                assert_eq!(found, "bool");
            }
            other => panic!("unexpected result {:?}", other),
        }

        let doc = Document::from_json(r#"{"a": [{"b": "x"}, 2]}"#).unwrap();
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_non_finite_numbers_are_malformed() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let doc = Document::object([("n", Document::from(n))]);
            assert!(matches!(doc.node(), Node::Object(_)));
            match validate(&doc) {
                Err(AnomalyError::MalformedDocument { path, found }) => {
                    assert_eq!(path, "n");
                    assert_eq!(found, "number");
                }
                other => panic!("unexpected result {:?}", other),
            }
        }
    }

    #[test]
    fn test_json_bytes() {
        let doc = Document::from_json(r#"{"a":[{"a":"aa"}],"n":3,"f":0.5}"#).unwrap();
        let bytes = doc.to_json_bytes().unwrap();
        let reparsed = Document::from_json(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(reparsed, doc);
        assert!(std::str::from_utf8(&bytes).unwrap().contains(r#""n":3"#));
    }
}
