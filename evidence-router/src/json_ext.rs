//! JSON aliases and response paths.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;

/// A JSON value as found in response data and field arguments.
pub type Value = serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// One step of a [`Path`] into the response data.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// A list index.
    Index(usize),

    /// An object key (the response key of a field).
    Key(String),
}

impl From<usize> for PathElement {
    fn from(index: usize) -> Self {
        PathElement::Index(index)
    }
}

impl From<&str> for PathElement {
    fn from(key: &str) -> Self {
        PathElement::Key(key.to_string())
    }
}

/// A path into the response data, serialized as a JSON array of keys and indexes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn empty() -> Path {
        Path(Vec::new())
    }

    /// Returns a new path with `element` appended.
    pub fn join(&self, element: impl Into<PathElement>) -> Path {
        let mut elements = self.0.clone();
        elements.push(element.into());
        Path(elements)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }
}

impl<T> From<Vec<T>> for Path
where
    T: Into<PathElement>,
{
    fn from(elements: Vec<T>) -> Self {
        Path(elements.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in self.iter() {
            write!(f, "/")?;
            match element {
                PathElement::Index(index) => write!(f, "{index}")?,
                PathElement::Key(key) => write!(f, "{key}")?,
            }
        }
        Ok(())
    }
}
