//! Types related to GraphQL requests, responses, etc.

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;

use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;
pub use crate::request::Request;
pub use crate::response::Response;

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as may be found in the `errors` field of a GraphQL [`Response`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<Location>,

    /// If this is a field error, the JSON path to that field in [`Response::data`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,

    /// The optional GraphQL extensions for this error.
    #[serde(default, skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// * `.message(impl Into<`[`String`]`>)` required.
    /// * `.locations(..)` / `.location(..)` optional.
    /// * `.path(impl Into<`[`Path`]`>)` optional.
    /// * `.extensions(..)` / `.extension(key, value)` optional.
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        path: Option<Path>,
        // Skip the `Object` type alias in order to use buildstructor’s map special-casing
        extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        Self {
            message,
            locations,
            path,
            extensions,
        }
    }

    /// The `code` extension, if any.
    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code").and_then(Value::as_str)
    }
}

/// A location in the request that triggered a GraphQL error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// The line number, starting at 1.
    pub line: u32,

    /// The column number, starting at 1.
    pub column: u32,
}

impl From<apollo_compiler::parser::LineColumn> for Location {
    fn from(location: apollo_compiler::parser::LineColumn) -> Self {
        Location {
            line: location.line as u32,
            column: location.column as u32,
        }
    }
}
