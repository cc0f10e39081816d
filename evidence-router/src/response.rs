use serde::Deserialize;
use serde::Serialize;

use crate::graphql::Error;
use crate::json_ext::Value;

/// A GraphQL response.
///
/// `data` and `errors` can both be populated: a failing field only nulls its own subtree
/// and leaves its siblings intact.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The GraphQL errors encountered.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,
}

impl Response {
    /// A response for a request that failed before execution started.
    pub fn from_errors(errors: Vec<Error>) -> Self {
        Response { data: None, errors }
    }

    pub(crate) fn from_data(data: Value, errors: Vec<Error>) -> Self {
        Response {
            data: Some(data),
            errors,
        }
    }

    /// Whether every requested field resolved.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.data.is_some()
    }
}
