use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;

use crate::json_ext::Object;
use crate::json_ext::Value;

/// A GraphQL `Request` as received from a client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct Request {
    /// The GraphQL operation (e.g., query, mutation) string.
    pub query: String,

    /// The (optional) GraphQL operation name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// The (optional) GraphQL variables in the form of a JSON object.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub variables: Object,
}

#[buildstructor::buildstructor]
impl Request {
    /// Builder methods: `.query(..)` required, `.operation_name(..)` optional,
    /// `.variables(..)` / `.variable(key, value)` optional.
    #[builder(visibility = "pub")]
    fn new(
        query: String,
        operation_name: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor’s map special-casing
        variables: JsonMap<ByteString, Value>,
    ) -> Self {
        Self {
            query,
            operation_name,
            variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserialize_without_optional_members() {
        let request: Request = serde_json::from_value(json!({
            "query": "{ disease(efoId: \"EFO_0000305\") { name } }"
        }))
        .unwrap();
        assert_eq!(request.operation_name, None);
        assert!(request.variables.is_empty());
    }

    #[test]
    fn builder_collects_variables() {
        let request = Request::builder()
            .query("query Q($id: String!) { disease(efoId: $id) { name } }")
            .operation_name("Q")
            .variable("id", "EFO_0000305")
            .build();
        assert_eq!(
            request.variables.get("id").and_then(Value::as_str),
            Some("EFO_0000305")
        );
    }
}
