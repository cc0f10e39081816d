//! Router errors.

use displaydoc::Display;
use serde::Serialize;
use thiserror::Error;

use crate::graphql::Error;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;

/// Errors found while loading configuration or composing the schema.
///
/// None of them can be recovered from: the router refuses to start rather than serve a
/// partially composed schema.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// a section registered for '{kind}' has an empty id
    MissingSectionId { kind: String },

    /// section id '{id}' registered for '{kind}' must start with a lowercase letter and only contain ASCII letters and digits
    MalformedSectionId { kind: String, id: String },

    /// section id '{id}' is registered more than once for '{kind}'
    DuplicateSectionId { kind: String, id: String },

    /// type name '{type_name}' is derived from more than one section
    DuplicateTypeName { type_name: String },

    /// resolvers for '{type_name}' are contributed more than once
    ResolverCollision { type_name: String },

    /// resolvers are registered for type '{type_name}' which the schema does not declare as an object type
    UnknownResolverType { type_name: String },

    /// a resolver is registered for '{type_name}.{field}' which the schema does not declare
    UnknownResolverField { type_name: String, field: String },

    /// field '{type_name}.{field}' has no resolver and its type does not read fields by name
    UnresolvedField { type_name: String, field: String },

    /// composed schema is invalid: {0}
    InvalidSchema(String),

    /// could not read '{path}': {error}
    CannotReadFile {
        path: String,
        error: std::io::Error,
    },

    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),

    /// could not deserialize therapeutic areas from '{path}': {error}
    DeserializeTherapeuticAreas {
        path: String,
        error: serde_json::Error,
    },

    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// Failures reported by a backend accessor.
///
/// `Clone` so a single failed fetch can be handed to every caller waiting on it.
#[derive(Error, Display, Debug, Clone, Serialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum FetchError {
    /// {service} has no record for '{id}'
    NotFound {
        /// The accessor that was called.
        service: String,

        /// The identifier that was looked up.
        id: String,
    },

    /// {service} is unavailable: {reason}
    BackendUnavailable {
        /// The accessor that failed.
        service: String,

        /// The reason the call failed.
        reason: String,
    },

    /// {service} response was malformed: {reason}
    MalformedResponse {
        /// The accessor that responded with the malformed payload.
        service: String,

        /// The reason deserialization failed.
        reason: String,
    },
}

impl FetchError {
    pub fn extension_code(&self) -> &'static str {
        match self {
            FetchError::NotFound { .. } => "NOT_FOUND",
            FetchError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            FetchError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
        }
    }

    /// The error's fields plus its `code`, as GraphQL error extensions.
    pub(crate) fn extensions(&self) -> Object {
        let mut value: Value = serde_json_bytes::to_value(self).unwrap_or_default();
        let mut extensions = value.as_object_mut().map(std::mem::take).unwrap_or_default();
        extensions.insert("code", Value::String(self.extension_code().into()));
        extensions
    }
}

/// A field resolver failed.
#[derive(Error, Display, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FieldError {
    /// {0}
    Fetch(#[from] FetchError),

    /// invalid arguments for '{field}': {reason}
    InvalidArguments { field: String, reason: String },

    /// no resolver is registered for '{type_name}.{field}'
    MissingResolver { type_name: String, field: String },

    /// a resolver of '{type_name}' received a parent value of an unexpected type
    ParentMismatch { type_name: String },

    /// cannot return null for non-nullable field
    NonNullViolation,

    /// resolved value does not match the declared type '{expected}'
    TypeMismatch { expected: String },

    /// could not serialize resolved value: {0}
    Serialization(String),
}

impl FieldError {
    pub fn extension_code(&self) -> &'static str {
        match self {
            FieldError::Fetch(error) => error.extension_code(),
            FieldError::InvalidArguments { .. } => "INVALID_ARGUMENTS",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert the field error to a GraphQL error located at `path`.
    pub(crate) fn to_graphql_error(&self, path: Path) -> Error {
        let extensions = match self {
            FieldError::Fetch(error) => error.extensions(),
            _ => {
                let mut extensions = Object::new();
                extensions.insert("code", Value::String(self.extension_code().into()));
                extensions
            }
        };
        Error {
            message: self.to_string(),
            locations: Vec::new(),
            path: Some(path),
            extensions,
        }
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(error: serde_json::Error) -> Self {
        FieldError::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fetch_errors_carry_their_fields_as_extensions() {
        let error = FieldError::from(FetchError::BackendUnavailable {
            service: "disease".to_string(),
            reason: "connection reset".to_string(),
        });
        let graphql_error = error.to_graphql_error(Path::from(vec!["disease", "name"]));

        assert_eq!(graphql_error.message, "disease is unavailable: connection reset");
        assert_eq!(graphql_error.code(), Some("BACKEND_UNAVAILABLE"));
        assert_eq!(
            serde_json::to_value(&graphql_error).unwrap(),
            json!({
                "message": "disease is unavailable: connection reset",
                "path": ["disease", "name"],
                "extensions": {
                    "service": "disease",
                    "reason": "connection reset",
                    "code": "BACKEND_UNAVAILABLE"
                }
            })
        );
    }

    #[test]
    fn non_fetch_errors_only_carry_a_code() {
        let error = FieldError::InvalidArguments {
            field: "targetsConnection".to_string(),
            reason: "first must not be negative".to_string(),
        };
        let graphql_error = error.to_graphql_error(Path::empty());
        assert_eq!(graphql_error.code(), Some("INVALID_ARGUMENTS"));
        assert_eq!(graphql_error.extensions.len(), 1);
    }
}
