//! Execution of a GraphQL operation against the composed schema.
//!
//! Sibling fields of a selection set are resolved concurrently within the request's task, so
//! fields sharing a dependency (the same record, through the same loader) overlap and the loader
//! coalesces their fetches. A field error nulls the nearest nullable ancestor of the field and is
//! reported with the field's path and location; the rest of the response is unaffected.

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::executable::DirectiveList;
use apollo_compiler::executable::Field;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::Selection;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::Instrument;

use crate::context::Context;
use crate::error::FieldError;
use crate::graphql::Error;
use crate::graphql::Location;
use crate::graphql::Request;
use crate::graphql::Response;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;
use crate::resolvers::ObjectRef;
use crate::resolvers::Resolved;
use crate::resolvers::ResolverMap;
use crate::schema::ComposedSchema;
use crate::schema::query::QueryRoot;

/// A field error is being propagated upwards to the nearest nullable position.
#[derive(Debug)]
struct PropagateNull;

/// The value whose fields a selection set is executed against.
enum Parent {
    /// A typed value: fields go through the type's resolvers.
    Typed(ObjectRef),
    /// Plain data: fields are read by name.
    Data(Object),
}

/// The fields merged under one response key, and their merged sub-selections.
#[derive(Clone)]
struct FieldGroup<'a> {
    first: &'a Node<Field>,
    selections: Vec<&'a Selection>,
}

struct Execution<'a> {
    schema: &'a Valid<Schema>,
    resolvers: &'a ResolverMap,
    document: &'a Valid<ExecutableDocument>,
    variables: Object,
    context: &'a Context,
    errors: Mutex<Vec<Error>>,
}

/// Execute `request` with the request-scoped `context`.
pub(crate) async fn execute(
    schema: &ComposedSchema,
    context: &Context,
    request: &Request,
) -> Response {
    let document = match ExecutableDocument::parse_and_validate(
        schema.schema(),
        request.query.as_str(),
        "query.graphql",
    ) {
        Ok(document) => document,
        Err(invalid) => {
            let errors = invalid
                .errors
                .iter()
                .map(|diagnostic| {
                    request_error(
                        diagnostic.error.to_string(),
                        "GRAPHQL_VALIDATION_FAILED",
                        diagnostic
                            .line_column_range()
                            .map(|range| Location::from(range.start)),
                    )
                })
                .collect();
            return Response::from_errors(errors);
        }
    };

    let operation = match document
        .operations
        .get(request.operation_name.as_deref())
    {
        Ok(operation) => operation,
        Err(_) => {
            let message = match &request.operation_name {
                Some(name) => format!("unknown operation named '{name}'"),
                None => "must provide operation name if query contains multiple operations"
                    .to_string(),
            };
            return Response::from_errors(vec![request_error(
                message,
                "GRAPHQL_UNKNOWN_OPERATION_NAME",
                None,
            )]);
        }
    };

    if operation.operation_type != ast::OperationType::Query {
        return Response::from_errors(vec![request_error(
            format!("{} operations are not supported", operation.operation_type),
            "OPERATION_NOT_SUPPORTED",
            operation
                .line_column_range(&document.sources)
                .map(|range| Location::from(range.start)),
        )]);
    }

    let variables = match coerce_variables(operation, &request.variables) {
        Ok(variables) => variables,
        Err(error) => return Response::from_errors(vec![error]),
    };

    let execution = Execution {
        schema: schema.schema(),
        resolvers: schema.resolvers(),
        document: &document,
        variables,
        context,
        errors: Mutex::new(Vec::new()),
    };
    let span = tracing::info_span!(
        "execute",
        operation.name = operation.name.as_ref().map(Name::as_str).unwrap_or_default()
    );
    let data = execution
        .execute_selection_set(
            operation.selection_set.ty.as_str(),
            Parent::Typed(std::sync::Arc::new(QueryRoot)),
            operation.selection_set.selections.iter().collect(),
            Path::empty(),
        )
        .instrument(span)
        .await;

    let errors = execution.errors.into_inner();
    let data = match data {
        Ok(object) => Value::Object(object),
        Err(PropagateNull) => Value::Null,
    };
    Response::from_data(data, errors)
}

fn request_error(message: String, code: &str, location: Option<Location>) -> Error {
    let mut extensions = Object::new();
    extensions.insert("code", Value::String(code.into()));
    Error {
        message,
        locations: location.into_iter().collect(),
        path: None,
        extensions,
    }
}

/// Apply variable defaults and reject missing or null values for non-null variables.
fn coerce_variables(operation: &Operation, provided: &Object) -> Result<Object, Error> {
    let mut coerced = Object::new();
    for definition in &operation.variables {
        let name = definition.name.as_str();
        match provided.get(name) {
            Some(Value::Null) if definition.ty.is_non_null() => {
                return Err(request_error(
                    format!(
                        "variable '${name}' of non-null type {} must not be null",
                        definition.ty
                    ),
                    "VALIDATION_INVALID_TYPE_VARIABLE",
                    None,
                ));
            }
            Some(value) => {
                coerced.insert(name, value.clone());
            }
            None => match &definition.default_value {
                Some(default) => {
                    coerced.insert(name, input_value(default, &Object::new()));
                }
                None if definition.ty.is_non_null() => {
                    return Err(request_error(
                        format!(
                            "variable '${name}' of required type {} was not provided",
                            definition.ty
                        ),
                        "VALIDATION_INVALID_TYPE_VARIABLE",
                        None,
                    ));
                }
                None => {}
            },
        }
    }
    Ok(coerced)
}

/// Convert an argument value of the document to JSON, substituting variables.
fn input_value(value: &ast::Value, variables: &Object) -> Value {
    match value {
        ast::Value::Null => Value::Null,
        ast::Value::Enum(name) => Value::String(name.as_str().into()),
        ast::Value::Variable(name) => variables.get(name.as_str()).cloned().unwrap_or_default(),
        ast::Value::String(string) => Value::String(string.as_str().into()),
        ast::Value::Float(float) => float.try_to_f64().map(Value::from).unwrap_or_default(),
        ast::Value::Int(int) => match int.try_to_i32() {
            Ok(int) => Value::from(int),
            Err(_) => int.try_to_f64().map(Value::from).unwrap_or_default(),
        },
        ast::Value::Boolean(boolean) => Value::Bool(*boolean),
        ast::Value::List(items) => Value::Array(
            items
                .iter()
                .map(|item| input_value(item, variables))
                .collect(),
        ),
        ast::Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.as_str().into(), input_value(value, variables)))
                .collect(),
        ),
    }
}

/// Keep a field error from propagating further if `ty` can hold null.
fn try_nullify(ty: &Type, result: Result<Value, PropagateNull>) -> Result<Value, PropagateNull> {
    match result {
        Err(PropagateNull) if !ty.is_non_null() => Ok(Value::Null),
        result => result,
    }
}

impl<'a> Execution<'a> {
    fn field_error(&self, error: FieldError, field: &Node<Field>, path: Path) {
        tracing::warn!(%path, code = error.extension_code(), "field error: {error}");
        let mut graphql_error = error.to_graphql_error(path);
        graphql_error.locations = field
            .line_column_range(&self.document.sources)
            .map(|range| Location::from(range.start))
            .into_iter()
            .collect();
        self.errors.lock().push(graphql_error);
    }

    fn condition(&self, directives: &DirectiveList, name: &str) -> Option<bool> {
        let value = directives.get(name)?.specified_argument_by_name("if")?;
        match value.as_ref() {
            ast::Value::Boolean(condition) => Some(*condition),
            ast::Value::Variable(variable) => Some(
                self.variables
                    .get(variable.as_str())
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            ),
            _ => None,
        }
    }

    fn is_included(&self, directives: &DirectiveList) -> bool {
        self.condition(directives, "skip") != Some(true)
            && self.condition(directives, "include") != Some(false)
    }

    /// Group the fields of `selections` that apply to `object_type` by response key.
    fn collect_fields(
        &self,
        object_type: &str,
        selections: impl IntoIterator<Item = &'a Selection>,
        grouped: &mut IndexMap<&'a Name, FieldGroup<'a>>,
    ) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    if !self.is_included(&field.directives) {
                        continue;
                    }
                    grouped
                        .entry(field.response_key())
                        .or_insert_with(|| FieldGroup {
                            first: field,
                            selections: Vec::new(),
                        })
                        .selections
                        .extend(&field.selection_set.selections);
                }
                Selection::FragmentSpread(spread) => {
                    if !self.is_included(&spread.directives) {
                        continue;
                    }
                    if let Some(fragment) = spread.fragment_def(self.document) {
                        if fragment.selection_set.ty == object_type {
                            self.collect_fields(
                                object_type,
                                &fragment.selection_set.selections,
                                grouped,
                            );
                        }
                    }
                }
                Selection::InlineFragment(inline) => {
                    if !self.is_included(&inline.directives) {
                        continue;
                    }
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .is_none_or(|condition| condition == object_type);
                    if applies {
                        self.collect_fields(object_type, &inline.selection_set.selections, grouped);
                    }
                }
            }
        }
    }

    fn execute_selection_set(
        &'a self,
        object_type: &'a str,
        parent: Parent,
        selections: Vec<&'a Selection>,
        path: Path,
    ) -> BoxFuture<'a, Result<Object, PropagateNull>> {
        async move {
            let mut grouped = IndexMap::new();
            self.collect_fields(object_type, selections, &mut grouped);

            let type_resolvers = self.resolvers.get_type(object_type);
            let projected = match (&parent, type_resolvers) {
                (Parent::Typed(object), Some(type_resolvers))
                    if grouped.values().any(|group| {
                        group.first.name != "__typename"
                            && type_resolvers.get(group.first.name.as_str()).is_none()
                    }) =>
                {
                    type_resolvers.project(object)
                }
                _ => None,
            };

            let parent = &parent;
            let projected = projected.as_ref();
            let fields = grouped.into_iter().map(|(key, group)| {
                let path = path.join(key.as_str());
                async move {
                    let value = self
                        .execute_field(object_type, parent, projected, group, path)
                        .await;
                    (key, value)
                }
            });

            let mut object = Object::new();
            let mut propagate = false;
            for (key, value) in join_all(fields).await {
                match value {
                    Ok(value) => {
                        object.insert(key.as_str(), value);
                    }
                    Err(PropagateNull) => propagate = true,
                }
            }
            if propagate {
                Err(PropagateNull)
            } else {
                Ok(object)
            }
        }
        .boxed()
    }

    async fn execute_field(
        &'a self,
        object_type: &'a str,
        parent: &Parent,
        projected: Option<&Result<Object, FieldError>>,
        group: FieldGroup<'a>,
        path: Path,
    ) -> Result<Value, PropagateNull> {
        let field = group.first;
        if field.name == "__typename" {
            return Ok(Value::String(object_type.into()));
        }
        let ty = field.ty();
        let name = field.name.as_str();

        let resolved = match parent {
            Parent::Data(object) => {
                Ok(Resolved::Leaf(object.get(name).cloned().unwrap_or_default()))
            }
            Parent::Typed(object) => match self.resolvers.get(object_type, name) {
                Some(resolver) => {
                    resolver
                        .resolve(object, self.arguments(field), self.context)
                        .await
                }
                None => match projected {
                    Some(Ok(projected)) => Ok(Resolved::Leaf(
                        projected.get(name).cloned().unwrap_or_default(),
                    )),
                    Some(Err(error)) => Err(error.clone()),
                    None => Err(FieldError::MissingResolver {
                        type_name: object_type.to_string(),
                        field: name.to_string(),
                    }),
                },
            },
        };

        let result = match resolved {
            Ok(resolved) => self.complete_value(ty, resolved, group, path).await,
            Err(error) => {
                self.field_error(error, field, path);
                Err(PropagateNull)
            }
        };
        try_nullify(ty, result)
    }

    /// The field's arguments, with defaults applied and variables substituted.
    fn arguments(&self, field: &Field) -> Object {
        let mut arguments = Object::new();
        for definition in &field.definition.arguments {
            let given = field
                .arguments
                .iter()
                .find(|argument| argument.name == definition.name);
            let value = match given.map(|argument| argument.value.as_ref()) {
                Some(ast::Value::Variable(variable)) => {
                    match self.variables.get(variable.as_str()) {
                        Some(value) => Some(value.clone()),
                        None => definition
                            .default_value
                            .as_ref()
                            .map(|default| input_value(default, &self.variables)),
                    }
                }
                Some(value) => Some(input_value(value, &self.variables)),
                None => definition
                    .default_value
                    .as_ref()
                    .map(|default| input_value(default, &self.variables)),
            };
            if let Some(value) = value {
                arguments.insert(definition.name.as_str(), value);
            }
        }
        arguments
    }

    /// Complete a resolved value according to its declared type.
    fn complete_value(
        &'a self,
        ty: &'a Type,
        resolved: Resolved,
        group: FieldGroup<'a>,
        path: Path,
    ) -> BoxFuture<'a, Result<Value, PropagateNull>> {
        async move {
            let field = group.first;
            let fail = |error: FieldError, path: Path| {
                self.field_error(error, field, path);
                Err(PropagateNull)
            };

            let resolved = match resolved {
                Resolved::Leaf(Value::Null) | Resolved::Null => {
                    return if ty.is_non_null() {
                        fail(FieldError::NonNullViolation, path)
                    } else {
                        Ok(Value::Null)
                    };
                }
                resolved => resolved,
            };

            if let Type::List(item_ty) | Type::NonNullList(item_ty) = ty {
                let items = match resolved {
                    Resolved::List(items) => items,
                    Resolved::Leaf(Value::Array(items)) => {
                        items.into_iter().map(Resolved::Leaf).collect()
                    }
                    _ => {
                        return fail(
                            FieldError::TypeMismatch {
                                expected: ty.to_string(),
                            },
                            path,
                        );
                    }
                };
                let completed = join_all(items.into_iter().enumerate().map(|(index, item)| {
                    let item_path = path.join(index);
                    self.complete_value(item_ty, item, group.clone(), item_path)
                        .map(|result| try_nullify(item_ty, result))
                }))
                .await;
                // A non-null item that failed nulls the whole list
                return completed
                    .into_iter()
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array);
            }

            let type_name = ty.inner_named_type();
            let mismatch = || FieldError::TypeMismatch {
                expected: type_name.to_string(),
            };
            match (self.schema.types.get(type_name), resolved) {
                (Some(ExtendedType::Object(_)), Resolved::Object(object)) => self
                    .execute_selection_set(
                        type_name.as_str(),
                        Parent::Typed(object),
                        group.selections,
                        path,
                    )
                    .await
                    .map(Value::Object),
                (Some(ExtendedType::Object(_)), Resolved::Leaf(Value::Object(object))) => self
                    .execute_selection_set(
                        type_name.as_str(),
                        Parent::Data(object),
                        group.selections,
                        path,
                    )
                    .await
                    .map(Value::Object),
                (Some(ExtendedType::Enum(definition)), Resolved::Leaf(value)) => {
                    if value
                        .as_str()
                        .is_some_and(|value| definition.values.contains_key(value))
                    {
                        Ok(value)
                    } else {
                        fail(mismatch(), path)
                    }
                }
                (Some(ExtendedType::Scalar(_)), Resolved::Leaf(value)) => {
                    let valid = match type_name.as_str() {
                        "Int" => value
                            .as_i64()
                            .is_some_and(|int| i32::try_from(int).is_ok()),
                        "Float" => value.is_number(),
                        "String" => value.is_string(),
                        "Boolean" => value.is_boolean(),
                        "ID" => value.is_string() || value.is_i64(),
                        // Custom scalars pass through as is
                        _ => true,
                    };
                    if valid {
                        Ok(value)
                    } else {
                        fail(mismatch(), path)
                    }
                }
                _ => fail(mismatch(), path),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::backend::DiseaseRecord;
    use crate::backend::MockPlatformApi;
    use crate::configuration::ConnectionSettings;
    use crate::error::FetchError;
    use crate::therapeutic_areas::TherapeuticArea;
    use crate::therapeutic_areas::TherapeuticAreas;

    fn asthma() -> DiseaseRecord {
        DiseaseRecord {
            id: "EFO_0000270".to_string(),
            name: "asthma".to_string(),
            description: "A bronchial disease".to_string(),
            synonyms: vec!["Asthma, Bronchial".to_string()],
        }
    }

    async fn run(backend: MockPlatformApi, request: Request) -> serde_json::Value {
        let schema = ComposedSchema::compose().unwrap();
        let areas = TherapeuticAreas::new(HashMap::from([(
            "EFO_0000270".to_string(),
            vec![TherapeuticArea {
                id: "OTAR_0000010".to_string(),
                name: "respiratory or thoracic disease".to_string(),
            }],
        )]));
        let context = Context::new(
            Arc::new(backend),
            Arc::new(areas),
            ConnectionSettings::default(),
        );
        let response = execute(&schema, &context, &request).await;
        serde_json::to_value(response).unwrap()
    }

    fn query(query: &str) -> Request {
        Request::builder().query(query).build()
    }

    #[test_log::test(tokio::test)]
    async fn aliases_fragments_and_typename() {
        let mut backend = MockPlatformApi::new();
        backend
            .expect_disease()
            .times(1)
            .returning(|_| Ok(asthma()));

        let response = run(
            backend,
            query(
                r#"
                query {
                  asthma: disease(efoId: "EFO_0000270") {
                    __typename
                    ...Names
                    ... on Disease { label: name }
                  }
                }
                fragment Names on Disease { name synonyms }
                "#,
            ),
        )
        .await;

        assert_eq!(
            response,
            json!({
                "data": {
                    "asthma": {
                        "__typename": "Disease",
                        "name": "asthma",
                        "synonyms": ["Asthma, Bronchial"],
                        "label": "asthma"
                    }
                }
            })
        );
    }

    #[test_log::test(tokio::test)]
    async fn skip_and_include_follow_variables() {
        let mut backend = MockPlatformApi::new();
        backend.expect_disease().never();

        let request = Request::builder()
            .query(
                r#"query Q($withName: Boolean!, $skipAreas: Boolean = true) {
                  disease(efoId: "EFO_0000270") {
                    name @include(if: $withName)
                    therapeuticAreas @skip(if: $skipAreas) { id }
                    areas: therapeuticAreas { id name }
                  }
                }"#,
            )
            .variable("withName", false)
            .build();

        let response = run(backend, request).await;
        assert_eq!(
            response,
            json!({
                "data": {
                    "disease": {
                        "areas": [{
                            "id": "OTAR_0000010",
                            "name": "respiratory or thoracic disease"
                        }]
                    }
                }
            })
        );
    }

    #[test_log::test(tokio::test)]
    async fn a_failing_non_null_field_nulls_its_nearest_nullable_ancestor() {
        let mut backend = MockPlatformApi::new();
        backend.expect_disease_pathways().returning(|_| {
            Err(FetchError::BackendUnavailable {
                service: "disease_pathways".to_string(),
                reason: "timeout".to_string(),
            })
        });
        backend.expect_disease_intogen().returning(|_| {
            Ok(crate::schema::disease::sections::intogen::DiseaseIntogen {
                has_mutations: true,
                rows: Vec::new(),
            })
        });

        let response = run(
            backend,
            query(
                r#"{
                  disease(efoId: "EFO_0000305") {
                    summaries {
                      pathways { pathwayCount }
                      intogen { hasMutations }
                    }
                  }
                }"#,
            ),
        )
        .await;

        assert_eq!(
            response,
            json!({
                "data": {
                    "disease": {
                        "summaries": {
                            "pathways": null,
                            "intogen": { "hasMutations": true }
                        }
                    }
                },
                "errors": [{
                    "message": "disease_pathways is unavailable: timeout",
                    "locations": [{ "line": 4, "column": 34 }],
                    "path": ["disease", "summaries", "pathways", "pathwayCount"],
                    "extensions": {
                        "service": "disease_pathways",
                        "reason": "timeout",
                        "code": "BACKEND_UNAVAILABLE"
                    }
                }]
            })
        );
    }

    #[test_log::test(tokio::test)]
    async fn validation_errors_are_request_errors() {
        let response = run(
            MockPlatformApi::new(),
            query(r#"{ disease(efoId: "EFO_0000270") { colour } }"#),
        )
        .await;
        assert!(response.get("data").is_none());
        assert_eq!(
            response["errors"][0]["extensions"]["code"],
            "GRAPHQL_VALIDATION_FAILED"
        );
        // points at the unknown field
        assert_eq!(
            response["errors"][0]["locations"],
            json!([{ "line": 1, "column": 35 }])
        );
    }

    #[test_log::test(tokio::test)]
    async fn missing_required_variables_are_request_errors() {
        let response = run(
            MockPlatformApi::new(),
            query("query Q($id: String!) { disease(efoId: $id) { name } }"),
        )
        .await;
        assert!(response.get("data").is_none());
        assert_eq!(
            response["errors"][0]["message"],
            "variable '$id' of required type String! was not provided"
        );
    }

    #[test_log::test(tokio::test)]
    async fn operations_are_selected_by_name() {
        let mut backend = MockPlatformApi::new();
        backend.expect_disease().returning(|_| Ok(asthma()));
        let document = r#"
            query A { disease(efoId: "EFO_0000270") { name } }
            query B { disease(efoId: "EFO_0000270") { id } }
        "#;

        let response = run(
            backend,
            Request::builder()
                .query(document)
                .operation_name("B")
                .build(),
        )
        .await;
        assert_eq!(
            response,
            json!({ "data": { "disease": { "id": "EFO_0000270" } } })
        );

        let response = run(MockPlatformApi::new(), query(document)).await;
        assert_eq!(
            response["errors"][0]["extensions"]["code"],
            "GRAPHQL_UNKNOWN_OPERATION_NAME"
        );
    }

    #[test]
    fn input_values_substitute_variables() {
        let mut variables = Object::new();
        variables.insert("asc", Value::Bool(true));
        let value = ast::Value::Object(vec![
            (
                Name::new_unchecked("field"),
                Node::new(ast::Value::Enum(Name::new_unchecked("TARGET_SYMBOL"))),
            ),
            (
                Name::new_unchecked("ascending"),
                Node::new(ast::Value::Variable(Name::new_unchecked("asc"))),
            ),
        ]);
        assert_eq!(
            serde_json::to_value(input_value(&value, &variables)).unwrap(),
            json!({ "field": "TARGET_SYMBOL", "ascending": true })
        );
    }
}
