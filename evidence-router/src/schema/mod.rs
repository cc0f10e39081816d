//! The composed schema: every entity kind, its sections and the query root.

use apollo_compiler::Schema;
use apollo_compiler::validation::Valid;

use crate::error::ConfigurationError;
use crate::resolvers::ResolverMap;

pub mod common;
pub mod disease;
pub mod drug;
pub(crate) mod entity;
pub mod evidence;
pub mod query;
pub mod target;

/// The validated schema and the resolvers of its object types.
///
/// Composed once at startup and shared read-only by every request.
#[derive(Debug)]
pub struct ComposedSchema {
    sdl: String,
    schema: Valid<Schema>,
    resolvers: ResolverMap,
}

impl ComposedSchema {
    /// Compose, validate and cross-check the schema.
    ///
    /// Any failure here is fatal: the router does not start with a partial schema.
    pub fn compose() -> Result<Self, ConfigurationError> {
        let mut type_defs = vec![common::TYPE_DEFS.to_string(), query::TYPE_DEFS.to_string()];
        let mut resolvers = query::resolvers();

        for composition in [disease::compose()?, drug::compose()?, evidence::compose()?] {
            type_defs.extend(composition.type_defs);
            resolvers.merge(composition.resolvers)?;
        }
        type_defs.push(target::TYPE_DEFS.to_string());
        resolvers.merge(target::resolvers()?)?;

        let sdl = type_defs.join("\n");
        let schema = Schema::parse_and_validate(&sdl, "schema.graphql")
            .map_err(|invalid| ConfigurationError::InvalidSchema(invalid.errors.to_string()))?;
        check_resolvers(&schema, &resolvers)?;

        tracing::debug!(types = resolvers.len(), "composed schema");
        Ok(Self {
            sdl,
            schema,
            resolvers,
        })
    }

    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }
}

/// Every resolver must belong to a declared field, and every field of a type with resolvers must
/// be resolvable.
fn check_resolvers(schema: &Schema, resolvers: &ResolverMap) -> Result<(), ConfigurationError> {
    for type_resolvers in resolvers.types() {
        let type_name = type_resolvers.type_name();
        if let Some(field) = type_resolvers.duplicate_field() {
            return Err(ConfigurationError::ResolverCollision {
                type_name: format!("{type_name}.{field}"),
            });
        }
        let Some(object) = schema.get_object(type_name) else {
            return Err(ConfigurationError::UnknownResolverType {
                type_name: type_name.to_string(),
            });
        };
        if let Some((field, _)) = type_resolvers
            .fields()
            .find(|(field, _)| !object.fields.contains_key(*field))
        {
            return Err(ConfigurationError::UnknownResolverField {
                type_name: type_name.to_string(),
                field: field.to_string(),
            });
        }
        if !type_resolvers.projects_fields() {
            if let Some(field) = object
                .fields
                .keys()
                .find(|field| type_resolvers.get(field.as_str()).is_none())
            {
                return Err(ConfigurationError::UnresolvedField {
                    type_name: type_name.to_string(),
                    field: field.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::ObjectResolvers;

    #[test]
    fn the_schema_composes() {
        let composed = ComposedSchema::compose().unwrap();
        let schema = composed.schema();
        for type_name in [
            "Query",
            "Disease",
            "DiseaseSummaries",
            "DiseaseDetails",
            "DiseaseSummaryPathways",
            "DiseaseDetailIntogen",
            "DiseaseTargetsConnection",
            "Drug",
            "DrugSummaries",
            "DrugDetailIndications",
            "Indication",
            "Evidence",
            "EvidenceSummaries",
            "EvidenceDetailPathways",
            "EvidenceRowIntogen",
            "Target",
        ] {
            assert!(
                schema.get_object(type_name).is_some(),
                "{type_name} is missing"
            );
        }
    }

    #[test]
    fn umbrella_fields_follow_section_order() {
        let composed = ComposedSchema::compose().unwrap();
        let fields = |type_name: &str| {
            composed
                .schema()
                .get_object(type_name)
                .unwrap()
                .fields
                .iter()
                .map(|(name, field)| format!("{name}: {}", field.ty))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            fields("DiseaseSummaries"),
            [
                "pathways: DiseaseSummaryPathways",
                "intogen: DiseaseSummaryIntogen"
            ]
        );
        assert_eq!(
            fields("EvidenceDetails"),
            [
                "pathways: EvidenceDetailPathways",
                "intogen: EvidenceDetailIntogen"
            ]
        );
        assert_eq!(fields("DrugSummaries"), ["indications: DrugSummaryIndications"]);
    }

    #[test]
    fn composition_is_deterministic() {
        let first = ComposedSchema::compose().unwrap();
        let second = ComposedSchema::compose().unwrap();
        assert_eq!(first.sdl(), second.sdl());
    }

    fn schema(sdl: &str) -> Valid<Schema> {
        Schema::parse_and_validate(sdl, "schema.graphql").unwrap()
    }

    struct Parent;

    #[test]
    fn resolvers_for_undeclared_types_are_rejected() {
        let schema = schema("type Query { a: Int }");
        let resolvers = ObjectResolvers::<Parent>::new("Missing")
            .scalar("a", |_, _| async { Ok(1) })
            .into();
        assert!(matches!(
            check_resolvers(&schema, &resolvers),
            Err(ConfigurationError::UnknownResolverType { type_name }) if type_name == "Missing"
        ));
    }

    #[test]
    fn a_field_resolved_twice_is_rejected_without_a_merge() {
        let schema = schema("type Query { a: Int }");
        let resolvers = ObjectResolvers::<Parent>::new("Query")
            .scalar("a", |_, _| async { Ok(1) })
            .scalar("a", |_, _| async { Ok(2) })
            .into();
        assert!(matches!(
            check_resolvers(&schema, &resolvers),
            Err(ConfigurationError::ResolverCollision { type_name }) if type_name == "Query.a"
        ));
    }

    #[test]
    fn resolvers_for_undeclared_fields_are_rejected() {
        let schema = schema("type Query { a: Int }");
        let resolvers = ObjectResolvers::<Parent>::new("Query")
            .scalar("a", |_, _| async { Ok(1) })
            .scalar("b", |_, _| async { Ok(2) })
            .into();
        assert!(matches!(
            check_resolvers(&schema, &resolvers),
            Err(ConfigurationError::UnknownResolverField { field, .. }) if field == "b"
        ));
    }

    #[test]
    fn fields_without_resolvers_are_rejected() {
        let schema = schema("type Query { a: Int b: Int }");
        let resolvers = ObjectResolvers::<Parent>::new("Query")
            .scalar("a", |_, _| async { Ok(1) })
            .into();
        assert!(matches!(
            check_resolvers(&schema, &resolvers),
            Err(ConfigurationError::UnresolvedField { field, .. }) if field == "b"
        ));
    }
}
