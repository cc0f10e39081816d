//! Composition of section modules into umbrella types.
//!
//! Every entity kind with sections (disease, drug, evidence) has a [`SectionRegistry`]. Each
//! registered [`Section`] contributes a summary type and a detail type. The registry derives
//! their names once, in a [`SectionTable`], and composes:
//!
//! - `<Kind>Summaries` with one field `<id>: <Kind>Summary<Id>` per section,
//! - `<Kind>Details` with one field `<id>: <Kind>Detail<Id>` per section,
//!
//! in registration order. Both umbrella types resolve every field to the entity stub itself, so
//! a section's resolvers always receive the stub of the entity they describe.

use std::fmt::Write as _;

use heck::ToUpperCamelCase;
use indexmap::IndexMap;

use crate::error::ConfigurationError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;

/// One evidence or summary category of an entity kind.
///
/// `P` is the entity stub the section's resolvers receive. Sections are independent: a section's
/// resolvers only ever call the backend accessor of that section.
pub trait Section<P>: Send + Sync {
    /// The umbrella field name; its UpperCamel form is the suffix of the section's type names.
    fn id(&self) -> &'static str;

    /// SDL declaring the summary type `type_name`.
    fn summary_type_defs(&self, type_name: &str) -> String;

    /// Resolvers of the summary type and any type it declares.
    fn summary_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError>;

    /// SDL declaring the detail type `type_name` and the types it uses.
    fn detail_type_defs(&self, type_name: &str) -> String;

    /// Resolvers of the detail type and any type it declares.
    fn detail_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Umbrella {
    Summary,
    Detail,
}

impl Umbrella {
    fn singular(self) -> &'static str {
        match self {
            Umbrella::Summary => "Summary",
            Umbrella::Detail => "Detail",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Umbrella::Summary => "Summaries",
            Umbrella::Detail => "Details",
        }
    }
}

/// The type names of one section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionTypeNames {
    pub summary: String,
    pub detail: String,
}

impl SectionTypeNames {
    pub fn get(&self, umbrella: Umbrella) -> &str {
        match umbrella {
            Umbrella::Summary => &self.summary,
            Umbrella::Detail => &self.detail,
        }
    }
}

/// Section id → type names, for one entity kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionTable {
    kind: String,
    sections: IndexMap<String, SectionTypeNames>,
}

impl SectionTable {
    /// Derive and validate the type names of `ids`, in order.
    pub fn new<'a>(
        kind: &str,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigurationError> {
        let mut sections: IndexMap<String, SectionTypeNames> = IndexMap::new();
        let mut seen_names: Vec<String> = Vec::new();
        for id in ids {
            validate_id(kind, id)?;
            if sections.contains_key(id) {
                return Err(ConfigurationError::DuplicateSectionId {
                    kind: kind.to_string(),
                    id: id.to_string(),
                });
            }
            let suffix = id.to_upper_camel_case();
            let names = SectionTypeNames {
                summary: format!("{kind}{}{suffix}", Umbrella::Summary.singular()),
                detail: format!("{kind}{}{suffix}", Umbrella::Detail.singular()),
            };
            for name in [&names.summary, &names.detail] {
                if seen_names.contains(name) {
                    return Err(ConfigurationError::DuplicateTypeName {
                        type_name: name.clone(),
                    });
                }
                seen_names.push(name.clone());
            }
            sections.insert(id.to_string(), names);
        }
        Ok(Self {
            kind: kind.to_string(),
            sections,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn get(&self, id: &str) -> Option<&SectionTypeNames> {
        self.sections.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionTypeNames)> {
        self.sections.iter().map(|(id, names)| (id.as_str(), names))
    }

    pub fn umbrella_type_name(&self, umbrella: Umbrella) -> String {
        format!("{}{}", self.kind, umbrella.plural())
    }

    /// The SDL of an umbrella type.
    pub fn umbrella_type_def(&self, umbrella: Umbrella) -> String {
        let mut sdl = format!("type {} {{\n", self.umbrella_type_name(umbrella));
        for (id, names) in &self.sections {
            let _ = writeln!(sdl, "  {id}: {}", names.get(umbrella));
        }
        sdl.push_str("}\n");
        sdl
    }
}

fn validate_id(kind: &str, id: &str) -> Result<(), ConfigurationError> {
    let mut chars = id.chars();
    match chars.next() {
        None => Err(ConfigurationError::MissingSectionId {
            kind: kind.to_string(),
        }),
        Some(first) if first.is_ascii_lowercase() && chars.all(|c| c.is_ascii_alphanumeric()) => {
            Ok(())
        }
        Some(_) => Err(ConfigurationError::MalformedSectionId {
            kind: kind.to_string(),
            id: id.to_string(),
        }),
    }
}

/// The type definitions and resolvers of all sections of an entity kind, umbrellas included.
#[derive(Debug)]
pub struct Composition {
    pub table: SectionTable,
    pub type_defs: Vec<String>,
    pub resolvers: ResolverMap,
}

impl Composition {
    pub fn sdl(&self) -> String {
        self.type_defs.join("\n")
    }
}

/// The ordered sections of one entity kind.
pub struct SectionRegistry<P> {
    kind: &'static str,
    sections: Vec<Box<dyn Section<P>>>,
}

impl<P> SectionRegistry<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            sections: Vec::new(),
        }
    }

    pub fn register(mut self, section: impl Section<P> + 'static) -> Self {
        self.sections.push(Box::new(section));
        self
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Compose the sections' types and resolvers with the two umbrella types.
    pub fn compose(&self) -> Result<Composition, ConfigurationError> {
        let table = SectionTable::new(self.kind, self.sections.iter().map(|s| s.id()))?;

        let mut type_defs = Vec::with_capacity(self.sections.len() * 2 + 2);
        let mut resolvers = ResolverMap::new();
        for umbrella in [Umbrella::Summary, Umbrella::Detail] {
            for section in &self.sections {
                let type_name = table
                    .get(section.id())
                    .map(|names| names.get(umbrella).to_string())
                    .ok_or_else(|| ConfigurationError::MissingSectionId {
                        kind: self.kind.to_string(),
                    })?;
                let (sdl, section_resolvers) = match umbrella {
                    Umbrella::Summary => (
                        section.summary_type_defs(&type_name),
                        section.summary_resolvers(&type_name)?,
                    ),
                    Umbrella::Detail => (
                        section.detail_type_defs(&type_name),
                        section.detail_resolvers(&type_name)?,
                    ),
                };
                type_defs.push(sdl);
                resolvers.merge(section_resolvers)?;
            }
        }

        for umbrella in [Umbrella::Summary, Umbrella::Detail] {
            type_defs.push(table.umbrella_type_def(umbrella));
            let umbrella_resolvers = table.iter().fold(
                ObjectResolvers::<P>::new(table.umbrella_type_name(umbrella)),
                |resolvers, (id, _)| resolvers.identity(id),
            );
            resolvers.merge(umbrella_resolvers.into())?;
        }

        tracing::debug!(
            kind = self.kind,
            sections = self.sections.len(),
            "composed sections"
        );
        Ok(Composition {
            table,
            type_defs,
            resolvers,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::MockPlatformApi;
    use crate::configuration::ConnectionSettings;
    use crate::context::Context;
    use crate::json_ext::Object;
    use crate::resolvers::ObjectRef;
    use crate::resolvers::Resolved;
    use crate::therapeutic_areas::TherapeuticAreas;

    struct Stub;

    struct Fixed {
        id: &'static str,
        summary_type: Option<&'static str>,
    }

    impl Section<Stub> for Fixed {
        fn id(&self) -> &'static str {
            self.id
        }

        fn summary_type_defs(&self, type_name: &str) -> String {
            format!("type {type_name} {{\n  count: Int!\n}}\n")
        }

        fn summary_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
            let type_name = self.summary_type.unwrap_or(type_name);
            Ok(ObjectResolvers::<Stub>::new(type_name)
                .scalar("count", |_, _| async { Ok(1) })
                .into())
        }

        fn detail_type_defs(&self, type_name: &str) -> String {
            format!("type {type_name} {{\n  rows: [String!]!\n}}\n")
        }

        fn detail_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
            Ok(ObjectResolvers::<Stub>::new(type_name)
                .scalar("rows", |_, _| async { Ok(Vec::<String>::new()) })
                .into())
        }
    }

    fn section(id: &'static str) -> Fixed {
        Fixed {
            id,
            summary_type: None,
        }
    }

    fn registry() -> SectionRegistry<Stub> {
        SectionRegistry::new("Disease")
            .register(section("pathways"))
            .register(section("intogen"))
    }

    #[test]
    fn umbrella_types_list_sections_in_registration_order() {
        let composition = registry().compose().unwrap();
        insta::assert_snapshot!(composition.table.umbrella_type_def(Umbrella::Summary), @r"
        type DiseaseSummaries {
          pathways: DiseaseSummaryPathways
          intogen: DiseaseSummaryIntogen
        }
        ");
        insta::assert_snapshot!(composition.table.umbrella_type_def(Umbrella::Detail), @r"
        type DiseaseDetails {
          pathways: DiseaseDetailPathways
          intogen: DiseaseDetailIntogen
        }
        ");
    }

    #[test]
    fn composition_is_deterministic() {
        let first = registry().compose().unwrap();
        let second = registry().compose().unwrap();
        assert_eq!(first.sdl(), second.sdl());
        assert_eq!(first.table, second.table);

        let types = |composition: &Composition| {
            composition
                .resolvers
                .types()
                .map(|resolvers| {
                    let fields: Vec<String> =
                        resolvers.fields().map(|(name, _)| name.to_string()).collect();
                    (resolvers.type_name().to_string(), fields)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(types(&first), types(&second));
        assert_eq!(
            types(&first)
                .into_iter()
                .map(|(name, _)| name)
                .collect::<Vec<_>>(),
            [
                "DiseaseSummaryPathways",
                "DiseaseSummaryIntogen",
                "DiseaseDetailPathways",
                "DiseaseDetailIntogen",
                "DiseaseSummaries",
                "DiseaseDetails",
            ]
        );
    }

    #[test]
    fn multi_word_ids_become_upper_camel_suffixes() {
        let table = SectionTable::new("Drug", ["mechanismsOfAction"]).unwrap();
        assert_eq!(
            table.get("mechanismsOfAction"),
            Some(&SectionTypeNames {
                summary: "DrugSummaryMechanismsOfAction".to_string(),
                detail: "DrugDetailMechanismsOfAction".to_string(),
            })
        );
    }

    #[test]
    fn section_ids_are_validated() {
        assert!(matches!(
            SectionTable::new("Disease", [""]),
            Err(ConfigurationError::MissingSectionId { .. })
        ));
        assert!(matches!(
            SectionTable::new("Disease", ["Pathways"]),
            Err(ConfigurationError::MalformedSectionId { id, .. }) if id == "Pathways"
        ));
        assert!(matches!(
            SectionTable::new("Disease", ["rna-expression"]),
            Err(ConfigurationError::MalformedSectionId { .. })
        ));
        assert!(matches!(
            SectionTable::new("Disease", ["pathways", "intogen", "pathways"]),
            Err(ConfigurationError::DuplicateSectionId { id, .. }) if id == "pathways"
        ));
    }

    #[test]
    fn duplicate_registration_refuses_to_compose() {
        let error = registry()
            .register(section("pathways"))
            .compose()
            .unwrap_err();
        assert!(matches!(error, ConfigurationError::DuplicateSectionId { .. }));
    }

    #[test]
    fn sections_defining_the_same_type_collide() {
        let error = SectionRegistry::new("Disease")
            .register(section("pathways"))
            .register(Fixed {
                id: "intogen",
                summary_type: Some("DiseaseSummaryPathways"),
            })
            .compose()
            .unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::ResolverCollision { type_name }
                if type_name == "DiseaseSummaryPathways"
        ));
    }

    #[tokio::test]
    async fn umbrella_fields_pass_the_stub_through() {
        let composition = registry().compose().unwrap();
        let context = Context::new(
            Arc::new(MockPlatformApi::new()),
            Arc::new(TherapeuticAreas::default()),
            ConnectionSettings::default(),
        );
        let stub: ObjectRef = Arc::new(Stub);

        for (type_name, field) in [
            ("DiseaseSummaries", "pathways"),
            ("DiseaseSummaries", "intogen"),
            ("DiseaseDetails", "pathways"),
            ("DiseaseDetails", "intogen"),
        ] {
            let resolver = composition.resolvers.get(type_name, field).unwrap();
            assert!(resolver.is_identity());
            match resolver.resolve(&stub, Object::new(), &context).await.unwrap() {
                Resolved::Object(resolved) => assert!(Arc::ptr_eq(&resolved, &stub)),
                other => panic!("{type_name}.{field} resolved to {other:?}"),
            }
        }
    }
}
