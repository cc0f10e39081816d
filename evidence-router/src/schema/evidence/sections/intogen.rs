//! Somatic mutations of a target found by IntOGen in a disease's cohorts.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::error::FieldError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::common::DiseaseRef;
use crate::schema::common::Source;
use crate::schema::common::sources;
use crate::schema::disease::DiseaseStub;
use crate::schema::evidence::EvidenceStub;
use crate::sections::Section;

const SOURCES: &[(&str, &str)] = &[(
    "IntOGen",
    "https://docs.targetvalidation.org/data-sources/somatic-mutations#intogen",
)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntogenActivity {
    GainOfFunction,
    LossOfFunction,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InheritancePattern {
    XLinkedRecessive,
    DominantOrRecessive,
    Dominant,
    Recessive,
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationMetrics {
    pub value: Option<i32>,
    pub total: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRowIntogen {
    pub disease: DiseaseRef,
    pub activity: IntogenActivity,
    pub inheritance_pattern: InheritancePattern,
    pub source: Source,
    pub pm_id: String,
    pub pval: f64,
    pub mutation_metrics: MutationMetrics,
    pub cohort: Cohort,
    pub analysis_methods: Vec<String>,
}

/// What the backend knows about the mutations of a target in a disease.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceIntogen {
    pub has_mutations: bool,
    pub rows: Vec<EvidenceRowIntogen>,
}

pub struct Intogen;

impl Section<EvidenceStub> for Intogen {
    fn id(&self) -> &'static str {
        "intogen"
    }

    fn summary_type_defs(&self, type_name: &str) -> String {
        format!("type {type_name} {{\n  hasMutations: Boolean!\n  sources: [Source!]!\n}}\n")
    }

    fn summary_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        Ok(ObjectResolvers::<EvidenceStub>::new(type_name)
            .scalar("hasMutations", |evidence, context| async move {
                let intogen = context.evidence_intogen().load(evidence.key()).await?;
                Ok::<_, FieldError>(intogen.has_mutations)
            })
            .scalar("sources", |_, _| async { Ok(sources(SOURCES)) })
            .into())
    }

    fn detail_type_defs(&self, type_name: &str) -> String {
        format!(
            r#"enum IntogenActivity {{
  GAIN_OF_FUNCTION
  LOSS_OF_FUNCTION
  UNKNOWN
}}

enum InheritancePattern {{
  X_LINKED_RECESSIVE
  DOMINANT_OR_RECESSIVE
  DOMINANT
  RECESSIVE
  UNKNOWN
}}

type Cohort {{
  name: String!
  description: String!
}}

type MutationMetrics {{
  value: Int
  total: Int
}}

type EvidenceRowIntogen {{
  disease: Disease!
  activity: IntogenActivity!
  inheritancePattern: InheritancePattern!
  source: Source!
  pmId: String!
  pval: Float!
  mutationMetrics: MutationMetrics!
  cohort: Cohort!
  analysisMethods: [String]!
}}

type {type_name} {{
  rows: [EvidenceRowIntogen!]!
}}
"#
        )
    }

    fn detail_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        let mut resolvers = ResolverMap::from(
            ObjectResolvers::<EvidenceStub>::new(type_name).objects(
                "rows",
                |evidence, context| async move {
                    let intogen = context.evidence_intogen().load(evidence.key()).await?;
                    Ok::<_, FieldError>(intogen.rows.clone())
                },
            ),
        );
        resolvers.insert(
            ObjectResolvers::<EvidenceRowIntogen>::new("EvidenceRowIntogen")
                .project_fields()
                .object("disease", |row, _| async move {
                    Ok(DiseaseStub::named(row.disease.id.clone(), row.disease.name.clone()))
                })
                .build(),
        )?;
        Ok(resolvers)
    }
}
