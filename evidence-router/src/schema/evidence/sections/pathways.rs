//! Pathways affected by a target in a disease, from Reactome, SLAPenrich and PROGENy.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::error::FieldError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::common::DiseaseRef;
use crate::schema::common::ReactomePathway;
use crate::schema::common::Source;
use crate::schema::common::sources;
use crate::schema::disease::DiseaseStub;
use crate::schema::evidence::EvidenceStub;
use crate::sections::Section;

const SOURCES: &[(&str, &str)] = &[
    (
        "Reactome",
        "https://docs.targetvalidation.org/data-sources/affected-pathways#reactome",
    ),
    (
        "SLAPenrich",
        "https://docs.targetvalidation.org/data-sources/affected-pathways#slapenrich",
    ),
    (
        "PROGENy",
        "https://docs.targetvalidation.org/data-sources/affected-pathways#progeny",
    ),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactomeActivity {
    DecreasedTranscriptLevel,
    GainOfFunction,
    LossOfFunction,
    PartialLossOfFunction,
    UpOrDown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRowPathways {
    pub activity: Option<ReactomeActivity>,
    pub disease: DiseaseRef,
    pub pathway: ReactomePathway,
    pub mutations: Vec<String>,
    pub source: Source,
}

/// What the backend knows about the pathways a target affects in a disease.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidencePathways {
    pub pathway_count: i32,
    pub rows_pathways: Vec<EvidenceRowPathways>,
}

pub struct Pathways;

impl Section<EvidenceStub> for Pathways {
    fn id(&self) -> &'static str {
        "pathways"
    }

    fn summary_type_defs(&self, type_name: &str) -> String {
        format!("type {type_name} {{\n  pathwayCount: Int!\n  sources: [Source!]!\n}}\n")
    }

    fn summary_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        Ok(ObjectResolvers::<EvidenceStub>::new(type_name)
            .scalar("pathwayCount", |evidence, context| async move {
                let pathways = context.evidence_pathways().load(evidence.key()).await?;
                Ok::<_, FieldError>(pathways.pathway_count)
            })
            .scalar("sources", |_, _| async { Ok(sources(SOURCES)) })
            .into())
    }

    fn detail_type_defs(&self, type_name: &str) -> String {
        format!(
            r#"enum ReactomeActivity {{
  DECREASED_TRANSCRIPT_LEVEL
  GAIN_OF_FUNCTION
  LOSS_OF_FUNCTION
  PARTIAL_LOSS_OF_FUNCTION
  UP_OR_DOWN
}}

type EvidenceRowPathways {{
  activity: ReactomeActivity
  disease: Disease!
  pathway: ReactomePathway!
  mutations: [String!]!
  source: Source!
}}

type {type_name} {{
  rowsPathways: [EvidenceRowPathways!]!
}}
"#
        )
    }

    fn detail_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        let mut resolvers = ResolverMap::from(
            ObjectResolvers::<EvidenceStub>::new(type_name).objects(
                "rowsPathways",
                |evidence, context| async move {
                    let pathways = context.evidence_pathways().load(evidence.key()).await?;
                    Ok::<_, FieldError>(pathways.rows_pathways.clone())
                },
            ),
        );
        resolvers.insert(
            ObjectResolvers::<EvidenceRowPathways>::new("EvidenceRowPathways")
                .project_fields()
                .object("disease", |row, _| async move {
                    Ok(DiseaseStub::named(row.disease.id.clone(), row.disease.name.clone()))
                })
                .build(),
        )?;
        Ok(resolvers)
    }
}
