//! Somatic mutations found by IntOGen in a disease's cohorts.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::error::FieldError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::common::sources;
use crate::schema::disease::DiseaseStub;
use crate::schema::target::TargetStub;
use crate::sections::Section;

const SOURCES: &[(&str, &str)] = &[(
    "IntOGen",
    "https://docs.targetvalidation.org/data-sources/somatic-mutations#intogen",
)];

/// What the backend knows about the mutated targets of a disease.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseIntogen {
    pub has_mutations: bool,
    pub rows: Vec<DiseaseRowIntogen>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseRowIntogen {
    pub target: MutatedTarget,
    pub pval: f64,
    pub analysis_methods: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatedTarget {
    pub id: String,
    pub symbol: String,
}

pub struct Intogen;

impl Section<DiseaseStub> for Intogen {
    fn id(&self) -> &'static str {
        "intogen"
    }

    fn summary_type_defs(&self, type_name: &str) -> String {
        format!("type {type_name} {{\n  hasMutations: Boolean!\n  sources: [Source!]!\n}}\n")
    }

    fn summary_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        Ok(ObjectResolvers::<DiseaseStub>::new(type_name)
            .scalar("hasMutations", |disease, context| async move {
                let intogen = context.disease_intogen().load(disease.efo_id.clone()).await?;
                Ok::<_, FieldError>(intogen.has_mutations)
            })
            .scalar("sources", |_, _| async { Ok(sources(SOURCES)) })
            .into())
    }

    fn detail_type_defs(&self, type_name: &str) -> String {
        format!(
            r#"type DiseaseRowIntogen {{
  target: Target!
  pval: Float!
  analysisMethods: [String!]!
}}

type {type_name} {{
  rows: [DiseaseRowIntogen!]!
}}
"#
        )
    }

    fn detail_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        let mut resolvers = ResolverMap::from(
            ObjectResolvers::<DiseaseStub>::new(type_name).objects(
                "rows",
                |disease, context| async move {
                    let intogen = context.disease_intogen().load(disease.efo_id.clone()).await?;
                    Ok::<_, FieldError>(intogen.rows.clone())
                },
            ),
        );
        resolvers.insert(
            ObjectResolvers::<DiseaseRowIntogen>::new("DiseaseRowIntogen")
                .project_fields()
                .object("target", |row, _| async move {
                    Ok(TargetStub {
                        ensg_id: row.target.id.clone(),
                        id: Some(row.target.id.clone()),
                        symbol: Some(row.target.symbol.clone()),
                        name: None,
                    })
                })
                .build(),
        )?;
        Ok(resolvers)
    }
}
