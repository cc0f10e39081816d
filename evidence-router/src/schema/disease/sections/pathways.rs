//! Pathways affected in a disease.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::error::FieldError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::common::ReactomePathway;
use crate::schema::common::sources;
use crate::schema::disease::DiseaseStub;
use crate::sections::Section;

const SOURCES: &[(&str, &str)] = &[(
    "Reactome",
    "https://docs.targetvalidation.org/data-sources/affected-pathways#reactome",
)];

/// What the backend knows about the pathways of a disease.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseasePathways {
    pub pathway_count: i32,
    pub pathways: Vec<ReactomePathway>,
}

pub struct Pathways;

impl Section<DiseaseStub> for Pathways {
    fn id(&self) -> &'static str {
        "pathways"
    }

    fn summary_type_defs(&self, type_name: &str) -> String {
        format!("type {type_name} {{\n  pathwayCount: Int!\n  sources: [Source!]!\n}}\n")
    }

    fn summary_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        Ok(ObjectResolvers::<DiseaseStub>::new(type_name)
            .scalar("pathwayCount", |disease, context| async move {
                let pathways = context.disease_pathways().load(disease.efo_id.clone()).await?;
                Ok::<_, FieldError>(pathways.pathway_count)
            })
            .scalar("sources", |_, _| async { Ok(sources(SOURCES)) })
            .into())
    }

    fn detail_type_defs(&self, type_name: &str) -> String {
        format!("type {type_name} {{\n  pathways: [ReactomePathway!]!\n}}\n")
    }

    fn detail_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        Ok(ObjectResolvers::<DiseaseStub>::new(type_name)
            .scalar("pathways", |disease, context| async move {
                let pathways = context.disease_pathways().load(disease.efo_id.clone()).await?;
                Ok::<_, FieldError>(pathways.pathways.clone())
            })
            .into())
    }
}
