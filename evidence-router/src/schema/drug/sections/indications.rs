//! The diseases a drug is indicated for.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::error::FieldError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::common::sources;
use crate::schema::disease;
use crate::schema::drug::DrugStub;
use crate::sections::Section;

const SOURCES: &[(&str, &str)] = &[(
    "ChEMBL",
    "https://docs.targetvalidation.org/data-sources/drugs#chembl",
)];

/// A disease a drug is indicated for, identified by its EFO id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indication {
    pub id: String,
    pub name: String,
    pub max_phase: Option<i32>,
}

/// What the backend knows about the indications of a drug.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugIndications {
    pub indication_count: i32,
    pub rows: Vec<Indication>,
}

pub struct Indications;

impl Section<DrugStub> for Indications {
    fn id(&self) -> &'static str {
        "indications"
    }

    fn summary_type_defs(&self, type_name: &str) -> String {
        format!("type {type_name} {{\n  indicationCount: Int!\n  sources: [Source!]!\n}}\n")
    }

    fn summary_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        Ok(ObjectResolvers::<DrugStub>::new(type_name)
            .scalar("indicationCount", |drug, context| async move {
                let indications = context.drug_indications().load(drug.chembl_id.clone()).await?;
                Ok::<_, FieldError>(indications.indication_count)
            })
            .scalar("sources", |_, _| async { Ok(sources(SOURCES)) })
            .into())
    }

    fn detail_type_defs(&self, type_name: &str) -> String {
        format!(
            r#"type Indication {{
  id: String!
  name: String!
  therapeuticAreas: [Disease!]!
  maxPhase: Int
}}

type {type_name} {{
  rows: [Indication!]!
}}
"#
        )
    }

    fn detail_resolvers(&self, type_name: &str) -> Result<ResolverMap, ConfigurationError> {
        let mut resolvers = ResolverMap::from(
            ObjectResolvers::<DrugStub>::new(type_name).objects(
                "rows",
                |drug, context| async move {
                    let indications = context
                        .drug_indications()
                        .load(drug.chembl_id.clone())
                        .await?;
                    Ok::<_, FieldError>(indications.rows.clone())
                },
            ),
        );
        resolvers.insert(
            ObjectResolvers::<Indication>::new("Indication")
                .project_fields()
                .objects("therapeuticAreas", |indication, context| async move {
                    Ok(disease::therapeutic_areas(
                        context.therapeutic_areas(),
                        &indication.id,
                    ))
                })
                .build(),
        )?;
        Ok(resolvers)
    }
}
