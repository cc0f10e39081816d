//! The `Drug` entity, identified by its ChEMBL id.

use std::sync::Arc;

use crate::backend::DrugRecord;
use crate::context::Context;
use crate::error::ConfigurationError;
use crate::loader::BatchingLoader;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::entity::Entity;
use crate::schema::entity::EntityResolvers;
use crate::sections::Composition;

pub mod sections;

const TYPE_DEFS: &str = r#"type WithdrawnNotice {
  classes: [String!]
  countries: [String!]!
  reasons: [String!]
  year: String!
}

type Drug {
  id: String!
  name: String!
  synonyms: [String!]!
  tradeNames: [String!]!
  yearOfFirstApproval: String
  type: String!
  maximumClinicalTrialPhase: Int
  hasBeenWithdrawn: Boolean!
  withdrawnNotice: WithdrawnNotice
  summaries: DrugSummaries!
  details: DrugDetails!
  internalCompound: Boolean!
}
"#;

/// A reference to a drug, with whatever fields its producer already knew.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrugStub {
    pub chembl_id: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub synonyms: Option<Vec<String>>,
}

impl DrugStub {
    pub fn new(chembl_id: impl Into<String>) -> Self {
        Self {
            chembl_id: chembl_id.into(),
            ..Default::default()
        }
    }
}

impl Entity for DrugStub {
    type Record = DrugRecord;

    fn key(&self) -> &str {
        &self.chembl_id
    }

    fn loader(context: &Context) -> &BatchingLoader<String, Arc<DrugRecord>> {
        context.drugs()
    }
}

pub(crate) fn compose() -> Result<Composition, ConfigurationError> {
    let mut composition = sections::registry().compose()?;
    composition.type_defs.push(TYPE_DEFS.to_string());
    composition.resolvers.merge(resolvers())?;
    Ok(composition)
}

fn resolvers() -> ResolverMap {
    ObjectResolvers::<DrugStub>::new("Drug")
        .inline_or_fetch("id", |stub| stub.id.clone(), |record| record.id.clone())
        .inline_or_fetch("name", |stub| stub.name.clone(), |record| record.name.clone())
        .inline_or_fetch(
            "synonyms",
            |stub| stub.synonyms.clone(),
            |record| record.synonyms.clone(),
        )
        .fetched("tradeNames", |record| record.trade_names.clone())
        .fetched("yearOfFirstApproval", |record| {
            record.year_of_first_approval.clone()
        })
        .fetched("type", |record| record.drug_type.clone())
        .fetched("maximumClinicalTrialPhase", |record| {
            record.maximum_clinical_trial_phase
        })
        .fetched("hasBeenWithdrawn", |record| record.has_been_withdrawn)
        .fetched("withdrawnNotice", |record| record.withdrawn_notice.clone())
        .fetched("internalCompound", |record| record.internal_compound)
        .identity("summaries")
        .identity("details")
        .into()
}
