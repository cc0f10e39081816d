//! The `Disease` entity, identified by its EFO id.

use std::sync::Arc;

use crate::backend::DiseaseRecord;
use crate::context::Context;
use crate::error::ConfigurationError;
use crate::loader::BatchingLoader;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::entity::Entity;
use crate::schema::entity::EntityResolvers;
use crate::sections::Composition;
use crate::therapeutic_areas::TherapeuticArea;
use crate::therapeutic_areas::TherapeuticAreas;

pub mod sections;
pub mod targets_connection;

const TYPE_DEFS: &str = r#"type Disease {
  id: String!
  name: String!
  description: String!
  synonyms: [String!]!
  therapeuticAreas: [Disease!]!
  summaries: DiseaseSummaries!
  details: DiseaseDetails!
  targetsConnection(
    facets: DiseaseTargetsConnectionFacetsInput
    sortBy: DiseaseTargetsConnectionSortByInput
    first: Int
    after: String
    search: String
  ): DiseaseTargetsConnection!
}
"#;

/// A reference to a disease, with whatever fields its producer already knew.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiseaseStub {
    pub efo_id: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub synonyms: Option<Vec<String>>,
}

impl DiseaseStub {
    pub fn new(efo_id: impl Into<String>) -> Self {
        Self {
            efo_id: efo_id.into(),
            ..Default::default()
        }
    }

    /// A stub with the id and name already known.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            efo_id: id.clone(),
            id: Some(id),
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl From<&TherapeuticArea> for DiseaseStub {
    fn from(area: &TherapeuticArea) -> Self {
        DiseaseStub::named(area.id.clone(), area.name.clone())
    }
}

impl Entity for DiseaseStub {
    type Record = DiseaseRecord;

    fn key(&self) -> &str {
        &self.efo_id
    }

    fn loader(context: &Context) -> &BatchingLoader<String, Arc<DiseaseRecord>> {
        context.diseases()
    }
}

/// Stubs for the therapeutic areas of a disease. A disease missing from the table has none.
pub(crate) fn therapeutic_areas(table: &TherapeuticAreas, efo_id: &str) -> Vec<DiseaseStub> {
    table
        .for_disease(efo_id)
        .iter()
        .map(DiseaseStub::from)
        .collect()
}

/// The type definitions and resolvers of `Disease` and everything under it.
pub(crate) fn compose() -> Result<Composition, ConfigurationError> {
    let mut composition = sections::registry().compose()?;
    composition
        .type_defs
        .push(targets_connection::TYPE_DEFS.to_string());
    composition.type_defs.push(TYPE_DEFS.to_string());
    composition.resolvers.merge(targets_connection::resolvers()?)?;
    composition.resolvers.merge(resolvers())?;
    Ok(composition)
}

fn resolvers() -> ResolverMap {
    ObjectResolvers::<DiseaseStub>::new("Disease")
        .inline_or_fetch("id", |stub| stub.id.clone(), |record| record.id.clone())
        .inline_or_fetch("name", |stub| stub.name.clone(), |record| record.name.clone())
        .inline_or_fetch(
            "description",
            |stub| stub.description.clone(),
            |record| record.description.clone(),
        )
        .inline_or_fetch(
            "synonyms",
            |stub| stub.synonyms.clone(),
            |record| record.synonyms.clone(),
        )
        .objects("therapeuticAreas", |stub, context| async move {
            Ok(therapeutic_areas(context.therapeutic_areas(), &stub.efo_id))
        })
        .identity("summaries")
        .identity("details")
        .connection("targetsConnection", targets_connection::resolve)
        .into()
}
