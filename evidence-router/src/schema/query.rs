//! The `Query` root: entity lookups by identifier.
//!
//! A lookup only builds a stub. Nothing is fetched until a field of the entity needs it.

use serde::Deserialize;

use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::disease::DiseaseStub;
use crate::schema::drug::DrugStub;
use crate::schema::evidence::EvidenceStub;
use crate::schema::target::TargetStub;

pub(crate) const TYPE_DEFS: &str = r#"type Query {
  disease(efoId: String!): Disease!
  drug(chemblId: String!): Drug!
  target(ensgId: String!): Target!
  evidence(ensgId: String!, efoId: String!): Evidence!
}
"#;

/// The parent value of root fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryRoot;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiseaseArgs {
    efo_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrugArgs {
    chembl_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetArgs {
    ensg_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvidenceArgs {
    ensg_id: String,
    efo_id: String,
}

pub(crate) fn resolvers() -> ResolverMap {
    ObjectResolvers::<QueryRoot>::new("Query")
        .lookup("disease", |_, args: DiseaseArgs, _| async move {
            Ok(DiseaseStub::new(args.efo_id))
        })
        .lookup("drug", |_, args: DrugArgs, _| async move {
            Ok(DrugStub::new(args.chembl_id))
        })
        .lookup("target", |_, args: TargetArgs, _| async move {
            Ok(TargetStub::new(args.ensg_id))
        })
        .lookup("evidence", |_, args: EvidenceArgs, _| async move {
            Ok(EvidenceStub::new(args.ensg_id, args.efo_id))
        })
        .into()
}
