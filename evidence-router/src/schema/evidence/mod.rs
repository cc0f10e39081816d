//! The `Evidence` entity: what is known about one target in one disease.
//!
//! Evidence has no record of its own. Its stub is the (target, disease) pair, and every section
//! payload is loaded once per request by both identifiers.

use crate::context::EvidenceKey;
use crate::error::ConfigurationError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::disease::DiseaseStub;
use crate::schema::target::TargetStub;
use crate::sections::Composition;

pub mod sections;

const TYPE_DEFS: &str = r#"type Evidence {
  target: Target!
  disease: Disease!
  summaries: EvidenceSummaries!
  details: EvidenceDetails!
}
"#;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceStub {
    pub ensg_id: String,
    pub efo_id: String,
}

impl EvidenceStub {
    pub fn new(ensg_id: impl Into<String>, efo_id: impl Into<String>) -> Self {
        Self {
            ensg_id: ensg_id.into(),
            efo_id: efo_id.into(),
        }
    }

    /// The key evidence payloads are loaded by.
    pub fn key(&self) -> EvidenceKey {
        (self.ensg_id.clone(), self.efo_id.clone())
    }
}

pub(crate) fn compose() -> Result<Composition, ConfigurationError> {
    let mut composition = sections::registry().compose()?;
    composition.type_defs.push(TYPE_DEFS.to_string());
    composition.resolvers.merge(resolvers())?;
    Ok(composition)
}

fn resolvers() -> ResolverMap {
    ObjectResolvers::<EvidenceStub>::new("Evidence")
        .object("target", |evidence, _| async move {
            Ok(TargetStub::new(evidence.ensg_id.clone()))
        })
        .object("disease", |evidence, _| async move {
            Ok(DiseaseStub::new(evidence.efo_id.clone()))
        })
        .identity("summaries")
        .identity("details")
        .into()
}
