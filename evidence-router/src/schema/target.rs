//! The `Target` entity: a gene, identified by its Ensembl gene id.

use std::sync::Arc;

use crate::backend::TargetRecord;
use crate::context::Context;
use crate::error::ConfigurationError;
use crate::loader::BatchingLoader;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::entity::Entity;
use crate::schema::entity::EntityResolvers;

pub(crate) const TYPE_DEFS: &str = r#"type Target {
  id: String!
  symbol: String!
  name: String!
}
"#;

/// A reference to a target, with whatever fields its producer already knew.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetStub {
    pub ensg_id: String,
    pub id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
}

impl TargetStub {
    pub fn new(ensg_id: impl Into<String>) -> Self {
        Self {
            ensg_id: ensg_id.into(),
            ..Default::default()
        }
    }
}

impl Entity for TargetStub {
    type Record = TargetRecord;

    fn key(&self) -> &str {
        &self.ensg_id
    }

    fn loader(context: &Context) -> &BatchingLoader<String, Arc<TargetRecord>> {
        context.targets()
    }
}

pub(crate) fn resolvers() -> Result<ResolverMap, ConfigurationError> {
    Ok(ObjectResolvers::<TargetStub>::new("Target")
        .inline_or_fetch("id", |stub| stub.id.clone(), |record| record.id.clone())
        .inline_or_fetch(
            "symbol",
            |stub| stub.symbol.clone(),
            |record| record.symbol.clone(),
        )
        .inline_or_fetch("name", |stub| stub.name.clone(), |record| record.name.clone())
        .into())
}
