//! `Disease.targetsConnection`: the targets associated with a disease, one page at a time.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::DiseaseStub;
use crate::context::Context;
use crate::error::ConfigurationError;
use crate::error::FieldError;
use crate::resolvers::ObjectResolvers;
use crate::resolvers::ResolverMap;
use crate::schema::evidence::EvidenceStub;
use crate::schema::target::TargetStub;

pub(crate) const TYPE_DEFS: &str = r#"input DiseaseTargetsConnectionFacetsInput {
  dataTypeIds: [String!]
  pathwayIds: [String!]
  targetClassIds: [String!]
}

enum DiseaseTargetsConnectionSortByField {
  SCORE_OVERALL
  TARGET_SYMBOL
  LITERATURE
  RNA_EXPRESSION
  SOMATIC_MUTATION
}

input DiseaseTargetsConnectionSortByInput {
  field: DiseaseTargetsConnectionSortByField
  ascending: Boolean
}

type DataTypeScore {
  dataTypeId: String!
  score: Float!
}

type PageInfo {
  hasNextPage: Boolean!
  endCursor: String
}

type DiseaseTargetsConnectionEdge {
  node: Target!
  score: Float!
  scoresByDataType: [DataTypeScore!]!
  cursor: String!
  evidence: Evidence!
}

type DiseaseTargetsConnection {
  totalCount: Int!
  pageInfo: PageInfo!
  edges: [DiseaseTargetsConnectionEdge!]!
}
"#;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Facets {
    pub data_type_ids: Option<Vec<String>>,
    pub pathway_ids: Option<Vec<String>>,
    pub target_class_ids: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortField {
    ScoreOverall,
    TargetSymbol,
    Literature,
    RnaExpression,
    SomaticMutation,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct SortBy {
    field: Option<SortField>,
    ascending: Option<bool>,
}

/// The arguments of `Disease.targetsConnection`, as sent by the client.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct TargetsConnectionArgs {
    facets: Option<Facets>,
    sort_by: Option<SortBy>,
    first: Option<i32>,
    after: Option<String>,
    search: Option<String>,
}

/// One page request for the backend, with every default applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetsConnectionQuery {
    pub facets: Option<Facets>,
    pub search: String,
    pub sort_field: Option<SortField>,
    pub sort_ascending: bool,
    pub page_size: i32,
    /// `None` starts from the first page.
    pub cursor: Option<String>,
}

impl TargetsConnectionArgs {
    pub(crate) fn into_query(
        self,
        default_page_size: i32,
        max_page_size: i32,
    ) -> Result<TargetsConnectionQuery, FieldError> {
        let page_size = self.first.unwrap_or(default_page_size);
        if !(0..=max_page_size).contains(&page_size) {
            return Err(FieldError::InvalidArguments {
                field: "targetsConnection".to_string(),
                reason: format!("first must be between 0 and {max_page_size}, got {page_size}"),
            });
        }
        let sort_by = self.sort_by.unwrap_or_default();
        Ok(TargetsConnectionQuery {
            facets: self.facets,
            search: self.search.unwrap_or_default(),
            sort_field: sort_by.field,
            sort_ascending: sort_by.ascending.unwrap_or(false),
            page_size,
            cursor: self.after,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeScore {
    pub data_type_id: String,
    pub score: f64,
}

/// A target as listed in a connection page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTarget {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRow {
    pub target: ConnectionTarget,
    pub score: f64,
    pub scores_by_data_type: Vec<DataTypeScore>,
    pub cursor: String,
}

/// A page of targets as returned by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetsConnectionPage {
    pub total_count: i32,
    pub rows: Vec<TargetRow>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// A page together with the disease it belongs to, so edges can build their own stubs.
#[derive(Debug)]
pub struct DiseaseTargetsConnection {
    pub efo_id: String,
    pub page: TargetsConnectionPage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// One edge: a page row and the disease it was listed for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseTargetsConnectionEdge {
    #[serde(skip)]
    efo_id: String,
    #[serde(flatten)]
    row: TargetRow,
}

/// Resolve `targetsConnection` for a disease: one backend call, no loader.
pub(crate) async fn resolve(
    disease: Arc<DiseaseStub>,
    args: TargetsConnectionArgs,
    context: Context,
) -> Result<DiseaseTargetsConnection, FieldError> {
    let settings = context.connection();
    let query = args.into_query(settings.default_page_size, settings.max_page_size)?;
    tracing::debug!(efo_id = %disease.efo_id, ?query, "fetching targets connection");
    let page = context
        .backend()
        .disease_targets_connection(&disease.efo_id, query)
        .await?;
    Ok(DiseaseTargetsConnection {
        efo_id: disease.efo_id.clone(),
        page,
    })
}

pub(crate) fn resolvers() -> Result<ResolverMap, ConfigurationError> {
    let mut resolvers = ResolverMap::from(
        ObjectResolvers::<DiseaseTargetsConnection>::new("DiseaseTargetsConnection")
            .scalar("totalCount", |connection, _| async move {
                Ok(connection.page.total_count)
            })
            .scalar("pageInfo", |connection, _| async move {
                Ok(PageInfo {
                    has_next_page: connection.page.has_next_page,
                    end_cursor: connection.page.end_cursor.clone(),
                })
            })
            .objects("edges", |connection, _| async move {
                Ok(connection
                    .page
                    .rows
                    .iter()
                    .map(|row| DiseaseTargetsConnectionEdge {
                        efo_id: connection.efo_id.clone(),
                        row: row.clone(),
                    })
                    .collect::<Vec<_>>())
            }),
    );
    resolvers.insert(
        ObjectResolvers::<DiseaseTargetsConnectionEdge>::new("DiseaseTargetsConnectionEdge")
            .project_fields()
            .object("node", |edge, _| async move {
                let target = &edge.row.target;
                Ok(TargetStub {
                    ensg_id: target.id.clone(),
                    id: Some(target.id.clone()),
                    symbol: Some(target.symbol.clone()),
                    name: Some(target.name.clone()),
                })
            })
            .object("evidence", |edge, _| async move {
                Ok(EvidenceStub::new(edge.row.target.id.clone(), edge.efo_id.clone()))
            })
            .build(),
    )?;
    Ok(resolvers)
}
