//! The boundary to the platform's data services.
//!
//! Network clients live outside this crate: they implement [`PlatformApi`] and are handed to
//! the [`Router`](crate::Router). Every method maps to exactly one backend endpoint. "No
//! evidence" is reported as an empty payload, only genuine failures are errors.

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::FetchError;
use crate::schema::disease::sections::intogen::DiseaseIntogen;
use crate::schema::disease::sections::pathways::DiseasePathways;
use crate::schema::disease::targets_connection::TargetsConnectionPage;
use crate::schema::disease::targets_connection::TargetsConnectionQuery;
use crate::schema::drug::sections::indications::DrugIndications;
use crate::schema::evidence::sections::intogen::EvidenceIntogen;
use crate::schema::evidence::sections::pathways::EvidencePathways;

/// Accessors for every backend endpoint the schema reads from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformApi: Send + Sync + 'static {
    /// Fetch a disease by EFO identifier.
    async fn disease(&self, efo_id: &str) -> Result<DiseaseRecord, FetchError>;

    /// Fetch a drug by ChEMBL identifier.
    async fn drug(&self, chembl_id: &str) -> Result<DrugRecord, FetchError>;

    /// Fetch a target by Ensembl gene identifier.
    async fn target(&self, ensg_id: &str) -> Result<TargetRecord, FetchError>;

    /// One page of the targets associated with a disease.
    async fn disease_targets_connection(
        &self,
        efo_id: &str,
        query: TargetsConnectionQuery,
    ) -> Result<TargetsConnectionPage, FetchError>;

    async fn disease_pathways(&self, efo_id: &str) -> Result<DiseasePathways, FetchError>;

    async fn disease_intogen(&self, efo_id: &str) -> Result<DiseaseIntogen, FetchError>;

    async fn evidence_pathways(
        &self,
        ensg_id: &str,
        efo_id: &str,
    ) -> Result<EvidencePathways, FetchError>;

    async fn evidence_intogen(
        &self,
        ensg_id: &str,
        efo_id: &str,
    ) -> Result<EvidenceIntogen, FetchError>;

    async fn drug_indications(&self, chembl_id: &str) -> Result<DrugIndications, FetchError>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub synonyms: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugRecord {
    pub id: String,
    pub name: String,
    pub synonyms: Vec<String>,
    pub trade_names: Vec<String>,
    pub year_of_first_approval: Option<String>,
    #[serde(rename = "type")]
    pub drug_type: String,
    pub maximum_clinical_trial_phase: Option<i32>,
    pub has_been_withdrawn: bool,
    pub withdrawn_notice: Option<WithdrawnNotice>,
    pub internal_compound: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawnNotice {
    pub classes: Option<Vec<String>>,
    pub countries: Vec<String>,
    pub reasons: Option<Vec<String>>,
    pub year: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
}
