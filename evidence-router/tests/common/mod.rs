//! A backend serving canned payloads and counting every call it receives.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use evidence_router::Configuration;
use evidence_router::Router;
use evidence_router::backend::DiseaseRecord;
use evidence_router::backend::DrugRecord;
use evidence_router::backend::PlatformApi;
use evidence_router::backend::TargetRecord;
use evidence_router::error::FetchError;
use evidence_router::graphql::Request;
use evidence_router::schema::disease::sections::intogen::DiseaseIntogen;
use evidence_router::schema::disease::sections::pathways::DiseasePathways;
use evidence_router::schema::disease::targets_connection::TargetsConnectionPage;
use evidence_router::schema::disease::targets_connection::TargetsConnectionQuery;
use evidence_router::schema::drug::sections::indications::DrugIndications;
use evidence_router::schema::evidence::sections::intogen::EvidenceIntogen;
use evidence_router::schema::evidence::sections::pathways::EvidencePathways;
use evidence_router::therapeutic_areas::TherapeuticAreas;
use parking_lot::Mutex;

#[derive(Default)]
pub struct CountingBackend {
    pub diseases: HashMap<String, DiseaseRecord>,
    pub drugs: HashMap<String, DrugRecord>,
    pub targets: HashMap<String, TargetRecord>,
    pub disease_pathways: HashMap<String, DiseasePathways>,
    pub disease_intogen: HashMap<String, DiseaseIntogen>,
    pub targets_connection: TargetsConnectionPage,
    pub evidence_pathways: HashMap<(String, String), EvidencePathways>,
    pub drug_indications: HashMap<String, DrugIndications>,
    /// Accessors that fail with `BackendUnavailable`.
    pub unavailable: HashSet<&'static str>,
    /// How long every call takes, so that concurrent callers overlap.
    pub latency: Duration,
    pub(crate) calls: Mutex<Vec<(&'static str, String)>>,
    pub(crate) connection_queries: Mutex<Vec<TargetsConnectionQuery>>,
}

impl CountingBackend {
    /// How many times `service` was called, for any key.
    pub fn calls(&self, service: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(called, _)| *called == service)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn connection_queries(&self) -> Vec<TargetsConnectionQuery> {
        self.connection_queries.lock().clone()
    }

    async fn call(&self, service: &'static str, key: &str) -> Result<(), FetchError> {
        self.calls.lock().push((service, key.to_string()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.unavailable.contains(service) {
            return Err(FetchError::BackendUnavailable {
                service: service.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

fn found<T: Clone>(
    records: &HashMap<String, T>,
    service: &str,
    id: &str,
) -> Result<T, FetchError> {
    records.get(id).cloned().ok_or_else(|| FetchError::NotFound {
        service: service.to_string(),
        id: id.to_string(),
    })
}

#[async_trait]
impl PlatformApi for CountingBackend {
    async fn disease(&self, efo_id: &str) -> Result<DiseaseRecord, FetchError> {
        self.call("disease", efo_id).await?;
        found(&self.diseases, "disease", efo_id)
    }

    async fn drug(&self, chembl_id: &str) -> Result<DrugRecord, FetchError> {
        self.call("drug", chembl_id).await?;
        found(&self.drugs, "drug", chembl_id)
    }

    async fn target(&self, ensg_id: &str) -> Result<TargetRecord, FetchError> {
        self.call("target", ensg_id).await?;
        found(&self.targets, "target", ensg_id)
    }

    async fn disease_targets_connection(
        &self,
        efo_id: &str,
        query: TargetsConnectionQuery,
    ) -> Result<TargetsConnectionPage, FetchError> {
        self.connection_queries.lock().push(query);
        self.call("disease_targets_connection", efo_id).await?;
        Ok(self.targets_connection.clone())
    }

    async fn disease_pathways(&self, efo_id: &str) -> Result<DiseasePathways, FetchError> {
        self.call("disease_pathways", efo_id).await?;
        Ok(self
            .disease_pathways
            .get(efo_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn disease_intogen(&self, efo_id: &str) -> Result<DiseaseIntogen, FetchError> {
        self.call("disease_intogen", efo_id).await?;
        Ok(self.disease_intogen.get(efo_id).cloned().unwrap_or_default())
    }

    async fn evidence_pathways(
        &self,
        ensg_id: &str,
        efo_id: &str,
    ) -> Result<EvidencePathways, FetchError> {
        self.call("evidence_pathways", &format!("{ensg_id}/{efo_id}"))
            .await?;
        Ok(self
            .evidence_pathways
            .get(&(ensg_id.to_string(), efo_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn evidence_intogen(
        &self,
        ensg_id: &str,
        efo_id: &str,
    ) -> Result<EvidenceIntogen, FetchError> {
        self.call("evidence_intogen", &format!("{ensg_id}/{efo_id}"))
            .await?;
        Ok(EvidenceIntogen::default())
    }

    async fn drug_indications(&self, chembl_id: &str) -> Result<DrugIndications, FetchError> {
        self.call("drug_indications", chembl_id).await?;
        Ok(self
            .drug_indications
            .get(chembl_id)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A router over `backend`, with the therapeutic areas of the fixture table.
pub fn router(backend: Arc<CountingBackend>) -> Router {
    router_with(backend, Configuration::default())
}

pub fn router_with(backend: Arc<CountingBackend>, configuration: Configuration) -> Router {
    let areas = TherapeuticAreas::from_file(&fixture("therapeutic_areas.json"))
        .expect("fixture table must load");
    Router::builder()
        .backend(backend as Arc<dyn PlatformApi>)
        .configuration(configuration)
        .therapeutic_areas(areas)
        .build()
        .expect("router must build")
}

/// Execute `query` and return the response as JSON.
pub async fn query(router: &Router, query: &str) -> serde_json::Value {
    let response = router.execute(Request::builder().query(query).build()).await;
    serde_json::to_value(response).expect("responses serialize")
}
