//! Provide a [`Context`] for the resolvers of one request.
//!
//! The context exclusively owns the request's loaders. Resolvers get a cheap clone for the
//! duration of their execution. Nothing in it outlives the request, so no record is ever
//! served to a different request.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use crate::backend::DiseaseRecord;
use crate::backend::DrugRecord;
use crate::backend::PlatformApi;
use crate::backend::TargetRecord;
use crate::configuration::ConnectionSettings;
use crate::error::FetchError;
use crate::loader::BatchingLoader;
use crate::schema::disease::sections::intogen::DiseaseIntogen;
use crate::schema::disease::sections::pathways::DiseasePathways;
use crate::schema::drug::sections::indications::DrugIndications;
use crate::schema::evidence::sections::intogen::EvidenceIntogen;
use crate::schema::evidence::sections::pathways::EvidencePathways;
use crate::therapeutic_areas::TherapeuticAreas;

/// Evidence payloads are keyed by `(ensg_id, efo_id)`.
pub type EvidenceKey = (String, String);

/// Request-scoped state handed to every resolver.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn PlatformApi>,
    therapeutic_areas: Arc<TherapeuticAreas>,
    connection: ConnectionSettings,
    diseases: BatchingLoader<String, Arc<DiseaseRecord>>,
    drugs: BatchingLoader<String, Arc<DrugRecord>>,
    targets: BatchingLoader<String, Arc<TargetRecord>>,
    disease_pathways: BatchingLoader<String, Arc<DiseasePathways>>,
    disease_intogen: BatchingLoader<String, Arc<DiseaseIntogen>>,
    drug_indications: BatchingLoader<String, Arc<DrugIndications>>,
    evidence_pathways: BatchingLoader<EvidenceKey, Arc<EvidencePathways>>,
    evidence_intogen: BatchingLoader<EvidenceKey, Arc<EvidenceIntogen>>,
}

/// A loader calling one backend accessor.
fn loader<K, V, F, Fut>(
    name: &'static str,
    backend: &Arc<dyn PlatformApi>,
    fetch: F,
) -> BatchingLoader<K, Arc<V>>
where
    K: Clone + fmt::Debug + Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    F: Fn(Arc<dyn PlatformApi>, K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
{
    let backend = backend.clone();
    BatchingLoader::new(name, move |key: K| {
        let fetched = fetch(backend.clone(), key);
        async move { fetched.await.map(Arc::new) }
    })
}

impl Context {
    /// Create the context of a new request, with empty loaders.
    pub fn new(
        backend: Arc<dyn PlatformApi>,
        therapeutic_areas: Arc<TherapeuticAreas>,
        connection: ConnectionSettings,
    ) -> Self {
        let diseases = loader("disease", &backend, |backend, efo_id: String| async move {
            backend.disease(&efo_id).await
        });
        let drugs = loader("drug", &backend, |backend, chembl_id: String| async move {
            backend.drug(&chembl_id).await
        });
        let targets = loader("target", &backend, |backend, ensg_id: String| async move {
            backend.target(&ensg_id).await
        });
        let disease_pathways = loader(
            "disease_pathways",
            &backend,
            |backend, efo_id: String| async move { backend.disease_pathways(&efo_id).await },
        );
        let disease_intogen = loader(
            "disease_intogen",
            &backend,
            |backend, efo_id: String| async move { backend.disease_intogen(&efo_id).await },
        );
        let drug_indications = loader(
            "drug_indications",
            &backend,
            |backend, chembl_id: String| async move { backend.drug_indications(&chembl_id).await },
        );
        let evidence_pathways = loader(
            "evidence_pathways",
            &backend,
            |backend, (ensg_id, efo_id): EvidenceKey| async move {
                backend.evidence_pathways(&ensg_id, &efo_id).await
            },
        );
        let evidence_intogen = loader(
            "evidence_intogen",
            &backend,
            |backend, (ensg_id, efo_id): EvidenceKey| async move {
                backend.evidence_intogen(&ensg_id, &efo_id).await
            },
        );

        Context {
            inner: Arc::new(Inner {
                backend,
                therapeutic_areas,
                connection,
                diseases,
                drugs,
                targets,
                disease_pathways,
                disease_intogen,
                drug_indications,
                evidence_pathways,
                evidence_intogen,
            }),
        }
    }

    /// The backend accessors, for calls that do not go through a loader.
    pub fn backend(&self) -> &dyn PlatformApi {
        self.inner.backend.as_ref()
    }

    pub fn therapeutic_areas(&self) -> &TherapeuticAreas {
        &self.inner.therapeutic_areas
    }

    pub fn connection(&self) -> &ConnectionSettings {
        &self.inner.connection
    }

    pub fn diseases(&self) -> &BatchingLoader<String, Arc<DiseaseRecord>> {
        &self.inner.diseases
    }

    pub fn drugs(&self) -> &BatchingLoader<String, Arc<DrugRecord>> {
        &self.inner.drugs
    }

    pub fn targets(&self) -> &BatchingLoader<String, Arc<TargetRecord>> {
        &self.inner.targets
    }

    /// Section payloads, shared by the summary and the detail of a section.
    pub fn disease_pathways(&self) -> &BatchingLoader<String, Arc<DiseasePathways>> {
        &self.inner.disease_pathways
    }

    pub fn disease_intogen(&self) -> &BatchingLoader<String, Arc<DiseaseIntogen>> {
        &self.inner.disease_intogen
    }

    pub fn drug_indications(&self) -> &BatchingLoader<String, Arc<DrugIndications>> {
        &self.inner.drug_indications
    }

    pub fn evidence_pathways(&self) -> &BatchingLoader<EvidenceKey, Arc<EvidencePathways>> {
        &self.inner.evidence_pathways
    }

    pub fn evidence_intogen(&self) -> &BatchingLoader<EvidenceKey, Arc<EvidenceIntogen>> {
        &self.inner.evidence_intogen
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("connection", &self.inner.connection)
            .finish_non_exhaustive()
    }
}
