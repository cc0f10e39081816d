//! The entry point of the library: a composed schema bound to a backend.

use std::fmt;
use std::sync::Arc;

use crate::backend::PlatformApi;
use crate::configuration::Configuration;
use crate::context::Context;
use crate::error::ConfigurationError;
use crate::execution;
use crate::graphql::Request;
use crate::graphql::Response;
use crate::schema::ComposedSchema;
use crate::therapeutic_areas::TherapeuticAreas;

/// Serves GraphQL requests against the composed evidence schema.
///
/// Everything a `Router` holds is read-only and shared by all requests. Each call to
/// [`Router::execute`] gets a fresh [`Context`], so loaders and their memoized records never
/// outlive the request that filled them.
#[derive(Clone)]
pub struct Router {
    schema: Arc<ComposedSchema>,
    backend: Arc<dyn PlatformApi>,
    therapeutic_areas: Arc<TherapeuticAreas>,
    configuration: Arc<Configuration>,
}

#[buildstructor::buildstructor]
impl Router {
    /// Returns a builder for a router.
    ///
    /// * `.backend(..)` required.
    /// * `.configuration(..)` optional, defaults to [`Configuration::default`].
    /// * `.therapeutic_areas(..)` optional. When absent the table is read from the file named by
    ///   the configuration, or is empty if none is configured.
    ///
    /// Fails if the schema does not compose or the therapeutic area table cannot be read.
    #[builder(visibility = "pub")]
    fn new(
        backend: Arc<dyn PlatformApi>,
        configuration: Option<Configuration>,
        therapeutic_areas: Option<TherapeuticAreas>,
    ) -> Result<Self, ConfigurationError> {
        let configuration = configuration.unwrap_or_default();
        let therapeutic_areas = match (therapeutic_areas, &configuration.therapeutic_areas) {
            (Some(table), _) => table,
            (None, Some(path)) => TherapeuticAreas::from_file(path)?,
            (None, None) => TherapeuticAreas::default(),
        };
        let schema = ComposedSchema::compose()?;
        tracing::info!(
            therapeutic_areas = therapeutic_areas.len(),
            "router is ready"
        );
        Ok(Self {
            schema: Arc::new(schema),
            backend,
            therapeutic_areas: Arc::new(therapeutic_areas),
            configuration: Arc::new(configuration),
        })
    }

    /// A fresh request context, with empty loaders.
    pub fn context(&self) -> Context {
        Context::new(
            self.backend.clone(),
            self.therapeutic_areas.clone(),
            self.configuration.connection,
        )
    }

    /// Execute one request.
    ///
    /// Field failures are reported in the response next to the data that did resolve; only
    /// requests that cannot be executed at all have no data.
    pub async fn execute(&self, request: Request) -> Response {
        let context = self.context();
        execution::execute(&self.schema, &context, &request).await
    }

    pub fn schema(&self) -> &ComposedSchema {
        &self.schema
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("configuration", &self.configuration)
            .field("therapeutic_areas", &self.therapeutic_areas.len())
            .finish_non_exhaustive()
    }
}
