//! The inline-or-fetch policy shared by every entity kind.
//!
//! An entity stub always carries its identifier and may carry fields its producer already knew.
//! An inlined field is returned as is. Any other field is projected from the record loaded
//! through the request's loader for that entity kind, so however many fields of the same entity
//! a query selects, the record is fetched once.

use std::sync::Arc;

use serde::Serialize;

use crate::context::Context;
use crate::error::FieldError;
use crate::loader::BatchingLoader;
use crate::resolvers::ObjectResolvers;

/// A stub of an entity kind that has a record behind a loader.
pub(crate) trait Entity: Send + Sync + 'static {
    type Record: Send + Sync + 'static;

    /// The identifier the record is loaded by.
    fn key(&self) -> &str;

    fn loader(context: &Context) -> &BatchingLoader<String, Arc<Self::Record>>;
}

/// Load the record of `stub` through the request's loader.
pub(crate) async fn load<P>(stub: &P, context: &Context) -> Result<Arc<P::Record>, FieldError>
where
    P: Entity,
{
    Ok(P::loader(context).load(stub.key().to_string()).await?)
}

/// Extension methods registering entity fields.
pub(crate) trait EntityResolvers<P>: Sized
where
    P: Entity,
{
    /// `field` is read from the stub when inlined, from the loaded record otherwise.
    fn inline_or_fetch<T>(
        self,
        field: &str,
        inline: fn(&P) -> Option<T>,
        fetched: fn(&P::Record) -> T,
    ) -> Self
    where
        T: Serialize + Send + 'static;

    /// `field` is always read from the loaded record.
    fn fetched<T>(self, field: &str, fetched: fn(&P::Record) -> T) -> Self
    where
        T: Serialize + Send + 'static;
}

impl<P> EntityResolvers<P> for ObjectResolvers<P>
where
    P: Entity,
{
    fn inline_or_fetch<T>(
        self,
        field: &str,
        inline: fn(&P) -> Option<T>,
        fetched: fn(&P::Record) -> T,
    ) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.scalar(field, move |stub: Arc<P>, context: Context| async move {
            if let Some(value) = inline(&stub) {
                return Ok(value);
            }
            let record = load(stub.as_ref(), &context).await?;
            Ok::<_, FieldError>(fetched(&record))
        })
    }

    fn fetched<T>(self, field: &str, fetched: fn(&P::Record) -> T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.scalar(field, move |stub: Arc<P>, context: Context| async move {
            let record = load(stub.as_ref(), &context).await?;
            Ok::<_, FieldError>(fetched(&record))
        })
    }
}
