//! Serves the biomedical evidence graph: diseases, drugs, targets and the evidence linking them.
//!
//! Entity kinds are assembled from independent sections, each contributing a summary and a
//! detail type that are composed into `...Summaries` and `...Details` umbrella types. Entity
//! fields are fetched lazily through request-scoped loaders that issue at most one backend call
//! per entity per request.

pub mod backend;
pub mod configuration;
mod context;
pub mod error;
mod executable;
mod execution;
pub mod graphql;
pub mod json_ext;
pub mod loader;
mod request;
pub mod resolvers;
mod response;
mod router;
pub mod schema;
pub mod sections;
pub mod therapeutic_areas;

pub use configuration::Configuration;
pub use context::Context;
pub use executable::main;
pub use router::Router;
