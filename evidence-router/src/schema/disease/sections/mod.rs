//! The sections of `Disease`.

use super::DiseaseStub;
use crate::sections::SectionRegistry;

pub mod intogen;
pub mod pathways;

pub(crate) fn registry() -> SectionRegistry<DiseaseStub> {
    SectionRegistry::new("Disease")
        .register(pathways::Pathways)
        .register(intogen::Intogen)
}
