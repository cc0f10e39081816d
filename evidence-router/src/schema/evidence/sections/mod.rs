//! The sections of `Evidence`.

use super::EvidenceStub;
use crate::sections::SectionRegistry;

pub mod intogen;
pub mod pathways;

pub(crate) fn registry() -> SectionRegistry<EvidenceStub> {
    SectionRegistry::new("Evidence")
        .register(pathways::Pathways)
        .register(intogen::Intogen)
}
