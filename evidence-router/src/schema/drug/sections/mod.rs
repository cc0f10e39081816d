//! The sections of `Drug`.

use super::DrugStub;
use crate::sections::SectionRegistry;

pub mod indications;

pub(crate) fn registry() -> SectionRegistry<DrugStub> {
    SectionRegistry::new("Drug").register(indications::Indications)
}
