//! The process-wide disease → therapeutic area table.
//!
//! Loaded once at startup and shared read-only by every request.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;

/// A therapeutic area as listed in the table: enough to build a disease stub without a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TherapeuticArea {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TherapeuticAreas(HashMap<String, Vec<TherapeuticArea>>);

impl TherapeuticAreas {
    pub fn new(areas: HashMap<String, Vec<TherapeuticArea>>) -> Self {
        Self(areas)
    }

    /// Read the table from a JSON file of the form `{ "<efoId>": [{ "id": .., "name": .. }] }`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let display = path.display().to_string();
        let contents =
            std::fs::read_to_string(path).map_err(|error| ConfigurationError::CannotReadFile {
                path: display.clone(),
                error,
            })?;
        let table: Self = serde_json::from_str(&contents).map_err(|error| {
            ConfigurationError::DeserializeTherapeuticAreas {
                path: display.clone(),
                error,
            }
        })?;
        tracing::info!(path = %path.display(), diseases = table.len(), "loaded therapeutic areas");
        Ok(table)
    }

    /// The therapeutic areas of a disease. A disease missing from the table has none.
    pub fn for_disease(&self, efo_id: &str) -> &[TherapeuticArea] {
        self.0.get(efo_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn unknown_diseases_have_no_therapeutic_areas() {
        let table = TherapeuticAreas::default();
        assert!(table.for_disease("EFO_0000305").is_empty());
    }

    #[test]
    fn reads_the_table_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"EFO_0000305": [{{"id": "MONDO_0045024", "name": "cell proliferation disorder"}}]}}"#
        )
        .unwrap();

        let table = TherapeuticAreas::from_file(file.path()).unwrap();
        assert_eq!(
            table.for_disease("EFO_0000305"),
            &[TherapeuticArea {
                id: "MONDO_0045024".to_string(),
                name: "cell proliferation disorder".to_string(),
            }]
        );
    }

    #[test]
    fn a_malformed_table_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let error = TherapeuticAreas::from_file(file.path()).unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::DeserializeTherapeuticAreas { .. }
        ));
    }
}
