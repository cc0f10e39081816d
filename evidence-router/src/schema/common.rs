//! Types shared by several entity kinds.

use serde::Deserialize;
use serde::Serialize;

pub(crate) const TYPE_DEFS: &str = r#"type Source {
  name: String!
  url: String!
}

type ReactomePathway {
  id: String!
  name: String!
}
"#;

/// Where a piece of evidence comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Static `(name, url)` pairs as [`Source`]s.
pub(crate) fn sources(list: &[(&str, &str)]) -> Vec<Source> {
    list.iter().map(|(name, url)| Source::new(*name, *url)).collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactomePathway {
    pub id: String,
    pub name: String,
}

/// A disease as referenced from a row of evidence: enough to build a stub without a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRef {
    pub id: String,
    pub name: String,
}
