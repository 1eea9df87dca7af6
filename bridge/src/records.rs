use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Commit record. Only the sha is interpreted; the rest is passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// File record together with its pages, exposed under `_pages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileWithPages {
    #[serde(flatten)]
    pub file: Map<String, Value>,
    #[serde(rename = "_pages")]
    pub pages: Vec<Page>,
}

impl FileWithPages {
    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == page_id)
    }
}
