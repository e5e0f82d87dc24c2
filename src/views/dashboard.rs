use serde::{Deserialize, Serialize};

use crate::models::Document;

const APPROVED: &[&str] = &["approved", "completed"];
const PENDING: &[&str] = &["reviewing", "submitted", "in process", "forwarded"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub other: usize,
}

impl DashboardStats {
    /// Status names are compared case-insensitively.
    pub fn compute(documents: &[Document]) -> Self {
        let total = documents.len();
        let (mut approved, mut pending) = (0, 0);
        for doc in documents {
            let status = doc.status.to_lowercase();
            if APPROVED.contains(&status.as_str()) {
                approved += 1;
            } else if PENDING.contains(&status.as_str()) {
                pending += 1;
            }
        }
        DashboardStats { total, approved, pending, other: total - approved - pending }
    }
}

/// Dashboard list filters. Empty values and the `All` department match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardFilter {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default, rename = "q")]
    pub search: Option<String>,
}

impl DashboardFilter {
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(department) = self.department.as_deref().filter(|d| !d.is_empty() && *d != "All") {
            if doc.department != department {
                return false;
            }
        }
        if let Some(sender) = non_blank(self.sender.as_deref()) {
            if !doc.sender.to_lowercase().contains(&sender) {
                return false;
            }
        }
        if let Some(term) = non_blank(self.search.as_deref()) {
            let in_title = doc.title.to_lowercase().contains(&term);
            let in_number = doc.document_number.to_lowercase().contains(&term);
            if !in_title && !in_number {
                return false;
            }
        }
        true
    }

    /// Keeps the input order (newest first, as listed by the store).
    pub fn apply(&self, documents: &[Document]) -> Vec<Document> {
        documents.iter().filter(|d| self.matches(d)).cloned().collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_lowercase)
}
