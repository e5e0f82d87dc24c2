use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked document as stored in the `documents` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub department: String,
    #[sqlx(rename = "submitter")]
    pub sender: String,
    pub status: String,
    pub document_number: String,
    pub remarks: Option<String>,
    pub processing_days: i32,
}

/// Editable fields of a document, as submitted by the encoding form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFields {
    pub title: String,
    pub department: String,
    pub sender: String,
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl DocumentFields {
    /// Trim every field; blank remarks become `None`.
    pub fn normalized(&self) -> Self {
        DocumentFields {
            title: self.title.trim().to_string(),
            department: self.department.trim().to_string(),
            sender: self.sender.trim().to_string(),
            status: self.status.trim().to_string(),
            remarks: self
                .remarks
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from),
        }
    }

    /// Check the four required fields. Returns one message per missing field.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut errors = vec![];
        if self.title.trim().is_empty() {
            errors.push("Title is required".to_string());
        }
        if self.department.trim().is_empty() {
            errors.push("Department is required".to_string());
        }
        if self.sender.trim().is_empty() {
            errors.push("Sender is required".to_string());
        }
        if self.status.trim().is_empty() {
            errors.push("Status is required".to_string());
        }
        errors
    }

    pub fn from_document(doc: &Document) -> Self {
        DocumentFields {
            title: doc.title.clone(),
            department: doc.department.clone(),
            sender: doc.sender.clone(),
            status: doc.status.clone(),
            remarks: doc.remarks.clone(),
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    /// True when department, status or remarks differ from the stored document.
    /// Title and sender edits are not meaningful for history.
    pub fn differs_meaningfully(&self, prior: &Document) -> bool {
        let remarks = self.remarks.as_deref().unwrap_or("");
        let prior_remarks = prior.remarks.as_deref().unwrap_or("");
        self.department != prior.department || self.status != prior.status || remarks != prior_remarks
    }
}

/// Insert payload for a new document row.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub fields: DocumentFields,
    pub document_number: String,
    pub processing_days: i32,
}
