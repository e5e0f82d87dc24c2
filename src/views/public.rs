use serde::Deserialize;

use crate::errors::AppError;
use crate::store::DocumentSearch;

pub const MISSING_SEARCH_MESSAGE: &str =
    "Please enter both a document identifier and a sender's name.";

/// Unauthenticated tracking query: `?q=<number or title>&sender=<name>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sender: String,
}

impl PublicQuery {
    /// Both parts are required so the public cannot enumerate documents.
    pub fn validate(&self) -> Result<DocumentSearch, AppError> {
        let term = self.q.trim();
        let sender = self.sender.trim();
        if term.is_empty() || sender.is_empty() {
            return Err(AppError::validation(MISSING_SEARCH_MESSAGE));
        }
        Ok(DocumentSearch { term: term.to_string(), sender: sender.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_both_term_and_sender() {
        let missing_sender = PublicQuery { q: "LGU-2405-1".into(), sender: "   ".into() };
        assert!(matches!(missing_sender.validate(), Err(AppError::Validation(_))));
        let missing_term = PublicQuery { q: String::new(), sender: "Juan".into() };
        assert!(missing_term.validate().is_err());
    }

    #[test]
    fn trims_both_parts() {
        let query = PublicQuery { q: " 2405 ".into(), sender: " juan ".into() };
        let search = query.validate().unwrap();
        assert_eq!(search.term, "2405");
        assert_eq!(search.sender, "juan");
    }
}
