//! Request types

use serde::{Deserialize, Serialize};

/// Question about the active case document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    pub question: String,
}

impl AskRequest {
    /// Trimmed question, or `None` when nothing but whitespace was sent
    pub fn normalized(&self) -> Option<&str> {
        let q = self.question.trim();
        (!q.is_empty()).then_some(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_question_is_rejected() {
        let req: AskRequest = serde_json::from_str(r#"{"question": " \t\n"}"#).unwrap();
        assert!(req.normalized().is_none());

        let req = AskRequest {
            question: "  What was Q3 revenue growth? ".to_string(),
        };
        assert_eq!(req.normalized(), Some("What was Q3 revenue growth?"));
    }
}
