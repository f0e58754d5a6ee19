//! Content payload validation.
//!
//! Lessons and modules carry a block document produced by the rich-content
//! editor; exams carry a typed question list; materials carry a stored file.
//! Only structural well-formedness is checked here, never block semantics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Editor format version stamped on documents created server-side.
pub const EDITOR_FORMAT_VERSION: &str = "2.29.0";

/// Minimum number of answer options per exam question.
pub const MIN_QUESTION_OPTIONS: usize = 2;

pub const MATERIAL_PDF: &str = "pdf";
pub const MATERIAL_VIDEO: &str = "video";
pub const MATERIAL_AUDIO: &str = "audio";
pub const MATERIAL_NOTE: &str = "note";

/// All valid material types.
pub const VALID_MATERIAL_TYPES: &[&str] = &[MATERIAL_PDF, MATERIAL_VIDEO, MATERIAL_AUDIO, MATERIAL_NOTE];

/// All valid lesson resource types.
pub const VALID_RESOURCE_TYPES: &[&str] = &["pdf", "video", "audio", "document", "other"];

// ---------------------------------------------------------------------------
// Block documents
// ---------------------------------------------------------------------------

/// An empty block document.
pub fn empty_document() -> Value {
    serde_json::json!({
        "time": chrono::Utc::now().timestamp_millis(),
        "blocks": [],
        "version": EDITOR_FORMAT_VERSION,
    })
}

/// Parse and validate a block document.
///
/// Accepts either a JSON object or a string containing one. The document must
/// have a `blocks` array whose entries are objects with a non-empty string
/// `type`.
pub fn parse_document(raw: &Value) -> Result<Value, CoreError> {
    let doc = match raw {
        Value::String(text) => serde_json::from_str::<Value>(text).map_err(|_| {
            CoreError::Validation("Invalid content format. Must be valid editor JSON".into())
        })?,
        other => other.clone(),
    };

    let blocks = doc
        .get("blocks")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::Validation("Content must have a valid blocks array".into()))?;

    for (index, block) in blocks.iter().enumerate() {
        let has_type = block
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.trim().is_empty());
        if !has_type {
            return Err(CoreError::Validation(format!(
                "Content block {index} must be an object with a string 'type'"
            )));
        }
    }

    Ok(doc)
}

/// Number of blocks in a stored document (0 when malformed).
pub fn block_count(doc: &Value) -> usize {
    doc.get("blocks")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

// ---------------------------------------------------------------------------
// Exam questions
// ---------------------------------------------------------------------------

/// A multiple-choice exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    #[serde(alias = "question")]
    pub question_text: String,
    pub options: Vec<String>,
    #[serde(alias = "correct_answer_indices")]
    pub correct_option_indices: Vec<usize>,
}

/// Validate every question in an exam.
pub fn validate_questions(questions: &[ExamQuestion]) -> Result<(), CoreError> {
    for (n, q) in questions.iter().enumerate() {
        let number = n + 1;
        if q.question_text.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Question {number} must have text"
            )));
        }
        if q.options.len() < MIN_QUESTION_OPTIONS {
            return Err(CoreError::Validation(format!(
                "Question {number} must have at least {MIN_QUESTION_OPTIONS} options"
            )));
        }
        if q.correct_option_indices.is_empty() {
            return Err(CoreError::Validation(format!(
                "Question {number} must mark at least one correct option"
            )));
        }
        if let Some(bad) = q
            .correct_option_indices
            .iter()
            .find(|&&i| i >= q.options.len())
        {
            return Err(CoreError::Validation(format!(
                "Question {number} has correct option index {bad} out of range"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Materials and resources
// ---------------------------------------------------------------------------

/// Validate a material type and resolve its category.
///
/// When no category is given it is derived from the type; notes are filed
/// under `pdf`.
pub fn material_category(material_type: &str, category: Option<&str>) -> Result<String, CoreError> {
    let material_type = material_type.to_ascii_lowercase();
    if !VALID_MATERIAL_TYPES.contains(&material_type.as_str()) {
        return Err(CoreError::Validation(format!(
            "Invalid material type '{material_type}'. Must be one of: {}",
            VALID_MATERIAL_TYPES.join(", ")
        )));
    }
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => Ok(c.to_ascii_lowercase()),
        None if material_type == MATERIAL_NOTE => Ok(MATERIAL_PDF.to_string()),
        None => Ok(material_type),
    }
}

/// Validate a lesson resource type, defaulting to `other`.
pub fn resource_type(raw: Option<&str>) -> Result<String, CoreError> {
    let value = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("other")
        .to_ascii_lowercase();
    if VALID_RESOURCE_TYPES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid resource type '{value}'. Must be one of: {}",
            VALID_RESOURCE_TYPES.join(", ")
        )))
    }
}
