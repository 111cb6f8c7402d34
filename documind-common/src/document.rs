//! Document model
//!
//! A generated document carries a structured payload whose shape depends on its
//! document type. The payload is a tagged union keyed by [`DocType`], so a record can
//! never carry both action items and requirements, or the wrong one for its type.
//!
//! Wire shape of the payload (the `structured_data` field of the HTTP boundary):
//! - `meeting_notes` → `{ "actionItems": [{ task, owner, dueDate, status }] }`
//! - `prd` → `{ "requirements": ["..."] }`
//! - `code_docs`, `general` → free-form JSON object

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Classified document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Meeting notes with action items
    MeetingNotes,
    /// Product requirements document
    #[serde(alias = "product_requirements")]
    Prd,
    /// Code documentation
    #[serde(alias = "code_documentation")]
    CodeDocs,
    /// Anything the classifier could not place
    General,
}

impl DocType {
    /// All document types in display order
    pub const ALL: [DocType; 4] = [
        DocType::MeetingNotes,
        DocType::Prd,
        DocType::CodeDocs,
        DocType::General,
    ];

    /// Wire name (`meeting_notes`, `prd`, `code_docs`, `general`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::MeetingNotes => "meeting_notes",
            DocType::Prd => "prd",
            DocType::CodeDocs => "code_docs",
            DocType::General => "general",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            DocType::MeetingNotes => "Meeting Notes",
            DocType::Prd => "PRD",
            DocType::CodeDocs => "Code Docs",
            DocType::General => "General",
        }
    }

    /// Interpret a free-text classifier answer
    ///
    /// Tolerates surrounding quotes, whitespace, trailing punctuation and case.
    /// Anything unrecognised is [`DocType::General`].
    pub fn from_classifier_answer(answer: &str) -> DocType {
        let cleaned = answer
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
            .trim()
            .to_ascii_lowercase();
        cleaned.parse().unwrap_or(DocType::General)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "meeting_notes" => Ok(DocType::MeetingNotes),
            "prd" | "product_requirements" => Ok(DocType::Prd),
            "code_docs" | "code_documentation" => Ok(DocType::CodeDocs),
            "general" => Ok(DocType::General),
            other => Err(Error::InvalidInput(format!("Unknown document type: {}", other))),
        }
    }
}

/// Action item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Open,
    Done,
}

impl TaskStatus {
    /// Read a free-form status; only finished-sounding words count as done
    pub fn from_loose(raw: &str) -> TaskStatus {
        match raw.trim().to_ascii_lowercase().as_str() {
            "done" | "completed" | "complete" | "closed" | "finished" | "resolved" => {
                TaskStatus::Done
            }
            _ => TaskStatus::Open,
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = loose_text(Value::deserialize(deserializer)?);
        Ok(TaskStatus::from_loose(&raw))
    }
}

/// One action item of a meeting-notes document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    /// What has to be done
    #[serde(deserialize_with = "lenient_text")]
    pub task: String,
    /// Who does it (may be empty)
    #[serde(default, deserialize_with = "lenient_text")]
    pub owner: String,
    /// Free-form due date as spoken ("Friday", "2026-10-30")
    #[serde(default, alias = "due_date", deserialize_with = "lenient_text")]
    pub due_date: String,
    /// Open unless stated otherwise
    #[serde(default)]
    pub status: TaskStatus,
}

impl ActionItem {
    pub fn open(task: impl Into<String>, owner: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            owner: owner.into(),
            due_date: due_date.into(),
            status: TaskStatus::Open,
        }
    }
}

/// Language models answer text fields with lists, numbers or `null`
///
/// Lists are joined with ", "; `null` is empty.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(loose_text)
}

fn loose_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(loose_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeetingNotesWire {
    #[serde(default, alias = "action_items")]
    action_items: Vec<ActionItem>,
}

#[derive(Serialize, Deserialize)]
struct PrdWire {
    #[serde(default)]
    requirements: Vec<String>,
}

/// Structured payload, keyed by document type
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredPayload {
    MeetingNotes { action_items: Vec<ActionItem> },
    Prd { requirements: Vec<String> },
    CodeDocs(Map<String, Value>),
    General(Map<String, Value>),
}

impl StructuredPayload {
    /// Document type this payload belongs to
    pub fn doc_type(&self) -> DocType {
        match self {
            StructuredPayload::MeetingNotes { .. } => DocType::MeetingNotes,
            StructuredPayload::Prd { .. } => DocType::Prd,
            StructuredPayload::CodeDocs(_) => DocType::CodeDocs,
            StructuredPayload::General(_) => DocType::General,
        }
    }

    /// Parse the wire form of a payload for the given document type
    pub fn from_value(doc_type: DocType, value: Value) -> Result<Self> {
        match doc_type {
            DocType::MeetingNotes => {
                let wire: MeetingNotesWire = serde_json::from_value(value)
                    .map_err(|e| Error::Payload(format!("meeting_notes: {}", e)))?;
                Ok(StructuredPayload::MeetingNotes {
                    action_items: wire.action_items,
                })
            }
            DocType::Prd => {
                let wire: PrdWire = serde_json::from_value(value)
                    .map_err(|e| Error::Payload(format!("prd: {}", e)))?;
                Ok(StructuredPayload::Prd {
                    requirements: wire.requirements,
                })
            }
            DocType::CodeDocs => Ok(StructuredPayload::CodeDocs(into_object(doc_type, value)?)),
            DocType::General => Ok(StructuredPayload::General(into_object(doc_type, value)?)),
        }
    }

    /// Wire form of the payload
    ///
    /// Exposes only the fields of the variant: `actionItems` for meeting notes,
    /// `requirements` for PRDs.
    pub fn to_value(&self) -> Value {
        match self {
            StructuredPayload::MeetingNotes { action_items } => {
                serde_json::to_value(MeetingNotesWire {
                    action_items: action_items.clone(),
                })
                .unwrap_or(Value::Null)
            }
            StructuredPayload::Prd { requirements } => serde_json::to_value(PrdWire {
                requirements: requirements.clone(),
            })
            .unwrap_or(Value::Null),
            StructuredPayload::CodeDocs(map) | StructuredPayload::General(map) => {
                Value::Object(map.clone())
            }
        }
    }

    /// Action items (empty for every type but meeting notes)
    pub fn action_items(&self) -> &[ActionItem] {
        match self {
            StructuredPayload::MeetingNotes { action_items } => action_items,
            _ => &[],
        }
    }

    /// Requirements (empty for every type but PRDs)
    pub fn requirements(&self) -> &[String] {
        match self {
            StructuredPayload::Prd { requirements } => requirements,
            _ => &[],
        }
    }
}

fn into_object(doc_type: DocType, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(Error::Payload(format!(
            "{}: expected a JSON object, got {}",
            doc_type, other
        ))),
    }
}

/// A classified, structured document with its downloadable artifact
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredDocument {
    pub title: String,
    pub payload: StructuredPayload,
    pub summary: String,
    /// Path or identifier of the generated PDF (e.g. `output/notes.pdf`)
    pub artifact_reference: String,
}

impl StructuredDocument {
    pub fn doc_type(&self) -> DocType {
        self.payload.doc_type()
    }

    /// File name the artifact is downloaded under
    pub fn artifact_filename(&self) -> Option<&str> {
        artifact_filename(&self.artifact_reference)
    }
}

/// Last path segment of an artifact reference
///
/// `output/meeting_notes_1f3a.pdf` → `meeting_notes_1f3a.pdf`. Returns `None` for an
/// empty reference or one ending in a separator.
pub fn artifact_filename(reference: &str) -> Option<&str> {
    reference
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .filter(|name| !name.is_empty())
}
