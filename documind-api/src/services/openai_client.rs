//! OpenAI chat-completions client
//!
//! Two calls per document: a zero-temperature classification of the first 1000
//! characters, then a JSON-mode structuring call whose reply is normalized into the
//! tagged payload of the classified type.

use async_trait::async_trait;
use documind_common::{DocType, StructuredPayload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{http_client, ServiceError, StructuredContent, Structurer};

const SERVICE: &str = "OpenAI";

/// Characters of input the classifier sees
pub const CLASSIFY_PREFIX_CHARS: usize = 1000;

pub const UNTITLED: &str = "Untitled Document";

const CLASSIFIER_PROMPT: &str = "You are a classifier. Output ONLY one of these strings: \
'meeting_notes', 'prd', 'code_docs'. If unsure, 'general'.";

const STRUCTURING_PROMPT: &str = r#"You are DocuMind, an expert technical writer and document structurer.
Transform the user's raw input into a structured JSON object for the given DOCUMENT TYPE.

RULES:
1. Clean up the language to be professional and concise.
2. Output ONLY valid JSON. No markdown fencing, no commentary.

JSON STRUCTURE:
{
  "title": "Inferred Title",
  "summary": "Two or three sentence summary",
  "content": { fields specific to the document type }
}

FIELDS BY DOCUMENT TYPE:
- meeting_notes: attendees (list), action_items (list of {task, owner, due_date, status: "open"}), key_decisions (list).
- prd: overview, problem_statement, goals (list), user_stories (list), requirements (list of strings).
- code_docs: module_name, description, classes (list), functions (list with params/returns), usage_example.
- general: free-form sections as key/value pairs."#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// OpenAI API client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: http_client(SERVICE)?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, ServiceError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::parse(SERVICE, e))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Empty("Language model returned no content.".to_string()))
    }
}

#[async_trait]
impl Structurer for OpenAiClient {
    async fn classify(&self, text: &str) -> Result<DocType, ServiceError> {
        let prefix: String = text.chars().take(CLASSIFY_PREFIX_CHARS).collect();
        let answer = self
            .complete(ChatRequest {
                model: &self.model,
                messages: vec![
                    ChatMessage::new("system", CLASSIFIER_PROMPT.to_string()),
                    ChatMessage::new("user", format!("Classify this text:\n\n{}", prefix)),
                ],
                temperature: 0.0,
                response_format: None,
            })
            .await?;

        let doc_type = DocType::from_classifier_answer(&answer);
        tracing::debug!(answer = %answer.trim(), doc_type = %doc_type, "Classifier answered");
        Ok(doc_type)
    }

    async fn structure(
        &self,
        text: &str,
        doc_type: DocType,
    ) -> Result<StructuredContent, ServiceError> {
        let reply = self
            .complete(ChatRequest {
                model: &self.model,
                messages: vec![
                    ChatMessage::new("system", STRUCTURING_PROMPT.to_string()),
                    ChatMessage::new(
                        "user",
                        format!("DOCUMENT TYPE: {}\n\nINPUT TEXT:\n{}", doc_type, text),
                    ),
                ],
                temperature: 0.1,
                response_format: Some(json!({"type": "json_object"})),
            })
            .await?;

        let value: Value = serde_json::from_str(&reply).map_err(|e| ServiceError::parse(SERVICE, e))?;
        normalize_structured(doc_type, value)
    }
}

/// Normalize a structuring reply into the payload of `doc_type`
///
/// Accepts both the nested `{title, summary, content: {...}}` shape and a flat object,
/// snake_case or camelCase field names, and missing statuses.
pub fn normalize_structured(
    doc_type: DocType,
    reply: Value,
) -> Result<StructuredContent, ServiceError> {
    let mut root = match reply {
        Value::Object(map) => map,
        other => {
            return Err(ServiceError::parse(
                SERVICE,
                format!("expected a JSON object, got {}", other),
            ))
        }
    };

    let mut content = match root.remove("content") {
        Some(Value::Object(map)) => map,
        _ => {
            let mut flat = root.clone();
            flat.remove("title");
            flat.remove("summary");
            flat
        }
    };
    content.remove("doc_type");

    let title = take_string(&mut root, "title")
        .or_else(|| take_string(&mut content, "title"))
        .unwrap_or_else(|| UNTITLED.to_string());
    let summary = take_string(&mut root, "summary")
        .or_else(|| take_string(&mut content, "summary"))
        .or_else(|| string_field(&content, "overview"))
        .or_else(|| string_field(&content, "description"))
        .unwrap_or_default();

    let (wire, extra_sections) = match doc_type {
        DocType::MeetingNotes => {
            let wire = json!({ "actionItems": action_items(&content) });
            (wire, leftover(content, &["action_items", "actionItems"], &summary))
        }
        DocType::Prd => {
            let wire = json!({ "requirements": requirements(&content) });
            let keys = ["requirements", "functional_requirements", "non_functional_requirements"];
            (wire, leftover(content, &keys, &summary))
        }
        DocType::CodeDocs | DocType::General => (Value::Object(content), Map::new()),
    };

    let payload =
        StructuredPayload::from_value(doc_type, wire).map_err(|e| ServiceError::parse(SERVICE, e))?;

    Ok(StructuredContent {
        title,
        summary,
        payload,
        extra_sections,
    })
}

/// Sections outside the payload, minus the one already used as the summary
fn leftover(mut content: Map<String, Value>, payload_keys: &[&str], summary: &str) -> Map<String, Value> {
    for key in payload_keys {
        content.remove(*key);
    }
    content.retain(|_, value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty() && s.trim() != summary,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    });
    content
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Action items with a task; everything else is dropped
fn action_items(content: &Map<String, Value>) -> Vec<Value> {
    content
        .get("action_items")
        .or_else(|| content.get("actionItems"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item.get("task")
                        .and_then(Value::as_str)
                        .map_or(false, |task| !task.trim().is_empty())
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// `requirements`, or the functional and non-functional lists combined
fn requirements(content: &Map<String, Value>) -> Vec<String> {
    let lists: Vec<&Value> = match content.get("requirements") {
        Some(list) => vec![list],
        None => ["functional_requirements", "non_functional_requirements"]
            .iter()
            .filter_map(|key| content.get(*key))
            .collect(),
    };

    lists
        .into_iter()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|entry| match entry {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(obj) => ["description", "requirement", "text", "title"]
                .iter()
                .find_map(|key| string_field(obj, key)),
            _ => None,
        })
        .collect()
}
