//! Sanity content-store client
//!
//! Generated documents are stored as `generatedDocument` records through the mutate
//! API. The record content is a tagged union keyed by `docType`: `actionItems` only
//! for meeting notes, `requirements` only for PRDs, a JSON string of the payload for
//! free-form types. Listings use GROQ.

use async_trait::async_trait;
use chrono::Utc;
use documind_common::api::{DocumentSummary, OpenTask};
use documind_common::{ActionItem, DocType, StructuredPayload, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{http_client, DocumentStore, PdfArtifact, ServiceError, StructuredContent};

const SERVICE: &str = "Sanity";
const RECORD_TYPE: &str = "generatedDocument";

const LIST_PROJECTION: &str =
    r#"{ _id, title, "doc_type": docType, "_createdAt": coalesce(createdAt, _createdAt), summary }"#;

const OPEN_TASKS_QUERY: &str = r#"*[_type == "generatedDocument" && docType == "meeting_notes" && count(actionItems[status == "open"]) > 0] | order(createdAt desc) { _id, title, "tasks": actionItems[status == "open"] }"#;

/// One `generatedDocument` record as written by the mutate API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocumentRecord<'a> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub record_type: &'static str,
    pub title: &'a str,
    pub created_at: String,
    pub summary: &'a str,
    #[serde(flatten)]
    pub content: RecordContent<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<Value>,
}

/// Type-specific fields, tagged by `docType`
#[derive(Debug, Serialize)]
#[serde(tag = "docType", rename_all = "snake_case")]
pub enum RecordContent<'a> {
    MeetingNotes {
        #[serde(rename = "actionItems")]
        action_items: Vec<KeyedActionItem<'a>>,
    },
    Prd {
        requirements: &'a [String],
    },
    CodeDocs {
        #[serde(rename = "structuredContent")]
        structured_content: String,
    },
    General {
        #[serde(rename = "structuredContent")]
        structured_content: String,
    },
}

/// Array members in Sanity carry a `_key`
#[derive(Debug, Serialize)]
pub struct KeyedActionItem<'a> {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(flatten)]
    pub item: &'a ActionItem,
}

impl<'a> GeneratedDocumentRecord<'a> {
    pub fn new(content: &'a StructuredContent, pdf_asset_id: Option<&str>) -> Self {
        let record_content = match &content.payload {
            StructuredPayload::MeetingNotes { action_items } => RecordContent::MeetingNotes {
                action_items: action_items
                    .iter()
                    .map(|item| KeyedActionItem {
                        key: short_key(),
                        item,
                    })
                    .collect(),
            },
            StructuredPayload::Prd { requirements } => RecordContent::Prd { requirements },
            StructuredPayload::CodeDocs(_) => RecordContent::CodeDocs {
                structured_content: content.payload.to_value().to_string(),
            },
            StructuredPayload::General(_) => RecordContent::General {
                structured_content: content.payload.to_value().to_string(),
            },
        };

        Self {
            id: Uuid::new_v4().to_string(),
            record_type: RECORD_TYPE,
            title: &content.title,
            created_at: Utc::now().to_rfc3339(),
            summary: &content.summary,
            content: record_content,
            pdf_file: pdf_asset_id.map(|id| {
                json!({
                    "_type": "file",
                    "asset": {"_type": "reference", "_ref": id}
                })
            }),
        }
    }
}

fn short_key() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    document: AssetDocument,
}

#[derive(Debug, Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct TaskRow {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    tasks: Option<Vec<ActionItem>>,
}

/// Flatten per-document task rows into open tasks, keeping row order
fn flatten_open_tasks(rows: Vec<TaskRow>) -> Vec<OpenTask> {
    rows.into_iter()
        .flat_map(|row| {
            let title = row.title.unwrap_or_default();
            let id = row.id;
            row.tasks
                .unwrap_or_default()
                .into_iter()
                .filter(|item| item.status == TaskStatus::Open)
                .map(move |item| OpenTask {
                    document_id: id.clone(),
                    document_title: title.clone(),
                    item,
                })
        })
        .collect()
}

/// Sanity API client
pub struct SanityClient {
    http_client: reqwest::Client,
    /// `https://<project>.api.sanity.io/<version>`
    api_root: String,
    dataset: String,
    token: String,
}

impl SanityClient {
    pub fn new(api_root: String, dataset: String, token: String) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: http_client(SERVICE)?,
            api_root: api_root.trim_end_matches('/').to_string(),
            dataset,
            token,
        })
    }

    /// Upload the PDF as a file asset, returning the asset id
    async fn upload_pdf(&self, pdf: PdfArtifact<'_>) -> Result<String, ServiceError> {
        let url = format!("{}/assets/files/{}", self.api_root, self.dataset);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .query(&[("filename", pdf.filename)])
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(pdf.bytes.to_vec())
            .send()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let asset: AssetResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::parse(SERVICE, e))?;
        Ok(asset.document.id)
    }

    async fn query<T>(&self, groq: &str, params: &[(&str, String)]) -> Result<Vec<T>, ServiceError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/data/query/{}", self.api_root, self.dataset);
        let mut query: Vec<(&str, String)> = vec![("query", groq.to_string())];
        query.extend(params.iter().cloned());

        tracing::debug!(groq = %groq, "Running GROQ query");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let body: QueryResponse<T> = response
            .json()
            .await
            .map_err(|e| ServiceError::parse(SERVICE, e))?;
        Ok(body.result)
    }
}

#[async_trait]
impl DocumentStore for SanityClient {
    async fn save(
        &self,
        content: &StructuredContent,
        pdf: Option<PdfArtifact<'_>>,
    ) -> Result<Option<String>, ServiceError> {
        let asset_id = match pdf {
            Some(pdf) => match self.upload_pdf(pdf).await {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(error = %e, "PDF asset upload failed, saving record without it");
                    None
                }
            },
            None => None,
        };

        let record = GeneratedDocumentRecord::new(content, asset_id.as_deref());
        let url = format!("{}/data/mutate/{}", self.api_root, self.dataset);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "mutations": [{ "create": &record }] }))
            .send()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        tracing::info!(id = %record.id, doc_type = %content.doc_type(), "Saved document to Sanity");
        Ok(Some(record.id))
    }

    async fn list(&self, doc_type: Option<DocType>) -> Result<Vec<DocumentSummary>, ServiceError> {
        match doc_type {
            Some(doc_type) => {
                let groq = format!(
                    r#"*[_type == "{}" && docType == $docType] | order(createdAt desc) {}"#,
                    RECORD_TYPE, LIST_PROJECTION
                );
                // GROQ parameters are JSON-encoded
                let param = Value::String(doc_type.as_str().to_string()).to_string();
                self.query(&groq, &[("$docType", param)]).await
            }
            None => {
                let groq = format!(
                    r#"*[_type == "{}"] | order(createdAt desc) {}"#,
                    RECORD_TYPE, LIST_PROJECTION
                );
                self.query(&groq, &[]).await
            }
        }
    }

    async fn open_tasks(&self) -> Result<Vec<OpenTask>, ServiceError> {
        let rows: Vec<TaskRow> = self.query(OPEN_TASKS_QUERY, &[]).await?;
        Ok(flatten_open_tasks(rows))
    }
}
