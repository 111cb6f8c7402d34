//! Wizard controller tests against an in-process fake of the `/api/*` boundary

use async_trait::async_trait;
use documind_common::api::{DocumentSummary, IntegrationStatus, OpenTask, SourceType};
use documind_common::{ActionItem, DocType, StructuredDocument, StructuredPayload};
use documind_ui::client::{ClientError, DocumindApi};
use documind_ui::recorder::{AudioRecorder, RecorderError};
use documind_ui::wizard::{Action, AudioClip, Rejection, Step};
use documind_ui::{DispatchError, WizardController};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Fakes
// ============================================================================

/// Calls the controller made, in order
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Transcribe(usize, String),
    Process(String, SourceType),
    Download(String),
}

#[derive(Default)]
struct FakeApi {
    calls: Mutex<Vec<Call>>,
    fail_transcribe: bool,
    fail_process: bool,
    fail_download: bool,
}

impl FakeApi {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn team_sync() -> StructuredDocument {
    StructuredDocument {
        title: "Team Sync".to_string(),
        payload: StructuredPayload::MeetingNotes {
            action_items: vec![ActionItem::open("ship the report", "Alice", "Friday")],
        },
        summary: "Weekly sync.".to_string(),
        artifact_reference: "output/notes.pdf".to_string(),
    }
}

#[async_trait]
impl DocumindApi for FakeApi {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Transcribe(clip.data.len(), clip.content_type));
        if self.fail_transcribe {
            return Err(ClientError::Unavailable {
                fallback: "Transcription failed",
                cause: "connection refused".to_string(),
            });
        }
        Ok("Speaker 0: Alice will ship the report by Friday.".to_string())
    }

    async fn process_text(
        &self,
        text: &str,
        source: SourceType,
    ) -> Result<StructuredDocument, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Process(text.to_string(), source));
        if self.fail_process {
            return Err(ClientError::Api {
                status: 500,
                detail: "Pipeline processing failed: OpenAI API error 429: quota exceeded"
                    .to_string(),
            });
        }
        Ok(team_sync())
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Download(filename.to_string()));
        if self.fail_download {
            return Err(ClientError::Api {
                status: 404,
                detail: "File not found".to_string(),
            });
        }
        Ok(b"%PDF-1.4 fake".to_vec())
    }

    async fn list_documents(
        &self,
        _doc_type: Option<DocType>,
    ) -> Result<Vec<DocumentSummary>, ClientError> {
        Ok(Vec::new())
    }

    async fn open_tasks(&self) -> Result<Vec<OpenTask>, ClientError> {
        Ok(Vec::new())
    }

    async fn integration_status(&self) -> Result<IntegrationStatus, ClientError> {
        Ok(IntegrationStatus::all_error())
    }
}

/// Recorder that hands back a fixed clip
struct FakeRecorder {
    active: bool,
    clip: Vec<u8>,
    deny: bool,
}

impl FakeRecorder {
    fn with_clip(clip: &[u8]) -> Box<Self> {
        Box::new(Self {
            active: false,
            clip: clip.to_vec(),
            deny: false,
        })
    }

    fn denied() -> Box<Self> {
        Box::new(Self {
            active: false,
            clip: Vec::new(),
            deny: true,
        })
    }
}

impl AudioRecorder for FakeRecorder {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.deny {
            return Err(RecorderError::Device("Microphone permission denied".to_string()));
        }
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioClip, RecorderError> {
        if !self.active {
            return Err(RecorderError::NotRecording);
        }
        self.active = false;
        Ok(AudioClip {
            data: self.clip.clone(),
            content_type: "audio/wav".to_string(),
        })
    }

    fn is_recording(&self) -> bool {
        self.active
    }
}

fn controller(
    api: FakeApi,
    recorder: Option<Box<dyn AudioRecorder>>,
) -> (WizardController, Arc<FakeApi>, TempDir) {
    let downloads = TempDir::new().unwrap();
    let api = Arc::new(api);
    let controller =
        WizardController::spawn(api.clone(), recorder, downloads.path().to_path_buf());
    (controller, api, downloads)
}

// ============================================================================
// Text flow
// ============================================================================

#[tokio::test]
async fn test_text_to_download_flow() {
    let (wizard, api, downloads) = controller(FakeApi::default(), None);

    wizard
        .dispatch(Action::SetText("Alice will ship the report by Friday".to_string()))
        .await
        .unwrap();
    let state = wizard.dispatch(Action::SubmitText).await.unwrap();
    assert_eq!(state.step(), Step::Preview);
    assert_eq!(state.document(), Some(&team_sync()));

    let state = wizard.dispatch(Action::Confirm).await.unwrap();
    assert_eq!(state.step(), Step::Result);

    let state = wizard.dispatch(Action::RequestDownload).await.unwrap();
    assert_eq!(state.step(), Step::Result);
    assert!(!state.is_downloading());
    let saved = downloads.path().join("notes.pdf");
    assert_eq!(state.downloaded(), Some(&saved));
    assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.4 fake");

    assert_eq!(
        api.calls(),
        vec![
            Call::Process(
                "Alice will ship the report by Friday".to_string(),
                SourceType::Text
            ),
            Call::Download("notes.pdf".to_string()),
        ]
    );

    let state = wizard.dispatch(Action::CreateAnother).await.unwrap();
    assert_eq!(state.step(), Step::Input);
    assert_eq!(state.text(), "");
    assert!(state.document().is_none());
}

#[tokio::test]
async fn test_processing_failure_returns_to_input_with_detail() {
    let api = FakeApi {
        fail_process: true,
        ..Default::default()
    };
    let (wizard, _api, _downloads) = controller(api, None);

    wizard
        .dispatch(Action::SetText("notes".to_string()))
        .await
        .unwrap();
    let state = wizard.dispatch(Action::SubmitText).await.unwrap();

    assert_eq!(state.step(), Step::Input);
    assert!(state.document().is_none());
    assert_eq!(
        state.error(),
        Some("Pipeline processing failed: OpenAI API error 429: quota exceeded")
    );

    // Still usable after the failure
    let state = wizard
        .dispatch(Action::SetText("other notes".to_string()))
        .await
        .unwrap();
    assert_eq!(state.text(), "other notes");
}

#[tokio::test]
async fn test_blank_text_is_rejected_without_a_call() {
    let (wizard, api, _downloads) = controller(FakeApi::default(), None);

    wizard
        .dispatch(Action::SetText("   ".to_string()))
        .await
        .unwrap();
    let err = wizard.dispatch(Action::SubmitText).await.unwrap_err();

    assert!(matches!(err, DispatchError::Rejected(Rejection::EmptyText)));
    assert_eq!(wizard.current().step(), Step::Input);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_download_failure_stays_on_result() {
    let api = FakeApi {
        fail_download: true,
        ..Default::default()
    };
    let (wizard, _api, downloads) = controller(api, None);

    wizard
        .dispatch(Action::SetText("notes".to_string()))
        .await
        .unwrap();
    wizard.dispatch(Action::SubmitText).await.unwrap();
    wizard.dispatch(Action::Confirm).await.unwrap();
    let state = wizard.dispatch(Action::RequestDownload).await.unwrap();

    assert_eq!(state.step(), Step::Result);
    assert_eq!(state.error(), Some("File not found"));
    assert!(state.downloaded().is_none());
    assert!(!downloads.path().join("notes.pdf").exists());
}

// ============================================================================
// Voice flow
// ============================================================================

#[tokio::test]
async fn test_recording_is_transcribed_into_text() {
    let (wizard, api, _downloads) =
        controller(FakeApi::default(), Some(FakeRecorder::with_clip(b"RIFF....")));

    let state = wizard.dispatch(Action::StartRecording).await.unwrap();
    assert!(state.error().is_none());

    let err = wizard.dispatch(Action::StartRecording).await.unwrap_err();
    assert!(matches!(err, DispatchError::Rejected(Rejection::AlreadyRecording)));

    let state = wizard.dispatch(Action::StopRecording).await.unwrap();
    assert_eq!(state.step(), Step::Input);
    assert_eq!(state.text(), "Speaker 0: Alice will ship the report by Friday.");

    let state = wizard.dispatch(Action::SubmitText).await.unwrap();
    assert_eq!(state.step(), Step::Preview);
    assert_eq!(
        api.calls(),
        vec![
            Call::Transcribe(8, "audio/wav".to_string()),
            Call::Process(
                "Speaker 0: Alice will ship the report by Friday.".to_string(),
                SourceType::Voice
            ),
        ]
    );
}

#[tokio::test]
async fn test_transcription_failure_keeps_text() {
    let api = FakeApi {
        fail_transcribe: true,
        ..Default::default()
    };
    let (wizard, _api, _downloads) = controller(api, Some(FakeRecorder::with_clip(b"RIFF")));

    wizard
        .dispatch(Action::SetText("draft".to_string()))
        .await
        .unwrap();
    wizard.dispatch(Action::StartRecording).await.unwrap();
    let state = wizard.dispatch(Action::StopRecording).await.unwrap();

    assert_eq!(state.step(), Step::Input);
    assert_eq!(state.text(), "draft");
    assert_eq!(state.error(), Some("Transcription failed"));
}

#[tokio::test]
async fn test_denied_microphone_surfaces_error() {
    let (wizard, api, _downloads) = controller(FakeApi::default(), Some(FakeRecorder::denied()));

    let state = wizard.dispatch(Action::StartRecording).await.unwrap();
    assert_eq!(state.step(), Step::Input);
    assert!(state.error().unwrap().contains("Microphone permission denied"));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_empty_recording_is_not_uploaded() {
    let (wizard, api, _downloads) = controller(FakeApi::default(), Some(FakeRecorder::with_clip(b"")));

    wizard.dispatch(Action::StartRecording).await.unwrap();
    let state = wizard.dispatch(Action::StopRecording).await.unwrap();

    assert_eq!(state.error(), Some("The recording is empty."));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_subscribers_see_processing_step() {
    let (wizard, _api, _downloads) = controller(FakeApi::default(), None);
    let mut states = wizard.subscribe();

    wizard
        .dispatch(Action::SetText("notes".to_string()))
        .await
        .unwrap();
    states.mark_unchanged();

    let handle = tokio::spawn({
        let wizard = wizard.clone();
        async move { wizard.dispatch(Action::SubmitText).await.unwrap() }
    });

    let mut seen = Vec::new();
    while seen.last() != Some(&Step::Preview) {
        states.changed().await.unwrap();
        seen.push(states.borrow_and_update().step());
    }
    handle.await.unwrap();

    assert!(seen.contains(&Step::Processing) || seen == vec![Step::Preview]);
    assert_eq!(seen.last(), Some(&Step::Preview));
}
