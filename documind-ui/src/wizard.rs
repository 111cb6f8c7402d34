//! Document generation wizard state machine
//!
//! input → processing → preview → result
//!
//! [`WizardState::apply`] is a pure transition function: it never performs I/O. An
//! accepted action yields the next state plus, optionally, an [`Effect`] describing
//! the single call the controller must perform; the call's completion comes back in
//! as the next action. A rejected action leaves the state untouched.
//!
//! The structured document is present exactly while the wizard is in `preview` or
//! `result`, and the recording sub-state only exists in `input`.

use std::fmt;
use std::path::PathBuf;

use documind_common::api::SourceType;
use documind_common::StructuredDocument;
use thiserror::Error;

pub use documind_common::artifact_filename;

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Input,
    Processing,
    Preview,
    Result,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Input => "input",
            Step::Processing => "processing",
            Step::Preview => "preview",
            Step::Result => "result",
        })
    }
}

/// How the user provides raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Text,
    Voice,
}

/// Recording sub-state of the input step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recording {
    #[default]
    Idle,
    Active,
}

/// Which call the processing step is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Transcription,
    Structuring,
}

/// A finalized voice recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Vec<u8>,
    /// MIME type, e.g. `audio/wav`
    pub content_type: String,
}

/// User actions and call completions
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectMode(InputMode),
    SetText(String),
    StartRecording,
    StopRecording,
    /// The capture device failed (includes permission denial)
    CaptureFailed(String),
    SubmitAudio(AudioClip),
    SubmitText,
    TranscriptionSucceeded(String),
    TranscriptionFailed(String),
    StructuringSucceeded(StructuredDocument),
    StructuringFailed(String),
    Confirm,
    RequestDownload,
    /// The artifact was saved at this path
    DownloadSucceeded(PathBuf),
    DownloadFailed(String),
    CreateAnother,
    Reset,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SelectMode(_) => "select mode",
            Action::SetText(_) => "edit text",
            Action::StartRecording => "start recording",
            Action::StopRecording => "stop recording",
            Action::CaptureFailed(_) => "capture failure",
            Action::SubmitAudio(_) => "submit audio",
            Action::SubmitText => "submit text",
            Action::TranscriptionSucceeded(_) => "transcription result",
            Action::TranscriptionFailed(_) => "transcription failure",
            Action::StructuringSucceeded(_) => "structuring result",
            Action::StructuringFailed(_) => "structuring failure",
            Action::Confirm => "confirm",
            Action::RequestDownload => "download",
            Action::DownloadSucceeded(_) => "download result",
            Action::DownloadFailed(_) => "download failure",
            Action::CreateAnother => "create another",
            Action::Reset => "reset",
        }
    }
}

/// I/O the controller performs on behalf of the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartCapture,
    StopCapture,
    Transcribe(AudioClip),
    Structure { text: String, source: SourceType },
    Download { filename: String },
}

/// A user-input error: the action is refused and no call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please enter some text first.")]
    EmptyText,

    #[error("Stop the recording before submitting.")]
    RecordingInProgress,

    #[error("A recording is already in progress.")]
    AlreadyRecording,

    #[error("No recording is in progress.")]
    NotRecording,

    #[error("The recording is empty.")]
    EmptyAudio,

    #[error("This document has no downloadable artifact.")]
    NoArtifact,

    #[error("A download is already in progress.")]
    DownloadInProgress,

    #[error("Cannot {action} during the {step} step.")]
    InvalidTransition { action: &'static str, step: Step },
}

/// Complete wizard state
///
/// Fields are private; the only way to change them is [`WizardState::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    step: Step,
    mode: InputMode,
    text: String,
    recording: Recording,
    pending: Option<Pending>,
    document: Option<StructuredDocument>,
    error: Option<String>,
    downloading: bool,
    downloaded: Option<PathBuf>,
}

impl WizardState {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Raw text (typed, or filled in by transcription)
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn recording(&self) -> Recording {
        self.recording
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    /// Structured result; `Some` only in preview and result
    pub fn document(&self) -> Option<&StructuredDocument> {
        self.document.as_ref()
    }

    /// Last integration error, shown inline
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    /// Where the last download was saved
    pub fn downloaded(&self) -> Option<&PathBuf> {
        self.downloaded.as_ref()
    }

    /// Submitting text is possible right now
    pub fn can_submit_text(&self) -> bool {
        self.step == Step::Input
            && self.recording == Recording::Idle
            && !self.text.trim().is_empty()
    }

    /// Apply one action
    pub fn apply(&self, action: Action) -> Result<(WizardState, Option<Effect>), Rejection> {
        let invalid = |action: &Action| Rejection::InvalidTransition {
            action: action.name(),
            step: self.step,
        };
        let mut next = self.clone();

        let effect = match (self.step, action) {
            (_, Action::Reset) => return Ok((WizardState::default(), None)),

            // ---- input ----
            (Step::Input, Action::SelectMode(mode)) => {
                if self.recording == Recording::Active {
                    return Err(Rejection::RecordingInProgress);
                }
                next.mode = mode;
                None
            }
            (Step::Input, Action::SetText(text)) => {
                next.text = text;
                None
            }
            (Step::Input, Action::StartRecording) => {
                if self.recording == Recording::Active {
                    return Err(Rejection::AlreadyRecording);
                }
                next.mode = InputMode::Voice;
                next.recording = Recording::Active;
                next.error = None;
                Some(Effect::StartCapture)
            }
            (Step::Input, Action::StopRecording) => {
                if self.recording != Recording::Active {
                    return Err(Rejection::NotRecording);
                }
                next.recording = Recording::Idle;
                Some(Effect::StopCapture)
            }
            (Step::Input, Action::CaptureFailed(message)) => {
                next.recording = Recording::Idle;
                next.error = Some(message);
                None
            }
            (Step::Input, Action::SubmitAudio(clip)) => {
                if self.recording == Recording::Active {
                    return Err(Rejection::RecordingInProgress);
                }
                if clip.data.is_empty() {
                    return Err(Rejection::EmptyAudio);
                }
                next.step = Step::Processing;
                next.pending = Some(Pending::Transcription);
                next.error = None;
                Some(Effect::Transcribe(clip))
            }
            (Step::Input, Action::SubmitText) => {
                if self.recording == Recording::Active {
                    return Err(Rejection::RecordingInProgress);
                }
                if self.text.trim().is_empty() {
                    return Err(Rejection::EmptyText);
                }
                next.step = Step::Processing;
                next.pending = Some(Pending::Structuring);
                next.error = None;
                let source = match self.mode {
                    InputMode::Text => SourceType::Text,
                    InputMode::Voice => SourceType::Voice,
                };
                Some(Effect::Structure {
                    text: self.text.clone(),
                    source,
                })
            }

            // ---- processing ----
            (Step::Processing, Action::TranscriptionSucceeded(transcript))
                if self.pending == Some(Pending::Transcription) =>
            {
                next.step = Step::Input;
                next.pending = None;
                next.text = transcript;
                None
            }
            (Step::Processing, Action::TranscriptionFailed(message))
                if self.pending == Some(Pending::Transcription) =>
            {
                next.step = Step::Input;
                next.pending = None;
                next.error = Some(message);
                None
            }
            (Step::Processing, Action::StructuringSucceeded(document))
                if self.pending == Some(Pending::Structuring) =>
            {
                next.step = Step::Preview;
                next.pending = None;
                next.document = Some(document);
                None
            }
            (Step::Processing, Action::StructuringFailed(message))
                if self.pending == Some(Pending::Structuring) =>
            {
                next.step = Step::Input;
                next.pending = None;
                next.document = None;
                next.error = Some(message);
                None
            }

            // ---- preview ----
            (Step::Preview, Action::Confirm) => {
                next.step = Step::Result;
                None
            }

            // ---- result ----
            (Step::Result, Action::RequestDownload) => {
                if self.downloading {
                    return Err(Rejection::DownloadInProgress);
                }
                let filename = self
                    .document
                    .as_ref()
                    .and_then(|doc| doc.artifact_filename())
                    .ok_or(Rejection::NoArtifact)?
                    .to_string();
                next.downloading = true;
                next.error = None;
                Some(Effect::Download { filename })
            }
            (Step::Result, Action::DownloadSucceeded(path)) if self.downloading => {
                next.downloading = false;
                next.downloaded = Some(path);
                None
            }
            (Step::Result, Action::DownloadFailed(message)) if self.downloading => {
                next.downloading = false;
                next.error = Some(message);
                None
            }
            (Step::Result, Action::CreateAnother) => {
                return Ok((WizardState::default(), None));
            }

            (_, action) => return Err(invalid(&action)),
        };

        Ok((next, effect))
    }
}

/// Pretty-printed JSON of the structured payload
///
/// Only the fields of the payload's variant appear: `actionItems` for meeting notes,
/// `requirements` for PRDs.
pub fn render_preview(document: &StructuredDocument) -> String {
    let value = document.payload.to_value();
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
