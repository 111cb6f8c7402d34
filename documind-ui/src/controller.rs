//! Wizard controller
//!
//! One task owns the [`WizardState`]. Callers send actions over an mpsc channel;
//! the task applies each one, performs the resulting [`Effect`], feeds the call's
//! completion back in as the next action and publishes every new state on a watch
//! channel. While an effect is in flight nothing else is applied, so a session never
//! has more than one network call outstanding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::client::{DocumindApi, DOWNLOAD_FAILED};
use crate::recorder::AudioRecorder;
use crate::wizard::{Action, Effect, Rejection, WizardState};

/// Pending actions before `dispatch` waits for room
const ACTION_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Wizard controller has stopped")]
    Stopped,
}

struct Command {
    action: Action,
    reply: oneshot::Sender<Result<(), Rejection>>,
}

/// Handle to a running wizard session
#[derive(Clone)]
pub struct WizardController {
    actions: mpsc::Sender<Command>,
    state: watch::Receiver<WizardState>,
}

impl WizardController {
    /// Start the session task
    ///
    /// Without a recorder, starting a recording fails like a denied microphone.
    pub fn spawn(
        api: Arc<dyn DocumindApi>,
        recorder: Option<Box<dyn AudioRecorder>>,
        download_dir: PathBuf,
    ) -> Self {
        let (actions_tx, actions_rx) = mpsc::channel(ACTION_QUEUE_DEPTH);
        let (state_tx, state_rx) = watch::channel(WizardState::default());

        let session = Session {
            state: WizardState::default(),
            api,
            recorder,
            download_dir,
            state_tx,
        };
        tokio::spawn(session.run(actions_rx));

        Self {
            actions: actions_tx,
            state: state_rx,
        }
    }

    /// Apply `action` and every follow-up call it triggers
    ///
    /// Returns the settled state. A rejected action leaves the state untouched.
    pub async fn dispatch(&self, action: Action) -> Result<WizardState, DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.actions
            .send(Command {
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DispatchError::Stopped)?;

        reply_rx.await.map_err(|_| DispatchError::Stopped)??;
        Ok(self.current())
    }

    /// Latest published state
    pub fn current(&self) -> WizardState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<WizardState> {
        self.state.clone()
    }
}

/// The single owner of one wizard session's state
struct Session {
    state: WizardState,
    api: Arc<dyn DocumindApi>,
    recorder: Option<Box<dyn AudioRecorder>>,
    download_dir: PathBuf,
    state_tx: watch::Sender<WizardState>,
}

impl Session {
    async fn run(mut self, mut actions: mpsc::Receiver<Command>) {
        debug!("Wizard session started");
        while let Some(Command { action, reply }) = actions.recv().await {
            let result = self.drive(action).await;
            let _ = reply.send(result);
        }
        if let Some(recorder) = self.recorder.as_mut() {
            if recorder.is_recording() {
                let _ = recorder.stop();
            }
        }
        debug!("Wizard session ended");
    }

    /// Apply an action, then the completion of each effect, until nothing is pending
    async fn drive(&mut self, action: Action) -> Result<(), Rejection> {
        let (state, mut effect) = self.state.apply(action)?;
        self.publish(state);

        while let Some(current) = effect.take() {
            let Some(completion) = self.perform(current).await else {
                break;
            };
            match self.state.apply(completion) {
                Ok((state, next)) => {
                    self.publish(state);
                    effect = next;
                }
                Err(rejection) => {
                    warn!("Dropped call completion: {}", rejection);
                    break;
                }
            }
        }
        Ok(())
    }

    fn publish(&mut self, state: WizardState) {
        debug!(step = %state.step(), error = ?state.error(), "Wizard state");
        self.state = state.clone();
        self.state_tx.send_replace(state);
    }

    /// Carry out one effect, returning the action that reports its outcome
    async fn perform(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::StartCapture => {
                let result = match self.recorder.as_mut() {
                    Some(recorder) => recorder.start().map_err(|e| e.to_string()),
                    None => Err("No audio input is available.".to_string()),
                };
                match result {
                    Ok(()) => None,
                    Err(message) => {
                        warn!("Recording failed to start: {}", message);
                        Some(Action::CaptureFailed(message))
                    }
                }
            }

            Effect::StopCapture => {
                let Some(recorder) = self.recorder.as_mut() else {
                    return Some(Action::CaptureFailed("No audio input is available.".to_string()));
                };
                match recorder.stop() {
                    Ok(clip) if clip.data.is_empty() => {
                        Some(Action::CaptureFailed(Rejection::EmptyAudio.to_string()))
                    }
                    Ok(clip) => Some(Action::SubmitAudio(clip)),
                    Err(e) => {
                        warn!("Recording failed: {}", e);
                        Some(Action::CaptureFailed(e.to_string()))
                    }
                }
            }

            Effect::Transcribe(clip) => {
                info!(bytes = clip.data.len(), "Transcribing voice memo");
                match self.api.transcribe(clip).await {
                    Ok(transcript) => Some(Action::TranscriptionSucceeded(transcript)),
                    Err(e) => {
                        warn!("Transcription failed: {}", e.cause());
                        Some(Action::TranscriptionFailed(e.to_string()))
                    }
                }
            }

            Effect::Structure { text, source } => {
                info!(chars = text.len(), source = source.as_str(), "Processing text");
                match self.api.process_text(&text, source).await {
                    Ok(document) => {
                        info!(doc_type = %document.doc_type(), title = %document.title, "Document ready");
                        Some(Action::StructuringSucceeded(document))
                    }
                    Err(e) => {
                        warn!("Processing failed: {}", e.cause());
                        Some(Action::StructuringFailed(e.to_string()))
                    }
                }
            }

            Effect::Download { filename } => match download(
                self.api.as_ref(),
                &self.download_dir,
                &filename,
            )
            .await
            {
                Ok(path) => {
                    info!(path = %path.display(), "Artifact saved");
                    Some(Action::DownloadSucceeded(path))
                }
                Err(message) => Some(Action::DownloadFailed(message)),
            },
        }
    }
}

/// Fetch an artifact and save it, returning the user-facing message on failure
async fn download(
    api: &dyn DocumindApi,
    download_dir: &Path,
    filename: &str,
) -> Result<PathBuf, String> {
    let bytes = api.download(filename).await.map_err(|e| {
        warn!("Download of {} failed: {}", filename, e.cause());
        e.to_string()
    })?;
    save_artifact(download_dir, filename, &bytes)
        .await
        .map_err(|e| {
            warn!("Saving {} failed: {}", filename, e);
            format!("{}: {}", DOWNLOAD_FAILED, e)
        })
}

/// Write an artifact into `dir` under its own file name
async fn save_artifact(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
