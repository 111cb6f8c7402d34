//! Voice memo capture
//!
//! Recording is a single exclusive resource: one [`AudioRecorder`] per wizard
//! session, started and stopped by the controller in response to
//! [`Effect::StartCapture`](crate::wizard::Effect::StartCapture) and
//! [`Effect::StopCapture`](crate::wizard::Effect::StopCapture).

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::wizard::AudioClip;

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneRecorder;

/// Capture errors
///
/// These surface in the wizard like any integration error.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording is in progress")]
    NotRecording,

    #[error("Audio file not found: {0}")]
    NotFound(PathBuf),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio encoding error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive capture resource
pub trait AudioRecorder: Send {
    /// Begin capturing
    fn start(&mut self) -> Result<(), RecorderError>;

    /// Stop capturing and finalize the clip
    fn stop(&mut self) -> Result<AudioClip, RecorderError>;

    fn is_recording(&self) -> bool;
}

/// MIME type for an audio file, by extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Plays back a voice memo that already exists on disk
///
/// `start` checks the file is there; `stop` reads it as the finished clip.
#[derive(Debug, Clone)]
pub struct FileRecorder {
    path: PathBuf,
    active: bool,
}

impl FileRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioRecorder for FileRecorder {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.active {
            return Err(RecorderError::AlreadyRecording);
        }
        if !self.path.is_file() {
            return Err(RecorderError::NotFound(self.path.clone()));
        }
        self.active = true;
        debug!(path = %self.path.display(), "Recording from file");
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioClip, RecorderError> {
        if !self.active {
            return Err(RecorderError::NotRecording);
        }
        self.active = false;
        let data = std::fs::read(&self.path)?;
        Ok(AudioClip {
            content_type: content_type_for(&self.path).to_string(),
            data,
        })
    }

    fn is_recording(&self) -> bool {
        self.active
    }
}

#[cfg(feature = "microphone")]
mod microphone {
    //! Live capture from the default input device
    //!
    //! `cpal::Stream` is not `Send`, so the stream lives on a dedicated thread for the
    //! whole recording. The thread reports whether the device opened, waits for the
    //! stop signal, then hands back the samples encoded as 16-bit PCM WAV.

    use std::io::Cursor;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tracing::{info, warn};

    use super::{AudioRecorder, RecorderError};
    use crate::wizard::AudioClip;

    type Samples = Arc<Mutex<Vec<i16>>>;

    struct Session {
        stop_tx: mpsc::Sender<()>,
        handle: JoinHandle<Result<Vec<u8>, RecorderError>>,
    }

    /// Microphone capture encoded to WAV
    #[derive(Default)]
    pub struct MicrophoneRecorder {
        session: Option<Session>,
    }

    impl MicrophoneRecorder {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl AudioRecorder for MicrophoneRecorder {
        fn start(&mut self) -> Result<(), RecorderError> {
            if self.session.is_some() {
                return Err(RecorderError::AlreadyRecording);
            }

            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            let (ready_tx, ready_rx) = mpsc::channel::<Result<(), RecorderError>>();

            let handle = std::thread::Builder::new()
                .name("documind-capture".to_string())
                .spawn(move || {
                    let (stream, spec, samples) = match open_input() {
                        Ok(parts) => parts,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return Ok(Vec::new());
                        }
                    };
                    let _ = ready_tx.send(Ok(()));

                    // Sender dropped counts as stop
                    let _ = stop_rx.recv();
                    drop(stream);

                    let samples = samples
                        .lock()
                        .map(|buf| buf.clone())
                        .map_err(|_| RecorderError::Device("sample buffer poisoned".to_string()))?;
                    encode_wav(spec, &samples)
                })?;

            match ready_rx.recv() {
                Ok(Ok(())) => {
                    info!("Microphone recording started");
                    self.session = Some(Session { stop_tx, handle });
                    Ok(())
                }
                Ok(Err(e)) => {
                    let _ = handle.join();
                    Err(e)
                }
                Err(_) => Err(RecorderError::Device(
                    "capture thread exited before the device opened".to_string(),
                )),
            }
        }

        fn stop(&mut self) -> Result<AudioClip, RecorderError> {
            let session = self.session.take().ok_or(RecorderError::NotRecording)?;
            let _ = session.stop_tx.send(());
            let data = session
                .handle
                .join()
                .map_err(|_| RecorderError::Device("capture thread panicked".to_string()))??;
            info!(bytes = data.len(), "Microphone recording finished");
            Ok(AudioClip {
                data,
                content_type: "audio/wav".to_string(),
            })
        }

        fn is_recording(&self) -> bool {
            self.session.is_some()
        }
    }

    /// Open the default input device at its native config
    fn open_input() -> Result<(cpal::Stream, hound::WavSpec, Samples), RecorderError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| RecorderError::Device("no input device available".to_string()))?;
        let config = device
            .default_input_config()
            .map_err(|e| RecorderError::Device(format!("input config: {}", e)))?;

        let spec = hound::WavSpec {
            channels: config.channels(),
            sample_rate: config.sample_rate().0,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let samples: Samples = Arc::new(Mutex::new(Vec::new()));
        let stream_config: cpal::StreamConfig = config.clone().into();
        let on_error = |err| warn!("Audio stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::I16 => {
                let buffer = Arc::clone(&samples);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend_from_slice(data);
                        }
                    },
                    on_error,
                    None,
                )
            }
            cpal::SampleFormat::F32 => {
                let buffer = Arc::clone(&samples);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend(
                                data.iter()
                                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                            );
                        }
                    },
                    on_error,
                    None,
                )
            }
            other => {
                return Err(RecorderError::Device(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| RecorderError::Device(format!("open input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| RecorderError::Device(format!("start input stream: {}", e)))?;

        Ok((stream, spec, samples))
    }

    pub(super) fn encode_wav(spec: hound::WavSpec, samples: &[i16]) -> Result<Vec<u8>, RecorderError> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| RecorderError::Encode(e.to_string()))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| RecorderError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| RecorderError::Encode(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
