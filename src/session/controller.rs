//! Session controller
//!
//! Orchestrates one recording session: configuration setters with state
//! guards, camera and output-sink ownership, and the
//! prepare/start/stop/reset/close lifecycle.

use std::os::fd::BorrowedFd;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::state::{SessionEvent, SessionState};
use crate::config::{
    apply_parameters, AudioEncoderKind, AudioSourceKind, OutputFormat, SessionConfig,
    VideoEncoderKind, VideoSourceKind,
};
use crate::error::{SessionError, SessionResult};
use crate::media::{CameraDevice, MediaEngine, PreviewSurface};
use crate::pipeline::{ActivePipeline, PipelineAssembler};

/// Association with a borrowed camera device.
///
/// The flags only exist while the binding does; releasing the binding drops
/// them with it.
struct CameraBinding {
    device: Arc<dyn CameraDevice>,

    /// The caller handed us this device via `set_camera`
    explicitly_bound: bool,

    /// The device's preview was already running when we bound it
    was_hot_at_bind: bool,
}

/// Drives a single recording session.
///
/// Not designed for concurrent mutation: callers serialize configuration and
/// lifecycle calls externally. The collaborators may run their own worker
/// threads once started.
pub struct SessionController {
    /// Session id, for log correlation
    id: Uuid,

    /// Current lifecycle state
    state: Arc<RwLock<SessionState>>,

    /// Recording parameters, owned exclusively by this session
    config: SessionConfig,

    /// Optional camera association
    camera: Option<CameraBinding>,

    /// Optional preview surface for camera-backed video
    preview_surface: Option<Arc<dyn PreviewSurface>>,

    /// Pipeline factory over the injected media engine
    assembler: PipelineAssembler,

    /// Live pipeline; exists only while recording
    active: Option<ActivePipeline>,

    /// Event broadcaster
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Create a new idle session over the given media engine
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let id = Uuid::new_v4();
        tracing::info!(session = %id, "created recording session");
        Self {
            id,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            config: SessionConfig::default(),
            camera: None,
            preview_surface: None,
            assembler: PipelineAssembler::new(engine),
            active: None,
            event_tx,
        }
    }

    /// Session id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Current configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    fn ensure_configurable(&self) -> SessionResult<()> {
        if self.state().accepts_configuration() {
            Ok(())
        } else {
            Err(SessionError::InvalidState(
                "configuration is frozen while recording".to_string(),
            ))
        }
    }

    fn mark_configured(&self) {
        let mut state = self.state.write();
        if *state == SessionState::Idle {
            *state = SessionState::Configured;
        }
    }

    /// Select the audio capture source
    pub fn set_audio_source(&mut self, kind: AudioSourceKind) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.audio_source = Some(kind);
        self.mark_configured();
        Ok(())
    }

    /// Select the video capture source
    pub fn set_video_source(&mut self, kind: VideoSourceKind) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.video_source = Some(kind);
        self.mark_configured();
        Ok(())
    }

    /// Select the output container format
    pub fn set_output_format(&mut self, format: OutputFormat) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.output_format = format;
        self.mark_configured();
        Ok(())
    }

    /// Select the audio encoder
    pub fn set_audio_encoder(&mut self, encoder: AudioEncoderKind) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.audio_encoder = encoder;
        self.mark_configured();
        Ok(())
    }

    /// Select the video encoder
    pub fn set_video_encoder(&mut self, encoder: VideoEncoderKind) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.video_encoder = encoder;
        self.mark_configured();
        Ok(())
    }

    /// Set the requested capture geometry
    pub fn set_video_size(&mut self, width: u32, height: u32) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.set_video_size(width, height)?;
        self.mark_configured();
        Ok(())
    }

    /// Set the video frame rate
    pub fn set_video_frame_rate(&mut self, frames_per_second: u32) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.set_video_frame_rate(frames_per_second)?;
        self.mark_configured();
        Ok(())
    }

    /// Apply a `key1=value1;key2=value2;...` parameter batch.
    ///
    /// Pairs are applied in order up to the first failure; there is no
    /// rollback of the applied prefix.
    pub fn set_parameters(&mut self, text: &str) -> SessionResult<()> {
        self.ensure_configurable()?;
        apply_parameters(&mut self.config, text)?;
        self.mark_configured();
        Ok(())
    }

    /// Bind a camera device for the video track.
    ///
    /// Records whether the device's preview was already running, so that
    /// `close()` can leave a hot preview untouched.
    pub fn set_camera(&mut self, device: Arc<dyn CameraDevice>) -> SessionResult<()> {
        self.ensure_configurable()?;
        device.connect().map_err(|source| {
            SessionError::InvalidArgument(format!("could not attach camera: {source}"))
        })?;

        let was_hot_at_bind = device.preview_enabled();
        if was_hot_at_bind {
            tracing::debug!(session = %self.id, "camera preview already running at bind");
        }
        self.camera = Some(CameraBinding {
            device,
            explicitly_bound: true,
            was_hot_at_bind,
        });
        self.mark_configured();
        Ok(())
    }

    /// Attach a preview surface for camera-backed video
    pub fn set_preview_surface(&mut self, surface: Arc<dyn PreviewSurface>) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.preview_surface = Some(surface);
        self.mark_configured();
        Ok(())
    }

    /// Take ownership of a duplicate of the caller's output descriptor.
    ///
    /// Byte-range output is unsupported: offset and length must be zero.
    /// Replacing a previously set sink closes the prior duplicate.
    pub fn set_output_sink(
        &mut self,
        fd: BorrowedFd<'_>,
        offset: i64,
        length: i64,
    ) -> SessionResult<()> {
        self.ensure_configurable()?;
        self.config.set_output_sink(fd, offset, length)?;
        self.mark_configured();
        Ok(())
    }

    /// Validate that the session can move toward recording. No resources are
    /// acquired here; assembly happens in `start()`.
    pub fn prepare(&self) -> SessionResult<()> {
        self.ensure_configurable()
    }

    /// Assemble the pipeline for the configured output format and start it.
    ///
    /// On failure the session keeps its configuration and prior state; no
    /// partially built pipeline is retained.
    pub async fn start(&mut self) -> SessionResult<()> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyRecording);
        }
        match self.state() {
            SessionState::Recording => return Err(SessionError::AlreadyRecording),
            SessionState::Idle => {
                return Err(SessionError::InvalidState(
                    "session has no configuration".to_string(),
                ))
            }
            SessionState::Configured | SessionState::Stopped => {}
        }

        let sink = self.config.duplicate_sink()?;
        let camera = self.camera.as_ref().map(|binding| Arc::clone(&binding.device));
        let preview = self.preview_surface.clone();

        tracing::info!(
            session = %self.id,
            format = ?self.config.output_format,
            "starting recording"
        );

        let mut pipeline = match self
            .assembler
            .assemble(&self.config, camera, preview, sink)
            .await
        {
            Ok(pipeline) => pipeline,
            Err(error) => {
                tracing::warn!(session = %self.id, %error, "pipeline assembly failed");
                let _ = self.event_tx.send(SessionEvent::Error {
                    message: error.to_string(),
                });
                return Err(error);
            }
        };

        pipeline.start().await;
        self.active = Some(pipeline);
        *self.state.write() = SessionState::Recording;
        let _ = self.event_tx.send(SessionEvent::Started);

        tracing::info!(session = %self.id, "recording started");
        Ok(())
    }

    /// Stop the active pipeline and retain the configuration
    pub async fn stop(&mut self) -> SessionResult<()> {
        let Some(mut pipeline) = self.active.take() else {
            return Err(SessionError::NotRecording);
        };

        tracing::info!(session = %self.id, "stopping recording");
        pipeline.stop().await;
        *self.state.write() = SessionState::Stopped;
        let _ = self.event_tx.send(SessionEvent::Stopped);
        Ok(())
    }

    /// Tear everything down and restore the default configuration.
    ///
    /// Closes the output sink, drops the camera binding and its flags, and
    /// returns the session to `Idle`. Idempotent.
    pub async fn reset(&mut self) {
        if let Some(mut pipeline) = self.active.take() {
            tracing::info!(session = %self.id, "reset while recording, tearing down pipeline");
            pipeline.stop().await;
        }
        self.config = SessionConfig::default();
        self.camera = None;
        self.preview_surface = None;
        *self.state.write() = SessionState::Idle;
        tracing::debug!(session = %self.id, "session reset to defaults");
    }

    /// Stop if recording, then release the camera binding.
    ///
    /// A preview that was already running when the camera was bound is left
    /// running; a preview this session caused is stopped. An explicitly bound
    /// device is unlocked for other clients.
    pub async fn close(&mut self) -> SessionResult<()> {
        match self.stop().await {
            Ok(()) | Err(SessionError::NotRecording) => {}
            Err(other) => return Err(other),
        }

        if let Some(binding) = self.camera.take() {
            if !binding.was_hot_at_bind {
                tracing::debug!(session = %self.id, "camera was cold at bind, stopping preview");
                binding.device.stop_preview();
            }
            if binding.explicitly_bound {
                tracing::debug!(session = %self.id, "unlocking camera");
                binding.device.unlock();
            }
        }
        Ok(())
    }

    /// Best-effort current input amplitude for the active audio source.
    ///
    /// Returns 0 when idle or when the source does not support metering.
    pub fn max_amplitude(&self) -> i32 {
        self.active
            .as_ref()
            .and_then(|pipeline| pipeline.max_amplitude())
            .unwrap_or(0)
    }

    /// When the active pipeline came up, if one is running
    pub fn recording_since(&self) -> Option<DateTime<Utc>> {
        self.active.as_ref().map(|pipeline| pipeline.assembled_at())
    }
}
