//! Pipeline assembler
//!
//! Decides the legal audio/video source -> encoder -> writer wiring for a
//! session configuration, constructs the encoder request metadata, and
//! composes the component chain. Configuration-combination problems are
//! rejected before any collaborator resource is acquired; collaborator
//! failures release every partially built component and propagate as typed
//! errors.

use std::os::fd::OwnedFd;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{AudioEncoderKind, OutputFormat, SessionConfig, VideoEncoderKind};
use crate::error::{SessionError, SessionResult};
use crate::media::{
    AmplitudeSource, AudioEncodeRequest, CameraDevice, CaptureChain, EncodeRequest,
    EncodedTrack, MediaEngine, MediaType, PreviewSurface, TrackWriter, VideoEncodeRequest,
};

/// A fully assembled recording pipeline.
///
/// Exists only between a successful assembly and the matching teardown; owns
/// the writer and the chains feeding it. Dropping it releases everything.
pub struct ActivePipeline {
    writer: Box<dyn TrackWriter>,
    amplitude: Option<Arc<dyn AmplitudeSource>>,
    assembled_at: DateTime<Utc>,
}

impl std::fmt::Debug for ActivePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivePipeline")
            .field("has_amplitude", &self.amplitude.is_some())
            .field("assembled_at", &self.assembled_at)
            .finish()
    }
}

impl ActivePipeline {
    fn new(writer: Box<dyn TrackWriter>, amplitude: Option<Arc<dyn AmplitudeSource>>) -> Self {
        Self {
            writer,
            amplitude,
            assembled_at: Utc::now(),
        }
    }

    pub(crate) async fn start(&mut self) {
        self.writer.start().await;
    }

    pub(crate) async fn stop(&mut self) {
        self.writer.stop().await;
    }

    /// Current input amplitude, when the audio chain supports metering
    pub fn max_amplitude(&self) -> Option<i32> {
        self.amplitude.as_ref().map(|probe| probe.max_amplitude())
    }

    /// When this pipeline was assembled
    pub fn assembled_at(&self) -> DateTime<Utc> {
        self.assembled_at
    }
}

/// An audio encode chain plus the probe taken before the source moved into it
struct AudioChain {
    track: Box<dyn EncodedTrack>,
    amplitude: Option<Arc<dyn AmplitudeSource>>,
}

/// Assembles recording pipelines from a media engine's components
pub struct PipelineAssembler {
    engine: Arc<dyn MediaEngine>,
}

impl PipelineAssembler {
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        Self { engine }
    }

    /// Assemble the pipeline for the configured output format.
    ///
    /// `sink` is the writer's own duplicate of the session's output
    /// descriptor; the writer consumes it. `camera` and `preview` are the
    /// session's current bindings, used only by camera-backed video.
    pub async fn assemble(
        &self,
        config: &SessionConfig,
        camera: Option<Arc<dyn CameraDevice>>,
        preview: Option<Arc<dyn PreviewSurface>>,
        sink: OwnedFd,
    ) -> SessionResult<ActivePipeline> {
        match config.output_format {
            OutputFormat::AmrNb | OutputFormat::AmrWb => self.assemble_amr(config, sink).await,
            OutputFormat::ThreeGpp | OutputFormat::Mpeg4 => {
                self.assemble_container(config, camera, preview, sink).await
            }
        }
    }

    /// Raw AMR output: exactly one audio track, no container.
    async fn assemble_amr(
        &self,
        config: &SessionConfig,
        sink: OwnedFd,
    ) -> SessionResult<ActivePipeline> {
        if config.audio_source.is_none() {
            return Err(SessionError::InvalidState(
                "AMR output requires an audio source".to_string(),
            ));
        }
        if config.video_source.is_some() {
            return Err(SessionError::InvalidState(
                "AMR output cannot carry a video track".to_string(),
            ));
        }

        // The encoder must produce the sub-format named by the container.
        match (config.output_format, config.audio_encoder) {
            (OutputFormat::AmrNb, AudioEncoderKind::Default | AudioEncoderKind::AmrNb) => {}
            (OutputFormat::AmrWb, AudioEncoderKind::AmrWb) => {}
            (format, encoder) => {
                return Err(SessionError::IncompatibleEncoder { encoder, format })
            }
        }

        tracing::info!(format = ?config.output_format, "assembling AMR pipeline");

        let chain = self.build_audio_chain(config).await?;
        let mut writer = self.engine.create_writer(config.output_format, sink);
        writer.add_track(chain.track);

        Ok(ActivePipeline::new(writer, chain.amplitude))
    }

    /// Container output: optional audio track first, then camera video.
    async fn assemble_container(
        &self,
        config: &SessionConfig,
        camera: Option<Arc<dyn CameraDevice>>,
        preview: Option<Arc<dyn PreviewSurface>>,
        sink: OwnedFd,
    ) -> SessionResult<ActivePipeline> {
        let wants_audio = config.audio_source.is_some();
        let wants_video = config.video_source.is_some();

        // Cheap legality checks before any component is acquired.
        if wants_audio {
            match config.audio_encoder {
                AudioEncoderKind::AmrNb | AudioEncoderKind::AmrWb | AudioEncoderKind::Aac => {}
                other => return Err(SessionError::UnsupportedEncoder(other)),
            }
        }
        let camera = match (wants_video, camera) {
            (true, Some(camera)) => Some(camera),
            (true, None) => {
                return Err(SessionError::InvalidState(
                    "video recording requires a bound camera".to_string(),
                ))
            }
            (false, _) => None,
        };
        if !wants_audio && !wants_video {
            return Err(SessionError::NoActiveTrack);
        }

        tracing::info!(
            format = ?config.output_format,
            audio = wants_audio,
            video = wants_video,
            "assembling container pipeline"
        );

        let mut writer = self.engine.create_writer(config.output_format, sink);
        let mut amplitude = None;

        if wants_audio {
            let chain = self.build_audio_chain(config).await?;
            amplitude = chain.amplitude;
            writer.add_track(chain.track);
        }

        if let Some(camera) = camera {
            let track = self.build_video_chain(config, camera, preview).await?;
            writer.add_track(track);
        }

        writer.set_interleave_duration(config.interleave_duration_us);
        writer.set_limits(config.max_duration_ms, config.max_filesize_bytes);

        Ok(ActivePipeline::new(writer, amplitude))
    }

    /// Build one audio capture -> encoder chain.
    async fn build_audio_chain(&self, config: &SessionConfig) -> SessionResult<AudioChain> {
        let kind = config.audio_source.ok_or_else(|| {
            SessionError::InvalidState("no audio source configured".to_string())
        })?;

        let source = self
            .engine
            .open_audio_source(kind, config.sample_rate, config.audio_channels)
            .await
            .map_err(SessionError::SourceInitFailed)?;
        source.init_check().map_err(SessionError::SourceInitFailed)?;

        let media_type = match config.audio_encoder {
            AudioEncoderKind::Default | AudioEncoderKind::AmrNb => MediaType::AmrNb,
            AudioEncoderKind::AmrWb => MediaType::AmrWb,
            AudioEncoderKind::Aac => MediaType::Aac,
        };
        let request = EncodeRequest::Audio(AudioEncodeRequest {
            media_type,
            sample_rate: config.sample_rate,
            channel_count: config.audio_channels,
            bit_rate: config.audio_bit_rate,
            max_input_size: source.format().max_input_size,
        });

        // Keep a metering handle before the source moves into the encoder.
        let amplitude = source.amplitude();

        let client = self
            .engine
            .connect_encoder()
            .await
            .map_err(SessionError::EncoderConnectFailed)?;
        let track = client
            .create_encoder(request, CaptureChain::Audio(source))
            .await
            .map_err(SessionError::EncoderCreateFailed)?;

        tracing::debug!(media_type = media_type.mime(), "audio encode chain ready");
        Ok(AudioChain { track, amplitude })
    }

    /// Build one camera-backed video capture -> encoder chain.
    async fn build_video_chain(
        &self,
        config: &SessionConfig,
        camera: Arc<dyn CameraDevice>,
        preview: Option<Arc<dyn PreviewSurface>>,
    ) -> SessionResult<Box<dyn EncodedTrack>> {
        let mut source = self
            .engine
            .open_camera_source(camera)
            .await
            .map_err(SessionError::SourceInitFailed)?;

        if let Some(surface) = preview {
            source.attach_preview(surface);
        }

        // The camera decides the actual capture geometry; the encoder gets
        // the resolved values, not the requested ones.
        let resolved = source.format();

        let media_type = match config.video_encoder {
            VideoEncoderKind::H263 => MediaType::H263,
            VideoEncoderKind::Mpeg4Sp => MediaType::Mpeg4Video,
            VideoEncoderKind::H264 => MediaType::Avc,
        };
        let request = EncodeRequest::Video(VideoEncodeRequest {
            media_type,
            width: resolved.width,
            height: resolved.height,
            frame_rate: config.frame_rate,
            bit_rate: config.video_bit_rate,
        });

        let client = self
            .engine
            .connect_encoder()
            .await
            .map_err(SessionError::EncoderConnectFailed)?;
        let track = client
            .create_encoder(request, CaptureChain::Video(source))
            .await
            .map_err(SessionError::EncoderCreateFailed)?;

        tracing::debug!(media_type = media_type.mime(), "video encode chain ready");
        Ok(track)
    }
}
