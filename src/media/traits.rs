//! Collaborator capability contracts
//!
//! The capture devices, encoders, and container writers this controller wires
//! together are opaque components behind these traits. The host injects a
//! [`MediaEngine`] implementation; everything else is reached through it.

use std::fmt;
use std::os::fd::OwnedFd;
use std::sync::Arc;

use async_trait::async_trait;

use super::{AudioSourceFormat, EncodeRequest, MediaType, VideoSourceFormat};
use crate::config::{AudioSourceKind, OutputFormat};

/// Opaque handle to a rendering surface a video source can preview into
pub trait PreviewSurface: fmt::Debug + Send + Sync {}

/// A camera device the session may borrow for the duration of a recording
pub trait CameraDevice: Send + Sync {
    /// Attach to the device, taking a client reference. Fails when the device
    /// is gone or held exclusively by another client.
    fn connect(&self) -> anyhow::Result<()>;

    /// Whether the device's preview is currently running
    fn preview_enabled(&self) -> bool;

    /// Stop the device's preview
    fn stop_preview(&self);

    /// Release the device for use by other clients
    fn unlock(&self);
}

/// Best-effort input level probe for a live audio source
pub trait AmplitudeSource: Send + Sync {
    /// Maximum absolute sample amplitude observed since the last call
    fn max_amplitude(&self) -> i32;
}

/// A live audio input producer
pub trait AudioCaptureSource: Send {
    /// Whether the source came up with the requested sampling parameters
    fn init_check(&self) -> anyhow::Result<()>;

    /// Format descriptor of the initialized source
    fn format(&self) -> AudioSourceFormat;

    /// Shared amplitude probe, when the source supports level metering.
    ///
    /// Taken before the source moves into an encoder, so the session can keep
    /// reporting levels while the chain runs.
    fn amplitude(&self) -> Option<Arc<dyn AmplitudeSource>> {
        None
    }
}

/// A live video input producer backed by a camera device
pub trait VideoCaptureSource: Send {
    /// Attach a preview surface the source renders into while capturing
    fn attach_preview(&mut self, surface: Arc<dyn PreviewSurface>);

    /// Format descriptor with the resolved capture geometry
    fn format(&self) -> VideoSourceFormat;
}

/// An upstream capture source handed to an encoder
pub enum CaptureChain {
    Audio(Box<dyn AudioCaptureSource>),
    Video(Box<dyn VideoCaptureSource>),
}

/// Output port of an encoder, consumable as a writer track
pub trait EncodedTrack: Send {
    /// Encoded media type produced on this port
    fn media_type(&self) -> MediaType;
}

/// A connected encoder service client
#[async_trait]
pub trait EncoderClient: Send {
    /// Create an encoder producing encoded output from the upstream source.
    ///
    /// Fails when the service rejects the requested format or metadata.
    async fn create_encoder(
        &self,
        request: EncodeRequest,
        upstream: CaptureChain,
    ) -> anyhow::Result<Box<dyn EncodedTrack>>;
}

/// A container writer serializing encoded tracks to an owned output sink
#[async_trait]
pub trait TrackWriter: Send {
    /// Attach an encoder output as a track
    fn add_track(&mut self, track: Box<dyn EncodedTrack>);

    /// Target time granularity for interleaving tracks in the container.
    ///
    /// Optional capability; writers without interleaving ignore it.
    fn set_interleave_duration(&mut self, _duration_us: u32) {}

    /// Recording limits the writer should enforce on its data path.
    ///
    /// Optional capability; writers without limit tracking ignore it.
    fn set_limits(&mut self, _max_duration_ms: Option<u32>, _max_filesize_bytes: Option<u64>) {}

    /// Start writing. The controller calls this exactly once per pipeline.
    async fn start(&mut self);

    /// Stop writing and finalize the container.
    async fn stop(&mut self);
}

/// Factory seam for the media components a recording session assembles
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Open an audio capture source with the given sampling parameters
    async fn open_audio_source(
        &self,
        kind: AudioSourceKind,
        sample_rate: u32,
        channels: u32,
    ) -> anyhow::Result<Box<dyn AudioCaptureSource>>;

    /// Open a video capture source backed by a bound camera device
    async fn open_camera_source(
        &self,
        camera: Arc<dyn CameraDevice>,
    ) -> anyhow::Result<Box<dyn VideoCaptureSource>>;

    /// Connect to the encoder service
    async fn connect_encoder(&self) -> anyhow::Result<Box<dyn EncoderClient>>;

    /// Construct a writer for the given container format over an owned sink
    fn create_writer(&self, format: OutputFormat, sink: OwnedFd) -> Box<dyn TrackWriter>;
}
