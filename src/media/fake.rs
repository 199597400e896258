//! Scriptable fake collaborators for pipeline and session tests
//!
//! Each fake can be told to fail at a specific step, and the shared
//! [`WriterProbe`] records everything the controller did to the writer so
//! tests can assert on track order, capability calls, and lifecycle.

use std::os::fd::OwnedFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::traits::{
    AmplitudeSource, AudioCaptureSource, CameraDevice, CaptureChain, EncodedTrack,
    EncoderClient, MediaEngine, PreviewSurface, TrackWriter, VideoCaptureSource,
};
use super::{AudioSourceFormat, EncodeRequest, MediaType, VideoSourceFormat};
use crate::config::{AudioSourceKind, OutputFormat};

/// Everything a fake writer saw, for assertions
#[derive(Debug, Clone, Default)]
pub struct WriterLog {
    pub format: Option<OutputFormat>,
    pub tracks: Vec<MediaType>,
    pub interleave_us: Option<u32>,
    pub max_duration_ms: Option<u32>,
    pub max_filesize_bytes: Option<u64>,
    pub started: bool,
    pub stopped: bool,
}

/// Shared handle onto a fake writer's log
#[derive(Debug, Clone, Default)]
pub struct WriterProbe {
    inner: Arc<Mutex<WriterLog>>,
}

impl WriterProbe {
    pub fn snapshot(&self) -> WriterLog {
        self.inner.lock().clone()
    }
}

struct FakeWriter {
    probe: WriterProbe,
}

#[async_trait]
impl TrackWriter for FakeWriter {
    fn add_track(&mut self, track: Box<dyn EncodedTrack>) {
        self.probe.inner.lock().tracks.push(track.media_type());
    }

    fn set_interleave_duration(&mut self, duration_us: u32) {
        self.probe.inner.lock().interleave_us = Some(duration_us);
    }

    fn set_limits(&mut self, max_duration_ms: Option<u32>, max_filesize_bytes: Option<u64>) {
        let mut log = self.probe.inner.lock();
        log.max_duration_ms = max_duration_ms;
        log.max_filesize_bytes = max_filesize_bytes;
    }

    async fn start(&mut self) {
        self.probe.inner.lock().started = true;
    }

    async fn stop(&mut self) {
        self.probe.inner.lock().stopped = true;
    }
}

struct FixedAmplitude(i32);

impl AmplitudeSource for FixedAmplitude {
    fn max_amplitude(&self) -> i32 {
        self.0
    }
}

struct FakeAudioSource {
    fail_init: bool,
    amplitude: Option<i32>,
}

impl AudioCaptureSource for FakeAudioSource {
    fn init_check(&self) -> anyhow::Result<()> {
        if self.fail_init {
            Err(anyhow!("unsupported sampling parameters"))
        } else {
            Ok(())
        }
    }

    fn format(&self) -> AudioSourceFormat {
        AudioSourceFormat {
            max_input_size: Some(8192),
        }
    }

    fn amplitude(&self) -> Option<Arc<dyn AmplitudeSource>> {
        self.amplitude
            .map(|level| Arc::new(FixedAmplitude(level)) as Arc<dyn AmplitudeSource>)
    }
}

struct FakeVideoSource {
    preview_attached: Arc<AtomicBool>,
}

impl VideoCaptureSource for FakeVideoSource {
    fn attach_preview(&mut self, _surface: Arc<dyn PreviewSurface>) {
        self.preview_attached.store(true, Ordering::SeqCst);
    }

    fn format(&self) -> VideoSourceFormat {
        // Deliberately different from any configured geometry, so tests can
        // tell resolved-from-source apart from requested-by-config.
        VideoSourceFormat {
            width: 320,
            height: 240,
        }
    }
}

struct FakeTrack {
    media_type: MediaType,
}

impl EncodedTrack for FakeTrack {
    fn media_type(&self) -> MediaType {
        self.media_type
    }
}

struct FakeEncoderClient {
    fail_create: bool,
    requests: Arc<Mutex<Vec<EncodeRequest>>>,
}

#[async_trait]
impl EncoderClient for FakeEncoderClient {
    async fn create_encoder(
        &self,
        request: EncodeRequest,
        _upstream: CaptureChain,
    ) -> anyhow::Result<Box<dyn EncodedTrack>> {
        if self.fail_create {
            return Err(anyhow!("format rejected"));
        }
        let media_type = request.media_type();
        self.requests.lock().push(request);
        Ok(Box::new(FakeTrack { media_type }))
    }
}

/// A camera device whose observable side effects are recorded in atomics
#[derive(Default)]
pub struct FakeCamera {
    pub connect_fails: bool,
    pub preview_on: AtomicBool,
    pub preview_stopped: AtomicBool,
    pub unlocked: AtomicBool,
}

impl FakeCamera {
    /// A camera whose preview is already running
    pub fn hot() -> Arc<Self> {
        let camera = Self::default();
        camera.preview_on.store(true, Ordering::SeqCst);
        Arc::new(camera)
    }

    /// A camera whose preview is off
    pub fn cold() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn preview_was_stopped(&self) -> bool {
        self.preview_stopped.load(Ordering::SeqCst)
    }

    pub fn was_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }
}

impl CameraDevice for FakeCamera {
    fn connect(&self) -> anyhow::Result<()> {
        if self.connect_fails {
            Err(anyhow!("camera held by another client"))
        } else {
            Ok(())
        }
    }

    fn preview_enabled(&self) -> bool {
        self.preview_on.load(Ordering::SeqCst)
    }

    fn stop_preview(&self) {
        self.preview_stopped.store(true, Ordering::SeqCst);
        self.preview_on.store(false, Ordering::SeqCst);
    }

    fn unlock(&self) {
        self.unlocked.store(true, Ordering::SeqCst);
    }
}

/// Opaque surface stand-in
#[derive(Debug)]
pub struct FakeSurface;

impl PreviewSurface for FakeSurface {}

/// A media engine whose components can be scripted to fail per step
#[derive(Default)]
pub struct FakeEngine {
    pub fail_audio_open: bool,
    pub fail_audio_init: bool,
    pub fail_video_open: bool,
    pub fail_encoder_connect: bool,
    pub fail_encoder_create: bool,

    /// Amplitude level reported by opened audio sources, if metering is on
    pub amplitude: Option<i32>,

    /// Set by any opened video source that had a preview surface attached
    pub preview_attached: Arc<AtomicBool>,

    writers: Mutex<Vec<WriterProbe>>,
    requests: Arc<Mutex<Vec<EncodeRequest>>>,
}

impl FakeEngine {
    /// Number of writers the engine was asked to construct
    pub fn writer_count(&self) -> usize {
        self.writers.lock().len()
    }

    /// Probe for the most recently constructed writer
    pub fn last_writer(&self) -> Option<WriterProbe> {
        self.writers.lock().last().cloned()
    }

    /// Every encode request the encoder service accepted, in order
    pub fn encode_requests(&self) -> Vec<EncodeRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn open_audio_source(
        &self,
        _kind: AudioSourceKind,
        _sample_rate: u32,
        _channels: u32,
    ) -> anyhow::Result<Box<dyn AudioCaptureSource>> {
        if self.fail_audio_open {
            return Err(anyhow!("no such audio device"));
        }
        Ok(Box::new(FakeAudioSource {
            fail_init: self.fail_audio_init,
            amplitude: self.amplitude,
        }))
    }

    async fn open_camera_source(
        &self,
        _camera: Arc<dyn CameraDevice>,
    ) -> anyhow::Result<Box<dyn VideoCaptureSource>> {
        if self.fail_video_open {
            return Err(anyhow!("camera source refused to start"));
        }
        Ok(Box::new(FakeVideoSource {
            preview_attached: Arc::clone(&self.preview_attached),
        }))
    }

    async fn connect_encoder(&self) -> anyhow::Result<Box<dyn EncoderClient>> {
        if self.fail_encoder_connect {
            return Err(anyhow!("encoder service unavailable"));
        }
        Ok(Box::new(FakeEncoderClient {
            fail_create: self.fail_encoder_create,
            requests: Arc::clone(&self.requests),
        }))
    }

    fn create_writer(&self, format: OutputFormat, _sink: OwnedFd) -> Box<dyn TrackWriter> {
        let probe = WriterProbe::default();
        probe.inner.lock().format = Some(format);
        self.writers.lock().push(probe.clone());
        Box::new(FakeWriter { probe })
    }
}
