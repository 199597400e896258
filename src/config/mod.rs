//! Recording session configuration
//!
//! Holds the full set of recording parameters with their defaults, the
//! source/encoder/format vocabulary, and ownership of the output sink
//! descriptor.

pub mod params;

use std::os::fd::{BorrowedFd, OwnedFd};

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

pub use params::{apply_parameters, Parameter};

/// Audio capture source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSourceKind {
    /// Platform default input
    Default,
    /// Microphone
    Mic,
    /// Uplink leg of a voice call
    VoiceUplink,
    /// Downlink leg of a voice call
    VoiceDownlink,
    /// Both legs of a voice call
    VoiceCall,
}

impl AudioSourceKind {
    /// Decode the wire code used by the IPC configuration surface
    pub fn from_raw(raw: i32) -> SessionResult<Self> {
        match raw {
            0 => Ok(AudioSourceKind::Default),
            1 => Ok(AudioSourceKind::Mic),
            2 => Ok(AudioSourceKind::VoiceUplink),
            3 => Ok(AudioSourceKind::VoiceDownlink),
            4 => Ok(AudioSourceKind::VoiceCall),
            _ => Err(SessionError::InvalidArgument(format!(
                "unknown audio source code: {raw}"
            ))),
        }
    }
}

/// Video capture source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSourceKind {
    /// Platform default video input (the camera on every supported device)
    Default,
    /// Explicitly the camera
    Camera,
}

impl VideoSourceKind {
    /// Decode the wire code used by the IPC configuration surface
    pub fn from_raw(raw: i32) -> SessionResult<Self> {
        match raw {
            0 => Ok(VideoSourceKind::Default),
            1 => Ok(VideoSourceKind::Camera),
            _ => Err(SessionError::InvalidArgument(format!(
                "unknown video source code: {raw}"
            ))),
        }
    }
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 3GPP container (the default)
    ThreeGpp,
    /// MPEG-4 container
    Mpeg4,
    /// Raw AMR narrowband audio
    AmrNb,
    /// Raw AMR wideband audio
    AmrWb,
}

impl OutputFormat {
    /// Decode the wire code used by the IPC configuration surface.
    ///
    /// Code 0 is "default" and maps to 3GPP. Anything outside the table is an
    /// output format this controller cannot produce.
    pub fn from_raw(raw: i32) -> SessionResult<Self> {
        match raw {
            0 | 1 => Ok(OutputFormat::ThreeGpp),
            2 => Ok(OutputFormat::Mpeg4),
            3 => Ok(OutputFormat::AmrNb),
            4 => Ok(OutputFormat::AmrWb),
            _ => Err(SessionError::UnsupportedFormat(raw)),
        }
    }

    /// Whether this format is an audio-only raw AMR stream
    pub fn is_amr(&self) -> bool {
        matches!(self, OutputFormat::AmrNb | OutputFormat::AmrWb)
    }
}

/// Audio encoder kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoderKind {
    /// Platform default (encodes as AMR narrowband)
    Default,
    /// AMR narrowband
    AmrNb,
    /// AMR wideband
    AmrWb,
    /// AAC
    Aac,
}

impl AudioEncoderKind {
    /// Decode the wire code used by the IPC configuration surface
    pub fn from_raw(raw: i32) -> SessionResult<Self> {
        match raw {
            0 => Ok(AudioEncoderKind::Default),
            1 => Ok(AudioEncoderKind::AmrNb),
            2 => Ok(AudioEncoderKind::AmrWb),
            3 => Ok(AudioEncoderKind::Aac),
            _ => Err(SessionError::InvalidArgument(format!(
                "unknown audio encoder code: {raw}"
            ))),
        }
    }
}

/// Video encoder kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoEncoderKind {
    /// H.263
    H263,
    /// MPEG-4 simple profile
    Mpeg4Sp,
    /// H.264 / AVC
    H264,
}

impl VideoEncoderKind {
    /// Decode the wire code used by the IPC configuration surface.
    ///
    /// Code 0 is "default" and maps to H.263.
    pub fn from_raw(raw: i32) -> SessionResult<Self> {
        match raw {
            0 | 1 => Ok(VideoEncoderKind::H263),
            2 => Ok(VideoEncoderKind::Mpeg4Sp),
            3 => Ok(VideoEncoderKind::H264),
            _ => Err(SessionError::InvalidArgument(format!(
                "unknown video encoder code: {raw}"
            ))),
        }
    }
}

/// Full set of recording parameters for one session
///
/// Created with defaults at session construction, mutated by setters and
/// parameter parsing while no pipeline is active, and restored to the default
/// image by `reset()`. The output sink descriptor, once set, is exclusively
/// owned here until replaced or the session is torn down; replacing it closes
/// the prior duplicate.
#[derive(Debug)]
pub struct SessionConfig {
    /// Audio source kind; `None` means no audio track
    pub audio_source: Option<AudioSourceKind>,

    /// Video source kind; `None` means no video track
    pub video_source: Option<VideoSourceKind>,

    /// Output container format
    pub output_format: OutputFormat,

    /// Audio encoder kind
    pub audio_encoder: AudioEncoderKind,

    /// Video encoder kind
    pub video_encoder: VideoEncoderKind,

    /// Requested capture width in pixels
    pub video_width: u32,

    /// Requested capture height in pixels
    pub video_height: u32,

    /// Video frame rate in frames per second
    pub frame_rate: u32,

    /// Video encoding bit rate in bits per second
    pub video_bit_rate: u32,

    /// Audio sampling rate in Hz
    pub sample_rate: u32,

    /// Audio channel count
    pub audio_channels: u32,

    /// Audio encoding bit rate in bits per second
    pub audio_bit_rate: u32,

    /// Writer track inter-leave granularity in microseconds (0 = unset)
    pub interleave_duration_us: u32,

    /// Maximum recording duration in milliseconds, forwarded to the writer
    pub max_duration_ms: Option<u32>,

    /// Maximum output file size in bytes, forwarded to the writer
    pub max_filesize_bytes: Option<u64>,

    /// Owned duplicate of the caller-supplied output descriptor
    output_sink: Option<OwnedFd>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            audio_source: None,
            video_source: None,
            output_format: OutputFormat::ThreeGpp,
            audio_encoder: AudioEncoderKind::AmrNb,
            video_encoder: VideoEncoderKind::H263,
            video_width: 176,
            video_height: 144,
            frame_rate: 20,
            video_bit_rate: 192_000,
            sample_rate: 8_000,
            audio_channels: 1,
            audio_bit_rate: 12_200,
            interleave_duration_us: 0,
            max_duration_ms: None,
            max_filesize_bytes: None,
            output_sink: None,
        }
    }
}

impl SessionConfig {
    /// Set the requested capture geometry; both dimensions must be positive
    pub fn set_video_size(&mut self, width: u32, height: u32) -> SessionResult<()> {
        if width == 0 || height == 0 {
            return Err(SessionError::InvalidArgument(format!(
                "video size must be positive, got {width}x{height}"
            )));
        }
        self.video_width = width;
        self.video_height = height;
        Ok(())
    }

    /// Set the video frame rate; must be positive
    pub fn set_video_frame_rate(&mut self, frames_per_second: u32) -> SessionResult<()> {
        if frames_per_second == 0 {
            return Err(SessionError::InvalidArgument(
                "frame rate must be positive".to_string(),
            ));
        }
        self.frame_rate = frames_per_second;
        Ok(())
    }

    /// Take ownership of a duplicate of the caller's output descriptor.
    ///
    /// Byte-range output is not supported: offset and length must both be
    /// zero, and the previously held sink is untouched when they are not.
    /// On success any prior duplicate is dropped, which closes it.
    pub fn set_output_sink(
        &mut self,
        fd: BorrowedFd<'_>,
        offset: i64,
        length: i64,
    ) -> SessionResult<()> {
        if offset != 0 || length != 0 {
            return Err(SessionError::InvalidArgument(format!(
                "byte-range output is not supported (offset {offset}, length {length})"
            )));
        }
        let owned = fd.try_clone_to_owned()?;
        if self.output_sink.is_some() {
            tracing::debug!("replacing output sink, closing previous descriptor");
        }
        self.output_sink = Some(owned);
        Ok(())
    }

    /// Whether an output sink has been configured
    pub fn has_output_sink(&self) -> bool {
        self.output_sink.is_some()
    }

    /// Mint a fresh duplicate of the owned sink for a writer to consume
    pub fn duplicate_sink(&self) -> SessionResult<OwnedFd> {
        let sink = self.output_sink.as_ref().ok_or_else(|| {
            SessionError::InvalidState("no output sink configured".to_string())
        })?;
        Ok(sink.try_clone()?)
    }

    /// Apply one decoded configuration parameter
    pub fn apply(&mut self, param: Parameter) {
        tracing::debug!(?param, "applying parameter");
        match param {
            Parameter::AudioSamplingRate(rate) => self.sample_rate = rate,
            Parameter::AudioChannels(channels) => self.audio_channels = channels,
            Parameter::AudioBitRate(rate) => self.audio_bit_rate = rate,
            Parameter::VideoBitRate(rate) => self.video_bit_rate = rate,
            Parameter::InterleaveDurationUs(duration) => {
                self.interleave_duration_us = duration
            }
            Parameter::MaxDurationMs(limit) => self.max_duration_ms = Some(limit),
            Parameter::MaxFileSizeBytes(limit) => self.max_filesize_bytes = Some(limit),
        }
    }
}
