//! Media vocabulary shared with collaborator components
//!
//! Defines the types that cross the boundary between the controller and the
//! opaque capture/encoder/writer components: encoded media types, typed
//! encoder request metadata, and source format descriptors.

pub mod traits;

#[cfg(test)]
pub mod fake;

use serde::{Deserialize, Serialize};

pub use traits::{
    AmplitudeSource, AudioCaptureSource, CameraDevice, CaptureChain, EncodedTrack,
    EncoderClient, MediaEngine, PreviewSurface, TrackWriter, VideoCaptureSource,
};

/// Encoded media type of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// AMR narrowband audio
    AmrNb,
    /// AMR wideband audio
    AmrWb,
    /// AAC audio
    Aac,
    /// H.263 video
    H263,
    /// MPEG-4 simple profile video
    Mpeg4Video,
    /// H.264 / AVC video
    Avc,
}

impl MediaType {
    /// Container MIME string for this media type
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::AmrNb => "audio/3gpp",
            MediaType::AmrWb => "audio/amr-wb",
            MediaType::Aac => "audio/mp4a-latm",
            MediaType::H263 => "video/3gpp",
            MediaType::Mpeg4Video => "video/mp4v-es",
            MediaType::Avc => "video/avc",
        }
    }

    /// Whether this is an audio media type
    pub fn is_audio(&self) -> bool {
        matches!(self, MediaType::AmrNb | MediaType::AmrWb | MediaType::Aac)
    }
}

/// Request metadata handed to an encoder for an audio track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioEncodeRequest {
    /// Target encoded media type
    pub media_type: MediaType,

    /// Input sampling rate in Hz
    pub sample_rate: u32,

    /// Input channel count
    pub channel_count: u32,

    /// Target encoding bit rate in bits per second
    pub bit_rate: u32,

    /// Maximum input buffer size hint reported by the capture source
    pub max_input_size: Option<usize>,
}

/// Request metadata handed to an encoder for a video track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEncodeRequest {
    /// Target encoded media type
    pub media_type: MediaType,

    /// Frame width resolved by the capture source, in pixels
    pub width: u32,

    /// Frame height resolved by the capture source, in pixels
    pub height: u32,

    /// Frame rate in frames per second
    pub frame_rate: u32,

    /// Target encoding bit rate in bits per second
    pub bit_rate: u32,
}

/// Typed encoder request metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EncodeRequest {
    Audio(AudioEncodeRequest),
    Video(VideoEncodeRequest),
}

impl EncodeRequest {
    /// Target media type of the requested track
    pub fn media_type(&self) -> MediaType {
        match self {
            EncodeRequest::Audio(request) => request.media_type,
            EncodeRequest::Video(request) => request.media_type,
        }
    }
}

/// Format descriptor reported by an initialized audio capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSourceFormat {
    /// Maximum input buffer size hint for the encoder
    pub max_input_size: Option<usize>,
}

/// Format descriptor reported by a video capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSourceFormat {
    /// Resolved capture width in pixels
    pub width: u32,

    /// Resolved capture height in pixels
    pub height: u32,
}
