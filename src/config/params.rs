//! Recording parameter codec
//!
//! Parses the generic `key1=value1;key2=value2;...` configuration grammar into
//! a closed union of typed parameters. The string front end is a thin adapter;
//! everything downstream of this module deals only in [`Parameter`] values.

use serde::{Deserialize, Serialize};

use super::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// One recognized configuration parameter with its typed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    /// Audio sampling rate in Hz
    AudioSamplingRate(u32),
    /// Audio channel count
    AudioChannels(u32),
    /// Audio encoding bit rate in bits per second
    AudioBitRate(u32),
    /// Video encoding bit rate in bits per second
    VideoBitRate(u32),
    /// Writer inter-leave granularity in microseconds
    InterleaveDurationUs(u32),
    /// Maximum recording duration in milliseconds
    MaxDurationMs(u32),
    /// Maximum output file size in bytes
    MaxFileSizeBytes(u64),
}

fn parse_sampling_rate(value: &str) -> Option<Parameter> {
    value.parse().ok().map(Parameter::AudioSamplingRate)
}

fn parse_channels(value: &str) -> Option<Parameter> {
    value.parse().ok().map(Parameter::AudioChannels)
}

fn parse_audio_bit_rate(value: &str) -> Option<Parameter> {
    value.parse().ok().map(Parameter::AudioBitRate)
}

fn parse_video_bit_rate(value: &str) -> Option<Parameter> {
    value.parse().ok().map(Parameter::VideoBitRate)
}

fn parse_interleave_duration(value: &str) -> Option<Parameter> {
    value.parse().ok().map(Parameter::InterleaveDurationUs)
}

fn parse_max_duration(value: &str) -> Option<Parameter> {
    value.parse().ok().map(Parameter::MaxDurationMs)
}

fn parse_max_filesize(value: &str) -> Option<Parameter> {
    value.parse().ok().map(Parameter::MaxFileSizeBytes)
}

/// Recognized keys and their payload parsers
const DISPATCH_TABLE: &[(&str, fn(&str) -> Option<Parameter>)] = &[
    ("audio-param-sampling-rate", parse_sampling_rate),
    ("audio-param-number-of-channels", parse_channels),
    ("audio-param-encoding-bitrate", parse_audio_bit_rate),
    ("video-param-encoding-bitrate", parse_video_bit_rate),
    ("param-interleave-duration-us", parse_interleave_duration),
    ("max-duration", parse_max_duration),
    ("max-filesize", parse_max_filesize),
];

impl Parameter {
    /// Parse one `key=value` segment.
    ///
    /// Key and value are trimmed of surrounding whitespace. A segment without
    /// `=`, an empty key, or a value that is not entirely a base-10 integer in
    /// range for the key's payload type is malformed.
    pub fn parse(segment: &str) -> SessionResult<Self> {
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| SessionError::MalformedParameter(segment.to_string()))?;

        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            return Err(SessionError::MalformedParameter(segment.to_string()));
        }

        let (_, payload_parser) = DISPATCH_TABLE
            .iter()
            .find(|(name, _)| *name == key)
            .ok_or_else(|| SessionError::UnknownParameter(key.to_string()))?;

        payload_parser(value)
            .ok_or_else(|| SessionError::MalformedParameter(segment.to_string()))
    }
}

/// Parse a semicolon-separated parameter batch and apply it to the config.
///
/// Pairs are applied in the order they appear; the scan stops at the first
/// failure and reports it. There is no rollback: on error the config retains
/// every pair applied before the failing one, so hosts that need atomicity
/// must snapshot before batch-applying.
pub fn apply_parameters(config: &mut SessionConfig, text: &str) -> SessionResult<()> {
    tracing::debug!(params = text, "applying parameter batch");
    for segment in text.split(';') {
        let param = Parameter::parse(segment)?;
        config.apply(param);
    }
    Ok(())
}
