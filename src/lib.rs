//! camcorder-core - recording session controller.
//!
//! Accepts recording configuration (sources, encoders, output format, rates
//! and sizes), validates the combinations, assembles the capture -> encoder ->
//! writer pipeline through injected collaborator traits, and drives the
//! session lifecycle. The actual capture devices, encoders, and container
//! writers live behind the [`media::MediaEngine`] seam supplied by the host.

pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod session;

pub use config::{
    AudioEncoderKind, AudioSourceKind, OutputFormat, Parameter, SessionConfig,
    VideoEncoderKind, VideoSourceKind,
};
pub use error::{ErrorResponse, SessionError, SessionResult};
pub use media::MediaEngine;
pub use session::{SessionController, SessionEvent, SessionState};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for hosts that do not bring their own subscriber
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camcorder_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("camcorder-core v{} ready", env!("CARGO_PKG_VERSION"));
}
