// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! drumgrid - rhythm pattern editor core.
//!
//! A fixed 18-pad step grid with finger designations, a sample-accurate
//! transport, and a compact codec that turns a pattern into a share link.

pub mod audio;
pub mod codec;
pub mod config;
pub mod pattern;
pub mod session;
pub mod share;
pub mod transport;

pub use audio::{AudioTrigger, LogAudio, RecordingAudio};
pub use codec::{CodecError, PatternCodec};
pub use config::AppConfig;
pub use pattern::{ConversionReport, DrumPattern, FingerDesignation, Hand, Subdivision};
pub use session::Session;
pub use share::{UrlSync, UrlUpdate};
pub use transport::{PreciseScheduler, Transport, TransportClock, TransportSnapshot, TransportState};
