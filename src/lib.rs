//! Read and change the master volume and mute state of a host mixer
//!
//! The centerpiece is [`VolumeControl`], a blocking facade over the mixer's
//! master gain and mute controls. It runs discovery once, records the outcome
//! instead of failing, and enforces the value rules of the gain control:
//!
//! - Volumes written to the mixer are clamped into its `[min, max]` range
//! - NaN readings are reported as read failures, never returned
//! - The step size is reported for display and never used to snap values
//!
//! # Quick Start
//!
//! ```no_run
//! use volume_control::{MixerConfig, RemoteMixer, VolumeControl};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mixer = RemoteMixer::new(MixerConfig::default());
//!     let control = VolumeControl::discover(&mixer);
//!
//!     if !control.init_check().is_ready() {
//!         eprintln!("No mixer: {}", control.init_check());
//!         return Ok(());
//!     }
//!
//!     control.adjust_volume(-2.5)?;
//!     control.toggle_mute()?;
//!     println!("Volume: {} dB, muted: {}", control.volume()?, control.is_muted()?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Control**: the [`VolumeControl`] facade and its discovery sequence
//! - **Host**: the [`AudioSubsystem`] / [`MediaRoster`] traits the facade talks to
//! - **Memory**: an in-process simulated mixer, used by tests
//! - **Remote**: a mixer service reached over a local WebSocket
//! - **Connection** / **Protocol**: WebSocket request handling and JSON messages
//! - **Notification**: desktop notification payload and delivery
//! - **Cli**: argument parsing and the operation dispatcher behind the binary

pub mod cli;
mod config;
mod connection;
mod control;
mod error;
mod host;
mod memory;
pub mod notification;
mod protocol;
mod remote;
mod types;

// Public exports
pub use config::{MixerConfig, DEFAULT_MIXER_URL, DEFAULT_NOTIFY_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use control::VolumeControl;
pub use error::{MixerError, NotifyError, Result, VolumeError};
pub use host::{AudioSubsystem, MediaRoster};
pub use memory::{CallCounts, FailurePoint, MemoryMixer, MemoryRoster};
pub use protocol::{ApiError, Endpoint, Method, Request, Response};
pub use remote::{RemoteMixer, RemoteRoster};
pub use types::{
    Control, DiscreteItem, GainLimits, GainValue, InitState, MixerNode, MuteState, NodeId,
    Parameter, ParameterId, ParameterWeb, KIND_MASTER_GAIN, KIND_MUTE,
};
