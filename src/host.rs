//! Seam between the volume facade and the host audio subsystem
//!
//! The host is treated as an opaque capability: acquire a roster, resolve the
//! system mixer, resolve its parameter web, and get or set typed control
//! values. [`MemoryMixer`](crate::MemoryMixer) and
//! [`RemoteMixer`](crate::RemoteMixer) are the two implementations.

use crate::error::Result;
use crate::types::{GainValue, MixerNode, ParameterWeb};

/// Entry point to a host audio subsystem
pub trait AudioSubsystem {
    type Roster: MediaRoster;

    /// Acquire a handle to the media coordination service
    fn roster(&self) -> Result<Self::Roster>;
}

/// Handle to the media coordination service
///
/// All calls are blocking round-trips to the host.
pub trait MediaRoster {
    /// Resolve the system's designated audio mixer node
    fn audio_mixer(&self) -> Result<MixerNode>;

    /// Resolve the parameter web exposed by a node
    fn parameter_web(&self, node: &MixerNode) -> Result<ParameterWeb>;

    /// Give back a node handle obtained from [`audio_mixer`](Self::audio_mixer)
    fn release_node(&self, node: MixerNode) -> Result<()>;

    fn continuous_value(&self, parameter: &str) -> Result<GainValue>;

    fn set_continuous_value(&self, parameter: &str, value: GainValue) -> Result<()>;

    fn discrete_value(&self, parameter: &str) -> Result<i32>;

    fn set_discrete_value(&self, parameter: &str, value: i32) -> Result<()>;
}
