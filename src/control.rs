use crate::error::{MixerError, VolumeError};
use crate::host::{AudioSubsystem, MediaRoster};
use crate::types::{GainLimits, GainValue, InitState, MuteState, ParameterId, KIND_MASTER_GAIN, KIND_MUTE};

/// Volume and mute control over the host's system mixer
///
/// Construction runs discovery once and records the outcome instead of
/// failing, so callers must check [`init_check`](Self::init_check) (or handle
/// [`VolumeError::NotInitialized`]) before relying on any operation. While
/// discovery has not reached [`InitState::Ready`] no operation touches the
/// host.
///
/// Read-then-write operations ([`adjust_volume`](Self::adjust_volume),
/// [`toggle_mute`](Self::toggle_mute)) are not atomic with respect to other
/// clients of the same mixer.
///
/// # Example
///
/// ```
/// use volume_control::{GainLimits, InitState, MemoryMixer, VolumeControl};
///
/// let mixer = MemoryMixer::new(GainLimits { min: -60.0, max: 18.0, step: 0.5 }, -10.0);
/// let control = VolumeControl::discover(&mixer);
/// assert_eq!(control.init_check(), InitState::Ready);
///
/// control.adjust_volume(-60.0)?;
/// assert_eq!(control.volume()?, -60.0);
/// # Ok::<(), volume_control::VolumeError>(())
/// ```
pub struct VolumeControl<R> {
    state: InitState,
    init_error: Option<MixerError>,
    controls: Option<Controls<R>>,
}

struct Controls<R> {
    roster: R,
    gain: ParameterId,
    limits: GainLimits,
    mute: ParameterId,
}

struct DiscoveryFailure {
    state: InitState,
    source: Option<MixerError>,
}

impl DiscoveryFailure {
    fn new(state: InitState) -> Self {
        Self { state, source: None }
    }

    fn caused_by(state: InitState, source: MixerError) -> Self {
        Self {
            state,
            source: Some(source),
        }
    }
}

impl<R: MediaRoster> VolumeControl<R> {
    /// Run discovery against a host audio subsystem
    pub fn discover<S>(subsystem: &S) -> Self
    where
        S: AudioSubsystem<Roster = R>,
    {
        match discover_controls(subsystem) {
            Ok(controls) => {
                tracing::debug!(
                    "Mixer ready: gain={} {:?}, mute={}",
                    controls.gain,
                    controls.limits,
                    controls.mute
                );
                Self {
                    state: InitState::Ready,
                    init_error: None,
                    controls: Some(controls),
                }
            }
            Err(failure) => {
                match &failure.source {
                    Some(e) => tracing::warn!("Mixer discovery failed ({}): {}", failure.state, e),
                    None => tracing::warn!("Mixer discovery failed: {}", failure.state),
                }
                Self {
                    state: failure.state,
                    init_error: failure.source,
                    controls: None,
                }
            }
        }
    }

    /// Outcome of discovery
    pub fn init_check(&self) -> InitState {
        self.state
    }

    /// Host error behind a failed discovery step, if the host reported one
    pub fn init_error(&self) -> Option<&MixerError> {
        self.init_error.as_ref()
    }

    fn controls(&self) -> Result<&Controls<R>, VolumeError> {
        self.controls
            .as_ref()
            .ok_or(VolumeError::NotInitialized(self.state))
    }

    /// Current gain in decibels
    ///
    /// A NaN or infinite reading is reported as a read failure.
    pub fn volume(&self) -> Result<GainValue, VolumeError> {
        let controls = self.controls()?;
        let volume = controls
            .roster
            .continuous_value(&controls.gain)
            .map_err(VolumeError::Read)?;

        if !volume.is_finite() {
            return Err(VolumeError::Read(MixerError::InvalidValue(format!(
                "master gain reads {}",
                volume
            ))));
        }

        Ok(volume)
    }

    pub fn limits(&self) -> Result<GainLimits, VolumeError> {
        Ok(self.controls()?.limits)
    }

    pub fn min_volume(&self) -> Result<GainValue, VolumeError> {
        Ok(self.controls()?.limits.min)
    }

    pub fn max_volume(&self) -> Result<GainValue, VolumeError> {
        Ok(self.controls()?.limits.max)
    }

    /// Step size reported by the mixer, for display only
    pub fn step_size(&self) -> Result<f64, VolumeError> {
        Ok(self.controls()?.limits.step)
    }

    /// Whether the output is muted
    ///
    /// A failed read of the mute control yields `false`: the output is assumed
    /// unmuted. Only [`VolumeError::NotInitialized`] is returned as an error.
    pub fn is_muted(&self) -> Result<MuteState, VolumeError> {
        let controls = self.controls()?;
        match controls.roster.discrete_value(&controls.mute) {
            Ok(value) => Ok(value != 0),
            Err(e) => {
                tracing::warn!("Couldn't read mute state, assuming not muted: {}", e);
                Ok(false)
            }
        }
    }

    /// Set the gain, clamped into the mixer's range
    pub fn set_volume(&self, volume: GainValue) -> Result<(), VolumeError> {
        let controls = self.controls()?;
        if volume.is_nan() {
            return Err(VolumeError::InvalidValue(volume));
        }

        let clamped = controls.limits.clamp(volume);
        if clamped != volume {
            tracing::debug!("Clamped volume {} to {}", volume, clamped);
        }

        controls
            .roster
            .set_continuous_value(&controls.gain, clamped)
            .map_err(VolumeError::Write)
    }

    /// Change the gain relative to its current value, with the same clamping
    /// as [`set_volume`](Self::set_volume)
    pub fn adjust_volume(&self, delta: GainValue) -> Result<(), VolumeError> {
        self.controls()?;
        if delta.is_nan() {
            return Err(VolumeError::InvalidValue(delta));
        }

        let current = self.volume()?;
        self.set_volume(current + delta)
    }

    pub fn toggle_mute(&self) -> Result<(), VolumeError> {
        let controls = self.controls()?;
        let current = controls
            .roster
            .discrete_value(&controls.mute)
            .map_err(VolumeError::Read)?;

        let next = if current != 0 { 0 } else { 1 };
        controls
            .roster
            .set_discrete_value(&controls.mute, next)
            .map_err(VolumeError::Write)
    }

    /// Write the mute state without reading it first
    pub fn set_mute(&self, muted: MuteState) -> Result<(), VolumeError> {
        let controls = self.controls()?;
        controls
            .roster
            .set_discrete_value(&controls.mute, i32::from(muted))
            .map_err(VolumeError::Write)
    }
}

fn discover_controls<S: AudioSubsystem>(
    subsystem: &S,
) -> Result<Controls<S::Roster>, DiscoveryFailure> {
    let roster = subsystem
        .roster()
        .map_err(|e| DiscoveryFailure::caused_by(InitState::RosterUnavailable, e))?;

    let node = roster
        .audio_mixer()
        .map_err(|e| DiscoveryFailure::caused_by(InitState::MixerUnavailable, e))?;
    tracing::debug!("Resolved audio mixer node {} ({})", node.id, node.name);

    let web = roster.parameter_web(&node);

    // The node handle is not needed past this point, whatever the outcome.
    if let Err(e) = roster.release_node(node) {
        tracing::debug!("Failed to release mixer node: {}", e);
    }

    let web = web.map_err(|e| DiscoveryFailure::caused_by(InitState::ParameterWebUnavailable, e))?;

    let (gain, limits) = web
        .first_of_kind(KIND_MASTER_GAIN)
        .and_then(|p| p.limits().map(|limits| (p.id.clone(), limits)))
        .ok_or_else(|| DiscoveryFailure::new(InitState::GainControlNotFound))?;

    if !limits.is_valid() {
        tracing::warn!(
            "Ignoring master gain {} with unusable limits (min={}, max={}, step={})",
            gain,
            limits.min,
            limits.max,
            limits.step
        );
        return Err(DiscoveryFailure::new(InitState::GainControlNotFound));
    }

    let mute = web
        .first_of_kind(KIND_MUTE)
        .filter(|p| p.is_discrete())
        .map(|p| p.id.clone())
        .ok_or_else(|| DiscoveryFailure::new(InitState::MuteControlNotFound))?;

    Ok(Controls {
        roster,
        gain,
        limits,
        mute,
    })
}
