//! In-process mixer backend
//!
//! Behaves like a host mixer with one master gain and one mute control. Every
//! host call is counted and any step can be made to fail, which is what the
//! test-suite relies on. Clones share the same mixer state.

use crate::error::{MixerError, Result};
use crate::host::{AudioSubsystem, MediaRoster};
use crate::types::{
    Control, GainLimits, GainValue, MixerNode, NodeId, Parameter, ParameterId, ParameterWeb,
    KIND_MASTER_GAIN, KIND_MUTE,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

const MIXER_NODE: NodeId = 1;

/// Host call that can be forced to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Roster,
    AudioMixer,
    ParameterWeb,
    ReadGain,
    WriteGain,
    ReadMute,
    WriteMute,
}

/// Number of host calls made so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub rosters: usize,
    pub mixers: usize,
    pub webs: usize,
    pub releases: usize,
    pub reads: usize,
    pub writes: usize,
}

impl CallCounts {
    /// Value reads and writes, i.e. everything after discovery
    pub fn value_io(&self) -> usize {
        self.reads + self.writes
    }
}

#[derive(Debug, Clone, Copy)]
enum Stored {
    Continuous(GainValue),
    Discrete(i32),
}

struct MixerState {
    parameters: Vec<Parameter>,
    values: BTreeMap<ParameterId, Stored>,
    failures: HashSet<FailurePoint>,
    calls: CallCounts,
    open_nodes: usize,
}

impl MixerState {
    fn check(&self, point: FailurePoint) -> Result<()> {
        if self.failures.contains(&point) {
            return Err(MixerError::Unavailable(format!("{:?} failure injected", point)));
        }
        Ok(())
    }

    fn kind_of(&self, parameter: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.id == parameter)
            .map(|p| p.kind.as_str())
    }

    fn read_point(&self, parameter: &str) -> Option<FailurePoint> {
        match self.kind_of(parameter) {
            Some(KIND_MASTER_GAIN) => Some(FailurePoint::ReadGain),
            Some(KIND_MUTE) => Some(FailurePoint::ReadMute),
            _ => None,
        }
    }

    fn write_point(&self, parameter: &str) -> Option<FailurePoint> {
        match self.kind_of(parameter) {
            Some(KIND_MASTER_GAIN) => Some(FailurePoint::WriteGain),
            Some(KIND_MUTE) => Some(FailurePoint::WriteMute),
            _ => None,
        }
    }

    fn stored(&self, parameter: &str) -> Result<Stored> {
        self.values
            .get(parameter)
            .copied()
            .ok_or_else(|| MixerError::UnknownParameter(parameter.to_string()))
    }
}

/// Simulated host mixer
#[derive(Clone)]
pub struct MemoryMixer {
    state: Arc<Mutex<MixerState>>,
}

impl MemoryMixer {
    /// A mixer exposing a master gain with the given limits, a mute switch
    /// (initially off) and a few unrelated controls
    pub fn new(limits: GainLimits, volume: GainValue) -> Self {
        let mixer = Self::with_parameters(vec![
            Parameter::null("0", "").with_name("Master"),
            Parameter::continuous("1", "gain", limits).with_name("Input gain"),
            Parameter::continuous("2", KIND_MASTER_GAIN, limits).with_name("Master gain"),
            Parameter::discrete("3", KIND_MUTE).with_name("Mute"),
        ]);
        mixer.set_gain(volume);
        mixer
    }

    /// A mixer exposing exactly these parameters, in this order
    ///
    /// Continuous controls start at their minimum, discrete controls at `0`.
    pub fn with_parameters(parameters: Vec<Parameter>) -> Self {
        let values = parameters
            .iter()
            .filter_map(|p| match p.control {
                Control::Continuous(limits) => Some((p.id.clone(), Stored::Continuous(limits.min))),
                Control::Discrete { .. } => Some((p.id.clone(), Stored::Discrete(0))),
                Control::Null => None,
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(MixerState {
                parameters,
                values,
                failures: HashSet::new(),
                calls: CallCounts::default(),
                open_nodes: 0,
            })),
        }
    }

    /// Make a host call fail until [`recover`](Self::recover) is called
    pub fn fail(&self, point: FailurePoint) -> &Self {
        self.state.lock().unwrap().failures.insert(point);
        self
    }

    pub fn recover(&self, point: FailurePoint) -> &Self {
        self.state.lock().unwrap().failures.remove(&point);
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    /// Node handles handed out and not yet released
    pub fn open_nodes(&self) -> usize {
        self.state.lock().unwrap().open_nodes
    }

    /// Raw master gain, bypassing clamping and call counting
    pub fn gain(&self) -> Option<GainValue> {
        let state = self.state.lock().unwrap();
        let id = state.parameters.iter().find(|p| p.kind == KIND_MASTER_GAIN)?.id.clone();
        match state.values.get(&id) {
            Some(Stored::Continuous(value)) => Some(*value),
            _ => None,
        }
    }

    /// Overwrite the master gain as another client would, without clamping
    pub fn set_gain(&self, value: GainValue) {
        self.store(KIND_MASTER_GAIN, Stored::Continuous(value));
    }

    /// Raw mute value, bypassing call counting
    pub fn mute_value(&self) -> Option<i32> {
        let state = self.state.lock().unwrap();
        let id = state.parameters.iter().find(|p| p.kind == KIND_MUTE)?.id.clone();
        match state.values.get(&id) {
            Some(Stored::Discrete(value)) => Some(*value),
            _ => None,
        }
    }

    /// Overwrite the mute value as another client would
    pub fn set_mute_value(&self, value: i32) {
        self.store(KIND_MUTE, Stored::Discrete(value));
    }

    fn store(&self, kind: &str, value: Stored) {
        let mut state = self.state.lock().unwrap();
        let id = state
            .parameters
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.id.clone());
        if let Some(id) = id {
            state.values.insert(id, value);
        }
    }
}

impl AudioSubsystem for MemoryMixer {
    type Roster = MemoryRoster;

    fn roster(&self) -> Result<MemoryRoster> {
        let mut state = self.state.lock().unwrap();
        state.calls.rosters += 1;
        state.check(FailurePoint::Roster)?;

        Ok(MemoryRoster {
            state: self.state.clone(),
        })
    }
}

/// Roster handle onto a [`MemoryMixer`]
pub struct MemoryRoster {
    state: Arc<Mutex<MixerState>>,
}

impl MediaRoster for MemoryRoster {
    fn audio_mixer(&self) -> Result<MixerNode> {
        let mut state = self.state.lock().unwrap();
        state.calls.mixers += 1;
        state.check(FailurePoint::AudioMixer)?;

        state.open_nodes += 1;
        Ok(MixerNode {
            id: MIXER_NODE,
            name: "System Mixer".to_string(),
        })
    }

    fn parameter_web(&self, node: &MixerNode) -> Result<ParameterWeb> {
        let mut state = self.state.lock().unwrap();
        state.calls.webs += 1;
        state.check(FailurePoint::ParameterWeb)?;

        if node.id != MIXER_NODE {
            return Err(MixerError::InvalidResponse(format!("no such node {}", node.id)));
        }
        Ok(ParameterWeb::new(state.parameters.clone()))
    }

    fn release_node(&self, _node: MixerNode) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.releases += 1;
        state.open_nodes = state.open_nodes.saturating_sub(1);
        Ok(())
    }

    fn continuous_value(&self, parameter: &str) -> Result<GainValue> {
        let mut state = self.state.lock().unwrap();
        state.calls.reads += 1;
        if let Some(point) = state.read_point(parameter) {
            state.check(point)?;
        }

        match state.stored(parameter)? {
            Stored::Continuous(value) => Ok(value),
            Stored::Discrete(_) => Err(MixerError::InvalidValue(format!(
                "parameter {} is not continuous",
                parameter
            ))),
        }
    }

    fn set_continuous_value(&self, parameter: &str, value: GainValue) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.writes += 1;
        if let Some(point) = state.write_point(parameter) {
            state.check(point)?;
        }

        match state.stored(parameter)? {
            Stored::Continuous(_) => {
                state.values.insert(parameter.to_string(), Stored::Continuous(value));
                Ok(())
            }
            Stored::Discrete(_) => Err(MixerError::InvalidValue(format!(
                "parameter {} is not continuous",
                parameter
            ))),
        }
    }

    fn discrete_value(&self, parameter: &str) -> Result<i32> {
        let mut state = self.state.lock().unwrap();
        state.calls.reads += 1;
        if let Some(point) = state.read_point(parameter) {
            state.check(point)?;
        }

        match state.stored(parameter)? {
            Stored::Discrete(value) => Ok(value),
            Stored::Continuous(_) => Err(MixerError::InvalidValue(format!(
                "parameter {} is not discrete",
                parameter
            ))),
        }
    }

    fn set_discrete_value(&self, parameter: &str, value: i32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.writes += 1;
        if let Some(point) = state.write_point(parameter) {
            state.check(point)?;
        }

        match state.stored(parameter)? {
            Stored::Discrete(_) => {
                state.values.insert(parameter.to_string(), Stored::Discrete(value));
                Ok(())
            }
            Stored::Continuous(_) => Err(MixerError::InvalidValue(format!(
                "parameter {} is not discrete",
                parameter
            ))),
        }
    }
}
