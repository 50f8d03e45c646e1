use serde::{Deserialize, Serialize};
use std::fmt;

/// Gain value in decibels
pub type GainValue = f64;

/// Mute state
pub type MuteState = bool;

/// Identifier of a node registered with the host mixer service
pub type NodeId = i32;

/// Identifier of a parameter inside a parameter web
pub type ParameterId = String;

/// Parameter kind tagging the master output gain
pub const KIND_MASTER_GAIN: &str = "master_gain";

/// Parameter kind tagging the output mute switch
pub const KIND_MUTE: &str = "mute";

/// Outcome of the discovery sequence run by [`VolumeControl`](crate::VolumeControl)
///
/// Every state other than `Ready` names the step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitState {
    Uninitialized,
    RosterUnavailable,
    MixerUnavailable,
    ParameterWebUnavailable,
    GainControlNotFound,
    MuteControlNotFound,
    Ready,
}

impl InitState {
    pub fn is_ready(self) -> bool {
        self == InitState::Ready
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InitState::Uninitialized => "discovery has not run",
            InitState::RosterUnavailable => "unable to get media roster",
            InitState::MixerUnavailable => "can't get audio mixer",
            InitState::ParameterWebUnavailable => "can't get mixer parameter web",
            InitState::GainControlNotFound => "couldn't find master gain control",
            InitState::MuteControlNotFound => "couldn't find mute control",
            InitState::Ready => "ready",
        };
        f.write_str(text)
    }
}

/// Handle to a mixer node, valid until released through the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixerNode {
    #[serde(rename = "node")]
    pub id: NodeId,

    #[serde(default)]
    pub name: String,
}

/// Gain limits of a continuous control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl GainLimits {
    /// Clamp a value into `[min, max]`
    ///
    /// No snapping to `step` happens here; the step is informational.
    pub fn clamp(&self, value: GainValue) -> GainValue {
        self.min.max(self.max.min(value))
    }

    /// Width of the range
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Finite bounds with `min <= max` and a positive step
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && self.step.is_finite()
            && self.step > 0.0
    }
}

/// One selectable value of a discrete control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteItem {
    pub value: i32,
    pub name: String,
}

/// Value capability of a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Control {
    /// Bounded real value (gain)
    Continuous(GainLimits),

    /// One of a small enumerated set (mute on/off)
    Discrete {
        #[serde(default)]
        items: Vec<DiscreteItem>,
    },

    /// Label or group entry carrying no value
    Null,
}

/// An entry of a mixer's parameter web
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: ParameterId,

    /// Semantic kind, e.g. [`KIND_MASTER_GAIN`] or [`KIND_MUTE`]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub control: Control,
}

impl Parameter {
    pub fn continuous(id: impl Into<String>, kind: impl Into<String>, limits: GainLimits) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: String::new(),
            control: Control::Continuous(limits),
        }
    }

    pub fn discrete(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: String::new(),
            control: Control::Discrete { items: Vec::new() },
        }
    }

    pub fn null(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: String::new(),
            control: Control::Null,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Gain limits, if this is a continuous control
    pub fn limits(&self) -> Option<GainLimits> {
        match self.control {
            Control::Continuous(limits) => Some(limits),
            _ => None,
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.control, Control::Discrete { .. })
    }
}

/// The set of controls exposed by a mixer node, in host order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterWeb {
    pub parameters: Vec<Parameter>,
}

impl ParameterWeb {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    /// First parameter of the given kind
    ///
    /// Host order is kept as-is; the first match wins even if a later entry
    /// of the same kind would have a better-fitting capability.
    pub fn first_of_kind(&self, kind: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_values_inside_limits() {
        let limits = GainLimits { min: -60.0, max: 18.0, step: 0.5 };
        assert_eq!(limits.clamp(-70.0), -60.0);
        assert_eq!(limits.clamp(100.0), 18.0);
        assert_eq!(limits.clamp(-10.25), -10.25);
    }

    #[test]
    fn limits_validity() {
        assert!(GainLimits { min: -60.0, max: 18.0, step: 0.5 }.is_valid());
        assert!(GainLimits { min: 0.0, max: 0.0, step: 1.0 }.is_valid());
        assert!(!GainLimits { min: 18.0, max: -60.0, step: 0.5 }.is_valid());
        assert!(!GainLimits { min: -60.0, max: 18.0, step: 0.0 }.is_valid());
        assert!(!GainLimits { min: f64::NEG_INFINITY, max: 18.0, step: 0.5 }.is_valid());
        assert!(!GainLimits { min: -60.0, max: f64::NAN, step: 0.5 }.is_valid());
    }

    #[test]
    fn first_of_kind_ignores_later_matches() {
        let limits = GainLimits { min: -60.0, max: 18.0, step: 0.5 };
        let web = ParameterWeb::new(vec![
            Parameter::null("0", KIND_MASTER_GAIN),
            Parameter::continuous("1", KIND_MASTER_GAIN, limits),
        ]);
        assert_eq!(web.first_of_kind(KIND_MASTER_GAIN).map(|p| p.id.as_str()), Some("0"));
        assert!(web.first_of_kind(KIND_MUTE).is_none());
    }

    #[test]
    fn parameter_json_carries_capability_tag() {
        let json = serde_json::json!({
            "id": "7",
            "kind": "master_gain",
            "name": "Master",
            "type": "continuous",
            "min": -60.0,
            "max": 18.0,
            "step": 0.5
        });
        let parameter: Parameter = serde_json::from_value(json).unwrap();
        assert_eq!(
            parameter.limits(),
            Some(GainLimits { min: -60.0, max: 18.0, step: 0.5 })
        );

        let mute: Parameter = serde_json::from_value(serde_json::json!({
            "id": "8",
            "kind": "mute",
            "type": "discrete"
        }))
        .unwrap();
        assert!(mute.is_discrete());
    }
}
