//! Mixer backend talking to a mixer service over a local WebSocket
//!
//! The facade is blocking, so each roster owns a current-thread tokio runtime
//! and drives one request at a time on it.

use crate::config::MixerConfig;
use crate::connection::Connection;
use crate::error::{MixerError, Result};
use crate::host::{AudioSubsystem, MediaRoster};
use crate::protocol::{Endpoint, Method, Request};
use crate::types::{GainValue, MixerNode, ParameterWeb};
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tokio::time::timeout;

/// Host audio subsystem reached through a mixer service
///
/// # Example
///
/// ```no_run
/// use volume_control::{MixerConfig, RemoteMixer, VolumeControl};
///
/// let mixer = RemoteMixer::new(MixerConfig::new("ws://127.0.0.1:8768/mixer"));
/// let control = VolumeControl::discover(&mixer);
/// if control.init_check().is_ready() {
///     control.set_volume(-20.0)?;
/// }
/// # Ok::<(), volume_control::VolumeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RemoteMixer {
    config: MixerConfig,
}

impl RemoteMixer {
    pub fn new(config: MixerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }
}

impl AudioSubsystem for RemoteMixer {
    type Roster = RemoteRoster;

    /// Connect to the mixer service
    fn roster(&self) -> Result<RemoteRoster> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let connect = Connection::connect(self.config.url.clone(), self.config.request_timeout);
        let connection = runtime
            .block_on(async { timeout(self.config.request_timeout, connect).await })
            .map_err(|_| MixerError::Timeout)??;

        Ok(RemoteRoster { runtime, connection })
    }
}

/// Open connection to a mixer service
pub struct RemoteRoster {
    runtime: Runtime,
    connection: Connection,
}

impl RemoteRoster {
    /// Send a request and return its data payload
    fn request(&self, request: Request) -> Result<Option<Value>> {
        let response = self
            .runtime
            .block_on(self.connection.send_request(request))?;
        Ok(response.data)
    }

    fn read_value(&self, parameter: &str) -> Result<Value> {
        let request = Request::new(Endpoint::Parameter, Method::Read).with_target(parameter);
        let data = self
            .request(request)?
            .ok_or_else(|| MixerError::InvalidResponse("No data in parameter response".to_string()))?;

        data.get("value")
            .cloned()
            .ok_or_else(|| MixerError::InvalidResponse("No value in parameter response".to_string()))
    }

    fn write_value(&self, parameter: &str, value: Value) -> Result<()> {
        let request = Request::new(Endpoint::Parameter, Method::Write)
            .with_target(parameter)
            .with_data(json!({ "value": value }));

        self.request(request)?;
        Ok(())
    }
}

impl MediaRoster for RemoteRoster {
    fn audio_mixer(&self) -> Result<MixerNode> {
        let data = self
            .request(Request::new(Endpoint::AudioMixer, Method::Read))?
            .ok_or_else(|| MixerError::InvalidResponse("No data in mixer response".to_string()))?;

        Ok(serde_json::from_value(data)?)
    }

    fn parameter_web(&self, node: &MixerNode) -> Result<ParameterWeb> {
        let request = Request::new(Endpoint::ParameterWeb, Method::Read).with_target(node.id.to_string());
        let data = self
            .request(request)?
            .ok_or_else(|| MixerError::InvalidResponse("No data in parameter web response".to_string()))?;

        Ok(serde_json::from_value(data)?)
    }

    /// Release is not acknowledged by the service
    fn release_node(&self, node: MixerNode) -> Result<()> {
        let request = Request::new(Endpoint::Node, Method::Release).with_target(node.id.to_string());
        self.runtime.block_on(async {
            self.connection.send_only(request).await?;
            // Let the writer task put the frame on the socket before returning.
            tokio::task::yield_now().await;
            Ok(())
        })
    }

    fn continuous_value(&self, parameter: &str) -> Result<GainValue> {
        match self.read_value(parameter)? {
            // JSON has no NaN; the service sends null instead
            Value::Null => Ok(f64::NAN),
            value => value.as_f64().ok_or_else(|| {
                MixerError::InvalidResponse(format!("Parameter {} is not a number: {}", parameter, value))
            }),
        }
    }

    fn set_continuous_value(&self, parameter: &str, value: GainValue) -> Result<()> {
        self.write_value(parameter, json!(value))
    }

    fn discrete_value(&self, parameter: &str) -> Result<i32> {
        let value = self.read_value(parameter)?;
        value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| {
                MixerError::InvalidResponse(format!("Parameter {} is not an integer: {}", parameter, value))
            })
    }

    fn set_discrete_value(&self, parameter: &str, value: i32) -> Result<()> {
        self.write_value(parameter, json!(value))
    }
}
