//! Command-line surface: parsed arguments, the operation dispatcher and the
//! text it prints

use crate::config::{MixerConfig, DEFAULT_MIXER_URL, DEFAULT_NOTIFY_TIMEOUT};
use crate::control::VolumeControl;
use crate::host::MediaRoster;
use crate::notification::{display_value, Notification};
use crate::types::{GainLimits, GainValue, MuteState};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

/// Which host audio subsystem to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Mixer service over WebSocket
    Remote,
    /// Dry run against a simulated mixer starting at 0 dB; nothing is kept
    /// after the invocation
    Memory,
}

/// Show or change the system mixer's master volume and mute state
///
/// Without a volume or mute option the current state is printed.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "volume-control")]
#[command(group(clap::ArgGroup::new("volume_op").args(["adjust", "volume"])))]
#[command(group(clap::ArgGroup::new("mute_op").args(["toggle", "mute", "unmute"])))]
pub struct Args {
    /// Increase/decrease volume by X dB
    #[arg(short, long, value_name = "DB", allow_negative_numbers = true)]
    pub adjust: Option<f64>,

    /// Set absolute volume dB level
    #[arg(short = 'v', long, value_name = "DB", allow_negative_numbers = true)]
    pub volume: Option<f64>,

    /// Toggle mute on/off
    #[arg(short, long)]
    pub toggle: bool,

    /// Set mute on
    #[arg(short, long)]
    pub mute: bool,

    /// Set mute off
    #[arg(short, long)]
    pub unmute: bool,

    /// Show system notification and specify optional timeout in seconds (default: 1.5)
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        num_args = 0..=1,
        default_missing_value = "0",
        allow_negative_numbers = true
    )]
    pub notify: Option<f64>,

    /// WebSocket URL of the mixer service
    #[arg(long, env = "VOLUME_CONTROL_URL", default_value = DEFAULT_MIXER_URL)]
    pub server: String,

    /// Seconds to wait for the mixer service to answer
    #[arg(long, env = "VOLUME_CONTROL_TIMEOUT", value_name = "SECONDS", default_value = "10", value_parser = parse_timeout)]
    pub timeout: Duration,

    #[arg(long, value_enum, default_value_t = Backend::Remote)]
    pub backend: Backend,

    /// More log output on stderr (repeat for more)
    #[arg(long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if seconds <= 0.0 {
        return Err("timeout must be positive".to_string());
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("{}", e))
}

/// Mute change requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteOp {
    Toggle,
    Set(MuteState),
}

/// Volume change requested on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeOp {
    Adjust(GainValue),
    Set(GainValue),
}

impl Args {
    pub fn mute_op(&self) -> Option<MuteOp> {
        if self.toggle {
            Some(MuteOp::Toggle)
        } else if self.mute {
            Some(MuteOp::Set(true))
        } else if self.unmute {
            Some(MuteOp::Set(false))
        } else {
            None
        }
    }

    /// A zero `--adjust` changes nothing and counts as not given.
    pub fn volume_op(&self) -> Option<VolumeOp> {
        match (self.adjust, self.volume) {
            (Some(delta), _) if delta != 0.0 => Some(VolumeOp::Adjust(delta)),
            (_, Some(volume)) => Some(VolumeOp::Set(volume)),
            _ => None,
        }
    }

    /// How long to show the notification, if one was requested
    ///
    /// A missing, non-positive or unrepresentable value falls back to
    /// [`DEFAULT_NOTIFY_TIMEOUT`].
    pub fn notify_timeout(&self) -> Option<Duration> {
        self.notify.map(|seconds| {
            if seconds > 0.0 {
                Duration::try_from_secs_f64(seconds).unwrap_or(DEFAULT_NOTIFY_TIMEOUT)
            } else {
                DEFAULT_NOTIFY_TIMEOUT
            }
        })
    }

    pub fn mixer_config(&self) -> MixerConfig {
        MixerConfig::new(self.server.clone()).with_request_timeout(self.timeout)
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Final state gathered after all operations ran
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub volume: Option<GainValue>,
    pub limits: Option<GainLimits>,
    pub muted: bool,
    /// Explanatory line when the volume could not be determined
    pub error: Option<String>,
    /// Whether discovery or any operation failed
    pub failed: bool,
}

impl Report {
    pub fn notification(&self, timeout: Duration) -> Notification {
        match (self.volume, self.limits) {
            (Some(_), Some(_)) if self.muted => Notification::muted(timeout),
            (Some(volume), Some(limits)) => Notification::volume(volume, limits, timeout),
            _ => Notification::error(
                self.error.as_deref().unwrap_or("Error getting volume from mixer!"),
                timeout,
            ),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Status lines printed when nothing was changed
pub fn status_text(volume: GainValue, limits: GainLimits, muted: MuteState) -> String {
    format!(
        "Volume: {} (min={}, max={}, step={})\nState: {}",
        display_value(volume),
        display_value(limits.min),
        display_value(limits.max),
        limits.step,
        if muted { "Muted" } else { "Not Muted" }
    )
}

/// Apply the requested operations and print the outcome
///
/// Progress lines go to `out`, errors to `err`. Nothing is changed when
/// discovery failed. A failing operation does not stop the remaining ones.
pub fn run<R: MediaRoster>(
    control: &VolumeControl<R>,
    args: &Args,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<Report> {
    let mut failed = false;
    let mute_op = args.mute_op();
    let volume_op = args.volume_op();

    if control.init_check().is_ready() {
        if let Some(op) = mute_op {
            let result = match op {
                MuteOp::Toggle => {
                    let muted = control.is_muted().unwrap_or(false);
                    writeln!(out, "{}", if muted { "Unmuting" } else { "Muting" })?;
                    control.toggle_mute()
                }
                MuteOp::Set(true) => {
                    writeln!(out, "Muting")?;
                    control.set_mute(true)
                }
                MuteOp::Set(false) => {
                    writeln!(out, "Unmuting")?;
                    control.set_mute(false)
                }
            };
            if let Err(e) = result {
                writeln!(err, "Error: {}", e)?;
                failed = true;
            }
        }

        if let Some(op) = volume_op {
            let result = match op {
                VolumeOp::Adjust(delta) => {
                    writeln!(out, "Adjust volume: {}", delta)?;
                    control.adjust_volume(delta)
                }
                VolumeOp::Set(volume) => {
                    writeln!(out, "Set volume: {}", volume)?;
                    control.set_volume(volume)
                }
            };
            if let Err(e) = result {
                writeln!(err, "Error: {}", e)?;
                failed = true;
            }
        }
    }

    let mut report = Report {
        volume: None,
        limits: None,
        muted: false,
        error: None,
        failed,
    };

    if !control.init_check().is_ready() {
        let line = "Error initializing mixer control!";
        match control.init_error() {
            Some(cause) => writeln!(err, "{} ({}: {})", line, control.init_check(), cause)?,
            None => writeln!(err, "{} ({})", line, control.init_check())?,
        }
        report.error = Some(line.to_string());
        report.failed = true;
        return Ok(report);
    }

    match (control.volume(), control.limits()) {
        (Ok(volume), Ok(limits)) => {
            report.volume = Some(display_value(volume));
            report.limits = Some(limits);
        }
        (Err(e), _) | (_, Err(e)) => {
            let line = "Error getting volume from mixer!";
            writeln!(err, "{} ({})", line, e)?;
            report.error = Some(line.to_string());
            report.failed = true;
            return Ok(report);
        }
    }
    report.muted = control.is_muted().unwrap_or(false);

    if mute_op.is_none() && volume_op.is_none() {
        if let (Some(volume), Some(limits)) = (report.volume, report.limits) {
            writeln!(out, "{}", status_text(volume, limits, report.muted))?;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_must_be_positive() {
        assert_eq!(parse_timeout("2.5"), Ok(Duration::from_millis(2500)));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("-1").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn status_text_normalizes_negative_zero() {
        let limits = GainLimits { min: -60.0, max: 18.0, step: 0.5 };
        assert_eq!(
            status_text(-0.0, limits, false),
            "Volume: 0 (min=-60, max=18, step=0.5)\nState: Not Muted"
        );
    }
}
