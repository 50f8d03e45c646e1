use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use volume_control::cli::{self, Args, Backend};
use volume_control::notification::{DesktopNotifier, NotificationSink};
use volume_control::{AudioSubsystem, GainLimits, MemoryMixer, RemoteMixer, VolumeControl};

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match args.backend {
        Backend::Remote => execute(&RemoteMixer::new(args.mixer_config()), &args),
        Backend::Memory => {
            let limits = GainLimits { min: -60.0, max: 18.0, step: 0.5 };
            execute(&MemoryMixer::new(limits, 0.0), &args)
        }
    }
}

fn execute<S: AudioSubsystem>(subsystem: &S, args: &Args) -> ExitCode {
    let control = VolumeControl::discover(subsystem);

    let report = {
        let stdout = io::stdout();
        let stderr = io::stderr();
        match cli::run(&control, args, &mut stdout.lock(), &mut stderr.lock()) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Failed to write output: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };

    if let Some(timeout) = args.notify_timeout() {
        let notification = report.notification(timeout);
        if let Err(e) = DesktopNotifier::connect().and_then(|notifier| notifier.send(&notification)) {
            eprintln!("Couldn't show notification: {}", e);
        }
    }

    report.exit_code()
}
