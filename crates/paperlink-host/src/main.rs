use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use paperlink_core::Settings;
use paperlink_host::cli::Cli;
use paperlink_host::{
    ExitTriggers, ShutdownTrigger, StartupOutcome, WorkerReadiness, bootstrap,
    install_panic_hook, perform_shutdown, spawn_command_channel, spawn_log_renderer,
    startup_until_exit,
};
use tracing::{error, info};

/// Initialize tracing with stderr and a daily rolling file in the data
/// directory. Stdout is left to the rendered log lines.
///
/// Returns the file writer guard; logs stop reaching the file once it is
/// dropped.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let log_dir = match paperlink_core::paths::log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to get data root for logs: {e}");
            std::path::PathBuf::from(".")
        }
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory: {e}");
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "paperlink");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Priority: RUST_LOG env var > default (info for our crates, warn otherwise)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,paperlink=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI colors in files
                .compact(),
        )
        .try_init()
        .ok()?;

    Some(guard)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv();
    let _guard = init_tracing();

    let cli = Cli::parse();
    let settings = match Settings::from_env().and_then(|s| cli.apply(s)) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let ctx = match bootstrap(settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to bootstrap host");
            return ExitCode::FAILURE;
        }
    };

    info!("paperlink host starting");
    // Listen before the worker exists so no exit path can skip shutdown
    let mut triggers = ExitTriggers::install();
    install_panic_hook(&ctx.supervisor, triggers.sender());
    let renderer = spawn_log_renderer(&ctx);
    let commands = spawn_command_channel(&ctx);

    let readiness = match startup_until_exit(&ctx, &mut triggers).await {
        Ok(StartupOutcome::Started(readiness)) => readiness,
        Ok(StartupOutcome::Interrupted(trigger)) => {
            perform_shutdown(&ctx, trigger).await;
            let _ = tokio::join!(renderer, commands);
            return exit_code(trigger);
        }
        Err(e) => {
            error!(error = %e, "Startup failed");
            perform_shutdown(&ctx, ShutdownTrigger::StartupFailed).await;
            return ExitCode::FAILURE;
        }
    };

    if cli.keepalive_secs > 0 {
        ctx.bridge
            .spawn_keepalive(Duration::from_secs(cli.keepalive_secs), ctx.cancel.child_token());
    }

    let trigger = triggers.recv().await;
    perform_shutdown(&ctx, trigger).await;
    let _ = tokio::join!(renderer, commands);

    if let WorkerReadiness::LaunchFailed(reason) = readiness {
        error!(%reason, "Worker never started during this session; relaunch to retry");
        return ExitCode::FAILURE;
    }
    exit_code(trigger)
}

fn exit_code(trigger: ShutdownTrigger) -> ExitCode {
    if trigger.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
