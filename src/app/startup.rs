use crate::app::cli::args::Args;
use crate::app::cli::config::{load_config, Settings};
use crate::app::demo::{run_demo, DemoReport};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{flush_logging, init_logging};
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::version;
use crate::queue::{QueueError, QueueRegistry};
use clap::Parser;
use std::io::IsTerminal;

/// Parse arguments, set up logging and run the demo; returns the exit code
pub async fn startup() -> i32 {
    let args = Args::parse();

    // Configuration problems are reported before logging exists
    let file_config = match load_config(args.config_file.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let settings = match Settings::resolve(&args, file_config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let use_color = settings
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    let log_file = settings
        .log_file
        .as_ref()
        .map(|path| path.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        Some(&settings.log_level),
        Some(&settings.log_format),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return 1;
    }

    log::info!("exec-queue {} starting", version::version_banner());

    let exit_code = match run(settings).await {
        Ok(report) => {
            for queue in &report.queues {
                log::info!(
                    "eq_id[{}] {}: {} executed, {} cancelled, {} batch(es)",
                    queue.queue_id,
                    queue.name,
                    queue.stats.executed,
                    queue.stats.cancelled,
                    queue.stats.batches
                );
            }
            0
        }
        Err(e) => {
            log_error_with_context(&e, "Running execution queue demo");
            1
        }
    };
    flush_logging();
    exit_code
}

/// Run the demo under signal handling; a signal drains every queue instead
async fn run(settings: Settings) -> Result<DemoReport, QueueError> {
    let registry = QueueRegistry::from_current_runtime()?;

    ShutdownCoordinator::guard(|_coordinator, mut shutdown_rx| async move {
        let outcome = tokio::select! {
            result = run_demo(&registry, &settings.demo) => result,
            _ = shutdown_rx.recv() => {
                log::warn!("Shutdown requested; draining execution queues");
                Ok(DemoReport::default())
            }
        };

        let removed = registry.shutdown().await?;
        if removed > 0 {
            log::info!("Drained {} execution queue(s) on shutdown", removed);
        }
        outcome
    })
    .await
}
