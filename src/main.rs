use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mergesplit::MergeSplitError;
use mergesplit::cli::Cli;
use mergesplit::job::{JobController, JobEvent, JobOutcome};
use mergesplit::output::OutputFormatter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {err}");
    }

    let code = match run(cli).await {
        Ok(outcome) if outcome.is_cancelled() => MergeSplitError::Cancelled.exit_code(),
        Ok(outcome) if outcome.has_failures() => 1,
        Ok(_) => 0,
        Err(err) => {
            let code = err
                .downcast_ref::<MergeSplitError>()
                .map_or(1, MergeSplitError::exit_code);
            eprintln!("✗ Error: {err:#}");
            code
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<JobOutcome> {
    cli.validate()?;
    let settings = cli.to_settings()?;
    debug!(?settings, "Settings resolved");

    tokio::fs::create_dir_all(&settings.output_base)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory {}",
                settings.output_base.display()
            )
        })?;

    let request = cli.to_request()?;
    if let Some(folder) = cli.merge_folder() {
        debug!(folder = %folder.display(), files = request.selection.len(), "Folder listed");
    }
    let controller = JobController::new(settings);
    let mut handle = controller.start(request)?;
    let mut formatter = OutputFormatter::new(cli.quiet, cli.verbose).with_json(cli.json);

    let cancel = handle.cancel_token();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            result = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if let Err(err) = result {
                    warn!("Failed to listen for Ctrl-C: {}", err);
                    continue;
                }
                formatter.warning("Cancelling...");
                cancel.cancel();
            }
            event = handle.next_event() => match event {
                Some(event) => {
                    formatter.event(&event);
                    if matches!(event, JobEvent::Finished { .. }) {
                        break;
                    }
                }
                None => break,
            }
        }
    }

    Ok(handle.wait().await?)
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}
