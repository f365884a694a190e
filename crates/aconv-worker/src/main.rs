//! Batch audio converter binary.

use clap::Parser;
use tracing::{error, info};

use aconv_media::check_ffmpeg;
use aconv_models::OutputFormat;
use aconv_worker::logging::init_tracing;
use aconv_worker::{
    BatchController, Cli, Collaborators, ConverterConfig, DesktopNotifier, Notifier, WorkerError,
};

const ERROR_TITLE: &str = "Audio Converter - Error";

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    std::process::exit(runtime.block_on(run(Cli::parse())));
}

async fn run(cli: Cli) -> i32 {
    let config = ConverterConfig::from_env();
    info!("Converter config: {:?}", config);
    let notifier = DesktopNotifier::default();

    let request = match cli.into_request() {
        Ok(request) => request,
        Err(e) => {
            error!("{}", e);
            notifier.error_dialog(ERROR_TITLE, &usage_message(&e)).await;
            return 1;
        }
    };

    if let Err(e) = check_ffmpeg(&config.ffmpeg_bin) {
        error!("{}", e);
        notifier
            .error_dialog(
                ERROR_TITLE,
                "ffmpeg not found.\n\nInstall it with your package manager, e.g.:\n  sudo apt install ffmpeg",
            )
            .await;
        return 1;
    }

    let collaborators = Collaborators::desktop(&config);
    let controller = BatchController::new(config, collaborators);
    let result = controller.run(&request).await;

    info!(
        done = result.done,
        total = result.total,
        failed = result.errors.len(),
        cancelled = result.cancelled,
        "Converter finished"
    );
    0
}

fn usage_message(err: &WorkerError) -> String {
    match err {
        WorkerError::UnknownFormat(_) => format!(
            "{}\n\nSupported: {}",
            err,
            OutputFormat::supported_list()
        ),
        _ => err.to_string(),
    }
}
