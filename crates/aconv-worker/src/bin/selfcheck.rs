use std::path::Path;

use aconv_media::{check_ffmpeg, check_ffprobe, ProgressReport};
use aconv_worker::desktop::find_qdbus;
use aconv_worker::ConverterConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ConverterConfig::from_env();

    println!(
        "aconv-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_tools(&config)?;
    report_display_tooling();

    println!("aconv-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    // Progress files must be creatable there.
    let report = ProgressReport::create_in(path)
        .map_err(|e| anyhow::anyhow!("work dir {} not writable: {}", path.display(), e))?;
    report.close();
    Ok(())
}

fn ensure_tools(config: &ConverterConfig) -> anyhow::Result<()> {
    let ffmpeg = check_ffmpeg(&config.ffmpeg_bin)?;
    println!("aconv-selfcheck: ffmpeg at {}", ffmpeg.display());
    let ffprobe = check_ffprobe(&config.ffprobe_bin)?;
    println!("aconv-selfcheck: ffprobe at {}", ffprobe.display());
    Ok(())
}

fn report_display_tooling() {
    match which::which("kdialog") {
        Ok(path) => println!("aconv-selfcheck: kdialog at {}", path.display()),
        Err(_) => println!("aconv-selfcheck: kdialog missing; no progress window or prompts"),
    }
    match find_qdbus() {
        Some(path) => println!("aconv-selfcheck: qdbus at {}", path.display()),
        None => println!("aconv-selfcheck: qdbus missing; cancellation cannot be detected"),
    }
}
