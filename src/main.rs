use anyhow::Result;
use clap::Parser;
use console::style;
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use video_frame_marker::component::FrameMarker;
use video_frame_marker::component::frame_marker::{AfterExport, KEY_HELP, RunOptions};
use video_frame_marker::config::Config;
use video_frame_marker::init;
use video_frame_marker::signal::setup_shutdown_signal;

/// Video frame scrubber and exporter
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a video file or a folder containing videos
    input_path: Option<PathBuf>,

    /// Display key bindings and exit
    #[arg(long, default_value_t = false)]
    usage: bool,

    /// Base output folder (folder mode asks interactively when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Move on to the next video right after a successful export
    #[arg(long, default_value_t = false)]
    advance_after_export: bool,

    /// Also write every displayed frame to this image path
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Append each export to `<video>/timestamps.csv`
    #[arg(long, default_value_t = false)]
    per_video_csv: bool,
}

fn main() -> ExitCode {
    init::init();
    let cli = Cli::parse();

    if cli.usage {
        println!("{KEY_HELP}");
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => {
            info!("Program exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            warn!("Program error: {e:#}");
            eprintln!("{} {e:#}", style("錯誤:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(input) = cli.input_path else {
        anyhow::bail!("未提供影片路徑（使用 --usage 查看操作說明）");
    };

    let shutdown_signal = setup_shutdown_signal();
    let config = Config::new()?;

    let options = RunOptions {
        input,
        output: cli.output,
        after_export: cli.advance_after_export.then_some(AfterExport::NextVideo),
        preview_path: cli.preview,
        per_video_csv: cli.per_video_csv,
    };

    FrameMarker::new(config, shutdown_signal).run(&options)?;
    Ok(())
}
