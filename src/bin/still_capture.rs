//! Grab one frame of a monitor, with the hardware cursor composited, and
//! write it to an image file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;

use still_capture::monitor::{enumerate_monitors, monitors_to_json};
use still_capture::sink::default_output_path;
use still_capture::{
    CaptureConfig, CaptureOutcome, CaptureSession, FrameSize, RotationMode, SizingPolicy,
};

#[derive(Parser)]
#[command(name = "still-capture")]
#[command(about = "Capture a single desktop frame to BMP, TIFF, PNG or JPEG")]
struct Cli {
    /// Monitor index, as listed by --sources
    #[arg(short = 'i', long, default_value_t = 0, allow_negative_numbers = true)]
    monitor: i32,

    /// Draw the mouse cursor (0 or 1)
    #[arg(short = 'c', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    cursor: u8,

    /// Size mode: 0 normal, 1 stretch, 2 autosize, 3 center, 4 zoom
    #[arg(short = 's', long, default_value_t = 2)]
    size_mode: u32,

    /// Rotation: 0 auto, 1 identity, 2 90, 3 180, 4 270
    #[arg(short = 'r', long, default_value_t = 0)]
    rotation: u32,

    /// Output width (not used by autosize)
    #[arg(short = 'x', long, default_value_t = 0, allow_negative_numbers = true)]
    width: i32,

    /// Output height (not used by autosize)
    #[arg(short = 'y', long, default_value_t = 0, allow_negative_numbers = true)]
    height: i32,

    /// Output image; the format follows the extension. Defaults to
    /// ScreenShot.jpg in the documents folder
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print the attached monitors as JSON and exit
    #[arg(long)]
    sources: bool,
}

impl Cli {
    fn config(&self) -> Result<CaptureConfig> {
        let Some(sizing) = SizingPolicy::from_index(self.size_mode) else {
            bail!("size mode must be 0..=4, got {}", self.size_mode);
        };
        let Some(rotation) = RotationMode::from_index(self.rotation) else {
            bail!("rotation must be 0..=4, got {}", self.rotation);
        };
        Ok(CaptureConfig {
            monitor: self.monitor,
            show_cursor: self.cursor == 1,
            rotation,
            sizing,
            output_size: FrameSize::new(self.width, self.height),
        })
    }
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.sources {
        let monitors = enumerate_monitors().context("failed to enumerate monitors")?;
        println!("{}", serde_json::to_string_pretty(&monitors_to_json(&monitors))?);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(output_path) = cli.output.clone().or_else(default_output_path) else {
        bail!("no documents folder found; pass --output");
    };
    let output = output_path.as_path();
    let config = cli.config()?;

    let session = CaptureSession::new().context("failed to initialize capture session")?;
    session
        .set_config(config)
        .with_context(|| format!("failed to configure monitor {}", cli.monitor))?;
    let outcome = session
        .capture_to_file(output)
        .with_context(|| format!("failed to capture to {}", output.display()));
    session.terminate();

    match outcome? {
        CaptureOutcome::Captured { render_duration } => {
            log::info!(
                "wrote {} (render {:.3} ms)",
                output.display(),
                render_duration.as_secs_f64() * 1000.0
            );
            Ok(ExitCode::SUCCESS)
        }
        CaptureOutcome::Timeout => {
            eprintln!("no new frame was presented before the timeout");
            Ok(ExitCode::from(2))
        }
    }
}
