use std::time::Instant;

use anyhow::{Context, Result};
use still_capture::{
    CaptureConfig, CaptureOutcome, CaptureSession, FrameSize, RotationMode, SizingPolicy,
    frame::Frame,
};

fn capture_policy(session: &CaptureSession, sizing: SizingPolicy, output_path: &str) -> Result<()> {
    let config = CaptureConfig {
        sizing,
        rotation: RotationMode::Auto,
        output_size: FrameSize::new(800, 600),
        ..CaptureConfig::default()
    };

    let begin = Instant::now();
    session
        .set_config(config)
        .with_context(|| format!("failed to configure {sizing:?}"))?;
    println!(
        "Configured {sizing:?} in {:.3} ms",
        begin.elapsed().as_secs_f64() * 1000.0
    );

    match session
        .capture_to_file(output_path)
        .with_context(|| format!("failed to capture {sizing:?}"))?
    {
        CaptureOutcome::Captured { render_duration } => println!(
            "Saved {sizing:?} capture to {output_path} (render {:.3} ms)",
            render_duration.as_secs_f64() * 1000.0
        ),
        CaptureOutcome::Timeout => println!("{sizing:?}: no frame before timeout"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let session = CaptureSession::new().context("failed to initialize capture session")?;
    for monitor in session.monitors()? {
        println!("{monitor}");
    }

    capture_policy(&session, SizingPolicy::AutoSize, "./capture-autosize.png")?;
    capture_policy(&session, SizingPolicy::Stretch, "./capture-stretch.png")?;
    capture_policy(&session, SizingPolicy::Center, "./capture-center.bmp")?;
    capture_policy(&session, SizingPolicy::Zoom, "./capture-zoom.jpg")?;

    // Reuse one canvas across captures.
    let mut canvas = Frame::empty();
    for _ in 0..3 {
        let begin = Instant::now();
        let outcome = session.capture_into(&mut canvas)?;
        println!(
            "{outcome:?}: {}x{} in {:.3} ms",
            canvas.width(),
            canvas.height(),
            begin.elapsed().as_secs_f64() * 1000.0
        );
    }

    session.terminate();
    Ok(())
}
