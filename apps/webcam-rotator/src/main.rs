use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use frame_rotate::{Frame, PixelFormat, RotationAngle, RotationControl};
use virtual_camera::{
    CameraSource, CaptureSession, LoggingBackend, LoggingPublisher, MockCamera, VirtualDevice,
};

mod config;
use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "webcam-rotator",
    version,
    about = "Rotate webcam frames and republish them as a virtual camera",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available cameras (the default selection is marked with *)
    ListCameras,
    /// Capture, rotate and publish until Ctrl-C. Type 0/90/180/270 on stdin to change rotation.
    Run {
        /// Config file (created with defaults if missing)
        #[arg(long, default_value = "webcam-rotator.json")]
        config: PathBuf,
        /// Camera id, overrides the config file
        #[arg(long)]
        device: Option<String>,
        /// Rotation in degrees clockwise, overrides the config file
        #[arg(long)]
        rotation: Option<RotationAngle>,
        /// Stop after this many published frames
        #[arg(long)]
        frames: Option<u64>,
        /// Print prometheus metrics on exit
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
    /// Rotate one synthetic frame and report the result
    Rotate {
        #[arg(long, default_value_t = 1280u32)]
        width: u32,
        #[arg(long, default_value_t = 720u32)]
        height: u32,
        /// Rotation in degrees clockwise
        #[arg(long, default_value = "90")]
        rotation: RotationAngle,
    },
    /// Write a default config file
    ConfigInit {
        #[arg(long, default_value = "webcam-rotator.json")]
        out: PathBuf,
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::ListCameras => list_cameras(),
        Commands::Run {
            config,
            device,
            rotation,
            frames,
            metrics,
        } => run(&config, device, rotation, frames, metrics).await,
        Commands::Rotate {
            width,
            height,
            rotation,
        } => rotate_once(width, height, rotation),
        Commands::ConfigInit { out, force } => config_init(&out, force),
    }
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn list_cameras() -> Result<()> {
    let devices = MockCamera::list()?;
    if devices.is_empty() {
        println!("No cameras available");
        return Ok(());
    }
    for (i, dev) in devices.iter().enumerate() {
        let mark = if i == 0 { '*' } else { ' ' };
        println!("{mark} {:<8} {} ({})", dev.id, dev.name, dev.driver);
    }
    Ok(())
}

async fn run(
    config_path: &Path,
    device: Option<String>,
    rotation: Option<RotationAngle>,
    frames: Option<u64>,
    show_metrics: bool,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if device.is_some() {
        config.device = device;
    }
    if let Some(angle) = rotation {
        config.rotation = angle;
    }

    let _virtual_device = VirtualDevice::acquire(LoggingBackend::default())?;
    let publisher = Arc::new(LoggingPublisher::new());
    let mut session = CaptureSession::<MockCamera>::new(publisher.clone(), config.session())?;
    if let Some(id) = &config.device {
        session.switch_camera(id)?;
    }
    session.set_rotation(config.rotation);
    session.start()?;
    spawn_rotation_input(session.rotation());

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("interrupted");
        }
        _ = wait_until_done(&session, frames) => {}
    }

    session.stop();
    if show_metrics {
        print!("{}", session.metrics().encode_text());
    }
    info!(published = publisher.frames_published(), "webcam-rotator exiting");
    Ok(())
}

async fn wait_until_done(session: &CaptureSession<MockCamera>, target: Option<u64>) {
    loop {
        if !session.is_running() {
            warn!("capture stopped on its own");
            return;
        }
        if target.is_some_and(|t| session.metrics().frames_published.get() >= t) {
            info!("frame target reached");
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Stdin stands in for the rotation menu: each line is an angle.
fn spawn_rotation_input(control: RotationControl) {
    let spawned = thread::Builder::new()
        .name("rotation-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<RotationAngle>() {
                    Ok(angle) => {
                        control.set(angle);
                        info!("rotation set to {angle}");
                    }
                    Err(e) => warn!("ignoring {line:?}: {e}"),
                }
            }
        });
    if let Err(e) = spawned {
        warn!("rotation input unavailable: {e}");
    }
}

fn rotate_once(width: u32, height: u32, angle: RotationAngle) -> Result<()> {
    let frame = synthetic_frame(width, height)?;
    let started = Instant::now();
    let out = frame_rotate::rotate(&frame, angle)?;
    let elapsed = started.elapsed();
    println!(
        "{}x{} -> {}x{} by {} in {:?} (pts {} ms)",
        frame.width,
        frame.height,
        out.width,
        out.height,
        angle,
        elapsed,
        out.pts.whole_milliseconds()
    );
    Ok(())
}

fn synthetic_frame(width: u32, height: u32) -> Result<Frame> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .with_context(|| format!("{width}x{height} frame is too large"))?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .with_context(|| format!("cannot allocate {len} bytes for a {width}x{height} frame"))?;
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[x as u8, y as u8, 0x80, 0xFF]);
        }
    }
    Ok(Frame::new(
        width,
        height,
        PixelFormat::Bgra8,
        data,
        time::Duration::milliseconds(33),
    ))
}

fn config_init(out: &Path, force: bool) -> Result<()> {
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }
    Config::default().save(out)?;
    println!("wrote {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "webcam-rotator",
            "run",
            "--device",
            "mock1",
            "--rotation",
            "270",
            "--frames",
            "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                device,
                rotation,
                frames,
                ..
            } => {
                assert_eq!(device.as_deref(), Some("mock1"));
                assert_eq!(rotation, Some(RotationAngle::Deg270));
                assert_eq!(frames, Some(10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_odd_angle() {
        assert!(Cli::try_parse_from(["webcam-rotator", "rotate", "--rotation", "45"]).is_err());
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        config_init(&path, false).unwrap();
        assert!(config_init(&path, false).is_err());
        assert!(config_init(&path, true).is_ok());
    }

    #[test]
    fn test_synthetic_frame_rotates() {
        let frame = synthetic_frame(3, 2).unwrap();
        let out = frame_rotate::rotate(&frame, RotationAngle::Deg90).unwrap();
        assert_eq!((out.width, out.height), (2, 3));
    }

    #[test]
    fn test_synthetic_frame_too_large_is_error() {
        assert!(synthetic_frame(u32::MAX, u32::MAX).is_err());
        assert!(synthetic_frame(u32::MAX, 1 << 20).is_err());
        assert!(rotate_once(u32::MAX, u32::MAX, RotationAngle::Deg90).is_err());
    }
}
