//! Startup, session and orderly shutdown.

use std::io;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::{self, Sender};
use log::{error, info, warn};
use tonegen_backend::{
    CallbackSlot, ConfigNegotiator, ConfigurationRequest, DeviceReport, OutputStream,
    PerformanceMonitor, SourceProcessor, ToneOscillator, default_output_device,
};
use tonegen_core::{ControlState, ToneConfig};

use crate::control_surface::{ControlSurface, Exit};
use crate::keyboard::{RawModeGuard, TerminalKeys};

/// Smoothing for the callback timing average.
const TIMING_EMA_ALPHA: f64 = 0.1;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shutdown {
    UserQuit,
    StreamFailed(String),
    InputFailed(String),
}

impl Shutdown {
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::UserQuit => Ok(()),
            Self::StreamFailed(msg) => Err(anyhow!("audio stream failed: {}", msg)),
            Self::InputFailed(msg) => Err(anyhow!("keyboard input failed: {}", msg)),
        }
    }
}

pub fn run(config: ToneConfig) -> Result<()> {
    info!("Initializing audio...");
    let (device, device_info) = default_output_device().context("no usable output device")?;
    DeviceReport::probe(&device).log();

    let request = ConfigurationRequest::from(&config);
    let negotiated = ConfigNegotiator::negotiate(&device_info, &request)
        .with_context(|| format!("cannot configure {}", device_info.name))?;
    if !negotiated.sample_rate_matched {
        warn!(
            "{} does not support {} Hz, using {} Hz",
            device_info.name, config.sample_rate, negotiated.sample_rate
        );
    }
    info!(
        "Output: {} ({}), ~{:.1} ms per buffer",
        device_info,
        negotiated,
        ConfigNegotiator::calculate_latency_ms(negotiated.sample_rate, negotiated.nominal_frames() as u32)
    );

    let controls = Arc::new(config.control_state());
    let sample_rate = negotiated.sample_rate as f32;
    let monitor = Arc::new(PerformanceMonitor::new(
        negotiated.nominal_frames(),
        sample_rate,
        TIMING_EMA_ALPHA,
    ));
    let slot = Arc::new(CallbackSlot::new(
        Box::new(SourceProcessor::new(ToneOscillator::new(Arc::clone(&controls)))),
        sample_rate,
        negotiated.channels as usize,
        Arc::clone(&monitor),
    ));

    let (shutdown_tx, shutdown_rx) = channel::unbounded();

    let stream = {
        let controls = Arc::clone(&controls);
        let tx = shutdown_tx.clone();
        OutputStream::build(&device, &negotiated, Arc::clone(&slot), move |err| {
            error!("output stream error: {}", err);
            controls.stop();
            let _ = tx.send(Shutdown::StreamFailed(err.to_string()));
        })?
    };
    stream.play()?;

    let raw_mode = RawModeGuard::enable().context("failed to enable raw terminal mode")?;
    let control_thread = spawn_control_surface(Arc::clone(&controls), shutdown_tx)?;

    let reason = shutdown_rx
        .recv()
        .unwrap_or_else(|_| Shutdown::InputFailed("control surface exited unexpectedly".into()));

    // Silence the render path first, then tear down in reverse order of setup.
    controls.stop();
    if let Err(e) = stream.pause() {
        warn!("{}", e);
    }
    drop(stream);
    if control_thread.join().is_err() {
        warn!("control surface thread panicked");
    }
    drop(raw_mode);

    info!("Played {:.1} s of audio", slot.playback_time());
    info!("Render stats: {}", monitor.snapshot(false));
    reason.into_result()
}

fn spawn_control_surface(
    controls: Arc<ControlState>,
    shutdown: Sender<Shutdown>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("control-surface".into())
        .spawn(move || {
            let reporter = PanicReporter {
                controls: Arc::clone(&controls),
                shutdown,
            };
            let mut surface = ControlSurface::new(TerminalKeys::default(), io::stdout(), controls);
            let reason = match surface.run() {
                Ok(Exit::UserQuit) => Shutdown::UserQuit,
                // whoever stopped the controls has already reported why
                Ok(Exit::Stopped) => return,
                Err(e) => {
                    reporter.controls.stop();
                    Shutdown::InputFailed(e.to_string())
                }
            };
            let _ = reporter.shutdown.send(reason);
        })
}

/// Reports a panic on the control thread. The stream's error hook keeps a
/// sender alive, so the driver would otherwise wait forever.
struct PanicReporter {
    controls: Arc<ControlState>,
    shutdown: Sender<Shutdown>,
}

impl Drop for PanicReporter {
    fn drop(&mut self) {
        if thread::panicking() {
            self.controls.stop();
            let _ = self
                .shutdown
                .send(Shutdown::InputFailed("control surface panicked".into()));
        }
    }
}
