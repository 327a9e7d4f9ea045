// padrs Input Mirror Service
// Background physical-to-virtual mirroring loop with injected presses

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::mirror::device::{PadClient, PadError};
use crate::mirror::mapping::PadButton;
use crate::mirror::report::{PadReport, VirtualPad, VirtualPadError};

/// Lifecycle state of the mirror subsystem, kept current for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    Uninitialized,
    Enumerating,
    /// Terminal: no physical controller exists; the mirror took no action.
    NoDeviceFound,
    Polling,
    Reacquiring,
    /// Terminal: external stop observed, both handles released.
    Stopped,
    /// Terminal: unrecoverable device error.
    Failed(String),
}

impl fmt::Display for MirrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorStatus::Uninitialized => write!(f, "uninitialized"),
            MirrorStatus::Enumerating => write!(f, "enumerating devices"),
            MirrorStatus::NoDeviceFound => write!(f, "no controller found"),
            MirrorStatus::Polling => write!(f, "mirroring"),
            MirrorStatus::Reacquiring => write!(f, "reacquiring controller"),
            MirrorStatus::Stopped => write!(f, "stopped"),
            MirrorStatus::Failed(detail) => write!(f, "failed: {}", detail),
        }
    }
}

/// Errors from mirror startup.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("virtual controller: {0}")]
    Virtual(#[from] VirtualPadError),

    #[error("mirror thread: {0}")]
    Spawn(std::io::Error),
}

/// Timing knobs of the mirror loop.
#[derive(Debug, Clone, Copy)]
pub struct MirrorConfig {
    /// Sampling period of the polling loop.
    pub poll_interval: Duration,
    /// Wait after a failed reacquire attempt before trying again.
    pub reacquire_delay: Duration,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(16),
            reacquire_delay: Duration::from_secs(1),
        }
    }
}

struct Output {
    pad: Box<dyn VirtualPad + Send>,
    report: PadReport,
}

struct Shared {
    /// Virtual pad plus last-submitted report; `None` once released.
    output: Mutex<Option<Output>>,
    /// Raised for the whole duration of an injected press. Checked by the
    /// polling path under the report lock, so a press in progress is never
    /// overwritten by passthrough state.
    injecting: AtomicBool,
    stop: AtomicBool,
    status: Mutex<MirrorStatus>,
}

impl Shared {
    fn set_status(&self, status: MirrorStatus) {
        log::debug!("mirror status: {}", status);
        *self.status.lock() = status;
    }

    fn release_virtual(&self) {
        let mut guard = self.output.lock();
        if let Some(out) = guard.as_mut() {
            out.pad.disconnect();
        }
        *guard = None;
    }
}

/// Cloneable handle for consumers of the mirror: rule dispatch and status
/// display.
#[derive(Clone)]
pub struct MirrorHandle {
    shared: Arc<Shared>,
}

impl MirrorHandle {
    /// Current lifecycle state.
    pub fn status(&self) -> MirrorStatus {
        self.shared.status.lock().clone()
    }

    /// Display string for the host's status line.
    pub fn status_string(&self) -> String {
        self.status().to_string()
    }

    /// Whether the mirror can currently accept injected presses.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status(),
            MirrorStatus::Polling | MirrorStatus::Reacquiring
        )
    }

    /// Press and release a virtual button, holding it for `hold`.
    ///
    /// Blocks the caller for the hold duration; that blocking is the whole
    /// point of the call. Returns true only when both the press and the
    /// release report were submitted. While the press is in flight the
    /// polling loop submits nothing, so passthrough input cannot overwrite
    /// the held button.
    pub fn press_button(&self, button: PadButton, hold: Duration) -> bool {
        if !self.is_active() {
            return false;
        }

        self.shared.injecting.store(true, Ordering::SeqCst);
        let pressed = {
            let mut guard = self.shared.output.lock();
            match guard.as_mut() {
                Some(out) => {
                    out.report.set_button(button, true);
                    match out.report.write_to(out.pad.as_mut()) {
                        Ok(()) => true,
                        Err(e) => {
                            log::warn!("injected press failed: {}", e);
                            false
                        }
                    }
                }
                None => false,
            }
        };

        if pressed {
            thread::sleep(hold);
        }

        // Restore the released state even when the press submit failed, so
        // the shared report never keeps a phantom hold.
        let released = {
            let mut guard = self.shared.output.lock();
            match guard.as_mut() {
                Some(out) => {
                    out.report.set_button(button, false);
                    match out.report.write_to(out.pad.as_mut()) {
                        Ok(()) => true,
                        Err(e) => {
                            log::warn!("injected release failed: {}", e);
                            false
                        }
                    }
                }
                None => false,
            }
        };
        self.shared.injecting.store(false, Ordering::SeqCst);

        pressed && released
    }
}

/// The physical-to-virtual mirroring subsystem.
///
/// Owns the background polling thread. Stopping (or dropping) releases the
/// virtual controller, joins the thread and is safe to repeat.
pub struct InputMirror {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl InputMirror {
    /// Connect the virtual pad and start the mirror thread.
    ///
    /// A virtual-device failure here is reported to the caller as a
    /// disabled subsystem, not a panic.
    pub fn spawn(
        client: Box<dyn PadClient + Send>,
        mut pad: Box<dyn VirtualPad + Send>,
        config: MirrorConfig,
    ) -> Result<Self, MirrorError> {
        pad.connect()?;
        let shared = Arc::new(Shared {
            output: Mutex::new(Some(Output {
                pad,
                report: PadReport::new(),
            })),
            injecting: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            status: Mutex::new(MirrorStatus::Uninitialized),
        });

        let loop_shared = shared.clone();
        let thread = thread::Builder::new()
            .name("padrs-mirror".to_string())
            .spawn(move || run_mirror(client, loop_shared, config))
            .map_err(MirrorError::Spawn)?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Handle for rule dispatch and status display.
    pub fn handle(&self) -> MirrorHandle {
        MirrorHandle {
            shared: self.shared.clone(),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> MirrorStatus {
        self.shared.status.lock().clone()
    }

    /// Signal the loop to stop, join it, and release the devices.
    ///
    /// Idempotent: safe to call repeatedly and before the loop ever
    /// acquired a device.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        // The loop releases on its way out; cover early-exit paths too.
        self.shared.release_virtual();
    }
}

impl Drop for InputMirror {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_mirror(mut client: Box<dyn PadClient + Send>, shared: Arc<Shared>, config: MirrorConfig) {
    shared.set_status(MirrorStatus::Enumerating);
    let mut device = match client.acquire() {
        Ok(device) => device,
        Err(PadError::NoDevice) => {
            log::warn!("no physical controller found, mirror disabled");
            shared.set_status(MirrorStatus::NoDeviceFound);
            shared.release_virtual();
            return;
        }
        Err(e) => {
            log::error!("controller enumeration failed: {}", e);
            shared.set_status(MirrorStatus::Failed(e.to_string()));
            shared.release_virtual();
            return;
        }
    };
    shared.set_status(MirrorStatus::Polling);

    'poll: loop {
        if shared.stop.load(Ordering::SeqCst) {
            break 'poll;
        }

        match device.poll() {
            Ok(sample) => {
                if !shared.injecting.load(Ordering::SeqCst) {
                    let mut guard = shared.output.lock();
                    if let Some(out) = guard.as_mut() {
                        // Recheck under the lock: a press that started while
                        // we waited must not be overwritten.
                        if !shared.injecting.load(Ordering::SeqCst) {
                            out.report = PadReport::from_sample(&sample);
                            if let Err(e) = out.report.write_to(out.pad.as_mut()) {
                                log::warn!("virtual report submit failed: {}", e);
                            }
                        }
                    }
                }
                thread::sleep(config.poll_interval);
            }
            Err(PadError::InputLost) => {
                log::warn!("controller input lost, reacquiring");
                shared.set_status(MirrorStatus::Reacquiring);
                loop {
                    if shared.stop.load(Ordering::SeqCst) {
                        break 'poll;
                    }
                    match client.acquire() {
                        Ok(next) => {
                            device = next;
                            shared.set_status(MirrorStatus::Polling);
                            break;
                        }
                        Err(PadError::NoDevice) | Err(PadError::InputLost) => {
                            thread::sleep(config.reacquire_delay);
                        }
                        Err(e) => {
                            log::error!("controller reacquire failed: {}", e);
                            shared.set_status(MirrorStatus::Failed(e.to_string()));
                            shared.release_virtual();
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("controller error, stopping mirror: {}", e);
                shared.set_status(MirrorStatus::Failed(e.to_string()));
                shared.release_virtual();
                return;
            }
        }
    }

    shared.set_status(MirrorStatus::Stopped);
    shared.release_virtual();
    drop(device);
}
