// padrs Daemon CLI
// Standalone controller mirror daemon

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;

use padrs_core::mirror::{EvdevPadClient, InputMirror, MirrorStatus, UinputPad};
use padrs_core::settings::Settings;

/// Controller mirror daemon for game automation overlays
#[derive(Parser, Debug)]
#[command(name = "padrs")]
#[command(author = "padrs contributors")]
#[command(version = "0.3.0")]
#[command(about = "Physical-to-virtual controller mirror daemon", long_about = None)]
struct Args {
    /// TOML settings file (default: ~/.config/padrs/settings.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate settings and exit
    #[arg(long)]
    check_config: bool,

    /// List available controller devices
    #[arg(long)]
    list_devices: bool,
}

/// Main application state
struct Application {
    settings: Settings,
    /// Flag to signal the status loop to stop
    running: Arc<AtomicBool>,
}

impl Application {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// List available controller devices
    fn list_devices() -> anyhow::Result<()> {
        match EvdevPadClient::list_devices() {
            Ok(devices) => {
                println!("Found {} controller device(s):", devices.len());
                for device in &devices {
                    match &device.path {
                        Some(path) => println!(
                            "  {}: {} ({:?}, {})",
                            device.index, device.name, device.class, path
                        ),
                        None => println!("  {}: {} ({:?})", device.index, device.name, device.class),
                    }
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("Error finding controller devices: {}", e);
                Err(e.into())
            }
        }
    }

    /// Install SIGINT/SIGTERM handling for graceful shutdown
    fn install_signal_handler(&self) {
        use signal_hook::iterator::Signals;
        let running = self.running.clone();

        std::thread::spawn(move || {
            if let Ok(mut signals) =
                Signals::new([signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM])
            {
                for signal in &mut signals {
                    match signal {
                        signal_hook::consts::SIGINT | signal_hook::consts::SIGTERM => {
                            println!("\nReceived signal, shutting down gracefully...");
                            running.store(false, Ordering::SeqCst);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        });
    }

    /// Run the mirror until a terminal status or a shutdown signal
    fn run(&self) -> anyhow::Result<()> {
        if !self.settings.controller_enabled() {
            return Err(anyhow!("controller mirror is disabled in settings"));
        }

        self.install_signal_handler();

        let client = Box::new(EvdevPadClient::new());
        let pad = Box::new(UinputPad::new());
        let mut mirror = InputMirror::spawn(client, pad, self.settings.mirror_config())
            .context("starting controller mirror")?;

        println!("padrs is running. Press Ctrl+C to exit.");

        let mut last_status = MirrorStatus::Uninitialized;
        while self.running.load(Ordering::SeqCst) {
            let status = mirror.status();
            if status != last_status {
                println!("Controller: {}", status);
                last_status = status.clone();
            }
            match status {
                MirrorStatus::NoDeviceFound
                | MirrorStatus::Stopped
                | MirrorStatus::Failed(_) => break,
                _ => {}
            }
            std::thread::sleep(Duration::from_millis(250));
        }

        mirror.stop();
        println!("Controller: {}", mirror.status());
        Ok(())
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Settings::load_default().context("loading default settings"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    // Handle list-devices flag (doesn't require settings)
    if args.list_devices {
        return Application::list_devices();
    }

    let settings = load_settings(&args)?;

    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    Application::new(settings).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["padrs", "--config", "/tmp/test.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
        assert!(!args.verbose);
        assert!(!args.check_config);
        assert!(!args.list_devices);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from(["padrs", "--verbose", "--check-config"]);
        assert!(args.verbose);
        assert!(args.check_config);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_args_list_devices() {
        let args = Args::parse_from(["padrs", "--list-devices"]);
        assert!(args.list_devices);
    }
}
