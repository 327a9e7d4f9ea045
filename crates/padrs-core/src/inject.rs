// padrs Key Injection
// Synthetic key presses through a virtual keyboard device

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};

/// Error types for key injection
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("Failed to create injection device: {0}")]
    DeviceCreation(String),
}

/// Dispatches one synthetic key press.
///
/// Returns true on success; rule dispatch uses the flag to decide whether a
/// cooldown reset is warranted.
pub trait KeyInjector {
    /// Tap the key with the given evdev code.
    fn inject(&mut self, code: u16) -> bool;
}

/// Virtual uinput keyboard used to deliver rule key actions.
pub struct UinputInjector {
    device: VirtualDevice,
}

impl UinputInjector {
    /// Create the virtual keyboard.
    pub fn new() -> Result<Self, InjectError> {
        let mut keys = AttributeSet::new();
        // Advertise all standard keyboard keys (0-255)
        for code in 0..256u16 {
            keys.insert(Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?
            .name("padrs (virtual) Keyboard")
            .with_keys(&keys)
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?;

        Ok(Self { device })
    }

    fn write_key(&mut self, code: u16, value: i32) -> std::io::Result<()> {
        let key_event = InputEvent::new(EventType::KEY, code, value);
        // SYN event is required for the kernel to process the key event
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        self.device.emit(&[key_event, syn_event])
    }
}

impl KeyInjector for UinputInjector {
    fn inject(&mut self, code: u16) -> bool {
        let tapped = self
            .write_key(code, 1)
            .and_then(|()| self.write_key(code, 0));
        match tapped {
            Ok(()) => true,
            Err(e) => {
                log::warn!("key injection failed for code {}: {}", code, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injector_creation() {
        // Requires uinput access; may fail in containerized environments.
        match UinputInjector::new() {
            Ok(mut injector) => {
                // KEY_1
                assert!(injector.inject(2));
            }
            Err(InjectError::DeviceCreation(_)) => {
                println!("Skipping test: uinput not available");
            }
        }
    }
}
