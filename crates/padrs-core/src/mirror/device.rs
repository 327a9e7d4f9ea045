// padrs Physical Controller Interface
// Enumeration, acquisition and snapshot polling of the physical device

/// Result type for physical controller operations
pub type PadResult<T> = Result<T, PadError>;

/// Errors raised by the physical controller layer.
///
/// [`PadError::InputLost`] is the only transient variant: the mirror loop
/// answers it with a reacquire attempt. Everything else is fatal to the
/// mirror subsystem.
#[derive(Debug, thiserror::Error)]
pub enum PadError {
    #[error("No controller device found")]
    NoDevice,

    #[error("Controller input lost")]
    InputLost,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Controller device error: {0}")]
    Device(String),
}

/// Class of an acquired physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Gamepad-class device, preferred during enumeration.
    Gamepad,
    /// Generic joystick-class fallback.
    Joystick,
}

/// One snapshot of physical controller state.
///
/// Stick and trigger axes are normalized to the raw 0..=65535 range with
/// 32768 as the stick center. `buttons` holds the first ten physical
/// buttons in ordinal order. `hat` is the hat-switch angle in centidegrees
/// ([0, 36000)), or `None` when the hat is neutral or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadSample {
    pub left_x: u16,
    pub left_y: u16,
    pub right_x: u16,
    pub right_y: u16,
    pub left_trigger: u16,
    pub right_trigger: u16,
    pub buttons: [bool; 10],
    pub hat: Option<u16>,
}

impl PadSample {
    /// A resting sample: sticks centered, triggers and buttons released.
    pub fn centered() -> Self {
        Self {
            left_x: 32768,
            left_y: 32768,
            right_x: 32768,
            right_y: 32768,
            left_trigger: 0,
            right_trigger: 0,
            buttons: [false; 10],
            hat: None,
        }
    }
}

impl Default for PadSample {
    fn default() -> Self {
        Self::centered()
    }
}

/// Device information for listing controllers.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device index
    pub index: usize,
    /// Device name
    pub name: String,
    /// Device path (if available)
    pub path: Option<String>,
    /// Detected class
    pub class: DeviceClass,
}

/// An acquired physical controller.
pub trait PadDevice {
    /// Device display name.
    fn name(&self) -> &str;

    /// Detected device class.
    fn class(&self) -> DeviceClass;

    /// Read the current state snapshot.
    fn poll(&mut self) -> PadResult<PadSample>;
}

/// Enumerates and acquires physical controllers.
///
/// The mirror loop calls [`PadClient::acquire`] once at startup and again
/// after every [`PadError::InputLost`], so implementations must tolerate
/// repeated acquisition.
pub trait PadClient {
    /// Find and open the preferred controller.
    ///
    /// Scans gamepad-class devices first and falls back to joystick-class
    /// devices; returns [`PadError::NoDevice`] when neither exists.
    fn acquire(&mut self) -> PadResult<Box<dyn PadDevice + Send>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_sample() {
        let sample = PadSample::centered();
        assert_eq!(sample.left_x, 32768);
        assert_eq!(sample.left_trigger, 0);
        assert!(sample.buttons.iter().all(|b| !b));
        assert_eq!(sample.hat, None);
    }

    #[test]
    fn test_input_lost_is_distinct_from_device_error() {
        let transient = PadError::InputLost;
        let fatal = PadError::Device("firmware fault".to_string());
        assert!(matches!(transient, PadError::InputLost));
        assert!(!matches!(fatal, PadError::InputLost));
    }
}
