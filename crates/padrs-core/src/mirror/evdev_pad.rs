// padrs evdev Controller Client
// Direct evdev access for physical controller enumeration and sampling

use evdev::{AbsoluteAxisType, Device, Key};

use crate::mirror::device::{
    DeviceClass, DeviceInfo, PadClient, PadDevice, PadError, PadResult, PadSample,
};
/// Virtual device prefix to filter out
const VIRT_DEVICE_PREFIX: &str = "padrs (virtual)";

const GAMEPAD_BUTTONS: [Key; 10] = [
    Key::BTN_SOUTH,
    Key::BTN_EAST,
    Key::BTN_NORTH,
    Key::BTN_WEST,
    Key::BTN_TL,
    Key::BTN_TR,
    Key::BTN_SELECT,
    Key::BTN_START,
    Key::BTN_THUMBL,
    Key::BTN_THUMBR,
];

const JOYSTICK_BUTTONS: [Key; 10] = [
    Key::BTN_TRIGGER,
    Key::BTN_THUMB,
    Key::BTN_THUMB2,
    Key::BTN_TOP,
    Key::BTN_TOP2,
    Key::BTN_PINKIE,
    Key::BTN_BASE,
    Key::BTN_BASE2,
    Key::BTN_BASE3,
    Key::BTN_BASE4,
];

/// Physical controller client backed by evdev device nodes.
///
/// Enumeration prefers gamepad-class devices (BTN_SOUTH present) and falls
/// back to joystick-class devices (BTN_TRIGGER present). The mirror's own
/// virtual device is filtered out to prevent a feedback loop.
#[derive(Debug, Default)]
pub struct EvdevPadClient;

impl EvdevPadClient {
    pub fn new() -> Self {
        Self
    }

    /// List all candidate controllers without acquiring one.
    pub fn list_devices() -> PadResult<Vec<DeviceInfo>> {
        let mut infos = Vec::new();
        let mut index = 0;
        for (path, device) in evdev::enumerate() {
            let Some(class) = device_class(&device) else {
                continue;
            };
            infos.push(DeviceInfo {
                index,
                name: device.name().unwrap_or("Unknown").to_string(),
                path: path.to_str().map(|s| s.to_string()),
                class,
            });
            index += 1;
        }
        if infos.is_empty() {
            return Err(PadError::NoDevice);
        }
        Ok(infos)
    }

    fn find(class_wanted: DeviceClass) -> Option<Device> {
        for (_path, device) in evdev::enumerate() {
            if device_class(&device) == Some(class_wanted) {
                return Some(device);
            }
        }
        None
    }
}

fn is_virtual_pad(device: &Device) -> bool {
    device
        .name()
        .map(|n| n.starts_with(VIRT_DEVICE_PREFIX))
        .unwrap_or(false)
}

fn device_class(device: &Device) -> Option<DeviceClass> {
    if is_virtual_pad(device) {
        return None;
    }
    let keys = device.supported_keys()?;
    if keys.contains(Key::BTN_SOUTH) {
        Some(DeviceClass::Gamepad)
    } else if keys.contains(Key::BTN_TRIGGER) {
        Some(DeviceClass::Joystick)
    } else {
        None
    }
}

impl PadClient for EvdevPadClient {
    fn acquire(&mut self) -> PadResult<Box<dyn PadDevice + Send>> {
        let (device, class) = match Self::find(DeviceClass::Gamepad) {
            Some(d) => (d, DeviceClass::Gamepad),
            None => match Self::find(DeviceClass::Joystick) {
                Some(d) => (d, DeviceClass::Joystick),
                None => return Err(PadError::NoDevice),
            },
        };
        let name = device.name().unwrap_or("Unknown").to_string();
        log::info!("controller acquired: '{}' ({:?})", name, class);
        Ok(Box::new(EvdevPadDevice::new(device, name, class)))
    }
}

/// An acquired evdev controller.
pub struct EvdevPadDevice {
    device: Device,
    name: String,
    class: DeviceClass,
    has_right_stick: bool,
    has_triggers: bool,
    has_hat: bool,
}

impl EvdevPadDevice {
    fn new(device: Device, name: String, class: DeviceClass) -> Self {
        let has = |axis: AbsoluteAxisType| {
            device
                .supported_absolute_axes()
                .map_or(false, |set| set.contains(axis))
        };
        let has_right_stick = has(AbsoluteAxisType::ABS_RX) && has(AbsoluteAxisType::ABS_RY);
        let has_triggers = has(AbsoluteAxisType::ABS_Z) && has(AbsoluteAxisType::ABS_RZ);
        let has_hat = has(AbsoluteAxisType::ABS_HAT0X) && has(AbsoluteAxisType::ABS_HAT0Y);
        Self {
            has_right_stick,
            has_triggers,
            has_hat,
            device,
            name,
            class,
        }
    }

    fn buttons(&self) -> &'static [Key; 10] {
        match self.class {
            DeviceClass::Gamepad => &GAMEPAD_BUTTONS,
            DeviceClass::Joystick => &JOYSTICK_BUTTONS,
        }
    }
}

/// Rescale one axis into the raw 0..=65535 contract range.
fn normalize_axis(info: libc::input_absinfo) -> u16 {
    let min = i64::from(info.minimum);
    let max = i64::from(info.maximum);
    if max <= min {
        return 32768;
    }
    let value = i64::from(info.value).clamp(min, max);
    ((value - min) * 65535 / (max - min)) as u16
}

/// Translate a hat X/Y sign pair into centidegrees.
fn hat_angle(x: i32, y: i32) -> Option<u16> {
    match (x.signum(), y.signum()) {
        (0, 0) => None,
        (0, -1) => Some(0),
        (1, -1) => Some(4500),
        (1, 0) => Some(9000),
        (1, 1) => Some(13500),
        (0, 1) => Some(18000),
        (-1, 1) => Some(22500),
        (-1, 0) => Some(27000),
        (-1, -1) => Some(31500),
        _ => None,
    }
}

fn map_poll_error(err: std::io::Error) -> PadError {
    // A yanked device node answers ENODEV; treat that as a transient loss
    // so the mirror can try to reacquire.
    match err.raw_os_error() {
        Some(libc::ENODEV) | Some(libc::ENXIO) => PadError::InputLost,
        _ => PadError::Io(err),
    }
}

impl PadDevice for EvdevPadDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> DeviceClass {
        self.class
    }

    fn poll(&mut self) -> PadResult<PadSample> {
        let abs = self.device.get_abs_state().map_err(map_poll_error)?;
        let keys = self.device.get_key_state().map_err(map_poll_error)?;

        let axis = |code: AbsoluteAxisType| abs[code.0 as usize];

        let mut sample = PadSample {
            left_x: normalize_axis(axis(AbsoluteAxisType::ABS_X)),
            left_y: normalize_axis(axis(AbsoluteAxisType::ABS_Y)),
            ..PadSample::centered()
        };
        if self.has_right_stick {
            sample.right_x = normalize_axis(axis(AbsoluteAxisType::ABS_RX));
            sample.right_y = normalize_axis(axis(AbsoluteAxisType::ABS_RY));
        }
        if self.has_triggers {
            sample.left_trigger = normalize_axis(axis(AbsoluteAxisType::ABS_Z));
            sample.right_trigger = normalize_axis(axis(AbsoluteAxisType::ABS_RZ));
        }
        if self.has_hat {
            sample.hat = hat_angle(
                axis(AbsoluteAxisType::ABS_HAT0X).value,
                axis(AbsoluteAxisType::ABS_HAT0Y).value,
            );
        }
        for (ordinal, key) in self.buttons().iter().enumerate() {
            sample.buttons[ordinal] = keys.contains(*key);
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absinfo(value: i32, minimum: i32, maximum: i32) -> libc::input_absinfo {
        libc::input_absinfo {
            value,
            minimum,
            maximum,
            fuzz: 0,
            flat: 0,
            resolution: 0,
        }
    }

    #[test]
    fn test_normalize_full_range() {
        assert_eq!(normalize_axis(absinfo(0, 0, 65535)), 0);
        assert_eq!(normalize_axis(absinfo(65535, 0, 65535)), 65535);
        assert_eq!(normalize_axis(absinfo(32768, 0, 65535)), 32768);
    }

    #[test]
    fn test_normalize_signed_byte_range() {
        // Typical 8-bit stick: -128..=127.
        assert_eq!(normalize_axis(absinfo(-128, -128, 127)), 0);
        assert_eq!(normalize_axis(absinfo(127, -128, 127)), 65535);
    }

    #[test]
    fn test_normalize_degenerate_range_centers() {
        assert_eq!(normalize_axis(absinfo(5, 3, 3)), 32768);
    }

    #[test]
    fn test_normalize_clamps_out_of_range_values() {
        assert_eq!(normalize_axis(absinfo(500, 0, 255)), 65535);
        assert_eq!(normalize_axis(absinfo(-500, 0, 255)), 0);
    }

    #[test]
    fn test_hat_angles() {
        assert_eq!(hat_angle(0, 0), None);
        assert_eq!(hat_angle(0, -1), Some(0));
        assert_eq!(hat_angle(1, 0), Some(9000));
        assert_eq!(hat_angle(0, 1), Some(18000));
        assert_eq!(hat_angle(-1, 0), Some(27000));
        assert_eq!(hat_angle(-1, -1), Some(31500));
    }

    #[test]
    fn test_list_devices_reports_or_errors() {
        // Environment-dependent: either some controllers exist or the
        // enumeration reports NoDevice.
        match EvdevPadClient::list_devices() {
            Ok(devices) => assert!(!devices.is_empty()),
            Err(PadError::NoDevice) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
}
