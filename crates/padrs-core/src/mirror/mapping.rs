// padrs Sample Mapping
// Pure translation from physical controller samples to virtual report values

use strum_macros::{Display, EnumIter};

/// Center value of a physical stick axis (raw range 0..=65535).
pub const AXIS_CENTER: i32 = 32768;

/// Named buttons of the virtual controller.
///
/// The first ten are reachable through the ordinal table below; the four
/// directional buttons are derived from the hat switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(usize)]
pub enum PadButton {
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    Back,
    Start,
    LeftThumb,
    RightThumb,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

/// Total number of virtual buttons, directional buttons included.
pub const BUTTON_COUNT: usize = 14;

/// Every virtual button, in report index order.
pub const ALL_BUTTONS: [PadButton; BUTTON_COUNT] = [
    PadButton::A,
    PadButton::B,
    PadButton::X,
    PadButton::Y,
    PadButton::LeftShoulder,
    PadButton::RightShoulder,
    PadButton::Back,
    PadButton::Start,
    PadButton::LeftThumb,
    PadButton::RightThumb,
    PadButton::DpadUp,
    PadButton::DpadDown,
    PadButton::DpadLeft,
    PadButton::DpadRight,
];

/// Ordinal mapping of the first ten physical buttons.
///
/// Part of the observable contract: external tools replicating the mirror
/// must translate physical button `i` to `BUTTON_ORDER[i]`.
pub const BUTTON_ORDER: [PadButton; 10] = [
    PadButton::A,
    PadButton::B,
    PadButton::X,
    PadButton::Y,
    PadButton::LeftShoulder,
    PadButton::RightShoulder,
    PadButton::Back,
    PadButton::Start,
    PadButton::LeftThumb,
    PadButton::RightThumb,
];

impl PadButton {
    /// Dense index into report button arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Map a horizontal stick axis to the signed virtual range.
///
/// Subtracts the center bias: 0 maps to -32768, 32768 to 0, 65535 to 32767.
pub fn map_stick_axis(raw: u16) -> i16 {
    (raw as i32 - AXIS_CENTER) as i16
}

/// Map a vertical stick axis to the signed virtual range.
///
/// Vertical axes are inverted, so the raw minimum lands on the virtual
/// maximum. The inverted value is clamped because negating the center bias
/// of a raw 0 would otherwise overflow i16 by one.
pub fn map_stick_axis_inverted(raw: u16) -> i16 {
    (AXIS_CENTER - raw as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Map a trigger axis to the unsigned 8-bit slider range (truncating).
pub fn map_trigger(raw: u16) -> u8 {
    (raw / 256) as u8
}

/// Directional button states derived from the hat switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HatDirections {
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,
}

/// Map a hat-switch angle (centidegrees, [0, 36000)) to directional states.
///
/// Four 90°-wide sectors straddle 0°, 90°, 180° and 270°, with inclusive
/// boundaries, so an angle sitting exactly between two cardinal points
/// (45°, 135°, ...) raises both neighbors. "Up" wraps across the 0°/360°
/// boundary. A neutral hat (`None`) leaves all four directions released.
pub fn map_hat(hat: Option<u16>) -> HatDirections {
    let Some(angle) = hat else {
        return HatDirections::default();
    };
    HatDirections {
        up: angle >= 31500 || angle <= 4500,
        right: (4500..=13500).contains(&angle),
        down: (13500..=22500).contains(&angle),
        left: (22500..=31500).contains(&angle),
    }
}
