// padrs uinput Virtual Controller
// Virtual gamepad creation and report emission

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AbsInfo, AbsoluteAxisType, AttributeSet, EventType, InputEvent, Key, UinputAbsSetup};

use crate::mirror::mapping::{PadButton, ALL_BUTTONS};
use crate::mirror::report::{Axis, Slider, VirtualPad, VirtualPadError};

/// Name advertised by the virtual controller.
///
/// The physical enumerator filters this prefix out to prevent the mirror
/// from acquiring its own output device.
pub const VIRT_PAD_NAME: &str = "padrs (virtual) Controller";

// Array order matches the Axis and Slider discriminants.
const STICK_AXES: [AbsoluteAxisType; 4] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
];

const TRIGGER_AXES: [AbsoluteAxisType; 2] = [AbsoluteAxisType::ABS_Z, AbsoluteAxisType::ABS_RZ];

fn key_for(button: PadButton) -> Key {
    match button {
        PadButton::A => Key::BTN_SOUTH,
        PadButton::B => Key::BTN_EAST,
        PadButton::X => Key::BTN_NORTH,
        PadButton::Y => Key::BTN_WEST,
        PadButton::LeftShoulder => Key::BTN_TL,
        PadButton::RightShoulder => Key::BTN_TR,
        PadButton::Back => Key::BTN_SELECT,
        PadButton::Start => Key::BTN_START,
        PadButton::LeftThumb => Key::BTN_THUMBL,
        PadButton::RightThumb => Key::BTN_THUMBR,
        PadButton::DpadUp => Key::BTN_DPAD_UP,
        PadButton::DpadDown => Key::BTN_DPAD_DOWN,
        PadButton::DpadLeft => Key::BTN_DPAD_LEFT,
        PadButton::DpadRight => Key::BTN_DPAD_RIGHT,
    }
}

/// Virtual uinput gamepad.
///
/// Staged values accumulate through the [`VirtualPad`] setters; `submit`
/// emits only the values that changed since the previous submission,
/// followed by one SYN frame.
pub struct UinputPad {
    device: Option<VirtualDevice>,
    staged: StagedReport,
    submitted: Option<StagedReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct StagedReport {
    axes: [i16; 4],
    sliders: [u8; 2],
    buttons: [bool; 14],
}

impl UinputPad {
    /// Create an unconnected virtual pad.
    pub fn new() -> Self {
        Self {
            device: None,
            staged: StagedReport::default(),
            submitted: None,
        }
    }

    fn build_device() -> Result<VirtualDevice, VirtualPadError> {
        let mut keys = AttributeSet::new();
        for button in ALL_BUTTONS {
            keys.insert(key_for(button));
        }

        let stick_info = AbsInfo::new(0, i16::MIN as i32, i16::MAX as i32, 16, 128, 0);
        let trigger_info = AbsInfo::new(0, 0, 255, 0, 0, 0);

        let mut builder = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| VirtualPadError::Connect(e.to_string()))?
            .name(VIRT_PAD_NAME)
            .with_keys(&keys)
            .map_err(|e: std::io::Error| VirtualPadError::Connect(e.to_string()))?;

        for axis in STICK_AXES {
            builder = builder
                .with_absolute_axis(&UinputAbsSetup::new(axis, stick_info))
                .map_err(|e: std::io::Error| VirtualPadError::Connect(e.to_string()))?;
        }
        for axis in TRIGGER_AXES {
            builder = builder
                .with_absolute_axis(&UinputAbsSetup::new(axis, trigger_info))
                .map_err(|e: std::io::Error| VirtualPadError::Connect(e.to_string()))?;
        }

        builder
            .build()
            .map_err(|e: std::io::Error| VirtualPadError::Connect(e.to_string()))
    }
}

impl Default for UinputPad {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualPad for UinputPad {
    fn connect(&mut self) -> Result<(), VirtualPadError> {
        if self.device.is_some() {
            return Ok(());
        }
        self.device = Some(Self::build_device()?);
        self.submitted = None;
        Ok(())
    }

    fn set_axis(&mut self, axis: Axis, value: i16) {
        self.staged.axes[axis as usize] = value;
    }

    fn set_slider(&mut self, slider: Slider, value: u8) {
        self.staged.sliders[slider as usize] = value;
    }

    fn set_button(&mut self, button: PadButton, pressed: bool) {
        self.staged.buttons[button.index()] = pressed;
    }

    fn submit(&mut self) -> Result<(), VirtualPadError> {
        let device = self.device.as_mut().ok_or(VirtualPadError::NotConnected)?;

        let previous = self.submitted;
        let mut events = Vec::new();
        for (index, axis) in STICK_AXES.iter().enumerate() {
            let value = self.staged.axes[index];
            if previous.map_or(true, |p| p.axes[index] != value) {
                events.push(InputEvent::new(EventType::ABSOLUTE, axis.0, value as i32));
            }
        }
        for (index, axis) in TRIGGER_AXES.iter().enumerate() {
            let value = self.staged.sliders[index];
            if previous.map_or(true, |p| p.sliders[index] != value) {
                events.push(InputEvent::new(EventType::ABSOLUTE, axis.0, value as i32));
            }
        }
        for (index, pressed) in self.staged.buttons.iter().enumerate() {
            if previous.map_or(true, |p| p.buttons[index] != *pressed) {
                events.push(InputEvent::new(
                    EventType::KEY,
                    key_for(ALL_BUTTONS[index]).code(),
                    i32::from(*pressed),
                ));
            }
        }

        if !events.is_empty() {
            // SYN event is required for the kernel to process the report
            events.push(InputEvent::new(EventType::SYNCHRONIZATION, 0, 0));
            device
                .emit(&events)
                .map_err(|e: std::io::Error| VirtualPadError::Write(e.to_string()))?;
        }

        self.submitted = Some(self.staged);
        Ok(())
    }

    fn disconnect(&mut self) {
        // Dropping the uinput handle destroys the kernel device. Safe to
        // call repeatedly and before connect.
        self.device = None;
        self.submitted = None;
    }
}
