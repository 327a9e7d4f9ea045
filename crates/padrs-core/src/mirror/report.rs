// padrs Virtual Report
// Last-submitted virtual controller state and the output device interface

use crate::mirror::device::PadSample;
use crate::mirror::mapping::{
    map_hat, map_stick_axis, map_stick_axis_inverted, map_trigger, PadButton, ALL_BUTTONS,
    BUTTON_COUNT, BUTTON_ORDER,
};

/// Stick axes of the virtual controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// Trigger sliders of the virtual controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    LeftTrigger,
    RightTrigger,
}

/// Errors raised by the virtual controller layer.
#[derive(Debug, thiserror::Error)]
pub enum VirtualPadError {
    #[error("Failed to create virtual controller: {0}")]
    Connect(String),

    #[error("Failed to write report: {0}")]
    Write(String),

    #[error("Virtual controller not connected")]
    NotConnected,
}

/// The virtual controller output device.
///
/// `set_*` calls stage values; [`VirtualPad::submit`] publishes the staged
/// state as one report. [`VirtualPad::disconnect`] must be idempotent and
/// safe before [`VirtualPad::connect`] ever succeeded.
pub trait VirtualPad {
    fn connect(&mut self) -> Result<(), VirtualPadError>;
    fn set_axis(&mut self, axis: Axis, value: i16);
    fn set_slider(&mut self, slider: Slider, value: u8);
    fn set_button(&mut self, button: PadButton, pressed: bool);
    fn submit(&mut self) -> Result<(), VirtualPadError>;
    fn disconnect(&mut self);
}

/// The last-submitted report state.
///
/// Owned by the mirror's shared critical section; both the polling loop and
/// injected presses mutate it under the same lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PadReport {
    pub left_x: i16,
    pub left_y: i16,
    pub right_x: i16,
    pub right_y: i16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    buttons: [bool; BUTTON_COUNT],
}

impl PadReport {
    /// A released report: sticks centered, triggers and buttons clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one physical sample into a full report.
    pub fn from_sample(sample: &PadSample) -> Self {
        let mut report = Self {
            left_x: map_stick_axis(sample.left_x),
            left_y: map_stick_axis_inverted(sample.left_y),
            right_x: map_stick_axis(sample.right_x),
            right_y: map_stick_axis_inverted(sample.right_y),
            left_trigger: map_trigger(sample.left_trigger),
            right_trigger: map_trigger(sample.right_trigger),
            buttons: [false; BUTTON_COUNT],
        };
        for (ordinal, pressed) in sample.buttons.iter().enumerate() {
            report.buttons[BUTTON_ORDER[ordinal].index()] = *pressed;
        }
        let dirs = map_hat(sample.hat);
        report.buttons[PadButton::DpadUp.index()] = dirs.up;
        report.buttons[PadButton::DpadDown.index()] = dirs.down;
        report.buttons[PadButton::DpadLeft.index()] = dirs.left;
        report.buttons[PadButton::DpadRight.index()] = dirs.right;
        report
    }

    /// State of one button.
    pub fn button(&self, button: PadButton) -> bool {
        self.buttons[button.index()]
    }

    /// Set one button.
    pub fn set_button(&mut self, button: PadButton, pressed: bool) {
        self.buttons[button.index()] = pressed;
    }

    /// Stage the whole report on a virtual pad and submit it.
    pub fn write_to(&self, pad: &mut dyn VirtualPad) -> Result<(), VirtualPadError> {
        pad.set_axis(Axis::LeftX, self.left_x);
        pad.set_axis(Axis::LeftY, self.left_y);
        pad.set_axis(Axis::RightX, self.right_x);
        pad.set_axis(Axis::RightY, self.right_y);
        pad.set_slider(Slider::LeftTrigger, self.left_trigger);
        pad.set_slider(Slider::RightTrigger, self.right_trigger);
        for (index, pressed) in self.buttons.iter().enumerate() {
            pad.set_button(ALL_BUTTONS[index], *pressed);
        }
        pad.submit()
    }
}
