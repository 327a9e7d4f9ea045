// padrs Input Mirror
// Physical controller sampling, mapping, and the virtual output device

pub mod device;
pub mod evdev_pad;
pub mod mapping;
pub mod report;
pub mod service;
pub mod uinput;

pub use device::{DeviceClass, DeviceInfo, PadClient, PadDevice, PadError, PadResult, PadSample};
pub use evdev_pad::EvdevPadClient;
pub use mapping::{
    map_hat, map_stick_axis, map_stick_axis_inverted, map_trigger, HatDirections, PadButton,
    ALL_BUTTONS, BUTTON_COUNT, BUTTON_ORDER,
};
pub use report::{Axis, PadReport, Slider, VirtualPad, VirtualPadError};
pub use service::{InputMirror, MirrorConfig, MirrorError, MirrorHandle, MirrorStatus};
pub use uinput::UinputPad;
