// padrs Core Library
// Scheduler, state cache, input mirror and rule engine for game automation

pub mod event;
pub mod inject;
pub mod lookup;
pub mod mirror;
pub mod rules;
pub mod sched;
pub mod settings;
pub mod state;

pub use event::GameEvent;
pub use inject::{InjectError, KeyInjector, UinputInjector};
pub use lookup::{AddressSource, TableSource};
pub use mirror::{
    EvdevPadClient, InputMirror, MirrorConfig, MirrorError, MirrorHandle, MirrorStatus, PadButton,
    PadClient, PadDevice, PadError, PadReport, PadSample, UinputPad, VirtualPad, VirtualPadError,
    BUTTON_ORDER,
};
pub use rules::{
    default_rules, factor_catalog, operator_catalog, Bindings, BindingValue, CondValue,
    ConditionError, Dispatch, EvalError, Factor, LegacyCondition, Operator, Rule, RuleAction,
    RuleEngine, ScriptEvaluator, SimpleCondition,
};
pub use sched::{Scheduler, Step, TaskId, WaitOn, DEFAULT_PRIORITY};
pub use settings::{default_settings_content, Settings, SettingsError};
pub use state::{register_sync_routines, AddressCell, AddressStore, CellKey, NULL_ADDRESS};
