// padrs Rule Model
// Named automation units with cooldown gating and condition compilation

use std::time::{Duration, Instant};

use crate::mirror::mapping::PadButton;
use crate::rules::condition::{CondValue, ConditionError, Factor, Operator, SimpleCondition};

/// The action a rule dispatches when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Inject the key with this evdev code.
    Key(u16),
    /// Press this virtual controller button.
    Pad(PadButton),
}

/// Pre-migration condition of rules saved by older releases.
///
/// Converted to an advanced script the first time the rule is evaluated;
/// the triple is discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCondition {
    pub factor: Factor,
    pub operator: Operator,
    pub value: Option<CondValue>,
}

/// One user-authored automation rule.
#[derive(Debug)]
pub struct Rule {
    name: String,
    enabled: bool,
    /// True while the structured editor owns the condition; false once the
    /// rule carries a free-form script.
    uses_simple_editor: bool,
    conditions: Vec<SimpleCondition>,
    script: String,
    action: RuleAction,
    cooldown: Duration,
    last_fired: Option<Instant>,
    last_error: Option<String>,
    legacy: Option<LegacyCondition>,
}

impl Rule {
    /// Create an enabled rule in simple-editor mode with no conditions.
    ///
    /// Until conditions are added the rule never fires.
    pub fn new(name: impl Into<String>, action: RuleAction) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            uses_simple_editor: true,
            conditions: Vec::new(),
            script: String::new(),
            action,
            cooldown: Duration::from_secs(1),
            last_fired: None,
            last_error: None,
            legacy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }

    pub fn set_action(&mut self, action: RuleAction) {
        self.action = action;
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn set_cooldown(&mut self, cooldown: Duration) {
        self.cooldown = cooldown;
    }

    pub fn uses_simple_editor(&self) -> bool {
        self.uses_simple_editor
    }

    pub fn conditions(&self) -> &[SimpleCondition] {
        &self.conditions
    }

    /// Add a structured condition and switch the rule to simple mode.
    pub fn push_condition(&mut self, condition: SimpleCondition) {
        self.uses_simple_editor = true;
        self.conditions.push(condition);
    }

    pub fn clear_conditions(&mut self) {
        self.conditions.clear();
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Replace the condition with a free-form script (advanced mode).
    pub fn set_script(&mut self, script: impl Into<String>) {
        self.script = script.into();
        self.uses_simple_editor = false;
    }

    /// Diagnostic from the last failed compile or evaluation, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_last_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }

    /// Attach a pre-migration condition (used when loading old rule sets).
    pub fn with_legacy(mut self, legacy: LegacyCondition) -> Self {
        self.legacy = Some(legacy);
        self
    }

    /// Whether the rule still carries an unconverted legacy condition.
    pub fn has_legacy_condition(&self) -> bool {
        self.legacy.is_some()
    }

    /// Convert a legacy condition to advanced-script form, once.
    ///
    /// Irreversible: the legacy triple is dropped and the simple-editor
    /// flag cleared regardless of whether the compile succeeded; a failed
    /// compile leaves an empty script (the rule simply never fires) plus a
    /// diagnostic.
    pub fn migrate_legacy(&mut self) {
        let Some(legacy) = self.legacy.take() else {
            return;
        };
        let compiled = SimpleCondition::new(legacy.factor, legacy.operator, legacy.value).compile();
        self.uses_simple_editor = false;
        match compiled {
            Ok(script) => {
                log::debug!("rule '{}': migrated legacy condition", self.name);
                self.script = script;
            }
            Err(e) => {
                log::warn!("rule '{}': legacy condition rejected: {}", self.name, e);
                self.script = String::new();
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Compile the rule's effective condition script.
    ///
    /// `Ok(None)` means the condition is constant false — an empty simple
    /// condition list or a blank advanced script — and the evaluator must
    /// not be consulted at all.
    pub fn effective_script(&self) -> Result<Option<String>, ConditionError> {
        if self.uses_simple_editor {
            if self.conditions.is_empty() {
                return Ok(None);
            }
            let mut fragments = Vec::with_capacity(self.conditions.len());
            for condition in &self.conditions {
                fragments.push(condition.compile()?);
            }
            Ok(Some(fragments.join(" && ")))
        } else if self.script.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.script.clone()))
        }
    }

    /// Whether the cooldown window is still running at `now`.
    pub fn cooling(&self, now: Instant) -> bool {
        match self.last_fired {
            Some(fired) => now.saturating_duration_since(fired) < self.cooldown,
            None => false,
        }
    }

    /// Time left in the cooldown window at `now`.
    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        match self.last_fired {
            Some(fired) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(fired)),
            None => Duration::ZERO,
        }
    }

    /// Restart the cooldown window; called only after a successful dispatch.
    pub(crate) fn mark_fired(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }
}

/// Starter rules offered to new configurations.
pub fn default_rules() -> Vec<Rule> {
    let mut low_life = Rule::new("Low life flask", RuleAction::Key(2)); // KEY_1
    low_life.push_condition(SimpleCondition::numeric(
        Factor::HealthPercent,
        Operator::LessOrEqual,
        50.0,
    ));
    low_life.push_condition(SimpleCondition::flask(
        Factor::FlaskUsable(1),
        Operator::IsTrue,
    ));
    low_life.set_cooldown(Duration::from_secs(4));

    let mut low_mana = Rule::new("Low mana flask", RuleAction::Key(3)); // KEY_2
    low_mana.push_condition(SimpleCondition::numeric(
        Factor::ManaPercent,
        Operator::LessOrEqual,
        25.0,
    ));
    low_mana.push_condition(SimpleCondition::flask(
        Factor::FlaskUsable(2),
        Operator::IsTrue,
    ));
    low_mana.set_cooldown(Duration::from_secs(4));

    vec![low_life, low_mana]
}
