// padrs Rule Engine
// Per-cycle evaluation and dispatch of the ordered rule list

use std::collections::HashSet;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::inject::KeyInjector;
use crate::mirror::service::MirrorHandle;
use crate::rules::rule::{Rule, RuleAction};

/// One value the host derived from the state cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingValue {
    Number(f64),
    Bool(bool),
}

/// Named values handed to the script evaluator each cycle.
///
/// Insertion order is preserved so diagnostics show bindings the way the
/// host registered them. Buff names live in their own set because scripts
/// query them through a call form rather than a plain name.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: IndexMap<String, BindingValue>,
    buffs: HashSet<String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_number(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), BindingValue::Number(value));
    }

    pub fn set_bool(&mut self, name: impl Into<String>, value: bool) {
        self.values.insert(name.into(), BindingValue::Bool(value));
    }

    pub fn add_buff(&mut self, name: impl Into<String>) {
        self.buffs.insert(name.into());
    }

    pub fn get(&self, name: &str) -> Option<BindingValue> {
        self.values.get(name).copied()
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(BindingValue::Number(v)) => Some(v),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(BindingValue::Bool(v)) => Some(v),
            _ => None,
        }
    }

    pub fn has_buff(&self, name: &str) -> bool {
        self.buffs.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Errors reported by the external expression evaluator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("script error: {0}")]
    Script(String),

    #[error("unknown binding: {0}")]
    UnknownBinding(String),
}

/// The external boolean-expression evaluator.
///
/// The grammar lives outside this crate; the engine only relies on
/// `evaluate` being pure with respect to the bindings and never panicking.
pub trait ScriptEvaluator {
    fn evaluate(&mut self, script: &str, bindings: &Bindings) -> Result<bool, EvalError>;
}

/// Log entry for one dispatched action.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub rule: String,
    pub action: RuleAction,
}

/// Evaluates all enabled rules once per host cycle and dispatches at most
/// one action per satisfied, non-cooling rule.
pub struct RuleEngine {
    rules: Vec<Rule>,
    evaluator: Box<dyn ScriptEvaluator>,
    injector: Box<dyn KeyInjector>,
    mirror: Option<MirrorHandle>,
    pad_hold: Duration,
}

impl RuleEngine {
    pub fn new(evaluator: Box<dyn ScriptEvaluator>, injector: Box<dyn KeyInjector>) -> Self {
        Self {
            rules: Vec::new(),
            evaluator,
            injector,
            mirror: None,
            pad_hold: Duration::from_millis(60),
        }
    }

    /// Attach the mirror handle that carries controller actions.
    ///
    /// Without one, controller rules are silent no-ops.
    pub fn set_mirror(&mut self, mirror: Option<MirrorHandle>) {
        self.mirror = mirror;
    }

    /// Hold duration for injected controller presses.
    pub fn set_pad_hold(&mut self, hold: Duration) {
        self.pad_hold = hold;
    }

    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut [Rule] {
        &mut self.rules
    }

    pub fn remove_rule(&mut self, name: &str) -> Option<Rule> {
        let index = self.rules.iter().position(|r| r.name() == name)?;
        Some(self.rules.remove(index))
    }

    /// Evaluate every rule against `bindings` and dispatch fired actions.
    pub fn tick(&mut self, bindings: &Bindings) -> Vec<Dispatch> {
        self.tick_at(bindings, Instant::now())
    }

    /// Evaluation with an explicit clock, for deterministic tests.
    pub fn tick_at(&mut self, bindings: &Bindings, now: Instant) -> Vec<Dispatch> {
        let RuleEngine {
            rules,
            evaluator,
            injector,
            mirror,
            pad_hold,
        } = self;

        let mut dispatched = Vec::new();
        for rule in rules.iter_mut() {
            if !rule.enabled() {
                continue;
            }
            rule.migrate_legacy();
            if rule.cooling(now) {
                continue;
            }

            let script = match rule.effective_script() {
                Ok(Some(script)) => script,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("rule '{}': condition rejected: {}", rule.name(), e);
                    rule.set_last_error(Some(e.to_string()));
                    continue;
                }
            };

            let satisfied = match evaluator.evaluate(&script, bindings) {
                Ok(result) => {
                    rule.set_last_error(None);
                    result
                }
                Err(e) => {
                    log::warn!("rule '{}': evaluation failed: {}", rule.name(), e);
                    rule.set_last_error(Some(e.to_string()));
                    false
                }
            };
            if !satisfied {
                continue;
            }

            let delivered = match rule.action() {
                RuleAction::Key(code) => injector.inject(code),
                RuleAction::Pad(button) => match mirror {
                    Some(handle) => handle.press_button(button, *pad_hold),
                    // Controller mode disabled: a no-op, not an error.
                    None => false,
                },
            };
            if delivered {
                log::info!("rule '{}' fired", rule.name());
                rule.mark_fired(now);
                dispatched.push(Dispatch {
                    rule: rule.name().to_string(),
                    action: rule.action(),
                });
            }
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::condition::{Factor, Operator, SimpleCondition};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Evaluator fixed to one verdict, recording the scripts it saw.
    struct FixedEvaluator {
        verdict: Result<bool, EvalError>,
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl FixedEvaluator {
        fn new(verdict: Result<bool, EvalError>) -> (Self, Rc<RefCell<Vec<String>>>) {
            let seen = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    verdict,
                    seen: seen.clone(),
                },
                seen,
            )
        }
    }

    impl ScriptEvaluator for FixedEvaluator {
        fn evaluate(&mut self, script: &str, _bindings: &Bindings) -> Result<bool, EvalError> {
            self.seen.borrow_mut().push(script.to_string());
            self.verdict.clone()
        }
    }

    struct CountingInjector {
        injected: Rc<RefCell<Vec<u16>>>,
        succeed: bool,
    }

    impl CountingInjector {
        fn new(succeed: bool) -> (Self, Rc<RefCell<Vec<u16>>>) {
            let injected = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    injected: injected.clone(),
                    succeed,
                },
                injected,
            )
        }
    }

    impl KeyInjector for CountingInjector {
        fn inject(&mut self, code: u16) -> bool {
            self.injected.borrow_mut().push(code);
            self.succeed
        }
    }

    fn keyed_rule(name: &str) -> Rule {
        let mut rule = Rule::new(name, RuleAction::Key(2));
        rule.push_condition(SimpleCondition::numeric(
            Factor::HealthPercent,
            Operator::LessOrEqual,
            50.0,
        ));
        rule
    }

    fn engine_with(
        verdict: Result<bool, EvalError>,
        inject_ok: bool,
    ) -> (RuleEngine, Rc<RefCell<Vec<String>>>, Rc<RefCell<Vec<u16>>>) {
        let (evaluator, seen) = FixedEvaluator::new(verdict);
        let (injector, injected) = CountingInjector::new(inject_ok);
        (
            RuleEngine::new(Box::new(evaluator), Box::new(injector)),
            seen,
            injected,
        )
    }

    #[test]
    fn test_satisfied_rule_fires_once() {
        let (mut engine, seen, injected) = engine_with(Ok(true), true);
        engine.push_rule(keyed_rule("fire"));

        let fired = engine.tick_at(&Bindings::new(), Instant::now());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].rule, "fire");
        assert_eq!(*injected.borrow(), vec![2]);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], "Player.HealthPercent <= 50");
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let (mut engine, seen, injected) = engine_with(Ok(true), true);
        let mut rule = keyed_rule("off");
        rule.set_enabled(false);
        engine.push_rule(rule);

        assert!(engine.tick_at(&Bindings::new(), Instant::now()).is_empty());
        assert!(seen.borrow().is_empty());
        assert!(injected.borrow().is_empty());
    }

    #[test]
    fn test_empty_simple_rule_never_consults_evaluator() {
        let (mut engine, seen, _) = engine_with(Ok(true), true);
        engine.push_rule(Rule::new("empty", RuleAction::Key(2)));

        assert!(engine.tick_at(&Bindings::new(), Instant::now()).is_empty());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_cooldown_gates_refiring() {
        let (mut engine, _, injected) = engine_with(Ok(true), true);
        let mut rule = keyed_rule("cooled");
        rule.set_cooldown(Duration::from_secs(2));
        engine.push_rule(rule);

        let start = Instant::now();
        assert_eq!(engine.tick_at(&Bindings::new(), start).len(), 1);
        // Conditions stay true the whole window; nothing fires.
        assert!(engine
            .tick_at(&Bindings::new(), start + Duration::from_millis(500))
            .is_empty());
        assert!(engine
            .tick_at(&Bindings::new(), start + Duration::from_millis(1999))
            .is_empty());
        // Window over: fires again.
        assert_eq!(
            engine
                .tick_at(&Bindings::new(), start + Duration::from_secs(2))
                .len(),
            1
        );
        assert_eq!(injected.borrow().len(), 2);
    }

    #[test]
    fn test_failed_injection_leaves_cooldown_untouched() {
        let (mut engine, _, injected) = engine_with(Ok(true), false);
        let mut rule = keyed_rule("retry");
        rule.set_cooldown(Duration::from_secs(60));
        engine.push_rule(rule);

        let start = Instant::now();
        assert!(engine.tick_at(&Bindings::new(), start).is_empty());
        // The very next cycle tries again because the timer never reset.
        assert!(engine
            .tick_at(&Bindings::new(), start + Duration::from_millis(16))
            .is_empty());
        assert_eq!(injected.borrow().len(), 2);
    }

    #[test]
    fn test_pad_action_without_mirror_is_silent_noop() {
        let (mut engine, _, _) = engine_with(Ok(true), true);
        let mut rule = Rule::new("pad", RuleAction::Pad(crate::mirror::PadButton::A));
        rule.push_condition(SimpleCondition::flask(
            Factor::FlaskUsable(1),
            Operator::IsTrue,
        ));
        rule.set_cooldown(Duration::from_secs(60));
        engine.push_rule(rule);

        let start = Instant::now();
        assert!(engine.tick_at(&Bindings::new(), start).is_empty());
        // No cooldown reset either: the next cycle evaluates again.
        assert!(engine
            .tick_at(&Bindings::new(), start + Duration::from_millis(16))
            .is_empty());
        assert!(engine.rules()[0].last_error().is_none());
    }

    #[test]
    fn test_eval_error_is_false_and_recorded() {
        let (mut engine, _, injected) =
            engine_with(Err(EvalError::Script("bad token".to_string())), true);
        engine.push_rule(keyed_rule("broken"));
        engine.push_rule(keyed_rule("sibling"));

        let fired = engine.tick_at(&Bindings::new(), Instant::now());
        // Both rules hit the same failing evaluator; neither fires, neither
        // crashes, and both carry the diagnostic.
        assert!(fired.is_empty());
        assert!(injected.borrow().is_empty());
        for rule in engine.rules() {
            assert_eq!(rule.last_error(), Some("script error: bad token"));
        }
    }

    #[test]
    fn test_legacy_rule_migrates_on_first_tick() {
        use crate::rules::condition::CondValue;
        use crate::rules::rule::LegacyCondition;

        let (mut engine, seen, _) = engine_with(Ok(false), true);
        let rule = Rule::new("old", RuleAction::Key(2)).with_legacy(LegacyCondition {
            factor: Factor::ManaPercent,
            operator: Operator::LessOrEqual,
            value: Some(CondValue::Number(30.0)),
        });
        engine.push_rule(rule);

        engine.tick_at(&Bindings::new(), Instant::now());
        assert!(!engine.rules()[0].has_legacy_condition());
        assert!(!engine.rules()[0].uses_simple_editor());
        assert_eq!(seen.borrow()[0], "Player.ManaPercent <= 30");
    }

    #[test]
    fn test_bindings_accessors() {
        let mut bindings = Bindings::new();
        bindings.set_number("Player.HealthPercent", 42.0);
        bindings.set_bool("Flasks[1].IsUsable", true);
        bindings.add_buff("grace");

        assert_eq!(bindings.number("Player.HealthPercent"), Some(42.0));
        assert_eq!(bindings.flag("Flasks[1].IsUsable"), Some(true));
        assert!(bindings.has_buff("grace"));
        assert!(!bindings.has_buff("onslaught"));
        assert_eq!(bindings.names().count(), 2);
    }
}
