// padrs Rules
// Condition model, rule entities, and the evaluation engine

pub mod condition;
pub mod engine;
pub mod rule;

pub use condition::{
    factor_catalog, operator_catalog, CondValue, ConditionError, Factor, Operator,
    SimpleCondition, FLASK_SLOT_COUNT,
};
pub use engine::{BindingValue, Bindings, Dispatch, EvalError, RuleEngine, ScriptEvaluator};
pub use rule::{default_rules, LegacyCondition, Rule, RuleAction};
