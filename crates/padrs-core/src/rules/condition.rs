// padrs Rule Conditions
// Structured condition triples and their compilation to script fragments

use std::fmt;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Number of flask slots exposed by the factor catalog.
pub const FLASK_SLOT_COUNT: u8 = 5;

/// Comparison selected by a simple condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Operator {
    #[strum(serialize = "<=")]
    LessOrEqual,
    #[strum(serialize = ">=")]
    GreaterOrEqual,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "is true")]
    IsTrue,
    #[strum(serialize = "is false")]
    IsFalse,
}

impl Operator {
    /// Script symbol for comparison operators; `None` for the boolean
    /// operators, which rewrite the fragment instead.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Operator::LessOrEqual => Some("<="),
            Operator::GreaterOrEqual => Some(">="),
            Operator::Equal => Some("=="),
            Operator::IsTrue | Operator::IsFalse => None,
        }
    }

    /// Whether the operator applies to boolean-valued factors.
    pub fn is_boolean(self) -> bool {
        matches!(self, Operator::IsTrue | Operator::IsFalse)
    }
}

/// Signal selected by a simple condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    HealthPercent,
    ManaPercent,
    /// Flask in the given slot (1-based) is off cooldown and has charges.
    FlaskUsable(u8),
    /// Flask effect in the given slot (1-based) is currently running.
    FlaskActive(u8),
    /// A named buff is present; the name comes from the condition value.
    HasBuff,
    /// A named buff is absent; the name comes from the condition value.
    NotHasBuff,
}

impl Factor {
    /// Whether the factor produces a boolean rather than a number.
    pub fn is_boolean(self) -> bool {
        !matches!(self, Factor::HealthPercent | Factor::ManaPercent)
    }

    /// Whether the factor reads its buff name from the condition value.
    pub fn wants_buff_name(self) -> bool {
        matches!(self, Factor::HasBuff | Factor::NotHasBuff)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::HealthPercent => write!(f, "Health %"),
            Factor::ManaPercent => write!(f, "Mana %"),
            Factor::FlaskUsable(slot) => write!(f, "Flask {} usable", slot),
            Factor::FlaskActive(slot) => write!(f, "Flask {} active", slot),
            Factor::HasBuff => write!(f, "Has buff"),
            Factor::NotHasBuff => write!(f, "Does not have buff"),
        }
    }
}

/// All selectable factors, in editor display order.
///
/// The set is closed and known at compile time; UI layers enumerate this
/// table instead of reflecting over anything.
pub fn factor_catalog() -> Vec<Factor> {
    let mut catalog = vec![Factor::HealthPercent, Factor::ManaPercent];
    for slot in 1..=FLASK_SLOT_COUNT {
        catalog.push(Factor::FlaskUsable(slot));
    }
    for slot in 1..=FLASK_SLOT_COUNT {
        catalog.push(Factor::FlaskActive(slot));
    }
    catalog.push(Factor::HasBuff);
    catalog.push(Factor::NotHasBuff);
    catalog
}

/// All operators, in editor display order.
pub fn operator_catalog() -> Vec<Operator> {
    Operator::iter().collect()
}

/// Comparison value of a simple condition.
#[derive(Debug, Clone, PartialEq)]
pub enum CondValue {
    Number(f64),
    Text(String),
}

/// Errors raised while compiling a condition.
///
/// These are configuration errors: they surface when the condition is
/// compiled, never as a runtime cast failure during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("operator '{operator}' does not apply to factor '{factor}'")]
    OperatorMismatch { factor: String, operator: String },

    #[error("factor '{factor}' needs a numeric comparison value")]
    ExpectedNumber { factor: String },

    #[error("factor '{factor}' needs a buff name")]
    MissingBuffName { factor: String },

    #[error("flask slot {0} is out of range (1..={FLASK_SLOT_COUNT})")]
    InvalidFlaskSlot(u8),
}

/// One (factor, operator, value) triple of the simple rule editor.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCondition {
    pub factor: Factor,
    pub operator: Operator,
    pub value: Option<CondValue>,
}

impl SimpleCondition {
    pub fn new(factor: Factor, operator: Operator, value: Option<CondValue>) -> Self {
        Self {
            factor,
            operator,
            value,
        }
    }

    /// Numeric comparison condition.
    pub fn numeric(factor: Factor, operator: Operator, value: f64) -> Self {
        Self::new(factor, operator, Some(CondValue::Number(value)))
    }

    /// Boolean condition on a flask factor; the value is ignored.
    pub fn flask(factor: Factor, operator: Operator) -> Self {
        Self::new(factor, operator, None)
    }

    /// Buff presence condition; the text value names the buff.
    pub fn buff(factor: Factor, operator: Operator, name: impl Into<String>) -> Self {
        Self::new(factor, operator, Some(CondValue::Text(name.into())))
    }

    /// Compile the triple into one pure boolean script fragment.
    pub fn compile(&self) -> Result<String, ConditionError> {
        match self.factor {
            Factor::HealthPercent => self.compile_numeric("Player.HealthPercent"),
            Factor::ManaPercent => self.compile_numeric("Player.ManaPercent"),
            Factor::FlaskUsable(slot) => {
                self.compile_boolean(format!("Flasks[{}].IsUsable", checked_slot(slot)?))
            }
            Factor::FlaskActive(slot) => {
                self.compile_boolean(format!("Flasks[{}].IsActive", checked_slot(slot)?))
            }
            Factor::HasBuff => {
                let call = format!("Buffs.Has(\"{}\")", self.escaped_buff_name()?);
                self.compile_boolean(call)
            }
            Factor::NotHasBuff => {
                let call = format!("!Buffs.Has(\"{}\")", self.escaped_buff_name()?);
                self.compile_boolean(call)
            }
        }
    }

    fn compile_numeric(&self, fragment: &str) -> Result<String, ConditionError> {
        let Some(symbol) = self.operator.symbol() else {
            return Err(self.operator_mismatch());
        };
        let Some(CondValue::Number(value)) = self.value else {
            return Err(ConditionError::ExpectedNumber {
                factor: self.factor.to_string(),
            });
        };
        Ok(format!("{} {} {}", fragment, symbol, format_number(value)))
    }

    fn compile_boolean(&self, fragment: String) -> Result<String, ConditionError> {
        match self.operator {
            Operator::IsTrue => Ok(fragment),
            Operator::IsFalse => Ok(format!("!{}", fragment)),
            _ => Err(self.operator_mismatch()),
        }
    }

    fn escaped_buff_name(&self) -> Result<String, ConditionError> {
        let Some(CondValue::Text(name)) = &self.value else {
            return Err(ConditionError::MissingBuffName {
                factor: self.factor.to_string(),
            });
        };
        if name.trim().is_empty() {
            return Err(ConditionError::MissingBuffName {
                factor: self.factor.to_string(),
            });
        }
        Ok(escape_buff_name(name))
    }

    fn operator_mismatch(&self) -> ConditionError {
        ConditionError::OperatorMismatch {
            factor: self.factor.to_string(),
            operator: self.operator.to_string(),
        }
    }
}

fn checked_slot(slot: u8) -> Result<u8, ConditionError> {
    if slot == 0 || slot > FLASK_SLOT_COUNT {
        Err(ConditionError::InvalidFlaskSlot(slot))
    } else {
        Ok(slot)
    }
}

/// Escape a user-supplied buff name for embedding in a quoted call.
fn escape_buff_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
