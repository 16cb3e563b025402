//! Guards gating transitions

use crate::error::GuardError;
use crate::expression::ExpressionEvaluator;
use crate::property::PropertyStore;

/// Condition that must hold for a transition to be taken.
///
/// Guards are pure: they read the property store and the active configuration and
/// never change either.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// Expression handed to the chart's [`ExpressionEvaluator`]
    Expression(String),
    /// Holds while the named state is active
    StateActive(String),
    /// Holds when every inner guard holds (vacuously true when empty)
    AllOf(Vec<Guard>),
    /// Holds when at least one inner guard holds (false when empty)
    AnyOf(Vec<Guard>),
    /// Inverts the inner guard
    Not(Box<Guard>),
}

impl Guard {
    /// Shorthand for [`Guard::Expression`]
    pub fn expression(expression: impl Into<String>) -> Self {
        Guard::Expression(expression.into())
    }

    /// Shorthand for [`Guard::StateActive`]
    pub fn state_active(state: impl Into<String>) -> Self {
        Guard::StateActive(state.into())
    }

    /// Shorthand for [`Guard::Not`]
    #[allow(clippy::should_implement_trait)]
    pub fn not(guard: Guard) -> Self {
        Guard::Not(Box::new(guard))
    }

    /// Evaluate the guard. The first error stops evaluation.
    pub fn check(&self, env: &GuardEnv<'_>) -> Result<bool, GuardError> {
        match self {
            Guard::Expression(expression) => env.evaluator.evaluate(expression, env.properties),
            Guard::StateActive(name) => (env.is_active)(name),
            Guard::AllOf(guards) => {
                for guard in guards {
                    if !guard.check(env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Guard::AnyOf(guards) => {
                for guard in guards {
                    if guard.check(env)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Guard::Not(guard) => guard.check(env).map(|b| !b),
        }
    }

    /// Names of all states referenced by [`Guard::StateActive`] leaves
    pub(crate) fn referenced_states(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_states(&mut out);
        out
    }

    fn collect_states<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Guard::Expression(_) => {}
            Guard::StateActive(name) => out.push(name),
            Guard::AllOf(guards) | Guard::AnyOf(guards) => {
                for guard in guards {
                    guard.collect_states(out);
                }
            }
            Guard::Not(guard) => guard.collect_states(out),
        }
    }
}

/// Everything a guard may read.
pub struct GuardEnv<'a> {
    /// Current property values
    pub properties: &'a PropertyStore,
    /// Evaluator for expression guards
    pub evaluator: &'a dyn ExpressionEvaluator,
    /// Lookup of the active flag by state name
    pub is_active: &'a dyn Fn(&str) -> Result<bool, GuardError>,
}
