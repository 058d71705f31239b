//! Errors raised while evaluating, observing or binding.

/// Every failure the runtime can report.
///
/// Parse failures are reported separately as `pest::error::Error<Rule>` by
/// the parser module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    /// The expression cannot receive a value (e.g. a literal or a call).
    #[error("invalid assignment target: '{0}' cannot be assigned")]
    InvalidAssignmentTarget(String),
    /// A `$parent` chain walked past the root scope.
    #[error("undefined ancestor scope: requested depth {requested} but only {available} ancestor(s) exist")]
    UndefinedAncestorScope { requested: u32, available: u32 },
    /// The property cannot be intercepted (frozen object, non-object target).
    #[error("observation unsupported: {0}")]
    ObservationUnsupported(String),
    /// Runtime failure inside an expression: null member access, calling a
    /// non-function, a failing native function or value converter.
    #[error("evaluation error: {0}")]
    EvaluationError(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BindingError {
    pub fn evaluation(message: impl Into<String>) -> Self {
        BindingError::EvaluationError(message.into())
    }

    pub fn invalid_target(expression: impl Into<String>) -> Self {
        BindingError::InvalidAssignmentTarget(expression.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        BindingError::ObservationUnsupported(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BindingError::Configuration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure() {
        let e = BindingError::UndefinedAncestorScope {
            requested: 3,
            available: 1,
        };
        assert_eq!(
            e.to_string(),
            "undefined ancestor scope: requested depth 3 but only 1 ancestor(s) exist"
        );
        assert_eq!(
            BindingError::invalid_target("1").to_string(),
            "invalid assignment target: '1' cannot be assigned"
        );
        assert!(BindingError::evaluation("boom")
            .to_string()
            .starts_with("evaluation error"));
    }
}
