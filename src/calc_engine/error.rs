use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("not enough operands for '{0}'")]
    InsufficientOperands(&'static str),

    #[error("malformed expression ({0} values left after evaluation)")]
    MalformedExpression(usize),

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{0}' is neither a number nor an operator")]
    UnparsableToken(String),
}

impl EvalError {
    /// Stable name of the error kind, independent of the message payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnbalancedParentheses => "UnbalancedParentheses",
            Self::InsufficientOperands(_) => "InsufficientOperands",
            Self::MalformedExpression(_) => "MalformedExpression",
            Self::DivisionByZero => "DivisionByZero",
            Self::UnparsableToken(_) => "UnparsableToken",
        }
    }
}
