//! Expression engine: tokenize, convert to postfix, evaluate, format.
//!
//! Every stage is pure. Nothing is kept between calls.

mod error;
mod format;
mod postfix;
mod rpn;
mod tokens;

pub use error::EvalError;
pub use format::format_result;
pub use postfix::{render_postfix, to_postfix};
pub use rpn::{eval_postfix, EvaluationTrace, Step};
pub use tokens::{spaced, tokenize};
#[cfg(feature = "tui")]
pub use tokens::Token;

use tracing::debug;

pub fn evaluate(expression: &str) -> Result<String, EvalError> {
    evaluate_traced(expression, &mut EvaluationTrace::new(false))
}

pub fn evaluate_traced(expression: &str, trace: &mut EvaluationTrace) -> Result<String, EvalError> {
    let tokens = tokenize(expression);
    let program = to_postfix(&tokens)
        .inspect_err(|e| debug!(expression, error = %e, "conversion failed"))?;
    debug!(expression, rpn = %render_postfix(&program), "converted to postfix");

    let value = eval_postfix(&program, trace)
        .inspect_err(|e| debug!(expression, error = %e, "evaluation failed"))?;
    Ok(format_result(value))
}
