use super::error::EvalError;
use super::format::format_result;
use super::tokens::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub operation: String,
    pub result: f64,
}

/// Records one step per applied operator when `detailed_mode` is on.
#[derive(Debug, Default)]
pub struct EvaluationTrace {
    pub steps: Vec<Step>,
    pub detailed_mode: bool,
}

impl EvaluationTrace {
    pub fn new(detailed_mode: bool) -> Self {
        EvaluationTrace {
            steps: Vec::new(),
            detailed_mode,
        }
    }

    pub fn add_step(&mut self, operation: impl FnOnce() -> String, result: f64) {
        if self.detailed_mode {
            self.steps.push(Step {
                operation: operation(),
                result,
            });
        }
    }
}

pub fn eval_postfix(tokens: &[Token], trace: &mut EvaluationTrace) -> Result<f64, EvalError> {
    let mut values: Vec<f64> = Vec::with_capacity(tokens.len());

    for token in tokens {
        match token {
            Token::Number(literal) => {
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::UnparsableToken(literal.clone()))?;
                values.push(value);
            }
            Token::Operator(op) => {
                // The right operand was pushed last.
                let (right, left) = match (values.pop(), values.pop()) {
                    (Some(right), Some(left)) => (right, left),
                    _ => return Err(EvalError::InsufficientOperands(op.as_str())),
                };
                let result = op.apply(left, right)?;
                trace.add_step(
                    || format!("{} {} {}", format_result(left), op, format_result(right)),
                    result,
                );
                values.push(result);
            }
            Token::Negate => {
                let value = values.pop().ok_or(EvalError::InsufficientOperands("-"))?;
                trace.add_step(|| format!("-{}", format_result(value)), -value);
                values.push(-value);
            }
            Token::LeftParen | Token::RightParen | Token::Unrecognized(_) => {
                return Err(EvalError::UnparsableToken(token.to_string()));
            }
        }
    }

    match values.as_slice() {
        [value] => Ok(*value),
        rest => Err(EvalError::MalformedExpression(rest.len())),
    }
}
