use super::error::EvalError;
use super::tokens::{OperatorSymbol, Token};

/// Infix to postfix conversion, one token at a time.
///
/// The operator stack only ever holds `Operator`, `Negate` and `LeftParen`.
/// A `-` that arrives where an operand is expected becomes a prefix `Negate`,
/// which binds tighter than every binary operator except `^`. A `+` in the
/// same position is dropped.
pub struct ShuntingYard {
    output: Vec<Token>,
    operators: Vec<Token>,
    expect_operand: bool,
}

impl ShuntingYard {
    pub fn new() -> Self {
        ShuntingYard {
            output: Vec::new(),
            operators: Vec::new(),
            expect_operand: true,
        }
    }

    pub fn push(&mut self, token: &Token) -> Result<(), EvalError> {
        match token {
            Token::Number(_) => {
                self.output.push(token.clone());
                self.expect_operand = false;
            }
            Token::LeftParen => {
                self.operators.push(Token::LeftParen);
                self.expect_operand = true;
            }
            Token::RightParen => {
                self.close_group()?;
                self.expect_operand = false;
            }
            Token::Operator(OperatorSymbol::Subtract) if self.expect_operand => {
                self.operators.push(Token::Negate);
            }
            Token::Operator(OperatorSymbol::Add) if self.expect_operand => {}
            Token::Operator(op) => {
                self.add_operator(*op);
                self.expect_operand = true;
            }
            Token::Negate => {
                self.operators.push(Token::Negate);
                self.expect_operand = true;
            }
            Token::Unrecognized(piece) => return Err(EvalError::UnparsableToken(piece.clone())),
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<Token>, EvalError> {
        while let Some(top) = self.operators.pop() {
            if top == Token::LeftParen {
                return Err(EvalError::UnbalancedParentheses);
            }
            self.output.push(top);
        }
        Ok(self.output)
    }

    fn add_operator(&mut self, incoming: OperatorSymbol) {
        while let Some(top) = self.operators.last() {
            if !pops_before(top, incoming) {
                break;
            }
            if let Some(top) = self.operators.pop() {
                self.output.push(top);
            }
        }
        self.operators.push(Token::Operator(incoming));
    }

    fn close_group(&mut self) -> Result<(), EvalError> {
        loop {
            match self.operators.pop() {
                Some(Token::LeftParen) => return Ok(()),
                Some(top) => self.output.push(top),
                None => return Err(EvalError::UnbalancedParentheses),
            }
        }
    }

    #[cfg(test)]
    fn pending(&self) -> &[Token] {
        &self.operators
    }

    #[cfg(test)]
    fn emitted(&self) -> &[Token] {
        &self.output
    }
}

/// Equal precedence pops the stacked operator first (left associativity).
fn pops_before(top: &Token, incoming: OperatorSymbol) -> bool {
    match top {
        Token::Operator(op) => op.precedence() >= incoming.precedence(),
        Token::Negate => incoming != OperatorSymbol::Power,
        _ => false,
    }
}

pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, EvalError> {
    let mut yard = ShuntingYard::new();
    for token in tokens {
        yard.push(token)?;
    }
    yard.finish()
}

pub fn render_postfix(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
