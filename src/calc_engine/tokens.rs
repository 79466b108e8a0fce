use std::fmt;

use super::error::EvalError;

/// Characters that always end the current run and form a piece of their own.
const BOUNDARY_CHARS: &[char] = &['+', '-', '*', '/', '%', '^', '(', ')'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSymbol {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    FloorDivide,
    Power,
}

impl OperatorSymbol {
    pub const ALL: [OperatorSymbol; 7] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Remainder,
        Self::FloorDivide,
        Self::Power,
    ];

    pub const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide | Self::Remainder | Self::FloorDivide => 2,
            Self::Power => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::FloorDivide => "//",
            Self::Power => "^",
        }
    }

    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == lexeme)
    }

    pub fn apply(self, left: f64, right: f64) -> Result<f64, EvalError> {
        match self {
            Self::Add => Ok(left + right),
            Self::Subtract => Ok(left - right),
            Self::Multiply => Ok(left * right),
            Self::Divide | Self::FloorDivide if right == 0.0 => Err(EvalError::DivisionByZero),
            Self::Divide => Ok(left / right),
            Self::FloorDivide => Ok((left / right).floor()),
            Self::Remainder => Ok(left % right),
            Self::Power => Ok(left.powf(right)),
        }
    }
}

impl fmt::Display for OperatorSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal as typed (after separator normalization), parsed at evaluation time.
    Number(String),
    Operator(OperatorSymbol),
    /// Prefix minus. Only the postfix converter produces it.
    Negate,
    LeftParen,
    RightParen,
    Unrecognized(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(literal) | Token::Unrecognized(literal) => f.write_str(literal),
            Token::Operator(op) => write!(f, "{op}"),
            Token::Negate => f.write_str("neg"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
        }
    }
}

pub fn normalize(raw: &str) -> String {
    raw.replace("**", "^").replace(',', ".")
}

/// Splits an expression into tokens. Never fails: anything that is not a
/// number, operator or bracket comes back as [`Token::Unrecognized`].
pub fn tokenize(raw: &str) -> Vec<Token> {
    let normalized = normalize(raw);
    let mut tokens = Vec::new();
    let mut run = String::new();
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        if !BOUNDARY_CHARS.contains(&c) {
            run.push(c);
            continue;
        }

        flush_run(&mut run, &mut tokens);

        if c == '/' && chars.peek() == Some(&'/') {
            chars.next();
            tokens.push(Token::Operator(OperatorSymbol::FloorDivide));
        } else {
            let mut buf = [0; 4];
            tokens.push(classify(c.encode_utf8(&mut buf)));
        }
    }
    flush_run(&mut run, &mut tokens);

    tokens
}

fn flush_run(run: &mut String, tokens: &mut Vec<Token>) {
    let piece = run.trim();
    if !piece.is_empty() {
        tokens.push(classify(piece));
    }
    run.clear();
}

fn classify(piece: &str) -> Token {
    match piece {
        "(" => Token::LeftParen,
        ")" => Token::RightParen,
        _ => {
            if let Some(op) = OperatorSymbol::from_lexeme(piece) {
                Token::Operator(op)
            } else if is_number(piece) {
                Token::Number(piece.to_string())
            } else {
                Token::Unrecognized(piece.to_string())
            }
        }
    }
}

// `inf` and `NaN` parse as f64 but are not accepted as literals.
fn is_number(piece: &str) -> bool {
    piece.starts_with(|c: char| c.is_ascii_digit() || c == '.') && piece.parse::<f64>().is_ok()
}

/// Re-renders an expression with one space between tokens, for display.
pub fn spaced(expression: &str) -> String {
    tokenize(expression)
        .iter()
        .map(Token::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperatorSymbol::*;

    fn num(literal: &str) -> Token {
        Token::Number(literal.to_string())
    }

    #[test]
    fn test_precedence_table() {
        let table: Vec<(&str, u8)> = OperatorSymbol::ALL
            .iter()
            .map(|op| (op.as_str(), op.precedence()))
            .collect();
        assert_eq!(
            table,
            vec![("+", 1), ("-", 1), ("*", 2), ("/", 2), ("%", 2), ("//", 2), ("^", 3)]
        );
    }

    #[test]
    fn test_lexemes_round_trip() {
        for op in OperatorSymbol::ALL {
            assert_eq!(OperatorSymbol::from_lexeme(op.as_str()), Some(op));
        }
        assert_eq!(OperatorSymbol::from_lexeme("**"), None);
        assert_eq!(OperatorSymbol::from_lexeme("x"), None);
    }

    #[test]
    fn test_simple_expression() {
        assert_eq!(
            tokenize("2+3*4"),
            vec![num("2"), Token::Operator(Add), num("3"), Token::Operator(Multiply), num("4")]
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(
            tokenize("  12.5 -   ( 3 )  "),
            vec![
                num("12.5"),
                Token::Operator(Subtract),
                Token::LeftParen,
                num("3"),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_alternate_spellings() {
        assert_eq!(tokenize("2**3"), vec![num("2"), Token::Operator(Power), num("3")]);
        assert_eq!(tokenize("1,5"), vec![num("1.5")]);
    }

    #[test]
    fn test_floor_division_is_one_token() {
        assert_eq!(tokenize("7//2"), vec![num("7"), Token::Operator(FloorDivide), num("2")]);
        assert_eq!(
            tokenize("7/ /2"),
            vec![num("7"), Token::Operator(Divide), Token::Operator(Divide), num("2")]
        );
    }

    #[test]
    fn test_leading_minus_stays_an_operator() {
        assert_eq!(tokenize("-5"), vec![Token::Operator(Subtract), num("5")]);
    }

    #[test]
    fn test_unrecognized_pieces_pass_through() {
        assert_eq!(
            tokenize("sqrt(4)"),
            vec![
                Token::Unrecognized("sqrt".into()),
                Token::LeftParen,
                num("4"),
                Token::RightParen,
            ]
        );
        assert_eq!(tokenize("1 2"), vec![Token::Unrecognized("1 2".into())]);
        assert_eq!(tokenize("inf"), vec![Token::Unrecognized("inf".into())]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_apply() {
        assert_eq!(Subtract.apply(10.0, 4.0), Ok(6.0));
        assert_eq!(Power.apply(2.0, 10.0), Ok(1024.0));
        assert_eq!(FloorDivide.apply(-7.0, 2.0), Ok(-4.0));
        assert_eq!(Remainder.apply(-7.0, 3.0), Ok(-1.0));
        assert_eq!(Divide.apply(1.0, 0.0), Err(EvalError::DivisionByZero));
        assert_eq!(FloorDivide.apply(1.0, -0.0), Err(EvalError::DivisionByZero));
        assert!(Remainder.apply(5.0, 0.0).unwrap().is_nan());
    }

    #[test]
    fn test_spaced() {
        assert_eq!(spaced("(2+3)*4"), "( 2 + 3 ) * 4");
        assert_eq!(spaced("2**3//1"), "2 ^ 3 // 1");
    }
}
