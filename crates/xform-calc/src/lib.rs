//! Arithmetic expression evaluator for transformation command arguments.
//!
//! Transformation commands accept an arithmetic expression wherever a number
//! is expected, e.g. `R 30+60/2`. [`Calculator`] evaluates such an
//! expression to an `f64` with a recursive descent parser and resolves named
//! variables (`ux`, `uy`, `w`, `h`, ...) from a table owned by the caller.
//!
//! ```
//! use xform_calc::Calculator;
//!
//! let mut calc = Calculator::new();
//! calc.set_variable("w", 210.0);
//! assert_eq!(calc.eval("2*(3+4)").unwrap(), 14.0);
//! assert_eq!(calc.eval("w/2").unwrap(), 105.0);
//! ```

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Errors produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    /// A name was referenced that the variable table does not contain.
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    /// The right operand of `/` or `%` evaluated to zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A numeric literal could not be read as an `f64`.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// A character that cannot appear at this point of the expression.
    #[error("unexpected character '{0}' in expression")]
    UnexpectedChar(char),

    /// The expression ended where an operand was still required.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

/// Evaluates arithmetic expressions over a table of named variables.
///
/// Supported syntax: `f64` literals (including scientific notation), the
/// binary operators `+ - * / %` with the usual precedence, parentheses,
/// unary signs, and variable names (a letter followed by letters or
/// digits). `%` is the floored remainder, so `-7 % 3` is `2`.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    variables: HashMap<String, f64>,
}

impl Calculator {
    /// Creates a calculator with an empty variable table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }

    /// Looks up a variable; unset names are an error.
    pub fn variable(&self, name: &str) -> Result<f64, CalcError> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| CalcError::UndefinedVariable(name.to_string()))
    }

    /// Evaluates `expr` to a single value. The whole string must form one
    /// expression; trailing text is an error.
    pub fn eval(&self, expr: &str) -> Result<f64, CalcError> {
        let mut scanner = Scanner::new(expr);
        let value = self.expression(&mut scanner)?;
        scanner.skip_whitespace();
        match scanner.peek() {
            None => Ok(value),
            Some(c) => Err(CalcError::UnexpectedChar(c)),
        }
    }

    fn expression(&self, scanner: &mut Scanner) -> Result<f64, CalcError> {
        let mut value = self.term(scanner)?;
        loop {
            scanner.skip_whitespace();
            match scanner.peek() {
                Some('+') => {
                    scanner.advance();
                    value += self.term(scanner)?;
                }
                Some('-') => {
                    scanner.advance();
                    value -= self.term(scanner)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&self, scanner: &mut Scanner) -> Result<f64, CalcError> {
        let mut value = self.factor(scanner)?;
        loop {
            scanner.skip_whitespace();
            match scanner.peek() {
                Some('*') => {
                    scanner.advance();
                    value *= self.factor(scanner)?;
                }
                Some('/') => {
                    scanner.advance();
                    let denom = self.factor(scanner)?;
                    if denom == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value /= denom;
                }
                Some('%') => {
                    scanner.advance();
                    let denom = self.factor(scanner)?;
                    if denom == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value -= denom * (value / denom).floor();
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&self, scanner: &mut Scanner) -> Result<f64, CalcError> {
        scanner.skip_whitespace();
        match scanner.peek() {
            None => Err(CalcError::UnexpectedEnd),
            Some('(') => {
                scanner.advance();
                let value = self.expression(scanner)?;
                scanner.skip_whitespace();
                match scanner.peek() {
                    Some(')') => {
                        scanner.advance();
                        Ok(value)
                    }
                    Some(c) => Err(CalcError::UnexpectedChar(c)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some('+') => {
                scanner.advance();
                self.factor(scanner)
            }
            Some('-') => {
                scanner.advance();
                Ok(-self.factor(scanner)?)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => scanner.number(),
            Some(c) if c.is_alphabetic() => {
                let name = scanner.take_while(|c| c.is_alphanumeric());
                self.variable(&name)
            }
            Some(c) => Err(CalcError::UnexpectedChar(c)),
        }
    }
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner {
            chars: input.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    /// Lexes a numeric literal. An `e`/`E` is only part of the literal when
    /// an exponent actually follows; otherwise it starts a variable name.
    fn number(&mut self) -> Result<f64, CalcError> {
        let mut text = self.take_while(|c| c.is_ascii_digit() || c == '.');
        if matches!(self.peek(), Some('e' | 'E')) && self.exponent_follows() {
            if let Some(marker) = self.advance() {
                text.push(marker);
            }
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.advance();
            }
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        text.parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(text))
    }

    fn exponent_follows(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        match ahead.next() {
            Some('+') | Some('-') => matches!(ahead.next(), Some(c) if c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        let calc = Calculator::new();
        assert_eq!(calc.eval("42").unwrap(), 42.0);
        assert_eq!(calc.eval("3.25").unwrap(), 3.25);
        assert_eq!(calc.eval(".5").unwrap(), 0.5);
        assert_eq!(calc.eval("1e3").unwrap(), 1000.0);
        assert_eq!(calc.eval("2.5e-2").unwrap(), 0.025);
        assert_eq!(calc.eval("1E+2").unwrap(), 100.0);
    }

    #[test]
    fn test_precedence() {
        let calc = Calculator::new();
        assert_eq!(calc.eval("2+3*4").unwrap(), 14.0);
        assert_eq!(calc.eval("(2+3)*4").unwrap(), 20.0);
        assert_eq!(calc.eval("30+60/2").unwrap(), 60.0);
        assert_eq!(calc.eval("10-4-3").unwrap(), 3.0);
        assert_eq!(calc.eval("16/4/2").unwrap(), 2.0);
    }

    #[test]
    fn test_unary_signs() {
        let calc = Calculator::new();
        assert_eq!(calc.eval("-5").unwrap(), -5.0);
        assert_eq!(calc.eval("--5").unwrap(), 5.0);
        assert_eq!(calc.eval("2*-3").unwrap(), -6.0);
        assert_eq!(calc.eval("+7").unwrap(), 7.0);
        assert_eq!(calc.eval("-(1+2)").unwrap(), -3.0);
    }

    #[test]
    fn test_modulo_is_floored() {
        let calc = Calculator::new();
        assert_eq!(calc.eval("7%3").unwrap(), 1.0);
        assert_eq!(calc.eval("-7%3").unwrap(), 2.0);
        assert_eq!(calc.eval("7.5%2").unwrap(), 1.5);
    }

    #[test]
    fn test_variables() {
        let mut calc = Calculator::new();
        calc.set_variable("w", 100.0);
        calc.set_variable("ux", 10.0);
        assert_eq!(calc.eval("ux+w/2").unwrap(), 60.0);
        assert_eq!(calc.variable("w").unwrap(), 100.0);
        assert_eq!(
            calc.variable("h"),
            Err(CalcError::UndefinedVariable("h".to_string()))
        );
        calc.set_variable("w", 50.0);
        assert_eq!(calc.variable("w").unwrap(), 50.0);
    }

    #[test]
    fn test_undefined_variable_in_expression() {
        let calc = Calculator::new();
        assert_eq!(
            calc.eval("2*bogus"),
            Err(CalcError::UndefinedVariable("bogus".to_string()))
        );
    }

    #[test]
    fn test_division_by_zero() {
        let calc = Calculator::new();
        assert_eq!(calc.eval("1/0"), Err(CalcError::DivisionByZero));
        assert_eq!(calc.eval("1%(2-2)"), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn test_syntax_errors() {
        let calc = Calculator::new();
        assert_eq!(calc.eval(""), Err(CalcError::UnexpectedEnd));
        assert_eq!(calc.eval("2+"), Err(CalcError::UnexpectedEnd));
        assert_eq!(calc.eval("(2"), Err(CalcError::UnexpectedEnd));
        assert_eq!(calc.eval("2 3"), Err(CalcError::UnexpectedChar('3')));
        assert_eq!(calc.eval("#"), Err(CalcError::UnexpectedChar('#')));
        assert_eq!(
            calc.eval("1..2"),
            Err(CalcError::InvalidNumber("1..2".to_string()))
        );
    }

    #[test]
    fn test_exponent_marker_vs_name() {
        let mut calc = Calculator::new();
        calc.set_variable("e", 2.7); // a variable named like the marker
        assert_eq!(calc.eval("2*e").unwrap(), 5.4);
        assert_eq!(calc.eval("3e"), Err(CalcError::UnexpectedChar('e')));
    }

    #[test]
    fn test_whitespace_tolerated() {
        let calc = Calculator::new();
        assert_eq!(calc.eval(" 2 + 3 * 4 ").unwrap(), 14.0);
        assert_eq!(calc.eval("( 1 + 1 ) * 2").unwrap(), 4.0);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CalcError::UndefinedVariable("w".to_string()).to_string(),
            "undefined variable 'w'"
        );
        assert_eq!(CalcError::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            CalcError::UnexpectedChar('#').to_string(),
            "unexpected character '#' in expression"
        );
    }
}
