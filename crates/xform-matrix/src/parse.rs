//! Parser for the textual transformation-command language.

use std::iter::Peekable;
use std::str::Chars;

use xform_calc::{CalcError, Calculator};

use crate::{Axis, Matrix};

/// Error raised while parsing a transformation command string.
///
/// Every malformed input maps to this one kind; the message carries the
/// diagnostic, including evaluator diagnostics forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }

    /// The diagnostic text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CalcError> for ParseError {
    fn from(err: CalcError) -> Self {
        ParseError::new(err.to_string())
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
}

/// Scans one command argument and evaluates it.
///
/// A leading comma, when mandated for a required argument, must be the next
/// character after the whitespace. A present comma is consumed and makes the
/// argument mandatory even when it was optional. The argument text then runs
/// until whitespace, a comma, an uppercase letter (the next command), or the
/// end of the input; empty text falls back to `default`, which is only
/// evaluated when needed so that defaults depending on unset variables do
/// not fail supplied arguments.
fn argument(
    scanner: &mut Scanner,
    calc: &Calculator,
    optional: bool,
    leading_comma: bool,
    default: impl FnOnce() -> Result<f64, ParseError>,
) -> Result<f64, ParseError> {
    scanner.skip_whitespace();
    if !optional && leading_comma && scanner.peek() != Some(',') {
        return Err(ParseError::new("',' expected"));
    }
    let mut optional = optional;
    if scanner.peek() == Some(',') {
        scanner.advance();
        optional = false;
        scanner.skip_whitespace();
    }
    let mut expr = String::new();
    while let Some(c) = scanner.peek() {
        if c.is_whitespace() || c.is_ascii_uppercase() || c == ',' {
            break;
        }
        expr.push(c);
        scanner.advance();
    }
    if expr.is_empty() {
        if optional {
            return default();
        }
        return Err(ParseError::new("parameter expected"));
    }
    Ok(calc.eval(&expr)?)
}

pub(crate) fn parse(commands: &str, calc: &Calculator) -> Result<Matrix, ParseError> {
    log::trace!("parsing transformation commands {commands:?}");
    let mut scanner = Scanner::new(commands);
    let mut matrix = Matrix::IDENTITY;
    loop {
        scanner.skip_whitespace();
        let Some(cmd) = scanner.advance() else {
            return Ok(matrix);
        };
        match cmd {
            'T' => {
                let tx = argument(&mut scanner, calc, false, false, || Ok(0.0))?;
                let ty = argument(&mut scanner, calc, true, true, || Ok(0.0))?;
                matrix = matrix.translate(tx, ty);
            }
            'S' => {
                let sx = argument(&mut scanner, calc, false, false, || Ok(1.0))?;
                let sy = argument(&mut scanner, calc, true, true, || Ok(sx))?;
                matrix = matrix.scale(sx, sy);
            }
            'R' => {
                let angle = argument(&mut scanner, calc, false, false, || Ok(0.0))?;
                let cx = argument(&mut scanner, calc, true, true, || {
                    Ok(calc.variable("ux")? + calc.variable("w")? / 2.0)
                })?;
                let cy = argument(&mut scanner, calc, true, true, || {
                    Ok(calc.variable("uy")? + calc.variable("h")? / 2.0)
                })?;
                matrix = matrix.translate(-cx, -cy).rotate(angle).translate(cx, cy);
            }
            'F' => {
                let axis = match scanner.advance() {
                    Some('H') => Axis::Horizontal,
                    Some('V') => Axis::Vertical,
                    _ => return Err(ParseError::new("'H' or 'V' expected")),
                };
                let position = argument(&mut scanner, calc, false, false, || Ok(0.0))?;
                matrix = matrix.flip(axis, position);
            }
            'K' => {
                let direction = scanner.advance();
                if !matches!(direction, Some('X' | 'Y')) {
                    return Err(ParseError::new(
                        "transformation command 'K' must be followed by 'X' or 'Y'",
                    ));
                }
                let degrees = argument(&mut scanner, calc, false, false, || Ok(0.0))?;
                if degrees.to_radians().cos().abs() <= f64::EPSILON {
                    return Err(ParseError::new(format!(
                        "illegal skewing angle: {degrees} degrees"
                    )));
                }
                matrix = if direction == Some('X') {
                    matrix.skew_x(degrees)
                } else {
                    matrix.skew_y(degrees)
                };
            }
            'M' => {
                let mut components = [0.0; 6];
                for (i, slot) in components.iter_mut().enumerate() {
                    let fallback = if i % 4 == 0 { 1.0 } else { 0.0 };
                    *slot = argument(&mut scanner, calc, i != 0, i != 0, || Ok(fallback))?;
                }
                matrix = matrix.left_multiply(Matrix::from_components(&components));
            }
            other => {
                return Err(ParseError::new(format!(
                    "transformation command expected (found '{other}' instead)"
                )));
            }
        }
    }
}
