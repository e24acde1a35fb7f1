//! 2D affine transformations as 3×3 homogeneous matrices, composable
//! directly or from a compact textual command language.
//!
//! A [`Matrix`] maps points through `(x', y', 1) = M·(x, y, 1)`. Composition
//! methods fold their factor on the left, so a chain like
//! `Matrix::IDENTITY.translate(10.0, 20.0).rotate(45.0)` moves a point first
//! and rotates it afterwards, matching the reading order of the equivalent
//! command string `"T 10 20 R 45"` (see [`Matrix::parse`]).
//!
//! ```
//! use xform_calc::Calculator;
//! use xform_matrix::Matrix;
//!
//! let calc = Calculator::new();
//! let m = Matrix::parse("T 10 20 S 2", &calc)?;
//! assert_eq!(m.to_svg_transform(), "matrix(2 0 0 2 20 40)");
//! # Ok::<(), xform_matrix::ParseError>(())
//! ```

use std::fmt;
use std::ops::Mul;

use xform_calc::Calculator;

mod parse;

pub use kurbo::Point;
pub use parse::ParseError;

/// A 3×3 homogeneous transformation matrix over `f64`.
///
/// Row 2 is `(0, 0, 1)` for every affine transform, and every value the
/// composition methods produce keeps it that way. [`Matrix::from_components`]
/// and the general products can build non-affine rows; callers doing so are
/// responsible for the convention. Comparisons ([`PartialEq`],
/// [`Matrix::is_identity`]) only inspect rows 0 and 1.
#[derive(Debug, Clone, Copy)]
pub struct Matrix {
    values: [[f64; 3]; 3],
}

/// Mirror axes for [`Matrix::flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// A horizontal line `y = position`.
    Horizontal,
    /// A vertical line `x = position`.
    Vertical,
}

/// Classification of a matrix as a pure translation, returned by
/// [`Matrix::translation`].
///
/// Both variants carry the translation column `(tx, ty)`: for a
/// [`Translation::Mixed`] matrix these are simply whatever sits in the
/// translation slots, so the offsets are available without a second pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Translation {
    /// The matrix translates by `(tx, ty)` and does nothing else.
    Pure { tx: f64, ty: f64 },
    /// The matrix performs more than a translation.
    Mixed { tx: f64, ty: f64 },
}

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Matrix = Matrix {
        values: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Matrix with `d` on the whole diagonal and zero elsewhere.
    pub fn diagonal(d: f64) -> Matrix {
        let mut values = [[0.0; 3]; 3];
        for (i, row) in values.iter_mut().enumerate() {
            row[i] = d;
        }
        Matrix { values }
    }

    /// Builds a matrix row-major from up to 9 components.
    ///
    /// Missing trailing components fall back to the identity pattern (1 on
    /// the diagonal, 0 elsewhere); components beyond the ninth are ignored.
    pub fn from_components(components: &[f64]) -> Matrix {
        let mut values = [[0.0; 3]; 3];
        for i in 0..9 {
            let fallback = if i % 4 == 0 { 1.0 } else { 0.0 };
            values[i / 3][i % 3] = components.get(i).copied().unwrap_or(fallback);
        }
        Matrix { values }
    }

    /// Pure translation by `(tx, ty)`.
    pub fn from_translate(tx: f64, ty: f64) -> Matrix {
        Matrix {
            values: [[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]],
        }
    }

    /// Pure scaling by `(sx, sy)`.
    pub fn from_scale(sx: f64, sy: f64) -> Matrix {
        Matrix {
            values: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Pure rotation by `degrees`, anticlockwise for positive angles.
    pub fn from_rotate(degrees: f64) -> Matrix {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Matrix {
            values: [[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// The current transform followed by a translation. Exact zero offsets
    /// compose nothing.
    #[must_use]
    pub fn translate(self, tx: f64, ty: f64) -> Matrix {
        if tx == 0.0 && ty == 0.0 {
            self
        } else {
            self.left_multiply(Matrix::from_translate(tx, ty))
        }
    }

    /// The current transform followed by a scale. Unit factors compose
    /// nothing.
    #[must_use]
    pub fn scale(self, sx: f64, sy: f64) -> Matrix {
        if sx == 1.0 && sy == 1.0 {
            self
        } else {
            self.left_multiply(Matrix::from_scale(sx, sy))
        }
    }

    /// The current transform followed by an anticlockwise rotation of
    /// `degrees`. Composes unconditionally, even for a zero angle.
    #[must_use]
    pub fn rotate(self, degrees: f64) -> Matrix {
        self.left_multiply(Matrix::from_rotate(degrees))
    }

    /// The current transform followed by a horizontal shear,
    /// `x' = x + tan θ · y`. Elided when `tan θ` is exactly zero.
    #[must_use]
    pub fn skew_x(self, degrees: f64) -> Matrix {
        let t = degrees.to_radians().tan();
        if t == 0.0 {
            self
        } else {
            self.left_multiply(Matrix::from_components(&[1.0, t]))
        }
    }

    /// The current transform followed by a vertical shear,
    /// `y' = y + tan θ · x`. Elided when `tan θ` is exactly zero.
    #[must_use]
    pub fn skew_y(self, degrees: f64) -> Matrix {
        let t = degrees.to_radians().tan();
        if t == 0.0 {
            self
        } else {
            self.left_multiply(Matrix::from_components(&[1.0, 0.0, 0.0, t]))
        }
    }

    /// The current transform followed by a reflection about the horizontal
    /// line `y = position` or the vertical line `x = position`; points on
    /// the line stay fixed.
    #[must_use]
    pub fn flip(self, axis: Axis, position: f64) -> Matrix {
        let factor = match axis {
            Axis::Horizontal => {
                Matrix::from_components(&[1.0, 0.0, 0.0, 0.0, -1.0, 2.0 * position])
            }
            Axis::Vertical => Matrix::from_components(&[-1.0, 0.0, 2.0 * position]),
        };
        self.left_multiply(factor)
    }

    /// Swaps rows and columns.
    #[must_use]
    pub fn transpose(self) -> Matrix {
        let mut values = [[0.0; 3]; 3];
        for (i, row) in self.values.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                values[j][i] = *v;
            }
        }
        Matrix { values }
    }

    /// `other · self`: composes so that `other` acts after the current
    /// transform when mapping points.
    #[must_use]
    pub fn left_multiply(self, other: Matrix) -> Matrix {
        other * self
    }

    /// `self · other`: composes so that `other` acts before the current
    /// transform when mapping points.
    #[must_use]
    pub fn right_multiply(self, other: Matrix) -> Matrix {
        self * other
    }

    /// Maps a point through the homogeneous extension `(x, y, 1)`. Only
    /// output rows 0 and 1 are read; row 2 is assumed to be `(0, 0, 1)`.
    pub fn apply(&self, p: Point) -> Point {
        let [r0, r1, _] = &self.values;
        Point::new(
            r0[0] * p.x + r0[1] * p.y + r0[2],
            r1[0] * p.x + r1[1] * p.y + r1[2],
        )
    }

    /// True when rows 0 and 1 carry the identity pattern. Row 2 is not
    /// inspected.
    pub fn is_identity(&self) -> bool {
        for (i, row) in self.values.iter().take(2).enumerate() {
            for (j, v) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                if *v != expected {
                    return false;
                }
            }
        }
        true
    }

    /// Classifies the matrix as a pure translation or not.
    ///
    /// A pure translation carries identity values everywhere outside the
    /// translation column. The returned offsets are taken from the
    /// translation slots in either case.
    pub fn translation(&self) -> Translation {
        let tx = self.values[0][2];
        let ty = self.values[1][2];
        for (i, row) in self.values.iter().enumerate() {
            for (j, v) in row.iter().take(2).enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                if *v != expected {
                    return Translation::Mixed { tx, ty };
                }
            }
        }
        if self.values[2][2] != 1.0 {
            return Translation::Mixed { tx, ty };
        }
        Translation::Pure { tx, ty }
    }

    /// Renders the affine part as an SVG transform attribute value,
    /// `matrix(a d b e c f)`: the 2×3 submatrix in column-major order, each
    /// component rounded to 3 decimal digits (a half rounds upward).
    pub fn to_svg_transform(&self) -> String {
        let mut out = String::from("matrix(");
        for col in 0..3 {
            for row in 0..2 {
                if col > 0 || row > 0 {
                    out.push(' ');
                }
                out.push_str(&round_decimals(self.values[row][col], 3).to_string());
            }
        }
        out.push(')');
        out
    }

    /// Builds a matrix by folding a transformation command string, using
    /// `calc` to evaluate arithmetic arguments and to resolve the rotation
    /// pivot variables.
    ///
    /// | Command | Arguments | Effect |
    /// |---------|-----------|--------|
    /// | `T` | `tx[,ty]` (`ty` defaults to 0) | translate |
    /// | `S` | `sx[,sy]` (`sy` defaults to `sx`) | scale |
    /// | `R` | `angle[,cx[,cy]]` (pivot defaults to `(ux + w/2, uy + h/2)` from the variable table) | rotate about the pivot |
    /// | `FH` / `FV` | `a` | flip about the horizontal/vertical line at `a` |
    /// | `KX` / `KY` | `angle` | skew; fails for angles with vanishing cosine |
    /// | `M` | `v0[,v1,..,v5]` (omitted slots take the identity pattern) | fold a raw affine matrix, row-major |
    ///
    /// Commands transform points in the order they appear in the string. An
    /// argument runs until whitespace, a comma, or the next command letter
    /// and may be any arithmetic expression without embedded spaces; a comma
    /// makes the following argument mandatory even where it is optional.
    ///
    /// ```
    /// use xform_calc::Calculator;
    /// use xform_matrix::{Matrix, Point};
    ///
    /// let mut calc = Calculator::new();
    /// calc.set_variable("ux", 0.0);
    /// calc.set_variable("uy", 0.0);
    /// calc.set_variable("w", 100.0);
    /// calc.set_variable("h", 40.0);
    ///
    /// // Rotate about the default pivot (50, 20).
    /// let m = Matrix::parse("R 180", &calc)?;
    /// let p = m * Point::new(0.0, 0.0);
    /// assert!((p.x - 100.0).abs() < 1e-9);
    /// assert!((p.y - 40.0).abs() < 1e-9);
    /// # Ok::<(), xform_matrix::ParseError>(())
    /// ```
    pub fn parse(commands: &str, calc: &Calculator) -> Result<Matrix, ParseError> {
        parse::parse(commands, calc)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

/// Exact component-wise comparison of rows 0 and 1; row 2 is assumed fixed
/// and ignored.
impl PartialEq for Matrix {
    fn eq(&self, other: &Matrix) -> bool {
        self.values[..2] == other.values[..2]
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        let mut values = [[0.0; 3]; 3];
        for (i, row) in values.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                for k in 0..3 {
                    *v += self.values[i][k] * rhs.values[k][j];
                }
            }
        }
        Matrix { values }
    }
}

impl Mul<Point> for Matrix {
    type Output = Point;

    fn mul(self, rhs: Point) -> Point {
        self.apply(rhs)
    }
}

impl fmt::Display for Matrix {
    /// Raw component grid: `((r00,r01,r02),(r10,r11,r12),(r20,r21,r22))`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, row) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "({},{},{})", row[0], row[1], row[2])?;
        }
        write!(f, ")")
    }
}

/// Rounds to `decimals` fractional digits, half upward.
fn round_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale + 0.5).floor() / scale
}
