//! Piecewise-linear interpolation for level-remapping curves
//!
//! Curves are built from monotone knot sequences; evaluation outside the
//! knot range clamps to the first or last value.

use std::error::Error;
use std::fmt;

/// Error type for interpolation operations
#[derive(Debug, Clone)]
pub struct InterpolationError {
    message: String,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interpolation error: {}", self.message)
    }
}

impl Error for InterpolationError {}

impl InterpolationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Linear interpolation through a set of knots with strictly increasing x
#[derive(Debug, Clone)]
pub struct Piecewise {
    x_values: Vec<f64>,
    y_values: Vec<f64>,
}

impl Piecewise {
    /// Create a new interpolation from x and y values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `x_values` and `y_values` have different lengths
    /// - Fewer than 2 data points are provided
    /// - `x_values` is not strictly increasing
    pub fn new(x_values: Vec<f64>, y_values: Vec<f64>) -> Result<Self, InterpolationError> {
        if x_values.len() != y_values.len() {
            return Err(InterpolationError::new(
                "x_values and y_values must have the same length",
            ));
        }
        if x_values.len() < 2 {
            return Err(InterpolationError::new(
                "Need at least 2 points for interpolation",
            ));
        }
        if x_values.windows(2).any(|pair| match pair {
            [a, b] => a >= b || !a.is_finite() || !b.is_finite(),
            _ => false,
        }) {
            return Err(InterpolationError::new(
                "x_values must be finite and strictly increasing",
            ));
        }

        Ok(Self { x_values, y_values })
    }

    /// Build from non-decreasing x values, merging repeated x into their mean y
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 2 distinct x values remain
    pub fn from_monotone(points: &[(f64, f64)]) -> Result<Self, InterpolationError> {
        let mut x_values: Vec<f64> = Vec::with_capacity(points.len());
        let mut y_values: Vec<f64> = Vec::with_capacity(points.len());
        let mut run = 0.0;

        for &(x, y) in points {
            let repeated = x_values
                .last()
                .is_some_and(|&last_x| (x - last_x).abs() < f64::EPSILON);
            if repeated {
                // Running mean over the repeated x
                run += 1.0;
                if let Some(last_y) = y_values.last_mut() {
                    *last_y += (y - *last_y) / run;
                }
            } else {
                x_values.push(x);
                y_values.push(y);
                run = 1.0;
            }
        }

        Self::new(x_values, y_values)
    }

    /// Evaluate the curve at `x`, clamping outside the knot range
    pub fn evaluate(&self, x: f64) -> f64 {
        let (Some(&first_x), Some(&last_x)) = (self.x_values.first(), self.x_values.last()) else {
            return 0.0;
        };
        if x <= first_x {
            return self.y_values.first().copied().unwrap_or(0.0);
        }
        if x >= last_x {
            return self.y_values.last().copied().unwrap_or(0.0);
        }

        // First knot strictly greater than x; x lies in [upper-1, upper)
        let upper = self.x_values.partition_point(|&knot| knot <= x);
        let lower = upper.saturating_sub(1);
        match (
            self.x_values.get(lower),
            self.x_values.get(upper),
            self.y_values.get(lower),
            self.y_values.get(upper),
        ) {
            (Some(&x0), Some(&x1), Some(&y0), Some(&y1)) => {
                let t = (x - x0) / (x1 - x0);
                t.mul_add(y1 - y0, y0)
            }
            _ => self.y_values.last().copied().unwrap_or(0.0),
        }
    }

    /// Knot positions
    pub fn x_values(&self) -> &[f64] {
        &self.x_values
    }

    /// Knot values
    pub fn y_values(&self) -> &[f64] {
        &self.y_values
    }
}
