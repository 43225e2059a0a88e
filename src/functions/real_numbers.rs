use crate::CalcError;
use crate::evaluator::evaluate_raw;
use crate::syntax::expr_to_tex;

/// Largest denominator tried when looking for a fraction.
pub const MAX_DENOMINATOR: i64 = 10_000;
const RATIONAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct RealAnalysis {
  pub value: f64,
  pub absolute: f64,
  /// `(numerator, denominator)` when the value is rational, `None` otherwise.
  pub fraction: Option<(i64, i64)>,
  pub latex: String,
  pub is_infinite: bool,
}

impl RealAnalysis {
  pub fn is_rational(&self) -> bool {
    self.fraction.is_some()
  }

  pub fn classification(&self) -> &'static str {
    if self.is_infinite {
      "Tak hingga"
    } else if self.is_rational() {
      "Rasional"
    } else {
      "Irasional"
    }
  }
}

/// Evaluate a constant expression and classify the resulting real number.
pub fn analyze_real(expression: &str) -> Result<RealAnalysis, CalcError> {
  let expr = crate::parse(expression)?;
  let value = evaluate_raw(&expr, None)?;
  if value.is_nan() {
    return Err(CalcError::EvaluationError("result is not a number".into()));
  }

  let is_infinite = value.is_infinite();
  Ok(RealAnalysis {
    value,
    absolute: value.abs(),
    fraction: if is_infinite { None } else { rational_approximation(value) },
    latex: expr_to_tex(&expr),
    is_infinite,
  })
}

/// Best continued-fraction convergent of `value` with a denominator of at
/// most `MAX_DENOMINATOR`, if it reproduces `value`.
pub fn rational_approximation(value: f64) -> Option<(i64, i64)> {
  if !value.is_finite() || value.abs() > i64::MAX as f64 / 2.0 {
    return None;
  }

  let (mut h_prev, mut h) = (1i64, value.floor() as i64);
  let (mut k_prev, mut k) = (0i64, 1i64);
  let mut remainder = value - value.floor();

  loop {
    if (h as f64 / k as f64 - value).abs() < RATIONAL_TOLERANCE {
      return Some((h, k));
    }
    if remainder.abs() < f64::EPSILON {
      return None;
    }
    let inverse = 1.0 / remainder;
    let a = inverse.floor();
    remainder = inverse - a;
    let a = a as i64;

    let next_k = a.checked_mul(k)?.checked_add(k_prev)?;
    if next_k > MAX_DENOMINATOR {
      return None;
    }
    let next_h = a.checked_mul(h)?.checked_add(h_prev)?;
    (h_prev, h) = (h, next_h);
    (k_prev, k) = (k, next_k);
  }
}
