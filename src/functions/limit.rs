use std::fmt;

use crate::evaluator::CompiledExpr;

/// Offset from a finite approach point at which samples are taken.
pub const LIMIT_DELTA: f64 = 1e-4;

/// Stand-in for `±∞` when approaching infinity.
pub const INFINITY_SAMPLE: f64 = 1e5;

/// Two-sided limits exist only when both sides agree within this tolerance.
pub const AGREEMENT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachPoint {
  Finite(f64),
  Infinity,
}

impl ApproachPoint {
  /// Parse the approach field. `inf`, `infinity` and `∞` (any case) mean
  /// infinity; anything else must be a finite decimal.
  pub fn parse(text: &str) -> Option<ApproachPoint> {
    let trimmed = text.trim();
    match trimmed.to_lowercase().as_str() {
      "inf" | "infinity" | "∞" => Some(ApproachPoint::Infinity),
      _ => trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(ApproachPoint::Finite),
    }
  }

  fn left_sample(self) -> f64 {
    match self {
      ApproachPoint::Finite(a) => a - LIMIT_DELTA,
      ApproachPoint::Infinity => -INFINITY_SAMPLE,
    }
  }

  fn right_sample(self) -> f64 {
    match self {
      ApproachPoint::Finite(a) => a + LIMIT_DELTA,
      ApproachPoint::Infinity => INFINITY_SAMPLE,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  #[default]
  Both,
  Left,
  Right,
}

impl Direction {
  pub fn as_str(self) -> &'static str {
    match self {
      Direction::Both => "both",
      Direction::Left => "left",
      Direction::Right => "right",
    }
  }
}

/// Result of a numeric limit approximation.
#[derive(Debug, Clone, PartialEq)]
pub enum LimitOutcome {
  Value(f64),
  /// The one-sided samples disagree.
  NoLimit,
  /// A required sample could not be evaluated.
  EvaluationFailed(String),
}

impl fmt::Display for LimitOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LimitOutcome::Value(v) => {
        f.write_str(&crate::utils::format_limit_value(*v))
      }
      LimitOutcome::NoLimit => f.write_str(crate::utils::NO_LIMIT_LABEL),
      LimitOutcome::EvaluationFailed(reason) => {
        write!(f, "undefined ({reason})")
      }
    }
  }
}

/// Approximate `lim f(x)` as `x` approaches `point` from `direction`.
///
/// Only the samples the direction needs are evaluated, so an undefined
/// right side does not spoil a left-hand limit.
pub fn approximate_limit(
  expr: &CompiledExpr,
  point: ApproachPoint,
  direction: Direction,
) -> LimitOutcome {
  let sample = |x: f64| expr.evaluate(x).map_err(|e| e.to_string());

  let outcome = match direction {
    Direction::Left => match sample(point.left_sample()) {
      Ok(l) => LimitOutcome::Value(l),
      Err(reason) => LimitOutcome::EvaluationFailed(reason),
    },
    Direction::Right => match sample(point.right_sample()) {
      Ok(r) => LimitOutcome::Value(r),
      Err(reason) => LimitOutcome::EvaluationFailed(reason),
    },
    Direction::Both => {
      match (sample(point.left_sample()), sample(point.right_sample())) {
        (Ok(l), Ok(r)) if (l - r).abs() < AGREEMENT_TOLERANCE => {
          LimitOutcome::Value((l + r) / 2.0)
        }
        (Ok(_), Ok(_)) => LimitOutcome::NoLimit,
        (Err(reason), _) | (_, Err(reason)) => {
          LimitOutcome::EvaluationFailed(reason)
        }
      }
    }
  };

  log::debug!(
    "limit of {} at {point:?} ({}) -> {outcome:?}",
    expr.source(),
    direction.as_str()
  );
  outcome
}
