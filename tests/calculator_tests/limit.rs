use super::*;

fn limit(source: &str, point: ApproachPoint, direction: Direction) -> LimitOutcome {
  approximate_limit(&compile(source), point, direction)
}

fn value_of(outcome: LimitOutcome) -> f64 {
  match outcome {
    LimitOutcome::Value(v) => v,
    other => panic!("expected a value, got {other:?}"),
  }
}

mod removable_discontinuities {
  use super::*;

  #[test]
  fn sinc_at_zero() {
    let v = value_of(limit("sin(x)/x", ApproachPoint::Finite(0.0), Direction::Both));
    assert_close(v, 1.0, 1e-3);
  }

  #[test]
  fn factorable_quotient() {
    let v = value_of(limit(
      "(x^2 - 4)/(x - 2)",
      ApproachPoint::Finite(2.0),
      Direction::Both,
    ));
    assert_close(v, 4.0, 1e-3);
  }
}

mod one_sided {
  use super::*;

  #[test]
  fn sign_jump() {
    let at_zero = ApproachPoint::Finite(0.0);
    assert_eq!(limit("sign(x)", at_zero, Direction::Both), LimitOutcome::NoLimit);
    assert_eq!(limit("sign(x)", at_zero, Direction::Left), LimitOutcome::Value(-1.0));
    assert_eq!(limit("sign(x)", at_zero, Direction::Right), LimitOutcome::Value(1.0));
  }

  #[test]
  fn only_needed_side_is_evaluated() {
    // sqrt is undefined left of 0
    let at_zero = ApproachPoint::Finite(0.0);
    assert!(matches!(
      limit("sqrt(x)", at_zero, Direction::Right),
      LimitOutcome::Value(_)
    ));
    assert!(matches!(
      limit("sqrt(x)", at_zero, Direction::Left),
      LimitOutcome::EvaluationFailed(_)
    ));
    assert!(matches!(
      limit("sqrt(x)", at_zero, Direction::Both),
      LimitOutcome::EvaluationFailed(_)
    ));
  }
}

mod at_infinity {
  use super::*;

  #[test]
  fn rational_function() {
    let v = value_of(limit(
      "(2x^2 + 1)/(x^2 - 3)",
      ApproachPoint::Infinity,
      Direction::Both,
    ));
    assert_close(v, 2.0, 1e-3);
  }

  #[test]
  fn arctangent_has_different_ends() {
    assert_eq!(
      limit("atan(x)", ApproachPoint::Infinity, Direction::Both),
      LimitOutcome::NoLimit
    );
    let right = value_of(limit("atan(x)", ApproachPoint::Infinity, Direction::Right));
    assert_close(right, std::f64::consts::FRAC_PI_2, 1e-4);
  }

  #[test]
  fn approach_text() {
    assert_eq!(ApproachPoint::parse("inf"), Some(ApproachPoint::Infinity));
    assert_eq!(ApproachPoint::parse(" Infinity "), Some(ApproachPoint::Infinity));
    assert_eq!(ApproachPoint::parse("∞"), Some(ApproachPoint::Infinity));
    assert_eq!(ApproachPoint::parse("-1.5"), Some(ApproachPoint::Finite(-1.5)));
    assert_eq!(ApproachPoint::parse("abc"), None);
  }
}

mod display {
  use super::*;

  #[test]
  fn outcome_text() {
    assert_eq!(LimitOutcome::Value(4.0000000001).to_string(), "4");
    assert_eq!(LimitOutcome::Value(0.6666666).to_string(), "0.6667");
    assert_eq!(LimitOutcome::NoLimit.to_string(), "Tidak Ada");
  }
}
