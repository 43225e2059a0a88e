use super::*;
use std::f64::consts::PI;

mod simpson {
  use super::*;

  #[test]
  fn polynomial_matches_closed_form() {
    assert_close(integrate(&compile("x^2"), 0.0, 2.0).unwrap(), 8.0 / 3.0, 1e-3);
    assert_close(
      integrate(&compile("3x^2 - 2x + 1"), -1.0, 2.0).unwrap(),
      9.0,
      1e-3,
    );
  }

  #[test]
  fn reversed_bounds_flip_sign() {
    let f = compile("sin(x) + x^3");
    let forward = integrate(&f, 0.5, 2.5).unwrap();
    let backward = integrate(&f, 2.5, 0.5).unwrap();
    assert_close(forward, -backward, 1e-9);
  }

  #[test]
  fn empty_interval_is_zero() {
    assert_eq!(integrate(&compile("x^2"), 1.0, 1.0).unwrap(), 0.0);
  }

  #[test]
  fn undefined_sample_aborts() {
    let result = integrate(&compile("1/x"), -1.0, 1.0);
    assert!(matches!(result, Err(CalcError::EvaluationError(_))));
  }

  #[test]
  fn non_finite_bounds_are_invalid() {
    let result = integrate(&compile("x"), f64::NEG_INFINITY, 0.0);
    assert!(matches!(result, Err(CalcError::InvalidInput(_))));
    assert!(integrate(&compile("x"), 0.0, f64::NAN).is_err());
  }
}

mod areas {
  use super::*;

  #[test]
  fn net_and_absolute_area_differ_for_sign_change() {
    let f = compile("x");
    assert_close(area_net(&f, -1.0, 1.0).unwrap(), 0.0, 1e-9);
    assert_close(area_absolute(&f, -1.0, 1.0).unwrap(), 1.0, 1e-3);
  }

  #[test]
  fn areas_agree_for_positive_function() {
    let f = compile("x^2 + 1");
    let net = area(&f, 0.0, 3.0, AreaMethod::Net).unwrap();
    let absolute = area(&f, 0.0, 3.0, AreaMethod::Absolute).unwrap();
    assert_close(net, 12.0, 1e-3);
    assert_close(net, absolute, 1e-9);
  }

  #[test]
  fn net_area_is_non_negative() {
    assert_close(area_net(&compile("-2"), 0.0, 3.0).unwrap(), 6.0, 1e-9);
  }
}

mod volumes {
  use super::*;

  #[test]
  fn disk_method() {
    assert_close(volume_x(&compile("x"), 0.0, 1.0).unwrap(), PI / 3.0, 1e-3);
    // Sphere of radius 1
    assert_close(
      volume(&compile("sqrt(1 - x^2)"), -1.0, 1.0, Axis::X).unwrap(),
      4.0 * PI / 3.0,
      1e-3,
    );
  }

  #[test]
  fn shell_method() {
    // 2π ∫_0^1 x·x^2 dx = π/2
    assert_close(volume_y(&compile("x^2"), 0.0, 1.0).unwrap(), PI / 2.0, 1e-3);
  }
}

mod antiderivatives {
  use super::*;

  fn primitive(source: &str) -> Option<String> {
    antiderivative(&parse(source).unwrap(), "x").map(|e| e.to_string())
  }

  #[test]
  fn power_rule() {
    assert_eq!(primitive("x^2").as_deref(), Some("x^3/3"));
    assert_eq!(primitive("3").as_deref(), Some("3*x"));
  }

  #[test]
  fn negative_exponents() {
    assert_eq!(primitive("x^-1").as_deref(), Some("log(abs(x))"));
    assert_eq!(primitive("x^(-1)").as_deref(), Some("log(abs(x))"));
    assert_eq!(primitive("x^-2").as_deref(), Some("-x^(-1)"));
    assert_eq!(primitive("x^(-3)").as_deref(), Some("-x^(-2)/2"));
  }

  #[test]
  fn derivative_of_primitive_recovers_integrand() {
    for source in [
      "x^3 - 4x + 2",
      "sin(2x) + cos(x)",
      "exp(3x)",
      "5/x",
      "x^-1",
      "x^(-2)",
      "3x^(-3)",
    ] {
      let expr = parse(source).unwrap();
      let primitive = antiderivative(&expr, "x").unwrap();
      let back = differentiate(&primitive, "x").unwrap();
      for x in [0.3, 1.1, 2.7] {
        assert_close(
          kalkumath::evaluate_expr(&back, x).unwrap(),
          kalkumath::evaluate_expr(&expr, x).unwrap(),
          1e-9,
        );
      }
    }
  }

  #[test]
  fn unsupported_forms() {
    assert_eq!(primitive("x*sin(x)"), None);
    assert_eq!(primitive("tan(x)"), None);
  }
}
