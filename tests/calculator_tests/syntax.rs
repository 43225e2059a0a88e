use super::*;

mod parsing {
  use super::*;

  #[test]
  fn precedence() {
    assert_eq!(evaluate("2 + 3 * 4", 0.0).unwrap(), 14.0);
    assert_eq!(evaluate("2^3^2", 0.0).unwrap(), 512.0);
    assert_eq!(evaluate("-x^2", 3.0).unwrap(), -9.0);
    assert_eq!(evaluate("x^-2", 2.0).unwrap(), 0.25);
  }

  #[test]
  fn implicit_multiplication() {
    assert_eq!(evaluate("5x^2", 2.0).unwrap(), 20.0);
    assert_eq!(evaluate("2(x + 1)", 1.0).unwrap(), 4.0);
    assert_eq!(evaluate("(x + 1)(x - 1)", 3.0).unwrap(), 8.0);
    assert_close(evaluate("2sin(x)", 0.5).unwrap(), 2.0 * 0.5f64.sin(), 1e-12);
  }

  #[test]
  fn numbers() {
    assert_close(evaluate(".5 + 1e-3", 0.0).unwrap(), 0.501, 1e-12);
    assert_eq!(parse("12").unwrap(), Expr::Integer(12));
    assert_eq!(parse("3.5").unwrap(), Expr::Real(3.5));
  }

  #[test]
  fn constants() {
    assert_close(evaluate("pi", 0.0).unwrap(), std::f64::consts::PI, 1e-15);
    assert_close(evaluate("e^1", 0.0).unwrap(), std::f64::consts::E, 1e-15);
  }

  #[test]
  fn empty_and_malformed_input() {
    assert!(matches!(parse("   "), Err(CalcError::EmptyInput)));
    assert!(matches!(parse("2 +"), Err(CalcError::ParseError(_))));
    assert!(matches!(parse("sin(x"), Err(CalcError::ParseError(_))));
  }
}

mod evaluation {
  use super::*;

  #[test]
  fn functions() {
    assert_eq!(evaluate("sqrt(16)", 0.0).unwrap(), 4.0);
    assert_eq!(evaluate("abs(x)", -3.0).unwrap(), 3.0);
    assert_close(evaluate("log(8, 2)", 0.0).unwrap(), 3.0, 1e-12);
    assert_eq!(evaluate("cbrt(27)", 0.0).unwrap(), 3.0);
    assert_close(evaluate("ln(e)", 0.0).unwrap(), 1.0, 1e-15);
  }

  #[test]
  fn sign_of_zero_is_zero() {
    assert_eq!(evaluate("sign(x)", 0.0).unwrap(), 0.0);
    assert_eq!(evaluate("sign(x)", -2.0).unwrap(), -1.0);
  }

  #[test]
  fn non_finite_results_are_errors() {
    assert!(matches!(
      evaluate("1/x", 0.0),
      Err(CalcError::EvaluationError(_))
    ));
    assert!(evaluate("sqrt(x)", -1.0).is_err());
    assert!(evaluate("log(x)", -1.0).is_err());
  }

  #[test]
  fn unknown_symbols_and_functions() {
    assert!(evaluate("y + 1", 0.0).is_err());
    assert!(evaluate("foo(x)", 0.0).is_err());
    assert!(evaluate("sin(x, 2)", 0.0).is_err());
  }

  #[test]
  fn compiled_form_is_reusable() {
    let f = compile("x^2 - 1");
    assert_eq!(f.evaluate(1.0).unwrap(), 0.0);
    assert_eq!(f.evaluate(3.0).unwrap(), 8.0);
    assert_eq!(f.source(), "x^2 - 1");
  }
}

mod serialization {
  use super::*;

  fn reparses_identically(source: &str) {
    let expr = parse(source).unwrap();
    let text = expr.to_string();
    let again = parse(&text).unwrap();
    for x in [-2.5, -0.5, 0.7, 1.3, 3.0] {
      let a = kalkumath::evaluate_expr(&expr, x);
      let b = kalkumath::evaluate_expr(&again, x);
      match (a, b) {
        (Ok(a), Ok(b)) => assert_close(a, b, 1e-12),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("{source} -> {text}: {a:?} vs {b:?}"),
      }
    }
  }

  #[test]
  fn text_round_trips() {
    for source in [
      "x^2 - (x - 1)",
      "-x^2",
      "(-x)^2",
      "2^x^2",
      "(2^x)^2",
      "1/(x*(x + 1))",
      "x - -x",
      "-(x + 1)*3",
      "sin(x)^2/cos(x)",
      "log(x^2 + 1, 3) - abs(x)",
    ] {
      reparses_identically(source);
    }
  }

  #[test]
  fn display_is_compact() {
    assert_eq!(parse("3 * x ^ 2 + 1").unwrap().to_string(), "3*x^2 + 1");
    assert_eq!(parse("x - (y - z)").unwrap().to_string(), "x - (y - z)");
  }

  #[test]
  fn latex() {
    assert_eq!(expr_to_tex(&parse("x^2").unwrap()), "{x}^{2}");
    assert_eq!(expr_to_tex(&parse("1/x").unwrap()), "\\frac{1}{x}");
    assert_eq!(
      expr_to_tex(&parse("sin(x)").unwrap()),
      "\\sin\\left(x\\right)"
    );
    assert_eq!(expr_to_tex(&parse("abs(x)").unwrap()), "\\left|x\\right|");
    assert_eq!(expr_to_tex(&parse("sqrt(x)").unwrap()), "\\sqrt{x}");
    assert_eq!(expr_to_tex(&parse("2*pi").unwrap()), "2\\cdot\\pi");
  }
}
