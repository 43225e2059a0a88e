use crate::syntax::{BinaryOperator, Expr, UnaryOperator, expr_to_string};
use crate::{CalcError, parse};

/// Name of the independent variable bound by every calculator.
pub const VARIABLE: &str = "x";

/// An expression parsed once and evaluated at many points.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
  source: String,
  expr: Expr,
}

impl CompiledExpr {
  pub fn compile(source: &str) -> Result<Self, CalcError> {
    Ok(CompiledExpr {
      source: source.to_string(),
      expr: parse(source)?,
    })
  }

  pub fn from_expr(expr: Expr) -> Self {
    CompiledExpr {
      source: expr_to_string(&expr),
      expr,
    }
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn expr(&self) -> &Expr {
    &self.expr
  }

  /// Value at `x`; any failure means "undefined at this point".
  pub fn evaluate(&self, x: f64) -> Result<f64, CalcError> {
    evaluate_expr(&self.expr, x)
  }
}

/// One-shot form: parse `source`, bind `x`, evaluate.
pub fn evaluate(source: &str, x: f64) -> Result<f64, CalcError> {
  CompiledExpr::compile(source)?.evaluate(x)
}

/// Evaluate with `x` bound, rejecting NaN and infinities.
pub fn evaluate_expr(expr: &Expr, x: f64) -> Result<f64, CalcError> {
  let value = evaluate_raw(expr, Some(x))?;
  ensure_finite(value)
}

pub fn ensure_finite(value: f64) -> Result<f64, CalcError> {
  if value.is_nan() {
    Err(CalcError::EvaluationError("result is not a number".into()))
  } else if value.is_infinite() {
    Err(CalcError::EvaluationError(
      "result is infinite (division by zero?)".into(),
    ))
  } else {
    Ok(value)
  }
}

/// IEEE evaluation without the finiteness check. `x` is `None` for
/// constant expressions, in which case any variable is an error.
pub fn evaluate_raw(expr: &Expr, x: Option<f64>) -> Result<f64, CalcError> {
  match expr {
    Expr::Integer(n) => Ok(*n as f64),
    Expr::Real(f) => Ok(*f),
    Expr::Constant(name) => match name.as_str() {
      "pi" => Ok(std::f64::consts::PI),
      "e" => Ok(std::f64::consts::E),
      other => Err(CalcError::EvaluationError(format!(
        "Undefined constant {other}"
      ))),
    },
    Expr::Identifier(name) => match x {
      Some(value) if name == VARIABLE => Ok(value),
      _ => Err(CalcError::EvaluationError(format!(
        "Undefined symbol {name}"
      ))),
    },
    Expr::UnaryOp { op, operand } => {
      let v = evaluate_raw(operand, x)?;
      match op {
        UnaryOperator::Minus => Ok(-v),
      }
    }
    Expr::BinaryOp { op, left, right } => {
      let l = evaluate_raw(left, x)?;
      let r = evaluate_raw(right, x)?;
      Ok(match op {
        BinaryOperator::Plus => l + r,
        BinaryOperator::Minus => l - r,
        BinaryOperator::Times => l * r,
        BinaryOperator::Divide => l / r,
        BinaryOperator::Power => l.powf(r),
      })
    }
    Expr::FunctionCall { name, args } => {
      let values = args
        .iter()
        .map(|a| evaluate_raw(a, x))
        .collect::<Result<Vec<f64>, _>>()?;
      apply_function(name, &values)
    }
  }
}

fn expect_arity(name: &str, args: &[f64], n: usize) -> Result<(), CalcError> {
  if args.len() != n {
    return Err(CalcError::EvaluationError(format!(
      "{name} expects {n} argument{}, got {}",
      if n == 1 { "" } else { "s" },
      args.len()
    )));
  }
  Ok(())
}

/// Apply a built-in function to already evaluated arguments.
pub fn apply_function(name: &str, args: &[f64]) -> Result<f64, CalcError> {
  if name == "log" && args.len() == 2 {
    return Ok(args[0].ln() / args[1].ln());
  }

  let unary: fn(f64) -> f64 = match name {
    "sin" => f64::sin,
    "cos" => f64::cos,
    "tan" => f64::tan,
    "sec" => |v| 1.0 / v.cos(),
    "csc" => |v| 1.0 / v.sin(),
    "cot" => |v| 1.0 / v.tan(),
    "asin" => f64::asin,
    "acos" => f64::acos,
    "atan" => f64::atan,
    "sinh" => f64::sinh,
    "cosh" => f64::cosh,
    "tanh" => f64::tanh,
    "exp" => f64::exp,
    "log" | "ln" => f64::ln,
    "log10" => f64::log10,
    "log2" => f64::log2,
    "sqrt" => f64::sqrt,
    "cbrt" => f64::cbrt,
    "abs" => f64::abs,
    // f64::signum maps 0 to 1
    "sign" => |v| {
      if v > 0.0 {
        1.0
      } else if v < 0.0 {
        -1.0
      } else {
        v
      }
    },
    _ => {
      return Err(CalcError::EvaluationError(format!(
        "Undefined function {name}"
      )));
    }
  };

  expect_arity(name, args, 1)?;
  Ok(unary(args[0]))
}

/// Functions the evaluator understands.
pub fn is_known_function(name: &str) -> bool {
  apply_function(name, &[1.0]).is_ok()
}
