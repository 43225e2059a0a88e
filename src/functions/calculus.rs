//! Symbolic calculus on `Expr` trees: differentiation, simplification,
//! the n-th derivative chain and a small antiderivative table.

use crate::CalcError;
use crate::syntax::{BinaryOperator, Expr, UnaryOperator, expr_to_tex};

use BinaryOperator::*;

/// Result of the derivative chain, with both sides ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivative {
  pub order: u32,
  pub original: Expr,
  pub derivative: Expr,
  pub original_latex: String,
  pub latex: String,
}

impl Derivative {
  pub fn text(&self) -> String {
    self.derivative.to_string()
  }
}

/// Differentiate `expr` exactly `order` times with respect to `var`.
///
/// The tree is kept between iterations (simplified after each step), so no
/// precision is lost to re-serializing intermediate results. Any failure
/// aborts the whole chain.
pub fn derivative_chain(
  expr: &Expr,
  var: &str,
  order: u32,
) -> Result<Derivative, CalcError> {
  if order == 0 {
    return Err(CalcError::InvalidInput(
      "Derivative order must be a positive integer".into(),
    ));
  }

  let mut result = expr.clone();
  for step in 1..=order {
    result = simplify(differentiate(&result, var)?);
    log::debug!("d^{step}/d{var}^{step} = {result}");
  }

  Ok(Derivative {
    order,
    original: expr.clone(),
    original_latex: expr_to_tex(expr),
    latex: expr_to_tex(&result),
    derivative: result,
  })
}

fn unsupported(expr: &Expr) -> CalcError {
  CalcError::DerivationError(format!("cannot differentiate {expr}"))
}

/// Differentiate an expression with respect to a variable. Symbols other
/// than `var` are treated as constants.
pub fn differentiate(expr: &Expr, var: &str) -> Result<Expr, CalcError> {
  match expr {
    // Constants
    Expr::Integer(_) | Expr::Real(_) | Expr::Constant(_) => {
      Ok(Expr::Integer(0))
    }

    // Variable
    Expr::Identifier(name) => {
      if name == var {
        Ok(Expr::Integer(1))
      } else {
        Ok(Expr::Integer(0))
      }
    }

    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => Ok(Expr::neg(differentiate(operand, var)?)),

    Expr::BinaryOp { op, left, right } => match op {
      Plus | Minus => {
        let da = differentiate(left, var)?;
        let db = differentiate(right, var)?;
        Ok(Expr::binary(*op, da, db))
      }
      Times => {
        // Product rule: (a*b)' = a'*b + a*b'
        let da = differentiate(left, var)?;
        let db = differentiate(right, var)?;
        Ok(Expr::binary(
          Plus,
          Expr::binary(Times, da, *right.clone()),
          Expr::binary(Times, *left.clone(), db),
        ))
      }
      Divide => {
        // Quotient rule: (a/b)' = (a'*b - a*b') / b^2
        let da = differentiate(left, var)?;
        let db = differentiate(right, var)?;
        Ok(Expr::binary(
          Divide,
          Expr::binary(
            Minus,
            Expr::binary(Times, da, *right.clone()),
            Expr::binary(Times, *left.clone(), db),
          ),
          Expr::binary(Power, *right.clone(), Expr::Integer(2)),
        ))
      }
      Power => differentiate_power(expr, left, right, var),
    },

    Expr::FunctionCall { name, args } => {
      differentiate_call(expr, name, args, var)
    }
  }
}

fn differentiate_power(
  expr: &Expr,
  base: &Expr,
  exponent: &Expr,
  var: &str,
) -> Result<Expr, CalcError> {
  if exponent.is_constant_wrt(var) {
    // d/dx[f^n] = n * f^(n-1) * f'
    let df = differentiate(base, var)?;
    return Ok(Expr::binary(
      Times,
      Expr::binary(
        Times,
        exponent.clone(),
        Expr::binary(
          Power,
          base.clone(),
          Expr::binary(Minus, exponent.clone(), Expr::Integer(1)),
        ),
      ),
      df,
    ));
  }

  let dg = differentiate(exponent, var)?;
  if matches!(base, Expr::Constant(c) if c == "e") {
    // d/dx[e^g] = e^g * g'
    return Ok(Expr::binary(Times, expr.clone(), dg));
  }
  if base.is_constant_wrt(var) {
    // d/dx[a^g] = a^g * ln(a) * g'
    return Ok(Expr::binary(
      Times,
      Expr::binary(Times, expr.clone(), Expr::call("log", vec![base.clone()])),
      dg,
    ));
  }

  // f^g = e^(g ln f): (f^g)' = f^g * (g' ln f + g f'/f)
  let df = differentiate(base, var)?;
  Ok(Expr::binary(
    Times,
    expr.clone(),
    Expr::binary(
      Plus,
      Expr::binary(Times, dg, Expr::call("log", vec![base.clone()])),
      Expr::binary(
        Divide,
        Expr::binary(Times, exponent.clone(), df),
        base.clone(),
      ),
    ),
  ))
}

fn differentiate_call(
  expr: &Expr,
  name: &str,
  args: &[Expr],
  var: &str,
) -> Result<Expr, CalcError> {
  if name == "log" && args.len() == 2 {
    // log(a, b) = ln(a) / ln(b)
    let rewritten = Expr::binary(
      Divide,
      Expr::call("log", vec![args[0].clone()]),
      Expr::call("log", vec![args[1].clone()]),
    );
    return differentiate(&rewritten, var);
  }

  let [arg] = args else {
    return Err(unsupported(expr));
  };
  let u = arg.clone();
  let call = |f: &str| Expr::call(f, vec![u.clone()]);
  let one = || Expr::Integer(1);
  let two = || Expr::Integer(2);

  // Outer derivative f'(u); the chain rule factor u' is applied below.
  let outer = match name {
    "sin" => call("cos"),
    "cos" => Expr::neg(call("sin")),
    "tan" => Expr::binary(Power, call("sec"), two()),
    "sec" => Expr::binary(Times, call("sec"), call("tan")),
    "csc" => Expr::neg(Expr::binary(Times, call("csc"), call("cot"))),
    "cot" => Expr::neg(Expr::binary(Power, call("csc"), two())),
    "asin" | "acos" => {
      let d = Expr::binary(
        Divide,
        one(),
        Expr::call(
          "sqrt",
          vec![Expr::binary(Minus, one(), Expr::binary(Power, u.clone(), two()))],
        ),
      );
      if name == "acos" { Expr::neg(d) } else { d }
    }
    "atan" => Expr::binary(
      Divide,
      one(),
      Expr::binary(Plus, one(), Expr::binary(Power, u.clone(), two())),
    ),
    "sinh" => call("cosh"),
    "cosh" => call("sinh"),
    "tanh" => Expr::binary(
      Minus,
      one(),
      Expr::binary(Power, call("tanh"), two()),
    ),
    "exp" => call("exp"),
    "log" | "ln" => Expr::binary(Divide, one(), u.clone()),
    "log10" | "log2" => {
      let base = if name == "log10" { 10 } else { 2 };
      Expr::binary(
        Divide,
        one(),
        Expr::binary(
          Times,
          u.clone(),
          Expr::call("log", vec![Expr::Integer(base)]),
        ),
      )
    }
    "sqrt" => Expr::binary(Divide, one(), Expr::binary(Times, two(), call("sqrt"))),
    "cbrt" => Expr::binary(
      Divide,
      one(),
      Expr::binary(
        Times,
        Expr::Integer(3),
        Expr::binary(Power, call("cbrt"), two()),
      ),
    ),
    "abs" => call("sign"),
    // Piecewise constant; the jump at 0 is ignored
    "sign" => return Ok(Expr::Integer(0)),
    _ => return Err(unsupported(expr)),
  };

  let du = differentiate(arg, var)?;
  Ok(Expr::binary(Times, outer, du))
}

fn is_int(expr: &Expr, value: i64) -> bool {
  matches!(expr, Expr::Integer(n) if *n == value)
}

/// Fold an integer operation, falling back when it overflows or is inexact.
fn fold_integers(op: BinaryOperator, a: i64, b: i64) -> Option<Expr> {
  match op {
    Plus => a.checked_add(b).map(Expr::Integer),
    Minus => a.checked_sub(b).map(Expr::Integer),
    Times => a.checked_mul(b).map(Expr::Integer),
    Divide if b != 0 && a % b == 0 => a.checked_div(b).map(Expr::Integer),
    Power if (0..=16).contains(&b) => {
      a.checked_pow(b as u32).map(Expr::Integer)
    }
    _ => None,
  }
}

/// Simplify an expression
pub fn simplify(expr: Expr) -> Expr {
  match expr {
    Expr::BinaryOp { op, left, right } => {
      let left = simplify(*left);
      let right = simplify(*right);

      match (&op, &left, &right) {
        (_, Expr::Integer(a), Expr::Integer(b)) => {
          if let Some(folded) = fold_integers(op, *a, *b) {
            return folded;
          }
        }
        (_, Expr::Real(_), Expr::Integer(_) | Expr::Real(_))
        | (_, Expr::Integer(_), Expr::Real(_)) => {
          if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
            let value = match op {
              Plus => a + b,
              Minus => a - b,
              Times => a * b,
              Divide => a / b,
              Power => a.powf(b),
            };
            if value.is_finite() {
              return Expr::Real(value);
            }
          }
        }
        _ => {}
      }

      match (&op, &left, &right) {
        // 0 + x = x
        (Plus, l, _) if is_int(l, 0) => return right,
        // x + 0 = x, x - 0 = x
        (Plus | Minus, _, r) if is_int(r, 0) => return left,
        // 0 - x = -x
        (Minus, l, _) if is_int(l, 0) => return simplify(Expr::neg(right)),
        // x + (-y) = x - y
        (
          Plus,
          _,
          Expr::UnaryOp {
            op: UnaryOperator::Minus,
            operand,
          },
        ) => return Expr::binary(Minus, left.clone(), *operand.clone()),
        // x - (-y) = x + y
        (
          Minus,
          _,
          Expr::UnaryOp {
            op: UnaryOperator::Minus,
            operand,
          },
        ) => return Expr::binary(Plus, left.clone(), *operand.clone()),
        // 0 * x = 0
        (Times, l, r) if is_int(l, 0) || is_int(r, 0) => {
          return Expr::Integer(0);
        }
        // 1 * x = x
        (Times, l, _) if is_int(l, 1) => return right,
        // x * 1 = x
        (Times, _, r) if is_int(r, 1) => return left,
        // -1 * x = -x
        (Times, l, _) if is_int(l, -1) => return simplify(Expr::neg(right)),
        (Times, _, r) if is_int(r, -1) => return simplify(Expr::neg(left)),
        // 0 / x = 0
        (Divide, l, _) if is_int(l, 0) => return Expr::Integer(0),
        // x / 1 = x
        (Divide, _, r) if is_int(r, 1) => return left,
        // x^0 = 1
        (Power, _, r) if is_int(r, 0) => return Expr::Integer(1),
        // x^1 = x
        (Power, _, r) if is_int(r, 1) => return left,
        // 1^n = 1
        (Power, l, _) if is_int(l, 1) => return Expr::Integer(1),
        _ => {}
      }

      if op == Times {
        return simplify_product(left, right);
      }

      Expr::binary(op, left, right)
    }
    Expr::UnaryOp { op, operand } => {
      let operand = simplify(*operand);
      match operand {
        Expr::Integer(n) if n.checked_neg().is_some() => Expr::Integer(-n),
        Expr::Real(f) => Expr::Real(-f),
        // -(-x) = x
        Expr::UnaryOp { operand: inner, .. } => *inner,
        other => Expr::UnaryOp {
          op,
          operand: Box::new(other),
        },
      }
    }
    Expr::FunctionCall { name, args } => Expr::FunctionCall {
      name,
      args: args.into_iter().map(simplify).collect(),
    },
    other => other,
  }
}

/// Split `c * rest` into its integer coefficient and remaining factor.
fn split_coefficient(expr: Expr) -> (i64, Option<Expr>) {
  match expr {
    Expr::Integer(n) => (n, None),
    Expr::UnaryOp { operand, .. } => {
      let (c, rest) = split_coefficient(*operand);
      match c.checked_neg() {
        Some(neg) => (neg, rest),
        None => (1, Some(Expr::neg(rebuild(c, rest)))),
      }
    }
    Expr::BinaryOp {
      op: Times,
      left,
      right,
    } if matches!(left.as_ref(), Expr::Integer(_)) => {
      let (c, rest) = split_coefficient(*right);
      match (*left, c) {
        (Expr::Integer(a), c) => match a.checked_mul(c) {
          Some(product) => (product, rest),
          None => (1, Some(Expr::binary(Times, Expr::Integer(a), rebuild(c, rest)))),
        },
        (other, c) => (1, Some(Expr::binary(Times, other, rebuild(c, rest)))),
      }
    }
    other => (1, Some(other)),
  }
}

fn rebuild(coefficient: i64, rest: Option<Expr>) -> Expr {
  match (coefficient, rest) {
    (c, None) => Expr::Integer(c),
    (1, Some(rest)) => rest,
    (-1, Some(rest)) => Expr::neg(rest),
    (0, Some(_)) => Expr::Integer(0),
    (c, Some(rest)) => Expr::binary(Times, Expr::Integer(c), rest),
  }
}

/// Merge integer coefficients of both factors: `2*(3*x)` becomes `6*x`.
fn simplify_product(left: Expr, right: Expr) -> Expr {
  let (a, left_rest) = split_coefficient(left);
  let (b, right_rest) = split_coefficient(right);
  let coefficient = match a.checked_mul(b) {
    Some(c) => c,
    None => {
      return Expr::binary(Times, rebuild(a, left_rest), rebuild(b, right_rest));
    }
  };
  let rest = match (left_rest, right_rest) {
    (Some(l), Some(r)) => Some(Expr::binary(Times, l, r)),
    (Some(only), None) | (None, Some(only)) => Some(only),
    (None, None) => None,
  };
  rebuild(coefficient, rest)
}

/// Antiderivative of `expr` (without the constant), for the forms the
/// table covers: sums, constant multiples, powers of `var`, `1/var`,
/// sin/cos/exp of a linear argument. `None` when no rule applies.
pub fn antiderivative(expr: &Expr, var: &str) -> Option<Expr> {
  integrate(expr, var).map(simplify)
}

fn integrate(expr: &Expr, var: &str) -> Option<Expr> {
  let x = || Expr::var(var);

  if expr.is_constant_wrt(var) {
    // ∫ c dx = c*x
    return Some(Expr::binary(Times, expr.clone(), x()));
  }

  match expr {
    // ∫ x dx = x^2/2
    Expr::Identifier(_) => Some(Expr::binary(
      Divide,
      Expr::binary(Power, x(), Expr::Integer(2)),
      Expr::Integer(2),
    )),
    Expr::UnaryOp { operand, .. } => integrate(operand, var).map(Expr::neg),
    Expr::BinaryOp { op, left, right } => match op {
      // ∫ (a ± b) dx = ∫ a dx ± ∫ b dx
      Plus | Minus => Some(Expr::binary(
        *op,
        integrate(left, var)?,
        integrate(right, var)?,
      )),
      Times => {
        if left.is_constant_wrt(var) {
          return Some(Expr::binary(
            Times,
            *left.clone(),
            integrate(right, var)?,
          ));
        }
        if right.is_constant_wrt(var) {
          return Some(Expr::binary(
            Times,
            *right.clone(),
            integrate(left, var)?,
          ));
        }
        None
      }
      Divide => {
        if right.is_constant_wrt(var) {
          return Some(Expr::binary(
            Divide,
            integrate(left, var)?,
            *right.clone(),
          ));
        }
        // ∫ c/x dx = c*ln|x|
        if left.is_constant_wrt(var) && matches!(right.as_ref(), Expr::Identifier(v) if v == var) {
          return Some(Expr::binary(
            Times,
            *left.clone(),
            Expr::call("log", vec![Expr::call("abs", vec![x()])]),
          ));
        }
        None
      }
      Power => {
        let is_var = matches!(left.as_ref(), Expr::Identifier(v) if v == var);
        if is_var && right.is_constant_wrt(var) {
          // `-1` parses as a negation, fold it before matching
          let exponent = simplify(*right.clone());
          if exponent.as_number() == Some(-1.0) {
            return Some(Expr::call("log", vec![Expr::call("abs", vec![x()])]));
          }
          // ∫ x^n dx = x^(n+1)/(n+1)
          let raised = simplify(Expr::binary(Plus, exponent, Expr::Integer(1)));
          if let Expr::Integer(k) = raised {
            if let Some(positive) = k.checked_neg().filter(|p| *p > 0) {
              // x^k/k with k < 0 reads as -x^k/|k|
              return Some(Expr::binary(
                Divide,
                Expr::neg(Expr::binary(Power, x(), Expr::Integer(k))),
                Expr::Integer(positive),
              ));
            }
          }
          return Some(Expr::binary(
            Divide,
            Expr::binary(Power, x(), raised.clone()),
            raised,
          ));
        }
        // ∫ e^(a*x) dx = e^(a*x)/a
        if matches!(left.as_ref(), Expr::Constant(c) if c == "e") {
          let a = linear_coefficient(right, var)?;
          return Some(Expr::binary(Divide, expr.clone(), a));
        }
        None
      }
    },
    Expr::FunctionCall { name, args } if args.len() == 1 => {
      let a = linear_coefficient(&args[0], var)?;
      let antiderivative = match name.as_str() {
        // ∫ sin(a x) dx = -cos(a x)/a
        "sin" => Expr::neg(Expr::call("cos", args.clone())),
        // ∫ cos(a x) dx = sin(a x)/a
        "cos" => Expr::call("sin", args.clone()),
        // ∫ exp(a x) dx = exp(a x)/a
        "exp" => Expr::call("exp", args.clone()),
        _ => return None,
      };
      if is_int(&simplify(a.clone()), 1) {
        Some(antiderivative)
      } else {
        Some(Expr::binary(Divide, antiderivative, a))
      }
    }
    _ => None,
  }
}

/// `a` for arguments of the form `a*x` (or `x`, giving 1).
fn linear_coefficient(expr: &Expr, var: &str) -> Option<Expr> {
  match expr {
    Expr::Identifier(v) if v == var => Some(Expr::Integer(1)),
    Expr::BinaryOp {
      op: Times,
      left,
      right,
    } => {
      let left_is_var = matches!(left.as_ref(), Expr::Identifier(v) if v == var);
      let right_is_var = matches!(right.as_ref(), Expr::Identifier(v) if v == var);
      if right_is_var && left.is_constant_wrt(var) {
        Some(*left.clone())
      } else if left_is_var && right.is_constant_wrt(var) {
        Some(*right.clone())
      } else {
        None
      }
    }
    _ => None,
  }
}
