use pest::iterators::Pair;

use crate::{CalcError, Rule};

/// Parsed formula in one free variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Integer(i64),
  Real(f64),
  /// `pi` or `e`
  Constant(String),
  Identifier(String),
  UnaryOp {
    op: UnaryOperator,
    operand: Box<Expr>,
  },
  BinaryOp {
    op: BinaryOperator,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  FunctionCall {
    name: String,
    args: Vec<Expr>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
  Plus,
  Minus,
  Times,
  Divide,
  Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
  Minus,
}

impl Expr {
  pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
      op,
      left: Box::new(left),
      right: Box::new(right),
    }
  }

  pub fn neg(operand: Expr) -> Expr {
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand: Box::new(operand),
    }
  }

  pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::FunctionCall {
      name: name.to_string(),
      args,
    }
  }

  pub fn var(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
  }

  /// Numeric value of a literal node, if it is one.
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Expr::Integer(n) => Some(*n as f64),
      Expr::Real(f) => Some(*f),
      _ => None,
    }
  }

  /// True when `var` does not occur anywhere in the expression.
  pub fn is_constant_wrt(&self, var: &str) -> bool {
    match self {
      Expr::Integer(_) | Expr::Real(_) | Expr::Constant(_) => true,
      Expr::Identifier(name) => name != var,
      Expr::UnaryOp { operand, .. } => operand.is_constant_wrt(var),
      Expr::BinaryOp { left, right, .. } => {
        left.is_constant_wrt(var) && right.is_constant_wrt(var)
      }
      Expr::FunctionCall { args, .. } => {
        args.iter().all(|a| a.is_constant_wrt(var))
      }
    }
  }
}

impl std::fmt::Display for Expr {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&expr_to_string(self))
  }
}

fn next_inner<'a>(
  pairs: &mut pest::iterators::Pairs<'a, Rule>,
  context: &str,
) -> Result<Pair<'a, Rule>, CalcError> {
  pairs.next().ok_or_else(|| {
    CalcError::EvaluationError(format!("Malformed {context} in syntax tree"))
  })
}

/// Convert a pest pair into an `Expr`.
pub fn pair_to_expr(pair: Pair<Rule>) -> Result<Expr, CalcError> {
  match pair.as_rule() {
    Rule::Expression => {
      let mut inner = pair.into_inner();
      let mut result = pair_to_expr(next_inner(&mut inner, "sum")?)?;
      while let Some(op_pair) = inner.next() {
        let term = pair_to_expr(next_inner(&mut inner, "sum")?)?;
        let op = match op_pair.as_str() {
          "-" => BinaryOperator::Minus,
          _ => BinaryOperator::Plus,
        };
        result = Expr::binary(op, result, term);
      }
      Ok(result)
    }
    Rule::Term => {
      let mut inner = pair.into_inner();
      let mut result = pair_to_expr(next_inner(&mut inner, "product")?)?;
      while let Some(next) = inner.next() {
        match next.as_rule() {
          Rule::MulOperator => {
            let factor = pair_to_expr(next_inner(&mut inner, "product")?)?;
            let op = if next.as_str() == "/" {
              BinaryOperator::Divide
            } else {
              BinaryOperator::Times
            };
            result = Expr::binary(op, result, factor);
          }
          _ => {
            let factor = pair_to_expr(next)?;
            result = Expr::binary(BinaryOperator::Times, result, factor);
          }
        }
      }
      Ok(result)
    }
    Rule::Factor => {
      let mut negations = 0usize;
      let mut operand = None;
      for inner in pair.into_inner() {
        match inner.as_rule() {
          Rule::UnaryOperator => {
            if inner.as_str() == "-" {
              negations += 1;
            }
          }
          _ => operand = Some(pair_to_expr(inner)?),
        }
      }
      let mut result = operand.ok_or_else(|| {
        CalcError::EvaluationError("Unary operator without operand".into())
      })?;
      for _ in 0..negations {
        result = Expr::neg(result);
      }
      Ok(result)
    }
    Rule::ImplicitFactor | Rule::Parenthesized => {
      let mut inner = pair.into_inner();
      pair_to_expr(next_inner(&mut inner, "group")?)
    }
    Rule::Power => {
      let mut inner = pair.into_inner();
      let base = pair_to_expr(next_inner(&mut inner, "power")?)?;
      match inner.next() {
        Some(exponent) => Ok(Expr::binary(
          BinaryOperator::Power,
          base,
          pair_to_expr(exponent)?,
        )),
        None => Ok(base),
      }
    }
    Rule::FunctionCall => {
      let mut inner = pair.into_inner();
      let name = next_inner(&mut inner, "function call")?.as_str().to_string();
      let args = inner.map(pair_to_expr).collect::<Result<Vec<_>, _>>()?;
      Ok(Expr::FunctionCall { name, args })
    }
    Rule::Identifier => Ok(match pair.as_str() {
      "pi" | "e" => Expr::Constant(pair.as_str().to_string()),
      name => Expr::Identifier(name.to_string()),
    }),
    Rule::Number => {
      let text = pair.as_str();
      if !text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        if let Ok(n) = text.parse::<i64>() {
          return Ok(Expr::Integer(n));
        }
      }
      text.parse::<f64>().map(Expr::Real).map_err(|_| {
        CalcError::EvaluationError(format!("Invalid number: {text}"))
      })
    }
    other => Err(CalcError::EvaluationError(format!(
      "Cannot convert {other:?} to an expression"
    ))),
  }
}

/// Binding strength used when deciding on parentheses.
fn precedence(expr: &Expr) -> u8 {
  match expr {
    Expr::BinaryOp { op, .. } => match op {
      BinaryOperator::Plus | BinaryOperator::Minus => 1,
      BinaryOperator::Times | BinaryOperator::Divide => 2,
      BinaryOperator::Power => 4,
    },
    Expr::UnaryOp { .. } => 3,
    Expr::Integer(n) if *n < 0 => 3,
    Expr::Real(f) if f.is_sign_negative() => 3,
    _ => 5,
  }
}

pub fn format_real(f: f64) -> String {
  if f == 0.0 {
    return "0".to_string();
  }
  f.to_string()
}

/// For `-e`, a negative literal, return the positive counterpart.
fn split_negation(expr: &Expr) -> Option<Expr> {
  match expr {
    Expr::UnaryOp { operand, .. } => Some(operand.as_ref().clone()),
    Expr::Integer(n) if *n < 0 => n.checked_neg().map(Expr::Integer),
    Expr::Real(f) if *f < 0.0 => Some(Expr::Real(-f)),
    _ => None,
  }
}

fn wrap(s: String, parens: bool) -> String {
  if parens { format!("({s})") } else { s }
}

/// Serialize an expression back to formula text. The output re-parses to an
/// expression that evaluates identically.
pub fn expr_to_string(expr: &Expr) -> String {
  match expr {
    Expr::Integer(n) => n.to_string(),
    Expr::Real(f) => format_real(*f),
    Expr::Constant(name) | Expr::Identifier(name) => name.clone(),
    Expr::UnaryOp { operand, .. } => {
      let inner = expr_to_string(operand);
      format!("-{}", wrap(inner, precedence(operand) <= 3))
    }
    Expr::FunctionCall { name, args } => {
      let parts: Vec<String> = args.iter().map(expr_to_string).collect();
      format!("{}({})", name, parts.join(", "))
    }
    Expr::BinaryOp { op, left, right } => {
      let lp = precedence(left);
      let rp = precedence(right);
      let l = expr_to_string(left);
      match op {
        BinaryOperator::Plus | BinaryOperator::Minus => {
          // a + (-b) reads as a - b, a - (-b) as a + b
          let (sign, right) = match split_negation(right) {
            Some(positive) => {
              let flipped = if *op == BinaryOperator::Plus { "-" } else { "+" };
              (flipped, positive)
            }
            None => {
              let sign = if *op == BinaryOperator::Plus { "+" } else { "-" };
              (sign, right.as_ref().clone())
            }
          };
          let needs_parens = if sign == "-" {
            precedence(&right) <= 1
          } else {
            precedence(&right) < 1
          };
          let r = wrap(expr_to_string(&right), needs_parens);
          format!("{l} {sign} {r}")
        }
        BinaryOperator::Times => {
          let r = wrap(expr_to_string(right), rp <= 3);
          format!("{}*{}", wrap(l, lp < 2), r)
        }
        BinaryOperator::Divide => {
          let r = wrap(expr_to_string(right), rp <= 3);
          format!("{}/{}", wrap(l, lp < 2), r)
        }
        BinaryOperator::Power => {
          let r = wrap(expr_to_string(right), rp < 4);
          format!("{}^{}", wrap(l, lp <= 4), r)
        }
      }
    }
  }
}

fn tex_function_name(name: &str) -> Option<&'static str> {
  Some(match name {
    "sin" => "\\sin",
    "cos" => "\\cos",
    "tan" => "\\tan",
    "sec" => "\\sec",
    "csc" => "\\csc",
    "cot" => "\\cot",
    "asin" => "\\arcsin",
    "acos" => "\\arccos",
    "atan" => "\\arctan",
    "sinh" => "\\sinh",
    "cosh" => "\\cosh",
    "tanh" => "\\tanh",
    "exp" => "\\exp",
    "log" | "ln" => "\\ln",
    "log10" => "\\log_{10}",
    "log2" => "\\log_{2}",
    _ => return None,
  })
}

fn tex_paren(s: String, parens: bool) -> String {
  if parens {
    format!("\\left({s}\\right)")
  } else {
    s
  }
}

/// Render an expression as LaTeX for the math display.
pub fn expr_to_tex(expr: &Expr) -> String {
  match expr {
    Expr::Integer(n) => n.to_string(),
    Expr::Real(f) => format_real(*f),
    Expr::Constant(name) if name == "pi" => "\\pi".to_string(),
    Expr::Constant(name) => name.clone(),
    Expr::Identifier(name) if name.chars().count() > 1 => {
      format!("\\mathrm{{{name}}}")
    }
    Expr::Identifier(name) => name.clone(),
    Expr::UnaryOp { operand, .. } => {
      format!("-{}", tex_paren(expr_to_tex(operand), precedence(operand) <= 3))
    }
    Expr::FunctionCall { name, args } => {
      let rendered: Vec<String> = args.iter().map(expr_to_tex).collect();
      match (name.as_str(), rendered.as_slice()) {
        ("sqrt", [a]) => format!("\\sqrt{{{a}}}"),
        ("cbrt", [a]) => format!("\\sqrt[3]{{{a}}}"),
        ("abs", [a]) => format!("\\left|{a}\\right|"),
        ("log", [a, base]) => format!("\\log_{{{base}}}\\left({a}\\right)"),
        (known, [a]) => match tex_function_name(known) {
          Some(command) => format!("{command}\\left({a}\\right)"),
          None => format!("\\mathrm{{{known}}}\\left({a}\\right)"),
        },
        _ => format!(
          "\\mathrm{{{}}}\\left({}\\right)",
          name,
          rendered.join(",")
        ),
      }
    }
    Expr::BinaryOp { op, left, right } => {
      let lp = precedence(left);
      let rp = precedence(right);
      match op {
        BinaryOperator::Plus => match split_negation(right) {
          Some(positive) => format!(
            "{}-{}",
            expr_to_tex(left),
            tex_paren(expr_to_tex(&positive), precedence(&positive) <= 1)
          ),
          None => format!("{}+{}", expr_to_tex(left), expr_to_tex(right)),
        },
        BinaryOperator::Minus => format!(
          "{}-{}",
          expr_to_tex(left),
          tex_paren(expr_to_tex(right), rp <= 1)
        ),
        BinaryOperator::Times => {
          let r = tex_paren(expr_to_tex(right), rp <= 3);
          // A letter right after \cdot would extend the command name
          let sep = if r.starts_with(|c: char| c.is_ascii_alphabetic()) {
            " "
          } else {
            ""
          };
          format!("{}\\cdot{sep}{r}", tex_paren(expr_to_tex(left), lp < 2))
        }
        BinaryOperator::Divide => {
          format!("\\frac{{{}}}{{{}}}", expr_to_tex(left), expr_to_tex(right))
        }
        BinaryOperator::Power => format!(
          "{{{}}}^{{{}}}",
          tex_paren(expr_to_tex(left), lp <= 4),
          expr_to_tex(right)
        ),
      }
    }
  }
}

/// Replace every occurrence of `var` with `value`.
pub fn substitute_variable(expr: &Expr, var: &str, value: &Expr) -> Expr {
  match expr {
    Expr::Identifier(name) if name == var => value.clone(),
    Expr::FunctionCall { name, args } => Expr::FunctionCall {
      name: name.clone(),
      args: args
        .iter()
        .map(|a| substitute_variable(a, var, value))
        .collect(),
    },
    Expr::BinaryOp { op, left, right } => Expr::BinaryOp {
      op: *op,
      left: Box::new(substitute_variable(left, var, value)),
      right: Box::new(substitute_variable(right, var, value)),
    },
    Expr::UnaryOp { op, operand } => Expr::UnaryOp {
      op: *op,
      operand: Box::new(substitute_variable(operand, var, value)),
    },
    other => other.clone(),
  }
}
