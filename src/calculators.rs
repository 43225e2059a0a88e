//! Calculator controllers: raw user input in, display-ready results out.
//!
//! Each controller validates its input, runs the numeric core
//! synchronously and packages the result together with the problem
//! statement and JSON context the explanation service needs.

use serde::Serialize;
use serde_json::json;

use crate::CalcError;
use crate::evaluator::{CompiledExpr, VARIABLE};
use crate::functions::{
  ApproachPoint, AreaMethod, Axis, DEFAULT_RANGE, Direction,
  IntegrationRequest, LimitOutcome, PlotMode, RealAnalysis, SamplerOptions,
  analyze_real, antiderivative, approximate_limit, area, derivative_chain,
  integrate, volume,
};
use crate::syntax::expr_to_tex;
use crate::utils::{
  INDEFINITE_PLACEHOLDER, NO_LIMIT_LABEL, format_fixed_trimmed,
  format_limit_value, parse_number,
};

/// Decimals shown for integrals, areas and volumes.
pub const RESULT_DECIMALS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ResultValue {
  Number(f64),
  Expression(String),
  NoLimit,
  Undefined,
}

/// A graph the result view should draw.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSpec {
  pub label: String,
  pub expression: String,
  pub options: SamplerOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationResult {
  pub value: ResultValue,
  /// Formatted value for the result card.
  pub display: String,
  pub latex: String,
  pub expression: String,
  pub topic: String,
  /// Statement handed to the explanation service.
  pub problem: String,
  pub context: serde_json::Value,
  #[serde(skip)]
  pub graphs: Vec<GraphSpec>,
}

/// Operation selected on the integral page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegralKind {
  Indefinite,
  Definite,
  Area(AreaMethod),
  Volume(Axis),
}

fn parse_bound(text: &str, which: &str) -> Result<f64, CalcError> {
  parse_number(text).ok_or_else(|| {
    CalcError::InvalidInput(format!("{which} bound {text:?} is not a number"))
  })
}

/// Build a typed request from the integral form fields.
pub fn build_integration_request(
  kind: IntegralKind,
  expression: &str,
  lower: &str,
  upper: &str,
) -> Result<IntegrationRequest, CalcError> {
  let expression = expression.trim().to_string();
  if kind == IntegralKind::Indefinite {
    return Ok(IntegrationRequest::Indefinite { expression });
  }

  let lower = parse_bound(lower, "Lower")?;
  let upper = parse_bound(upper, "Upper")?;
  Ok(match kind {
    IntegralKind::Indefinite | IntegralKind::Definite => {
      IntegrationRequest::Definite {
        expression,
        lower,
        upper,
      }
    }
    IntegralKind::Area(method) => IntegrationRequest::Area {
      expression,
      lower,
      upper,
      method,
    },
    IntegralKind::Volume(axis) => IntegrationRequest::Volume {
      expression,
      lower,
      upper,
      axis,
    },
  })
}

/// Run an integral form submission.
pub fn integral_calculator(
  kind: IntegralKind,
  expression: &str,
  lower: &str,
  upper: &str,
) -> Result<ComputationResult, CalcError> {
  let request = build_integration_request(kind, expression, lower, upper)?;
  let mut result = calculate_integral(&request)?;
  // The explanation sees the bounds as typed
  result.context["lower"] = json!(lower);
  result.context["upper"] = json!(upper);
  Ok(result)
}

fn integral_context(request: &IntegrationRequest) -> serde_json::Value {
  let (calc_type, axis) = match request {
    IntegrationRequest::Indefinite { .. }
    | IntegrationRequest::Definite { .. } => ("integral", "x".to_string()),
    IntegrationRequest::Area { .. } => ("area", "x".to_string()),
    IntegrationRequest::Volume { axis, .. } => {
      ("volume", axis.label().to_lowercase())
    }
  };
  let bounds = request.bounds();
  json!({
    "func": request.expression(),
    "calcType": calc_type,
    "lower": bounds.map(|(a, _)| a),
    "upper": bounds.map(|(_, b)| b),
    "axis": axis,
  })
}

fn bound_tex(value: f64) -> String {
  format_fixed_trimmed(value, 6)
}

fn numeric_result(value: f64) -> (ResultValue, String) {
  (ResultValue::Number(value), format_fixed_trimmed(value, RESULT_DECIMALS))
}

/// Evaluate a typed integration request.
pub fn calculate_integral(
  request: &IntegrationRequest,
) -> Result<ComputationResult, CalcError> {
  let compiled = CompiledExpr::compile(request.expression())?;
  let f_tex = expr_to_tex(compiled.expr());

  let (value, display, latex, topic) = match request {
    IntegrationRequest::Indefinite { .. } => {
      let latex = format!("\\int {f_tex} \\, dx");
      match antiderivative(compiled.expr(), VARIABLE) {
        Some(primitive) => {
          let text = format!("{primitive} + C");
          (
            ResultValue::Expression(text.clone()),
            text,
            format!("{latex} = {} + C", expr_to_tex(&primitive)),
            "Integral".to_string(),
          )
        }
        None => (
          ResultValue::Expression(INDEFINITE_PLACEHOLDER.to_string()),
          INDEFINITE_PLACEHOLDER.to_string(),
          latex,
          "Integral".to_string(),
        ),
      }
    }
    IntegrationRequest::Definite { lower, upper, .. } => {
      let (value, display) = numeric_result(integrate(&compiled, *lower, *upper)?);
      let latex = format!(
        "\\int_{{{}}}^{{{}}} {f_tex} \\, dx",
        bound_tex(*lower),
        bound_tex(*upper)
      );
      (value, display, latex, "Integral".to_string())
    }
    IntegrationRequest::Area {
      lower,
      upper,
      method,
      ..
    } => {
      let (value, display) =
        numeric_result(area(&compiled, *lower, *upper, *method)?);
      let latex = format!(
        "L = \\int_{{{}}}^{{{}}} |{f_tex}| \\, dx",
        bound_tex(*lower),
        bound_tex(*upper)
      );
      (value, display, latex, "Luas Daerah".to_string())
    }
    IntegrationRequest::Volume {
      lower, upper, axis, ..
    } => {
      let (value, display) =
        numeric_result(volume(&compiled, *lower, *upper, *axis)?);
      let (a, b) = (bound_tex(*lower), bound_tex(*upper));
      let latex = match axis {
        Axis::X => format!("V_x = \\pi \\int_{{{a}}}^{{{b}}} ({f_tex})^2 \\, dx"),
        Axis::Y => format!(
          "V_y = 2\\pi \\int_{{{a}}}^{{{b}}} x \\cdot |{f_tex}| \\, dx"
        ),
      };
      let topic = format!("Volume Benda Putar (Sumbu {})", axis.label());
      (value, display, latex, topic)
    }
  };

  let mut graphs = Vec::new();
  let mode = match request {
    IntegrationRequest::Volume { .. } => PlotMode::Volume,
    _ => PlotMode::Normal,
  };
  let (start, end) = match request.bounds() {
    Some((a, b)) => (a.min(b) - 3.0, a.max(b) + 3.0),
    None => DEFAULT_RANGE,
  };
  graphs.push(GraphSpec {
    label: "f(x)".to_string(),
    expression: compiled.source().to_string(),
    options: SamplerOptions {
      mode,
      ..SamplerOptions::range(start, end)
    },
  });

  log::info!("{topic}: {} = {display}", compiled.source());
  Ok(ComputationResult {
    value,
    display,
    problem: latex.clone(),
    latex,
    expression: compiled.source().to_string(),
    topic,
    context: integral_context(request),
    graphs,
  })
}

/// Run a limit form submission.
pub fn limit_calculator(
  expression: &str,
  approach: &str,
  direction: Direction,
) -> Result<ComputationResult, CalcError> {
  let point = ApproachPoint::parse(approach).ok_or_else(|| {
    CalcError::InvalidInput(format!(
      "approach point {approach:?} must be a number or inf"
    ))
  })?;
  let compiled = CompiledExpr::compile(expression)?;
  let outcome = approximate_limit(&compiled, point, direction);

  let (value, display) = match &outcome {
    LimitOutcome::Value(v) => (ResultValue::Number(*v), format_limit_value(*v)),
    LimitOutcome::NoLimit => (ResultValue::NoLimit, NO_LIMIT_LABEL.to_string()),
    LimitOutcome::EvaluationFailed(reason) => {
      (ResultValue::Undefined, format!("Tidak terdefinisi ({reason})"))
    }
  };

  let target = match point {
    ApproachPoint::Finite(a) => format_fixed_trimmed(a, 6),
    ApproachPoint::Infinity => "\\infty".to_string(),
  };
  let side = match direction {
    Direction::Both => "",
    Direction::Left => "^-",
    Direction::Right => "^+",
  };
  let latex = format!(
    "\\lim_{{x \\to {target}{side}}} {}",
    expr_to_tex(compiled.expr())
  );

  let (start, end) = match point {
    ApproachPoint::Finite(a) => (a - 5.0, a + 5.0),
    ApproachPoint::Infinity => DEFAULT_RANGE,
  };

  log::info!("Limit: {latex} -> {outcome:?}");
  Ok(ComputationResult {
    value,
    display,
    problem: format!("{latex} = ?"),
    latex,
    expression: compiled.source().to_string(),
    topic: "Limit".to_string(),
    context: json!({
      "func": expression,
      "approach": approach,
      "direction": direction.as_str(),
    }),
    graphs: vec![GraphSpec {
      label: "f(x)".to_string(),
      expression: compiled.source().to_string(),
      options: SamplerOptions::range(start, end),
    }],
  })
}

/// Run a derivative form submission.
pub fn derivative_calculator(
  expression: &str,
  order: u32,
) -> Result<ComputationResult, CalcError> {
  let expr = crate::parse(expression)?;
  let derivative = derivative_chain(&expr, VARIABLE, order)?;
  let text = derivative.text();
  let notation = if order == 1 {
    "f'(x)".to_string()
  } else {
    format!("f^{{({order})}}(x)")
  };

  Ok(ComputationResult {
    value: ResultValue::Expression(text.clone()),
    display: text.clone(),
    latex: format!("{notation} = {}", derivative.latex),
    expression: expression.trim().to_string(),
    topic: "Turunan".to_string(),
    problem: format!(
      "Turunan orde ke-{order} dari f(x) = {} adalah {text}",
      expression.trim()
    ),
    context: json!({ "func": expression, "order": order }),
    graphs: vec![
      GraphSpec {
        label: "f(x)".to_string(),
        expression: expression.trim().to_string(),
        options: SamplerOptions::default(),
      },
      GraphSpec {
        label: notation,
        expression: text,
        options: SamplerOptions::default(),
      },
    ],
  })
}

/// Run a real number analysis.
pub fn real_calculator(expression: &str) -> Result<ComputationResult, CalcError> {
  let analysis: RealAnalysis = analyze_real(expression)?;
  let display = match analysis.is_infinite {
    true if analysis.value > 0.0 => "∞".to_string(),
    true => "-∞".to_string(),
    false => format_fixed_trimmed(analysis.value, 10),
  };

  Ok(ComputationResult {
    value: ResultValue::Number(analysis.value),
    display,
    latex: analysis.latex.clone(),
    expression: expression.trim().to_string(),
    topic: "Bilangan Real".to_string(),
    problem: expression.trim().to_string(),
    // Non-finite numbers serialize as null
    context: json!({
      "value": analysis.value,
      "abs": analysis.absolute,
      "rational": analysis.classification(),
      "latex": analysis.latex,
      "isInfinite": analysis.is_infinite,
    }),
    graphs: Vec::new(),
  })
}
