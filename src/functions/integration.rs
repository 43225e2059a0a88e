use std::f64::consts::PI;

use crate::CalcError;
use crate::evaluator::CompiledExpr;

/// Number of Simpson sub-intervals. Fixed: there is no adaptive refinement
/// and no error estimate, so results are accurate for smooth integrands
/// only (polynomials to well under `1e-3`).
pub const SIMPSON_PARTITIONS: usize = 1000;

/// Which area is reported for a region between a curve and the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaMethod {
  /// `|∫ f dx|`: regions above and below the axis cancel.
  #[default]
  Net,
  /// `∫ |f| dx`: every region counts positively.
  Absolute,
}

/// Axis a region is rotated about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
  X,
  Y,
}

impl Axis {
  pub fn label(self) -> &'static str {
    match self {
      Axis::X => "X",
      Axis::Y => "Y",
    }
  }
}

/// An integral calculation the user can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationRequest {
  Indefinite {
    expression: String,
  },
  Definite {
    expression: String,
    lower: f64,
    upper: f64,
  },
  Area {
    expression: String,
    lower: f64,
    upper: f64,
    method: AreaMethod,
  },
  Volume {
    expression: String,
    lower: f64,
    upper: f64,
    axis: Axis,
  },
}

impl IntegrationRequest {
  pub fn expression(&self) -> &str {
    match self {
      IntegrationRequest::Indefinite { expression }
      | IntegrationRequest::Definite { expression, .. }
      | IntegrationRequest::Area { expression, .. }
      | IntegrationRequest::Volume { expression, .. } => expression,
    }
  }

  /// `(lower, upper)` for every bounded request.
  pub fn bounds(&self) -> Option<(f64, f64)> {
    match self {
      IntegrationRequest::Indefinite { .. } => None,
      IntegrationRequest::Definite { lower, upper, .. }
      | IntegrationRequest::Area { lower, upper, .. }
      | IntegrationRequest::Volume { lower, upper, .. } => {
        Some((*lower, *upper))
      }
    }
  }
}

fn check_bounds(a: f64, b: f64) -> Result<(), CalcError> {
  if !a.is_finite() || !b.is_finite() {
    return Err(CalcError::InvalidInput(
      "Integration bounds must be finite numbers".into(),
    ));
  }
  Ok(())
}

/// Composite Simpson's rule over `[a, b]` for any sampled integrand.
///
/// `a > b` is allowed and flips the sign through `h`. The first failing
/// sample aborts the whole integration.
pub fn simpson_by<F>(a: f64, b: f64, mut f: F) -> Result<f64, CalcError>
where
  F: FnMut(f64) -> Result<f64, CalcError>,
{
  check_bounds(a, b)?;
  let n = SIMPSON_PARTITIONS;
  let h = (b - a) / n as f64;

  let mut sum = f(a)? + f(b)?;
  for i in 1..n {
    let x = a + i as f64 * h;
    let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
    sum += weight * f(x)?;
  }

  let result = sum * h / 3.0;
  log::debug!("simpson [{a}, {b}] n={n} -> {result}");
  Ok(result)
}

/// `∫_a^b f(x) dx`
pub fn integrate(
  expr: &CompiledExpr,
  a: f64,
  b: f64,
) -> Result<f64, CalcError> {
  simpson_by(a, b, |x| expr.evaluate(x))
}

/// Net area `|∫_a^b f(x) dx|`.
pub fn area_net(expr: &CompiledExpr, a: f64, b: f64) -> Result<f64, CalcError> {
  Ok(integrate(expr, a, b)?.abs())
}

/// Absolute area `∫_a^b |f(x)| dx`. Reported as a magnitude, so reversed
/// bounds give the same area.
pub fn area_absolute(
  expr: &CompiledExpr,
  a: f64,
  b: f64,
) -> Result<f64, CalcError> {
  Ok(simpson_by(a, b, |x| expr.evaluate(x).map(f64::abs))?.abs())
}

pub fn area(
  expr: &CompiledExpr,
  a: f64,
  b: f64,
  method: AreaMethod,
) -> Result<f64, CalcError> {
  match method {
    AreaMethod::Net => area_net(expr, a, b),
    AreaMethod::Absolute => area_absolute(expr, a, b),
  }
}

/// Disk method: `π ∫_a^b f(x)² dx`.
pub fn volume_x(expr: &CompiledExpr, a: f64, b: f64) -> Result<f64, CalcError> {
  let integral = simpson_by(a, b, |x| expr.evaluate(x).map(|y| y * y))?;
  Ok(PI * integral)
}

/// Shell method: `2π ∫_a^b |x · f(x)| dx`.
pub fn volume_y(expr: &CompiledExpr, a: f64, b: f64) -> Result<f64, CalcError> {
  let integral = simpson_by(a, b, |x| expr.evaluate(x).map(|y| (x * y).abs()))?;
  Ok(2.0 * PI * integral)
}

pub fn volume(
  expr: &CompiledExpr,
  a: f64,
  b: f64,
  axis: Axis,
) -> Result<f64, CalcError> {
  match axis {
    Axis::X => volume_x(expr, a, b),
    Axis::Y => volume_y(expr, a, b),
  }
}
