/// Label shown when a two-sided limit does not exist.
pub const NO_LIMIT_LABEL: &str = "Tidak Ada";

/// Placeholder value for indefinite integrals without a closed form.
pub const INDEFINITE_PLACEHOLDER: &str = "Hasil + C";

/// Round to `decimals` places, then drop trailing zeros and a bare point.
/// `-0` prints as `0`.
pub fn format_fixed_trimmed(value: f64, decimals: usize) -> String {
  let fixed = format!("{value:.decimals$}");
  let trimmed = if fixed.contains('.') {
    fixed.trim_end_matches('0').trim_end_matches('.')
  } else {
    fixed.as_str()
  };
  if trimmed == "-0" {
    "0".to_string()
  } else {
    trimmed.to_string()
  }
}

/// Limit values are first rounded to 6 places: integers print bare, the
/// rest with at most 4 decimals.
pub fn format_limit_value(value: f64) -> String {
  let rounded = round_to(value, 6);
  if rounded.fract() == 0.0 {
    format_fixed_trimmed(rounded, 0)
  } else {
    format_fixed_trimmed(rounded, 4)
  }
}

/// Round half away from zero to `decimals` places. Values too large to
/// scale are already integral and come back unchanged.
pub fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  let scaled = value * factor;
  if !scaled.is_finite() {
    return value;
  }
  scaled.round() / factor
}

/// Parse a bound typed by the user: trimmed finite decimal.
pub fn parse_number(text: &str) -> Option<f64> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return None;
  }
  trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
