use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::calculators::ComputationResult;

/// Shown in the explanation area whenever the service cannot help.
pub const EXPLANATION_FALLBACK: &str =
  "Penjelasan tidak tersedia saat ini. Hasil perhitungan di atas tetap valid.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
  #[error("Service unavailable: {0}")]
  Unavailable(String),
  #[error("Service returned an empty response")]
  EmptyResponse,
}

/// What is sent to the explanation service for one calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationRequest {
  pub topic: String,
  pub problem: String,
  pub context: serde_json::Value,
}

impl ExplanationRequest {
  pub fn from_result(result: &ComputationResult) -> Self {
    ExplanationRequest {
      topic: result.topic.clone(),
      problem: result.problem.clone(),
      context: result.context.clone(),
    }
  }

  /// Prompt text for a hosted language model.
  pub fn prompt(&self) -> String {
    format!(
      "Sebagai asisten KalkuMath, jelaskan langkah demi langkah penyelesaian \
       {} untuk: {}.\n\
       Konteks tambahan: {}.\n\
       Berikan penjelasan dalam bahasa Indonesia yang ramah untuk mahasiswa \
       semester 1.\n\
       Gunakan format LaTeX untuk rumus (bungkus dengan $ atau $$).\n\
       Awali setiap langkah dengan penanda \"LANGKAH n:\".\n\
       Fokus pada konsep dasar dan aturan yang digunakan.",
      self.topic, self.problem, self.context
    )
  }
}

/// Produces free-text explanations. Output is advisory and never used to
/// check a result.
pub trait ExplanationService {
  fn explain(
    &self,
    request: ExplanationRequest,
  ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

/// Deterministic explainer that works without network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineExplainer;

impl OfflineExplainer {
  pub fn render(request: &ExplanationRequest) -> String {
    let mut steps = vec![format!(
      "Tuliskan soal {}: ${}$.",
      request.topic.to_lowercase(),
      request.problem
    )];

    if let Some(fields) = request.context.as_object() {
      let inputs: Vec<String> = fields
        .iter()
        .map(|(key, value)| match value.as_str() {
          Some(text) => format!("{key} = {text}"),
          None => format!("{key} = {value}"),
        })
        .collect();
      if !inputs.is_empty() {
        steps.push(format!("Identifikasi masukan: {}.", inputs.join(", ")));
      }
    }

    steps.push(match request.topic.as_str() {
      "Turunan" => "Terapkan aturan turunan (pangkat, rantai, hasil kali, \
                    hasil bagi) sebanyak orde yang diminta."
        .to_string(),
      "Limit" => "Hitung nilai fungsi di sekitar titik dari kiri dan kanan, \
                  lalu bandingkan kedua nilainya."
        .to_string(),
      "Bilangan Real" => "Evaluasi ekspresi lalu periksa apakah hasilnya \
                          dapat ditulis sebagai pecahan."
        .to_string(),
      _ => "Hitung integral secara numerik dengan aturan Simpson \
            (n = 1000 subinterval)."
        .to_string(),
    });

    let mut text = format!("Berikut penyelesaian {}.\n\n", request.topic);
    for (i, step) in steps.iter().enumerate() {
      text.push_str(&format!("LANGKAH {}: {step}\n", i + 1));
    }
    text
  }
}

impl ExplanationService for OfflineExplainer {
  async fn explain(
    &self,
    request: ExplanationRequest,
  ) -> Result<String, ServiceError> {
    Ok(Self::render(&request))
  }
}

/// An explanation split into an introduction and numbered steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Explanation {
  pub intro: String,
  pub steps: Vec<String>,
}

static STEP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(?:\*\*)?(?:LANGKAH|Step) \d+[:\- ]*(?:\*\*)?")
    .expect("valid regex literal")
});

impl Explanation {
  /// Split service text on `LANGKAH n:` / `Step n:` markers. Text without
  /// any marker becomes a single step.
  pub fn parse(text: &str) -> Explanation {
    if text.trim().is_empty() {
      return Explanation::default();
    }

    let mut parts = STEP_MARKER.split(text);
    let intro = parts.next().unwrap_or_default().trim().to_string();
    let steps: Vec<String> = parts
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();

    if steps.is_empty() {
      return Explanation {
        intro: String::new(),
        steps: vec![text.trim().to_string()],
      };
    }
    Explanation { intro, steps }
  }

  pub fn fallback() -> Explanation {
    Explanation {
      intro: String::new(),
      steps: vec![EXPLANATION_FALLBACK.to_string()],
    }
  }
}
