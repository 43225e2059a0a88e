use std::future::Future;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculators::RESULT_DECIMALS;
use crate::evaluator::{CompiledExpr, VARIABLE};
use crate::functions::{
  ApproachPoint, Direction, LimitOutcome, approximate_limit, derivative_chain,
  integrate,
};
use crate::utils::{format_fixed_trimmed, format_limit_value};

/// Request text for a hosted quiz generator.
pub const QUIZ_PROMPT: &str = "Buatkan 5 soal kuis kalkulus variatif \
  (Bilangan Real, Limit, Turunan, Integral). Berikan dalam format JSON murni.";

pub const DEFAULT_QUESTION_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub id: i64,
  pub category: String,
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  pub explanation: String,
}

#[derive(Error, Debug)]
pub enum GenerationError {
  #[error("Quiz service failed: {0}")]
  Service(String),
  #[error("Quiz response is not a valid question list: {0}")]
  Malformed(#[from] serde_json::Error),
  #[error("Quiz response contains no questions")]
  Empty,
}

/// Validate a generator response by shape: a JSON array of questions with
/// every field present.
pub fn parse_questions(json: &str) -> Result<Vec<QuizQuestion>, GenerationError> {
  let questions: Vec<QuizQuestion> = serde_json::from_str(json)?;
  if questions.is_empty() {
    return Err(GenerationError::Empty);
  }
  Ok(questions)
}

/// Source of quiz questions. Failures are returned to the caller, which
/// decides how to recover.
pub trait QuizGenerator {
  fn generate(
    &self,
    count: usize,
  ) -> impl Future<Output = Result<Vec<QuizQuestion>, GenerationError>> + Send;
}

/// Builds questions locally; every correct answer is computed by the
/// numeric core. The same seed always yields the same quiz.
#[derive(Debug, Clone, Copy)]
pub struct LocalQuizGenerator {
  pub seed: u64,
}

impl LocalQuizGenerator {
  pub fn new(seed: u64) -> Self {
    LocalQuizGenerator { seed }
  }

  pub fn questions(&self, count: usize) -> Vec<QuizQuestion> {
    let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
    let mut questions = Vec::with_capacity(count);
    let mut attempts = 0;

    while questions.len() < count && attempts < count * 10 {
      attempts += 1;
      let kind = questions.len() % 4;
      let built = match kind {
        0 => derivative_question(&mut rng),
        1 => integral_question(&mut rng),
        2 => limit_question(&mut rng),
        _ => real_question(&mut rng),
      };
      if let Some((category, question, correct, distractors, explanation)) =
        built
      {
        let id = questions.len() as i64 + 1;
        questions.push(assemble(
          id,
          category,
          question,
          correct,
          distractors,
          explanation,
          &mut rng,
        ));
      }
    }
    questions
  }
}

impl QuizGenerator for LocalQuizGenerator {
  async fn generate(
    &self,
    count: usize,
  ) -> Result<Vec<QuizQuestion>, GenerationError> {
    let questions = self.questions(count);
    if questions.is_empty() {
      return Err(GenerationError::Empty);
    }
    Ok(questions)
  }
}

type Draft = (&'static str, String, String, Vec<String>, String);

fn assemble(
  id: i64,
  category: &str,
  question: String,
  correct: String,
  distractors: Vec<String>,
  explanation: String,
  rng: &mut ChaCha8Rng,
) -> QuizQuestion {
  let mut options = vec![correct.clone()];
  for candidate in distractors {
    if !options.contains(&candidate) {
      options.push(candidate);
    }
  }
  options.shuffle(rng);
  QuizQuestion {
    id,
    category: category.to_string(),
    question,
    options,
    correct_answer: correct,
    explanation,
  }
}

fn derivative_question(rng: &mut ChaCha8Rng) -> Option<Draft> {
  let a = rng.gen_range(2..=6);
  let n = rng.gen_range(2..=4);
  let b = rng.gen_range(1..=9);
  let source = format!("{a}*x^{n} + {b}*x");
  let expr = crate::parse(&source).ok()?;
  let correct = derivative_chain(&expr, VARIABLE, 1).ok()?.text();
  let distractors = vec![
    format!("{}*x^{}", a * n, n),
    format!("{}*x^{} + {b}", a, n - 1),
    format!("{}*x^{} + {b}*x", a * n, n - 1),
  ];
  Some((
    "Turunan",
    format!("Tentukan turunan pertama dari f(x) = {source}"),
    correct.clone(),
    distractors,
    format!("Dengan aturan pangkat, f'(x) = {correct}."),
  ))
}

fn integral_question(rng: &mut ChaCha8Rng) -> Option<Draft> {
  let a = rng.gen_range(1..=4);
  let upper = rng.gen_range(1..=3);
  let source = format!("{a}*x^2");
  let compiled = CompiledExpr::compile(&source).ok()?;
  let value = integrate(&compiled, 0.0, upper as f64).ok()?;
  let correct = format_fixed_trimmed(value, RESULT_DECIMALS);
  let distractors = vec![
    format_fixed_trimmed(value * 2.0, RESULT_DECIMALS),
    format_fixed_trimmed(value + a as f64, RESULT_DECIMALS),
    format_fixed_trimmed(value / 2.0, RESULT_DECIMALS),
  ];
  Some((
    "Integral",
    format!("Hitung integral dari f(x) = {source} pada [0, {upper}]"),
    correct.clone(),
    distractors,
    format!(
      "Antiturunan {a}*x^3/3 dievaluasi dari 0 sampai {upper} memberi {correct}."
    ),
  ))
}

fn limit_question(rng: &mut ChaCha8Rng) -> Option<Draft> {
  let c = rng.gen_range(1..=5);
  let source = format!("(x^2 - {})/(x - {c})", c * c);
  let compiled = CompiledExpr::compile(&source).ok()?;
  let value = match approximate_limit(
    &compiled,
    ApproachPoint::Finite(c as f64),
    Direction::Both,
  ) {
    LimitOutcome::Value(v) => v,
    LimitOutcome::NoLimit | LimitOutcome::EvaluationFailed(_) => return None,
  };
  let correct = format_limit_value(value);
  let distractors = vec![
    c.to_string(),
    "0".to_string(),
    crate::utils::NO_LIMIT_LABEL.to_string(),
  ];
  Some((
    "Limit",
    format!("Tentukan nilai lim x→{c} dari {source}"),
    correct.clone(),
    distractors,
    format!("Faktorkan pembilang menjadi (x - {c})(x + {c}), hasilnya {correct}."),
  ))
}

fn real_question(rng: &mut ChaCha8Rng) -> Option<Draft> {
  let square = rng.gen_range(2..=12);
  let offset = rng.gen_range(1..=9);
  let correct = format!("{}", square - offset);
  Some((
    "Bilangan Real",
    format!("Berapakah nilai sqrt({}) - {offset}?", square * square),
    correct,
    vec![
      format!("{}", square + offset),
      format!("{}", square * square - offset),
      format!("{}", offset - square),
    ],
    format!("sqrt({}) = {square}, dikurangi {offset}.", square * square),
  ))
}

/// Running score of a quiz attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuizScore {
  pub total: usize,
  pub correct: usize,
  /// Whether each answered question was right, in order.
  pub history: Vec<bool>,
}

impl QuizScore {
  /// Score as a whole percentage of the question count.
  pub fn percentage(&self) -> u32 {
    if self.total == 0 {
      return 0;
    }
    (self.correct as f64 / self.total as f64 * 100.0).round() as u32
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizState {
  /// Generation failed or produced nothing; offer a retry.
  Unavailable(String),
  InProgress { index: usize, answered: bool },
  Completed,
}

/// One attempt at a quiz.
#[derive(Debug, Clone)]
pub struct QuizSession {
  questions: Vec<QuizQuestion>,
  state: QuizState,
  score: QuizScore,
}

impl QuizSession {
  pub fn new(generated: Result<Vec<QuizQuestion>, GenerationError>) -> Self {
    let mut session = QuizSession {
      questions: Vec::new(),
      state: QuizState::Unavailable(String::new()),
      score: QuizScore::default(),
    };
    session.load(generated);
    session
  }

  /// Replace the questions with a fresh generation and start over.
  pub fn load(&mut self, generated: Result<Vec<QuizQuestion>, GenerationError>) {
    let generated = generated.and_then(|questions| {
      if questions.is_empty() {
        Err(GenerationError::Empty)
      } else {
        Ok(questions)
      }
    });
    match generated {
      Ok(questions) => {
        self.score = QuizScore {
          total: questions.len(),
          ..Default::default()
        };
        self.questions = questions;
        self.state = QuizState::InProgress {
          index: 0,
          answered: false,
        };
      }
      Err(err) => {
        log::warn!("quiz unavailable: {err}");
        self.questions.clear();
        self.score = QuizScore::default();
        self.state = QuizState::Unavailable(err.to_string());
      }
    }
  }

  pub fn state(&self) -> &QuizState {
    &self.state
  }

  pub fn score(&self) -> &QuizScore {
    &self.score
  }

  pub fn questions(&self) -> &[QuizQuestion] {
    &self.questions
  }

  pub fn current(&self) -> Option<&QuizQuestion> {
    match self.state {
      QuizState::InProgress { index, .. } => self.questions.get(index),
      _ => None,
    }
  }

  /// Check `choice` against the current question. Returns `None` when
  /// there is nothing to answer or it was already answered.
  pub fn answer(&mut self, choice: &str) -> Option<bool> {
    let QuizState::InProgress {
      index,
      answered: false,
    } = self.state
    else {
      return None;
    };
    let correct = self.questions.get(index)?.correct_answer == choice;
    if correct {
      self.score.correct += 1;
    }
    self.score.history.push(correct);
    self.state = QuizState::InProgress {
      index,
      answered: true,
    };
    Some(correct)
  }

  /// Move to the next question, or complete the quiz after the last one.
  pub fn advance(&mut self) {
    if let QuizState::InProgress { index, .. } = self.state {
      self.state = if index + 1 < self.questions.len() {
        QuizState::InProgress {
          index: index + 1,
          answered: false,
        }
      } else {
        QuizState::Completed
      };
    }
  }

  pub fn is_completed(&self) -> bool {
    self.state == QuizState::Completed
  }

  /// Restart with the same questions.
  pub fn restart(&mut self) {
    if self.questions.is_empty() {
      return;
    }
    self.score = QuizScore {
      total: self.questions.len(),
      ..Default::default()
    };
    self.state = QuizState::InProgress {
      index: 0,
      answered: false,
    };
  }
}
