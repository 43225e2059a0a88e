use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod calculators;
pub mod evaluator;
pub mod functions;
pub mod syntax;
pub mod tutor;
pub mod utils;

#[derive(Parser)]
#[grammar = "expression.pest"]
pub struct ExpressionParser;

#[derive(Error, Debug)]
pub enum CalcError {
  #[error("Parse error: {0}")]
  ParseError(#[from] Box<pest::error::Error<Rule>>),
  #[error("Empty input")]
  EmptyInput,
  #[error("Evaluation error: {0}")]
  EvaluationError(String),
  #[error("Derivation error: {0}")]
  DerivationError(String),
  #[error("Invalid input: {0}")]
  InvalidInput(String),
}

impl CalcError {
  /// Message shown to the user when a calculation is rejected.
  ///
  /// Parse failures block the whole calculation, so they get the generic
  /// "check your syntax" prompt; the other kinds carry their detail.
  pub fn user_message(&self) -> String {
    match self {
      CalcError::ParseError(_) | CalcError::EmptyInput => {
        "Invalid input! Check your formula syntax.".to_string()
      }
      CalcError::EvaluationError(detail) => {
        format!("The function is undefined here: {detail}")
      }
      CalcError::DerivationError(detail) => {
        format!("Could not differentiate this function: {detail}")
      }
      CalcError::InvalidInput(detail) => format!("Invalid input! {detail}"),
    }
  }
}

impl ExpressionParser {
  pub fn parse_program(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Program, input).map_err(Box::new)
  }
}

/// Parse a formula into its syntax tree.
pub fn parse(input: &str) -> Result<syntax::Expr, CalcError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(CalcError::EmptyInput);
  }

  let mut pairs = ExpressionParser::parse_program(trimmed)?;
  let program = pairs.next().ok_or(CalcError::EmptyInput)?;
  if program.as_rule() != Rule::Program {
    return Err(CalcError::EvaluationError(format!(
      "Expected Program, got {:?}",
      program.as_rule()
    )));
  }

  let expression = program
    .into_inner()
    .find(|pair| pair.as_rule() == Rule::Expression)
    .ok_or(CalcError::EmptyInput)?;
  syntax::pair_to_expr(expression)
}

pub use evaluator::{CompiledExpr, evaluate, evaluate_expr};
pub use syntax::{Expr, expr_to_string, expr_to_tex};
