use super::*;
use kalkumath::tutor::*;

mod explanations {
  use super::*;

  #[test]
  fn prompt_carries_problem_and_context() {
    let result = limit_calculator("sin(x)/x", "0", Direction::Both).unwrap();
    let request = ExplanationRequest::from_result(&result);
    let prompt = request.prompt();
    assert!(prompt.starts_with("Sebagai asisten KalkuMath"));
    assert!(prompt.contains("penyelesaian Limit untuk: \\lim_{x \\to 0}"));
    assert!(prompt.contains("\"approach\":\"0\""));
    assert!(prompt.contains("LANGKAH n:"));
  }

  #[tokio::test]
  async fn offline_explainer_output_parses_into_steps() {
    let result = derivative_calculator("x^2", 1).unwrap();
    let text = OfflineExplainer
      .explain(ExplanationRequest::from_result(&result))
      .await
      .unwrap();
    let explanation = Explanation::parse(&text);
    assert_eq!(explanation.intro, "Berikut penyelesaian Turunan.");
    assert_eq!(explanation.steps.len(), 3);
    assert!(explanation.steps[0].contains("Turunan orde ke-1"));
  }
}

mod stale_responses {
  use super::*;
  use std::collections::HashMap;
  use std::sync::{Arc, Mutex};
  use tokio::sync::oneshot;

  type Reply = Result<String, ServiceError>;

  /// Replies to each problem only when the test releases it.
  #[derive(Clone, Default)]
  struct ScriptedExplainer {
    replies: Arc<Mutex<HashMap<String, oneshot::Receiver<Reply>>>>,
  }

  impl ScriptedExplainer {
    fn hold(&self, problem: &str) -> oneshot::Sender<Reply> {
      let (tx, rx) = oneshot::channel();
      self.replies.lock().unwrap().insert(problem.to_string(), rx);
      tx
    }
  }

  impl ExplanationService for ScriptedExplainer {
    async fn explain(&self, request: ExplanationRequest) -> Reply {
      let reply = self.replies.lock().unwrap().remove(&request.problem);
      match reply {
        Some(rx) => rx
          .await
          .unwrap_or_else(|_| Err(ServiceError::Unavailable("dropped".into()))),
        None => Err(ServiceError::Unavailable("unscripted".into())),
      }
    }
  }

  #[tokio::test]
  async fn slow_first_response_cannot_overwrite_second() {
    let service = ScriptedExplainer::default();
    let first = derivative_calculator("x^2", 1).unwrap();
    let second = derivative_calculator("x^3", 1).unwrap();
    let release_first = service.hold(&first.problem);
    let release_second = service.hold(&second.problem);

    let session = TutorSession::new(service.clone());
    let first_task = session.submit(first);
    let second_task = session.submit(second.clone());
    assert_eq!(session.current_generation(), 2);
    assert_eq!(session.view().explanation, ExplanationState::Pending);

    release_second.send(Ok("LANGKAH 1: kedua".into())).unwrap();
    assert!(second_task.await.unwrap());

    release_first.send(Ok("LANGKAH 1: pertama".into())).unwrap();
    assert!(!first_task.await.unwrap());

    let view = session.view();
    assert_eq!(view.generation, 2);
    assert_eq!(view.result, Some(second));
    assert_eq!(
      view.explanation,
      ExplanationState::Ready(Explanation {
        intro: String::new(),
        steps: vec!["kedua".to_string()],
      })
    );
  }

  #[tokio::test]
  async fn service_failure_keeps_result_and_shows_fallback() {
    let service = ScriptedExplainer::default();
    let result = real_calculator("2 + 2").unwrap();
    let session = TutorSession::new(service.clone());
    assert!(session.submit(result.clone()).await.unwrap());

    let view = session.view();
    assert_eq!(view.result, Some(result));
    match view.explanation {
      ExplanationState::Failed(explanation) => {
        assert_eq!(explanation.steps, vec![EXPLANATION_FALLBACK.to_string()]);
      }
      other => panic!("expected fallback, got {other:?}"),
    }
  }
}

mod quiz {
  use super::*;

  fn question(id: i64, correct: &str) -> QuizQuestion {
    QuizQuestion {
      id,
      category: "Limit".into(),
      question: format!("Soal {id}"),
      options: vec!["1".into(), "2".into(), correct.into()],
      correct_answer: correct.into(),
      explanation: String::new(),
    }
  }

  #[test]
  fn parses_service_payload() {
    let json = r#"[{"id": 1, "category": "Turunan", "question": "d/dx x^2?",
      "options": ["2x", "x"], "correctAnswer": "2x", "explanation": "pangkat"}]"#;
    let questions = parse_questions(json).unwrap();
    assert_eq!(questions[0].correct_answer, "2x");
  }

  #[test]
  fn rejects_bad_payloads() {
    assert!(matches!(parse_questions("[]"), Err(GenerationError::Empty)));
    assert!(matches!(
      parse_questions(r#"[{"id": 1, "question": "?"}]"#),
      Err(GenerationError::Malformed(_))
    ));
    assert!(parse_questions("not json").is_err());
  }

  #[test]
  fn scoring_and_completion() {
    let mut session =
      QuizSession::new(Ok(vec![question(1, "a"), question(2, "b"), question(3, "c")]));
    assert_eq!(session.answer("a"), Some(true));
    assert_eq!(session.answer("a"), None);
    session.advance();
    assert_eq!(session.answer("1"), Some(false));
    session.advance();
    assert_eq!(session.answer("c"), Some(true));
    session.advance();

    assert!(session.is_completed());
    let score = session.score();
    assert_eq!((score.correct, score.total), (2, 3));
    assert_eq!(score.history, vec![true, false, true]);
    assert_eq!(score.percentage(), 67);

    session.restart();
    assert_eq!(session.current().map(|q| q.id), Some(1));
    assert_eq!(session.score().correct, 0);
  }

  #[test]
  fn empty_generation_is_unavailable() {
    let session = QuizSession::new(Ok(Vec::new()));
    assert!(matches!(session.state(), QuizState::Unavailable(_)));
    assert!(session.current().is_none());

    let mut failed =
      QuizSession::new(Err(GenerationError::Service("timeout".into())));
    assert!(matches!(failed.state(), QuizState::Unavailable(_)));
    failed.load(Ok(vec![question(1, "a")]));
    assert_eq!(
      failed.state(),
      &QuizState::InProgress {
        index: 0,
        answered: false
      }
    );
  }

  #[tokio::test]
  async fn local_generator_is_seeded_and_correct() {
    let generator = LocalQuizGenerator::new(7);
    let questions = generator.generate(DEFAULT_QUESTION_COUNT).await.unwrap();
    assert_eq!(questions.len(), DEFAULT_QUESTION_COUNT);
    assert_eq!(questions, LocalQuizGenerator::new(7).questions(5));
    for q in &questions {
      assert!(q.options.contains(&q.correct_answer), "{q:?}");
    }
    let categories: Vec<&str> =
      questions.iter().map(|q| q.category.as_str()).collect();
    assert_eq!(
      categories,
      vec!["Turunan", "Integral", "Limit", "Bilangan Real", "Turunan"]
    );
  }
}
