use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use super::explanation::{Explanation, ExplanationRequest, ExplanationService};
use crate::calculators::ComputationResult;

#[derive(Debug, Clone, PartialEq)]
pub enum ExplanationState {
  Idle,
  Pending,
  Ready(Explanation),
  /// The service failed; the fallback text is shown instead.
  Failed(Explanation),
}

/// What the result area currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
  pub generation: u64,
  pub result: Option<ComputationResult>,
  pub explanation: ExplanationState,
}

/// Couples calculations with their asynchronous explanations.
///
/// Every submission takes a new generation number. An explanation is
/// applied only if its generation is still the latest one, so a slow
/// response for an old calculation never replaces a newer result.
pub struct TutorSession<S> {
  service: Arc<S>,
  generation: Arc<AtomicU64>,
  view: Arc<Mutex<SessionView>>,
}

fn lock(view: &Mutex<SessionView>) -> MutexGuard<'_, SessionView> {
  // A panicking writer leaves the view consistent; keep using it.
  view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S> TutorSession<S>
where
  S: ExplanationService + Send + Sync + 'static,
{
  pub fn new(service: S) -> Self {
    TutorSession {
      service: Arc::new(service),
      generation: Arc::new(AtomicU64::new(0)),
      view: Arc::new(Mutex::new(SessionView {
        generation: 0,
        result: None,
        explanation: ExplanationState::Idle,
      })),
    }
  }

  pub fn current_generation(&self) -> u64 {
    self.generation.load(Ordering::SeqCst)
  }

  pub fn view(&self) -> SessionView {
    lock(&self.view).clone()
  }

  /// Show `result` immediately and request its explanation in the
  /// background. The task resolves to `true` if its explanation was
  /// applied and `false` if it arrived too late.
  pub fn submit(&self, result: ComputationResult) -> JoinHandle<bool> {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let request = ExplanationRequest::from_result(&result);
    {
      let mut view = lock(&self.view);
      *view = SessionView {
        generation,
        result: Some(result),
        explanation: ExplanationState::Pending,
      };
    }

    let service = Arc::clone(&self.service);
    let latest = Arc::clone(&self.generation);
    let view = Arc::clone(&self.view);
    tokio::spawn(async move {
      let response = service.explain(request).await;

      let mut view = lock(&view);
      if latest.load(Ordering::SeqCst) != generation
        || view.generation != generation
      {
        log::debug!("dropping stale explanation for generation {generation}");
        return false;
      }

      view.explanation = match response {
        Ok(text) if !text.trim().is_empty() => {
          ExplanationState::Ready(Explanation::parse(&text))
        }
        Ok(_) => {
          log::warn!("explanation service returned no text");
          ExplanationState::Failed(Explanation::fallback())
        }
        Err(err) => {
          log::warn!("explanation service failed: {err}");
          ExplanationState::Failed(Explanation::fallback())
        }
      };
      true
    })
  }
}
