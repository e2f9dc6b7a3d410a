//! Response Supervisor: orchestrates one supervised chat turn.
//!
//! Flow: generate candidate → evaluate → on pass return it; on fail
//! regenerate once with the rejected attempt and the evaluator's feedback
//! injected, and return the revision unconditionally. The revision is never
//! re-evaluated, which bounds external-call cost at 2-3 calls per turn.
//!
//! After the reply is determined, signal detectors inspect the turn and
//! matching notifications are dispatched off the response path.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::evaluator::Evaluator;
use crate::chat::models::{ConversationTurn, FinalReply, Rejection, Verdict};
use crate::chat::responder::Responder;
use crate::chat::signals::SignalDetector;
use crate::errors::AppError;
use crate::notify::Notifier;
use crate::persona::Persona;

/// Supervises one chat turn end to end. Holds only immutable shared state, so
/// any number of turns may run concurrently through the same instance.
pub struct ResponseSupervisor {
    persona: Arc<Persona>,
    responder: Arc<dyn Responder>,
    evaluator: Arc<dyn Evaluator>,
    notifier: Arc<dyn Notifier>,
    detectors: Vec<Arc<dyn SignalDetector>>,
}

impl ResponseSupervisor {
    pub fn new(
        persona: Arc<Persona>,
        responder: Arc<dyn Responder>,
        evaluator: Arc<dyn Evaluator>,
        notifier: Arc<dyn Notifier>,
        detectors: Vec<Arc<dyn SignalDetector>>,
    ) -> Self {
        Self {
            persona,
            responder,
            evaluator,
            notifier,
            detectors,
        }
    }

    /// Runs one supervised turn.
    ///
    /// A responder or evaluator failure terminates the turn and propagates to
    /// the caller; no fallback reply is synthesized here. An evaluation
    /// rejection is not an error; it is resolved by the one-shot
    /// regeneration below.
    pub async fn handle(&self, turn: ConversationTurn) -> Result<FinalReply, AppError> {
        if turn.message.trim().is_empty() {
            return Err(AppError::Validation("message cannot be empty".to_string()));
        }

        let turn_id = Uuid::new_v4();
        info!(%turn_id, history_len = turn.history.len(), "Handling chat turn");

        let first = self.responder.generate(&self.persona, &turn, None).await?;

        let verdict = self
            .evaluator
            .evaluate(&self.persona, &turn, &first)
            .await?;

        let reply = match verdict {
            Verdict::Pass => {
                info!(%turn_id, "First candidate accepted");
                FinalReply {
                    text: first.text,
                    revised: false,
                }
            }
            Verdict::Fail { feedback } => {
                info!(%turn_id, %feedback, "First candidate rejected, regenerating once");
                let rejection = Rejection {
                    prior_attempt: first.text,
                    feedback,
                };
                // The revision is returned unconditionally; it is not re-evaluated.
                let second = self
                    .responder
                    .generate(&self.persona, &turn, Some(&rejection))
                    .await?;
                FinalReply {
                    text: second.text,
                    revised: true,
                }
            }
        };

        self.dispatch_signals(&turn, &reply).await;

        Ok(reply)
    }

    /// Runs the detectors over the resolved turn and spawns a notification
    /// per match. Delivery happens off the response path; a notifier failure
    /// is logged and swallowed.
    async fn dispatch_signals(&self, turn: &ConversationTurn, reply: &FinalReply) {
        for detector in &self.detectors {
            if let Some(message) = detector.inspect(turn, reply).await {
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(async move {
                    if let Err(e) = notifier.notify(&message).await {
                        warn!("Notification delivery failed (ignored): {e:#}");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::Candidate;
    use crate::chat::signals::default_detectors;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn persona() -> Arc<Persona> {
        Arc::new(Persona {
            name: "Jane Doe".to_string(),
            summary: "Distributed systems engineer.".to_string(),
            cv_text: "5 years building consensus protocols at Acme.".to_string(),
        })
    }

    fn turn(message: &str) -> ConversationTurn {
        ConversationTurn {
            history: vec![],
            message: message.to_string(),
        }
    }

    /// Responder that replays a fixed script of replies, one per call, and
    /// records the rejection context it was handed.
    struct ScriptedResponder {
        replies: Vec<&'static str>,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
        last_rejection: Mutex<Option<Rejection>>,
    }

    impl ScriptedResponder {
        fn new(replies: Vec<&'static str>) -> Self {
            Self {
                replies,
                calls: AtomicUsize::new(0),
                fail_on_call: None,
                last_rejection: Mutex::new(None),
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                replies: vec![],
                calls: AtomicUsize::new(0),
                fail_on_call: Some(call),
                last_rejection: Mutex::new(None),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Responder for ScriptedResponder {
        async fn generate(
            &self,
            _persona: &Persona,
            _turn: &ConversationTurn,
            rejection: Option<&Rejection>,
        ) -> Result<Candidate, AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_rejection.lock().unwrap() = rejection.cloned();

            if self.fail_on_call == Some(call) {
                return Err(AppError::Llm("responder unreachable".to_string()));
            }

            Ok(Candidate {
                text: self.replies[call].to_string(),
            })
        }
    }

    /// Evaluator that returns one fixed outcome and counts invocations.
    struct ScriptedEvaluator {
        verdict: Option<Verdict>, // None means the call itself fails
        calls: AtomicUsize,
    }

    impl ScriptedEvaluator {
        fn passing() -> Self {
            Self {
                verdict: Some(Verdict::Pass),
                calls: AtomicUsize::new(0),
            }
        }

        fn rejecting(feedback: &str) -> Self {
            Self {
                verdict: Some(Verdict::Fail {
                    feedback: feedback.to_string(),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                verdict: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Evaluator for ScriptedEvaluator {
        async fn evaluate(
            &self,
            _persona: &Persona,
            _turn: &ConversationTurn,
            _candidate: &Candidate,
        ) -> Result<Verdict, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.verdict {
                Some(v) => Ok(v.clone()),
                None => Err(AppError::Llm("evaluator unreachable".to_string())),
            }
        }
    }

    /// Notifier that forwards every message to a channel; optionally reports
    /// delivery failure after recording.
    struct RecordingNotifier {
        tx: mpsc::UnboundedSender<String>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx, fail: false }), rx)
        }

        fn failing() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx, fail: true }), rx)
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> anyhow::Result<()> {
            self.tx.send(message.to_string()).ok();
            if self.fail {
                anyhow::bail!("pushover is down");
            }
            Ok(())
        }
    }

    fn supervisor(
        responder: Arc<ScriptedResponder>,
        evaluator: Arc<ScriptedEvaluator>,
        notifier: Arc<dyn Notifier>,
    ) -> ResponseSupervisor {
        ResponseSupervisor::new(
            persona(),
            responder,
            evaluator,
            notifier,
            default_detectors(),
        )
    }

    async fn recv_notification(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notification channel closed")
    }

    // Accept path: evaluator passes the first candidate, responder runs once,
    // the reply is candidate one verbatim.
    #[tokio::test]
    async fn test_accept_path_returns_first_candidate() {
        let responder = Arc::new(ScriptedResponder::new(vec![
            "5 years building consensus protocols at Acme.",
        ]));
        let evaluator = Arc::new(ScriptedEvaluator::passing());
        let (notifier, mut rx) = RecordingNotifier::new();

        let sup = supervisor(Arc::clone(&responder), Arc::clone(&evaluator), notifier);
        let reply = sup
            .handle(turn("What is your experience with distributed systems?"))
            .await
            .unwrap();

        assert_eq!(reply.text, "5 years building consensus protocols at Acme.");
        assert!(!reply.revised);
        assert_eq!(responder.call_count(), 1);
        assert_eq!(evaluator.call_count(), 1);

        // No detector matched, so nothing was ever dispatched
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    // Reject path: responder runs exactly twice, evaluator exactly once, and
    // the revision is returned without any further evaluation.
    #[tokio::test]
    async fn test_reject_path_returns_revision_unconditionally() {
        let responder = Arc::new(ScriptedResponder::new(vec![
            "My favorite topping is pineapple.",
            "I'm not able to answer that, but feel free to ask about my professional background.",
        ]));
        let evaluator = Arc::new(ScriptedEvaluator::rejecting(
            "irrelevant to professional persona",
        ));
        let (notifier, mut rx) = RecordingNotifier::new();

        let sup = supervisor(Arc::clone(&responder), Arc::clone(&evaluator), notifier);
        let reply = sup
            .handle(turn("What's your favorite pizza topping?"))
            .await
            .unwrap();

        assert_eq!(
            reply.text,
            "I'm not able to answer that, but feel free to ask about my professional background."
        );
        assert!(reply.revised);
        assert_eq!(responder.call_count(), 2);
        assert_eq!(evaluator.call_count(), 1);

        // The regeneration saw the rejected attempt and the feedback
        let rejection = responder.last_rejection.lock().unwrap().clone().unwrap();
        assert_eq!(rejection.prior_attempt, "My favorite topping is pineapple.");
        assert_eq!(rejection.feedback, "irrelevant to professional persona");

        // The declined reply also trips the unknown-question detector
        let notification = recv_notification(&mut rx).await;
        assert!(notification.contains("What's your favorite pizza topping?"));
    }

    // First responder call fails: the turn fails, the evaluator is never
    // invoked, and nothing is dispatched.
    #[tokio::test]
    async fn test_responder_failure_propagates_before_evaluation() {
        let responder = Arc::new(ScriptedResponder::failing_on(0));
        let evaluator = Arc::new(ScriptedEvaluator::passing());
        let (notifier, mut rx) = RecordingNotifier::new();

        let sup = supervisor(Arc::clone(&responder), Arc::clone(&evaluator), notifier);
        let result = sup.handle(turn("Tell me about your work")).await;

        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(evaluator.call_count(), 0);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    // Evaluator call failure terminates the turn with no second generation.
    #[tokio::test]
    async fn test_evaluator_failure_skips_regeneration() {
        let responder = Arc::new(ScriptedResponder::new(vec!["A fine answer."]));
        let evaluator = Arc::new(ScriptedEvaluator::failing());
        let (notifier, _rx) = RecordingNotifier::new();

        let sup = supervisor(Arc::clone(&responder), Arc::clone(&evaluator), notifier);
        let result = sup.handle(turn("Tell me about your work")).await;

        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(responder.call_count(), 1);
        assert_eq!(evaluator.call_count(), 1);
    }

    // A failing notifier never affects the reply.
    #[tokio::test]
    async fn test_notifier_failure_does_not_affect_reply() {
        let responder = Arc::new(ScriptedResponder::new(vec![
            "Great, I'll pass that along to Jane.",
        ]));
        let evaluator = Arc::new(ScriptedEvaluator::passing());
        let (notifier, mut rx) = RecordingNotifier::failing();

        let sup = supervisor(responder, evaluator, notifier);
        let reply = sup
            .handle(turn("You can reach me at jane@example.com"))
            .await
            .unwrap();

        assert_eq!(reply.text, "Great, I'll pass that along to Jane.");

        // The notifier was invoked (and failed) without failing the turn
        let notification = recv_notification(&mut rx).await;
        assert!(notification.contains("jane@example.com"));
    }

    // Contact capture fires on the accept path and does not alter the reply.
    #[tokio::test]
    async fn test_contact_capture_dispatches_notification() {
        let responder = Arc::new(ScriptedResponder::new(vec![
            "Thanks! Jane will reach out soon.",
        ]));
        let evaluator = Arc::new(ScriptedEvaluator::passing());
        let (notifier, mut rx) = RecordingNotifier::new();

        let sup = supervisor(responder, evaluator, notifier);
        let reply = sup
            .handle(turn("You can reach me at jane@example.com"))
            .await
            .unwrap();

        assert_eq!(reply.text, "Thanks! Jane will reach out soon.");
        let notification = recv_notification(&mut rx).await;
        assert!(notification.contains("Recording contact jane@example.com"));
    }

    // Empty messages are rejected before any capability is invoked.
    #[tokio::test]
    async fn test_empty_message_rejected_without_external_calls() {
        let responder = Arc::new(ScriptedResponder::new(vec!["unused"]));
        let evaluator = Arc::new(ScriptedEvaluator::passing());
        let (notifier, _rx) = RecordingNotifier::new();

        let sup = supervisor(Arc::clone(&responder), Arc::clone(&evaluator), notifier);
        let result = sup.handle(turn("   ")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(responder.call_count(), 0);
        assert_eq!(evaluator.call_count(), 0);
    }
}
