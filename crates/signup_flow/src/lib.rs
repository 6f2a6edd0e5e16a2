use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{Answer, JobRolesPerMonth, PainLevel, QuestionId, ResumesPerRole, QUESTIONS},
    error::StoreError,
    protocol::{SignupRecord, StoreAck},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod store;

pub use store::HttpSignupStore;

/// Client-side bound on every store submission. A response arriving after the
/// deadline is ignored; the user has already been told to retry.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);
/// How long the thank-you confirmation stays up before the questionnaire opens.
pub const THANK_YOU_DELAY: Duration = Duration::from_millis(1500);

/// Number of fixed multiple-choice steps before the free-text step.
pub const FIXED_STEPS: usize = QUESTIONS.len();
/// Step index of the trailing free-text step.
pub const FREE_TEXT_STEP: usize = FIXED_STEPS;
/// Total questionnaire steps, free-text step included.
pub const TOTAL_STEPS: usize = FIXED_STEPS + 1;

/// Remote endpoint that durably records a [`SignupRecord`], appending a new
/// row or overwriting the non-email columns of the row already keyed by the
/// record's email. Implementations return the store's raw acknowledgement;
/// the flow controller owns the policy that a false or absent success
/// indicator is a failed write.
#[async_trait]
pub trait SignupStore: Send + Sync {
    async fn save(&self, record: &SignupRecord) -> Result<StoreAck, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    EmailEntry,
    SubmittingEmail,
    ThankYou,
    Questionnaire { step: usize },
    SubmittingAnswers,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Email,
    Answers,
}

impl SubmissionPhase {
    fn as_str(self) -> &'static str {
        match self {
            SubmissionPhase::Email => "email",
            SubmissionPhase::Answers => "answers",
        }
    }

    /// The state a failed submission hands control back to, with all input
    /// the user has entered so far still in place.
    fn reverted_state(self) -> FlowState {
        match self {
            SubmissionPhase::Email => FlowState::EmailEntry,
            SubmissionPhase::Answers => FlowState::Questionnaire {
                step: FREE_TEXT_STEP,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum FlowEvent {
    StateChanged(FlowState),
    /// The single user-facing failure class: the submission did not go
    /// through and must be retried. Front ends present this as a blocking
    /// notice; the underlying cause is only distinguished in logs.
    SubmissionFailed { phase: SubmissionPhase },
    StoreAcknowledged { phase: SubmissionPhase, ack: StoreAck },
}

/// Misuse of the controller API: an action arrived in a state where its
/// control surface would not exist. Distinct from submission failures, which
/// are reported through [`FlowEvent::SubmissionFailed`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("action is not valid while the signup flow is {state:?}")]
    InvalidState { state: FlowState },
    #[error("current question has no option at index {index}")]
    UnknownOption { index: usize },
    #[error("current step needs a selected answer before advancing")]
    AnswerRequired,
}

/// Ephemeral, in-memory progress through the flow. Never persisted; cleared
/// on completion or cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub email: String,
    pub resumes_per_role: Option<ResumesPerRole>,
    pub job_roles_per_month: Option<JobRolesPerMonth>,
    pub pain_level: Option<PainLevel>,
    pub frustration: String,
}

impl SessionState {
    fn record_answer(&mut self, answer: Answer) {
        match answer {
            Answer::ResumesPerRole(v) => self.resumes_per_role = Some(v),
            Answer::JobRolesPerMonth(v) => self.job_roles_per_month = Some(v),
            Answer::PainLevel(v) => self.pain_level = Some(v),
        }
    }

    fn has_answer(&self, question: QuestionId) -> bool {
        match question {
            QuestionId::ResumesPerRole => self.resumes_per_role.is_some(),
            QuestionId::JobRolesPerMonth => self.job_roles_per_month.is_some(),
            QuestionId::PainLevel => self.pain_level.is_some(),
        }
    }

    fn to_record(&self) -> SignupRecord {
        SignupRecord {
            email: self.email.trim().to_string(),
            resumes_per_role: self.resumes_per_role,
            job_roles_per_month: self.job_roles_per_month,
            pain_level: self.pain_level,
            frustration: self.frustration.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubmissionId(u64);

struct FlowInner {
    state: FlowState,
    session: SessionState,
    active_submission: Option<SubmissionId>,
    submissions_started: u64,
}

impl FlowInner {
    fn begin_submission(&mut self) -> SubmissionId {
        let id = SubmissionId(self.submissions_started);
        self.submissions_started += 1;
        self.active_submission = Some(id);
        id
    }
}

/// State machine driving a user through email capture, the questionnaire,
/// and the two store submissions, with loading/error/success feedback at
/// each network boundary.
///
/// At most one submission is ever outstanding: only the `Submitting*` states
/// start one, and each is exited exactly once by whichever of the store
/// outcome or the timeout watchdog settles first for the still-active
/// submission id. UI layers observe the flow through the broadcast stream
/// from [`SignupFlow::subscribe_events`].
pub struct SignupFlow {
    store: Arc<dyn SignupStore>,
    inner: Mutex<FlowInner>,
    events: broadcast::Sender<FlowEvent>,
    submit_timeout: Duration,
    thank_you_delay: Duration,
}

impl SignupFlow {
    pub fn new(store: Arc<dyn SignupStore>) -> Arc<Self> {
        Self::with_timings(store, SUBMIT_TIMEOUT, THANK_YOU_DELAY)
    }

    pub fn with_timings(
        store: Arc<dyn SignupStore>,
        submit_timeout: Duration,
        thank_you_delay: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            store,
            inner: Mutex::new(FlowInner {
                state: FlowState::Idle,
                session: SessionState::default(),
                active_submission: None,
                submissions_started: 0,
            }),
            events,
            submit_timeout,
            thank_you_delay,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> FlowState {
        self.inner.lock().await.state
    }

    pub async fn session(&self) -> SessionState {
        self.inner.lock().await.session.clone()
    }

    fn emit(&self, event: FlowEvent) {
        let _ = self.events.send(event);
    }

    /// Any call-to-action on the page. Opens email entry from the resting
    /// state; ignored while a signup is already underway.
    pub async fn open(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != FlowState::Idle {
            return;
        }
        inner.state = FlowState::EmailEntry;
        self.emit(FlowEvent::StateChanged(FlowState::EmailEntry));
    }

    /// Records the email as typed, untrimmed, so a failed submission hands
    /// back exactly what the user entered.
    pub async fn set_email(&self, value: &str) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        if inner.state != FlowState::EmailEntry {
            return Err(FlowError::InvalidState { state: inner.state });
        }
        inner.session.email = value.to_string();
        Ok(())
    }

    /// User cancellation: discard the session and return to rest. Ignored
    /// while a submission is in flight and on the confirmation screens.
    pub async fn cancel(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            FlowState::EmailEntry | FlowState::Questionnaire { .. } => {
                inner.session = SessionState::default();
                inner.state = FlowState::Idle;
                self.emit(FlowEvent::StateChanged(FlowState::Idle));
            }
            _ => {}
        }
    }

    /// Submits the captured email as an email-only record. Returns
    /// `Ok(false)` without leaving `EmailEntry` when the email is empty after
    /// trimming; the control surface is expected to disable its submit button
    /// in that case, so no failure notice is raised.
    pub async fn submit_email(self: &Arc<Self>) -> Result<bool, FlowError> {
        let (record, submission) = {
            let mut inner = self.inner.lock().await;
            if inner.state != FlowState::EmailEntry {
                return Err(FlowError::InvalidState { state: inner.state });
            }
            let email = inner.session.email.trim();
            if email.is_empty() {
                return Ok(false);
            }
            let record = SignupRecord::email_only(email);
            let submission = inner.begin_submission();
            inner.state = FlowState::SubmittingEmail;
            (record, submission)
        };
        self.emit(FlowEvent::StateChanged(FlowState::SubmittingEmail));
        self.start_submission(submission, SubmissionPhase::Email, record);
        Ok(true)
    }

    /// Selects an answer option on the current fixed question. Re-selecting
    /// overwrites the previous choice for that step.
    pub async fn select_option(&self, index: usize) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        let FlowState::Questionnaire { step } = inner.state else {
            return Err(FlowError::InvalidState { state: inner.state });
        };
        if step >= FIXED_STEPS {
            return Err(FlowError::InvalidState { state: inner.state });
        }
        let answer = QUESTIONS[step]
            .id
            .answer_from_index(index)
            .ok_or(FlowError::UnknownOption { index })?;
        inner.session.record_answer(answer);
        Ok(())
    }

    /// "Next": advances past the current fixed question, requiring a
    /// selected answer.
    pub async fn next(&self) -> Result<(), FlowError> {
        self.advance(true).await
    }

    /// "Skip this question": advances without recording anything. An answer
    /// already selected for the step is kept.
    pub async fn skip(&self) -> Result<(), FlowError> {
        self.advance(false).await
    }

    async fn advance(&self, require_answer: bool) -> Result<(), FlowError> {
        let next_state = {
            let mut inner = self.inner.lock().await;
            let FlowState::Questionnaire { step } = inner.state else {
                return Err(FlowError::InvalidState { state: inner.state });
            };
            if step >= FIXED_STEPS {
                return Err(FlowError::InvalidState { state: inner.state });
            }
            if require_answer && !inner.session.has_answer(QUESTIONS[step].id) {
                return Err(FlowError::AnswerRequired);
            }
            inner.state = FlowState::Questionnaire { step: step + 1 };
            inner.state
        };
        self.emit(FlowEvent::StateChanged(next_state));
        Ok(())
    }

    pub async fn set_frustration(&self, text: &str) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        if inner.state
            != (FlowState::Questionnaire {
                step: FREE_TEXT_STEP,
            })
        {
            return Err(FlowError::InvalidState { state: inner.state });
        }
        inner.session.frustration = text.to_string();
        Ok(())
    }

    /// "Complete" on the free-text step: submits the full record. The store
    /// updates the row created by the email phase rather than appending a
    /// duplicate; the controller relies on that contract.
    pub async fn complete(self: &Arc<Self>) -> Result<(), FlowError> {
        let (record, submission) = {
            let mut inner = self.inner.lock().await;
            if inner.state
                != (FlowState::Questionnaire {
                    step: FREE_TEXT_STEP,
                })
            {
                return Err(FlowError::InvalidState { state: inner.state });
            }
            let record = inner.session.to_record();
            let submission = inner.begin_submission();
            inner.state = FlowState::SubmittingAnswers;
            (record, submission)
        };
        self.emit(FlowEvent::StateChanged(FlowState::SubmittingAnswers));
        self.start_submission(submission, SubmissionPhase::Answers, record);
        Ok(())
    }

    /// Dismisses the final confirmation.
    pub async fn dismiss(&self) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        if inner.state != FlowState::Success {
            return Err(FlowError::InvalidState { state: inner.state });
        }
        inner.state = FlowState::Idle;
        self.emit(FlowEvent::StateChanged(FlowState::Idle));
        Ok(())
    }

    /// Races the store call against the timeout watchdog. Whichever settles
    /// first for the still-active submission id applies the transition; the
    /// loser finds the id retired and does nothing.
    fn start_submission(
        self: &Arc<Self>,
        submission: SubmissionId,
        phase: SubmissionPhase,
        record: SignupRecord,
    ) {
        info!(
            submission = submission.0,
            phase = phase.as_str(),
            email = %record.email,
            "submitting signup record"
        );

        let flow = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = flow.store.save(&record).await;
            flow.finish_submission(submission, phase, outcome).await;
        });

        let flow = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(flow.submit_timeout).await;
            flow.expire_submission(submission, phase).await;
        });
    }

    async fn finish_submission(
        self: &Arc<Self>,
        submission: SubmissionId,
        phase: SubmissionPhase,
        outcome: Result<StoreAck, StoreError>,
    ) {
        let mut inner = self.inner.lock().await;
        if inner.active_submission != Some(submission) {
            info!(
                submission = submission.0,
                phase = phase.as_str(),
                late_success = outcome.as_ref().map(|ack| ack.success).unwrap_or(false),
                "dropping store outcome for a submission that is no longer active"
            );
            return;
        }
        inner.active_submission = None;

        match outcome {
            Ok(ack) if ack.success => match phase {
                SubmissionPhase::Email => {
                    inner.state = FlowState::ThankYou;
                    self.emit(FlowEvent::StoreAcknowledged { phase, ack });
                    self.emit(FlowEvent::StateChanged(FlowState::ThankYou));
                    let flow = Arc::clone(self);
                    tokio::spawn(async move {
                        flow.advance_past_thank_you().await;
                    });
                }
                SubmissionPhase::Answers => {
                    inner.session = SessionState::default();
                    inner.state = FlowState::Success;
                    self.emit(FlowEvent::StoreAcknowledged { phase, ack });
                    self.emit(FlowEvent::StateChanged(FlowState::Success));
                }
            },
            Ok(ack) => {
                warn!(
                    submission = submission.0,
                    phase = phase.as_str(),
                    message = ack.message.as_deref().unwrap_or(""),
                    "signup store did not confirm the write"
                );
                self.fail_submission(&mut inner, phase);
            }
            Err(err) => {
                warn!(
                    submission = submission.0,
                    phase = phase.as_str(),
                    error = %err,
                    "signup store submission failed"
                );
                self.fail_submission(&mut inner, phase);
            }
        }
    }

    async fn expire_submission(self: &Arc<Self>, submission: SubmissionId, phase: SubmissionPhase) {
        let mut inner = self.inner.lock().await;
        if inner.active_submission != Some(submission) {
            return;
        }
        inner.active_submission = None;
        warn!(
            submission = submission.0,
            phase = phase.as_str(),
            timeout_ms = self.submit_timeout.as_millis() as u64,
            "signup store submission timed out"
        );
        self.fail_submission(&mut inner, phase);
    }

    /// Reverts to the state that initiated the submission, all collected
    /// input intact, then raises the single retry notice.
    fn fail_submission(&self, inner: &mut FlowInner, phase: SubmissionPhase) {
        inner.state = phase.reverted_state();
        self.emit(FlowEvent::StateChanged(inner.state));
        self.emit(FlowEvent::SubmissionFailed { phase });
    }

    async fn advance_past_thank_you(self: Arc<Self>) {
        tokio::time::sleep(self.thank_you_delay).await;
        let mut inner = self.inner.lock().await;
        if inner.state != FlowState::ThankYou {
            return;
        }
        inner.state = FlowState::Questionnaire { step: 0 };
        self.emit(FlowEvent::StateChanged(inner.state));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
