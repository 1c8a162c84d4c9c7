//! Async session driver
//!
//! [`QuizFlow`] owns the state machine from [`crate::session`] together
//! with a [`QuizBackend`] and a [`Surface`], and turns the machine's
//! [`Effect`] values into actual remote calls. Effects are drained from a
//! queue so that a call's feedback (which may request further effects,
//! like the leaderboard refresh after a score ack) is processed in order.
//!
//! The one deferred effect, [`Effect::ScheduleReveal`], is handled with a
//! spawned sleep that sends a [`FlowEvent::RevealDue`] back through the
//! flow's own channel. The embedder pumps that channel with
//! [`QuizFlow::next_deferred`]; staleness is resolved by the state
//! machine's epoch check, so a reveal that outlives its quiz run is
//! simply dropped.

use std::{collections::VecDeque, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{
    client::{QuizBackend, ScoreRequest},
    constants,
    identity::Session,
    session::{Effect, QuizSession},
    view::Surface,
};

/// External and deferred inputs to the flow
///
/// `UserInput`, `OptionClicked`, and `SessionChanged` come from the
/// embedder (the latter typically forwarded from
/// [`crate::identity::IdentitySession::subscribe`]); `RevealDue` is
/// produced internally when a scheduled reveal fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Text submitted through the chat input
    UserInput(String),
    /// Click on the option button at the given position
    OptionClicked(usize),
    /// The auth state changed
    SessionChanged(Session),
    /// A scheduled next-question reveal came due
    RevealDue {
        /// Id of the question to reveal
        question_id: String,
        /// Epoch the reveal was scheduled under
        epoch: u64,
    },
}

fn default_reveal_delay() -> Duration {
    Duration::from_millis(constants::timing::NEXT_QUESTION_DELAY_MS)
}

/// Tunable timings of the flow
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOptions {
    /// Pause between a correct verdict and revealing the next question
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_reveal_delay")]
    pub reveal_delay: Duration,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            reveal_delay: default_reveal_delay(),
        }
    }
}

/// Driver binding a [`QuizSession`] to a backend and a surface
pub struct QuizFlow<C, S> {
    backend: C,
    surface: S,
    options: FlowOptions,
    session: QuizSession,
    deferred_tx: mpsc::UnboundedSender<FlowEvent>,
    deferred_rx: mpsc::UnboundedReceiver<FlowEvent>,
}

impl<C: QuizBackend, S: Surface> QuizFlow<C, S> {
    /// Creates a flow in the signed-out, idle state
    pub fn new(backend: C, surface: S, options: FlowOptions) -> Self {
        let (deferred_tx, deferred_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            surface,
            options,
            session: QuizSession::default(),
            deferred_tx,
            deferred_rx,
        }
    }

    /// Read access to the session state, mainly for embedders that render
    /// from it directly
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Waits for the next deferred event (a scheduled reveal coming due)
    ///
    /// The embedder races this against its own input sources and feeds
    /// the event back into [`Self::handle`].
    pub async fn next_deferred(&mut self) -> Option<FlowEvent> {
        self.deferred_rx.recv().await
    }

    /// Handles one event, running every remote call it gives rise to
    ///
    /// Returns once the effect queue is drained; all transcript and view
    /// updates have been delivered to the surface by then.
    pub async fn handle(&mut self, event: FlowEvent) {
        let mut queue = VecDeque::new();
        {
            let mut push = |effect: Effect| queue.push_back(effect);
            match event {
                FlowEvent::UserInput(text) => {
                    self.session.user_input(&text, &self.surface, &mut push);
                }
                FlowEvent::OptionClicked(index) => {
                    self.session.option_clicked(index, &self.surface, &mut push);
                }
                FlowEvent::SessionChanged(session) => {
                    self.session.session_changed(session, &self.surface, &mut push);
                }
                FlowEvent::RevealDue { question_id, epoch } => {
                    self.session
                        .reveal_due(&question_id, epoch, &self.surface, &mut push);
                }
            }
        }

        while let Some(effect) = queue.pop_front() {
            self.execute(effect, &mut queue).await;
        }
    }

    async fn execute(&mut self, effect: Effect, queue: &mut VecDeque<Effect>) {
        let mut push = |effect: Effect| queue.push_back(effect);
        match effect {
            Effect::SendChat(text) => {
                let reply = self.backend.send_chat(&text).await;
                self.session.chat_reply(reply, &self.surface, &mut push);
            }
            Effect::FetchQuestion(id) => {
                let reply = self.backend.fetch_question(&id).await;
                self.session.question_fetched(reply, &self.surface);
            }
            Effect::SubmitAnswer {
                question_id,
                user_answer,
            } => {
                let reply = self.backend.submit_answer(&question_id, &user_answer).await;
                self.session.answer_graded(reply, &self.surface, &mut push);
            }
            Effect::PostScore { score, total } => {
                let identity = self.session.identity();
                let (Some(user_id), Some(username)) =
                    (identity.user_id.clone(), identity.display_name.clone())
                else {
                    tracing::debug!("skipping score post without a named identity");
                    return;
                };
                let request = ScoreRequest {
                    user_id,
                    username,
                    score,
                    total,
                };
                let reply = self.backend.post_score(&request).await;
                self.session.score_posted(reply, &self.surface, &mut push);
            }
            Effect::RefreshLeaderboard => {
                let reply = self.backend.fetch_leaderboard().await;
                self.session.leaderboard_fetched(reply, &self.surface);
            }
            Effect::ScheduleReveal { question_id, epoch } => {
                let sender = self.deferred_tx.clone();
                let delay = self.options.reveal_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // The receiver only drops with the whole flow.
                    let _ = sender.send(FlowEvent::RevealDue { question_id, epoch });
                });
            }
        }
    }
}
