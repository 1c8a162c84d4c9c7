//! Quiz session state machine
//!
//! This module owns the session state of one user's quiz run: which
//! question is active, its option set, the running score, and the
//! transitions between free-form chat and answering. The machine is pure
//! transition logic: remote calls leave as [`Effect`] values through a
//! caller-supplied closure, and view changes leave through the
//! [`Surface`] trait, so the whole thing is testable without a network
//! or a rendering surface.
//!
//! Policy decisions baked in here: quiz start is detected by a fixed
//! phrase in the chat reply (case-insensitive), and a single wrong answer
//! ends the quiz immediately (sudden death).

use itertools::Itertools;

use crate::{
    client::{AnswerReply, ChatReply, QuestionReply, ScoreAck, TransportError},
    constants,
    identity::Session,
    leaderboard::{Leaderboard, LeaderboardEntry},
    transcript::{ChatTurn, Transcript},
    view::{Surface, UpdateMessage},
};

/// The two phases of a quiz session
///
/// `Idle` means free-form chat; `AwaitingAnswer` means a quiz is in
/// progress with exactly one active question. There are never two active
/// questions at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// No active question; user input is chat
    #[default]
    Idle,
    /// A question is pending; user input is an answer
    AwaitingAnswer {
        /// Id of the active question
        question_id: String,
        /// Its options in display order, at most four
        options: Vec<String>,
    },
}

/// Side effects requested by the state machine
///
/// The machine never performs I/O itself; it hands these to the caller
/// (normally [`crate::flow::QuizFlow`]) through an `FnMut(Effect)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Post free chat text to the backend
    SendChat(String),
    /// Fetch a question by id
    FetchQuestion(String),
    /// Submit an answer for grading
    SubmitAnswer {
        /// Id of the question being answered
        question_id: String,
        /// Literal answer text
        user_answer: String,
    },
    /// Post the final score to the leaderboard
    PostScore {
        /// Questions answered correctly
        score: u32,
        /// Fixed quiz length
        total: u32,
    },
    /// Refetch the leaderboard
    RefreshLeaderboard,
    /// Reveal the next question after the presentation delay
    ///
    /// Carries the epoch it was scheduled under; the reveal is void if
    /// the session epoch has moved on by the time it fires.
    ScheduleReveal {
        /// Id of the question to reveal
        question_id: String,
        /// Epoch the reveal belongs to
        epoch: u64,
    },
}

/// State machine for one user's chat-and-quiz session
#[derive(Debug, Default)]
pub struct QuizSession {
    phase: Phase,
    score: u32,
    answered: u32,
    /// Bumped on every reset; stale deferred reveals compare against it
    epoch: u64,
    identity: Session,
    board: Leaderboard,
    /// Append-only mirror of every turn delivered to the surface
    transcript: Transcript,
}

fn format_question(question: &str, options: &[String]) -> String {
    let lettered = options
        .iter()
        .zip(constants::quiz::OPTION_LETTERS)
        .map(|(option, letter)| format!("{letter}) {option}"))
        .join("\n");
    format!("Question: {question}\n\nChoose (A, B, C, D):\n{lettered}")
}

/// Resolves a typed single-letter token to the option at that position
///
/// Returns `None` when the input is not a recognized letter or no option
/// exists at that position; the caller then submits the raw text verbatim.
fn resolve_typed_answer<'a>(options: &'a [String], typed: &str) -> Option<&'a str> {
    let mut chars = typed.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return None;
    };
    let letter = letter.to_ascii_uppercase();
    let position = constants::quiz::OPTION_LETTERS
        .iter()
        .position(|l| *l == letter)?;
    options.get(position).map(String::as_str)
}

/// Parses the numeric suffix of a question id and returns its successor
fn next_question_number(question_id: &str) -> Option<u32> {
    question_id
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .parse::<u32>()
        .ok()
        .map(|n| n + 1)
}

impl QuizSession {
    /// Returns the current phase
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Returns the id of the active question, if a quiz is in progress
    pub fn active_question_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::AwaitingAnswer { question_id, .. } => Some(question_id),
            Phase::Idle => None,
        }
    }

    /// Questions answered correctly in the current (or last) run
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Questions graded in the current (or last) run
    pub fn answered(&self) -> u32 {
        self.answered
    }

    /// Current session epoch; deferred work scheduled under an older
    /// epoch is void
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Snapshot of the identity this session runs under
    pub fn identity(&self) -> &Session {
        &self.identity
    }

    /// The currently rendered leaderboard
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.board
    }

    /// The chat transcript, in display order
    ///
    /// Every turn sent to the surface is also logged here, so embedders
    /// that re-render from scratch can replay the whole conversation.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Handles text submitted by the user
    ///
    /// While idle the text is sent as a chat message; while a question is
    /// pending it is interpreted as an answer: a single recognized letter
    /// resolves to the option at that position, anything else is submitted
    /// verbatim. A resolved letter and a button click produce identical
    /// request payloads.
    pub fn user_input(
        &mut self,
        text: &str,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        if !self.identity.authenticated {
            surface.send_update(&UpdateMessage::AuthBanner("Please log in first.".to_string()));
            return;
        }
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.log_turn(ChatTurn::user(text), surface);

        match &self.phase {
            Phase::Idle => effects(Effect::SendChat(text.to_string())),
            Phase::AwaitingAnswer {
                question_id,
                options,
            } => {
                let user_answer = resolve_typed_answer(options, text)
                    .unwrap_or(text)
                    .to_string();
                let question_id = question_id.clone();
                // Controls go dark until the verdict arrives, preventing
                // duplicate submission.
                surface.send_update(&UpdateMessage::OptionsDisabled);
                effects(Effect::SubmitAnswer {
                    question_id,
                    user_answer,
                });
            }
        }
    }

    /// Handles a click on the option button at `index`
    ///
    /// Submits that option's literal text. Ignored while idle or when the
    /// index is out of range.
    pub fn option_clicked(
        &mut self,
        index: usize,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        let (question_id, option) = match &self.phase {
            Phase::AwaitingAnswer {
                question_id,
                options,
            } => match options.get(index) {
                Some(option) => (question_id.clone(), option.clone()),
                None => return,
            },
            Phase::Idle => return,
        };

        self.log_turn(ChatTurn::user(option.clone()), surface);
        surface.send_update(&UpdateMessage::OptionsDisabled);
        effects(Effect::SubmitAnswer {
            question_id,
            user_answer: option,
        });
    }

    /// Feeds back the result of a chat call
    ///
    /// A reply containing the quiz-start marker (case-insensitive) resets
    /// the counters and requests the first question. Transport failure is
    /// reported once; the message must be re-sent by the user.
    pub fn chat_reply(
        &mut self,
        reply: Result<ChatReply, TransportError>,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        match reply {
            Err(error) => {
                tracing::warn!("chat request failed: {error}");
                self.log_turn(ChatTurn::bot("Backend connection failed."), surface);
            }
            Ok(reply) => {
                self.log_turn(ChatTurn::bot(reply.reply.clone()), surface);

                if matches!(self.phase, Phase::Idle)
                    && reply
                        .reply
                        .to_lowercase()
                        .contains(constants::quiz::START_MARKER)
                {
                    self.score = 0;
                    self.answered = 0;
                    self.epoch += 1;
                    effects(Effect::FetchQuestion(
                        constants::quiz::FIRST_QUESTION_ID.to_string(),
                    ));
                }
            }
        }
    }

    /// Feeds back the result of a question fetch
    ///
    /// A domain error means no question was started: the error is shown
    /// and the session stays (or returns to) idle. On success the question
    /// becomes active, with options truncated to the first
    /// [`constants::quiz::MAX_OPTION_COUNT`] — an index bound, not a
    /// validation failure.
    pub fn question_fetched(
        &mut self,
        reply: Result<QuestionReply, TransportError>,
        surface: &impl Surface,
    ) {
        match reply {
            Err(error) => {
                tracing::warn!("question fetch failed: {error}");
                self.log_turn(ChatTurn::bot("Failed to load question."), surface);
            }
            Ok(QuestionReply::Error(domain)) => {
                self.log_turn(ChatTurn::bot(domain.error), surface);
                self.reset_to_idle();
            }
            Ok(QuestionReply::Question(payload)) => {
                let mut options = payload.options;
                options.truncate(constants::quiz::MAX_OPTION_COUNT);

                self.log_turn(ChatTurn::bot(format_question(&payload.question, &options)), surface);
                surface.send_update(&UpdateMessage::OptionButtons(options.clone()));

                self.phase = Phase::AwaitingAnswer {
                    question_id: payload.id,
                    options,
                };
            }
        }
    }

    /// Feeds back the grading result for the active question
    ///
    /// A domain error changes nothing (the same question stays pending);
    /// a transport failure likewise holds state, since the question is
    /// still unanswered from the server's perspective. A verdict advances
    /// the run: correct answers count and schedule the next question,
    /// while the first incorrect answer ends the quiz (sudden death).
    pub fn answer_graded(
        &mut self,
        reply: Result<AnswerReply, TransportError>,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        let (question_id, options) = match &self.phase {
            Phase::AwaitingAnswer {
                question_id,
                options,
            } => (question_id.clone(), options.clone()),
            Phase::Idle => return,
        };

        match reply {
            Err(error) => {
                tracing::warn!("answer submission failed: {error}");
                self.log_turn(ChatTurn::bot("Error submitting answer."), surface);
                // Re-enable controls so the user can re-initiate.
                surface.send_update(&UpdateMessage::OptionButtons(options));
            }
            Ok(AnswerReply::Error(domain)) => {
                self.log_turn(ChatTurn::bot(domain.error), surface);
                surface.send_update(&UpdateMessage::OptionButtons(options));
            }
            Ok(AnswerReply::Verdict(verdict)) => {
                self.log_turn(ChatTurn::bot(verdict.feedback), surface);
                self.answered += 1;

                if verdict.correct {
                    self.score += 1;
                    match next_question_number(&question_id) {
                        Some(next) if next <= constants::quiz::QUESTION_COUNT => {
                            effects(Effect::ScheduleReveal {
                                question_id: format!("q{next}"),
                                epoch: self.epoch,
                            });
                        }
                        Some(_) => {
                            let summary = format!(
                                "Quiz Complete! Score: {}/{}",
                                self.score,
                                constants::quiz::QUESTION_COUNT
                            );
                            self.finish_quiz(summary, surface, effects);
                        }
                        None => {
                            tracing::warn!(
                                "question id {question_id:?} has no numeric suffix, ending quiz"
                            );
                            let summary = format!(
                                "Quiz Complete! Score: {}/{}",
                                self.score,
                                constants::quiz::QUESTION_COUNT
                            );
                            self.finish_quiz(summary, surface, effects);
                        }
                    }
                } else {
                    let summary = format!(
                        "Game Over. Score: {}/{}",
                        self.score,
                        constants::quiz::QUESTION_COUNT
                    );
                    self.finish_quiz(summary, surface, effects);
                }
            }
        }
    }

    /// Fires a scheduled next-question reveal
    ///
    /// Void when `epoch` no longer matches the session epoch: a completed
    /// quiz, a sign-out, or a fresh quiz start has obsoleted the reveal.
    pub fn reveal_due(
        &mut self,
        question_id: &str,
        epoch: u64,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        if epoch != self.epoch {
            tracing::debug!("dropping stale reveal for {question_id}");
            return;
        }

        self.log_turn(ChatTurn::bot("Next question:"), surface);
        effects(Effect::FetchQuestion(question_id.to_string()));
    }

    /// Feeds back the result of a score post
    ///
    /// Posting is fire-and-forget: failure is logged and degrades the
    /// leaderboard only. Success renders the acknowledgement and triggers
    /// a leaderboard refetch.
    pub fn score_posted(
        &mut self,
        reply: Result<ScoreAck, TransportError>,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        match reply {
            Err(error) => {
                tracing::warn!("score post failed: {error}");
            }
            Ok(ack) => {
                self.log_turn(ChatTurn::bot(ack.message), surface);
                effects(Effect::RefreshLeaderboard);
            }
        }
    }

    /// Feeds back the result of a leaderboard fetch
    ///
    /// Success replaces the board wholesale in server order. Failure
    /// leaves the previous entries alone and flags the view as stale.
    pub fn leaderboard_fetched(
        &mut self,
        reply: Result<Vec<LeaderboardEntry>, TransportError>,
        surface: &impl Surface,
    ) {
        match reply {
            Err(error) => {
                tracing::warn!("leaderboard fetch failed: {error}");
                surface.send_update(&UpdateMessage::LeaderboardUnavailable);
            }
            Ok(entries) => {
                self.board.replace(entries);
                surface.send_update(&UpdateMessage::Leaderboard(self.board.entries().to_vec()));
            }
        }
    }

    /// Applies an auth-state transition
    ///
    /// Signing in flips the view, greets the user, and refreshes the
    /// leaderboard. Signing out resets the quiz entirely and voids any
    /// pending deferred reveal.
    pub fn session_changed(
        &mut self,
        session: Session,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        self.identity = session;

        if self.identity.authenticated {
            let name = self.identity.display_label().to_string();
            surface.send_update(&UpdateMessage::SignedIn {
                display_name: name.clone(),
            });
            self.log_turn(
                ChatTurn::bot(format!("Welcome back, {name}! Type 'quiz' to start.")),
                surface,
            );
            effects(Effect::RefreshLeaderboard);
        } else {
            self.reset_to_idle();
            self.score = 0;
            self.answered = 0;
            surface.send_update(&UpdateMessage::SignedOut);
        }
    }

    /// Ends the quiz: reports the summary, posts the score when the
    /// session has a non-anonymous display name, and returns to idle
    fn finish_quiz(
        &mut self,
        summary: String,
        surface: &impl Surface,
        effects: &mut impl FnMut(Effect),
    ) {
        self.log_turn(ChatTurn::bot(summary), surface);

        if self.identity.can_post_scores() {
            effects(Effect::PostScore {
                score: self.score,
                total: constants::quiz::QUESTION_COUNT,
            });
        }

        self.reset_to_idle();
    }

    /// Returns to idle and bumps the epoch, voiding stale deferred work
    fn reset_to_idle(&mut self) {
        self.phase = Phase::Idle;
        self.epoch += 1;
    }

    /// Delivers a chat turn to the surface and logs it in the transcript
    fn log_turn(&mut self, turn: ChatTurn, surface: &impl Surface) {
        surface.send_update(&turn.clone().into());
        self.transcript.push(turn);
    }
}
