//! # Quizchat Client Library
//!
//! This library provides the client-side logic for a chat-driven quiz:
//! a user converses with a remote assistant, takes a ten-question
//! multiple-choice quiz delivered one question at a time, and posts the
//! final score to a shared leaderboard.
//!
//! The crate is split along its seams: [`session`] holds the quiz session
//! state machine (pure transition logic), [`client`] wraps the remote
//! backend, [`identity`] adapts an external identity provider, [`view`]
//! defines the rendering surface, and [`flow`] wires them together into
//! an async driver.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod client;
pub mod constants;
pub mod flow;
pub mod identity;
pub mod leaderboard;
pub mod session;
pub mod transcript;
pub mod view;
