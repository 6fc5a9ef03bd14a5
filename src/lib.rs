//! A small feature decision client on top of a pluggable decision engine.
//!
//! # Overview
//!
//! The crate revolves around a [`DecisionClient`] that answers three questions: which features
//! exist, what a feature looks like, and whether a feature is enabled for a given user. A user is
//! described by a [`UserContext`]: an identifier plus key-value [`Attributes`]. Evaluating a
//! feature results in a [`FeatureDecision`], holding the enabled flag and the resolved values of
//! the feature's variables.
//!
//! The client delegates every question to a [`DecisionEngine`]. Two engines are provided:
//! - [`DatafileEngine`] decides from a local JSON datafile, optionally reloaded by a
//!   [`PollerThread`], and forwards tracking events to an [`EventDispatcher`].
//! - [`testing::TestEngine`] keeps features in memory so tests can register them directly.
//!
//! # Tracking
//!
//! [`DecisionClient::get_and_track_feature_with_context`] records that a feature was evaluated.
//! Tracking is best effort: a failure to track is logged and never turns a decision into an
//! error.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. The client itself only reports
//! [`Error::FeatureNotFound`]; everything else comes from the engine as [`Error::Upstream`].
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages. Consider integrating a `log`-compatible logger implementation for better visibility
//! into engine operations.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;
mod configuration_store;
mod context;
mod datafile_engine;
mod engine;
mod entities;
mod error;
mod event_dispatcher;
mod poller;
pub mod testing;

pub use client::{DecisionClient, FeatureDecision};
pub use config::ClientConfig;
pub use context::{AttributeValue, Attributes, UserContext};
pub use datafile_engine::DatafileEngine;
pub use engine::DecisionEngine;
pub use entities::{Datafile, Feature, Variable, VariableMap, VariableType, VariableValue};
pub use error::{EngineError, Error, Result};
pub use event_dispatcher::{EventDispatcher, TrackingEvent};
pub use poller::PollerThread;
