//! Lifecycle controller for long-running async services.
//!
//! A service implements [`AsyncService`]: an optional `setup`, a required
//! `execute`, an optional `teardown`. A [`Lifecycle`] drives it through
//!
//! ```text
//! Created -> Starting -> Running -> Stopping -> Stopped -> Disposed
//! ```
//!
//! and exposes two completion signals, "started" (resolving to a
//! [`SetupOutcome`]) and "stopped" (resolving once teardown is done).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::convert::Infallible;
//!
//! use async_trait::async_trait;
//! use steward_lifecycle::{AsyncService, Lifecycle, SetupOutcome};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ticker;
//!
//! #[async_trait]
//! impl AsyncService for Ticker {
//!     type Error = Infallible;
//!
//!     fn name(&self) -> &str {
//!         "ticker"
//!     }
//!
//!     async fn execute(&self, token: CancellationToken) -> Result<(), Self::Error> {
//!         token.cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! async fn run() {
//!     let lifecycle = Lifecycle::new(Ticker);
//!
//!     let outcome = lifecycle
//!         .start_and_wait(CancellationToken::new())
//!         .await
//!         .expect("start once");
//!     assert_eq!(outcome, SetupOutcome::Successful);
//!
//!     // Service is now running
//!
//!     lifecycle.stop_and_wait().await.expect("clean stop");
//!     lifecycle.dispose().await;
//! }
//! ```
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod completion;
mod error;
mod lifecycle;
mod observer;
mod service;
mod state;
mod token;

pub use error::{AggregateError, Error, ServiceError};
pub use lifecycle::Lifecycle;
pub use observer::{LifecycleObserver, TracingObserver};
pub use service::AsyncService;
pub use state::{LifecycleState, SetupOutcome, StopRequest};
