//! Hosting contract for components that a host boots and shuts down.
//!
//! A host only knows how to start a component, ask it to shut down and wait
//! for it to exit. Anything with a richer lifecycle is bridged onto this
//! contract by an adapter.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for `Bootable` errors
pub trait BootableError: Debug + Error + Send + Sync + 'static {}

/// A component that can be started and stopped by a host.
#[async_trait]
pub trait Bootable
where
    Self: Send + Sync + 'static,
{
    /// The error type returned when booting or shutting down fails.
    type Error: BootableError;

    /// Name used by the host when reporting on this component.
    fn bootable_name(&self) -> &str;

    /// Starts the component.
    ///
    /// Returns once the component is up, or with an error if it could not
    /// come up. The component keeps running in the background afterwards.
    async fn start(&self) -> Result<(), Self::Error>;

    /// Asks the component to stop and waits for it to wind down.
    ///
    /// Implementations may give up waiting after a deadline of their own.
    async fn shutdown(&self) -> Result<(), Self::Error>;

    /// Waits for the component to exit on its own.
    async fn wait(&self);
}
