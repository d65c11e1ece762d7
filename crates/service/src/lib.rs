//! Event-facing layer of the user-profile extension.
//!
//! [`ProfileService`] sits between a host event runtime and the
//! attribute store: it classifies inbound events (update / get / remove
//! / reset / rules consequence), drives the store, and publishes the
//! full map as a shared state after any real mutation. The host runtime
//! itself is an injected capability set ([`ExtensionRuntime`]); the
//! [`mock`] module provides a message-recording double for tests.

pub mod client;
pub mod consequence;
pub mod constants;
pub mod event;
pub mod mock;
pub mod runtime;
pub mod service;

pub use client::{ClientError, ProfileClient};
pub use consequence::{interpret, Consequence, ConsequenceDetail, ProfileOperation};
pub use event::Event;
pub use runtime::{ExtensionRuntime, Responder};
pub use service::ProfileService;
