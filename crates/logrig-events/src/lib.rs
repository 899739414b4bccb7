//! logrig event bus
//!
//! A small synchronous publish/subscribe channel. Subscribers register a
//! callback for one event type (or `*` for all of them) and get back a
//! [`Subscription`] that can be cancelled explicitly. A failing or panicking
//! callback is reported through `tracing` and never reaches the publisher.

mod bus;
mod error;

pub use bus::{Event, EventBus, PublishReport, Subscription, WILDCARD};
pub use error::{EventError, Result};
