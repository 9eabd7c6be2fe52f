//! # Collection Events
//!
//! Named hooks fired before and after every bracketed gateway operation.
//! The gateway only needs [`EventHub`]; [`EventManager`] is a ready-made
//! registry of listeners keyed by event.
//!
//! A hub that reports no listeners for an event receives no dispatch for
//! it, so event arguments are never built for nobody.

mod event;
mod hub;

pub use event::{CollectionEvent, CollectionEventArgs, EventData};
pub use hub::{EventHub, EventListener, EventManager};
