//! # Fibre Hub
//!
//! A lazy-resolving service container and a class-hierarchy and wildcard aware
//! event bus, for composing single-threaded applications out of modules that
//! do not know about each other.
//!
//! ## Core Concepts
//!
//! - **Container**: string-keyed entries holding plain values, lazy
//!   singletons, factories re-invoked on every read, or protected callables
//!   that are never invoked. A resolved singleton freezes its key.
//! - **Providers**: anything implementing [`ServiceProvider`] registers a
//!   group of entries in one call.
//! - **Event registry**: handlers attached to `(class, event)` pairs, where
//!   either side may be a wildcard pattern. Triggering walks the declared
//!   class ancestry and stops once a handler marks the event handled.
//! - **Parameters**: YAML or JSON files flattened to dotted keys and loaded
//!   into a container as plain values.
//!
//! Neither the container nor the registry is global; the application root
//! owns them and passes them to whatever needs them.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_hub::{resolve, ClassDecl, Container, Event, EventRegistry};
//!
//! struct Mailer {
//!   from: String,
//! }
//!
//! let container = Container::new();
//! container.set_value("mail.from", String::from("noreply@example.com")).unwrap();
//! container
//!   .set_singleton("mailer", |c| {
//!     Ok(Mailer {
//!       from: (*c.get::<String>("mail.from")?).clone(),
//!     })
//!   })
//!   .unwrap();
//!
//! let mailer = resolve!(container, Mailer, "mailer");
//! assert_eq!(mailer.from, "noreply@example.com");
//! assert!(container.is_frozen("mailer"));
//!
//! let events = EventRegistry::new();
//! events.declare(ClassDecl::class("app::User").extends("app::Model"));
//! events
//!   .subscribe("app::*", "after*", |event: &mut Event| {
//!     event.handled = true;
//!     Ok(())
//!   })
//!   .unwrap();
//!
//! let mut event = Event::new();
//! events.trigger("app::User", "afterInsert", Some(&mut event)).unwrap();
//! assert!(event.handled);
//! ```

mod config;
mod container;
mod core;
mod error;
mod event;
mod macros;
mod store;
mod wildcard;

pub use config::{find_parameter_file, find_parameter_file_in, Parameters};
pub use container::{Container, ServiceProvider};
pub use crate::core::{Callable, Definition, Value};
pub use error::{ConfigError, ContainerError, EventError, HandlerError, PatternError, Result};
pub use event::{
  ClassDecl, Component, Event, EventRegistry, Handler, HandlerResult, SenderId, Target,
};
pub use store::KeyStore;
pub use wildcard::{match_wildcard, match_wildcard_with, MatchOptions, Wildcard};
