//! A class-hierarchy and wildcard aware event bus.
//!
//! Handlers are attached to an `(class, event)` pair on an [`EventRegistry`].
//! Either side may be a wildcard pattern (anything containing `*`). When an
//! event is triggered for a class, the registry walks the class's declared
//! ancestry (the class, its parents root-ward, then its interfaces) and runs
//! every matching handler once, in order, until one marks the event handled.
//!
//! ```
//! use fibre_hub::{ClassDecl, Event, EventRegistry};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let events = EventRegistry::new();
//! events.declare(ClassDecl::class("app::Cat").extends("app::Animal"));
//!
//! let heard = Rc::new(Cell::new(0));
//! let counter = heard.clone();
//! events
//!   .subscribe("app::Animal", "shout", move |_: &mut Event| {
//!     counter.set(counter.get() + 1);
//!     Ok(())
//!   })
//!   .unwrap();
//!
//! events.trigger("app::Cat", "shout", None).unwrap();
//! assert_eq!(heard.get(), 1);
//! ```

mod dispatch;
mod hierarchy;
mod registry;

pub use hierarchy::ClassDecl;
pub use registry::EventRegistry;

use crate::core::Value;
use crate::error::HandlerError;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// The result a handler returns. An `Err` aborts the dispatch.
pub type HandlerResult = Result<(), HandlerError>;

/// An identity token for the object that fired an event.
///
/// It is derived from the sender's address and never keeps the sender alive.
/// Two tokens compare equal only if they were taken from the same live object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SenderId(usize);

impl SenderId {
  pub fn of<T: ?Sized>(sender: &T) -> Self {
    SenderId(sender as *const T as *const () as usize)
  }
}

/// The value handed to every handler during one dispatch.
#[derive(Clone, Default)]
pub struct Event {
  /// Set by the registry to the triggered event name.
  pub name: String,
  /// The instance that fired the event, if it was fired from one.
  pub sender: Option<SenderId>,
  /// Setting this stops the dispatch after the current handler returns.
  pub handled: bool,
  /// The payload attached to the running handler's registration.
  pub data: Option<Value>,
  /// A payload supplied by whoever triggers the event.
  pub params: Option<Value>,
}

impl Event {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_params<T: Any>(params: T) -> Self {
    Self {
      params: Some(Rc::new(params)),
      ..Self::default()
    }
  }

  pub fn with_sender(mut self, sender: SenderId) -> Self {
    self.sender = Some(sender);
    self
  }

  /// The registration payload, if present and of type `T`.
  pub fn data<T: Any>(&self) -> Option<&T> {
    self.data.as_ref().and_then(|d| d.downcast_ref::<T>())
  }

  pub fn params<T: Any>(&self) -> Option<&T> {
    self.params.as_ref().and_then(|p| p.downcast_ref::<T>())
  }
}

impl fmt::Debug for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Event")
      .field("name", &self.name)
      .field("sender", &self.sender)
      .field("handled", &self.handled)
      .field("data", &self.data.is_some())
      .field("params", &self.params.is_some())
      .finish()
  }
}

/// A shared event handler.
///
/// Handlers are compared by identity: clones of one `Handler` are equal,
/// two handlers built from identical closures are not. Keep a clone around
/// to [`off`](EventRegistry::off) it later.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&mut Event) -> HandlerResult>);

impl Handler {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(&mut Event) -> HandlerResult + 'static,
  {
    Handler(Rc::new(f))
  }

  pub(crate) fn call(&self, event: &mut Event) -> HandlerResult {
    (self.0)(event)
  }
}

impl PartialEq for Handler {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
  }
}

/// A type whose instances can fire events.
pub trait Component {
  /// The class name handlers are registered against.
  fn class_name(&self) -> &str;

  /// The class's declaration, learned by the registry the first time an
  /// instance fires an event or is checked for handlers. Declarations made
  /// through [`EventRegistry::declare`] take precedence.
  fn class_decl(&self) -> Option<ClassDecl> {
    None
  }
}

/// What an event is fired for: a literal class name or a component instance.
#[derive(Clone, Copy)]
pub enum Target<'a> {
  Class(&'a str),
  Instance(&'a dyn Component),
}

impl<'a> Target<'a> {
  pub fn class(name: &'a str) -> Self {
    Target::Class(name)
  }

  pub fn instance<C: Component>(component: &'a C) -> Self {
    Target::Instance(component)
  }
}

impl<'a> From<&'a str> for Target<'a> {
  fn from(name: &'a str) -> Self {
    Target::Class(name)
  }
}

impl<'a> From<&'a String> for Target<'a> {
  fn from(name: &'a String) -> Self {
    Target::Class(name.as_str())
  }
}

impl<'a> From<&'a dyn Component> for Target<'a> {
  fn from(component: &'a dyn Component) -> Self {
    Target::Instance(component)
  }
}

/// Strips leading namespace separators from a class name.
pub(crate) fn normalize_class(class: &str) -> &str {
  class.trim_start_matches(['\\', ':'])
}
