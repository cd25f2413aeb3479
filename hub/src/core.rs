//! Core data structures for the service container.

use crate::container::Container;
use crate::error::{ContainerError, Result};

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// A shared, type-erased value stored in or produced by the container.
pub type Value = Rc<dyn Any>;

/// A service constructor. It receives the container so it can resolve its
/// own dependencies.
pub type Callable = Rc<dyn Fn(&Container) -> Result<Value>>;

/// What a caller stores under a container key.
///
/// The variant is the entry's resolution tag and is chosen explicitly at
/// registration time.
#[derive(Clone)]
pub enum Definition {
  /// A plain value, returned as-is.
  Value(Value),
  /// Invoked on first read; the result is cached and the key frozen.
  Singleton(Callable),
  /// Invoked on every read, never cached.
  Factory(Callable),
  /// A callable (or anything else) kept as data. Never invoked.
  Protected(Value),
}

impl Definition {
  pub fn value<T: Any>(value: T) -> Self {
    Definition::Value(Rc::new(value))
  }

  pub fn singleton<T, F>(f: F) -> Self
  where
    T: Any,
    F: Fn(&Container) -> Result<T> + 'static,
  {
    Definition::Singleton(callable(f))
  }

  pub fn factory<T, F>(f: F) -> Self
  where
    T: Any,
    F: Fn(&Container) -> Result<T> + 'static,
  {
    Definition::Factory(callable(f))
  }

  pub fn protected<T: Any>(value: T) -> Self {
    Definition::Protected(Rc::new(value))
  }

  /// True for definitions the container would invoke.
  pub fn is_invocable(&self) -> bool {
    matches!(self, Definition::Singleton(_) | Definition::Factory(_))
  }

  /// Retags an invocable definition so every read invokes it.
  pub fn into_factory(self) -> Result<Self, ContainerError> {
    match self {
      Definition::Singleton(f) | Definition::Factory(f) => Ok(Definition::Factory(f)),
      Definition::Value(_) => Err(ContainerError::NotInvocable("<value>".to_owned())),
      Definition::Protected(_) => Err(ContainerError::NotInvocable("<protected>".to_owned())),
    }
  }

  /// Retags an invocable definition so the container never invokes it. The
  /// callable itself becomes the stored value.
  pub fn into_protected(self) -> Result<Self, ContainerError> {
    match self {
      Definition::Singleton(f) | Definition::Factory(f) => Ok(Definition::Protected(Rc::new(f))),
      Definition::Protected(v) => Ok(Definition::Protected(v)),
      Definition::Value(_) => Err(ContainerError::NotInvocable("<value>".to_owned())),
    }
  }

  /// The callable behind a singleton or factory definition.
  pub fn callable(&self) -> Option<&Callable> {
    match self {
      Definition::Singleton(f) | Definition::Factory(f) => Some(f),
      Definition::Value(_) | Definition::Protected(_) => None,
    }
  }

  pub(crate) fn kind(&self) -> &'static str {
    match self {
      Definition::Value(_) => "value",
      Definition::Singleton(_) => "singleton",
      Definition::Factory(_) => "factory",
      Definition::Protected(_) => "protected",
    }
  }
}

impl fmt::Debug for Definition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Definition::{}", self.kind())
  }
}

/// Boxes a typed constructor into a [`Callable`].
pub(crate) fn callable<T, F>(f: F) -> Callable
where
  T: Any,
  F: Fn(&Container) -> Result<T> + 'static,
{
  Rc::new(move |c: &Container| f(c).map(|v| Rc::new(v) as Value))
}

/// The stored state of one container key.
#[derive(Clone)]
pub(crate) enum Slot {
  Defined(Definition),
  /// A singleton that has been resolved. The key is frozen.
  Resolved { value: Value, raw: Callable },
}

impl Slot {
  pub(crate) fn is_frozen(&self) -> bool {
    matches!(self, Slot::Resolved { .. })
  }
}

/// An RAII guard that detects reentrant resolution of the same key.
///
/// Creating the guard records the key in the container's in-progress set and
/// fails if it is already there. Dropping the guard removes it again, also
/// when the constructor returned an error.
pub(crate) struct ResolutionGuard<'a> {
  resolving: &'a RefCell<HashSet<String>>,
  key: String,
}

impl<'a> ResolutionGuard<'a> {
  pub(crate) fn new(resolving: &'a RefCell<HashSet<String>>, key: &str) -> Result<Self> {
    if !resolving.borrow_mut().insert(key.to_owned()) {
      tracing::warn!(key = %key, "circular resolution detected");
      return Err(ContainerError::CircularResolution(key.to_owned()));
    }
    Ok(Self {
      resolving,
      key: key.to_owned(),
    })
  }
}

impl Drop for ResolutionGuard<'_> {
  fn drop(&mut self) {
    self.resolving.borrow_mut().remove(&self.key);
  }
}
