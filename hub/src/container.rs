//! The main `Container` struct and its associated methods.

use crate::core::{Callable, Definition, ResolutionGuard, Slot, Value};
use crate::error::{ContainerError, Result};
use crate::store::KeyStore;

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Something that registers a group of entries on a container.
pub trait ServiceProvider {
  fn register(&self, container: &Container) -> Result<()>;
}

impl<F> ServiceProvider for F
where
  F: Fn(&Container) -> Result<()>,
{
  fn register(&self, container: &Container) -> Result<()> {
    self(container)
  }
}

/// A lazy-resolving service container keyed by strings.
///
/// Every key holds a [`Definition`]. Plain values and protected entries are
/// returned as stored, factories are invoked on every read, and singletons
/// are invoked on first read, after which the result is cached and the key
/// is frozen against further writes.
///
/// The container is single-threaded. All methods take `&self` so that
/// constructors, which receive the container, can resolve their own
/// dependencies. No internal borrow is held while a constructor runs.
#[derive(Default)]
pub struct Container {
  entries: RefCell<KeyStore<Slot>>,
  resolving: RefCell<HashSet<String>>,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a container pre-populated with `items`, in iteration order.
  pub fn with_items<K, I>(items: I) -> Self
  where
    K: Into<String>,
    I: IntoIterator<Item = (K, Definition)>,
  {
    let mut entries = KeyStore::new();
    for (key, definition) in items {
      entries.insert(key, Slot::Defined(definition));
    }
    Self {
      entries: RefCell::new(entries),
      resolving: RefCell::default(),
    }
  }

  // --- PRIVATE HELPERS ---

  fn slot(&self, key: &str) -> Result<Slot> {
    self
      .entries
      .borrow()
      .get(key)
      .cloned()
      .ok_or_else(|| ContainerError::UnknownKey(key.to_owned()))
  }

  fn invoke(&self, key: &str, f: &Callable) -> Result<Value> {
    let _guard = ResolutionGuard::new(&self.resolving, key)?;
    f(self)
  }

  fn resolve_singleton(&self, key: &str, f: Callable) -> Result<Value> {
    let value = self.invoke(key, &f)?;

    let mut entries = self.entries.borrow_mut();
    // The constructor may have replaced or removed its own entry; only cache
    // over the exact callable that produced the value.
    let unchanged = matches!(
      entries.get(key),
      Some(Slot::Defined(Definition::Singleton(current))) if Rc::ptr_eq(current, &f)
    );
    let previous = if unchanged {
      tracing::trace!(key = %key, "resolved singleton");
      entries.insert(
        key,
        Slot::Resolved {
          value: value.clone(),
          raw: f,
        },
      )
    } else {
      None
    };
    drop(entries);
    drop(previous);
    Ok(value)
  }

  // --- Registration ---

  /// Stores `definition` under `key`.
  ///
  /// Fails with [`ContainerError::OverrideFrozen`] once the key holds a
  /// resolved singleton.
  pub fn set(&self, key: impl Into<String>, definition: Definition) -> Result<()> {
    let key = key.into();
    let mut entries = self.entries.borrow_mut();
    if entries.get(&key).is_some_and(Slot::is_frozen) {
      tracing::debug!(key = %key, "rejected write to frozen entry");
      return Err(ContainerError::OverrideFrozen(key));
    }
    tracing::debug!(key = %key, kind = definition.kind(), "registered entry");
    let previous = entries.insert(key, Slot::Defined(definition));
    // The replaced value may run arbitrary `Drop` code that uses the container.
    drop(entries);
    drop(previous);
    Ok(())
  }

  pub fn set_value<T: Any>(&self, key: impl Into<String>, value: T) -> Result<()> {
    self.set(key, Definition::value(value))
  }

  pub fn set_singleton<T, F>(&self, key: impl Into<String>, f: F) -> Result<()>
  where
    T: Any,
    F: Fn(&Container) -> Result<T> + 'static,
  {
    self.set(key, Definition::singleton(f))
  }

  pub fn set_factory<T, F>(&self, key: impl Into<String>, f: F) -> Result<()>
  where
    T: Any,
    F: Fn(&Container) -> Result<T> + 'static,
  {
    self.set(key, Definition::factory(f))
  }

  pub fn set_protected<T: Any>(&self, key: impl Into<String>, value: T) -> Result<()> {
    self.set(key, Definition::protected(value))
  }

  /// Wraps `f` so that every read of the key it is stored under invokes it.
  pub fn factory<T, F>(&self, f: F) -> Definition
  where
    T: Any,
    F: Fn(&Container) -> Result<T> + 'static,
  {
    Definition::factory(f)
  }

  /// Wraps `value` (typically a closure) so the container always returns it
  /// as-is and never invokes it.
  pub fn protect<T: Any>(&self, value: T) -> Definition {
    Definition::protected(value)
  }

  pub fn singleton<T, F>(&self, f: F) -> Definition
  where
    T: Any,
    F: Fn(&Container) -> Result<T> + 'static,
  {
    Definition::singleton(f)
  }

  /// Runs `provider` against this container, then applies `overrides` as a
  /// batch of [`set`](Container::set) calls.
  ///
  /// The batch stops at the first failing write. Writes before it stay
  /// applied.
  pub fn register<P, K, I>(&self, provider: &P, overrides: I) -> Result<&Self>
  where
    P: ServiceProvider + ?Sized,
    K: Into<String>,
    I: IntoIterator<Item = (K, Definition)>,
  {
    provider.register(self)?;
    for (key, definition) in overrides {
      self.set(key, definition)?;
    }
    Ok(self)
  }

  /// Runs `provider` with no overrides.
  pub fn provide<P: ServiceProvider + ?Sized>(&self, provider: &P) -> Result<&Self> {
    self.register(provider, std::iter::empty::<(String, Definition)>())
  }

  /// Decorates the entry under `key`.
  ///
  /// The new entry invokes the original constructor, downcasts its result to
  /// `T` and passes it with the container to `decorator`. A factory stays a
  /// factory; a singleton stays a singleton.
  ///
  /// Fails when the key is unknown, frozen, a plain value or protected, in
  /// that order of precedence.
  pub fn extend<T, U, F>(&self, key: &str, decorator: F) -> Result<Definition>
  where
    T: Any,
    U: Any,
    F: Fn(Rc<T>, &Container) -> Result<U> + 'static,
  {
    let owned_key = key.to_owned();
    self.extend_raw(key, move |inner, c| {
      let inner = inner
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
          key: owned_key.clone(),
          expected: type_name::<T>(),
        })?;
      decorator(inner, c).map(|v| Rc::new(v) as Value)
    })
  }

  /// Untyped form of [`extend`](Container::extend).
  pub fn extend_raw<F>(&self, key: &str, decorator: F) -> Result<Definition>
  where
    F: Fn(Value, &Container) -> Result<Value> + 'static,
  {
    let definition = match self.slot(key)? {
      Slot::Resolved { .. } => return Err(ContainerError::OverrideFrozen(key.to_owned())),
      Slot::Defined(definition) => definition,
    };
    let (original, is_factory) = match definition {
      Definition::Value(_) => return Err(ContainerError::NotInvocable(key.to_owned())),
      Definition::Protected(_) => return Err(ContainerError::PermissionDenied(key.to_owned())),
      Definition::Singleton(f) => (f, false),
      Definition::Factory(f) => (f, true),
    };

    let extended: Callable = Rc::new(move |c: &Container| decorator(original(c)?, c));
    let definition = if is_factory {
      Definition::Factory(extended)
    } else {
      Definition::Singleton(extended)
    };
    self.set(key, definition.clone())?;
    Ok(definition)
  }

  // --- Resolution ---

  /// Resolves the entry under `key` without downcasting.
  pub fn get_value(&self, key: &str) -> Result<Value> {
    match self.slot(key)? {
      Slot::Resolved { value, .. } => Ok(value),
      Slot::Defined(Definition::Value(value)) | Slot::Defined(Definition::Protected(value)) => {
        Ok(value)
      }
      Slot::Defined(Definition::Factory(f)) => {
        tracing::trace!(key = %key, "invoking factory");
        self.invoke(key, &f)
      }
      Slot::Defined(Definition::Singleton(f)) => self.resolve_singleton(key, f),
    }
  }

  /// Resolves the entry under `key` and downcasts it to `T`.
  pub fn get<T: Any>(&self, key: &str) -> Result<Rc<T>> {
    self
      .get_value(key)?
      .downcast::<T>()
      .map_err(|_| ContainerError::TypeMismatch {
        key: key.to_owned(),
        expected: type_name::<T>(),
      })
  }

  /// Resolves and clones the value under `key`. Handy for entries that hold
  /// an `Rc<dyn Trait>`.
  pub fn get_cloned<T: Any + Clone>(&self, key: &str) -> Result<T> {
    self.get::<T>(key).map(|rc| (*rc).clone())
  }

  /// The stored definition, or the original constructor of a resolved
  /// singleton.
  pub fn raw(&self, key: &str) -> Result<Definition> {
    Ok(match self.slot(key)? {
      Slot::Resolved { raw, .. } => Definition::Singleton(raw),
      Slot::Defined(definition) => definition,
    })
  }

  // --- Introspection ---

  pub fn has(&self, key: &str) -> bool {
    self.entries.borrow().contains(key)
  }

  /// True once the key holds a resolved singleton.
  pub fn is_frozen(&self, key: &str) -> bool {
    self.entries.borrow().get(key).is_some_and(Slot::is_frozen)
  }

  /// Removes the entry along with its tag and frozen state. No-op if absent.
  pub fn remove(&self, key: &str) {
    let removed = self.entries.borrow_mut().remove(key);
    if removed.is_some() {
      tracing::debug!(key = %key, "removed entry");
    }
  }

  /// All known keys in storage order.
  pub fn keys(&self) -> Vec<String> {
    self.entries.borrow().keys().map(str::to_owned).collect()
  }

  pub fn len(&self) -> usize {
    self.entries.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.borrow().is_empty()
  }
}
