use super::hierarchy::{ClassDecl, Hierarchy};
use super::{normalize_class, Event, Handler, HandlerResult};
use crate::core::Value;
use crate::error::{EventError, PatternError};
use crate::wildcard::{is_pattern, Wildcard};

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Clone)]
pub(super) struct Registration {
  pub(super) handler: Handler,
  pub(super) data: Option<Value>,
}

/// class (or class pattern) -> handlers, in registration order.
pub(super) type ClassTable = IndexMap<String, Vec<Registration>>;

/// event (or event pattern) -> class table.
pub(super) type EventTable = IndexMap<String, ClassTable>;

#[derive(Default)]
pub(super) struct HandlerTables {
  pub(super) exact: EventTable,
  pub(super) wildcard: EventTable,
}

/// Storage for event handler registrations and class declarations.
///
/// A registry is an ordinary value: the application root owns one and hands
/// references (or an `Rc`) to the components that register or fire events.
/// Registration and removal may happen from inside a running handler; the
/// dispatch in progress keeps working on the handlers it started with.
#[derive(Default)]
pub struct EventRegistry {
  pub(super) tables: RefCell<HandlerTables>,
  hierarchy: RefCell<Hierarchy>,
  patterns: RefCell<HashMap<String, Rc<Wildcard>>>,
}

impl EventRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Attaches `handler` to the `(class, event)` pair.
  ///
  /// If either name contains `*` the registration goes to the wildcard table
  /// and both names are compiled as patterns; a malformed pattern is
  /// rejected. `append = false` puts the handler in front of the existing
  /// ones.
  pub fn on(
    &self,
    class: &str,
    event: &str,
    handler: Handler,
    data: Option<Value>,
    append: bool,
  ) -> Result<(), EventError> {
    let class = normalize_class(class);
    let wildcard = is_pattern(class) || is_pattern(event);
    if wildcard {
      self.pattern(event)?;
      self.pattern(class)?;
    }

    let mut tables = self.tables.borrow_mut();
    let table = if wildcard {
      &mut tables.wildcard
    } else {
      &mut tables.exact
    };
    let list = table
      .entry(event.to_owned())
      .or_default()
      .entry(class.to_owned())
      .or_default();

    let registration = Registration { handler, data };
    if append || list.is_empty() {
      list.push(registration);
    } else {
      list.insert(0, registration);
    }

    tracing::debug!(class = %class, event = %event, wildcard, append, "attached handler");
    Ok(())
  }

  /// Appends a closure handler with no payload and returns it so it can be
  /// detached later.
  pub fn subscribe<F>(&self, class: &str, event: &str, f: F) -> Result<Handler, EventError>
  where
    F: Fn(&mut Event) -> HandlerResult + 'static,
  {
    let handler = Handler::new(f);
    self.on(class, event, handler.clone(), None, true)?;
    Ok(handler)
  }

  /// Detaches handlers from the `(class, event)` pair.
  ///
  /// With a handler, removes every registration of that handler and reports
  /// whether any was found. Without one, drops the whole pair from both
  /// tables and reports whether it held anything.
  pub fn off(&self, class: &str, event: &str, handler: Option<&Handler>) -> bool {
    let class = normalize_class(class);
    let mut guard = self.tables.borrow_mut();
    let tables = &mut *guard;

    if !has_entry(&tables.exact, event, class) && !has_entry(&tables.wildcard, event, class) {
      return false;
    }

    let mut detached = take_registrations(&mut tables.exact, event, class, handler);
    detached.extend(take_registrations(
      &mut tables.wildcard,
      event,
      class,
      handler,
    ));
    let removed = handler.is_none() || !detached.is_empty();

    {
      let live = live_patterns(&tables.wildcard);
      self
        .patterns
        .borrow_mut()
        .retain(|pattern, _| live.contains(pattern.as_str()));
    }

    if removed {
      tracing::debug!(class = %class, event = %event, "detached handlers");
    }
    // Handlers may own values whose `Drop` uses this registry.
    drop(guard);
    drop(detached);
    removed
  }

  /// Removes every handler. Class declarations are kept.
  pub fn off_all(&self) {
    let detached = std::mem::take(&mut *self.tables.borrow_mut());
    self.patterns.borrow_mut().clear();
    tracing::debug!("detached all handlers");
    drop(detached);
  }

  /// Records a class or interface declaration, replacing any earlier one with
  /// the same name.
  pub fn declare(&self, decl: ClassDecl) {
    tracing::debug!(class = %decl.name(), parent = ?decl.parent(), "declared class");
    self.hierarchy.borrow_mut().declare(decl);
  }

  /// The ordered list of names a class answers to when routing events.
  pub fn ancestry(&self, class: &str) -> Vec<String> {
    self.hierarchy.borrow().ancestry(class)
  }

  pub(super) fn learn(&self, decl: ClassDecl) {
    self.hierarchy.borrow_mut().declare_if_absent(decl);
  }

  /// Returns the compiled pattern, compiling and caching it on first use.
  pub(super) fn pattern(&self, pattern: &str) -> Result<Rc<Wildcard>, PatternError> {
    if let Some(compiled) = self.patterns.borrow().get(pattern) {
      return Ok(compiled.clone());
    }
    let compiled = Rc::new(Wildcard::new(pattern)?);
    self
      .patterns
      .borrow_mut()
      .insert(pattern.to_owned(), compiled.clone());
    Ok(compiled)
  }

  /// Patterns are validated when registered, so a failure here means the
  /// pattern can never have been stored and is treated as a non-match.
  pub(super) fn matches(&self, pattern: &str, text: &str) -> bool {
    self
      .pattern(pattern)
      .map(|w| w.is_match(text))
      .unwrap_or(false)
  }
}

fn has_entry(table: &EventTable, event: &str, class: &str) -> bool {
  table
    .get(event)
    .and_then(|classes| classes.get(class))
    .is_some_and(|list| !list.is_empty())
}

// Takes the registrations for `(event, class)` out of `table`: all of them, or
// only those of `handler`. Emptied entries are pruned.
fn take_registrations(
  table: &mut EventTable,
  event: &str,
  class: &str,
  handler: Option<&Handler>,
) -> Vec<Registration> {
  let Some(classes) = table.get_mut(event) else {
    return Vec::new();
  };
  let Some(list) = classes.get_mut(class) else {
    return Vec::new();
  };

  let taken = match handler {
    None => std::mem::take(list),
    Some(handler) => {
      let (taken, kept): (Vec<Registration>, Vec<Registration>) = std::mem::take(list)
        .into_iter()
        .partition(|r| r.handler == *handler);
      *list = kept;
      taken
    }
  };

  if list.is_empty() {
    classes.shift_remove(class);
    if classes.is_empty() {
      table.shift_remove(event);
    }
  }
  taken
}

// Every event and class pattern still referenced by a wildcard registration.
fn live_patterns(table: &EventTable) -> HashSet<&str> {
  table
    .iter()
    .flat_map(|(event, classes)| {
      std::iter::once(event.as_str()).chain(classes.keys().map(String::as_str))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn noop() -> Handler {
    Handler::new(|_| Ok(()))
  }

  fn cached(events: &EventRegistry) -> Vec<String> {
    let mut patterns: Vec<String> = events.patterns.borrow().keys().cloned().collect();
    patterns.sort();
    patterns
  }

  #[test]
  fn detaching_prunes_unused_patterns() {
    let events = EventRegistry::new();
    let keep = noop();
    events.on("app::*", "save*", keep.clone(), None, true).unwrap();
    for i in 0..3 {
      let pattern = format!("job{}*", i);
      events.on("app::Queue", &pattern, noop(), None, true).unwrap();
      assert!(events.off("app::Queue", &pattern, None));
    }
    assert_eq!(cached(&events), vec!["app::*", "save*"]);

    // A pattern shared by another registration survives.
    let other = noop();
    events.on("app::*", "load*", other.clone(), None, true).unwrap();
    assert!(events.off("app::*", "load*", Some(&other)));
    assert_eq!(cached(&events), vec!["app::*", "save*"]);

    events.off_all();
    assert!(cached(&events).is_empty());
  }
}
