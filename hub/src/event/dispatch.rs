//! Handler selection and invocation.

use super::registry::{ClassTable, EventRegistry, Registration};
use super::{normalize_class, Event, SenderId, Target};
use crate::error::EventError;

use indexmap::IndexMap;

impl EventRegistry {
  /// Fires `name` for `target`.
  ///
  /// Handlers run in this order: for each name in the target class's
  /// ancestry, first the wildcard registrations whose class pattern matches
  /// it (each pattern fires at most once per trigger), then the exact
  /// registrations for that name. Dispatch stops as soon as a handler sets
  /// `event.handled`, and aborts with the error of the first failing handler.
  ///
  /// When nothing is registered for `name`, this returns immediately without
  /// touching `event`.
  pub fn trigger<'a>(
    &self,
    target: impl Into<Target<'a>>,
    name: &str,
    event: Option<&mut Event>,
  ) -> Result<(), EventError> {
    let target = target.into();
    let (mut pool, exact) = self.snapshot(name);
    if exact.is_none() && pool.is_empty() {
      return Ok(());
    }

    let mut local = Event::default();
    let event = match event {
      Some(event) => event,
      None => &mut local,
    };
    event.handled = false;
    event.name = name.to_owned();

    if let Target::Instance(component) = target {
      if event.sender.is_none() {
        event.sender = Some(SenderId::of(component));
      }
    }
    let class = self.resolve_class(target);

    for ancestor in self.ancestry(&class) {
      let mut batch: Vec<Registration> = Vec::new();

      let matched: Vec<String> = pool
        .keys()
        .filter(|class_pattern| self.matches(class_pattern, &ancestor))
        .cloned()
        .collect();
      for class_pattern in matched {
        if let Some(registrations) = pool.shift_remove(&class_pattern) {
          batch.extend(registrations);
        }
      }
      if let Some(registrations) = exact.as_ref().and_then(|t| t.get(&ancestor)) {
        batch.extend(registrations.iter().cloned());
      }

      for registration in batch {
        event.data = registration.data.clone();
        tracing::trace!(event = %name, class = %ancestor, "invoking handler");
        registration
          .handler
          .call(event)
          .map_err(|source| EventError::Handler {
            event: name.to_owned(),
            class: ancestor.clone(),
            source,
          })?;
        if event.handled {
          tracing::trace!(event = %name, class = %ancestor, "event handled");
          return Ok(());
        }
      }
    }
    Ok(())
  }

  /// True if triggering `name` for `target` would run at least one handler.
  pub fn has_handlers<'a>(&self, target: impl Into<Target<'a>>, name: &str) -> bool {
    let class = self.resolve_class(target.into());
    let tables = self.tables.borrow();
    if tables.wildcard.is_empty() && !tables.exact.contains_key(name) {
      return false;
    }

    let ancestry = self.ancestry(&class);
    if let Some(classes) = tables.exact.get(name) {
      let found = ancestry
        .iter()
        .any(|c| classes.get(c).is_some_and(|list| !list.is_empty()));
      if found {
        return true;
      }
    }

    tables
      .wildcard
      .iter()
      .filter(|(event_pattern, _)| self.matches(event_pattern, name))
      .flat_map(|(_, classes)| classes.iter())
      .filter(|(_, list)| !list.is_empty())
      .any(|(class_pattern, _)| ancestry.iter().any(|c| self.matches(class_pattern, c)))
  }

  /// The class name a target fires as. Instances teach the registry their
  /// declaration on first use.
  fn resolve_class(&self, target: Target<'_>) -> String {
    match target {
      Target::Class(class) => normalize_class(class).to_owned(),
      Target::Instance(component) => {
        if let Some(decl) = component.class_decl() {
          self.learn(decl);
        }
        normalize_class(component.class_name()).to_owned()
      }
    }
  }

  /// Copies out the handlers that could run for `name`: the wildcard pool,
  /// merged by class pattern, and the exact class table.
  fn snapshot(&self, name: &str) -> (ClassTable, Option<ClassTable>) {
    let tables = self.tables.borrow();

    let mut pool: ClassTable = IndexMap::new();
    for (event_pattern, classes) in &tables.wildcard {
      if !self.matches(event_pattern, name) {
        continue;
      }
      for (class_pattern, registrations) in classes {
        pool
          .entry(class_pattern.clone())
          .or_default()
          .extend(registrations.iter().cloned());
      }
    }

    (pool, tables.exact.get(name).cloned())
  }
}
