use fibre_hub::{Container, ContainerError, Definition};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::{Rc, Weak};

// --- Test Fixtures ---

#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

fn counting_container() -> (Container, Rc<Cell<u32>>) {
  let calls = Rc::new(Cell::new(0));
  (Container::new(), calls)
}

// --- Basic Tests ---

#[test]
fn test_plain_value_is_returned_as_is() {
  let container = Container::new();
  container.set_value("answer", 42u32).unwrap();

  assert_eq!(*container.get::<u32>("answer").unwrap(), 42);
  assert!(container.has("answer"));
  assert!(!container.is_frozen("answer"));
}

#[test]
fn test_singleton_invoked_exactly_once() {
  let (container, calls) = counting_container();
  let counter = calls.clone();
  container
    .set_singleton("service", move |_| {
      counter.set(counter.get() + 1);
      Ok(SimpleService { id: 101 })
    })
    .unwrap();

  // Registration alone never invokes.
  assert_eq!(calls.get(), 0);

  let r1 = container.get::<SimpleService>("service").unwrap();
  let r2 = container.get::<SimpleService>("service").unwrap();
  let r3 = container.get::<SimpleService>("service").unwrap();

  assert_eq!(r1.id, 101);
  assert_eq!(calls.get(), 1);
  assert!(Rc::ptr_eq(&r1, &r2));
  assert!(Rc::ptr_eq(&r2, &r3));
  assert!(container.is_frozen("service"));
}

#[test]
fn test_raw_returns_original_callable_after_resolution() {
  let container = Container::new();
  let definition = Definition::singleton(|_| Ok(SimpleService { id: 7 }));
  let original = definition.callable().cloned().unwrap();
  container.set("service", definition).unwrap();

  // Before resolution the raw form is the stored definition.
  let before = container.raw("service").unwrap();
  assert!(Rc::ptr_eq(before.callable().unwrap(), &original));

  container.get::<SimpleService>("service").unwrap();

  let after = container.raw("service").unwrap();
  assert!(matches!(after, Definition::Singleton(_)));
  assert!(Rc::ptr_eq(after.callable().unwrap(), &original));
}

#[test]
fn test_factory_invoked_on_every_read() {
  let (container, calls) = counting_container();
  let counter = calls.clone();
  let definition = container.factory(move |_| {
    counter.set(counter.get() + 1);
    Ok(SimpleService { id: counter.get() })
  });
  container.set("factory", definition).unwrap();

  let r1 = container.get::<SimpleService>("factory").unwrap();
  let r2 = container.get::<SimpleService>("factory").unwrap();
  for _ in 0..3 {
    container.get::<SimpleService>("factory").unwrap();
  }

  assert_eq!(calls.get(), 5);
  assert_eq!(r1.id, 1);
  assert_eq!(r2.id, 2);
  assert!(!Rc::ptr_eq(&r1, &r2));
  // Factories never freeze their key.
  assert!(!container.is_frozen("factory"));
  container.set_value("factory", 0u8).unwrap();
}

#[test]
fn test_protected_callable_is_never_invoked() {
  type Doubler = Rc<dyn Fn(u32) -> u32>;

  let (container, calls) = counting_container();
  let counter = calls.clone();
  let doubler: Doubler = Rc::new(move |x: u32| {
    counter.set(counter.get() + 1);
    x * 2
  });
  let definition = container.protect(doubler.clone());
  container.set("double", definition).unwrap();

  let got = container.get::<Doubler>("double").unwrap();
  assert_eq!(calls.get(), 0);
  assert!(Rc::ptr_eq(&*got, &doubler));

  // The caller is free to invoke what it got back.
  assert_eq!((**got)(21), 42);
  assert_eq!(calls.get(), 1);
  assert!(!container.is_frozen("double"));
}

#[test]
fn test_set_before_resolution_overwrites_freely() {
  let container = Container::new();
  container.set_singleton("svc", |_| Ok(SimpleService { id: 1 })).unwrap();
  container.set_singleton("svc", |_| Ok(SimpleService { id: 2 })).unwrap();
  container.set_value("svc", SimpleService { id: 3 }).unwrap();

  assert_eq!(container.get::<SimpleService>("svc").unwrap().id, 3);
}

#[test]
fn test_set_after_resolution_is_rejected() {
  let container = Container::new();
  container.set_singleton("svc", |_| Ok(SimpleService { id: 1 })).unwrap();
  container.get::<SimpleService>("svc").unwrap();

  let err = container.set_value("svc", SimpleService { id: 2 }).unwrap_err();
  assert!(matches!(err, ContainerError::OverrideFrozen(ref key) if key == "svc"));
  assert_eq!(container.get::<SimpleService>("svc").unwrap().id, 1);
}

#[test]
fn test_unknown_key() {
  let container = Container::new();
  assert!(matches!(
    container.get::<u32>("missing"),
    Err(ContainerError::UnknownKey(ref key)) if key == "missing"
  ));
  assert!(matches!(
    container.raw("missing"),
    Err(ContainerError::UnknownKey(_))
  ));
  assert!(!container.has("missing"));
}

#[test]
fn test_type_mismatch() {
  let container = Container::new();
  container.set_value("port", 8080u16).unwrap();

  let err = container.get::<String>("port").unwrap_err();
  assert!(matches!(err, ContainerError::TypeMismatch { ref key, .. } if key == "port"));
}

#[test]
fn test_remove_clears_all_state() {
  let container = Container::new();
  container.set_singleton("svc", |_| Ok(SimpleService { id: 1 })).unwrap();
  container.get::<SimpleService>("svc").unwrap();
  assert!(container.is_frozen("svc"));

  container.remove("svc");
  assert!(!container.has("svc"));
  assert!(!container.is_frozen("svc"));
  assert!(matches!(
    container.get::<SimpleService>("svc"),
    Err(ContainerError::UnknownKey(_))
  ));

  // The key comes back as a fresh, writable entry.
  container.set_value("svc", SimpleService { id: 9 }).unwrap();
  container.set_value("svc", SimpleService { id: 10 }).unwrap();
  assert_eq!(container.get::<SimpleService>("svc").unwrap().id, 10);

  // Removing an absent key is a no-op.
  container.remove("never-there");
}

#[test]
fn test_remove_then_reregister_singleton_resolves_again() {
  let (container, calls) = counting_container();
  for _ in 0..2 {
    let counter = calls.clone();
    container
      .set_singleton("svc", move |_| {
        counter.set(counter.get() + 1);
        Ok(())
      })
      .unwrap();
    container.get::<()>("svc").unwrap();
    container.get::<()>("svc").unwrap();
    container.remove("svc");
  }
  assert_eq!(calls.get(), 2);
}

#[test]
fn test_keys_in_storage_order() {
  let container = Container::with_items([
    ("b", Definition::value(1u8)),
    ("a", Definition::value(2u8)),
  ]);
  container.set_value("c", 3u8).unwrap();
  container.set_value("b", 4u8).unwrap();
  container.remove("a");

  assert_eq!(container.keys(), vec!["b".to_string(), "c".to_string()]);
  assert_eq!(container.len(), 2);
  assert_eq!(*container.get::<u8>("b").unwrap(), 4);
}

#[test]
fn test_has_ignores_resolution_state() {
  let container = Container::new();
  container.set_singleton("lazy", |_| Ok(1u8)).unwrap();
  assert!(container.has("lazy"));
  container.get::<u8>("lazy").unwrap();
  assert!(container.has("lazy"));
}

#[test]
fn test_dotted_keys_are_opaque() {
  let container = Container::new();
  container.set_value("db.host", String::from("localhost")).unwrap();

  assert!(container.has("db.host"));
  assert!(!container.has("db"));
  assert_eq!(container.keys(), vec!["db.host".to_string()]);
}

#[test]
fn test_trait_objects_via_get_cloned() {
  trait Greeter {
    fn greet(&self) -> String;
  }
  struct English;
  impl Greeter for English {
    fn greet(&self) -> String {
      "Hello!".to_string()
    }
  }

  let container = Container::new();
  container
    .set_singleton("greeter", |_| Ok(Rc::new(English) as Rc<dyn Greeter>))
    .unwrap();

  let greeter = container.get_cloned::<Rc<dyn Greeter>>("greeter").unwrap();
  assert_eq!(greeter.greet(), "Hello!");
}

// A value that looks back into its container when dropped.
struct BackReference {
  container: Weak<Container>,
  saw_key: Rc<Cell<Option<bool>>>,
}

impl Drop for BackReference {
  fn drop(&mut self) {
    if let Some(container) = self.container.upgrade() {
      self.saw_key.set(Some(container.has("x")));
    }
  }
}

#[test]
fn test_replaced_and_removed_values_may_use_the_container_when_dropped() {
  let container = Rc::new(Container::new());
  let saw_key = Rc::new(Cell::new(None));
  let back_reference = || BackReference {
    container: Rc::downgrade(&container),
    saw_key: saw_key.clone(),
  };

  container.set_value("x", back_reference()).unwrap();
  container.set_value("x", 1u8).unwrap();
  // The old value was dropped after the new one was in place.
  assert_eq!(saw_key.get(), Some(true));

  container.set_value("x", back_reference()).unwrap();
  saw_key.set(None);
  container.remove("x");
  assert_eq!(saw_key.get(), Some(false));
}
