use fibre_hub::{resolve, Container};
use std::cell::Cell;
use std::rc::Rc;

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

fn main() {
  let next_id = Rc::new(Cell::new(0));
  let container = Container::new();

  // --- Singleton Registration ---
  // This constructor will only be called ONCE, on first read.
  let ids = next_id.clone();
  container
    .set_singleton("singleton_tracker", move |_| {
      println!("Creating SINGLETON RequestTracker...");
      ids.set(ids.get() + 1);
      Ok(RequestTracker { id: ids.get() })
    })
    .unwrap();

  // --- Factory Registration ---
  // This constructor will be called EVERY time the key is read.
  let ids = next_id.clone();
  container
    .set_factory("factory_tracker", move |_| {
      println!("Creating FACTORY RequestTracker...");
      ids.set(ids.get() + 1);
      Ok(RequestTracker { id: ids.get() })
    })
    .unwrap();

  println!("\n--- Resolving Singletons ---");
  let s1 = resolve!(container, RequestTracker, "singleton_tracker");
  let s2 = resolve!(container, RequestTracker, "singleton_tracker");
  println!("Singleton 1 ID: {}", s1.id);
  println!("Singleton 2 ID: {}", s2.id);
  assert!(Rc::ptr_eq(&s1, &s2));

  println!("\n--- Resolving Factories ---");
  let f1 = resolve!(container, RequestTracker, "factory_tracker");
  let f2 = resolve!(container, RequestTracker, "factory_tracker");
  println!("Factory 1 ID: {}", f1.id);
  println!("Factory 2 ID: {}", f2.id);
  assert_ne!(f1.id, f2.id);

  // A resolved singleton can no longer be replaced.
  let err = container
    .set_value("singleton_tracker", RequestTracker { id: 0 })
    .unwrap_err();
  println!("\nOverride rejected: {}", err);
  assert!(!container.is_frozen("factory_tracker"));
}
