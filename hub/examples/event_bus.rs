use fibre_hub::{ClassDecl, Component, Event, EventRegistry, Target};

struct User {
  name: String,
}

impl Component for User {
  fn class_name(&self) -> &str {
    "app::User"
  }

  fn class_decl(&self) -> Option<ClassDecl> {
    Some(ClassDecl::class("app::User").extends("app::Model"))
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let events = EventRegistry::new();
  events.declare(ClassDecl::class("app::Model").implements("app::Auditable"));

  // Every model logs its saves.
  events.subscribe("app::Model", "afterSave", |event: &mut Event| {
    println!("[model] saved ({})", event.name);
    Ok(())
  })?;

  // Auditing covers every `after*` event of every class under `app::`.
  events.subscribe("app::*", "after*", |event: &mut Event| {
    println!("[audit] {}", event.name);
    Ok(())
  })?;

  // A user-specific handler that stops the chain for deletes.
  events.subscribe("app::User", "afterDelete", |event: &mut Event| {
    if let Some(name) = event.params::<String>() {
      println!("[user] {} deleted, nothing else needs to know", name);
    }
    event.handled = true;
    Ok(())
  })?;

  let user = User {
    name: "ada".to_string(),
  };

  println!("--- afterSave ---");
  events.trigger(Target::instance(&user), "afterSave", None)?;

  println!("\n--- afterDelete ---");
  let mut event = Event::with_params(user.name.clone());
  events.trigger(Target::instance(&user), "afterDelete", Some(&mut event))?;
  assert!(event.handled);

  println!("\n--- beforeSave ---");
  assert!(!events.has_handlers(Target::instance(&user), "beforeSave"));
  println!("no handlers for beforeSave");
  Ok(())
}
