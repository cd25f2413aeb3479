use fibre_hub::{resolve, Container, ContainerError, Definition, ServiceProvider};
use std::rc::Rc;

// --- Abstraction and Implementations ---
trait MessageSender {
  fn send(&self, to: &str, message: &str) -> String;
}

struct EmailSender {
  from: String,
}

impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email from {} to {}: '{}'", self.from, to, message)
  }
}

struct SmsSender;

impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

// Groups the messaging services so an application registers them in one call.
struct MessagingProvider;

impl ServiceProvider for MessagingProvider {
  fn register(&self, container: &Container) -> Result<(), ContainerError> {
    container.set_value("mail.from", String::from("noreply@example.com"))?;
    container.set_singleton("sender.email", |c| {
      let from = c.get::<String>("mail.from")?;
      Ok(Rc::new(EmailSender {
        from: (*from).clone(),
      }) as Rc<dyn MessageSender>)
    })?;
    container.set_singleton("sender.sms", |_| Ok(Rc::new(SmsSender) as Rc<dyn MessageSender>))
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---
  // Overrides are applied after the provider has run.
  container
    .register(
      &MessagingProvider,
      [("mail.from", Definition::value(String::from("alerts@example.com")))],
    )
    .unwrap();

  // --- Decoration ---
  // Wrap the SMS sender's output without touching its constructor.
  struct Shouting(Rc<dyn MessageSender>);
  impl MessageSender for Shouting {
    fn send(&self, to: &str, message: &str) -> String {
      self.0.send(to, message).to_uppercase()
    }
  }
  container
    .extend("sender.sms", |inner: Rc<Rc<dyn MessageSender>>, _| {
      Ok(Rc::new(Shouting((*inner).clone())) as Rc<dyn MessageSender>)
    })
    .unwrap();

  // --- Resolution ---
  // The caller picks an implementation by key.
  let email = resolve!(container, Rc<dyn MessageSender>, "sender.email");
  let sms = resolve!(container, Rc<dyn MessageSender>, "sender.sms");

  println!("{}", email.send("user@example.com", "Your order has shipped!"));
  println!("{}", sms.send("+15551234", "Your code is 123456"));
}
