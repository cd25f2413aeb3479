//! Public macros for ergonomic service resolution.

/// Resolves a typed service from a container, panicking if it cannot.
///
/// This is meant for wiring code where a missing or mistyped service is a
/// programming error. For a non-panicking version, use [`maybe_resolve!`] or
/// `container.get::<T>(key)` directly.
///
/// # Panics
///
/// Panics with the underlying [`ContainerError`](crate::ContainerError) if the
/// key is unknown, the value has a different type, or its constructor fails.
///
/// # Examples
///
/// ```
/// use fibre_hub::{resolve, Container};
///
/// let container = Container::new();
/// container.set_singleton("greeting", |_| Ok(String::from("hello"))).unwrap();
///
/// let message = resolve!(container, String, "greeting");
/// assert_eq!(*message, "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  ($container:expr, $type:ty, $key:expr) => {
    $container.get::<$type>($key).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required service '{}' as {}: {}",
        $key,
        std::any::type_name::<$type>(),
        e
      )
    })
  };
}

/// Resolves a typed service from a container, returning `None` on any failure.
///
/// ```
/// use fibre_hub::{maybe_resolve, Container};
///
/// let container = Container::new();
/// container.set_value("port", 8080u16).unwrap();
///
/// assert_eq!(maybe_resolve!(container, u16, "port").map(|p| *p), Some(8080));
/// assert!(maybe_resolve!(container, u16, "missing").is_none());
/// assert!(maybe_resolve!(container, String, "port").is_none());
/// ```
#[macro_export]
macro_rules! maybe_resolve {
  ($container:expr, $type:ty, $key:expr) => {
    $container.get::<$type>($key).ok()
  };
}
