use std::error::Error as StdError;

use thiserror::Error;

/// Errors raised by the service [`Container`](crate::Container).
#[derive(Debug, Error)]
pub enum ContainerError {
  #[error("Unknown service key: \"{0}\"")]
  UnknownKey(String),

  #[error("Cannot override frozen service \"{0}\"")]
  OverrideFrozen(String),

  #[error("Entry \"{0}\" is not invocable")]
  NotInvocable(String),

  #[error("Permission denied: \"{0}\" is protected")]
  PermissionDenied(String),

  #[error("Circular resolution detected while resolving \"{0}\"")]
  CircularResolution(String),

  #[error("Service \"{key}\" does not hold a value of type {expected}")]
  TypeMismatch { key: String, expected: &'static str },

  /// A service constructor or provider failed for its own reasons.
  #[error("Service construction failed: {0}")]
  Provider(#[source] Box<dyn StdError + 'static>),
}

impl ContainerError {
  /// Wraps an arbitrary error raised inside a service constructor.
  pub fn provider<E>(err: E) -> Self
  where
    E: Into<Box<dyn StdError + 'static>>,
  {
    ContainerError::Provider(err.into())
  }
}

/// Errors produced while compiling a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
  #[error("Unterminated character class in pattern \"{0}\"")]
  UnterminatedClass(String),

  #[error("Invalid pattern \"{pattern}\": {reason}")]
  Regex { pattern: String, reason: String },
}

/// The error type a handler returns to abort dispatch.
pub type HandlerError = Box<dyn StdError + 'static>;

/// Errors raised by the [`EventRegistry`](crate::EventRegistry).
#[derive(Debug, Error)]
pub enum EventError {
  #[error(transparent)]
  Pattern(#[from] PatternError),

  #[error("Handler for \"{event}\" on \"{class}\" failed: {source}")]
  Handler {
    event: String,
    class: String,
    #[source]
    source: HandlerError,
  },
}

/// Errors raised while locating or loading parameter files.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Parameter file not found: {0}")]
  NotFound(String),

  #[error("Failed to read parameter file: {0}")]
  Read(#[from] std::io::Error),

  #[error("Failed to parse parameters: {0}")]
  Parse(String),

  #[error("Unsupported parameter file format: {0}")]
  UnsupportedFormat(String),

  #[error(transparent)]
  Container(#[from] ContainerError),
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
