//! Parameter files: plain configuration values loaded into a container.
//!
//! A parameter file is a YAML or JSON document whose nested mappings become
//! dotted keys, so
//!
//! ```yaml
//! db:
//!   host: localhost
//!   port: 5432
//! ```
//!
//! yields the entries `db.host` and `db.port`. Each leaf is stored in the
//! container as a plain `serde_json::Value`.

use crate::container::Container;
use crate::core::Definition;
use crate::error::ConfigError;
use crate::store::KeyStore;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PARAMETERS_BASE_NAME: &str = "fibre_hub";
const DEFAULT_PARAMETERS_EXTENSION: &str = "yaml";

/// Finds the parameter file based on common patterns and an optional
/// environment suffix.
///
/// Looks in the working directory for `fibre_hub.<env>.yaml`, then
/// `fibre_hub.yaml`. The environment comes from `environment_suffix`, else
/// `FIBRE_ENV`, else `APP_ENV`.
pub fn find_parameter_file(environment_suffix: Option<&str>) -> Result<PathBuf, ConfigError> {
  find_parameter_file_in(Path::new("."), environment_suffix)
}

/// Same as [`find_parameter_file`], searching `dir` instead of the working
/// directory.
pub fn find_parameter_file_in(
  dir: &Path,
  environment_suffix: Option<&str>,
) -> Result<PathBuf, ConfigError> {
  let base_name = DEFAULT_PARAMETERS_BASE_NAME;
  let extension = DEFAULT_PARAMETERS_EXTENSION;

  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("FIBRE_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{}.{}.{}", base_name, env_str, extension));
    }
  }
  files_to_check.push(format!("{}.{}", base_name, extension));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(ConfigError::NotFound(format!(
    "searched {} for {}",
    dir.display(),
    files_to_check.join(", ")
  )))
}

/// A tree of configuration values addressed by dotted paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
  store: KeyStore<JsonValue>,
}

impl Parameters {
  pub fn new() -> Self {
    Self::default()
  }

  /// Loads a `.yaml`/`.yml` or `.json` file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let parameters = match path.extension().and_then(|e| e.to_str()) {
      Some("yaml") | Some("yml") => Self::from_yaml_str(&contents)?,
      Some("json") => Self::from_json_str(&contents)?,
      other => {
        return Err(ConfigError::UnsupportedFormat(
          other.unwrap_or("<none>").to_owned(),
        ))
      }
    };
    tracing::debug!(path = %path.display(), count = parameters.len(), "loaded parameters");
    Ok(parameters)
  }

  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    let document: JsonValue =
      serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Self::from_document(document)
  }

  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    let document: JsonValue =
      serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Self::from_document(document)
  }

  /// Builds parameters from a document whose root is a mapping. An empty
  /// document (`null`) gives empty parameters.
  pub fn from_document(document: JsonValue) -> Result<Self, ConfigError> {
    let mut parameters = Self::new();
    match document {
      JsonValue::Null => {}
      JsonValue::Object(map) => {
        for (key, value) in map {
          parameters.insert_tree(&key, value);
        }
      }
      other => {
        return Err(ConfigError::Parse(format!(
          "expected a mapping at the document root, found {}",
          json_kind(&other)
        )))
      }
    }
    Ok(parameters)
  }

  fn insert_tree(&mut self, path: &str, value: JsonValue) {
    match value {
      JsonValue::Object(map) if !map.is_empty() => {
        for (key, child) in map {
          self.insert_tree(&format!("{}.{}", path, key), child);
        }
      }
      leaf => self.store.set_path(path, leaf),
    }
  }

  /// Sets a single value, creating intermediate levels.
  pub fn set(&mut self, path: &str, value: JsonValue) {
    self.store.set_path(path, value);
  }

  pub fn get_raw(&self, path: &str) -> Option<&JsonValue> {
    self.store.get_path(path)
  }

  /// Deserializes the value at `path` into `T`.
  pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
    self
      .store
      .get_path(path)
      .map(|v| {
        serde_json::from_value(v.clone())
          .map_err(|e| ConfigError::Parse(format!("parameter '{}': {}", path, e)))
      })
      .transpose()
  }

  pub fn contains(&self, path: &str) -> bool {
    self.store.has_path(path)
  }

  pub fn remove(&mut self, path: &str) {
    self.store.remove_path(path);
  }

  /// Flattened `(dotted.key, value)` pairs in document order.
  pub fn entries(&self) -> Vec<(String, &JsonValue)> {
    self.store.leaves()
  }

  pub fn len(&self) -> usize {
    self.store.leaves().len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.is_empty()
  }
}

fn json_kind(value: &JsonValue) -> &'static str {
  match value {
    JsonValue::Null => "null",
    JsonValue::Bool(_) => "a boolean",
    JsonValue::Number(_) => "a number",
    JsonValue::String(_) => "a string",
    JsonValue::Array(_) => "a sequence",
    JsonValue::Object(_) => "a mapping",
  }
}

impl Container {
  /// Stores every parameter as a plain `serde_json::Value` under its dotted
  /// key. Stops at the first key that is already frozen.
  pub fn load_parameters(&self, parameters: &Parameters) -> Result<(), ConfigError> {
    for (key, value) in parameters.entries() {
      self.set(key, Definition::value(value.clone()))?;
    }
    tracing::debug!(count = parameters.len(), "applied parameters");
    Ok(())
  }
}
