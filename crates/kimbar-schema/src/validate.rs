//! # Schema Validation
//!
//! Runtime validation of JSON documents against JSON Schema definitions
//! (Draft 2020-12).
//!
//! ## Schema Resolution
//!
//! Schemas may declare `$id` URIs of the form
//! `https://schemas.kimbar.dev/content/<filename>`. Cross-schema `$ref`s
//! using that prefix, the schema's own `$id`, or a bare filename all
//! resolve to the locally loaded file.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;
use thiserror::Error;

/// URI prefix used by `$id`/`$ref` in content schemas.
const SCHEMA_URI_PREFIX: &str = "https://schemas.kimbar.dev/content/";

/// File suffix that marks a schema in the schema directory.
const SCHEMA_SUFFIX: &str = ".schema.json";

/// Resolves `$ref` URIs against the loaded schema set without touching
/// the network.
struct LocalSchemaRetriever {
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self
            .schemas_by_uri
            .get(&format!("{SCHEMA_URI_PREFIX}{filename}"))
            .or_else(|| self.schemas_by_uri.get(filename))
        {
            return Ok(value.clone());
        }

        // Metaschemas and anything else unresolved accept everything.
        Ok(serde_json::json!({}))
    }
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The schema file could not be loaded.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// IO error reading the schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A schema validator backed by the `jsonschema` crate.
///
/// Loads every `*.schema.json` file in a directory at construction time
/// and compiles one validator per schema, with all the others registered
/// for `$ref` resolution.
pub struct SchemaValidator {
    schema_dir: PathBuf,
    schemas: HashMap<String, Value>,
    compiled: HashMap<String, Validator>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_dir", &self.schema_dir)
            .field("schemas", &self.schema_names())
            .finish()
    }
}

impl SchemaValidator {
    /// Load and compile every schema in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::SchemaLoadError` if the directory or
    /// any schema file cannot be read or parsed, and
    /// `SchemaValidationError::ValidatorBuildError` if a schema does not
    /// compile.
    pub fn new(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = HashMap::new();

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_dir.display().to_string(),
                reason: format!("cannot read schema directory: {e}"),
            }
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(SCHEMA_SUFFIX) {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&content).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    schema_name: name.to_string(),
                    reason: format!("invalid JSON: {e}"),
                }
            })?;
            schemas.insert(name.to_string(), value);
        }

        Self::from_schemas(schema_dir, schemas)
    }

    fn from_schemas(
        schema_dir: PathBuf,
        schemas: HashMap<String, Value>,
    ) -> Result<Self, SchemaValidationError> {
        let mut validator = Self {
            schema_dir,
            schemas,
            compiled: HashMap::new(),
        };
        let mut compiled = HashMap::new();
        for name in validator.schema_names() {
            compiled.insert(name.to_string(), validator.build_validator(name)?);
        }
        validator.compiled = compiled;
        tracing::debug!(
            schema_dir = %validator.schema_dir.display(),
            count = validator.compiled.len(),
            "compiled content schemas"
        );
        Ok(validator)
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Returns the filenames of all loaded schemas, sorted alphabetically.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Whether a schema is registered for `kind` (`<kind>.schema.json`).
    pub fn has_schema(&self, kind: &str) -> bool {
        self.schemas.contains_key(&schema_file_name(kind))
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);

        let mut schemas_by_uri: HashMap<String, Value> = HashMap::new();
        for (filename, value) in &self.schemas {
            schemas_by_uri.insert(format!("{SCHEMA_URI_PREFIX}{filename}"), value.clone());
            if let Some(id_str) = value.get("$id").and_then(|v| v.as_str()) {
                schemas_by_uri.insert(id_str.to_string(), value.clone());
            }
            schemas_by_uri.insert(filename.clone(), value.clone());
        }

        opts.with_retriever(LocalSchemaRetriever { schemas_by_uri });
        opts
    }

    fn build_validator(&self, schema_name: &str) -> Result<Validator, SchemaValidationError> {
        let schema_value = self.schemas.get(schema_name).ok_or_else(|| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_name.to_string(),
                reason: format!("schema not found in {}", self.schema_dir.display()),
            }
        })?;

        self.build_options().build(schema_value).map_err(|e| {
            SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Validate a parsed JSON value against the schema registered for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::SchemaLoadError` if no schema is
    /// registered for `kind`, and `SchemaValidationError::ValidationFailed`
    /// with structured violation details if the document is invalid.
    pub fn validate_document(&self, instance: &Value, kind: &str) -> Result<(), SchemaValidationError> {
        let schema_name = schema_file_name(kind);
        let validator = self.compiled.get(&schema_name).ok_or_else(|| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_name.clone(),
                reason: format!("schema not found in {}", self.schema_dir.display()),
            }
        })?;

        let errors: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name,
                violations: ValidationViolations { violations: errors },
            })
        }
    }
}

fn schema_file_name(kind: &str) -> String {
    format!("{kind}{SCHEMA_SUFFIX}")
}
