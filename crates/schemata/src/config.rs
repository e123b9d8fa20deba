//! Configuration types for Schemata compilation.
//!
//! This module provides configuration structures that control which
//! structures are emitted and how each backend names and formats its output.
//! All types implement [`serde::Deserialize`] for loading from external
//! sources such as TOML files.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`CompileConfig`] - Settings shared by all backends.
//! - [`MetadataConfig`] - Format name and version stamped into outputs.
//! - [`XsdConfig`] - XML Schema naming and indentation.
//! - [`JsonSchemaConfig`] - JSON Schema identity and strictness.
//!
//! # Example
//!
//! ```
//! # use schemata::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert!(config.compile().prune_unreachable());
//! assert_eq!(config.xsd().type_prefix(), "__type__");
//! ```

use serde::Deserialize;

/// Top-level configuration combining every section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Settings shared by all backends.
    #[serde(default)]
    compile: CompileConfig,

    /// Format metadata section.
    #[serde(default)]
    metadata: MetadataConfig,

    /// XML Schema backend section.
    #[serde(default)]
    xsd: XsdConfig,

    /// JSON Schema backend section.
    #[serde(default)]
    json_schema: JsonSchemaConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        compile: CompileConfig,
        metadata: MetadataConfig,
        xsd: XsdConfig,
        json_schema: JsonSchemaConfig,
    ) -> Self {
        Self {
            compile,
            metadata,
            xsd,
            json_schema,
        }
    }

    /// Returns the compile configuration.
    pub fn compile(&self) -> &CompileConfig {
        &self.compile
    }

    /// Returns the metadata configuration.
    pub fn metadata(&self) -> &MetadataConfig {
        &self.metadata
    }

    /// Returns the XML Schema configuration.
    pub fn xsd(&self) -> &XsdConfig {
        &self.xsd
    }

    /// Returns the JSON Schema configuration.
    pub fn json_schema(&self) -> &JsonSchemaConfig {
        &self.json_schema
    }
}

/// Settings shared by all backends.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Emit only structures reachable from a root when roots exist.
    prune_unreachable: bool,
}

impl CompileConfig {
    pub fn new(prune_unreachable: bool) -> Self {
        Self { prune_unreachable }
    }

    /// Returns `true` if unreachable structures are left out of outputs.
    pub fn prune_unreachable(&self) -> bool {
        self.prune_unreachable
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            prune_unreachable: true,
        }
    }
}

/// Format metadata stamped into generated artifacts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Human-readable name of the described format.
    format_name: Option<String>,

    /// Version of the described format.
    version: Option<String>,
}

impl MetadataConfig {
    pub fn new(format_name: Option<String>, version: Option<String>) -> Self {
        Self {
            format_name,
            version,
        }
    }

    pub fn format_name(&self) -> Option<&str> {
        self.format_name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns `"<format> (<version>)"`, or just the format name when no
    /// version is set.
    ///
    /// Returns `None` when no format name is configured.
    pub fn title(&self) -> Option<String> {
        self.title_for(None)
    }

    /// Like [`title`](Self::title), but falls back to `schema_format_name`,
    /// the `Format Name:` of the schema's header comment.
    ///
    /// A configured format name always wins.
    pub fn title_for(&self, schema_format_name: Option<&str>) -> Option<String> {
        let format_name = self.format_name().or(schema_format_name)?;
        Some(match self.version() {
            Some(version) => format!("{format_name} ({version})"),
            None => format_name.to_string(),
        })
    }
}

/// Naming and formatting options for the XML Schema backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct XsdConfig {
    /// Prefix of every generated type name.
    type_prefix: String,

    /// Spaces per indentation level.
    indent: usize,
}

impl XsdConfig {
    pub fn new(type_prefix: impl Into<String>, indent: usize) -> Self {
        Self {
            type_prefix: type_prefix.into(),
            indent,
        }
    }

    pub fn type_prefix(&self) -> &str {
        &self.type_prefix
    }

    pub fn indent(&self) -> usize {
        self.indent
    }
}

impl Default for XsdConfig {
    fn default() -> Self {
        Self {
            type_prefix: "__type__".to_string(),
            indent: 4,
        }
    }
}

/// Identity and strictness options for the JSON Schema backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonSchemaConfig {
    /// Value of the top-level `$id` keyword.
    id: Option<String>,

    /// Whether objects accept properties that are not declared.
    additional_properties: bool,
}

impl JsonSchemaConfig {
    pub fn new(id: Option<String>, additional_properties: bool) -> Self {
        Self {
            id,
            additional_properties,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn additional_properties(&self) -> bool {
        self.additional_properties
    }
}
