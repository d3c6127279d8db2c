//! Resource files consumed by `create` and `update` commands.
//!
//! A resource is a YAML (or JSON) document with `apiVersion`, `kind`,
//! `metadata` and `spec`. The headers are read first to pick the schema.

use crate::error::{CliError, CliResult};
use crate::models::{Canvas, CanvasMetadata, CanvasSpec, Secret, SecretMetadata, SecretSpec};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

pub const API_VERSION: &str = "v1";
pub const CANVAS_KIND: &str = "Canvas";
pub const SECRET_KIND: &str = "Secret";

/// Reads a resource file from disk.
pub fn read_resource_file(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| CliError::io("failed to read resource file", e))
}

/// Extracts `(apiVersion, kind)` from a resource document.
pub fn parse_resource_headers(raw: &[u8]) -> CliResult<(String, String)> {
    let document: Value = serde_yaml::from_slice(raw)
        .map_err(|e| CliError::validation(format!("failed to parse resource; {}", e)))?;

    let mapping = match document {
        Value::Mapping(mapping) => mapping,
        Value::Null => Default::default(),
        _ => {
            return Err(CliError::validation(
                "failed to parse resource; expected a mapping at the top level",
            ))
        }
    };

    let api_version = mapping
        .get("apiVersion")
        .and_then(Value::as_str)
        .ok_or_else(|| CliError::validation("failed to parse resource's api version"))?;

    let kind = mapping
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| CliError::validation("failed to parse resource's kind"))?;

    Ok((api_version.to_string(), kind.to_string()))
}

fn ensure_supported(raw: &[u8], expected_kind: &str) -> CliResult<()> {
    let (api_version, kind) = parse_resource_headers(raw)?;
    if api_version != API_VERSION {
        return Err(CliError::validation(format!(
            "unsupported apiVersion {:?}",
            api_version
        )));
    }
    if kind != expected_kind {
        return Err(CliError::validation(format!(
            "unsupported resource kind {:?}",
            kind
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasResource {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: CanvasMetadata,
    #[serde(default)]
    pub spec: CanvasSpec,
}

impl CanvasResource {
    pub fn parse(raw: &[u8]) -> CliResult<Self> {
        ensure_supported(raw, CANVAS_KIND)?;
        serde_yaml::from_slice(raw).map_err(|e| {
            CliError::validation(format!("failed to parse canvas resource: {}", e))
        })
    }

    /// Resource id, required by `update`.
    pub fn require_id(&self) -> CliResult<&str> {
        match self.metadata.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(CliError::validation(
                "canvas metadata.id is required for update",
            )),
        }
    }

    pub fn into_canvas(self) -> Canvas {
        Canvas {
            metadata: self.metadata,
            spec: self.spec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretResource {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: SecretMetadata,
    #[serde(default)]
    pub spec: SecretSpec,
}

impl SecretResource {
    pub fn parse(raw: &[u8]) -> CliResult<Self> {
        ensure_supported(raw, SECRET_KIND)?;
        serde_yaml::from_slice(raw).map_err(|e| {
            CliError::validation(format!("failed to parse secret resource: {}", e))
        })
    }

    /// Identifier used for `update`: `metadata.id`, falling back to `metadata.name`.
    pub fn update_target(&self) -> CliResult<String> {
        let id = self.metadata.id.as_deref().unwrap_or("").trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }

        let name = self.metadata.name.trim();
        if !name.is_empty() {
            return Ok(name.to_string());
        }

        Err(CliError::validation(
            "secret metadata.id or metadata.name is required for update",
        ))
    }

    pub fn into_secret(self) -> Secret {
        Secret {
            metadata: self.metadata,
            spec: self.spec,
        }
    }
}
