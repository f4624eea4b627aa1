//! In-memory YAML config document and idempotent key patches.
//!
//! A [`ConfigDocument`] is a mapping loaded from a service's config file.
//! [`PatchOperation`]s converge it toward a target shape: each one ensures a
//! dotted path exists and holds a value, creating intermediate mappings on the
//! way. Applying the same operation twice leaves the document untouched the
//! second time.
//!
//! Key order survives a load/save round-trip (serde_yaml mappings keep
//! insertion order), and so do quoted strings that YAML 1.1 readers would
//! otherwise reinterpret. Comments do not.

use crate::emit;
use crate::error::{PatchError, Result};
use serde_yaml::{Mapping, Value};
use std::io::ErrorKind;
use std::path::Path;

// ---------------------------------------------------------------------------
// PatchOperation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    segments: Vec<String>,
    value: Value,
}

impl PatchOperation {
    /// Build an operation from a dotted path such as `shared.metrics.enabled`.
    pub fn parse(dotted: &str, value: impl Into<Value>) -> Result<Self> {
        let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PatchError::InvalidPatchPath(dotted.to_string()));
        }
        Ok(Self {
            segments,
            value: value.into(),
        })
    }

    /// Shorthand for the common "flip this flag on" patch.
    pub fn enable(dotted: &str) -> Result<Self> {
        Self::parse(dotted, true)
    }

    pub fn path(&self) -> String {
        self.segments.join(".")
    }
}

// ---------------------------------------------------------------------------
// ConfigDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Mapping,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse `path`, mapping the usual failures to operator-facing errors.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::metadata(path)
            .and_then(|_| std::fs::read_to_string(path))
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PatchError::ConfigNotFound(path.to_path_buf()),
                // Also covers a parent directory that cannot be searched.
                ErrorKind::PermissionDenied => PatchError::PermissionDenied(path.to_path_buf()),
                _ => e.into(),
            })?;
        Self::parse(&data, path)
    }

    /// Parse YAML text. `origin` only labels errors.
    pub fn parse(data: &str, origin: &Path) -> Result<Self> {
        if data
            .lines()
            .map(str::trim)
            .all(|l| l.is_empty() || l.starts_with('#'))
        {
            return Ok(Self::new());
        }
        let value: Value =
            serde_yaml::from_str(data).map_err(|source| PatchError::InvalidConfig {
                path: origin.to_path_buf(),
                source,
            })?;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(root) => Ok(Self { root }),
            _ => Err(PatchError::NotAMapping(origin.to_path_buf())),
        }
    }

    /// Block-style YAML in insertion order.
    pub fn to_yaml_string(&self) -> Result<String> {
        emit::to_string(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.root.keys()
    }

    /// Look up a dotted path.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let mut segments = dotted.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }

    /// Ensure the operation's path holds its value. Returns `true` if anything changed.
    ///
    /// Missing or `null` intermediate nodes become empty mappings. Any other
    /// non-mapping intermediate is a conflict and the document is left as it was
    /// up to that node.
    pub fn apply(&mut self, op: &PatchOperation) -> Result<bool> {
        let Some((leaf, parents)) = op.segments.split_last() else {
            return Err(PatchError::InvalidPatchPath(op.path()));
        };

        let mut changed = false;
        let mut node = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = node
                .entry(Value::String(segment.clone()))
                .or_insert(Value::Null);
            if entry.is_null() {
                *entry = Value::Mapping(Mapping::new());
                changed = true;
            }
            node = match entry {
                Value::Mapping(child) => child,
                _ => {
                    return Err(PatchError::PatchConflict {
                        path: op.path(),
                        segment: parents[..=depth].join("."),
                    });
                }
            };
        }

        let key = Value::String(leaf.clone());
        if node.get(&key) == Some(&op.value) {
            return Ok(changed);
        }
        node.insert(key, op.value.clone());
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
