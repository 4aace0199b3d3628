//! Compose file parser

use super::config::Manifest;
use super::field::{self, Build, Command, External};
use crate::error::{ComposeDotError, Result};
use serde_yaml::Value;
use std::fmt;
use std::path::Path;

/// A field, or one entry of a list field, that matched none of its accepted
/// shapes and was dropped from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Entity kind: `service`, `network`, `volume`, or `manifest`
    pub kind: &'static str,
    /// Entity name (empty for top-level fields)
    pub name: String,
    /// Offending field
    pub field: &'static str,
    /// Position of the skipped entry when only part of a list was dropped
    pub entry: Option<usize>,
}

impl Warning {
    fn new(kind: &'static str, name: &str, field: &'static str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            field,
            entry: None,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}: ", self.kind)?;
        } else {
            write!(f, "{} '{}': ", self.kind, self.name)?;
        }
        match self.entry {
            Some(entry) => write!(f, "unrecognized entry {} of '{}', skipped", entry, self.field),
            None => write!(f, "unrecognized '{}' value, ignored", self.field),
        }
    }
}

/// How much of a field value the decoders keep
#[derive(Debug, PartialEq, Eq)]
enum Shape {
    Accepted,
    Unrecognized,
    /// A list whose entries at these positions are dropped
    Partial(Vec<usize>),
}

impl Shape {
    fn of(accepted: bool) -> Self {
        if accepted {
            Shape::Accepted
        } else {
            Shape::Unrecognized
        }
    }
}

type ShapeCheck = fn(&Value) -> Shape;

const MANIFEST_FIELDS: &[(&str, ShapeCheck)] = &[
    ("version", text_shape),
    ("networks", mapping_shape),
    ("volumes", mapping_shape),
    ("services", mapping_shape),
];

const NETWORK_FIELDS: &[(&str, ShapeCheck)] = &[
    ("driver", text_shape),
    ("driver_opts", string_map_shape),
    ("external", external_shape),
    ("name", text_shape),
];

const VOLUME_FIELDS: &[(&str, ShapeCheck)] = &[
    ("driver", text_shape),
    ("driver_opts", string_map_shape),
    ("external", external_shape),
];

const SERVICE_FIELDS: &[(&str, ShapeCheck)] = &[
    ("container_name", text_shape),
    ("image", text_shape),
    ("networks", name_list_shape),
    ("ports", port_list_shape),
    ("volumes", mount_list_shape),
    ("command", command_shape),
    ("volumes_from", string_list_shape),
    ("depends_on", name_list_shape),
    ("cap_add", string_list_shape),
    ("build", build_shape),
    ("environment", string_map_shape),
];

fn text_shape(v: &Value) -> Shape {
    Shape::of(field::text(v).is_some())
}

fn mapping_shape(v: &Value) -> Shape {
    Shape::of(field::untag(v).is_mapping())
}

fn list_shape(v: &Value, decode: field::EntryDecoder) -> Shape {
    if !field::untag(v).is_sequence() {
        return Shape::Unrecognized;
    }
    let rejected = field::rejected_entries(v, decode);
    if rejected.is_empty() {
        Shape::Accepted
    } else {
        Shape::Partial(rejected)
    }
}

fn string_list_shape(v: &Value) -> Shape {
    list_shape(v, field::text)
}

fn name_list_shape(v: &Value) -> Shape {
    if field::untag(v).is_mapping() {
        return Shape::Accepted;
    }
    list_shape(v, field::text)
}

fn port_list_shape(v: &Value) -> Shape {
    list_shape(v, field::port_entry)
}

fn mount_list_shape(v: &Value) -> Shape {
    list_shape(v, field::mount_entry)
}

fn string_map_shape(v: &Value) -> Shape {
    if field::string_map(v).is_none() {
        return Shape::Unrecognized;
    }
    let rejected = field::rejected_map_entries(v);
    if rejected.is_empty() {
        Shape::Accepted
    } else {
        Shape::Partial(rejected)
    }
}

fn command_shape(v: &Value) -> Shape {
    Shape::of(Command::decode(v).is_some())
}

fn build_shape(v: &Value) -> Shape {
    Shape::of(Build::decode(v).is_some())
}

fn external_shape(v: &Value) -> Shape {
    Shape::of(External::decode(v).is_some())
}

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Parse compose file from path
    pub fn parse_file(path: &Path) -> Result<(Manifest, Vec<Warning>)> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ComposeDotError::ComposeParse(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_str_with_warnings(&content)
    }

    /// Parse compose file from string
    pub fn parse_str(content: &str) -> Result<Manifest> {
        Self::parse_str_with_warnings(content).map(|(manifest, _)| manifest)
    }

    /// Parse compose file from string, reporting fields that were ignored
    ///
    /// Only a document that is not YAML, or whose root is not a mapping, is
    /// an error. An empty document is an empty manifest. `<<` merge keys are
    /// resolved before any field is read.
    pub fn parse_str_with_warnings(content: &str) -> Result<(Manifest, Vec<Warning>)> {
        let mut root: Value = serde_yaml::from_str(content)
            .map_err(|e| ComposeDotError::ComposeParse(format!("Failed to parse YAML: {}", e)))?;

        match &root {
            Value::Null => return Ok((Manifest::default(), Vec::new())),
            Value::Mapping(_) => {}
            other => {
                return Err(ComposeDotError::InvalidRoot(format!(
                    "expected a mapping at the top level, found {}",
                    shape_name(other)
                )))
            }
        }

        root.apply_merge()
            .map_err(|e| ComposeDotError::ComposeParse(format!("Failed to apply merge keys: {}", e)))?;

        let warnings = Self::collect_warnings(&root);
        let manifest: Manifest = serde_yaml::from_value(root)
            .map_err(|e| ComposeDotError::ComposeParse(format!("Failed to decode manifest: {}", e)))?;

        tracing::debug!(
            networks = manifest.networks.len(),
            volumes = manifest.volumes.len(),
            services = manifest.services.len(),
            "Decoded compose manifest"
        );

        Ok((manifest, warnings))
    }

    /// Walk the raw document and report every field or list entry the
    /// lenient decoders will have dropped. Null values count as absent, not
    /// unrecognized.
    fn collect_warnings(root: &Value) -> Vec<Warning> {
        let mut warnings = Vec::new();
        check_fields(&mut warnings, "manifest", "", root, MANIFEST_FIELDS);

        for (section, kind, fields) in [
            ("networks", "network", NETWORK_FIELDS),
            ("volumes", "volume", VOLUME_FIELDS),
            ("services", "service", SERVICE_FIELDS),
        ] {
            let entities = root.get(section).map(field::untag);
            let Some(entities) = entities.and_then(Value::as_mapping) else {
                continue;
            };
            for (name, body) in entities {
                let name = field::text(name).unwrap_or_default();
                let body = field::untag(body);
                match body {
                    Value::Null => {}
                    Value::Mapping(_) => check_fields(&mut warnings, kind, &name, body, fields),
                    _ => warnings.push(Warning::new(kind, &name, "definition")),
                }
            }
        }

        warnings
    }
}

fn check_fields(
    warnings: &mut Vec<Warning>,
    kind: &'static str,
    name: &str,
    body: &Value,
    fields: &[(&'static str, ShapeCheck)],
) {
    for (field, check) in fields {
        let Some(value) = body.get(*field) else {
            continue;
        };
        if field::untag(value).is_null() {
            continue;
        }
        match check(value) {
            Shape::Accepted => {}
            Shape::Unrecognized => warnings.push(Warning::new(kind, name, *field)),
            Shape::Partial(entries) => {
                warnings.extend(entries.into_iter().map(|entry| Warning {
                    entry: Some(entry),
                    ..Warning::new(kind, name, *field)
                }));
            }
        }
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
