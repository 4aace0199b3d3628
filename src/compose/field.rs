//! Lenient decoding for compose fields that accept more than one shape
//!
//! Compose files are loose about types: `command` may be a string or a list,
//! `build` a path or a mapping, `external` a flag or a mapping, and most list
//! fields have a long form. Every decoder here tries the accepted shapes in a
//! fixed order (scalar first, structured second) and commits to the first one
//! that fits. A value that fits no shape decodes to the empty value instead of
//! failing the whole document; [`crate::compose::parser`] reports it as a
//! warning.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Service `command`: a shell string or an exec-form token list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Command {
    /// Absent, null, or of an unrecognized shape
    #[default]
    Empty,
    /// `command: bundle exec thin -p 3000`
    Shell(String),
    /// `command: ["bundle", "exec", "thin", "-p", "3000"]`
    Exec(Vec<String>),
}

impl Command {
    /// Decode a raw node, `None` when no accepted shape matches
    pub fn decode(value: &Value) -> Option<Self> {
        string(value)
            .map(Command::Shell)
            .or_else(|| scalar_list(value).map(Command::Exec))
    }

    /// True when absent, null, or of an unrecognized shape
    pub fn is_empty(&self) -> bool {
        matches!(self, Command::Empty)
    }
}

/// Service `build`: a context path or a mapping of build options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Build {
    /// Absent, null, or of an unrecognized shape
    #[default]
    Empty,
    /// `build: ./dir`
    Context(String),
    /// `build: {context: ./dir, dockerfile: Dockerfile-alternate}`
    ///
    /// Nested mappings such as `args` are flattened to `args.KEY`.
    Options(BTreeMap<String, String>),
}

impl Build {
    /// Decode a raw node, `None` when no accepted shape matches
    pub fn decode(value: &Value) -> Option<Self> {
        string(value)
            .map(Build::Context)
            .or_else(|| build_options(value).map(Build::Options))
    }

    /// True when absent, null, or of an unrecognized shape
    pub fn is_empty(&self) -> bool {
        matches!(self, Build::Empty)
    }

    /// Build context directory, if one is given
    pub fn context(&self) -> Option<&str> {
        match self {
            Build::Context(path) => Some(path.as_str()),
            Build::Options(options) => options.get("context").map(String::as_str),
            Build::Empty => None,
        }
    }
}

/// Network or volume `external`: a flag, or a mapping with an alternate name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum External {
    /// Absent, null, or of an unrecognized shape
    #[default]
    Empty,
    /// `external: true`
    Flag(bool),
    /// `external: {name: legacy-net}`, or the legacy string form
    /// `external: legacy-vol`
    Named(Option<String>),
}

impl External {
    /// Decode a raw node, `None` when no accepted shape matches
    pub fn decode(value: &Value) -> Option<Self> {
        match untag(value) {
            Value::Bool(flag) => Some(External::Flag(*flag)),
            Value::String(name) => Some(External::Named(Some(name.clone()))),
            Value::Mapping(map) => Some(External::Named(map.get("name").and_then(text))),
            _ => None,
        }
    }

    /// True when absent, null, or of an unrecognized shape
    pub fn is_empty(&self) -> bool {
        matches!(self, External::Empty)
    }

    /// Alternate name the resource is known by outside the manifest
    pub fn name(&self) -> Option<&str> {
        match self {
            External::Named(name) => name.as_deref(),
            _ => None,
        }
    }
}

macro_rules! lenient_deserialize {
    ($($ty:ty),*) => {
        $(
            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let value = Value::deserialize(deserializer)?;
                    Ok(<$ty>::decode(&value).unwrap_or_default())
                }
            }
        )*
    };
}

lenient_deserialize!(Command, Build, External);

/// Strip YAML tags (`!reset`, `!override`) down to the tagged value
pub(crate) fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// A string node, and only a string node
pub fn string(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Text of any scalar node (`3.8`, `true` and `"x"` all qualify)
///
/// Numbers are re-printed from their parsed value, so an unquoted
/// `version: 3.10` reads back as `3.1`. Quote such values to keep them
/// verbatim.
pub fn text(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Sequence of scalars; any structured entry rejects the whole sequence.
/// Used where the sequence is one value (exec-form `command`), not a list of
/// independent entries.
pub fn scalar_list(value: &Value) -> Option<Vec<String>> {
    match untag(value) {
        Value::Sequence(seq) => seq.iter().map(text).collect(),
        _ => None,
    }
}

/// Decoder for one entry of a list field
pub type EntryDecoder = fn(&Value) -> Option<String>;

/// Decode every entry of a sequence, skipping entries `decode` rejects
fn entries(value: &Value, decode: EntryDecoder) -> Option<Vec<String>> {
    match untag(value) {
        Value::Sequence(seq) => Some(seq.iter().filter_map(decode).collect()),
        _ => None,
    }
}

/// Positions of the sequence entries `decode` rejects
pub fn rejected_entries(value: &Value, decode: EntryDecoder) -> Vec<usize> {
    match untag(value) {
        Value::Sequence(seq) => seq
            .iter()
            .enumerate()
            .filter(|(_, entry)| decode(entry).is_none())
            .map(|(i, _)| i)
            .collect(),
        _ => Vec::new(),
    }
}

/// List of scalars; structured entries are skipped
pub fn string_list(value: &Value) -> Option<Vec<String>> {
    entries(value, text)
}

/// Reference list: a sequence of names, or a mapping keyed by name
/// (`networks: {front: {aliases: [..]}}`, `depends_on: {db: {condition: ..}}`)
pub fn name_list(value: &Value) -> Option<Vec<String>> {
    string_list(value).or_else(|| match untag(value) {
        Value::Mapping(map) => Some(map.keys().filter_map(text).collect()),
        _ => None,
    })
}

/// Port mappings as display strings, accepting the long syntax
pub fn port_list(value: &Value) -> Option<Vec<String>> {
    entries(value, port_entry)
}

/// One port mapping: `"8080:80"`, `9000`, or `{published, target, protocol}`
pub fn port_entry(value: &Value) -> Option<String> {
    text(value).or_else(|| long_port(value))
}

fn long_port(value: &Value) -> Option<String> {
    let Value::Mapping(map) = untag(value) else {
        return None;
    };
    let target = map.get("target").and_then(text)?;
    let mut port = String::new();
    if let Some(host_ip) = map.get("host_ip").and_then(text) {
        port.push_str(&host_ip);
        port.push(':');
    }
    if let Some(published) = map.get("published").and_then(text) {
        port.push_str(&published);
        port.push(':');
    }
    port.push_str(&target);
    if let Some(protocol) = map.get("protocol").and_then(text) {
        port.push('/');
        port.push_str(&protocol);
    }
    Some(port)
}

/// Volume mounts as display strings, accepting the long syntax
pub fn mount_list(value: &Value) -> Option<Vec<String>> {
    entries(value, mount_entry)
}

/// One volume mount: `"./data:/data"` or `{source, target, read_only}`
pub fn mount_entry(value: &Value) -> Option<String> {
    text(value).or_else(|| long_mount(value))
}

fn long_mount(value: &Value) -> Option<String> {
    let Value::Mapping(map) = untag(value) else {
        return None;
    };
    let target = map.get("target").and_then(text)?;
    let mut mount = match map.get("source").and_then(text) {
        Some(source) => format!("{}:{}", source, target),
        None => target,
    };
    if matches!(map.get("read_only").map(untag), Some(Value::Bool(true))) {
        mount.push_str(":ro");
    }
    Some(mount)
}

/// String map: a mapping of scalars, or a list of `KEY=value` strings.
/// Null values (`KEY:` with nothing after it) become empty strings; entries
/// with structured keys or values are skipped.
pub fn string_map(value: &Value) -> Option<BTreeMap<String, String>> {
    match untag(value) {
        Value::Mapping(map) => Some(map.iter().filter_map(|(k, v)| map_entry(k, v)).collect()),
        Value::Sequence(seq) => Some(seq.iter().filter_map(assignment).collect()),
        _ => None,
    }
}

/// Positions of the entries [`string_map`] skips
pub fn rejected_map_entries(value: &Value) -> Vec<usize> {
    match untag(value) {
        Value::Mapping(map) => map
            .iter()
            .enumerate()
            .filter(|(_, (k, v))| map_entry(k, v).is_none())
            .map(|(i, _)| i)
            .collect(),
        Value::Sequence(_) => rejected_entries(value, text),
        _ => Vec::new(),
    }
}

fn map_entry(key: &Value, value: &Value) -> Option<(String, String)> {
    Some((text(key)?, scalar_or_null(value)?))
}

fn assignment(entry: &Value) -> Option<(String, String)> {
    let entry = text(entry)?;
    Some(match entry.split_once('=') {
        Some((key, val)) => (key.to_string(), val.to_string()),
        None => (entry, String::new()),
    })
}

fn scalar_or_null(value: &Value) -> Option<String> {
    match untag(value) {
        Value::Null => Some(String::new()),
        other => text(other),
    }
}

fn build_options(value: &Value) -> Option<BTreeMap<String, String>> {
    let Value::Mapping(map) = untag(value) else {
        return None;
    };
    let mut options = BTreeMap::new();
    for (key, val) in map {
        let key = text(key)?;
        match untag(val) {
            Value::Mapping(_) => {
                for (sub_key, sub_val) in string_map(val)? {
                    options.insert(format!("{}.{}", key, sub_key), sub_val);
                }
            }
            Value::Sequence(_) => {
                options.insert(key, scalar_list(val)?.join(","));
            }
            other => {
                options.insert(key, scalar_or_null(other)?);
            }
        }
    }
    Some(options)
}

/// `deserialize_with` adapters: decode through `Value` and fall back to the
/// empty value when the shape is not recognized.
pub(crate) mod lenient {
    use super::*;

    fn with<'de, D, T>(deserializer: D, decode: fn(&Value) -> Option<T>) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(decode(&value).unwrap_or_default())
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        with(deserializer, |v| super::text(v).map(Some))
    }

    pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        with(deserializer, super::string_list)
    }

    pub fn name_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        with(deserializer, super::name_list)
    }

    pub fn port_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        with(deserializer, super::port_list)
    }

    pub fn mount_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        with(deserializer, super::mount_list)
    }

    pub fn string_map<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        with(deserializer, super::string_map)
    }

    /// Named entities (`services`, `networks`, `volumes`). A body that is
    /// null or not a mapping decodes to the entity's defaults, so the name
    /// is still declared.
    pub fn entity_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        let Value::Mapping(map) = untag(&value) else {
            return Ok(BTreeMap::new());
        };
        Ok(map
            .iter()
            .filter_map(|(name, body)| Some((super::text(name)?, super::entity(body))))
            .collect())
    }
}

/// Decode one entity body, defaulting when it is not a mapping
pub fn entity<T: DeserializeOwned + Default>(body: &Value) -> T {
    match untag(body) {
        Value::Mapping(_) => serde_yaml::from_value(untag(body).clone()).unwrap_or_default(),
        _ => T::default(),
    }
}
