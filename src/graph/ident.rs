//! Graph node identifiers

/// Map an entity name to a node identifier by replacing `-` with `_`.
///
/// Not injective: `front-end` and `front_end` map to the same node.
pub fn nodify(name: &str) -> String {
    name.replace('-', "_")
}
