//! Recursive resolution of path segments into flattened key/value pairs.

use serde_yaml::Value;

use crate::document::ConfigDocument;
use crate::error::ParamError;
use crate::key::{Discriminant, FlatKey};
use crate::path::PathExpression;
use crate::tree::node_kind;

/// Ordered result of an extraction. Keys are unique; inserting an existing
/// key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    entries: Vec<(FlatKey, Value)>,
}

impl Extraction {
    fn single(key: FlatKey, value: Value) -> Self {
        Extraction {
            entries: vec![(key, value)],
        }
    }

    pub fn insert(&mut self, key: FlatKey, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    fn merge(&mut self, other: Extraction) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Look up a value by its flattened key.
    pub fn get(&self, flat_key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.to_string() == flat_key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FlatKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlatKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Extraction {
    type Item = (FlatKey, Value);
    type IntoIter = std::vec::IntoIter<(FlatKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Resolve `segments` against `tree`, naming results after `key_prefix`.
///
/// A missing mapping key or a scalar reached early yields an empty
/// extraction: the value is simply not present in this document.
///
/// Sequences are searched element by element. Elements carrying a `name`
/// are keyed by it, others by position. When the path ends inside the
/// element, the first named element holding the final segment is returned
/// on its own and anything gathered from earlier elements is dropped;
/// otherwise results from every element are merged. Downstream datasets
/// rely on this first-match behaviour, so it is kept as is.
pub fn extract(
    tree: &Value,
    segments: &[String],
    key_prefix: &FlatKey,
) -> Result<Extraction, ParamError> {
    descend(tree, segments, key_prefix, None)
}

/// Resolve a full path expression against the document it selects.
///
/// Returns `Ok(None)` when the selected document is unavailable.
pub fn extract_path(
    document: &ConfigDocument,
    path: &PathExpression,
) -> Result<Option<Extraction>, ParamError> {
    let Some(tree) = path.root().and_then(|root| document.tree(root)) else {
        log::debug!(
            "No '{}' document available for '{}' in {}",
            path.root_selector(),
            path,
            document.path().display()
        );
        return Ok(None);
    };
    extract(tree, path.remaining_segments(), &FlatKey::new(path.as_str())).map(Some)
}

fn descend(
    node: &Value,
    segments: &[String],
    prefix: &FlatKey,
    entered_by: Option<&str>,
) -> Result<Extraction, ParamError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(Extraction::single(prefix.clone(), node.clone()));
    };

    match node {
        Value::Mapping(map) => match map.get(segment.as_str()) {
            Some(child) => descend(child, rest, prefix, Some(segment)),
            None => Ok(Extraction::default()),
        },
        Value::Sequence(items) => {
            let entering = entered_by.unwrap_or(segment);
            let mut extracted = Extraction::default();
            for (index, item) in items.iter().enumerate() {
                let discriminant = Discriminant::for_element(index, item);
                let named = matches!(discriminant, Discriminant::Name(_));
                let item_prefix = prefix.entering(entering, discriminant);

                if named && rest.is_empty() {
                    if let Some(value) = item.get(segment.as_str()) {
                        return Ok(Extraction::single(item_prefix, value.clone()));
                    }
                    continue;
                }

                extracted.merge(descend(item, segments, &item_prefix, None)?);
            }
            Ok(extracted)
        }
        Value::Tagged(_) => Err(ParamError::TraversalType {
            segment: segment.clone(),
            node: node_kind(node),
        }),
        _ => Ok(Extraction::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn segments(path: &str) -> Vec<String> {
        path.split('/').map(str::to_string).collect()
    }

    #[test]
    fn nested_mapping_resolves_to_prefixed_key() {
        let tree = yaml("a: {b: 5}");
        let path = PathExpression::parse("config/a/b").unwrap();
        let extracted = extract(
            &tree,
            path.remaining_segments(),
            &FlatKey::new(path.as_str()),
        )
        .unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted.get("config/a/b"), Some(&Value::from(5)));
    }

    #[test]
    fn empty_path_returns_node_itself() {
        let tree = yaml("a: {b: 5}");
        let extracted = extract(&tree, &[], &FlatKey::new("whole")).unwrap();
        assert_eq!(extracted.get("whole"), Some(&tree));
    }

    #[test]
    fn missing_key_is_empty_not_error() {
        let tree = yaml("a: {b: 5}");
        assert!(
            extract(&tree, &segments("a/c"), &FlatKey::new("k"))
                .unwrap()
                .is_empty()
        );
        assert!(
            extract(&tree, &segments("a/b/c"), &FlatKey::new("k"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn named_sequence_short_circuits_on_first_match() {
        let tree = yaml("items: [{name: x, v: 1}, {name: y, v: 2}]");
        let extracted = extract(&tree, &segments("items/v"), &FlatKey::new("")).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted.get("items_x"), Some(&Value::from(1)));
    }

    #[test]
    fn short_circuit_skips_named_elements_without_the_field() {
        let tree = yaml("items: [{name: x, w: 0}, {name: y, v: 2}]");
        let extracted = extract(&tree, &segments("items/v"), &FlatKey::new("p")).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted.get("p_y"), Some(&Value::from(2)));
    }

    #[test]
    fn short_circuit_discards_earlier_positional_results() {
        let tree = yaml("items: [{v: 0}, {name: y, v: 2}]");
        let extracted = extract(&tree, &segments("items/v"), &FlatKey::new("p")).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted.get("p_y"), Some(&Value::from(2)));
    }

    #[test]
    fn positional_sequence_accumulates() {
        let tree = yaml("items: [{v: 1}, {v: 2}, {w: 3}]");
        let extracted = extract(&tree, &segments("items/v"), &FlatKey::new("p")).unwrap();
        assert_eq!(extracted.len(), 2);
        assert_eq!(extracted.get("p_0"), Some(&Value::from(1)));
        assert_eq!(extracted.get("p_1"), Some(&Value::from(2)));
    }

    #[test]
    fn deep_paths_through_named_elements_accumulate() {
        let tree = yaml(
            "biomolecules:\n  - name: Na\n    growth and decay: {decay rate: 0.1}\n  - name: K\n    growth and decay: {decay rate: 0.2}\n",
        );
        let path = PathExpression::parse("grn/biomolecules/growth and decay/decay rate").unwrap();
        let extracted = extract(
            &tree,
            path.remaining_segments(),
            &FlatKey::new(path.as_str()),
        )
        .unwrap();
        assert_eq!(extracted.len(), 2);
        assert_eq!(
            extracted.get("grn/biomolecules/growth and decay/decay rate_Na"),
            Some(&Value::from(0.1))
        );
        assert_eq!(
            extracted.get("grn/biomolecules/growth and decay/decay rate_K"),
            Some(&Value::from(0.2))
        );
    }

    #[test]
    fn same_name_gives_same_key_across_documents() {
        let first = yaml("items: [{name: x, v: 1}]");
        let second = yaml("items: [{name: z, w: 0}, {name: x, v: 9}]\nextra: 1");
        let prefix = FlatKey::new("config/items/sub/v");
        let path = segments("items/sub/v");
        let nested_first = yaml("items: [{name: x, sub: {v: 1}}]");
        let nested_second = yaml("items: [{name: q, sub: {w: 0}}, {name: x, sub: {v: 9}}]");
        let a = extract(&nested_first, &path, &prefix).unwrap();
        let b = extract(&nested_second, &path, &prefix).unwrap();
        assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
        assert_eq!(b.get("config/items/sub/v_x"), Some(&Value::from(9)));

        let shallow = segments("items/v");
        let a = extract(&first, &shallow, &FlatKey::new("k")).unwrap();
        let b = extract(&second, &shallow, &FlatKey::new("k")).unwrap();
        assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
        assert_eq!(a.get("k_x"), Some(&Value::from(1)));
        assert_eq!(b.get("k_x"), Some(&Value::from(9)));
    }

    #[test]
    fn tagged_node_with_path_remaining_is_a_type_error() {
        let tree = yaml("a: !custom {b: 1}");
        let err = extract(&tree, &segments("a/b"), &FlatKey::new("k")).unwrap_err();
        assert!(matches!(err, ParamError::TraversalType { node: "tagged", .. }));
    }
}
