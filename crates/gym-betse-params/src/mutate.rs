//! Writing values back into configuration trees at flat-key locations.
//!
//! Keys follow the scheme produced by extraction: an optional root selector,
//! the mapping keys to descend through, and one `_<discriminant>` suffix on the
//! last segment for every sequence crossed on the way. Text keys are resolved
//! against the tree: the last segment is first tried verbatim, then split at
//! its underscores into a base key and discriminants. A split only counts if
//! every discriminant selects a sequence element, so a suffix is never
//! dropped silently; when two splits resolve to different places the key is
//! rejected as ambiguous.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::document::{ConfigDocument, GRN_CONFIG_KEY, GRN_SETTINGS_KEY};
use crate::error::ParamError;
use crate::key::{Discriminant, FlatKey};
use crate::path::RootSelector;
use crate::tree::{ConfigTree, node_kind};

/// Underscore splits beyond this count are not enumerated.
const MAX_SPLIT_UNDERSCORES: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Step {
    Key(String),
    Element(usize),
}

/// Selects a sequence element while locating a key.
#[derive(Clone, Copy, Debug)]
enum Selector<'a> {
    Typed(&'a Discriminant),
    Text(&'a str),
}

impl Selector<'_> {
    fn matches(&self, index: usize, element: &Value) -> bool {
        match self {
            Selector::Typed(discriminant) => discriminant.matches(index, element),
            Selector::Text(text) => {
                Discriminant::Name(text.to_string()).matches(index, element)
                    || text
                        .parse::<usize>()
                        .is_ok_and(|position| Discriminant::Index(position).matches(index, element))
            }
        }
    }

    fn text(&self) -> String {
        match self {
            Selector::Typed(discriminant) => discriminant.to_string(),
            Selector::Text(text) => text.to_string(),
        }
    }
}

/// A key split into the document it targets and its path inside it.
struct Target {
    root: RootSelector,
    segments: Vec<String>,
}

impl Target {
    fn from_head(head: &str) -> Self {
        let mut segments: Vec<String> = head.split('/').map(str::to_string).collect();
        let root = match segments.first().map(String::as_str) {
            Some("config") => {
                segments.remove(0);
                RootSelector::Config
            }
            Some("grn") => {
                segments.remove(0);
                RootSelector::Grn
            }
            _ => RootSelector::Config,
        };
        Target { root, segments }
    }
}

/// Set every `keys[i]` to `values[i]` in `document`.
///
/// Either all assignments happen or none do. The document is only changed
/// in memory; see [`update_document`] to also write it back.
pub fn apply<K: AsRef<str>>(
    document: &mut ConfigDocument,
    keys: &[K],
    values: &[Value],
) -> Result<(), ParamError> {
    check_arity(keys.len(), values.len())?;
    let keys: Vec<KeySpec> = keys.iter().map(|k| KeySpec::Text(k.as_ref())).collect();
    apply_specs(document, &keys, values)
}

/// Like [`apply`], with keys kept in their structured form.
pub fn apply_flat(
    document: &mut ConfigDocument,
    keys: &[FlatKey],
    values: &[Value],
) -> Result<(), ParamError> {
    check_arity(keys.len(), values.len())?;
    let keys: Vec<KeySpec> = keys.iter().map(KeySpec::Flat).collect();
    apply_specs(document, &keys, values)
}

/// Apply text keys to a bare tree. GRN keys go to the inline GRN mapping.
pub fn apply_to_tree<K: AsRef<str>>(
    tree: &mut ConfigTree,
    keys: &[K],
    values: &[Value],
) -> Result<(), ParamError> {
    check_arity(keys.len(), values.len())?;
    let mut working = tree.clone();
    for (key, value) in keys.iter().zip(values) {
        place(&mut working, None, KeySpec::Text(key.as_ref()), value.clone())?;
    }
    *tree = working;
    Ok(())
}

/// Load `path`, apply the pairs, and persist to `write_path` (defaults to `path`).
pub fn update_document<K: AsRef<str>>(
    path: &Path,
    keys: &[K],
    values: &[Value],
    write_path: Option<&Path>,
) -> Result<ConfigDocument, ParamError> {
    check_arity(keys.len(), values.len())?;
    let mut document = ConfigDocument::load(path)?;
    apply(&mut document, keys, values)?;
    document.persist_to(write_path.unwrap_or(path))?;
    log::debug!(
        "Updated {} parameters of {}",
        keys.len(),
        write_path.unwrap_or(path).display()
    );
    Ok(document)
}

fn check_arity(keys: usize, values: usize) -> Result<(), ParamError> {
    if keys != values {
        return Err(ParamError::ArityMismatch { keys, values });
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum KeySpec<'a> {
    Text(&'a str),
    Flat(&'a FlatKey),
}

fn apply_specs(
    document: &mut ConfigDocument,
    keys: &[KeySpec],
    values: &[Value],
) -> Result<(), ParamError> {
    let mut primary = document.primary().clone();
    let mut secondary = document.secondary().map(|s| s.tree().clone());

    for (key, value) in keys.iter().zip(values) {
        place(&mut primary, secondary.as_mut(), *key, value.clone())?;
    }

    document.replace_trees(primary, secondary);
    Ok(())
}

fn place(
    primary: &mut ConfigTree,
    secondary: Option<&mut ConfigTree>,
    key: KeySpec,
    value: Value,
) -> Result<(), ParamError> {
    let (head, typed) = match key {
        KeySpec::Text(text) => (text, None),
        KeySpec::Flat(flat) => (flat.head(), Some(flat.discriminants())),
    };
    let target = Target::from_head(head);

    let tree = match (target.root, secondary) {
        (RootSelector::Config, _) => primary,
        (RootSelector::Grn, Some(loaded)) => loaded,
        (RootSelector::Grn, None) => inline_grn(primary)?,
    };

    let steps = match typed {
        Some(discriminants) => {
            let selectors: Vec<Selector> = discriminants.iter().map(Selector::Typed).collect();
            locate(tree, &target.segments, &selectors).map_err(|(_, e)| e)?
        }
        None => resolve_text(tree, &target.segments, head)?,
    };

    log::debug!("Assigning '{head}' at {steps:?}");
    assign(tree, &steps, value)
}

/// The inline GRN mapping inside the primary tree, created if absent.
fn inline_grn(primary: &mut ConfigTree) -> Result<&mut ConfigTree, ParamError> {
    let mut node = primary;
    for key in [GRN_SETTINGS_KEY, GRN_CONFIG_KEY] {
        let map = match node {
            Value::Mapping(map) => map,
            other => {
                return Err(ParamError::UnexpectedNodeType {
                    segment: key.to_string(),
                    node: node_kind(other),
                });
            }
        };
        let slot = map
            .entry(Value::from(key))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if slot.is_null() {
            *slot = Value::Mapping(Mapping::new());
        }
        node = slot;
    }
    if node.is_mapping() {
        Ok(node)
    } else {
        Err(ParamError::UnexpectedNodeType {
            segment: GRN_CONFIG_KEY.to_string(),
            node: node_kind(node),
        })
    }
}

/// Resolve a text key whose last segment may carry discriminant suffixes.
fn resolve_text(
    tree: &ConfigTree,
    segments: &[String],
    key: &str,
) -> Result<Vec<Step>, ParamError> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(ParamError::KeyNotFound(key.to_string()));
    };

    let mut found: Vec<Vec<Step>> = Vec::new();
    // Deepest failure so far, and whether it came from the verbatim attempt.
    let mut deepest: Option<(usize, bool, ParamError)> = None;

    for (base, suffixes) in splits(last) {
        let mut path: Vec<String> = parents.to_vec();
        path.push(base.to_string());
        let selectors: Vec<Selector> = suffixes.iter().map(|&s| Selector::Text(s)).collect();

        match locate(tree, &path, &selectors) {
            Ok(steps) => {
                if !found.contains(&steps) {
                    found.push(steps);
                }
            }
            Err((depth, err)) => {
                let verbatim = suffixes.is_empty();
                let replaces = deepest.as_ref().is_none_or(|(best, best_verbatim, _)| {
                    depth > *best || (depth == *best && *best_verbatim && !verbatim)
                });
                if replaces {
                    deepest = Some((depth, verbatim, err));
                }
            }
        }
    }

    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(deepest
            .map(|(_, _, e)| e)
            .unwrap_or_else(|| ParamError::KeyNotFound(key.to_string()))),
        _ => Err(ParamError::AmbiguousKey {
            key: key.to_string(),
            candidates: found.iter().map(|steps| describe(steps)).collect(),
        }),
    }
}

/// The verbatim segment followed by every split of it at underscores.
fn splits(segment: &str) -> Vec<(&str, Vec<&str>)> {
    let mut candidates = vec![(segment, Vec::new())];

    let positions: Vec<usize> = segment.match_indices('_').map(|(i, _)| i).collect();
    let positions = &positions[..positions.len().min(MAX_SPLIT_UNDERSCORES)];

    for mask in 1..(1u32 << positions.len()) {
        let cuts: Vec<usize> = positions
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, &pos)| pos)
            .collect();

        let base = &segment[..cuts[0]];
        let mut suffixes = Vec::with_capacity(cuts.len());
        for (n, &cut) in cuts.iter().enumerate() {
            let end = cuts.get(n + 1).copied().unwrap_or(segment.len());
            suffixes.push(&segment[cut + 1..end]);
        }

        if !base.is_empty() && suffixes.iter().all(|s| !s.is_empty()) {
            candidates.push((base, suffixes));
        }
    }
    candidates
}

/// Walk `segments`, consuming one selector per sequence crossed.
///
/// On failure, also reports how many steps were taken before it.
fn locate(
    tree: &ConfigTree,
    segments: &[String],
    selectors: &[Selector],
) -> Result<Vec<Step>, (usize, ParamError)> {
    let mut node = tree;
    let mut steps = Vec::new();
    let mut selectors = selectors.iter();
    let mut i = 0;

    while i < segments.len() {
        let segment = &segments[i];
        match node {
            Value::Mapping(map) => match map.get(segment.as_str()) {
                Some(child) => {
                    steps.push(Step::Key(segment.clone()));
                    node = child;
                    i += 1;
                }
                None => return Err((steps.len(), ParamError::KeyNotFound(segment.clone()))),
            },
            Value::Sequence(items) => {
                let Some(selector) = selectors.next() else {
                    return Err((
                        steps.len(),
                        ParamError::NoMatchingElement {
                            segment: segment.clone(),
                            discriminant: String::new(),
                        },
                    ));
                };
                let Some(index) = items
                    .iter()
                    .enumerate()
                    .position(|(i, item)| selector.matches(i, item))
                else {
                    return Err((
                        steps.len(),
                        ParamError::NoMatchingElement {
                            segment: segment.clone(),
                            discriminant: selector.text(),
                        },
                    ));
                };
                steps.push(Step::Element(index));
                node = &items[index];
            }
            other => {
                return Err((
                    steps.len(),
                    ParamError::UnexpectedNodeType {
                        segment: segment.clone(),
                        node: node_kind(other),
                    },
                ));
            }
        }
    }

    let leftover: Vec<String> = selectors.map(Selector::text).collect();
    if !leftover.is_empty() {
        let last = segments.last().cloned().unwrap_or_default();
        return Err((
            steps.len(),
            ParamError::KeyNotFound(format!("{last}_{}", leftover.join("_"))),
        ));
    }
    if !matches!(steps.last(), Some(Step::Key(_))) {
        return Err((
            steps.len(),
            ParamError::KeyNotFound(segments.join("/")),
        ));
    }
    Ok(steps)
}

fn assign(tree: &mut ConfigTree, steps: &[Step], value: Value) -> Result<(), ParamError> {
    let mut node = tree;
    for step in steps {
        let next = match step {
            Step::Key(key) => node.get_mut(key.as_str()),
            Step::Element(index) => node.get_mut(*index),
        };
        node = next.ok_or_else(|| ParamError::KeyNotFound(describe(steps)))?;
    }
    *node = value;
    Ok(())
}

fn describe(steps: &[Step]) -> String {
    steps
        .iter()
        .map(|step| match step {
            Step::Key(key) => key.clone(),
            Step::Element(index) => format!("[{index}]"),
        })
        .collect::<Vec<_>>()
        .join("/")
}
