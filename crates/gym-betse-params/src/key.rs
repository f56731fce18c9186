use std::fmt;

use serde_yaml::Value;

/// Selects one element of a sequence node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Discriminant {
    /// The element's `name` field, rendered as text.
    Name(String),
    /// Zero-based position, used when the element carries no `name`.
    Index(usize),
}

impl Discriminant {
    /// Discriminant for `element` sitting at `index` in its sequence.
    pub fn for_element(index: usize, element: &Value) -> Self {
        match element.as_mapping().and_then(|m| m.get("name")) {
            Some(name) => Discriminant::Name(scalar_text(name)),
            None => Discriminant::Index(index),
        }
    }

    /// True if this discriminant selects `element` at `index`.
    pub fn matches(&self, index: usize, element: &Value) -> bool {
        let name = element.as_mapping().and_then(|m| m.get("name"));
        match (self, name) {
            (Discriminant::Name(wanted), Some(name)) => scalar_text(name) == *wanted,
            (Discriminant::Index(position), None) => *position == index,
            _ => false,
        }
    }
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminant::Name(name) => f.write_str(name),
            Discriminant::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Key naming one location reached by resolving a path expression.
///
/// The head is the prefix the extraction started with; every sequence
/// crossed on the way down contributes one discriminant. Flattened, the key
/// reads `head_d1_d2...`, which is the column name used in parameter tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatKey {
    head: String,
    discriminants: Vec<Discriminant>,
}

impl FlatKey {
    pub fn new(head: impl Into<String>) -> Self {
        FlatKey {
            head: head.into(),
            discriminants: Vec::new(),
        }
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn discriminants(&self) -> &[Discriminant] {
        &self.discriminants
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.discriminants.is_empty()
    }

    /// Key for an element entered through a sequence.
    ///
    /// An empty key takes `entering` as its head so the element still gets
    /// a readable name.
    pub fn entering(&self, entering: &str, discriminant: Discriminant) -> FlatKey {
        let mut key = if self.is_empty() {
            FlatKey::new(entering)
        } else {
            self.clone()
        };
        key.discriminants.push(discriminant);
        key
    }

    pub fn flatten(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FlatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head)?;
        for discriminant in &self.discriminants {
            write!(f, "_{discriminant}")?;
        }
        Ok(())
    }
}

impl From<&str> for FlatKey {
    fn from(head: &str) -> Self {
        FlatKey::new(head)
    }
}

/// Text form of a scalar, used for `name` fields and table cells.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
