use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::{Model, SourceError, Value};

/// A single field criterion.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Criterion {
    Eq(Value),
    NotEq(Value),
    /// Inclusive lower bound.
    Min(Value),
    /// Inclusive upper bound.
    Max(Value),
    Between { min: Value, max: Value },
    /// Case-insensitive substring match on string fields.
    Contains(String),
    OneOf(Vec<Value>),
}

impl Criterion {
    /// Rejects criteria that can never match because they are malformed.
    pub fn validate(&self, field: &str) -> Result<(), SourceError> {
        match self {
            Self::Between { min, max } if min.compare(max) == Ordering::Greater => {
                Err(SourceError::InvalidFilter {
                    field: field.to_owned(),
                    reason: format!("min {min:?} is greater than max {max:?}"),
                })
            }
            _ => Ok(()),
        }
    }

    /// A missing field is treated as [`Value::Null`].
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let value = value.unwrap_or(&Value::Null);
        match self {
            Self::Eq(v) => value.compare(v) == Ordering::Equal,
            Self::NotEq(v) => value.compare(v) != Ordering::Equal,
            Self::Min(min) => value.compare(min) != Ordering::Less,
            Self::Max(max) => value.compare(max) != Ordering::Greater,
            Self::Between { min, max } => {
                value.compare(min) != Ordering::Less && value.compare(max) != Ordering::Greater
            }
            Self::Contains(needle) => value
                .as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
            Self::OneOf(values) => values.iter().any(|v| value.compare(v) == Ordering::Equal),
        }
    }
}

/// Field → criterion mapping. All criteria must match.
///
/// Filters are compared by value; a storage only resets when the filter actually changes.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Filter {
    criteria: BTreeMap<String, Criterion>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, criterion: Criterion) -> Self {
        self.criteria.insert(field.into(), criterion);
        self
    }

    pub fn without(mut self, field: &str) -> Self {
        self.criteria.remove(field);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Criterion> {
        self.criteria.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.criteria.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn validate(&self) -> Result<(), SourceError> {
        self.criteria
            .iter()
            .try_for_each(|(field, criterion)| criterion.validate(field))
    }

    pub fn matches<M: Model>(&self, model: &M) -> bool {
        self.criteria
            .iter()
            .all(|(field, criterion)| criterion.matches(model.field(field).as_ref()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Ordered list of sort keys; earlier keys take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Sorter {
    keys: Vec<(String, SortDirection)>,
}

impl Sorter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        self.keys.retain(|(f, _)| *f != field);
        self.keys.push((field, direction));
        self
    }

    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn compare<M: Model>(&self, a: &M, b: &M) -> Ordering {
        for (field, direction) in &self.keys {
            let va = a.field(field).unwrap_or(Value::Null);
            let vb = b.field(field).unwrap_or(Value::Null);
            let ord = match direction {
                SortDirection::Asc => va.compare(&vb),
                SortDirection::Desc => vb.compare(&va),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}
