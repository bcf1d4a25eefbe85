//! Validation of untyped values into typed content.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_path_to_error::Segment;
use serde_json::Value;

/// One validation failure, located by the field path it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    path: Vec<String>,
    message: String,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// Places the issue under `segment`, outermost segments last.
    pub fn at(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// Every issue a validation pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues(Vec<Issue>);

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.0.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.0.iter()
    }

    /// Places every issue under `segment`.
    pub fn nested(self, segment: &str) -> Self {
        self.0.into_iter().map(|issue| issue.at(segment)).collect()
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, issue) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl From<Issue> for Issues {
    fn from(issue: Issue) -> Self {
        Self(vec![issue])
    }
}

impl FromIterator<Issue> for Issues {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Turns untyped values into typed content and back.
///
/// `validate` is applied to every parsed file. `to_value` is applied to
/// content before it is written, and must reject content `validate` would
/// reject.
pub trait Schema: Clone + Send + Sync + 'static {
    /// What callers hand to a write.
    type Content: Send + Sync;
    /// What a successful read yields.
    type Parsed: Send;

    fn validate(&self, value: Value) -> Result<Self::Parsed, Issues>;
    fn to_value(&self, content: &Self::Content) -> Result<Value, Issues>;
}

type Refinement<T> = Arc<dyn Fn(&T) -> Issues + Send + Sync>;

/// Schema backed by a serde type, with optional extra checks.
///
/// ```
/// use fluentfs_core::codec::{Issue, SerdeSchema};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Port {
///     number: u16,
/// }
///
/// let schema = SerdeSchema::<Port>::new().refine(|port| {
///     if port.number < 1024 {
///         Issue::new("must not be privileged").at("number").into()
///     } else {
///         Default::default()
///     }
/// });
/// # let _ = schema;
/// ```
pub struct SerdeSchema<T> {
    refinements: Vec<Refinement<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    pub fn new() -> Self {
        Self {
            refinements: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Adds a check run on every successfully deserialised value.
    pub fn refine<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> Issues + Send + Sync + 'static,
    {
        self.refinements.push(Arc::new(check));
        self
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeSchema<T> {
    fn clone(&self) -> Self {
        Self {
            refinements: self.refinements.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeSchema")
            .field("type", &std::any::type_name::<T>())
            .field("refinements", &self.refinements.len())
            .finish()
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Content = T;
    type Parsed = T;

    fn validate(&self, value: Value) -> Result<T, Issues> {
        let parsed: T = from_value(value)?;
        let issues: Issues = self
            .refinements
            .iter()
            .flat_map(|check| check(&parsed))
            .collect();
        if issues.is_empty() {
            Ok(parsed)
        } else {
            Err(issues)
        }
    }

    fn to_value(&self, content: &T) -> Result<Value, Issues> {
        let value =
            serde_json::to_value(content).map_err(|err| Issues::from(Issue::new(err.to_string())))?;
        let canonical = self.validate(value)?;
        serde_json::to_value(&canonical).map_err(|err| Issues::from(Issue::new(err.to_string())))
    }
}

/// Deserialises `value`, locating a failure at the field it concerns.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Issues> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err
            .path()
            .iter()
            .filter_map(|segment| match segment {
                Segment::Map { key } => Some(key.clone()),
                Segment::Seq { index } => Some(index.to_string()),
                Segment::Enum { variant } => Some(variant.clone()),
                Segment::Unknown => None,
            })
            .collect();
        Issues::from(Issue {
            path,
            message: err.into_inner().to_string(),
        })
    })
}

/// Accepts any value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSchema;

impl Schema for ValueSchema {
    type Content = Value;
    type Parsed = Value;

    fn validate(&self, value: Value) -> Result<Value, Issues> {
        Ok(value)
    }

    fn to_value(&self, content: &Value) -> Result<Value, Issues> {
        Ok(content.clone())
    }
}
