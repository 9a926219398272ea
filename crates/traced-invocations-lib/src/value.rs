//! Deferred configuration values.
//!
//! Some values (the API base address above all) only exist once the
//! provisioning engine has materialized a resource. They are carried through
//! the plan as [`ForwardRef`]s and only turn into strings when rendered
//! against a set of [`Bindings`] reported back after deployment.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Attribute name for the public URL of a REST API.
pub const ATTR_URL: &str = "Url";

/// Reference to an attribute of a resource that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForwardRef {
    /// Logical id of the resource inside the plan.
    pub resource: String,
    /// Attribute of that resource, e.g. [`ATTR_URL`].
    pub attribute: String,
}

impl ForwardRef {
    pub fn new(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }

    /// The public URL of the resource with the given logical id.
    pub fn url_of(resource: impl Into<String>) -> Self {
        Self::new(resource, ATTR_URL)
    }
}

impl fmt::Display for ForwardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.resource, self.attribute)
    }
}

/// A configuration value that may still be waiting on provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Literal(String),
    Reference(ForwardRef),
    /// Concatenation of the parts, with no separator.
    Join(Vec<Value>),
}

impl Value {
    pub fn literal(value: impl Into<String>) -> Self {
        Value::Literal(value.into())
    }

    /// `base` followed by a literal `suffix`.
    pub fn with_suffix(base: Value, suffix: impl Into<String>) -> Self {
        Value::Join(vec![base, Value::literal(suffix)])
    }

    /// Returns the literal text when the value needs no bindings at all.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Value::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// True if rendering this value requires at least one binding.
    pub fn is_deferred(&self) -> bool {
        !self.references().is_empty()
    }

    /// Forward references in the order they appear.
    pub fn references(&self) -> Vec<&ForwardRef> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a ForwardRef>) {
        match self {
            Value::Literal(_) => {}
            Value::Reference(r) => out.push(r),
            Value::Join(parts) => parts.iter().for_each(|p| p.collect_references(out)),
        }
    }

    /// Render to a concrete string using materialized bindings.
    pub fn render(&self, bindings: &Bindings) -> Result<String> {
        match self {
            Value::Literal(s) => Ok(s.clone()),
            Value::Reference(r) => bindings.get(r).map(str::to_string).ok_or_else(|| {
                Error::UnboundReference {
                    resource: r.resource.clone(),
                    attribute: r.attribute.clone(),
                }
            }),
            Value::Join(parts) => parts.iter().try_fold(String::new(), |mut acc, part| {
                acc.push_str(&part.render(bindings)?);
                Ok(acc)
            }),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::literal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Literal(value)
    }
}

impl From<ForwardRef> for Value {
    fn from(value: ForwardRef) -> Self {
        Value::Reference(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(s) => f.write_str(s),
            Value::Reference(r) => write!(f, "{r}"),
            Value::Join(parts) => parts.iter().try_for_each(|p| write!(f, "{p}")),
        }
    }
}

/// Concrete values for forward references, as reported by the provisioning
/// engine after materialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: BTreeMap<ForwardRef, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn bind(mut self, reference: ForwardRef, value: impl Into<String>) -> Self {
        self.insert(reference, value);
        self
    }

    pub fn insert(&mut self, reference: ForwardRef, value: impl Into<String>) {
        self.values.insert(reference, value.into());
    }

    pub fn get(&self, reference: &ForwardRef) -> Option<&str> {
        self.values.get(reference).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_url() -> ForwardRef {
        ForwardRef::url_of("Api")
    }

    #[test]
    fn literal_renders_without_bindings() {
        let value = Value::literal("datadoghq.com");
        assert_eq!(value.render(&Bindings::new()).unwrap(), "datadoghq.com");
        assert!(!value.is_deferred());
    }

    #[test]
    fn reference_requires_binding() {
        let value = Value::from(api_url());
        let err = value.render(&Bindings::new()).unwrap_err();
        assert!(matches!(err, Error::UnboundReference { ref resource, .. } if resource == "Api"));
        assert_eq!(err.to_string(), "no binding for Api.Url");
    }

    #[test]
    fn join_concatenates_without_separator() {
        let value = Value::with_suffix(Value::from(api_url()), "invoke");
        let bindings = Bindings::new().bind(api_url(), "https://x.example/prod/");
        assert_eq!(
            value.render(&bindings).unwrap(),
            "https://x.example/prod/invoke"
        );
        assert_eq!(value.references(), vec![&api_url()]);
    }

    #[test]
    fn display_shows_placeholder_syntax() {
        let value = Value::with_suffix(Value::from(api_url()), "invoke");
        assert_eq!(value.to_string(), "${Api.Url}invoke");
    }
}
