use std::fmt;

use crate::types::ParamLocation;

/// A parsed `${namespace.field...}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reference {
    pub namespace: String,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTarget<'a> {
    Param(ParamLocation),
    Step(&'a str),
}

impl Reference {
    pub fn new(namespace: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path,
        }
    }

    pub fn target(&self) -> ReferenceTarget<'_> {
        match ParamLocation::from_namespace(&self.namespace) {
            Some(loc) => ReferenceTarget::Param(loc),
            None => ReferenceTarget::Step(&self.namespace),
        }
    }

    pub fn is_param(&self) -> bool {
        matches!(self.target(), ReferenceTarget::Param(_))
    }

    /// First field below the namespace, e.g. `order_id` in `path_params.order_id`.
    pub fn field(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)?;
        for p in &self.path {
            write!(f, ".{p}")?;
        }
        Ok(())
    }
}
