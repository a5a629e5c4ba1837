//! Declared permission scopes and the offline permission manifest.
//!
//! Routes carry the scopes a caller needs (`document.read`, `qa.read`, ...).
//! The gateway never checks them itself; an external policy compiler reads
//! the manifest produced here and enforces it in front of the gateway.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable, ordered set of permission scope strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// A route that declares no scopes.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PermissionSet {
    fn from(scopes: [&str; N]) -> Self {
        scopes.into_iter().collect()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, scope) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(scope)?;
        }
        Ok(())
    }
}

/// One `(method, path) -> permissions` record of the extraction manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub method: String,
    pub path: String,
    pub permissions: Vec<String>,
}

/// The complete permission map, sorted by `(method, path)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionManifest(Vec<PermissionRecord>);

impl PermissionManifest {
    /// Build from `(method, template, permissions)` triples in registration order.
    ///
    /// Routes without scopes are left out, trailing slashes are trimmed and a
    /// later registration of the same `(method, path)` replaces an earlier one.
    pub fn from_routes<'a, I>(routes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a PermissionSet)>,
    {
        let mut by_key = std::collections::BTreeMap::new();
        for (method, template, permissions) in routes {
            if permissions.is_empty() {
                continue;
            }
            let path = normalize_path(template);
            let record = PermissionRecord {
                method: method.to_string(),
                path: path.clone(),
                permissions: permissions.iter().map(str::to_string).collect(),
            };
            by_key.insert((method.to_string(), path), record);
        }
        Self(by_key.into_values().collect())
    }

    pub fn records(&self) -> &[PermissionRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
