//! Route registration and lookup.
//!
//! # Responsibilities
//! - Register `(method, template, permissions, handler)` entries at startup
//! - Reject registrations that are ambiguous with an existing entry
//! - Enumerate every entry for offline permission extraction
//! - Resolve `(method, path)` to the most specific entry plus captured variables
//!
//! # Design Decisions
//! - Built once through [`RouteTableBuilder`], then frozen as an immutable
//!   [`RouteTable`] shared via `Arc` (lock-free concurrent reads)
//! - O(n) template scan (route tables are small and the scan is easy to verify)
//! - Method filtering happens before specificity ranking
//! - Explicit [`RouteMiss`] instead of a silent default route

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handler::{BoxHandler, Handler};
use crate::routing::matcher::{split_path, PathTemplate, TemplateError};
use crate::routing::permissions::{PermissionManifest, PermissionSet};

/// HTTP verbs a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Standard uppercase representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Map a wire method; `None` for verbs outside the routable set.
    pub fn from_http(method: &Method) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == method.as_str())
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| RouteError::UnsupportedMethod(s.to_string()))
    }
}

/// Error raised while registering a route. Always fatal at startup.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),

    #[error("{method} {template} is ambiguous with already registered {method} {existing}")]
    Ambiguous {
        method: HttpMethod,
        template: String,
        existing: String,
    },
}

/// A registered route.
pub struct RouteEntry {
    method: HttpMethod,
    template: PathTemplate,
    permissions: PermissionSet,
    handler: BoxHandler,
}

impl RouteEntry {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn handler(&self) -> &BoxHandler {
        &self.handler
    }

    /// Owned metadata for this entry, suitable for request extensions.
    pub fn to_matched(&self) -> MatchedRoute {
        MatchedRoute {
            method: self.method,
            template: self.template.as_str().to_string(),
            permissions: self.permissions.clone(),
        }
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// Metadata of the route that served a request, inserted into request extensions.
///
/// An authorization layer in front of the handlers can read the declared
/// permissions from here without consulting the table again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    pub method: HttpMethod,
    pub template: String,
    pub permissions: PermissionSet,
}

/// Variables captured from the request path, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, String)>> for PathParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

/// Successful lookup: the entry and the variables it captured.
#[derive(Debug)]
pub struct PathMatch<'a> {
    pub entry: &'a RouteEntry,
    pub params: PathParams,
}

/// Why a lookup produced no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMiss {
    /// No template matches the path under any method.
    NotFound,
    /// The path matches, but only under these methods.
    MethodNotAllowed(Vec<HttpMethod>),
}

/// Collects routes during startup.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// Fails when a route for the same method has the same template after
    /// variable names are erased: both would accept exactly the same paths.
    pub fn register<H: Handler>(
        &mut self,
        method: HttpMethod,
        template: &str,
        permissions: impl Into<PermissionSet>,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.register_boxed(method, template, permissions.into(), crate::handler::boxed(handler))
    }

    /// Register an already type-erased handler.
    pub fn register_boxed(
        &mut self,
        method: HttpMethod,
        template: &str,
        permissions: PermissionSet,
        handler: BoxHandler,
    ) -> Result<&mut Self, RouteError> {
        let template = PathTemplate::parse(template)?;
        let shape = template.shape();

        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.method == method && e.template.shape() == shape)
        {
            return Err(RouteError::Ambiguous {
                method,
                template: template.as_str().to_string(),
                existing: existing.template.as_str().to_string(),
            });
        }

        tracing::debug!(
            method = %method,
            template = %template,
            permissions = %permissions,
            "Route registered"
        );

        self.entries.push(RouteEntry {
            method,
            template,
            permissions,
            handler,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the table. No further registration is possible.
    pub fn build(self) -> RouteTable {
        tracing::info!(routes = self.entries.len(), "Route table frozen");
        RouteTable {
            entries: self.entries,
        }
    }
}

/// Immutable route table, read concurrently by every request.
#[derive(Debug)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Every registered entry, in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `(method, path) -> permissions` map for the external policy compiler.
    pub fn permission_manifest(&self) -> PermissionManifest {
        PermissionManifest::from_routes(
            self.entries
                .iter()
                .map(|e| (e.method.as_str(), e.template.as_str(), &e.permissions)),
        )
    }

    /// Find the most specific entry for `(method, path)`.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<PathMatch<'_>, RouteMiss> {
        let parts = split_path(path).ok_or(RouteMiss::NotFound)?;
        let wanted = HttpMethod::from_http(method);

        let mut best: Option<(&RouteEntry, Vec<(String, String)>)> = None;
        let mut allowed: Vec<HttpMethod> = Vec::new();

        for entry in &self.entries {
            let Some(captures) = entry.template.match_segments(&parts) else {
                continue;
            };

            if Some(entry.method) != wanted {
                if !allowed.contains(&entry.method) {
                    allowed.push(entry.method);
                }
                continue;
            }

            let more_specific = match &best {
                Some((current, _)) => entry.template.specificity_cmp(&current.template).is_gt(),
                None => true,
            };
            if more_specific {
                best = Some((entry, captures));
            }
        }

        match best {
            Some((entry, captures)) => Ok(PathMatch {
                entry,
                params: PathParams::from(captures),
            }),
            None if allowed.is_empty() => Err(RouteMiss::NotFound),
            None => {
                allowed.sort();
                Err(RouteMiss::MethodNotAllowed(allowed))
            }
        }
    }
}
