//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     (method, "/datasets/{dataset}:setDefault", permissions, handler)
//!     → matcher.rs (compile template into segments)
//!     → router.rs (reject ambiguous shapes, append entry)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (method, path)
//!     → router.rs (scan entries, filter by method)
//!     → matcher.rs (segment match, capture variables, rank specificity)
//!     → Return: PathMatch, NotFound or MethodNotAllowed
//!
//! Offline extraction:
//!     RouteTable::permission_manifest()
//!     → permissions.rs (sorted (method, path) -> permissions records)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex: custom-method suffixes are their own segment variant
//! - Deterministic: most specific template wins, independent of registration order
//! - Permissions are declared here and enforced elsewhere

pub mod matcher;
pub mod permissions;
pub mod router;

pub use matcher::{PathTemplate, Segment, TemplateError};
pub use permissions::{PermissionManifest, PermissionRecord, PermissionSet};
pub use router::{
    HttpMethod, MatchedRoute, PathMatch, PathParams, RouteEntry, RouteError, RouteMiss, RouteTable,
    RouteTableBuilder,
};
