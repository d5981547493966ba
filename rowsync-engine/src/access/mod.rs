//! Caller roles, table lock settings, and the permission decisions derived from them.

pub mod context;
pub mod policy;
pub mod projection;
pub mod roles;

pub use context::{resolve_access, AccessColumnKind, AccessContext};
pub use policy::{allow_row_change, can_modify_filter_fields};
pub use projection::{is_visible, project_effective_access, EffectiveAccess};
pub use roles::{has_role, is_privileged, parse_roles, RoleCache, Roles};
