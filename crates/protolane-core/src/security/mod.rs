//! Validation applied to untrusted archive entries and relay destinations.

pub mod host;
pub mod path;
pub mod quota;

pub use host::HostPolicy;
pub use host::is_global_unicast;
pub use path::normalize_entry_name;
pub use path::resolve_entry_path;
pub use quota::SizeBudget;
