//! fsmeta-core: a unified view of mounted storage volumes across
//! heterogeneous operating systems.
//!
//! Incompatible native representations are normalized into one consistent
//! model while the latency and concurrency of inherently unreliable I/O
//! (network shares, spun-down media, permission-denied directories) stay
//! bounded: every native query races a cancellable deadline, concurrent
//! native calls share a ceiling, and per-platform raw enumeration is merged
//! with mount-table parsing to fill the gaps the native layer cannot cheaply
//! provide.
//!
//! Every call is a fresh, stateless query — nothing is persisted between
//! invocations, and configuration is an explicit [`Options`] value threaded
//! through each call. This is not a filesystem driver: volumes are never
//! mounted, unmounted, or modified, with the single exception of the opt-in
//! hidden-attribute setters in [`hidden`].

pub mod concurrency;
pub mod error;
pub mod fstype;
pub mod glob;
pub mod hidden;
pub mod metadata;
pub mod mounts;
pub mod options;
pub mod remote;
pub mod resolver;
pub mod timeout;
pub mod types;

mod native;

pub use concurrency::map_concurrent;
pub use error::{FsError, FsResult};
pub use hidden::{
	get_hidden_metadata, hide_support, is_dot_prefix_hidden, is_hidden, is_hidden_recursive,
	set_hidden,
};
pub use metadata::{all_volume_metadata, volume_metadata};
pub use options::Options;
pub use remote::extract_remote_info;
pub use resolver::resolve_mount_points;
pub use timeout::with_timeout;
pub use types::{
	HealthStatus, HiddenMetadata, HideMethod, HideSupport, MountPoint, RemoteInfo,
	SetHiddenResult, VolumeMetadata,
};
