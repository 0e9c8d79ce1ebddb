//! Edgeform State Management
//!
//! Remembers which remote entity each declared block is bound to. The host
//! CLI reads the state before planning, and writes it back after every
//! apply, destroy or import while holding the state lock.
//!
//! # Example
//!
//! ```ignore
//! use edgeform_state::{LocalBackend, StateBackend, StateFile};
//!
//! let backend = LocalBackend::with_path("edgeform.state.json".into());
//!
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//!
//! // ... reconcile resources ...
//!
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendError, BackendResult, StateBackend};
pub use backends::LocalBackend;
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
