//! # Thumbnail Mender
//!
//! A media-library maintenance tool: it reconciles thumbnail assets against
//! the image database and the on-disk tree, repairs inconsistencies and
//! backfills missing derivatives, reporting live progress as it goes.
//!
//! ## Core Philosophy
//! - **Never auto-delete** - true orphans are reported, never removed
//! - **Observe, don't own** - all job state lives server-side; this client
//!   launches jobs and polls them
//! - **Partial results count** - a cancelled rebuild still shows what it did
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation
//! layers:
//! - `core` - The reconciliation and rebuild engine
//! - `protocol` - Wire types for the job-launch/polling protocol
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//!
//! The `thumb-mend` binary layers a CLI on top of this library.

pub mod core;
pub mod error;
pub mod events;
pub mod protocol;

// Re-export commonly used types at the crate root
pub use error::{MendError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
