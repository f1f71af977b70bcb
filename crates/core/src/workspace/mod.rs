//! Local workspace the locked item is mirrored into.

pub mod cleanup;
pub mod provision;

pub use cleanup::{CleanupReport, WorkspaceCleanup, deletion_queue};
pub use provision::{PROFILE_DIR, WorkspaceHandle, WorkspaceProvisioner};
