//! Shared plumbing for the `kryc` and `kryon-renderer` binaries.

pub mod inspect;
pub mod logging;
