// treesync CLI library: the sync entry point, run locks and the exit-code
// registry, shared by the binary and its integration tests.

pub mod exit_codes;
pub mod lock;
pub mod sync;
