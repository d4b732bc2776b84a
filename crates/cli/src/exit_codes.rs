//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: cron jobs and scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | CLI usage error (bad args, unknown source)       |
//! | 3    | Config file missing, unreadable or invalid       |
//! | 4    | Loading failed (file, CSV, spreadsheet, HTTP)    |
//! | 5    | Duplicate natural keys in incoming or snapshot   |
//! | 6    | Store failure (SQLite open, read or mutation)    |
//! | 7    | Another run of the same source holds the lock    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `sync_exit_code` or the command's error handling

use treesync_recon::ReconError;

use crate::sync::SyncError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown source or strategy.
pub const EXIT_USAGE: u8 = 2;

/// Config file missing (when named explicitly), unreadable or invalid.
pub const EXIT_CONFIG: u8 = 3;

/// Loader failed before any store mutation.
pub const EXIT_LOAD: u8 = 4;

/// Duplicate `(gmlid, source)` keys; nothing was written.
pub const EXIT_DUPLICATE_KEYS: u8 = 5;

/// Store failure. Inside a transaction nothing was written.
pub const EXIT_STORE: u8 = 6;

/// Run lock held by another process.
pub const EXIT_LOCKED: u8 = 7;

/// Map a SyncError to its exit code.
pub fn sync_exit_code(err: &SyncError) -> u8 {
    match err {
        SyncError::Load(treesync_io::LoadError::UnknownSource { .. })
        | SyncError::Load(treesync_io::LoadError::MissingOption { .. }) => EXIT_USAGE,
        SyncError::Load(_) => EXIT_LOAD,
        SyncError::Recon(ReconError::DuplicateKey { .. }) => EXIT_DUPLICATE_KEYS,
        SyncError::Recon(ReconError::Store { .. }) | SyncError::Store(_) => EXIT_STORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesync_io::LoadError;
    use treesync_recon::StoreError;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_CONFIG,
            EXIT_LOAD,
            EXIT_DUPLICATE_KEYS,
            EXIT_STORE,
            EXIT_LOCKED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn sync_errors_map_to_codes() {
        let unknown = SyncError::Load(LoadError::UnknownSource {
            kind: "strategy",
            name: "ftp".into(),
        });
        assert_eq!(sync_exit_code(&unknown), EXIT_USAGE);
        let missing = SyncError::Load(LoadError::MissingColumn("Id".into()));
        assert_eq!(sync_exit_code(&missing), EXIT_LOAD);
        let store = SyncError::Store(StoreError::Message("disk full".into()));
        assert_eq!(sync_exit_code(&store), EXIT_STORE);
    }
}
