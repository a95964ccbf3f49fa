// crates/gatekeeper-store-sqlite/src/lib.rs
// ============================================================================
// Module: Gatekeeper SQLite Catalog Store
// Description: SQLite-backed implementation of `gatekeeper_core::CatalogStore`.
// Purpose: Durable, single-file storage for the `packages` table (§6), safe
//          under concurrent access from the Gate and Orchestrator processes.
// Dependencies: gatekeeper-core, rusqlite, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! The catalog is a single SQLite database shared by the Gate (reads and
//! pending-inserts) and the Orchestrator (claims and finalizes). WAL mode
//! plus a generous busy timeout let both processes hold the file open
//! concurrently without callers needing to implement their own retry loop
//! for `SQLITE_BUSY`.

pub mod store;

pub use store::SqliteCatalogStore;
pub use store::SqliteStoreError;
