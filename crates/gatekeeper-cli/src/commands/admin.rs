// crates/gatekeeper-cli/src/commands/admin.rs
// ============================================================================
// Module: Admin Commands
// Description: Read-only catalog inspection (`status`, `list`).
// Purpose: Give an operator a quick look at the catalog without going
//          through the Gate's admin HTTP endpoints, grounded on
//          `original_source/check_db.py` and `original_source/list_packages.py`.
// Dependencies: gatekeeper-core, gatekeeper-store-sqlite
// ============================================================================

use std::error::Error;
use std::io::Write;

use gatekeeper_core::CatalogStore;
use gatekeeper_core::ScanStatus;
use gatekeeper_store_sqlite::SqliteCatalogStore;

fn open_store() -> Result<SqliteCatalogStore, Box<dyn Error>> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is not set")?;
    Ok(SqliteCatalogStore::open(&database_url)?)
}

fn write_line(message: &str) -> std::io::Result<()> {
    writeln!(std::io::stdout(), "{message}")
}

pub(crate) fn status() -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let counts = store.count_by_status()?;
    if counts.is_empty() {
        write_line("no rows in catalog")?;
        return Ok(());
    }
    for status in ScanStatus::ALL {
        let count = counts.iter().find(|(s, _)| *s == status).map_or(0, |(_, count)| *count);
        write_line(&format!("{:<14} {count}", status.as_str()))?;
    }
    Ok(())
}

pub(crate) fn list(pending: bool, limit: u32, offset: u32) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let rows = if pending { store.list_pending(limit, offset)? } else { store.list_all(limit, offset)? };
    if rows.is_empty() {
        write_line("no rows found")?;
        return Ok(());
    }
    for row in rows {
        write_line(&format!(
            "{}=={} status={} runtime={} updated_at={}",
            row.name,
            row.version,
            row.status,
            row.runtime_version.as_ref().map_or("-", |v| v.as_str()),
            row.updated_at
        ))?;
    }
    Ok(())
}
