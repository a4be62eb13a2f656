//! Bulk import / destroy of the insight collection.
//!
//! Used by `insights seed`. Import replaces the whole collection with the
//! contents of a JSON array file; destroy empties it. The delete and the
//! insert are separate steps: if the insert fails the collection is left
//! empty. The insert itself is all-or-nothing.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::Insight;
use crate::store::Store;

/// What a seeding run should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    Import,
    Destroy,
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub deleted: u64,
    pub inserted: u64,
}

pub const USAGE: &str = "Please use -i to import data or -d to destroy data.";

/// Read and parse a seed file: a JSON array of insight objects.
pub fn load_seed_file(path: &Path) -> Result<Vec<Insight>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let records: Vec<Insight> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;
    Ok(records)
}

/// Delete every record, then insert `records`.
pub async fn import(store: &dyn Store, records: &[Insight]) -> Result<ImportSummary> {
    let deleted = store
        .delete_all()
        .await
        .context("Failed to clear existing insights")?;
    tracing::debug!(deleted, "cleared collection before import");

    let inserted = store
        .insert_many(records)
        .await
        .context("Failed to insert insights")?;

    tracing::info!(deleted, inserted, "data imported");
    Ok(ImportSummary { deleted, inserted })
}

/// Delete every record. Returns the number removed.
pub async fn destroy(store: &dyn Store) -> Result<u64> {
    let deleted = store
        .delete_all()
        .await
        .context("Failed to delete insights")?;
    tracing::info!(deleted, "data destroyed");
    Ok(deleted)
}

/// Run one seeding mode. The seed file is only read for [`SeedMode::Import`].
pub async fn run_seed(store: &dyn Store, mode: SeedMode, path: &Path) -> Result<()> {
    match mode {
        SeedMode::Import => {
            let records = load_seed_file(path)?;
            let summary = import(store, &records).await?;
            println!(
                "Data imported successfully: {} insights ({} replaced).",
                summary.inserted, summary.deleted
            );
        }
        SeedMode::Destroy => {
            let deleted = destroy(store).await?;
            println!("Data destroyed successfully: {} insights removed.", deleted);
        }
    }
    Ok(())
}
