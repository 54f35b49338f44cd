use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use creatorhub_core::reporting::{export_csv, export_filename, ExportKind};
use sqlx::PgPool;

pub(crate) async fn run_export(
    pool: &PgPool,
    kind: ExportKind,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let snapshot = creatorhub_db::load_snapshot(pool).await?;
    let csv = export_csv(kind, &snapshot);
    let path = out.unwrap_or_else(|| PathBuf::from(export_filename(kind, Utc::now().date_naive())));

    tokio::fs::write(&path, csv.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    // Header line excluded.
    let rows = csv.lines().count().saturating_sub(1);
    tracing::info!(kind = %kind, rows, path = %path.display(), "export written");
    println!("wrote {rows} row(s) to {}", path.display());
    Ok(())
}
