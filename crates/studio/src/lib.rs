//! Command implementations of the `studio` binary.

#![forbid(unsafe_code)]

pub mod config;

pub use config::StudioConfig;

use anyhow::{Context as _, Result, anyhow};
use css_engine::{CompilerOptions, CssArtifact, StyleCompiler};
use log::info;
use std::fs::{read_to_string, write};
use std::path::Path;
use studio_data::ProjectSnapshot;
use studio_store::{ProjectData, RawTransaction, Transaction};
use studio_sync::{FlushReport, HttpTransport, SyncConfig, SyncQueue, Transport};

/// Load a project snapshot from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<ProjectSnapshot> {
    let text =
        read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    ProjectSnapshot::from_json(&text).with_context(|| format!("invalid snapshot {}", path.display()))
}

/// Compile the snapshot at `snapshot_path` into a stylesheet, writing it to
/// `out` when given.
///
/// # Errors
/// Returns an error if the snapshot cannot be loaded, its breakpoints are
/// inconsistent, or the output cannot be written.
pub fn compile(
    snapshot_path: &Path,
    out: Option<&Path>,
    options: CompilerOptions,
) -> Result<CssArtifact> {
    let snapshot = load_snapshot(snapshot_path)?;
    let mut compiler = StyleCompiler::new(options);
    let delta = compiler
        .compile(snapshot.view())
        .with_context(|| format!("failed to compile {}", snapshot_path.display()))?;
    let artifact = CssArtifact::new(delta.css_text);
    if let Some(out) = out {
        write(out, artifact.css_text())
            .with_context(|| format!("failed to write {}", out.display()))?;
        info!("wrote {} ({})", out.display(), artifact.file_name());
    }
    Ok(artifact)
}

/// Read a JSON array of transactions, checking every namespace and that the
/// whole list replays cleanly on top of `snapshot`.
///
/// # Errors
/// Returns an error for unreadable files, unknown namespaces and patches
/// that do not apply.
pub fn load_transactions(path: &Path, snapshot: ProjectSnapshot) -> Result<Vec<Transaction>> {
    let text =
        read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Vec<RawTransaction> = serde_json::from_str(&text)
        .with_context(|| format!("invalid transactions file {}", path.display()))?;
    let mut replica = ProjectData::from_snapshot(snapshot);
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| -> Result<Transaction> {
            let transaction = raw
                .validate()
                .with_context(|| format!("transaction {index} rejected"))?;
            replica
                .apply_transaction(&transaction)
                .with_context(|| format!("transaction {index} does not apply"))?;
            Ok(transaction)
        })
        .collect()
}

/// Queue `transactions` for one project and flush them through `transport`.
///
/// # Errors
/// Returns an error if the batch could not be delivered.
pub async fn push<T: Transport>(
    transport: T,
    config: SyncConfig,
    project_id: &str,
    build_id: &str,
    transactions: Vec<Transaction>,
) -> Result<FlushReport> {
    let handle = SyncQueue::spawn(transport, config);
    for transaction in transactions {
        handle.enqueue(project_id, build_id, transaction)?;
    }
    let report = handle.shutdown().await?;
    if let Some(failure) = report.failures.first() {
        return Err(anyhow!(
            "push to project {} failed: {}",
            failure.project_id,
            failure.error
        ));
    }
    Ok(report)
}

/// [`push`] over HTTP to the configured endpoint.
///
/// # Errors
/// Returns an error if no endpoint is configured or delivery fails.
pub async fn push_http(
    config: &StudioConfig,
    project_id: &str,
    build_id: &str,
    transactions: Vec<Transaction>,
) -> Result<FlushReport> {
    let endpoint = config
        .sync_url
        .clone()
        .ok_or_else(|| anyhow!("no sync endpoint configured, set STUDIO_SYNC_URL"))?;
    let transport = HttpTransport::new(endpoint)?;
    push(transport, config.sync_config(), project_id, build_id, transactions).await
}
