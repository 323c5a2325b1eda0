//! Loading catalog and interaction snapshots from JSON files.

use crate::{Catalog, InteractionLog};
use shoprec_core::{CoreError, ExplanationFeedback, Interaction, Product};
use std::path::Path;
use tracing::{error, info};

pub async fn load_catalog(path: &Path) -> Result<Catalog, CoreError> {
    let products: Vec<Product> = read_json(path).await?;
    let catalog = Catalog::new(products)?;
    info!("Loaded {} products from {}", catalog.len(), path.display());
    Ok(catalog)
}

pub async fn load_interactions(path: &Path) -> Result<InteractionLog, CoreError> {
    let entries: Vec<Interaction> = read_json(path).await?;
    info!("Loaded {} interactions from {}", entries.len(), path.display());
    Ok(InteractionLog::new(entries))
}

/// Explanation feedback. A missing file means nobody has rated anything yet.
pub async fn load_feedback(path: &Path) -> Result<Vec<ExplanationFeedback>, CoreError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        info!("No feedback snapshot at {}", path.display());
        return Ok(Vec::new());
    }
    let entries: Vec<ExplanationFeedback> = read_json(path).await?;
    info!("Loaded {} feedback entries from {}", entries.len(), path.display());
    Ok(entries)
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        CoreError::Io(e)
    })?;
    serde_json::from_slice(&raw).map_err(|e| {
        error!("Failed to parse {}: {}", path.display(), e);
        CoreError::Serialization(e)
    })
}
