use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Class names, one per line, in model output order
///
/// Lines are trimmed but blank ones are kept so indices stay aligned.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read class names from {}", path.display()))?;

    let labels: Vec<String> = content.lines().map(|line| line.trim().to_string()).collect();
    tracing::debug!("Loaded {} class names from {}", labels.len(), path.display());

    Ok(labels)
}

/// Indices of the `k` largest scores, largest first
///
/// Equal scores keep their index order.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(k);
    order
}
