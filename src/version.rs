//! Checks whether the local app is on the same version as a reference copy.

use crate::fetch::{HttpClient, load};
use anyhow::{Context, Result};
use tracing::info;

/// Both version strings, as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    pub current: String,
    pub reference: String,
}

impl VersionCheck {
    /// Exact comparison; no trimming, so a stray newline counts as a change.
    pub fn is_current(&self) -> bool {
        self.current == self.reference
    }
}

/// Reads the local version file and the reference (path or URL).
#[tracing::instrument(skip(client))]
pub async fn check_version<C: HttpClient>(
    client: &C,
    current_path: &str,
    reference: &str,
) -> Result<VersionCheck> {
    let current = std::fs::read_to_string(current_path)
        .with_context(|| format!("reading current version from '{current_path}'"))?;
    let reference_bytes = load(client, reference)
        .await
        .with_context(|| format!("reading reference version from '{reference}'"))?;
    let reference = String::from_utf8(reference_bytes).context("reference version is not UTF-8")?;

    let check = VersionCheck { current, reference };
    info!(
        current = %check.current.trim(),
        reference = %check.reference.trim(),
        up_to_date = check.is_current(),
        "Version check"
    );
    Ok(check)
}
