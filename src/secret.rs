use anyhow::{Context, Result};
use tokio::process::Command;

use crate::config::HeartbeatConfig;

/// Environment override for the Gemini credential. Checked before the
/// external secret store so local runs and tests skip the gcloud call.
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Resolve the Gemini API key: environment first, then the external secret
/// store. Failures propagate; the credential itself is not validated here.
pub async fn fetch_gemini_key(config: &HeartbeatConfig) -> Result<String> {
    if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            tracing::debug!("Using Gemini key from {}", GEMINI_KEY_ENV);
            return Ok(key.to_string());
        }
    }

    let output = Command::new("gcloud")
        .args(["secrets", "versions", "access", "latest"])
        .arg(format!("--secret={}", config.gemini_secret_name))
        .arg(format!("--project={}", config.gemini_secret_project))
        .output()
        .await
        .context("Failed to run gcloud secret access")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "Secret access for {} failed ({}): {}",
            config.gemini_secret_name,
            output.status,
            stderr.trim()
        );
    }

    let key = String::from_utf8(output.stdout)
        .context("Secret value is not valid UTF-8")?
        .trim()
        .to_string();
    if key.is_empty() {
        anyhow::bail!("Secret {} resolved to an empty value", config.gemini_secret_name);
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn env_var_takes_priority_over_secret_store() {
        std::env::set_var(GEMINI_KEY_ENV, "  env-key-123  ");

        let key = fetch_gemini_key(&HeartbeatConfig::default()).await.unwrap();
        assert_eq!(key, "env-key-123");

        std::env::remove_var(GEMINI_KEY_ENV);
    }
}
