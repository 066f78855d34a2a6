//! Helper configuration persistence.
//!
//! JSON on disk, written atomically (temp file + rename). Loading applies
//! the config invariants (interval floor, TTL floor) so the rest of the
//! system never sees out-of-range values, no matter what was edited by
//! hand.

use std::path::{Path, PathBuf};

use gcli_helper_types::{HelperConfig, HelperError, HelperResult};

const CONFIG_FILE: &str = "helper_config.json";

/// Path of the config file inside the data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load the configuration, falling back to defaults when the file does
/// not exist yet.
pub async fn load_config(path: &Path) -> HelperResult<HelperConfig> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let config: HelperConfig = serde_json::from_str(&content)
                .map_err(|e| HelperError::Config(format!("failed to parse {:?}: {}", path, e)))?;
            Ok(config.normalized())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HelperConfig::default()),
        Err(e) => Err(HelperError::Io(e)),
    }
}

/// Save the configuration atomically.
pub async fn save_config(path: &Path, config: &HelperConfig) -> HelperResult<()> {
    let content = serde_json::to_string_pretty(config)?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, content).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
