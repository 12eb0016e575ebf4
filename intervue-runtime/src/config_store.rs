use anyhow::Context;
use intervue_core::config::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::default_app_config;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<AppConfig> {
        let bytes =
            fs::read(&self.path).with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: AppConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Loads the file, or writes and returns the defaults when it does not exist.
    pub fn load_or_init(&self) -> anyhow::Result<AppConfig> {
        if self.path.exists() {
            return self.load();
        }
        let cfg = default_app_config();
        self.save(&cfg)?;
        log::info!("wrote default config to {}", self.path.display());
        Ok(cfg)
    }

    pub fn save(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config directory: {}", parent.display()))?;
        }

        // Write temp then replace.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write temp: {}", tmp.display()))?;
        replace_file(&tmp, &self.path)
            .with_context(|| format!("replace file: {}", self.path.display()))?;
        Ok(())
    }
}

fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = fs::remove_file(&backup);
        fs::rename(dst, &backup)
            .with_context(|| format!("rename {} -> {}", dst.display(), backup.display()))?;
    }

    if let Err(e) = fs::rename(tmp, dst) {
        // Put the previous file back if we moved one aside.
        if backup.exists() {
            let _ = fs::rename(&backup, dst);
        }
        let _ = fs::remove_file(tmp);
        return Err(anyhow::Error::new(e).context(format!(
            "rename {} -> {}",
            tmp.display(),
            dst.display()
        )));
    }

    let _ = fs::remove_file(&backup);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("config.json"));

        let mut cfg = default_app_config();
        cfg.interview.max_warnings = 5;
        cfg.interview.require_camera_for_answers = false;
        cfg.mock_oracles = true;
        cfg.catalog_path = Some("questions.json".into());

        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap(), cfg);

        // Overwrite in place.
        cfg.llm.model = "gpt-4o".into();
        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap().llm.model, "gpt-4o");
        assert!(!dir.path().join("config.bak").exists());
    }

    #[test]
    fn missing_file_initializes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("nested").join("config.json"));

        let cfg = store.load_or_init().unwrap();
        assert_eq!(cfg, default_app_config());
        assert!(store.path().exists());
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "interview": {
                    "hard_questions": 2,
                    "other_questions": 8,
                    "max_probe_questions": 4,
                    "max_warnings": 3,
                    "frame_sample_every": 10,
                    "detection_threshold": 0.9
                },
                "llm": {"base_url": "https://api.openai.com/v1", "model": "gpt-4o-mini"},
                "detector": {"base_url": "http://127.0.0.1:8008"},
                "database_path": "candidates.db"
            }"#,
        )
        .unwrap();

        let cfg = ConfigStore::at_path(path).load().unwrap();
        assert!(cfg.interview.require_camera_for_answers);
        assert!(!cfg.mock_oracles);
        assert_eq!(cfg.catalog_path, None);
    }
}
