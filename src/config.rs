use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::storage::RecordStore;
use crate::{Error, Result, LABEL_DELIMITER};

pub const DB_FILE: &str = "db.sqlite";
pub const SETTINGS_JSON_FILE: &str = "settings.json";
pub const SETTINGS_TOML_FILE: &str = "settings.toml";
pub const LOGS_FILE: &str = "logs.log";

/// Kind of item being labelled; selects how it is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Image,
    Text,
    Video,
    Audio,
    Webpage,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Image => "image",
            ItemType::Text => "text",
            ItemType::Video => "video",
            ItemType::Audio => "audio",
            ItemType::Webpage => "webpage",
        }
    }
}

impl std::str::FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(ItemType::Image),
            "text" => Ok(ItemType::Text),
            "video" => Ok(ItemType::Video),
            "audio" => Ok(ItemType::Audio),
            "webpage" => Ok(ItemType::Webpage),
            _ => Err(Error::InvalidSettings(format!("unknown item type: {s}"))),
        }
    }
}

/// Annotation settings read from the work directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Question shown to the annotator
    pub task: String,
    /// Offered label choices; free text when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.task.trim().is_empty() {
            return Err(Error::InvalidSettings("task must not be empty".to_string()));
        }
        let is_bad = |l: &String| {
            l.trim().is_empty() || l.contains(LABEL_DELIMITER) || l.contains(&['\t', '\n', '\r'][..])
        };
        if let Some(bad) = self.labels.iter().find(|l| is_bad(l)) {
            return Err(Error::InvalidSettings(format!(
                "label choice {bad:?} is blank or contains {LABEL_DELIMITER:?}, a tab or a line break"
            )));
        }
        Ok(())
    }
}

/// Layout of a work directory: database, settings and logs side by side
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DB_FILE)
    }

    pub fn logs_path(&self) -> PathBuf {
        self.root.join(LOGS_FILE)
    }

    /// Settings file in use: `settings.json` wins over `settings.toml`
    pub fn settings_path(&self) -> Option<PathBuf> {
        [SETTINGS_JSON_FILE, SETTINGS_TOML_FILE]
            .iter()
            .map(|name| self.root.join(name))
            .find(|path| path.exists())
    }

    pub fn load_settings(&self) -> Result<Settings> {
        match self.settings_path() {
            Some(path) => load_settings(&path),
            None => Err(Error::ConfigurationMissing(self.root.join(SETTINGS_JSON_FILE))),
        }
    }

    /// Fails unless `init` has written settings into an existing directory
    pub fn require_initialised(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::WorkDirMissing(self.root.clone()));
        }
        if self.settings_path().is_none() {
            return Err(Error::ConfigurationMissing(self.root.join(SETTINGS_JSON_FILE)));
        }
        Ok(())
    }

    /// Open the record store of an initialised work directory.
    ///
    /// Never creates the directory; only `init` does that.
    pub fn open_store(&self) -> Result<RecordStore> {
        self.require_initialised()?;
        let db_path = self.database_path();
        tracing::info!("Connecting to database file at {}", db_path.display());
        RecordStore::open(&db_path)
    }

    pub fn ensure_exists(&self) -> Result<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// Load settings from a `.json` or `.toml` file
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::ConfigurationMissing(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    let settings: Settings = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&contents)?,
        _ => serde_json::from_str(&contents)?,
    };
    settings.validate()?;
    tracing::debug!("Loaded the settings: {:?}", settings);
    Ok(settings)
}

pub fn write_settings(path: &Path, settings: &Settings, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("settings already exist at {} (use --force to overwrite)", path.display());
    }
    settings.validate()?;

    let contents = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::to_string_pretty(settings)?,
        _ => serde_json::to_string_pretty(settings)?,
    };
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings {
            item_type: ItemType::Image,
            task: "What animal is this?".to_string(),
            labels: vec!["cat".to_string(), "dog".to_string()],
        }
    }

    #[test]
    fn test_load_json_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_JSON_FILE),
            r#"{"type": "text", "task": "Is this spam?"}"#,
        )
        .unwrap();

        let settings = WorkDir::new(dir.path()).load_settings().unwrap();
        assert_eq!(settings.item_type, ItemType::Text);
        assert_eq!(settings.task, "Is this spam?");
        assert!(settings.labels.is_empty());
    }

    #[test]
    fn test_toml_roundtrip_and_json_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let work = WorkDir::new(dir.path());
        let toml_path = dir.path().join(SETTINGS_TOML_FILE);

        write_settings(&toml_path, &sample(), false).unwrap();
        assert_eq!(work.load_settings().unwrap(), sample());
        assert!(write_settings(&toml_path, &sample(), false).is_err());

        std::fs::write(dir.path().join(SETTINGS_JSON_FILE), r#"{"type": "video", "task": "t"}"#).unwrap();
        assert_eq!(work.load_settings().unwrap().item_type, ItemType::Video);
    }

    #[test]
    fn test_missing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorkDir::new(dir.path()).load_settings().unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }

    #[test]
    fn test_uninitialised_work_dir_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let typo = WorkDir::new(dir.path().join("typo"));
        let err = typo.open_store().unwrap_err();
        assert!(matches!(err, Error::WorkDirMissing(_)));
        assert!(!typo.root().exists());

        let empty = WorkDir::new(dir.path());
        let err = empty.open_store().unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
        assert!(!empty.database_path().exists());

        write_settings(&dir.path().join(SETTINGS_TOML_FILE), &sample(), false).unwrap();
        let store = empty.open_store().unwrap();
        assert_eq!(store.status().unwrap().total, 0);
        assert!(empty.database_path().exists());
    }

    #[test]
    fn test_rejects_bad_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_JSON_FILE);

        std::fs::write(&path, r#"{"type": "hologram", "task": "t"}"#).unwrap();
        assert!(matches!(load_settings(&path).unwrap_err(), Error::Json(_)));

        std::fs::write(&path, r#"{"type": "image", "task": "t", "labels": ["a,b"]}"#).unwrap();
        assert!(matches!(load_settings(&path).unwrap_err(), Error::InvalidSettings(_)));

        std::fs::write(&path, r#"{"type": "image", "task": "t", "labels": ["a\tb"]}"#).unwrap();
        assert!(matches!(load_settings(&path).unwrap_err(), Error::InvalidSettings(_)));
    }

    #[test]
    fn test_item_type_from_str() {
        assert_eq!("Image".parse::<ItemType>().unwrap(), ItemType::Image);
        assert!("pdf".parse::<ItemType>().is_err());
    }
}
