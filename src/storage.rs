use crate::constants::{SESSION_FILE, TOKEN_KEY};
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persists the bearer token across restarts.
///
/// The token is the only persisted client state. It is stored in a small
/// YAML map under [`TOKEN_KEY`]; a missing file or key means "logged out".
#[derive(Clone, Debug)]
pub struct TokenStore {
    data_dir: PathBuf,
}

impl TokenStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        TokenStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    /// Ensure data directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }

    fn read_map(path: &Path) -> Result<BTreeMap<String, String>> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Read the persisted token, if any
    pub fn load(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let map = Self::read_map(&path)?;
        Ok(map.get(TOKEN_KEY).filter(|t| !t.is_empty()).cloned())
    }

    pub fn save(&self, token: &str) -> Result<()> {
        self.ensure_dir()?;
        let path = self.path();
        let mut map = if path.exists() {
            Self::read_map(&path).unwrap_or_default()
        } else {
            BTreeMap::new()
        };
        map.insert(TOKEN_KEY.to_string(), token.to_string());
        fs::write(path, serde_yaml::to_string(&map)?)?;
        Ok(())
    }

    /// Discard the persisted token
    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
