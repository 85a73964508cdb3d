use crate::error::AppError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const USERS_KEY: &str = "users_v1";
pub const SESSION_KEY: &str = "session_v1";
const STORE_FILE_NAME: &str = "store.json";
const STORE_ENV_VAR: &str = "PLANNER_STORE_PATH";

/// Key holding an identity's task collection. An empty or absent username
/// falls back to the reserved anonymous bucket.
pub fn items_key(username: Option<&str>) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("items_{name}"),
        _ => "items__anon".to_string(),
    }
}

/// The injected storage primitive: flat text values under string keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("planner").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("planner")
            .join(STORE_FILE_NAME))
    }
}

/// File-backed store: one JSON object of key -> text per file, rewritten
/// whole on every mutation. There is exactly one writer, the active session.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    path: PathBuf,
}

impl FileKvStore {
    pub fn open_default() -> Result<Self, AppError> {
        Ok(Self { path: store_path()? })
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, AppError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| AppError::storage(err.to_string()))?;
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))
    }

    // Corrupt payloads are replaced on the next write; I/O failures propagate.
    fn read_entries_for_write(&self) -> Result<HashMap<String, String>, AppError> {
        match self.read_entries() {
            Ok(entries) => Ok(entries),
            Err(AppError::InvalidData(_)) => Ok(HashMap::new()),
            Err(err) => Err(err),
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::storage(err.to_string()))?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        std::fs::write(&self.path, content).map_err(|err| AppError::storage(err.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions)
                .map_err(|err| AppError::storage(err.to_string()))?;
        }

        Ok(())
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.read_entries_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.read_entries_for_write()?;
        entries.remove(key);
        self.write_entries(&entries)
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
