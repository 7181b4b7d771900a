use crate::error::AppError;
use crate::storage::KeyValueStorage;
use std::path::{Path, PathBuf};

pub const STORAGE_DIR_ENV_VAR: &str = "TASKPAD_STORAGE_DIR";
const ITEM_EXTENSION: &str = "json";

/// Resolves the storage directory.
///
/// Precedence: `TASKPAD_STORAGE_DIR`, then the configured directory, then the
/// per-user default.
pub fn storage_dir(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORAGE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskpad").join("storage"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskpad")
            .join("storage"))
    }
}

/// Directory-backed storage: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn item_path(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
        if !valid {
            return Err(AppError::invalid_input(format!(
                "storage key '{key}' must be non-empty ASCII letters, digits, '-', '_' or '.'"
            )));
        }
        Ok(self.dir.join(format!("{key}.{ITEM_EXTENSION}")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.item_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        Ok(Some(content))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.item_path(key)?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| AppError::io(format!("{}: {}", self.dir.display(), err)))?;
        std::fs::write(&path, value)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), AppError> {
        let path = self.item_path(key)?;
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), AppError> {
        if !self.dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_item = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(ITEM_EXTENSION);
            if is_item {
                std::fs::remove_file(&path)
                    .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileStorage;
    use crate::storage::KeyValueStorage;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskpad-{nanos}-{name}"))
    }

    #[test]
    fn set_and_get_round_trip() {
        let dir = temp_dir("file-round-trip");
        let mut storage = FileStorage::new(&dir);

        storage.set_item("tasks", "[]").unwrap();
        let loaded = storage.get_item("tasks").unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded.as_deref(), Some("[]"));
    }

    #[test]
    fn missing_key_is_none() {
        let dir = temp_dir("file-missing");
        let storage = FileStorage::new(&dir);

        assert_eq!(storage.get_item("tasks").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn items_are_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("file-perms");
        let mut storage = FileStorage::new(&dir);
        storage.set_item("tasks", "[]").unwrap();

        let mode = fs::metadata(dir.join("tasks.json"))
            .unwrap()
            .permissions()
            .mode();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let storage = FileStorage::new(temp_dir("file-keys"));

        assert_eq!(
            storage.item_path("../tasks").unwrap_err().code(),
            "invalid_input"
        );
        assert_eq!(storage.item_path("").unwrap_err().code(), "invalid_input");
        assert!(storage.item_path("tasks").is_ok());
    }

    #[test]
    fn remove_and_clear_only_touch_items() {
        let dir = temp_dir("file-clear");
        let mut storage = FileStorage::new(&dir);
        storage.set_item("tasks", "[]").unwrap();
        storage.set_item("prefs", "{}").unwrap();
        fs::write(dir.join("notes.txt"), "keep").unwrap();

        storage.remove_item("tasks").unwrap();
        storage.remove_item("tasks").unwrap();
        assert_eq!(storage.get_item("tasks").unwrap(), None);

        storage.clear().unwrap();
        let prefs = storage.get_item("prefs").unwrap();
        let notes_kept = dir.join("notes.txt").exists();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(prefs, None);
        assert!(notes_kept);
    }
}
