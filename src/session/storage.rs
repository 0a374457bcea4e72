use super::types::{Session, SESSION_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default session file path (~/.config/scorebook/session.json)
pub fn get_session_path() -> PathBuf {
    crate::config::get_config_dir().join("session.json")
}

/// Load the session from a JSON file.
///
/// Returns `None` if nobody is logged in (no file).
/// If the file exists but has an unsupported version, returns an error.
pub fn load_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open session file at {}", path.display()))?;

    let session: Session = serde_json::from_reader(file).context("Failed to load session")?;

    if session.version != SESSION_VERSION {
        anyhow::bail!("Unsupported session file version: {}", session.version);
    }

    Ok(Some(session))
}

/// Load the session if it was made against `api_url`.
///
/// A session for another server, or one that cannot be read, is ignored
/// with a warning so the user is asked to log in again.
pub fn load_session_for(path: &Path, api_url: &str) -> Option<Session> {
    match load_session(path) {
        Ok(Some(session)) if session.is_for(api_url) => Some(session),
        Ok(Some(session)) => {
            tracing::warn!(
                "Session is for {}, not {}; log in again to use this server",
                session.api_url,
                api_url
            );
            None
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Ignoring unreadable session: {:#}", e);
            None
        }
    }
}

/// Save the session to a JSON file atomically
pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, session).context("Failed to serialize session")?;

    file.commit().context("Failed to save session")?;

    Ok(())
}

/// Remove the session file. Missing file is not an error.
pub fn clear_session(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove session file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Role;
    use std::env;

    #[test]
    fn test_load_missing_file_returns_none() {
        let temp_path = env::temp_dir().join("scorebook_test_session_missing.json");
        let _ = std::fs::remove_file(&temp_path);

        assert!(load_session(&temp_path).unwrap().is_none());
    }

    #[test]
    fn test_save_load_and_clear() {
        let temp_path = env::temp_dir().join("scorebook_test_session_roundtrip.json");
        let _ = std::fs::remove_file(&temp_path);

        let session = Session::new(
            "ana".to_string(),
            Role::Reporter,
            "http://localhost:8000/api".to_string(),
        );
        save_session(&temp_path, &session).unwrap();

        let loaded = load_session(&temp_path).unwrap().unwrap();
        assert_eq!(loaded, session);

        clear_session(&temp_path).unwrap();
        assert!(load_session(&temp_path).unwrap().is_none());
        // Clearing twice is fine
        clear_session(&temp_path).unwrap();
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let temp_path = env::temp_dir().join("scorebook_test_session_version.json");
        std::fs::write(
            &temp_path,
            r#"{"version":2,"username":"ana","role":"admin","api_url":"http://x","logged_in_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let err = load_session(&temp_path).unwrap_err();
        assert!(err.to_string().contains("Unsupported session file version: 2"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_session_for_other_server_is_ignored() {
        let temp_path = env::temp_dir().join("scorebook_test_session_scoped.json");
        let session = Session::new(
            "ana".to_string(),
            Role::Admin,
            "http://localhost:8000/api/".to_string(),
        );
        save_session(&temp_path, &session).unwrap();

        assert_eq!(
            load_session_for(&temp_path, "http://localhost:8000/api"),
            Some(session)
        );
        assert!(load_session_for(&temp_path, "https://scores.example.org/api").is_none());

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_unreadable_session_is_ignored() {
        let temp_path = env::temp_dir().join("scorebook_test_session_garbage.json");
        std::fs::write(&temp_path, "not json").unwrap();

        assert!(load_session_for(&temp_path, "http://x").is_none());

        let _ = std::fs::remove_file(&temp_path);
    }
}
