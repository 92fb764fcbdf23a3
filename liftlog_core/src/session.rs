//! Persisted login session and UI theme.
//!
//! The session is read once at startup and handed to whatever needs it.
//! Changes go through [`SessionStore::update`], which holds an exclusive
//! lock on `session.lock` across read, modify and the atomic replace of
//! `session.json`.

use crate::{Error, Result, User};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Color theme preference
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::Validation(format!("Unknown theme: {}", other))),
        }
    }
}

/// Who is logged in, with what cookie, and how things should look
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Session {
    #[serde(default)]
    pub user: Option<User>,
    /// `Cookie` header value captured at login
    #[serde(default)]
    pub cookie: Option<String>,
    #[serde(default)]
    pub theme: Theme,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The logged-in user, or an error telling the caller to log in
    pub fn require_user(&self) -> Result<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| Error::Session("Not logged in. Run `liftlog login` first.".into()))
    }
}

/// File-backed session storage
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Session file inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar lock guarding every read and write of the session file
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self, exclusive: bool) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(file)
    }

    /// Load the persisted session
    ///
    /// A missing file yields a logged-out session. An unreadable or corrupt
    /// file is logged and also yields a logged-out session.
    pub fn load(&self) -> Result<Session> {
        let lock = self.lock(false)?;
        let session = self.read_locked();
        lock.unlock()?;
        Ok(session)
    }

    /// Write the session atomically (temp file, fsync, rename)
    pub fn save(&self, session: &Session) -> Result<()> {
        let lock = self.lock(true)?;
        self.write_locked(session)?;
        lock.unlock()?;
        Ok(())
    }

    /// Read, modify and write back while holding the exclusive lock
    ///
    /// Another process cannot slip a write in between the read and the
    /// write, so fields `f` leaves alone keep their on-disk values.
    pub fn update<F>(&self, f: F) -> Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let lock = self.lock(true)?;
        let mut session = self.read_locked();
        f(&mut session);
        self.write_locked(&session)?;
        lock.unlock()?;
        Ok(session)
    }

    fn read_locked(&self) -> Session {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No session file at {:?}, starting logged out", self.path);
                return Session::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read session file {:?}: {}. Logged out.", self.path, e);
                return Session::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse session file {:?}: {}. Logged out.", self.path, e);
            Session::default()
        })
    }

    fn write_locked(&self, session: &Session) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Session(format!("Session path {:?} has no parent", self.path)))?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(serde_json::to_string(session)?.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    /// Record a successful login and persist it
    pub fn login(&self, session: &mut Session, user: User, cookie: Option<String>) -> Result<()> {
        tracing::info!("Logged in as {}", user.username);
        *session = self.update(|stored| {
            stored.user = Some(user);
            stored.cookie = cookie;
        })?;
        Ok(())
    }

    /// Forget the user and cookie; the theme survives
    pub fn logout(&self, session: &mut Session) -> Result<()> {
        *session = self.update(|stored| {
            if let Some(user) = stored.user.take() {
                tracing::info!("Logged out {}", user.username);
            }
            stored.cookie = None;
        })?;
        Ok(())
    }

    pub fn set_theme(&self, session: &mut Session, theme: Theme) -> Result<()> {
        *session = self.update(|stored| stored.theme = theme)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: "u1".into(),
            username: "sam".into(),
            email: "sam@example.com".into(),
            created: Utc::now(),
            updated: Utc::now(),
            is_active: true,
            is_suspended: false,
            is_verified: true,
            roles: vec![],
        }
    }

    #[test]
    fn test_missing_file_is_logged_out() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(temp_dir.path());

        let session = store.load().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.theme, Theme::Light);
        assert!(session.require_user().is_err());
    }

    #[test]
    fn test_login_persists_user_and_cookie() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(&temp_dir.path().join("nested"));

        let mut session = store.load().unwrap();
        store
            .login(&mut session, user(), Some("sid=abc".into()))
            .unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.require_user().unwrap().username, "sam");
        assert_eq!(reloaded.cookie.as_deref(), Some("sid=abc"));
    }

    #[test]
    fn test_logout_keeps_theme() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(temp_dir.path());

        let mut session = Session::default();
        store.login(&mut session, user(), Some("sid=abc".into())).unwrap();
        store.set_theme(&mut session, Theme::Dark).unwrap();
        store.logout(&mut session).unwrap();

        let reloaded = store.load().unwrap();
        assert!(reloaded.user.is_none());
        assert!(reloaded.cookie.is_none());
        assert_eq!(reloaded.theme, Theme::Dark);
    }

    #[test]
    fn test_corrupted_session_is_logged_out() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(temp_dir.path());
        std::fs::write(store.path(), "{ invalid json }").unwrap();

        let session = store.load().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(temp_dir.path());
        store.save(&Session::default()).unwrap();

        let mut entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                std::ffi::OsString::from("session.json"),
                std::ffi::OsString::from("session.lock"),
            ]
        );
    }

    #[test]
    fn test_update_keeps_changes_from_other_writers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(temp_dir.path());

        // Loaded before another process switched the theme
        let mut stale = store.load().unwrap();
        let other = SessionStore::in_dir(temp_dir.path());
        let mut fresh = other.load().unwrap();
        other.set_theme(&mut fresh, Theme::Dark).unwrap();

        store.login(&mut stale, user(), Some("sid=abc".into())).unwrap();
        assert_eq!(stale.theme, Theme::Dark);

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.theme, Theme::Dark);
        assert!(reloaded.is_authenticated());
    }

    #[test]
    fn test_concurrent_updates_leave_valid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_path_buf();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = SessionStore::in_dir(&path);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        if i % 2 == 0 {
                            let mut session = store.load().unwrap();
                            store.login(&mut session, user(), Some("sid=abc".into())).unwrap();
                        } else {
                            store.update(|s| s.theme = s.theme.toggle()).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = std::fs::read_to_string(path.join("session.json")).unwrap();
        let session: Session = serde_json::from_str(&contents).unwrap();
        assert_eq!(session.require_user().unwrap().username, "sam");
        // 40 toggles from light
        assert_eq!(session.theme, Theme::Light);
    }

    #[test]
    fn test_theme_toggle_and_parse() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }
}
