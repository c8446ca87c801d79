//! Per-upload sessions: a generated id scoping an upload directory and an
//! output directory that holds the processed PNGs and the ZIP archive.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Session {
    pub fn archive_name(&self) -> String {
        let id = self.id.to_string();
        format!("processed_stickers_{}.zip", &id[..8])
    }

    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(self.archive_name())
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    upload_root: PathBuf,
    processed_root: PathBuf,
}

impl SessionStore {
    pub fn new(upload_root: &Path, processed_root: &Path) -> Result<Self> {
        fs::create_dir_all(upload_root)?;
        fs::create_dir_all(processed_root)?;
        Ok(Self {
            upload_root: upload_root.to_path_buf(),
            processed_root: processed_root.to_path_buf(),
        })
    }

    fn session_for(&self, id: Uuid) -> Session {
        let name = id.to_string();
        Session {
            id,
            upload_dir: self.upload_root.join(&name),
            output_dir: self.processed_root.join(&name),
        }
    }

    pub fn create(&self) -> Result<Session> {
        let session = self.session_for(Uuid::new_v4());
        fs::create_dir_all(&session.upload_dir)?;
        fs::create_dir_all(&session.output_dir)?;
        debug!("Session {} created", session.id);
        Ok(session)
    }

    /// Look up an existing session; ids that are not UUIDs never touch the filesystem.
    pub fn open(&self, id: &str) -> Option<Session> {
        let id = Uuid::parse_str(id).ok()?;
        let session = self.session_for(id);
        session.output_dir.is_dir().then_some(session)
    }

    pub fn purge(&self, session: &Session) -> Result<()> {
        for dir in [&session.upload_dir, &session.output_dir] {
            match fs::remove_dir_all(dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!("Session {} purged", session.id);
        Ok(())
    }

    /// Remove sessions whose directories are older than `max_age`.
    pub fn purge_expired(&self, max_age: Duration) -> Result<usize> {
        let now = SystemTime::now();
        let mut purged = 0;
        for root in [&self.upload_root, &self.processed_root] {
            for entry in fs::read_dir(root)? {
                let path = entry?.path();
                let Some(id) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| Uuid::parse_str(n).ok())
                else {
                    continue;
                };
                let age = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|t| now.duration_since(t).ok())
                    .unwrap_or_default();
                if age < max_age {
                    continue;
                }
                match self.purge(&self.session_for(id)) {
                    Ok(()) => purged += 1,
                    Err(e) => warn!(error = %e, "Could not purge expired session {}", id),
                }
            }
        }
        if purged > 0 {
            info!("Purged {} expired session(s)", purged);
        }
        Ok(purged)
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, dropping any directory
/// part and leading dots. Returns None when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Make `name` unique among `taken` by appending `_2`, `_3`, ... to the stem.
pub fn unique_name(name: &str, taken: &[String]) -> String {
    let stem_of = |n: &str| match n.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => n.to_string(),
    };
    let clashes = |candidate: &str| taken.iter().any(|t| stem_of(t) == stem_of(candidate));
    if !clashes(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) => (s.to_string(), format!(".{e}")),
        None => (name.to_string(), String::new()),
    };
    (2..)
        .map(|n| format!("{stem}_{n}{ext}"))
        .find(|candidate| !clashes(candidate))
        .unwrap_or_else(|| name.to_string())
}
