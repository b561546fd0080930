//! Collision-safe file creation for bodies and attachments.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::sync::Attachment;
use crate::{Error, Result};

/// Number of collision counters tried before giving up (`000` to `999`).
pub const MAX_COLLISION_ATTEMPTS: u32 = 1000;

/// Separator used when joining attachment filenames.
pub const ATTACHMENT_SEPARATOR: &str = ";";

/// An exclusively created, still open body file.
///
/// The file is closed when the handle is dropped, whether or not a write
/// succeeded.
#[derive(Debug)]
pub struct BodyFile {
    path: PathBuf,
    file: File,
}

impl BodyFile {
    /// Path reserved for this body.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `content` and flushes it to disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Filesystem`] if writing or syncing fails.
    pub async fn write(&mut self, content: &[u8]) -> Result<()> {
        self.file
            .write_all(content)
            .await
            .map_err(|e| Error::filesystem(&self.path, e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| Error::filesystem(&self.path, e))
    }

    /// Closes the file and returns its path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Creates `<directory>/<tag>.<NNN>` for the lowest free counter.
///
/// `directory` and its parents are created if missing. Creation is
/// exclusive, so a name taken by anyone else, including a concurrent
/// process, is never reused.
///
/// # Errors
///
/// Returns [`Error::ResourceExhausted`] if all [`MAX_COLLISION_ATTEMPTS`]
/// names are taken, or [`Error::Filesystem`] on any other I/O failure.
pub async fn reserve_body_file(directory: &Path, tag: &str) -> Result<BodyFile> {
    reserve_with_limit(directory, tag, MAX_COLLISION_ATTEMPTS).await
}

async fn reserve_with_limit(directory: &Path, tag: &str, limit: u32) -> Result<BodyFile> {
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|e| Error::filesystem(directory, e))?;

    for counter in 0..limit {
        let path = directory.join(format!("{tag}.{counter:03}"));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => {
                debug!(path = %path.display(), "Reserved body file");
                return Ok(BodyFile { path, file });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(Error::filesystem(path, e)),
        }
    }

    Err(Error::ResourceExhausted {
        directory: directory.to_path_buf(),
        tag: tag.to_string(),
        attempts: limit,
    })
}

/// Returns the attachment directory belonging to a body file.
#[must_use]
pub fn attachment_dir(body_path: &Path) -> PathBuf {
    let mut dir = OsString::from(body_path.as_os_str());
    dir.push(".d");
    PathBuf::from(dir)
}

/// Writes attachments next to a body file and returns their joined names.
///
/// Files go into `<body_path>.d/`, which is only created when there is at
/// least one attachment. Names are joined with [`ATTACHMENT_SEPARATOR`] in
/// the order given. When two attachments share a name the later one wins.
///
/// # Errors
///
/// Returns [`Error::Filesystem`] if the directory or a file cannot be written.
pub async fn write_attachments(body_path: &Path, attachments: &[Attachment]) -> Result<String> {
    if attachments.is_empty() {
        return Ok(String::new());
    }

    let dir = attachment_dir(body_path);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| Error::filesystem(&dir, e))?;

    let mut names = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let name = stored_name(&attachment.filename);
        let path = dir.join(&name);
        write_synced(&path, &attachment.data).await?;
        debug!(path = %path.display(), bytes = attachment.data.len(), "Wrote attachment");
        names.push(name);
    }

    Ok(names.join(ATTACHMENT_SEPARATOR))
}

/// Creates or truncates `path`, writes `data` and flushes it to disk.
async fn write_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?;
    file.write_all(data)
        .await
        .map_err(|e| Error::filesystem(path, e))?;
    file.sync_all()
        .await
        .map_err(|e| Error::filesystem(path, e))
}

/// Maps a sender-supplied filename to a single path component.
///
/// Separators and the index separator are replaced so a name can neither
/// leave the attachment directory nor split the joined summary.
fn stored_name(filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if ATTACHMENT_SEPARATOR.contains(c) => '_',
            c => c,
        })
        .collect();

    match name.as_str() {
        "" | "." | ".." => format!("_{name}"),
        _ => name,
    }
}
