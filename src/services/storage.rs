//! Local content directory holding uploaded document files and signer photos.
//!
//! Stored names are synthesized (`<base>_<unix>_<ordinal>_<token>.<ext>`) and
//! written with create-new semantics, so an existing file is never replaced
//! and no client-supplied path component ever reaches the file system.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::body::Bytes;
use rand::Rng;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::AppError;

const MIB: u64 = 1024 * 1024;
const MAX_BASE_LEN: usize = 64;
const NAME_ATTEMPTS: usize = 3;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// What a store accepts: extension allow-list (lower-case) and a size ceiling.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub allowed_extensions: &'static [&'static str],
    pub max_bytes: u64,
}

impl UploadPolicy {
    pub const DOCUMENTS: UploadPolicy = UploadPolicy {
        allowed_extensions: &["jpg", "jpeg", "png", "pdf", "doc", "docx"],
        max_bytes: 10 * MIB,
    };

    pub const PHOTOS: UploadPolicy = UploadPolicy {
        allowed_extensions: &["jpg", "jpeg", "png", "webp"],
        max_bytes: 5 * MIB,
    };

    /// Returns the normalized extension when the file is acceptable.
    pub fn check(&self, file: &IncomingFile) -> Result<String, Rejection> {
        let (_, ext) = split_name(&file.original_name);
        let ext = ext.ok_or(Rejection::MissingExtension)?;

        if !self.allowed_extensions.contains(&ext.as_str()) {
            return Err(Rejection::ExtensionNotAllowed(ext));
        }
        if file.size() == 0 {
            return Err(Rejection::Empty);
        }
        if file.size() > self.max_bytes {
            return Err(Rejection::TooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }

        Ok(ext)
    }
}

/// A file received from a client, not yet validated.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub bytes: Bytes,
}

impl IncomingFile {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("file has no extension")]
    MissingExtension,
    #[error("extension .{0} is not allowed")]
    ExtensionNotAllowed(String),
    #[error("file is empty")]
    Empty,
    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub original_name: String,
    pub stored_name: String,
    pub file_type: String,
    pub size: u64,
}

#[derive(Debug)]
pub enum StoreOutcome {
    Stored(StoredFile),
    Rejected(Rejection),
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    io_timeout: Duration,
}

impl FileStore {
    /// Opens (and creates if needed) the directory backing this store.
    pub async fn open(root: impl Into<PathBuf>, io_timeout: Duration) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Upload(format!("cannot create content directory {}: {}", root.display(), e))
        })?;
        Ok(Self { root, io_timeout })
    }

    /// Validates `file` against `policy` and writes it under a fresh name.
    ///
    /// A policy violation is reported as [`StoreOutcome::Rejected`]; only I/O
    /// failures and timeouts are errors.
    pub async fn store(
        &self,
        file: &IncomingFile,
        policy: &UploadPolicy,
        ordinal: usize,
    ) -> Result<StoreOutcome, AppError> {
        let ext = match policy.check(file) {
            Ok(ext) => ext,
            Err(rejection) => return Ok(StoreOutcome::Rejected(rejection)),
        };

        let base = sanitize_base(&file.original_name);
        for _ in 0..NAME_ATTEMPTS {
            let stored_name = stored_name(&base, ordinal, &ext);
            let path = self.root.join(&stored_name);

            match tokio::time::timeout(self.io_timeout, write_new(path, file.bytes.clone())).await {
                Ok(Ok(())) => {
                    debug!(stored = %stored_name, size = file.size(), "file stored");
                    return Ok(StoreOutcome::Stored(StoredFile {
                        original_name: file.original_name.clone(),
                        stored_name,
                        file_type: detect_type(&file.bytes).to_string(),
                        size: file.size(),
                    }));
                }
                Ok(Err(e)) if e.kind() == ErrorKind::AlreadyExists => continue,
                Ok(Err(e)) => {
                    return Err(AppError::Upload(format!(
                        "failed to write {}: {}",
                        file.original_name, e
                    )));
                }
                Err(_) => {
                    return Err(AppError::Timeout(format!("writing {}", file.original_name)));
                }
            }
        }

        Err(AppError::Upload(format!(
            "no free name for {} after {} attempts",
            file.original_name, NAME_ATTEMPTS
        )))
    }

    /// Maps a bare stored name onto the content directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        is_bare_name(name).then(|| self.root.join(name))
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, AppError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| AppError::BadRequest("Invalid file name".to_string()))?;

        match tokio::time::timeout(self.io_timeout, tokio::fs::read(&path)).await? {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(AppError::Upload(format!("failed to read {}: {}", name, e))),
        }
    }

    /// Best-effort delete; failures are logged and swallowed.
    pub async fn remove(&self, name: &str) {
        let Some(path) = self.resolve(name) else {
            warn!(name, "refusing to remove non-bare file name");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(name, "file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(name, error = %e, "failed to remove file"),
        }
    }

    pub async fn remove_all<S: AsRef<str>>(&self, names: &[S]) {
        for name in names {
            self.remove(name.as_ref()).await;
        }
    }
}

/// Writes `bytes` to a new file at `path` on the blocking pool.
///
/// The file only passes to the caller once the result is received. If the
/// caller stops waiting (a timeout or a dropped request), or the write fails
/// after the file was created, the file is deleted again.
async fn write_new(path: PathBuf, bytes: Bytes) -> std::io::Result<()> {
    let (tx, rx) = oneshot::channel();
    let mut pending = PendingWrite {
        rx,
        path: path.clone(),
    };

    tokio::task::spawn_blocking(move || match write_file(&path, &bytes) {
        Ok(()) => {
            if tx.send(Ok(())).is_err() {
                debug!(path = %path.display(), "writer outlived its caller, discarding file");
                discard(&path);
            }
        }
        Err(e) => {
            // an existing file is someone else's
            if e.kind() != ErrorKind::AlreadyExists {
                discard(&path);
            }
            let _ = tx.send(Err(e));
        }
    });

    (&mut pending.rx)
        .await
        .unwrap_or_else(|_| Err(std::io::Error::other("file writer stopped")))
}

/// Receiving end of a write. Dropped unread, it closes the channel and removes
/// a file that was finished but never collected.
struct PendingWrite {
    rx: oneshot::Receiver<std::io::Result<()>>,
    path: PathBuf,
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(Ok(())) = self.rx.try_recv() {
            discard(&self.path);
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.flush()
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to discard partial file");
        }
    }
}

/// Splits the last path component of `original` into base and lower-case extension.
fn split_name(original: &str) -> (&str, Option<String>) {
    let file_name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    match file_name.rsplit_once('.') {
        Some((base, ext)) if !ext.is_empty() => (base, Some(ext.to_ascii_lowercase())),
        _ => (file_name, None),
    }
}

fn sanitize_base(original: &str) -> String {
    let (base, _) = split_name(original);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut cleaned = cleaned.trim_start_matches('.').to_string();
    cleaned.truncate(MAX_BASE_LEN);
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn stored_name(base: &str, ordinal: usize, ext: &str) -> String {
    let token: u32 = rand::thread_rng().gen();
    format!(
        "{}_{}_{}_{:08x}.{}",
        base,
        chrono::Utc::now().timestamp(),
        ordinal,
        token,
        ext
    )
}

pub fn is_bare_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

/// Content type sniffed from the leading bytes; the client's declared type is ignored.
pub fn detect_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if bytes.starts_with(&OLE2_MAGIC) {
        return "application/msword";
    }
    if bytes.starts_with(b"PK\x03\x04") {
        return if bytes.windows(5).any(|w| w == b"word/") {
            DOCX_MIME
        } else {
            "application/zip"
        };
    }
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "application/octet-stream",
    }
}

/// Content type for serving a stored file when no detected type is on record.
pub fn content_type_for(name: &str) -> &'static str {
    match split_name(name).1.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => DOCX_MIME,
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::task::Poll;

    use super::*;

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_base("../../etc/passwd.pdf"), "passwd");
        assert_eq!(sanitize_base("C:\\Users\\me\\Surat Tugas (final).pdf"), "Surat_Tugas__final_");
        assert_eq!(sanitize_base("..hidden.pdf"), "hidden");
        assert_eq!(sanitize_base(".pdf"), "file");
    }

    #[test]
    fn sanitize_truncates_long_names() {
        let long = format!("{}.pdf", "a".repeat(200));
        assert_eq!(sanitize_base(&long).len(), MAX_BASE_LEN);
    }

    #[test]
    fn extension_is_case_insensitive() {
        let file = IncomingFile::new("SCAN.PDF", &b"%PDF-1.4"[..]);
        assert_eq!(UploadPolicy::DOCUMENTS.check(&file), Ok("pdf".to_string()));
    }

    #[test]
    fn policy_rejects_bad_files() {
        let exe = IncomingFile::new("virus.exe", &b"MZ"[..]);
        assert_eq!(
            UploadPolicy::DOCUMENTS.check(&exe),
            Err(Rejection::ExtensionNotAllowed("exe".into()))
        );

        let bare = IncomingFile::new("README", &b"hello"[..]);
        assert_eq!(UploadPolicy::DOCUMENTS.check(&bare), Err(Rejection::MissingExtension));

        let empty = IncomingFile::new("empty.pdf", Bytes::new());
        assert_eq!(UploadPolicy::DOCUMENTS.check(&empty), Err(Rejection::Empty));

        let big = IncomingFile::new("big.pdf", vec![0u8; (10 * MIB + 1) as usize]);
        assert!(matches!(
            UploadPolicy::DOCUMENTS.check(&big),
            Err(Rejection::TooLarge { .. })
        ));
    }

    #[test]
    fn detects_types_from_magic_bytes() {
        assert_eq!(detect_type(b"%PDF-1.7\n..."), "application/pdf");
        assert_eq!(detect_type(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]), "image/png");
        assert_eq!(detect_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]), "image/jpeg");
        assert_eq!(detect_type(b"PK\x03\x04....word/document.xml"), DOCX_MIME);
        assert_eq!(detect_type(&OLE2_MAGIC), "application/msword");
        assert_eq!(detect_type(b"MZ\x90\x00"), "application/octet-stream");
    }

    #[test]
    fn only_bare_names_resolve() {
        assert!(is_bare_name("report_1700000000_0_deadbeef.pdf"));
        assert!(!is_bare_name("../secret.pdf"));
        assert!(!is_bare_name("a/b.pdf"));
        assert!(!is_bare_name("a\\b.pdf"));
        assert!(!is_bare_name(".env"));
        assert!(!is_bare_name(""));
    }

    #[tokio::test]
    async fn stored_names_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), Duration::from_secs(5)).await.unwrap();
        let file = IncomingFile::new("report.pdf", &b"%PDF-1.4 body"[..]);

        let mut names = Vec::new();
        for _ in 0..5 {
            match store.store(&file, &UploadPolicy::DOCUMENTS, 0).await.unwrap() {
                StoreOutcome::Stored(stored) => names.push(stored.stored_name),
                StoreOutcome::Rejected(r) => panic!("unexpected rejection: {r}"),
            }
        }

        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
        assert!(names.iter().all(|n| n.starts_with("report_") && n.ends_with(".pdf")));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 5);
    }

    #[tokio::test]
    async fn abandoned_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), Duration::from_secs(5)).await.unwrap();
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.resize((9 * MIB) as usize, 0);
        let file = IncomingFile::new("large.pdf", bytes);

        // start the write, then drop the caller before it completes
        let mut pending = Box::pin(store.store(&file, &UploadPolicy::DOCUMENTS, 0));
        let first = std::future::poll_fn(|cx| Poll::Ready(pending.as_mut().poll(cx))).await;
        assert!(first.is_pending());
        drop(pending);

        // the writer finishes on the blocking pool and then cleans up
        let mut remaining = usize::MAX;
        for _ in 0..200 {
            remaining = std::fs::read_dir(dir.path()).unwrap().count();
            if remaining == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn read_rejects_traversal_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), Duration::from_secs(5)).await.unwrap();

        assert!(matches!(store.read("../Cargo.toml").await, Err(AppError::BadRequest(_))));
        assert!(matches!(store.read("nope.pdf").await, Err(AppError::NotFound(_))));
    }
}
