//! File entities.

use std::fs::Metadata;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::codec::{
    Codec, Json, JsonCodec, Schema, Spacing, Structured, Text, Toml, TomlCodec, Yaml, YamlCodec,
};
use crate::error::{Cause, EntryKind, FsError, FsResult, Operation, ResolveError};
use crate::fs::ops::{
    copy, ensure_parent, hard_link, relocate, remove_path, rename, stat_as, symlink, Destination,
};
use crate::fs::Folder;
use crate::path::info::join_extension;
use crate::path::{join_lexical, resolve_with, Environment, IntoPathPieces, PathInfo, SystemEnv};
use crate::pipeline::cancellable;

const WRITE_CHUNK: usize = 64 * 1024;

/// Options for reads.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub cancel: Option<CancellationToken>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Options for writes.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub spacing: Spacing,
    pub cancel: Option<CancellationToken>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spacing(mut self, spacing: impl Into<Spacing>) -> Self {
        self.spacing = spacing.into();
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A file at an absolute path, read and written through its codec.
///
/// `File` (no parameter) is a plain text file. [`File::json`],
/// [`File::yaml`] and [`File::toml`] attach a schema so that
/// [`File::read`] and [`File::write`] work with typed content.
///
/// ```no_run
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use fluentfs_core::{File, SerdeSchema, WriteOptions};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Settings {
///     theme: String,
/// }
///
/// let settings = File::new(("~", "settings.json"))?.json(SerdeSchema::<Settings>::new());
/// let mut current = settings.read().await?;
/// current.theme = "dark".into();
/// settings.write(&current, &WriteOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct File<C = Text> {
    info: PathInfo,
    codec: C,
}

impl File<Text> {
    /// Resolves `pieces` against the process environment.
    pub fn new(pieces: impl IntoPathPieces) -> Result<Self, ResolveError> {
        Self::with_env(&SystemEnv, pieces)
    }

    pub fn with_env(
        env: &dyn Environment,
        pieces: impl IntoPathPieces,
    ) -> Result<Self, ResolveError> {
        Ok(Self::from_absolute(resolve_with(env, pieces)?, Text))
    }
}

impl<C: Codec> File<C> {
    pub(crate) fn from_absolute(path: PathBuf, codec: C) -> Self {
        Self {
            info: PathInfo::new(path),
            codec,
        }
    }

    pub fn path(&self) -> &Path {
        self.info.absolute_path()
    }

    pub fn info(&self) -> &PathInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        self.info.full_name()
    }

    pub fn base_name(&self) -> &str {
        self.info.base_name()
    }

    pub fn extension(&self) -> &str {
        self.info.extension()
    }

    pub fn parent_path(&self) -> &Path {
        self.info.parent_path()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The folder holding this file.
    pub fn folder(&self) -> Folder {
        Folder::from_absolute(self.parent_path().to_path_buf())
    }

    /// A file beside this one, sharing its codec.
    pub fn sibling(&self, pieces: impl IntoPathPieces) -> Self {
        Self::from_absolute(join_lexical(self.parent_path(), pieces), self.codec.clone())
    }

    pub fn relative_to(&self, base: &Folder) -> Option<PathBuf> {
        self.path()
            .strip_prefix(base.path())
            .ok()
            .map(Path::to_path_buf)
    }

    /// Same folder and codec, new full name.
    pub fn with_name(&self, full_name: &str) -> Self {
        Self {
            info: self.info.renamed(full_name),
            codec: self.codec.clone(),
        }
    }

    /// Same extension, new base name.
    pub fn with_base_name(&self, base_name: &str) -> Self {
        self.with_name(&join_extension(base_name, self.extension()))
    }

    /// Same base name, new extension. An empty extension removes it.
    pub fn with_extension(&self, extension: &str) -> Self {
        self.with_name(&join_extension(self.base_name(), extension))
    }

    /// Same path, different codec.
    pub fn with_codec<D: Codec>(&self, codec: D) -> File<D> {
        File {
            info: self.info.clone(),
            codec,
        }
    }

    pub fn text(&self) -> File {
        self.with_codec(Text)
    }

    pub fn json<S: Schema>(&self, schema: S) -> File<JsonCodec<S>> {
        self.with_codec(Structured::new(Json, schema))
    }

    pub fn yaml<S: Schema>(&self, schema: S) -> File<YamlCodec<S>> {
        self.with_codec(Structured::new(Yaml, schema))
    }

    pub fn toml<S: Schema>(&self, schema: S) -> File<TomlCodec<S>> {
        self.with_codec(Structured::new(Toml, schema))
    }

    /// # Errors
    ///
    /// A [`Operation::Stat`] error with [`crate::Cause::WrongKind`] when the
    /// path holds a folder.
    pub async fn stat(&self) -> FsResult<Metadata> {
        stat_as(self.path(), EntryKind::File).await
    }

    /// `true` if a file exists here. Never fails.
    pub async fn exists(&self) -> bool {
        self.stat().await.is_ok()
    }

    /// Creates the file (empty) and its parents unless it already exists.
    /// Existing content is left alone.
    pub async fn ensure_exists(&self) -> FsResult<()> {
        let fail = |e: std::io::Error| FsError::io(Operation::Write, self.path(), e, EntryKind::File);
        ensure_parent(self.path()).await.map_err(fail)?;
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())
            .await
            .map_err(fail)?;
        Ok(())
    }

    /// Removes the file. A missing file is not an error.
    pub async fn remove(&self) -> FsResult<()> {
        remove_path(self.path())
            .await
            .map_err(|e| FsError::io(Operation::Remove, self.path(), e, EntryKind::File))
    }

    pub async fn read_text(&self) -> FsResult<String> {
        self.read_text_with(&ReadOptions::default()).await
    }

    pub async fn read_text_with(&self, options: &ReadOptions) -> FsResult<String> {
        let work = async {
            tokio::fs::read_to_string(self.path())
                .await
                .map_err(|e| FsError::io(Operation::Read, self.path(), e, EntryKind::File))
        };
        cancellable(Operation::Read, self.path(), options.cancel.as_ref(), work).await
    }

    pub async fn read_bytes(&self) -> FsResult<Vec<u8>> {
        tokio::fs::read(self.path())
            .await
            .map_err(|e| FsError::io(Operation::Read, self.path(), e, EntryKind::File))
    }

    /// The file's lines. `\n`, `\r\n` and lone `\r` all end a line.
    pub async fn read_lines(&self) -> FsResult<Vec<String>> {
        let text = self.read_text().await?;
        Ok(split_lines(&text))
    }

    /// Replaces the content with `text`, creating parents as needed.
    pub async fn write_text(&self, text: &str) -> FsResult<()> {
        self.write_bytes_with(text.as_bytes(), &WriteOptions::default())
            .await
    }

    pub async fn write_bytes(&self, bytes: &[u8]) -> FsResult<()> {
        self.write_bytes_with(bytes, &WriteOptions::default()).await
    }

    /// Writes `bytes` in chunks, checking the cancel token between them.
    ///
    /// A cancelled write stops at the next chunk boundary and removes the file
    /// if this call created it.
    pub async fn write_bytes_with(&self, bytes: &[u8], options: &WriteOptions) -> FsResult<()> {
        let fail = |e: std::io::Error| FsError::io(Operation::Write, self.path(), e, EntryKind::File);
        let cancelled = || options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled);
        if cancelled() {
            return Err(self.aborted(Operation::Write));
        }

        ensure_parent(self.path()).await.map_err(fail)?;
        let existed = tokio::fs::symlink_metadata(self.path()).await.is_ok();
        let mut handle = tokio::fs::File::create(self.path()).await.map_err(fail)?;
        for chunk in bytes.chunks(WRITE_CHUNK) {
            if cancelled() {
                // Let the in-flight chunk land before unlinking.
                if let Err(e) = handle.flush().await {
                    tracing::debug!(path = %self.path().display(), error = %e, "flush after abort failed");
                }
                drop(handle);
                if !existed {
                    if let Err(e) = remove_path(self.path()).await {
                        tracing::warn!(path = %self.path().display(), error = %e, "could not remove aborted write");
                    }
                }
                return Err(self.aborted(Operation::Write));
            }
            handle.write_all(chunk).await.map_err(fail)?;
        }
        handle.flush().await.map_err(fail)
    }

    fn aborted(&self, operation: Operation) -> FsError {
        tracing::debug!(%operation, path = %self.path().display(), "operation aborted");
        FsError::new(operation, self.path(), Cause::Aborted)
    }

    /// Appends `text`, creating the file and its parents as needed.
    pub async fn append_text(&self, text: &str) -> FsResult<()> {
        let fail = |e: std::io::Error| FsError::io(Operation::Append, self.path(), e, EntryKind::File);
        ensure_parent(self.path()).await.map_err(fail)?;
        let mut handle = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())
            .await
            .map_err(fail)?;
        handle.write_all(text.as_bytes()).await.map_err(fail)?;
        handle.flush().await.map_err(fail)
    }

    /// Sets permission bits. Outside Unix only the owner-write bit is
    /// honoured, as the read-only flag.
    pub async fn set_mode(&self, mode: u32) -> FsResult<()> {
        let fail = |e: std::io::Error| FsError::io(Operation::Chmod, self.path(), e, EntryKind::File);
        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            std::fs::Permissions::from_mode(mode)
        };
        #[cfg(not(unix))]
        let permissions = {
            let mut permissions = tokio::fs::metadata(self.path())
                .await
                .map_err(fail)?
                .permissions();
            permissions.set_readonly(mode & 0o200 == 0);
            permissions
        };
        tokio::fs::set_permissions(self.path(), permissions)
            .await
            .map_err(fail)
    }

    /// Reads and decodes the file through its codec.
    ///
    /// # Errors
    ///
    /// An [`Operation::Read`] error whose cause is an I/O failure,
    /// [`crate::Cause::Parse`] or [`crate::Cause::Invalid`].
    pub async fn read(&self) -> FsResult<C::Parsed> {
        self.read_with(&ReadOptions::default()).await
    }

    pub async fn read_with(&self, options: &ReadOptions) -> FsResult<C::Parsed> {
        let text = self.read_text_with(options).await?;
        self.codec
            .decode(&text)
            .map_err(|cause| FsError::new(Operation::Read, self.path(), cause))
    }

    /// Encodes `content` through the codec and writes it.
    ///
    /// Nothing is written when encoding fails.
    pub async fn write(&self, content: &C::Content, options: &WriteOptions) -> FsResult<()> {
        let text = self
            .codec
            .encode(content, &options.spacing)
            .map_err(|cause| FsError::new(Operation::Write, self.path(), cause))?;
        self.write_bytes_with(text.as_bytes(), options).await
    }

    /// Copies this file, replacing whatever is at the destination.
    ///
    /// A folder destination receives a file with this file's name. The
    /// returned file carries this file's codec.
    pub async fn copy_to(&self, destination: impl Into<Destination>) -> FsResult<Self> {
        self.relocate(Operation::Copy, destination.into(), RelocateKind::Copy)
            .await
    }

    /// Moves this file. Falls back to copy and delete when a rename is not
    /// possible.
    pub async fn move_to(&self, destination: impl Into<Destination>) -> FsResult<Self> {
        self.relocate(Operation::Move, destination.into(), RelocateKind::Move)
            .await
    }

    /// Hard-links this file.
    pub async fn link_to(&self, destination: impl Into<Destination>) -> FsResult<Self> {
        self.relocate(Operation::Link, destination.into(), RelocateKind::Link)
            .await
    }

    /// Creates a symlink at the destination pointing at this file.
    pub async fn symlink_to(&self, destination: impl Into<Destination>) -> FsResult<Self> {
        self.relocate(Operation::SymLink, destination.into(), RelocateKind::SymLink)
            .await
    }

    async fn relocate(
        &self,
        operation: Operation,
        destination: Destination,
        kind: RelocateKind,
    ) -> FsResult<Self> {
        let source = self.path();
        let name = self.name();
        let target = match kind {
            RelocateKind::Copy => relocate(operation, source, name, destination, copy).await?,
            RelocateKind::Move => relocate(operation, source, name, destination, rename).await?,
            RelocateKind::Link => relocate(operation, source, name, destination, hard_link).await?,
            RelocateKind::SymLink => {
                relocate(operation, source, name, destination, symlink).await?
            }
        };
        Ok(Self::from_absolute(target, self.codec.clone()))
    }
}

#[derive(Debug, Clone, Copy)]
enum RelocateKind {
    Copy,
    Move,
    Link,
    SymLink,
}

impl<C> PartialEq for File<C> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

impl<C> Eq for File<C> {}

impl<C> Hash for File<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info.hash(state);
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split(['\n', '\r'])
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Issue, Issues, SerdeSchema};
    use crate::error::Cause;
    use crate::path::FixedEnv;
    use serde::{Deserialize, Serialize};
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Greeting {
        hello: String,
    }

    fn greeting_schema() -> SerdeSchema<Greeting> {
        SerdeSchema::new().refine(|g: &Greeting| {
            if g.hello.is_empty() {
                Issue::new("must not be empty").at("hello").into()
            } else {
                Issues::new()
            }
        })
    }

    fn file_in(tmp: &TempDir, name: &str) -> File {
        Folder::new(tmp.path()).unwrap().file(name)
    }

    #[test]
    fn names_are_decomposed() {
        let file = File::with_env(&FixedEnv::new("/work"), ("data", "report.final.csv")).unwrap();
        assert_eq!(file.path(), Path::new("/work/data/report.final.csv"));
        assert_eq!(file.base_name(), "report.final");
        assert_eq!(file.extension(), "csv");
        assert_eq!(file.folder().path(), Path::new("/work/data"));
    }

    #[test]
    fn renaming_keeps_folder() {
        let file = File::with_env(&FixedEnv::new("/"), "/a/photo.jpeg").unwrap();
        assert_eq!(file.with_extension("png").path(), Path::new("/a/photo.png"));
        assert_eq!(file.with_extension(".webp").name(), "photo.webp");
        assert_eq!(file.with_extension("").name(), "photo");
        assert_eq!(file.with_base_name("thumb").name(), "thumb.jpeg");
        assert_eq!(file.with_name("x.y").path(), Path::new("/a/x.y"));
        assert_eq!(file.sibling(("b", "c.txt")).path(), Path::new("/a/b/c.txt"));
    }

    #[test]
    fn equality_ignores_codec() {
        let file = File::with_env(&FixedEnv::new("/"), "/a.json").unwrap();
        let typed = file.json(SerdeSchema::<Greeting>::new());
        assert_eq!(typed.path(), file.path());
        assert_eq!(typed.text(), file);
    }

    #[test]
    fn split_lines_handles_every_ending() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), ["a", "b", "c", "d"]);
        assert_eq!(split_lines("one\n"), ["one", ""]);
    }

    #[tokio::test]
    async fn write_then_read_text() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "deep/nested/a.txt");
        file.write_text("hello").await.unwrap();
        assert_eq!(file.read_text().await.unwrap(), "hello");
        assert!(file.exists().await);
    }

    #[tokio::test]
    async fn append_creates_then_extends() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "logs/app.log");
        file.append_text("one\n").await.unwrap();
        file.append_text("two\n").await.unwrap();
        assert_eq!(file.read_lines().await.unwrap(), ["one", "two", ""]);
    }

    #[tokio::test]
    async fn ensure_exists_keeps_content() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "keep.txt");
        file.write_text("data").await.unwrap();
        file.ensure_exists().await.unwrap();
        assert_eq!(file.read_text().await.unwrap(), "data");

        let fresh = file_in(&tmp, "new/empty.txt");
        fresh.ensure_exists().await.unwrap();
        assert_eq!(fresh.read_text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn reading_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = file_in(&tmp, "absent.txt").read_text().await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.operation(), Operation::Read);
        assert_eq!(err.destination(), None);
    }

    #[tokio::test]
    async fn reading_a_folder_is_wrong_kind() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("dir")).unwrap();
        let file = file_in(&tmp, "dir");
        assert!(file.stat().await.unwrap_err().is_wrong_kind());
        assert!(!file.exists().await);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "a.txt");
        file.write_text("x").await.unwrap();
        file.remove().await.unwrap();
        file.remove().await.unwrap();
        assert!(!file.exists().await);
    }

    #[tokio::test]
    async fn structured_round_trip() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "greeting.json").json(greeting_schema());
        let greeting = Greeting {
            hello: "world".into(),
        };
        file.write(&greeting, &WriteOptions::new().spacing(4))
            .await
            .unwrap();
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "{\n    \"hello\": \"world\"\n}"
        );
        assert_eq!(file.read().await.unwrap(), greeting);
    }

    #[tokio::test]
    async fn invalid_content_is_not_written() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "greeting.yaml").yaml(greeting_schema());
        let err = file
            .write(&Greeting { hello: String::new() }, &WriteOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Operation::Write);
        assert!(matches!(err.cause(), Cause::Invalid(_)));
        assert!(!file.exists().await);
    }

    #[tokio::test]
    async fn read_reports_parse_and_validation_failures() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "greeting.json");
        file.write_text("{ not json").await.unwrap();
        let err = file.json(greeting_schema()).read().await.unwrap_err();
        assert!(matches!(err.cause(), Cause::Parse { format: "JSON", .. }));

        file.write_text(r#"{"hello":""}"#).await.unwrap();
        let err = file.json(greeting_schema()).read().await.unwrap_err();
        match err.cause() {
            Cause::Invalid(issues) => assert_eq!(issues.to_string(), "hello: must not be empty"),
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[tokio::test]
    async fn copy_into_folder_keeps_name_and_codec() {
        let tmp = TempDir::new().unwrap();
        let root = Folder::new(tmp.path()).unwrap();
        let source = root.file("a.json").json(greeting_schema());
        source
            .write(&Greeting { hello: "hi".into() }, &WriteOptions::default())
            .await
            .unwrap();

        let copied = source.copy_to(&root.folder("backup")).await.unwrap();
        assert_eq!(copied.path(), root.path().join("backup/a.json"));
        assert_eq!(copied.read().await.unwrap().hello, "hi");
        assert!(source.exists().await);
    }

    #[tokio::test]
    async fn copy_replaces_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let source = file_in(&tmp, "new.txt");
        let target = file_in(&tmp, "old.txt");
        source.write_text("fresh").await.unwrap();
        target.write_text("stale").await.unwrap();
        source.copy_to(&target).await.unwrap();
        assert_eq!(target.read_text().await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn copy_onto_folder_path_replaces_folder() {
        let tmp = TempDir::new().unwrap();
        let source = file_in(&tmp, "a.txt");
        source.write_text("a").await.unwrap();
        fs::create_dir_all(tmp.path().join("b.txt/inner")).unwrap();
        let target = file_in(&tmp, "b.txt");
        source.copy_to(&target).await.unwrap();
        assert_eq!(target.read_text().await.unwrap(), "a");
    }

    #[tokio::test]
    async fn copy_onto_own_folder_is_refused() {
        let tmp = TempDir::new().unwrap();
        let root = Folder::new(tmp.path()).unwrap();
        let source = root.file(("dir", "a.txt"));
        source.write_text("only copy").await.unwrap();

        let err = source.copy_to(&root.file("dir")).await.unwrap_err();
        assert_eq!(err.operation(), Operation::Copy);
        assert_eq!(err.destination(), Some(root.path().join("dir").as_path()));
        assert_eq!(source.read_text().await.unwrap(), "only copy");
    }

    #[tokio::test]
    async fn move_removes_source() {
        let tmp = TempDir::new().unwrap();
        let source = file_in(&tmp, "a.txt");
        source.write_text("moving").await.unwrap();
        let moved = source.move_to(&file_in(&tmp, "sub/b.txt")).await.unwrap();
        assert!(!source.exists().await);
        assert_eq!(moved.read_text().await.unwrap(), "moving");
    }

    #[tokio::test]
    async fn failed_move_reports_both_paths() {
        let tmp = TempDir::new().unwrap();
        let source = file_in(&tmp, "ghost.txt");
        let target = file_in(&tmp, "dest.txt");
        let err = source.move_to(&target).await.unwrap_err();
        assert_eq!(err.operation(), Operation::Move);
        assert_eq!(err.path(), source.path());
        assert_eq!(err.destination(), Some(target.path()));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn hard_link_shares_content() {
        let tmp = TempDir::new().unwrap();
        let source = file_in(&tmp, "a.txt");
        source.write_text("shared").await.unwrap();
        let linked = source.link_to(&file_in(&tmp, "b.txt")).await.unwrap();
        assert_eq!(linked.read_text().await.unwrap(), "shared");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_points_at_source() {
        let tmp = TempDir::new().unwrap();
        let source = file_in(&tmp, "a.txt");
        source.write_text("target").await.unwrap();
        let link = source.symlink_to(&file_in(&tmp, "links/a.txt")).await.unwrap();
        assert_eq!(fs::read_link(link.path()).unwrap(), source.path());
        assert_eq!(link.read_text().await.unwrap(), "target");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn set_mode_changes_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "script.sh");
        file.write_text("#!/bin/sh\n").await.unwrap();
        file.set_mode(0o750).await.unwrap();
        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[tokio::test]
    async fn cancelled_read_is_aborted() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "a.txt");
        file.write_text("x").await.unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = file
            .read_text_with(&ReadOptions::new().cancel(token))
            .await
            .unwrap_err();
        assert!(err.is_aborted());
        assert_eq!(err.operation(), Operation::Read);
    }

    #[tokio::test]
    async fn cancelled_write_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "a.txt");
        let token = CancellationToken::new();
        token.cancel();
        let err = file
            .write_bytes_with(b"x", &WriteOptions::new().cancel(token))
            .await
            .unwrap_err();
        assert!(err.is_aborted());
        assert!(!file.exists().await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn write_cancelled_midway_stops_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "big.bin");
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move { canceller.cancel() });

        let payload = vec![1u8; WRITE_CHUNK * 256];
        let err = file
            .write_bytes_with(&payload, &WriteOptions::new().cancel(token))
            .await
            .unwrap_err();

        assert!(err.is_aborted());
        assert_eq!(err.operation(), Operation::Write);
        assert!(!file.exists().await);
    }

    #[tokio::test]
    async fn uncancelled_token_writes_everything() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(&tmp, "big.bin");
        let payload: Vec<u8> = (0..WRITE_CHUNK * 3 + 17).map(|i| (i % 251) as u8).collect();
        file.write_bytes_with(&payload, &WriteOptions::new().cancel(CancellationToken::new()))
            .await
            .unwrap();
        assert_eq!(file.read_bytes().await.unwrap(), payload);
    }
}
