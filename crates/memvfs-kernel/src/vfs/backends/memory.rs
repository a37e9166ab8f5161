//! In-memory filesystem engine.
//!
//! All data is ephemeral: it lives exactly as long as the [`MemoryFs`].

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::vfs::content::ContentStore;
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::handles::HandleAllocator;
use crate::vfs::ops::VfsOps;
use crate::vfs::path::{is_root, normalize, parent_of, path_str};
use crate::vfs::path_table::PathTable;
use crate::vfs::types::{
    DirEntry, FileAttr, FileHandle, FileType, OpenFlags, PERM_MASK, SetAttr, StatFs,
};

/// Both tables, always locked together.
#[derive(Debug)]
struct FsState {
    paths: PathTable,
    contents: ContentStore,
}

/// In-memory filesystem engine.
///
/// One instance per mount. The path table and content store sit behind a
/// single mutex held for the whole of each operation; handle allocation is
/// atomic and needs no lock.
#[derive(Debug)]
pub struct MemoryFs {
    state: Mutex<FsState>,
    handles: HandleAllocator,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new filesystem holding only `/` (mode 0755).
    pub fn new() -> Self {
        Self::with_root_mode(0o755)
    }

    /// Create a new filesystem whose root has the given permission bits.
    pub fn with_root_mode(perm: u32) -> Self {
        Self {
            state: Mutex::new(FsState {
                paths: PathTable::new(perm),
                contents: ContentStore::new(),
            }),
            handles: HandleAllocator::new(),
        }
    }

    /// Number of paths currently held, root included.
    pub fn entry_count(&self) -> usize {
        self.state.lock().paths.len()
    }

    /// Number of handles issued so far.
    pub fn handles_issued(&self) -> u64 {
        self.handles.issued()
    }
}

/// Resolve the parent of `path`, which must be an existing directory.
fn parent_dir(paths: &PathTable, path: &Path) -> VfsResult<PathBuf> {
    // The root is its own parent and always exists.
    let parent = parent_of(path).ok_or_else(|| VfsError::already_exists(path_str(path)))?;
    match paths.get(parent) {
        Ok(attr) if attr.is_dir() => Ok(parent.to_path_buf()),
        Ok(_) => Err(VfsError::not_a_directory(path_str(parent))),
        Err(e) => Err(e),
    }
}

fn touch(paths: &mut PathTable, path: &Path, now: SystemTime) {
    if let Ok(attr) = paths.get_mut(path) {
        attr.mtime = now;
    }
}

fn link_dir(paths: &mut PathTable, parent: &Path) {
    if let Ok(attr) = paths.get_mut(parent) {
        attr.nlink += 1;
    }
}

fn unlink_dir(paths: &mut PathTable, parent: &Path) {
    if let Ok(attr) = paths.get_mut(parent) {
        attr.nlink = attr.nlink.saturating_sub(1).max(2);
    }
}

impl VfsOps for MemoryFs {
    #[tracing::instrument(level = "trace", skip(self), name = "vfs.getattr")]
    fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let normalized = normalize(path);
        let state = self.state.lock();
        state.paths.get(&normalized).cloned()
    }

    #[tracing::instrument(level = "trace", skip(self), name = "vfs.readdir")]
    fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let normalized = normalize(path);
        let state = self.state.lock();

        if !state.paths.get(&normalized)?.is_dir() {
            return Err(VfsError::not_a_directory(path_str(&normalized)));
        }

        let mut children: Vec<DirEntry> = state
            .paths
            .children_of(&normalized)
            .filter_map(|(child, attr)| {
                child
                    .file_name()
                    .map(|name| DirEntry::new(name.to_string_lossy().into_owned(), attr.kind))
            })
            .collect();

        // Sort for consistent ordering
        children.sort_by(|a, b| a.name.cmp(&b.name));

        let mut result = Vec::with_capacity(children.len() + 2);
        result.push(DirEntry::directory("."));
        result.push(DirEntry::directory(".."));
        result.extend(children);
        Ok(result)
    }

    #[tracing::instrument(level = "trace", skip(self), name = "vfs.read")]
    fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        let normalized = normalize(path);
        let mut guard = self.state.lock();
        let FsState { paths, contents } = &mut *guard;

        if paths.get(&normalized).is_ok_and(|attr| attr.is_dir()) {
            return Err(VfsError::is_a_directory(path_str(&normalized)));
        }

        let data = contents.read_range(&normalized, offset, u64::from(size))?;
        if let Ok(attr) = paths.get_mut(&normalized) {
            attr.atime = SystemTime::now();
        }
        Ok(data)
    }

    #[tracing::instrument(level = "debug", skip(self, data), fields(len = data.len()), name = "vfs.write")]
    fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32> {
        let normalized = normalize(path);
        let written = u32::try_from(data.len())
            .map_err(|_| VfsError::other(format!("write of {} bytes is too large", data.len())))?;

        let mut guard = self.state.lock();
        let FsState { paths, contents } = &mut *guard;

        // A write needs a record from create(); the buffer follows it.
        let attr = paths.get_mut(&normalized)?;
        if attr.is_dir() {
            return Err(VfsError::is_a_directory(path_str(&normalized)));
        }

        let len = contents.write_range(&normalized, offset, data)?;
        let now = SystemTime::now();
        attr.size = len;
        attr.mtime = now;
        Ok(written)
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.create")]
    fn create(&self, path: &Path, mode: u32) -> VfsResult<(FileAttr, FileHandle)> {
        let normalized = normalize(path);
        let mut guard = self.state.lock();
        let FsState { paths, contents } = &mut *guard;

        let parent = parent_dir(paths, &normalized)?;
        let attr = FileAttr::file(mode);
        paths.insert(normalized.clone(), attr.clone())?;
        contents.create(normalized);
        touch(paths, &parent, attr.crtime);

        let fh = self.handles.next();
        debug!(%fh, "created file");
        Ok((attr, fh))
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.mkdir")]
    fn mkdir(&self, path: &Path, mode: u32) -> VfsResult<FileAttr> {
        let normalized = normalize(path);
        let mut guard = self.state.lock();
        let paths = &mut guard.paths;

        let parent = parent_dir(paths, &normalized)?;
        let attr = FileAttr::directory(mode);
        paths.insert(normalized, attr.clone())?;
        link_dir(paths, &parent);
        touch(paths, &parent, attr.crtime);
        Ok(attr)
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.unlink")]
    fn unlink(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize(path);
        let mut guard = self.state.lock();
        let FsState { paths, contents } = &mut *guard;

        if paths.get(&normalized)?.is_dir() {
            return Err(VfsError::is_a_directory(path_str(&normalized)));
        }

        paths.remove(&normalized)?;
        contents.remove(&normalized);
        if let Some(parent) = parent_of(&normalized) {
            touch(paths, parent, SystemTime::now());
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.rmdir")]
    fn rmdir(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize(path);
        if is_root(&normalized) {
            return Err(VfsError::permission_denied("cannot remove root"));
        }

        let mut guard = self.state.lock();
        let paths = &mut guard.paths;

        if !paths.get(&normalized)?.is_dir() {
            return Err(VfsError::not_a_directory(path_str(&normalized)));
        }
        if paths.has_children(&normalized) {
            return Err(VfsError::directory_not_empty(path_str(&normalized)));
        }

        paths.remove(&normalized)?;
        if let Some(parent) = parent_of(&normalized) {
            unlink_dir(paths, parent);
            touch(paths, parent, SystemTime::now());
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.rename")]
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from = normalize(from);
        let to = normalize(to);
        if is_root(&from) || is_root(&to) {
            return Err(VfsError::permission_denied("cannot rename root"));
        }

        let mut guard = self.state.lock();
        let FsState { paths, contents } = &mut *guard;

        // Every check happens before anything moves.
        let src_kind = paths.get(&from)?.kind;
        if from == to {
            return Ok(());
        }
        if to.starts_with(&from) {
            return Err(VfsError::invalid_path(format!(
                "cannot move {} into itself",
                path_str(&from)
            )));
        }
        let to_parent = parent_dir(paths, &to)?;
        let from_parent = parent_of(&from).map(Path::to_path_buf).unwrap_or_default();

        let replaced = match paths.get(&to) {
            Ok(dst) => match (src_kind, dst.kind) {
                (FileType::Directory, FileType::File) => {
                    return Err(VfsError::not_a_directory(path_str(&to)));
                }
                (FileType::File, FileType::Directory) => {
                    return Err(VfsError::is_a_directory(path_str(&to)));
                }
                (FileType::Directory, FileType::Directory) if paths.has_children(&to) => {
                    return Err(VfsError::directory_not_empty(path_str(&to)));
                }
                (_, kind) => Some(kind),
            },
            Err(_) => None,
        };

        if let Some(kind) = replaced {
            paths.remove(&to)?;
            contents.remove(&to);
            if kind.is_dir() {
                unlink_dir(paths, &to_parent);
            }
            debug!(to = %to.display(), "replaced existing entry");
        }

        paths.rename_subtree(&from, &to)?;
        contents.rename_subtree(&from, &to);

        if src_kind.is_dir() && from_parent != to_parent {
            unlink_dir(paths, &from_parent);
            link_dir(paths, &to_parent);
        }

        let now = SystemTime::now();
        touch(paths, &from_parent, now);
        touch(paths, &to_parent, now);
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.truncate")]
    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()> {
        let normalized = normalize(path);
        let mut guard = self.state.lock();
        let FsState { paths, contents } = &mut *guard;

        let attr = paths.get_mut(&normalized)?;
        if attr.is_dir() {
            return Err(VfsError::is_a_directory(path_str(&normalized)));
        }

        contents.truncate(&normalized, size)?;
        attr.size = size;
        attr.mtime = SystemTime::now();
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.chmod")]
    fn chmod(&self, path: &Path, mode: u32) -> VfsResult<()> {
        let normalized = normalize(path);
        let mut state = self.state.lock();
        let attr = state.paths.get_mut(&normalized)?;
        attr.perm = mode & PERM_MASK;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.chown")]
    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> VfsResult<()> {
        let normalized = normalize(path);
        let mut state = self.state.lock();
        let attr = state.paths.get_mut(&normalized)?;
        if let Some(uid) = uid {
            attr.uid = Some(uid);
        }
        if let Some(gid) = gid {
            attr.gid = Some(gid);
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.utimens")]
    fn utimens(
        &self,
        path: &Path,
        atime: Option<SystemTime>,
        mtime: Option<SystemTime>,
    ) -> VfsResult<()> {
        let normalized = normalize(path);
        let mut state = self.state.lock();
        let attr = state.paths.get_mut(&normalized)?;
        if let Some(atime) = atime {
            attr.atime = atime;
        }
        if let Some(mtime) = mtime {
            attr.mtime = mtime;
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), name = "vfs.setattr")]
    fn setattr(&self, path: &Path, set: SetAttr) -> VfsResult<FileAttr> {
        let normalized = normalize(path);
        let mut guard = self.state.lock();
        let FsState { paths, contents } = &mut *guard;

        let attr = paths.get_mut(&normalized)?;

        // Size is the only step that can fail, so it goes first.
        if let Some(size) = set.size {
            if attr.is_dir() {
                return Err(VfsError::is_a_directory(path_str(&normalized)));
            }
            contents.truncate(&normalized, size)?;
            attr.size = size;
            attr.mtime = SystemTime::now();
        }

        if let Some(perm) = set.perm {
            attr.perm = perm & PERM_MASK;
        }
        if let Some(uid) = set.uid {
            attr.uid = Some(uid);
        }
        if let Some(gid) = set.gid {
            attr.gid = Some(gid);
        }
        if let Some(atime) = set.atime {
            attr.atime = atime;
        }
        if let Some(mtime) = set.mtime {
            attr.mtime = mtime;
        }

        Ok(attr.clone())
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> FileHandle {
        let fh = self.handles.next();
        debug!(path = %path.display(), ?flags, %fh, "open");
        fh
    }

    fn release(&self, path: &Path, fh: FileHandle) {
        debug!(path = %path.display(), %fh, "release");
    }

    fn statfs(&self) -> StatFs {
        let state = self.state.lock();
        StatFs::with_usage(state.paths.len() as u64, state.contents.total_bytes())
    }
}
