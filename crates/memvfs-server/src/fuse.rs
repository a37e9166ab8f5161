//! FUSE adapter.
//!
//! Resolves kernel inode numbers to paths and forwards each request to a
//! [`VfsOps`] engine. Engine errors become errno replies.

#[cfg(feature = "fuse")]
mod impl_fuse {
    use std::ffi::OsStr;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use fuser::{
        FileAttr as FuseAttr, FileType as FuseFileType, Filesystem, MountOption, ReplyAttr,
        ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs,
        ReplyWrite, Request, TimeOrNow,
    };
    use memvfs_kernel::vfs::parent_of;
    use memvfs_kernel::{FileAttr, FileHandle, FileType, SetAttr, VfsOps};
    use tracing::debug;

    use crate::config::MountConfig;
    use crate::constants::ATTR_BLKSIZE;
    use crate::inodes::InodeTable;
    use crate::translate::{errno, masked_mode, offset as to_offset, open_flags};

    /// A [`VfsOps`] engine exposed through FUSE.
    pub struct MemVfsFuse<F: VfsOps> {
        fs: Arc<F>,
        inodes: InodeTable,
        ttl: Duration,
        uid: u32,
        gid: u32,
    }

    impl<F: VfsOps> MemVfsFuse<F> {
        pub fn new(fs: Arc<F>, ttl: Duration) -> Self {
            Self {
                fs,
                inodes: InodeTable::new(),
                ttl,
                // SAFETY: getuid/getgid cannot fail
                uid: unsafe { libc::getuid() },
                gid: unsafe { libc::getgid() },
            }
        }

        /// Convert engine attributes to FUSE attributes.
        fn to_file_attr(&self, ino: u64, attr: &FileAttr) -> FuseAttr {
            FuseAttr {
                ino,
                size: attr.size,
                blocks: attr.size.div_ceil(u64::from(ATTR_BLKSIZE)),
                atime: attr.atime,
                mtime: attr.mtime,
                ctime: attr.mtime,
                crtime: attr.crtime,
                kind: fuse_kind(attr.kind),
                perm: (attr.perm & 0o7777) as u16,
                nlink: attr.nlink,
                uid: attr.uid.unwrap_or(self.uid),
                gid: attr.gid.unwrap_or(self.gid),
                rdev: 0,
                blksize: ATTR_BLKSIZE,
                flags: 0,
            }
        }

        /// Attributes for `path`, registering its inode.
        fn entry(&mut self, path: &Path, attr: &FileAttr) -> FuseAttr {
            let ino = self.inodes.ino_for(path);
            self.to_file_attr(ino, attr)
        }

        fn path(&self, ino: u64) -> Result<PathBuf, i32> {
            self.inodes
                .path(ino)
                .map(Path::to_path_buf)
                .ok_or(libc::ENOENT)
        }

        fn child(&self, parent: u64, name: &OsStr) -> Result<PathBuf, i32> {
            self.inodes.child_path(parent, name).ok_or(libc::ENOENT)
        }
    }

    fn fuse_kind(kind: FileType) -> FuseFileType {
        match kind {
            FileType::File => FuseFileType::RegularFile,
            FileType::Directory => FuseFileType::Directory,
        }
    }

    fn resolve_time(time: TimeOrNow) -> SystemTime {
        match time {
            TimeOrNow::SpecificTime(t) => t,
            TimeOrNow::Now => SystemTime::now(),
        }
    }

    impl<F: VfsOps> Filesystem for MemVfsFuse<F> {
        fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
            let path = match self.child(parent, name) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            match self.fs.getattr(&path) {
                Ok(attr) => {
                    let attr = self.entry(&path, &attr);
                    reply.entry(&self.ttl, &attr, 0);
                }
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
            let path = match self.path(ino) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            match self.fs.getattr(&path) {
                Ok(attr) => reply.attr(&self.ttl, &self.to_file_attr(ino, &attr)),
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn setattr(
            &mut self,
            _req: &Request,
            ino: u64,
            mode: Option<u32>,
            uid: Option<u32>,
            gid: Option<u32>,
            size: Option<u64>,
            atime: Option<TimeOrNow>,
            mtime: Option<TimeOrNow>,
            _ctime: Option<SystemTime>,
            _fh: Option<u64>,
            _crtime: Option<SystemTime>,
            _chgtime: Option<SystemTime>,
            _bkuptime: Option<SystemTime>,
            _flags: Option<u32>,
            reply: ReplyAttr,
        ) {
            let path = match self.path(ino) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };

            let mut changes = SetAttr::new().with_owner(uid, gid);
            if let Some(size) = size {
                changes = changes.with_size(size);
            }
            if let Some(mode) = mode {
                changes = changes.with_perm(mode);
            }
            if let Some(atime) = atime {
                changes = changes.with_atime(resolve_time(atime));
            }
            if let Some(mtime) = mtime {
                changes = changes.with_mtime(resolve_time(mtime));
            }

            match self.fs.setattr(&path, changes) {
                Ok(attr) => reply.attr(&self.ttl, &self.to_file_attr(ino, &attr)),
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn readdir(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            offset: i64,
            mut reply: ReplyDirectory,
        ) {
            let path = match self.path(ino) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            let listing = match self.fs.readdir(&path) {
                Ok(entries) => entries,
                Err(e) => return reply.error(errno(&e)),
            };

            let parent = parent_of(&path).unwrap_or(&path).to_path_buf();
            let entries: Vec<(u64, FuseFileType, String)> = listing
                .into_iter()
                .map(|entry| {
                    let entry_ino = match entry.name.as_str() {
                        "." => ino,
                        ".." => self.inodes.ino_for(&parent),
                        name => self.inodes.ino_for(&path.join(name)),
                    };
                    (entry_ino, fuse_kind(entry.kind), entry.name)
                })
                .collect();

            let skip = usize::try_from(offset).unwrap_or(0);
            for (i, (e_ino, kind, name)) in entries.iter().enumerate().skip(skip) {
                if reply.add(*e_ino, (i + 1) as i64, *kind, name) {
                    break;
                }
            }
            reply.ok();
        }

        fn mkdir(
            &mut self,
            _req: &Request,
            parent: u64,
            name: &OsStr,
            mode: u32,
            umask: u32,
            reply: ReplyEntry,
        ) {
            let path = match self.child(parent, name) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            match self.fs.mkdir(&path, masked_mode(mode, umask)) {
                Ok(attr) => {
                    let attr = self.entry(&path, &attr);
                    reply.entry(&self.ttl, &attr, 0);
                }
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
            let path = match self.child(parent, name) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            match self.fs.rmdir(&path) {
                Ok(()) => {
                    self.inodes.forget(&path);
                    reply.ok();
                }
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn create(
            &mut self,
            _req: &Request,
            parent: u64,
            name: &OsStr,
            mode: u32,
            umask: u32,
            _flags: i32,
            reply: ReplyCreate,
        ) {
            let path = match self.child(parent, name) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            match self.fs.create(&path, masked_mode(mode, umask)) {
                Ok((attr, fh)) => {
                    let attr = self.entry(&path, &attr);
                    reply.created(&self.ttl, &attr, 0, fh.get(), 0);
                }
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
            let path = match self.path(ino) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            let flags = open_flags(flags);
            if flags.truncate && flags.write {
                if let Err(e) = self.fs.truncate(&path, 0) {
                    return reply.error(errno(&e));
                }
            }
            let fh = self.fs.open(&path, flags);
            reply.opened(fh.get(), 0);
        }

        fn read(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            offset: i64,
            size: u32,
            _flags: i32,
            _lock: Option<u64>,
            reply: ReplyData,
        ) {
            let path = match self.path(ino) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            let offset = match to_offset(offset) {
                Ok(o) => o,
                Err(e) => return reply.error(e),
            };
            match self.fs.read(&path, offset, size) {
                Ok(data) => reply.data(&data),
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn write(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            offset: i64,
            data: &[u8],
            _write_flags: u32,
            _flags: i32,
            _lock_owner: Option<u64>,
            reply: ReplyWrite,
        ) {
            let path = match self.path(ino) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            let offset = match to_offset(offset) {
                Ok(o) => o,
                Err(e) => return reply.error(e),
            };
            match self.fs.write(&path, offset, data) {
                Ok(written) => reply.written(written),
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn release(
            &mut self,
            _req: &Request,
            ino: u64,
            fh: u64,
            _flags: i32,
            _lock: Option<u64>,
            _flush: bool,
            reply: ReplyEmpty,
        ) {
            // Released after unlink: the inode may already be gone
            if let Ok(path) = self.path(ino) {
                self.fs.release(&path, FileHandle::from_raw(fh));
            }
            reply.ok();
        }

        fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
            let path = match self.child(parent, name) {
                Ok(p) => p,
                Err(e) => return reply.error(e),
            };
            match self.fs.unlink(&path) {
                Ok(()) => {
                    self.inodes.forget(&path);
                    reply.ok();
                }
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn rename(
            &mut self,
            _req: &Request,
            parent: u64,
            name: &OsStr,
            newparent: u64,
            newname: &OsStr,
            flags: u32,
            reply: ReplyEmpty,
        ) {
            if flags != 0 {
                // RENAME_NOREPLACE / RENAME_EXCHANGE
                debug!(flags, "rename flags unsupported");
                return reply.error(libc::EINVAL);
            }
            let (from, to) = match (self.child(parent, name), self.child(newparent, newname)) {
                (Ok(from), Ok(to)) => (from, to),
                (Err(e), _) | (_, Err(e)) => return reply.error(e),
            };
            match self.fs.rename(&from, &to) {
                Ok(()) => {
                    self.inodes.rename(&from, &to);
                    reply.ok();
                }
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn statfs(&mut self, _req: &Request, _ino: u64, reply: ReplyStatfs) {
            let st = self.fs.statfs();
            reply.statfs(
                st.blocks, st.bfree, st.bavail, st.files, st.ffree, st.bsize, st.namelen,
                st.frsize,
            );
        }
    }

    fn mount_options(config: &MountConfig) -> Vec<MountOption> {
        let mut options = vec![
            MountOption::RW,
            MountOption::FSName(config.fs_name.clone()),
        ];
        if config.auto_unmount {
            options.push(MountOption::AutoUnmount);
        }
        if config.allow_other {
            options.push(MountOption::AllowOther);
        }
        options
    }

    /// Mount on a background thread.
    ///
    /// Dropping the returned session unmounts.
    pub fn spawn_mount<F: VfsOps + 'static>(
        fs: Arc<F>,
        mountpoint: &Path,
        config: &MountConfig,
    ) -> std::io::Result<fuser::BackgroundSession> {
        let adapter = MemVfsFuse::new(fs, config.attr_ttl());
        fuser::spawn_mount2(adapter, mountpoint, &mount_options(config))
    }

}

#[cfg(feature = "fuse")]
pub use impl_fuse::{spawn_mount, MemVfsFuse};
