//! Filesystem adapters.
//!
//! `NativeFs` uses `std::fs`. `EmbeddedFs` is assembled from raw
//! open/read/write/stat/mkdir calls and must behave identically.

use std::io;
use std::path::Path;

use crate::error::Error;
use crate::Result;

/// The four filesystem primitives the build needs.
pub trait FileSystem {
    /// Read the whole file as UTF-8 text.
    fn read_file(&self, path: &str) -> Result<String>;

    /// Create or truncate `path` and write `text` to it.
    fn write_file(&self, path: &str, text: &str) -> Result<()>;

    /// Whether `path` resolves to an existing entry (file or directory).
    fn exists(&self, path: &str) -> bool;

    /// Create exactly one directory level.
    ///
    /// Fails with [`Error::AlreadyExists`] when `path` already resolves.
    fn make_directory(&self, path: &str) -> Result<()>;
}

/// Filesystem adapter backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFs;

impl FileSystem for NativeFs {
    fn read_file(&self, path: &str) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::read(path, e))
    }

    fn write_file(&self, path: &str, text: &str) -> Result<()> {
        std::fs::write(path, text).map_err(|e| Error::write(path, e))
    }

    fn exists(&self, path: &str) -> bool {
        std::fs::canonicalize(Path::new(path)).is_ok()
    }

    fn make_directory(&self, path: &str) -> Result<()> {
        match std::fs::create_dir(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(Error::AlreadyExists {
                path: path.to_string(),
            }),
            Err(e) => Err(Error::create_directory(path, e)),
        }
    }
}

#[cfg(unix)]
pub use embedded::EmbeddedFs;

#[cfg(unix)]
mod embedded {
    use std::io;
    use std::os::fd::OwnedFd;

    use rustix::fs::{Mode, OFlags};
    use rustix::io::Errno;

    use super::FileSystem;
    use crate::error::Error;
    use crate::Result;

    const READ_CHUNK: usize = 8 * 1024;

    /// Filesystem adapter built directly on OS primitives.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct EmbeddedFs;

    fn read_all(fd: &OwnedFd) -> io::Result<Vec<u8>> {
        let mut contents = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match rustix::io::read(fd, &mut chunk[..]) {
                Ok(0) => return Ok(contents),
                Ok(n) => contents.extend_from_slice(&chunk[..n]),
                Err(Errno::INTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write_all(fd: &OwnedFd, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            match rustix::io::write(fd, bytes) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => bytes = &bytes[n..],
                Err(Errno::INTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    impl FileSystem for EmbeddedFs {
        fn read_file(&self, path: &str) -> Result<String> {
            let fd = rustix::fs::open(path, OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty())
                .map_err(|e| Error::read(path, e))?;
            let bytes = read_all(&fd).map_err(|e| Error::read(path, e))?;
            String::from_utf8(bytes)
                .map_err(|e| Error::read(path, io::Error::new(io::ErrorKind::InvalidData, e)))
        }

        fn write_file(&self, path: &str, text: &str) -> Result<()> {
            let fd = rustix::fs::open(
                path,
                OFlags::WRONLY | OFlags::CREATE | OFlags::TRUNC | OFlags::CLOEXEC,
                Mode::from_raw_mode(0o666),
            )
            .map_err(|e| Error::write(path, e))?;

            let written = write_all(&fd, text.as_bytes());
            // The descriptor is closed before any failure is reported.
            drop(fd);
            written.map_err(|e| Error::write(path, e))
        }

        fn exists(&self, path: &str) -> bool {
            rustix::fs::stat(path).is_ok()
        }

        fn make_directory(&self, path: &str) -> Result<()> {
            if self.exists(path) {
                return Err(Error::AlreadyExists {
                    path: path.to_string(),
                });
            }
            match rustix::fs::mkdir(path, Mode::from_raw_mode(0o777)) {
                Ok(()) => Ok(()),
                Err(Errno::EXIST) => Err(Error::AlreadyExists {
                    path: path.to_string(),
                }),
                Err(e) => Err(Error::create_directory(path, e)),
            }
        }
    }
}
