//! Physical file identity, used to notice when a watched path has been
//! rotated out from under an open handle.

use std::fmt;
use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;

/// Identity of a file on disk: device + inode on Unix, volume serial number +
/// file index on Windows.
///
/// Two paths with the same `FileId` refer to the same physical file, even
/// across renames. Only equality is meaningful; the `Display` form is for
/// logs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    /// Identity of an already open file.
    #[cfg(unix)]
    pub fn from_file(file: &File) -> io::Result<Self> {
        Ok(Self::from_metadata(&file.metadata()?))
    }

    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        FileId {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }

    /// Identity of an already open file.
    #[cfg(windows)]
    pub fn from_file(file: &File) -> io::Result<Self> {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::Foundation::HANDLE;
        use windows_sys::Win32::Storage::FileSystem::{
            GetFileInformationByHandle, BY_HANDLE_FILE_INFORMATION,
        };

        let handle = file.as_raw_handle() as HANDLE;
        let mut info: BY_HANDLE_FILE_INFORMATION = unsafe { std::mem::zeroed() };

        if unsafe { GetFileInformationByHandle(handle, &mut info) } == 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(FileId {
            dev: info.dwVolumeSerialNumber as u64,
            ino: ((info.nFileIndexHigh as u64) << 32) | (info.nFileIndexLow as u64),
        })
    }

    /// Identity of whatever file currently lives at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        stat(path).map(|(id, _)| id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}g{:x}", self.dev, self.ino)
    }
}

/// Stats `path`, returning the identity and metadata of the file found there.
#[cfg(unix)]
pub(crate) fn stat(path: impl AsRef<Path>) -> io::Result<(FileId, Metadata)> {
    let metadata = fs::metadata(path)?;

    Ok((FileId::from_metadata(&metadata), metadata))
}

/// Stats `path`, returning the identity and metadata of the file found there.
///
/// Windows only exposes the file index through a handle, so this briefly
/// opens the file.
#[cfg(windows)]
pub(crate) fn stat(path: impl AsRef<Path>) -> io::Result<(FileId, Metadata)> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;
    let file = File::open(path)?;

    Ok((FileId::from_file(&file)?, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_same_file_same_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, b"foo\n").unwrap();

        let file = File::open(&path).unwrap();
        assert_eq!(
            FileId::from_file(&file).unwrap(),
            FileId::from_path(&path).unwrap()
        );
    }

    #[test]
    fn test_id_stable_across_append_and_rename() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        let renamed = dir.path().join("a.log.1");
        std::fs::write(&path, b"foo\n").unwrap();
        let before = FileId::from_path(&path).unwrap();

        let mut f = fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"bar\n").unwrap();
        drop(f);
        fs::rename(&path, &renamed).unwrap();

        assert_eq!(before, FileId::from_path(&renamed).unwrap());
    }

    #[test]
    fn test_recreated_file_differs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        let renamed = dir.path().join("a.log.1");
        std::fs::write(&path, b"foo\n").unwrap();
        let first = FileId::from_path(&path).unwrap();

        // Keep the old inode alive so it can't be reused for the new file.
        fs::rename(&path, &renamed).unwrap();
        std::fs::write(&path, b"bar\n").unwrap();

        assert_ne!(first, FileId::from_path(&path).unwrap());
    }

    #[test]
    fn test_missing_path() {
        let dir = tempdir().unwrap();
        let err = FileId::from_path(dir.path().join("nope.log")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_display() {
        let id = FileId { dev: 255, ino: 16 };
        assert_eq!(id.to_string(), "ffg10");
    }
}
