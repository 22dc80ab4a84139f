use log::{info, warn};
use std::io;
#[cfg(unix)]
use std::os::unix::net::UnixDatagram;

use crate::utils::error::ReaderError;

/// Single-instance guard. On Linux it binds a socket in the abstract
/// namespace, which the kernel releases as soon as the process dies; other
/// Unix systems get a socket file in the temp directory.
pub struct InstanceLock {
    name: String,
    #[cfg(unix)]
    _socket: UnixDatagram,
    #[cfg(all(unix, not(target_os = "linux")))]
    path: std::path::PathBuf,
}

impl InstanceLock {
    pub fn acquire(name: &str) -> Result<Self, ReaderError> {
        match Self::bind(name) {
            Ok(lock) => {
                info!("🔒 I got the lock '{}'", name);
                Ok(lock)
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                warn!("Lock '{}' already exists, exiting.", name);
                Err(ReaderError::InstanceLocked(name.to_string()))
            }
            Err(e) => Err(ReaderError::ConfigError(format!(
                "Cannot create instance lock '{}': {}",
                name, e
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(target_os = "linux")]
    fn bind(name: &str) -> io::Result<Self> {
        use std::os::linux::net::SocketAddrExt;
        use std::os::unix::net::SocketAddr;

        let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
        let socket = UnixDatagram::bind_addr(&addr)?;
        Ok(Self {
            name: name.to_string(),
            _socket: socket,
        })
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    fn bind(name: &str) -> io::Result<Self> {
        let path = std::env::temp_dir().join(format!("{}.lock", name));
        let socket = bind_socket_file(&path)?;
        Ok(Self {
            name: name.to_string(),
            _socket: socket,
            path,
        })
    }

    #[cfg(not(unix))]
    fn bind(name: &str) -> io::Result<Self> {
        warn!("Single-instance lock is not supported on this platform");
        Ok(Self { name: name.to_string() })
    }
}

/// Binds a socket file, reclaiming it when nobody is listening on it any more.
/// A socket file outlives a crashed owner, so `AddrInUse` alone does not mean
/// the lock is held.
#[cfg(unix)]
#[cfg_attr(target_os = "linux", allow(dead_code))]
fn bind_socket_file(path: &std::path::Path) -> io::Result<UnixDatagram> {
    match UnixDatagram::bind(path) {
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            let probe = UnixDatagram::unbound()?;
            match probe.connect(path) {
                Ok(()) => Err(e),
                Err(c) if c.kind() == io::ErrorKind::ConnectionRefused => {
                    warn!("Removing stale lock socket {}", path.display());
                    std::fs::remove_file(path)?;
                    UnixDatagram::bind(path)
                }
                Err(_) => Err(e),
            }
        }
        other => other,
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!(
            "timeseries_reader_test_{}_{}_{}",
            tag,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        )
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let name = unique_name("held");
        let lock = InstanceLock::acquire(&name).unwrap();
        assert_eq!(lock.name(), name);

        match InstanceLock::acquire(&name) {
            Err(ReaderError::InstanceLocked(held)) => assert_eq!(held, name),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("lock acquired twice"),
        }
    }

    #[test]
    fn test_socket_file_of_dead_owner_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.lock");
        // left behind as if the owner had crashed
        drop(UnixDatagram::bind(&path).unwrap());
        assert!(path.exists());

        assert!(bind_socket_file(&path).is_ok());
    }

    #[test]
    fn test_socket_file_of_live_owner_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.lock");
        let _owner = UnixDatagram::bind(&path).unwrap();

        let err = bind_socket_file(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let name = unique_name("drop");
        drop(InstanceLock::acquire(&name).unwrap());
        assert!(InstanceLock::acquire(&name).is_ok());
    }
}
