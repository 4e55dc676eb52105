use crate::error::{ResmonError, Result};
use crate::process::KillSignal;
use nix::sys::signal;
use nix::unistd::Pid;

pub trait SignalSender: Send + Sync {
    fn send(&self, pid: i32, signal: KillSignal) -> Result<()>;
}

/// Delivers signals with kill(2).
pub struct NixSignalSender;

impl SignalSender for NixSignalSender {
    fn send(&self, pid: i32, sig: KillSignal) -> Result<()> {
        signal::kill(Pid::from_raw(pid), signal::Signal::from(sig))
            .map_err(|source| ResmonError::Signal { pid, source })
    }
}

pub trait CachePurger: Send + Sync {
    fn purge(&self) -> Result<()>;
}

/// Flushes the OS file cache. Needs elevated privileges on every platform.
pub struct SystemCachePurger;

impl CachePurger for SystemCachePurger {
    #[cfg(target_os = "macos")]
    fn purge(&self) -> Result<()> {
        let output = std::process::Command::new("osascript")
            .args(["-e", r#"do shell script "purge" with administrator privileges"#])
            .output()?;

        if !output.status.success() {
            return Err(ResmonError::Purge(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn purge(&self) -> Result<()> {
        procfs::sys::vm::drop_caches(procfs::sys::vm::DropCache::All)
            .map_err(|e| ResmonError::Purge(e.to_string()))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    fn purge(&self) -> Result<()> {
        Err(ResmonError::Unsupported("cache purge"))
    }
}
