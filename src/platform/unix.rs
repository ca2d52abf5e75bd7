use anyhow::{Context, Result};

/// Ask a process to shut down by sending SIGTERM
pub fn request_terminate(pid: u32) -> Result<()> {
    let pid = libc::pid_t::try_from(pid).context("Process id out of range")?;

    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("Failed to send SIGTERM to process {}", pid));
    }

    Ok(())
}

/// Check whether a process with the given id is still alive
#[cfg(test)]
pub fn process_exists(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };

    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}
