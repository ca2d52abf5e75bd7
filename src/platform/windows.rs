use anyhow::Result;

/// Keeps the gateway's console window hidden
pub const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Windows has no SIGTERM equivalent for a windowless child, so callers
/// treat this error as "escalate to a forced kill right away".
pub fn request_terminate(pid: u32) -> Result<()> {
    anyhow::bail!("Graceful termination is not available on Windows (pid {})", pid)
}
