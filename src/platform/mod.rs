/// Common cross-platform utilities
pub mod common;

/// Unix process signalling
#[cfg(unix)]
pub mod unix;

/// Windows process control
#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub use unix::request_terminate;
#[cfg(windows)]
pub use windows::request_terminate;

/// Platform name in the form the gateway UI expects (Node's `process.platform`)
#[cfg_attr(not(feature = "ui"), allow(dead_code))]
pub fn node_platform() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}
