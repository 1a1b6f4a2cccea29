//! Crash report value object and its fixed textual layout.
//!
//! The layout is frozen for human round-tripping: section markers, field
//! order, and blank lines must not change, including the `Android Version`
//! marker retained from the original report format.

use std::path::Path;

/// Device identity fields embedded in every crash report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub brand: String,
    pub device: String,
    pub model: String,
    pub id: String,
    pub product: String,
}

impl DeviceInfo {
    /// Collect what the host environment can provide.
    pub fn detect() -> Self {
        Self {
            brand: std::env::consts::OS.to_string(),
            device: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
            model: std::env::consts::ARCH.to_string(),
            id: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            product: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Runtime/build version fields embedded in every crash report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub sdk: String,
    pub release: String,
    pub incremental: String,
}

impl RuntimeInfo {
    pub fn detect() -> Self {
        Self {
            sdk: env!("CARGO_PKG_VERSION_MAJOR").to_string(),
            release: env!("CARGO_PKG_VERSION").to_string(),
            incremental: option_env!("SOUNDPAD_BUILD_ID").unwrap_or("dev").to_string(),
        }
    }
}

/// Immutable snapshot of one unhandled fault.
#[derive(Debug, Clone)]
pub struct CrashReport {
    /// Milliseconds since the UNIX epoch; also embedded in the file name
    pub timestamp_ms: u64,
    pub thread_name: String,
    pub stack_trace: String,
    pub device: DeviceInfo,
    pub runtime: RuntimeInfo,
}

impl CrashReport {
    /// File name for this report: `crash_<tag>_<epochMillis>.log`.
    pub fn file_name(&self, tag: &str) -> String {
        format!("crash_{}_{}.log", tag, self.timestamp_ms)
    }

    /// Serialize to the fixed textual layout.
    pub fn render(&self, log_path: &Path) -> String {
        let mut out = String::new();

        out.push_str("===== BEGIN CRASH LOG =====\n");
        out.push_str("***** Crash Log Path *****\n");
        out.push_str(&format!("{}\n\n", log_path.display()));

        out.push_str("***** Stack Trace *****\n");
        out.push_str(&format!(
            "{}\n\n",
            self.stack_trace.trim_end_matches('\n')
        ));

        out.push_str("***** Device *****\n");
        out.push_str(&format!("Brand:{}\n", self.device.brand));
        out.push_str(&format!("Device:{}\n", self.device.device));
        out.push_str(&format!("Model:{}\n", self.device.model));
        out.push_str(&format!("ID:{}\n", self.device.id));
        out.push_str(&format!("Product:{}\n", self.device.product));
        out.push('\n');

        out.push_str("***** Android Version *****\n");
        out.push_str(&format!("SDK:{}\n", self.runtime.sdk));
        out.push_str(&format!("Release:{}\n", self.runtime.release));
        out.push_str(&format!("Incremental:{}\n", self.runtime.incremental));
        out.push_str("===== END CRASH LOG =====\n");

        out
    }
}
