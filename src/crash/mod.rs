//! Uncaught-failure recorder.
//!
//! Registered once at process start as the panic hook. On an unhandled
//! fault it captures a [`CrashReport`], persists it next to a
//! collision-resistant path, hands the serialized text to an optional
//! viewer, and terminates the process. Every step before termination is
//! best-effort: a failure while reporting a failure must never prevent
//! the final termination.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::OnceCell;

use crate::config::CrashConfig;

mod report;

pub use report::{CrashReport, DeviceInfo, RuntimeInfo};

/// External presentation target for a recorded fault.
///
/// Receives the serialized report text and the path the report was
/// written to (the file may be missing if persistence failed).
pub trait CrashViewer: Send + Sync {
    fn present(&self, report: &str, log_path: &std::path::Path);
}

/// Process-wide registration point; the recorder is installed at most once.
static INSTALLED: OnceCell<Arc<CrashRecorder>> = OnceCell::new();
static HOOK: Once = Once::new();

/// Captures unhandled faults, persists them, and terminates the process.
pub struct CrashRecorder {
    tag: String,
    report_dir: Option<PathBuf>,
    device: DeviceInfo,
    runtime: RuntimeInfo,
    viewer: Option<Arc<dyn CrashViewer>>,
    terminator: Box<dyn Fn() + Send + Sync>,
    handling: AtomicBool,
}

impl CrashRecorder {
    /// Create a recorder from configuration, detecting host metadata.
    pub fn new(config: &CrashConfig) -> Self {
        Self {
            tag: config.tag.clone(),
            report_dir: config.report_dir.clone(),
            device: DeviceInfo::detect(),
            runtime: RuntimeInfo::detect(),
            viewer: None,
            terminator: Box::new(|| std::process::exit(1)),
            handling: AtomicBool::new(false),
        }
    }

    /// Attach a viewer to hand the report to before terminating.
    pub fn with_viewer(mut self, viewer: Arc<dyn CrashViewer>) -> Self {
        self.viewer = Some(viewer);
        self
    }

    /// Override detected device metadata (test harnesses).
    pub fn with_device_info(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Override detected runtime metadata (test harnesses).
    pub fn with_runtime_info(mut self, runtime: RuntimeInfo) -> Self {
        self.runtime = runtime;
        self
    }

    /// Replace the final termination step (test harnesses count calls
    /// instead of exiting).
    pub fn with_terminator<F: Fn() + Send + Sync + 'static>(mut self, terminator: F) -> Self {
        self.terminator = Box::new(terminator);
        self
    }

    /// Install this recorder as the process panic hook.
    ///
    /// The first call wins; later calls return the already-installed
    /// recorder unchanged.
    pub fn install(self) -> Arc<CrashRecorder> {
        let recorder = INSTALLED.get_or_init(|| Arc::new(self));
        let hook_target = Arc::clone(recorder);
        HOOK.call_once(move || {
            std::panic::set_hook(Box::new(move |info| {
                let thread = std::thread::current();
                let thread_name = thread.name().unwrap_or("unnamed").to_string();
                let backtrace = std::backtrace::Backtrace::force_capture();
                let stack_trace = format!("{}\n{}", info, backtrace);
                hook_target.record(&thread_name, &stack_trace);
            }));
        });
        Arc::clone(recorder)
    }

    /// Record one fault: persist, hand off, terminate.
    ///
    /// Never panics; a recursive fault short-circuits straight to
    /// termination.
    pub fn record(&self, thread_name: &str, stack_trace: &str) {
        if self.handling.swap(true, Ordering::SeqCst) {
            log::error!("[CrashRecorder] fault while recording a fault; terminating");
            (self.terminator)();
            return;
        }

        log::error!("[CrashRecorder] Uncaught fault on thread '{}'", thread_name);

        let report = CrashReport {
            timestamp_ms: now_timestamp_ms(),
            thread_name: thread_name.to_string(),
            stack_trace: stack_trace.to_string(),
            device: self.device.clone(),
            runtime: self.runtime.clone(),
        };

        let dir = self
            .report_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let path = dir.join(report.file_name(&self.tag));
        let text = report.render(&path);

        // Persist: logged on failure, not retried, does not stop handoff
        if let Err(err) = std::fs::create_dir_all(&dir) {
            log::warn!(
                "[CrashRecorder] could not create report dir {}: {}",
                dir.display(),
                err
            );
        }
        match std::fs::write(&path, &text) {
            Ok(()) => log::info!(
                "[CrashRecorder] Successfully written crash log to {}",
                path.display()
            ),
            Err(err) => log::error!("[CrashRecorder] Failed to write crash log: {}", err),
        }

        // Hand off: contained so a faulty viewer cannot stop termination
        if let Some(viewer) = &self.viewer {
            let handoff = std::panic::catch_unwind(AssertUnwindSafe(|| {
                viewer.present(&text, &path);
            }));
            if handoff.is_err() {
                log::error!("[CrashRecorder] Failed to hand off crash report to viewer");
            }
        }

        self.handling.store(false, Ordering::SeqCst);
        (self.terminator)();
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CaptureViewer {
        seen: Mutex<Vec<(String, PathBuf)>>,
    }

    impl CrashViewer for CaptureViewer {
        fn present(&self, report: &str, log_path: &Path) {
            self.seen
                .lock()
                .unwrap()
                .push((report.to_string(), log_path.to_path_buf()));
        }
    }

    struct PanickyViewer;

    impl CrashViewer for PanickyViewer {
        fn present(&self, _report: &str, _log_path: &Path) {
            panic!("viewer exploded");
        }
    }

    fn test_config(label: &str) -> CrashConfig {
        CrashConfig {
            tag: "demo".to_string(),
            report_dir: Some(std::env::temp_dir().join(format!(
                "soundpad_crash_{}_{}",
                label,
                std::process::id()
            ))),
        }
    }

    fn counting_terminator() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&count);
        (count, move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_record_persists_and_terminates_once() {
        let (terminations, terminator) = counting_terminator();
        let viewer = Arc::new(CaptureViewer::default());
        let recorder = CrashRecorder::new(&test_config("persist"))
            .with_viewer(Arc::clone(&viewer) as Arc<dyn CrashViewer>)
            .with_terminator(terminator);

        recorder.record("worker-1", "trace line\n");

        assert_eq!(terminations.load(Ordering::SeqCst), 1);

        let seen = viewer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (report, path) = &seen[0];
        assert_eq!(&std::fs::read_to_string(path).unwrap(), report);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("crash_demo_"));
    }

    #[test]
    fn test_persistence_failure_does_not_stop_handoff() {
        let (terminations, terminator) = counting_terminator();
        let viewer = Arc::new(CaptureViewer::default());
        let config = CrashConfig {
            tag: "demo".to_string(),
            // Not creatable on any sane host
            report_dir: Some(PathBuf::from("/proc/soundpad-no-such-dir")),
        };
        let recorder = CrashRecorder::new(&config)
            .with_viewer(Arc::clone(&viewer) as Arc<dyn CrashViewer>)
            .with_terminator(terminator);

        recorder.record("main", "trace\n");

        assert_eq!(viewer.seen.lock().unwrap().len(), 1);
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_faulty_viewer_cannot_stop_termination() {
        let (terminations, terminator) = counting_terminator();
        let recorder = CrashRecorder::new(&test_config("faulty_viewer"))
            .with_viewer(Arc::new(PanickyViewer))
            .with_terminator(terminator);

        recorder.record("main", "trace\n");

        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_report_uses_injected_metadata() {
        let (_terminations, terminator) = counting_terminator();
        let viewer = Arc::new(CaptureViewer::default());
        let recorder = CrashRecorder::new(&test_config("metadata"))
            .with_device_info(DeviceInfo {
                brand: "acme".to_string(),
                device: "box".to_string(),
                model: "m1".to_string(),
                id: "id9".to_string(),
                product: "demo".to_string(),
            })
            .with_runtime_info(RuntimeInfo {
                sdk: "7".to_string(),
                release: "9.9.9".to_string(),
                incremental: "build42".to_string(),
            })
            .with_viewer(Arc::clone(&viewer) as Arc<dyn CrashViewer>)
            .with_terminator(terminator);

        recorder.record("worker-2", "boom\n");

        let seen = viewer.seen.lock().unwrap();
        let (report, _path) = &seen[0];
        assert!(report.contains("Brand:acme\n"));
        assert!(report.contains("SDK:7\n"));
        assert!(report.contains("Incremental:build42\n"));
    }
}
