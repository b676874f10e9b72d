use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`info`, `jabs=debug`, ...)
pub const LOG_ENV: &str = "JABS_LOG";

/// Route tracing output to `path`. The terminal belongs to the UI, so logs
/// never go to stdout or stderr.
///
/// Returns false, leaving logging off, if the file cannot be opened or a
/// subscriber is already installed.
pub fn init(path: &Path) -> bool {
    let file = match open_log_file(path) {
        Ok(file) => file,
        Err(_) => return false,
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .is_ok()
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("jabs").join("jabs.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_init_fails_for_unwritable_path() {
        let dir = tempdir().unwrap();
        // a directory cannot be opened as the log file
        assert!(!init(dir.path()));
    }
}
