// ── Kernel log follower ──
//
// Polls a syslog file for appended lines and hands them to the
// controller, which keeps the ones carrying the drop marker.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use netgate_core::Controller;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Incremental reader over an append-only log file.
#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    /// `None` until the first poll, which skips existing content.
    offset: Option<u64>,
    partial: String,
}

impl LogTail {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            offset: None,
            partial: String::new(),
        }
    }

    /// Return the complete lines appended since the last poll.
    pub async fn poll(&mut self) -> std::io::Result<Vec<String>> {
        let len = tokio::fs::metadata(&self.path).await?.len();
        let offset = match self.offset {
            None => {
                self.offset = Some(len);
                return Ok(Vec::new());
            }
            // Truncated or rotated.
            Some(offset) if len < offset => {
                self.partial.clear();
                0
            }
            Some(offset) => offset,
        };
        if len == offset {
            self.offset = Some(offset);
            return Ok(Vec::new());
        }

        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut buf = Vec::new();
        let read = file.read_to_end(&mut buf).await?;
        self.offset = Some(offset + u64::try_from(read).unwrap_or(u64::MAX));

        self.partial.push_str(&String::from_utf8_lossy(&buf));
        let mut lines: Vec<String> = self.partial.split('\n').map(str::to_owned).collect();
        // Last piece has no newline yet.
        self.partial = lines.pop().unwrap_or_default();
        lines.retain(|l| !l.trim().is_empty());
        Ok(lines)
    }
}

/// Follow `path` until cancelled, forwarding every new line.
pub async fn watch_syslog(controller: Controller, path: PathBuf, cancel: CancellationToken) {
    info!(path = %path.display(), "following kernel log");
    let mut tail = LogTail::new(path);
    let mut interval = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match tail.poll().await {
                    Ok(lines) => {
                        for line in lines {
                            controller.record_drop_line(&line);
                        }
                    }
                    Err(e) => debug!(error = %e, "kernel log not readable"),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &std::path::Path, text: &str) {
        let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn first_poll_skips_existing_content() {
        let file = tempfile::NamedTempFile::new().unwrap();
        append(file.path(), "old line\n");

        let mut tail = LogTail::new(file.path().to_path_buf());
        assert!(tail.poll().await.unwrap().is_empty());

        append(file.path(), "kernel: FWDROP: SRC=10.0.0.1\n");
        assert_eq!(
            tail.poll().await.unwrap(),
            vec!["kernel: FWDROP: SRC=10.0.0.1".to_owned()]
        );
        assert!(tail.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_lines_wait_for_newline() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut tail = LogTail::new(file.path().to_path_buf());
        tail.poll().await.unwrap();

        append(file.path(), "FWDROP: SRC=");
        assert!(tail.poll().await.unwrap().is_empty());
        append(file.path(), "10.0.0.2\nnext");
        assert_eq!(tail.poll().await.unwrap(), vec!["FWDROP: SRC=10.0.0.2"]);
    }

    #[tokio::test]
    async fn truncation_restarts_from_top() {
        let file = tempfile::NamedTempFile::new().unwrap();
        append(file.path(), "a much longer line that will vanish\n");
        let mut tail = LogTail::new(file.path().to_path_buf());
        tail.poll().await.unwrap();

        std::fs::write(file.path(), "fresh\n").unwrap();
        assert_eq!(tail.poll().await.unwrap(), vec!["fresh"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut tail = LogTail::new(dir.path().join("absent.log"));
        assert!(tail.poll().await.is_err());
    }
}
