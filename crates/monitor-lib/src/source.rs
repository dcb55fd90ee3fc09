//! Tail-following access-log source
//!
//! Reads the CSV access log from the front, then keeps polling for
//! appended data like `tail -f`. Records sharing a second are grouped into
//! one window, and a window is yielded once a record from a later second
//! arrives. The source never blocks; the driver paces the polling.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::MonitorError;
use crate::record::LogRecord;
use crate::window::SecondWindow;

/// Produces per-second windows for the monitoring loop.
pub trait WindowSource {
    /// Poll for the next complete window without blocking.
    fn poll_window(&mut self) -> Result<SourcePoll, MonitorError>;
}

/// Outcome of polling a window source.
#[derive(Debug)]
pub enum SourcePoll {
    /// A second's worth of records is complete.
    Window(SecondWindow),
    /// No complete window yet; poll again later.
    Pending,
    /// The source has been idle past its timeout.
    Exhausted,
}

/// Tail-following reader over a CSV access log.
pub struct LogSource {
    reader: BufReader<File>,
    /// Window being filled until a later second shows up.
    pending: Option<SecondWindow>,
    /// Partially written trailing line, kept until its newline arrives.
    carry: String,
    idle_timeout: Option<Duration>,
    last_progress: Instant,
}

impl LogSource {
    /// Open the log file and skip its header line.
    ///
    /// With `idle_timeout` set, the source reports exhaustion once no new
    /// data has appeared for that long; otherwise it tails forever.
    pub fn open(path: impl AsRef<Path>, idle_timeout: Option<Duration>) -> Result<Self, MonitorError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut header = String::new();
        reader.read_line(&mut header)?;

        Ok(Self {
            reader,
            pending: None,
            carry: String::new(),
            idle_timeout,
            last_progress: Instant::now(),
        })
    }

    /// Admit one parsed record into the pending window, completing the
    /// previous window when the record opens a new second.
    fn admit(&mut self, record: LogRecord) -> Result<Option<SecondWindow>, MonitorError> {
        if let Some(window) = &mut self.pending {
            if window.timestamp() == record.timestamp {
                window.push(record)?;
                return Ok(None);
            }
        }
        let mut next = SecondWindow::new(record.timestamp);
        next.push(record)?;
        // Completes the previous second, if any.
        Ok(self.pending.replace(next))
    }
}

impl WindowSource for LogSource {
    fn poll_window(&mut self) -> Result<SourcePoll, MonitorError> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                // End of file for now; the writer may still be appending.
                if let Some(timeout) = self.idle_timeout {
                    if self.last_progress.elapsed() >= timeout {
                        debug!("log source idle past timeout, ending stream");
                        return Ok(SourcePoll::Exhausted);
                    }
                }
                return Ok(SourcePoll::Pending);
            }
            self.last_progress = Instant::now();

            if !line.ends_with('\n') {
                // Half-written line: keep it until the rest shows up.
                self.carry.push_str(&line);
                return Ok(SourcePoll::Pending);
            }
            if !self.carry.is_empty() {
                line = std::mem::take(&mut self.carry) + &line;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record = match LogRecord::parse(trimmed) {
                Ok(record) => record,
                Err(err) => {
                    warn!(error = %err, "skipping malformed log line");
                    continue;
                }
            };

            if let Some(complete) = self.admit(record)? {
                return Ok(SourcePoll::Window(complete));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = r#""remotehost","rfc931","authuser","date","request","status","bytes""#;

    fn line(seconds: i64, path: &str) -> String {
        format!(r#""10.0.0.1","-","apache",{seconds},"GET {path} HTTP/1.0",200,123"#)
    }

    fn source_over(lines: &[String]) -> (LogSource, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for l in lines {
            writeln!(file, "{l}").unwrap();
        }
        file.flush().unwrap();
        let source = LogSource::open(file.path(), None).unwrap();
        (source, file)
    }

    fn expect_window(source: &mut LogSource) -> SecondWindow {
        match source.poll_window().unwrap() {
            SourcePoll::Window(window) => window,
            other => panic!("expected a window, got {other:?}"),
        }
    }

    #[test]
    fn test_groups_consecutive_seconds_into_windows() {
        let (mut source, _file) = source_over(&[
            line(100, "/api/user"),
            line(100, "/report"),
            line(100, "/api/user"),
            line(101, "/api"),
            line(101, "/help"),
            line(102, "/test"),
            line(102, "/test"),
            line(103, "/api"),
        ]);

        assert_eq!(expect_window(&mut source).len(), 3);
        assert_eq!(expect_window(&mut source).len(), 2);
        assert_eq!(expect_window(&mut source).len(), 2);
        // The last second has no successor yet, so it stays pending.
        assert!(matches!(source.poll_window().unwrap(), SourcePoll::Pending));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let (mut source, _file) = source_over(&[
            line(100, "/api"),
            "not,a,log,line".to_string(),
            line(101, "/api"),
        ]);

        let window = expect_window(&mut source);
        assert_eq!(window.timestamp().timestamp(), 100);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_partial_trailing_line_is_carried() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "{}", line(100, "/api")).unwrap();
        let full = line(101, "/report");
        let (head, tail) = full.split_at(20);
        write!(file, "{head}").unwrap();
        file.flush().unwrap();

        let mut source = LogSource::open(file.path(), None).unwrap();
        assert!(matches!(source.poll_window().unwrap(), SourcePoll::Pending));

        writeln!(file, "{tail}").unwrap();
        file.flush().unwrap();

        // The completed second line closes the first window.
        let window = expect_window(&mut source);
        assert_eq!(window.timestamp().timestamp(), 100);
    }

    #[test]
    fn test_idle_timeout_exhausts_the_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "{}", line(100, "/api")).unwrap();
        file.flush().unwrap();

        let mut source = LogSource::open(file.path(), Some(Duration::ZERO)).unwrap();
        assert!(matches!(
            source.poll_window().unwrap(),
            SourcePoll::Exhausted
        ));
    }
}
