use crate::reading::{HEADER, Reading};
use crate::sample_buffer::SampleBuffer;
use crate::stop_signal::StopSignal;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

// Floor on the write period so a zero period cannot spin.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("failed to create log directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open log file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to append to log file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Append-only CSV record of the station's latest readings.
///
/// Whether the header is still owed is decided once, in [`DurableLogger::open`],
/// from whether the file already existed. It is not re-checked later, so a file
/// removed behind our back is recreated without a header.
#[derive(Debug)]
pub struct DurableLogger {
    path: PathBuf,
    header_pending: bool,
}

impl DurableLogger {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoggerError> {
        let path = path.into();

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| LoggerError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let header_pending = !path.exists();
        info!(
            path = %path.display(),
            new_file = header_pending,
            "durable log ready"
        );

        Ok(Self {
            path,
            header_pending,
        })
    }

    pub fn header_pending(&self) -> bool {
        self.header_pending
    }

    /// Append one record as a single write, preceded by the header on the
    /// first write to a new file.
    pub fn append(&mut self, reading: &Reading) -> Result<(), LoggerError> {
        let mut chunk = String::new();
        if self.header_pending {
            chunk.push_str(HEADER);
            chunk.push('\n');
        }
        chunk.push_str(&reading.to_record());
        chunk.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LoggerError::Open {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(chunk.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|source| LoggerError::Write {
                path: self.path.clone(),
                source,
            })?;

        if self.header_pending {
            debug!(path = %self.path.display(), "wrote log header");
            self.header_pending = false;
        }
        debug!(record = %reading.to_record(), "appended reading");
        Ok(())
    }

    /// Log the buffer's latest reading right away, then once per `period`
    /// until `stop` is set.
    ///
    /// Cycles that find the buffer empty are skipped. Returns the number of
    /// records written; the first I/O failure ends the task.
    pub fn run(
        mut self,
        buffer: &SampleBuffer,
        stop: &StopSignal,
        period: Duration,
    ) -> Result<u64, LoggerError> {
        let period = period.max(MIN_PERIOD);
        info!(
            path = %self.path.display(),
            period_ms = period.as_millis() as u64,
            "starting durable logger"
        );

        let mut written = 0;
        if let Some(first) = buffer.latest() {
            self.append_or_report(&first)?;
            written += 1;
        }

        while !stop.wait_timeout(period) {
            let Some(reading) = buffer.latest() else {
                debug!("no reading yet, skipping log cycle");
                continue;
            };
            self.append_or_report(&reading)?;
            written += 1;
        }

        info!(written, "stopping durable logger");
        Ok(written)
    }

    fn append_or_report(&mut self, reading: &Reading) -> Result<(), LoggerError> {
        self.append(reading).inspect_err(|err| {
            error!(?err, "durable logging failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
    use std::path::Path;
    use std::thread;
    use std::time::{Duration as StdDuration, Instant};

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_micro_opt(8, 30, 0, 250)
            .unwrap()
    }

    fn reading(seq: i64) -> Reading {
        Reading::new(
            base_time() + ChronoDuration::seconds(seq),
            20.0 + seq as f64 * 0.25,
            50.0,
            1010.5,
        )
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn assert_records_ordered(lines: &[String]) -> Vec<Reading> {
        let parsed: Vec<Reading> = lines
            .iter()
            .map(|line| Reading::parse_record(line).unwrap())
            .collect();
        assert!(parsed.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        parsed
    }

    #[test]
    fn test_new_file_gets_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");

        let mut logger = DurableLogger::open(&path).unwrap();
        assert!(logger.header_pending());
        for seq in 0..3 {
            logger.append(&reading(seq)).unwrap();
        }
        assert!(!logger.header_pending());

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        let parsed = assert_records_ordered(&lines[1..]);
        assert_eq!(parsed, vec![reading(0), reading(1), reading(2)]);
    }

    #[test]
    fn test_existing_file_gets_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");

        DurableLogger::open(&path).unwrap().append(&reading(0)).unwrap();
        let mut reopened = DurableLogger::open(&path).unwrap();
        assert!(!reopened.header_pending());
        reopened.append(&reading(1)).unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|line| *line == HEADER).count(), 1);
    }

    #[test]
    fn test_open_without_writing_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");

        let logger = DurableLogger::open(&path).unwrap();
        assert!(logger.header_pending());
        assert!(!path.exists());
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station").join("logs").join("weather_log.csv");

        DurableLogger::open(&path).unwrap().append(&reading(0)).unwrap();
        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_parent_that_is_a_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();

        let err = DurableLogger::open(blocker.join("weather_log.csv")).unwrap_err();
        assert!(matches!(err, LoggerError::CreateDir { .. }));
    }

    #[test]
    fn test_unwritable_destination_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");
        fs::create_dir(&path).unwrap();

        let buffer = SampleBuffer::new(4);
        buffer.append(reading(0));
        let stop = StopSignal::new();

        let err = DurableLogger::open(&path)
            .unwrap()
            .run(&buffer, &stop, StdDuration::from_secs(60))
            .unwrap_err();
        assert!(matches!(err, LoggerError::Open { .. }));
    }

    #[test]
    fn test_deleted_file_is_not_given_a_new_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");

        let mut logger = DurableLogger::open(&path).unwrap();
        logger.append(&reading(0)).unwrap();
        fs::remove_file(&path).unwrap();
        logger.append(&reading(1)).unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(Reading::parse_record(&lines[0]).unwrap(), reading(1));
    }

    #[test]
    fn test_run_skips_cycles_while_buffer_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");
        let buffer = SampleBuffer::new(4);
        let stop = StopSignal::new();

        let logger = DurableLogger::open(&path).unwrap();
        let written = thread::scope(|scope| {
            let worker =
                scope.spawn(|| logger.run(&buffer, &stop, StdDuration::from_millis(5)));
            thread::sleep(StdDuration::from_millis(40));
            stop.set();
            worker.join().unwrap().unwrap()
        });

        assert_eq!(written, 0);
        assert!(!path.exists());
    }

    fn wait_for_lines(path: &Path, count: usize) -> bool {
        let deadline = Instant::now() + StdDuration::from_secs(5);
        while Instant::now() < deadline {
            if path.exists() && read_lines(path).len() >= count {
                return true;
            }
            thread::sleep(StdDuration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_run_writes_first_record_without_waiting_for_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");
        let buffer = SampleBuffer::new(4);
        buffer.append(reading(0));
        let stop = StopSignal::new();

        let logger = DurableLogger::open(&path).unwrap();
        let written = thread::scope(|scope| {
            let worker = scope.spawn(|| logger.run(&buffer, &stop, StdDuration::from_secs(60)));
            assert!(wait_for_lines(&path, 2));
            stop.set();
            worker.join().unwrap().unwrap()
        });

        assert_eq!(written, 1);
        assert_eq!(read_lines(&path), vec![HEADER.to_string(), reading(0).to_record()]);
    }

    #[test]
    fn test_run_writes_immediately_then_periodically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");
        let buffer = SampleBuffer::new(4);
        buffer.append(reading(0));
        let stop = StopSignal::new();

        let logger = DurableLogger::open(&path).unwrap();
        let written = thread::scope(|scope| {
            // Long enough that nothing else lands between seeing a line and
            // reacting to it.
            let worker = scope.spawn(|| logger.run(&buffer, &stop, StdDuration::from_millis(300)));

            assert!(wait_for_lines(&path, 2));
            buffer.append(reading(1));
            assert!(wait_for_lines(&path, 3));
            buffer.append(reading(2));
            assert!(wait_for_lines(&path, 4));
            stop.set();
            worker.join().unwrap().unwrap()
        });

        assert_eq!(written, 3);
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        let parsed = assert_records_ordered(&lines[1..]);
        assert_eq!(parsed, vec![reading(0), reading(1), reading(2)]);
    }

    #[test]
    fn test_zero_period_does_not_spin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");
        let buffer = SampleBuffer::new(4);
        buffer.append(reading(0));
        let stop = StopSignal::new();

        let logger = DurableLogger::open(&path).unwrap();
        let written = thread::scope(|scope| {
            let worker = scope.spawn(|| logger.run(&buffer, &stop, StdDuration::ZERO));
            thread::sleep(StdDuration::from_millis(50));
            stop.set();
            worker.join().unwrap().unwrap()
        });

        assert!(written >= 1);
        assert!(written < 150, "written {written}");
        assert_eq!(read_lines(&path).len() as u64, written + 1);
    }

    #[test]
    fn test_run_stops_writing_after_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_log.csv");
        let buffer = SampleBuffer::new(4);
        buffer.append(reading(0));
        let stop = StopSignal::new();
        stop.set();

        let written = DurableLogger::open(&path)
            .unwrap()
            .run(&buffer, &stop, StdDuration::from_millis(5))
            .unwrap();

        // Only the startup write; no periodic cycle runs once stopped.
        assert_eq!(written, 1);
        thread::sleep(StdDuration::from_millis(20));
        assert_eq!(read_lines(&path).len(), 2);
    }
}
