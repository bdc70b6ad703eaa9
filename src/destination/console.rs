//! Console output

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use super::Destination;
use crate::error::DestinationWriteError;

/// Writes each line to a shared stream, one whole line at a time
pub struct ConsoleDestination {
    label: &'static str,
    stream: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleDestination {
    /// Standard output
    pub fn stdout() -> Self {
        Self::with_writer("<stdout>", Box::new(io::stdout()))
    }

    /// Standard error
    pub fn stderr() -> Self {
        Self::with_writer("<stderr>", Box::new(io::stderr()))
    }

    /// Any writer; `label` names it in error reports
    pub fn with_writer(label: &'static str, stream: Box<dyn Write + Send>) -> Self {
        Self {
            label,
            stream: Mutex::new(stream),
        }
    }

    fn write_error(&self, source: io::Error) -> DestinationWriteError {
        DestinationWriteError::Write {
            path: PathBuf::from(self.label),
            source,
        }
    }
}

impl Destination for ConsoleDestination {
    fn write_line(&self, line: &str) -> Result<(), DestinationWriteError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let mut stream = self
            .stream
            .lock()
            .map_err(|_| DestinationWriteError::Poisoned)?;
        stream
            .write_all(buf.as_bytes())
            .and_then(|_| stream.flush())
            .map_err(|e| self.write_error(e))
    }

    fn flush(&self) -> Result<(), DestinationWriteError> {
        let mut stream = self
            .stream
            .lock()
            .map_err(|_| DestinationWriteError::Poisoned)?;
        stream.flush().map_err(|e| self.write_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Cloneable in-memory writer so tests can read back what was written
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_appends_newline() {
        let buf = SharedBuf::default();
        let console = ConsoleDestination::with_writer("<test>", Box::new(buf.clone()));

        console.write_line("hello").unwrap();
        console.write_line("world").unwrap();

        assert_eq!(buf.contents(), "hello\nworld\n");
    }

    #[test]
    fn test_console_write_failure_names_stream() {
        let console = ConsoleDestination::with_writer("<broken>", Box::new(BrokenPipe));
        let err = console.write_line("lost").unwrap_err();
        assert!(err.to_string().contains("<broken>"));
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let buf = SharedBuf::default();
        let console = Arc::new(ConsoleDestination::with_writer("<test>", Box::new(buf.clone())));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let console = Arc::clone(&console);
                thread::spawn(move || {
                    for i in 0..50 {
                        console.write_line(&format!("thread-{}-line-{}", t, i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = buf.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.starts_with("thread-") && l.contains("-line-")));
    }
}
