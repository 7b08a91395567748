use crate::error::MiningError;
use std::io::Write;
use std::sync::Mutex;

/// A line-oriented output destination for mined rules (§6.2). No
/// backpressure from the sink is propagated into the mining loop — a slow
/// sink only delays the consumer, never a worker.
pub trait RuleSink: Send + Sync {
    fn write_header(&self, header: &str) -> Result<(), MiningError>;
    fn write_rule(&self, formatted: &str) -> Result<(), MiningError>;
    fn flush(&self) -> Result<(), MiningError>;
}

/// Writes to any `std::io::Write`, typically a file or stdout.
pub struct FileSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> FileSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> RuleSink for FileSink<W> {
    fn write_header(&self, header: &str) -> Result<(), MiningError> {
        writeln!(self.writer.lock().unwrap(), "{header}")?;
        Ok(())
    }

    fn write_rule(&self, formatted: &str) -> Result<(), MiningError> {
        writeln!(self.writer.lock().unwrap(), "{formatted}")?;
        Ok(())
    }

    fn flush(&self) -> Result<(), MiningError> {
        self.writer.lock().unwrap().flush()?;
        Ok(())
    }
}

/// An in-process sink collecting lines into a vector, used by tests that
/// want to assert on emitted output without touching the filesystem.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl RuleSink for MemorySink {
    fn write_header(&self, header: &str) -> Result<(), MiningError> {
        self.lines.lock().unwrap().push(header.to_string());
        Ok(())
    }

    fn write_rule(&self, formatted: &str) -> Result<(), MiningError> {
        self.lines.lock().unwrap().push(formatted.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<(), MiningError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_preserves_emission_order() {
        let sink = MemorySink::new();
        sink.write_header("Rule\tSupport").unwrap();
        sink.write_rule("a => b").unwrap();
        sink.write_rule("c => d").unwrap();
        assert_eq!(sink.lines(), vec!["Rule\tSupport", "a => b", "c => d"]);
    }
}
