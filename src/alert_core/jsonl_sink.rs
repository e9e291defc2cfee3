//! JSONL sink for alert events - appends one JSON document per line

use super::record::AlertEvent;
use super::sink_backend::{AlertSinkBackend, SinkError};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct JsonlAlertSink {
    writer: BufWriter<std::fs::File>,
    last_flush: Instant,
}

impl JsonlAlertSink {
    pub fn new(path: PathBuf) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        log::info!("📝 Writing alert events to: {}", path.display());

        Ok(Self {
            writer: BufWriter::new(file),
            last_flush: Instant::now(),
        })
    }

    fn write_line(&mut self, event: &AlertEvent) -> Result<(), SinkError> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", json)?;

        // Flush every 5 seconds
        if self.last_flush.elapsed() > Duration::from_secs(5) {
            self.writer.flush()?;
            self.last_flush = Instant::now();
        }

        Ok(())
    }
}

impl Drop for JsonlAlertSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[async_trait]
impl AlertSinkBackend for JsonlAlertSink {
    async fn write_alert(&mut self, event: &AlertEvent) -> Result<(), SinkError> {
        self.write_line(event)
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}
