use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Destination for result lines.
#[async_trait]
pub trait ReplySink: Send {
    /// Writes `line` followed by a newline.
    async fn write_line(&mut self, line: &str) -> io::Result<()>;
    async fn flush(&mut self) -> io::Result<()>;
}

#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`.
    pub async fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path).await?;
        Ok(Self { writer: BufWriter::new(file) })
    }
}

#[async_trait]
impl ReplySink for FileSink {
    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await?;
        self.writer.get_ref().sync_all().await
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

#[async_trait]
impl ReplySink for MemorySink {
    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_owned());
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
