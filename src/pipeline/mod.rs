// Resize pipeline - fetch, transform and stream the encoded output
//
// The transform runs on the blocking pool and writes straight into a
// `ChunkWriter`, which forwards fixed-size chunks over a bounded channel to
// whoever is writing the HTTP response. A slow client therefore stalls the
// encoder instead of growing a buffer.

use bytes::{Bytes, BytesMut};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::ImagineError;
use crate::fetch::SourceFetcher;
use crate::imaging::{transform, ResizeSpec, TransformSummary};
use crate::metrics::ImagineMetrics;

/// What a successful pipeline run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    /// Size of the fetched source in bytes
    pub source_bytes: usize,
    /// Encoded bytes handed to the response channel
    pub encoded_bytes: u64,
    pub transform: TransformSummary,
}

/// Fetch → decode → resize → encode, with the output streamed as chunks
pub struct ResizePipeline {
    fetcher: Arc<dyn SourceFetcher>,
    chunk_size: usize,
}

impl ResizePipeline {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, chunk_size: usize) -> Self {
        Self {
            fetcher,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Run the pipeline for `spec`, sending encoded bytes on `output`
    ///
    /// `output` is dropped when this returns, which closes the stream for the
    /// receiver. If the receiver goes away mid-encode the next send fails and
    /// the run ends with `EncodeFailure`.
    pub async fn run(
        &self,
        spec: &ResizeSpec,
        output: mpsc::Sender<Bytes>,
    ) -> Result<PipelineReport, ImagineError> {
        let metrics = ImagineMetrics::global();

        let fetch_timer = metrics.start_stage_timer("fetch");
        let source = self.fetcher.fetch(&spec.source).await?;
        fetch_timer.observe_duration();
        metrics.source_bytes.observe(source.len() as f64);

        let source_bytes = source.len();
        let encoder_name = spec.encoder.name();
        let chunk_size = self.chunk_size;
        let spec = spec.clone();

        let transform_timer = metrics.start_stage_timer("transform");
        let (summary, encoded_bytes) = tokio::task::spawn_blocking(move || {
            let mut writer = ChunkWriter::new(output, chunk_size);
            let summary = transform(&source, &spec, &mut writer)?;
            writer
                .flush()
                .map_err(|e| ImagineError::encode_failed(spec.encoder.name(), e))?;
            Ok::<_, ImagineError>((summary, writer.bytes_written()))
        })
        .await
        .map_err(|e| ImagineError::encode_failed(encoder_name, format!("transform task failed: {}", e)))??;
        transform_timer.observe_duration();

        Ok(PipelineReport {
            source_bytes,
            encoded_bytes,
            transform: summary,
        })
    }
}

/// Blocking `io::Write` adapter that emits `chunk_size` pieces on a channel
///
/// Must only be used off the async runtime; sends block until the receiver
/// has room. Call `flush` at the end to emit the trailing partial chunk.
pub struct ChunkWriter {
    sender: mpsc::Sender<Bytes>,
    buffer: BytesMut,
    chunk_size: usize,
    bytes_written: u64,
}

impl ChunkWriter {
    pub fn new(sender: mpsc::Sender<Bytes>, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            sender,
            buffer: BytesMut::with_capacity(chunk_size),
            chunk_size,
            bytes_written: 0,
        }
    }

    /// Bytes accepted so far, including any still buffered
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn send(&self, chunk: Bytes) -> io::Result<()> {
        self.sender
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response stream closed"))
    }
}

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.bytes_written += buf.len() as u64;

        while self.buffer.len() >= self.chunk_size {
            let chunk = self.buffer.split_to(self.chunk_size).freeze();
            self.send(chunk)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let chunk = self.buffer.split().freeze();
            self.send(chunk)?;
        }
        Ok(())
    }
}
