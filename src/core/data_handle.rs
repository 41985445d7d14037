// Async access to a reader shared between tasks
//
// Every call takes the reader lock for its whole duration and runs the
// blocking file work on the blocking pool, so operations on one reader never
// overlap.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::core::error::{CsdError, Result};
use crate::core::format::{ChannelHeader, ChannelRange, ProtocolHeader, SampleSet};
use crate::core::reader::CsdReader;
use crate::core::sampler::Decimation;

#[derive(Clone)]
pub struct SharedReader {
    inner: Arc<Mutex<CsdReader>>,
}

impl SharedReader {
    pub fn new(reader: CsdReader) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reader)),
        }
    }

    pub async fn open(path: std::path::PathBuf) -> Result<Self> {
        let reader = tokio::task::spawn_blocking(move || CsdReader::open(path))
            .await
            .map_err(|e| CsdError::TaskFailed(e.to_string()))??;
        Ok(Self::new(reader))
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut CsdReader) -> Result<T> + Send + 'static,
    {
        let mut guard = self.inner.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || op(&mut *guard))
            .await
            .map_err(|e| CsdError::TaskFailed(e.to_string()))?
    }

    /// Run a synchronous accessor against the locked reader.
    pub async fn with<T>(&self, f: impl FnOnce(&CsdReader) -> T) -> T {
        let guard = self.inner.lock().await;
        f(&*guard)
    }

    pub async fn sample(&self, start: u64, end: u64, decimation: Decimation) -> Result<SampleSet> {
        self.run(move |reader| reader.sample(start, end, decimation)).await
    }

    pub async fn scan_channel_ranges(&self) -> Result<Vec<ChannelRange>> {
        self.run(|reader| reader.scan_channel_ranges()).await
    }

    pub async fn repair_sample_count(&self, sample_count: u64) -> Result<ProtocolHeader> {
        self.run(move |reader| reader.repair_sample_count(sample_count)).await
    }

    pub async fn repair_channel_range(&self, channel_index: usize, min: f64, max: f64) -> Result<ChannelHeader> {
        self.run(move |reader| reader.repair_channel_range(channel_index, min, max)).await
    }

    /// Stream `[start, end]` as consecutive sample sets of at most `chunk`
    /// records each (before decimation). The stride is fixed once for the
    /// whole range, so the streamed indices match a single `sample` call.
    /// The receiver sees the channel close after the last chunk or after the
    /// first error.
    pub fn stream_samples(
        &self,
        start: u64,
        end: u64,
        chunk: u64,
        decimation: Decimation,
    ) -> mpsc::Receiver<Result<SampleSet>> {
        let (tx, rx) = mpsc::channel(4);
        let shared = self.clone();
        let chunk = chunk.max(1);

        tokio::spawn(async move {
            let Some((start, end)) = shared.with(|r| r.layout().clamp(start, end)).await else {
                info!("sample stream empty: [{}, {}]", start, end);
                return;
            };
            let stride = decimation.stride_for(end - start + 1);
            info!("sample stream started: [{}, {}] stride {}", start, end, stride);

            let mut from = start;
            let mut sent = 0u64;

            while from <= end {
                let to = from.saturating_add(chunk - 1).min(end);
                let result = shared.sample(from, to, Decimation::Stride(stride)).await;
                let next = match &result {
                    Ok(set) => match set.indices.last() {
                        Some(last) => {
                            sent += set.len() as u64;
                            last.checked_add(stride)
                        }
                        None => break,
                    },
                    Err(_) => None,
                };

                if tx.send(result).await.is_err() {
                    warn!("sample stream receiver dropped");
                    return;
                }
                match next {
                    Some(next) => from = next,
                    None => break,
                }
            }

            info!("sample stream finished: {} points", sent);
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixture::CsdBuilder;
    use tempfile::NamedTempFile;

    fn fixture(channels: usize, records: usize) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), CsdBuilder::new(channels, records).build()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_shared_sample_and_repair() {
        let file = fixture(3, 40);
        let shared = SharedReader::open(file.path().to_path_buf()).await.unwrap();

        let set = shared.sample(0, 39, Decimation::MaxPoints(10)).await.unwrap();
        assert_eq!(set.len(), 10);

        shared.repair_channel_range(2, -5.0, 37.5).await.unwrap();
        let maxs = shared.with(|r| r.channel_maxs()).await;
        assert_eq!(maxs[2], 37.5);
    }

    #[tokio::test]
    async fn test_stream_samples() {
        let file = fixture(1, 95);
        let shared = SharedReader::open(file.path().to_path_buf()).await.unwrap();

        let mut rx = shared.stream_samples(0, 200, 20, Decimation::Stride(1));
        let mut lens = Vec::new();
        while let Some(chunk) = rx.recv().await {
            lens.push(chunk.unwrap().len());
        }
        assert_eq!(lens, vec![20, 20, 20, 20, 15]);
    }

    async fn streamed_indices(shared: &SharedReader, end: u64, chunk: u64, decimation: Decimation) -> Vec<u64> {
        let mut rx = shared.stream_samples(0, end, chunk, decimation);
        let mut indices = Vec::new();
        while let Some(set) = rx.recv().await {
            indices.extend(set.unwrap().indices);
        }
        indices
    }

    #[tokio::test]
    async fn test_stream_keeps_stride_grid() {
        let file = fixture(2, 60);
        let shared = SharedReader::open(file.path().to_path_buf()).await.unwrap();

        let whole = shared.sample(0, 59, Decimation::Stride(7)).await.unwrap();
        assert_eq!(whole.indices, vec![0, 7, 14, 21, 28, 35, 42, 49, 56]);
        assert_eq!(streamed_indices(&shared, 59, 20, Decimation::Stride(7)).await, whole.indices);

        // chunk smaller than the stride
        assert_eq!(streamed_indices(&shared, 59, 3, Decimation::Stride(7)).await, whole.indices);
    }

    #[tokio::test]
    async fn test_stream_honours_overall_point_budget() {
        let file = fixture(1, 95);
        let shared = SharedReader::open(file.path().to_path_buf()).await.unwrap();

        let whole = shared.sample(0, 94, Decimation::MaxPoints(10)).await.unwrap();
        let streamed = streamed_indices(&shared, 94, 20, Decimation::MaxPoints(10)).await;
        assert_eq!(streamed, whole.indices);
        assert!(streamed.len() <= 10);
    }
}
