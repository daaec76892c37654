use std::{pin::Pin, sync::Arc};

use futures::{Stream, StreamExt};

/// A payload plus the 1-based position it had in its source (line/record number).
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub position: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error at record {position}: {message}")]
    Transform { position: u64, message: String },
    #[error("sink error: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

/// Produces envelopes. An `Err` from `stream` aborts the run before anything
/// is stored; `Err` items inside the stream are per-record and get skipped.
#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> Result<EnvelopeStream<T>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

/// Consumes the stream. Returns how many payloads were stored.
#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<usize, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T, T>>>,
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + 'static,
    K: Sink<T> + 'static,
{
    pub async fn run(self) -> Result<usize, PipelineError> {
        let mut stream = self.source.stream().await?;

        for t in self.transforms {
            stream = Box::pin(stream.then(move |item| {
                let t = t.clone();
                async move {
                    match item {
                        Ok(env) => t.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        let stored = self.sink.run(stream).await?;
        tracing::info!(stored, "pipeline finished");
        Ok(stored)
    }
}
