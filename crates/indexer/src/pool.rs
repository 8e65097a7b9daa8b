//! Where per-file extraction runs.
//!
//! The session owns no threads of its own. It hands each file to an
//! [`ExtractionPool`] and inserts whatever comes back in walker order.

use async_trait::async_trait;
use context_extractor::{extract, ExtractionResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("extraction pool is shut down")]
    ShutDown,

    #[error("extraction job for {path} panicked")]
    JobPanicked { path: String },
}

/// One file to extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    /// Root-relative, `/`-separated path
    pub path: String,
    pub contents: String,
}

impl ExtractionJob {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn run(&self) -> ExtractionResult {
        extract(&self.path, &self.contents)
    }
}

/// Runs extraction jobs
#[async_trait]
pub trait ExtractionPool: Send + Sync {
    async fn submit(&self, job: ExtractionJob) -> Result<ExtractionResult, PoolError>;
}

/// Runs each job on the calling task
#[derive(Debug, Default, Clone, Copy)]
pub struct InlinePool;

#[async_trait]
impl ExtractionPool for InlinePool {
    async fn submit(&self, job: ExtractionJob) -> Result<ExtractionResult, PoolError> {
        Ok(job.run())
    }
}

/// Runs jobs on tokio's blocking threads, at most `limit` at a time.
///
/// The caller owns the lifecycle: after [`BlockingPool::shutdown`] every
/// submission fails with [`PoolError::ShutDown`].
#[derive(Debug)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
    limit: usize,
    shut_down: AtomicBool,
}

impl BlockingPool {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Jobs already running finish; new and waiting submissions fail
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.permits.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionPool for BlockingPool {
    async fn submit(&self, job: ExtractionJob) -> Result<ExtractionResult, PoolError> {
        if self.is_shut_down() {
            return Err(PoolError::ShutDown);
        }
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::ShutDown)?;

        let path = job.path.clone();
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job.run()
        });

        task.await.map_err(|e| {
            log::warn!("Extraction of {path} failed: {e}");
            PoolError::JobPanicked { path }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn blocking_pool_matches_inline() {
        let job = ExtractionJob::new("svc/app.py", "def main():\n    run()\n");
        let inline = InlinePool.submit(job.clone()).await.unwrap();
        let pool = BlockingPool::new(2);
        let blocking = pool.submit(job).await.unwrap();
        assert_eq!(inline, blocking);
        assert_eq!(blocking.declarations.len(), 1);
    }

    #[tokio::test]
    async fn shut_down_pool_rejects_jobs() {
        let pool = BlockingPool::new(1);
        pool.shutdown();
        assert!(pool.is_shut_down());
        let err = pool
            .submit(ExtractionJob::new("a.py", "x = 1\n"))
            .await
            .unwrap_err();
        assert_eq!(err, PoolError::ShutDown);
    }

    #[tokio::test]
    async fn concurrent_submissions_share_the_limit() {
        let pool = Arc::new(BlockingPool::new(2));
        let mut handles = Vec::new();
        for i in 0..6 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move {
                let job = ExtractionJob::new(format!("m{i}.py"), format!("def f{i}():\n    pass\n"));
                pool.submit(job).await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result.declarations.len(), 1);
        }
        assert_eq!(pool.permits.available_permits(), pool.limit());
    }
}
