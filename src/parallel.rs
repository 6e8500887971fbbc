//! Parallel processing configuration and management
//!
//! Per-cell regressions are independent, so all heavy work runs on Rayon's
//! global pool. This module sizes that pool once at startup.

use crate::errors::{Result, TrendError};
use rayon::ThreadPoolBuilder;
use tracing::info;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    #[must_use]
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses all available CPU cores
    #[must_use]
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    #[must_use]
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Set up the global Rayon thread pool with the specified configuration
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::ThreadPool`] for a zero thread count or if the
    /// global pool was already initialized.
    pub fn setup_global_pool(&self) -> Result<()> {
        let Some(num_threads) = self.num_threads else {
            info!(threads = rayon::current_num_threads(), "Using default thread pool");
            return Ok(());
        };

        if num_threads == 0 {
            return Err(TrendError::ThreadPool(
                "thread count must be at least 1".to_string(),
            ));
        }

        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                TrendError::ThreadPool(format!(
                    "Failed to initialize thread pool with {num_threads} threads: {e}"
                ))
            })?;

        info!(threads = num_threads, "Configured thread pool");
        Ok(())
    }

    /// Get the current number of threads being used
    #[must_use]
    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
}

/// Get information about the current parallel configuration
#[must_use]
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
    }
}
