//! Admission control for transfer RPCs.
//!
//! Each operation class has its own fixed-capacity permit pool. Acquisition
//! never waits: a full pool rejects the caller immediately, and the RPC layer
//! turns that into `ResourceExhausted`. Capacity is returned when the
//! [`AdmissionPermit`] is dropped, which happens exactly once on every exit
//! path of the call holding it, including cancellation.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::config::LimitsConfig;

/// The kinds of operation admission is tracked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    Upload,
    Download,
    List,
}

impl OperationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationClass::Upload => "upload",
            OperationClass::Download => "download",
            OperationClass::List => "list",
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Pool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl Pool {
    fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }
}

/// Three independent permit pools: uploads, downloads and listings.
#[derive(Debug)]
pub struct AdmissionController {
    uploads: Pool,
    downloads: Pool,
    listings: Pool,
}

impl AdmissionController {
    /// Create a controller with the given per-class capacities.
    pub fn new(max_uploads: usize, max_downloads: usize, max_listings: usize) -> Self {
        Self {
            uploads: Pool::new(max_uploads),
            downloads: Pool::new(max_downloads),
            listings: Pool::new(max_listings),
        }
    }

    pub fn from_config(limits: &LimitsConfig) -> Self {
        Self::new(
            limits.max_concurrent_uploads,
            limits.max_concurrent_downloads,
            limits.max_concurrent_listings,
        )
    }

    fn pool(&self, class: OperationClass) -> &Pool {
        match class {
            OperationClass::Upload => &self.uploads,
            OperationClass::Download => &self.downloads,
            OperationClass::List => &self.listings,
        }
    }

    /// Take one unit of capacity from `class`'s pool without waiting.
    ///
    /// Returns `None` if the pool is at capacity.
    pub fn try_acquire(&self, class: OperationClass) -> Option<AdmissionPermit> {
        match self.pool(class).semaphore.clone().try_acquire_owned() {
            Ok(permit) => Some(AdmissionPermit {
                class,
                _permit: permit,
            }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => None,
        }
    }

    /// Configured capacity of `class`'s pool.
    pub fn capacity(&self, class: OperationClass) -> usize {
        self.pool(class).capacity
    }

    /// Units currently free in `class`'s pool.
    pub fn available(&self, class: OperationClass) -> usize {
        self.pool(class).semaphore.available_permits()
    }

    /// Operations of `class` currently holding a permit.
    pub fn in_flight(&self, class: OperationClass) -> usize {
        let pool = self.pool(class);
        pool.capacity - pool.semaphore.available_permits()
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default())
    }
}

/// One unit of capacity held by an in-flight operation.
///
/// When this permit is dropped, the capacity is returned to its pool.
#[derive(Debug)]
pub struct AdmissionPermit {
    class: OperationClass,
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    pub fn class(&self) -> OperationClass {
        self.class
    }
}
