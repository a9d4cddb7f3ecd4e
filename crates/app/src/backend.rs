use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

use reserve_core::{BackendError, Customer, CustomerBackend, CustomerId, NewCustomer};
use reserve_storage::{CustomerRepository, CustomerStoreError, Database, StorageError};

/// [`CustomerBackend`] over the async SQLite repository.
///
/// Owns a current-thread runtime and blocks on each repository call, so it
/// must not be used from inside another Tokio runtime.
pub struct SqliteBackend {
    runtime: Runtime,
    customers: CustomerRepository,
}

impl SqliteBackend {
    /// Connects to `database_url` and applies pending migrations.
    pub fn open(database_url: &str) -> Result<Self, OpenError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(OpenError::Runtime)?;

        let database = runtime.block_on(async {
            let database = Database::connect(database_url).await?;
            database.run_migrations().await?;
            Ok::<_, StorageError>(database)
        })?;
        debug!(stage = "storage", "database ready");

        Ok(Self {
            runtime,
            customers: database.customers(),
        })
    }

    fn block_on<T, F>(&self, operation: &'static str, future: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, CustomerStoreError>>,
    {
        self.runtime.block_on(future).map_err(|err| {
            warn!(stage = "storage", operation, error = %err, "customer store call failed");
            BackendError::new(err)
        })
    }
}

impl CustomerBackend for SqliteBackend {
    fn create(
        &mut self,
        draft: &NewCustomer,
        created_at: DateTime<Utc>,
    ) -> Result<CustomerId, BackendError> {
        self.block_on("create", self.customers.insert(draft, created_at))
    }

    fn update_visits(&mut self, customer: &Customer) -> Result<(), BackendError> {
        self.block_on("update_visits", self.customers.update_visits(customer))
    }

    fn delete(&mut self, id: &CustomerId) -> Result<(), BackendError> {
        self.block_on("delete", self.customers.delete(id))
    }

    fn list(&self) -> Result<Vec<Customer>, BackendError> {
        self.block_on("list", self.customers.list_all())
    }
}

/// Errors raised while opening the SQLite backend.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
