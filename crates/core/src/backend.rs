use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::BackendError;
use crate::types::{Customer, CustomerId, NewCustomer};

/// Persistence collaborator consumed by [`crate::directory::Directory`].
///
/// Implementations own storage and id assignment. Failures are reported as
/// [`BackendError`] and are not retried by the directory.
pub trait CustomerBackend {
    /// Stores a new customer record and returns the id assigned to it.
    fn create(
        &mut self,
        draft: &NewCustomer,
        created_at: DateTime<Utc>,
    ) -> Result<CustomerId, BackendError>;

    /// Persists the `visit_count` and `history` fields of an existing record.
    fn update_visits(&mut self, customer: &Customer) -> Result<(), BackendError>;

    /// Deletes a record and its history.
    fn delete(&mut self, id: &CustomerId) -> Result<(), BackendError>;

    /// Lists every stored customer.
    fn list(&self) -> Result<Vec<Customer>, BackendError>;
}

/// In-process backend keeping records in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    customers: Vec<Customer>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers(customers: Vec<Customer>) -> Self {
        Self { customers }
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    fn position(&self, id: &CustomerId) -> Result<usize, BackendError> {
        self.customers
            .iter()
            .position(|customer| &customer.id == id)
            .ok_or_else(|| BackendError::new(format!("no stored record for id {id}")))
    }
}

impl CustomerBackend for MemoryBackend {
    fn create(
        &mut self,
        draft: &NewCustomer,
        created_at: DateTime<Utc>,
    ) -> Result<CustomerId, BackendError> {
        let id = CustomerId::new(Uuid::new_v4().to_string());
        self.customers
            .push(Customer::registered(id.clone(), draft.clone(), created_at));
        Ok(id)
    }

    fn update_visits(&mut self, customer: &Customer) -> Result<(), BackendError> {
        let index = self.position(&customer.id)?;
        let stored = &mut self.customers[index];
        stored.visit_count = customer.visit_count;
        stored.history = customer.history.clone();
        Ok(())
    }

    fn delete(&mut self, id: &CustomerId) -> Result<(), BackendError> {
        let index = self.position(id)?;
        self.customers.remove(index);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Customer>, BackendError> {
        Ok(self.customers.clone())
    }
}
