use chrono::Utc;

use crate::backend::CustomerBackend;
use crate::error::{DirectoryError, ValidationError};
use crate::kana::{KanaCollator, RowLabel};
use crate::ledger::VisitLedger;
use crate::types::{Customer, CustomerId, NewCustomer};

/// The customer collection plus the read-side views used for listing.
///
/// The directory holds a snapshot supplied by the caller through
/// [`Directory::refresh`]; mutations go through a [`CustomerBackend`] first and
/// only touch the snapshot once the backend has accepted them.
#[derive(Debug, Default, Clone)]
pub struct Directory {
    customers: Vec<Customer>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Vec<Customer>) -> Self {
        Self {
            customers: snapshot,
        }
    }

    /// Replaces the held customers with a fresh snapshot from the backend.
    pub fn refresh(&mut self, snapshot: Vec<Customer>) {
        self.customers = snapshot;
    }

    /// Pulls the full listing from `backend` and refreshes the snapshot.
    pub fn load<B>(&mut self, backend: &B) -> Result<(), DirectoryError>
    where
        B: CustomerBackend + ?Sized,
    {
        let snapshot = backend.list()?;
        self.refresh(snapshot);
        Ok(())
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn get(&self, id: &CustomerId) -> Result<&Customer, DirectoryError> {
        self.customers
            .iter()
            .find(|customer| &customer.id == id)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }

    /// Registers a new customer with zero visits.
    pub fn add<B>(
        &mut self,
        backend: &mut B,
        candidate: NewCustomer,
    ) -> Result<Customer, DirectoryError>
    where
        B: CustomerBackend + ?Sized,
    {
        let draft = candidate.normalized();
        if draft.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let created_at = Utc::now();
        let id = backend.create(&draft, created_at)?;
        let customer = Customer::registered(id, draft, created_at);
        self.customers.push(customer.clone());
        Ok(customer)
    }

    /// Records a visit for `id` and persists the new history.
    pub fn record_visit<B>(
        &mut self,
        backend: &mut B,
        id: &CustomerId,
        date: &str,
        note: &str,
    ) -> Result<Customer, DirectoryError>
    where
        B: CustomerBackend + ?Sized,
    {
        let index = self.position(id)?;
        let updated = VisitLedger::record_visit(&self.customers[index], date, note)?;
        backend.update_visits(&updated)?;
        self.customers[index] = updated.clone();
        Ok(updated)
    }

    /// Deletes a customer and its history. Irreversible; confirm before calling.
    pub fn remove<B>(&mut self, backend: &mut B, id: &CustomerId) -> Result<(), DirectoryError>
    where
        B: CustomerBackend + ?Sized,
    {
        let index = self.position(id)?;
        backend.delete(id)?;
        self.customers.remove(index);
        Ok(())
    }

    /// Customers whose name or reading contains `term`, in snapshot order.
    pub fn filter(&self, term: &str) -> Vec<&Customer> {
        self.customers
            .iter()
            .filter(|customer| customer.name.contains(term) || customer.kana.contains(term))
            .collect()
    }

    /// Filters by `term` and groups the matches by phonetic row.
    pub fn grouped(&self, term: &str) -> PhoneticGroups<'_> {
        group_by_phonetic_row(self.filter(term))
    }

    fn position(&self, id: &CustomerId) -> Result<usize, DirectoryError> {
        self.customers
            .iter()
            .position(|customer| &customer.id == id)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }
}

/// Customers of one phonetic row, sorted by reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneticRow<'a> {
    pub label: RowLabel,
    pub customers: Vec<&'a Customer>,
}

/// Non-empty phonetic rows in [`RowLabel::ALL`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneticGroups<'a> {
    rows: Vec<PhoneticRow<'a>>,
}

impl<'a> PhoneticGroups<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, PhoneticRow<'a>> {
        self.rows.iter()
    }

    pub fn get(&self, label: RowLabel) -> Option<&[&'a Customer]> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.customers.as_slice())
    }

    pub fn labels(&self) -> Vec<RowLabel> {
        self.rows.iter().map(|row| row.label).collect()
    }

    /// Number of customers across all rows.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|row| row.customers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for PhoneticGroups<'a> {
    type Item = PhoneticRow<'a>;
    type IntoIter = std::vec::IntoIter<PhoneticRow<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Partitions customers into phonetic rows by the first character of `kana`.
///
/// Rows are sorted by reading; customers with equal readings keep their
/// input order. Rows without members are left out.
pub fn group_by_phonetic_row<'a, I>(customers: I) -> PhoneticGroups<'a>
where
    I: IntoIterator<Item = &'a Customer>,
{
    let mut buckets: [Vec<&'a Customer>; 11] = Default::default();
    for customer in customers {
        buckets[RowLabel::classify(&customer.kana).index()].push(customer);
    }

    let collator = KanaCollator::new();
    let rows = RowLabel::ALL
        .into_iter()
        .zip(buckets)
        .filter(|(_, members)| !members.is_empty())
        .map(|(label, mut members)| {
            members.sort_by(|left, right| collator.compare(&left.kana, &right.kana));
            PhoneticRow {
                label,
                customers: members,
            }
        })
        .collect();

    PhoneticGroups { rows }
}
