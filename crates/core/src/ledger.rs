use chrono::NaiveDate;

use crate::error::{LedgerError, ValidationError};
use crate::types::{Customer, VisitRecord};

/// Every n-th visit earns the loyalty discount.
pub const DISCOUNT_INTERVAL: u32 = 10;

/// Discount granted on a discount visit, in percent.
pub const DISCOUNT_RATE_PERCENT: u32 = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a customer stands relative to the next discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountStatus {
    /// The upcoming visit is a discount visit.
    NextVisit,
    /// Number of visits still needed, always in `1..=DISCOUNT_INTERVAL`.
    Remaining(u32),
}

/// Append-only visit history and loyalty discount rules for one customer.
pub struct VisitLedger;

impl VisitLedger {
    /// Returns a copy of `customer` with a new visit prepended to its history.
    pub fn record_visit(
        customer: &Customer,
        date: &str,
        note: &str,
    ) -> Result<Customer, LedgerError> {
        let date = parse_visit_date(date)?;
        let visit_count = customer
            .visit_count
            .checked_add(1)
            .ok_or(ValidationError::VisitCountOverflow(customer.visit_count))?;

        let mut history = Vec::with_capacity(customer.history.len() + 1);
        history.push(VisitRecord {
            date,
            note: note.to_string(),
        });
        history.extend(customer.history.iter().cloned());

        Ok(Customer {
            visit_count,
            history,
            ..customer.clone()
        })
    }

    /// Returns `true` when the customer's *next* visit is a discount visit.
    ///
    /// Evaluate this before recording the visit; after recording, the same
    /// customer answers for the visit after that.
    pub fn is_discount_eligible(customer: &Customer) -> bool {
        customer.visit_count % DISCOUNT_INTERVAL == DISCOUNT_INTERVAL - 1
    }

    /// Visits left until the discount, in `1..=DISCOUNT_INTERVAL`.
    ///
    /// Meaningless while [`VisitLedger::is_discount_eligible`] holds; use
    /// [`VisitLedger::discount_status`] when both cases need handling.
    pub fn visits_until_discount(customer: &Customer) -> u32 {
        DISCOUNT_INTERVAL - (customer.visit_count % DISCOUNT_INTERVAL)
    }

    pub fn discount_status(customer: &Customer) -> DiscountStatus {
        if Self::is_discount_eligible(customer) {
            DiscountStatus::NextVisit
        } else {
            DiscountStatus::Remaining(Self::visits_until_discount(customer))
        }
    }
}

/// Parses exactly `YYYY-MM-DD`; chrono alone would also take `2024-1-5`.
fn parse_visit_date(value: &str) -> Result<NaiveDate, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyDate);
    }

    let invalid = || ValidationError::InvalidDate(value.to_string());
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}
