// Search filtering and sorting for customer lists

use crate::models::Customer;
use eyre::{Result, eyre};
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields a customer list may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Store,
    Location,
}

impl SortField {
    fn value(self, customer: &Customer) -> &str {
        match self {
            SortField::Name => &customer.name,
            SortField::Store => &customer.store,
            SortField::Location => &customer.location,
        }
    }
}

impl FromStr for SortField {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(SortField::Name),
            "store" => Ok(SortField::Store),
            "location" => Ok(SortField::Location),
            other => Err(eyre!(
                "Cannot sort by field: {} (allowed: name, store, location)",
                other
            )),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortField::Name => write!(f, "name"),
            SortField::Store => write!(f, "store"),
            SortField::Location => write!(f, "location"),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(eyre!("Invalid sort order: {} (expected asc or desc)", other)),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}

/// A list request: optional search text and optional sort
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub search: Option<String>,
    pub sort: Option<(SortField, SortOrder)>,
}

impl Query {
    pub fn apply(&self, customers: Vec<Customer>) -> Vec<Customer> {
        let customers = match &self.search {
            Some(search) => filter(customers, search),
            None => customers,
        };

        match self.sort {
            Some((field, order)) => sort(customers, field, order),
            None => customers,
        }
    }
}

/// Keep customers whose name or store contains `query`, ignoring case
///
/// Input order is preserved. An empty query keeps everything.
pub fn filter(customers: Vec<Customer>, query: &str) -> Vec<Customer> {
    if query.is_empty() {
        return customers;
    }

    let needle = query.to_lowercase();
    customers
        .into_iter()
        .filter(|c| c.name.to_lowercase().contains(&needle) || c.store.to_lowercase().contains(&needle))
        .collect()
}

/// Order customers by `field`, comparing case-insensitively
///
/// The sort is stable in both directions: customers with equal keys keep
/// their relative input order.
pub fn sort(mut customers: Vec<Customer>, field: SortField, order: SortOrder) -> Vec<Customer> {
    customers.sort_by(|a, b| {
        let ord = compare_ignore_case(field.value(a), field.value(b));
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
    customers
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
