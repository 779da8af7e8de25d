// Pure create/update/delete over an in-memory customer list

use crate::models::{Customer, CustomerFields};
use std::collections::HashSet;

/// No customer carries the requested id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordNotFound {
    pub id: u64,
}

impl std::fmt::Display for RecordNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Customer not found: {}", self.id)
    }
}

impl std::error::Error for RecordNotFound {}

/// Smallest id that is above every id in `customers` and not below `floor`
///
/// `None` once the id space is used up.
pub fn next_id(customers: &[Customer], floor: u64) -> Option<u64> {
    let max = customers.iter().map(|c| c.id).max().unwrap_or(0);
    max.checked_add(1).map(|next| next.max(floor).max(1))
}

/// Assign fresh ids to unassigned (0) or duplicate ids, in list order
///
/// The first holder of an id keeps it. When no id above the current maximum
/// is left, the lowest unused id is taken instead. Returns how many ids were
/// assigned.
pub fn normalize_ids(customers: &mut [Customer], floor: u64) -> usize {
    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for (index, customer) in customers.iter().enumerate() {
        if customer.id == 0 || !seen.insert(customer.id) {
            pending.push(index);
        }
    }

    let mut next = next_id(customers, floor);
    for &index in &pending {
        let id = match next {
            Some(id) => {
                next = id.checked_add(1);
                id
            }
            None => lowest_free(&seen),
        };
        seen.insert(id);
        customers[index].id = id;
    }

    pending.len()
}

fn lowest_free(used: &HashSet<u64>) -> u64 {
    (1..=u64::MAX).find(|id| !used.contains(id)).unwrap_or(0)
}

pub fn position(customers: &[Customer], id: u64) -> Result<usize, RecordNotFound> {
    customers
        .iter()
        .position(|c| c.id == id)
        .ok_or(RecordNotFound { id })
}

/// Append a new customer with `id` and return it
pub fn insert(customers: &mut Vec<Customer>, id: u64, fields: &CustomerFields) -> Customer {
    let customer = Customer::from_fields(id, fields);
    customers.push(customer.clone());
    customer
}

/// Replace the customer with `id` in place
///
/// Position, id and keys outside the schema are kept.
pub fn replace(customers: &mut [Customer], id: u64, fields: &CustomerFields) -> Result<Customer, RecordNotFound> {
    let index = position(customers, id)?;
    let mut customer = Customer::from_fields(id, fields);
    customer.extra = std::mem::take(&mut customers[index].extra);
    customers[index] = customer.clone();
    Ok(customer)
}

/// Remove the customer with `id`, returning it
pub fn remove(customers: &mut Vec<Customer>, id: u64) -> Result<Customer, RecordNotFound> {
    let index = position(customers, id)?;
    Ok(customers.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> CustomerFields {
        CustomerFields {
            name: name.to_string(),
            store: format!("{}-store", name),
            location: "Lisbon".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "555".to_string(),
            description: None,
        }
    }

    fn list(names: &[&str]) -> Vec<Customer> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Customer::from_fields(i as u64 + 1, &fields(n)))
            .collect()
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(&[], 0), Some(1));
        assert_eq!(next_id(&list(&["a", "b"]), 0), Some(3));
        assert_eq!(next_id(&list(&["a", "b"]), 10), Some(10));
    }

    #[test]
    fn test_next_id_exhausted() {
        let mut customers = list(&["a"]);
        customers[0].id = u64::MAX;
        assert_eq!(next_id(&customers, 0), None);

        customers[0].id = u64::MAX - 1;
        assert_eq!(next_id(&customers, 0), Some(u64::MAX));
    }

    #[test]
    fn test_insert_appends() {
        let mut customers = list(&["Alice"]);
        let bob = insert(&mut customers, 2, &fields("Bob"));

        assert_eq!(bob.id, 2);
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].name, "Alice");
        assert_eq!(customers[1].name, "Bob");
    }

    #[test]
    fn test_replace_keeps_position_and_id() {
        let mut customers = list(&["Alice", "Bob", "Carol"]);
        let updated = replace(&mut customers, 2, &fields("Robert")).unwrap();

        assert_eq!(updated.id, 2);
        assert_eq!(customers[1].name, "Robert");
        assert_eq!(customers[1].id, 2);
        assert_eq!(customers.len(), 3);
    }

    #[test]
    fn test_replace_unknown_id() {
        let mut customers = list(&["Alice"]);
        let err = replace(&mut customers, 9, &fields("X")).unwrap_err();
        assert_eq!(err, RecordNotFound { id: 9 });
        assert_eq!(customers[0].name, "Alice");
    }

    #[test]
    fn test_remove_keeps_other_ids() {
        let mut customers = list(&["Alice", "Bob", "Carol"]);
        let removed = remove(&mut customers, 2).unwrap();

        assert_eq!(removed.name, "Bob");
        let ids: Vec<u64> = customers.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut customers = list(&["Alice"]);
        assert!(remove(&mut customers, 5).is_err());
        assert_eq!(customers.len(), 1);
    }

    #[test]
    fn test_normalize_assigns_missing_and_duplicate_ids() {
        let mut customers = list(&["a", "b", "c", "d"]);
        customers[1].id = 0;
        customers[3].id = 1;

        let assigned = normalize_ids(&mut customers, 0);

        assert_eq!(assigned, 2);
        let ids: Vec<u64> = customers.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 4, 3, 5]);
    }

    #[test]
    fn test_normalize_respects_floor() {
        let mut customers = list(&["a"]);
        customers[0].id = 0;

        normalize_ids(&mut customers, 42);
        assert_eq!(customers[0].id, 42);
    }

    #[test]
    fn test_normalize_near_max_id_falls_back_to_lowest_free() {
        let mut customers = list(&["a", "b", "c", "d"]);
        customers[0].id = u64::MAX - 1;
        customers[1].id = 0;
        customers[2].id = 0;
        customers[3].id = 1;

        let assigned = normalize_ids(&mut customers, 0);

        assert_eq!(assigned, 2);
        let ids: Vec<u64> = customers.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![u64::MAX - 1, u64::MAX, 2, 1]);
    }

    #[test]
    fn test_replace_keeps_extra_keys() {
        let mut customers = list(&["Alice"]);
        customers[0]
            .extra
            .insert("notes".to_string(), serde_json::Value::from("keep me"));

        let updated = replace(&mut customers, 1, &fields("Alicia")).unwrap();

        assert_eq!(updated.name, "Alicia");
        assert_eq!(customers[0].extra.get("notes").and_then(|v| v.as_str()), Some("keep me"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(RecordNotFound { id: 4 }.to_string(), "Customer not found: 4");
    }
}
