// JSON document operations

use crate::models::Customer;
use eyre::{Context, Result, eyre};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

const INDENT: &[u8] = b"    ";

/// Read every customer from a JSON array document
///
/// Never fails: a missing file or a document that is not a JSON array yields
/// an empty list. Array elements that do not decode as a customer are skipped.
pub fn read_collection(path: &Path) -> Vec<Customer> {
    if !path.exists() {
        debug!(file = ?path, "No customer document yet, starting empty");
        return Vec::new();
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(file = ?path, error = ?e, "Failed to read customer document, treating as empty");
            return Vec::new();
        }
    };

    let values: Vec<Value> = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!(file = ?path, error = ?e, "Customer document is not a JSON array, treating as empty");
            return Vec::new();
        }
    };

    let mut customers = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<Customer>(value) {
            Ok(c) => customers.push(c),
            Err(e) => {
                warn!(
                    file = ?path,
                    index,
                    error = ?e,
                    "Failed to parse customer, skipping"
                );
            }
        }
    }

    debug!(file = ?path, count = customers.len(), "Loaded customers");
    customers
}

/// Write the full list as an indented JSON array, replacing the file atomically
pub fn write_collection(path: &Path, customers: &[Customer]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| eyre!("Customer document has no parent directory: {:?}", path))?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    customers
        .serialize(&mut serializer)
        .context("Failed to serialize customers")?;
    buf.push(b'\n');

    let tmp_path = dir.join(format!(".customers-{}.tmp", Uuid::now_v7()));
    fs::write(&tmp_path, &buf).context("Failed to write temporary customer document")?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).context("Failed to replace customer document");
    }

    debug!(file = ?path, count = customers.len(), "Saved customers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn customer(id: u64, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            store: "S1".to_string(),
            location: "Lisbon".to_string(),
            email: "x@example.com".to_string(),
            phone: "555".to_string(),
            description: Some("regular".to_string()),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_read_nonexistent_file() {
        let temp = TempDir::new().unwrap();
        let customers = read_collection(&temp.path().join("missing.json"));
        assert!(customers.is_empty());
    }

    #[test]
    fn test_read_unparsable_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("customers.json");

        fs::write(&path, "{not json").unwrap();
        assert!(read_collection(&path).is_empty());

        fs::write(&path, r#"{"name": "object, not array"}"#).unwrap();
        assert!(read_collection(&path).is_empty());

        fs::write(&path, "").unwrap();
        assert!(read_collection(&path).is_empty());
    }

    #[test]
    fn test_read_skips_malformed_elements() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("customers.json");

        fs::write(
            &path,
            r#"[
    {"id": 1, "name": "Valid"},
    {"id": 2, "store": "no name"},
    "just a string",
    {"id": 3, "name": "Also Valid"}
]"#,
        )
        .unwrap();

        let customers = read_collection(&path);
        let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Valid", "Also Valid"]);
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("customers.json");
        let customers = vec![customer(2, "Zed"), customer(1, "Alice"), customer(3, "Mia")];

        write_collection(&path, &customers).unwrap();
        assert_eq!(read_collection(&path), customers);
    }

    #[test]
    fn test_write_uses_four_space_indent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("customers.json");

        write_collection(&path, &[customer(1, "Alice")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n    {\n        \"id\": 1,"));
        assert!(content.ends_with("]\n"));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("customers.json");

        write_collection(&path, &[customer(1, "Alice")]).unwrap();
        write_collection(&path, &[]).unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
    }
}
