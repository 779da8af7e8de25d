// Customer store: one JSON document under a store directory

use crate::collection::{self, RecordNotFound};
use crate::filter::Query;
use crate::json;
use crate::models::{Customer, CustomerFields};
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CURRENT_VERSION: u32 = 1;
const STORE_DIR: &str = ".custstore";
const DATA_FILE: &str = "customers.json";
const LOCK_FILE: &str = "customers.lock";
const NEXT_ID_FILE: &str = ".next_id";

/// Persistent customer store
///
/// Holds no records in memory: every call reads the document afresh, and
/// every mutation rewrites it in full while holding an exclusive file lock.
#[derive(Debug, Clone)]
pub struct Store {
    base_path: PathBuf,
}

impl Store {
    /// Open or create a store at the given path
    ///
    /// The store lives in a `.custstore` subdirectory of the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().join(STORE_DIR);

        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let store = Self { base_path };
        store.create_gitignore()?;
        store.write_version()?;

        Ok(store)
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the JSON document holding every customer
    pub fn data_path(&self) -> PathBuf {
        self.base_path.join(DATA_FILE)
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, format!("{}\n*.tmp\n", LOCK_FILE))?;
        }
        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// Load every customer in stored order
    ///
    /// Unreadable storage yields an empty list. Records without an id, or
    /// sharing one with an earlier record, get fresh ids; those ids are only
    /// persisted by the next mutation.
    pub fn load(&self) -> Vec<Customer> {
        let (customers, assigned) = self.load_normalized();
        if assigned > 0 {
            debug!(assigned, "Assigned ids to customers stored without a unique id");
        }
        customers
    }

    /// Load under the write lock; assigned ids are about to be persisted
    fn load_for_write(&self) -> Vec<Customer> {
        let (customers, assigned) = self.load_normalized();
        if assigned > 0 {
            warn!(assigned, "Persisting new ids for customers stored without a unique id");
        }
        customers
    }

    fn load_normalized(&self) -> (Vec<Customer>, usize) {
        let mut customers = json::read_collection(&self.data_path());
        let assigned = collection::normalize_ids(&mut customers, self.read_next_id());
        (customers, assigned)
    }

    /// Overwrite storage with `customers`
    pub fn save(&self, customers: &[Customer]) -> Result<()> {
        json::write_collection(&self.data_path(), customers)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Load, then filter and sort per `query`
    pub fn list(&self, query: &Query) -> Vec<Customer> {
        query.apply(self.load())
    }

    /// Get a customer by id
    pub fn get(&self, id: u64) -> Option<Customer> {
        self.load().into_iter().find(|c| c.id == id)
    }

    // ========================================================================
    // Mutations
    //
    // The id counter is written before the document.
    // ========================================================================

    /// Validate `fields` and append a new customer
    ///
    /// Fails with `ValidationErrors` when a field is rejected.
    pub fn create(&self, fields: CustomerFields) -> Result<Customer> {
        fields.validate()?;

        let _lock = WriteLock::acquire(&self.base_path.join(LOCK_FILE))?;
        let mut customers = self.load_for_write();

        let id = collection::next_id(&customers, self.read_next_id()).ok_or_else(id_space_exhausted)?;
        let customer = collection::insert(&mut customers, id, &fields);

        self.write_next_id(id.checked_add(1))?;
        self.save(&customers)?;

        info!(id, name = %customer.name, "Created customer");
        Ok(customer)
    }

    /// Validate `fields` and replace the customer with `id`
    ///
    /// Fails with `ValidationErrors` or `RecordNotFound`. The whole record is
    /// replaced: callers that merge onto a record read with `get` do so
    /// outside the lock, so a concurrent edit in between is overwritten.
    pub fn update(&self, id: u64, fields: CustomerFields) -> Result<Customer> {
        fields.validate()?;

        let _lock = WriteLock::acquire(&self.base_path.join(LOCK_FILE))?;
        let mut customers = self.load_for_write();

        let customer = collection::replace(&mut customers, id, &fields)?;
        self.bump_next_id(&customers)?;
        self.save(&customers)?;

        info!(id, "Updated customer");
        Ok(customer)
    }

    /// Remove the customer with `id`
    ///
    /// Fails with `RecordNotFound`. Other customers keep their ids.
    pub fn delete(&self, id: u64) -> Result<Customer> {
        let _lock = WriteLock::acquire(&self.base_path.join(LOCK_FILE))?;
        let mut customers = self.load_for_write();
        let floor = collection::next_id(&customers, self.read_next_id());

        let removed = collection::remove(&mut customers, id)?;
        self.write_next_id(floor)?;
        self.save(&customers)?;

        info!(id, "Deleted customer");
        Ok(removed)
    }

    /// Append every customer found in another JSON document, with fresh ids
    ///
    /// The source is read with the same lenient rules as `load`. Imported
    /// records are not validated. Returns the number imported.
    pub fn import<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let incoming = json::read_collection(path);
        if incoming.is_empty() {
            info!(file = ?path, "Nothing to import");
            return Ok(0);
        }

        let _lock = WriteLock::acquire(&self.base_path.join(LOCK_FILE))?;
        let mut customers = self.load_for_write();

        let mut next = collection::next_id(&customers, self.read_next_id());
        let count = incoming.len();
        for mut customer in incoming {
            let id = next.ok_or_else(id_space_exhausted)?;
            customer.id = id;
            next = id.checked_add(1);
            customers.push(customer);
        }

        self.write_next_id(next)?;
        self.save(&customers)?;

        info!(file = ?path, count, "Imported customers");
        Ok(count)
    }

    /// Whether an error came from an unknown customer id
    pub fn is_not_found(err: &eyre::Report) -> bool {
        err.downcast_ref::<RecordNotFound>().is_some()
    }

    // ========================================================================
    // Id counter
    // ========================================================================

    fn read_next_id(&self) -> u64 {
        fs::read_to_string(self.base_path.join(NEXT_ID_FILE))
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Store the next id to hand out; `None` means the id space is used up
    fn write_next_id(&self, next: Option<u64>) -> Result<()> {
        let Some(next) = next else {
            warn!("Customer id space exhausted, id counter not advanced");
            return Ok(());
        };
        fs::write(self.base_path.join(NEXT_ID_FILE), next.to_string()).context("Failed to write id counter")
    }

    /// Persist the counter when load assigned ids past it
    fn bump_next_id(&self, customers: &[Customer]) -> Result<()> {
        let current = self.read_next_id();
        match collection::next_id(customers, current) {
            Some(next) if next > current => self.write_next_id(Some(next)),
            _ => Ok(()),
        }
    }
}

fn id_space_exhausted() -> eyre::Report {
    eyre!("No customer id left to assign")
}

/// Exclusive lock on the store's lock file, released on drop
struct WriteLock {
    file: File,
}

impl WriteLock {
    fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .context("Failed to open lock file")?;

        FileExt::lock_exclusive(&file).context("Failed to acquire file lock")?;
        debug!(file = ?path, "Acquired write lock");

        Ok(Self { file })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = ?e, "Failed to release write lock");
        }
    }
}
