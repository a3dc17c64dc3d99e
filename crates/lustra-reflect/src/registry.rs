//! Process-global record registry.
//!
//! Records are registered once (normally at startup) and looked up by
//! name for the life of the process. The table hands out cheap record
//! clones; the lock is never held across user code.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::record::Record;

static RECORDS: Lazy<RwLock<FxHashMap<String, Record>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Register a record under its name. A later registration under the
/// same name replaces the earlier one.
pub fn register_record(record: Record) {
    RECORDS.write().insert(record.name().to_string(), record);
}

/// Look up a record by name. Absence is `None`, not an error.
pub fn lookup_record(name: &str) -> Option<Record> {
    RECORDS.read().get(name).cloned()
}
