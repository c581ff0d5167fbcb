//! Runtime registry of protocol witnesses.
//!
//! Witnesses are stored type-erased, keyed by the identity of their subject
//! type plus an optional label, and partitioned into one table per witness
//! type with its generic arguments erased. Lookups that find nothing, or
//! find an entry of a different concrete type, return `None`; the registry
//! never fails.
//!
//! ```ignore
//! witness_registry::register::<i32, _>(sum, None);
//! witness_registry::register::<i32, _>(product, Some("product"));
//! let sum: Option<CombinableWitness<i32>> = witness_registry::lookup::<i32, _>(None);
//! ```

use std::any::Any;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

mod key;
mod lookup;
mod table;

pub use key::{WitnessKey, subject_name, table_name};
pub use lookup::WitnessLookupTable;
pub use table::{ErasedWitness, WitnessTable};

static SHARED: LazyLock<WitnessRegistry> = LazyLock::new(WitnessRegistry::new);

/// A set of witness tables.
///
/// The table map has its own lock and every table locks independently, so
/// writers of different witness types never contend on entries.
#[derive(Debug, Default)]
pub struct WitnessRegistry {
	tables: Mutex<FxHashMap<String, Arc<WitnessTable>>>,
}

impl WitnessRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The process-wide registry behind [`register`] and [`lookup`].
	pub fn shared() -> &'static WitnessRegistry {
		&SHARED
	}

	/// Returns the table called `name`, creating it on first use.
	pub fn table(&self, name: &str) -> Arc<WitnessTable> {
		let mut tables = self.tables.lock();
		if let Some(table) = tables.get(name) {
			return Arc::clone(table);
		}
		tracing::debug!(table = name, "creating witness table");
		let table = Arc::new(WitnessTable::new(name));
		tables.insert(name.to_owned(), Arc::clone(&table));
		table
	}

	/// The table witnesses of type `W` live in.
	pub fn table_for<W: ?Sized>(&self) -> Arc<WitnessTable> {
		self.table(table_name::<W>())
	}

	/// A typed view of the table for `W`.
	pub fn lookup_table<W: Any + Clone + Send + Sync>(&self) -> WitnessLookupTable<W> {
		WitnessLookupTable::new(self.table_for::<W>())
	}

	/// Stores `witness` for the subject type `T`. The last write for a key wins.
	pub fn register<T: ?Sized, W: Any + Send + Sync>(&self, witness: W, label: Option<&str>) {
		self.register_named(subject_name::<T>(), witness, label);
	}

	/// Stores `witness` under an explicit subject name.
	pub fn register_named<W: Any + Send + Sync>(&self, subject: &str, witness: W, label: Option<&str>) {
		self.table_for::<W>().write(WitnessKey::new(subject, label), Arc::new(witness));
	}

	/// Fetches the `W` registered for the subject type `T` under `label`.
	pub fn lookup<T: ?Sized, W: Any + Clone>(&self, label: Option<&str>) -> Option<W> {
		self.lookup_named(subject_name::<T>(), label)
	}

	pub fn lookup_named<W: Any + Clone>(&self, subject: &str, label: Option<&str>) -> Option<W> {
		let table = self.tables.lock().get(table_name::<W>()).cloned()?;
		table.read(&WitnessKey::new(subject, label))
	}

	/// Names of the tables created so far, sorted.
	pub fn table_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.tables.lock().keys().cloned().collect();
		names.sort();
		names
	}
}

/// Stores `witness` for `T` in the shared registry.
pub fn register<T: ?Sized, W: Any + Send + Sync>(witness: W, label: Option<&str>) {
	WitnessRegistry::shared().register::<T, W>(witness, label);
}

/// Fetches a witness for `T` from the shared registry.
pub fn lookup<T: ?Sized, W: Any + Clone>(label: Option<&str>) -> Option<W> {
	WitnessRegistry::shared().lookup::<T, W>(label)
}

#[cfg(test)]
mod tests;
