use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::key::WitnessKey;

/// Type-erased witness storage shared by the tables.
pub type ErasedWitness = Arc<dyn Any + Send + Sync>;

/// One table of witnesses, guarded by its own lock.
#[derive(Default)]
pub struct WitnessTable {
	name: String,
	entries: Mutex<FxHashMap<WitnessKey, ErasedWitness>>,
}

impl WitnessTable {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), entries: Mutex::default() }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Stores `witness` under `key`, replacing any previous entry.
	///
	/// Returns true if an entry was replaced.
	pub fn write(&self, key: WitnessKey, witness: ErasedWitness) -> bool {
		let replaced = self.entries.lock().insert(key.clone(), witness).is_some();
		if replaced {
			tracing::debug!(table = %self.name, %key, "replaced witness");
		} else {
			tracing::trace!(table = %self.name, %key, "stored witness");
		}
		replaced
	}

	/// Reads the entry under `key` as a `W`.
	///
	/// An entry of another concrete type reads as absent.
	pub fn read<W: Any + Clone>(&self, key: &WitnessKey) -> Option<W> {
		let entry = self.entries.lock().get(key).cloned()?;
		let witness = entry.downcast_ref::<W>().cloned();
		if witness.is_none() {
			tracing::debug!(
				table = %self.name,
				%key,
				expected = std::any::type_name::<W>(),
				"stored witness has a different type"
			);
		}
		witness
	}

	pub fn remove(&self, key: &WitnessKey) -> bool {
		self.entries.lock().remove(key).is_some()
	}

	pub fn contains(&self, key: &WitnessKey) -> bool {
		self.entries.lock().contains_key(key)
	}

	pub fn keys(&self) -> Vec<WitnessKey> {
		let mut keys: Vec<WitnessKey> = self.entries.lock().keys().cloned().collect();
		keys.sort();
		keys
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl std::fmt::Debug for WitnessTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WitnessTable").field("name", &self.name).field("len", &self.len()).finish()
	}
}
