use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::key::{WitnessKey, subject_name};
use crate::table::WitnessTable;

/// Typed view of the table holding witnesses of type `W`.
///
/// Reads by subject type or by subject name; a stored entry of any other
/// concrete type reads as absent.
pub struct WitnessLookupTable<W> {
	table: Arc<WitnessTable>,
	_marker: PhantomData<fn() -> W>,
}

impl<W: Any + Clone + Send + Sync> WitnessLookupTable<W> {
	pub(crate) fn new(table: Arc<WitnessTable>) -> Self {
		Self { table, _marker: PhantomData }
	}

	pub fn get<T: ?Sized>(&self, label: Option<&str>) -> Option<W> {
		self.get_named(subject_name::<T>(), label)
	}

	pub fn get_named(&self, subject: &str, label: Option<&str>) -> Option<W> {
		self.table.read(&WitnessKey::new(subject, label))
	}

	pub fn insert<T: ?Sized>(&self, witness: W, label: Option<&str>) {
		self.insert_named(subject_name::<T>(), witness, label);
	}

	pub fn insert_named(&self, subject: &str, witness: W, label: Option<&str>) {
		self.table.write(WitnessKey::new(subject, label), Arc::new(witness));
	}

	/// Keys currently stored in the underlying table, including entries of other types.
	pub fn keys(&self) -> Vec<WitnessKey> {
		self.table.keys()
	}

	pub fn table(&self) -> &WitnessTable {
		&self.table
	}
}

impl<W> Clone for WitnessLookupTable<W> {
	fn clone(&self) -> Self {
		Self { table: Arc::clone(&self.table), _marker: PhantomData }
	}
}

impl<W> std::fmt::Debug for WitnessLookupTable<W> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WitnessLookupTable").field("table", &self.table).finish()
	}
}
