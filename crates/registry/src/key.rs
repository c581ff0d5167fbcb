//! Registry keys and type identity.

use std::fmt;

/// Identity of a registry entry: the subject type plus an optional label.
///
/// Unlabeled and labeled entries of the same subject are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WitnessKey {
	pub subject: String,
	pub label: Option<String>,
}

impl WitnessKey {
	pub fn new(subject: impl Into<String>, label: Option<&str>) -> Self {
		Self { subject: subject.into(), label: label.map(str::to_owned) }
	}

	/// Key for the subject type `T`.
	pub fn of<T: ?Sized>(label: Option<&str>) -> Self {
		Self::new(subject_name::<T>(), label)
	}
}

impl fmt::Display for WitnessKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.label {
			Some(label) => write!(f, "{}#{label}", self.subject),
			None => f.write_str(&self.subject),
		}
	}
}

/// Process-stable identity string of a subject type.
pub fn subject_name<T: ?Sized>() -> &'static str {
	std::any::type_name::<T>()
}

/// Name of the table a witness type is stored in: its type name without generic arguments.
///
/// `CombinableWitness<i32>` and `CombinableWitness<String>` share a table.
pub fn table_name<W: ?Sized>() -> &'static str {
	erase_generics(std::any::type_name::<W>())
}

pub(crate) fn erase_generics(name: &str) -> &str {
	name.split_once('<').map_or(name, |(base, _)| base)
}
