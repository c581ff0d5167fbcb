use std::marker::PhantomData;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::*;

#[derive(Debug, Clone, PartialEq)]
struct CombineWitness<A> {
	name: &'static str,
	_marker: PhantomData<fn() -> A>,
}

fn combine<A>(name: &'static str) -> CombineWitness<A> {
	CombineWitness { name, _marker: PhantomData }
}

#[derive(Debug, Clone, PartialEq)]
struct OtherWitness(u32);

#[fixture]
fn registry() -> WitnessRegistry {
	WitnessRegistry::new()
}

#[rstest]
fn register_then_lookup(registry: WitnessRegistry) {
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(None), Some(combine("sum")));
}

#[rstest]
fn missing_entries_are_absent(registry: WitnessRegistry) {
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(None), None);
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	assert_eq!(registry.lookup::<u8, CombineWitness<i32>>(None), None);
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(Some("product")), None);
}

#[rstest]
fn repeated_registration_is_idempotent(registry: WitnessRegistry) {
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	assert_eq!(registry.table_for::<CombineWitness<i32>>().len(), 1);
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(None), Some(combine("sum")));
}

#[rstest]
fn last_write_wins(registry: WitnessRegistry) {
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	registry.register::<i32, _>(combine::<i32>("max"), None);
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(None), Some(combine("max")));
}

#[rstest]
fn labels_are_isolated(registry: WitnessRegistry) {
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	registry.register::<i32, _>(combine::<i32>("product"), Some("product"));
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(None), Some(combine("sum")));
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(Some("product")), Some(combine("product")));
}

#[rstest]
fn generic_instances_share_a_table_but_not_entries(registry: WitnessRegistry) {
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	registry.register::<String, _>(combine::<String>("concat"), None);

	let table = registry.table_for::<CombineWitness<()>>();
	assert_eq!(table.len(), 2);
	assert!(table.name().ends_with("CombineWitness"));
	assert_eq!(registry.lookup::<String, CombineWitness<String>>(None), Some(combine("concat")));
}

#[rstest]
fn type_mismatch_reads_as_absent(registry: WitnessRegistry) {
	// Same erased table, same key, different concrete type.
	registry.register::<i32, _>(combine::<String>("concat"), None);
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(None), None);
	assert_eq!(registry.lookup::<i32, CombineWitness<String>>(None), Some(combine("concat")));
}

#[rstest]
fn witness_types_use_separate_tables(registry: WitnessRegistry) {
	registry.register::<i32, _>(combine::<i32>("sum"), None);
	registry.register::<i32, _>(OtherWitness(7), None);
	assert_eq!(registry.table_names().len(), 2);
	assert_eq!(registry.lookup::<i32, OtherWitness>(None), Some(OtherWitness(7)));
	assert_eq!(registry.lookup::<i32, CombineWitness<i32>>(None), Some(combine("sum")));
}

#[rstest]
fn named_subjects_and_typed_tables(registry: WitnessRegistry) {
	let table = registry.lookup_table::<OtherWitness>();
	table.insert::<str>(OtherWitness(1), None);
	table.insert_named("custom::Subject", OtherWitness(2), Some("alt"));

	assert_eq!(table.get::<str>(None), Some(OtherWitness(1)));
	assert_eq!(registry.lookup_named::<OtherWitness>("custom::Subject", Some("alt")), Some(OtherWitness(2)));
	assert_eq!(table.keys(), [WitnessKey::new("custom::Subject", Some("alt")), WitnessKey::new("str", None)]);
}

#[test]
fn key_display_and_erasure() {
	assert_eq!(WitnessKey::new("i32", Some("sum")).to_string(), "i32#sum");
	assert_eq!(WitnessKey::of::<i32>(None).to_string(), "i32");
	assert_eq!(key::erase_generics("a::B<c::D<E>>"), "a::B");
	assert_eq!(key::erase_generics("a::B"), "a::B");
}

#[test]
fn shared_registry_backs_free_functions() {
	struct OnlyHere;
	register::<OnlyHere, _>(OtherWitness(42), Some("shared"));
	assert_eq!(lookup::<OnlyHere, OtherWitness>(Some("shared")), Some(OtherWitness(42)));
	assert!(std::ptr::eq(WitnessRegistry::shared(), WitnessRegistry::shared()));
}

#[rstest]
fn concurrent_writers_and_readers(registry: WitnessRegistry) {
	let registry = Arc::new(registry);
	let handles: Vec<_> = (0..8u32)
		.map(|worker| {
			let registry = Arc::clone(&registry);
			thread::spawn(move || {
				let label = format!("worker-{worker}");
				for round in 0..50 {
					registry.register::<u32, _>(OtherWitness(round), Some(&label));
					assert_eq!(registry.lookup::<u32, OtherWitness>(Some(&label)), Some(OtherWitness(round)));
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}
	let table = registry.table_for::<OtherWitness>();
	assert_eq!(table.len(), 8);
	assert_eq!(registry.lookup::<u32, OtherWitness>(Some("worker-3")), Some(OtherWitness(49)));
}

proptest! {
	#[test]
	fn lookup_returns_the_last_write_per_label(writes in prop::collection::vec((prop::option::of("[a-c]"), 0u32..100), 1..40)) {
		let registry = WitnessRegistry::new();
		let mut expected = std::collections::HashMap::new();
		for (label, value) in &writes {
			registry.register::<u64, _>(OtherWitness(*value), label.as_deref());
			expected.insert(label.clone(), *value);
		}
		for (label, value) in expected {
			prop_assert_eq!(registry.lookup::<u64, OtherWitness>(label.as_deref()), Some(OtherWitness(value)));
		}
	}
}
