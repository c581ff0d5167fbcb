use pretty_assertions::assert_eq;
use rstest as _;
use witness::witness;
use witness_codegen as _;
use witness_macros as _;
use witness_registry as _;

#[witness(conformance_init)]
pub trait Counter {
	fn increment(&mut self, by: u32);
	fn value(&self) -> u32;
	fn reset() -> Self;
}

impl Counter for u32 {
	fn increment(&mut self, by: u32) {
		*self += by;
	}

	fn value(&self) -> u32 {
		*self
	}

	fn reset() -> Self {
		0
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Clicks(u32);

#[test]
fn inout_field_mutates_in_place() {
	let counter = CounterWitness::<u32>::conforming();
	let mut clicks = (counter.reset)();
	(counter.increment)(&mut clicks, 2);
	(counter.increment)(&mut clicks, 3);
	assert_eq!((counter.value)(clicks), 5);
}

#[test]
fn iso_writes_the_converted_value_back() {
	let clicks = CounterWitness::<u32>::conforming().iso(|clicks: Clicks| clicks.0, Clicks);

	let mut total = (clicks.reset)();
	assert_eq!(total, Clicks(0));
	(clicks.increment)(&mut total, 4);
	(clicks.increment)(&mut total, 1);
	assert_eq!(total, Clicks(5));
	assert_eq!((clicks.value)(total), 5);
}

#[test]
fn handwritten_counter_saturates() {
	let saturating = CounterWitness::<u8>::new(|count, by| *count = count.saturating_add(by.min(255) as u8), |count| u32::from(count), || 0);
	let mut count = 250;
	(saturating.increment)(&mut count, 10);
	assert_eq!((saturating.value)(count), 255);
}
