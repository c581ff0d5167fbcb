//! Procedural macros for protocol witnesses.
//!
//! * `#[witness]` - generates a `<Trait>Witness` struct next to a trait

use proc_macro::TokenStream;

mod expand;
mod lower;

/// Generates the witness of a trait.
///
/// The trait is kept as written. After it come `<Trait>Witness<A, ..>` with
/// one function field per requirement, a `new` constructor, the transformer
/// its variance allows (`map`, `pullback` or `iso`), and the helpers picked by
/// the arguments:
///
/// * `utilities` - `<field>_all` folds for binary operations, `register` and `registered`
/// * `conformance_init` - `conforming()`, a witness backed by the trait implementation
/// * `nested(Assoc, ..)` - embeds `<Bound>Witness<Assoc>` for each listed associated type,
///   where `Bound` is its first bound other than the std marker and comparison traits
/// * `runtime = "path"` - crate the registry helpers call into (default `witness`)
///
/// Bounds of unlisted associated types stay on the trait and are not witnessed.
/// A nested field is named after its associated type in snake case, so
/// `type Item` cannot be nested next to a requirement named `item`.
///
/// ```ignore
/// #[witness(utilities, conformance_init)]
/// pub trait Combinable {
///     fn combine(&self, other: &Self) -> Self;
/// }
///
/// let sum = CombinableWitness::<i32>::new(|a, b| a + b);
/// assert_eq!(sum.combine_all(0, [1, 2, 3]), 6);
/// ```
#[proc_macro_attribute]
pub fn witness(attr: TokenStream, item: TokenStream) -> TokenStream {
	expand::witness(attr.into(), item.into()).into()
}
