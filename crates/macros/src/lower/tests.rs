use pretty_assertions::assert_eq;
use rstest::rstest;
use syn::parse_quote;
use witness_codegen::Requirement;

use super::*;
use crate::expand::parse_args;

fn ident(name: &str) -> TypeExpr {
	TypeExpr::ident(name)
}

fn lower_default(item: ItemTrait) -> syn::Result<InterfaceSchema> {
	lower(&item, GenerationOptions::default(), &[])
}

fn lower_nested(item: ItemTrait, nested: Ident) -> syn::Result<InterfaceSchema> {
	lower(&item, GenerationOptions::default(), &[nested])
}

#[test]
fn lowers_snapshottable() {
	let item: ItemTrait = parse_quote! {
		pub trait Snapshottable {
			type Format: Clone + Diffable;
			const VERSION: u32;
			fn path_extension() -> String;
			fn snapshot(&self) -> Self::Format;
		}
	};
	let schema = lower_nested(item, parse_quote!(Format)).unwrap();
	let expected = InterfaceSchema::new("Snapshottable")
		.with_access(AccessLevel::Public)
		.with_associated_type(AssociatedType::constrained("Format", "Diffable"))
		.with_requirement(PropertyRequirement::constant("VERSION", ident("u32")))
		.with_requirement(MethodRequirement::new("path_extension").returns(ident("String")))
		.with_requirement(MethodRequirement::new("snapshot").receiver(Receiver::Borrowed).returns(ident("Self::Format")));
	assert_eq!(schema, expected);
}

#[test]
fn borrowed_parameters_become_owned_field_types() {
	let item: ItemTrait = parse_quote! {
		trait Diffable {
			fn diff(old: &Self, new: &Self) -> Option<(String, Vec<String>)>;
			fn from(data: &[u8]) -> Self;
			fn label(&self, prefix: &str) -> String;
		}
	};
	let schema = lower_default(item).unwrap();
	let Requirement::Method(diff) = &schema.requirements[0] else { panic!("diff is a method") };
	assert_eq!(diff.parameters, [Parameter::borrowed("old", ident("Self")), Parameter::borrowed("new", ident("Self"))]);
	assert_eq!(
		diff.return_type,
		Some(TypeExpr::optional(TypeExpr::tuple([ident("String"), TypeExpr::generic("Vec", [ident("String")])])))
	);

	let Requirement::Method(from) = &schema.requirements[1] else { panic!("from is a method") };
	assert_eq!(from.parameters, [Parameter::borrowed("data", TypeExpr::generic("Vec", [ident("u8")]))]);

	let Requirement::Method(label) = &schema.requirements[2] else { panic!("label is a method") };
	assert_eq!(label.parameters, [Parameter::borrowed("prefix", ident("String"))]);
	assert_eq!(schema.access, AccessLevel::Default);
}

#[rstest]
#[case::borrowed(parse_quote!(fn f(&self);), Receiver::Borrowed)]
#[case::owned(parse_quote!(fn f(self);), Receiver::Owned)]
#[case::mutable(parse_quote!(fn f(&mut self);), Receiver::Mutable)]
#[case::static_fn(parse_quote!(fn f();), Receiver::Static)]
fn receivers(#[case] item: syn::TraitItemFn, #[case] expected: Receiver) {
	assert_eq!(lower_fn(&item.sig).unwrap().receiver, expected);
}

#[rstest]
#[case(parse_quote!(Option<Self>), TypeExpr::optional(ident("Self")))]
#[case(parse_quote!(::std::option::Option<u8>), TypeExpr::optional(ident("u8")))]
#[case(parse_quote!(std::collections::HashMap<String, Self>), TypeExpr::generic("std::collections::HashMap", [ident("String"), ident("Self")]))]
#[case(parse_quote!((Self)), ident("Self"))]
#[case(parse_quote!(()), TypeExpr::tuple([]))]
#[case(parse_quote!(Self::Format), ident("Self::Format"))]
fn lowers_types(#[case] ty: Type, #[case] expected: TypeExpr) {
	assert_eq!(lower_type(&ty).unwrap(), expected);
}

#[rstest]
#[case::mutable_param(parse_quote!(trait T { fn f(&self, other: &mut Self); }))]
#[case::reference_return(parse_quote!(trait T { fn f(&self) -> &str; }))]
#[case::async_fn(parse_quote!(trait T { async fn f(&self); }))]
#[case::generic_trait(parse_quote!(trait T<X> { fn f(&self) -> X; }))]
#[case::lifetime_param(parse_quote!(trait T { fn f<'a>(&self); }))]
#[case::bare_fn(parse_quote!(trait T { fn f(&self, g: fn(u8) -> u8); }))]
#[case::dyn_trait(parse_quote!(trait T { fn f(&self) -> Box<dyn Fn()>; }))]
#[case::gat(parse_quote!(trait T { type Item<'a>; }))]
fn rejected_traits(#[case] item: ItemTrait) {
	assert!(lower_default(item).is_err());
}

#[test]
fn method_generics_are_passed_through() {
	let item: ItemTrait = parse_quote! {
		trait Wrapping {
			fn wrap<T>(value: T) -> Self;
		}
	};
	let schema = lower_default(item).unwrap();
	let Requirement::Method(wrap) = &schema.requirements[0] else { panic!("wrap is a method") };
	assert_eq!(wrap.generics, ["T"]);
}

#[test]
fn std_bounds_are_not_constraints() {
	let item: ItemTrait = parse_quote! {
		pub(crate) trait Convertible {
			type To: Clone + Send + 'static;
			fn convert(&self) -> Self::To;
		}
	};
	let schema = lower_default(item).unwrap();
	assert_eq!(schema.associated_types, [AssociatedType::new("To")]);
	assert_eq!(schema.access, AccessLevel::Internal);
}

#[rstest]
#[case::display(parse_quote!(trait Labeled { type Label: std::fmt::Display; fn text(&self) -> Self::Label; }))]
#[case::iterator(parse_quote!(trait Listing { type Items: Iterator<Item = u8>; fn items(&self) -> Self::Items; }))]
#[case::witnessed_but_not_listed(parse_quote!(trait Snapshottable { type Format: Diffable; fn snapshot(&self) -> Self::Format; }))]
fn unlisted_bounds_are_left_to_the_trait(#[case] item: ItemTrait) {
	let schema = lower_default(item).unwrap();
	assert!(schema.associated_types.iter().all(|assoc| assoc.constraint.is_none()), "{:?}", schema.associated_types);
}

#[test]
fn display_bound_generates_no_nested_witness() {
	let item: ItemTrait = parse_quote! {
		trait Labeled {
			type Label: std::fmt::Display;
			fn text(&self) -> Self::Label;
		}
	};
	let generated = witness_codegen::generate(&lower_default(item).unwrap()).unwrap();
	let tokens = generated.tokens().to_string();
	assert!(!tokens.contains("DisplayWitness"), "{tokens}");
	assert_eq!(generated.spec().generic_parameters, ["A", "Label"]);
}

#[rstest]
#[case::not_declared(parse_quote!(trait T { type Item: Foo; }), parse_quote!(Missing))]
#[case::no_witnessed_bound(parse_quote!(trait T { type Item: Clone + AsRef<str>; }), parse_quote!(Item))]
fn nested_needs_a_declared_witnessed_bound(#[case] item: ItemTrait, #[case] nested: Ident) {
	assert!(lower_nested(item, nested).is_err());
}

#[test]
fn parses_attribute_arguments() {
	let args = parse_args(quote::quote!(utilities, conformanceInit, nested(Format, Key), runtime = "crate::support", shiny)).unwrap();
	assert!(args.options.utilities);
	assert!(args.options.conformance_init);
	assert_eq!(args.config.runtime_crate, "crate::support");
	assert_eq!(args.nested, [Ident::new("Format", proc_macro2::Span::call_site()), Ident::new("Key", proc_macro2::Span::call_site())]);

	let args = parse_args(proc_macro2::TokenStream::new()).unwrap();
	assert_eq!(args.options, GenerationOptions::default());
	assert!(args.nested.is_empty());
	assert!(parse_args(quote::quote!(a::b)).is_err());
	assert!(parse_args(quote::quote!(nested(a::B))).is_err());
}
