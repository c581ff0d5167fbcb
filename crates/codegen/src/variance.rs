//! Variance analysis of requirement signatures.
//!
//! A requirement mentions the subject type (and any associated types) in
//! input positions, output positions, both, or neither. The per-requirement
//! classification drives which whole-witness transformer gets generated and
//! how each field is rewritten inside it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::schema::{InterfaceSchema, Requirement, SELF_TYPE, TypeExpr, names_subject};

/// How a requirement uses the subject type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Variance {
	/// Subject only in input positions.
	Contravariant,
	/// Subject only in output positions.
	Covariant,
	/// Subject in both positions, or nowhere at all.
	Invariant,
}

/// Which whole-witness transformer an interface gets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
	Map,
	Pullback,
	Iso,
	#[default]
	None,
}

impl TransformKind {
	/// Decides the transformer from the set of variances observed across an interface.
	///
	/// Iso wins whenever the direction is mixed or ambiguous since it takes
	/// both conversions and cannot misapply one.
	pub fn from_variances<'a>(variances: impl IntoIterator<Item = &'a Variance>) -> Self {
		let seen: BTreeSet<Variance> = variances.into_iter().copied().collect();
		let covariant = seen.contains(&Variance::Covariant);
		let contravariant = seen.contains(&Variance::Contravariant);
		if seen.contains(&Variance::Invariant) || (covariant && contravariant) {
			TransformKind::Iso
		} else if contravariant {
			TransformKind::Pullback
		} else if covariant {
			TransformKind::Map
		} else {
			TransformKind::None
		}
	}

	/// Name of the generated transformer method, if any.
	pub fn method_name(self) -> Option<&'static str> {
		match self {
			TransformKind::Map => Some("map"),
			TransformKind::Pullback => Some("pullback"),
			TransformKind::Iso => Some("iso"),
			TransformKind::None => None,
		}
	}
}

/// The names standing for the subject inside signatures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubjectNames {
	names: BTreeSet<String>,
}

impl SubjectNames {
	pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
		Self { names: names.into_iter().map(Into::into).collect() }
	}

	/// Only the interface's own `Self`.
	pub fn primary() -> Self {
		Self::new([SELF_TYPE])
	}

	/// `Self` plus every associated type of the interface.
	pub fn for_schema(schema: &InterfaceSchema) -> Self {
		Self::new(std::iter::once(SELF_TYPE).chain(schema.associated_types.iter().map(|assoc| assoc.name.as_str())))
	}

	/// A copy extended with extra names, e.g. a requirement's own generics.
	pub fn with<S: Into<String>>(&self, extra: impl IntoIterator<Item = S>) -> Self {
		let mut names = self.names.clone();
		names.extend(extra.into_iter().map(Into::into));
		Self { names }
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.contains(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}

	fn resolve(&self, ident: &str) -> Option<&str> {
		self.names.iter().map(String::as_str).find(|name| names_subject(ident, name))
	}
}

/// Every subject name occurring anywhere inside `ty`.
pub fn classify(ty: &TypeExpr, subjects: &SubjectNames) -> BTreeSet<String> {
	let mut found = BTreeSet::new();
	collect(ty, subjects, &mut found);
	found
}

fn collect(ty: &TypeExpr, subjects: &SubjectNames, found: &mut BTreeSet<String>) {
	match ty {
		TypeExpr::Identifier(ident) => {
			if let Some(name) = subjects.resolve(ident) {
				found.insert(name.to_owned());
			}
		}
		TypeExpr::Generic { base, arguments } => {
			if let Some(name) = subjects.resolve(base) {
				found.insert(name.to_owned());
			}
			for argument in arguments {
				collect(argument, subjects, found);
			}
		}
		TypeExpr::Function { parameters, output } => {
			for parameter in parameters {
				collect(parameter, subjects, found);
			}
			if let Some(output) = output {
				collect(output, subjects, found);
			}
		}
		TypeExpr::Tuple(elements) => {
			for element in elements {
				collect(element, subjects, found);
			}
		}
		TypeExpr::Optional(inner) => collect(inner, subjects, found),
	}
}

/// Returns true if `ty` mentions any of `subjects`.
pub fn mentions(ty: &TypeExpr, subjects: &SubjectNames) -> bool {
	!classify(ty, subjects).is_empty()
}

/// Classifies a requirement, returning `None` when no subject name occurs at all.
pub fn occurrence(requirement: &Requirement, subjects: &SubjectNames) -> Option<Variance> {
	let (inputs, outputs) = match requirement {
		Requirement::Method(method) => {
			let subjects = subjects.with(method.generics.iter().cloned());
			let inputs: BTreeSet<String> = method.parameters.iter().flat_map(|param| classify(&param.ty, &subjects)).collect();
			let outputs = method.return_type.as_ref().map(|ty| classify(ty, &subjects)).unwrap_or_default();
			(inputs, outputs)
		}
		// A property only has a read position.
		Requirement::Property(property) => (BTreeSet::new(), classify(&property.ty, subjects)),
	};

	match (inputs.is_empty(), outputs.is_empty()) {
		_ if inputs.intersection(&outputs).next().is_some() => Some(Variance::Invariant),
		(false, true) => Some(Variance::Contravariant),
		(true, false) => Some(Variance::Covariant),
		(true, true) => None,
		(false, false) => Some(Variance::Invariant),
	}
}

/// Classifies a requirement; an absent subject counts as [`Variance::Invariant`].
pub fn variance(requirement: &Requirement, subjects: &SubjectNames) -> Variance {
	occurrence(requirement, subjects).unwrap_or(Variance::Invariant)
}

/// Classifies a single parameter position.
pub fn variance_of(ty: &TypeExpr, subjects: &SubjectNames) -> Variance {
	if mentions(ty, subjects) {
		Variance::Contravariant
	} else {
		Variance::Invariant
	}
}

/// Aggregates the transformer kind of an interface from its method requirements.
///
/// Properties and methods that never mention a subject name do not vote.
pub fn transform_kind(schema: &InterfaceSchema) -> TransformKind {
	let subjects = SubjectNames::for_schema(schema);
	let variances: Vec<Variance> = schema
		.requirements
		.iter()
		.filter(|requirement| matches!(requirement, Requirement::Method(_)))
		.filter_map(|requirement| occurrence(requirement, &subjects))
		.collect();
	TransformKind::from_variances(&variances)
}
