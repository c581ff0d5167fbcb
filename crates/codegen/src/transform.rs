//! Transformer emitter: `map`, `pullback` and `iso` between witnesses.
//!
//! The aggregate [`TransformKind`] of the spec decides whether a transformer
//! exists. How each field is rewritten inside it is decided per field, by
//! looking at where that field mentions the subject being converted, and the
//! directions those rewrites need pick the final `map`, `pullback` or `iso`.

use serde::{Deserialize, Serialize};

use crate::emit::{FieldKind, FieldPassing, FunctionField, WitnessSpec};
use crate::error::{GenerateError, Result};
use crate::schema::{InterfaceSchema, TypeExpr};
use crate::variance::{self, SubjectNames, TransformKind, Variance};

/// One generated transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformDef {
	pub kind: TransformKind,
	/// The aggregate kind, when the directions the fields convert through call for another transformer.
	pub promoted_from: Option<TransformKind>,
	/// One route per witness field, in field order.
	pub routes: Vec<FieldRoute>,
	/// Some field mutates the subject in place, so the target must be `Clone`.
	pub clones_target: bool,
}

impl TransformDef {
	pub fn method_name(&self) -> &'static str {
		self.kind.method_name().unwrap_or("iso")
	}

	pub fn route(&self, field: &str) -> Option<&Rewrite> {
		self.routes.iter().find(|route| route.field == field).map(|route| &route.rewrite)
	}

	/// True if some field pulls arguments back through the `B -> A` conversion.
	pub fn uses_to(&self) -> bool {
		self.routes.iter().any(|route| route.rewrite.needs_to())
	}

	/// True if some field maps results through the `A -> B` conversion.
	pub fn uses_from(&self) -> bool {
		self.routes.iter().any(|route| route.rewrite.needs_from())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRoute {
	pub field: String,
	pub rewrite: Rewrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rewrite {
	/// The field never mentions the subject and is shared as is.
	Forward,
	/// An embedded witness, cloned into the target.
	Nested,
	/// A new closure calling the original field with converted values.
	Rebuild { parameters: Vec<ParamRoute>, output: OutputRoute },
}

impl Rewrite {
	pub(crate) fn needs_to(&self) -> bool {
		match self {
			Rewrite::Rebuild { parameters, .. } => parameters.iter().any(|param| *param != ParamRoute::Pass),
			Rewrite::Forward | Rewrite::Nested => false,
		}
	}

	pub(crate) fn needs_from(&self) -> bool {
		match self {
			Rewrite::Rebuild { parameters, output } => {
				*output == OutputRoute::Map || parameters.contains(&ParamRoute::Inout)
			}
			Rewrite::Forward | Rewrite::Nested => false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamRoute {
	Pass,
	/// Converted from the target type with the `B -> A` function.
	PullBack,
	/// Converted in, mutated, then converted back and written through.
	Inout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRoute {
	Pass,
	/// Converted to the target type with the `A -> B` function.
	Map,
}

/// Builds the zero or one transformer of `spec`.
pub(crate) fn emit_transforms(schema: &InterfaceSchema, spec: &WitnessSpec) -> Result<Vec<TransformDef>> {
	if spec.transform_kind == TransformKind::None {
		tracing::debug!(interface = %schema.name, "no transformer: subject unused by every method");
		return Ok(Vec::new());
	}

	let subject = SubjectNames::primary();
	let mut routes = Vec::with_capacity(spec.fields.len());
	for field in &spec.fields {
		let rewrite = match &field.kind {
			FieldKind::Nested { .. } => Rewrite::Nested,
			FieldKind::Function(function) => route_function(&schema.name, function, &subject)?,
		};
		routes.push(FieldRoute { field: field.name.clone(), rewrite });
	}

	let needs_to = routes.iter().any(|route| route.rewrite.needs_to());
	let needs_from = routes.iter().any(|route| route.rewrite.needs_from());
	let kind = match (spec.transform_kind, needs_to, needs_from) {
		(TransformKind::Map | TransformKind::Pullback, true, true) => TransformKind::Iso,
		(TransformKind::Map, true, false) => TransformKind::Pullback,
		(TransformKind::Pullback, false, true) => TransformKind::Map,
		(kind, ..) => kind,
	};
	let promoted_from = (kind != spec.transform_kind).then_some(spec.transform_kind);
	if let Some(aggregate) = promoted_from {
		tracing::debug!(interface = %schema.name, %aggregate, %kind, "field routes override the aggregate transformer");
	}

	let clones_target = routes.iter().any(|route| match &route.rewrite {
		Rewrite::Rebuild { parameters, .. } => parameters.contains(&ParamRoute::Inout),
		Rewrite::Forward | Rewrite::Nested => false,
	});

	Ok(vec![TransformDef { kind, promoted_from, routes, clones_target }])
}

fn route_function(interface: &str, function: &FunctionField, subject: &SubjectNames) -> Result<Rewrite> {
	let output_mentions = function.output.as_ref().is_some_and(|output| variance::mentions(output, subject));
	let inputs_mention = function.parameters.iter().any(|param| variance::mentions(&param.ty, subject));
	if !output_mentions && !inputs_mention {
		return Ok(Rewrite::Forward);
	}

	let unroutable = |ty: &TypeExpr| {
		GenerateError::unsupported(
			interface,
			&function.requirement,
			format!("the subject inside `{ty:?}` cannot be converted; only bare, optional and tuple positions can"),
		)
	};

	let mut parameters = Vec::with_capacity(function.parameters.len());
	for param in &function.parameters {
		let route = match (variance::variance_of(&param.ty, subject), param.passing) {
			(Variance::Contravariant, FieldPassing::Inout) if param.ty.is_named(crate::schema::SELF_TYPE) => ParamRoute::Inout,
			(Variance::Contravariant, FieldPassing::Inout) => return Err(unroutable(&param.ty)),
			(Variance::Contravariant, _) if routable(&param.ty, subject) => ParamRoute::PullBack,
			(Variance::Contravariant, _) => return Err(unroutable(&param.ty)),
			_ => ParamRoute::Pass,
		};
		parameters.push(route);
	}

	let output = match &function.output {
		Some(output) if output_mentions => {
			if !routable(output, subject) {
				return Err(unroutable(output));
			}
			OutputRoute::Map
		}
		_ => OutputRoute::Pass,
	};

	Ok(Rewrite::Rebuild { parameters, output })
}

/// Whether the subject can be converted structurally wherever it occurs in `ty`.
pub(crate) fn routable(ty: &TypeExpr, subject: &SubjectNames) -> bool {
	if !variance::mentions(ty, subject) {
		return true;
	}
	match ty {
		TypeExpr::Identifier(_) => true,
		TypeExpr::Optional(inner) => routable(inner, subject),
		TypeExpr::Tuple(elements) => elements.iter().all(|element| routable(element, subject)),
		TypeExpr::Generic { .. } | TypeExpr::Function { .. } => false,
	}
}
