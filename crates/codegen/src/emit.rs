//! Witness emitter: turns an [`InterfaceSchema`] into a [`WitnessSpec`].

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::options::GenerationOptions;
use crate::schema::{AccessLevel, InterfaceSchema, Passing, Receiver, Requirement, SELF_TYPE, TypeExpr};
use crate::variance::{self, SubjectNames, TransformKind, Variance};

/// Suffix appended to an interface name to form its witness type.
pub const WITNESS_SUFFIX: &str = "Witness";

/// The witness record derived from one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessSpec {
	pub interface: String,
	pub struct_name: String,
	pub access: AccessLevel,
	/// Subject parameter first, then one parameter per retained associated type.
	pub generic_parameters: Vec<String>,
	pub fields: Vec<WitnessField>,
	/// Constructor argument names, always the field names in field order.
	pub constructor_parameters: Vec<String>,
	/// Transformer kind aggregated over the interface's methods.
	pub transform_kind: TransformKind,
	pub options: GenerationOptions,
}

impl WitnessSpec {
	/// Empty only for a hand-built spec without parameters.
	pub fn subject_param(&self) -> &str {
		self.generic_parameters.first().map_or("", String::as_str)
	}

	pub fn associated_parameters(&self) -> &[String] {
		self.generic_parameters.get(1..).unwrap_or_default()
	}

	pub fn field(&self, name: &str) -> Option<&WitnessField> {
		self.fields.iter().find(|field| field.name == name)
	}

	pub fn function_fields(&self) -> impl Iterator<Item = (&str, &FunctionField)> {
		self.fields.iter().filter_map(|field| match &field.kind {
			FieldKind::Function(function) => Some((field.name.as_str(), function)),
			FieldKind::Nested { .. } => None,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessField {
	pub name: String,
	pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
	/// A requirement turned into a function over the subject.
	Function(FunctionField),
	/// The witness of an associated type's constraint, embedded by value.
	Nested {
		interface: String,
		witness: String,
		associated_type: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionField {
	/// Name of the requirement as declared on the interface.
	pub requirement: String,
	pub parameters: Vec<FieldParam>,
	pub output: Option<TypeExpr>,
	pub member: MemberAccess,
	/// Variance of the requirement against every subject name of the interface.
	pub variance: Variance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldParam {
	#[serde(rename = "type")]
	pub ty: TypeExpr,
	pub passing: FieldPassing,
}

/// How a field argument reaches a conforming implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPassing {
	Owned,
	Borrowed,
	/// Mutated in place; the field takes `&mut` of the type.
	Inout,
}

/// How a conforming implementation exposes the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAccess {
	Call,
	Constant,
}

/// Builds the witness spec for `schema`.
pub(crate) fn emit(schema: &InterfaceSchema, config: &GeneratorConfig) -> Result<WitnessSpec> {
	let interface = schema.name.as_str();
	if syn::parse_str::<syn::Ident>(interface).is_err() {
		return Err(GenerateError::schema(interface, None, "interface name is not an identifier"));
	}

	check_associated_types(schema, config)?;
	let subjects = SubjectNames::for_schema(schema);

	let mut fields: Vec<WitnessField> = schema
		.associated_types
		.iter()
		.filter_map(|assoc| {
			let constraint = assoc.constraint.as_ref()?;
			Some(WitnessField {
				name: assoc.name.to_snake_case(),
				kind: FieldKind::Nested {
					interface: constraint.clone(),
					witness: format!("{constraint}{WITNESS_SUFFIX}"),
					associated_type: assoc.name.clone(),
				},
			})
		})
		.collect();

	for requirement in &schema.requirements {
		let function = function_field(schema, config, requirement, &subjects)?;
		fields.push(WitnessField { name: requirement.name().to_snake_case(), kind: FieldKind::Function(function) });
	}

	check_field_names(schema, &fields)?;

	let mut generic_parameters = vec![config.subject_param.clone()];
	generic_parameters.extend(retained_associated_types(schema));

	let spec = WitnessSpec {
		interface: interface.to_owned(),
		struct_name: format!("{interface}{WITNESS_SUFFIX}"),
		access: schema.access,
		generic_parameters,
		constructor_parameters: fields.iter().map(|field| field.name.clone()).collect(),
		fields,
		transform_kind: variance::transform_kind(schema),
		options: schema.options,
	};
	tracing::debug!(
		interface,
		fields = spec.fields.len(),
		transform = %spec.transform_kind,
		"emitted witness spec"
	);
	Ok(spec)
}

fn check_associated_types(schema: &InterfaceSchema, config: &GeneratorConfig) -> Result<()> {
	let interface = schema.name.as_str();
	for (index, assoc) in schema.associated_types.iter().enumerate() {
		if syn::parse_str::<syn::Ident>(&assoc.name).is_err() {
			return Err(GenerateError::schema(
				interface,
				None,
				format!("associated type `{}` is not an identifier", assoc.name),
			));
		}
		if assoc.name == config.subject_param || assoc.name == config.target_param {
			return Err(GenerateError::schema(
				interface,
				None,
				format!("associated type `{}` clashes with a generated type parameter", assoc.name),
			));
		}
		if schema.associated_types[..index].iter().any(|prior| prior.name == assoc.name) {
			return Err(GenerateError::schema(interface, None, format!("associated type `{}` is declared twice", assoc.name)));
		}
		if let Some(constraint) = &assoc.constraint {
			if syn::parse_str::<syn::Ident>(constraint).is_err() {
				return Err(GenerateError::schema(
					interface,
					None,
					format!("constraint `{constraint}` of `{}` is not an interface name", assoc.name),
				));
			}
		}
	}
	Ok(())
}

fn function_field(
	schema: &InterfaceSchema,
	config: &GeneratorConfig,
	requirement: &Requirement,
	subjects: &SubjectNames,
) -> Result<FunctionField> {
	let interface = schema.name.as_str();
	let name = requirement.name();
	let field_name = name.to_snake_case();
	if syn::parse_str::<syn::Ident>(name).is_err() || syn::parse_str::<syn::Ident>(&field_name).is_err() {
		return Err(GenerateError::schema(interface, Some(name), "requirement name does not form a field identifier"));
	}

	let check = |ty: &TypeExpr| -> Result<()> {
		ty.check().map_err(|reason| GenerateError::schema(interface, Some(name), reason))?;
		check_projections(schema, ty).map_err(|reason| GenerateError::schema(interface, Some(name), reason))?;
		check_shadowing(ty, config).map_err(|reason| GenerateError::schema(interface, Some(name), reason))
	};

	let variance = variance::variance(requirement, subjects);
	let subject = || TypeExpr::ident(SELF_TYPE);

	match requirement {
		Requirement::Method(method) => {
			if !method.generics.is_empty() {
				return Err(GenerateError::unsupported(
					interface,
					name,
					format!(
						"generic parameters <{}> cannot be stored in a witness field",
						method.generics.join(", ")
					),
				));
			}
			let receiver = match method.receiver {
				Receiver::Static => None,
				Receiver::Borrowed => Some(FieldPassing::Borrowed),
				Receiver::Owned => Some(FieldPassing::Owned),
				Receiver::Mutable => Some(FieldPassing::Inout),
			};
			let mut parameters: Vec<FieldParam> =
				receiver.map(|passing| FieldParam { ty: subject(), passing }).into_iter().collect();
			for parameter in &method.parameters {
				check(&parameter.ty)?;
				let passing = match parameter.passing {
					Passing::Owned => FieldPassing::Owned,
					Passing::Borrowed => FieldPassing::Borrowed,
				};
				parameters.push(FieldParam { ty: parameter.ty.clone(), passing });
			}
			if let Some(output) = &method.return_type {
				check(output)?;
			}
			Ok(FunctionField {
				requirement: name.to_owned(),
				parameters,
				output: method.return_type.clone(),
				member: MemberAccess::Call,
				variance,
			})
		}
		Requirement::Property(property) => {
			check(&property.ty)?;
			if property.constant && !property.is_static {
				return Err(GenerateError::unsupported(interface, name, "constants must be static"));
			}
			let parameters = if property.is_static {
				Vec::new()
			} else {
				vec![FieldParam { ty: subject(), passing: FieldPassing::Borrowed }]
			};
			Ok(FunctionField {
				requirement: name.to_owned(),
				parameters,
				output: Some(property.ty.clone()),
				member: if property.constant { MemberAccess::Constant } else { MemberAccess::Call },
				variance,
			})
		}
	}
}

/// Rejects `Self::X` projections that name no associated type.
fn check_projections(schema: &InterfaceSchema, ty: &TypeExpr) -> std::result::Result<(), String> {
	match ty {
		TypeExpr::Identifier(ident) => match ident.strip_prefix("Self::") {
			Some(rest) if schema.associated_type(rest).is_none() => Err(format!("`{ident}` names no associated type")),
			_ => Ok(()),
		},
		TypeExpr::Generic { arguments, .. } | TypeExpr::Tuple(arguments) => {
			arguments.iter().try_for_each(|argument| check_projections(schema, argument))
		}
		TypeExpr::Function { parameters, output } => {
			parameters.iter().try_for_each(|parameter| check_projections(schema, parameter))?;
			output.as_deref().map_or(Ok(()), |output| check_projections(schema, output))
		}
		TypeExpr::Optional(inner) => check_projections(schema, inner),
	}
}

/// Rejects type paths that the witness's own type parameters would shadow.
fn check_shadowing(ty: &TypeExpr, config: &GeneratorConfig) -> std::result::Result<(), String> {
	let check_path = |path: &str| {
		if path.starts_with("::") {
			return Ok(());
		}
		let head = path.split("::").next().unwrap_or(path);
		if head == config.subject_param || head == config.target_param {
			return Err(format!(
				"type `{path}` would be shadowed by the generated type parameter `{head}`; rename the type or configure other parameter names"
			));
		}
		Ok(())
	};
	match ty {
		TypeExpr::Identifier(ident) => check_path(ident),
		TypeExpr::Generic { base, arguments } => {
			check_path(base)?;
			arguments.iter().try_for_each(|argument| check_shadowing(argument, config))
		}
		TypeExpr::Tuple(elements) => elements.iter().try_for_each(|element| check_shadowing(element, config)),
		TypeExpr::Function { parameters, output } => {
			parameters.iter().try_for_each(|parameter| check_shadowing(parameter, config))?;
			output.as_deref().map_or(Ok(()), |output| check_shadowing(output, config))
		}
		TypeExpr::Optional(inner) => check_shadowing(inner, config),
	}
}

fn check_field_names(schema: &InterfaceSchema, fields: &[WitnessField]) -> Result<()> {
	for (index, field) in fields.iter().enumerate() {
		let requirement = match &field.kind {
			FieldKind::Function(function) => Some(function.requirement.as_str()),
			FieldKind::Nested { .. } => None,
		};
		let Some(prior) = fields[..index].iter().find(|prior| prior.name == field.name) else {
			continue;
		};
		let reason = match &prior.kind {
			FieldKind::Nested { associated_type, .. } => format!(
				"more than one field is named `{}`: the nested witness of associated type `{associated_type}` already takes it; rename the requirement or the associated type",
				field.name
			),
			FieldKind::Function(_) => format!("more than one field is named `{}`", field.name),
		};
		return Err(GenerateError::schema(&schema.name, requirement, reason));
	}
	Ok(())
}

/// Associated types that end up as generic parameters of the witness.
///
/// A parameter must be used by some field: either a requirement mentions
/// it or it carries a constraint and therefore a nested witness.
fn retained_associated_types(schema: &InterfaceSchema) -> Vec<String> {
	let associated = SubjectNames::new(schema.associated_types.iter().map(|assoc| assoc.name.as_str()));
	let mut mentioned = std::collections::BTreeSet::new();
	for requirement in &schema.requirements {
		match requirement {
			Requirement::Method(method) => {
				for parameter in &method.parameters {
					mentioned.extend(variance::classify(&parameter.ty, &associated));
				}
				if let Some(output) = &method.return_type {
					mentioned.extend(variance::classify(output, &associated));
				}
			}
			Requirement::Property(property) => mentioned.extend(variance::classify(&property.ty, &associated)),
		}
	}

	schema
		.associated_types
		.iter()
		.filter(|assoc| assoc.constraint.is_some() || mentioned.contains(&assoc.name))
		.map(|assoc| assoc.name.clone())
		.collect()
}
