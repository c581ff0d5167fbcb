//! In-memory model of an interface handed to the generator.
//!
//! Schemas are plain data. Whoever parses the surface syntax (the
//! `#[witness]` attribute, a build script reading JSON, a test) builds an
//! [`InterfaceSchema`] and hands it to [`crate::Generator`].

use serde::{Deserialize, Serialize};

use crate::options::GenerationOptions;

/// Name used for the interface's own abstract type inside requirement signatures.
pub const SELF_TYPE: &str = "Self";

/// An interface whose requirements become the fields of a witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSchema {
	pub name: String,
	#[serde(default)]
	pub access: AccessLevel,
	#[serde(default)]
	pub requirements: Vec<Requirement>,
	#[serde(default)]
	pub associated_types: Vec<AssociatedType>,
	#[serde(default)]
	pub options: GenerationOptions,
}

impl InterfaceSchema {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			access: AccessLevel::Default,
			requirements: Vec::new(),
			associated_types: Vec::new(),
			options: GenerationOptions::default(),
		}
	}

	pub fn with_access(mut self, access: AccessLevel) -> Self {
		self.access = access;
		self
	}

	pub fn with_requirement(mut self, requirement: impl Into<Requirement>) -> Self {
		self.requirements.push(requirement.into());
		self
	}

	pub fn with_associated_type(mut self, associated: AssociatedType) -> Self {
		self.associated_types.push(associated);
		self
	}

	pub fn with_options(mut self, options: GenerationOptions) -> Self {
		self.options = options;
		self
	}

	/// Looks up an associated type by name.
	pub fn associated_type(&self, name: &str) -> Option<&AssociatedType> {
		self.associated_types.iter().find(|assoc| assoc.name == name)
	}
}

/// Visibility of the interface, inherited by everything generated for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
	/// No explicit modifier; follows the host rule for unmarked items.
	#[default]
	Default,
	Internal,
	Public,
	Private,
}

impl AccessLevel {
	/// Picks the least visible explicit level, falling back to [`AccessLevel::Default`].
	pub fn least_visible(levels: impl IntoIterator<Item = AccessLevel>) -> AccessLevel {
		levels
			.into_iter()
			.filter(|level| *level != AccessLevel::Default)
			.min_by_key(|level| level.rank())
			.unwrap_or_default()
	}

	fn rank(self) -> u8 {
		match self {
			AccessLevel::Private => 0,
			AccessLevel::Default => 1,
			AccessLevel::Internal => 2,
			AccessLevel::Public => 3,
		}
	}
}

/// A single requirement of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
	Method(MethodRequirement),
	Property(PropertyRequirement),
}

impl Requirement {
	pub fn name(&self) -> &str {
		match self {
			Requirement::Method(method) => &method.name,
			Requirement::Property(property) => &property.name,
		}
	}

	pub fn is_static(&self) -> bool {
		match self {
			Requirement::Method(method) => method.receiver == Receiver::Static,
			Requirement::Property(property) => property.is_static,
		}
	}
}

impl From<MethodRequirement> for Requirement {
	fn from(method: MethodRequirement) -> Self {
		Requirement::Method(method)
	}
}

impl From<PropertyRequirement> for Requirement {
	fn from(property: PropertyRequirement) -> Self {
		Requirement::Property(property)
	}
}

/// How a method receives the subject value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
	/// No receiver: a static requirement.
	#[default]
	Static,
	Borrowed,
	Owned,
	/// The receiver is mutated in place (`&mut self`, an `inout` self).
	Mutable,
}

/// How a conforming implementation expects an argument.
///
/// Witness fields always take arguments by value; this only changes how a
/// conformance-backed witness forwards them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Passing {
	#[default]
	Owned,
	Borrowed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
	pub label: String,
	#[serde(rename = "type")]
	pub ty: TypeExpr,
	#[serde(default)]
	pub passing: Passing,
}

impl Parameter {
	pub fn new(label: impl Into<String>, ty: TypeExpr) -> Self {
		Self { label: label.into(), ty, passing: Passing::Owned }
	}

	pub fn borrowed(label: impl Into<String>, ty: TypeExpr) -> Self {
		Self { label: label.into(), ty, passing: Passing::Borrowed }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRequirement {
	pub name: String,
	#[serde(default)]
	pub parameters: Vec<Parameter>,
	#[serde(default)]
	pub receiver: Receiver,
	/// Type parameters declared by the requirement itself.
	#[serde(default)]
	pub generics: Vec<String>,
	#[serde(default)]
	pub return_type: Option<TypeExpr>,
}

impl MethodRequirement {
	/// A requirement with no receiver.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			parameters: Vec::new(),
			receiver: Receiver::Static,
			generics: Vec::new(),
			return_type: None,
		}
	}

	pub fn receiver(mut self, receiver: Receiver) -> Self {
		self.receiver = receiver;
		self
	}

	pub fn param(mut self, parameter: Parameter) -> Self {
		self.parameters.push(parameter);
		self
	}

	pub fn generic(mut self, name: impl Into<String>) -> Self {
		self.generics.push(name.into());
		self
	}

	pub fn returns(mut self, ty: TypeExpr) -> Self {
		self.return_type = Some(ty);
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRequirement {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: TypeExpr,
	#[serde(default)]
	pub is_static: bool,
	/// Read as an associated constant rather than through an accessor.
	#[serde(default)]
	pub constant: bool,
}

impl PropertyRequirement {
	pub fn instance(name: impl Into<String>, ty: TypeExpr) -> Self {
		Self { name: name.into(), ty, is_static: false, constant: false }
	}

	pub fn type_level(name: impl Into<String>, ty: TypeExpr) -> Self {
		Self { name: name.into(), ty, is_static: true, constant: false }
	}

	pub fn constant(name: impl Into<String>, ty: TypeExpr) -> Self {
		Self { name: name.into(), ty, is_static: true, constant: true }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedType {
	pub name: String,
	/// Interface the associated type must conform to; its witness is embedded.
	#[serde(default)]
	pub constraint: Option<String>,
}

impl AssociatedType {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), constraint: None }
	}

	pub fn constrained(name: impl Into<String>, constraint: impl Into<String>) -> Self {
		Self { name: name.into(), constraint: Some(constraint.into()) }
	}
}

/// Structured type expression of a requirement signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
	/// A plain or path-qualified name: `Self`, `Self::Format`, `u32`, `std::path::PathBuf`.
	Identifier(String),
	/// `Base<Args..>`.
	Generic { base: String, arguments: Vec<TypeExpr> },
	/// `(Params..) -> Output`; an absent output is unit.
	Function {
		parameters: Vec<TypeExpr>,
		#[serde(default)]
		output: Option<Box<TypeExpr>>,
	},
	Tuple(Vec<TypeExpr>),
	Optional(Box<TypeExpr>),
}

impl TypeExpr {
	pub fn ident(name: impl Into<String>) -> Self {
		TypeExpr::Identifier(name.into())
	}

	pub fn self_type() -> Self {
		TypeExpr::Identifier(SELF_TYPE.to_owned())
	}

	pub fn generic(base: impl Into<String>, arguments: impl IntoIterator<Item = TypeExpr>) -> Self {
		TypeExpr::Generic { base: base.into(), arguments: arguments.into_iter().collect() }
	}

	pub fn function(parameters: impl IntoIterator<Item = TypeExpr>, output: Option<TypeExpr>) -> Self {
		TypeExpr::Function { parameters: parameters.into_iter().collect(), output: output.map(Box::new) }
	}

	pub fn tuple(elements: impl IntoIterator<Item = TypeExpr>) -> Self {
		TypeExpr::Tuple(elements.into_iter().collect())
	}

	pub fn optional(inner: TypeExpr) -> Self {
		TypeExpr::Optional(Box::new(inner))
	}

	/// Returns true if this expression is exactly `name` (`Self` or `Self::name` aware).
	pub fn is_named(&self, name: &str) -> bool {
		match self {
			TypeExpr::Identifier(ident) => names_subject(ident, name),
			_ => false,
		}
	}

	/// Checks that every node can be walked and rendered.
	pub fn check(&self) -> Result<(), String> {
		match self {
			TypeExpr::Identifier(ident) => check_path(ident),
			TypeExpr::Generic { base, arguments } => {
				check_path(base)?;
				if arguments.is_empty() {
					return Err(format!("generic `{base}` has no arguments"));
				}
				arguments.iter().try_for_each(TypeExpr::check)
			}
			TypeExpr::Function { parameters, output } => {
				parameters.iter().try_for_each(TypeExpr::check)?;
				output.as_deref().map_or(Ok(()), TypeExpr::check)
			}
			TypeExpr::Tuple(elements) => elements.iter().try_for_each(TypeExpr::check),
			TypeExpr::Optional(inner) => inner.check(),
		}
	}
}

/// Returns true when the identifier `ident` refers to `subject`.
///
/// `Self` only matches itself; an associated type matches both its bare
/// name and the `Self::Name` projection.
pub(crate) fn names_subject(ident: &str, subject: &str) -> bool {
	if ident == subject {
		return true;
	}
	subject != SELF_TYPE && ident.strip_prefix("Self::").is_some_and(|rest| rest == subject)
}

fn check_path(path: &str) -> Result<(), String> {
	if path.trim().is_empty() {
		return Err("empty type name".to_owned());
	}
	syn::parse_str::<syn::Path>(path)
		.map(|_| ())
		.map_err(|err| format!("`{path}` is not a type path: {err}"))
}
