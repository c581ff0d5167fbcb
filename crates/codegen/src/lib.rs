//! Protocol witness generation.
//!
//! Turns an [`InterfaceSchema`] (a named set of requirements plus associated
//! types) into a witness: a struct generic over the subject type whose fields
//! are the requirements as plain functions. Alongside the struct the
//! generator emits a constructor, the `map` / `pullback` / `iso` transformer
//! picked by [`variance`] analysis, and optional helpers.
//!
//! # Pipeline
//!
//! - [`schema`] - plain-data model of an interface
//! - [`variance`] - where a requirement mentions the subject
//! - [`emit`] - the [`WitnessSpec`]: fields, generics, constructor
//! - [`transform`] - per-field routing of the transformer
//! - rendering - [`Generated`] turns both into a [`proc_macro2::TokenStream`]
//!
//! ```ignore
//! let schema = InterfaceSchema::new("Comparable").with_requirement(
//! 	MethodRequirement::new("compare")
//! 		.receiver(Receiver::Borrowed)
//! 		.param(Parameter::borrowed("other", TypeExpr::self_type()))
//! 		.returns(TypeExpr::ident("bool")),
//! );
//! let generated = witness_codegen::generate(&schema)?;
//! assert_eq!(generated.spec().struct_name, "ComparableWitness");
//! ```

use proc_macro2::TokenStream;
use quote::ToTokens;
use rustc_hash::FxHashSet;

pub mod config;
pub mod emit;
pub mod error;
pub mod options;
mod render;
pub mod schema;
pub mod transform;
pub mod variance;

pub use config::GeneratorConfig;
pub use emit::{FieldKind, FieldParam, FieldPassing, FunctionField, MemberAccess, WITNESS_SUFFIX, WitnessField, WitnessSpec};
pub use error::{GenerateError, Result};
pub use options::{GenerationOption, GenerationOptions};
pub use schema::{
	AccessLevel, AssociatedType, InterfaceSchema, MethodRequirement, Parameter, Passing, PropertyRequirement, Receiver,
	Requirement, SELF_TYPE, TypeExpr,
};
pub use transform::{FieldRoute, OutputRoute, ParamRoute, Rewrite, TransformDef};
pub use variance::{SubjectNames, TransformKind, Variance};

/// Runs generation with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator {
	config: GeneratorConfig,
}

impl Generator {
	/// Validates `config` and builds a generator around it.
	pub fn new(config: GeneratorConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { config })
	}

	pub fn config(&self) -> &GeneratorConfig {
		&self.config
	}

	/// Builds the witness spec of a single interface.
	pub fn emit(&self, schema: &InterfaceSchema) -> Result<WitnessSpec> {
		emit::emit(schema, &self.config)
	}

	/// Builds the transformer of an already emitted spec: zero or one definition.
	pub fn emit_transforms(&self, schema: &InterfaceSchema, spec: &WitnessSpec) -> Result<Vec<TransformDef>> {
		transform::emit_transforms(schema, spec)
	}

	/// Emits and routes one interface. Nothing is produced unless both succeed.
	pub fn generate(&self, schema: &InterfaceSchema) -> Result<Generated> {
		let spec = self.emit(schema)?;
		let transforms = self.emit_transforms(schema, &spec)?;
		Ok(Generated { spec, transforms, config: self.config.clone() })
	}

	/// Generates every interface of a unit independently.
	///
	/// Results line up with `schemas`. A failing interface does not affect
	/// the others; a name seen earlier in the unit fails as a duplicate.
	pub fn generate_unit(&self, schemas: &[InterfaceSchema]) -> Vec<Result<Generated>> {
		let mut seen = FxHashSet::default();
		schemas
			.iter()
			.map(|schema| {
				if !seen.insert(schema.name.as_str()) {
					return Err(GenerateError::Schema {
						interface: schema.name.clone(),
						requirement: None,
						reason: "interface is declared more than once in this unit".to_owned(),
					});
				}
				let result = self.generate(schema);
				if let Err(err) = &result {
					tracing::debug!(interface = %schema.name, error = %err, "witness generation failed");
				}
				result
			})
			.collect()
	}
}

/// Everything generated for one interface.
///
/// Only built by [`Generator::generate`], so the spec it renders has passed
/// validation.
#[derive(Debug, Clone)]
pub struct Generated {
	spec: WitnessSpec,
	transforms: Vec<TransformDef>,
	config: GeneratorConfig,
}

impl Generated {
	pub fn spec(&self) -> &WitnessSpec {
		&self.spec
	}

	pub fn transforms(&self) -> &[TransformDef] {
		&self.transforms
	}

	/// The witness struct and its impls as Rust tokens.
	pub fn tokens(&self) -> TokenStream {
		render::render(&self.spec, &self.transforms, &self.config)
	}
}

impl ToTokens for Generated {
	fn to_tokens(&self, tokens: &mut TokenStream) {
		tokens.extend(self.tokens());
	}
}

/// [`Generator::emit`] with the default configuration.
pub fn emit(schema: &InterfaceSchema) -> Result<WitnessSpec> {
	Generator::default().emit(schema)
}

/// [`Generator::generate`] with the default configuration.
pub fn generate(schema: &InterfaceSchema) -> Result<Generated> {
	Generator::default().generate(schema)
}
