//! Token rendering of a [`WitnessSpec`] and its transformers.
//!
//! Everything here is infallible: the emitters have already validated every
//! identifier and type path that reaches this module.

use proc_macro2::{Ident, TokenStream};
use quote::{ToTokens, format_ident, quote};

use crate::config::GeneratorConfig;
use crate::emit::{FieldKind, FieldParam, FieldPassing, FunctionField, MemberAccess, WitnessField, WitnessSpec};
use crate::schema::{AccessLevel, SELF_TYPE, TypeExpr, names_subject};
use crate::transform::{OutputRoute, ParamRoute, Rewrite, TransformDef};
use crate::variance::{self, SubjectNames, TransformKind};

pub(crate) fn render(spec: &WitnessSpec, transforms: &[TransformDef], config: &GeneratorConfig) -> TokenStream {
	let renderer = Renderer::new(spec, config);
	let mut tokens = TokenStream::new();
	tokens.extend(renderer.definition());
	tokens.extend(renderer.clone_impl());
	tokens.extend(renderer.constructor());
	for def in transforms {
		tokens.extend(renderer.transform(def));
	}
	if spec.options.utilities {
		tokens.extend(renderer.utilities());
	}
	if spec.options.conformance_init {
		tokens.extend(renderer.conformance());
	}
	tracing::trace!(witness = %spec.struct_name, transforms = transforms.len(), "rendered witness");
	tokens
}

struct Renderer<'a> {
	spec: &'a WitnessSpec,
	config: &'a GeneratorConfig,
	name: Ident,
	vis: TokenStream,
	subject: Ident,
	target: Ident,
	associated: Vec<Ident>,
}

impl<'a> Renderer<'a> {
	fn new(spec: &'a WitnessSpec, config: &'a GeneratorConfig) -> Self {
		Self {
			spec,
			config,
			name: format_ident!("{}", spec.struct_name),
			vis: visibility(spec.access),
			subject: format_ident!("{}", spec.subject_param()),
			target: format_ident!("{}", config.target_param),
			associated: spec.associated_parameters().iter().map(|name| format_ident!("{name}")).collect(),
		}
	}

	/// Generic parameter list with `head` standing in for the subject.
	fn generics<'b>(&'b self, head: &'b Ident) -> Vec<&'b Ident> {
		std::iter::once(head).chain(&self.associated).collect()
	}

	fn definition(&self) -> TokenStream {
		let Self { name, vis, subject, .. } = self;
		let generics = self.generics(subject);
		let fields = self.spec.fields.iter().map(|field| {
			let field_name = format_ident!("{}", field.name);
			let ty = self.field_type(field, subject);
			quote!(#vis #field_name: #ty)
		});
		let doc = format!(" Witness of `{}`: each requirement as a function over `{subject}`.", self.spec.interface);
		quote! {
			#[doc = #doc]
			#[allow(clippy::type_complexity)]
			#vis struct #name<#(#generics),*> {
				#(#fields,)*
				_marker: ::core::marker::PhantomData<fn() -> (#(#generics,)*)>,
			}
		}
	}

	fn clone_impl(&self) -> TokenStream {
		let name = &self.name;
		let generics = self.generics(&self.subject);
		let fields = self.field_idents();
		quote! {
			impl<#(#generics),*> ::core::clone::Clone for #name<#(#generics),*> {
				fn clone(&self) -> Self {
					Self {
						#(#fields: ::core::clone::Clone::clone(&self.#fields),)*
						_marker: ::core::marker::PhantomData,
					}
				}
			}
		}
	}

	fn constructor(&self) -> TokenStream {
		let Self { name, vis, subject, .. } = self;
		let generics = self.generics(subject);
		let mut params = Vec::with_capacity(self.spec.fields.len());
		let mut inits = Vec::with_capacity(self.spec.fields.len());
		for field in &self.spec.fields {
			let field_name = format_ident!("{}", field.name);
			match &field.kind {
				FieldKind::Function(function) => {
					let signature = self.signature(function, subject);
					params.push(quote!(#field_name: impl #signature + ::core::marker::Send + ::core::marker::Sync + 'static));
					inits.push(quote!(#field_name: ::std::sync::Arc::new(#field_name)));
				}
				FieldKind::Nested { .. } => {
					let ty = self.field_type(field, subject);
					params.push(quote!(#field_name: #ty));
					inits.push(quote!(#field_name));
				}
			}
		}
		quote! {
			impl<#(#generics),*> #name<#(#generics),*> {
				/// Builds a witness from one value per requirement, in declaration order.
				#[allow(clippy::too_many_arguments, clippy::new_without_default)]
				#vis fn new(#(#params),*) -> Self {
					Self {
						#(#inits,)*
						_marker: ::core::marker::PhantomData,
					}
				}
			}
		}
	}

	fn transform(&self, def: &TransformDef) -> TokenStream {
		let Self { name, vis, subject, target, .. } = self;
		let source = self.generics(subject);
		let converted = self.generics(target);
		let method = format_ident!("{}", def.method_name());

		let send_sync = quote!(::core::marker::Send + ::core::marker::Sync + 'static);
		let to_fn = quote!(impl Fn(#target) -> #subject + #send_sync);
		let from_fn = quote!(impl Fn(#subject) -> #target + #send_sync);
		let (params, setup, doc) = match def.kind {
			TransformKind::Map => (
				quote!(transform: #from_fn),
				quote!(let from = ::std::sync::Arc::new(transform);),
				format!(" Moves the witness to `{target}` along a function out of `{subject}`."),
			),
			TransformKind::Pullback => (
				quote!(transform: #to_fn),
				quote!(let to = ::std::sync::Arc::new(transform);),
				format!(" Moves the witness to `{target}` along a function into `{subject}`."),
			),
			TransformKind::Iso | TransformKind::None => (
				quote!(to: #to_fn, from: #from_fn),
				quote! {
					let to = ::std::sync::Arc::new(to);
					let from = ::std::sync::Arc::new(from);
				},
				format!(" Moves the witness to `{target}` along a pair of inverse functions."),
			),
		};

		let mut bounds: Vec<TokenStream> = source.iter().map(|param| quote!(#param: 'static)).collect();
		bounds.push(quote!(#target: 'static));
		if def.clones_target {
			bounds.push(quote!(#target: ::core::clone::Clone));
		}

		let inits = self.spec.fields.iter().zip(&def.routes).map(|(field, route)| self.route_init(field, &route.rewrite));
		quote! {
			impl<#(#source),*> #name<#(#source),*> {
				#[doc = #doc]
				#[allow(unused_variables)]
				#vis fn #method<#target>(&self, #params) -> #name<#(#converted),*>
				where
					#(#bounds,)*
				{
					#setup
					#name {
						#(#inits,)*
						_marker: ::core::marker::PhantomData,
					}
				}
			}
		}
	}

	fn route_init(&self, field: &WitnessField, rewrite: &Rewrite) -> TokenStream {
		let field_name = format_ident!("{}", field.name);
		let (function, parameters, output) = match (&field.kind, rewrite) {
			(FieldKind::Function(function), Rewrite::Rebuild { parameters, output }) => (function, parameters, *output),
			(_, Rewrite::Forward) => return quote!(#field_name: ::std::sync::Arc::clone(&self.#field_name)),
			_ => return quote!(#field_name: ::core::clone::Clone::clone(&self.#field_name)),
		};

		let to = format_ident!("to");
		let from = format_ident!("from");
		let mut typed = Vec::with_capacity(parameters.len());
		let mut prelude = Vec::new();
		let mut args = Vec::with_capacity(parameters.len());
		let mut write_back = Vec::new();
		for (index, (param, route)) in function.parameters.iter().zip(parameters).enumerate() {
			let arg = format_ident!("arg{index}");
			let ty = self.param_type(param, &self.target);
			typed.push(quote!(#arg: #ty));
			match route {
				ParamRoute::Pass => args.push(quote!(#arg)),
				ParamRoute::PullBack => args.push(convert(&param.ty, quote!(#arg), &to, 0)),
				ParamRoute::Inout => {
					let local = format_ident!("subject{index}");
					prelude.push(quote!(let mut #local = to(::core::clone::Clone::clone(&*#arg));));
					args.push(quote!(&mut #local));
					write_back.push(quote!(*#arg = from(#local);));
				}
			}
		}

		let call = quote!(field(#(#args),*));
		let mapped = |value: TokenStream| match (&function.output, output) {
			(Some(ty), OutputRoute::Map) => convert(ty, value, &from, 0),
			_ => value,
		};
		let body = if write_back.is_empty() {
			let tail = mapped(call);
			quote!(#(#prelude)* #tail)
		} else if function.output.is_none() {
			quote! {
				#(#prelude)*
				#call;
				#(#write_back)*
			}
		} else {
			let tail = mapped(quote!(result));
			quote! {
				#(#prelude)*
				let result = #call;
				#(#write_back)*
				#tail
			}
		};

		let mut captures = vec![quote!(let field = ::std::sync::Arc::clone(&self.#field_name);)];
		if rewrite.needs_to() {
			captures.push(quote!(let to = ::std::sync::Arc::clone(&to);));
		}
		if rewrite.needs_from() {
			captures.push(quote!(let from = ::std::sync::Arc::clone(&from);));
		}
		quote! {
			#field_name: {
				#(#captures)*
				::std::sync::Arc::new(move |#(#typed),*| { #body })
			}
		}
	}

	fn utilities(&self) -> TokenStream {
		let Self { name, vis, subject, .. } = self;
		let generics = self.generics(subject);
		let folds = self.spec.function_fields().filter(|(_, function)| is_binary_operation(function)).map(|(field, _)| {
			let field_name = format_ident!("{field}");
			let method = format_ident!("{field}_all");
			let doc = format!(" Folds `items` into `initial` with `{field}`, left to right.");
			quote! {
				#[doc = #doc]
				#vis fn #method(&self, initial: #subject, items: impl ::core::iter::IntoIterator<Item = #subject>) -> #subject {
					items.into_iter().fold(initial, |acc, item| (self.#field_name)(acc, item))
				}
			}
		});
		let runtime = runtime_path(&self.config.runtime_crate);
		quote! {
			impl<#(#generics),*> #name<#(#generics),*> {
				#(#folds)*

				/// Stores this witness in the shared registry under its subject type.
				#vis fn register(self, label: ::core::option::Option<&str>)
				where
					Self: 'static,
				{
					#runtime::registry::register::<#subject, Self>(self, label)
				}

				/// Fetches the witness registered for the subject type under `label`.
				#vis fn registered(label: ::core::option::Option<&str>) -> ::core::option::Option<Self>
				where
					Self: 'static,
				{
					#runtime::registry::lookup::<#subject, Self>(label)
				}
			}
		}
	}

	fn conformance(&self) -> TokenStream {
		let Self { name, vis, subject, .. } = self;
		let interface = format_ident!("{}", self.spec.interface);
		let projections: Vec<TokenStream> =
			self.associated.iter().map(|assoc| quote!(<#subject as #interface>::#assoc)).collect();
		let args = self.spec.fields.iter().map(|field| match &field.kind {
			FieldKind::Nested { witness, associated_type, .. } => {
				let witness = format_ident!("{witness}");
				let assoc = format_ident!("{associated_type}");
				quote!(<#witness<<#subject as #interface>::#assoc>>::conforming())
			}
			FieldKind::Function(function) => conforming_closure(function, subject, &interface),
		});
		quote! {
			impl<#subject> #name<#subject #(, #projections)*>
			where
				#subject: #interface + 'static,
				#(#projections: 'static,)*
			{
				/// Builds the witness from the subject's own implementation of the interface.
				#vis fn conforming() -> Self {
					Self::new(#(#args),*)
				}
			}
		}
	}

	fn field_idents(&self) -> Vec<Ident> {
		self.spec.fields.iter().map(|field| format_ident!("{}", field.name)).collect()
	}

	fn field_type(&self, field: &WitnessField, subject: &Ident) -> TokenStream {
		match &field.kind {
			FieldKind::Function(function) => {
				let signature = self.signature(function, subject);
				quote!(::std::sync::Arc<dyn #signature + ::core::marker::Send + ::core::marker::Sync>)
			}
			FieldKind::Nested { witness, associated_type, .. } => {
				let witness = format_ident!("{witness}");
				let assoc = format_ident!("{associated_type}");
				quote!(#witness<#assoc>)
			}
		}
	}

	fn signature(&self, function: &FunctionField, subject: &Ident) -> TokenStream {
		let params = function.parameters.iter().map(|param| self.param_type(param, subject));
		let output = function.output.as_ref().map(|output| {
			let output = self.type_tokens(output, subject);
			quote!(-> #output)
		});
		quote!(Fn(#(#params),*) #output)
	}

	fn param_type(&self, param: &FieldParam, subject: &Ident) -> TokenStream {
		let ty = self.type_tokens(&param.ty, subject);
		match param.passing {
			FieldPassing::Inout => quote!(&mut #ty),
			FieldPassing::Owned | FieldPassing::Borrowed => ty,
		}
	}

	fn type_tokens(&self, ty: &TypeExpr, subject: &Ident) -> TokenStream {
		match ty {
			TypeExpr::Identifier(ident) => self.resolve(ident, subject),
			TypeExpr::Generic { base, arguments } => {
				let base = path_tokens(base);
				let arguments = arguments.iter().map(|argument| self.type_tokens(argument, subject));
				quote!(#base<#(#arguments),*>)
			}
			TypeExpr::Function { parameters, output } => {
				let parameters = parameters.iter().map(|parameter| self.type_tokens(parameter, subject));
				let output = output.as_deref().map(|output| {
					let output = self.type_tokens(output, subject);
					quote!(-> #output)
				});
				quote!(::std::sync::Arc<dyn Fn(#(#parameters),*) #output + ::core::marker::Send + ::core::marker::Sync>)
			}
			TypeExpr::Tuple(elements) => {
				let elements = elements.iter().map(|element| self.type_tokens(element, subject));
				quote!((#(#elements,)*))
			}
			TypeExpr::Optional(inner) => {
				let inner = self.type_tokens(inner, subject);
				quote!(::core::option::Option<#inner>)
			}
		}
	}

	fn resolve(&self, ident: &str, subject: &Ident) -> TokenStream {
		if ident == SELF_TYPE {
			return subject.to_token_stream();
		}
		match self.associated.iter().find(|assoc| names_subject(ident, &assoc.to_string())) {
			Some(assoc) => assoc.to_token_stream(),
			None => path_tokens(ident),
		}
	}
}

/// Rewrites `value` of type `ty` by applying `function` wherever `Self` sits.
///
/// Only bare, optional and tuple positions reach this point.
fn convert(ty: &TypeExpr, value: TokenStream, function: &Ident, depth: usize) -> TokenStream {
	if !variance::mentions(ty, &SubjectNames::primary()) {
		return value;
	}
	match ty {
		TypeExpr::Optional(inner) => {
			let binding = format_ident!("value{depth}");
			let inner = convert(inner, binding.to_token_stream(), function, depth + 1);
			quote!(#value.map(|#binding| #inner))
		}
		TypeExpr::Tuple(elements) => {
			let bindings: Vec<Ident> = (0..elements.len()).map(|index| format_ident!("item{depth}_{index}")).collect();
			let converted = elements
				.iter()
				.zip(&bindings)
				.map(|(element, binding)| convert(element, binding.to_token_stream(), function, depth + 1));
			quote!({
				let (#(#bindings,)*) = #value;
				(#(#converted,)*)
			})
		}
		_ => quote!(#function(#value)),
	}
}

fn conforming_closure(function: &FunctionField, subject: &Ident, interface: &Ident) -> TokenStream {
	let member = format_ident!("{}", function.requirement);
	match function.member {
		MemberAccess::Constant => quote!(|| <#subject as #interface>::#member),
		MemberAccess::Call => {
			let args: Vec<Ident> = (0..function.parameters.len()).map(|index| format_ident!("arg{index}")).collect();
			let forwarded = function.parameters.iter().zip(&args).map(|(param, arg)| match param.passing {
				FieldPassing::Borrowed => quote!(&#arg),
				FieldPassing::Owned | FieldPassing::Inout => quote!(#arg),
			});
			quote!(|#(#args),*| <#subject as #interface>::#member(#(#forwarded),*))
		}
	}
}

/// `(Self, Self) -> Self` with both operands by value or by reference.
fn is_binary_operation(function: &FunctionField) -> bool {
	let subject = |ty: &TypeExpr| ty.is_named(SELF_TYPE);
	function.parameters.len() == 2
		&& function.parameters.iter().all(|param| subject(&param.ty) && param.passing != FieldPassing::Inout)
		&& function.output.as_ref().is_some_and(subject)
}

fn visibility(access: AccessLevel) -> TokenStream {
	match access {
		AccessLevel::Public => quote!(pub),
		AccessLevel::Internal => quote!(pub(crate)),
		AccessLevel::Default | AccessLevel::Private => TokenStream::new(),
	}
}

fn path_tokens(path: &str) -> TokenStream {
	match syn::parse_str::<syn::Path>(path) {
		Ok(path) => path.to_token_stream(),
		Err(err) => err.to_compile_error(),
	}
}

/// The runtime crate as an absolute path unless it is already rooted.
fn runtime_path(runtime: &str) -> TokenStream {
	let relative = ["crate", "self", "super"].iter().any(|root| runtime == *root || runtime.starts_with(&format!("{root}::")));
	match syn::parse_str::<syn::Path>(runtime.trim_start_matches("::")) {
		Ok(mut path) => {
			if !relative {
				path.leading_colon = Some(Default::default());
			}
			path.to_token_stream()
		}
		Err(err) => err.to_compile_error(),
	}
}
