//! Lowering of a `trait` item into an [`InterfaceSchema`].

use syn::{FnArg, GenericArgument, Ident, ItemTrait, Pat, PathArguments, ReturnType, Signature, TraitItem, Type, TypeParamBound, Visibility};
use witness_codegen::{
	AccessLevel, AssociatedType, GenerationOptions, InterfaceSchema, MethodRequirement, Parameter, Passing, PropertyRequirement,
	Receiver, TypeExpr,
};

/// Bounds that never name a witnessed interface.
const STD_BOUNDS: &[&str] = &["Send", "Sync", "Sized", "Unpin", "Clone", "Copy", "Debug", "Default", "PartialEq", "Eq", "PartialOrd", "Ord", "Hash"];

/// Lowers `item`. Associated types listed in `nested` embed the witness of
/// their constraint; every other bound is left to the trait itself.
pub(crate) fn lower(item: &ItemTrait, options: GenerationOptions, nested: &[Ident]) -> syn::Result<InterfaceSchema> {
	if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
		return Err(syn::Error::new_spanned(&item.generics, "witnessed traits cannot have generic parameters"));
	}
	let declared = |name: &Ident| item.items.iter().any(|trait_item| matches!(trait_item, TraitItem::Type(assoc) if assoc.ident == *name));
	if let Some(missing) = nested.iter().find(|name| !declared(*name)) {
		return Err(syn::Error::new_spanned(missing, format!("`{missing}` is not an associated type of `{}`", item.ident)));
	}

	let mut schema = InterfaceSchema::new(item.ident.to_string()).with_access(access(&item.vis)).with_options(options);
	for trait_item in &item.items {
		match trait_item {
			TraitItem::Type(assoc) => {
				if !assoc.generics.params.is_empty() {
					return Err(syn::Error::new_spanned(&assoc.generics, "generic associated types cannot be witnessed"));
				}
				let name = assoc.ident.to_string();
				if !nested.contains(&assoc.ident) {
					schema.associated_types.push(AssociatedType::new(name));
					continue;
				}
				let Some(constraint) = constraint(&assoc.bounds) else {
					return Err(syn::Error::new_spanned(
						&assoc.ident,
						format!("nested associated type `{name}` needs a bound naming a witnessed trait"),
					));
				};
				schema.associated_types.push(AssociatedType::constrained(name, constraint));
			}
			TraitItem::Const(constant) => {
				let ty = lower_type(&constant.ty)?;
				schema.requirements.push(PropertyRequirement::constant(constant.ident.to_string(), ty).into());
			}
			TraitItem::Fn(function) => schema.requirements.push(lower_fn(&function.sig)?.into()),
			other => return Err(syn::Error::new_spanned(other, "only methods, constants and associated types can be witnessed")),
		}
	}
	Ok(schema)
}

fn access(vis: &Visibility) -> AccessLevel {
	match vis {
		Visibility::Public(_) => AccessLevel::Public,
		Visibility::Restricted(_) => AccessLevel::Internal,
		Visibility::Inherited => AccessLevel::Default,
	}
}

/// The first plain trait bound outside the standard set: no generic
/// arguments, no `?` modifier.
fn constraint<'a>(bounds: impl IntoIterator<Item = &'a TypeParamBound>) -> Option<String> {
	bounds.into_iter().find_map(|bound| match bound {
		TypeParamBound::Trait(bound) if matches!(bound.modifier, syn::TraitBoundModifier::None) => {
			let last = bound.path.segments.last()?;
			let name = last.ident.to_string();
			(last.arguments.is_none() && !STD_BOUNDS.contains(&name.as_str())).then_some(name)
		}
		_ => None,
	})
}

fn lower_fn(sig: &Signature) -> syn::Result<MethodRequirement> {
	if let Some(asyncness) = &sig.asyncness {
		return Err(syn::Error::new_spanned(asyncness, "async requirements cannot be witnessed"));
	}
	if let Some(unsafety) = &sig.unsafety {
		return Err(syn::Error::new_spanned(unsafety, "unsafe requirements cannot be witnessed"));
	}

	let mut method = MethodRequirement::new(sig.ident.to_string());
	for param in &sig.generics.params {
		match param {
			syn::GenericParam::Type(param) => method = method.generic(param.ident.to_string()),
			other => return Err(syn::Error::new_spanned(other, "only type parameters are allowed on witnessed requirements")),
		}
	}

	for (index, input) in sig.inputs.iter().enumerate() {
		match input {
			FnArg::Receiver(receiver) => {
				if receiver.colon_token.is_some() {
					return Err(syn::Error::new_spanned(receiver, "typed receivers cannot be witnessed"));
				}
				method.receiver = match (&receiver.reference, &receiver.mutability) {
					(Some(_), Some(_)) => Receiver::Mutable,
					(Some(_), None) => Receiver::Borrowed,
					(None, _) => Receiver::Owned,
				};
			}
			FnArg::Typed(typed) => {
				let label = match &*typed.pat {
					Pat::Ident(pat) => pat.ident.to_string(),
					_ => format!("arg{index}"),
				};
				let (ty, passing) = lower_param(&typed.ty)?;
				method = method.param(Parameter { label, ty, passing });
			}
		}
	}

	if let ReturnType::Type(_, ty) = &sig.output {
		if let Type::Reference(reference) = &**ty {
			return Err(syn::Error::new_spanned(reference, "requirements cannot return references"));
		}
		method = method.returns(lower_type(ty)?);
	}
	Ok(method)
}

fn lower_param(ty: &Type) -> syn::Result<(TypeExpr, Passing)> {
	match ty {
		Type::Reference(reference) if reference.mutability.is_some() => {
			Err(syn::Error::new_spanned(reference, "only the receiver can be taken by `&mut`"))
		}
		Type::Reference(reference) => Ok((lower_borrowed(&reference.elem)?, Passing::Borrowed)),
		_ => Ok((lower_type(ty)?, Passing::Owned)),
	}
}

/// The owned type a witness field stores for a borrowed parameter.
fn lower_borrowed(elem: &Type) -> syn::Result<TypeExpr> {
	match elem {
		Type::Path(path) if path.qself.is_none() && path.path.is_ident("str") => Ok(TypeExpr::ident("String")),
		Type::Slice(slice) => Ok(TypeExpr::generic("Vec", [lower_type(&slice.elem)?])),
		other => lower_type(other),
	}
}

pub(crate) fn lower_type(ty: &Type) -> syn::Result<TypeExpr> {
	match ty {
		Type::Paren(inner) => lower_type(&inner.elem),
		Type::Group(inner) => lower_type(&inner.elem),
		Type::Tuple(tuple) => Ok(TypeExpr::Tuple(tuple.elems.iter().map(lower_type).collect::<syn::Result<_>>()?)),
		Type::Path(path) if path.qself.is_none() => lower_path(&path.path),
		other => Err(syn::Error::new_spanned(other, "this type cannot appear in a witnessed requirement")),
	}
}

fn lower_path(path: &syn::Path) -> syn::Result<TypeExpr> {
	let Some(last) = path.segments.last() else {
		return Err(syn::Error::new_spanned(path, "empty type path"));
	};
	if let Some(segment) = path.segments.iter().rev().skip(1).find(|segment| !segment.arguments.is_none()) {
		return Err(syn::Error::new_spanned(segment, "generic arguments are only supported on the last path segment"));
	}

	let mut base = path.segments.iter().map(|segment| segment.ident.to_string()).collect::<Vec<_>>().join("::");
	if path.leading_colon.is_some() {
		base.insert_str(0, "::");
	}

	match &last.arguments {
		PathArguments::None => Ok(TypeExpr::Identifier(base)),
		PathArguments::AngleBracketed(args) => {
			let arguments = args
				.args
				.iter()
				.map(|arg| match arg {
					GenericArgument::Type(ty) => lower_type(ty),
					other => Err(syn::Error::new_spanned(other, "only type arguments can appear in a witnessed requirement")),
				})
				.collect::<syn::Result<Vec<_>>>()?;
			match <[TypeExpr; 1]>::try_from(arguments) {
				Ok([inner]) if is_option(&base) => Ok(TypeExpr::optional(inner)),
				Ok(arguments) => Ok(TypeExpr::generic(base, arguments)),
				Err(arguments) => Ok(TypeExpr::generic(base, arguments)),
			}
		}
		PathArguments::Parenthesized(args) => Err(syn::Error::new_spanned(args, "closure traits cannot appear in a witnessed requirement")),
	}
}

fn is_option(base: &str) -> bool {
	matches!(base.trim_start_matches("::"), "Option" | "std::option::Option" | "core::option::Option")
}

#[cfg(test)]
mod tests;
