//! `#[witness]` expansion: attribute arguments, lowering, generation.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::{ItemTrait, LitStr};
use witness_codegen::{GenerationOptions, Generator, GeneratorConfig};

/// Expands to the trait followed by its witness, or the trait plus a compile error.
pub(crate) fn witness(attr: TokenStream, item: TokenStream) -> TokenStream {
	let trait_item: ItemTrait = match syn::parse2(item.clone()) {
		Ok(trait_item) => trait_item,
		Err(err) => {
			let err = syn::Error::new(err.span(), "#[witness] can only be applied to a trait").to_compile_error();
			return quote!(#item #err);
		}
	};
	match generate(attr, &trait_item) {
		Ok(generated) => quote!(#trait_item #generated),
		Err(err) => {
			let err = err.to_compile_error();
			quote!(#trait_item #err)
		}
	}
}

fn generate(attr: TokenStream, item: &ItemTrait) -> syn::Result<TokenStream> {
	let args = parse_args(attr)?;
	let schema = crate::lower::lower(item, args.options, &args.nested)?;
	let generator = Generator::new(args.config).map_err(|err| syn::Error::new(Span::call_site(), err))?;
	let generated = generator.generate(&schema).map_err(|err| syn::Error::new_spanned(&item.ident, err))?;
	Ok(quote!(#generated))
}

/// Parsed `#[witness(..)]` arguments.
#[derive(Debug, Default)]
pub(crate) struct WitnessArgs {
	pub(crate) options: GenerationOptions,
	pub(crate) config: GeneratorConfig,
	/// Associated types whose constraint gets an embedded witness.
	pub(crate) nested: Vec<Ident>,
}

/// Parses `utilities, conformance_init, nested(Format, ..), runtime = "path"`.
///
/// Bare option names go through [`GenerationOptions::from_tokens`], which
/// skips the ones it does not know.
pub(crate) fn parse_args(attr: TokenStream) -> syn::Result<WitnessArgs> {
	let mut tokens = Vec::new();
	let mut args = WitnessArgs::default();
	let parser = syn::meta::parser(|meta| {
		if meta.path.is_ident("runtime") {
			let path: LitStr = meta.value()?.parse()?;
			args.config.runtime_crate = path.value();
			return Ok(());
		}
		if meta.path.is_ident("nested") {
			return meta.parse_nested_meta(|inner| match inner.path.get_ident() {
				Some(ident) => {
					args.nested.push(ident.clone());
					Ok(())
				}
				None => Err(inner.error("expected an associated type name")),
			});
		}
		match meta.path.get_ident() {
			Some(ident) => {
				tokens.push(ident.to_string());
				Ok(())
			}
			None => Err(meta.error("expected an option name")),
		}
	});
	parser.parse2(attr)?;
	args.options = GenerationOptions::from_tokens(tokens.iter().map(String::as_str));
	Ok(args)
}
