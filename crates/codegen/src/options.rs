//! Generation options attached to an interface.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A single recognized option token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum GenerationOption {
	/// Algebraic helpers for common field shapes plus registry accessors.
	#[strum(to_string = "utilities")]
	Utilities,
	/// A `conforming()` constructor wired to the interface's implementation.
	#[strum(to_string = "conformanceInit", serialize = "conformance_init")]
	ConformanceInit,
}

/// The set of options enabled for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
	#[serde(default)]
	pub utilities: bool,
	#[serde(default, alias = "conformanceInit")]
	pub conformance_init: bool,
}

impl GenerationOptions {
	/// Builds the option set from raw tokens. Unrecognized tokens are skipped.
	pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
		let mut options = Self::default();
		for token in tokens {
			match token.trim().trim_start_matches('.').parse::<GenerationOption>() {
				Ok(option) => options.enable(option),
				Err(_) => tracing::debug!(token, "ignoring unknown witness option"),
			}
		}
		options
	}

	pub fn enable(&mut self, option: GenerationOption) {
		match option {
			GenerationOption::Utilities => self.utilities = true,
			GenerationOption::ConformanceInit => self.conformance_init = true,
		}
	}

	pub fn contains(&self, option: GenerationOption) -> bool {
		match option {
			GenerationOption::Utilities => self.utilities,
			GenerationOption::ConformanceInit => self.conformance_init,
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(&["utilities"], true, false)]
	#[case(&["conformanceInit"], false, true)]
	#[case(&[".conformanceInit", "utilities"], true, true)]
	#[case(&["conformance_init"], false, true)]
	#[case(&["mystery", "  utilities "], true, false)]
	#[case(&[], false, false)]
	fn parses_option_tokens(#[case] tokens: &[&str], #[case] utilities: bool, #[case] conformance: bool) {
		let options = GenerationOptions::from_tokens(tokens.iter().copied());
		assert_eq!(options.contains(GenerationOption::Utilities), utilities);
		assert_eq!(options.contains(GenerationOption::ConformanceInit), conformance);
	}

	#[test]
	fn option_display_uses_canonical_token() {
		assert_eq!(GenerationOption::ConformanceInit.to_string(), "conformanceInit");
		assert_eq!(GenerationOption::Utilities.to_string(), "utilities");
	}

	#[test]
	fn deserializes_camel_case_alias() {
		let options: GenerationOptions = serde_json::from_str(r#"{"conformanceInit": true}"#).unwrap();
		assert!(options.conformance_init);
		assert!(!options.utilities);
	}
}
