//! Generator configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};

/// Knobs shared by every interface in a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
	/// Generic parameter standing for the subject type in generated witnesses.
	pub subject_param: String,
	/// Generic parameter of the target witness in `map`/`pullback`/`iso`.
	pub target_param: String,
	/// Crate path the generated registry helpers call into.
	pub runtime_crate: String,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			subject_param: "A".to_owned(),
			target_param: "B".to_owned(),
			runtime_crate: "witness".to_owned(),
		}
	}
}

impl GeneratorConfig {
	pub fn validate(&self) -> Result<()> {
		for (what, ident) in [("subject_param", &self.subject_param), ("target_param", &self.target_param)] {
			if syn::parse_str::<syn::Ident>(ident).is_err() {
				return Err(GenerateError::Config(format!("{what} `{ident}` is not an identifier")));
			}
		}
		if self.subject_param == self.target_param {
			return Err(GenerateError::Config(format!(
				"subject and target parameters are both `{}`",
				self.subject_param
			)));
		}
		let runtime = self.runtime_crate.trim_start_matches("::");
		if syn::parse_str::<syn::Path>(runtime).is_err() {
			return Err(GenerateError::Config(format!("runtime_crate `{}` is not a path", self.runtime_crate)));
		}
		Ok(())
	}
}
