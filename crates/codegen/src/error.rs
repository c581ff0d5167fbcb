//! Error types for witness generation.

use thiserror::Error;

/// A failure generating the witness for a single interface.
///
/// Generation is all-or-nothing per interface: one failing requirement
/// aborts that interface and leaves every other schema untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
	/// The schema is malformed: an unwalkable type, a bad identifier or a name clash.
	#[error("interface `{interface}`{}: {reason}", requirement.as_ref().map(|r| format!(", requirement `{r}`")).unwrap_or_default())]
	Schema {
		interface: String,
		requirement: Option<String>,
		reason: String,
	},

	/// The requirement is well formed but has a shape the emitter has no rule for.
	#[error("interface `{interface}`, requirement `{requirement}` is not supported: {reason}")]
	UnsupportedRequirement {
		interface: String,
		requirement: String,
		reason: String,
	},

	/// The generator configuration itself is invalid.
	#[error("invalid generator configuration: {0}")]
	Config(String),
}

impl GenerateError {
	pub(crate) fn schema(interface: &str, requirement: Option<&str>, reason: impl Into<String>) -> Self {
		GenerateError::Schema {
			interface: interface.to_owned(),
			requirement: requirement.map(str::to_owned),
			reason: reason.into(),
		}
	}

	pub(crate) fn unsupported(interface: &str, requirement: &str, reason: impl Into<String>) -> Self {
		GenerateError::UnsupportedRequirement {
			interface: interface.to_owned(),
			requirement: requirement.to_owned(),
			reason: reason.into(),
		}
	}

	/// Name of the interface whose generation failed, if any.
	pub fn interface(&self) -> Option<&str> {
		match self {
			GenerateError::Schema { interface, .. } | GenerateError::UnsupportedRequirement { interface, .. } => Some(interface),
			GenerateError::Config(_) => None,
		}
	}

	/// Name of the offending requirement, if the failure is tied to one.
	pub fn requirement(&self) -> Option<&str> {
		match self {
			GenerateError::Schema { requirement, .. } => requirement.as_deref(),
			GenerateError::UnsupportedRequirement { requirement, .. } => Some(requirement),
			GenerateError::Config(_) => None,
		}
	}
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerateError>;
