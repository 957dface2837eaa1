use thiserror::Error;

/// Error type of lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Failure of a render pass.
///
/// The core defines no recoverable errors of its own. A failure aborts the pass at the point where it occurred,
/// so the host tree may no longer match the recorded one.
#[derive(Debug, Error)]
pub enum Error<E: std::error::Error + 'static> {
	/// A host operation failed. The host's error is passed through unmodified.
	#[error("host operation failed")]
	Host(#[from] E),

	#[error("`{hook}` hook of component `{component}` failed")]
	Lifecycle {
		component: &'static str,
		hook: &'static str,
		#[source]
		source: BoxError,
	},
}
