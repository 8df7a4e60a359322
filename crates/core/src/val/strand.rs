use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A shared, immutable string value.
///
/// Cloning a `Strand` bumps a reference count instead of copying the
/// bytes, so values can be detached from their originating block and
/// passed between operators cheaply.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Strand(Arc<str>);

impl Strand {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl Deref for Strand {
	type Target = str;
	fn deref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Strand {
	fn from(s: &str) -> Self {
		Strand(Arc::from(s))
	}
}

impl From<String> for Strand {
	fn from(s: String) -> Self {
		Strand(Arc::from(s))
	}
}

impl fmt::Display for Strand {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0)
	}
}
