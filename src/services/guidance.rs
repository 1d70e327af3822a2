//! Guidance token gate.
//!
//! Repositories can require writers to present a token proving they have
//! read the repository's guidance. Token issuance and verification belong
//! to the hosting layer; the store only asks a [`GuidanceTokenValidator`].

use std::path::Path;

/// Decides whether a guidance token is acceptable for a repository.
pub trait GuidanceTokenValidator: Send + Sync {
    /// Returns `true` if `token` is currently valid for `root`.
    fn validate(&self, root: &Path, token: &str) -> bool;
}

impl<F> GuidanceTokenValidator for F
where
    F: Fn(&Path, &str) -> bool + Send + Sync,
{
    fn validate(&self, root: &Path, token: &str) -> bool {
        self(root, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_validator() {
        let validator = |_: &Path, token: &str| token == "read-it";
        assert!(validator.validate(Path::new("/repo"), "read-it"));
        assert!(!GuidanceTokenValidator::validate(&validator, Path::new("/repo"), "skimmed"));
    }
}
