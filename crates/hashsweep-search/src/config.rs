//! Search configuration.

use hashsweep_core::crypt::CryptSetting;
use hashsweep_core::hashing::ParsedTarget;
use hashsweep_core::{HashScheme, HashsweepError, PreparedHasher, Result, SearchSpace, TargetDigest};

/// Immutable description of one search, shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Candidate bounds.
    pub space: SearchSpace,
    /// Digest function.
    pub scheme: HashScheme,
    /// Prefix (unkeyed schemes) or crypt salt (keyed scheme).
    pub salt: Option<Vec<u8>>,
    /// Value searched for.
    pub target: TargetDigest,
    /// Setting carried by a full crypt target string.
    pub crypt_setting: Option<CryptSetting>,
    /// Run the estimator before searching.
    pub benchmark: bool,
}

impl SearchConfig {
    /// Create a config with the default search space.
    #[must_use]
    pub fn new(scheme: HashScheme, target: ParsedTarget) -> Self {
        Self {
            space: SearchSpace::default(),
            scheme,
            salt: None,
            target: target.digest,
            crypt_setting: target.setting,
            benchmark: false,
        }
    }

    /// Decode `target` for `scheme` and create a config.
    pub fn from_target_str(scheme: HashScheme, target: &str) -> Result<Self> {
        Ok(Self::new(scheme, scheme.parse_target(target)?))
    }

    /// Set the search space.
    #[must_use]
    pub fn with_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }

    /// Set the salt.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Enable or disable the benchmark run.
    #[must_use]
    pub fn with_benchmark(mut self, benchmark: bool) -> Self {
        self.benchmark = benchmark;
        self
    }

    /// Check every invariant that must hold before workers start.
    pub fn validate(&self) -> Result<()> {
        self.space.validate()?;

        let keyed_target = matches!(self.target, TargetDigest::Encoded(_));
        if keyed_target != self.scheme.is_keyed() {
            return Err(HashsweepError::InvalidTarget(format!(
                "target encoding does not match {}",
                self.scheme
            )));
        }
        let len = self.target.as_bytes().len();
        if len != self.scheme.digest_len() {
            return Err(HashsweepError::InvalidTarget(format!(
                "{} target must be {} bytes, got {len}",
                self.scheme,
                self.scheme.digest_len()
            )));
        }
        Ok(())
    }

    /// Build the hasher a worker uses.
    ///
    /// For the keyed scheme an explicit salt overrides the one embedded in a
    /// full crypt target, while the target's round count is kept.
    #[must_use]
    pub fn hasher(&self) -> PreparedHasher {
        let salt = self.salt.as_deref().unwrap_or_default();
        if !self.scheme.is_keyed() {
            return PreparedHasher::new(self.scheme, salt, self.target.clone());
        }

        let setting = match (&self.salt, &self.crypt_setting) {
            (Some(salt), Some(embedded)) => match embedded.explicit_rounds() {
                Some(rounds) => CryptSetting::new(salt).with_rounds(rounds),
                None => CryptSetting::new(salt),
            },
            (Some(salt), None) => CryptSetting::new(salt),
            (None, Some(embedded)) => embedded.clone(),
            (None, None) => CryptSetting::default(),
        };
        PreparedHasher::with_crypt_setting(setting, self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashsweep_core::crypt;

    #[test]
    fn test_builder() {
        let config = SearchConfig::from_target_str(
            HashScheme::Md5,
            "900150983cd24fb0d6963f7d28e17f72",
        )
        .unwrap()
        .with_space(SearchSpace::new(1, 3, b'a', b'c'))
        .with_benchmark(true);

        assert!(config.validate().is_ok());
        assert!(config.benchmark);
        assert!(config.hasher().matches(b"abc"));
    }

    #[test]
    fn test_salt_prefix() {
        let target = hex::encode(HashScheme::Md5.digest(b"ab", b"pre"));
        let config = SearchConfig::from_target_str(HashScheme::Md5, &target)
            .unwrap()
            .with_salt("pre");
        assert!(config.hasher().matches(b"ab"));
    }

    #[test]
    fn test_invalid_space_rejected() {
        let config =
            SearchConfig::from_target_str(HashScheme::Md5, "900150983cd24fb0d6963f7d28e17f72")
                .unwrap()
                .with_space(SearchSpace::new(3, 2, b'a', b'c'));
        assert!(matches!(config.validate(), Err(HashsweepError::Config(_))));
    }

    #[test]
    fn test_mismatched_target_rejected() {
        let config = SearchConfig::new(
            HashScheme::Sha512,
            ParsedTarget {
                digest: TargetDigest::Bytes(vec![0; 16]),
                setting: None,
            },
        );
        assert!(matches!(
            config.validate(),
            Err(HashsweepError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_crypt_salt_resolution() {
        let setting = CryptSetting::new(b"embedded").with_rounds(1_000);
        let full = crypt::sha512_crypt(b"zz", &setting);
        let config = SearchConfig::from_target_str(HashScheme::Sha512Crypt, &full).unwrap();
        assert!(config.hasher().matches(b"zz"));

        let overridden = config.clone().with_salt("other");
        assert!(!overridden.hasher().matches(b"zz"));

        let other = CryptSetting::new(b"other").with_rounds(1_000);
        let field = crypt::sha512_crypt_field(b"zz", &other);
        let mut config = overridden;
        config.target = TargetDigest::Encoded(String::from_utf8(field.to_vec()).unwrap());
        assert!(config.hasher().matches(b"zz"));
    }
}
