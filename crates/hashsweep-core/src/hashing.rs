//! Hash schemes.
//!
//! [`HashScheme`] is resolved once from its name at startup. Workers then
//! build a [`PreparedHasher`], which absorbs the salt up front and compares
//! each candidate against the target without per-candidate dispatch on names.

use crate::crypt::{self, CryptSetting};
use crate::error::{HashsweepError, Result};
use crate::types::TargetDigest;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;
use std::str::FromStr;

/// Digest function applied to candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashScheme {
    /// Unsalted MD5; a salt is prepended to the candidate.
    Md5,
    /// Unsalted SHA-512; a salt is prepended to the candidate.
    Sha512,
    /// glibc SHA-512-crypt (`$6$`), keyed by an explicit salt.
    Sha512Crypt,
}

impl HashScheme {
    /// Length of the comparable output: digest bytes, or encoded field
    /// characters for the keyed scheme.
    #[must_use]
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha512 => 64,
            Self::Sha512Crypt => crypt::ENCODED_LEN,
        }
    }

    /// Canonical name as accepted on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha512 => "SHA-512",
            Self::Sha512Crypt => "shadow",
        }
    }

    /// Candidate length used for benchmark sampling.
    #[must_use]
    pub const fn benchmark_length(&self) -> usize {
        match self {
            Self::Md5 | Self::Sha512 => 4,
            Self::Sha512Crypt => 2,
        }
    }

    /// Whether the salt keys the hash rather than prefixing the input.
    #[must_use]
    pub const fn is_keyed(&self) -> bool {
        matches!(self, Self::Sha512Crypt)
    }

    /// Digest `candidate` under `salt`.
    ///
    /// For the unkeyed schemes the salt is prepended to the candidate. For
    /// the keyed scheme the result is the encoded digest field.
    #[must_use]
    pub fn digest(&self, candidate: &[u8], salt: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::new()
                .chain_update(salt)
                .chain_update(candidate)
                .finalize()
                .to_vec(),
            Self::Sha512 => Sha512::new()
                .chain_update(salt)
                .chain_update(candidate)
                .finalize()
                .to_vec(),
            Self::Sha512Crypt => {
                crypt::sha512_crypt_field(candidate, &CryptSetting::new(salt)).to_vec()
            }
        }
    }

    /// Decode an operator-supplied target for this scheme.
    ///
    /// Fixed-length schemes take hex. The keyed scheme takes either the bare
    /// encoded field or a full `$6$...` string, in which case the embedded
    /// setting is returned as well.
    pub fn parse_target(&self, input: &str) -> Result<ParsedTarget> {
        let input = input.trim();
        match self {
            Self::Md5 | Self::Sha512 => {
                let bytes = hex::decode(input).map_err(|e| {
                    HashsweepError::InvalidTarget(format!("{input:?} is not valid hex: {e}"))
                })?;
                if bytes.len() != self.digest_len() {
                    return Err(HashsweepError::InvalidTarget(format!(
                        "{} digest must be {} hex characters, got {}",
                        self.name(),
                        self.digest_len() * 2,
                        input.len()
                    )));
                }
                Ok(ParsedTarget {
                    digest: TargetDigest::Bytes(bytes),
                    setting: None,
                })
            }
            Self::Sha512Crypt => {
                let (field, setting) = if input.starts_with(crypt::PREFIX) {
                    let (setting, field) = CryptSetting::parse(input)?;
                    let field = field.ok_or_else(|| {
                        HashsweepError::InvalidTarget(format!(
                            "crypt string has no digest field: {input}"
                        ))
                    })?;
                    (field, Some(setting))
                } else {
                    (input.to_string(), None)
                };
                if field.len() != crypt::ENCODED_LEN {
                    return Err(HashsweepError::InvalidTarget(format!(
                        "shadow digest field must be {} characters, got {}",
                        crypt::ENCODED_LEN,
                        field.len()
                    )));
                }
                Ok(ParsedTarget {
                    digest: TargetDigest::Encoded(field),
                    setting,
                })
            }
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashScheme {
    type Err = HashsweepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha-512" | "sha512" => Ok(Self::Sha512),
            "shadow" | "sha512crypt" | "sha512-crypt" => Ok(Self::Sha512Crypt),
            _ => Err(HashsweepError::UnknownScheme(s.to_string())),
        }
    }
}

/// A decoded target plus any setting embedded in it.
#[derive(Debug, Clone)]
pub struct ParsedTarget {
    /// Value compared against candidate digests.
    pub digest: TargetDigest,
    /// Salt and rounds carried by a full crypt string.
    pub setting: Option<CryptSetting>,
}

#[derive(Clone)]
enum Prepared {
    Md5(Md5),
    Sha512(Sha512),
    Crypt(CryptSetting),
}

/// A hasher bound to one scheme, salt and target.
///
/// Unkeyed schemes keep a template state with the salt already absorbed and
/// clone it per candidate.
#[derive(Clone)]
pub struct PreparedHasher {
    scheme: HashScheme,
    prepared: Prepared,
    target: TargetDigest,
}

impl PreparedHasher {
    /// Bind `scheme` to `salt` and `target`.
    #[must_use]
    pub fn new(scheme: HashScheme, salt: &[u8], target: TargetDigest) -> Self {
        let prepared = match scheme {
            HashScheme::Md5 => Prepared::Md5(Md5::new().chain_update(salt)),
            HashScheme::Sha512 => Prepared::Sha512(Sha512::new().chain_update(salt)),
            HashScheme::Sha512Crypt => Prepared::Crypt(CryptSetting::new(salt)),
        };
        Self {
            scheme,
            prepared,
            target,
        }
    }

    /// Bind the keyed scheme to a full crypt setting.
    #[must_use]
    pub fn with_crypt_setting(setting: CryptSetting, target: TargetDigest) -> Self {
        Self {
            scheme: HashScheme::Sha512Crypt,
            prepared: Prepared::Crypt(setting),
            target,
        }
    }

    #[must_use]
    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    #[must_use]
    pub fn target(&self) -> &TargetDigest {
        &self.target
    }

    /// Digest of the salted candidate.
    #[must_use]
    pub fn digest(&self, candidate: &[u8]) -> Vec<u8> {
        match &self.prepared {
            Prepared::Md5(state) => state.clone().chain_update(candidate).finalize().to_vec(),
            Prepared::Sha512(state) => state.clone().chain_update(candidate).finalize().to_vec(),
            Prepared::Crypt(setting) => crypt::sha512_crypt_field(candidate, setting).to_vec(),
        }
    }

    /// Whether `candidate` hashes to the target.
    #[must_use]
    pub fn matches(&self, candidate: &[u8]) -> bool {
        let target = self.target.as_bytes();
        match &self.prepared {
            Prepared::Md5(state) => {
                state.clone().chain_update(candidate).finalize().as_slice() == target
            }
            Prepared::Sha512(state) => {
                state.clone().chain_update(candidate).finalize().as_slice() == target
            }
            Prepared::Crypt(setting) => {
                crypt::sha512_crypt_field(candidate, setting).as_slice() == target
            }
        }
    }
}

impl fmt::Debug for PreparedHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedHasher")
            .field("scheme", &self.scheme)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
