//! SHA-512-crypt (`$6$`), the glibc shadow password scheme.
//!
//! Output strings look like `$6$[rounds=N$]<salt>$<86 encoded chars>`. Only
//! the trailing encoded field carries the digest; everything before the last
//! `$` is setting metadata, so comparisons are done on the field alone.

use crate::error::{HashsweepError, Result};
use sha2::{Digest, Sha512};

/// Scheme identifier in crypt strings.
pub const PREFIX: &str = "$6$";

/// Rounds used when the setting does not specify any.
pub const DEFAULT_ROUNDS: u32 = 5_000;

/// Lower bound applied to explicit `rounds=` values.
pub const MIN_ROUNDS: u32 = 1_000;

/// Upper bound applied to explicit `rounds=` values.
pub const MAX_ROUNDS: u32 = 999_999_999;

/// Salt bytes beyond this are ignored by the algorithm.
pub const SALT_MAX_LEN: usize = 16;

/// Length of the encoded digest field.
pub const ENCODED_LEN: usize = 86;

const ROUNDS_TAG: &str = "rounds=";

const ITOA64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Byte permutation used when encoding the final digest, three bytes per
/// group of four output characters.
const ENCODE_ORDER: [(usize, usize, usize); 21] = [
    (0, 21, 42),
    (22, 43, 1),
    (44, 2, 23),
    (3, 24, 45),
    (25, 46, 4),
    (47, 5, 26),
    (6, 27, 48),
    (28, 49, 7),
    (50, 8, 29),
    (9, 30, 51),
    (31, 52, 10),
    (53, 11, 32),
    (12, 33, 54),
    (34, 55, 13),
    (56, 14, 35),
    (15, 36, 57),
    (37, 58, 16),
    (59, 17, 38),
    (18, 39, 60),
    (40, 61, 19),
    (62, 20, 41),
];

/// Salt and cost parameters of a `$6$` hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptSetting {
    salt: Vec<u8>,
    rounds: Option<u32>,
}

impl CryptSetting {
    /// Create a setting with the default round count.
    ///
    /// The salt ends at the first `$` and is truncated to [`SALT_MAX_LEN`]
    /// bytes, as the C library does.
    #[must_use]
    pub fn new(salt: &[u8]) -> Self {
        let end = salt
            .iter()
            .position(|&b| b == b'$')
            .unwrap_or(salt.len())
            .min(SALT_MAX_LEN);
        Self {
            salt: salt[..end].to_vec(),
            rounds: None,
        }
    }

    /// Use an explicit round count, clamped to the accepted range.
    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds.clamp(MIN_ROUNDS, MAX_ROUNDS));
        self
    }

    /// Parse a `$6$[rounds=N$]salt[$field]` string.
    ///
    /// Returns the setting and, if present, the encoded digest field.
    pub fn parse(s: &str) -> Result<(Self, Option<String>)> {
        let rest = s.strip_prefix(PREFIX).ok_or_else(|| {
            HashsweepError::InvalidTarget(format!("crypt string must start with {PREFIX}: {s}"))
        })?;

        let (rounds, rest) = match rest.strip_prefix(ROUNDS_TAG) {
            Some(tail) => {
                let (digits, tail) = tail.split_once('$').ok_or_else(|| {
                    HashsweepError::InvalidTarget(format!("unterminated rounds field: {s}"))
                })?;
                let rounds = digits.parse::<u32>().map_err(|e| {
                    HashsweepError::InvalidTarget(format!("bad rounds value {digits:?}: {e}"))
                })?;
                (Some(rounds), tail)
            }
            None => (None, rest),
        };

        let (salt, field) = match rest.split_once('$') {
            Some((salt, field)) => (salt, Some(field.to_string())),
            None => (rest, None),
        };

        let mut setting = Self::new(salt.as_bytes());
        if let Some(rounds) = rounds {
            setting = setting.with_rounds(rounds);
        }
        Ok((setting, field))
    }

    /// Effective salt bytes.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Effective number of rounds.
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds.unwrap_or(DEFAULT_ROUNDS)
    }

    /// Round count given with `rounds=`, if any.
    #[must_use]
    pub fn explicit_rounds(&self) -> Option<u32> {
        self.rounds
    }

    /// The setting string that precedes the encoded field, including the
    /// trailing `$`.
    #[must_use]
    pub fn prefix(&self) -> String {
        let mut out = String::from(PREFIX);
        if let Some(rounds) = self.rounds {
            out.push_str(ROUNDS_TAG);
            out.push_str(&rounds.to_string());
            out.push('$');
        }
        out.push_str(&String::from_utf8_lossy(&self.salt));
        out.push('$');
        out
    }
}

impl Default for CryptSetting {
    fn default() -> Self {
        Self::new(b"")
    }
}

/// Compute the full crypt string for `password`.
#[must_use]
pub fn sha512_crypt(password: &[u8], setting: &CryptSetting) -> String {
    let field = sha512_crypt_field(password, setting);
    let mut out = setting.prefix();
    // The field alphabet is ASCII.
    out.extend(field.iter().map(|&b| b as char));
    out
}

/// Compute only the encoded digest field for `password`.
#[must_use]
pub fn sha512_crypt_field(password: &[u8], setting: &CryptSetting) -> [u8; ENCODED_LEN] {
    encode(&sha512_crypt_raw(password, setting.salt(), setting.rounds()))
}

fn finalize(hasher: Sha512) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Feed `len` bytes of the repeated 64-byte block `block` into `hasher`.
fn update_repeated(hasher: &mut Sha512, block: &[u8; 64], len: usize) {
    let mut remaining = len;
    while remaining > 64 {
        hasher.update(block);
        remaining -= 64;
    }
    hasher.update(&block[..remaining]);
}

fn sha512_crypt_raw(password: &[u8], salt: &[u8], rounds: u32) -> [u8; 64] {
    let plen = password.len();

    let mut alt = Sha512::new();
    alt.update(password);
    alt.update(salt);
    alt.update(password);
    let alt = finalize(alt);

    let mut main = Sha512::new();
    main.update(password);
    main.update(salt);
    update_repeated(&mut main, &alt, plen);
    let mut bits = plen;
    while bits > 0 {
        if bits & 1 == 1 {
            main.update(alt);
        } else {
            main.update(password);
        }
        bits >>= 1;
    }
    let mut acc = finalize(main);

    let mut dp = Sha512::new();
    for _ in 0..plen {
        dp.update(password);
    }
    let dp = finalize(dp);
    let p_seq = repeat_to(&dp, plen);

    let mut ds = Sha512::new();
    for _ in 0..16 + usize::from(acc[0]) {
        ds.update(salt);
    }
    let ds = finalize(ds);
    let s_seq = repeat_to(&ds, salt.len());

    for round in 0..rounds {
        let mut c = Sha512::new();
        if round % 2 == 1 {
            c.update(&p_seq);
        } else {
            c.update(acc);
        }
        if round % 3 != 0 {
            c.update(&s_seq);
        }
        if round % 7 != 0 {
            c.update(&p_seq);
        }
        if round % 2 == 1 {
            c.update(acc);
        } else {
            c.update(&p_seq);
        }
        acc = finalize(c);
    }

    acc
}

fn repeat_to(block: &[u8; 64], len: usize) -> Vec<u8> {
    block.iter().copied().cycle().take(len).collect()
}

fn encode(raw: &[u8; 64]) -> [u8; ENCODED_LEN] {
    let mut out = [0u8; ENCODED_LEN];
    let mut pos = 0;
    let mut push = |b2: u8, b1: u8, b0: u8, n: usize| {
        let mut w = (u32::from(b2) << 16) | (u32::from(b1) << 8) | u32::from(b0);
        for _ in 0..n {
            out[pos] = ITOA64[(w & 0x3f) as usize];
            pos += 1;
            w >>= 6;
        }
    };
    for &(a, b, c) in &ENCODE_ORDER {
        push(raw[a], raw[b], raw[c], 4);
    }
    push(0, 0, raw[63], 2);
    out
}
