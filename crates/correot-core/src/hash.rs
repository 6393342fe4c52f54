//! Domain-separated hashing
//!
//! A [`DomainHash`] wraps a `merlin` transcript. Forking clones the transcript
//! and absorbs a domain label plus bytes, so sub-contexts derived from one root
//! with different labels or counters are independent, while both parties
//! deriving the same fork end up with identical contexts.

use k256::{
    elliptic_curve::{bigint::U256, ops::Reduce},
    Scalar,
};
use merlin::Transcript;

/// Domain label binding each base OT to its index
pub const RANDOM_OT_COUNTER_DOMAIN: &str = "CorreOT Random OT Counter";

const ROOT_LABEL: &[u8] = b"CorreOT Setup";

/// Hash context supporting domain-separated forks
#[derive(Clone)]
pub struct DomainHash {
    transcript: Transcript,
}

impl DomainHash {
    /// Create a root context bound to a session
    pub fn new(session_id: &[u8]) -> Self {
        let mut transcript = Transcript::new(ROOT_LABEL);
        transcript.append_message(b"session-id", session_id);
        Self { transcript }
    }

    /// Derive an independent sub-context. The parent is left untouched.
    pub fn fork(&self, domain: &str, bytes: &[u8]) -> Self {
        let mut transcript = self.transcript.clone();
        transcript.append_message(b"domain", domain.as_bytes());
        transcript.append_message(b"bytes", bytes);
        Self { transcript }
    }

    /// Hash `parts` under `label` into 32 bytes.
    ///
    /// Works on a copy of the context: the result depends only on the fork
    /// path and the inputs, never on how many digests were taken before.
    pub fn digest(&self, label: &'static [u8], parts: &[&[u8]]) -> [u8; 32] {
        let mut transcript = self.transcript.clone();
        for part in parts {
            transcript.append_message(label, part);
        }
        let mut out = [0u8; 32];
        transcript.challenge_bytes(b"digest", &mut out);
        out
    }

    /// Hash `parts` under `label` to a secp256k1 scalar
    pub fn challenge_scalar(&self, label: &'static [u8], parts: &[&[u8]]) -> Scalar {
        let bytes = self.digest(label, parts);
        <Scalar as Reduce<U256>>::reduce_bytes(&bytes.into())
    }
}

/// Sub-context for base OT instance `index`.
///
/// The counter is the 8-byte big-endian encoding of the index. Sender and
/// receiver call this independently and must obtain identical contexts.
pub fn index_hash(root: &DomainHash, index: usize) -> DomainHash {
    root.fork(RANDOM_OT_COUNTER_DOMAIN, &(index as u64).to_be_bytes())
}
