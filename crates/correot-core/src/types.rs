//! Core types for the correlated OT setup

use crate::{Error, SetupParams};
use serde::{Deserialize, Serialize};
use subtle::Choice;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identifier of one of the two parties
pub type PartyId = usize;

/// Unique identifier for a session
pub type SessionId = [u8; 32];

/// A base OT output seed
pub type Key = [u8; 32];

/// Bit `index` of `delta`: byte `index / 8`, least significant bit first.
///
/// `index` must be below `8 * delta.len()`.
pub(crate) fn delta_bit(delta: &[u8], index: usize) -> Choice {
    Choice::from((delta[index >> 3] >> (index & 0b111)) & 1)
}

/// Sender output: Delta and one seed per base OT.
///
/// `k_delta[i]` equals `k_1[i]` of the peer when bit `i` of Delta is set and
/// `k_0[i]` otherwise. Entries are `None` when the peer sent a short round
/// message and the index was never completed.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CorreOtSendSetup {
    delta: Vec<u8>,
    k_delta: Vec<Option<Key>>,
}

impl CorreOtSendSetup {
    pub(crate) fn new(delta: Vec<u8>, k_delta: Vec<Option<Key>>) -> Self {
        Self { delta, k_delta }
    }

    /// The correlation string Delta (κ/8 bytes)
    pub fn delta(&self) -> &[u8] {
        &self.delta
    }

    /// Bit `index` of Delta, `None` past the end of Delta
    pub fn delta_bit(&self, index: usize) -> Option<bool> {
        (index < self.delta.len() * 8).then(|| delta_bit(&self.delta, index).into())
    }

    /// Per-index seeds selected by Delta
    pub fn k_delta(&self) -> &[Option<Key>] {
        &self.k_delta
    }

    /// Whether every index produced a seed
    pub fn is_complete(&self) -> bool {
        self.k_delta.iter().all(Option::is_some)
    }

    /// Check the correlation invariant against the peer's output
    pub fn is_correlated_with(&self, receive: &CorreOtReceiveSetup) -> bool {
        if self.k_delta.len() != receive.k_0.len() || self.k_delta.len() != receive.k_1.len() {
            return false;
        }
        if self.delta.len() * 8 < self.k_delta.len() {
            return false;
        }

        self.k_delta.iter().enumerate().all(|(i, k)| {
            let expected = if bool::from(delta_bit(&self.delta, i)) {
                &receive.k_1[i]
            } else {
                &receive.k_0[i]
            };
            k.is_some() && k == expected
        })
    }
}

/// Receiver output: both seeds of every base OT
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CorreOtReceiveSetup {
    k_0: Vec<Option<Key>>,
    k_1: Vec<Option<Key>>,
}

impl CorreOtReceiveSetup {
    pub(crate) fn new(k_0: Vec<Option<Key>>, k_1: Vec<Option<Key>>) -> Self {
        Self { k_0, k_1 }
    }

    /// Seeds for choice bit 0
    pub fn k_0(&self) -> &[Option<Key>] {
        &self.k_0
    }

    /// Seeds for choice bit 1
    pub fn k_1(&self) -> &[Option<Key>] {
        &self.k_1
    }

    /// Whether every index produced both seeds
    pub fn is_complete(&self) -> bool {
        self.k_0.iter().chain(&self.k_1).all(Option::is_some)
    }
}

/// Pad a prefix of completed keys to κ entries, leaving the rest unset
pub(crate) fn pad_keys(keys: impl IntoIterator<Item = Key>, sec_param: usize) -> Vec<Option<Key>> {
    keys.into_iter()
        .map(Some)
        .chain(std::iter::repeat(None))
        .take(sec_param)
        .collect()
}

/// Configuration for a relayed setup session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session identifier, also the root of the domain hash
    pub session_id: SessionId,

    /// This party's ID
    pub party_id: PartyId,

    /// The other party's ID
    pub peer_id: PartyId,

    /// Setup parameters shared by both parties
    pub params: SetupParams,
}

impl SessionConfig {
    /// Create a new session configuration with a fresh session id
    pub fn new(party_id: PartyId, peer_id: PartyId, params: SetupParams) -> crate::Result<Self> {
        Self::with_session_id(rand::random(), party_id, peer_id, params)
    }

    /// Create a session configuration for an agreed session id
    pub fn with_session_id(
        session_id: SessionId,
        party_id: PartyId,
        peer_id: PartyId,
        params: SetupParams,
    ) -> crate::Result<Self> {
        if party_id == peer_id {
            return Err(Error::InvalidConfig(
                "Party and peer IDs must differ".into(),
            ));
        }

        Ok(Self {
            session_id,
            party_id,
            peer_id,
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_bit_order() {
        let delta = [0b0000_0101u8, 0b1000_0000];
        let bits: Vec<bool> = (0..16).map(|i| delta_bit(&delta, i).into()).collect();
        let set: Vec<usize> = bits
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.then_some(i))
            .collect();
        assert_eq!(set, vec![0, 2, 15]);
    }

    #[test]
    fn test_pad_keys() {
        let keys = pad_keys([[1u8; 32], [2u8; 32]], 4);
        assert_eq!(keys, vec![Some([1u8; 32]), Some([2u8; 32]), None, None]);
    }

    #[test]
    fn test_correlation_check() {
        let delta = vec![0b0000_0010u8];
        let k_0 = pad_keys((0..8u8).map(|i| [i; 32]), 8);
        let k_1 = pad_keys((0..8u8).map(|i| [i + 100; 32]), 8);
        let k_delta = (0..8u8)
            .map(|i| Some(if i == 1 { [i + 100; 32] } else { [i; 32] }))
            .collect();

        let send = CorreOtSendSetup::new(delta, k_delta);
        let receive = CorreOtReceiveSetup::new(k_0.clone(), k_1.clone());
        assert!(send.is_complete());
        assert!(receive.is_complete());
        assert!(send.is_correlated_with(&receive));

        let swapped = CorreOtReceiveSetup::new(k_1, k_0);
        assert!(!send.is_correlated_with(&swapped));
    }

    #[test]
    fn test_delta_bit_out_of_range() {
        let send = CorreOtSendSetup::new(vec![0b0000_0001], vec![None; 8]);
        assert_eq!(send.delta_bit(0), Some(true));
        assert_eq!(send.delta_bit(7), Some(false));
        assert_eq!(send.delta_bit(8), None);
    }

    #[test]
    fn test_short_delta_is_not_correlated() {
        let k_delta: Vec<Option<Key>> = (0..9u8).map(|i| Some([i; 32])).collect();
        let json = serde_json::json!({ "delta": [0], "k_delta": k_delta }).to_string();
        let send: CorreOtSendSetup = serde_json::from_str(&json).unwrap();
        let receive = CorreOtReceiveSetup::new(k_delta.clone(), k_delta);

        assert_eq!(send.k_delta().len(), 9);
        assert!(!send.is_correlated_with(&receive));
    }

    #[test]
    fn test_session_config_rejects_self_peer() {
        assert!(matches!(
            SessionConfig::new(0, 0, SetupParams::default()),
            Err(Error::InvalidConfig(_))
        ));
        assert!(SessionConfig::new(0, 1, SetupParams::default()).is_ok());
    }
}
