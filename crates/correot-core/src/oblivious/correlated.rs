//! Correlated OT setup
//!
//! Runs κ independent base random OTs with roles reversed: the correlated OT
//! sender plays the base OT receiver with the bits of a secret Delta as its
//! choices, and the correlated OT receiver plays the base OT sender and
//! learns both seeds of every instance.
//!
//! Message flow:
//!
//! ```text
//! receiver.round1()            -> CorreOtSetupReceiveRound1Message
//! sender.round1(msg)           -> CorreOtSetupSendRound1Message
//! receiver.round2(msg)         -> CorreOtSetupReceiveRound2Message
//! sender.round2(msg)           -> CorreOtSetupSendRound2Message
//! receiver.round3(msg)         -> CorreOtSetupReceiveRound3Message, CorreOtReceiveSetup
//! sender.round3(msg)           -> CorreOtSendSetup
//! ```
//!
//! Instance `i` on both sides is bound to `index_hash(root, i)`. Each round
//! consumes the party object, so a failed or finished party cannot be reused.

use super::{
    fan_out, fan_out_zip,
    messages::*,
    random_ot::{
        self, Group, RandomOtReceiveSetup, RandomOtReceiver, RandomOtSendSetup, RandomOtSender,
    },
};
use crate::{
    hash::{index_hash, DomainHash},
    types::{delta_bit, pad_keys},
    CorreOtReceiveSetup, CorreOtSendSetup, Error, Result, SetupParams,
};
use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

/// Party states
pub mod state {
    use super::random_ot;
    use crate::oblivious::{RandomOtReceiver, RandomOtSender};
    use zeroize::Zeroizing;

    /// Constructed, no message exchanged yet
    pub struct Fresh;

    /// Sender after round 1
    pub struct Round1Done {
        pub(super) delta: Zeroizing<Vec<u8>>,
        pub(super) receivers: Vec<RandomOtReceiver<random_ot::state::Chosen>>,
    }

    /// Sender after round 2
    pub struct Round2Done {
        pub(super) delta: Zeroizing<Vec<u8>>,
        pub(super) receivers: Vec<RandomOtReceiver<random_ot::state::Responded>>,
    }

    /// Receiver after round 1
    pub struct Round1Sent {
        pub(super) senders: Vec<RandomOtSender>,
    }

    /// Receiver after round 2
    pub struct Challenged {
        pub(super) senders: Vec<RandomOtSender<random_ot::state::Challenged>>,
    }
}

/// Correlated OT setup sender: ends up with Delta and `K_Delta`
pub struct CorreOtSetupSender<S = state::Fresh> {
    hash: DomainHash,
    params: SetupParams,
    state: S,
}

impl CorreOtSetupSender {
    /// Create a sender bound to the shared root hash
    pub fn new(hash: DomainHash, params: SetupParams) -> Self {
        Self {
            hash,
            params,
            state: state::Fresh,
        }
    }

    /// Verify the base OT setup, sample Delta and start every base OT.
    pub fn round1<R: RngCore + CryptoRng>(
        self,
        msg: &CorreOtSetupReceiveRound1Message,
        rng: &mut R,
    ) -> Result<(CorreOtSetupSender<state::Round1Done>, CorreOtSetupSendRound1Message)> {
        let setup =
            RandomOtReceiveSetup::receive(&self.hash, &msg.setup).map_err(Error::SetupVerification)?;

        let mut delta = Zeroizing::new(vec![0u8; self.params.sec_bytes()]);
        rng.fill_bytes(&mut delta);

        let receivers: Vec<RandomOtReceiver> = (0..self.params.sec_param())
            .map(|i| {
                let mut seed = [0u8; 32];
                rng.fill_bytes(&mut seed);
                RandomOtReceiver::new(
                    index_hash(&self.hash, i),
                    delta_bit(&delta, i),
                    setup.clone(),
                    seed,
                )
            })
            .collect();

        let (receivers, msgs): (Vec<_>, Vec<_>) =
            fan_out(receivers, |receiver| receiver.round1())?.into_iter().unzip();

        debug!(sec_param = self.params.sec_param(), "CorreOT sender round 1 complete");

        Ok((
            CorreOtSetupSender {
                hash: self.hash,
                params: self.params,
                state: state::Round1Done { delta, receivers },
            },
            CorreOtSetupSendRound1Message { msgs },
        ))
    }
}

impl CorreOtSetupSender<state::Round1Done> {
    /// Answer the per-index challenges.
    ///
    /// Only fails when strict length checking is enabled.
    pub fn round2(
        self,
        msg: &CorreOtSetupReceiveRound2Message,
    ) -> Result<(CorreOtSetupSender<state::Round2Done>, CorreOtSetupSendRound2Message)> {
        let count = self.params.entries_to_process(msg.len())?;
        let state::Round1Done { delta, receivers } = self.state;

        let (receivers, msgs): (Vec<_>, Vec<_>) =
            fan_out_zip(receivers, &msg.msgs[..count], |receiver, m| Ok(receiver.round2(m)))?
                .into_iter()
                .unzip();

        debug!(entries = msgs.len(), "CorreOT sender round 2 complete");

        Ok((
            CorreOtSetupSender {
                hash: self.hash,
                params: self.params,
                state: state::Round2Done { delta, receivers },
            },
            CorreOtSetupSendRound2Message { msgs },
        ))
    }
}

impl CorreOtSetupSender<state::Round2Done> {
    /// Verify the openings and output Delta with `K_Delta`
    pub fn round3(self, msg: &CorreOtSetupReceiveRound3Message) -> Result<CorreOtSendSetup> {
        let count = self.params.entries_to_process(msg.len())?;
        let state::Round2Done { delta, receivers } = self.state;

        let keys = fan_out_zip(receivers, &msg.msgs[..count], |receiver, m| receiver.round3(m))?;

        debug!(entries = keys.len(), "CorreOT sender round 3 complete");

        Ok(CorreOtSendSetup::new(
            delta.to_vec(),
            pad_keys(keys, self.params.sec_param()),
        ))
    }
}

/// Correlated OT setup receiver: ends up with `K_0` and `K_1`
pub struct CorreOtSetupReceiver<S = state::Fresh> {
    hash: DomainHash,
    group: Group,
    params: SetupParams,
    state: S,
}

impl CorreOtSetupReceiver {
    /// Create a receiver bound to the shared root hash
    pub fn new(hash: DomainHash, group: Group, params: SetupParams) -> Self {
        Self {
            hash,
            group,
            params,
            state: state::Fresh,
        }
    }

    /// Generate the base OT setup and one base OT sender per index
    pub fn round1<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> (CorreOtSetupReceiver<state::Round1Sent>, CorreOtSetupReceiveRound1Message) {
        let (setup_msg, setup) = RandomOtSendSetup::new(&self.hash, self.group, rng);

        let senders: Vec<RandomOtSender> = (0..self.params.sec_param())
            .map(|i| RandomOtSender::new(index_hash(&self.hash, i), setup.clone()))
            .collect();

        debug!(sec_param = self.params.sec_param(), "CorreOT receiver round 1 complete");

        (
            CorreOtSetupReceiver {
                hash: self.hash,
                group: self.group,
                params: self.params,
                state: state::Round1Sent { senders },
            },
            CorreOtSetupReceiveRound1Message { setup: setup_msg },
        )
    }
}

impl CorreOtSetupReceiver<state::Round1Sent> {
    /// Derive both seeds per index and issue the challenges
    pub fn round2(
        self,
        msg: &CorreOtSetupSendRound1Message,
    ) -> Result<(CorreOtSetupReceiver<state::Challenged>, CorreOtSetupReceiveRound2Message)> {
        let count = self.params.entries_to_process(msg.len())?;
        let state::Round1Sent { senders } = self.state;

        let (senders, msgs): (Vec<_>, Vec<_>) =
            fan_out_zip(senders, &msg.msgs[..count], |sender, m| sender.round1(m))?
                .into_iter()
                .unzip();

        debug!(entries = msgs.len(), "CorreOT receiver round 2 complete");

        Ok((
            CorreOtSetupReceiver {
                hash: self.hash,
                group: self.group,
                params: self.params,
                state: state::Challenged { senders },
            },
            CorreOtSetupReceiveRound2Message { msgs },
        ))
    }
}

impl CorreOtSetupReceiver<state::Challenged> {
    /// Check the responses, open the pads and output `K_0`, `K_1`
    pub fn round3(
        self,
        msg: &CorreOtSetupSendRound2Message,
    ) -> Result<(CorreOtSetupReceiveRound3Message, CorreOtReceiveSetup)> {
        let count = self.params.entries_to_process(msg.len())?;
        let state::Challenged { senders } = self.state;

        let results = fan_out_zip(senders, &msg.msgs[..count], |sender, m| sender.round2(m))?;

        let mut msgs = Vec::with_capacity(results.len());
        let mut k_0 = Vec::with_capacity(results.len());
        let mut k_1 = Vec::with_capacity(results.len());
        for (m, result) in results {
            msgs.push(m);
            k_0.push(result.rand0);
            k_1.push(result.rand1);
        }

        debug!(entries = msgs.len(), "CorreOT receiver round 3 complete");

        let sec_param = self.params.sec_param();
        Ok((
            CorreOtSetupReceiveRound3Message { msgs },
            CorreOtReceiveSetup::new(pad_keys(k_0, sec_param), pad_keys(k_1, sec_param)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::RANDOM_OT_COUNTER_DOMAIN;
    use rand::rngs::OsRng;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use std::collections::HashSet;

    struct Handshake {
        sender: CorreOtSetupSender<state::Round2Done>,
        receiver_out: CorreOtReceiveSetup,
        msg3: CorreOtSetupReceiveRound3Message,
    }

    fn run_to_round3(params: SetupParams) -> Handshake {
        let root = DomainHash::new(b"correlated test");
        let sender = CorreOtSetupSender::new(root.clone(), params);
        let receiver = CorreOtSetupReceiver::new(root, Group::Secp256k1, params);

        let (receiver, r1) = receiver.round1(&mut OsRng);
        let (sender, s1) = sender.round1(&r1, &mut OsRng).unwrap();
        let (receiver, r2) = receiver.round2(&s1).unwrap();
        let (sender, s2) = sender.round2(&r2).unwrap();
        let (msg3, receiver_out) = receiver.round3(&s2).unwrap();

        Handshake {
            sender,
            receiver_out,
            msg3,
        }
    }

    fn run_setup(params: SetupParams) -> (CorreOtSendSetup, CorreOtReceiveSetup) {
        let handshake = run_to_round3(params);
        let send_out = handshake.sender.round3(&handshake.msg3).unwrap();
        (send_out, handshake.receiver_out)
    }

    #[test]
    fn test_end_to_end_correlation() {
        let params = SetupParams::new(128).unwrap();
        let (send_out, receive_out) = run_setup(params);

        assert_eq!(send_out.delta().len(), 16);
        assert_eq!(send_out.k_delta().len(), 128);
        assert!(send_out.is_complete());
        assert!(receive_out.is_complete());

        for i in 0..128 {
            let expected = if send_out.delta_bit(i) == Some(true) {
                receive_out.k_1()[i]
            } else {
                receive_out.k_0()[i]
            };
            assert_eq!(send_out.k_delta()[i], expected, "index {}", i);
            assert_ne!(receive_out.k_0()[i], receive_out.k_1()[i]);
        }
        assert!(send_out.is_correlated_with(&receive_out));
    }

    #[test]
    fn test_runs_are_fresh() {
        let params = SetupParams::new(32).unwrap();
        let mut deltas = HashSet::new();
        let mut keys = HashSet::new();

        for _ in 0..8 {
            let (send_out, receive_out) = run_setup(params);
            assert!(send_out.is_correlated_with(&receive_out));
            assert!(deltas.insert(send_out.delta().to_vec()));
            for key in receive_out.k_0().iter().chain(receive_out.k_1()) {
                assert!(keys.insert(key.unwrap()));
            }
        }
    }

    #[test]
    fn test_same_seed_reproduces_delta() {
        let params = SetupParams::new(16).unwrap();
        let root = DomainHash::new(b"seeded");
        let (_, r1) =
            CorreOtSetupReceiver::new(root.clone(), Group::Secp256k1, params).round1(&mut OsRng);

        let run = |seed: u64| {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let (sender, s1) = CorreOtSetupSender::new(root.clone(), params)
                .round1(&r1, &mut rng)
                .unwrap();
            (sender.state.delta.to_vec(), s1.msgs[0].encoded_choice.clone())
        };

        assert_eq!(run(1), run(1));
        assert_ne!(run(1).0, run(2).0);
    }

    #[test]
    fn test_index_independence() {
        // Altering the fork of one index changes only that index's seeds.
        let root = DomainHash::new(b"independence");
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let (setup_msg, send_setup) = RandomOtSendSetup::new(&root, Group::Secp256k1, &mut rng);
        let receive_setup = RandomOtReceiveSetup::receive(&root, &setup_msg).unwrap();

        let choices: Vec<_> = (0..8)
            .map(|i| {
                let receiver = RandomOtReceiver::new(
                    index_hash(&root, i),
                    subtle::Choice::from(0),
                    receive_setup.clone(),
                    [i as u8; 32],
                );
                receiver.round1().unwrap().1
            })
            .collect();

        let derive = |altered: Option<usize>| -> Vec<[u8; 32]> {
            (0..8)
                .map(|i| {
                    let hash = if altered == Some(i) {
                        root.fork("Altered Counter", &(i as u64).to_be_bytes())
                    } else {
                        root.fork(RANDOM_OT_COUNTER_DOMAIN, &(i as u64).to_be_bytes())
                    };
                    let sender = RandomOtSender::new(hash, send_setup.clone());
                    sender.round1(&choices[i]).unwrap().1.challenge
                })
                .collect()
        };

        let baseline = derive(None);
        let altered = derive(Some(3));
        for i in 0..8 {
            if i == 3 {
                assert_ne!(baseline[i], altered[i]);
            } else {
                assert_eq!(baseline[i], altered[i]);
            }
        }
    }

    #[test]
    fn test_truncated_round3_populates_prefix() {
        let params = SetupParams::new(64).unwrap();
        let mut handshake = run_to_round3(params);
        handshake.msg3.msgs.truncate(40);

        let send_out = handshake.sender.round3(&handshake.msg3).unwrap();
        assert_eq!(send_out.k_delta().len(), 64);
        assert!(!send_out.is_complete());
        for (i, k) in send_out.k_delta().iter().enumerate() {
            assert_eq!(k.is_some(), i < 40, "index {}", i);
            if let Some(k) = k {
                let expected = if send_out.delta_bit(i) == Some(true) {
                    handshake.receiver_out.k_1()[i]
                } else {
                    handshake.receiver_out.k_0()[i]
                };
                assert_eq!(Some(*k), expected);
            }
        }
    }

    #[test]
    fn test_truncated_round2_populates_prefix() {
        let params = SetupParams::new(64).unwrap();
        let root = DomainHash::new(b"truncate");
        let sender = CorreOtSetupSender::new(root.clone(), params);
        let receiver = CorreOtSetupReceiver::new(root, Group::Secp256k1, params);

        let (receiver, r1) = receiver.round1(&mut OsRng);
        let (sender, s1) = sender.round1(&r1, &mut OsRng).unwrap();
        let (receiver, mut r2) = receiver.round2(&s1).unwrap();
        r2.msgs.truncate(24);
        let (sender, s2) = sender.round2(&r2).unwrap();
        assert_eq!(s2.len(), 24);

        let (r3, receive_out) = receiver.round3(&s2).unwrap();
        assert_eq!(r3.len(), 24);
        let send_out = sender.round3(&r3).unwrap();

        for i in 0..64 {
            assert_eq!(receive_out.k_0()[i].is_some(), i < 24);
            assert_eq!(receive_out.k_1()[i].is_some(), i < 24);
            assert_eq!(send_out.k_delta()[i].is_some(), i < 24);
        }
    }

    #[test]
    fn test_strict_length_rejects_short_message() {
        let params = SetupParams::new(64).unwrap().with_strict_length(true);
        let mut handshake = run_to_round3(params);
        handshake.msg3.msgs.truncate(63);

        assert!(matches!(
            handshake.sender.round3(&handshake.msg3),
            Err(Error::LengthMismatch {
                expected: 64,
                actual: 63
            })
        ));
    }

    #[test]
    fn test_sender_round3_fails_on_single_bad_index() {
        let params = SetupParams::new(32).unwrap();
        let mut handshake = run_to_round3(params);
        handshake.msg3.msgs[9].hash_rand0[0] ^= 1;
        handshake.msg3.msgs[9].hash_rand1[0] ^= 1;

        assert!(matches!(
            handshake.sender.round3(&handshake.msg3),
            Err(Error::IndexProtocol { index: 9, .. })
        ));
    }

    #[test]
    fn test_receiver_round3_fails_on_single_bad_index() {
        let params = SetupParams::new(32).unwrap();
        let root = DomainHash::new(b"cheating sender");
        let sender = CorreOtSetupSender::new(root.clone(), params);
        let receiver = CorreOtSetupReceiver::new(root, Group::Secp256k1, params);

        let (receiver, r1) = receiver.round1(&mut OsRng);
        let (sender, s1) = sender.round1(&r1, &mut OsRng).unwrap();
        let (receiver, r2) = receiver.round2(&s1).unwrap();
        let (_, mut s2) = sender.round2(&r2).unwrap();
        s2.msgs[30].response[31] ^= 0x40;

        assert!(matches!(
            receiver.round3(&s2),
            Err(Error::IndexProtocol { index: 30, .. })
        ));
    }

    #[test]
    fn test_sender_rejects_bad_setup() {
        let params = SetupParams::new(16).unwrap();
        let root = DomainHash::new(b"bad setup");
        let (_, mut r1) =
            CorreOtSetupReceiver::new(root.clone(), Group::Secp256k1, params).round1(&mut OsRng);
        r1.setup.proof.response[0] ^= 0xff;

        let result = CorreOtSetupSender::new(root, params).round1(&r1, &mut OsRng);
        assert!(matches!(result, Err(Error::SetupVerification(_))));
    }

    #[test]
    fn test_mismatched_roots_fail() {
        let params = SetupParams::new(16).unwrap();
        let sender = CorreOtSetupSender::new(DomainHash::new(b"one"), params);
        let receiver =
            CorreOtSetupReceiver::new(DomainHash::new(b"two"), Group::Secp256k1, params);

        let (_, r1) = receiver.round1(&mut OsRng);
        assert!(matches!(
            sender.round1(&r1, &mut OsRng),
            Err(Error::SetupVerification(_))
        ));
    }
}
