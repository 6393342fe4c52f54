//! Verified random OT
//!
//! Single-bit random OT in the style of the "Verified Simplest OT" (Protocol 7
//! of https://eprint.iacr.org/2018/499.pdf), run over secp256k1. One setup
//! exchange is shared by many instances; each instance is bound to its own
//! [`DomainHash`] so transcripts of different instances are independent.
//!
//! Flow per instance:
//! 1. receiver -> sender: `A = a*G + c*B`
//! 2. sender -> receiver: challenge `H(H(rho_0)) ^ H(H(rho_1))`
//! 3. receiver -> sender: response `H(H(rho_c)) ^ c*challenge`
//! 4. sender -> receiver: openings `H(rho_0), H(rho_1)`

use super::{decode_point, dlog::DLogProof, encode_point};
use crate::hash::DomainHash;
use k256::{elliptic_curve::Field, ProjectivePoint, Scalar};
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const SETUP_DOMAIN: &str = "Random OT Setup";

/// Errors raised by a single random OT instance or its setup
#[derive(Debug, Error)]
pub enum RandomOtError {
    /// Encoded point is malformed, off-curve or the identity
    #[error("Invalid group element: {0}")]
    InvalidPoint(String),

    /// Proof of knowledge of the setup secret did not verify
    #[error("Invalid proof of knowledge for setup key")]
    InvalidProof,

    /// Setup message names a group this instance does not support
    #[error("Unsupported group: {0}")]
    UnsupportedGroup(String),

    /// Receiver's response did not match the challenge
    #[error("Challenge verification failed (receiver cheated)")]
    ReceiverCheated,

    /// Sender's openings did not match the challenge or the chosen pad
    #[error("Opening verification failed (sender cheated)")]
    SenderCheated,
}

/// Algebraic group the base OT runs over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Group {
    #[default]
    Secp256k1,
}

impl Group {
    /// Stable name, absorbed into the setup proof
    pub fn name(&self) -> &'static str {
        match self {
            Group::Secp256k1 => "secp256k1",
        }
    }
}

/// Setup message sent by the base OT sender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOtSetupSendMessage {
    pub(crate) group: Group,
    /// `B = b * G` (compressed SEC1)
    pub(crate) public_key: Vec<u8>,
    pub(crate) proof: DLogProof,
}

/// Sender side of the setup: secret `b` and `B = b * G`
#[derive(Clone)]
pub struct RandomOtSendSetup {
    secret: Scalar,
    public_key: ProjectivePoint,
}

impl RandomOtSendSetup {
    /// Sample the setup key and prove knowledge of it
    pub fn new<R: RngCore + CryptoRng>(
        hash: &DomainHash,
        group: Group,
        rng: &mut R,
    ) -> (RandomOtSetupSendMessage, Self) {
        let secret = Scalar::random(&mut *rng);
        let public_key = ProjectivePoint::GENERATOR * secret;
        let proof = DLogProof::prove(&setup_hash(hash, group), &secret, &public_key, rng);

        let msg = RandomOtSetupSendMessage {
            group,
            public_key: encode_point(&public_key),
            proof,
        };

        (msg, Self { secret, public_key })
    }
}

/// Receiver side of the setup: the verified key `B`
#[derive(Clone)]
pub struct RandomOtReceiveSetup {
    public_key: ProjectivePoint,
}

impl RandomOtReceiveSetup {
    /// Validate the sender's setup message
    pub fn receive(hash: &DomainHash, msg: &RandomOtSetupSendMessage) -> Result<Self, RandomOtError> {
        let public_key = match msg.group {
            Group::Secp256k1 => decode_point(&msg.public_key)?,
        };
        msg.proof.verify(&setup_hash(hash, msg.group), &public_key)?;

        Ok(Self { public_key })
    }
}

fn setup_hash(hash: &DomainHash, group: Group) -> DomainHash {
    hash.fork(SETUP_DOMAIN, group.name().as_bytes())
}

/// Receiver -> sender: the encoded choice `A`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOtReceiveRound1Message {
    pub(crate) encoded_choice: Vec<u8>,
}

/// Sender -> receiver: challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOtSendRound1Message {
    pub(crate) challenge: [u8; 32],
}

/// Receiver -> sender: challenge response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOtReceiveRound2Message {
    pub(crate) response: [u8; 32],
}

/// Sender -> receiver: openings of both pads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOtSendRound2Message {
    pub(crate) hash_rand0: [u8; 32],
    pub(crate) hash_rand1: [u8; 32],
}

/// Both pads learned by the sender
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RandomOtSendResult {
    pub rand0: [u8; 32],
    pub rand1: [u8; 32],
}

/// Protocol states
pub mod state {
    use rand_chacha::ChaCha20Rng;
    use zeroize::Zeroizing;

    /// Receiver before choosing
    pub struct Initialized {
        pub(super) rng: ChaCha20Rng,
    }

    /// Receiver after sending `A`
    pub struct Chosen {
        pub(super) rand_choice: Zeroizing<[u8; 32]>,
    }

    /// Receiver after answering the challenge
    pub struct Responded {
        pub(super) rand_choice: Zeroizing<[u8; 32]>,
        pub(super) challenge: [u8; 32],
    }

    /// Sender before seeing `A`
    pub struct Fresh;

    /// Sender after issuing the challenge
    pub struct Challenged {
        pub(super) rand0: Zeroizing<[u8; 32]>,
        pub(super) rand1: Zeroizing<[u8; 32]>,
        pub(super) hash_rand0: [u8; 32],
        pub(super) hash_rand1: [u8; 32],
        pub(super) expected_response: [u8; 32],
    }
}

/// Random OT receiver: learns the pad for its choice bit
pub struct RandomOtReceiver<S = state::Initialized> {
    hash: DomainHash,
    choice: Choice,
    setup: RandomOtReceiveSetup,
    state: S,
}

impl RandomOtReceiver {
    /// Create a receiver instance with its own RNG seed
    pub fn new(hash: DomainHash, choice: Choice, setup: RandomOtReceiveSetup, seed: [u8; 32]) -> Self {
        Self {
            hash,
            choice,
            setup,
            state: state::Initialized {
                rng: ChaCha20Rng::from_seed(seed),
            },
        }
    }

    /// Send the encoded choice `A = a*G + c*B`
    pub fn round1(
        self,
    ) -> Result<(RandomOtReceiver<state::Chosen>, RandomOtReceiveRound1Message), RandomOtError> {
        let state::Initialized { mut rng } = self.state;

        let a = Scalar::random(&mut rng);
        let a_g = ProjectivePoint::GENERATOR * a;
        let encoded_choice = ProjectivePoint::conditional_select(
            &a_g,
            &(a_g + self.setup.public_key),
            self.choice,
        );
        if bool::from(encoded_choice.ct_eq(&ProjectivePoint::IDENTITY)) {
            return Err(RandomOtError::InvalidPoint("encoded choice is the identity".into()));
        }

        let encoded_choice = encode_point(&encoded_choice);
        let rand_choice = Zeroizing::new(pad(
            &self.hash,
            &encoded_choice,
            &(self.setup.public_key * a),
        ));

        Ok((
            RandomOtReceiver {
                hash: self.hash,
                choice: self.choice,
                setup: self.setup,
                state: state::Chosen { rand_choice },
            },
            RandomOtReceiveRound1Message { encoded_choice },
        ))
    }
}

impl RandomOtReceiver<state::Chosen> {
    /// Answer the sender's challenge
    pub fn round2(
        self,
        msg: &RandomOtSendRound1Message,
    ) -> (RandomOtReceiver<state::Responded>, RandomOtReceiveRound2Message) {
        let state::Chosen { rand_choice } = self.state;

        let mut response = hash_twice(&self.hash, &rand_choice);
        let mask = <[u8; 32]>::conditional_select(&[0u8; 32], &msg.challenge, self.choice);
        xor_in_place(&mut response, &mask);

        (
            RandomOtReceiver {
                hash: self.hash,
                choice: self.choice,
                setup: self.setup,
                state: state::Responded {
                    rand_choice,
                    challenge: msg.challenge,
                },
            },
            RandomOtReceiveRound2Message { response },
        )
    }
}

impl RandomOtReceiver<state::Responded> {
    /// Check the sender's openings and output the chosen pad
    pub fn round3(self, msg: &RandomOtSendRound2Message) -> Result<[u8; 32], RandomOtError> {
        let state::Responded {
            rand_choice,
            challenge,
        } = self.state;

        let mut expected_challenge = hash_pad(&self.hash, &msg.hash_rand0);
        xor_in_place(&mut expected_challenge, &hash_pad(&self.hash, &msg.hash_rand1));

        let opened = <[u8; 32]>::conditional_select(&msg.hash_rand0, &msg.hash_rand1, self.choice);
        let ok = expected_challenge.ct_eq(&challenge) & opened.ct_eq(&hash_pad(&self.hash, &rand_choice));
        if !bool::from(ok) {
            return Err(RandomOtError::SenderCheated);
        }

        Ok(*rand_choice)
    }
}

/// Random OT sender: learns both pads
pub struct RandomOtSender<S = state::Fresh> {
    hash: DomainHash,
    setup: RandomOtSendSetup,
    state: S,
}

impl RandomOtSender {
    /// Create a sender instance sharing the given setup
    pub fn new(hash: DomainHash, setup: RandomOtSendSetup) -> Self {
        Self {
            hash,
            setup,
            state: state::Fresh,
        }
    }

    /// Derive both pads from `A` and issue the challenge
    pub fn round1(
        self,
        msg: &RandomOtReceiveRound1Message,
    ) -> Result<(RandomOtSender<state::Challenged>, RandomOtSendRound1Message), RandomOtError> {
        let encoded_choice = decode_point(&msg.encoded_choice)?;
        let canonical = encode_point(&encoded_choice);

        let point0 = encoded_choice * self.setup.secret;
        let point1 = (encoded_choice - self.setup.public_key) * self.setup.secret;
        let rand0 = Zeroizing::new(pad(&self.hash, &canonical, &point0));
        let rand1 = Zeroizing::new(pad(&self.hash, &canonical, &point1));

        let hash_rand0 = hash_pad(&self.hash, &rand0);
        let hash_rand1 = hash_pad(&self.hash, &rand1);
        let expected_response = hash_pad(&self.hash, &hash_rand0);
        let mut challenge = hash_pad(&self.hash, &hash_rand1);
        xor_in_place(&mut challenge, &expected_response);

        Ok((
            RandomOtSender {
                hash: self.hash,
                setup: self.setup,
                state: state::Challenged {
                    rand0,
                    rand1,
                    hash_rand0,
                    hash_rand1,
                    expected_response,
                },
            },
            RandomOtSendRound1Message { challenge },
        ))
    }
}

impl RandomOtSender<state::Challenged> {
    /// Check the response, open both pads and output them
    pub fn round2(
        self,
        msg: &RandomOtReceiveRound2Message,
    ) -> Result<(RandomOtSendRound2Message, RandomOtSendResult), RandomOtError> {
        let state::Challenged {
            rand0,
            rand1,
            hash_rand0,
            hash_rand1,
            expected_response,
        } = self.state;

        if !bool::from(msg.response.ct_eq(&expected_response)) {
            return Err(RandomOtError::ReceiverCheated);
        }

        Ok((
            RandomOtSendRound2Message {
                hash_rand0,
                hash_rand1,
            },
            RandomOtSendResult {
                rand0: *rand0,
                rand1: *rand1,
            },
        ))
    }
}

fn pad(hash: &DomainHash, encoded_choice: &[u8], shared: &ProjectivePoint) -> [u8; 32] {
    hash.digest(b"random-ot-pad", &[encoded_choice, &encode_point(shared)])
}

fn hash_pad(hash: &DomainHash, value: &[u8; 32]) -> [u8; 32] {
    hash.digest(b"random-ot-hash", &[value])
}

fn hash_twice(hash: &DomainHash, value: &[u8; 32]) -> [u8; 32] {
    hash_pad(hash, &hash_pad(hash, value))
}

fn xor_in_place(acc: &mut [u8; 32], other: &[u8; 32]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a ^= b;
    }
}
