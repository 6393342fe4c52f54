//! Correlated OT setup message types
//!
//! Every round message except the first carries one base OT sub-message per
//! index; entry `i` belongs to base OT instance `i`.

use super::random_ot::{
    RandomOtReceiveRound1Message, RandomOtReceiveRound2Message, RandomOtSendRound1Message,
    RandomOtSendRound2Message, RandomOtSetupSendMessage,
};
use serde::{Deserialize, Serialize};

/// Receiver round 1: base OT setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorreOtSetupReceiveRound1Message {
    pub(crate) setup: RandomOtSetupSendMessage,
}

/// Sender round 1: encoded choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorreOtSetupSendRound1Message {
    pub(crate) msgs: Vec<RandomOtReceiveRound1Message>,
}

/// Receiver round 2: challenges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorreOtSetupReceiveRound2Message {
    pub(crate) msgs: Vec<RandomOtSendRound1Message>,
}

/// Sender round 2: challenge responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorreOtSetupSendRound2Message {
    pub(crate) msgs: Vec<RandomOtReceiveRound2Message>,
}

/// Receiver round 3: pad openings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorreOtSetupReceiveRound3Message {
    pub(crate) msgs: Vec<RandomOtSendRound2Message>,
}

macro_rules! impl_entries {
    ($($msg:ty),*) => {
        $(
            impl $msg {
                /// Number of per-index entries
                pub fn len(&self) -> usize {
                    self.msgs.len()
                }

                /// Whether the message carries no entries
                pub fn is_empty(&self) -> bool {
                    self.msgs.is_empty()
                }
            }
        )*
    };
}

impl_entries!(
    CorreOtSetupSendRound1Message,
    CorreOtSetupReceiveRound2Message,
    CorreOtSetupSendRound2Message,
    CorreOtSetupReceiveRound3Message
);
