//! Relayed correlated OT setup
//!
//! Drives one party of the handshake over a [`Relay`], in the order
//! receiver round 1, sender round 1, receiver round 2, sender round 2,
//! receiver round 3, sender round 3.

use crate::hash::DomainHash;
use crate::mpc::Relay;
use crate::oblivious::{
    CorreOtSetupReceiveRound1Message, CorreOtSetupReceiveRound2Message,
    CorreOtSetupReceiveRound3Message, CorreOtSetupReceiver, CorreOtSetupSendRound1Message,
    CorreOtSetupSendRound2Message, CorreOtSetupSender, Group,
};
use crate::{CorreOtReceiveSetup, CorreOtSendSetup, Result, SessionConfig};
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, info, instrument};

/// Receiver -> sender: base OT setup
pub const ROUND_SETUP: u32 = 1;
/// Sender -> receiver: encoded choices
pub const ROUND_CHOICES: u32 = 2;
/// Receiver -> sender: challenges
pub const ROUND_CHALLENGES: u32 = 3;
/// Sender -> receiver: responses
pub const ROUND_RESPONSES: u32 = 4;
/// Receiver -> sender: openings
pub const ROUND_OPENINGS: u32 = 5;

/// Run the sender side of the setup
///
/// # Arguments
/// * `config` - Session configuration shared with the peer
/// * `relay` - Message relay for communication
/// * `rng` - CSPRNG used for Delta and the base OT secrets
///
/// # Returns
/// Delta and the seeds it selects
#[instrument(skip_all, fields(party_id = config.party_id, peer_id = config.peer_id))]
pub async fn run_cot_sender_setup<R, G>(
    config: &SessionConfig,
    relay: &R,
    rng: &mut G,
) -> Result<CorreOtSendSetup>
where
    R: Relay,
    G: RngCore + CryptoRng + Send,
{
    info!(
        session_id = %hex::encode(config.session_id),
        sec_param = config.params.sec_param(),
        "Starting CorreOT sender setup"
    );

    let sender = CorreOtSetupSender::new(DomainHash::new(&config.session_id), config.params);

    debug!("Round 1: base OT setup");
    let msg: CorreOtSetupReceiveRound1Message = relay
        .collect_direct(&config.session_id, ROUND_SETUP, config.party_id)
        .await?;
    let (sender, reply) = sender.round1(&msg, rng)?;
    relay
        .send_direct(&config.session_id, ROUND_CHOICES, config.peer_id, &reply)
        .await?;

    debug!("Round 2: challenge responses");
    let msg: CorreOtSetupReceiveRound2Message = relay
        .collect_direct(&config.session_id, ROUND_CHALLENGES, config.party_id)
        .await?;
    let (sender, reply) = sender.round2(&msg)?;
    relay
        .send_direct(&config.session_id, ROUND_RESPONSES, config.peer_id, &reply)
        .await?;

    debug!("Round 3: openings");
    let msg: CorreOtSetupReceiveRound3Message = relay
        .collect_direct(&config.session_id, ROUND_OPENINGS, config.party_id)
        .await?;
    let output = sender.round3(&msg)?;

    info!(
        complete = output.is_complete(),
        "CorreOT sender setup completed"
    );

    Ok(output)
}

/// Run the receiver side of the setup
#[instrument(skip_all, fields(party_id = config.party_id, peer_id = config.peer_id))]
pub async fn run_cot_receiver_setup<R, G>(
    config: &SessionConfig,
    group: Group,
    relay: &R,
    rng: &mut G,
) -> Result<CorreOtReceiveSetup>
where
    R: Relay,
    G: RngCore + CryptoRng + Send,
{
    info!(
        session_id = %hex::encode(config.session_id),
        sec_param = config.params.sec_param(),
        group = group.name(),
        "Starting CorreOT receiver setup"
    );

    let receiver =
        CorreOtSetupReceiver::new(DomainHash::new(&config.session_id), group, config.params);

    debug!("Round 1: base OT setup");
    let (receiver, msg) = receiver.round1(rng);
    relay
        .send_direct(&config.session_id, ROUND_SETUP, config.peer_id, &msg)
        .await?;

    debug!("Round 2: challenges");
    let msg: CorreOtSetupSendRound1Message = relay
        .collect_direct(&config.session_id, ROUND_CHOICES, config.party_id)
        .await?;
    let (receiver, reply) = receiver.round2(&msg)?;
    relay
        .send_direct(&config.session_id, ROUND_CHALLENGES, config.peer_id, &reply)
        .await?;

    debug!("Round 3: openings");
    let msg: CorreOtSetupSendRound2Message = relay
        .collect_direct(&config.session_id, ROUND_RESPONSES, config.party_id)
        .await?;
    let (reply, output) = receiver.round3(&msg)?;
    relay
        .send_direct(&config.session_id, ROUND_OPENINGS, config.peer_id, &reply)
        .await?;

    info!(
        complete = output.is_complete(),
        "CorreOT receiver setup completed"
    );

    Ok(output)
}
