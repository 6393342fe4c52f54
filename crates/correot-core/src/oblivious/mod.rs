//! Oblivious Transfer (OT) primitives
//!
//! This module provides the OT protocols used by the correlated OT setup:
//! - Verified random OT (base OT)
//! - Correlated OT setup (κ base OTs bound to a secret Delta)

pub mod correlated;
pub mod dlog;
pub mod messages;
pub mod random_ot;

pub use correlated::{CorreOtSetupReceiver, CorreOtSetupSender};
pub use messages::{
    CorreOtSetupReceiveRound1Message, CorreOtSetupReceiveRound2Message,
    CorreOtSetupReceiveRound3Message, CorreOtSetupSendRound1Message, CorreOtSetupSendRound2Message,
};
pub use random_ot::{
    Group, RandomOtError, RandomOtReceiveSetup, RandomOtReceiver, RandomOtSendResult,
    RandomOtSendSetup, RandomOtSender,
};

use crate::{Error, Result};
use k256::{
    elliptic_curve::{
        sec1::{FromEncodedPoint, ToEncodedPoint},
        Group as _,
    },
    AffinePoint, EncodedPoint, ProjectivePoint,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Compressed SEC1 encoding of a point
pub(crate) fn encode_point(point: &ProjectivePoint) -> Vec<u8> {
    point.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

/// Decode a SEC1 point, rejecting the identity
pub(crate) fn decode_point(bytes: &[u8]) -> std::result::Result<ProjectivePoint, RandomOtError> {
    let encoded =
        EncodedPoint::from_bytes(bytes).map_err(|e| RandomOtError::InvalidPoint(e.to_string()))?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or_else(|| RandomOtError::InvalidPoint("point is not on the curve".into()))?;
    let point = ProjectivePoint::from(affine);
    if bool::from(point.is_identity()) {
        return Err(RandomOtError::InvalidPoint("point is the identity".into()));
    }
    Ok(point)
}

/// Run `f` on every base OT instance and collect the results in index order.
///
/// On failure the error of the lowest failing index is returned. With the
/// `rayon` feature every index is evaluated before the error is reported;
/// sequentially, indices after the first failure are not attempted.
pub(crate) fn fan_out<T, U, F>(instances: Vec<T>, f: F) -> Result<Vec<U>>
where
    T: Send,
    U: Send,
    F: Fn(T) -> std::result::Result<U, RandomOtError> + Send + Sync,
{
    #[cfg(feature = "rayon")]
    let results = instances
        .into_par_iter()
        .map(f)
        .collect::<Vec<_>>()
        .into_iter();

    #[cfg(not(feature = "rayon"))]
    let results = instances.into_iter().map(f);

    results
        .enumerate()
        .map(|(i, r)| r.map_err(Error::at_index(i)))
        .collect()
}

/// Like [`fan_out`], pairing instance `i` with incoming entry `i`.
///
/// Only the common prefix of `instances` and `msgs` is processed; instances
/// past the end of `msgs` are dropped.
pub(crate) fn fan_out_zip<T, M, U, F>(instances: Vec<T>, msgs: &[M], f: F) -> Result<Vec<U>>
where
    T: Send,
    M: Sync,
    U: Send,
    F: Fn(T, &M) -> std::result::Result<U, RandomOtError> + Send + Sync,
{
    #[cfg(feature = "rayon")]
    let results = instances
        .into_par_iter()
        .zip(msgs.par_iter())
        .map(|(t, m)| f(t, m))
        .collect::<Vec<_>>()
        .into_iter();

    #[cfg(not(feature = "rayon"))]
    let results = instances.into_iter().zip(msgs).map(|(t, m)| f(t, m));

    results
        .enumerate()
        .map(|(i, r)| r.map_err(Error::at_index(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::Scalar;

    #[test]
    fn test_point_encoding() {
        let point = ProjectivePoint::GENERATOR * Scalar::from(42u64);
        let bytes = encode_point(&point);
        assert_eq!(bytes.len(), 33);
        assert_eq!(decode_point(&bytes).unwrap(), point);
        assert!(decode_point(&encode_point(&ProjectivePoint::IDENTITY)).is_err());
        assert!(decode_point(&[]).is_err());
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let out = fan_out((0..64u32).collect(), |x| Ok(x * 2)).unwrap();
        assert_eq!(out, (0..64u32).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_fan_out_reports_lowest_failing_index() {
        let err = fan_out((0..64usize).collect(), |x| {
            if x == 17 || x == 40 {
                Err(RandomOtError::SenderCheated)
            } else {
                Ok(x)
            }
        })
        .unwrap_err();
        assert!(matches!(err, Error::IndexProtocol { index: 17, .. }));
    }

    #[test]
    fn test_fan_out_zip_truncates() {
        let msgs = [10u32, 20, 30];
        let out = fan_out_zip((0..8u32).collect(), &msgs, |t, m| Ok(t + m)).unwrap();
        assert_eq!(out, vec![10, 21, 32]);
    }
}
