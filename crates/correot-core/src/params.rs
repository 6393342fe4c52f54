//! Construction-time parameters for the setup handshake

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default security parameter (number of base OTs, bit length of Delta)
pub const DEFAULT_SEC_PARAM: usize = 128;

/// Parameters fixed for one setup instance.
///
/// Both parties must agree on these out of band; nothing here is negotiated
/// during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupParams {
    /// Security parameter κ
    sec_param: usize,
    /// Reject round messages that do not carry exactly κ entries
    strict_length: bool,
}

impl SetupParams {
    /// Create parameters for the given security parameter.
    ///
    /// κ must be a positive multiple of 8 so that Delta packs into whole bytes.
    pub fn new(sec_param: usize) -> Result<Self> {
        if sec_param == 0 {
            return Err(Error::InvalidConfig(
                "Security parameter must be positive".into(),
            ));
        }
        if sec_param % 8 != 0 {
            return Err(Error::InvalidConfig(format!(
                "Security parameter must be a multiple of 8, got {}",
                sec_param
            )));
        }

        Ok(Self {
            sec_param,
            strict_length: false,
        })
    }

    /// Fail closed when a peer message has fewer or more entries than κ.
    ///
    /// Off by default: short messages are processed on their common prefix
    /// and the remaining output entries stay unset.
    pub fn with_strict_length(mut self, strict: bool) -> Self {
        self.strict_length = strict;
        self
    }

    /// Security parameter κ
    pub fn sec_param(&self) -> usize {
        self.sec_param
    }

    /// Byte length of Delta (κ/8)
    pub fn sec_bytes(&self) -> usize {
        self.sec_param / 8
    }

    /// Whether length mismatches are rejected
    pub fn strict_length(&self) -> bool {
        self.strict_length
    }

    /// Check an incoming entry count against κ.
    ///
    /// Returns the number of indices to process.
    pub(crate) fn entries_to_process(&self, actual: usize) -> Result<usize> {
        if actual == self.sec_param {
            return Ok(actual);
        }
        if self.strict_length {
            return Err(Error::LengthMismatch {
                expected: self.sec_param,
                actual,
            });
        }
        tracing::warn!(
            expected = self.sec_param,
            actual,
            "Round message length differs from security parameter, processing common prefix"
        );
        Ok(actual.min(self.sec_param))
    }
}

impl Default for SetupParams {
    fn default() -> Self {
        Self {
            sec_param: DEFAULT_SEC_PARAM,
            strict_length: false,
        }
    }
}
