//! Lock enforcement state machine.
//!
//! # Purpose
//! Decides how a device moves between `Active` and `Locked`. This module is
//! the only producer of [`EnforcementPatch`], so it is the only path that can
//! change `is_locked`, `status`, or `lock_message`.
//!
//! # Transitions
//! - `Active -> Locked` needs a non-blank message.
//! - `Locked -> Active` clears the message.
//! - Unlocking an active device or re-locking with the same message is a
//!   no-op. Re-locking with a different message overwrites it.
use crate::error::{CoreError, CoreResult};
use crate::model::{EnforcementPatch, EnforcementState};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockCommand {
    Lock { message: String },
    Unlock,
}

impl LockCommand {
    pub fn lock(message: impl Into<String>) -> Self {
        LockCommand::Lock {
            message: message.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LockCommand::Lock { .. } => "lock",
            LockCommand::Unlock => "unlock",
        }
    }

    /// Validate the command payload and return the state it asks for.
    ///
    /// Runs before any store access.
    pub fn target(&self) -> CoreResult<EnforcementState> {
        match self {
            LockCommand::Lock { message } => {
                let message = message.trim();
                if message.is_empty() {
                    return Err(CoreError::MissingLockMessage);
                }
                Ok(EnforcementState::Locked {
                    message: message.to_string(),
                })
            }
            LockCommand::Unlock => Ok(EnforcementState::Active),
        }
    }
}

/// The write needed to move from `current` to `target`, or `None` when the
/// device is already there.
pub fn transition(
    current: &EnforcementState,
    target: EnforcementState,
    at: DateTime<Utc>,
) -> Option<EnforcementPatch> {
    if *current == target {
        return None;
    }
    Some(EnforcementPatch::new(target, at))
}
