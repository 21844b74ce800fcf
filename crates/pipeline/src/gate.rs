//! Credential and credit gate.
//!
//! Nothing billable happens before this passes, and nothing is charged here:
//! the balance is only read. The decrement belongs to settlement.

use fotoai_core::error::CoreError;
use fotoai_core::ports::{CreditLedger, IdentityVerifier, SettingsSource};
use fotoai_core::settings::SettingsSnapshot;
use fotoai_core::types::UserId;

use crate::error::PipelineError;

pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "A plataforma está em manutenção. Tente novamente mais tarde.";

/// A caller that passed the gate, with the settings snapshot this invocation
/// runs against.
#[derive(Debug)]
pub struct Admission {
    pub user_id: UserId,
    pub remaining_credits: i32,
    pub snapshot: SettingsSnapshot,
}

/// Verify the caller, load one settings snapshot, refuse during maintenance,
/// then require a positive credit balance.
pub async fn admit(
    identity: &dyn IdentityVerifier,
    credits: &dyn CreditLedger,
    settings: &dyn SettingsSource,
    token: Option<&str>,
) -> Result<Admission, PipelineError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(PipelineError::Unauthenticated)?;

    let user_id = identity.verify(token).await.map_err(|e| match e {
        CoreError::Unauthorized(_) | CoreError::NotFound(_) => PipelineError::Unauthenticated,
        other => PipelineError::ServiceUnavailable {
            diagnostic: format!("identity verification: {other}"),
        },
    })?;

    let snapshot = settings
        .snapshot()
        .await
        .map_err(|e| PipelineError::ServiceUnavailable {
            diagnostic: format!("settings snapshot: {e}"),
        })?;

    if snapshot.maintenance_mode {
        let message = snapshot
            .maintenance_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MAINTENANCE_MESSAGE);
        return Err(PipelineError::MaintenanceMode(message.to_string()));
    }

    let remaining = credits
        .remaining(user_id)
        .await
        .map_err(|e| PipelineError::ServiceUnavailable {
            diagnostic: format!("credit balance: {e}"),
        })?;

    // A user without a credit record has nothing to spend.
    match remaining {
        Some(balance) if balance > 0 => Ok(Admission {
            user_id,
            remaining_credits: balance,
            snapshot,
        }),
        _ => Err(PipelineError::InsufficientCredits),
    }
}
