use serde::{Deserialize, Serialize};

/// Chain revision: a named upgrade fixing the opcode set and gas schedule.
///
/// The ordering is chronological so availability checks can be written as
/// `fork >= Fork::Shanghai`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Fork {
    Frontier,
    Homestead,
    /// Tangerine Whistle (EIP-150): IO repricing and the 63/64 forwarding rule.
    Tangerine,
    /// Spurious Dragon (EIP-158/160): EXP repricing, empty-account semantics.
    SpuriousDragon,
    Byzantium,
    Constantinople,
    /// Petersburg reverts Constantinople's net gas metering (EIP-1283).
    Petersburg,
    Istanbul,
    /// Berlin (EIP-2929): cold/warm account and storage access pricing.
    Berlin,
    London,
    Paris,
    Shanghai,
    #[default]
    Cancun,
}
