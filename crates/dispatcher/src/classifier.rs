//! Danger classifier - decides whether an operation may fail over

use contracts::{DangerClass, FailoverConfig, OperationKind};

/// Failover eligibility per danger tier
///
/// `Safe` is always eligible; the other tiers are opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailoverPolicy {
    pub medium: bool,
    pub dangerous: bool,
}

impl FailoverPolicy {
    pub fn new(medium: bool, dangerous: bool) -> Self {
        Self { medium, dangerous }
    }

    pub fn from_config(config: &FailoverConfig) -> Self {
        Self::new(config.failover_medium, config.failover_dangerous)
    }

    /// Whether an operation of this tier may be retried on the other endpoint
    pub fn is_eligible(&self, class: DangerClass) -> bool {
        match class {
            DangerClass::Safe => true,
            DangerClass::Medium => self.medium,
            DangerClass::Dangerous => self.dangerous,
        }
    }

    /// Classify `kind` and report its eligibility
    pub fn allows(&self, kind: OperationKind) -> bool {
        self.is_eligible(kind.danger_class())
    }
}
