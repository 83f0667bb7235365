use super::types::Stage;

/// Which stage changes the store accepts.
///
/// `Unrestricted` is the default: any stage may move to any other,
/// including backwards and skipping departments. `Forward` only allows
/// the edges of the department pathway listed in `forward_targets`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    #[default]
    Unrestricted,
    Forward,
}

impl TransitionPolicy {
    pub fn allows(&self, from: Stage, to: Stage) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Forward => from == to || forward_targets(from).contains(&to),
        }
    }
}

/// Allowed next stages along the visit pathway.
pub fn forward_targets(from: Stage) -> &'static [Stage] {
    match from {
        Stage::Reception => &[Stage::Triage],
        Stage::Triage => &[Stage::Doctor],
        Stage::Doctor => &[
            Stage::Lab,
            Stage::Radiology,
            Stage::Billing,
            Stage::Pharmacy,
            Stage::Completed,
        ],
        Stage::Lab => &[Stage::Doctor, Stage::Radiology, Stage::Billing],
        Stage::Radiology => &[Stage::Doctor, Stage::Lab, Stage::Billing],
        Stage::Billing => &[Stage::Pharmacy, Stage::Completed],
        Stage::Pharmacy => &[Stage::Completed],
        Stage::Completed => &[],
    }
}
