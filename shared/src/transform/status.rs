//! Status labels and severity flags for analysis runs and metrics.

use crate::models::{AnalysisPhase, FunctionalStatus};

/// Returns the secondary severity flag for a phase and its issue counts.
///
/// Only running and successful phases carry a flag: failures raise an
/// error flag, errors or inconclusive measurements a warning flag.
///
/// # Examples
///
/// ```
/// use shared::models::{AnalysisPhase, FunctionalStatus};
/// use shared::transform::substatus;
///
/// assert_eq!(substatus(AnalysisPhase::Running, 1, 0, 0), Some(FunctionalStatus::Error));
/// assert_eq!(substatus(AnalysisPhase::Pending, 5, 5, 5), None);
/// ```
#[must_use]
pub fn substatus(
    phase: AnalysisPhase,
    failed: u32,
    error: u32,
    inconclusive: u32,
) -> Option<FunctionalStatus> {
    match phase {
        AnalysisPhase::Running | AnalysisPhase::Successful => {
            if failed > 0 {
                Some(FunctionalStatus::Error)
            } else if error > 0 || inconclusive > 0 {
                Some(FunctionalStatus::Warning)
            } else {
                None
            }
        }
        AnalysisPhase::Pending
        | AnalysisPhase::Failed
        | AnalysisPhase::Inconclusive
        | AnalysisPhase::Error
        | AnalysisPhase::Unknown
        | AnalysisPhase::Unrecognized => None,
    }
}

/// Returns the descriptive status text for a phase and its issue counts.
///
/// # Examples
///
/// ```
/// use shared::models::AnalysisPhase;
/// use shared::transform::status_label;
///
/// assert_eq!(status_label(AnalysisPhase::Successful, 0, 0, 0), "Analysis passed");
/// assert_eq!(
///     status_label(AnalysisPhase::Successful, 0, 2, 0),
///     "Analysis passed with measurement errors"
/// );
/// ```
#[must_use]
pub fn status_label(phase: AnalysisPhase, failed: u32, error: u32, inconclusive: u32) -> String {
    match phase {
        AnalysisPhase::Unknown => "Analysis status unknown".to_string(),
        AnalysisPhase::Pending => "Analysis pending".to_string(),
        AnalysisPhase::Running => "Analysis in progress".to_string(),
        AnalysisPhase::Failed => "Analysis failed".to_string(),
        AnalysisPhase::Inconclusive => "Analysis inconclusive".to_string(),
        AnalysisPhase::Error => "Analysis errored".to_string(),
        AnalysisPhase::Successful => match passed_qualifier(failed, error, inconclusive) {
            Some(qualifier) => format!("Analysis passed {qualifier}"),
            None => "Analysis passed".to_string(),
        },
        AnalysisPhase::Unrecognized => String::new(),
    }
}

fn passed_qualifier(failed: u32, error: u32, inconclusive: u32) -> Option<&'static str> {
    match (failed > 0, error > 0, inconclusive > 0) {
        (false, false, false) => None,
        (true, false, false) => Some("with measurement failures"),
        (false, true, false) => Some("with measurement errors"),
        (false, false, true) => Some("with inconclusive measurements"),
        _ => Some("with multiple issues"),
    }
}

/// Returns the visual status used to theme a phase.
#[must_use]
pub const fn functional_status(phase: AnalysisPhase) -> FunctionalStatus {
    match phase {
        AnalysisPhase::Successful => FunctionalStatus::Success,
        AnalysisPhase::Error | AnalysisPhase::Inconclusive => FunctionalStatus::Warning,
        AnalysisPhase::Failed => FunctionalStatus::Error,
        AnalysisPhase::Running => FunctionalStatus::InProgress,
        AnalysisPhase::Pending | AnalysisPhase::Unknown | AnalysisPhase::Unrecognized => {
            FunctionalStatus::Inactive
        }
    }
}
