use crate::config::Config;
use crate::report::{NextStage, PolicySection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Ready,
    NeedsMorePhotos,
}

/// Recommendation derived from the passed-photo count. Advisory only:
/// a short batch is still saved and reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub passed: usize,
    pub required: usize,
    pub shortfall: usize,
    pub status: GateStatus,
    pub message: String,
}

impl Gate {
    pub fn next_stage(&self) -> NextStage {
        match self.status {
            GateStatus::Ready => NextStage::Generation,
            GateStatus::NeedsMorePhotos => NextStage::UploadMorePhotos,
        }
    }
}

pub fn policy_section(cfg: &Config) -> PolicySection {
    PolicySection {
        min_passed_photos: cfg.policy.min_passed_photos,
    }
}

pub fn decide(cfg: &Config, passed: usize) -> Gate {
    let required = cfg.policy.min_passed_photos;
    let shortfall = required.saturating_sub(passed);

    if shortfall == 0 {
        return Gate {
            passed,
            required,
            shortfall,
            status: GateStatus::Ready,
            message: format!(
                "{passed} photo(s) passed the quality check; the minimum of {required} is met."
            ),
        };
    }

    Gate {
        passed,
        required,
        shortfall,
        status: GateStatus::NeedsMorePhotos,
        message: format!(
            "Only {passed} photo(s) passed the quality check. Please upload at least {shortfall} more clear photo(s) showing exactly one face (minimum {required})."
        ),
    }
}
