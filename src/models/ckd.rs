use serde::{Deserialize, Serialize};

use super::enums::{DialysisDuration, DialysisType, Stage};

/// Detail record describing a patient's chronic kidney disease. 1:1 with the
/// parent medical-history record and deleted with it.
///
/// Invariant: `dialysis == true` implies stage V with both dialysis fields
/// set; `dialysis == false` implies both dialysis fields are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CkdDetail {
    pub dialysis: bool,
    pub dialysis_type: Option<DialysisType>,
    pub dialysis_duration: Option<DialysisDuration>,
    pub stage: Option<Stage>,
}

impl CkdDetail {
    pub fn invariant_holds(&self) -> bool {
        if self.dialysis {
            self.stage == Some(Stage::Five)
                && self.dialysis_type.is_some()
                && self.dialysis_duration.is_some()
        } else {
            self.dialysis_type.is_none() && self.dialysis_duration.is_none()
        }
    }
}
