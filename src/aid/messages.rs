use crate::models::enums::Stage;

/// Canonical user-facing message set. These strings are part of the external
/// contract (callers display and acceptance-test them verbatim), so they
/// live in one place and nothing else formats its own copy.
pub struct Messages;

impl Messages {
    // --- AKI status vs. creatinine trend -----------------------------------

    pub const AKI_RESOLVED_BUT_IMPROVING: &'static str =
        "AKI marked as resolved, but the creatinines suggest it is still improving.";
    pub const AKI_RESOLVED_BUT_NOT: &'static str =
        "AKI marked as resolved, but the creatinines suggest it is not.";
    pub const AKI_IMPROVING_BUT_RESOLVED: &'static str =
        "AKI marked as improving, but the creatinines suggest it is resolved.";
    pub const AKI_IMPROVING_BUT_NOT: &'static str =
        "AKI marked as improving, but the creatinines suggest it is not.";
    pub const AKI_ONGOING_BUT_RESOLVED: &'static str =
        "The AKI is marked as ongoing, but the creatinines suggest it is resolved.";
    pub const AKI_ONGOING_BUT_IMPROVING: &'static str =
        "The AKI is marked as ongoing, but the creatinines suggest it is still improving.";

    pub const CREATININES_REQUIRE_AKI: &'static str =
        "AKI value must be True if creatinines are present.";

    // --- Urate / hyperuricemic discrepancies -------------------------------

    pub const CLARIFY_HYPERURICEMIC_UNSET: &'static str =
        "Clarify hyperuricemic status. At least one uric acid was reported but hyperuricemic was not.";
    pub const CLARIFY_HYPERURICEMIC_ABOVE_GOAL: &'static str =
        "Clarify hyperuricemic status. Last Urate was above goal, but hyperuricemic reported False.";
    pub const CLARIFY_HYPERURICEMIC_AT_GOAL: &'static str =
        "Clarify hyperuricemic status. Last Urate was at goal, but hyperuricemic reported True.";

    // --- CKD detail reconciliation -----------------------------------------

    pub const DIALYSIS_REQUIRED: &'static str = "Dialysis is a required field.";
    pub const BASELINE_NEEDS_DIALYSIS_ANSWER: &'static str =
        "A baseline creatinine cannot be interpreted without knowing whether the patient is on dialysis.";
    pub const DIALYSIS_TYPE_REQUIRED: &'static str =
        "Dialysis type is required if dialysis is True.";
    pub const DIALYSIS_DURATION_REQUIRED: &'static str =
        "Dialysis duration is required if dialysis is True.";

    /// The age/gender wording varies with which of the two is missing.
    pub fn age_gender_required(age_missing: bool, gender_missing: bool) -> String {
        let subject = if age_missing && gender_missing {
            "Age and gender are"
        } else if age_missing {
            "Age is"
        } else {
            "Gender is"
        };
        format!(
            "{subject} required to interpret a baseline creatinine (calculate a stage). \
             Please double check and try again."
        )
    }

    /// Baseline-creatinine side of a stage mismatch.
    pub fn stage_mismatch_baseline(calculated: Stage, given: Stage) -> String {
        format!(
            "The stage ({calculated}) calculated from the baseline creatinine, age, and gender \
             does not match the selected stage ({given}). Please double check and try again."
        )
    }

    /// Stage-field side of a stage mismatch.
    pub fn stage_mismatch_stage(given: Stage, calculated: Stage) -> String {
        format!(
            "The selected stage ({given}) does not match the stage {calculated} calculated \
             from the baseline creatinine, age, and gender. Please double check and try again."
        )
    }
}
