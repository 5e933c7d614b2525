use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Crate-level constants
pub const APP_NAME: &str = "Podagra";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Normal reference range for serum creatinine, mg/dL.
pub const CREATININE_LOWER_LIMIT: Decimal = dec!(0.74);
pub const CREATININE_UPPER_LIMIT: Decimal = dec!(1.35);

/// Normal reference range for serum urate, mg/dL.
pub const URATE_LOWER_LIMIT: Decimal = dec!(3.5);
pub const URATE_UPPER_LIMIT: Decimal = dec!(7.2);

/// Plausibility ceilings. Values above these are rejected at the boundary.
pub const BASELINE_CREATININE_MAX: Decimal = dec!(10);
pub const URATE_MAX: Decimal = dec!(30);

/// Tolerance for "back at baseline" creatinine comparisons: a reading counts
/// as at baseline when it is at or below baseline x this factor.
pub const BASELINE_VARIANCE: Decimal = dec!(1.10);

/// Months a urate series must span below goal to count as at goal long term.
pub const AT_GOAL_MONTHS: u32 = 6;

/// Month length used by the at-goal windowing scan.
pub const DAYS_PER_MONTH: i64 = 30;

/// A urate drawn within this window counts as recent for the prophylaxis
/// decision.
pub const RECENT_URATE_DAYS: i64 = 90;

/// Stored at-goal flags are only refreshed from labs drawn within this window.
pub const URATE_FLAG_REFRESH_DAYS: i64 = 30;
