pub mod helpers;
pub mod reconcile;
pub mod series;

pub use reconcile::{reconcile_readings, ReadingDelta};
pub use series::{DatedReading, OrderedLabSeries};
