pub mod aki;
pub mod ckd;
pub mod messages;
pub mod ppx;
pub mod types;

pub use messages::Messages;
pub use types::{AidWriter, PatientRepository, PatientSnapshot};
