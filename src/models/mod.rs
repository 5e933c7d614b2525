pub mod aki;
pub mod ckd;
pub mod enums;
pub mod gout;
pub mod lab;

pub use aki::AkiEpisode;
pub use ckd::CkdDetail;
pub use gout::{GoutDetail, GoutHistory};
pub use lab::{LabReading, OwnerRef};
