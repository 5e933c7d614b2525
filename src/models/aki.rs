use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AkiStatus;
use super::lab::OwnerRef;

/// An acute kidney injury episode tracked through its creatinine trend.
///
/// Status is recomputed idempotently from the readings whenever they change,
/// not transitioned step-wise. The episode's creatinines are cascade-deleted
/// with it; `fallback_date` (e.g. the flare start date on an episode-owned
/// series) stands in for readings with no `date_drawn` of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AkiEpisode {
    pub id: Uuid,
    pub status: AkiStatus,
    pub owner: OwnerRef,
    pub fallback_date: Option<NaiveDate>,
}

impl AkiEpisode {
    /// A fresh episode with no asserted status starts out ongoing.
    pub fn new(owner: OwnerRef, status: Option<AkiStatus>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: status.unwrap_or(AkiStatus::Ongoing),
            owner,
            fallback_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statusless_episode_defaults_to_ongoing() {
        let episode = AkiEpisode::new(OwnerRef::Subject(Uuid::new_v4()), None);
        assert_eq!(episode.status, AkiStatus::Ongoing);
    }

    #[test]
    fn asserted_status_is_kept() {
        let episode = AkiEpisode::new(
            OwnerRef::Episode(Uuid::new_v4()),
            Some(AkiStatus::Improving),
        );
        assert_eq!(episode.status, AkiStatus::Improving);
    }
}
