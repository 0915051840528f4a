//! Daily activity schedules.
//!
//! A schedule is the job's fixed activity list plus a few common activities,
//! shuffled, with the day closing on a home-related activity when one exists.
//! [`DailySchedule::activity_for`] turns it into a label for the current
//! period of the day and where the villager stands.

use crate::clock::DayPeriod;
use crate::jobs::{Job, COMMON_ACTIVITIES};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailySchedule(pub Vec<String>);

impl DailySchedule {
    pub fn for_job(job: Job, rng: &mut impl Rng) -> Self {
        let extra_count = rng.gen_range(2..=3);
        let mut activities: Vec<String> = job
            .activities()
            .iter()
            .map(|a| a.to_string())
            .collect();
        activities.extend(
            COMMON_ACTIVITIES
                .choose_multiple(rng, extra_count)
                .map(|a| a.to_string()),
        );
        activities.shuffle(rng);
        Self::from_activities(activities)
    }

    /// Drop every activity mentioning "home" and re-append the first one.
    ///
    /// Duplicates of the closing activity (a job entry that also appears in
    /// the common catalog) collapse into the single closing slot.
    pub fn from_activities(activities: Vec<String>) -> Self {
        let (home, mut rest): (Vec<String>, Vec<String>) = activities
            .into_iter()
            .partition(|a| is_home_activity(a));
        if let Some(first) = home.into_iter().next() {
            rest.push(first);
        }
        Self(rest)
    }

    pub fn activities(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn closing_activity(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The job's own entries in schedule order, without the home activity.
    /// Falls back to the job catalog when the schedule lists none.
    pub fn work_activities(&self, job: Job) -> Vec<&str> {
        let catalog = job.activities();
        let listed: Vec<&str> = self
            .0
            .iter()
            .map(String::as_str)
            .filter(|a| catalog.contains(a) && !is_home_activity(a))
            .collect();
        if !listed.is_empty() {
            return listed;
        }
        catalog
            .iter()
            .copied()
            .filter(|a| !is_home_activity(a))
            .collect()
    }

    /// Entries that are neither the job's work nor home-related.
    pub fn leisure_activities(&self, job: Job) -> Vec<&str> {
        let catalog = job.activities();
        self.0
            .iter()
            .map(String::as_str)
            .filter(|a| !catalog.contains(a) && !is_home_activity(a))
            .collect()
    }

    /// Label for an awake villager during `period` at `place`.
    pub fn activity_for(
        &self,
        job: Job,
        period: DayPeriod,
        place: Whereabouts,
        rng: &mut impl Rng,
    ) -> String {
        match (period, place) {
            (DayPeriod::Night, Whereabouts::Home) => "Getting ready for bed".to_string(),
            (DayPeriod::Night, _) => "Heading home".to_string(),
            (DayPeriod::Evening | DayPeriod::Dusk, Whereabouts::Home) => self
                .closing_activity()
                .filter(|a| is_home_activity(a))
                .unwrap_or("Relax at home")
                .to_string(),
            (DayPeriod::Evening | DayPeriod::Dusk, _) => "Heading home".to_string(),
            (_, Whereabouts::Work) => pick(&self.work_activities(job), "Working", rng),
            (DayPeriod::Dawn, _) => "Getting ready for the day".to_string(),
            (DayPeriod::Noon, _) => "Having lunch".to_string(),
            (_, Whereabouts::Home) => "Resting at home".to_string(),
            (_, Whereabouts::Elsewhere) => {
                pick(&self.leisure_activities(job), "Running errands", rng)
            }
        }
    }
}

/// Where a villager stands, as far as choosing an activity goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whereabouts {
    Work,
    Home,
    Elsewhere,
}

fn pick(options: &[&str], fallback: &str, rng: &mut impl Rng) -> String {
    options.choose(rng).copied().unwrap_or(fallback).to_string()
}

pub fn is_home_activity(activity: &str) -> bool {
    activity.to_lowercase().contains("home")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_home_activity_moves_last() {
        let schedule = DailySchedule::from_activities(vec![
            "Relax at home".into(),
            "Bake bread".into(),
            "Return home".into(),
            "Go for a walk".into(),
        ]);
        assert_eq!(
            schedule.activities(),
            &["Bake bread", "Go for a walk", "Relax at home"]
        );
    }

    #[test]
    fn test_schedule_without_home_is_untouched() {
        let schedule =
            DailySchedule::from_activities(vec!["Clean rooms".into(), "Manage staff".into()]);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.closing_activity(), Some("Manage staff"));
    }

    #[test]
    fn test_for_job_sizes_and_closing() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let schedule = DailySchedule::for_job(Job::Baker, &mut rng);
            // 7 job entries + 2..=3 common, minus any extra home entries
            assert!(schedule.len() >= 7 && schedule.len() <= 10);
            let closing = schedule.closing_activity().unwrap();
            assert!(is_home_activity(closing));
            let home_count = schedule
                .activities()
                .iter()
                .filter(|a| is_home_activity(a))
                .count();
            assert_eq!(home_count, 1);
        }
    }

    #[test]
    fn test_activity_follows_period_and_place() {
        let schedule = DailySchedule::from_activities(vec![
            "Prepare dough".into(),
            "Go for a walk".into(),
            "Bake bread".into(),
            "Return home".into(),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut label = |period, place| schedule.activity_for(Job::Baker, period, place, &mut rng);

        for _ in 0..20 {
            let work = label(DayPeriod::Morning, Whereabouts::Work);
            assert!(work == "Prepare dough" || work == "Bake bread", "{work}");
        }
        assert_eq!(label(DayPeriod::Afternoon, Whereabouts::Elsewhere), "Go for a walk");
        assert_eq!(label(DayPeriod::Noon, Whereabouts::Elsewhere), "Having lunch");
        assert_eq!(label(DayPeriod::Evening, Whereabouts::Home), "Return home");
        assert_eq!(label(DayPeriod::Dusk, Whereabouts::Work), "Heading home");
        assert_eq!(label(DayPeriod::Night, Whereabouts::Home), "Getting ready for bed");
    }

    #[test]
    fn test_empty_schedule_falls_back_to_catalog() {
        let schedule = DailySchedule::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let work = schedule.activity_for(Job::Guard, DayPeriod::Morning, Whereabouts::Work, &mut rng);
        assert!(Job::Guard.activities().contains(&work.as_str()));
        assert!(!is_home_activity(&work));
        assert_eq!(
            schedule.activity_for(Job::Guard, DayPeriod::Afternoon, Whereabouts::Elsewhere, &mut rng),
            "Running errands"
        );
        assert_eq!(
            schedule.activity_for(Job::Guard, DayPeriod::Evening, Whereabouts::Home, &mut rng),
            "Relax at home"
        );
    }

    #[test]
    fn test_for_job_deterministic_under_seed() {
        let a = DailySchedule::for_job(Job::Guard, &mut ChaCha8Rng::seed_from_u64(3));
        let b = DailySchedule::for_job(Job::Guard, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
