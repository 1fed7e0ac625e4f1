//! Categorical buckets produced by the feature deriver.

use std::fmt;

/// Age in years at or below which a car counts as new
pub const NEW_CAR_MAX_AGE: f64 = 3.0;
/// Age in years from which a car counts as old
pub const OLD_CAR_MIN_AGE: f64 = 10.0;
/// Age in years from which a car counts as very old
pub const VERY_OLD_CAR_MIN_AGE: f64 = 20.0;

/// Employment duration marking an applicant without a job
///
/// The source encodes "not employed" as `DAYS_EMPLOYED = 365243`, which the
/// duration derivation turns into `round(-365243 / 365) = -1001`.
pub const NOT_EMPLOYED_DURATION: f64 = -1001.0;
/// Highest client age still counted as a beginner
pub const BEGINNER_MAX_AGE: f64 = 29.0;
/// Lowest client age counted as starting a new job rather than beginning
pub const NEW_JOB_MIN_AGE: f64 = 30.0;
/// Longest duration, in years, of a recent job
pub const RECENT_JOB_MAX_YEARS: f64 = 3.0;
/// Longest duration, in years, of medium seniority
pub const MEDIUM_SENIORITY_MAX_YEARS: f64 = 10.0;

/// Age bucket of the applicant's car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarType {
    NoCar,
    NewCar,
    YoungCar,
    OldCar,
    VeryOldCar,
}

impl CarType {
    /// Every bucket, in ascending car age
    pub const ALL: [Self; 5] = [
        Self::NoCar,
        Self::NewCar,
        Self::YoungCar,
        Self::OldCar,
        Self::VeryOldCar,
    ];

    /// Bucket for a car age in years, `None` meaning no car
    ///
    /// Total over every input: a missing or NaN age is no car, anything up to
    /// 3 is new, below 10 young, below 20 old, and the rest very old.
    #[must_use]
    pub fn from_age(age: Option<f64>) -> Self {
        match age {
            None => Self::NoCar,
            Some(a) if a.is_nan() => Self::NoCar,
            Some(a) if a <= NEW_CAR_MAX_AGE => Self::NewCar,
            Some(a) if a < OLD_CAR_MIN_AGE => Self::YoungCar,
            Some(a) if a < VERY_OLD_CAR_MIN_AGE => Self::OldCar,
            Some(_) => Self::VeryOldCar,
        }
    }

    /// Category label used in the encoded schema
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoCar => "No car",
            Self::NewCar => "New car",
            Self::YoungCar => "Young car",
            Self::OldCar => "Old car",
            Self::VeryOldCar => "Very old car",
        }
    }
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Job seniority bucket of the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobSeniority {
    NoJob,
    Beginner,
    NewJob,
    MediumSeniority,
    LongSeniority,
}

impl JobSeniority {
    /// Every bucket
    pub const ALL: [Self; 5] = [
        Self::NoJob,
        Self::Beginner,
        Self::NewJob,
        Self::MediumSeniority,
        Self::LongSeniority,
    ];

    /// Classify from client age and employment duration, both in years
    ///
    /// Age only separates beginners from people starting a new job; every
    /// other band depends on duration alone. Returns `None` when no band
    /// applies: a missing duration, a negative duration other than the
    /// not-employed sentinel, or a recent job with unknown age.
    #[must_use]
    pub fn classify(age: Option<f64>, duration: Option<f64>) -> Option<Self> {
        let duration = duration?;

        if duration == NOT_EMPLOYED_DURATION {
            return Some(Self::NoJob);
        }

        if (0.0..=RECENT_JOB_MAX_YEARS).contains(&duration) {
            return match age? {
                a if a <= BEGINNER_MAX_AGE => Some(Self::Beginner),
                a if a >= NEW_JOB_MIN_AGE => Some(Self::NewJob),
                _ => None,
            };
        }

        if duration > RECENT_JOB_MAX_YEARS && duration <= MEDIUM_SENIORITY_MAX_YEARS {
            Some(Self::MediumSeniority)
        } else if duration > MEDIUM_SENIORITY_MAX_YEARS {
            Some(Self::LongSeniority)
        } else {
            None
        }
    }

    /// Category label used in the encoded schema
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoJob => "No job",
            Self::Beginner => "Beginner",
            Self::NewJob => "New job",
            Self::MediumSeniority => "Medium seniority",
            Self::LongSeniority => "Long seniority",
        }
    }
}

impl fmt::Display for JobSeniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
