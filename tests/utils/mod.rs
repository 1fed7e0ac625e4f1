//! Shared fixtures for the integration tests: applicant rows built from a
//! struct with `serde_arrow`, written to temporary Parquet and CSV files.
#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

/// `DAYS_EMPLOYED` value of applicants without a job
pub const NOT_EMPLOYED_DAYS: i64 = 365_243;

/// One loan application with exactly the whitelisted columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct ApplicationRow {
    pub SK_ID_CURR: i64,
    pub NAME_CONTRACT_TYPE: String,
    pub CODE_GENDER: String,
    pub FLAG_OWN_CAR: String,
    pub FLAG_OWN_REALTY: String,
    pub AMT_INCOME_TOTAL: f64,
    pub AMT_CREDIT: f64,
    pub NAME_INCOME_TYPE: String,
    pub NAME_EDUCATION_TYPE: String,
    pub NAME_FAMILY_STATUS: String,
    pub NAME_HOUSING_TYPE: String,
    pub CNT_FAM_MEMBERS: Option<f64>,
    pub DEF_30_CNT_SOCIAL_CIRCLE: Option<f64>,
    pub DAYS_BIRTH: i64,
    pub OWN_CAR_AGE: Option<f64>,
    pub DAYS_EMPLOYED: i64,
    pub AMT_ANNUITY: Option<f64>,
}

impl ApplicationRow {
    /// A working, married applicant without a car
    #[must_use]
    pub fn sample(id: i64) -> Self {
        Self {
            SK_ID_CURR: id,
            NAME_CONTRACT_TYPE: "Cash loans".to_string(),
            CODE_GENDER: "F".to_string(),
            FLAG_OWN_CAR: "N".to_string(),
            FLAG_OWN_REALTY: "Y".to_string(),
            AMT_INCOME_TOTAL: 135_000.0,
            AMT_CREDIT: 568_800.0,
            NAME_INCOME_TYPE: "Working".to_string(),
            NAME_EDUCATION_TYPE: "Higher education".to_string(),
            NAME_FAMILY_STATUS: "Married".to_string(),
            NAME_HOUSING_TYPE: "House / apartment".to_string(),
            CNT_FAM_MEMBERS: Some(2.0),
            DEF_30_CNT_SOCIAL_CIRCLE: Some(0.0),
            DAYS_BIRTH: -19_241,
            OWN_CAR_AGE: None,
            DAYS_EMPLOYED: -2_329,
            AMT_ANNUITY: Some(20_560.5),
        }
    }
}

/// Small hand-written table covering every car and seniority band
#[must_use]
pub fn reference_rows() -> Vec<ApplicationRow> {
    let mut beginner = ApplicationRow::sample(100_001);
    beginner.DAYS_BIRTH = -9_125; // 25 years
    beginner.DAYS_EMPLOYED = -730; // 2 years
    beginner.CODE_GENDER = "M".to_string();
    beginner.FLAG_OWN_CAR = "Y".to_string();
    beginner.OWN_CAR_AGE = Some(2.0);

    let mut new_job = ApplicationRow::sample(100_005);
    new_job.DAYS_BIRTH = -12_775; // 35 years
    new_job.DAYS_EMPLOYED = -730;
    new_job.NAME_CONTRACT_TYPE = "Revolving loans".to_string();
    new_job.FLAG_OWN_CAR = "Y".to_string();
    new_job.OWN_CAR_AGE = Some(7.0);

    let mut medium = ApplicationRow::sample(100_013);
    medium.DAYS_BIRTH = -14_600; // 40 years
    medium.DAYS_EMPLOYED = -2_555; // 7 years
    medium.FLAG_OWN_CAR = "Y".to_string();
    medium.OWN_CAR_AGE = Some(15.0);
    medium.NAME_FAMILY_STATUS = "Single / not married".to_string();

    let mut long = ApplicationRow::sample(100_028);
    long.DAYS_BIRTH = -18_250; // 50 years
    long.DAYS_EMPLOYED = -5_475; // 15 years
    long.FLAG_OWN_CAR = "Y".to_string();
    long.OWN_CAR_AGE = Some(25.0);
    long.CNT_FAM_MEMBERS = None;

    let mut pensioner = ApplicationRow::sample(100_038);
    pensioner.DAYS_BIRTH = -23_725; // 65 years
    pensioner.DAYS_EMPLOYED = NOT_EMPLOYED_DAYS;
    pensioner.NAME_INCOME_TYPE = "Pensioner".to_string();
    pensioner.AMT_ANNUITY = None;

    vec![beginner, new_job, medium, long, pensioner]
}

/// Seeded synthetic applicants with varied categories and missing values
#[must_use]
pub fn random_rows(seed: u64, count: usize) -> Vec<ApplicationRow> {
    const CONTRACTS: [&str; 2] = ["Cash loans", "Revolving loans"];
    const GENDERS: [&str; 3] = ["F", "M", "XNA"];
    const INCOME_TYPES: [&str; 4] = ["Working", "Commercial associate", "Pensioner", "State servant"];
    const EDUCATION: [&str; 3] = ["Secondary / secondary special", "Higher education", "Incomplete higher"];
    const FAMILY: [&str; 4] = ["Married", "Single / not married", "Civil marriage", "Widow"];
    const HOUSING: [&str; 3] = ["House / apartment", "With parents", "Rented apartment"];

    fn pick(options: &[&str], rng: &mut StdRng) -> String {
        options.choose(rng).map_or_else(String::new, |s| (*s).to_string())
    }

    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let has_car = rng.random_bool(0.4);
            let employed = rng.random_bool(0.85);
            #[allow(clippy::cast_possible_wrap)]
            let id = 200_000 + i as i64;
            ApplicationRow {
                SK_ID_CURR: id,
                NAME_CONTRACT_TYPE: pick(&CONTRACTS, &mut rng),
                CODE_GENDER: pick(&GENDERS, &mut rng),
                FLAG_OWN_CAR: if has_car { "Y" } else { "N" }.to_string(),
                FLAG_OWN_REALTY: if rng.random_bool(0.7) { "Y" } else { "N" }.to_string(),
                AMT_INCOME_TOTAL: f64::from(rng.random_range(25_000..900_000_i32)),
                AMT_CREDIT: f64::from(rng.random_range(45_000..2_000_000_i32)),
                NAME_INCOME_TYPE: pick(&INCOME_TYPES, &mut rng),
                NAME_EDUCATION_TYPE: pick(&EDUCATION, &mut rng),
                NAME_FAMILY_STATUS: pick(&FAMILY, &mut rng),
                NAME_HOUSING_TYPE: pick(&HOUSING, &mut rng),
                CNT_FAM_MEMBERS: rng.random_bool(0.95).then(|| f64::from(rng.random_range(1..7_i32))),
                DEF_30_CNT_SOCIAL_CIRCLE: rng.random_bool(0.9).then(|| f64::from(rng.random_range(0..4_i32))),
                DAYS_BIRTH: -rng.random_range(7_500..25_000_i64),
                OWN_CAR_AGE: has_car.then(|| f64::from(rng.random_range(0..40_i32))),
                DAYS_EMPLOYED: if employed {
                    -rng.random_range(0..15_000_i64)
                } else {
                    NOT_EMPLOYED_DAYS
                },
                AMT_ANNUITY: rng.random_bool(0.98).then(|| f64::from(rng.random_range(2_000..120_000_i32))),
            }
        })
        .collect()
}

/// Record batch of `rows`, columns in struct field order
#[must_use]
pub fn to_batch(rows: &[ApplicationRow]) -> RecordBatch {
    let fields = Vec::<FieldRef>::from_type::<ApplicationRow>(TracingOptions::default())
        .expect("fixture schema");
    serde_arrow::to_record_batch(&fields, &rows).expect("fixture batch")
}

/// Write `batch` as a Parquet file in `dir`
pub fn write_parquet(dir: &Path, name: &str, batch: &RecordBatch) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create parquet fixture");
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).expect("parquet writer");
    writer.write(batch).expect("write parquet fixture");
    writer.close().expect("close parquet fixture");
    path
}

/// Write `batch` as a CSV file with a header row in `dir`
pub fn write_csv(dir: &Path, name: &str, batch: &RecordBatch) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create csv fixture");
    let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(file);
    writer.write(batch).expect("write csv fixture");
    path
}
