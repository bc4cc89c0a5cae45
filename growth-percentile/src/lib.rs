//! Growth percentile engine: reference curve building, measurement
//! classification and per-patient growth history maintenance.

use std::collections::HashMap;

use growth_core::{
    Gender, GrowthConfig, GrowthCurves, GrowthError, MeasurementRecord, Metric, Percentile,
    PercentileBand, PercentileCurves, ReferenceDataPoint, ReferenceRange, VitalsEntry,
};
use log::warn;

/// Average month length used to convert an age in days to fractional months.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Proportion used to place the 15th/85th percentile between the median and
/// the outer bound. Fixed output-compatibility parameter, not a tunable.
const BAND_PROPORTION: f64 = 0.3;

// Reference ranges (3rd..97th percentile envelope) per gender and metric,
// months 0-12. Weight in kg, height and head circumference in cm.

const BOYS_WEIGHT: &[ReferenceDataPoint] = &[
    ReferenceDataPoint { age_months: 0, min: 2.5, max: 4.3 },
    ReferenceDataPoint { age_months: 1, min: 3.4, max: 5.7 },
    ReferenceDataPoint { age_months: 2, min: 4.4, max: 7.0 },
    ReferenceDataPoint { age_months: 3, min: 5.1, max: 7.9 },
    ReferenceDataPoint { age_months: 6, min: 6.4, max: 9.7 },
    ReferenceDataPoint { age_months: 9, min: 7.2, max: 10.9 },
    ReferenceDataPoint { age_months: 12, min: 7.8, max: 11.8 },
];

const GIRLS_WEIGHT: &[ReferenceDataPoint] = &[
    ReferenceDataPoint { age_months: 0, min: 2.4, max: 4.2 },
    ReferenceDataPoint { age_months: 1, min: 3.2, max: 5.4 },
    ReferenceDataPoint { age_months: 2, min: 4.0, max: 6.5 },
    ReferenceDataPoint { age_months: 3, min: 4.6, max: 7.4 },
    ReferenceDataPoint { age_months: 6, min: 5.8, max: 9.2 },
    ReferenceDataPoint { age_months: 9, min: 6.6, max: 10.4 },
    ReferenceDataPoint { age_months: 12, min: 7.1, max: 11.3 },
];

const BOYS_HEIGHT: &[ReferenceDataPoint] = &[
    ReferenceDataPoint { age_months: 0, min: 46.3, max: 53.4 },
    ReferenceDataPoint { age_months: 1, min: 51.1, max: 58.4 },
    ReferenceDataPoint { age_months: 2, min: 54.7, max: 62.2 },
    ReferenceDataPoint { age_months: 3, min: 57.6, max: 65.3 },
    ReferenceDataPoint { age_months: 6, min: 63.6, max: 71.6 },
    ReferenceDataPoint { age_months: 9, min: 67.7, max: 76.2 },
    ReferenceDataPoint { age_months: 12, min: 71.3, max: 80.2 },
];

const GIRLS_HEIGHT: &[ReferenceDataPoint] = &[
    ReferenceDataPoint { age_months: 0, min: 45.6, max: 52.7 },
    ReferenceDataPoint { age_months: 1, min: 50.0, max: 57.4 },
    ReferenceDataPoint { age_months: 2, min: 53.2, max: 61.1 },
    ReferenceDataPoint { age_months: 3, min: 55.8, max: 63.8 },
    ReferenceDataPoint { age_months: 6, min: 61.5, max: 70.0 },
    ReferenceDataPoint { age_months: 9, min: 65.6, max: 74.5 },
    ReferenceDataPoint { age_months: 12, min: 69.2, max: 78.9 },
];

const BOYS_HEAD: &[ReferenceDataPoint] = &[
    ReferenceDataPoint { age_months: 0, min: 32.1, max: 36.9 },
    ReferenceDataPoint { age_months: 1, min: 35.1, max: 39.5 },
    ReferenceDataPoint { age_months: 2, min: 36.9, max: 41.3 },
    ReferenceDataPoint { age_months: 3, min: 38.3, max: 42.7 },
    ReferenceDataPoint { age_months: 6, min: 40.9, max: 45.3 },
    ReferenceDataPoint { age_months: 9, min: 42.5, max: 46.9 },
    ReferenceDataPoint { age_months: 12, min: 43.5, max: 48.0 },
];

const GIRLS_HEAD: &[ReferenceDataPoint] = &[
    ReferenceDataPoint { age_months: 0, min: 31.7, max: 36.1 },
    ReferenceDataPoint { age_months: 1, min: 34.3, max: 38.8 },
    ReferenceDataPoint { age_months: 2, min: 36.0, max: 40.5 },
    ReferenceDataPoint { age_months: 3, min: 37.2, max: 41.9 },
    ReferenceDataPoint { age_months: 6, min: 39.6, max: 44.4 },
    ReferenceDataPoint { age_months: 9, min: 41.2, max: 46.0 },
    ReferenceDataPoint { age_months: 12, min: 42.3, max: 47.1 },
];

/// Reference series for one gender/metric pair.
pub fn reference_series(gender: Gender, metric: Metric) -> &'static [ReferenceDataPoint] {
    match (gender, metric) {
        (Gender::Male, Metric::Weight) => BOYS_WEIGHT,
        (Gender::Male, Metric::Height) => BOYS_HEIGHT,
        (Gender::Male, Metric::HeadCircumference) => BOYS_HEAD,
        (Gender::Female, Metric::Weight) => GIRLS_WEIGHT,
        (Gender::Female, Metric::Height) => GIRLS_HEIGHT,
        (Gender::Female, Metric::HeadCircumference) => GIRLS_HEAD,
    }
}

/// Linearly interpolate the reference range at `age_months`.
///
/// Ages at or below the first point return that point unchanged; ages at or
/// beyond the last point are extrapolated from the trailing trend.
pub fn interpolate_range(
    age_months: f64,
    series: &[ReferenceDataPoint],
) -> Option<ReferenceRange> {
    let first = series.first()?;
    let last = series.last()?;

    if age_months <= f64::from(first.age_months) {
        return Some(ReferenceRange {
            min: first.min,
            max: first.max,
        });
    }

    if age_months >= f64::from(last.age_months) {
        return Some(extrapolate_range(age_months, series));
    }

    let upper_index = series
        .iter()
        .position(|point| f64::from(point.age_months) >= age_months)?;
    let lower = series[upper_index - 1];
    let upper = series[upper_index];

    let span = f64::from(upper.age_months - lower.age_months);
    let offset = age_months - f64::from(lower.age_months);

    Some(ReferenceRange {
        min: lower.min + (upper.min - lower.min) * offset / span,
        max: lower.max + (upper.max - lower.max) * offset / span,
    })
}

/// Project the reference range past the table using the growth rate between
/// the last two points.
///
/// Deliberately unbounded: the chart never gets a gap, at the cost of
/// accuracy far beyond the reference domain. Min and max each follow their
/// own rate rather than a shared median rate. A single-point series has no
/// trend to follow and projects flat. The series must be non-empty.
pub fn extrapolate_range(age_months: f64, series: &[ReferenceDataPoint]) -> ReferenceRange {
    let last = series[series.len() - 1];
    if series.len() < 2 {
        return ReferenceRange {
            min: last.min,
            max: last.max,
        };
    }
    let prev = series[series.len() - 2];

    let span = f64::from(last.age_months - prev.age_months);
    let min_rate = (last.min - prev.min) / span;
    let max_rate = (last.max - prev.max) / span;
    let ahead = age_months - f64::from(last.age_months);

    ReferenceRange {
        min: last.min + min_rate * ahead,
        max: last.max + max_rate * ahead,
    }
}

/// Derive the five percentile values from a min/max envelope.
pub fn derive_band(range: ReferenceRange) -> PercentileBand {
    let p50 = (range.min + range.max) / 2.0;
    PercentileBand {
        p3: range.min,
        p15: range.min + (p50 - range.min) * BAND_PROPORTION,
        p50,
        p85: p50 + (range.max - p50) * BAND_PROPORTION,
        p97: range.max,
    }
}

/// Percentile band at an exact fractional age, `None` if the series is empty.
pub fn band_at(age_months: f64, gender: Gender, metric: Metric) -> Option<PercentileBand> {
    interpolate_range(age_months, reference_series(gender, metric)).map(derive_band)
}

/// Build the full set of background reference curves for one gender.
///
/// Samples every integer month in `0..=curve_months`; months past the table
/// domain come from the extrapolator. Pure: identical inputs always produce
/// identical output.
pub fn build_growth_curves(gender: Gender, config: &GrowthConfig) -> GrowthCurves {
    GrowthCurves {
        weight: build_metric_curves(gender, Metric::Weight, config),
        height: build_metric_curves(gender, Metric::Height, config),
        head_circumference: build_metric_curves(gender, Metric::HeadCircumference, config),
    }
}

fn build_metric_curves(gender: Gender, metric: Metric, config: &GrowthConfig) -> PercentileCurves {
    let mut curves = PercentileCurves::default();

    for month in 0..=config.curve_months {
        let Some(band) = band_at(f64::from(month), gender, metric) else {
            continue;
        };
        curves.p3.push(band.p3);
        curves.p15.push(band.p15);
        curves.p50.push(band.p50);
        curves.p85.push(band.p85);
        curves.p97.push(band.p97);
    }

    curves
}

/// Classify a measured value into the percentile bucket it falls into at the
/// patient's exact age.
///
/// Returns the smallest band whose value is still at or above the
/// measurement; values above the 97th band clamp to `P97`. Non-finite input
/// yields `None`.
pub fn classify_value(
    value: f64,
    age_in_days: u32,
    metric: Metric,
    gender: Gender,
) -> Option<Percentile> {
    if !value.is_finite() {
        return None;
    }

    let age_months = f64::from(age_in_days) / DAYS_PER_MONTH;
    let band = band_at(age_months, gender, metric)?;

    let label = if value <= band.p3 {
        Percentile::P3
    } else if value <= band.p15 {
        Percentile::P15
    } else if value <= band.p50 {
        Percentile::P50
    } else if value <= band.p85 {
        Percentile::P85
    } else {
        Percentile::P97
    };

    Some(label)
}

/// Convert a hand-entered age to days, inferring the unit from magnitude.
///
/// Values below 3 are read as years, values up to 24 as months, anything
/// larger as days already. The thresholds are preserved verbatim from the
/// historical input form, ambiguity included (an entry of `2` always means
/// 2 years here, never 2 days).
pub fn age_in_days(raw: &str) -> Option<u32> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let days = if value < 3.0 {
        (value * 365.0).round()
    } else if value <= 24.0 {
        (value * 30.0).round()
    } else {
        value.round()
    };

    Some(days as u32)
}

/// Render an age in days as a compact label, e.g. `"8d"`, `"3m 12d"`, `"1y 2m"`.
pub fn format_age(age_in_days: u32) -> String {
    if age_in_days < 30 {
        return format!("{age_in_days}d");
    }

    if age_in_days < 365 {
        let months = age_in_days / 30;
        let days = age_in_days % 30;
        return if days == 0 {
            format!("{months}m")
        } else {
            format!("{months}m {days}d")
        };
    }

    let years = age_in_days / 365;
    let months = (age_in_days % 365) / 30;
    if months == 0 {
        format!("{years}y")
    } else {
        format!("{years}y {months}m")
    }
}

/// Turn a vital-signs entry into a classified measurement record.
///
/// Requires a parsable age plus both weight and height; head circumference
/// is optional. Returns `None` when the entry is incomplete, mirroring the
/// form's skip-silently behavior.
pub fn evaluate_vitals(entry: &VitalsEntry) -> Option<MeasurementRecord> {
    let age = age_in_days(&entry.raw_age)?;
    let weight = entry.weight.filter(|value| value.is_finite())?;
    let height = entry.height.filter(|value| value.is_finite())?;
    let head = entry.head_circumference.filter(|value| value.is_finite());

    Some(MeasurementRecord {
        date: entry.date,
        age_in_days: age,
        age_formatted: format_age(age),
        weight: Some(weight),
        height: Some(height),
        head_circumference: head,
        weight_percentile: classify_value(weight, age, Metric::Weight, entry.gender),
        height_percentile: classify_value(height, age, Metric::Height, entry.gender),
        head_circumference_percentile: head
            .and_then(|value| classify_value(value, age, Metric::HeadCircumference, entry.gender)),
        notes: entry.notes.clone(),
    })
}

/// Key-value persistence boundary supplied by the host application
/// (browser storage, database, file...).
pub trait KeyValueRepository {
    fn load(&self, key: &str) -> Result<Option<String>, GrowthError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), GrowthError>;
}

/// In-process repository for tests and storage-less hosts.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    entries: HashMap<String, String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueRepository for MemoryRepository {
    fn load(&self, key: &str) -> Result<Option<String>, GrowthError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), GrowthError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Outcome of an upsert: whether the updated history reached the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStatus {
    Saved,
    /// The in-memory history holds the update but the repository write
    /// failed; the failure was logged and must not abort the caller.
    MemoryOnly,
}

/// Per-patient growth history on top of an injected key-value repository.
///
/// Read-modify-write with a single writer per patient assumed; concurrent
/// hosts get last-write-wins semantics with no conflict detection.
pub struct GrowthHistoryStore<R> {
    repository: R,
    cache: HashMap<String, Vec<MeasurementRecord>>,
}

impl<R: KeyValueRepository> GrowthHistoryStore<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            cache: HashMap::new(),
        }
    }

    /// Persisted history for a patient, ordered by age ascending.
    ///
    /// A repository read or parse failure degrades to an empty history with
    /// a warning; it never propagates.
    pub fn history(&mut self, patient_id: &str) -> &[MeasurementRecord] {
        if !self.cache.contains_key(patient_id) {
            let records = self.load_history(patient_id);
            self.cache.insert(patient_id.to_string(), records);
        }

        self.cache
            .get(patient_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Insert a record, replacing any existing record with the same date,
    /// then persist the whole list back to the repository.
    pub fn upsert(&mut self, patient_id: &str, record: MeasurementRecord) -> PersistStatus {
        if !self.cache.contains_key(patient_id) {
            let records = self.load_history(patient_id);
            self.cache.insert(patient_id.to_string(), records);
        }

        let records = self
            .cache
            .entry(patient_id.to_string())
            .or_default();

        match records.iter_mut().find(|existing| existing.date == record.date) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        records.sort_by_key(|record| record.age_in_days);

        let payload = match serde_json::to_string(records) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("failed to serialize growth history for {patient_id}: {err}");
                return PersistStatus::MemoryOnly;
            }
        };

        match self.repository.save(&storage_key(patient_id), &payload) {
            Ok(()) => PersistStatus::Saved,
            Err(err) => {
                warn!("failed to persist growth history for {patient_id}: {err}");
                PersistStatus::MemoryOnly
            }
        }
    }

    fn load_history(&self, patient_id: &str) -> Vec<MeasurementRecord> {
        let raw = match self.repository.load(&storage_key(patient_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("failed to read growth history for {patient_id}: {err}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<MeasurementRecord>>(&raw) {
            Ok(mut records) => {
                records.sort_by_key(|record| record.age_in_days);
                records
            }
            Err(err) => {
                warn!("stored growth history for {patient_id} is invalid: {err}");
                Vec::new()
            }
        }
    }
}

fn storage_key(patient_id: &str) -> String {
    format!("growth_history_{patient_id}")
}
