//! The append-only, date-deduplicated price ledger

use crate::core::change;
use crate::core::error::{Result, TrackerError};
use crate::core::price::PriceObservation;
use crate::core::store::{AppendLog, TabularRow};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const CHECK_DATE: &str = "check_date";
pub const EFFECTIVE_DATE: &str = "effective_date";
pub const VALUE: &str = "value";
pub const PERCENT_CHANGE: &str = "percent_change";
pub const SOURCE_LABEL: &str = "source_label";

const KNOWN_COLUMNS: [&str; 5] = [CHECK_DATE, EFFECTIVE_DATE, VALUE, PERCENT_CHANGE, SOURCE_LABEL];

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One persisted observation. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// Calendar date this system recorded the observation.
    pub check_date: NaiveDate,
    pub effective_date: NaiveDateTime,
    pub value: Decimal,
    /// Day-over-day change versus the previous entry, in percent.
    pub percent_change: Option<Decimal>,
    pub source_label: Option<String>,
    /// Columns this version does not know about, carried through untouched.
    pub extra: BTreeMap<String, String>,
}

impl AsRef<LedgerEntry> for LedgerEntry {
    fn as_ref(&self) -> &LedgerEntry {
        self
    }
}

impl TabularRow for LedgerEntry {
    fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            (
                CHECK_DATE.to_string(),
                self.check_date.format(DATE_FORMAT).to_string(),
            ),
            (
                EFFECTIVE_DATE.to_string(),
                self.effective_date.format(DATE_TIME_FORMAT).to_string(),
            ),
            (VALUE.to_string(), self.value.to_string()),
            (
                PERCENT_CHANGE.to_string(),
                self.percent_change
                    .map(|p| format!("{:.2}", p.round_dp(2)))
                    .unwrap_or_default(),
            ),
            (
                SOURCE_LABEL.to_string(),
                self.source_label.clone().unwrap_or_default(),
            ),
        ];
        fields.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }

    fn from_fields(row: usize, fields: &HashMap<String, String>) -> Result<Self> {
        let cell = |column: &str| {
            fields
                .get(column)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        let invalid = |column: &str, value: &str| TrackerError::InvalidRecord {
            row,
            column: column.to_string(),
            value: value.to_string(),
        };

        let effective_date = cell(EFFECTIVE_DATE)
            .map(|v| parse_date_time(v).ok_or_else(|| invalid(EFFECTIVE_DATE, v)))
            .transpose()?;
        let check_date = cell(CHECK_DATE)
            .map(|v| parse_date(v).ok_or_else(|| invalid(CHECK_DATE, v)))
            .transpose()?;

        // Rows written before check_date existed fall back to the effective
        // date, and vice versa.
        let (check_date, effective_date) = match (check_date, effective_date) {
            (Some(c), Some(e)) => (c, e),
            (None, Some(e)) => (e.date(), e),
            (Some(c), None) => (c, c.and_time(chrono::NaiveTime::MIN)),
            (None, None) => return Err(invalid(CHECK_DATE, "")),
        };

        let value = cell(VALUE).ok_or_else(|| invalid(VALUE, ""))?;
        let value = parse_decimal(value).ok_or_else(|| invalid(VALUE, value))?;

        let percent_change = cell(PERCENT_CHANGE)
            .filter(|v| !is_nan(v))
            .map(|v| parse_decimal(v).ok_or_else(|| invalid(PERCENT_CHANGE, v)))
            .transpose()?;

        let extra = fields
            .iter()
            .filter(|(k, _)| !KNOWN_COLUMNS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(LedgerEntry {
            check_date,
            effective_date,
            value,
            percent_change,
            source_label: cell(SOURCE_LABEL).map(str::to_string),
            extra,
        })
    }
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.split([' ', 'T']).next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

pub(crate) fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

pub(crate) fn is_nan(s: &str) -> bool {
    s.eq_ignore_ascii_case("nan")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyCheckedToday,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    Accepted(LedgerEntry),
    Skipped(SkipReason),
}

/// The primary ledger: entries in ascending `check_date` order, at most one
/// per day, backed by an [`AppendLog`].
pub struct LedgerStore<B> {
    backend: B,
    entries: Vec<LedgerEntry>,
}

impl<B: AppendLog<LedgerEntry>> LedgerStore<B> {
    /// Loads every persisted entry from `backend`.
    pub fn open(backend: B) -> Result<Self> {
        let mut loaded = backend.load()?;
        loaded.sort_by_key(|e| e.check_date);

        let mut entries: Vec<LedgerEntry> = Vec::with_capacity(loaded.len());
        for entry in loaded {
            if entries
                .last()
                .is_some_and(|last| last.check_date == entry.check_date)
            {
                warn!(
                    check_date = %entry.check_date,
                    "Ignoring duplicate ledger row for an already recorded day"
                );
                continue;
            }
            entries.push(entry);
        }

        debug!("Opened ledger with {} entries", entries.len());
        Ok(Self { backend, entries })
    }

    /// Records `observation` as today's entry unless today was already checked.
    ///
    /// The entry is persisted before this returns; on a storage error nothing
    /// is recorded in memory either.
    pub fn accept(
        &mut self,
        observation: &PriceObservation,
        today: NaiveDate,
    ) -> Result<AcceptOutcome> {
        if self.entries.iter().any(|e| e.check_date == today) {
            info!(%today, "Already checked today, skipping");
            return Ok(AcceptOutcome::Skipped(SkipReason::AlreadyCheckedToday));
        }

        let change = change::detect(self.last_entry(), observation.value);
        let entry = LedgerEntry {
            check_date: today,
            effective_date: observation.effective_date,
            value: observation.value,
            percent_change: Some(change.percent_delta.round_dp(2)),
            source_label: Some(observation.source_label.clone()),
            extra: BTreeMap::new(),
        };

        self.backend.append(std::slice::from_ref(&entry))?;

        if self.last_entry().is_some_and(|last| last.check_date > today) {
            warn!(%today, "Recording a day older than the latest ledger entry");
        }
        let index = self.entries.partition_point(|e| e.check_date < today);
        self.entries.insert(index, entry.clone());

        info!(%today, value = %entry.value, "Recorded ledger entry");
        Ok(AcceptOutcome::Accepted(entry))
    }

    /// The entry with the latest `check_date`.
    pub fn last_entry(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    /// Entries with `check_date <= date`, ascending.
    pub fn entries_on_or_before(&self, date: NaiveDate) -> &[LedgerEntry] {
        let end = self.entries.partition_point(|e| e.check_date <= date);
        &self.entries[..end]
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::memory::MemoryLog;
    use rust_decimal_macros::dec;

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    pub(crate) fn entry(check_date: &str, value: Decimal) -> LedgerEntry {
        LedgerEntry {
            check_date: date(check_date),
            effective_date: date(check_date).and_hms_opt(8, 0, 0).unwrap(),
            value,
            percent_change: None,
            source_label: None,
            extra: BTreeMap::new(),
        }
    }

    fn observation(value: Decimal) -> PriceObservation {
        PriceObservation {
            effective_date: date("2025-03-01").and_hms_opt(0, 1, 0).unwrap(),
            value,
            source_label: "ACME SA / Super 95".to_string(),
        }
    }

    #[test]
    fn test_accept_twice_on_same_day_is_idempotent() {
        let log = MemoryLog::new();
        let mut store = LedgerStore::open(log.clone()).unwrap();
        let today = date("2025-03-10");

        let first = store.accept(&observation(dec!(1250)), today).unwrap();
        assert!(matches!(first, AcceptOutcome::Accepted(_)));

        let second = store.accept(&observation(dec!(1300)), today).unwrap();
        assert_eq!(
            second,
            AcceptOutcome::Skipped(SkipReason::AlreadyCheckedToday)
        );

        assert_eq!(log.snapshot().len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.last_entry().unwrap().value, dec!(1250));
    }

    #[test]
    fn test_skip_survives_reopen() {
        let log = MemoryLog::new();
        let today = date("2025-03-10");
        {
            let mut store = LedgerStore::open(log.clone()).unwrap();
            store.accept(&observation(dec!(1250)), today).unwrap();
        }

        let mut reopened = LedgerStore::open(log.clone()).unwrap();
        let outcome = reopened.accept(&observation(dec!(1250)), today).unwrap();
        assert_eq!(
            outcome,
            AcceptOutcome::Skipped(SkipReason::AlreadyCheckedToday)
        );
        assert_eq!(log.snapshot().len(), 1);
    }

    #[test]
    fn test_accepted_entry_fields() {
        let mut store = LedgerStore::open(MemoryLog::new()).unwrap();
        let obs = observation(dec!(1250.50));

        let AcceptOutcome::Accepted(entry) = store.accept(&obs, date("2025-03-10")).unwrap()
        else {
            panic!("Expected the observation to be accepted");
        };

        assert_eq!(entry.check_date, date("2025-03-10"));
        assert_eq!(entry.effective_date, obs.effective_date);
        assert_eq!(entry.value, dec!(1250.50));
        assert_eq!(entry.percent_change, Some(dec!(0)));
        assert_eq!(entry.source_label.as_deref(), Some("ACME SA / Super 95"));
    }

    #[test]
    fn test_percent_change_against_previous_entry() {
        let log = MemoryLog::with_rows(vec![entry("2025-03-09", dec!(1000))]);
        let mut store = LedgerStore::open(log).unwrap();

        let AcceptOutcome::Accepted(entry) = store
            .accept(&observation(dec!(1033.333)), date("2025-03-10"))
            .unwrap()
        else {
            panic!("Expected the observation to be accepted");
        };
        assert_eq!(entry.percent_change, Some(dec!(3.33)));
    }

    #[test]
    fn test_distinct_days_produce_ascending_unique_entries() {
        let log = MemoryLog::new();
        let mut store = LedgerStore::open(log.clone()).unwrap();
        let start = date("2025-01-01");

        for i in 0..10 {
            let day = start + chrono::Duration::days(i);
            let outcome = store
                .accept(&observation(Decimal::from(1000 + i)), day)
                .unwrap();
            assert!(matches!(outcome, AcceptOutcome::Accepted(_)));
        }

        let reopened = LedgerStore::open(log).unwrap();
        assert_eq!(reopened.len(), 10);
        let dates: Vec<_> = reopened.entries().iter().map(|e| e.check_date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn test_entries_on_or_before() {
        let log = MemoryLog::with_rows(vec![
            entry("2025-01-01", dec!(1)),
            entry("2025-01-05", dec!(2)),
            entry("2025-01-09", dec!(3)),
        ]);
        let store = LedgerStore::open(log).unwrap();

        let found = store.entries_on_or_before(date("2025-01-05"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].value, dec!(2));

        assert!(store.entries_on_or_before(date("2024-12-31")).is_empty());
        assert_eq!(store.entries_on_or_before(date("2025-02-01")).len(), 3);
    }

    #[test]
    fn test_open_sorts_and_drops_duplicate_days() {
        let log = MemoryLog::with_rows(vec![
            entry("2025-01-05", dec!(2)),
            entry("2025-01-01", dec!(1)),
            entry("2025-01-05", dec!(9)),
        ]);
        let store = LedgerStore::open(log).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].check_date, date("2025-01-01"));
        assert_eq!(store.last_entry().unwrap().value, dec!(2));
    }

    #[test]
    fn test_from_fields_tolerates_legacy_rows() {
        let fields = HashMap::from([
            (EFFECTIVE_DATE.to_string(), "2024-11-02 00:01:00".to_string()),
            (VALUE.to_string(), "1109".to_string()),
            ("empresa".to_string(), "ACME SA".to_string()),
        ]);

        let entry = LedgerEntry::from_fields(1, &fields).unwrap();
        assert_eq!(entry.check_date, date("2024-11-02"));
        assert_eq!(entry.value, dec!(1109));
        assert_eq!(entry.percent_change, None);
        assert_eq!(entry.source_label, None);
        assert_eq!(entry.extra.get("empresa").map(String::as_str), Some("ACME SA"));
    }

    #[test]
    fn test_from_fields_reports_invalid_cell() {
        let fields = HashMap::from([
            (CHECK_DATE.to_string(), "2024-11-02".to_string()),
            (VALUE.to_string(), "twelve".to_string()),
        ]);

        let err = LedgerEntry::from_fields(7, &fields).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'twelve' in column 'value' at row 7"
        );
    }

    #[test]
    fn test_fields_round_trip_keeps_extra_columns() {
        let mut original = entry("2025-02-01", dec!(1180.5));
        original.percent_change = Some(dec!(1.25));
        original.extra.insert("station".to_string(), "North".to_string());

        let fields: HashMap<String, String> = original.to_fields().into_iter().collect();
        let restored = LedgerEntry::from_fields(1, &fields).unwrap();
        assert_eq!(restored, original);
    }
}
