//! Job table construction
//!
//! Each job line is `<minute> <hour> <day> <month> <weekday> <command...>`.
//! Fields are a number, `*`, a list (`1,3,5`) or an inclusive range
//! (`1-5`); list items may themselves be ranges. A line is expanded into
//! every concrete combination of its fields, and each combination becomes a
//! [`CronKey`] in the [`JobTable`].

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Cron errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CronError {
    #[error("could not parse job: {0}")]
    InvalidJob(String),

    #[error("invalid cron key: {0}")]
    InvalidKey(String),
}

/// Result type for cron operations
pub type CronResult<T> = Result<T, CronError>;

/// One field of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// `*`
    Any,
    At(u32),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Any => f.write_str("*"),
            Slot::At(n) => write!(f, "{n}"),
        }
    }
}

/// A fully expanded `minute hour day month weekday` tuple
///
/// Weekday 0 is Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CronKey(pub [Slot; 5]);

impl CronKey {
    pub fn minute(&self) -> Slot {
        self.0[0]
    }

    pub fn hour(&self) -> Slot {
        self.0[1]
    }

    pub fn day(&self) -> Slot {
        self.0[2]
    }

    pub fn month(&self) -> Slot {
        self.0[3]
    }

    pub fn weekday(&self) -> Slot {
        self.0[4]
    }
}

impl fmt::Display for CronKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [m, h, d, mo, w] = self.0;
        write!(f, "{m} {h} {d} {mo} {w}")
    }
}

impl FromStr for CronKey {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CronError::InvalidKey(s.to_string());
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid());
        }

        let mut slots = [Slot::Any; 5];
        for (slot, field) in slots.iter_mut().zip(fields) {
            if field != "*" {
                *slot = Slot::At(field.parse().map_err(|_| invalid())?);
            }
        }
        Ok(CronKey(slots))
    }
}

/// Commands keyed by the calendar slots they fire on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobTable {
    jobs: HashMap<CronKey, Vec<String>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands registered for `key`, in insertion order
    pub fn get(&self, key: &CronKey) -> Option<&[String]> {
        self.jobs.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CronKey> {
        self.jobs.keys()
    }

    /// Every command due at `t`, in firing order
    pub fn due(&self, t: NaiveDateTime) -> Vec<&str> {
        possibilities(t)
            .iter()
            .filter_map(|key| self.get(key))
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Parse one job line into the table
    ///
    /// Comment lines are skipped. Keys accumulate commands across lines.
    pub fn add_job(&mut self, line: &str) -> CronResult<()> {
        if line.trim_start().starts_with('#') {
            return Ok(());
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            return Err(CronError::InvalidJob(line.to_string()));
        }
        let fields = [parts[0], parts[1], parts[2], parts[3], parts[4]];
        if !fields.iter().all(|f| is_field(f)) {
            return Err(CronError::InvalidJob(line.to_string()));
        }

        let command = parts[5..].join(" ");
        for key in expand_fields(fields) {
            self.jobs.entry(key).or_default().push(command.clone());
        }
        Ok(())
    }
}

/// Build a job table, failing on the first invalid line
pub fn parse_jobs<S: AsRef<str>>(jobs: &[S]) -> CronResult<JobTable> {
    let mut table = JobTable::new();
    for line in jobs {
        table.add_job(line.as_ref())?;
    }
    Ok(table)
}

fn is_field(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '*' | ',' | '-'))
}

/// Expand five fields into the Cartesian product of their values
///
/// A field that expands to nothing (a malformed range) yields no keys.
pub fn expand_fields(fields: [&str; 5]) -> Vec<CronKey> {
    let mut keys = vec![[Slot::Any; 5]];
    for (i, field) in fields.iter().enumerate() {
        let slots = expand_field(field);
        keys = keys
            .iter()
            .flat_map(|key| {
                slots.iter().map(move |slot| {
                    let mut key = *key;
                    key[i] = *slot;
                    key
                })
            })
            .collect();
    }

    let mut keys: Vec<CronKey> = keys.into_iter().map(CronKey).collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Expand a single field into its slots
pub fn expand_field(field: &str) -> Vec<Slot> {
    field.split(',').flat_map(expand_item).collect()
}

fn expand_item(item: &str) -> Vec<Slot> {
    if item == "*" {
        return vec![Slot::Any];
    }
    if let Some((start, end)) = item.split_once('-') {
        return match (start.parse::<u32>(), end.parse::<u32>()) {
            (Ok(start), Ok(end)) if start < end => (start..=end).map(Slot::At).collect(),
            _ => {
                warn!(range = %item, "Could not parse cron range");
                Vec::new()
            }
        };
    }
    match item.parse() {
        Ok(n) => vec![Slot::At(n)],
        Err(_) => {
            warn!(field = %item, "Could not parse cron field");
            Vec::new()
        }
    }
}

/// The 32 keys a time can match, each field either exact or `*`
///
/// Mask bit `i` selects the exact value for field `i`, so the all-wildcard
/// key comes first and the fully exact key last.
pub fn possibilities(t: NaiveDateTime) -> Vec<CronKey> {
    let exact = [
        t.minute(),
        t.hour(),
        t.day(),
        t.month(),
        t.weekday().num_days_from_sunday(),
    ];

    (0u32..32)
        .map(|mask| {
            let mut slots = [Slot::Any; 5];
            for (i, slot) in slots.iter_mut().enumerate() {
                if mask & (1 << i) != 0 {
                    *slot = Slot::At(exact[i]);
                }
            }
            CronKey(slots)
        })
        .collect()
}
