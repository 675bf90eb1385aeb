use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    #[default]
    Day1,
    Day2,
}

impl Day {
    pub fn key(self) -> &'static str {
        match self {
            Day::Day1 => "day1",
            Day::Day2 => "day2",
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            Day::Day1 => "Day 1",
            Day::Day2 => "Day 2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlateCounts {
    pub day1: u32,
    pub day2: u32,
}

impl PlateCounts {
    pub fn get(&self, day: Day) -> u32 {
        match day {
            Day::Day1 => self.day1,
            Day::Day2 => self.day2,
        }
    }

    pub fn set(&mut self, day: Day, value: u32) {
        match day {
            Day::Day1 => self.day1 = value,
            Day::Day2 => self.day2 = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Record {
    pub row_index: u32,
    pub flat_number: Option<String>,
    pub building_name: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub amount_paid: Option<f64>,
    pub subscribed: PlateCounts,
    pub served: PlateCounts,
}

impl Record {
    /// A record only takes part in a day when it subscribed to plates for it.
    pub fn participates(&self, day: Day) -> bool {
        self.subscribed.get(day) > 0
    }

    pub fn label(&self) -> &str {
        self.flat_number.as_deref().unwrap_or("unlabelled record")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayCollections {
    pub day1: Vec<Record>,
    pub day2: Vec<Record>,
}

impl DayCollections {
    pub fn get(&self, day: Day) -> &[Record] {
        match day {
            Day::Day1 => &self.day1,
            Day::Day2 => &self.day2,
        }
    }

    pub fn get_mut(&mut self, day: Day) -> &mut Vec<Record> {
        match day {
            Day::Day1 => &mut self.day1,
            Day::Day2 => &mut self.day2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NewRecordDraft {
    pub flat_number: String,
    pub subscribed_plates: u32,
    #[serde(default)]
    pub building_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub amount_paid: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Summary {
    pub total_subscribed: u64,
    pub total_served: u64,
}

#[derive(Debug, Deserialize)]
pub struct ServedUpdateRequest {
    pub row_index: u32,
    pub day: Day,
    pub new_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct DayRequest {
    pub day: Day,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub term: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCard {
    pub row_index: u32,
    pub flat_number: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub amount_paid: Option<f64>,
    pub subscribed: u32,
    pub served: u32,
    pub updating: bool,
    pub malformed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportView {
    pub loading: bool,
    pub content: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub active_day: Day,
    pub day_label: String,
    pub search: String,
    pub loading: bool,
    pub error: Option<String>,
    pub summary: Summary,
    pub loaded_records: usize,
    pub records: Vec<RecordCard>,
    pub report: ReportView,
}
