use crate::errors::ServiceError;
use crate::models::{Day, NewRecordDraft, PlateCounts, Record};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

const TEXT_PLAIN: &str = "text/plain;charset=utf-8";

const FIELD_ALIASES: &[(&str, &str)] = &[
    ("row_index", "Row Index"),
    ("building_name", "Building Name"),
    ("flat_number", "Flat Number"),
    ("name", "Name"),
    ("phone_number", "Phone Number"),
    ("amount_paid", "Amount Paid"),
    ("subscribed_plates_day1", "Subscribed Plates - Day 1"),
    ("served_plates_day1", "Served Plates - Day 1"),
    ("subscribed_plates_day2", "Subscribed Plates - Day 2"),
    ("served_plates_day2", "Served Plates - Day 2"),
];

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_day(&self, day: Day) -> Result<Vec<Record>, ServiceError>;

    /// Creates the record in both day sheets; the store copies the subscribed
    /// count into each.
    async fn add_record(&self, draft: &NewRecordDraft) -> Result<(), ServiceError>;

    async fn update_served_count(
        &self,
        row_index: u32,
        day: Day,
        new_count: u32,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct SheetClient {
    client: Client,
    endpoint: Option<String>,
}

impl SheetClient {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    fn endpoint_for_write(&self, what: &str) -> Result<&str, ServiceError> {
        self.endpoint.as_deref().ok_or_else(|| {
            ServiceError::Configuration(format!("Store URL is not configured. Cannot {what}."))
        })
    }

    async fn post(&self, endpoint: &str, command: &SheetCommand<'_>) -> Result<(StatusCode, String), ServiceError> {
        let body = serde_json::to_string(command)
            .map_err(|err| ServiceError::Format(format!("could not encode request: {err}")))?;
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

#[async_trait]
impl RecordStore for SheetClient {
    async fn fetch_day(&self, day: Day) -> Result<Vec<Record>, ServiceError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            warn!("store URL is not configured, skipping fetch for {}", day.key());
            return Ok(Vec::new());
        };

        let result = async {
            let response = self
                .client
                .get(endpoint)
                .query(&[("sheetName", day.sheet_name())])
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(ServiceError::Remote(format!(
                    "Network response was not ok for {}: {}",
                    day.key(),
                    extract_message(status, &body)
                )));
            }
            let payload: Value = serde_json::from_str(&body).map_err(|err| {
                ServiceError::Format(format!("Response for {} is not valid JSON: {err}", day.key()))
            })?;
            parse_day(day, payload)
        }
        .await;

        match &result {
            Ok(records) => debug!("fetched {} rows for {}", records.len(), day.key()),
            Err(err) => error!("failed to fetch {} from the store: {err}", day.key()),
        }
        result
    }

    async fn add_record(&self, draft: &NewRecordDraft) -> Result<(), ServiceError> {
        let endpoint = self.endpoint_for_write("add flat")?;
        let command = SheetCommand::AddFlatToBothDays {
            data: SheetDraft::from(draft),
        };
        let (status, body) = self.post(endpoint, &command).await.inspect_err(|err| {
            error!("failed to add flat {}: {err}", draft.flat_number);
        })?;
        if !status.is_success() {
            let message = format!("Failed to add flat: {}", extract_message(status, &body));
            error!("{message}");
            return Err(ServiceError::Remote(message));
        }
        Ok(())
    }

    async fn update_served_count(
        &self,
        row_index: u32,
        day: Day,
        new_count: u32,
    ) -> Result<(), ServiceError> {
        let endpoint = self.endpoint_for_write("update sheet")?;
        let command = SheetCommand::UpdateCount {
            row_index,
            day,
            new_count,
        };
        let (status, body) = self.post(endpoint, &command).await.inspect_err(|err| {
            error!("failed to update {} row {row_index}: {err}", day.key());
        })?;
        if !status.is_success() {
            let message = format!(
                "Failed to update {} sheet: {}",
                day.key(),
                extract_message(status, &body)
            );
            error!("{message}");
            return Err(ServiceError::Remote(message));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "action")]
enum SheetCommand<'a> {
    #[serde(rename = "updateCount", rename_all = "camelCase")]
    UpdateCount { row_index: u32, day: Day, new_count: u32 },
    #[serde(rename = "addFlatToBothDays")]
    AddFlatToBothDays { data: SheetDraft<'a> },
}

#[derive(Debug, Serialize)]
struct SheetDraft<'a> {
    #[serde(rename = "Building Name", skip_serializing_if = "Option::is_none")]
    building_name: Option<&'a str>,
    #[serde(rename = "Flat Number")]
    flat_number: &'a str,
    #[serde(rename = "Subscribed Plates")]
    subscribed_plates: u32,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "Phone Number", skip_serializing_if = "Option::is_none")]
    phone_number: Option<&'a str>,
    #[serde(rename = "Amount Paid", skip_serializing_if = "Option::is_none")]
    amount_paid: Option<f64>,
}

impl<'a> From<&'a NewRecordDraft> for SheetDraft<'a> {
    fn from(draft: &'a NewRecordDraft) -> Self {
        Self {
            building_name: draft.building_name.as_deref(),
            flat_number: &draft.flat_number,
            subscribed_plates: draft.subscribed_plates,
            name: draft.name.as_deref(),
            phone_number: draft.phone_number.as_deref(),
            amount_paid: draft.amount_paid,
        }
    }
}

/// Picks the most specific message out of a failed store response: a JSON
/// `message` field, then the raw body, then the status reason.
pub fn extract_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str::<ErrorBody>(body) {
        if !message.trim().is_empty() {
            return message;
        }
    }

    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

pub fn parse_day(day: Day, payload: Value) -> Result<Vec<Record>, ServiceError> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(ref object) if object.get("error").is_some_and(|e| !e.is_null()) => {
            let message = match &object["error"] {
                Value::String(message) => message.clone(),
                other => other.to_string(),
            };
            return Err(ServiceError::Remote(message));
        }
        _ => {
            return Err(ServiceError::Format(format!(
                "Received unexpected data format for {}. Please check the Apps Script and sheet headers.",
                day.key()
            )));
        }
    };

    let records = rows
        .iter()
        .enumerate()
        .filter_map(|(position, row)| {
            let record = row
                .as_object()
                .and_then(|object| parse_record(&normalize_row(object)));
            if record.is_none() {
                warn!(
                    "skipping row {} for {}: no usable row_index",
                    position + 1,
                    day.key()
                );
            }
            record
        })
        .collect();
    Ok(records)
}

/// Re-keys a wire row by normalized field name, preferring the normalized key
/// over the spreadsheet header when both carry a value.
fn normalize_row(row: &Map<String, Value>) -> Map<String, Value> {
    FIELD_ALIASES
        .iter()
        .filter_map(|(normalized, header)| {
            let value = row
                .get(*normalized)
                .filter(|value| !value.is_null())
                .or_else(|| row.get(*header).filter(|value| !value.is_null()))?;
            Some((normalized.to_string(), value.clone()))
        })
        .collect()
}

fn parse_record(row: &Map<String, Value>) -> Option<Record> {
    let row_index = row.get("row_index").and_then(number)?;
    let count = |key: &str| match row.get(key) {
        Some(value) if !is_blank(value) => number(value).unwrap_or_else(|| {
            warn!("row {row_index}: ignoring {key} value {value}, expected a whole number");
            0
        }),
        _ => 0,
    };

    Some(Record {
        row_index,
        flat_number: row.get("flat_number").and_then(text),
        building_name: row.get("building_name").and_then(text),
        name: row.get("name").and_then(text),
        phone_number: row.get("phone_number").and_then(text),
        amount_paid: row.get("amount_paid").and_then(decimal),
        subscribed: PlateCounts {
            day1: count("subscribed_plates_day1"),
            day2: count("subscribed_plates_day2"),
        },
        served: PlateCounts {
            day1: count("served_plates_day1"),
            day2: count("served_plates_day2"),
        },
    })
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => Some(raw.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(raw) if raw.trim().is_empty())
}

fn number(value: &Value) -> Option<u32> {
    let value = decimal(value)?;
    if value < 0.0 || value > f64::from(u32::MAX) || value.fract() != 0.0 {
        return None;
    }
    Some(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_and_normalized_rows_parse_to_the_same_record() {
        let normalized = json!([{
            "row_index": 2,
            "flat_number": "A1",
            "name": "Das",
            "subscribed_plates_day1": 2,
            "served_plates_day1": 1,
            "subscribed_plates_day2": 0,
            "served_plates_day2": 0
        }]);
        let headers = json!([{
            "row_index": 2,
            "Flat Number": "A1",
            "Name": "Das",
            "Subscribed Plates - Day 1": "2",
            "Served Plates - Day 1": 1,
            "Subscribed Plates - Day 2": "",
            "Served Plates - Day 2": ""
        }]);

        let from_normalized = parse_day(Day::Day1, normalized).unwrap();
        let from_headers = parse_day(Day::Day1, headers).unwrap();
        assert_eq!(from_normalized, from_headers);
        assert_eq!(from_normalized[0].subscribed.day1, 2);
        assert_eq!(from_normalized[0].served.day1, 1);
    }

    #[test]
    fn normalized_key_wins_over_header() {
        let payload = json!([{
            "row_index": 3,
            "flat_number": "B2",
            "Flat Number": "WRONG",
            "served_plates_day1": null,
            "Served Plates - Day 1": 4,
            "subscribed_plates_day1": 5
        }]);
        let records = parse_day(Day::Day1, payload).unwrap();
        assert_eq!(records[0].flat_number.as_deref(), Some("B2"));
        assert_eq!(records[0].served.day1, 4);
    }

    #[test]
    fn missing_label_is_kept_and_missing_counts_are_zero() {
        let payload = json!([{ "row_index": 7, "Phone Number": 9876543210u64 }]);
        let records = parse_day(Day::Day2, payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].flat_number, None);
        assert_eq!(records[0].phone_number.as_deref(), Some("9876543210"));
        assert_eq!(records[0].subscribed, PlateCounts::default());
    }

    #[test]
    fn error_payload_and_wrong_shapes_are_typed() {
        let remote = parse_day(Day::Day1, json!({ "error": "Sheet 'Day 1' not found" }));
        assert_eq!(
            remote,
            Err(ServiceError::Remote("Sheet 'Day 1' not found".to_string()))
        );

        let not_a_list = parse_day(Day::Day1, json!({ "rows": [] }));
        assert!(matches!(not_a_list, Err(ServiceError::Format(_))));

    }

    #[test]
    fn rows_without_identity_are_skipped() {
        let payload = json!([
            { "flat_number": "A1", "subscribed_plates_day1": 2 },
            { "row_index": "2.5", "flat_number": "A2" },
            7,
            { "row_index": "4", "flat_number": "B1", "subscribed_plates_day1": 1 }
        ]);
        let records = parse_day(Day::Day1, payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row_index, 4);
        assert_eq!(records[0].flat_number.as_deref(), Some("B1"));
    }

    #[test]
    fn fractional_counts_are_not_truncated() {
        let payload = json!([{
            "row_index": 5,
            "subscribed_plates_day1": "2.5",
            "served_plates_day1": 1.0,
            "subscribed_plates_day2": 3
        }]);
        let records = parse_day(Day::Day1, payload).unwrap();
        assert_eq!(records[0].subscribed.day1, 0);
        assert_eq!(records[0].served.day1, 1);
        assert_eq!(records[0].subscribed.day2, 3);
    }

    #[test]
    fn message_extraction_falls_back_in_order() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(extract_message(status, r#"{"message":"row locked"}"#), "row locked");
        assert_eq!(extract_message(status, "script exploded"), "script exploded");
        assert_eq!(extract_message(status, "  "), "Internal Server Error");
    }

    #[test]
    fn commands_use_the_script_wire_shape() {
        let update = SheetCommand::UpdateCount {
            row_index: 4,
            day: Day::Day2,
            new_count: 3,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "action": "updateCount", "rowIndex": 4, "day": "day2", "newCount": 3 })
        );

        let draft = NewRecordDraft {
            flat_number: "C3".to_string(),
            subscribed_plates: 2,
            name: Some("Sen".to_string()),
            ..NewRecordDraft::default()
        };
        let add = SheetCommand::AddFlatToBothDays {
            data: SheetDraft::from(&draft),
        };
        assert_eq!(
            serde_json::to_value(&add).unwrap(),
            json!({
                "action": "addFlatToBothDays",
                "data": { "Flat Number": "C3", "Subscribed Plates": 2, "Name": "Sen" }
            })
        );
    }

    #[tokio::test]
    async fn unconfigured_store_reads_empty_and_refuses_writes() {
        let store = SheetClient::new(None, Duration::from_secs(1)).unwrap();
        assert_eq!(store.fetch_day(Day::Day1).await, Ok(Vec::new()));

        let update = store.update_served_count(1, Day::Day1, 1).await;
        assert!(matches!(update, Err(ServiceError::Configuration(_))));

        let add = store.add_record(&NewRecordDraft::default()).await;
        assert!(matches!(add, Err(ServiceError::Configuration(_))));
    }
}
