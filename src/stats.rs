use crate::models::{Day, Record, Summary};

pub fn summarize(records: &[Record], day: Day) -> Summary {
    records
        .iter()
        .filter(|record| record.participates(day))
        .fold(Summary::default(), |mut acc, record| {
            acc.total_subscribed = acc
                .total_subscribed
                .saturating_add(u64::from(record.subscribed.get(day)));
            acc.total_served = acc
                .total_served
                .saturating_add(u64::from(record.served.get(day)));
            acc
        })
}

/// Records shown for `day`: participants whose label or holder name contains
/// `search`, ignoring case. A blank search keeps every participant in order.
pub fn filter_records<'a>(records: &'a [Record], day: Day, search: &str) -> Vec<&'a Record> {
    let needle = search.trim().to_lowercase();
    records
        .iter()
        .filter(|record| record.participates(day))
        .filter(|record| {
            needle.is_empty()
                || [&record.flat_number, &record.name]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}
