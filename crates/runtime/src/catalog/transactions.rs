//! Transaction search (`/v1/reporting/transactions`).

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::definition::ToolDefinition;
use crate::schema::{DefaultValue, Field};
use crate::validate::Violation;

/// Longest window the reporting API accepts.
pub const MAX_WINDOW_DAYS: i64 = 31;

/// D = denied, P = pending, S = success, V = voided.
const STATUSES: &[&str] = &["D", "P", "S", "V"];

const LIST: &[Field] = &[
    Field::string("transaction_id", "Only this transaction").in_query(),
    Field::one_of("transaction_status", STATUSES, "D, P, S or V").in_query(),
    Field::string(
        "start_date",
        "Window start, RFC 3339 (e.g. 2024-05-01T00:00:00Z) or YYYY-MM-DD; defaults to 31 days \
         before end_date",
    )
    .in_query(),
    Field::string(
        "end_date",
        "Window end, RFC 3339 or YYYY-MM-DD; defaults to now. At most 31 days after start_date",
    )
    .in_query(),
    Field::string("fields", "Response sections to include, e.g. all or transaction_info")
        .in_query()
        .default(DefaultValue::Str("all")),
    Field::integer("page_size", "Transactions per page")
        .in_query()
        .min(1.0)
        .max(500.0)
        .default(DefaultValue::Int(100)),
    Field::integer("page", "Page number, starting at 1")
        .in_query()
        .min(1.0)
        .default(DefaultValue::Int(1)),
];

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_date(raw: &str, bound: Bound) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(datetime.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    let time = match bound {
        Bound::Start => date.and_hms_opt(0, 0, 0)?,
        Bound::End => date.and_hms_opt(23, 59, 59)?,
    };
    Some(time.and_utc())
}

fn read_date(
    args: &Map<String, Value>,
    name: &str,
    bound: Bound,
    violations: &mut Vec<Violation>,
) -> Option<DateTime<Utc>> {
    let raw = args.get(name)?.as_str()?;
    let parsed = parse_date(raw, bound);
    if parsed.is_none() {
        violations.push(Violation::new(
            name,
            format!("{raw:?} is not an RFC 3339 timestamp or YYYY-MM-DD date"),
        ));
    }
    parsed
}

/// Fills the date window and rejects inverted or over-long ranges.
fn date_window(args: &mut Map<String, Value>) -> Result<(), Vec<Violation>> {
    date_window_at(args, Utc::now())
}

fn date_window_at(args: &mut Map<String, Value>, now: DateTime<Utc>) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();
    let start = read_date(args, "start_date", Bound::Start, &mut violations);
    let end = read_date(args, "end_date", Bound::End, &mut violations);
    if !violations.is_empty() {
        return Err(violations);
    }

    let window = Duration::days(MAX_WINDOW_DAYS);
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, (start + window).min(now)),
        (None, Some(end)) => (end - window, end),
        (None, None) => (now - window, now),
    };

    if start > end {
        return Err(vec![Violation::new("start_date", "must not be after end_date")]);
    }
    if end - start > window {
        return Err(vec![Violation::new(
            "end_date",
            format!("date range must not exceed {MAX_WINDOW_DAYS} days"),
        )]);
    }

    args.insert("start_date".into(), format_date(start));
    args.insert("end_date".into(), format_date(end));
    Ok(())
}

fn format_date(date: DateTime<Utc>) -> Value {
    Value::from(date.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub(crate) const TOOLS: &[ToolDefinition] = &[ToolDefinition::get(
    "transactions.list",
    "list_transactions",
    "/v1/reporting/transactions",
)
.titled("List Transactions")
.describe(
    "Search account transactions within a date window of at most 31 days. Without dates, \
     the last 31 days are searched. Transactions can take up to three hours to appear.",
)
.params(LIST)
.prepare(date_window)];
