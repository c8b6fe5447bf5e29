use crate::models::{ServiceLogFormValues, ServiceType};
use crate::validation::FormField;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Downloadable example file with the expected header row.
pub const CSV_TEMPLATE: &str = include_str!("../assets/service_logs_template.csv");

static DATE_INPUT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvParseResult {
    pub rows: Vec<ServiceLogFormValues>,
    pub errors: Vec<String>,
}

/// Splits one CSV line into trimmed cells. A doubled quote inside a quoted field is a
/// literal quote; any other quote toggles quoted mode.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
            continue;
        }

        if ch == ',' && !in_quotes {
            cells.push(current.trim().to_string());
            current.clear();
            continue;
        }

        current.push(ch);
    }

    cells.push(current.trim().to_string());
    cells
}

pub fn parse_service_logs_csv(content: &str) -> CsvParseResult {
    let normalized = content.replace('\r', "");
    let lines = normalized
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    let Some((header_line, data_lines)) = lines.split_first() else {
        return CsvParseResult {
            rows: Vec::new(),
            errors: vec!["CSV file is empty.".to_string()],
        };
    };

    let headers = split_csv_line(header_line);
    let missing = FormField::ALL
        .iter()
        .map(|field| field.as_str())
        .filter(|name| !headers.iter().any(|header| header == name))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return CsvParseResult {
            rows: Vec::new(),
            errors: vec![format!("Missing required headers: {}", missing.join(", "))],
        };
    }

    // later duplicates of a header win
    let header_index = headers
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect::<HashMap<_, _>>();

    let mut result = CsvParseResult::default();
    for (offset, line) in data_lines.iter().enumerate() {
        let cells = split_csv_line(line);
        let read = |field: FormField| {
            header_index
                .get(field.as_str())
                .and_then(|index| cells.get(*index))
                .map(String::as_str)
                .unwrap_or("")
        };

        match parse_row(read) {
            Ok(row) => result.rows.push(row),
            Err(reasons) => {
                // the header occupies row 1
                result
                    .errors
                    .push(format!("Row {}: {}", offset + 2, reasons.join("; ")));
            }
        }
    }

    result
}

fn parse_row<'a>(read: impl Fn(FormField) -> &'a str) -> Result<ServiceLogFormValues, Vec<String>> {
    let provider_id = read(FormField::ProviderId);
    let service_order = read(FormField::ServiceOrder);
    let car_id = read(FormField::CarId);
    let odometer = parse_non_negative(read(FormField::Odometer));
    let engine_hours = parse_non_negative(read(FormField::EngineHours));
    let start_date = read(FormField::StartDate);
    let end_date = read(FormField::EndDate);
    let service_type = read(FormField::Type).parse::<ServiceType>().ok();
    let service_description = read(FormField::ServiceDescription);

    let mut reasons = Vec::new();
    if provider_id.is_empty() {
        reasons.push("providerId is required".to_string());
    }
    if service_order.is_empty() {
        reasons.push("serviceOrder is required".to_string());
    }
    if car_id.is_empty() {
        reasons.push("carId is required".to_string());
    }
    if odometer.is_none() {
        reasons.push("odometer must be a non-negative number".to_string());
    }
    if engine_hours.is_none() {
        reasons.push("engineHours must be a non-negative number".to_string());
    }
    if !DATE_INPUT_PATTERN.is_match(start_date) {
        reasons.push("startDate must be YYYY-MM-DD".to_string());
    }
    if !DATE_INPUT_PATTERN.is_match(end_date) {
        reasons.push("endDate must be YYYY-MM-DD".to_string());
    }
    if service_type.is_none() {
        let allowed = ServiceType::ALL
            .iter()
            .map(|value| value.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        reasons.push(format!("type must be one of: {}", allowed));
    }
    // only non-emptiness here; the interactive minimum length is not applied to imports
    if service_description.is_empty() {
        reasons.push("serviceDescription is required".to_string());
    }

    match (odometer, engine_hours, service_type) {
        (Some(odometer), Some(engine_hours), Some(service_type)) if reasons.is_empty() => {
            Ok(ServiceLogFormValues {
                provider_id: provider_id.to_string(),
                service_order: service_order.to_string(),
                car_id: car_id.to_string(),
                odometer,
                engine_hours,
                start_date: start_date.to_string(),
                end_date: end_date.to_string(),
                service_type,
                service_description: service_description.to_string(),
            })
        }
        _ => Err(reasons),
    }
}

/// An empty cell reads as zero.
fn parse_non_negative(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}
