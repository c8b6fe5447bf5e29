use crate::models::{ServiceLog, ServiceLogFilters};

fn includes_text(log: &ServiceLog, normalized_query: &str) -> bool {
    if normalized_query.is_empty() {
        return true;
    }
    let values = &log.values;
    let haystack = [
        values.provider_id.clone(),
        values.service_order.clone(),
        values.car_id.clone(),
        values.service_description.clone(),
        values.service_type.to_string(),
        values.odometer.to_string(),
        values.engine_hours.to_string(),
    ]
    .join(" ")
    .to_lowercase();

    haystack.contains(normalized_query)
}

/// Keeps the logs matching every criterion, in their original order.
pub fn filter_logs(logs: &[ServiceLog], filters: &ServiceLogFilters) -> Vec<ServiceLog> {
    let normalized_query = filters.search.trim().to_lowercase();

    logs.iter()
        .filter(|log| includes_text(log, &normalized_query))
        .filter(|log| filters.service_type.matches(log.values.service_type))
        .filter(|log| {
            // fixed-width YYYY-MM-DD compares correctly as text
            filters.start_date_from.is_empty() || log.values.start_date >= filters.start_date_from
        })
        .filter(|log| filters.start_date_to.is_empty() || log.values.start_date <= filters.start_date_to)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_logs;
    use crate::models::{ServiceLog, ServiceLogFilters, ServiceLogFormValues, ServiceType, ServiceTypeFilter};
    use chrono::{DateTime, Utc};

    fn timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    fn logs() -> Vec<ServiceLog> {
        vec![
            ServiceLog {
                id: "1".to_string(),
                values: ServiceLogFormValues {
                    provider_id: "PROV-1".to_string(),
                    service_order: "SO-100".to_string(),
                    car_id: "CAR-A".to_string(),
                    odometer: 1000.0,
                    engine_hours: 10.0,
                    start_date: "2026-02-10".to_string(),
                    end_date: "2026-02-11".to_string(),
                    service_type: ServiceType::Planned,
                    service_description: "Oil change and inspection".to_string(),
                },
                created_at: timestamp("2026-02-10T10:00:00Z"),
                updated_at: timestamp("2026-02-10T10:00:00Z"),
            },
            ServiceLog {
                id: "2".to_string(),
                values: ServiceLogFormValues {
                    provider_id: "PROV-2".to_string(),
                    service_order: "SO-200".to_string(),
                    car_id: "CAR-B".to_string(),
                    odometer: 2500.0,
                    engine_hours: 60.5,
                    start_date: "2026-02-20".to_string(),
                    end_date: "2026-02-21".to_string(),
                    service_type: ServiceType::Emergency,
                    service_description: "Emergency brake repair".to_string(),
                },
                created_at: timestamp("2026-02-20T10:00:00Z"),
                updated_at: timestamp("2026-02-20T10:00:00Z"),
            },
        ]
    }

    fn ids(logs: &[ServiceLog]) -> Vec<&str> {
        logs.iter().map(|log| log.id.as_str()).collect()
    }

    #[test]
    fn filters_by_search_query() {
        let filters = ServiceLogFilters {
            search: "  BRAKE ".to_string(),
            ..ServiceLogFilters::default()
        };
        assert_eq!(ids(&filter_logs(&logs(), &filters)), vec!["2"]);
    }

    #[test]
    fn search_matches_numeric_text_and_type() {
        let by_hours = ServiceLogFilters {
            search: "60.5".to_string(),
            ..ServiceLogFilters::default()
        };
        assert_eq!(ids(&filter_logs(&logs(), &by_hours)), vec!["2"]);

        let by_odometer = ServiceLogFilters {
            search: "1000".to_string(),
            ..ServiceLogFilters::default()
        };
        assert_eq!(ids(&filter_logs(&logs(), &by_odometer)), vec!["1"]);

        let by_type = ServiceLogFilters {
            search: "planned".to_string(),
            ..ServiceLogFilters::default()
        };
        assert_eq!(ids(&filter_logs(&logs(), &by_type)), vec!["1"]);
    }

    #[test]
    fn filters_by_type() {
        let filters = ServiceLogFilters {
            service_type: ServiceTypeFilter::Planned,
            ..ServiceLogFilters::default()
        };
        assert_eq!(ids(&filter_logs(&logs(), &filters)), vec!["1"]);
    }

    #[test]
    fn filters_by_inclusive_start_date_range() {
        let filters = ServiceLogFilters {
            start_date_from: "2026-02-15".to_string(),
            start_date_to: "2026-02-28".to_string(),
            ..ServiceLogFilters::default()
        };
        assert_eq!(ids(&filter_logs(&logs(), &filters)), vec!["2"]);

        let exact = ServiceLogFilters {
            start_date_from: "2026-02-10".to_string(),
            start_date_to: "2026-02-10".to_string(),
            ..ServiceLogFilters::default()
        };
        assert_eq!(ids(&filter_logs(&logs(), &exact)), vec!["1"]);
    }

    #[test]
    fn empty_criteria_keep_everything_in_order() {
        let all = filter_logs(&logs(), &ServiceLogFilters::default());
        assert_eq!(ids(&all), vec!["1", "2"]);
    }

    #[test]
    fn reapplying_criteria_is_stable() {
        let filters = ServiceLogFilters {
            search: "prov".to_string(),
            start_date_to: "2026-03-01".to_string(),
            ..ServiceLogFilters::default()
        };
        let once = filter_logs(&logs(), &filters);
        let twice = filter_logs(&once, &filters);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["1", "2"]);
    }
}
