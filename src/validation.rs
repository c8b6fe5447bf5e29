use crate::dates::{default_dates, parse_date_input};
use crate::errors::AppError;
use crate::models::{ServiceLogFormValues, ServiceType};
use std::fmt;

pub const MIN_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    ProviderId,
    ServiceOrder,
    CarId,
    Odometer,
    EngineHours,
    StartDate,
    EndDate,
    Type,
    ServiceDescription,
}

impl FormField {
    pub const ALL: [FormField; 9] = [
        Self::ProviderId,
        Self::ServiceOrder,
        Self::CarId,
        Self::Odometer,
        Self::EngineHours,
        Self::StartDate,
        Self::EndDate,
        Self::Type,
        Self::ServiceDescription,
    ];

    /// Serialized field name, also used as the CSV header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProviderId => "providerId",
            Self::ServiceOrder => "serviceOrder",
            Self::CarId => "carId",
            Self::Odometer => "odometer",
            Self::EngineHours => "engineHours",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::Type => "type",
            Self::ServiceDescription => "serviceDescription",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: FormField, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: FormField) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field.as_str(), error.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

pub fn default_form_values() -> ServiceLogFormValues {
    let dates = default_dates();
    ServiceLogFormValues {
        provider_id: String::new(),
        service_order: String::new(),
        car_id: String::new(),
        odometer: 0.0,
        engine_hours: 0.0,
        start_date: dates.start_date,
        end_date: dates.end_date,
        service_type: ServiceType::Planned,
        service_description: String::new(),
    }
}

/// Validates a whole candidate record so cross-field rules can see sibling values.
pub fn validate_form_values(values: &ServiceLogFormValues) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if values.provider_id.trim().is_empty() {
        errors.push(FormField::ProviderId, "Provider ID is required");
    }
    if values.service_order.trim().is_empty() {
        errors.push(FormField::ServiceOrder, "Service order is required");
    }
    if values.car_id.trim().is_empty() {
        errors.push(FormField::CarId, "Car ID is required");
    }

    if !values.odometer.is_finite() {
        errors.push(FormField::Odometer, "Odometer must be a number");
    } else if values.odometer < 0.0 {
        errors.push(FormField::Odometer, "Odometer cannot be negative");
    }
    if !values.engine_hours.is_finite() {
        errors.push(FormField::EngineHours, "Engine hours must be a number");
    } else if values.engine_hours < 0.0 {
        errors.push(FormField::EngineHours, "Engine hours cannot be negative");
    }

    if values.start_date.is_empty() {
        errors.push(FormField::StartDate, "Start date is required");
    }
    if values.end_date.is_empty() {
        errors.push(FormField::EndDate, "End date is required");
    } else if !end_is_after_start(&values.start_date, &values.end_date) {
        errors.push(FormField::EndDate, "End date must be after start date");
    }

    let description = values.service_description.trim();
    if description.is_empty() {
        errors.push(FormField::ServiceDescription, "Service description is required");
    } else if description.chars().count() < MIN_DESCRIPTION_CHARS {
        errors.push(FormField::ServiceDescription, "Min 10 characters");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn end_is_after_start(start: &str, end: &str) -> bool {
    match (parse_date_input(start), parse_date_input(end)) {
        (Ok(start), Ok(end)) => end > start,
        _ => false,
    }
}
