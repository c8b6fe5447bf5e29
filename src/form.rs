use crate::dates::sync_end_date;
use crate::models::{ServiceLog, ServiceLogFormValues, ServiceType};
use crate::validation::{default_form_values, validate_form_values, FormField, ValidationErrors};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    ProviderId(String),
    ServiceOrder(String),
    CarId(String),
    Odometer(f64),
    EngineHours(f64),
    StartDate(String),
    EndDate(String),
    Type(ServiceType),
    ServiceDescription(String),
}

impl FieldChange {
    pub fn field(&self) -> FormField {
        match self {
            Self::ProviderId(_) => FormField::ProviderId,
            Self::ServiceOrder(_) => FormField::ServiceOrder,
            Self::CarId(_) => FormField::CarId,
            Self::Odometer(_) => FormField::Odometer,
            Self::EngineHours(_) => FormField::EngineHours,
            Self::StartDate(_) => FormField::StartDate,
            Self::EndDate(_) => FormField::EndDate,
            Self::Type(_) => FormField::Type,
            Self::ServiceDescription(_) => FormField::ServiceDescription,
        }
    }

    fn apply_to(self, values: &mut ServiceLogFormValues) {
        match self {
            Self::ProviderId(value) => values.provider_id = value,
            Self::ServiceOrder(value) => values.service_order = value,
            Self::CarId(value) => values.car_id = value,
            Self::Odometer(value) => values.odometer = value,
            Self::EngineHours(value) => values.engine_hours = value,
            Self::StartDate(value) => values.start_date = value,
            Self::EndDate(value) => values.end_date = value,
            Self::Type(value) => values.service_type = value,
            Self::ServiceDescription(value) => values.service_description = value,
        }
    }
}

/// Field buffer behind the entry form. A start date change pulls the end date to the
/// following day.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLogForm {
    values: ServiceLogFormValues,
}

impl Default for ServiceLogForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceLogForm {
    pub fn new() -> Self {
        Self {
            values: default_form_values(),
        }
    }

    pub fn values(&self) -> &ServiceLogFormValues {
        &self.values
    }

    pub fn apply(&mut self, change: FieldChange) -> &ServiceLogFormValues {
        let start_date_changed = matches!(&change, FieldChange::StartDate(date) if *date != self.values.start_date);
        change.apply_to(&mut self.values);
        if start_date_changed {
            sync_end_date(&mut self.values);
        }
        &self.values
    }

    /// Replaces every field, e.g. when a draft becomes active.
    pub fn load(&mut self, values: ServiceLogFormValues) {
        self.values = values;
        sync_end_date(&mut self.values);
    }

    pub fn reset(&mut self) {
        self.values = default_form_values();
    }

    pub fn validate(&self) -> Result<ServiceLogFormValues, ValidationErrors> {
        validate_form_values(&self.values)?;
        Ok(self.values.clone())
    }
}

/// Editing session for one committed log.
#[derive(Debug, Clone, PartialEq)]
pub struct EditServiceLogDialog {
    log_id: String,
    form: ServiceLogForm,
}

impl EditServiceLogDialog {
    pub fn open(log: &ServiceLog) -> Self {
        let mut form = ServiceLogForm::new();
        form.load(log.values.clone());
        Self {
            log_id: log.id.clone(),
            form,
        }
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    pub fn values(&self) -> &ServiceLogFormValues {
        self.form.values()
    }

    pub fn apply(&mut self, change: FieldChange) -> &ServiceLogFormValues {
        self.form.apply(change)
    }

    pub fn validate(&self) -> Result<ServiceLogFormValues, ValidationErrors> {
        self.form.validate()
    }
}
