use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const MAX_SYMBOL_LEN: usize = 10;
const MAX_ALERT_TYPE_LEN: usize = 50;
const MAX_CONDITION_LEN: usize = 20;

/// A user-defined stock alert. Active alerts drive which news gets ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub symbol: String,
    pub alert_type: String,
    pub condition: String,
    pub threshold_value: Option<f64>,
    pub message: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    pub symbol: String,
    pub alert_type: String,
    pub condition: String,
    #[serde(default)]
    pub threshold_value: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

impl NewAlert {
    pub fn validate(&self) -> Result<()> {
        check_length("symbol", &self.symbol, MAX_SYMBOL_LEN)?;
        check_length("alert_type", &self.alert_type, MAX_ALERT_TYPE_LEN)?;
        check_length("condition", &self.condition, MAX_CONDITION_LEN)
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertUpdate {
    pub symbol: Option<String>,
    pub alert_type: Option<String>,
    pub condition: Option<String>,
    pub threshold_value: Option<f64>,
    pub message: Option<String>,
    pub is_active: Option<bool>,
}

impl AlertUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(symbol) = &self.symbol {
            check_length("symbol", symbol, MAX_SYMBOL_LEN)?;
        }
        if let Some(alert_type) = &self.alert_type {
            check_length("alert_type", alert_type, MAX_ALERT_TYPE_LEN)?;
        }
        if let Some(condition) = &self.condition {
            check_length("condition", condition, MAX_CONDITION_LEN)?;
        }
        Ok(())
    }

    pub fn apply(self, alert: &mut Alert) {
        if let Some(symbol) = self.symbol {
            alert.symbol = symbol.to_uppercase();
        }
        if let Some(alert_type) = self.alert_type {
            alert.alert_type = alert_type;
        }
        if let Some(condition) = self.condition {
            alert.condition = condition;
        }
        if let Some(threshold_value) = self.threshold_value {
            alert.threshold_value = Some(threshold_value);
        }
        if let Some(message) = self.message {
            alert.message = Some(message);
        }
        if let Some(is_active) = self.is_active {
            alert.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertFilter {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_alert_limit")]
    pub limit: u32,
    pub symbol: Option<String>,
    pub is_active: Option<bool>,
}

fn default_alert_limit() -> u32 {
    100
}

impl Default for AlertFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_alert_limit(),
            symbol: None,
            is_active: None,
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(AppError::Validation(format!(
            "{} must be between 1 and {} characters",
            field, max
        )));
    }
    Ok(())
}
