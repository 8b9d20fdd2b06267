use chrono::NaiveDateTime;

#[derive(Debug, thiserror::Error)]
pub enum ReshapeError {
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("invalid value range: min {min} is not <= max {max}")]
    InvalidValueRange { min: f64, max: f64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("data source {source_name}: {reason}")]
    DataSource { source_name: String, reason: String },

    #[error("config error: {0}")]
    Config(String),
}

impl ReshapeError {
    pub fn data_source(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataSource {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// True for `start > end` and `min > max` violations.
    pub fn is_invalid_range(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimeRange { .. } | Self::InvalidValueRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReshapeError>;
