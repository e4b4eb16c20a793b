//! Configuration types and re-exports

pub use super::{
    AppConfig, EndpointConfig, EndpointsConfig, LoggingConfig, ReportConfig, ScheduleConfig,
    TelegramConfig,
};
