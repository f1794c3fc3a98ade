use std::str::FromStr;

use log::{warn, LevelFilter};
use miniquad::conf;

pub const LOG_ENV: &str = "SPINQUAD_LOG";

/// Launch settings
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Window title
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub high_dpi: bool,
    pub resizable: bool,

    /// MSAA samples
    pub sample_count: i32,

    pub log_level: LevelFilter,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "spinquad".to_string(),
            width: 800,
            height: 600,
            high_dpi: true,
            resizable: true,
            sample_count: 1,
            log_level: LevelFilter::Info,
        }
    }
}

impl Settings {
    /// Defaults, with the log level taken from `SPINQUAD_LOG` when set.
    pub fn from_env() -> Self {
        Self::default().log_level_from(std::env::var(LOG_ENV).ok().as_deref())
    }

    pub fn log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = log_level;
        self
    }

    fn log_level_from(self, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => self,
            Some(value) => match LevelFilter::from_str(value) {
                Ok(level) => self.log_level(level),
                Err(_) => {
                    warn!("ignoring {}={:?}, not a log level", LOG_ENV, value);
                    self
                }
            },
        }
    }

    pub fn conf(&self) -> conf::Conf {
        conf::Conf {
            window_title: self.title.clone(),
            window_width: self.width,
            window_height: self.height,
            high_dpi: self.high_dpi,
            window_resizable: self.resizable,
            sample_count: self.sample_count,
            ..Default::default()
        }
    }
}
