//! Engine configuration.

use std::path::Path;

use kandle_aggregate::MovingAverageEngine;
use kandle_types::{KandleError, Result, Tz};
use serde::{Deserialize, Serialize};

/// Settings for a [`crate::CandleEngine`].
///
/// Missing fields in a configuration file fall back to [`EngineConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Zone candle timestamps are expressed in.
    pub timezone: Tz,
    /// Moving average window sizes, in output order.
    pub ma_windows: Vec<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::Asia__Ho_Chi_Minh,
            ma_windows: MovingAverageEngine::DEFAULT_WINDOWS.to_vec(),
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails [`EngineConfig::validate`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the timezone.
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the moving average windows.
    #[must_use]
    pub fn with_ma_windows(mut self, windows: impl IntoIterator<Item = usize>) -> Self {
        self.ma_windows = windows.into_iter().collect();
        self
    }

    /// Checks the configuration for values the engine cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::InvalidWindow`] for a zero window and
    /// [`KandleError::Config`] for a repeated one.
    pub fn validate(&self) -> Result<()> {
        for (i, &window) in self.ma_windows.iter().enumerate() {
            if window == 0 {
                return Err(KandleError::InvalidWindow(window));
            }
            if self.ma_windows[..i].contains(&window) {
                return Err(KandleError::Config(format!(
                    "moving average window {window} listed twice"
                )));
            }
        }
        Ok(())
    }
}
