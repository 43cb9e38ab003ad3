//! LED matrix configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Physical display settings handed to the render driver.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Panel rows.
    #[serde(default = "default_size")]
    #[validate(range(min = 1, max = 512))]
    pub rows: u32,
    /// Panel columns.
    #[serde(default = "default_size")]
    #[validate(range(min = 1, max = 512))]
    pub cols: u32,
    /// Brightness in percent. Lower values reduce current draw.
    #[serde(default = "default_brightness")]
    #[validate(range(max = 100))]
    pub brightness: u8,
    /// Driver GPIO mapping name.
    #[serde(default = "default_hardware_mapping")]
    pub hardware_mapping: String,
    /// GPIO slowdown factor for faster boards.
    #[serde(default = "default_gpio_slowdown")]
    pub gpio_slowdown: u32,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            rows: default_size(),
            cols: default_size(),
            brightness: default_brightness(),
            hardware_mapping: default_hardware_mapping(),
            gpio_slowdown: default_gpio_slowdown(),
        }
    }
}

fn default_size() -> u32 {
    64
}

fn default_brightness() -> u8 {
    80
}

fn default_hardware_mapping() -> String {
    "adafruit-hat-pwm".to_string()
}

fn default_gpio_slowdown() -> u32 {
    4
}
