//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Per-session settings.
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Expose every signal with a server-side handler, learned or not.
    ///
    /// When off, a signal is only exposed while one of its handlers is
    /// unlearned.
    pub always_expose_signals: bool,

    /// JavaScript object providing client helpers such as `cancelEvent`.
    pub js_scope: String,

    /// JavaScript expression naming the application object that receives
    /// round-trip calls.
    pub app_class: String,

    /// How many times a failing handler is offered to the learner before it
    /// is dispatched dynamically for good. `0` retries forever.
    pub learn_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            always_expose_signals: true,
            js_scope: "Mimic".to_string(),
            app_class: "Mimic.app".to_string(),
            learn_attempts: 3,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the script identifiers can be embedded in markup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_js_path(&self.js_scope) {
            return Err(ConfigError::Invalid(format!(
                "js_scope `{}` is not a JavaScript identifier path",
                self.js_scope
            )));
        }
        if !is_js_path(&self.app_class) {
            return Err(ConfigError::Invalid(format!(
                "app_class `{}` is not a JavaScript identifier path",
                self.app_class
            )));
        }
        Ok(())
    }

    /// Whether a handler with `failures` failed attempts may be learned again.
    pub fn may_retry_learning(&self, failures: u32) -> bool {
        self.learn_attempts == 0 || failures < self.learn_attempts
    }
}

/// `a`, `a.b`, `$x.y_1`, ...
fn is_js_path(value: &str) -> bool {
    !value.is_empty()
        && value.split('.').all(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
                }
                _ => false,
            }
        })
}
