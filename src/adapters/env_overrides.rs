//! Parameter overrides from process environment variables.

use crate::ports::config_port::OverridePort;

/// Looks up `<prefix><NAME>` in the environment. With an empty prefix,
/// `ADX_THRESHOLD=25` overrides `adx_threshold`.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    prefix: String,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &str) -> Self {
        EnvOverrides {
            prefix: prefix.to_string(),
        }
    }
}

impl OverridePort for EnvOverrides {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}{}", self.prefix, name))
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}
