//! Configuration access port traits.

use std::collections::HashMap;

/// Sectioned configuration values (INI-style), returned raw. Callers parse
/// and validate them.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}

/// Explicit per-parameter overrides, looked up by upper-cased parameter name.
pub trait OverridePort {
    fn lookup(&self, name: &str) -> Option<String>;
}

impl OverridePort for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// No overrides at all; every parameter comes from config or its default.
pub struct NoOverrides;

impl OverridePort for NoOverrides {
    fn lookup(&self, _name: &str) -> Option<String> {
        None
    }
}
