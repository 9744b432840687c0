//! `mmds` resource (spec §4.8): the metadata document itself, as distinct
//! from `mmds_config`. Available in any state once the API socket is live —
//! it is not gated by the pre/post-boot schema machinery the other
//! resources use.

use serde_json::Value;

/// The live MMDS data store, mirrored locally so callers can inspect it
/// without a round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mmds {
    pub data: Value,
    pub applied: bool,
}

impl Mmds {
    pub fn new() -> Self {
        Self { data: Value::Object(Default::default()), applied: false }
    }

    /// Replace the whole document.
    pub fn replace(&mut self, data: Value) {
        self.data = data;
        self.applied = false;
    }

    /// Set a single top-level key, creating the object if absent.
    pub fn set_key(&mut self, key: &str, value: Value) {
        if !self.data.is_object() {
            self.data = Value::Object(Default::default());
        }
        self.data
            .as_object_mut()
            .expect("just ensured object")
            .insert(key.to_string(), value);
        self.applied = false;
    }

    /// Update a single key via `update_fn`, seeding it with `default` if the
    /// key is absent.
    pub fn update_key_with(
        &mut self,
        key: &str,
        default: Value,
        update_fn: impl FnOnce(Value) -> Value,
    ) {
        if !self.data.is_object() {
            self.data = Value::Object(Default::default());
        }
        let obj = self.data.as_object_mut().expect("just ensured object");
        let current = obj.get(key).cloned().unwrap_or(default);
        obj.insert(key.to_string(), update_fn(current));
        self.applied = false;
    }
}

impl crate::resources::Applied for Mmds {
    fn is_applied(&self) -> bool {
        self.applied
    }

    fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_key_creates_object_from_empty() {
        let mut m = Mmds { data: Value::Null, applied: false };
        m.set_key("foo", Value::String("bar".into()));
        assert_eq!(m.data["foo"], Value::String("bar".into()));
    }

    #[test]
    fn update_key_with_seeds_default() {
        let mut m = Mmds::new();
        m.update_key_with("count", Value::from(0), |v| {
            Value::from(v.as_i64().unwrap_or(0) + 1)
        });
        assert_eq!(m.data["count"], Value::from(1));
        m.update_key_with("count", Value::from(0), |v| {
            Value::from(v.as_i64().unwrap_or(0) + 1)
        });
        assert_eq!(m.data["count"], Value::from(2));
    }
}
