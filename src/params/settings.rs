//! Settings documents
//!
//! A settings document is a flat JSON object mapping parameter keys to values:
//!
//! ```json
//! { "on1": true, "vol1": 12.0, "dc1": 2, "vol": 0.8 }
//! ```
//!
//! Loading accepts numbers, booleans and numeric strings for every parameter,
//! clamps out-of-range values and leaves parameters with missing keys alone.
//! The whole document is validated before any parameter is written.

use super::{InstrumentParams, ParamKind, ParamRef};
use crate::{Result, Rp2a03Error};
use serde_json::{Map, Value};
use tracing::{debug, warn};

impl InstrumentParams {
    /// Write every parameter into a JSON object
    pub fn save_settings(&self) -> Value {
        let mut doc = Map::new();
        for param in self.params() {
            let key = param.descriptor().key.to_string();
            let value = match param {
                ParamRef::Bool(p) => Value::Bool(p.value()),
                ParamRef::Int(p) => Value::from(p.value()),
                ParamRef::Float(p) => Value::from(p.value() as f64),
                ParamRef::Detune(p) => Value::from(p.value() as f64),
            };
            doc.insert(key, value);
        }
        Value::Object(doc)
    }

    /// Read parameters from a JSON object
    ///
    /// Fails with [`Rp2a03Error::SettingsError`] if the document is not an
    /// object or a value cannot be read as a number; nothing is written then.
    pub fn load_settings(&self, doc: &Value) -> Result<()> {
        let object = doc.as_object().ok_or_else(|| {
            Rp2a03Error::SettingsError(format!(
                "settings document must be an object, got {}",
                json_type_name(doc)
            ))
        })?;

        let mut updates = Vec::new();
        for param in self.params() {
            let descriptor = param.descriptor();
            let Some(raw) = object.get(descriptor.key) else {
                continue;
            };
            let value = parse_value(descriptor.key, descriptor.kind, raw)?;
            if value < descriptor.min || value > descriptor.max {
                warn!(
                    key = descriptor.key,
                    value,
                    min = descriptor.min,
                    max = descriptor.max,
                    "clamping out-of-range setting"
                );
            }
            updates.push((param, value));
        }

        for key in object.keys() {
            if self.param(key).is_none() {
                warn!(key = key.as_str(), "ignoring unknown setting");
            }
        }

        debug!(count = updates.len(), "loaded instrument settings");
        for (param, value) in updates {
            param.set(value);
        }
        Ok(())
    }

    /// Serialize every parameter as a pretty-printed JSON string
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.save_settings())?)
    }

    /// Build a parameter set from a JSON settings string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(json)?;
        let params = Self::new();
        params.load_settings(&doc)?;
        Ok(params)
    }
}

fn parse_value(key: &str, kind: ParamKind, raw: &Value) -> Result<f32> {
    let value = match raw {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => {
            let s = s.trim();
            match (kind, s) {
                (ParamKind::Bool, "true") => Some(1.0),
                (ParamKind::Bool, "false") => Some(0.0),
                _ => s.parse::<f32>().ok(),
            }
        }
        _ => None,
    };

    value.filter(|v| v.is_finite()).ok_or_else(|| {
        Rp2a03Error::SettingsError(format!(
            "invalid value for '{key}': expected a number, bool or numeric string, got {raw}"
        ))
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    #[test]
    fn test_save_writes_every_key() {
        let params = InstrumentParams::new();
        let doc = params.save_settings();
        let object = doc.as_object().expect("object");
        assert_eq!(object.len(), 33);
        assert_eq!(object["on1"], json!(true));
        assert_eq!(object["dc2"], json!(2));
        assert_eq!(object["vol"], json!(1.0));
    }

    #[test]
    fn test_save_then_load_restores_values() {
        let source = InstrumentParams::new();
        source.pulse1.volume.set(9.0);
        source.pulse2.coarse_detune.set(-5.0);
        source.noise.short_mode.set(true);
        source.master_volume.set(0.42);
        source.vibrato.set(3.0);

        let restored = InstrumentParams::new();
        restored
            .load_settings(&source.save_settings())
            .expect("load");
        assert_eq!(restored.snapshot(), source.snapshot());
    }

    #[test]
    fn test_load_accepts_mixed_representations() {
        let params = InstrumentParams::new();
        params
            .load_settings(&json!({
                "on1": 0,
                "vol1": "7",
                "envon1": "true",
                "dc1": 3.0,
                "vol": "0.5",
                "sweep2": true,
            }))
            .expect("load");
        assert!(!params.pulse1.enabled.value());
        assert_eq!(params.pulse1.volume.value(), 7.0);
        assert!(params.pulse1.envelope_enabled.value());
        assert_eq!(params.pulse1.duty_cycle.value(), 3);
        assert_abs_diff_eq!(params.master_volume.value(), 0.5, epsilon = 1e-6);
        assert!(params.pulse2.sweep_enabled.value());
    }

    #[test]
    fn test_load_clamps_and_keeps_missing() {
        let params = InstrumentParams::new();
        params.triangle.volume.set(3.0);
        params
            .load_settings(&json!({ "vol1": 99, "crs1": 100, "bogus": 1 }))
            .expect("load");
        assert_eq!(params.pulse1.volume.value(), 15.0);
        assert_eq!(params.pulse1.coarse_detune.value(), 24.0);
        assert_abs_diff_eq!(params.pulse1.coarse_detune.multiplier(), 4.0, epsilon = 1e-5);
        assert_eq!(params.triangle.volume.value(), 3.0);
    }

    #[test]
    fn test_load_rejects_non_object() {
        let params = InstrumentParams::new();
        let err = params.load_settings(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Rp2a03Error::SettingsError(_)));
    }

    #[test]
    fn test_load_rejects_bad_value_without_partial_write() {
        let params = InstrumentParams::new();
        let err = params
            .load_settings(&json!({ "on1": false, "vol2": "loud" }))
            .unwrap_err();
        assert!(matches!(err, Rp2a03Error::SettingsError(_)));
        // Validation happens before any write
        assert!(params.pulse1.enabled.value());

        let err = params.load_settings(&json!({ "vol3": null })).unwrap_err();
        assert!(matches!(err, Rp2a03Error::SettingsError(_)));
    }

    #[test]
    fn test_json_string_helpers() {
        let params = InstrumentParams::new();
        params.noise.frequency_index.set(11.0);
        let text = params.to_json_string().expect("serialize");
        let restored = InstrumentParams::from_json_str(&text).expect("parse");
        assert_eq!(restored.noise.frequency_index.value(), 11.0);

        let err = InstrumentParams::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Rp2a03Error::SettingsError(_)));
    }
}
