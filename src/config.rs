//! Global switch config and its on-disk defaults.
//!
//! Loaded from JSON via `serde`/`serde_json`, the same way a P4-frontend daemon in this family of
//! agents reads its runtime configuration, for the handful of fields a real switch agent would
//! read from a config file at startup (the descriptive strings) rather than hardcode.

use serde::{Deserialize, Serialize};

/// `desc_stats`: static strings reported by `DESC_STATS_REQUEST`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescStats {
    #[serde(default)]
    pub mfr_desc: String,
    #[serde(default)]
    pub hw_desc: String,
    #[serde(default)]
    pub sw_desc: String,
    #[serde(default)]
    pub serial_num: String,
    #[serde(default)]
    pub dp_desc: String,
}

fn default_miss_send_len() -> u16 {
    128
}

/// Process-wide switch config: `flags`, `miss_send_len`, `config_set_done`, and `desc_stats`.
/// Set by `SET_CONFIG`, read by `GET_CONFIG` and (conceptually) by the datapath's
/// miss path, which lives outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    #[serde(default)]
    pub flags: u16,
    #[serde(default = "default_miss_send_len")]
    pub miss_send_len: u16,
    #[serde(default)]
    pub config_set_done: bool,
    #[serde(default)]
    pub desc: DescStats,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        SwitchConfig {
            flags: 0,
            miss_send_len: default_miss_send_len(),
            config_set_done: false,
            desc: DescStats::default(),
        }
    }
}

impl SwitchConfig {
    /// Load descriptive defaults from a JSON file (`switch.json` in the demo binary); fields
    /// absent from the file fall back to `Default`. Only `desc` is meant to be populated this
    /// way — `flags`/`miss_send_len`/`config_set_done` are mutated at runtime by `SET_CONFIG`,
    /// never persisted (persisting flow *state* is out of scope; persisting config would be the
    /// same category of feature).
    pub fn load_from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_protocol_sane() {
        let cfg = SwitchConfig::default();
        assert_eq!(cfg.flags, 0);
        assert_eq!(cfg.miss_send_len, 128);
        assert!(!cfg.config_set_done);
    }

    #[test]
    fn loads_partial_json_and_fills_defaults() {
        let cfg = SwitchConfig::load_from_json(r#"{"desc": {"mfr_desc": "Acme"}}"#).unwrap();
        assert_eq!(cfg.desc.mfr_desc, "Acme");
        assert_eq!(cfg.desc.hw_desc, "");
        assert_eq!(cfg.miss_send_len, 128);
    }

    #[test]
    fn set_config_round_trips_flags_and_miss_send_len() {
        let mut cfg = SwitchConfig::default();
        cfg.flags = 0x1;
        cfg.miss_send_len = 256;
        cfg.config_set_done = true;
        assert_eq!(cfg.flags, 0x1);
        assert_eq!(cfg.miss_send_len, 256);
        assert!(cfg.config_set_done);
    }
}
