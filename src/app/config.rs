// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::services::rotation::executor::ExecutorTuning;
use crate::services::rotation::session::SessionSettings;
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    // Identity
    #[serde(default, deserialize_with = "deserialize_key_list")]
    pub private_keys: Vec<String>,

    // Swap execution
    #[serde(default = "default_attempts")]
    pub attempts: usize,
    #[serde(default = "default_pause_between_attempts")]
    pub pause_between_attempts: [u64; 2],
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    // Session flow
    #[serde(default = "default_number_of_swaps")]
    pub number_of_swaps: [u32; 2],
    #[serde(default = "default_pause_between_swaps")]
    pub pause_between_swaps: [u64; 2],
    #[serde(default = "default_percent_of_balance")]
    pub percent_of_balance_to_swap: [f64; 2],
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_rpc_url() -> String {
    constants::DEFAULT_RPC_URL.to_string()
}
fn default_explorer_url() -> String {
    constants::DEFAULT_EXPLORER_URL.to_string()
}
fn default_attempts() -> usize {
    5
}
fn default_pause_between_attempts() -> [u64; 2] {
    [3, 10]
}
fn default_slippage_bps() -> u64 {
    50
}
fn default_receipt_poll_ms() -> u64 {
    500
}
fn default_receipt_timeout_ms() -> u64 {
    60_000
}
fn default_number_of_swaps() -> [u32; 2] {
    [3, 8]
}
fn default_pause_between_swaps() -> [u64; 2] {
    [15, 45]
}
fn default_percent_of_balance() -> [f64; 2] {
    [10.0, 35.0]
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: env/.env > config file.
        builder = builder.add_source(Environment::default());

        let mut settings: GlobalSettings = builder.build()?.try_deserialize()?;

        // Allow PRIVATE_KEYS env to be a comma/space separated string.
        if let Ok(keys_str) = std::env::var("PRIVATE_KEYS") {
            settings.private_keys = parse_key_list(&keys_str)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.private_keys.is_empty() {
            return Err(AppError::Config("PRIVATE_KEYS is missing".to_string()));
        }
        for (field, range) in [
            ("pause_between_attempts", self.pause_between_attempts),
            ("pause_between_swaps", self.pause_between_swaps),
        ] {
            if range[0] > range[1] {
                return Err(AppError::Config(format!(
                    "{field} range is inverted: [{}, {}]",
                    range[0], range[1]
                )));
            }
        }
        if self.number_of_swaps[0] > self.number_of_swaps[1] {
            return Err(AppError::Config(format!(
                "number_of_swaps range is inverted: [{}, {}]",
                self.number_of_swaps[0], self.number_of_swaps[1]
            )));
        }
        let [lo, hi] = self.percent_of_balance_to_swap;
        if !(lo > 0.0 && hi >= lo && hi <= 100.0) {
            return Err(AppError::Config(format!(
                "percent_of_balance_to_swap must satisfy 0 < lo <= hi <= 100, got [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    pub fn attempts_value(&self) -> usize {
        self.attempts.max(1)
    }

    pub fn receipt_poll_ms_value(&self) -> u64 {
        self.receipt_poll_ms.max(100)
    }

    pub fn receipt_timeout_ms_value(&self) -> u64 {
        self.receipt_timeout_ms.max(self.receipt_poll_ms_value())
    }

    pub fn executor_tuning(&self) -> ExecutorTuning {
        ExecutorTuning {
            attempts: self.attempts_value(),
            pause_between_attempts: (
                self.pause_between_attempts[0],
                self.pause_between_attempts[1],
            ),
            slippage_bps: self.slippage_bps,
            receipt_poll_ms: self.receipt_poll_ms_value(),
            receipt_timeout_ms: self.receipt_timeout_ms_value(),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            number_of_swaps: (self.number_of_swaps[0], self.number_of_swaps[1]),
            pause_between_swaps: (self.pause_between_swaps[0], self.pause_between_swaps[1]),
            percent_of_balance: (
                self.percent_of_balance_to_swap[0],
                self.percent_of_balance_to_swap[1],
            ),
            explorer_url: self.explorer_url.clone(),
        }
    }
}

fn deserialize_key_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, SeqAccess, Visitor};
    use std::fmt;

    struct KeyVisitor;

    impl<'de> Visitor<'de> for KeyVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of keys or a string with comma-separated keys")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            parse_key_list(v).map_err(E::custom)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(elem) = seq.next_element::<String>()? {
                out.push(elem);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(KeyVisitor)
}

fn parse_key_list(raw: &str) -> Result<Vec<String>, AppError> {
    let cleaned = raw.trim_matches(|c| c == '`' || c == '"' || c == '\'');
    let out: Vec<String> = cleaned
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect();
    if out.is_empty() {
        return Err(AppError::Config("PRIVATE_KEYS env is empty".into()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn env_lock_guard() -> MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn base_settings() -> GlobalSettings {
        GlobalSettings {
            debug: default_debug(),
            rpc_url: default_rpc_url(),
            explorer_url: default_explorer_url(),
            private_keys: vec!["0x01".to_string()],
            attempts: default_attempts(),
            pause_between_attempts: default_pause_between_attempts(),
            slippage_bps: default_slippage_bps(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
            number_of_swaps: default_number_of_swaps(),
            pause_between_swaps: default_pause_between_swaps(),
            percent_of_balance_to_swap: default_percent_of_balance(),
        }
    }

    #[test]
    fn receipt_tuning_values_have_safe_floor() {
        let mut settings = base_settings();
        settings.receipt_poll_ms = 0;
        settings.receipt_timeout_ms = 1;
        settings.attempts = 0;
        assert_eq!(settings.receipt_poll_ms_value(), 100);
        assert_eq!(settings.receipt_timeout_ms_value(), 100);
        assert_eq!(settings.attempts_value(), 1);
    }

    #[test]
    fn missing_keys_fail_validation() {
        let mut settings = base_settings();
        settings.private_keys.clear();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("PRIVATE_KEYS")));
    }

    #[test]
    fn inverted_ranges_fail_validation() {
        let mut settings = base_settings();
        settings.number_of_swaps = [8, 3];
        assert!(settings.validate().is_err());

        let mut settings = base_settings();
        settings.pause_between_swaps = [45, 15];
        assert!(settings.validate().is_err());

        let mut settings = base_settings();
        settings.percent_of_balance_to_swap = [0.0, 35.0];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn parse_key_list_splits_on_commas_and_whitespace() {
        let keys = parse_key_list("0xaa, 0xbb 0xcc").expect("parse keys");
        assert_eq!(keys, vec!["0xaa", "0xbb", "0xcc"]);
        assert!(parse_key_list("  ").is_err());
    }

    #[test]
    fn keys_env_overrides_profile_file() {
        let _env_lock = env_lock_guard();
        let tmp = std::env::temp_dir().join(format!(
            "crystal-swap-config-{}-{}.toml",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let body = r#"
private_keys = ["file_key"]
"#;
        std::fs::write(&tmp, body).expect("write temp config");
        let old_keys = std::env::var("PRIVATE_KEYS").ok();
        unsafe {
            std::env::set_var("PRIVATE_KEYS", "env_key_1,env_key_2");
        }

        let loaded = GlobalSettings::load_with_path(Some(tmp.to_str().expect("utf8 path")))
            .expect("load settings");
        assert_eq!(loaded.private_keys, vec!["env_key_1", "env_key_2"]);

        std::fs::remove_file(&tmp).ok();
        if let Some(v) = old_keys {
            unsafe { std::env::set_var("PRIVATE_KEYS", v) };
        } else {
            unsafe { std::env::remove_var("PRIVATE_KEYS") };
        }
    }

    #[test]
    fn tuning_views_carry_configured_ranges() {
        let settings = base_settings();
        let tuning = settings.executor_tuning();
        assert_eq!(tuning.attempts, 5);
        assert_eq!(tuning.pause_between_attempts, (3, 10));
        let session = settings.session_settings();
        assert_eq!(session.number_of_swaps, (3, 8));
        assert_eq!(session.percent_of_balance, (10.0, 35.0));
    }
}
