//! 运行时配置
//!
//! 使用 `config` crate 分层合并，优先级从低到高：
//! 1. 内置默认值（`set_default`）
//! 2. 构建时环境变量（`option_env!`，由 trunk 构建时注入，经 `set_override` 写入）
//! 3. 浏览器存储中 `akr_config` 键下的 JSON 覆盖（可只写部分字段）

use akr_shared::STORAGE_CONFIG_KEY;
use config::{Config, File, FileFormat, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionOptions;
use crate::web::KeyValueStore;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

/// 数据后端选择
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// REST API，如 `http://localhost:8000`
    Rest { base_url: String },
    /// 托管数据库的 PostgREST 接口
    Postgrest { url: String, anon_key: String },
    /// 进程内演示数据
    Memory,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Rest {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// 模拟登录请求的延迟
    pub login_delay_ms: u32,
    pub clear_session_on_start: bool,
    pub force_logout_for_demo: bool,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            login_delay_ms: 1000,
            clear_session_on_start: true,
            force_logout_for_demo: false,
            log_level: "info".to_string(),
        }
    }
}

/// 构建时注入的环境变量
fn build_env(key: &str) -> Option<String> {
    let value = match key {
        "AKR_BACKEND" => option_env!("AKR_BACKEND"),
        "AKR_API_URL" => option_env!("AKR_API_URL"),
        "AKR_SUPABASE_URL" => option_env!("AKR_SUPABASE_URL"),
        "AKR_SUPABASE_KEY" => option_env!("AKR_SUPABASE_KEY"),
        "AKR_LOG_LEVEL" => option_env!("AKR_LOG_LEVEL"),
        "AKR_FORCE_LOGOUT" => option_env!("AKR_FORCE_LOGOUT"),
        _ => None,
    };
    value.map(str::to_string).filter(|v| !v.trim().is_empty())
}

/// 把环境变量翻译为配置键
///
/// 未显式指定 `AKR_BACKEND` 时，根据提供的地址推断后端类型。
fn env_overrides(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, Value)> {
    let mut overrides: Vec<(&'static str, Value)> = Vec::new();
    let api_url = lookup("AKR_API_URL");
    let supabase = lookup("AKR_SUPABASE_URL").zip(lookup("AKR_SUPABASE_KEY"));

    let kind = lookup("AKR_BACKEND").or_else(|| {
        if supabase.is_some() {
            Some("postgrest".to_string())
        } else if api_url.is_some() {
            Some("rest".to_string())
        } else {
            None
        }
    });

    match kind.as_deref() {
        Some("memory") => overrides.push(("backend.kind", "memory".into())),
        Some("postgrest") => match supabase {
            Some((url, anon_key)) => {
                overrides.push(("backend.kind", "postgrest".into()));
                overrides.push(("backend.url", url.into()));
                overrides.push(("backend.anon_key", anon_key.into()));
            }
            None => log::warn!("[Config] postgrest backend requested without URL/key"),
        },
        Some("rest") => {
            if let Some(base_url) = api_url {
                overrides.push(("backend.kind", "rest".into()));
                overrides.push(("backend.base_url", base_url.into()));
            }
        }
        Some(other) => log::warn!("[Config] Unknown backend '{}'", other),
        None => {}
    }

    if let Some(level) = lookup("AKR_LOG_LEVEL") {
        overrides.push(("log_level", level.into()));
    }
    if let Some(flag) = lookup("AKR_FORCE_LOGOUT") {
        let on = matches!(flag.as_str(), "1" | "true" | "yes");
        overrides.push(("force_logout_for_demo", on.into()));
    }
    overrides
}

impl AppConfig {
    /// 按完整优先级链加载配置
    ///
    /// 存储中的覆盖无法解析时记录警告并忽略，其余层照常生效。
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        let stored = storage.get(STORAGE_CONFIG_KEY);
        match Self::build(build_env, stored.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[Config] Ignoring stored override: {}", e);
                Self::build(build_env, None).unwrap_or_else(|e| {
                    log::error!("[Config] Falling back to defaults: {}", e);
                    Self::default()
                })
            }
        }
    }

    /// 组装三层配置源并反序列化
    ///
    /// 默认值与环境变量先合成基础层，存储中的 JSON 再作为独立源叠加。
    pub fn build(
        lookup: impl Fn(&str) -> Option<String>,
        stored: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("backend.kind", "rest")?
            .set_default("backend.base_url", DEFAULT_API_URL)?
            .set_default("login_delay_ms", i64::from(defaults.login_delay_ms))?
            .set_default("clear_session_on_start", defaults.clear_session_on_start)?
            .set_default("force_logout_for_demo", defaults.force_logout_for_demo)?
            .set_default("log_level", defaults.log_level)?;

        for (key, value) in env_overrides(lookup) {
            builder = builder.set_override(key, value)?;
        }

        // override 在同一 builder 中优先级最高，存储覆盖需叠在其上
        let mut layered = Config::builder().add_source(builder.build()?);
        if let Some(raw) = stored {
            layered = layered.add_source(File::from_str(raw, FileFormat::Json));
        }

        Ok(layered.build()?.try_deserialize()?)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            clear_on_start: self.clear_session_on_start,
            force_logout_for_demo: self.force_logout_for_demo,
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::MemoryKeyValueStore;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_match_demo_behaviour() {
        let config = AppConfig::build(no_env, None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.login_delay_ms, 1000);
        assert!(config.clear_session_on_start);
        assert!(!config.force_logout_for_demo);
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn env_infers_backend_from_urls() {
        let config = AppConfig::build(
            env(&[
                ("AKR_SUPABASE_URL", "https://xyz.supabase.co"),
                ("AKR_SUPABASE_KEY", "anon"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Postgrest {
                url: "https://xyz.supabase.co".into(),
                anon_key: "anon".into()
            }
        );

        let config = AppConfig::build(env(&[("AKR_API_URL", "https://api.test")]), None).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Rest {
                base_url: "https://api.test".into()
            }
        );

        let config = AppConfig::build(
            env(&[
                ("AKR_BACKEND", "memory"),
                ("AKR_API_URL", "https://api.test"),
                ("AKR_FORCE_LOGOUT", "true"),
                ("AKR_LOG_LEVEL", "debug"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(config.backend, BackendConfig::Memory);
        assert!(config.force_logout_for_demo);
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn postgrest_without_credentials_keeps_default_backend() {
        let config = AppConfig::build(env(&[("AKR_BACKEND", "postgrest")]), None).unwrap();
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn stored_override_wins_and_may_be_partial() {
        let kv = MemoryKeyValueStore::new();
        kv.set(
            STORAGE_CONFIG_KEY,
            r#"{"backend":{"kind":"memory"},"login_delay_ms":0}"#,
        );
        let config = AppConfig::load(&kv);
        assert_eq!(config.backend, BackendConfig::Memory);
        assert_eq!(config.login_delay_ms, 0);
        assert!(config.clear_session_on_start);
    }

    #[test]
    fn stored_override_beats_build_env() {
        let config = AppConfig::build(
            env(&[("AKR_API_URL", "https://api.test")]),
            Some(r#"{"backend":{"base_url":"https://override.test"}}"#),
        )
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Rest {
                base_url: "https://override.test".into()
            }
        );
    }

    #[test]
    fn broken_override_is_ignored() {
        let kv = MemoryKeyValueStore::new();
        kv.set(STORAGE_CONFIG_KEY, "{not json");
        let config = AppConfig::load(&kv);
        assert_eq!(config.login_delay_ms, 1000);

        assert!(AppConfig::build(no_env, Some("{not json")).is_err());
    }

    #[test]
    fn session_options_follow_flags() {
        let config = AppConfig::build(
            no_env,
            Some(r#"{"clear_session_on_start":false,"force_logout_for_demo":true}"#),
        )
        .unwrap();
        let options = config.session_options();
        assert!(!options.clear_on_start);
        assert!(options.force_logout_for_demo);
    }
}
