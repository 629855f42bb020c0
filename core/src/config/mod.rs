mod load;
mod types;

pub use load::{
    apply_env_overrides, get_envsetup_data_dir, load_default, load_from_path, parse_language_list,
};
pub use types::{
    AppConfig, EngineConfig, LoggingConfig, RetryConfig, VerifyConfig, DEFAULT_TIMEOUT_SECS,
    MAX_TIMEOUT_SECS,
};
