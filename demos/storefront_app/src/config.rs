// demos/storefront_app/src/config.rs

use crate::errors::{AppError, Result};
use bookcart::{AccountId, EngineConfig};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub engine: EngineConfig,
  pub demo_account: AccountId,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let defaults = EngineConfig::default();
    let max_line_quantity = optional_env("CART_MAX_LINE_QUANTITY")
      .map(|raw| parse_env::<u32>("CART_MAX_LINE_QUANTITY", &raw))
      .transpose()?;
    let refresh_after_merge = match optional_env("CART_REFRESH_AFTER_MERGE") {
      Some(raw) => parse_env::<bool>("CART_REFRESH_AFTER_MERGE", &raw)?,
      None => defaults.refresh_after_merge,
    };
    let event_capacity = match optional_env("CART_EVENT_CAPACITY") {
      Some(raw) => parse_env::<usize>("CART_EVENT_CAPACITY", &raw)?,
      None => defaults.event_capacity,
    };
    if event_capacity == 0 {
      return Err(AppError::Config("CART_EVENT_CAPACITY must be at least 1".to_string()));
    }
    let snapshot_path = optional_env("CART_SNAPSHOT_PATH").map(PathBuf::from);

    let demo_account = AccountId::new(optional_env("DEMO_ACCOUNT_ID").unwrap_or_else(|| "reader-001".to_string()));
    let log_format = match optional_env("LOG_FORMAT").as_deref() {
      None | Some("pretty") => LogFormat::Pretty,
      Some("json") => LogFormat::Json,
      Some(other) => {
        return Err(AppError::Config(format!(
          "Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'",
          other
        )))
      }
    };

    Ok(Self {
      engine: EngineConfig {
        max_line_quantity,
        refresh_after_merge,
        event_capacity,
        snapshot_path,
      },
      demo_account,
      log_format,
    })
  }
}

// Unset and empty are treated the same.
fn optional_env(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(var_name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e)))
}
