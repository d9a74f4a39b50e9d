/// 서비스 설정 (환경 변수 기반)
// region:    --- Imports
use crate::error::{Result, ScoringError};
use std::str::FromStr;
use std::time::Duration;

// endregion: --- Imports

// region:    --- Config
/// 리그에 지출 한도가 없을 때 사용하는 기본값
pub const DEFAULT_SPENDING_LIMIT: f64 = 200_000.0;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub job: JobSettings,
    /// 0이면 내부 타이머를 끄고 외부 트리거만 사용
    pub recalc_interval: Duration,
}

/// 재계산 잡에 전달되는 설정
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub cron_secret: Option<String>,
    pub default_spending_limit: f64,
    pub score_concurrency: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            cron_secret: None,
            default_spending_limit: DEFAULT_SPENDING_LIMIT,
            score_concurrency: 8,
        }
    }
}

impl AppConfig {
    /// 환경 변수에서 설정 로드 (.env 파일이 있으면 먼저 읽음)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| ScoringError::Config {
            message: "DATABASE_URL must be set".to_string(),
        })?;

        let cron_secret = std::env::var("CRON_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let score_concurrency: usize = env_or("SCORE_CONCURRENCY", 8)?;
        if score_concurrency == 0 {
            return Err(ScoringError::Config {
                message: "SCORE_CONCURRENCY must be at least 1".to_string(),
            });
        }

        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            job: JobSettings {
                cron_secret,
                default_spending_limit: env_or("DEFAULT_SPENDING_LIMIT", DEFAULT_SPENDING_LIMIT)?,
                score_concurrency,
            },
            recalc_interval: Duration::from_secs(env_or("RECALC_INTERVAL_SECS", 3600)?),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ScoringError::Config {
            message: format!("{key} has an invalid value: {raw}"),
        }),
        Err(_) => Ok(default),
    }
}

// endregion: --- Config
