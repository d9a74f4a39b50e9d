/// 점수 계산 엔진 오류 정의
// region:    --- Imports
use thiserror::Error;

// endregion: --- Imports

// region:    --- Scoring Error
#[derive(Error, Debug)]
pub enum ScoringError {
    /// 한 사용자의 경매/예측 조인 데이터가 누락되었거나 잘못됨
    #[error("입력 데이터 오류: {message}")]
    InputData { message: String },

    /// 0 또는 음수로 나누게 되는 값
    #[error("나눗셈 오류 ({field}={value})")]
    DivisionHazard { field: &'static str, value: f64 },

    /// 리그 단위 파이프라인 실패
    #[error("리그 {league_id} 처리 실패: {message}")]
    LeaguePipeline { league_id: i64, message: String },

    #[error("리그 {0}을(를) 찾을 수 없습니다")]
    LeagueNotFound(i64),

    #[error("사용자 {user_id}은(는) 리그 {league_id}의 멤버가 아닙니다")]
    MemberNotFound { league_id: i64, user_id: i64 },

    #[error("Unauthorized")]
    Authorization,

    /// 저장소 연결 불가 (잡 전체 중단)
    #[error("저장소에 연결할 수 없습니다: {0}")]
    UpstreamUnavailable(String),

    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),

    #[error("설정 오류: {message}")]
    Config { message: String },
}

impl ScoringError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputData {
            message: message.into(),
        }
    }

    /// 사용자 단위로 복구 가능한 오류인지 여부
    pub fn is_recoverable_per_user(&self) -> bool {
        matches!(self, Self::InputData { .. } | Self::DivisionHazard { .. })
    }

    /// sqlx 오류를 연결 장애와 쿼리 오류로 분류
    pub fn from_store(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::UpstreamUnavailable(err.to_string()),
            other => Self::Database(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

// endregion: --- Scoring Error
