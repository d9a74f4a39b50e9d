/// 점수 엔진이 사용하는 저장소 포트
/// 읽기 포트와 쓰기 포트를 분리하여, 멤버 점수 캐시는 랭킹 엔진만,
/// 스냅샷은 스냅샷 작성기만 쓸 수 있도록 한다.
// region:    --- Imports
use crate::error::Result;
use crate::scoring::model::{
    Auction, BonusAuction, BonusPrediction, GarageCar, League, LeagueMember, MemberScoreUpdate,
    PerformanceSnapshot,
};
use async_trait::async_trait;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgScoringStore;

// endregion: --- Modules

// region:    --- Ports
/// 리그 목록의 한 행
/// 검증에 실패한 행은 그 리그 하나의 오류로 남기고 나머지 리그는 계속 처리한다.
#[derive(Debug, Clone, PartialEq)]
pub enum LeagueListing {
    Valid(League),
    Invalid {
        league_id: i64,
        name: String,
        message: String,
    },
}

/// 읽기 포트
#[async_trait]
pub trait ScoringReader: Send + Sync {
    async fn list_leagues(&self) -> Result<Vec<LeagueListing>>;

    async fn get_league(&self, league_id: i64) -> Result<Option<League>>;

    /// 가입 순서, user_id 순으로 정렬된 멤버 목록
    async fn get_league_members(&self, league_id: i64) -> Result<Vec<LeagueMember>>;

    async fn get_garage_cars(&self, user_id: i64, league_id: i64) -> Result<Vec<GarageCar>>;

    async fn get_bonus_prediction(
        &self,
        user_id: i64,
        league_id: i64,
    ) -> Result<Option<BonusPrediction>>;

    async fn get_league_bonus_auction(&self, league_id: i64) -> Result<Option<BonusAuction>>;

    /// 리그에 명시적으로 지정된 경매 목록
    async fn get_league_auctions(&self, league_id: i64) -> Result<Vec<Auction>>;

    /// 종료 시각이 구간 안에 있고 48시간 가격이 있는 경매 목록
    async fn get_auctions_ending_between(&self, min_end: i64, max_end: i64)
        -> Result<Vec<Auction>>;
}

/// 멤버 점수 캐시 쓰기 포트 (랭킹 엔진 전용)
/// 리그 하나의 갱신은 전부 기록되거나 하나도 기록되지 않는다.
#[async_trait]
pub trait MemberScoreWriter: Send + Sync {
    async fn write_league_member_scores(
        &self,
        league_id: i64,
        updates: &[MemberScoreUpdate],
    ) -> Result<()>;
}

/// 성과 스냅샷 추가 포트 (추가 전용, 일괄 단위로 원자적)
#[async_trait]
pub trait SnapshotAppender: Send + Sync {
    async fn append_performance_snapshots(&self, snapshots: &[PerformanceSnapshot])
        -> Result<usize>;
}

/// 리그 수명 주기 포트
#[async_trait]
pub trait LeagueLifecycle: Send + Sync {
    /// 모든 차고 경매가 종료된 활성 리그를 완료 처리하고 그 id 목록 반환
    async fn complete_finished_leagues(&self, now: i64) -> Result<Vec<i64>>;
}

// endregion: --- Ports
