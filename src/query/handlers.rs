// region:    --- Imports
use super::queries;
use crate::database::DatabaseManager;
use crate::scoring::model::{MemberScoreUpdate, PerformanceSnapshot};
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use sqlx::FromRow;
use tracing::{debug, warn};

// endregion: --- Imports

// region:    --- Rows
/// leagues 행
#[derive(Debug, FromRow)]
pub struct LeagueRow {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub spending_limit: Option<f64>,
    pub use_manual_auctions: bool,
    pub draft_starts_at: Option<DateTime<Utc>>,
}

/// league_members + users 행
#[derive(Debug, FromRow)]
pub struct LeagueMemberRow {
    pub user_id: i64,
    pub username: Option<String>,
    pub total_score: Option<f64>,
    pub rank: Option<i32>,
    pub rank_change: i32,
    pub win_streak: i32,
}

/// garage_cars + auctions 행 (경매 컬럼은 LEFT JOIN이라 모두 nullable)
#[derive(Debug, FromRow)]
pub struct GarageCarRow {
    pub purchase_price: f64,
    pub auction_id: Option<String>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub current_bid: Option<f64>,
    pub final_price: Option<f64>,
    pub timestamp_end: Option<i64>,
    pub price_at_48h: Option<f64>,
}

/// auctions 행
#[derive(Debug, FromRow)]
pub struct AuctionRow {
    pub auction_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub current_bid: Option<f64>,
    pub final_price: Option<f64>,
    pub timestamp_end: i64,
    pub price_at_48h: Option<f64>,
}

/// 보너스 경매 행
#[derive(Debug, FromRow)]
pub struct BonusAuctionRow {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub current_bid: Option<f64>,
    pub final_price: Option<f64>,
    pub price_at_48h: Option<f64>,
}

// endregion: --- Rows

// region:    --- Query Handlers

/// 전체 리그 조회
pub async fn list_leagues(db_manager: &DatabaseManager) -> Result<Vec<LeagueRow>, SqlxError> {
    debug!("{:<12} --> 전체 리그 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, LeagueRow>(queries::LIST_LEAGUES)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 리그 조회
pub async fn get_league(
    db_manager: &DatabaseManager,
    league_id: i64,
) -> Result<Option<LeagueRow>, SqlxError> {
    debug!("{:<12} --> 리그 조회 id: {}", "Query", league_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, LeagueRow>(queries::GET_LEAGUE)
                    .bind(league_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 리그 멤버 조회
pub async fn get_league_members(
    db_manager: &DatabaseManager,
    league_id: i64,
) -> Result<Vec<LeagueMemberRow>, SqlxError> {
    debug!("{:<12} --> 리그 멤버 조회 id: {}", "Query", league_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, LeagueMemberRow>(queries::GET_LEAGUE_MEMBERS)
                    .bind(league_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 차고 차량 조회
pub async fn get_garage_cars(
    db_manager: &DatabaseManager,
    user_id: i64,
    league_id: i64,
) -> Result<Vec<GarageCarRow>, SqlxError> {
    debug!(
        "{:<12} --> 차고 차량 조회 user: {}, league: {}",
        "Query", user_id, league_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, GarageCarRow>(queries::GET_GARAGE_CARS)
                    .bind(user_id)
                    .bind(league_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 보너스 예측 가격 조회
pub async fn get_bonus_prediction(
    db_manager: &DatabaseManager,
    user_id: i64,
    league_id: i64,
) -> Result<Option<f64>, SqlxError> {
    debug!(
        "{:<12} --> 보너스 예측 조회 user: {}, league: {}",
        "Query", user_id, league_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, f64>(queries::GET_BONUS_PREDICTION)
                    .bind(user_id)
                    .bind(league_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 리그 보너스 경매 조회
pub async fn get_league_bonus_auction(
    db_manager: &DatabaseManager,
    league_id: i64,
) -> Result<Option<BonusAuctionRow>, SqlxError> {
    debug!("{:<12} --> 보너스 경매 조회 league: {}", "Query", league_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, BonusAuctionRow>(queries::GET_LEAGUE_BONUS_AUCTION)
                    .bind(league_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 리그 지정 경매 조회
pub async fn get_league_auctions(
    db_manager: &DatabaseManager,
    league_id: i64,
) -> Result<Vec<AuctionRow>, SqlxError> {
    debug!("{:<12} --> 리그 경매 조회 league: {}", "Query", league_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionRow>(queries::GET_LEAGUE_AUCTIONS)
                    .bind(league_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 종료 시각 구간 경매 조회
pub async fn get_auctions_ending_between(
    db_manager: &DatabaseManager,
    min_end: i64,
    max_end: i64,
) -> Result<Vec<AuctionRow>, SqlxError> {
    debug!(
        "{:<12} --> 구간 경매 조회 {} ~ {}",
        "Query", min_end, max_end
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTIONS_ENDING_BETWEEN)
                    .bind(min_end)
                    .bind(max_end)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 리그 멤버 점수 캐시 일괄 갱신
/// 한 트랜잭션에서 실행하며, 대상 멤버가 없으면 RowNotFound로 전체 롤백
pub async fn update_league_member_scores(
    db_manager: &DatabaseManager,
    league_id: i64,
    updates: Vec<MemberScoreUpdate>,
) -> Result<(), SqlxError> {
    debug!(
        "{:<12} --> 멤버 점수 일괄 갱신 league: {}, {}건",
        "Query",
        league_id,
        updates.len()
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                for update in updates {
                    let result = sqlx::query(queries::UPDATE_LEAGUE_MEMBER_SCORE)
                        .bind(league_id)
                        .bind(update.user_id)
                        .bind(update.total_score)
                        .bind(update.rank)
                        .bind(update.rank_change)
                        .execute(&mut **tx)
                        .await?;
                    if result.rows_affected() == 0 {
                        warn!(
                            "{:<12} --> 멤버 없음 league: {}, user: {}",
                            "Query", league_id, update.user_id
                        );
                        return Err(SqlxError::RowNotFound);
                    }
                }
                Ok(())
            })
        })
        .await
}

/// 성과 스냅샷 일괄 추가 (한 트랜잭션)
pub async fn insert_performance_snapshots(
    db_manager: &DatabaseManager,
    snapshots: Vec<PerformanceSnapshot>,
) -> Result<usize, SqlxError> {
    debug!("{:<12} --> 스냅샷 일괄 추가 {}건", "Query", snapshots.len());
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let count = snapshots.len();
                for snapshot in snapshots {
                    sqlx::query(queries::INSERT_PERFORMANCE_SNAPSHOT)
                        .bind(snapshot.league_id)
                        .bind(snapshot.user_id)
                        .bind(snapshot.timestamp)
                        .bind(snapshot.cumulative_gain)
                        .bind(snapshot.rank)
                        .bind(snapshot.total_spent)
                        .bind(snapshot.car_count)
                        .bind(snapshot.detail)
                        .execute(&mut **tx)
                        .await?;
                }
                Ok(count)
            })
        })
        .await
}

/// 종료된 리그 완료 처리, 완료된 리그 id 반환
pub async fn complete_finished_leagues(
    db_manager: &DatabaseManager,
    now: i64,
) -> Result<Vec<i64>, SqlxError> {
    debug!("{:<12} --> 리그 완료 확인 now: {}", "Query", now);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(queries::COMPLETE_FINISHED_LEAGUES)
                    .bind(now)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
