/// Postgres 저장소
/// 조회 결과 행을 도메인 구조체로 검증/변환한 뒤 엔진에 넘긴다.
// region:    --- Imports
use super::{LeagueLifecycle, LeagueListing, MemberScoreWriter, ScoringReader, SnapshotAppender};
use crate::database::DatabaseManager;
use crate::error::{Result, ScoringError};
use crate::query::handlers::{self, AuctionRow, GarageCarRow, LeagueMemberRow, LeagueRow};
use crate::scoring::model::{
    Auction, BonusAuction, BonusPrediction, GarageCar, League, LeagueMember, LeagueStatus,
    MemberScoreUpdate, PerformanceSnapshot,
};
use async_trait::async_trait;
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Row Conversion
impl TryFrom<LeagueRow> for League {
    type Error = ScoringError;

    fn try_from(row: LeagueRow) -> Result<Self> {
        let status = LeagueStatus::parse(&row.status).ok_or_else(|| {
            ScoringError::input(format!("리그 {}의 상태값이 잘못됨: {}", row.id, row.status))
        })?;
        Ok(League {
            id: row.id,
            name: row.name,
            status,
            spending_limit: row.spending_limit,
            use_manual_auctions: row.use_manual_auctions,
            draft_starts_at: row.draft_starts_at,
        })
    }
}

impl From<LeagueRow> for LeagueListing {
    fn from(row: LeagueRow) -> Self {
        let (league_id, name) = (row.id, row.name.clone());
        match League::try_from(row) {
            Ok(league) => LeagueListing::Valid(league),
            Err(e) => LeagueListing::Invalid {
                league_id,
                name,
                message: e.to_string(),
            },
        }
    }
}

impl From<LeagueMemberRow> for LeagueMember {
    fn from(row: LeagueMemberRow) -> Self {
        LeagueMember {
            user_id: row.user_id,
            username: row.username,
            total_score: row.total_score,
            previous_rank: row.rank,
            previous_rank_change: row.rank_change,
            win_streak: row.win_streak,
        }
    }
}

impl From<AuctionRow> for Auction {
    fn from(row: AuctionRow) -> Self {
        Auction {
            auction_id: row.auction_id,
            title: row.title,
            image_url: row.image_url,
            current_bid: row.current_bid,
            final_price: row.final_price,
            timestamp_end: row.timestamp_end,
            price_at_48h: row.price_at_48h,
        }
    }
}

impl TryFrom<GarageCarRow> for GarageCar {
    type Error = ScoringError;

    fn try_from(row: GarageCarRow) -> Result<Self> {
        let auction = match row.auction_id {
            None => None,
            Some(auction_id) => {
                let timestamp_end = row.timestamp_end.ok_or_else(|| {
                    ScoringError::input(format!("경매 {auction_id}의 종료 시각이 없습니다"))
                })?;
                Some(Auction {
                    title: row.title.unwrap_or_default(),
                    auction_id,
                    image_url: row.image_url,
                    current_bid: row.current_bid,
                    final_price: row.final_price,
                    timestamp_end,
                    price_at_48h: row.price_at_48h,
                })
            }
        };
        Ok(GarageCar {
            purchase_price: row.purchase_price,
            auction,
        })
    }
}

// endregion: --- Row Conversion

// region:    --- Postgres Store
pub struct PgScoringStore {
    db: Arc<DatabaseManager>,
}

impl PgScoringStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScoringReader for PgScoringStore {
    async fn list_leagues(&self) -> Result<Vec<LeagueListing>> {
        Ok(handlers::list_leagues(&self.db)
            .await
            .map_err(ScoringError::from_store)?
            .into_iter()
            .map(LeagueListing::from)
            .collect())
    }

    async fn get_league(&self, league_id: i64) -> Result<Option<League>> {
        handlers::get_league(&self.db, league_id)
            .await
            .map_err(ScoringError::from_store)?
            .map(League::try_from)
            .transpose()
    }

    async fn get_league_members(&self, league_id: i64) -> Result<Vec<LeagueMember>> {
        Ok(handlers::get_league_members(&self.db, league_id)
            .await
            .map_err(ScoringError::from_store)?
            .into_iter()
            .map(LeagueMember::from)
            .collect())
    }

    async fn get_garage_cars(&self, user_id: i64, league_id: i64) -> Result<Vec<GarageCar>> {
        handlers::get_garage_cars(&self.db, user_id, league_id)
            .await
            .map_err(ScoringError::from_store)?
            .into_iter()
            .map(GarageCar::try_from)
            .collect()
    }

    async fn get_bonus_prediction(
        &self,
        user_id: i64,
        league_id: i64,
    ) -> Result<Option<BonusPrediction>> {
        Ok(handlers::get_bonus_prediction(&self.db, user_id, league_id)
            .await
            .map_err(ScoringError::from_store)?
            .map(|predicted_price| BonusPrediction { predicted_price }))
    }

    async fn get_league_bonus_auction(&self, league_id: i64) -> Result<Option<BonusAuction>> {
        Ok(handlers::get_league_bonus_auction(&self.db, league_id)
            .await
            .map_err(ScoringError::from_store)?
            .map(|row| BonusAuction {
                title: row.title,
                image_url: row.image_url,
                current_bid: row.current_bid,
                final_price: row.final_price,
                price_at_48h: row.price_at_48h,
            }))
    }

    async fn get_league_auctions(&self, league_id: i64) -> Result<Vec<Auction>> {
        Ok(handlers::get_league_auctions(&self.db, league_id)
            .await
            .map_err(ScoringError::from_store)?
            .into_iter()
            .map(Auction::from)
            .collect())
    }

    async fn get_auctions_ending_between(
        &self,
        min_end: i64,
        max_end: i64,
    ) -> Result<Vec<Auction>> {
        Ok(handlers::get_auctions_ending_between(&self.db, min_end, max_end)
            .await
            .map_err(ScoringError::from_store)?
            .into_iter()
            .map(Auction::from)
            .collect())
    }
}

#[async_trait]
impl MemberScoreWriter for PgScoringStore {
    async fn write_league_member_scores(
        &self,
        league_id: i64,
        updates: &[MemberScoreUpdate],
    ) -> Result<()> {
        handlers::update_league_member_scores(&self.db, league_id, updates.to_vec())
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => ScoringError::LeaguePipeline {
                    league_id,
                    message: "점수를 기록할 멤버 행이 없어 전체 롤백".to_string(),
                },
                other => ScoringError::from_store(other),
            })
    }
}

#[async_trait]
impl SnapshotAppender for PgScoringStore {
    async fn append_performance_snapshots(
        &self,
        snapshots: &[PerformanceSnapshot],
    ) -> Result<usize> {
        handlers::insert_performance_snapshots(&self.db, snapshots.to_vec())
            .await
            .map_err(ScoringError::from_store)
    }
}

#[async_trait]
impl LeagueLifecycle for PgScoringStore {
    async fn complete_finished_leagues(&self, now: i64) -> Result<Vec<i64>> {
        handlers::complete_finished_leagues(&self.db, now)
            .await
            .map_err(ScoringError::from_store)
    }
}

// endregion: --- Postgres Store
