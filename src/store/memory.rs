/// 메모리 저장소 (테스트 및 로컬 시연용)
/// 리그/사용자 단위 장애 주입을 지원한다.
// region:    --- Imports
use super::{LeagueLifecycle, LeagueListing, MemberScoreWriter, ScoringReader, SnapshotAppender};
use crate::error::{Result, ScoringError};
use crate::scoring::model::{
    Auction, BonusAuction, BonusPrediction, GarageCar, League, LeagueMember, LeagueStatus,
    MemberScoreUpdate, PerformanceSnapshot,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- Memory State
#[derive(Default)]
struct MemoryState {
    leagues: BTreeMap<i64, League>,
    /// 상태값이 잘못된 리그 (id -> (이름, 원래 상태값))
    invalid_leagues: BTreeMap<i64, (String, String)>,
    /// 가입 순서 유지
    members: HashMap<i64, Vec<LeagueMember>>,
    auctions: HashMap<String, Auction>,
    garages: HashMap<(i64, i64), Vec<(String, f64)>>,
    predictions: HashMap<(i64, i64), BonusPrediction>,
    bonus_auctions: HashMap<i64, String>,
    league_auctions: HashMap<i64, Vec<String>>,
    snapshots: Vec<PerformanceSnapshot>,
    failing_leagues: HashSet<i64>,
    failing_users: HashSet<i64>,
    disconnected_users: HashSet<i64>,
    failing_member_writes: HashSet<(i64, i64)>,
    failing_snapshot_leagues: HashSet<i64>,
    unavailable: bool,
}

impl MemoryState {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(ScoringError::UpstreamUnavailable(
                "memory store offline".to_string(),
            ));
        }
        Ok(())
    }
}

// endregion: --- Memory State

// region:    --- Memory Store
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_league(&self, league: League) {
        self.state.write().await.leagues.insert(league.id, league);
    }

    pub async fn add_member(&self, league_id: i64, user_id: i64, username: &str) {
        self.state
            .write()
            .await
            .members
            .entry(league_id)
            .or_default()
            .push(LeagueMember {
                user_id,
                username: Some(username.to_string()),
                total_score: None,
                previous_rank: None,
                previous_rank_change: 0,
                win_streak: 0,
            });
    }

    /// 경매 추가 또는 갱신
    pub async fn put_auction(&self, auction: Auction) {
        self.state
            .write()
            .await
            .auctions
            .insert(auction.auction_id.clone(), auction);
    }

    pub async fn add_garage_car(
        &self,
        user_id: i64,
        league_id: i64,
        auction_id: &str,
        purchase_price: f64,
    ) {
        self.state
            .write()
            .await
            .garages
            .entry((user_id, league_id))
            .or_default()
            .push((auction_id.to_string(), purchase_price));
    }

    pub async fn set_bonus_auction(&self, league_id: i64, auction_id: &str) {
        self.state
            .write()
            .await
            .bonus_auctions
            .insert(league_id, auction_id.to_string());
    }

    pub async fn set_prediction(&self, user_id: i64, league_id: i64, predicted_price: f64) {
        self.state
            .write()
            .await
            .predictions
            .insert((user_id, league_id), BonusPrediction { predicted_price });
    }

    pub async fn add_league_auction(&self, league_id: i64, auction_id: &str) {
        self.state
            .write()
            .await
            .league_auctions
            .entry(league_id)
            .or_default()
            .push(auction_id.to_string());
    }

    /// 해당 리그의 멤버 조회가 실패하도록 설정
    pub async fn fail_league(&self, league_id: i64) {
        self.state.write().await.failing_leagues.insert(league_id);
    }

    /// 해당 사용자의 차고 조회가 실패하도록 설정
    pub async fn fail_user(&self, user_id: i64) {
        self.state.write().await.failing_users.insert(user_id);
    }

    /// 상태값이 잘못된 리그 행 추가
    pub async fn add_invalid_league(&self, league_id: i64, name: &str, raw_status: &str) {
        self.state
            .write()
            .await
            .invalid_leagues
            .insert(league_id, (name.to_string(), raw_status.to_string()));
    }

    /// 해당 사용자의 차고 조회에서 저장소 연결 장애가 나도록 설정
    pub async fn disconnect_user(&self, user_id: i64) {
        self.state.write().await.disconnected_users.insert(user_id);
    }

    /// 해당 멤버의 점수 기록이 실패하도록 설정 (리그 전체 일괄 기록이 롤백됨)
    pub async fn fail_member_write(&self, league_id: i64, user_id: i64) {
        self.state
            .write()
            .await
            .failing_member_writes
            .insert((league_id, user_id));
    }

    /// 해당 리그의 스냅샷 저장이 실패하도록 설정
    pub async fn fail_snapshots(&self, league_id: i64) {
        self.state
            .write()
            .await
            .failing_snapshot_leagues
            .insert(league_id);
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    pub async fn league(&self, league_id: i64) -> Option<League> {
        self.state.read().await.leagues.get(&league_id).cloned()
    }

    pub async fn snapshots(&self) -> Vec<PerformanceSnapshot> {
        self.state.read().await.snapshots.clone()
    }

    pub async fn member(&self, league_id: i64, user_id: i64) -> Option<LeagueMember> {
        self.state
            .read()
            .await
            .members
            .get(&league_id)
            .and_then(|ms| ms.iter().find(|m| m.user_id == user_id).cloned())
    }
}

#[async_trait]
impl ScoringReader for MemoryStore {
    async fn list_leagues(&self) -> Result<Vec<LeagueListing>> {
        let state = self.state.read().await;
        state.check_available()?;
        let mut listings: Vec<(i64, LeagueListing)> = state
            .leagues
            .values()
            .map(|l| (l.id, LeagueListing::Valid(l.clone())))
            .chain(state.invalid_leagues.iter().map(|(id, (name, raw))| {
                (
                    *id,
                    LeagueListing::Invalid {
                        league_id: *id,
                        name: name.clone(),
                        message: format!("리그 {id}의 상태값이 잘못됨: {raw}"),
                    },
                )
            }))
            .collect();
        listings.sort_by_key(|(id, _)| *id);
        Ok(listings.into_iter().map(|(_, listing)| listing).collect())
    }

    async fn get_league(&self, league_id: i64) -> Result<Option<League>> {
        let state = self.state.read().await;
        state.check_available()?;
        if let Some((_, raw)) = state.invalid_leagues.get(&league_id) {
            return Err(ScoringError::input(format!(
                "리그 {league_id}의 상태값이 잘못됨: {raw}"
            )));
        }
        Ok(state.leagues.get(&league_id).cloned())
    }

    async fn get_league_members(&self, league_id: i64) -> Result<Vec<LeagueMember>> {
        let state = self.state.read().await;
        state.check_available()?;
        if state.failing_leagues.contains(&league_id) {
            return Err(ScoringError::Database(sqlx::Error::Protocol(format!(
                "league_members read failed for league {league_id}"
            ))));
        }
        Ok(state.members.get(&league_id).cloned().unwrap_or_default())
    }

    async fn get_garage_cars(&self, user_id: i64, league_id: i64) -> Result<Vec<GarageCar>> {
        let state = self.state.read().await;
        state.check_available()?;
        if state.disconnected_users.contains(&user_id) {
            return Err(ScoringError::UpstreamUnavailable(format!(
                "garage read for user {user_id} lost the connection"
            )));
        }
        if state.failing_users.contains(&user_id) {
            return Err(ScoringError::input(format!(
                "garage for user {user_id} is corrupt"
            )));
        }
        Ok(state
            .garages
            .get(&(user_id, league_id))
            .map(|cars| {
                cars.iter()
                    .map(|(auction_id, purchase_price)| GarageCar {
                        purchase_price: *purchase_price,
                        auction: state.auctions.get(auction_id).cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_bonus_prediction(
        &self,
        user_id: i64,
        league_id: i64,
    ) -> Result<Option<BonusPrediction>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.predictions.get(&(user_id, league_id)).copied())
    }

    async fn get_league_bonus_auction(&self, league_id: i64) -> Result<Option<BonusAuction>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state
            .bonus_auctions
            .get(&league_id)
            .and_then(|id| state.auctions.get(id))
            .map(|a| BonusAuction {
                title: Some(a.title.clone()),
                image_url: a.image_url.clone(),
                current_bid: a.current_bid,
                final_price: a.final_price,
                price_at_48h: a.price_at_48h,
            }))
    }

    async fn get_league_auctions(&self, league_id: i64) -> Result<Vec<Auction>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state
            .league_auctions
            .get(&league_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.auctions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_auctions_ending_between(
        &self,
        min_end: i64,
        max_end: i64,
    ) -> Result<Vec<Auction>> {
        let state = self.state.read().await;
        state.check_available()?;
        let mut auctions: Vec<Auction> = state
            .auctions
            .values()
            .filter(|a| a.timestamp_end >= min_end && a.timestamp_end <= max_end)
            .filter(|a| a.price_at_48h.is_some())
            .cloned()
            .collect();
        auctions.sort_by(|a, b| a.auction_id.cmp(&b.auction_id));
        Ok(auctions)
    }
}

#[async_trait]
impl MemberScoreWriter for MemoryStore {
    async fn write_league_member_scores(
        &self,
        league_id: i64,
        updates: &[MemberScoreUpdate],
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_available()?;

        // 전부 검증한 뒤에만 반영 (부분 기록 없음)
        for update in updates {
            let user_id = update.user_id;
            if state.failing_member_writes.contains(&(league_id, user_id)) {
                return Err(ScoringError::Database(sqlx::Error::Protocol(format!(
                    "league_members update failed for user {user_id}"
                ))));
            }
            let known = state
                .members
                .get(&league_id)
                .is_some_and(|ms| ms.iter().any(|m| m.user_id == user_id));
            if !known {
                return Err(ScoringError::MemberNotFound { league_id, user_id });
            }
        }

        if let Some(members) = state.members.get_mut(&league_id) {
            for update in updates {
                if let Some(member) = members.iter_mut().find(|m| m.user_id == update.user_id) {
                    member.total_score = Some(update.total_score);
                    member.previous_rank = Some(update.rank);
                    member.previous_rank_change = update.rank_change;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotAppender for MemoryStore {
    async fn append_performance_snapshots(
        &self,
        snapshots: &[PerformanceSnapshot],
    ) -> Result<usize> {
        let mut state = self.state.write().await;
        state.check_available()?;
        if let Some(failing) = snapshots
            .iter()
            .find(|s| state.failing_snapshot_leagues.contains(&s.league_id))
        {
            return Err(ScoringError::Database(sqlx::Error::Protocol(format!(
                "performance_history insert failed for league {}",
                failing.league_id
            ))));
        }
        state.snapshots.extend_from_slice(snapshots);
        Ok(snapshots.len())
    }
}

#[async_trait]
impl LeagueLifecycle for MemoryStore {
    async fn complete_finished_leagues(&self, now: i64) -> Result<Vec<i64>> {
        let mut state = self.state.write().await;
        state.check_available()?;

        let finished: Vec<i64> = state
            .leagues
            .values()
            .filter(|l| l.status == LeagueStatus::Active)
            .filter(|l| {
                let ends: Vec<i64> = state
                    .garages
                    .iter()
                    .filter(|((_, league_id), _)| *league_id == l.id)
                    .flat_map(|(_, cars)| cars.iter())
                    .filter_map(|(auction_id, _)| state.auctions.get(auction_id))
                    .map(|a| a.timestamp_end)
                    .collect();
                let has_cars = state
                    .garages
                    .iter()
                    .any(|((_, league_id), cars)| *league_id == l.id && !cars.is_empty());
                has_cars && ends.iter().all(|end| *end < now)
            })
            .map(|l| l.id)
            .collect();

        for id in &finished {
            if let Some(league) = state.leagues.get_mut(id) {
                league.status = LeagueStatus::Completed;
            }
        }
        Ok(finished)
    }
}

// endregion: --- Memory Store
