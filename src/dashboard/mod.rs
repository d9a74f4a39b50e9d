/// 대시보드 실시간 계산
/// 스케줄 잡과 같은 파이프라인을 저장 없이 실행한다.
/// 계산에 실패하면 마지막으로 성공한 순위표를 stale 표시와 함께 반환한다.
// region:    --- Imports
use crate::config::JobSettings;
use crate::error::{Result, ScoringError};
use crate::scoring::league_stats::LeagueStatsAggregator;
use crate::scoring::market::{league_market_average, MarketAverage};
use crate::scoring::model::League;
use crate::scoring::standings::{load_standings, StandingsReport};
use crate::scoring::user_score::{UserScoreCalculator, UserScoreReport};
use crate::store::ScoringReader;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

// endregion: --- Imports

// region:    --- Dashboard
pub struct Dashboard {
    reader: Arc<dyn ScoringReader>,
    aggregator: LeagueStatsAggregator,
    last_good: RwLock<HashMap<i64, StandingsReport>>,
}

impl Dashboard {
    pub fn new(reader: Arc<dyn ScoringReader>, settings: &JobSettings) -> Self {
        let aggregator = LeagueStatsAggregator::new(
            UserScoreCalculator::new(Arc::clone(&reader)),
            settings.score_concurrency,
            settings.default_spending_limit,
        );
        Self {
            reader,
            aggregator,
            last_good: RwLock::new(HashMap::new()),
        }
    }

    async fn league(&self, league_id: i64) -> Result<League> {
        self.reader
            .get_league(league_id)
            .await?
            .ok_or(ScoringError::LeagueNotFound(league_id))
    }

    async fn compute_report(&self, league_id: i64, now: i64) -> Result<StandingsReport> {
        let league = self.league(league_id).await?;
        let standings = load_standings(self.reader.as_ref(), &self.aggregator, &league, now).await?;
        Ok(standings.report())
    }

    /// 리그 순위표 (실시간)
    pub async fn league_standings(&self, league_id: i64, now: i64) -> Result<StandingsReport> {
        match self.compute_report(league_id, now).await {
            Ok(report) => {
                self.last_good
                    .write()
                    .await
                    .insert(league_id, report.clone());
                Ok(report)
            }
            Err(e @ ScoringError::LeagueNotFound(_)) => Err(e),
            Err(e) => {
                let cached = self.last_good.read().await.get(&league_id).cloned();
                match cached {
                    Some(mut report) => {
                        warn!(
                            "{:<12} --> 리그 {} 실시간 계산 실패, 마지막 값 사용: {}",
                            "Dashboard", league_id, e
                        );
                        report.stale = true;
                        Ok(report)
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// 사용자 점수 (실시간)
    pub async fn user_score(
        &self,
        league_id: i64,
        user_id: i64,
        now: i64,
    ) -> Result<UserScoreReport> {
        self.league(league_id).await?;
        let members = self.reader.get_league_members(league_id).await?;
        if !members.iter().any(|m| m.user_id == user_id) {
            return Err(ScoringError::MemberNotFound { league_id, user_id });
        }

        let score = self
            .aggregator
            .calculator()
            .calculate(user_id, league_id, now)
            .await?;
        Ok(score.report())
    }

    /// 리그 시장 평균
    pub async fn market_average(&self, league_id: i64, now: i64) -> Result<MarketAverage> {
        let league = self.league(league_id).await?;
        let market = league_market_average(self.reader.as_ref(), &league, now).await?;
        Ok(market.report())
    }
}

// endregion: --- Dashboard
