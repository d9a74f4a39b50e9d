/// 리그 순위표 계산 (저장 없음)
/// 대시보드와 스케줄 잡이 같은 함수를 사용하므로 화면 값과 다음 스냅샷 값이 일치한다.
// region:    --- Imports
use super::league_stats::LeagueStatsAggregator;
use super::market::{league_market_average, MarketAverage};
use super::model::{League, LeagueMember};
use super::ranking::{RankedMember, RankedMemberReport, RankingEngine};
use super::round2;
use crate::error::Result;
use crate::store::ScoringReader;
use serde::Serialize;
use tracing::warn;

// endregion: --- Imports

// region:    --- Standings
#[derive(Debug, Clone, PartialEq)]
pub struct Standings {
    pub league_id: i64,
    pub league_name: String,
    pub spending_limit: f64,
    pub league_avg: f64,
    /// 순위 순서
    pub ranked: Vec<RankedMember>,
    /// 계산 실패 시 None
    pub market: Option<MarketAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsReport {
    pub league_id: i64,
    pub league_name: String,
    pub spending_limit: f64,
    pub league_avg: f64,
    pub total_members: usize,
    pub leader: Option<RankedMemberReport>,
    pub market: Option<MarketAverage>,
    pub members: Vec<RankedMemberReport>,
    /// 마지막 정상 계산 값을 대신 보여주는 경우 true
    pub stale: bool,
}

impl Standings {
    pub fn leader(&self) -> Option<&RankedMember> {
        self.ranked.first()
    }

    pub fn report(&self) -> StandingsReport {
        let members: Vec<RankedMemberReport> =
            self.ranked.iter().map(RankedMember::report).collect();
        StandingsReport {
            league_id: self.league_id,
            league_name: self.league_name.clone(),
            spending_limit: self.spending_limit,
            league_avg: round2(self.league_avg),
            total_members: members.len(),
            leader: self.leader().map(RankedMember::report),
            market: self.market.as_ref().map(MarketAverage::report),
            members,
            stale: false,
        }
    }
}

/// 멤버 로드 → 점수 → 통계 → 순위 → 시장 평균
/// 멤버 목록은 덮어쓰기 전의 이전 순위를 담고 있어야 한다.
pub async fn compute_standings(
    reader: &dyn ScoringReader,
    aggregator: &LeagueStatsAggregator,
    league: &League,
    members: &[LeagueMember],
    now: i64,
) -> Result<Standings> {
    let stats = aggregator.compute(league, members, now).await?;

    let market = match league_market_average(reader, league, now).await {
        Ok(market) => Some(market),
        Err(e) => {
            warn!(
                "{:<12} --> 리그 {} 시장 평균 계산 실패: {}",
                "League", league.id, e
            );
            None
        }
    };

    Ok(Standings {
        league_id: league.id,
        league_name: league.name.clone(),
        spending_limit: stats.spending_limit,
        league_avg: stats.league_avg,
        ranked: RankingEngine::rank(stats.scores, members),
        market,
    })
}

/// 리그의 멤버를 읽어 순위표 계산
pub async fn load_standings(
    reader: &dyn ScoringReader,
    aggregator: &LeagueStatsAggregator,
    league: &League,
    now: i64,
) -> Result<Standings> {
    let members = reader.get_league_members(league.id).await?;
    compute_standings(reader, aggregator, league, &members, now).await
}

// endregion: --- Standings
