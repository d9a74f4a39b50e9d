/// 리그 통계 집계
/// 전체 멤버 점수를 병렬 계산한 뒤 점수 내림차순으로 정렬
// region:    --- Imports
use super::model::{League, LeagueMember};
use super::user_score::{UserScore, UserScoreCalculator, UserScoreReport};
use crate::error::{Result, ScoringError};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Models
/// 참가 자격 기준: 지출 한도의 50%
pub const QUALIFICATION_RATIO: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct MemberScore {
    pub user_id: i64,
    pub username: Option<String>,
    pub score: UserScore,
    /// 정보용 표시 (순위에서 제외하지 않음)
    pub qualifies: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueStats {
    pub league_id: i64,
    pub spending_limit: f64,
    /// total_score 내림차순 (동점은 멤버 목록 순서 유지)
    pub scores: Vec<MemberScore>,
    pub league_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberScoreReport {
    pub username: Option<String>,
    pub qualifies: bool,
    #[serde(flatten)]
    pub score: UserScoreReport,
}

impl MemberScore {
    pub fn report(&self) -> MemberScoreReport {
        MemberScoreReport {
            username: self.username.clone(),
            qualifies: self.qualifies,
            score: self.score.report(),
        }
    }
}

impl LeagueStats {
    pub fn leader(&self) -> Option<&MemberScore> {
        self.scores.first()
    }

    pub fn total_members(&self) -> usize {
        self.scores.len()
    }
}

/// 참가 자격 여부
pub fn qualifies(total_spent: f64, spending_limit: f64) -> bool {
    total_spent >= spending_limit * QUALIFICATION_RATIO
}

/// 멤버 점수 정렬 및 평균 계산 (순수 함수)
pub fn summarize(league_id: i64, spending_limit: f64, mut scores: Vec<MemberScore>) -> LeagueStats {
    // 안정 정렬: 동점은 입력 순서 유지
    scores.sort_by(|a, b| b.score.total_score().total_cmp(&a.score.total_score()));

    let league_avg = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| s.score.total_score()).sum::<f64>() / scores.len() as f64
    };

    LeagueStats {
        league_id,
        spending_limit,
        scores,
        league_avg,
    }
}

// endregion: --- Models

// region:    --- League Stats Aggregator
#[derive(Clone)]
pub struct LeagueStatsAggregator {
    calculator: UserScoreCalculator,
    concurrency: usize,
    default_spending_limit: f64,
}

impl LeagueStatsAggregator {
    pub fn new(
        calculator: UserScoreCalculator,
        concurrency: usize,
        default_spending_limit: f64,
    ) -> Self {
        Self {
            calculator,
            concurrency: concurrency.max(1),
            default_spending_limit,
        }
    }

    pub fn calculator(&self) -> &UserScoreCalculator {
        &self.calculator
    }

    pub fn spending_limit_for(&self, league: &League) -> f64 {
        league
            .spending_limit
            .filter(|limit| *limit > 0.0)
            .unwrap_or(self.default_spending_limit)
    }

    /// 리그 전체 멤버 점수 계산
    /// 멤버별 계산은 동시에 수행하되 결과는 입력 순서로 수집
    /// 한 멤버라도 저장소 오류가 나면 리그 전체 실패
    pub async fn compute(
        &self,
        league: &League,
        members: &[LeagueMember],
        now: i64,
    ) -> Result<LeagueStats> {
        let spending_limit = self.spending_limit_for(league);
        let league_id = league.id;

        let owned: Vec<(i64, Option<String>)> = members
            .iter()
            .map(|m| (m.user_id, m.username.clone()))
            .collect();
        let calculator = self.calculator.clone();

        let scores: Vec<MemberScore> = stream::iter(owned)
            .map(move |(user_id, username)| {
                let calculator = calculator.clone();
                async move {
                    let score = calculator.calculate(user_id, league_id, now).await?;
                    Ok::<_, ScoringError>(MemberScore {
                        user_id,
                        username,
                        qualifies: qualifies(score.total_spent, spending_limit),
                        score,
                    })
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let stats = summarize(league_id, spending_limit, scores);
        info!(
            "{:<12} --> 리그 {} 통계: 멤버 {}명, 평균 {:.2}",
            "League",
            league_id,
            stats.total_members(),
            stats.league_avg
        );
        Ok(stats)
    }
}

// endregion: --- League Stats Aggregator

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobSettings;
    use crate::scoring::model::LeagueStatus;
    use crate::scoring::round2;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn member(user_id: i64, total: f64, spent: f64) -> MemberScore {
        let mut score = UserScore::zeroed(user_id, 1, None);
        score.total_percent_gain = total;
        score.total_spent = spent;
        MemberScore {
            user_id,
            username: None,
            score,
            qualifies: qualifies(spent, 200_000.0),
        }
    }

    #[test]
    fn ties_keep_member_order_and_average_is_rounded_at_output() {
        let stats = summarize(
            1,
            200_000.0,
            vec![member(10, 30.0, 0.0), member(11, 10.0, 0.0), member(12, 30.0, 0.0)],
        );
        let order: Vec<i64> = stats.scores.iter().map(|s| s.user_id).collect();
        assert_eq!(order, vec![10, 12, 11]);
        assert_eq!(round2(stats.league_avg), 23.33);
        assert_eq!(stats.leader().unwrap().user_id, 10);
    }

    #[test]
    fn empty_league_has_no_leader() {
        let stats = summarize(1, 200_000.0, Vec::new());
        assert!(stats.leader().is_none());
        assert_eq!(stats.league_avg, 0.0);
    }

    #[test]
    fn qualification_threshold_is_half_the_limit() {
        assert!(qualifies(100_000.0, 200_000.0));
        assert!(!qualifies(99_999.99, 200_000.0));
        // 자격 미달이어도 순위에는 포함
        let stats = summarize(1, 200_000.0, vec![member(1, 5.0, 10.0), member(2, 1.0, 150_000.0)]);
        assert_eq!(stats.total_members(), 2);
        assert!(!stats.scores[0].qualifies);
        assert!(stats.scores[1].qualifies);
    }

    fn aggregator(store: Arc<MemoryStore>) -> LeagueStatsAggregator {
        let settings = JobSettings::default();
        LeagueStatsAggregator::new(
            UserScoreCalculator::new(store),
            settings.score_concurrency,
            settings.default_spending_limit,
        )
    }

    fn league(spending_limit: Option<f64>) -> League {
        League {
            id: 1,
            name: "Concours".to_string(),
            status: LeagueStatus::Active,
            spending_limit,
            use_manual_auctions: false,
            draft_starts_at: None,
        }
    }

    #[test]
    fn missing_or_non_positive_limit_falls_back_to_default() {
        let aggregator = aggregator(Arc::new(MemoryStore::new()));
        for limit in [None, Some(0.0), Some(-5.0)] {
            assert_eq!(aggregator.spending_limit_for(&league(limit)), 200_000.0);
        }
        assert_eq!(aggregator.spending_limit_for(&league(Some(50_000.0))), 50_000.0);
    }

    #[tokio::test]
    async fn qualification_uses_default_limit_when_league_has_none() {
        let store = Arc::new(MemoryStore::new());
        store.add_league(league(None)).await;
        store.add_member(1, 1, "alice").await;
        store.add_member(1, 2, "bob").await;
        store
            .put_auction(crate::scoring::model::Auction {
                auction_id: "dino-246".to_string(),
                title: "1972 Dino 246 GT".to_string(),
                image_url: None,
                current_bid: Some(100_000.0),
                final_price: None,
                timestamp_end: 2_000,
                price_at_48h: None,
            })
            .await;
        store.add_garage_car(1, 1, "dino-246", 100_000.0).await;
        store.add_garage_car(2, 1, "dino-246", 99_000.0).await;

        let members: Vec<LeagueMember> = [(1, "alice"), (2, "bob")]
            .into_iter()
            .map(|(user_id, name)| LeagueMember {
                user_id,
                username: Some(name.to_string()),
                total_score: None,
                previous_rank: None,
                previous_rank_change: 0,
                win_streak: 0,
            })
            .collect();
        let stats = aggregator(store)
            .compute(&league(Some(0.0)), &members, 1_000)
            .await
            .unwrap();

        assert_eq!(stats.spending_limit, 200_000.0);
        let alice = stats.scores.iter().find(|s| s.user_id == 1).unwrap();
        let bob = stats.scores.iter().find(|s| s.user_id == 2).unwrap();
        assert!(alice.qualifies);
        assert!(!bob.qualifies);
    }
}
