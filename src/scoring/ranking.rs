/// 리그 순위 산정
/// 멤버 점수 캐시(total_score, rank)의 유일한 작성자
// region:    --- Imports
use super::league_stats::{MemberScore, MemberScoreReport};
use super::model::{LeagueMember, MemberScoreUpdate};
use super::round2;
use crate::error::Result;
use crate::store::MemberScoreWriter;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Models
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMember {
    /// 1부터 시작, 동점도 연속 순위
    pub rank: i32,
    pub previous_rank: Option<i32>,
    /// 이전 순위 - 새 순위 (양수 = 상승)
    pub rank_change: i32,
    pub win_streak: i32,
    pub entry: MemberScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMemberReport {
    pub rank: i32,
    pub previous_rank: Option<i32>,
    pub rank_change: i32,
    pub win_streak: i32,
    #[serde(flatten)]
    pub member: MemberScoreReport,
}

impl RankedMember {
    pub fn user_id(&self) -> i64 {
        self.entry.user_id
    }

    pub fn total_score(&self) -> f64 {
        self.entry.score.total_score()
    }

    pub fn report(&self) -> RankedMemberReport {
        RankedMemberReport {
            rank: self.rank,
            previous_rank: self.previous_rank,
            rank_change: self.rank_change,
            win_streak: self.win_streak,
            member: self.entry.report(),
        }
    }
}

// endregion: --- Models

// region:    --- Ranking Engine
pub struct RankingEngine {
    writer: Arc<dyn MemberScoreWriter>,
}

impl RankingEngine {
    pub fn new(writer: Arc<dyn MemberScoreWriter>) -> Self {
        Self { writer }
    }

    /// 정렬된 점수 목록에 순위 부여 (저장하지 않음)
    /// `previous`는 덮어쓰기 전에 읽은 멤버 캐시
    pub fn rank(sorted: Vec<MemberScore>, previous: &[LeagueMember]) -> Vec<RankedMember> {
        let previous: HashMap<i64, &LeagueMember> =
            previous.iter().map(|m| (m.user_id, m)).collect();

        sorted
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let rank = index as i32 + 1;
                let prior = previous.get(&entry.user_id);
                let previous_rank = prior.and_then(|m| m.previous_rank);
                RankedMember {
                    rank,
                    previous_rank,
                    rank_change: previous_rank.map_or(0, |prev| prev - rank),
                    win_streak: prior.map_or(0, |m| m.win_streak),
                    entry,
                }
            })
            .collect()
    }

    /// 저장할 점수 캐시 값 (점수는 소수 둘째 자리로 반올림)
    pub fn updates(ranked: &[RankedMember]) -> Vec<MemberScoreUpdate> {
        ranked
            .iter()
            .map(|member| MemberScoreUpdate {
                user_id: member.user_id(),
                total_score: round2(member.total_score()),
                rank: member.rank,
                rank_change: member.rank_change,
            })
            .collect()
    }

    /// 새 점수와 순위를 멤버 캐시에 리그 단위로 일괄 기록
    pub async fn publish(&self, league_id: i64, ranked: &[RankedMember]) -> Result<()> {
        self.writer
            .write_league_member_scores(league_id, &Self::updates(ranked))
            .await?;
        info!(
            "{:<12} --> 리그 {} 순위 {}건 기록",
            "Rank",
            league_id,
            ranked.len()
        );
        Ok(())
    }
}

// endregion: --- Ranking Engine

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::user_score::UserScore;

    fn scored(user_id: i64, total: f64) -> MemberScore {
        let mut score = UserScore::zeroed(user_id, 1, None);
        score.total_percent_gain = total;
        MemberScore {
            user_id,
            username: None,
            score,
            qualifies: true,
        }
    }

    fn cached(user_id: i64, previous_rank: Option<i32>) -> LeagueMember {
        LeagueMember {
            user_id,
            username: None,
            total_score: None,
            previous_rank,
            previous_rank_change: 0,
            win_streak: 2,
        }
    }

    #[test]
    fn ranks_are_consecutive_even_for_ties() {
        let ranked = RankingEngine::rank(
            vec![scored(1, 30.0), scored(2, 30.0), scored(3, 10.0)],
            &[],
        );
        let ranks: Vec<i32> = ranked.iter().map(|m| m.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(ranked.iter().all(|m| m.rank_change == 0));
    }

    #[test]
    fn rank_change_is_previous_minus_new() {
        let ranked = RankingEngine::rank(
            vec![scored(3, 50.0), scored(1, 20.0), scored(2, 5.0)],
            &[cached(1, Some(1)), cached(2, Some(2)), cached(3, Some(3))],
        );
        assert_eq!(ranked[0].user_id(), 3);
        assert_eq!(ranked[0].rank_change, 2);
        assert_eq!(ranked[1].rank_change, -1);
        assert_eq!(ranked[2].rank_change, -1);
        assert_eq!(ranked[0].win_streak, 2);
    }

    #[test]
    fn updates_carry_rounded_score_and_new_rank() {
        let ranked = RankingEngine::rank(
            vec![scored(4, 33.333_333), scored(5, -1.005_1)],
            &[cached(4, Some(2)), cached(5, Some(1))],
        );
        let updates = RankingEngine::updates(&ranked);
        assert_eq!(
            updates,
            vec![
                MemberScoreUpdate {
                    user_id: 4,
                    total_score: 33.33,
                    rank: 1,
                    rank_change: 1,
                },
                MemberScoreUpdate {
                    user_id: 5,
                    total_score: -1.01,
                    rank: 2,
                    rank_change: -1,
                },
            ]
        );
    }

    #[test]
    fn first_computation_has_no_rank_change() {
        let ranked = RankingEngine::rank(vec![scored(9, 1.0)], &[cached(9, None)]);
        assert_eq!(ranked[0].previous_rank, None);
        assert_eq!(ranked[0].rank_change, 0);
    }
}
