/// 성과 스냅샷 작성
/// 순위 갱신 이후에만 호출 (스냅샷의 순위가 한 주기 늦지 않도록)
// region:    --- Imports
use super::market::MarketAverage;
use super::model::PerformanceSnapshot;
use super::ranking::RankedMember;
use super::round2;
use crate::error::Result;
use crate::store::SnapshotAppender;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Performance Snapshot Writer
pub struct PerformanceSnapshotWriter {
    appender: Arc<dyn SnapshotAppender>,
}

impl PerformanceSnapshotWriter {
    pub fn new(appender: Arc<dyn SnapshotAppender>) -> Self {
        Self { appender }
    }

    /// 멤버별 스냅샷 생성 (저장하지 않음)
    pub fn build(
        league_id: i64,
        ranked: &[RankedMember],
        timestamp: DateTime<Utc>,
        market: Option<&MarketAverage>,
    ) -> Vec<PerformanceSnapshot> {
        ranked
            .iter()
            .map(|member| {
                let score = &member.entry.score;
                let cars: Vec<serde_json::Value> = score
                    .cars
                    .iter()
                    .map(|car| {
                        json!({
                            "auction_id": car.auction_id,
                            "status": car.status,
                            "purchase_price": car.purchase_price,
                            "current_bid": car.current_bid,
                            "final_price": car.final_price,
                            "current_price": car.effective_price,
                        })
                    })
                    .collect();

                PerformanceSnapshot {
                    league_id,
                    user_id: member.user_id(),
                    timestamp,
                    cumulative_gain: round2(member.total_score()),
                    rank: member.rank,
                    total_spent: round2(score.total_spent),
                    car_count: score.cars_count as i32,
                    detail: json!({
                        "market_average": market.map(|m| round2(m.market_average)),
                        "bonus_points": score.bonus.as_ref().map(|b| b.bonus_points),
                        "qualifies": member.entry.qualifies,
                        "error": score.error,
                        "cars": cars,
                    }),
                }
            })
            .collect()
    }

    /// 스냅샷 일괄 추가 (기존 행은 수정하지 않음, 전부 저장되거나 하나도 저장되지 않음)
    pub async fn append(&self, snapshots: &[PerformanceSnapshot]) -> Result<usize> {
        if snapshots.is_empty() {
            return Ok(0);
        }
        let count = self.appender.append_performance_snapshots(snapshots).await?;
        info!(
            "{:<12} --> 리그 {} 스냅샷 {}건 저장",
            "Snapshot", snapshots[0].league_id, count
        );
        Ok(count)
    }
}

// endregion: --- Performance Snapshot Writer

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::league_stats::MemberScore;
    use crate::scoring::model::{Auction, GarageCar};
    use crate::scoring::ranking::RankingEngine;
    use crate::scoring::user_score::score_garage;
    use chrono::TimeZone;

    #[test]
    fn snapshot_carries_updated_rank_and_car_detail() {
        let now = 1_700_000_000;
        let garage = vec![GarageCar {
            purchase_price: 10_000.0,
            auction: Some(Auction {
                auction_id: "lot-7".to_string(),
                title: "1995 BMW M3".to_string(),
                image_url: None,
                current_bid: Some(11_000.0),
                final_price: None,
                timestamp_end: now + 100,
                price_at_48h: Some(9_000.0),
            }),
        }];
        let score = score_garage(5, 2, &garage, None, now).unwrap();
        let ranked = RankingEngine::rank(
            vec![MemberScore {
                user_id: 5,
                username: Some("gearhead".to_string()),
                score,
                qualifies: false,
            }],
            &[],
        );

        let at = Utc.timestamp_opt(now, 0).unwrap();
        let snapshots = PerformanceSnapshotWriter::build(2, &ranked, at, None);

        assert_eq!(snapshots.len(), 1);
        let snap = &snapshots[0];
        assert_eq!(snap.rank, 1);
        assert_eq!(snap.cumulative_gain, 10.0);
        assert_eq!(snap.total_spent, 10_000.0);
        assert_eq!(snap.car_count, 1);
        assert_eq!(snap.detail["cars"][0]["purchase_price"], 10_000.0);
        assert_eq!(snap.detail["cars"][0]["current_price"], 11_000.0);
        assert!(snap.detail["market_average"].is_null());
    }
}
