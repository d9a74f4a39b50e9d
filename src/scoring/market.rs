/// 시장 평균: 리그 경매 전체의 48시간 가격 대비 변동률 평균
/// 사용자 선택과 무관하게 시장 흐름을 보여주는 지표
// region:    --- Imports
use super::model::{Auction, League};
use super::round2;
use super::valuation::RESERVE_NOT_MET_FACTOR;
use crate::error::Result;
use crate::store::ScoringReader;
use serde::Serialize;
use tracing::debug;

// endregion: --- Imports

// region:    --- Market Average
const DAY_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAuction {
    pub auction_id: String,
    pub title: String,
    pub baseline_price: f64,
    pub current_price: f64,
    pub percent_gain: f64,
    pub reserve_not_met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAverage {
    pub market_average: f64,
    pub auction_count: usize,
    pub auctions: Vec<MarketAuction>,
}

impl MarketAverage {
    pub fn empty() -> Self {
        Self {
            market_average: 0.0,
            auction_count: 0,
            auctions: Vec::new(),
        }
    }

    /// 출력용 (소수 둘째 자리 반올림)
    pub fn report(&self) -> Self {
        Self {
            market_average: round2(self.market_average),
            auction_count: self.auction_count,
            auctions: self
                .auctions
                .iter()
                .map(|a| MarketAuction {
                    current_price: round2(a.current_price),
                    percent_gain: round2(a.percent_gain),
                    ..a.clone()
                })
                .collect(),
        }
    }
}

/// 경매 목록의 평균 변동률 (기준가가 없거나 0 이하인 경매는 제외)
pub fn average_movement(auctions: &[Auction], now: i64) -> MarketAverage {
    let mut total_percent_gain = 0.0;
    let mut rows = Vec::new();

    for auction in auctions {
        let Some(baseline) = auction.price_at_48h.filter(|p| *p > 0.0) else {
            debug!(
                "{:<12} --> 경매 {} 제외: 48시간 가격 없음",
                "Market", auction.auction_id
            );
            continue;
        };

        // 낙찰가 0은 '없음'으로 취급
        let sale = auction.final_price.filter(|p| *p != 0.0);
        let current_price = sale.unwrap_or_else(|| auction.current_bid.unwrap_or(baseline));
        let reserve_not_met = auction.has_ended(now) && sale.is_none();
        let effective_price = if reserve_not_met {
            current_price * RESERVE_NOT_MET_FACTOR
        } else {
            current_price
        };

        if !effective_price.is_finite() {
            debug!(
                "{:<12} --> 경매 {} 제외: 가격 값 이상",
                "Market", auction.auction_id
            );
            continue;
        }

        let percent_gain = (effective_price - baseline) / baseline * 100.0;
        total_percent_gain += percent_gain;

        rows.push(MarketAuction {
            auction_id: auction.auction_id.clone(),
            title: auction.title.clone(),
            baseline_price: baseline,
            current_price: effective_price,
            percent_gain,
            reserve_not_met,
        });
    }

    let auction_count = rows.len();
    MarketAverage {
        market_average: if auction_count > 0 {
            total_percent_gain / auction_count as f64
        } else {
            0.0
        },
        auction_count,
        auctions: rows,
    }
}

/// 리그 경매 집합 조회 후 시장 평균 계산
/// 명시 목록이 비어 있고 수동 리그가 아니면 드래프트 시작 후 4~5일 사이 종료 경매 사용
pub async fn league_market_average(
    reader: &dyn ScoringReader,
    league: &League,
    now: i64,
) -> Result<MarketAverage> {
    let mut auctions = reader.get_league_auctions(league.id).await?;

    if auctions.is_empty() && !league.use_manual_auctions {
        let start = league
            .draft_starts_at
            .map(|t| t.timestamp())
            .unwrap_or(now);
        auctions = reader
            .get_auctions_ending_between(start + 4 * DAY_SECS, start + 5 * DAY_SECS)
            .await?;
    }

    Ok(average_movement(&auctions, now))
}

// endregion: --- Market Average

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::model::LeagueStatus;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    const NOW: i64 = 1_700_000_000;

    fn auction(id: &str, bid: Option<f64>, final_price: Option<f64>, base: Option<f64>, ended: bool) -> Auction {
        Auction {
            auction_id: id.to_string(),
            title: id.to_string(),
            image_url: None,
            current_bid: bid,
            final_price,
            timestamp_end: if ended { NOW - 1 } else { NOW + 1 },
            price_at_48h: base,
        }
    }

    #[test]
    fn averages_movement_from_baseline() {
        let auctions = vec![
            auction("a", Some(12_000.0), None, Some(10_000.0), false),
            auction("b", None, Some(30_000.0), Some(20_000.0), true),
            auction("c", Some(40_000.0), None, Some(20_000.0), true),
            auction("d", Some(1.0), None, None, false),
        ];
        let market = average_movement(&auctions, NOW);
        // 20, 50, -50
        assert_eq!(market.auction_count, 3);
        assert_eq!(market.report().market_average, 6.67);
        assert!(market.auctions[2].reserve_not_met);
    }

    #[test]
    fn no_auctions_means_zero() {
        assert_eq!(average_movement(&[], NOW), MarketAverage::empty());
    }

    #[tokio::test]
    async fn auto_league_falls_back_to_fourth_day_window() {
        let draft = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let start = draft.timestamp();
        let now = start + 10 * DAY_SECS;
        let store = MemoryStore::new();
        for (id, end, base) in [
            ("in-window", start + 4 * DAY_SECS + 3_600, Some(10_000.0)),
            ("window-edge", start + 5 * DAY_SECS, Some(20_000.0)),
            ("too-early", start + 4 * DAY_SECS - 1, Some(10_000.0)),
            ("too-late", start + 5 * DAY_SECS + 1, Some(10_000.0)),
            ("no-baseline", start + 4 * DAY_SECS + 60, None),
        ] {
            store
                .put_auction(Auction {
                    auction_id: id.to_string(),
                    title: id.to_string(),
                    image_url: None,
                    current_bid: None,
                    final_price: Some(12_000.0),
                    timestamp_end: end,
                    price_at_48h: base,
                })
                .await;
        }
        let mut league = League {
            id: 1,
            name: "Goodwood".to_string(),
            status: LeagueStatus::Active,
            spending_limit: None,
            use_manual_auctions: false,
            draft_starts_at: Some(draft),
        };
        store.add_league(league.clone()).await;

        let market = league_market_average(&store, &league, now).await.unwrap();
        let ids: Vec<&str> = market.auctions.iter().map(|a| a.auction_id.as_str()).collect();
        assert_eq!(ids, vec!["in-window", "window-edge"]);
        // 20, -40
        assert_eq!(market.report().market_average, -10.0);

        // 수동 리그는 대체 구간을 사용하지 않음
        league.use_manual_auctions = true;
        let manual = league_market_average(&store, &league, now).await.unwrap();
        assert_eq!(manual, MarketAverage::empty());

        // 명시 목록이 있으면 그것이 우선
        league.use_manual_auctions = false;
        store.add_league_auction(1, "too-late").await;
        let explicit = league_market_average(&store, &league, now).await.unwrap();
        assert_eq!(explicit.auction_count, 1);
        assert_eq!(explicit.auctions[0].auction_id, "too-late");
    }

    #[test]
    fn non_finite_prices_are_left_out() {
        let auctions = vec![
            auction("a", Some(f64::INFINITY), None, Some(10_000.0), false),
            auction("b", Some(11_000.0), None, Some(10_000.0), false),
        ];
        let market = average_movement(&auctions, NOW);
        assert_eq!(market.auction_count, 1);
        assert_eq!(market.report().market_average, 10.0);
    }
}
