/// 보너스 경매 예측 점수 계산
// region:    --- Imports
use super::model::{BonusAuction, BonusPrediction};
use crate::error::{Result, ScoringError};
use serde::Serialize;

// endregion: --- Imports

// region:    --- Bonus Prediction Scorer
/// 오차율 상한(%)과 보너스 점수. 오름차순으로 평가, 처음 일치하는 구간 적용
const BONUS_TIERS: [(f64, f64); 4] = [(5.0, 25.0), (10.0, 15.0), (15.0, 10.0), (20.0, 5.0)];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusScore {
    pub predicted: f64,
    pub actual: f64,
    pub error: f64,
    pub percent_error: f64,
    pub bonus_points: f64,
    /// 48시간 시점 대비 변동률 (표시용, 리그 점수에는 미반영)
    pub base_percent_gain: f64,
    pub title: Option<String>,
    pub image_url: Option<String>,
}

/// 오차율에 해당하는 보너스 점수
pub fn bonus_points_for(percent_error: f64) -> f64 {
    BONUS_TIERS
        .iter()
        .find(|(limit, _)| percent_error <= *limit)
        .map(|(_, points)| *points)
        .unwrap_or(0.0)
}

/// 예측 점수 계산
/// 보너스 경매가 없거나 예측이 없거나 실제 가격을 알 수 없으면 None
pub fn score_prediction(
    prediction: Option<&BonusPrediction>,
    bonus_auction: Option<&BonusAuction>,
) -> Result<Option<BonusScore>> {
    let (Some(prediction), Some(auction)) = (prediction, bonus_auction) else {
        return Ok(None);
    };

    // 낙찰가가 0이면 현재 입찰가 사용
    let actual = match auction.final_price {
        Some(price) if price != 0.0 => Some(price),
        _ => auction.current_bid,
    };
    let Some(actual) = actual else {
        return Ok(None);
    };

    if actual == 0.0 || !actual.is_finite() {
        return Err(ScoringError::DivisionHazard {
            field: "actual_price",
            value: actual,
        });
    }

    let predicted = prediction.predicted_price;
    let error = (predicted - actual).abs();
    let percent_error = error / actual * 100.0;

    let baseline = auction
        .price_at_48h
        .filter(|p| *p > 0.0 && p.is_finite())
        .unwrap_or(actual);
    let base_percent_gain = (actual - baseline) / baseline * 100.0;

    Ok(Some(BonusScore {
        predicted,
        actual,
        error,
        percent_error,
        bonus_points: bonus_points_for(percent_error),
        base_percent_gain,
        title: auction.title.clone(),
        image_url: auction.image_url.clone(),
    }))
}

// endregion: --- Bonus Prediction Scorer

#[cfg(test)]
mod tests {
    use super::*;

    fn bonus_auction(current_bid: Option<f64>, final_price: Option<f64>) -> BonusAuction {
        BonusAuction {
            title: Some("1967 Jaguar E-Type".to_string()),
            image_url: None,
            current_bid,
            final_price,
            price_at_48h: None,
        }
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(bonus_points_for(0.0), 25.0);
        assert_eq!(bonus_points_for(5.0), 25.0);
        assert_eq!(bonus_points_for(5.01), 15.0);
        assert_eq!(bonus_points_for(10.0), 15.0);
        assert_eq!(bonus_points_for(15.0), 10.0);
        assert_eq!(bonus_points_for(20.0), 5.0);
        assert_eq!(bonus_points_for(20.01), 0.0);
    }

    #[test]
    fn close_prediction_earns_top_tier() {
        let prediction = BonusPrediction {
            predicted_price: 50_000.0,
        };
        let score = score_prediction(Some(&prediction), Some(&bonus_auction(None, Some(52_000.0))))
            .unwrap()
            .unwrap();
        assert_eq!(score.actual, 52_000.0);
        assert!((score.percent_error - 3.846).abs() < 0.001);
        assert_eq!(score.bonus_points, 25.0);
        // 기준가가 없으면 변동률 0
        assert_eq!(score.base_percent_gain, 0.0);
    }

    #[test]
    fn running_bonus_auction_uses_current_bid() {
        let prediction = BonusPrediction {
            predicted_price: 30_000.0,
        };
        let mut auction = bonus_auction(Some(40_000.0), None);
        auction.price_at_48h = Some(32_000.0);
        let score = score_prediction(Some(&prediction), Some(&auction))
            .unwrap()
            .unwrap();
        assert_eq!(score.actual, 40_000.0);
        assert_eq!(score.percent_error, 25.0);
        assert_eq!(score.bonus_points, 0.0);
        assert_eq!(score.base_percent_gain, 25.0);
    }

    #[test]
    fn missing_pieces_yield_no_contribution() {
        let prediction = BonusPrediction {
            predicted_price: 1.0,
        };
        let auction = bonus_auction(Some(10.0), None);
        assert!(score_prediction(None, Some(&auction)).unwrap().is_none());
        assert!(score_prediction(Some(&prediction), None).unwrap().is_none());
        let unpriced = bonus_auction(None, None);
        assert!(score_prediction(Some(&prediction), Some(&unpriced))
            .unwrap()
            .is_none());
    }

    #[test]
    fn zero_actual_price_is_a_division_hazard() {
        let prediction = BonusPrediction {
            predicted_price: 1.0,
        };
        let err = score_prediction(Some(&prediction), Some(&bonus_auction(Some(0.0), None)))
            .unwrap_err();
        assert!(matches!(err, ScoringError::DivisionHazard { .. }));
    }
}
