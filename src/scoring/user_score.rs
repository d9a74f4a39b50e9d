/// 사용자 점수 계산
/// 차고 차량들의 수익률 합계 + 보너스 예측 점수
// region:    --- Imports
use super::bonus::{score_prediction, BonusScore};
use super::model::GarageCar;
use super::round2;
use super::valuation::{value_auction, CarStatus};
use crate::error::{Result, ScoringError};
use crate::store::ScoringReader;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

// endregion: --- Imports

// region:    --- Models
/// 차고 최대 차량 수 (이 수에 도달하면 로스터 완성)
pub const MAX_GARAGE_CARS: usize = 7;

/// 차량별 점수 (내부 전체 정밀도)
#[derive(Debug, Clone, PartialEq)]
pub struct CarScore {
    pub auction_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub purchase_price: f64,
    pub current_bid: f64,
    pub final_price: Option<f64>,
    pub effective_price: f64,
    pub status: CarStatus,
    pub percent_gain: f64,
    pub dollar_gain: f64,
}

/// 사용자 점수 (내부 전체 정밀도, 반올림은 report()에서만)
#[derive(Debug, Clone, PartialEq)]
pub struct UserScore {
    pub user_id: i64,
    pub league_id: i64,
    pub total_percent_gain: f64,
    pub total_dollar_gain: f64,
    pub total_final_value: f64,
    pub total_spent: f64,
    pub cars_count: usize,
    pub pending_count: usize,
    pub avg_percent_per_car: f64,
    pub bonus: Option<BonusScore>,
    /// percent_gain 내림차순
    pub cars: Vec<CarScore>,
    /// 계산 실패 시 사유 (점수는 0으로 대체됨)
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarScoreReport {
    pub auction_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub status: CarStatus,
    pub purchase_price: f64,
    pub current_bid: f64,
    pub effective_price: f64,
    pub percent_gain: f64,
    pub dollar_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserScoreReport {
    pub user_id: i64,
    pub league_id: i64,
    pub total_score: f64,
    pub total_percent_gain: f64,
    pub total_dollar_gain: f64,
    pub total_final_value: f64,
    pub total_spent: f64,
    pub cars_count: usize,
    pub pending_count: usize,
    pub avg_percent_per_car: f64,
    pub is_roster_complete: bool,
    pub bonus: Option<BonusScore>,
    pub cars: Vec<CarScoreReport>,
    pub best_car: Option<CarScoreReport>,
    pub worst_car: Option<CarScoreReport>,
    pub error: Option<String>,
}

impl CarScore {
    pub fn report(&self) -> CarScoreReport {
        CarScoreReport {
            auction_id: self.auction_id.clone(),
            title: self.title.clone(),
            image_url: self.image_url.clone(),
            status: self.status,
            purchase_price: round2(self.purchase_price),
            current_bid: round2(self.current_bid),
            effective_price: round2(self.effective_price),
            percent_gain: round2(self.percent_gain),
            dollar_gain: round2(self.dollar_gain),
        }
    }
}

impl UserScore {
    /// 계산 실패 시 사용하는 0점 결과
    pub fn zeroed(user_id: i64, league_id: i64, error: Option<String>) -> Self {
        Self {
            user_id,
            league_id,
            total_percent_gain: 0.0,
            total_dollar_gain: 0.0,
            total_final_value: 0.0,
            total_spent: 0.0,
            cars_count: 0,
            pending_count: 0,
            avg_percent_per_car: 0.0,
            bonus: None,
            cars: Vec::new(),
            error,
        }
    }

    /// 리그 점수 (= 수익률 합계)
    pub fn total_score(&self) -> f64 {
        self.total_percent_gain
    }

    pub fn best_car(&self) -> Option<&CarScore> {
        self.cars.first()
    }

    pub fn worst_car(&self) -> Option<&CarScore> {
        self.cars.last()
    }

    pub fn is_roster_complete(&self) -> bool {
        self.cars_count >= MAX_GARAGE_CARS
    }

    /// 출력용 (소수 둘째 자리 반올림)
    pub fn report(&self) -> UserScoreReport {
        let bonus = self.bonus.as_ref().map(|b| BonusScore {
            error: round2(b.error),
            percent_error: round2(b.percent_error),
            base_percent_gain: round2(b.base_percent_gain),
            ..b.clone()
        });

        UserScoreReport {
            user_id: self.user_id,
            league_id: self.league_id,
            total_score: round2(self.total_score()),
            total_percent_gain: round2(self.total_percent_gain),
            total_dollar_gain: round2(self.total_dollar_gain),
            total_final_value: round2(self.total_final_value),
            total_spent: round2(self.total_spent),
            cars_count: self.cars_count,
            pending_count: self.pending_count,
            avg_percent_per_car: round2(self.avg_percent_per_car),
            is_roster_complete: self.is_roster_complete(),
            bonus,
            cars: self.cars.iter().map(CarScore::report).collect(),
            best_car: self.best_car().map(CarScore::report),
            worst_car: self.worst_car().map(CarScore::report),
            error: self.error.clone(),
        }
    }
}

// endregion: --- Models

// region:    --- Pure Scoring
/// 차고 + 보너스로 사용자 점수 계산 (순수 함수)
pub fn score_garage(
    user_id: i64,
    league_id: i64,
    garage: &[GarageCar],
    bonus: Option<BonusScore>,
    now: i64,
) -> Result<UserScore> {
    let mut total_percent_gain = 0.0;
    let mut total_dollar_gain = 0.0;
    let mut total_final_value = 0.0;
    let mut total_spent = 0.0;
    let mut pending_count = 0;
    let mut cars = Vec::with_capacity(garage.len());

    for (index, car) in garage.iter().enumerate() {
        let auction = car.auction.as_ref().ok_or_else(|| {
            ScoringError::input(format!("차량 {index}의 경매 데이터가 없습니다"))
        })?;

        let valuation = value_auction(auction, now, car.purchase_price)?;
        let dollar_gain = valuation.effective_price - car.purchase_price;
        let percent_gain = dollar_gain / car.purchase_price * 100.0;

        if valuation.status == CarStatus::Pending {
            pending_count += 1;
        }

        total_percent_gain += percent_gain;
        total_dollar_gain += dollar_gain;
        total_final_value += valuation.effective_price;
        total_spent += car.purchase_price;

        cars.push(CarScore {
            auction_id: auction.auction_id.clone(),
            title: auction.title.clone(),
            image_url: auction.image_url.clone(),
            purchase_price: car.purchase_price,
            current_bid: valuation.current_bid,
            final_price: auction.final_price,
            effective_price: valuation.effective_price,
            status: valuation.status,
            percent_gain,
            dollar_gain,
        });
    }

    let cars_count = cars.len();

    // 보너스는 정확도 점수만 리그 점수에 반영
    if let Some(bonus) = &bonus {
        total_percent_gain += bonus.bonus_points;
    }

    let divisor = cars_count + usize::from(bonus.is_some());
    let avg_percent_per_car = if divisor > 0 {
        total_percent_gain / divisor as f64
    } else {
        0.0
    };

    // 안정 정렬: 같은 수익률은 차고 순서 유지
    cars.sort_by(|a, b| b.percent_gain.total_cmp(&a.percent_gain));

    Ok(UserScore {
        user_id,
        league_id,
        total_percent_gain,
        total_dollar_gain,
        total_final_value,
        total_spent,
        cars_count,
        pending_count,
        avg_percent_per_car,
        bonus,
        cars,
        error: None,
    })
}

// endregion: --- Pure Scoring

// region:    --- User Score Calculator
/// 저장소에서 사용자 데이터를 읽어 점수를 계산
#[derive(Clone)]
pub struct UserScoreCalculator {
    reader: Arc<dyn ScoringReader>,
}

impl UserScoreCalculator {
    pub fn new(reader: Arc<dyn ScoringReader>) -> Self {
        Self { reader }
    }

    /// 사용자 점수 계산
    /// 사용자 데이터 오류는 0점 결과 + error 필드로 반환하고,
    /// 저장소 장애 같은 나머지 오류는 호출자에게 전파
    pub async fn calculate(&self, user_id: i64, league_id: i64, now: i64) -> Result<UserScore> {
        match self.try_calculate(user_id, league_id, now).await {
            Ok(score) => {
                debug!(
                    "{:<12} --> 사용자 {} 리그 {}: 점수 {:.2}, 차량 {}대",
                    "Score",
                    user_id,
                    league_id,
                    score.total_score(),
                    score.cars_count
                );
                Ok(score)
            }
            Err(e) if e.is_recoverable_per_user() => {
                warn!(
                    "{:<12} --> 사용자 {} 리그 {} 점수 계산 실패, 0점 처리: {}",
                    "Score", user_id, league_id, e
                );
                Ok(UserScore::zeroed(user_id, league_id, Some(e.to_string())))
            }
            Err(e) => {
                error!(
                    "{:<12} --> 사용자 {} 리그 {} 데이터 조회 실패: {}",
                    "Score", user_id, league_id, e
                );
                Err(e)
            }
        }
    }

    async fn try_calculate(&self, user_id: i64, league_id: i64, now: i64) -> Result<UserScore> {
        let garage = self.reader.get_garage_cars(user_id, league_id).await?;
        let bonus = self.bonus_score(user_id, league_id).await?;
        score_garage(user_id, league_id, &garage, bonus, now)
    }

    /// 보너스 예측 점수 조회 및 계산
    pub async fn bonus_score(&self, user_id: i64, league_id: i64) -> Result<Option<BonusScore>> {
        let Some(bonus_auction) = self.reader.get_league_bonus_auction(league_id).await? else {
            return Ok(None);
        };
        let prediction = self.reader.get_bonus_prediction(user_id, league_id).await?;
        score_prediction(prediction.as_ref(), Some(&bonus_auction))
    }
}

// endregion: --- User Score Calculator

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::model::Auction;

    const NOW: i64 = 1_700_000_000;

    fn car(purchase_price: f64, current_bid: Option<f64>, final_price: Option<f64>, ended: bool) -> GarageCar {
        GarageCar {
            purchase_price,
            auction: Some(Auction {
                auction_id: format!("lot-{purchase_price}-{current_bid:?}"),
                title: "Test car".to_string(),
                image_url: None,
                current_bid,
                final_price,
                timestamp_end: if ended { NOW - 3600 } else { NOW + 3600 },
                price_at_48h: None,
            }),
        }
    }

    fn bonus(points: f64) -> BonusScore {
        BonusScore {
            predicted: 0.0,
            actual: 1.0,
            error: 0.0,
            percent_error: 0.0,
            bonus_points: points,
            base_percent_gain: 0.0,
            title: None,
            image_url: None,
        }
    }

    #[test]
    fn empty_garage_without_bonus_scores_zero() {
        let score = score_garage(1, 1, &[], None, NOW).unwrap();
        assert_eq!(score.total_percent_gain, 0.0);
        assert_eq!(score.avg_percent_per_car, 0.0);
        assert!(score.best_car().is_none());
        assert!(score.worst_car().is_none());
    }

    #[test]
    fn reserve_not_met_car_loses_eighty_percent() {
        let score = score_garage(1, 1, &[car(10_000.0, Some(8_000.0), None, true)], None, NOW).unwrap();
        let report = score.report();
        assert_eq!(report.cars[0].effective_price, 2_000.0);
        assert_eq!(report.cars[0].percent_gain, -80.0);
        assert_eq!(report.cars[0].dollar_gain, -8_000.0);
        assert_eq!(report.total_score, -80.0);
    }

    #[test]
    fn sold_car_gains_fifty_percent() {
        let score = score_garage(1, 1, &[car(10_000.0, None, Some(15_000.0), true)], None, NOW).unwrap();
        assert_eq!(score.report().total_percent_gain, 50.0);
        assert_eq!(score.best_car(), score.worst_car());
    }

    #[test]
    fn percent_gains_are_summed_and_bonus_points_added() {
        let garage = vec![
            car(10_000.0, None, Some(15_000.0), true),
            car(20_000.0, Some(22_000.0), None, false),
            car(30_000.0, Some(24_000.0), None, true),
        ];
        let score = score_garage(1, 1, &garage, Some(bonus(15.0)), NOW).unwrap();

        // 50 + 10 - 80 + 15
        assert!((score.total_percent_gain - -5.0).abs() < 1e-9);
        assert!((score.avg_percent_per_car - -1.25).abs() < 1e-9);
        assert_eq!(score.cars_count, 3);
        assert_eq!(score.pending_count, 1);
        assert_eq!(score.total_spent, 60_000.0);
        assert_eq!(score.best_car().unwrap().percent_gain, 50.0);
        assert!((score.worst_car().unwrap().percent_gain - -80.0).abs() < 1e-9);
        assert!(!score.is_roster_complete());
    }

    #[test]
    fn dollar_gain_is_exact_sum_of_cars() {
        let garage = vec![
            car(10_000.33, Some(10_500.17), None, false),
            car(7_777.77, None, Some(8_123.45), true),
            car(12_345.67, Some(9_999.99), None, true),
        ];
        let score = score_garage(1, 1, &garage, None, NOW).unwrap();

        let mut expected = 0.0;
        expected += 10_500.17 - 10_000.33;
        expected += 8_123.45 - 7_777.77;
        expected += 9_999.99 * 0.25 - 12_345.67;
        assert_eq!(score.total_dollar_gain, expected);
    }

    #[test]
    fn scoring_is_reproducible() {
        let garage = vec![
            car(10_000.0, Some(13_333.0), None, false),
            car(9_000.0, Some(7_000.0), None, true),
        ];
        let a = score_garage(7, 3, &garage, Some(bonus(5.0)), NOW).unwrap();
        let b = score_garage(7, 3, &garage, Some(bonus(5.0)), NOW).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total_percent_gain.to_bits(), b.total_percent_gain.to_bits());
    }

    #[test]
    fn missing_auction_join_is_input_error() {
        let garage = vec![GarageCar {
            purchase_price: 10_000.0,
            auction: None,
        }];
        let err = score_garage(1, 1, &garage, None, NOW).unwrap_err();
        assert!(matches!(err, ScoringError::InputData { .. }));
    }

    #[test]
    fn bonus_only_user_averages_over_one_entry() {
        let score = score_garage(1, 1, &[], Some(bonus(25.0)), NOW).unwrap();
        assert_eq!(score.total_percent_gain, 25.0);
        assert_eq!(score.avg_percent_per_car, 25.0);
    }
}
