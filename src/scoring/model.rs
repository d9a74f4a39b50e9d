use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 모델 (점수 계산에 필요한 필드만)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub auction_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub current_bid: Option<f64>,
    pub final_price: Option<f64>,
    /// 종료 시각 (epoch seconds)
    pub timestamp_end: i64,
    pub price_at_48h: Option<f64>,
}

impl Auction {
    pub fn has_ended(&self, now: i64) -> bool {
        self.timestamp_end < now
    }
}

// 차고 차량 모델 (경매 조인 포함)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarageCar {
    pub purchase_price: f64,
    /// 조인 실패 시 None
    pub auction: Option<Auction>,
}

// 보너스 예측 모델
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusPrediction {
    pub predicted_price: f64,
}

// 리그 보너스 경매 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusAuction {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub current_bid: Option<f64>,
    pub final_price: Option<f64>,
    pub price_at_48h: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    Draft,
    Active,
    Completed,
}

impl LeagueStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

// 리그 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub status: LeagueStatus,
    pub spending_limit: Option<f64>,
    pub use_manual_auctions: bool,
    pub draft_starts_at: Option<DateTime<Utc>>,
}

// 리그 멤버 모델 (마지막으로 계산된 캐시 값)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueMember {
    pub user_id: i64,
    pub username: Option<String>,
    pub total_score: Option<f64>,
    pub previous_rank: Option<i32>,
    pub previous_rank_change: i32,
    pub win_streak: i32,
}

// 성과 스냅샷 모델 (추가 전용)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub league_id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub cumulative_gain: f64,
    pub rank: i32,
    pub total_spent: f64,
    pub car_count: i32,
    pub detail: serde_json::Value,
}

// 멤버 점수 캐시 갱신 값 (리그 단위 일괄 기록)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberScoreUpdate {
    pub user_id: i64,
    pub total_score: f64,
    pub rank: i32,
    pub rank_change: i32,
}
