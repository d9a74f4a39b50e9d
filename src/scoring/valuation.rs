/// 경매 유효 가격 산정
/// 1. 낙찰가가 있으면 낙찰가
/// 2. 종료되었으나 낙찰가가 없으면 (리저브 미달) 현재 입찰가의 25%
/// 3. 진행 중이면 현재 입찰가
// region:    --- Imports
use super::model::Auction;
use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Auction Valuation
/// 리저브 미달 시 적용되는 비율 (75% 페널티)
pub const RESERVE_NOT_MET_FACTOR: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    Sold,
    /// 낙찰가가 0으로 확정 (출품 철회)
    Withdrawn,
    ReserveNotMet,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub status: CarStatus,
    pub effective_price: f64,
    /// 입찰가가 없으면 구매가로 대체된 값
    pub current_bid: f64,
}

/// 경매 유효 가격 계산 (부수 효과 없음)
pub fn value_auction(auction: &Auction, now: i64, purchase_price: f64) -> Result<Valuation> {
    if purchase_price.is_nan() || purchase_price <= 0.0 || purchase_price.is_infinite() {
        return Err(ScoringError::DivisionHazard {
            field: "purchase_price",
            value: purchase_price,
        });
    }

    let current_bid = auction.current_bid.unwrap_or(purchase_price);
    if !current_bid.is_finite() {
        return Err(ScoringError::DivisionHazard {
            field: "current_bid",
            value: current_bid,
        });
    }

    let (status, effective_price) = match auction.final_price {
        Some(final_price) if final_price == 0.0 => (CarStatus::Withdrawn, 0.0),
        Some(final_price) => (CarStatus::Sold, final_price),
        None if auction.has_ended(now) => (
            CarStatus::ReserveNotMet,
            current_bid * RESERVE_NOT_MET_FACTOR,
        ),
        None => (CarStatus::Pending, current_bid),
    };
    if !effective_price.is_finite() {
        return Err(ScoringError::DivisionHazard {
            field: "final_price",
            value: effective_price,
        });
    }

    Ok(Valuation {
        status,
        effective_price,
        current_bid,
    })
}

// endregion: --- Auction Valuation
