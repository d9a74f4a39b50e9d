/// 점수 및 랭킹 엔진
/// 경매 가격 → 유효 가격 → 사용자 점수 → 리그 통계 → 순위 → 스냅샷
// region:    --- Modules
pub mod bonus;
pub mod league_stats;
pub mod market;
pub mod model;
pub mod ranking;
pub mod snapshot;
pub mod standings;
pub mod user_score;
pub mod valuation;

// endregion: --- Modules

/// 출력 경계에서만 사용하는 소수 둘째 자리 반올림
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(23.333_333), 23.33);
        assert_eq!(round2(-80.000_000_000_01), -80.0);
        assert_eq!(round2(3.846_153), 3.85);
    }
}
