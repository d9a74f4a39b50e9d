/// 전체 리그 조회
pub const LIST_LEAGUES: &str = "SELECT id, name, status, spending_limit, use_manual_auctions, draft_starts_at FROM leagues ORDER BY id";

/// 리그 조회
pub const GET_LEAGUE: &str = "SELECT id, name, status, spending_limit, use_manual_auctions, draft_starts_at FROM leagues WHERE id = $1";

/// 리그 멤버 조회 (가입 순서, user_id 순)
pub const GET_LEAGUE_MEMBERS: &str = r#"
    SELECT lm.user_id, u.username, lm.total_score, lm.rank, lm.rank_change, lm.win_streak
    FROM league_members lm
    LEFT JOIN users u ON u.id = lm.user_id
    WHERE lm.league_id = $1
    ORDER BY lm.joined_at, lm.user_id
"#;

/// 차고 차량 + 경매 조회
pub const GET_GARAGE_CARS: &str = r#"
    SELECT gc.purchase_price, a.auction_id, a.title, a.image_url, a.current_bid,
           a.final_price, a.timestamp_end, a.price_at_48h
    FROM garages g
    JOIN garage_cars gc ON gc.garage_id = g.id
    LEFT JOIN auctions a ON a.auction_id = gc.auction_id
    WHERE g.user_id = $1 AND g.league_id = $2
    ORDER BY gc.id
"#;

/// 보너스 예측 조회
pub const GET_BONUS_PREDICTION: &str =
    "SELECT predicted_price FROM bonus_predictions WHERE user_id = $1 AND league_id = $2";

/// 리그 보너스 경매 조회
pub const GET_LEAGUE_BONUS_AUCTION: &str = r#"
    SELECT a.title, a.image_url, a.current_bid, a.final_price, a.price_at_48h
    FROM leagues l
    JOIN auctions a ON a.auction_id = l.bonus_auction_id
    WHERE l.id = $1
"#;

/// 리그 지정 경매 조회
pub const GET_LEAGUE_AUCTIONS: &str = r#"
    SELECT a.auction_id, a.title, a.image_url, a.current_bid, a.final_price,
           a.timestamp_end, a.price_at_48h
    FROM league_auctions la
    JOIN auctions a ON a.auction_id = la.auction_id
    WHERE la.league_id = $1
    ORDER BY a.auction_id
"#;

/// 종료 시각 구간 경매 조회 (48시간 가격 필수)
pub const GET_AUCTIONS_ENDING_BETWEEN: &str = r#"
    SELECT auction_id, title, image_url, current_bid, final_price, timestamp_end, price_at_48h
    FROM auctions
    WHERE timestamp_end >= $1 AND timestamp_end <= $2 AND price_at_48h IS NOT NULL
    ORDER BY auction_id
"#;

/// 멤버 점수 캐시 갱신
pub const UPDATE_LEAGUE_MEMBER_SCORE: &str = r#"
    UPDATE league_members
    SET total_score = $3, rank = $4, rank_change = $5
    WHERE league_id = $1 AND user_id = $2
"#;

/// 성과 스냅샷 추가
pub const INSERT_PERFORMANCE_SNAPSHOT: &str = r#"
    INSERT INTO performance_history
        (league_id, user_id, timestamp, cumulative_gain, rank, total_spent, car_count, snapshot)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

/// 모든 차고 경매가 종료된 활성 리그 완료 처리
pub const COMPLETE_FINISHED_LEAGUES: &str = r#"
    UPDATE leagues l
    SET status = 'completed'
    WHERE l.status = 'active'
      AND EXISTS (
          SELECT 1 FROM garages g
          JOIN garage_cars gc ON gc.garage_id = g.id
          WHERE g.league_id = l.id
      )
      AND NOT EXISTS (
          SELECT 1 FROM garages g
          JOIN garage_cars gc ON gc.garage_id = g.id
          JOIN auctions a ON a.auction_id = gc.auction_id
          WHERE g.league_id = l.id AND a.timestamp_end >= $1
      )
    RETURNING l.id
"#;
