/// 점수 재계산 잡
/// 활성 리그마다 점수 → 통계 → 순위 기록 → 스냅샷 추가를 수행한다.
/// 리그 하나의 실패는 결과 목록에 기록하고 다음 리그를 계속 처리한다.
/// 모든 리그 처리 후, 경매가 모두 끝난 리그를 완료 상태로 전환한다.
// region:    --- Imports
use crate::config::JobSettings;
use crate::error::{Result, ScoringError};
use crate::scoring::league_stats::LeagueStatsAggregator;
use crate::scoring::model::{League, LeagueStatus};
use crate::scoring::ranking::RankingEngine;
use crate::scoring::snapshot::PerformanceSnapshotWriter;
use crate::scoring::standings::load_standings;
use crate::scoring::user_score::UserScoreCalculator;
use crate::store::{
    LeagueLifecycle, LeagueListing, MemberScoreWriter, ScoringReader, SnapshotAppender,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Job Summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueRunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueOutcome {
    pub league_id: i64,
    pub league: String,
    pub status: LeagueRunStatus,
    pub snapshots: usize,
    pub error: Option<String>,
}

impl LeagueOutcome {
    fn failed(league_id: i64, league: String, e: &ScoringError) -> Self {
        error!("{:<12} --> {}", "Job", e);
        Self {
            league_id,
            league,
            status: LeagueRunStatus::Error,
            snapshots: 0,
            error: Some(e.to_string()),
        }
    }
}

/// 리그 자동 완료 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueCompletion {
    pub leagues_completed: usize,
    pub league_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    /// 처리한 리그 수 (검증 실패 리그 포함)
    pub leagues: usize,
    /// 비활성으로 건너뛴 리그 수
    pub skipped: usize,
    pub total_snapshots: usize,
    pub results: Vec<LeagueOutcome>,
    /// 완료 확인 실패 시 None
    pub league_completion: Option<LeagueCompletion>,
}

impl JobSummary {
    pub fn failed_leagues(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == LeagueRunStatus::Error)
            .count()
    }
}

// endregion: --- Job Summary

// region:    --- Recalculation Job
pub struct RecalculationJob {
    reader: Arc<dyn ScoringReader>,
    aggregator: LeagueStatsAggregator,
    ranking: RankingEngine,
    snapshots: PerformanceSnapshotWriter,
    lifecycle: Arc<dyn LeagueLifecycle>,
    settings: JobSettings,
}

impl RecalculationJob {
    pub fn new(
        reader: Arc<dyn ScoringReader>,
        writer: Arc<dyn MemberScoreWriter>,
        appender: Arc<dyn SnapshotAppender>,
        lifecycle: Arc<dyn LeagueLifecycle>,
        settings: JobSettings,
    ) -> Self {
        let aggregator = LeagueStatsAggregator::new(
            UserScoreCalculator::new(Arc::clone(&reader)),
            settings.score_concurrency,
            settings.default_spending_limit,
        );
        Self {
            reader,
            aggregator,
            ranking: RankingEngine::new(writer),
            snapshots: PerformanceSnapshotWriter::new(appender),
            lifecycle,
            settings,
        }
    }

    /// 수동 트리거 인증 (비밀값이 설정되지 않았으면 통과)
    pub fn authorize(&self, credential: Option<&str>) -> Result<()> {
        match self.settings.cron_secret.as_deref() {
            None => Ok(()),
            Some(secret) if credential == Some(secret) => Ok(()),
            Some(_) => Err(ScoringError::Authorization),
        }
    }

    /// 외부 트리거: 인증 후 실행
    pub async fn trigger(&self, credential: Option<&str>, now: DateTime<Utc>) -> Result<JobSummary> {
        if let Err(e) = self.authorize(credential) {
            warn!("{:<12} --> 인증 실패로 재계산 거부", "Job");
            return Err(e);
        }
        self.run(now).await
    }

    /// 재계산 1회 실행
    /// 리그 목록을 읽지 못하면 어떤 리그도 처리하지 않고 실패
    pub async fn run(&self, now: DateTime<Utc>) -> Result<JobSummary> {
        let listings = self.reader.list_leagues().await?;

        let mut active = Vec::new();
        let mut skipped = 0;
        let mut results = Vec::with_capacity(listings.len());

        for listing in listings {
            match listing {
                LeagueListing::Valid(league) if league.status == LeagueStatus::Active => {
                    active.push(league)
                }
                LeagueListing::Valid(_) => skipped += 1,
                LeagueListing::Invalid {
                    league_id,
                    name,
                    message,
                } => {
                    let e = ScoringError::LeaguePipeline { league_id, message };
                    results.push(LeagueOutcome::failed(league_id, name, &e));
                }
            }
        }

        info!(
            "{:<12} --> 재계산 시작: 활성 리그 {}개, 건너뜀 {}개, 검증 실패 {}개",
            "Job",
            active.len(),
            skipped,
            results.len()
        );

        let mut total_snapshots = 0;
        for league in &active {
            match self.process_league(league, now).await {
                Ok(snapshots) => {
                    total_snapshots += snapshots;
                    results.push(LeagueOutcome {
                        league_id: league.id,
                        league: league.name.clone(),
                        status: LeagueRunStatus::Success,
                        snapshots,
                        error: None,
                    });
                }
                Err(e) => {
                    let e = ScoringError::LeaguePipeline {
                        league_id: league.id,
                        message: e.to_string(),
                    };
                    results.push(LeagueOutcome::failed(league.id, league.name.clone(), &e));
                }
            }
        }

        let summary = JobSummary {
            success: true,
            timestamp: now,
            leagues: results.len(),
            skipped,
            total_snapshots,
            results,
            league_completion: self.complete_leagues(now).await,
        };
        info!(
            "{:<12} --> 재계산 완료: 리그 {}개, 스냅샷 {}건, 실패 {}개",
            "Job",
            summary.leagues,
            summary.total_snapshots,
            summary.failed_leagues()
        );
        Ok(summary)
    }

    /// 리그 하나 처리: 순위 기록 후 스냅샷 추가 (순서 중요)
    async fn process_league(&self, league: &League, now: DateTime<Utc>) -> Result<usize> {
        let standings =
            load_standings(self.reader.as_ref(), &self.aggregator, league, now.timestamp()).await?;

        self.ranking.publish(league.id, &standings.ranked).await?;

        let snapshots = PerformanceSnapshotWriter::build(
            league.id,
            &standings.ranked,
            now,
            standings.market.as_ref(),
        );
        self.snapshots.append(&snapshots).await
    }

    /// 경매가 모두 끝난 리그 완료 처리 (실패해도 잡 결과에는 영향 없음)
    async fn complete_leagues(&self, now: DateTime<Utc>) -> Option<LeagueCompletion> {
        match self.lifecycle.complete_finished_leagues(now.timestamp()).await {
            Ok(league_ids) => {
                if !league_ids.is_empty() {
                    info!(
                        "{:<12} --> 리그 {}개 자동 완료: {:?}",
                        "Job",
                        league_ids.len(),
                        league_ids
                    );
                }
                Some(LeagueCompletion {
                    leagues_completed: league_ids.len(),
                    league_ids,
                })
            }
            Err(e) => {
                error!("{:<12} --> 리그 완료 확인 실패: {}", "Job", e);
                None
            }
        }
    }
}

// endregion: --- Recalculation Job
