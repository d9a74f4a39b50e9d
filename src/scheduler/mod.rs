/// 점수 재계산 스케줄러
/// 일정 주기로 재계산 잡을 실행한다.
/// 엔진은 자체 상호 배제를 하지 않으므로, 수동 트리거와 공유하는 게이트로 실행을 직렬화한다.
// region:    --- Imports
use crate::job::RecalculationJob;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Recalculation Scheduler
/// 재계산 실행 게이트 (동시에 한 번만 실행)
pub type RunGate = Arc<Mutex<()>>;

pub struct RecalculationScheduler {
    job: Arc<RecalculationJob>,
    period: Duration,
    gate: RunGate,
}

impl RecalculationScheduler {
    pub fn new(job: Arc<RecalculationJob>, period: Duration, gate: RunGate) -> Self {
        Self { job, period, gate }
    }

    /// 스케줄러 시작 (주기가 0이면 시작하지 않음)
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.period.is_zero() {
            info!("{:<12} --> 내부 타이머 비활성화 (외부 트리거만 사용)", "Scheduler");
            return None;
        }

        let job = Arc::clone(&self.job);
        let gate = Arc::clone(&self.gate);
        let period = self.period;
        Some(tokio::spawn(async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let _guard = gate.lock().await;
                match job.run(Utc::now()).await {
                    Ok(summary) => info!(
                        "{:<12} --> 정기 재계산 완료: 리그 {}개, 스냅샷 {}건",
                        "Scheduler", summary.leagues, summary.total_snapshots
                    ),
                    Err(e) => error!(
                        "{:<12} --> 정기 재계산 중 오류 발생: {:?}",
                        "Scheduler", e
                    ),
                }
            }
        }))
    }
}
// endregion: --- Recalculation Scheduler
