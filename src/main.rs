// region:    --- Imports
use bixprix_scoring::config::AppConfig;
use bixprix_scoring::dashboard::Dashboard;
use bixprix_scoring::database::DatabaseManager;
use bixprix_scoring::handlers::{self, AppState};
use bixprix_scoring::job::RecalculationJob;
use bixprix_scoring::scheduler::{RecalculationScheduler, RunGate};
use bixprix_scoring::store::PgScoringStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 환경 설정 로드
    let config = AppConfig::from_env()?;

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::connect(&config).await?);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 저장소, 잡, 대시보드 구성
    let store = Arc::new(PgScoringStore::new(Arc::clone(&db_manager)));
    let job = Arc::new(RecalculationJob::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        config.job.clone(),
    ));
    let dashboard = Arc::new(Dashboard::new(store, &config.job));
    let gate: RunGate = Arc::new(Mutex::new(()));

    // 정기 재계산 스케줄러
    let scheduler =
        RecalculationScheduler::new(Arc::clone(&job), config.recalc_interval, Arc::clone(&gate));
    let _scheduler_handle = scheduler.start();

    let routes_all = handlers::router(AppState {
        job,
        dashboard,
        gate,
    });

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
