pub mod auth;
mod routes;

pub use routes::{build_router, AppState, InnerAppState};

use anyhow::Result;
use tokio::net::TcpListener;

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
