#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use school_planner::{PlannerConfig, PlannerSession, http_api, logging};

    let config = PlannerConfig::from_env();
    logging::init_tracing("school_planner=info,http=info");

    let addr: SocketAddr = config.http_addr.parse()?;
    let store = config.store.open()?;
    let session = PlannerSession::open(store)?;

    println!("school-planner HTTP API listening on http://{addr}");
    http_api::serve(addr, session).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
