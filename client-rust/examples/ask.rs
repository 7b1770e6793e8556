use dotenvy::dotenv;
use nanban_client::{RouterOptions, Session};
use std::sync::Arc;

mod common;

#[tokio::main]
async fn main() {
    dotenv().ok();
    common::init_tracing();

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");

    let options = RouterOptions::from_env();
    let (session, _probe) = Session::start(
        &options,
        common::geolocator_from_env(),
        Arc::new(common::TerminalView),
    )
    .await;

    session.submit_query(&question).await;
}
