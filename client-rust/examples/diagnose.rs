use dotenvy::dotenv;
use nanban_client::{ImageUpload, RouterOptions, Session};
use std::sync::Arc;

mod common;

#[tokio::main]
async fn main() {
    dotenv().ok();
    common::init_tracing();

    let path = std::env::args()
        .nth(1)
        .expect("usage: diagnose <path-to-image>");
    let image = ImageUpload::from_path(&path).await.unwrap();

    let options = RouterOptions::from_env();
    let (mut session, _probe) = Session::start(
        &options,
        common::geolocator_from_env(),
        Arc::new(common::TerminalView),
    )
    .await;

    if session.select_file(image) {
        session.submit_image().await;
    }
}
