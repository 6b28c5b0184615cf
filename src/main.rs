// This file is an example of how to use the `form_vision` library.
// It synthesizes a reference throw and a slightly different target throw, then prints
// the local critique and, when an API key is available, the remote one as well.
//
// Usage: form_vision [config.toml]

use anyhow::Result;
use form_vision::config::Config;
use form_vision::core_modules::landmark::{
    FrameLandmarks, LEFT_SHOULDER, LEFT_WRIST, Landmark, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_WRIST,
};
use form_vision::{ComparisonSession, LocalComposer, RemoteAdviceClient, RemoteComposer, Side};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// One frame of a right-handed throw at progress `t` in 0..1.
fn synthetic_pose(t: f64, elbow_drop: f64) -> FrameLandmarks {
    let mut frame = FrameLandmarks::empty();
    let point = |x: f64, y: f64| Some(Landmark::new(x, y, 0.0, 0.95));
    let wrist_x = if t < 0.5 { 0.35 + 0.2 * t } else { 0.75 + 0.1 * t };
    let wrist_y = if t < 0.5 { 0.25 } else { 0.35 + 0.2 * t };

    frame.set(LEFT_SHOULDER, point(0.42, 0.35));
    frame.set(RIGHT_SHOULDER, point(0.58, 0.35));
    frame.set(RIGHT_ELBOW, point(0.55 + 0.1 * t, 0.3 + elbow_drop));
    frame.set(RIGHT_WRIST, point(wrist_x, wrist_y + elbow_drop));
    frame.set(LEFT_WRIST, point(0.4, 0.55));
    frame
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("form_vision=info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    info!("Form Vision - Example Runner");

    let mut session = ComparisonSession::new(&config.comparison);
    let frames = 60;
    for i in 0..frames {
        let t = i as f64 / frames as f64;
        let time = i as f64 / 30.0;
        session.record(Side::Reference, &synthetic_pose(t, 0.0), time);
        session.record(Side::Target, &synthetic_pose(t, 0.04), time + 0.2);
    }

    let local = LocalComposer::new(config.comparison.clone());
    println!("--- Local critique ---\n{}", session.compose(&local).await);

    match RemoteAdviceClient::from_config(config.advice.clone().with_env_api_key()) {
        Ok(client) => {
            let remote = RemoteComposer::new(client, &config.comparison);
            println!("--- Remote critique ---\n{}", session.compose(&remote).await);
        }
        Err(e) => warn!("skipping remote critique: {e}"),
    }

    Ok(())
}
