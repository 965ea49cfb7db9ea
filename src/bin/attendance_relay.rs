use shopdesk::{app, state::RelayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let state = RelayState::init()?;
    let (host, port) = (state.config.host.clone(), state.config.port);

    app::serve(app::build_relay_app(state), &host, port).await
}
