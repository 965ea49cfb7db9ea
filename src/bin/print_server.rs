use shopdesk::{app, state::PrintState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let state = PrintState::init()?;
    if !state.config.template_dir.is_dir() {
        tracing::warn!(dir = %state.config.template_dir.display(), "template directory not found; printing will fail");
    }
    let (host, port) = (state.config.host.clone(), state.config.port);

    app::serve(app::build_print_app(state), &host, port).await
}
