use anyhow::Result;
use avuntia::{App, ClickModifiers, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("avuntia=info".parse()?),
        )
        .init();

    info!("Starting avuntia pilot shell");

    // Load configuration from environment
    let config = Config::from_env()?;

    // Boot the application at the root entry point
    let mut app = App::bootstrap(&config, "/").await?;
    info!(path = app.router().current_path(), "initial view mounted");

    // Walk the public surface the way a visitor would
    for path in ["/planes", "/como-funciona", "/empresa", "/empleado"] {
        app.handle_link_click(path, ClickModifiers::default())
            .await?;
        info!(
            path = app.router().current_path(),
            bytes = app.router().mount().map(|m| m.to_html().len()).unwrap_or(0),
            "rendered"
        );
    }

    // Switch languages on the current view
    for code in ["en", "ca", "es"] {
        app.set_language(code).await?;
        info!(language = code, "language applied");
    }

    // And back through history
    app.handle_back().await?;
    info!(path = app.router().current_path(), "after back");

    // Dump the final rendered view
    if let Some(mount) = app.router().mount() {
        println!("{}", mount.to_html());
    }

    info!("Demo walk finished");
    Ok(())
}
