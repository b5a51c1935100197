//! # Drop-in Checkout
//!
//! Backend for the drop-in checkout pages.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export ADYEN_API_KEY=AQE...
//! export ADYEN_MERCHANT_ACCOUNT=YourMerchantECOM
//! export ADYEN_CLIENT_KEY=test_...
//! export ADYEN_HMAC_KEY=44782DEF...   # optional, verifies notifications
//!
//! # Run the server
//! dropin-checkout
//! ```

use checkout_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Payment provider: {} ({})",
        state.gateway.provider_name(),
        state.settings.environment.as_str()
    );
    info!("Return URL: {}", state.return_urls.session_url());

    let app = routes::create_router(state);

    info!("🚀 Drop-in checkout starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Sessions: POST http://{}/api/sessions", addr);
        info!("💳 Advanced: POST http://{}/advanced/api/payments", addr);
        info!("🔔 Webhook: POST http://{}/api/payments/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  💳 Drop-in Checkout 💳
  ━━━━━━━━━━━━━━━━━━━━━━━
  Sessions + advanced flow
  Version: {}
  
"#,
        env!("CARGO_PKG_VERSION")
    );
}
