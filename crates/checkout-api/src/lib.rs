//! # checkout-api
//!
//! HTTP API layer for the drop-in checkout.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Sessions and advanced flow endpoints backed by a `PaymentGateway`
//! - Notification webhook with HMAC verification
//! - Server-side redirect continuation and destination pages
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/` | Flow selection |
//! | GET | `/sessions`, `/advanced` | Checkout pages |
//! | GET | `/pkg/*` | wasm driver bundle |
//! | GET | `/api/config` | Drop-in client configuration |
//! | POST | `/api/sessions` | Create payment session |
//! | POST | `/api/sessions/result` | Session result |
//! | POST | `/api/payments/details` | Redirect details |
//! | POST | `/api/payments/3DSDetails` | 3DS details |
//! | POST | `/api/payments/webhook` | Processor notifications |
//! | POST | `/advanced/api/paymentMethods` | Payment methods |
//! | POST | `/advanced/api/payments` | Make payment |
//! | POST | `/advanced/api/payments/details` | Payment details |
//! | GET | `/success`, `/result`, `/advanced/result` | Redirect continuation |
//! | GET | `/pending`, `/failed`, `/advanced/success`, `/advanced/failed` | Destination pages |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
