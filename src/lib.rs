/*!
# Climate Insights

A login-gated climate dashboard served to the browser, built in Rust.

## Overview

The dashboard loads a yearly table of CO₂ concentration, temperature anomaly
and rainfall, backfills missing region and anomaly labels, and presents it
through six pages: an overview with alerts, a paced live replay, correlation
analytics, a linear CO₂ forecast, regional breakdowns and a feedback form.

## Architecture

### Core Layer
- **dataset**: CSV loading, column aliases and deterministic backfill
- **analytics**: correlations, anomaly counts, regional aggregates and alerts
- **regression**: least-squares fit, random train/test split, MSE and R²
- **feed**: the live replay as a plain iterator of per-year frames
- **feedback**: validated, append-only feedback rows

### Session Layer
- **session**: per-user state and the store keyed by the session cookie
- **identity**: local (argon2 + JSON) and Firebase identity providers
- **auth**: the gate that flips a session to authenticated

### Presentation Layer
- **chart**: SVG line, area, bar and heatmap charts
- **templates**: handlebars templates compiled into the binary
- **pages**: one renderer per page behind a registry
- **app**: axum routes, session middleware and the server-sent live feed

## Routes

- `/login` - Sign in or register
- `/logout` - Return to the anonymous state
- `/dashboard?page={name}` - Render a page by name
- `/dashboard/feedback` - Submit the feedback form
- `/api/live` - Live feed as server-sent events
*/

pub mod analytics;
pub mod auth;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod feed;
pub mod feedback;
pub mod identity;
pub mod pages;
pub mod regression;
pub mod session;
pub mod templates;

#[cfg(feature = "web")]
pub mod app;

pub use config::Config;
pub use dataset::{ClimateRecord, Dataset, load_dataset};
pub use error::{DashboardError, Result};
