//! Database migration runner for Permitflow.
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show applied and pending migrations
//!   migrator fresh   - Drop every table and migrate from scratch
//!
//! Reads `DATABASE_URL` from the environment or `.env`.

use permitflow_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::run_cli(Migrator).await;
}
