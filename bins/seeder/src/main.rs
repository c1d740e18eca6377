//! Development seeder for Permitflow.
//!
//! Registers one officer per role (skipping any that already exist) and
//! prints a bearer token for each, plus one for a fresh applicant, so the
//! API can be exercised locally.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use uuid::Uuid;

use permitflow_core::workflow::OfficerRole;
use permitflow_db::repositories::{CreateOfficerInput, OfficerRepository};
use permitflow_shared::{ActorRole, AppConfig, JwtConfig, JwtService};

/// Seeded officers: role, display name, email.
const OFFICERS: [(OfficerRole, &str, &str); 5] = [
    (OfficerRole::JuniorEngineer, "Ravi Kulkarni", "je@permitflow.dev"),
    (OfficerRole::AssistantEngineer, "Sunita Joshi", "ae@permitflow.dev"),
    (OfficerRole::ExecutiveEngineer, "Anil Deshmukh", "ee@permitflow.dev"),
    (OfficerRole::CityEngineer, "Priya Nair", "ce@permitflow.dev"),
    (OfficerRole::Clerk, "Mohan Shinde", "clerk@permitflow.dev"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = permitflow_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    let repo = OfficerRepository::new(db);
    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: config.jwt.access_token_expires_minutes,
    });

    println!("Seeding officers...");
    for (role, name, email) in OFFICERS {
        let officer = if let Some(existing) = repo.find_by_email(email).await? {
            println!("  {email} already exists, skipping...");
            existing
        } else {
            repo.create(CreateOfficerInput {
                name: name.to_string(),
                email: email.to_string(),
                mobile: None,
                role,
            })
            .await?
        };

        let token = jwt.generate_access_token(officer.id, ActorRole::from(role))?;
        println!("  {} {}: {token}", role.abbreviation(), officer.id);
    }

    let applicant = Uuid::new_v4();
    let token = jwt.generate_access_token(applicant, ActorRole::Applicant)?;
    println!("Applicant {applicant}: {token}");

    println!("Seeding complete!");
    Ok(())
}
