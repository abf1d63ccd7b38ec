//! `campus-chat admin ...` subcommands.

use std::error::Error;

use clap::Subcommand;

use crate::core::admin::{AdminClient, PollSettings};

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List model files the server can load
    Models,
    /// Load a model and wait until the server reports it live
    LoadModel {
        /// Model file name as listed by `models`
        name: String,
    },
    /// Rebuild the knowledge base and wait for it to finish
    Sync,
    /// Show the loaded model and sync state
    Status,
}

pub async fn run_admin(
    server_url: &str,
    poll: PollSettings,
    password: &str,
    command: AdminCommand,
) -> Result<(), Box<dyn Error>> {
    let admin = AdminClient::new(server_url, poll)?;

    if !admin.login(password).await? {
        eprintln!("❌ Invalid admin password");
        std::process::exit(1);
    }

    let result = run_command(&admin, command).await;

    if let Err(err) = admin.logout().await {
        tracing::debug!(error = %err, "Admin logout failed");
    }

    if let Err(err) = result {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run_command(admin: &AdminClient, command: AdminCommand) -> Result<(), Box<dyn Error>> {
    match command {
        AdminCommand::Models => {
            let listing = admin.list_models().await?;
            if listing.models.is_empty() {
                println!("No models available on the server.");
            }
            for model in &listing.models {
                let marker = if listing.current_model.as_deref() == Some(model.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {model}");
            }
        }
        AdminCommand::LoadModel { name } => {
            println!("⏳ Loading model \"{name}\"...");
            let ack = admin.load_model(&name).await?;
            tracing::debug!(ack = %ack, "Model load acknowledged");
            println!("✅ Model \"{name}\" loaded successfully!");
        }
        AdminCommand::Sync => {
            println!("⏳ Syncing the knowledge base...");
            let ack = admin.sync().await?;
            tracing::debug!(ack = %ack, "Sync acknowledged");
            println!("✅ Knowledge base synced successfully!");
        }
        AdminCommand::Status => {
            let model = admin.model_status().await?;
            let sync = admin.sync_status().await?;
            match (model.model_loaded, model.current_model) {
                (true, Some(name)) => println!("Model: {name}"),
                _ => println!("Model: (none loaded)"),
            }
            let sync_state = if sync.running {
                "running".to_string()
            } else if let Some(error) = sync.error {
                format!("failed ({error})")
            } else if sync.completed {
                "completed".to_string()
            } else {
                "idle".to_string()
            };
            println!("Sync: {sync_state}");
        }
    }
    Ok(())
}
