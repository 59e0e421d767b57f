//! Profile management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use plaza_core::error::AppError;
use plaza_core::types::Identity;
use plaza_entity::profile::{Profile, ProfileDraft, avatar};

/// Arguments for profile commands
#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Profile subcommand
    #[command(subcommand)]
    pub command: ProfileCommand,
}

/// Profile subcommands
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show a stored profile
    Show {
        /// Identity
        uid: Identity,
    },
    /// Create or update a profile, keeping its progression
    Set {
        /// Identity
        uid: Identity,
        /// Display name
        #[arg(long)]
        name: String,
        /// Avatar code
        #[arg(long)]
        avatar: String,
        /// Status message
        #[arg(long)]
        message: Option<String>,
    },
}

/// Execute profile commands
pub async fn execute(
    args: &ProfileArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config_path).await?;

    match &args.command {
        ProfileCommand::Show { uid } => match engine.load(uid).await? {
            Some(profile) => print_profile(uid, &profile, format),
            None => output::print_warning(&format!("No profile stored for '{uid}'")),
        },
        ProfileCommand::Set {
            uid,
            name,
            avatar,
            message,
        } => {
            let submitted = Profile::initial(ProfileDraft {
                name: Some(name.clone()),
                avatar_code: Some(avatar.clone()),
                message: message.clone(),
                ..ProfileDraft::default()
            })
            .normalized();
            submitted.check()?;

            let previous = engine.load(uid).await?;
            let profile = submitted.with_progression_of(previous.as_ref());
            engine.save(uid, &profile).await?;
            output::print_success(&format!("Profile for '{uid}' saved"));
            print_profile(uid, &profile, format);
        }
    }

    Ok(())
}

fn print_profile(uid: &Identity, profile: &Profile, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(profile),
        OutputFormat::Table => {
            let unlocked: Vec<&str> = avatar::unlocked(profile.level, profile.exp)
                .into_iter()
                .map(|a| a.code)
                .collect();
            output::print_kv("Identity", uid.as_str());
            output::print_kv("Name", &profile.name);
            output::print_kv("Avatar", &profile.avatar_code);
            output::print_kv("Message", profile.message.as_deref().unwrap_or("-"));
            output::print_kv("Level", &profile.level.to_string());
            output::print_kv("Exp", &profile.exp.to_string());
            output::print_kv("Unlocked avatars", &unlocked.join(", "));
        }
    }
}
