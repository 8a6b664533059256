//! Membership: invite-gated enrollment and profile views.
//!
//! Enrollment is the one compound write in the system: the new user and
//! their first proof artifact land in the same load/save cycle, so a member
//! never exists without the work that earned the seat.

use crate::core::broker::LedgerBroker;
use crate::core::config::{self, SessionConfig};
use crate::core::error::GuildError;
use crate::core::model::{FailureReport, MicroContract, Project, Track, User};
use crate::core::store::{self, Store};
use crate::core::time;
use crate::plugins::invite;
use crate::plugins::signal;
use clap::{Parser, Subcommand, ValueEnum};

/// Members with at least this many artifacts show as verified even when the
/// stored flag was never set.
pub const VERIFIED_PROOF_THRESHOLD: usize = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "member", about = "Guild membership and profiles.")]
pub struct MemberCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    /// Enroll with an invite code and a first proof artifact.
    Enroll {
        #[clap(long)]
        name: String,
        #[clap(long, value_enum)]
        track: Track,
        #[clap(long, default_value = "25")]
        session_price: u32,
        #[clap(long)]
        invite: String,
        #[clap(long)]
        university: Option<String>,
        #[clap(long)]
        github_url: Option<String>,
        #[clap(long)]
        figma_url: Option<String>,
        /// First artifact title.
        #[clap(long)]
        title: String,
        #[clap(long, default_value = "")]
        problem: String,
        #[clap(long = "link")]
        links: Vec<String>,
        /// What went wrong building it.
        #[clap(long, default_value = "")]
        wrong: String,
        /// What the experience taught.
        #[clap(long, default_value = "")]
        lessons: String,
    },
    /// Show a member profile (defaults to the acting user).
    Show {
        #[clap(long)]
        id: Option<String>,
    },
    /// List members with their signal.
    List,
}

#[derive(Debug, Clone)]
pub struct EnrollInput {
    pub name: String,
    pub track: Track,
    pub session_price: u32,
    pub invite_code: String,
    pub university: Option<String>,
    pub github_url: Option<String>,
    pub figma_url: Option<String>,
    pub first_title: String,
    pub first_problem: String,
    pub first_links: Vec<String>,
    pub first_wrong: String,
    pub first_lessons: String,
}

/// A member profile as a boundary view: the stored record (or one
/// synthesized from artifact snapshots when only work exists), plus the
/// derived signal and verification.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: User,
    pub signal: u32,
    pub verified: bool,
    pub projects: Vec<Project>,
    pub contracts: Vec<MicroContract>,
}

/// Validate the invite, then write the user and their first artifact in one
/// cycle. Returns the new user; the redeemed code stays on the record.
pub fn enroll(store: &Store, input: EnrollInput) -> Result<User, GuildError> {
    if input.name.trim().is_empty() {
        return Err(GuildError::ValidationError("member name is required".to_string()));
    }
    if input.first_title.trim().is_empty() {
        return Err(GuildError::ValidationError(
            "first artifact title is required".to_string(),
        ));
    }
    if input.first_links.iter().any(|l| l.trim().is_empty()) {
        return Err(GuildError::ValidationError("artifact links must be non-empty".to_string()));
    }

    let code = invite::normalize_code(&input.invite_code);
    let user_id = time::new_entity_id();
    let user = User {
        id: user_id.clone(),
        name: input.name.trim().to_string(),
        university: input.university.clone(),
        track: input.track,
        session_price: input.session_price,
        github_url: input.github_url.clone(),
        figma_url: input.figma_url.clone(),
        sessions_completed: 0,
        is_verified: false,
        invite_code: Some(code.clone()),
        is_admin: false,
    };
    let first_project = Project {
        id: time::new_entity_id(),
        user_id: user.id.clone(),
        user_name: user.name.clone(),
        user_track: user.track,
        title: input.first_title.trim().to_string(),
        problem: input.first_problem.clone(),
        outcome_description: String::new(),
        image_url: None,
        links: input.first_links.clone(),
        hard_part: input.first_wrong.clone(),
        what_id_redo: input.first_lessons.clone(),
        what_failed: FailureReport {
            goal: input.first_title.trim().to_string(),
            wrong: input.first_wrong.clone(),
            lessons: input.first_lessons.clone(),
            ..FailureReport::default()
        },
        timestamp: time::now_epoch_ms(),
        comments: Vec::new(),
        original_project_id: None,
        remix_reason: None,
        peer_review_requests: Vec::new(),
        is_spotlight: false,
    };

    let broker = LedgerBroker::new(store);
    let enrolled = user.clone();
    broker.with_ledger(&user_id, "member.enroll", move |ledger| {
        if !ledger.invite_is_valid(&code) {
            return Err(GuildError::ValidationError(format!(
                "invalid invite code '{}'",
                code
            )));
        }
        ledger.upsert_user(enrolled);
        ledger.insert_project(first_project);
        Ok(())
    })?;
    Ok(user)
}

/// Profile lookup. When the id has artifacts but no user record, a
/// placeholder profile is synthesized from the artifact snapshots, the way
/// the original profile surface rendered strangers.
pub fn profile(store: &Store, user_id: &str) -> Result<ProfileView, GuildError> {
    let ledger = LedgerBroker::new(store).read()?;
    let projects: Vec<Project> = ledger
        .projects
        .iter()
        .filter(|p| p.user_id == user_id)
        .cloned()
        .collect();
    let contracts: Vec<MicroContract> = ledger
        .contracts
        .iter()
        .filter(|c| c.user_id == user_id)
        .cloned()
        .collect();

    let user = match ledger.find_user(user_id) {
        Some(user) => user.clone(),
        None => {
            let snapshot = projects.first().ok_or_else(|| {
                GuildError::NotFound(format!("user '{}'", user_id))
            })?;
            User {
                id: user_id.to_string(),
                name: snapshot.user_name.clone(),
                university: None,
                track: snapshot.user_track,
                session_price: 25,
                github_url: None,
                figma_url: None,
                sessions_completed: 0,
                is_verified: false,
                invite_code: None,
                is_admin: false,
            }
        }
    };

    let signal = signal::score(&user, &ledger.projects);
    let verified = user.is_verified || projects.len() >= VERIFIED_PROOF_THRESHOLD;
    Ok(ProfileView {
        user,
        signal,
        verified,
        projects,
        contracts,
    })
}

pub fn run_member_cli(store: &Store, cli: MemberCli) -> Result<(), GuildError> {
    store::require_initialized(store)?;

    match cli.command {
        MemberCommand::Enroll {
            name,
            track,
            session_price,
            invite,
            university,
            github_url,
            figma_url,
            title,
            problem,
            links,
            wrong,
            lessons,
        } => {
            let user = enroll(
                store,
                EnrollInput {
                    name,
                    track,
                    session_price,
                    invite_code: invite,
                    university,
                    github_url,
                    figma_url,
                    first_title: title,
                    first_problem: problem,
                    first_links: links,
                    first_wrong: wrong,
                    first_lessons: lessons,
                },
            )?;
            // New enrollments become the active session, like the original
            // onboarding handoff.
            config::save_config(
                store,
                &SessionConfig {
                    actor: Some(user.id.clone()),
                },
            )?;
            println!("Enrolled '{}' (ID: {})", user.name, user.id);
        }
        MemberCommand::Show { id } => {
            let target = match id {
                Some(id) => id,
                None => crate::core::session::resolve_actor_id(store)?.ok_or_else(|| {
                    GuildError::ValidationError(
                        "no active session; pass --id or log in".to_string(),
                    )
                })?,
            };
            let view = profile(store, &target)?;
            match cli.format {
                OutputFormat::Text => {
                    use colored::Colorize;
                    let badge = if view.verified {
                        " [verified]".bright_green().to_string()
                    } else {
                        String::new()
                    };
                    println!("{}{}", view.user.name.bold(), badge);
                    println!(
                        "  track {}  signal {}  sessions {}",
                        view.user.track,
                        view.signal.to_string().bright_cyan(),
                        view.user.sessions_completed
                    );
                    for project in &view.projects {
                        println!("  proof {}  {}", project.id, project.title);
                    }
                    for contract in &view.contracts {
                        println!(
                            "  offer {}  {} [{}]",
                            contract.id, contract.title, contract.status
                        );
                    }
                }
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "member.show",
                        "success",
                        serde_json::json!({
                            "user": view.user,
                            "signal": view.signal,
                            "verified": view.verified,
                            "projects": view.projects.len(),
                            "contracts": view.contracts.len(),
                        }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
        MemberCommand::List => {
            let ledger = LedgerBroker::new(store).read()?;
            for user in &ledger.users {
                println!(
                    "{}  {:<24} {:<10} signal {}",
                    user.id,
                    user.name,
                    user.track.to_string(),
                    signal::score(user, &ledger.projects)
                );
            }
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "member",
        "version": "0.1.0",
        "description": "Invite-gated membership and profiles",
        "commands": [
            { "name": "enroll", "parameters": ["name", "track", "invite", "title"] },
            { "name": "show", "parameters": ["id"] },
            { "name": "list" }
        ],
        "storage": ["ledger.json", "config.toml"]
    })
}
