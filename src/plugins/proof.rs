//! Proof artifacts: the work records that anchor every profile.
//!
//! Artifacts are never deleted. Remixing copies an artifact's content under
//! a new owner with lineage fields pointing back at the source; comments and
//! review requests always start empty on the copy.

use crate::core::broker::LedgerBroker;
use crate::core::error::GuildError;
use crate::core::model::{
    Comment, FailureReport, PeerReviewRequest, Project, ReviewStatus, Track, User,
};
use crate::core::output;
use crate::core::session;
use crate::core::store::{self, Store};
use crate::core::time;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "proof", about = "Transmit and critique proof artifacts.")]
pub struct ProofCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: ProofCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProofCommand {
    /// Publish a new artifact as the acting user.
    Transmit {
        #[clap(value_name = "TITLE")]
        title: String,
        #[clap(long, default_value = "")]
        problem: String,
        #[clap(long, default_value = "")]
        outcome: String,
        #[clap(long = "link")]
        links: Vec<String>,
        #[clap(long)]
        image_url: Option<String>,
        #[clap(long, default_value = "")]
        hard_part: String,
        #[clap(long, default_value = "")]
        redo: String,
        #[clap(long, default_value = "")]
        goal: String,
        #[clap(long, default_value = "")]
        approach: String,
        #[clap(long, default_value = "")]
        wrong: String,
        #[clap(long, default_value = "")]
        effect: String,
        #[clap(long, default_value = "")]
        lessons: String,
        #[clap(long, default_value = "")]
        redone: String,
        /// Spotlight artifacts are pinned surfaces, excluded from the feed.
        #[clap(long)]
        spotlight: bool,
    },
    /// The arena feed: newest first, spotlights excluded.
    Feed {
        #[clap(long, value_enum)]
        track: Option<Track>,
    },
    /// Show one artifact in full.
    Show {
        #[clap(long)]
        id: String,
    },
    /// Remix an artifact: copy it under your name with a pivot reason.
    Remix {
        #[clap(long)]
        id: String,
        #[clap(long)]
        reason: String,
    },
    /// Critique an artifact.
    Comment {
        #[clap(long)]
        id: String,
        #[clap(value_name = "TEXT")]
        text: String,
    },
    /// Request a peer review from a named member.
    Review {
        #[clap(long)]
        id: String,
        #[clap(long)]
        reviewer: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TransmitInput {
    pub title: String,
    pub problem: String,
    pub outcome_description: String,
    pub links: Vec<String>,
    pub image_url: Option<String>,
    pub hard_part: String,
    pub what_id_redo: String,
    pub what_failed: FailureReport,
    pub is_spotlight: bool,
}

pub fn transmit(store: &Store, owner: &User, input: TransmitInput) -> Result<Project, GuildError> {
    if input.title.trim().is_empty() {
        return Err(GuildError::ValidationError("artifact title is required".to_string()));
    }
    if input.links.iter().any(|l| l.trim().is_empty()) {
        return Err(GuildError::ValidationError("artifact links must be non-empty".to_string()));
    }

    let project = Project {
        id: time::new_entity_id(),
        user_id: owner.id.clone(),
        user_name: owner.name.clone(),
        user_track: owner.track,
        title: input.title.trim().to_string(),
        problem: input.problem,
        outcome_description: input.outcome_description,
        image_url: input.image_url,
        links: input.links,
        hard_part: input.hard_part,
        what_id_redo: input.what_id_redo,
        what_failed: input.what_failed,
        timestamp: time::now_epoch_ms(),
        comments: Vec::new(),
        original_project_id: None,
        remix_reason: None,
        peer_review_requests: Vec::new(),
        is_spotlight: input.is_spotlight,
    };

    let broker = LedgerBroker::new(store);
    let inserted = project.clone();
    broker.with_ledger(&owner.id, "proof.transmit", move |ledger| {
        ledger.insert_project(inserted);
        Ok(())
    })?;
    Ok(project)
}

/// The feed: stored order (newest first), spotlights excluded, optional
/// track filter.
pub fn feed(store: &Store, track: Option<Track>) -> Result<Vec<Project>, GuildError> {
    let ledger = LedgerBroker::new(store).read()?;
    Ok(ledger
        .projects
        .into_iter()
        .filter(|p| !p.is_spotlight)
        .filter(|p| track.is_none_or(|t| p.user_track == t))
        .collect())
}

pub fn show(store: &Store, project_id: &str) -> Result<Project, GuildError> {
    let ledger = LedgerBroker::new(store).read()?;
    ledger
        .find_project(project_id)
        .cloned()
        .ok_or_else(|| GuildError::NotFound(format!("project '{}'", project_id)))
}

/// Copy an artifact under the acting user with lineage fields set. The
/// source must still exist, and nobody remixes their own work.
pub fn remix(
    store: &Store,
    actor: &User,
    project_id: &str,
    reason: &str,
) -> Result<Project, GuildError> {
    if reason.trim().is_empty() {
        return Err(GuildError::ValidationError("remix reason is required".to_string()));
    }
    let broker = LedgerBroker::new(store);
    let actor = actor.clone();
    let actor_id = actor.id.clone();
    let reason = reason.trim().to_string();
    broker.with_ledger(&actor_id, "proof.remix", move |ledger| {
        let original = ledger
            .find_project(project_id)
            .ok_or_else(|| GuildError::NotFound(format!("project '{}'", project_id)))?;
        if original.user_id == actor.id {
            return Err(GuildError::ValidationError(
                "cannot remix your own artifact".to_string(),
            ));
        }
        let remix = original.remixed_by(time::new_entity_id(), &actor, reason, time::now_epoch_ms());
        ledger.insert_project(remix.clone());
        Ok(remix)
    })
}

pub fn comment(
    store: &Store,
    author: &User,
    project_id: &str,
    text: &str,
) -> Result<Comment, GuildError> {
    if text.trim().is_empty() {
        return Err(GuildError::ValidationError("comment text is required".to_string()));
    }
    let comment = Comment {
        id: time::new_entity_id(),
        user_id: author.id.clone(),
        user_name: author.name.clone(),
        text: text.to_string(),
        timestamp: time::now_epoch_ms(),
    };
    let broker = LedgerBroker::new(store);
    let appended = comment.clone();
    broker.with_ledger(&author.id, "proof.comment", move |ledger| {
        ledger.append_comment(project_id, appended)
    })?;
    Ok(comment)
}

/// Tag a member for peer review; the request starts pending.
pub fn request_review(
    store: &Store,
    actor: &User,
    project_id: &str,
    reviewer_id: &str,
) -> Result<PeerReviewRequest, GuildError> {
    let broker = LedgerBroker::new(store);
    let reviewer_id = reviewer_id.to_string();
    broker.with_ledger(&actor.id, "proof.review", move |ledger| {
        let reviewer = ledger
            .find_user(&reviewer_id)
            .ok_or_else(|| GuildError::NotFound(format!("user '{}'", reviewer_id)))?;
        let request = PeerReviewRequest {
            id: time::new_entity_id(),
            reviewer_id: reviewer.id.clone(),
            reviewer_name: reviewer.name.clone(),
            status: ReviewStatus::Pending,
        };
        ledger.push_review_request(project_id, request.clone())?;
        Ok(request)
    })
}

fn print_feed_row(project: &Project) {
    use colored::Colorize;
    let remix_tag = if project.original_project_id.is_some() {
        " [remix]".bright_magenta().to_string()
    } else {
        String::new()
    };
    println!(
        "{}  {:<32} {:<10} {}{}  ({} critiques)",
        project.id,
        output::compact_line(&project.title, 32),
        format!("[{}]", project.user_track),
        project.user_name.bold(),
        remix_tag,
        project.comments.len()
    );
}

pub fn run_proof_cli(store: &Store, cli: ProofCli) -> Result<(), GuildError> {
    store::require_initialized(store)?;
    let broker = LedgerBroker::new(store);

    match cli.command {
        ProofCommand::Transmit {
            title,
            problem,
            outcome,
            links,
            image_url,
            hard_part,
            redo,
            goal,
            approach,
            wrong,
            effect,
            lessons,
            redone,
            spotlight,
        } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let project = transmit(
                store,
                &actor,
                TransmitInput {
                    title,
                    problem,
                    outcome_description: outcome,
                    links,
                    image_url,
                    hard_part,
                    what_id_redo: redo,
                    what_failed: FailureReport {
                        goal,
                        approach,
                        wrong,
                        effect,
                        lessons,
                        redone,
                    },
                    is_spotlight: spotlight,
                },
            )?;
            println!("Artifact transmitted (ID: {})", project.id);
        }
        ProofCommand::Feed { track } => {
            let projects = feed(store, track)?;
            match cli.format {
                OutputFormat::Text => {
                    for project in &projects {
                        print_feed_row(project);
                    }
                }
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "proof.feed",
                        "success",
                        serde_json::json!({ "projects": projects }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
        ProofCommand::Show { id } => {
            let project = show(store, &id)?;
            match cli.format {
                OutputFormat::Text => {
                    use colored::Colorize;
                    println!("{}", project.title.bold());
                    println!("  by {} [{}]", project.user_name, project.user_track);
                    if let Some(reason) = &project.remix_reason {
                        println!("  pivot: {}", reason.bright_magenta());
                    }
                    if !project.problem.is_empty() {
                        println!("  problem: {}", project.problem);
                    }
                    if !project.what_failed.wrong.is_empty() {
                        println!("  failure: {}", project.what_failed.wrong);
                    }
                    if !project.what_failed.lessons.is_empty() {
                        println!("  lessons: {}", project.what_failed.lessons);
                    }
                    for link in &project.links {
                        println!("  link: {}", link);
                    }
                    for request in &project.peer_review_requests {
                        println!("  review: {} ({:?})", request.reviewer_name, request.status);
                    }
                    for comment in &project.comments {
                        println!(
                            "  [{}] {}",
                            comment.user_name,
                            output::compact_line(&comment.text, 60)
                        );
                    }
                }
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "proof.show",
                        "success",
                        serde_json::json!({ "project": project }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
        ProofCommand::Remix { id, reason } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let project = remix(store, &actor, &id, &reason)?;
            println!("Remix deployed (ID: {})", project.id);
        }
        ProofCommand::Comment { id, text } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            comment(store, &actor, &id, &text)?;
            println!("Critique recorded on '{}'", id);
        }
        ProofCommand::Review { id, reviewer } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let request = request_review(store, &actor, &id, &reviewer)?;
            println!("Review requested from '{}'", request.reviewer_name);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "proof",
        "version": "0.1.0",
        "description": "Proof artifacts, critiques, remixes, peer review",
        "commands": [
            { "name": "transmit", "parameters": ["title", "problem", "link", "wrong", "lessons"] },
            { "name": "feed", "parameters": ["track"] },
            { "name": "show", "parameters": ["id"] },
            { "name": "remix", "parameters": ["id", "reason"] },
            { "name": "comment", "parameters": ["id", "text"] },
            { "name": "review", "parameters": ["id", "reviewer"] }
        ],
        "storage": ["ledger.json"]
    })
}
