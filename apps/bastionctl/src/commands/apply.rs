//! Apply a manifest to the appliance

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use dialoguer::Confirm;
use serde::Serialize;

use bastion_client::{ApiConfig, BastionClient};
use bastion_core::adapter::ResourceAdapter;
use bastion_core::engine::{reconcile, DesiredState, Mode, Outcome, OutcomeStatus};
use bastion_resources::{
    AuthorizationAdapter, DeviceAccountAdapter, DeviceAdapter, TargetGroupAdapter, UserAdapter,
    UserGroupAdapter,
};

use crate::error::{CliError, CliResult};
use crate::manifest::{load_manifest, validate_manifest, Manifest};

/// Apply a manifest to the appliance
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to the manifest file
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,

    /// Preview changes without applying
    #[arg(long, alias = "dry-run")]
    pub check: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Appliance base URL
    #[arg(long, env = "BASTION_API_URL")]
    pub url: String,

    /// API username
    #[arg(long, env = "BASTION_API_USER")]
    pub api_user: String,

    /// API password
    #[arg(long, env = "BASTION_API_PASSWORD", hide_env_values = true)]
    pub api_password: String,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,
}

/// One line of the apply report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub resource_type: String,
    pub name: String,
    pub status: Option<OutcomeStatus>,
    pub changed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportLine {
    fn from_outcome(outcome: Outcome) -> Self {
        Self {
            resource_type: outcome.resource_type,
            name: outcome.name,
            status: Some(outcome.status),
            changed: outcome.changed,
            message: outcome.message,
            error: None,
        }
    }

    fn failed(resource_type: &str, name: String, error: &CliError) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            name,
            status: None,
            changed: false,
            message: "failed".to_string(),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    created: usize,
    updated: usize,
    deleted: usize,
    unchanged: usize,
    failed: usize,
}

impl Summary {
    fn of(lines: &[ReportLine]) -> Self {
        let count = |status| {
            lines
                .iter()
                .filter(|l| l.status == Some(status))
                .count()
        };
        Self {
            created: count(OutcomeStatus::Created),
            updated: count(OutcomeStatus::Updated),
            deleted: count(OutcomeStatus::Deleted),
            unchanged: count(OutcomeStatus::Unchanged),
            failed: lines.iter().filter(|l| l.error.is_some()).count(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApplyReport {
    dry_run: bool,
    results: Vec<ReportLine>,
    summary: Summary,
}

impl ApplyReport {
    fn new(dry_run: bool, results: Vec<ReportLine>) -> Self {
        let summary = Summary::of(&results);
        Self {
            dry_run,
            results,
            summary,
        }
    }
}

/// Execute the apply command
pub async fn execute(args: ApplyArgs) -> CliResult<()> {
    let manifest = load_manifest(&args.file)?;
    validate_manifest(&manifest)?;

    let mut config = ApiConfig::new(&args.url, &args.api_user, &args.api_password);
    if args.insecure {
        config = config.with_insecure_tls();
    }
    let client = Arc::new(BastionClient::new(config)?);

    // Plan pass: full decision against fresh state, no mutations.
    let plan = reconcile_manifest(&client, &manifest, Mode::DryRun, false).await?;

    if plan.iter().all(|l| !l.changed) {
        if args.json {
            let report = ApplyReport::new(args.check, plan);
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("No changes required. Appliance is up to date.");
        }
        return Ok(());
    }

    if !args.json {
        print_plan(&plan, args.check);
    }

    if args.check {
        if args.json {
            let report = ApplyReport::new(true, plan);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        return Ok(());
    }

    if !args.yes {
        if !atty::is(atty::Stream::Stdin) {
            return Err(CliError::Validation(
                "Cannot confirm in non-interactive mode. Use --yes to skip confirmation."
                    .to_string(),
            ));
        }

        let pending = plan.iter().filter(|l| l.changed).count();
        let confirm = Confirm::new()
            .with_prompt(format!("Apply {pending} change(s)?"))
            .default(false)
            .interact()
            .map_err(|e| CliError::Io(e.to_string()))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    // Apply pass: fresh fetches again, so a resource changed between
    // plan and apply is reconciled against what is actually there.
    let results = reconcile_manifest(&client, &manifest, Mode::Apply, true).await?;
    let report = ApplyReport::new(false, results);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_results(&report);
    }

    if report.summary.failed > 0 {
        return Err(CliError::Validation(format!(
            "{} change(s) failed",
            report.summary.failed
        )));
    }

    Ok(())
}

/// Reconcile every resource in the manifest, in declaration order:
/// groups and devices before the accounts and authorizations that
/// reference them.
///
/// With `continue_on_error` each failure is recorded in its report line
/// and the run goes on; otherwise the first failure aborts.
async fn reconcile_manifest(
    client: &Arc<BastionClient>,
    manifest: &Manifest,
    mode: Mode,
    continue_on_error: bool,
) -> CliResult<Vec<ReportLine>> {
    let mut lines = Vec::with_capacity(manifest.len());

    let users = UserAdapter::new(client.clone());
    for entry in &manifest.users {
        run_one(&users, &entry.name, &entry.desired(), mode, continue_on_error, &mut lines)
            .await?;
    }

    let user_groups = UserGroupAdapter::new(client.clone());
    for entry in &manifest.user_groups {
        run_one(
            &user_groups,
            &entry.name,
            &entry.desired(),
            mode,
            continue_on_error,
            &mut lines,
        )
        .await?;
    }

    let devices = DeviceAdapter::new(client.clone());
    for entry in &manifest.devices {
        run_one(&devices, &entry.name, &entry.desired(), mode, continue_on_error, &mut lines)
            .await?;
    }

    let accounts = DeviceAccountAdapter::new(client.clone());
    for entry in &manifest.device_accounts {
        run_one(
            &accounts,
            &entry.key(),
            &entry.desired(),
            mode,
            continue_on_error,
            &mut lines,
        )
        .await?;
    }

    let target_groups = TargetGroupAdapter::new(client.clone());
    for entry in &manifest.target_groups {
        run_one(
            &target_groups,
            &entry.name,
            &entry.desired(),
            mode,
            continue_on_error,
            &mut lines,
        )
        .await?;
    }

    let authorizations = AuthorizationAdapter::new(client.clone());
    for entry in &manifest.authorizations {
        run_one(
            &authorizations,
            &entry.name,
            &entry.desired(),
            mode,
            continue_on_error,
            &mut lines,
        )
        .await?;
    }

    Ok(lines)
}

async fn run_one<A: ResourceAdapter>(
    adapter: &A,
    key: &A::Key,
    desired: &DesiredState,
    mode: Mode,
    continue_on_error: bool,
    lines: &mut Vec<ReportLine>,
) -> CliResult<()> {
    match reconcile(adapter, key, desired, mode).await {
        Ok(outcome) => lines.push(ReportLine::from_outcome(outcome)),
        Err(e) => {
            let error = CliError::from(e);
            if !continue_on_error {
                return Err(error);
            }
            lines.push(ReportLine::failed(
                adapter.resource_type(),
                key.to_string(),
                &error,
            ));
        }
    }
    Ok(())
}

fn status_symbol(status: OutcomeStatus) -> (&'static str, &'static str, &'static str) {
    match status {
        OutcomeStatus::Created => ("+", "\x1b[32m", "Create"),
        OutcomeStatus::Updated => ("~", "\x1b[33m", "Update"),
        OutcomeStatus::Deleted => ("-", "\x1b[31m", "Delete"),
        OutcomeStatus::Unchanged => (" ", "", "Keep"),
    }
}

/// Print planned changes in human-readable format
fn print_plan(lines: &[ReportLine], check: bool) {
    if check {
        println!("Check mode - no changes will be made.");
        println!();
        println!("Would apply:");
    } else {
        println!("Planning changes:");
    }

    for line in lines {
        if !line.changed {
            continue;
        }

        let Some(status) = line.status else { continue };
        let (symbol, color, verb) = status_symbol(status);
        let reset = "\x1b[0m";

        println!(
            "  {color}{symbol}{reset} {verb} {} {} ({})",
            line.resource_type, line.name, line.message
        );
    }

    let summary = Summary::of(lines);
    println!();
    println!(
        "Summary: {} to create, {} to update, {} to delete, {} unchanged",
        summary.created, summary.updated, summary.deleted, summary.unchanged
    );
    println!();
}

/// Print results after applying changes
fn print_results(report: &ApplyReport) {
    println!("Applying changes...");

    for line in &report.results {
        if !line.changed && line.error.is_none() {
            continue;
        }

        let (symbol, color) = if line.error.is_some() {
            ("✗", "\x1b[31m")
        } else {
            ("✓", "\x1b[32m")
        };
        let reset = "\x1b[0m";

        print!(
            "  {color}{symbol}{reset} {} {}: {}",
            line.resource_type, line.name, line.message
        );

        if let Some(ref error) = line.error {
            print!(" - {error}");
        }

        println!();
    }

    println!();

    let applied = report.summary.created + report.summary.updated + report.summary.deleted;
    if report.summary.failed > 0 {
        println!(
            "Applied {} change(s) with {} failure(s).",
            applied, report.summary.failed
        );
    } else if applied > 0 {
        println!("Applied {applied} change(s) successfully.");
    }
}
