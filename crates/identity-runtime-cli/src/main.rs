// crates/identity-runtime-cli/src/main.rs
// ============================================================================
// Module: Identity CLI Entry Point
// Description: Command dispatcher for the identity runtime governance engine.
// Purpose: Expose init, validate, compile, update, install, and gate flows.
// Dependencies: clap, identity-runtime-{core,contract,validate,engine}
// ============================================================================

//! ## Overview
//! The `identity` CLI routes every governance workflow: pack scaffolding,
//! validator execution, brief compilation, catalog activation, the upgrade
//! executor, the installer, status/listing, the CI enforcement gate, and the
//! metrics exporter. Exit codes: `0` ok, `1` precondition or usage failure,
//! `2` validator quorum failed, `3` safe-auto path policy violation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use identity_runtime_cli::t;
use identity_runtime_core::Catalog;
use identity_runtime_core::IdentityId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::TargetSelector;
use identity_runtime_core::Timestamp;
use identity_runtime_core::pack;
use identity_runtime_engine::CiGateOptions;
use identity_runtime_engine::CompileOutcome;
use identity_runtime_engine::InstallOptions;
use identity_runtime_engine::ScaffoldOptions;
use identity_runtime_engine::ScaffoldProfile;
use identity_runtime_engine::UpgradeMode;
use identity_runtime_engine::UpgradeOptions;
use identity_runtime_engine::cigate;
use identity_runtime_engine::compile::compile_brief;
use identity_runtime_engine::exporter::export_metrics;
use identity_runtime_engine::install;
use identity_runtime_engine::scaffold::scaffold_pack;
use identity_runtime_engine::upgrade::ExecutionEnv;
use identity_runtime_engine::upgrade::execute_upgrade;
use identity_runtime_validate::ValidatorContext;
use identity_runtime_validate::run_one;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "identity", disable_help_subcommand = true, arg_required_else_help = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an identity pack scaffold.
    Init(InitCommand),
    /// Run a validator set (or one validator) against an identity.
    Validate(ValidateCommand),
    /// Compile the identity runtime brief.
    Compile(CompileCommand),
    /// Set an identity's catalog status to active.
    Activate(ActivateCommand),
    /// Run the upgrade executor for an identity.
    Update(UpdateCommand),
    /// Installer operations over identity packs.
    Install {
        /// Selected installer operation.
        #[command(subcommand)]
        command: InstallCommand,
    },
    /// Show identity status with contract validator health.
    Status(StatusCommand),
    /// List identities from the catalog with basic health signals.
    List(ListCommand),
    /// Enforce diff-scoped execution evidence over a git range.
    CiGate(CiGateCommand),
    /// Export route quality metrics from handoff logs.
    ExportMetrics(ExportMetricsCommand),
}

/// Scaffold profile argument.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum ProfileArg {
    /// Full contract set with sample evidence.
    FullContract,
    /// Fixed skeleton and baseline gates only.
    Minimal,
}

/// Upgrade mode argument.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum ModeArg {
    /// Plan only; apply by human PR review.
    ReviewRequired,
    /// Apply within the allowlisted patch surface.
    SafeAuto,
}

/// Arguments for `init`.
#[derive(Args, Debug)]
struct InitCommand {
    /// New identity id.
    #[arg(long)]
    id: String,
    /// Display title.
    #[arg(long)]
    title: String,
    /// Short description.
    #[arg(long)]
    description: String,
    /// Scaffold profile.
    #[arg(long, value_enum, default_value_t = ProfileArg::FullContract)]
    profile: ProfileArg,
    /// Register the identity in the catalog.
    #[arg(long)]
    register: bool,
    /// Activate the identity on registration.
    #[arg(long)]
    activate: bool,
    /// Make the identity the catalog default.
    #[arg(long)]
    set_default: bool,
    /// Catalog document override.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
    /// Pack root override.
    #[arg(long, value_name = "DIR")]
    pack_root: Option<PathBuf>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Validate only this identity id.
    #[arg(long, value_name = "ID")]
    identity_id: Option<String>,
    /// Validate every identity in the catalog.
    #[arg(long)]
    all: bool,
    /// Validator set label.
    #[arg(long, value_name = "LABEL", default_value = "v1_2_required")]
    set: String,
    /// Run a single validator by name instead of a set.
    #[arg(long, value_name = "NAME")]
    only: Option<String>,
    /// Exercise validator self-test corpora where supported.
    #[arg(long)]
    self_test: bool,
    /// Git range base for range-scoped validators.
    #[arg(long, value_name = "SHA")]
    base: Option<String>,
    /// Git range head for range-scoped validators.
    #[arg(long, value_name = "SHA")]
    head: Option<String>,
}

/// Arguments for `compile`.
#[derive(Args, Debug)]
struct CompileCommand {
    /// Fail when the compiled brief would change.
    #[arg(long)]
    check: bool,
}

/// Arguments for `activate`.
#[derive(Args, Debug)]
struct ActivateCommand {
    /// Identity to activate.
    #[arg(long, value_name = "ID")]
    identity_id: String,
    /// Catalog document override.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
}

/// Arguments for `update`.
#[derive(Args, Debug)]
struct UpdateCommand {
    /// Identity to update.
    #[arg(long, value_name = "ID")]
    identity_id: String,
    /// Executor mode.
    #[arg(long, value_enum, default_value_t = ModeArg::ReviewRequired)]
    mode: ModeArg,
    /// Metrics artifact override.
    #[arg(long, value_name = "PATH")]
    metrics_path: Option<PathBuf>,
    /// Report output directory override.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

/// Installer operations.
#[derive(Subcommand, Debug)]
enum InstallCommand {
    /// Classify and report without mutation.
    Plan(InstallArgs),
    /// Full install pass without mutation.
    DryRun(InstallArgs),
    /// Mutating install per classification.
    Install(InstallArgs),
    /// Re-check the latest install report.
    Verify(InstallArgs),
    /// Restore a pack tree from a named backup.
    Rollback(RollbackArgs),
}

/// Shared installer arguments.
#[derive(Args, Debug)]
struct InstallArgs {
    /// Target identity.
    #[arg(long, value_name = "ID")]
    identity_id: String,
    /// Source pack override.
    #[arg(long, value_name = "PATH")]
    source_pack: Option<PathBuf>,
    /// Target root override.
    #[arg(long, value_name = "DIR")]
    target_root: Option<PathBuf>,
    /// Pack root for default source resolution.
    #[arg(long, value_name = "DIR")]
    pack_root: Option<PathBuf>,
    /// Catalog document override.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
    /// Permit destructive replace with backup.
    #[arg(long)]
    destructive_replace: bool,
    /// Register the identity in the catalog after install.
    #[arg(long)]
    register: bool,
    /// Activate the identity on registration.
    #[arg(long)]
    activate: bool,
    /// Title for catalog registration.
    #[arg(long, default_value = "")]
    title: String,
    /// Description for catalog registration.
    #[arg(long, default_value = "")]
    description: String,
}

/// Rollback arguments.
#[derive(Args, Debug)]
struct RollbackArgs {
    /// Shared installer arguments.
    #[command(flatten)]
    base: InstallArgs,
    /// Rollback reference (`restore_from:<path>`).
    #[arg(long, value_name = "REF")]
    rollback_ref: String,
}

/// Arguments for `status`.
#[derive(Args, Debug)]
struct StatusCommand {
    /// Identity to inspect; defaults to the catalog default.
    #[arg(long, value_name = "ID", default_value = "")]
    identity_id: String,
    /// Emit a structured JSON document.
    #[arg(long)]
    json: bool,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Emit a structured JSON document.
    #[arg(long)]
    json: bool,
}

/// Arguments for `ci-gate`.
#[derive(Args, Debug)]
struct CiGateCommand {
    /// Target identity.
    #[arg(long, value_name = "ID")]
    identity_id: String,
    /// Git range base; env range variables apply when absent.
    #[arg(long, value_name = "SHA")]
    base: Option<String>,
    /// Git range head; env range variables apply when absent.
    #[arg(long, value_name = "SHA")]
    head: Option<String>,
    /// Require execution context to bind to the CI environment.
    #[arg(long)]
    require_ci_binding: bool,
}

/// Arguments for `export-metrics`.
#[derive(Args, Debug)]
struct ExportMetricsCommand {
    /// Target identity.
    #[arg(long, value_name = "ID")]
    identity_id: String,
    /// Output path override.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a rendered message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let root = std::env::current_dir()
        .map_err(|err| CliError::new(format!("cannot resolve working directory: {err}")))?;
    let layout = RuntimeLayout::new(root);

    match cli.command {
        Commands::Init(command) => command_init(&layout, command),
        Commands::Validate(command) => command_validate(&layout, &command),
        Commands::Compile(command) => command_compile(&layout, &command),
        Commands::Activate(command) => command_activate(&layout, &command),
        Commands::Update(command) => command_update(&layout, command),
        Commands::Install {
            command,
        } => command_install(&layout, command),
        Commands::Status(command) => command_status(&layout, &command),
        Commands::List(command) => command_list(&layout, &command),
        Commands::CiGate(command) => command_ci_gate(&layout, command),
        Commands::ExportMetrics(command) => command_export_metrics(&layout, command),
    }
}

// ============================================================================
// SECTION: Init Command
// ============================================================================

/// Executes the `init` command.
fn command_init(layout: &RuntimeLayout, command: InitCommand) -> CliResult<ExitCode> {
    let options = ScaffoldOptions {
        id: IdentityId::from(command.id),
        title: command.title,
        description: command.description,
        profile: match command.profile {
            ProfileArg::FullContract => ScaffoldProfile::FullContract,
            ProfileArg::Minimal => ScaffoldProfile::Minimal,
        },
        register: command.register,
        activate: command.activate,
        set_default: command.set_default,
        pack_root: command.pack_root,
        catalog: command.catalog.clone(),
        now: Timestamp::now_utc(),
    };

    match scaffold_pack(layout, &options) {
        Ok(pack_dir) => {
            stdout_line(&t!("init.ok", path = pack_dir.display()))?;
            if options.register {
                let catalog_path =
                    command.catalog.unwrap_or_else(|| layout.catalog_path());
                stdout_line(&t!("init.registered", path = catalog_path.display()))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            stdout_line(&t!("init.failed", error = err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command.
fn command_validate(layout: &RuntimeLayout, command: &ValidateCommand) -> CliResult<ExitCode> {
    let catalog = Catalog::load(&layout.catalog_path())
        .map_err(|err| CliError::new(t!("validate.failed", error = err)))?;
    let selector = match (&command.identity_id, command.all) {
        (Some(id), _) => TargetSelector::One(IdentityId::from(id.as_str())),
        (None, true) => TargetSelector::All,
        (None, false) => TargetSelector::ActiveOrDefault,
    };
    let targets = catalog
        .select_targets(&selector)
        .map_err(|err| CliError::new(t!("validate.failed", error = err)))?;

    let names: Vec<&str> = match &command.only {
        Some(name) => vec![name.as_str()],
        None => identity_runtime_validate::set_by_label(&command.set)
            .ok_or_else(|| {
                CliError::new(t!("validate.failed", error = format!("unknown set label: {}", command.set)))
            })?
            .to_vec(),
    };

    let mut all_ok = true;
    for target in targets {
        let identity_id = target.id.clone();
        let mut ctx = ValidatorContext::new(layout.clone(), identity_id.clone(), Timestamp::now_utc());
        ctx.self_test = command.self_test;
        ctx.git_base = command.base.clone();
        ctx.git_head = command.head.clone();

        stdout_line(&t!("validate.header", label = command.set, id = identity_id))?;
        let mut identity_ok = true;
        for name in &names {
            let verdict = run_one(&ctx, name)
                .map_err(|err| CliError::new(t!("validate.failed", error = err)))?;
            for line in &verdict.lines {
                stdout_line(line)?;
            }
            let status = if verdict.ok {
                t!("validate.status.ok")
            } else {
                t!("validate.status.fail")
            };
            stdout_line(&t!("validate.check", status = status, name = name))?;
            identity_ok &= verdict.ok;
        }
        if identity_ok {
            stdout_line(&t!("validate.summary.pass", id = identity_id))?;
        } else {
            stdout_line(&t!("validate.summary.fail", id = identity_id))?;
        }
        all_ok &= identity_ok;
    }

    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

// ============================================================================
// SECTION: Compile and Activate Commands
// ============================================================================

/// Executes the `compile` command.
fn command_compile(layout: &RuntimeLayout, command: &CompileCommand) -> CliResult<ExitCode> {
    match compile_brief(layout, command.check) {
        Ok(CompileOutcome::Written(path)) => {
            if command.check {
                stdout_line(&t!("compile.check.ok"))?;
            } else {
                stdout_line(&t!("compile.ok", path = path.display()))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(CompileOutcome::Stale(path)) => {
            stdout_line(&t!("compile.check.stale", path = path.display()))?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => {
            stdout_line(&t!("compile.failed", error = err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `activate` command.
fn command_activate(layout: &RuntimeLayout, command: &ActivateCommand) -> CliResult<ExitCode> {
    let catalog_path =
        command.catalog.clone().unwrap_or_else(|| layout.catalog_path());
    let result = Catalog::load(&catalog_path).and_then(|mut catalog| {
        let id = IdentityId::from(command.identity_id.as_str());
        catalog.activate(&id)?;
        catalog.save(&catalog_path)
    });
    match result {
        Ok(()) => {
            stdout_line(&t!("activate.ok", id = command.identity_id))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            stdout_line(&t!("activate.failed", error = err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

// ============================================================================
// SECTION: Update Command
// ============================================================================

/// Executes the `update` command.
fn command_update(layout: &RuntimeLayout, command: UpdateCommand) -> CliResult<ExitCode> {
    let options = UpgradeOptions {
        identity_id: IdentityId::from(command.identity_id),
        mode: match command.mode {
            ModeArg::ReviewRequired => UpgradeMode::ReviewRequired,
            ModeArg::SafeAuto => UpgradeMode::SafeAuto,
        },
        metrics_path: command.metrics_path,
        out_dir: command.out_dir,
        now: Timestamp::now_utc(),
        env: ExecutionEnv::from_env(),
    };

    let outcome = match execute_upgrade(layout, &options) {
        Ok(outcome) => outcome,
        Err(err) => {
            stdout_line(&t!("update.failed", error = err))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    stdout_line(&t!("update.report", path = outcome.report_path.display()))?;
    stdout_line(&t!("update.upgrade_required", value = outcome.report.upgrade_required))?;
    stdout_line(&t!("update.all_ok", value = outcome.report.all_ok))?;
    let next = match (outcome.exit_code, options.mode, outcome.report.upgrade_required) {
        (3, _, _) => t!("update.next.blocked"),
        (_, UpgradeMode::ReviewRequired, true) => t!("update.next.review"),
        (_, UpgradeMode::SafeAuto, true) => t!("update.next.applied"),
        _ => t!("update.next.none"),
    };
    stdout_line(&next)?;

    Ok(ExitCode::from(outcome.exit_code))
}

// ============================================================================
// SECTION: Install Command
// ============================================================================

/// Executes installer subcommands.
fn command_install(layout: &RuntimeLayout, command: InstallCommand) -> CliResult<ExitCode> {
    let (operation, args, rollback_ref) = match command {
        InstallCommand::Plan(args) => ("plan", args, None),
        InstallCommand::DryRun(args) => ("dry-run", args, None),
        InstallCommand::Install(args) => ("install", args, None),
        InstallCommand::Verify(args) => ("verify", args, None),
        InstallCommand::Rollback(args) => ("rollback", args.base, Some(args.rollback_ref)),
    };
    let options = InstallOptions {
        identity_id: IdentityId::from(args.identity_id),
        source_pack: args.source_pack,
        target_root: args.target_root,
        pack_root: args.pack_root,
        register: args.register,
        activate: args.activate,
        destructive_replace: args.destructive_replace,
        title: args.title,
        description: args.description,
        rollback_ref,
        catalog: args.catalog,
        now: Timestamp::now_utc(),
    };

    let result = match operation {
        "plan" => install::plan(layout, &options),
        "dry-run" => install::install(layout, &options, true),
        "install" => install::install(layout, &options, false),
        "verify" => install::verify(layout, &options),
        _ => {
            return match install::rollback(layout, &options) {
                Ok(destination) => {
                    stdout_line(&t!("install.rollback.ok", path = destination.display()))?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    stdout_line(&t!("install.failed", error = err))?;
                    Ok(ExitCode::FAILURE)
                }
            };
        }
    };

    match result {
        Ok(outcome) => {
            stdout_line(&t!("install.report", path = outcome.report_path.display()))?;
            if let Some(mirror) = &outcome.mirror_path {
                stdout_line(&t!("install.mirror", path = mirror.display()))?;
            }
            let conflict = serde_json::to_value(outcome.report.conflict_type)
                .ok()
                .and_then(|value| value.as_str().map(ToString::to_string))
                .unwrap_or_default();
            let action = serde_json::to_value(outcome.report.action)
                .ok()
                .and_then(|value| value.as_str().map(ToString::to_string))
                .unwrap_or_default();
            stdout_line(&t!("install.conflict", value = conflict))?;
            stdout_line(&t!("install.action", value = action))?;
            if outcome.report.action == install::InstallAction::AbortAndExplain {
                stdout_line(&t!("install.abort"))?;
            }
            if operation == "verify" {
                stdout_line(&t!("install.verify.ok", id = outcome.report.verified_report_id))?;
                stdout_line(&t!("install.verify.report", path = outcome.report_path.display()))?;
            }
            Ok(ExitCode::from(outcome.exit_code))
        }
        Err(err) => {
            stdout_line(&t!("install.failed", error = err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

// ============================================================================
// SECTION: Status Command
// ============================================================================

/// Validators consulted by the status command.
const STATUS_CHECKS: [&str; 3] = ["runtime-contract", "upgrade-prereq", "update-lifecycle"];

/// Executes the `status` command.
fn command_status(layout: &RuntimeLayout, command: &StatusCommand) -> CliResult<ExitCode> {
    let catalog = Catalog::load(&layout.catalog_path())
        .map_err(|err| CliError::new(t!("status.failed", error = err)))?;
    let identity_id = if command.identity_id.trim().is_empty() {
        catalog.default_identity.clone()
    } else {
        IdentityId::from(command.identity_id.as_str())
    };
    let Some(entry) = catalog.entry(&identity_id) else {
        stdout_line(&t!(
            "status.failed",
            error = format!("identity id not found in catalog: {identity_id}")
        ))?;
        return Ok(ExitCode::FAILURE);
    };
    let pack_dir = layout.root().join(&entry.pack_path);
    let files = pack::required_files_present(&pack_dir);

    let ctx = ValidatorContext::new(layout.clone(), identity_id.clone(), Timestamp::now_utc());
    let mut checks = Vec::new();
    for name in STATUS_CHECKS {
        let verdict =
            run_one(&ctx, name).map_err(|err| CliError::new(t!("status.failed", error = err)))?;
        checks.push(verdict);
    }
    let all_ok = checks.iter().all(|verdict| verdict.ok);

    if command.json {
        let document = json!({
            "identity_id": identity_id,
            "default_identity": catalog.default_identity,
            "pack_path": entry.pack_path,
            "pack_files": files
                .iter()
                .map(|(name, exists)| json!({
                    "file": name,
                    "exists": exists,
                    "path": pack_dir.join(name).display().to_string(),
                }))
                .collect::<Vec<_>>(),
            "checks": checks
                .iter()
                .map(|verdict| json!({
                    "name": verdict.name,
                    "ok": verdict.ok,
                    "exit_code": verdict.exit_code(),
                }))
                .collect::<Vec<_>>(),
            "all_checks_pass": all_ok,
        });
        stdout_line(&render_json(&document)?)?;
    } else {
        stdout_line(&t!("status.line", id = identity_id, path = pack_dir.display()))?;
        for (name, exists) in &files {
            stdout_line(&t!("status.file", name = name, exists = exists))?;
        }
        for verdict in &checks {
            stdout_line(&t!(
                "status.check",
                ok = verdict.ok,
                code = verdict.exit_code(),
                command = format!("identity validate --only {} --identity-id {identity_id}", verdict.name)
            ))?;
        }
        stdout_line(&t!("status.summary", value = all_ok))?;
    }

    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list(layout: &RuntimeLayout, command: &ListCommand) -> CliResult<ExitCode> {
    let catalog = Catalog::load(&layout.catalog_path())
        .map_err(|err| CliError::new(t!("list.failed", error = err)))?;
    let default_id = catalog.default_identity.clone();

    if command.json {
        let rows: Vec<_> = catalog
            .identities
            .iter()
            .map(|entry| {
                json!({
                    "id": entry.id,
                    "title": entry.title,
                    "status": entry.status,
                    "default": entry.id == default_id,
                    "pack_path": entry.pack_path,
                    "pack_exists": layout.root().join(&entry.pack_path).exists(),
                    "activation_priority": entry.activation_priority(),
                })
            })
            .collect();
        let document = json!({"default_identity": default_id, "identities": rows});
        stdout_line(&render_json(&document)?)?;
        return Ok(ExitCode::SUCCESS);
    }

    stdout_line(&t!("list.default", id = default_id))?;
    for (index, entry) in catalog.identities.iter().enumerate() {
        let star = if entry.id == default_id { "*" } else { " " };
        let priority = entry
            .activation_priority()
            .map_or_else(|| "None".to_string(), |value| value.to_string());
        stdout_line(&t!(
            "list.row",
            index = index + 1,
            star = star,
            id = entry.id,
            status = entry.status,
            exists = layout.root().join(&entry.pack_path).exists(),
            priority = priority,
            path = entry.pack_path
        ))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: CI Gate Command
// ============================================================================

/// Executes the `ci-gate` command.
fn command_ci_gate(layout: &RuntimeLayout, command: CiGateCommand) -> CliResult<ExitCode> {
    let options = CiGateOptions {
        identity_id: IdentityId::from(command.identity_id),
        base: command.base.or_else(env_base),
        head: command.head.or_else(env_head),
        require_ci_binding: command.require_ci_binding,
        expected_run_id: std::env::var("GITHUB_RUN_ID").ok(),
        expected_sha: std::env::var("GITHUB_SHA").ok(),
        now: Timestamp::now_utc(),
    };

    match cigate::enforce(layout, &options) {
        Ok(outcome) => {
            for line in &outcome.lines {
                stdout_line(line)?;
            }
            if outcome.pass {
                stdout_line(&t!("cigate.pass"))?;
                Ok(ExitCode::SUCCESS)
            } else {
                stdout_line(&t!("cigate.fail"))?;
                Ok(ExitCode::FAILURE)
            }
        }
        Err(err) => {
            stdout_line(&t!("cigate.failed", error = err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Resolves the git range base from CI environment variables.
fn env_base() -> Option<String> {
    ["PR_BASE_SHA", "GITHUB_BASE_SHA", "PUSH_BEFORE_SHA", "GITHUB_EVENT_BEFORE"]
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|value| !value.trim().is_empty()))
}

/// Resolves the git range head from CI environment variables.
fn env_head() -> Option<String> {
    ["PR_HEAD_SHA", "GITHUB_SHA"]
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|value| !value.trim().is_empty()))
}

// ============================================================================
// SECTION: Export Metrics Command
// ============================================================================

/// Executes the `export-metrics` command.
fn command_export_metrics(
    layout: &RuntimeLayout,
    command: ExportMetricsCommand,
) -> CliResult<ExitCode> {
    match export_metrics(layout, &IdentityId::from(command.identity_id), command.out) {
        Ok((metrics, out_path)) => {
            stdout_line(&t!("metrics.ok", path = out_path.display()))?;
            stdout_line(&render_json(&serde_json::to_value(metrics).unwrap_or_default())?)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            stdout_line(&t!("metrics.failed", error = err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Renders a JSON document pretty-printed.
fn render_json(value: &serde_json::Value) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))
}

/// Writes a single line to stdout.
fn stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
