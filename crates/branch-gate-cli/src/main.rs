// crates/branch-gate-cli/src/main.rs
// ============================================================================
// Module: Branch Gate CLI Entry Point
// Description: Command dispatcher for the Branch Gate server and local checks.
// Purpose: Serve MCP and run policy checks against a repository from a shell.
// Dependencies: clap, branch-gate-config, branch-gate-mcp, branch-gate-providers, tokio
// ============================================================================

//! ## Overview
//! The `branch-gate` binary starts the MCP server and exposes the same
//! advisory operations as one-shot commands. Results are written to stdout as
//! JSON; diagnostics go to stderr. `validate` and `simulate` exit with status 2
//! when the policy denies a command, so shell hooks can branch on the result.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use branch_gate_config::BranchGateConfig;
use branch_gate_config::DEFAULT_HTTP_BIND;
use branch_gate_config::PolicyDefaults;
use branch_gate_config::PolicyStore;
use branch_gate_config::PolicyUpdate;
use branch_gate_config::ServerAuditConfig;
use branch_gate_config::ServerConfig;
use branch_gate_config::ServerTransport;
use branch_gate_core::Severity;
use branch_gate_core::SimulationStep;
use branch_gate_mcp::GitRulesService;
use branch_gate_mcp::McpServer;
use branch_gate_mcp::ToolName;
use branch_gate_mcp::tools::PROTOCOL_VERSION;
use branch_gate_mcp::tools::SERVER_NAME;
use branch_gate_mcp::tools::SERVER_VERSION;
use branch_gate_providers::GitRepositoryProvider;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a simulation sequence input.
const MAX_SEQUENCE_BYTES: usize = 1024 * 1024;
/// Exit status for a denied command or a violating sequence.
const DENIED_EXIT_CODE: u8 = 2;
/// Path argument that selects stdin.
const STDIN_PATH: &str = "-";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "branch-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config and repository selection shared by all commands.
    #[command(flatten)]
    context: ContextArgs,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Config and repository selection.
#[derive(Args, Debug, Clone, Default)]
struct ContextArgs {
    /// Config file path (defaults to branch-gate.toml or `BRANCH_GATE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Repository root (overrides `repository.path` and `GIT_RULES_REPO_PATH`).
    #[arg(long, value_name = "DIR", global = true)]
    repo: Option<PathBuf>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Branch Gate MCP server.
    Serve(ServeCommand),
    /// Evaluate one git command against the policy.
    Validate(ValidateCommand),
    /// Evaluate a sequence of git commands read from JSON.
    Simulate(SimulateCommand),
    /// Show branch state, pending changes, and the effective policy.
    Status,
    /// Suggest commands for a workflow task.
    Suggest(SuggestCommand),
    /// Compare existing branches with the configured branch model.
    Compliance,
    /// Policy document utilities.
    Policy {
        /// Selected policy subcommand.
        #[command(subcommand)]
        command: PolicyCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Check server initialization, repository detection, and config loading.
    Selftest,
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Override the configured transport.
    #[arg(long, value_enum, value_name = "TRANSPORT")]
    transport: Option<TransportArg>,
    /// Override the HTTP bind address (loopback only).
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Transport selection for `serve`.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum TransportArg {
    /// JSON-RPC over stdin and stdout.
    Stdio,
    /// JSON-RPC over HTTP `POST /rpc`.
    Http,
}

impl From<TransportArg> for ServerTransport {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Stdio => Self::Stdio,
            TransportArg::Http => Self::Http,
        }
    }
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Git command name (commit, push, merge).
    #[arg(value_name = "COMMAND")]
    git_command: String,
    /// Arguments passed to the git command.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Arguments for `simulate`.
#[derive(Args, Debug)]
struct SimulateCommand {
    /// JSON file holding the steps (`-` reads stdin).
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Evaluate every step instead of stopping at the first violation.
    #[arg(long = "continue", action = ArgAction::SetTrue)]
    keep_going: bool,
}

/// Arguments for `suggest`.
#[derive(Args, Debug)]
struct SuggestCommand {
    /// Workflow task (`start_feature`, `merge_feature`, `promote_to_main`, `hotfix`).
    #[arg(value_name = "TASK")]
    task: String,
}

/// Policy subcommands.
#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Print the effective policy.
    Get,
    /// Merge fields into the policy document.
    Set(PolicySetCommand),
}

/// Arguments for `policy set`.
#[derive(Args, Debug, Default)]
struct PolicySetCommand {
    /// Protected branch names (comma separated).
    #[arg(long = "protected", value_name = "BRANCHES", value_delimiter = ',')]
    protected_branches: Option<Vec<String>>,
    /// Feature branch prefix.
    #[arg(long, value_name = "PREFIX")]
    feature_prefix: Option<String>,
    /// Hotfix branch prefix.
    #[arg(long, value_name = "PREFIX")]
    hotfix_prefix: Option<String>,
    /// Integration branch name.
    #[arg(long, value_name = "BRANCH")]
    integration_branch: Option<String>,
    /// Primary branch name.
    #[arg(long, value_name = "BRANCH")]
    primary_branch: Option<String>,
    /// Allowed conventional commit types (comma separated).
    #[arg(long = "commit-types", value_name = "TYPES", value_delimiter = ',')]
    allowed_commit_types: Option<Vec<String>>,
    /// Allow direct pushes to protected branches.
    #[arg(long, value_name = "BOOL")]
    allow_direct_push: Option<bool>,
    /// Require a clean tree before pushing protected branches.
    #[arg(long, value_name = "BOOL")]
    require_clean_working_tree: Option<bool>,
    /// Enforce the conventional commit message format.
    #[arg(long, value_name = "BOOL")]
    enforce_commit_message_format: Option<bool>,
    /// Severity for direct commits to the integration branch.
    #[arg(long, value_enum, value_name = "SEVERITY")]
    integration_commit_severity: Option<SeverityArg>,
}

impl PolicySetCommand {
    /// Converts the flags into a partial policy update.
    fn into_update(self) -> PolicyUpdate {
        PolicyUpdate {
            protected_branches: self.protected_branches,
            feature_prefix: self.feature_prefix,
            hotfix_prefix: self.hotfix_prefix,
            integration_branch: self.integration_branch,
            allowed_commit_types: self.allowed_commit_types,
            primary_branch: self.primary_branch,
            allow_direct_push: self.allow_direct_push,
            require_clean_working_tree: self.require_clean_working_tree,
            enforce_commit_message_format: self.enforce_commit_message_format,
            integration_commit_severity: self.integration_commit_severity.map(Severity::from),
        }
    }
}

/// Severity selection for `policy set`.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum SeverityArg {
    /// Informational.
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Info => Self::Info,
            SeverityArg::Warn => Self::Warn,
            SeverityArg::Error => Self::Error,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Branch Gate configuration file.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
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
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        write_stdout_line(&format!("{SERVER_NAME} {SERVER_VERSION}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let context = cli.context;
    match command {
        Commands::Serve(command) => command_serve(&context, command).await,
        Commands::Validate(command) => command_validate(&context, &command),
        Commands::Simulate(command) => command_simulate(&context, &command),
        Commands::Status => {
            let workspace = Workspace::open(&context)?;
            write_json(&workspace.service.status())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Suggest(command) => {
            let workspace = Workspace::open(&context)?;
            write_json(&workspace.service.suggest(&command.task))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compliance => {
            let workspace = Workspace::open(&context)?;
            write_json(&workspace.service.compliance())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Policy {
            command,
        } => command_policy(&context, command),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&context),
        Commands::Selftest => command_selftest(&context),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Workspace
// ============================================================================

/// Loaded configuration and the rules service bound to one repository.
struct Workspace {
    /// Loaded configuration.
    config: BranchGateConfig,
    /// Resolved repository root.
    root: PathBuf,
    /// Rules service over the repository and its policy document.
    service: GitRulesService,
}

impl Workspace {
    /// Loads configuration and binds the service to the selected repository.
    fn open(context: &ContextArgs) -> CliResult<Self> {
        let config = BranchGateConfig::load(context.config.as_deref())
            .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
        Self::with_config(context, config)
    }

    /// Binds the service using an already loaded configuration.
    fn with_config(context: &ContextArgs, config: BranchGateConfig) -> CliResult<Self> {
        let root = context.repo.clone().unwrap_or_else(|| config.repository.root());
        let defaults = PolicyDefaults::from_env()
            .map_err(|err| CliError::new(format!("invalid policy defaults: {err}")))?;
        let store = Arc::new(PolicyStore::new(config.repository.policy_path(&root), defaults));
        let provider = Arc::new(GitRepositoryProvider::new(root.clone()));
        Ok(Self {
            config,
            root,
            service: GitRulesService::new(provider, store),
        })
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(context: &ContextArgs, command: ServeCommand) -> CliResult<ExitCode> {
    let mut config = BranchGateConfig::load(context.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if let Some(transport) = command.transport {
        config.server.transport = transport.into();
    }
    if let Some(bind) = command.bind {
        config.server.bind = Some(bind);
    }
    if config.server.transport == ServerTransport::Http && config.server.bind.is_none() {
        config.server.bind = Some(DEFAULT_HTTP_BIND.to_string());
    }
    config.validate().map_err(|err| CliError::new(format!("invalid server config: {err}")))?;

    let workspace = Workspace::with_config(context, config)?;
    if workspace.config.server.transport == ServerTransport::Http {
        let bind = workspace.config.server.bind.as_deref().unwrap_or_default();
        write_stderr_line(&format!("{SERVER_NAME} listening on http://{bind}/rpc"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let server = McpServer::new(workspace.config.server.clone(), workspace.service);
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Evaluation Commands
// ============================================================================

/// Executes the `validate` command.
fn command_validate(context: &ContextArgs, command: &ValidateCommand) -> CliResult<ExitCode> {
    let git_command = command.git_command.trim();
    if git_command.is_empty() {
        return Err(CliError::new("command must be non-empty".to_string()));
    }
    let workspace = Workspace::open(context)?;
    let verdict = workspace.service.evaluate(git_command, &command.args);
    write_json(&verdict)?;
    Ok(if verdict.allowed { ExitCode::SUCCESS } else { ExitCode::from(DENIED_EXIT_CODE) })
}

/// Executes the `simulate` command.
fn command_simulate(context: &ContextArgs, command: &SimulateCommand) -> CliResult<ExitCode> {
    let bytes = if command.file.as_os_str() == STDIN_PATH {
        read_stdin_with_limit(MAX_SEQUENCE_BYTES)
    } else {
        read_bytes_with_limit(&command.file, MAX_SEQUENCE_BYTES)
    }
    .map_err(|err| CliError::new(read_error(&command.file, &err)))?;
    let steps = parse_sequence(&bytes)?;
    let workspace = Workspace::open(context)?;
    let result = workspace.service.simulate(&steps, !command.keep_going);
    write_json(&result)?;
    Ok(if result.first_violation.is_none() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(DENIED_EXIT_CODE)
    })
}

/// Accepted shapes for a simulation input document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SequenceInput {
    /// A bare array of steps.
    Steps(Vec<SimulationStep>),
    /// The `simulate_git_sequence` argument object.
    Request {
        /// Steps in replay order.
        sequence: Vec<SimulationStep>,
    },
}

/// Parses a simulation input document.
fn parse_sequence(bytes: &[u8]) -> CliResult<Vec<SimulationStep>> {
    let input: SequenceInput = serde_json::from_slice(bytes).map_err(|err| {
        CliError::new(format!("invalid sequence (expected steps or {{\"sequence\": [...]}}): {err}"))
    })?;
    Ok(match input {
        SequenceInput::Steps(steps)
        | SequenceInput::Request {
            sequence: steps,
        } => steps,
    })
}

// ============================================================================
// SECTION: Policy Commands
// ============================================================================

/// Dispatches policy subcommands.
fn command_policy(context: &ContextArgs, command: PolicyCommand) -> CliResult<ExitCode> {
    let workspace = Workspace::open(context)?;
    let policy = match command {
        PolicyCommand::Get => workspace.service.policy(),
        PolicyCommand::Set(command) => {
            let update = command.into_update();
            if update.is_empty() {
                return Err(CliError::new("policy set requires at least one field".to_string()));
            }
            workspace
                .service
                .update_policy(&update)
                .map_err(|err| CliError::new(format!("policy update failed: {err}")))?
        }
    };
    write_json(&policy)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes the config validation command.
fn command_config_validate(context: &ContextArgs) -> CliResult<ExitCode> {
    let _config = BranchGateConfig::load(context.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config valid").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Selftest Command
// ============================================================================

/// `selftest` report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelftestReport {
    /// True when the server answered the handshake with the full tool catalog.
    ok: bool,
    /// Server handshake results.
    server: SelftestServer,
    /// Repository detection results.
    repository: SelftestRepository,
    /// Configuration results.
    config: SelftestConfig,
}

/// Server section of the selftest report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelftestServer {
    /// Server name.
    name: &'static str,
    /// Server version.
    version: &'static str,
    /// Protocol version returned by `initialize`.
    protocol_version: Option<String>,
    /// Number of tools returned by `tools/list`.
    tools: usize,
}

/// Repository section of the selftest report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelftestRepository {
    /// Resolved repository root.
    root: String,
    /// Whether a git repository was found.
    detected: bool,
    /// Current branch label.
    branch: String,
}

/// Configuration section of the selftest report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelftestConfig {
    /// Configured transport.
    transport: ServerTransport,
    /// Policy document path.
    policy_file: String,
    /// Whether the policy document exists.
    policy_file_present: bool,
}

/// Executes the `selftest` command.
fn command_selftest(context: &ContextArgs) -> CliResult<ExitCode> {
    let workspace = Workspace::open(context)?;
    let snapshot = workspace.service.snapshot();
    let policy_path = workspace.service.store().path().to_path_buf();
    let repository = SelftestRepository {
        root: workspace.root.display().to_string(),
        detected: !snapshot.is_branch_unknown(),
        branch: snapshot.current_branch,
    };
    let config = SelftestConfig {
        transport: workspace.config.server.transport,
        policy_file: policy_path.display().to_string(),
        policy_file_present: policy_path.is_file(),
    };

    let quiet = ServerConfig {
        audit: ServerAuditConfig {
            enabled: false,
        },
        ..workspace.config.server.clone()
    };
    let server = McpServer::new(quiet, workspace.service);
    let initialize = selftest_call(&server, "initialize");
    let listed = selftest_call(&server, "tools/list");
    let protocol_version = initialize
        .as_ref()
        .and_then(|result| result.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let tools = listed
        .as_ref()
        .and_then(|result| result.get("tools"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let report = SelftestReport {
        ok: protocol_version.as_deref() == Some(PROTOCOL_VERSION) && tools == ToolName::ALL.len(),
        server: SelftestServer {
            name: SERVER_NAME,
            version: SERVER_VERSION,
            protocol_version,
            tools,
        },
        repository,
        config,
    };
    write_json(&report)?;
    Ok(if report.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Sends one request through the server and returns its `result`.
fn selftest_call(server: &McpServer, method: &str) -> Option<Value> {
    let request = json!({ "jsonrpc": "2.0", "id": method, "method": method, "params": {} });
    let reply = server.handle_payload(ServerTransport::Stdio, request.to_string().as_bytes())?;
    let mut response: Value = serde_json::from_slice(&reply.body).ok()?;
    response.get_mut("result").map(Value::take)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded reads.
#[derive(Debug)]
enum ReadLimitError {
    /// I/O failure.
    Io(std::io::Error),
    /// Input exceeds the configured limit.
    TooLarge {
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            limit: max_bytes,
        });
    }
    read_limited(file, max_bytes)
}

/// Reads stdin while enforcing a hard size limit.
fn read_stdin_with_limit(max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    read_limited(std::io::stdin().lock(), max_bytes)
}

/// Reads at most `max_bytes`, failing when more input remains.
fn read_limited(reader: impl Read, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let read_limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    reader.take(read_limit).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Formats a bounded read failure.
fn read_error(path: &Path, error: &ReadLimitError) -> String {
    match error {
        ReadLimitError::Io(err) => format!("failed to read {}: {err}", path.display()),
        ReadLimitError::TooLarge {
            limit,
        } => format!("{} exceeds size limit ({limit} bytes)", path.display()),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value to stdout as pretty JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to encode output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
