//! Argument parsing and command dispatch.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hrms_client::Endpoints;
use hrms_settings::{Badge, SettingsStore};
use hrms_telemetry::{LogFormat, LoggingConfig, init_logging};
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, parse_pair, parse_url};
use crate::commands::auth::{handle_login, handle_logout, handle_password};
use crate::commands::notifications::{
    handle_badges, handle_notification_list, handle_read, handle_read_all, handle_watch,
};
use crate::commands::resources::{
    handle_department_create, handle_department_delete, handle_department_list,
    handle_designation_create, handle_designation_list, handle_employee_list,
    handle_employee_register, handle_level_create, handle_level_list, handle_salary_create,
    handle_salary_list, handle_shift_list,
};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
const CLI_LOG_LEVEL: &str = "warn";

/// Parses CLI arguments, executes the requested command and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();
    let logging = LoggingConfig {
        level: CLI_LOG_LEVEL,
        format: cli.log_format.unwrap_or(LogFormat::Compact),
        trace_id: Some(&trace_id),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let result = match context_from(&cli, &trace_id) {
        Ok(ctx) => dispatch(cli.command, &ctx, cli.output).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn context_from(cli: &Cli, trace_id: &str) -> CliResult<AppContext> {
    let path = match &cli.settings {
        Some(path) => path.clone(),
        None => SettingsStore::default_path()?,
    };
    let settings = SettingsStore::open(path)?;
    AppContext::new(
        &cli.api_url,
        Duration::from_secs(cli.timeout),
        cli.endpoints(),
        settings,
        trace_id,
    )
}

pub(crate) async fn dispatch(
    command: Command,
    ctx: &AppContext,
    output: OutputFormat,
) -> CliResult<()> {
    match command {
        Command::Login(args) => handle_login(ctx, args).await,
        Command::Logout => handle_logout(ctx),
        Command::Password => handle_password(ctx).await,
        Command::Notifications(command) => match command {
            NotificationsCommand::List(args) => handle_notification_list(ctx, args, output).await,
            NotificationsCommand::Watch(args) => handle_watch(ctx, args).await,
            NotificationsCommand::Read(args) => handle_read(ctx, &args),
            NotificationsCommand::ReadAll => handle_read_all(ctx).await,
            NotificationsCommand::Badges(args) => handle_badges(ctx, &args, output),
        },
        Command::Departments(command) => match command {
            DepartmentsCommand::List => handle_department_list(ctx, output).await,
            DepartmentsCommand::Create(args) => handle_department_create(ctx, args).await,
            DepartmentsCommand::Delete(args) => handle_department_delete(ctx, args).await,
        },
        Command::Designations(command) => match command {
            DesignationsCommand::List => handle_designation_list(ctx, output).await,
            DesignationsCommand::Create(args) => handle_designation_create(ctx, args).await,
        },
        Command::Levels(command) => match command {
            LevelsCommand::List => handle_level_list(ctx, output).await,
            LevelsCommand::Create(args) => handle_level_create(ctx, args).await,
        },
        Command::Shifts(ShiftsCommand::List) => handle_shift_list(ctx, output).await,
        Command::SalaryStructures(command) => match command {
            SalaryStructuresCommand::List => handle_salary_list(ctx, output).await,
            SalaryStructuresCommand::Create(args) => handle_salary_create(ctx, args).await,
        },
        Command::Employees(command) => match command {
            EmployeesCommand::List => handle_employee_list(ctx, output).await,
            EmployeesCommand::Register(args) => handle_employee_register(ctx, args).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "hrms", version, about = "Command-line console for the HRMS backend")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "HRMS_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    api_url: Url,
    #[arg(
        long,
        global = true,
        env = "HRMS_HTTP_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[arg(long, global = true, env = "HRMS_SETTINGS_PATH")]
    settings: Option<PathBuf>,
    #[arg(long, global = true, env = "HRMS_LOG_FORMAT")]
    log_format: Option<LogFormat>,
    /// Notification list route, relative to the API URL.
    #[arg(long, global = true, env = "HRMS_NOTIFICATIONS_PATH")]
    notifications_path: Option<String>,
    /// Push stream route, relative to the API URL.
    #[arg(long, global = true, env = "HRMS_STREAM_PATH")]
    stream_path: Option<String>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn endpoints(&self) -> Endpoints {
        let mut endpoints = Endpoints::default();
        if let Some(path) = &self.notifications_path {
            endpoints.notifications.clone_from(path);
        }
        if let Some(path) = &self.stream_path {
            endpoints.stream.clone_from(path);
        }
        endpoints
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sign in and store the token pair.
    Login(LoginArgs),
    /// Forget tokens, read markers, badge counters and the push cursor.
    Logout,
    /// Change the signed-in user's password.
    Password,
    /// Read and watch notifications.
    #[command(subcommand)]
    Notifications(NotificationsCommand),
    /// Manage departments.
    #[command(subcommand)]
    Departments(DepartmentsCommand),
    /// Manage designations.
    #[command(subcommand)]
    Designations(DesignationsCommand),
    /// Manage employee levels.
    #[command(subcommand)]
    Levels(LevelsCommand),
    /// Inspect shift policies.
    #[command(subcommand)]
    Shifts(ShiftsCommand),
    /// Manage salary structures.
    #[command(subcommand)]
    SalaryStructures(SalaryStructuresCommand),
    /// Browse and register employees.
    #[command(subcommand)]
    Employees(EmployeesCommand),
}

#[derive(Subcommand)]
pub(crate) enum NotificationsCommand {
    /// Fetch the unified list once.
    List(NotificationListArgs),
    /// Keep the list fresh and print new notifications until interrupted.
    Watch(WatchArgs),
    /// Mark one notification as read.
    Read(ReadArgs),
    /// Mark every loaded notification as read.
    ReadAll,
    /// Show or update sidebar badge counters.
    Badges(BadgesArgs),
}

#[derive(Subcommand)]
pub(crate) enum DepartmentsCommand {
    List,
    Create(DepartmentCreateArgs),
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
pub(crate) enum DesignationsCommand {
    List,
    Create(DesignationCreateArgs),
}

#[derive(Subcommand)]
pub(crate) enum LevelsCommand {
    List,
    Create(LevelCreateArgs),
}

#[derive(Subcommand)]
pub(crate) enum ShiftsCommand {
    List,
}

#[derive(Subcommand)]
pub(crate) enum SalaryStructuresCommand {
    List,
    Create(SalaryCreateArgs),
}

#[derive(Subcommand)]
pub(crate) enum EmployeesCommand {
    List,
    Register(EmployeeRegisterArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LoginArgs {
    #[arg(long, short, env = "HRMS_USERNAME")]
    pub(crate) username: String,
    #[arg(long, env = "HRMS_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct NotificationListArgs {
    /// Only show notifications without a read marker.
    #[arg(long)]
    pub(crate) unread: bool,
    /// Group by day (Today, Yesterday, dates).
    #[arg(long)]
    pub(crate) grouped: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct WatchArgs {
    /// Seconds between full list refreshes.
    #[arg(
        long,
        env = "HRMS_POLL_INTERVAL_SECS",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_POLL_INTERVAL_SECS
    )]
    pub(crate) poll_interval: u64,
    /// Poll only; do not open the push stream.
    #[arg(long)]
    pub(crate) no_push: bool,
    /// Print Prometheus counters for the session on exit.
    #[arg(long)]
    pub(crate) metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ReadArgs {
    pub(crate) id: String,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct BadgesArgs {
    /// Record the count the user has now seen, as BADGE=COUNT.
    #[arg(long, value_parser = parse_badge_count)]
    pub(crate) mark: Vec<(Badge, u64)>,
    /// Print how many items are unseen given the current count, as BADGE=COUNT.
    #[arg(long, value_parser = parse_badge_count)]
    pub(crate) current: Vec<(Badge, u64)>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DepartmentCreateArgs {
    pub(crate) name: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DeleteArgs {
    pub(crate) id: i64,
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub(crate) yes: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DesignationCreateArgs {
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) department: Option<i64>,
    #[arg(long)]
    pub(crate) level: Option<i64>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LevelCreateArgs {
    pub(crate) name: String,
    #[arg(long, default_value = "")]
    pub(crate) description: String,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct SalaryCreateArgs {
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) basic: String,
    #[arg(long)]
    pub(crate) hra: String,
    #[arg(long, default_value = "")]
    pub(crate) conveyance: String,
    #[arg(long, default_value = "")]
    pub(crate) medical: String,
    #[arg(long, default_value = "")]
    pub(crate) special: String,
    #[arg(long, default_value = "")]
    pub(crate) service_charge: String,
    #[arg(long, default_value = "")]
    pub(crate) working_days: String,
    /// Fixed allowance as NAME=AMOUNT; repeatable.
    #[arg(long, value_parser = parse_pair)]
    pub(crate) allowance: Vec<(String, String)>,
    /// Fixed deduction as NAME=AMOUNT; repeatable.
    #[arg(long, value_parser = parse_pair)]
    pub(crate) deduction: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct EmployeeRegisterArgs {
    #[arg(long)]
    pub(crate) first_name: String,
    #[arg(long)]
    pub(crate) middle_name: Option<String>,
    #[arg(long)]
    pub(crate) last_name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) mobile: String,
    #[arg(long)]
    pub(crate) gender: Option<String>,
    #[arg(long)]
    pub(crate) date_of_birth: Option<String>,
    #[arg(long)]
    pub(crate) date_of_joining: String,
    #[arg(long)]
    pub(crate) date_of_releaving: Option<String>,
    #[arg(long)]
    pub(crate) department: Option<String>,
    #[arg(long)]
    pub(crate) designation: Option<String>,
    #[arg(long)]
    pub(crate) level: Option<String>,
    #[arg(long)]
    pub(crate) reporting_manager: Option<String>,
    /// Hiring channel, e.g. `internalreference` or `linkedin`.
    #[arg(long)]
    pub(crate) source: Option<String>,
    /// Referrer; only sent for internal references.
    #[arg(long)]
    pub(crate) referred_by: Option<String>,
    /// Any other register field as KEY=VALUE; repeatable.
    #[arg(long, value_parser = parse_pair)]
    pub(crate) field: Vec<(String, String)>,
    /// Asset id issued at joining; repeatable.
    #[arg(long)]
    pub(crate) asset: Vec<i64>,
    /// Profile photo; sends the form as multipart.
    #[arg(long)]
    pub(crate) photo: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_badge_count(input: &str) -> Result<(Badge, u64), String> {
    let (badge, count) = parse_pair(input)?;
    let badge = badge.parse::<Badge>()?;
    let count = count
        .parse::<u64>()
        .map_err(|err| format!("invalid count '{count}': {err}"))?;
    Ok((badge, count))
}
