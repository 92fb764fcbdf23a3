mod render;

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use liftlog_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout tracker: log workouts, schedule them on calendars, chart progress", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory (session file lives here)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log every API request
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show or set the color theme (toggles when no value is given)
    Theme {
        /// light or dark
        mode: Option<Theme>,
    },

    /// Manage your account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Manage workouts
    Workouts {
        #[command(subcommand)]
        action: WorkoutAction,
    },

    /// Manage calendars
    Calendars {
        #[command(subcommand)]
        action: CalendarAction,
    },

    /// Show a calendar month with its scheduled workouts
    Calendar {
        /// Calendar id
        id: String,

        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<MonthRef>,

        /// Move forward (or back, if negative) this many months
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        shift: i32,
    },

    /// Schedule workouts on a calendar
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Progress charts over a time range
    Progress {
        /// week, month or year
        #[arg(long)]
        range: Option<TimeRange>,

        /// Also write the daily series to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Overview of recent activity
    Dashboard,
}

#[derive(Subcommand)]
enum AccountAction {
    Show,
    Update {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
    Delete {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutAction {
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,

        #[arg(long)]
        offset: Option<u32>,

        /// asc or desc
        #[arg(long, default_value = "desc")]
        sort: SortOrder,

        /// created, updated or id
        #[arg(long, default_value = "updated")]
        sort_column: SortColumn,
    },
    Show {
        id: String,
    },
    /// Create from a JSON file: {"name": ..., "exercises": [...]}
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// Apply a partial update from a JSON file
    Update {
        id: String,

        #[arg(long)]
        file: PathBuf,
    },
    Delete {
        id: String,

        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CalendarAction {
    List,
    Create { name: String },
    Rename { id: String, name: String },
    Delete {
        id: String,

        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Pin a workout to a calendar at a given time
    Add {
        calendar_id: String,
        workout_id: String,

        /// RFC 3339 timestamp, or YYYY-MM-DD for the current time of day on that date
        #[arg(long)]
        done: String,
    },
    Delete {
        calendar_id: String,
        snapshot_id: String,

        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    liftlog_core::logging::init_for_cli(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());

    let mut api_config = config.api.clone();
    if let Some(url) = cli.api_url {
        api_config.base_url = url;
    }

    let store = SessionStore::in_dir(&data_dir);
    let session = store.load()?;
    let client = ApiClient::new(&api_config)?.with_cookie(session.cookie.clone());

    let mut app = App {
        config,
        store,
        session,
        client,
    };

    let used_session = cli.command.uses_stored_session();
    let result = app.dispatch(cli.command).await;
    if used_session && matches!(result, Err(Error::Unauthorized)) {
        // Same as being sent back to the login screen
        app.store.logout(&mut app.session)?;
        eprintln!("Your session has expired. Run `liftlog login` to sign in again.");
    }
    result
}

impl Commands {
    /// Whether the command talks to the API with the stored cookie
    fn uses_stored_session(&self) -> bool {
        !matches!(
            self,
            Commands::Login { .. }
                | Commands::Register { .. }
                | Commands::Logout
                | Commands::Theme { .. }
        )
    }
}

struct App {
    config: Config,
    store: SessionStore,
    session: Session,
    client: ApiClient,
}

impl App {
    async fn dispatch(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login { username, password } => self.cmd_login(username, password).await,
            Commands::Register {
                username,
                email,
                password,
            } => self.cmd_register(username, email, password).await,
            Commands::Logout => self.cmd_logout(),
            Commands::Whoami => {
                render::user(self.session.require_user()?);
                Ok(())
            }
            Commands::Theme { mode } => self.cmd_theme(mode),
            Commands::Account { action } => self.cmd_account(action).await,
            Commands::Workouts { action } => self.cmd_workouts(action).await,
            Commands::Calendars { action } => self.cmd_calendars(action).await,
            Commands::Calendar { id, month, shift } => self.cmd_calendar(&id, month, shift).await,
            Commands::Snapshot { action } => self.cmd_snapshot(action).await,
            Commands::Progress { range, csv } => self.cmd_progress(range, csv).await,
            Commands::Dashboard => self.cmd_dashboard().await,
        }
    }

    fn user_id(&self) -> Result<String> {
        Ok(self.session.require_user()?.id.clone())
    }

    // ========================================================================
    // Session
    // ========================================================================

    async fn cmd_login(&mut self, username: String, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => prompt("Password: ")?,
        };
        let credentials = LoginRequest { username, password };
        validate::login(&credentials)?;

        let user = self.client.login(&credentials).await?;
        let cookie = self.client.cookie().map(str::to_string);
        println!("✓ Signed in as {}", user.username);
        self.store.login(&mut self.session, user, cookie)
    }

    async fn cmd_register(
        &mut self,
        username: String,
        email: String,
        password: Option<String>,
    ) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => prompt("Password: ")?,
        };
        let request = CreateUserRequest {
            username,
            password,
            email,
        };
        validate::registration(&request)?;

        let user = self.client.register(&request).await?;
        let cookie = self.client.cookie().map(str::to_string);
        println!("✓ Account created for {}", user.username);
        self.store.login(&mut self.session, user, cookie)
    }

    fn cmd_logout(&mut self) -> Result<()> {
        if !self.session.is_authenticated() {
            println!("Not logged in.");
            return Ok(());
        }
        self.store.logout(&mut self.session)?;
        println!("✓ Logged out");
        Ok(())
    }

    fn cmd_theme(&mut self, mode: Option<Theme>) -> Result<()> {
        let theme = mode.unwrap_or_else(|| self.session.theme.toggle());
        self.store.set_theme(&mut self.session, theme)?;
        println!("Theme: {}", theme.as_str());
        Ok(())
    }

    async fn cmd_account(&mut self, action: AccountAction) -> Result<()> {
        let user_id = self.user_id()?;
        match action {
            AccountAction::Show => {
                let user = self.client.get_user(&user_id).await?;
                render::user(&user);
            }
            AccountAction::Update { username, email } => {
                if username.is_none() && email.is_none() {
                    return Err(Error::Validation("Nothing to update".into()));
                }
                let user = self
                    .client
                    .update_user(&user_id, &UpdateUserRequest { username, email })
                    .await?;
                println!("✓ Account updated");
                render::user(&user);
                let cookie = self.session.cookie.clone();
                self.store.login(&mut self.session, user, cookie)?;
            }
            AccountAction::Delete { yes } => {
                if !confirm("Delete your account and all its data?", yes)? {
                    println!("Cancelled.");
                    return Ok(());
                }
                self.client.delete_user(&user_id).await?;
                self.store.logout(&mut self.session)?;
                println!("✓ Account deleted");
            }
        }
        Ok(())
    }

    // ========================================================================
    // Workouts
    // ========================================================================

    async fn cmd_workouts(&mut self, action: WorkoutAction) -> Result<()> {
        let user_id = self.user_id()?;
        match action {
            WorkoutAction::List {
                limit,
                offset,
                sort,
                sort_column,
            } => {
                let params = ListParams {
                    limit: Some(limit),
                    offset,
                    sort: Some(sort),
                    sort_column: Some(sort_column),
                };
                let workouts = self.client.list_workouts(&user_id, &params).await?;
                render::workout_list(&workouts);
            }
            WorkoutAction::Show { id } => {
                let workout = self.client.get_workout(&user_id, &id).await?;
                render::workout(&workout);
            }
            WorkoutAction::Create { file } => {
                let request: CreateWorkoutRequest = read_json(&file)?;
                validate::workout(&request)?;
                let workout = self.client.create_workout(&user_id, &request).await?;
                println!("✓ Created workout {} ({})", workout.name, workout.id);
            }
            WorkoutAction::Update { id, file } => {
                let request: UpdateWorkoutRequest = read_json(&file)?;
                validate::workout_update(&request)?;
                let workout = self.client.update_workout(&user_id, &id, &request).await?;
                println!("✓ Updated workout {} ({})", workout.name, workout.id);
            }
            WorkoutAction::Delete { id, yes } => {
                if !confirm("Are you sure you want to delete this workout?", yes)? {
                    println!("Cancelled.");
                    return Ok(());
                }
                self.client.delete_workout(&user_id, &id).await?;
                println!("✓ Deleted workout {}", id);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Calendars and snapshots
    // ========================================================================

    async fn cmd_calendars(&mut self, action: CalendarAction) -> Result<()> {
        let user_id = self.user_id()?;
        match action {
            CalendarAction::List => {
                let params = ListParams::newest(100, SortColumn::Updated);
                let calendars = self.client.list_calendars(&user_id, &params).await?;
                render::calendar_list(&calendars);
            }
            CalendarAction::Create { name } => {
                let request = CreateCalendarRequest { name };
                validate::calendar(&request)?;
                let calendar = self.client.create_calendar(&user_id, &request).await?;
                println!("✓ Created calendar {} ({})", calendar.name, calendar.id);
            }
            CalendarAction::Rename { id, name } => {
                validate::calendar(&CreateCalendarRequest { name: name.clone() })?;
                let request = UpdateCalendarRequest { name: Some(name) };
                let calendar = self.client.update_calendar(&user_id, &id, &request).await?;
                println!("✓ Renamed calendar to {}", calendar.name);
            }
            CalendarAction::Delete { id, yes } => {
                if !confirm("Are you sure you want to delete this calendar?", yes)? {
                    println!("Cancelled.");
                    return Ok(());
                }
                self.client.delete_calendar(&user_id, &id).await?;
                println!("✓ Deleted calendar {}", id);
            }
        }
        Ok(())
    }

    async fn cmd_calendar(&mut self, id: &str, month: Option<MonthRef>, shift: i32) -> Result<()> {
        let user_id = self.user_id()?;
        let now = Local::now();

        let mut cursor = match month {
            Some(month) => CalendarCursor::new(month),
            None => CalendarCursor::at_today(&now),
        };
        cursor.shift(shift);

        let bundle = self.client.load_calendar_bundle(&user_id, id).await?;
        let grid = MonthGrid::project(cursor.month(), &bundle.snapshots, &now);
        render::month_grid(&bundle.calendar, &grid, self.session.theme);
        Ok(())
    }

    async fn cmd_snapshot(&mut self, action: SnapshotAction) -> Result<()> {
        let user_id = self.user_id()?;
        match action {
            SnapshotAction::Add {
                calendar_id,
                workout_id,
                done,
            } => {
                let done = parse_done(&done, Local::now())?;
                let workout = self.client.get_workout(&user_id, &workout_id).await?;
                let request = CreateSnapshotRequest { done, workout };
                let snapshot = self
                    .client
                    .create_snapshot(&user_id, &calendar_id, &request)
                    .await?;
                println!(
                    "✓ Scheduled {} on {} ({})",
                    request.workout.name,
                    snapshot.done.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    snapshot.id
                );
            }
            SnapshotAction::Delete {
                calendar_id,
                snapshot_id,
                yes,
            } => {
                if !confirm("Are you sure you want to delete this workout snapshot?", yes)? {
                    println!("Cancelled.");
                    return Ok(());
                }
                self.client
                    .delete_snapshot(&user_id, &calendar_id, &snapshot_id)
                    .await?;
                println!("✓ Deleted snapshot {}", snapshot_id);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Progress and dashboard
    // ========================================================================

    async fn cmd_progress(&mut self, range: Option<TimeRange>, csv: Option<PathBuf>) -> Result<()> {
        let user_id = self.user_id()?;
        let range = range.unwrap_or(self.config.progress.default_range);

        let params = ListParams::newest(100, SortColumn::Created);
        let workouts = self.client.list_workouts(&user_id, &params).await?;
        let report = ProgressReport::compute(&workouts, range, &Local::now());

        render::progress(&report);

        if let Some(path) = csv {
            let rows = export::export_series(&path, range, &report.days)?;
            println!();
            println!("✓ Wrote {} days to {}", rows, path.display());
        }
        Ok(())
    }

    async fn cmd_dashboard(&mut self) -> Result<()> {
        let user = self.session.require_user()?.clone();

        let params = ListParams::newest(10, SortColumn::Updated);
        let workouts = self.client.list_workouts(&user.id, &params).await?;
        let stats = DashboardStats::compute(&workouts, &Local::now());

        render::dashboard(&user, &stats, &workouts);
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Accept a full timestamp, or a bare date at the current time of day
fn parse_done(input: &str, now: DateTime<Local>) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        Error::Validation(format!(
            "Invalid time '{}': use RFC 3339 or YYYY-MM-DD",
            input
        ))
    })?;

    date.and_time(now.time())
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| Error::Validation(format!("{} does not exist in the local time zone", input)))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
