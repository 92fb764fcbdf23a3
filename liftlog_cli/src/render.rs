//! Text rendering for command output.

use chrono::{DateTime, Datelike, Local, Utc};
use liftlog_core::*;
use std::io::IsTerminal;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const REVERSE: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";

fn local(instant: &DateTime<Utc>) -> DateTime<Local> {
    instant.with_timezone(&Local)
}

pub fn user(user: &User) {
    println!("{} <{}>", user.username, user.email);
    println!("  id:        {}", user.id);
    println!("  verified:  {}", if user.is_verified { "yes" } else { "no" });
    if user.is_suspended {
        println!("  suspended: yes");
    }
    if !user.roles.is_empty() {
        let roles: Vec<&str> = user.roles.iter().map(|r| r.name.as_str()).collect();
        println!("  roles:     {}", roles.join(", "));
    }
    println!("  joined:    {}", local(&user.created).format("%Y-%m-%d"));
}

pub fn workout_list(workouts: &[Workout]) {
    if workouts.is_empty() {
        println!("No workouts yet. Create one with `liftlog workouts create --file <path>`.");
        return;
    }
    for workout in workouts {
        let count = workout.exercises.len();
        println!(
            "{}  {}  ({} exercise{})  updated {}",
            workout.id,
            workout.name,
            count,
            if count == 1 { "" } else { "s" },
            local(&workout.updated).format("%Y-%m-%d")
        );
    }
}

pub fn workout(workout: &Workout) {
    println!("{}  [{}]", workout.name, workout.id);
    println!(
        "  created {}  volume {:.0}  reps {}",
        local(&workout.created).format("%Y-%m-%d %H:%M"),
        workout.total_volume(),
        workout.total_reps()
    );
    for exercise in &workout.exercises {
        let muscles: Vec<String> = exercise
            .muscles
            .iter()
            .map(|m| format!("{} ({})", m.name, m.muscle_group))
            .collect();
        println!();
        println!("  {}", exercise.name);
        if !muscles.is_empty() {
            println!("    targets: {}", muscles.join(", "));
        }
        for (i, set) in exercise.sets.iter().enumerate() {
            println!("    set {}: {} x {}", i + 1, set.weight, set.reps);
        }
    }
}

pub fn calendar_list(calendars: &[Calendar]) {
    if calendars.is_empty() {
        println!("No calendars yet. Create one with `liftlog calendars create <name>`.");
        return;
    }
    for calendar in calendars {
        println!("{}  {}", calendar.id, calendar.name);
    }
}

/// Month grid followed by the month's snapshots
pub fn month_grid(calendar: &Calendar, grid: &MonthGrid<'_>, theme: Theme) {
    let styled = std::io::stdout().is_terminal();
    let today_style = match theme {
        Theme::Light => BOLD,
        Theme::Dark => REVERSE,
    };

    println!("{}: {}", calendar.name, grid.month.title());
    println!(" Sun  Mon  Tue  Wed  Thu  Fri  Sat");

    for week in &grid.weeks {
        let mut line = String::new();
        for cell in week {
            let mark = if cell.snapshots.is_empty() { ' ' } else { '*' };
            let text = format!("{:>3}{}", cell.date.day(), mark);
            match (styled, cell.is_today, cell.in_month) {
                (true, true, _) => line.push_str(&format!(" {}{}{}", today_style, text, RESET)),
                (true, false, false) => line.push_str(&format!(" {}{}{}", DIM, text, RESET)),
                (false, true, _) => line.push_str(&format!(">{}", text)),
                _ => line.push_str(&format!(" {}", text)),
            }
        }
        println!("{}", line);
    }

    let days: Vec<_> = grid
        .cells()
        .filter(|c| c.in_month && !c.snapshots.is_empty())
        .collect();
    if days.is_empty() {
        println!();
        println!("No workouts scheduled this month.");
        return;
    }

    println!();
    for cell in days {
        for snapshot in &cell.snapshots {
            let name = match snapshot.workout() {
                Ok(workout) => workout.name,
                Err(e) => {
                    tracing::warn!("{}", e);
                    "[invalid data]".to_string()
                }
            };
            println!(
                "{}  {}  {}  ({})",
                cell.date.format("%b %d"),
                local(&snapshot.done).format("%H:%M"),
                name,
                snapshot.id
            );
        }
    }
}

pub fn progress(report: &ProgressReport) {
    let totals = &report.totals;
    println!("Total workouts:      {}", totals.workouts);
    println!("Total weight lifted: {:.0}", totals.total_volume);
    println!("Total reps:          {}", totals.total_reps);
    println!("Unique exercises:    {}", totals.distinct_exercises);

    if totals.workouts == 0 {
        println!();
        println!("No progress data yet. Complete some workouts to see your progress!");
        return;
    }

    println!();
    println!("Muscle group focus");
    for (group, count) in &report.muscles {
        println!("  {:<10} {:>4}  {}", group.as_str(), count, "#".repeat((*count).min(40)));
    }

    println!();
    let active = report.days.iter().filter(|d| !d.is_empty()).count();
    println!(
        "Last {} days ({} with workouts)",
        report.range.bucket_count(),
        active
    );
    for day in &report.days {
        if report.range != TimeRange::Week && day.is_empty() {
            continue;
        }
        println!(
            "  {:<5}  workouts {:>2}  volume {:>8.0}  reps {:>5}  exercises {:>3}",
            day.label(report.range),
            day.workouts,
            day.total_volume,
            day.total_reps,
            day.exercises
        );
    }
}

pub fn dashboard(user: &User, stats: &DashboardStats, recent: &[Workout]) {
    println!("Welcome back, {}!", user.username);
    println!();
    println!("Total workouts:  {}", stats.total_workouts);
    println!("This week:       {}", stats.this_week_workouts);
    println!("Total exercises: {}", stats.total_exercises);
    println!();
    println!("Recent workouts");
    workout_list(recent);
}
