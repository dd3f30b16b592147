use chrono::{Local, NaiveDate};
use clap::Subcommand;
use serde_json::json;

use circ_core::stats::{
    hourly_minutes, hours_at_goal, rank_for, shield_bank, weekly_credits, weekly_points,
};
use circ_core::{Config, Database};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Hourly focus breakdown for one day
    Day {
        /// Date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Weekly point log, credits, rank and shield bank
    Week,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    match action {
        StatsAction::Day { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let sessions = db.sessions_for_date(date)?;
            let buckets = hourly_minutes(&sessions);
            let hourly_goal = u64::from(config.goals.hourly_goal_minutes);
            let output = json!({
                "date": date,
                "total_minutes": buckets.iter().sum::<u64>(),
                "hourly_minutes": buckets,
                "hourly_goal_minutes": hourly_goal,
                "hours_at_goal": hours_at_goal(&buckets, hourly_goal),
                "sessions": sessions,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        StatsAction::Week => {
            let today = Local::now().date_naive();
            let monday = today
                - chrono::Duration::days(i64::from(
                    chrono::Datelike::weekday(&today).num_days_from_monday(),
                ));
            let sessions = db.sessions_from(monday)?;
            let log = weekly_points(&sessions, today, i64::from(config.goals.daily_goal_minutes));
            let credits = weekly_credits(&log);
            let output = json!({
                "credits": credits,
                "rank": rank_for(credits),
                "shield_bank": shield_bank(&log),
                "daily_goal_minutes": config.goals.daily_goal_minutes,
                "days": log,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
