//! `fcal`: date arithmetic, period boundaries and human-readable differences
//! from the command line.

use anyhow::{bail, Context as _, Result};
use chrono::Weekday;
use clap::{Parser, Subcommand};
use fluent_calendar::{lang, Context, Moment, TimeUnit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "fcal")]
#[command(version, about = "Fluent date/time calculations", long_about = None)]
struct Cli {
    /// Default timezone (IANA name, "UTC", or a whole-hour offset such as "+5")
    #[arg(long, global = true)]
    tz: Option<String>,

    /// Locale for human-readable differences (en, fr, de, es, nl, pt_BR, ru, ja)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// First day of the week; the week ends the day before
    #[arg(long, global = true, value_parser = parse_weekday)]
    week_start: Option<Weekday>,

    /// Snap month arithmetic to the end of shorter months instead of overflowing
    #[arg(long, global = true)]
    no_overflow: bool,

    /// Freeze "now" at this instant (any text `parse` accepts as absolute)
    #[arg(long, global = true)]
    test_now: Option<String>,

    /// Output format for dates (chrono strftime tokens)
    #[arg(long, global = true)]
    format: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current date and time
    Now,
    /// Parse an absolute date or a relative phrase ("next monday at noon")
    Parse {
        #[arg(allow_hyphen_values = true)]
        expression: String,
    },
    /// Add an amount of a unit (second … century, or weekdays) to a date
    Add {
        #[arg(allow_hyphen_values = true)]
        date: String,
        #[arg(allow_hyphen_values = true)]
        amount: i64,
        unit: String,
    },
    /// Difference between two dates: an ISO 8601 interval, or a count of `--unit`
    Diff {
        #[arg(allow_hyphen_values = true)]
        from: String,
        #[arg(allow_hyphen_values = true)]
        to: String,
        #[arg(long)]
        unit: Option<String>,
        /// Drop the sign
        #[arg(long)]
        absolute: bool,
    },
    /// Human-readable difference ("3 days ago", "2 hours before")
    Humanize {
        #[arg(allow_hyphen_values = true)]
        date: String,
        /// Compare against this date instead of now
        #[arg(long, allow_hyphen_values = true)]
        other: Option<String>,
        /// Omit "ago" / "from now"
        #[arg(long)]
        absolute: bool,
    },
    /// Start of the unit (day, week, month, …) containing a date
    StartOf {
        unit: TimeUnit,
        #[arg(allow_hyphen_values = true)]
        date: String,
    },
    /// End of the unit (day, week, month, …) containing a date
    EndOf {
        unit: TimeUnit,
        #[arg(allow_hyphen_values = true)]
        date: String,
    },
}

fn parse_weekday(s: &str) -> std::result::Result<Weekday, String> {
    s.parse::<Weekday>()
        .map_err(|_| format!("unknown weekday '{s}'"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = build_context(&cli)?;
    tracing::debug!(command = ?cli.command, timezone = %ctx.timezone(), "running");

    let output = run(&cli, &ctx)?;
    println!("{output}");
    Ok(())
}

fn build_context(cli: &Cli) -> Result<Context> {
    let mut ctx = Context::new().use_months_overflow(!cli.no_overflow);

    if let Some(tz) = &cli.tz {
        ctx = ctx
            .with_timezone(tz)
            .with_context(|| format!("Invalid --tz value '{tz}'"))?;
    }
    if let Some(code) = &cli.locale {
        if !ctx.set_locale(code) {
            bail!(
                "Unknown locale '{code}' (available: {})",
                lang::available().join(", ")
            );
        }
    }
    if let Some(start) = cli.week_start {
        ctx = ctx.with_week_starts_at(start).with_week_ends_at(start.pred());
    }
    if let Some(text) = &cli.test_now {
        let frozen = ctx
            .parse(text, None)
            .with_context(|| format!("Invalid --test-now value '{text}'"))?;
        ctx = ctx.with_test_now(Some(frozen.datetime()));
    }
    Ok(ctx)
}

fn run(cli: &Cli, ctx: &Context) -> Result<String> {
    match &cli.command {
        Command::Now => render(cli, &ctx.now(None)?),
        Command::Parse { expression } => render(cli, &parse(ctx, expression)?),
        Command::Add { date, amount, unit } => {
            let moment = parse(ctx, date)?;
            let shifted = match unit.to_ascii_lowercase().as_str() {
                "weekday" | "weekdays" => moment.add_weekdays(*amount),
                other => {
                    let unit: TimeUnit = other.parse()?;
                    moment
                        .checked_add(unit, *amount)
                        .with_context(|| format!("{date} + {amount} {unit} is out of range"))?
                }
            };
            render(cli, &shifted)
        }
        Command::Diff {
            from,
            to,
            unit,
            absolute,
        } => {
            let from = parse(ctx, from)?;
            let to = parse(ctx, to)?;
            match unit {
                Some(unit) => {
                    let unit: TimeUnit = unit.parse()?;
                    let count = from.diff_in(unit, Some(&to), *absolute);
                    Ok(if cli.json {
                        serde_json::json!({ "unit": unit, "value": count }).to_string()
                    } else {
                        count.to_string()
                    })
                }
                None => {
                    let mut interval = from.diff(Some(&to));
                    if *absolute {
                        interval.invert = false;
                    }
                    Ok(if cli.json {
                        serde_json::to_string(&interval)?
                    } else {
                        interval.to_string()
                    })
                }
            }
        }
        Command::Humanize {
            date,
            other,
            absolute,
        } => {
            let moment = parse(ctx, date)?;
            let other = other.as_deref().map(|o| parse(ctx, o)).transpose()?;
            let text = moment.diff_for_humans(other.as_ref(), *absolute);
            Ok(if cli.json {
                serde_json::json!({ "text": text }).to_string()
            } else {
                text
            })
        }
        Command::StartOf { unit, date } => render(cli, &parse(ctx, date)?.start_of(*unit)),
        Command::EndOf { unit, date } => render(cli, &parse(ctx, date)?.end_of(*unit)),
    }
}

fn parse(ctx: &Context, text: &str) -> Result<Moment> {
    ctx.parse(text, None)
        .with_context(|| format!("Could not read '{text}' as a date"))
}

fn render(cli: &Cli, moment: &Moment) -> Result<String> {
    if cli.json {
        return Ok(serde_json::to_string(moment)?);
    }
    match &cli.format {
        Some(fmt) => Ok(moment.format(fmt)?),
        None => Ok(moment.to_string()),
    }
}
