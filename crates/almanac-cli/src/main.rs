use std::process::ExitCode;

use almanac::{check_timezone_default, resolve, DateTimeValue, Interval, TimezoneContext};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "almanac",
    version,
    about = "Resolve, shift and diff calendar date-times"
)]
struct Cli {
    /// Default timezone (IANA name or ±HH:MM). Falls back to ALMANAC_TIMEZONE, then TZ, then UTC.
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve an input (ISO 8601 string or @epoch-seconds) into a canonical value
    Resolve {
        input: String,

        /// Keep the input's own timezone instead of moving to the default
        #[arg(long)]
        keep_foreign_timezone: bool,

        #[arg(long, value_enum, default_value_t = Format::Iso)]
        format: Format,
    },
    /// Shift a value by calendar (years, months, days) and clock deltas
    Shift {
        input: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        years: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        months: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        days: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        hours: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        minutes: i64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        seconds: i64,

        /// Keep the input's own timezone instead of moving to the default
        #[arg(long)]
        keep_foreign_timezone: bool,

        #[arg(long, value_enum, default_value_t = Format::Iso)]
        format: Format,
    },
    /// Whole months (and remainder) from one value to another
    Diff {
        from: String,
        to: String,

        /// Reconcile operands at different UTC offsets instead of failing
        #[arg(long)]
        allow_unequal_timezones: bool,
    },
    /// Check a timezone name against the default timezone
    CheckTimezone {
        name: String,

        /// Fail instead of printing `false` on a mismatch
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// ISO 8601 with Z or ±HH:MM
    Iso,
    /// YYYY-MM-DD
    Date,
    /// YYYY-MM-DD HH:MM:SS
    Local,
}

#[derive(Serialize)]
struct DiffOutput {
    from: DateTimeValue,
    to: DateTimeValue,
    #[serde(flatten)]
    interval: Interval,
    human_readable: String,
}

#[derive(Serialize)]
struct CheckOutput {
    timezone: String,
    default_timezone: String,
    matches: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let ctx = match &cli.timezone {
        Some(name) => TimezoneContext::named(name).context("invalid --timezone")?,
        None => TimezoneContext::from_env().context("invalid timezone in environment")?,
    };
    debug!(default_timezone = %ctx.default_zone(), "timezone context ready");

    match cli.command {
        Command::Resolve {
            input,
            keep_foreign_timezone,
            format,
        } => {
            let value = resolve(&input, &ctx, keep_foreign_timezone)
                .with_context(|| format!("failed to resolve '{input}'"))?;
            print_value(&value, format, cli.json)
        }
        Command::Shift {
            input,
            years,
            months,
            days,
            hours,
            minutes,
            seconds,
            keep_foreign_timezone,
            format,
        } => {
            let mut value = resolve(&input, &ctx, keep_foreign_timezone)
                .with_context(|| format!("failed to resolve '{input}'"))?;
            value
                .modify_date(years, months, days)
                .and_then(|v| v.modify_time(hours, minutes, seconds))
                .with_context(|| format!("failed to shift '{input}'"))?;
            print_value(&value, format, cli.json)
        }
        Command::Diff {
            from,
            to,
            allow_unequal_timezones,
        } => {
            let from = resolve(&from, &ctx, true)
                .with_context(|| format!("failed to resolve '{from}'"))?;
            let to =
                resolve(&to, &ctx, true).with_context(|| format!("failed to resolve '{to}'"))?;
            let interval = from.diff_constant(&to, allow_unequal_timezones, &ctx)?;
            let output = DiffOutput {
                human_readable: interval.human_readable(),
                from,
                to,
                interval,
            };
            print_interval(&output, cli.json)
        }
        Command::CheckTimezone { name, strict } => {
            let matches = check_timezone_default(&ctx, &name, strict)?;
            let output = CheckOutput {
                timezone: name,
                default_timezone: ctx.default_zone().name(),
                matches,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", output.matches);
            }
            Ok(())
        }
    }
}

fn print_value(value: &DateTimeValue, format: Format, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&value.summary())?);
        return Ok(());
    }
    let text = match format {
        Format::Iso => value.to_iso8601(),
        Format::Date => value.to_date_string(),
        Format::Local => value.to_local_string(),
    };
    println!("{text}");
    Ok(())
}

fn print_interval(output: &DiffOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }
    let direction = if output.interval.is_negative() {
        " ago"
    } else {
        ""
    };
    println!("months: {}", output.interval.months);
    println!("total_seconds: {}", output.interval.total_seconds);
    println!("human: {}{direction}", output.human_readable);
    Ok(())
}
