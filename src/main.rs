use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use patrol_duty::adapters::google_calendar::SCHEDULE_MAX_RESULTS;
use patrol_duty::adapters::{GoogleCalendarClient, SheetCsvSource, TraccarClient};
use patrol_duty::config::Command;
use patrol_duty::core::allow_list::authorize_cron;
use patrol_duty::core::schedule::{build_schedule, parse_range};
use patrol_duty::core::vacation::{VacationEvent, VacationRequest};
use patrol_duty::core::{geofence, CachedCalendarStatus, CachedPosition, Clock, SystemClock};
use patrol_duty::domain::model::{DutyStatus, LocationPoint, RefreshResponse};
use patrol_duty::domain::ports::{CalendarStatusSource, PositionSource};
use patrol_duty::utils::error::ErrorSeverity;
use patrol_duty::utils::{logger, validation::Validate};
use patrol_duty::{AllowList, CliConfig, DutyStatusAggregator, PatrolConfig, PatrolError};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Stand-in tracker when no Traccar server is configured.
struct NoTracker;

#[async_trait]
impl PositionSource for NoTracker {
    async fn latest(&self) -> patrol_duty::Result<Option<LocationPoint>> {
        Ok(None)
    }
}

fn print_json<T: Serialize>(value: &T) -> patrol_duty::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn calendar_client(config: &PatrolConfig, clock: Arc<dyn Clock>) -> patrol_duty::Result<GoogleCalendarClient> {
    GoogleCalendarClient::new(config.calendar()?, clock)
}

/// Status reads go through the 60 s cache, as the position lookup does.
fn cached_calendar(
    config: &PatrolConfig,
    clock: Arc<dyn Clock>,
) -> patrol_duty::Result<Arc<CachedCalendarStatus>> {
    let client = calendar_client(config, clock.clone())?;
    Ok(Arc::new(CachedCalendarStatus::new(Arc::new(client), clock)))
}

fn allow_list(config: &PatrolConfig, clock: Arc<dyn Clock>) -> patrol_duty::Result<AllowList> {
    let source = SheetCsvSource::new(config.allow_list()?)?;
    Ok(AllowList::new(Arc::new(source), clock))
}

async fn run(command: Command, config: &PatrolConfig) -> patrol_duty::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match command {
        Command::DutyStatus => {
            let calendar = cached_calendar(config, clock)?;
            let positions: Arc<dyn PositionSource> = match &config.traccar {
                Some(traccar) => Arc::new(TraccarClient::new(traccar)),
                None => {
                    tracing::warn!("⚠️ Traccar not configured, duty status will use the calendar only");
                    Arc::new(NoTracker)
                }
            };

            let aggregator = DutyStatusAggregator::new(config.home_base_zone()?, calendar, positions);
            match aggregator.status().await {
                Ok(status) => print_json(&status),
                Err(e) => {
                    print_json(&DutyStatus::unavailable("Unable to verify calendar status"))?;
                    Err(e)
                }
            }
        }
        Command::Status => {
            let calendar = cached_calendar(config, clock)?;
            print_json(&calendar.current_status().await?)
        }
        Command::Position => {
            let calendar = cached_calendar(config, clock.clone())?;
            let tracker = Arc::new(TraccarClient::new(config.traccar()?));
            let positions = CachedPosition::new(calendar, tracker, clock);

            match positions.latest().await? {
                Some(point) => print_json(&json!({
                    "lat": point.latitude(),
                    "lon": point.longitude(),
                    "at": point.observed_at(),
                })),
                None => {
                    tracing::warn!("GPS location data is not currently available");
                    print_json(&serde_json::Value::Null)
                }
            }
        }
        Command::Schedule { start, end } => {
            let calendar = calendar_client(config, clock)?;
            let (start, end) = parse_range(&start, &end, calendar.offset())?;
            let events = calendar.list_events(start, end, SCHEDULE_MAX_RESULTS).await?;
            let rows = build_schedule(&events, calendar.offset());
            tracing::info!("📅 {} patrol shifts between {} and {}", rows.len(), start, end);
            print_json(&json!({ "events": rows }))
        }
        Command::Distance { lat, lon } => {
            let point = LocationPoint::new(lat, lon, Utc::now())?;
            print_json(&geofence::evaluate(&point, &config.home_base_zone()?))
        }
        Command::CheckEmail { email } => {
            let allowed = allow_list(config, clock)?.is_authorized(&email).await;
            print_json(&json!({ "email": email, "authorized": allowed }))
        }
        Command::RefreshEmails { authorization } => {
            authorize_cron(authorization.as_deref(), config.cron_secret())?;
            let report = allow_list(config, clock)?.refresh().await?;
            print_json(&RefreshResponse::from(report))
        }
        Command::Vacation {
            first_name,
            last_name,
            address,
            start_date,
            end_date,
            primary_contact,
            secondary_contact,
            dry_run,
        } => {
            let request = VacationRequest {
                first_name,
                last_name,
                address,
                start_date,
                end_date,
                primary_contact,
                secondary_contact,
            };
            let event = VacationEvent::from_request(&request.validate()?)?;

            if dry_run {
                tracing::info!("Dry run, vacation event not submitted");
                return print_json(&event);
            }

            let vacation = config.vacation()?;
            let token = vacation
                .access_token
                .as_deref()
                .ok_or_else(|| PatrolError::MissingConfigError {
                    field: "GOOGLE_ACCESS_TOKEN".to_string(),
                })?;
            let calendar = calendar_client(config, clock)?;
            let inserted = calendar
                .insert_event(&vacation.calendar_id, &event, token)
                .await?;
            print_json(&json!({
                "success": true,
                "message": "Vacation watch request submitted successfully",
                "eventId": inserted.id,
                "eventLink": inserted.html_link,
            }))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting patrol-duty CLI");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match cli.load_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command.clone(), &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
