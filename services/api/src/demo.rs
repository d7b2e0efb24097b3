use crate::infra::{parse_date, PortalServices, SteppingClock};
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use village_portal::chat::PresenceRegistry;
use village_portal::clock::SystemClock;
use village_portal::config::AppConfig;
use village_portal::error::AppError;
use village_portal::notifications::{Notification, NotificationDispatcher, NotificationError};
use village_portal::residents::{ResidentId, ResidentProfile, ResidentRegistration, ResidentRole};
use village_portal::workflows::certificate::{
    CertificateDecision, CertificateError, CertificateStatusView,
};
use village_portal::workflows::welfare::{WelfareProgram, WelfareSubmission};

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Resident export to load (full_name, nic, date_of_birth, address, ...)
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the walkthrough starts on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Skip the welfare and chat portion of the walkthrough.
    #[arg(long)]
    pub(crate) certificate_only: bool,
}

/// Prints every notification so the walkthrough shows what residents would receive.
#[derive(Debug, Default)]
struct ConsoleDispatcher;

impl NotificationDispatcher for ConsoleDispatcher {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        let details: Vec<String> = notification
            .details
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        println!(
            "    [notify] {} -> {} {}",
            notification.template.label(),
            notification.resident_id,
            details.join(" ")
        );
        Ok(())
    }
}

pub(crate) fn run_resident_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let file = File::open(&args.csv)?;
    let services = PortalServices::in_memory(
        &config,
        Arc::new(SystemClock),
        Arc::new(ConsoleDispatcher),
    );

    let summary = services.directory.import(BufReader::new(file))?;

    println!("Resident import: {}", args.csv.display());
    println!("- {} resident(s) registered", summary.registered);
    if summary.skipped.is_empty() {
        println!("- no rows skipped");
    } else {
        println!("- {} row(s) skipped:", summary.skipped.len());
        for row in &summary.skipped {
            println!("    line {}: {}", row.line, row.reason);
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let start_date = args.start.unwrap_or_else(|| Utc::now().date_naive());
    let start = start_date
        .and_hms_opt(9, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now);
    let clock = Arc::new(SteppingClock::starting_at(start));
    let services = PortalServices::in_memory(&config, clock.clone(), Arc::new(ConsoleDispatcher));
    let cooldown = config.certificate.cooldown_days;

    println!("Village portal walkthrough ({})", config.office.village_name);
    println!("\nResident registration");
    let resident = match services.directory.register(demo_registration(start_date)) {
        Ok(record) => record,
        Err(err) => {
            println!("  Registration rejected: {err}");
            return Ok(());
        }
    };
    println!("- Registered {} as {}", resident.profile.full_name, resident.id);
    let id = resident.id.clone();

    println!("\nCertificate workflow (cooldown {cooldown} days)");
    print_step("request", services.certificates.request(&id));

    clock.advance(Duration::hours(30));
    print_step(
        "officer rejects",
        services.certificates.decide(CertificateDecision {
            resident_id: id.clone(),
            approved: false,
            rejection_reason: Some("Address could not be verified".to_string()),
        }),
    );

    clock.advance(Duration::days(2));
    print_step("request again too early", services.certificates.request(&id));

    clock.advance(Duration::days(i64::from(cooldown)));
    print_step("reapply after cooldown", services.certificates.request(&id));
    print_step(
        "officer approves",
        services.certificates.decide(CertificateDecision {
            resident_id: id.clone(),
            approved: true,
            rejection_reason: None,
        }),
    );

    match services.certificates.document(&id) {
        Ok(document) => {
            println!("- Document {} ({})", document.reference, document.file_name);
            for line in document.body.lines() {
                println!("    | {line}");
            }
        }
        Err(err) => println!("- Document unavailable: {err}"),
    }

    if args.certificate_only {
        return Ok(());
    }

    println!("\nWelfare application");
    let submission = WelfareSubmission {
        program: WelfareProgram::Samurdhi,
        household_monthly_income: 18_500,
        household_size: 4,
        requested_amount: None,
        purpose: Some("Monthly household support".to_string()),
        repayment_months: None,
    };
    match services.welfare.submit(&id, submission) {
        Ok(application) => println!(
            "- {} submitted for {} -> {}",
            application.id,
            application.program.label(),
            application.status.label()
        ),
        Err(err) => println!("- Submission rejected: {err}"),
    }

    println!("\nChat with the officer while they are offline");
    let officer = ResidentId("officer-gn".to_string());
    match services.chat.post(
        "general",
        &id,
        Some(officer.clone()),
        "What are the office hours this week?",
    ) {
        Ok(delivered) => {
            for message in delivered {
                println!("- {}: {}", message.sender, message.body);
            }
        }
        Err(err) => println!("- Message rejected: {err}"),
    }
    println!(
        "- Officer online: {}",
        services.chat.presence().is_online(&officer)
    );

    Ok(())
}

fn print_step(step: &str, outcome: Result<CertificateStatusView, CertificateError>) {
    match outcome {
        Ok(view) => {
            let mut line = format!("- {step}: {} [{}]", view.state.label(), view.badge);
            if let Some(reason) = &view.rejection_reason {
                line.push_str(&format!(" reason=\"{reason}\""));
            }
            if let Some(days) = view.reapply_in_days {
                line.push_str(&format!(" reapply_in={days}d"));
            }
            println!("{line}");
        }
        Err(err) => println!("- {step}: refused ({err})"),
    }
}

fn demo_registration(today: NaiveDate) -> ResidentRegistration {
    let date_of_birth = today
        .with_day(1)
        .and_then(|date| date.checked_sub_signed(Duration::days(365 * 34)))
        .unwrap_or(today);

    ResidentRegistration {
        profile: ResidentProfile {
            full_name: "Nimal Perera".to_string(),
            nic: "199112345678".to_string(),
            date_of_birth,
            address: "14 Temple Road, Kandegedara".to_string(),
            phone: Some("+94771234567".to_string()),
            email: Some("nimal.perera@example.lk".to_string()),
            occupation: Some("Farmer".to_string()),
            emergency_contact: None,
            family_members: Vec::new(),
            conduct: None,
        },
        role: ResidentRole::Resident,
    }
}
