use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attendance_ledger::chain::AttendanceStatus;
use attendance_ledger::config::LedgerConfig;
use attendance_ledger::ledger::{EntityListing, LedgerService};

#[derive(Parser)]
#[command(
    name = "attendance-ledger",
    about = "Tamper-evident attendance ledger on hierarchical proof-of-work hash chains"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed a fresh hierarchy of departments, classes and students
    Seed {
        #[arg(long, default_value_t = 2)]
        departments: usize,
        #[arg(long, default_value_t = 5)]
        classes: usize,
        #[arg(long, default_value_t = 35)]
        students: usize,
    },
    /// Re-derive and check every chain and cross-level linkage
    Validate,
    /// Show one entity by id, or all departments when no id is given
    Show { entity_id: Option<String> },
    /// Create a department
    CreateDepartment { name: String },
    /// Create a class under a department
    CreateClass {
        department_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Create a student under a class
    CreateStudent {
        department_id: String,
        class_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        roll: Option<String>,
    },
    /// Mark attendance for a student (Present, Absent or Leave)
    Mark { student_id: String, status: String },
    /// List attendance marks: today's by default, or filtered by entity
    Attendance {
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        class: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attendance_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = LedgerConfig::load().map_err(|e| anyhow::anyhow!("configuration error: {}", e))?;
    info!(path = %config.data_path.display(), difficulty = config.difficulty, "opening ledger");
    let mut service = LedgerService::open(&config)?;

    match cli.command {
        Command::Seed {
            departments,
            classes,
            students,
        } => {
            service.seed(departments, classes, students).await?;
            println!(
                "seeded {} department(s), {} class(es) each, {} student(s) per class",
                departments, classes, students
            );
        }
        Command::Validate => {
            let report = service.validate();
            println!("{}", serde_json::to_string_pretty(&report)?);
            eprintln!("{}", report.summary());
            if !report.valid {
                std::process::exit(1);
            }
        }
        Command::Show { entity_id } => match entity_id {
            Some(id) => match service.ledger().find(&id) {
                Some((level, record)) => {
                    let listing = EntityListing::from(record);
                    let out = json!({
                        "type": level,
                        "id": listing.id,
                        "meta": listing.meta,
                        "latest_hash": listing.latest_hash,
                        "blocks": record.chain.len(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                None => anyhow::bail!("no entity with id {}", id),
            },
            None => {
                let listings = service.ledger().department_listings();
                println!("{}", serde_json::to_string_pretty(&listings)?);
            }
        },
        Command::CreateDepartment { name } => {
            let id = service.create_department(name).await?;
            println!("{}", id);
        }
        Command::CreateClass {
            department_id,
            name,
        } => {
            let id = service.create_class(department_id, name).await?;
            println!("{}", id);
        }
        Command::CreateStudent {
            department_id,
            class_id,
            name,
            roll,
        } => {
            let id = service
                .create_student(department_id, class_id, name, roll)
                .await?;
            println!("{}", id);
        }
        Command::Mark { student_id, status } => {
            let status: AttendanceStatus = status.parse()?;
            let block = service.mark_attendance(student_id, status).await?;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
        Command::Attendance { department, class } => {
            let ledger = service.ledger();
            let records = if let Some(class_id) = class {
                ledger.attendance_for_class(&class_id)
            } else if let Some(dept_id) = department {
                ledger.attendance_for_department(&dept_id)
            } else {
                ledger.attendance_on(Utc::now().date_naive())
            };
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}
