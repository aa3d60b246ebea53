use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tracing::info;

use leaveflow::config::AppConfig;
use leaveflow::error::AppError;
use leaveflow::telemetry;
use leaveflow::workflows::leave::{
    leave_router, ApprovalPolicy, ApproverRole, Decision, DecisionPayload, DocumentDescriptor,
    Employee, EmployeeId, EmploymentStatus, Gender, LeaveCategory, LeaveRecord, LeaveSubmission,
    LeaveType, LeaveWorkflowService, LogNotificationPublisher, MemoryEmployeeDirectory,
    MemoryLeaveRepository, WorkflowError,
};

type DemoService =
    LeaveWorkflowService<MemoryLeaveRepository, MemoryEmployeeDirectory, LogNotificationPublisher>;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Leave Workflow Orchestrator",
    about = "Demonstrate and run the HR leave approval workflow service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a leave request through its approval chain for stakeholder demos
    Leave {
        #[command(subcommand)]
        command: LeaveCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum LeaveCommand {
    /// Submit a five-day medical leave and drive it to final approval
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Leave start date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Leave {
            command: LeaveCommand::Demo(args),
        } => run_leave_demo(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let service = Arc::new(build_service());

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(leave_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "leave workflow orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Compose the workflow service around in-memory collaborators. The employee
/// directory stands in for the external HR store, so it is seeded with demo
/// staff records.
fn build_service() -> DemoService {
    let repository = Arc::new(MemoryLeaveRepository::default());
    let directory = Arc::new(MemoryEmployeeDirectory::default());
    seed_directory(&directory);
    LeaveWorkflowService::new(
        repository,
        directory,
        Arc::new(LogNotificationPublisher),
        ApprovalPolicy::default(),
    )
}

fn seed_directory(directory: &MemoryEmployeeDirectory) {
    let mut balance = BTreeMap::new();
    balance.insert(LeaveType::Annual, 18);
    balance.insert(LeaveType::Sick, 10);
    balance.insert(LeaveType::Medical, 20);

    directory.upsert(Employee {
        id: EmployeeId("emp-1001".to_string()),
        name: "Ayesha Rahman".to_string(),
        gender: Gender::Female,
        employment_status: EmploymentStatus::Confirmed,
        leave_balance: balance.clone(),
    });
    directory.upsert(Employee {
        id: EmployeeId("emp-1002".to_string()),
        name: "Farhan Kabir".to_string(),
        gender: Gender::Male,
        employment_status: EmploymentStatus::Confirmed,
        leave_balance: balance.clone(),
    });
    directory.upsert(Employee {
        id: EmployeeId("emp-1003".to_string()),
        name: "Nusrat Jahan".to_string(),
        gender: Gender::Female,
        employment_status: EmploymentStatus::Probation,
        leave_balance: balance,
    });
}

fn run_leave_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_service();
    let start = args.start.unwrap_or_else(|| Local::now().date_naive());

    println!("Leave workflow demo");
    println!("Five-day medical leave starting {start}");

    let record = drive_demo(&service, start)?;

    println!("\nDecision trail");
    for entry in &record.history {
        let role = entry.role.map(ApproverRole::label).unwrap_or("Employee");
        let comment = entry
            .comment
            .as_deref()
            .map(|comment| format!(": {comment}"))
            .unwrap_or_default();
        println!(
            "- {} by {} ({}){}",
            entry.action.label(),
            entry.actor,
            role,
            comment
        );
    }

    let view = record.status_view();
    println!(
        "\nFinal status: {} ({} paid / {} unpaid, category {})",
        view.status,
        view.paid_days.unwrap_or(0),
        view.unpaid_days.unwrap_or(0),
        view.category.unwrap_or("n/a"),
    );

    Ok(())
}

fn drive_demo(service: &DemoService, start: NaiveDate) -> Result<LeaveRecord, WorkflowError> {
    let record = service.submit(LeaveSubmission {
        employee_id: EmployeeId("emp-1001".to_string()),
        leave_type: LeaveType::Medical,
        start_date: start,
        end_date: start + Duration::days(4),
        reason: "Post-surgery recovery".to_string(),
        documents: vec![DocumentDescriptor {
            name: "Medical certificate".to_string(),
            storage_key: "s3://leaveflow/docs/emp-1001/certificate.pdf".to_string(),
        }],
        approval_chain: vec![
            ApproverRole::Hod,
            ApproverRole::Dean,
            ApproverRole::President,
        ],
    })?;
    println!("Submitted as {}", record.request.id);

    for (role, decided_by) in [
        (ApproverRole::Hod, "Prof. S. Alam"),
        (ApproverRole::Dean, "Dean R. Chowdhury"),
    ] {
        let forwarded = service.submit_decision(
            &record.request.id,
            role,
            Decision::Approve,
            DecisionPayload {
                decided_by: decided_by.to_string(),
                comment: Some("Recommended".to_string()),
                paid_days: None,
                unpaid_days: None,
                category: None,
            },
        )?;
        println!(
            "{} approved; status {}, awaiting {}",
            role.label(),
            forwarded.request.status.label(),
            forwarded
                .request
                .awaiting_role()
                .map(ApproverRole::label)
                .unwrap_or("nobody"),
        );
    }

    let approved = service.submit_decision(
        &record.request.id,
        ApproverRole::President,
        Decision::Approve,
        DecisionPayload {
            decided_by: "President M. Haque".to_string(),
            comment: Some("Approved with pay split".to_string()),
            paid_days: Some(3),
            unpaid_days: Some(2),
            category: Some(LeaveCategory::MedicalPaid),
        },
    )?;
    println!(
        "{} approved with 3 paid / 2 unpaid",
        ApproverRole::President.label()
    );

    Ok(approved)
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
