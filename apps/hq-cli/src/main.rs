use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use hq_app::{
    AppConfig, AppError, AppResult, CONFIG_FILE_NAME, ExportMessage, ExportRequest, ReportService,
};
use hq_core::{DocumentFormat, FlowType, ReportId, RoomClass, RoomId, TestId, TestMode};
use hq_criteria::TestData;
use hq_report::{Report, ReportEditor, ReportInfo, RoomDraft};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hq-cli")]
#[command(about = "hvacqual CLI - HVAC cleanroom qualification reports", long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InfoArgs {
    /// Hospital or organization name
    #[arg(long, default_value = "")]
    hospital: String,
    /// Report number
    #[arg(long, default_value = "")]
    number: String,
    /// Measurement date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    tester: String,
    #[arg(long, default_value = "")]
    preparer: String,
    #[arg(long, default_value = "")]
    approver: String,
}

impl From<InfoArgs> for ReportInfo {
    fn from(args: InfoArgs) -> Self {
        ReportInfo {
            hospital_name: args.hospital,
            report_number: args.number,
            measurement_date: args.date,
            tester_name: args.tester,
            preparer_name: args.preparer,
            approver_name: args.approver,
        }
    }
}

#[derive(Args)]
struct RoomArgs {
    /// Room number
    #[arg(long, default_value = "")]
    number: String,
    /// Room name
    #[arg(long, default_value = "")]
    name: String,
    /// Surface area in m²
    #[arg(long, default_value_t = 0.0)]
    area: f64,
    /// Height in m
    #[arg(long, default_value_t = 0.0)]
    height: f64,
    /// at_rest | in_operation
    #[arg(long, default_value = "at_rest")]
    mode: TestMode,
    /// turbulent | laminar | unidirectional
    #[arg(long, default_value = "turbulent")]
    flow: FlowType,
    /// class_ib | class_ii | intensive_care | other
    #[arg(long, default_value = "other")]
    class: RoomClass,
}

impl From<RoomArgs> for RoomDraft {
    fn from(args: RoomArgs) -> Self {
        RoomDraft {
            room_number: args.number,
            name: args.name,
            surface_area_m2: args.area,
            height_m: args.height,
            test_mode: args.mode,
            flow_type: args.flow,
            room_class: args.class,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new report
    Init(InfoArgs),
    /// List reports
    Reports,
    /// Show a report with derived values and verdicts
    Show {
        report_id: ReportId,
        /// Print the stored JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Replace the report header fields
    UpdateInfo {
        report_id: ReportId,
        #[command(flatten)]
        info: InfoArgs,
    },
    /// Add a room to a report
    AddRoom {
        report_id: ReportId,
        #[command(flatten)]
        room: RoomArgs,
    },
    /// Replace a room's fields (tests are kept and re-evaluated)
    UpdateRoom {
        report_id: ReportId,
        room_id: RoomId,
        #[command(flatten)]
        room: RoomArgs,
    },
    /// Move a room to a 1-based position
    MoveRoom {
        report_id: ReportId,
        room_id: RoomId,
        position: usize,
    },
    /// Remove a room and its tests
    RemoveRoom { report_id: ReportId, room_id: RoomId },
    /// Add a test; the payload is JSON, e.g. '{"type":"noise","level_dba":42}'
    AddTest {
        report_id: ReportId,
        room_id: RoomId,
        data: String,
    },
    /// Replace a test payload
    UpdateTest {
        report_id: ReportId,
        room_id: RoomId,
        test_id: TestId,
        data: String,
    },
    /// Remove a test
    RemoveTest {
        report_id: ReportId,
        room_id: RoomId,
        test_id: TestId,
    },
    /// Run the completeness check used before export
    Validate { report_id: ReportId },
    /// Generate a document
    Export {
        report_id: ReportId,
        /// pdf | excel
        #[arg(long, default_value = "pdf")]
        format: DocumentFormat,
    },
    /// List generated documents of a report
    Files { report_id: ReportId },
    /// Delete a report and its file records
    Delete { report_id: ReportId },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_with_env(&cli.config)?;
    let service = ReportService::open(&config)?;

    match cli.command {
        Commands::Init(info) => cmd_init(&service, info.into()),
        Commands::Reports => cmd_reports(&service),
        Commands::Show { report_id, json } => cmd_show(&service, report_id, json),
        Commands::UpdateInfo { report_id, info } => {
            service.update_info(report_id, info.into())?;
            println!("✓ Report updated");
            Ok(())
        }
        Commands::AddRoom { report_id, room } => {
            let room_id = service.add_room(report_id, room.into())?;
            println!("✓ Room added: {}", room_id);
            Ok(())
        }
        Commands::UpdateRoom {
            report_id,
            room_id,
            room,
        } => {
            service.update_room(report_id, room_id, room.into())?;
            println!("✓ Room updated");
            Ok(())
        }
        Commands::MoveRoom {
            report_id,
            room_id,
            position,
        } => {
            if position == 0 {
                return Err(AppError::InvalidInput(
                    "positions start at 1".to_string(),
                ));
            }
            service.move_room(report_id, room_id, position - 1)?;
            println!("✓ Room moved to position {}", position);
            Ok(())
        }
        Commands::RemoveRoom { report_id, room_id } => {
            let room = service.remove_room(report_id, room_id)?;
            println!("✓ Removed room {} ({} tests)", room.label(), room.tests().len());
            Ok(())
        }
        Commands::AddTest {
            report_id,
            room_id,
            data,
        } => {
            let test_id = service.add_test(report_id, room_id, parse_test_data(&data)?)?;
            println!("✓ Test added: {}", test_id);
            Ok(())
        }
        Commands::UpdateTest {
            report_id,
            room_id,
            test_id,
            data,
        } => {
            service.update_test(report_id, room_id, test_id, parse_test_data(&data)?)?;
            println!("✓ Test updated");
            Ok(())
        }
        Commands::RemoveTest {
            report_id,
            room_id,
            test_id,
        } => {
            let test = service.remove_test(report_id, room_id, test_id)?;
            println!("✓ Removed {} #{}", test.kind().label(), test.index());
            Ok(())
        }
        Commands::Validate { report_id } => cmd_validate(&service, report_id),
        Commands::Export { report_id, format } => {
            cmd_export(&service, &config.output_dir, report_id, format)
        }
        Commands::Files { report_id } => cmd_files(&service, &config.output_dir, report_id),
        Commands::Delete { report_id } => {
            if service.delete(report_id)? {
                println!("✓ Report deleted");
            } else {
                println!("No report with id {}", report_id);
            }
            Ok(())
        }
    }
}

fn parse_test_data(json: &str) -> AppResult<TestData> {
    serde_json::from_str(json)
        .map_err(|e| AppError::InvalidInput(format!("Invalid test payload: {}", e)))
}

fn cmd_init(service: &ReportService, info: ReportInfo) -> AppResult<()> {
    let report = service.create(info)?;
    println!("✓ Report created: {}", report.id());
    Ok(())
}

fn cmd_reports(service: &ReportService) -> AppResult<()> {
    let reports = service.list()?;
    if reports.is_empty() {
        println!("No reports");
        return Ok(());
    }
    println!("Reports:");
    for r in reports {
        println!(
            "  {}  {} - {} ({} rooms, {} tests, updated {})",
            r.id,
            r.report_number,
            r.hospital_name,
            r.room_count,
            r.test_count,
            r.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn verdict(pass: bool) -> &'static str {
    if pass { "PASS" } else { "FAIL" }
}

fn cmd_show(service: &ReportService, report_id: ReportId, json: bool) -> AppResult<()> {
    let report = service.get(report_id)?;
    if json {
        let content = hq_report::to_json_string(&report)?;
        println!("{}", content);
        return Ok(());
    }
    print_report(service, &report);
    Ok(())
}

fn print_report(service: &ReportService, report: &Report) {
    let info = report.info();
    println!("Report {} ({})", info.report_number, report.id());
    println!("  Hospital: {}", info.hospital_name);
    match info.measurement_date {
        Some(date) => println!("  Measured: {}", date),
        None => println!("  Measured: -"),
    }
    println!("  Tester: {}", info.tester_name);

    let verdicts = ReportEditor::new(service.criteria()).room_verdicts(report);
    for (i, (room, room_verdict)) in report.rooms().iter().zip(&verdicts).enumerate() {
        println!();
        println!(
            "{}. {} {} [{}]  id={}",
            i + 1,
            room.room_number(),
            room.name(),
            verdict(room_verdict.meets_criteria),
            room.id()
        );
        println!(
            "   {} | {} | {} | {:.2} m² x {:.2} m = {:.2} m³",
            room.room_class().label(),
            room.test_mode().label(),
            room.flow_type().label(),
            room.surface_area_m2(),
            room.height_m(),
            room.display_volume()
        );
        for test in room.tests() {
            println!(
                "   - {} #{} [{}]  id={}",
                test.kind().label(),
                test.index(),
                verdict(test.meets_criteria()),
                test.id()
            );
            println!("     {}", test.criteria());
        }
    }
}

fn cmd_validate(service: &ReportService, report_id: ReportId) -> AppResult<()> {
    let outcome = service.validate(report_id)?;
    if outcome.valid {
        println!("✓ Report is complete");
    } else {
        println!("Report is incomplete:");
        for error in &outcome.errors {
            println!("  - {}", error);
        }
    }
    Ok(())
}

fn cmd_export(
    service: &ReportService,
    output_dir: &Path,
    report_id: ReportId,
    format: DocumentFormat,
) -> AppResult<()> {
    let handle = service
        .exporter(output_dir)
        .start(ExportRequest { report_id, format })?;

    let result = loop {
        match handle.messages().recv() {
            Ok(ExportMessage::Stage { stage, .. }) => {
                print!("\r{:<40}", stage.label());
                let _ = io::stdout().flush();
            }
            Ok(ExportMessage::Finished(result)) => break result,
            Err(_) => break Err(hq_app::ExportError::WorkerLost),
        }
    };
    print!("\r{:<40}\r", "");
    let _ = io::stdout().flush();

    let outcome = result?;
    println!("✓ {} written: {}", format.label(), outcome.path.display());
    println!("  {} bytes, sha256 {}", outcome.record.size_bytes, outcome.record.sha256);
    Ok(())
}

fn cmd_files(service: &ReportService, output_dir: &Path, report_id: ReportId) -> AppResult<()> {
    let files = service.files(report_id)?;
    if files.is_empty() {
        println!("No generated files");
        return Ok(());
    }
    for format in DocumentFormat::ALL {
        if let Some(record) = files.get(format) {
            println!(
                "  {:<6} {}  {} bytes  {}",
                format.label(),
                output_dir.join(&record.file_name).display(),
                record.size_bytes,
                record.created_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
    Ok(())
}
