use anyhow::Result;
use clap::Parser;
use std::path::Path;

// Import from auditbook-core
use auditbook_core::{
    compile_sheet, plan_workbook, AuditConfig, Checklist, HttpSheetsClient, RunReport,
    WorkbookBuilder,
};

#[derive(Parser)]
#[command(name = "auditbook")]
#[command(about = "Generate a WCAG audit workbook on a remote spreadsheet service")]
struct Args {
    /// Path to the checklist JSON document
    #[arg(short = 'i', long, default_value = "wcag.json")]
    checklist: String,

    /// Path to the audit config file (YAML format)
    #[arg(short, long)]
    config: String,

    /// Plan the workbook and dump rows + requests as JSON instead of
    /// calling the remote service
    #[arg(long)]
    dry_run: bool,

    /// Directory for dry-run output
    #[arg(long, default_value = "plan_out")]
    plan_dir: String,

    /// OAuth bearer token for the spreadsheet service
    /// If not specified, read from $AUDITBOOK_TOKEN
    #[arg(long)]
    token: Option<String>,

    /// Run report output path (auto-generated if not specified)
    #[arg(short, long)]
    output: Option<String>,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("🦀 Auditbook Workbook Generator");

    if args.show_configs {
        show_help();
        return Ok(());
    }

    // Check if the checklist exists before anything else
    if !Path::new(&args.checklist).exists() {
        println!("⚠️  Checklist not found at: {}", args.checklist);
        println!("   Please check the file path.");
        return Ok(());
    }

    let config = AuditConfig::load_from_file(&args.config)?;
    println!(
        "📋 Loaded config: {} (WCAG {} {}, {} pages)",
        args.config,
        config.version,
        config.level,
        config.pages.len()
    );

    let checklist = Checklist::load_from_file(&args.checklist)?;
    println!(
        "📄 Loaded checklist: {} principles",
        checklist.principles.len()
    );

    if args.dry_run {
        println!("\n🔬 Dry-run mode — planning without remote calls");
        match save_plan(&checklist, &config, &args.plan_dir) {
            Ok(sheet_count) => {
                println!("\n✅ Planned {} sheets, dumped to: {}", sheet_count, args.plan_dir);
            }
            Err(e) => {
                eprintln!("❌ Planning failed: {e}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let token = match args
        .token
        .or_else(|| std::env::var("AUDITBOOK_TOKEN").ok())
        .filter(|t| !t.is_empty())
    {
        Some(token) => token,
        None => {
            eprintln!("❌ No token: pass --token or set $AUDITBOOK_TOKEN");
            std::process::exit(1);
        }
    };

    let mut client = HttpSheetsClient::new(token);
    let mut builder = WorkbookBuilder::new(&mut client, &config);

    match builder.publish(&checklist) {
        Ok(report) => {
            if let Some(url) = &report.spreadsheet_url {
                println!("🔗 {url}");
            }

            let output_path = if let Some(output) = &args.output {
                output.clone()
            } else {
                let checklist_name = Path::new(&args.checklist)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("workbook");
                format!("{checklist_name}_auditbook.json")
            };
            save_report(&report, &output_path)?;
        }
        Err(e) => {
            eprintln!("❌ Workbook build failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Plan every sheet and dump rows + compiled requests as JSON files.
/// Sheet ids are placeholders here: real ids only exist once the remote
/// service assigns them.
fn save_plan(checklist: &Checklist, config: &AuditConfig, output_dir: &str) -> Result<usize> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    let plans = plan_workbook(checklist, config)?;

    for (index, plan) in plans.iter().enumerate() {
        let stem = format!("sheet{}", index + 1);

        let rows_path = format!("{output_dir}/{stem}_rows.json");
        fs::write(&rows_path, serde_json::to_string_pretty(plan)?)?;
        println!("  💾 {} ({} rows)", rows_path, plan.rows.len());

        let layout = compile_sheet(index as i64 + 1, plan, config);
        let layout_path = format!("{output_dir}/{stem}_requests.json");
        fs::write(&layout_path, serde_json::to_string_pretty(&layout)?)?;
        println!("  💾 {}", layout_path);
    }

    Ok(plans.len())
}

fn save_report(report: &RunReport, output_path: &str) -> Result<()> {
    std::fs::write(output_path, serde_json::to_string_pretty(report)?)?;
    println!("💾 Run report saved to: {output_path}");
    Ok(())
}

fn show_help() {
    println!("\n📋 Available Options:");
    println!("  --checklist <path>   Checklist JSON document (default: wcag.json)");
    println!("  --config <path>      Audit config file (YAML)");
    println!("  --dry-run            Plan and dump rows + requests without remote calls");
    println!("  --plan-dir <path>    Dry-run output directory (default: plan_out)");
    println!("  --token <token>      OAuth bearer token (default: $AUDITBOOK_TOKEN)");
    println!("  --output <path>      Run report path (auto-generated if not specified)");

    println!("\n📁 Config file shape:");
    println!("  client: Acme Corp");
    println!("  version: \"2.2\"");
    println!("  level: AAA");
    println!("  pages:");
    println!("    - name: Home");
    println!("      url: https://example.com");
    println!("  folder_id: <optional drive folder>");

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i wcag.json -c audit.yaml --dry-run");
    println!("  cargo run -- -i wcag.json -c audit.yaml --token $TOKEN");
    println!("  cargo run -- -c audit.yaml -o report.json");
}
