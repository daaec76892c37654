use anyhow::{bail, Context, Result};
use billing_service::{
    config::AppConfig,
    observability,
    report::{self, ExportFilter, ReportError, ReportFormat},
    service::{self, BillingService, ServiceError},
    validation::BillingForm,
};
use meter_client::{
    db,
    domain::{format_12_hour, Reading, WindowKind},
};
use std::env;

const USAGE: &str = "usage: billing-service <command>
  submit <block> <meter> <tariff> <vat%> <fee>
  history <block>
  list
  window <day|week|month|year>
  delete <id>
  export [all|day|week|month|year|<block>] [text|csv]
  locale [toggle]";

// Single-threaded runtime: the local UTC offset can only be read safely
// while the process has one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // The fmt subscriber spawns no threads, so the offset read stays sound.
    observability::init_tracing();
    let now = service::local_now();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };
    let rest = &args[1..];

    let cfg = AppConfig::load()?;
    let pool = db::connect(&cfg.database.url, cfg.database.max_connections)
        .await
        .with_context(|| format!("opening {}", cfg.database.url))?;
    let svc = BillingService::new(pool, cfg.blocks.rule());

    match (command.as_str(), rest) {
        ("submit", [block, meter, tariff, vat, fee]) => {
            let form = BillingForm {
                block: block.clone(),
                meter_reading: meter.clone(),
                tariff_rate: tariff.clone(),
                vat_percent: vat.clone(),
                additional_fee: fee.clone(),
            };
            match svc.submit(&form, now).await {
                Ok(sub) => {
                    println!(
                        "Payment: {:.2} Birr (consumption {} since {})",
                        sub.bill.final_payment,
                        report::format_number(sub.bill.consumption),
                        report::format_number(sub.previous_reading),
                    );
                }
                Err(ServiceError::Validation(errors)) => {
                    for e in &errors.0 {
                        eprintln!("{}: {}", e.field.name(), e.kind);
                    }
                    bail!("submission rejected");
                }
                Err(e) => return Err(e.into()),
            }
        }
        ("history", [block]) => {
            if block.trim().is_empty() {
                bail!("block: required");
            }
            let rows = svc.history(block).await?;
            if rows.is_empty() {
                println!("No records found");
            }
            for (r, b) in rows {
                println!(
                    "#{} {} energy {} tariff {} vat {}({}) fee {} total {} {} {}",
                    r.id,
                    r.block_id,
                    report::format_number(r.meter_reading),
                    report::format_number(r.tariff_rate),
                    report::format_number(r.vat_percent),
                    report::format_number(b.vat_amount),
                    report::format_number(r.additional_fee),
                    report::format_number(r.final_payment),
                    r.date,
                    format_12_hour(&r.time),
                );
            }
        }
        ("list", []) => print_rows(&svc.all().await?),
        ("window", [kind]) => {
            let kind: WindowKind = kind.parse()?;
            print_rows(&svc.window(kind, now).await?);
        }
        ("delete", [id]) => {
            let id: i64 = id.parse().with_context(|| format!("invalid id '{id}'"))?;
            if svc.delete(id).await? {
                println!("Deleted: {id}");
            } else {
                println!("Failed to delete: {id}");
            }
        }
        ("export", args) if args.len() <= 2 => {
            let filter = ExportFilter::parse(args.first().map(String::as_str).unwrap_or("all"));
            let format = match args.get(1) {
                Some(f) => f.parse()?,
                None => cfg.export.format,
            };
            export(&svc, &cfg, &filter, format, now).await?;
        }
        ("locale", []) => println!("{}", svc.locale().await?.code()),
        ("locale", [action]) if action == "toggle" => {
            println!("{}", svc.toggle_locale().await?.code());
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

async fn export(
    svc: &BillingService,
    cfg: &AppConfig,
    filter: &ExportFilter,
    format: ReportFormat,
    now: time::PrimitiveDateTime,
) -> Result<()> {
    let locale = svc.locale().await?;
    let renderer = report::renderer_for(format);

    match report::export_report(svc.pool(), filter, now, locale, renderer.as_ref(), &cfg.export.dir).await {
        Ok(path) => println!("Report saved:\n{}", path.display()),
        Err(ReportError::NoData) => println!("No data found"),
        Err(e) => {
            tracing::error!(error = %e, "report export failed");
            bail!("{e}");
        }
    }
    Ok(())
}

fn print_rows(rows: &[Reading]) {
    if rows.is_empty() {
        println!("No records found");
    }
    for r in rows {
        println!(
            "#{} {} energy {} total {} {} {}",
            r.id,
            r.block_id,
            report::format_number(r.meter_reading),
            report::format_number(r.final_payment),
            r.date,
            r.time,
        );
    }
}
