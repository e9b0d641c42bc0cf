//! Command-line shell over the purchase ledger.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use purchase_ledger::{
    assemble_document, compute_kpis, distinct_values, export_spreadsheet, format_date,
    format_quantity, parse_date, parse_quantity, review_items, LineItem, LineItemForm,
    OrderDocumentSpec, OrderHeader, OrderSelection, PurchaseRecord, RecordField, RecordFilter,
    RecordId, Store, StoreConfig,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Record purchases and produce spreadsheets and purchase orders.
#[derive(Parser, Debug)]
#[command(name = "purchase-ledger")]
#[command(version)]
struct Cli {
    /// Store directory
    #[arg(long, env = "PURCHASE_LEDGER_STORE", default_value = "./purchases")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one purchase with one or more items
    Record(RecordArgs),

    /// List records with headline numbers
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a record by id
    Delete { id: u64 },

    /// Export records to an .xlsx spreadsheet
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file
        #[arg(short, long, default_value = "purchases.xlsx")]
        out: PathBuf,
    },

    /// Generate a purchase order PDF
    Order(OrderArgs),
}

#[derive(Args, Debug)]
struct RecordArgs {
    #[arg(long)]
    buyer: String,

    /// Purchase date (dd/mm/yyyy or yyyy-mm-dd), defaults to today
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    supplier: String,

    #[arg(long)]
    destination: String,

    /// Line item as "description=quantity"; repeat for more items
    #[arg(long = "item", required = true)]
    items: Vec<String>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    buyer: Option<String>,

    #[arg(long)]
    supplier: Option<String>,

    #[arg(long)]
    destination: Option<String>,

    /// First purchase date, inclusive
    #[arg(long)]
    from: Option<String>,

    /// Last purchase date, inclusive
    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<RecordFilter> {
        Ok(RecordFilter {
            buyer: self.buyer.clone(),
            supplier: self.supplier.clone(),
            destination_city: self.destination.clone(),
            date_from: optional_date(self.from.as_deref())?,
            date_to: optional_date(self.to.as_deref())?,
        })
    }
}

#[derive(Args, Debug)]
struct OrderArgs {
    #[arg(long)]
    supplier: String,

    /// Destination city the records are selected by
    #[arg(long)]
    destination: String,

    /// Destination printed on the order, defaults to --destination
    #[arg(long)]
    pdf_destination: Option<String>,

    #[arg(long)]
    from: Option<String>,

    #[arg(long)]
    to: Option<String>,

    /// Date printed on the order, defaults to today
    #[arg(long)]
    order_date: Option<String>,

    /// Order number
    #[arg(long)]
    number: Option<String>,

    /// Billing identifier (e.g. tax id)
    #[arg(long)]
    billing: Option<String>,

    /// Defaults to the first buyer among the selected records
    #[arg(long)]
    requester: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    /// Directory the PDF is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let store = Store::open_or_create(StoreConfig::at(&cli.store))
        .with_context(|| format!("Failed to open store at {}", cli.store.display()))?;

    match cli.command {
        Command::Record(args) => record(&store, args),
        Command::List { filter, json } => list(&store, &filter, json),
        Command::Delete { id } => delete(&store, id),
        Command::Export { filter, out } => export(&store, &filter, out),
        Command::Order(args) => order(&store, args),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("PURCHASE_LEDGER_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn optional_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    Ok(input.map(parse_date).transpose()?)
}

/// Split "description=quantity" at the last `=`.
fn parse_item(input: &str) -> Result<LineItem> {
    let Some((description, quantity)) = input.rsplit_once('=') else {
        bail!("item {:?} is not in the form description=quantity", input);
    };
    Ok(LineItem::new(description, parse_quantity(quantity)?))
}

fn record(store: &Store, args: RecordArgs) -> Result<()> {
    let mut form = LineItemForm::new(today());
    form.set_buyer(args.buyer);
    form.set_supplier(args.supplier);
    form.set_destination_city(args.destination);
    if let Some(date) = optional_date(args.date.as_deref())? {
        form.set_purchase_date(date);
    }

    for (i, item) in args.items.iter().enumerate() {
        if i > 0 {
            form.add_slot();
        }
        form.set_slot(i, parse_item(item)?)?;
    }

    let records = form.submit(store)?;
    for record in &records {
        println!(
            "#{} {} x {}",
            record.id,
            format_quantity(record.quantity),
            record.item_description
        );
    }
    Ok(())
}

fn list(store: &Store, filter: &FilterArgs, json: bool) -> Result<()> {
    let records = store.load_all()?;
    let selected = filter.to_filter()?.apply(&records);
    let kpis = compute_kpis(selected.iter().copied());

    if json {
        let out = serde_json::json!({ "kpis": kpis, "records": selected });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} records, total quantity {}, {} suppliers, {} items",
        kpis.count,
        format_quantity(kpis.quantity_sum),
        kpis.distinct_supplier_count,
        kpis.distinct_item_count
    );
    for r in &selected {
        println!(
            "{:>6}  {}  {:<16} {:<24} {:<18} {:<28} {:>8}",
            r.id.to_string(),
            format_date(r.purchase_date),
            r.buyer,
            r.supplier,
            r.destination_city,
            r.item_description,
            format_quantity(r.quantity)
        );
    }
    Ok(())
}

fn delete(store: &Store, id: u64) -> Result<()> {
    if store.delete_by_id(RecordId(id))? {
        println!("deleted #{}", id);
    } else {
        println!("no record #{}", id);
    }
    Ok(())
}

fn export(store: &Store, filter: &FilterArgs, out: PathBuf) -> Result<()> {
    let records = store.load_all()?;
    let selected = filter.to_filter()?.apply(&records);

    let bytes = export_spreadsheet(selected.iter().copied())?;
    fs::write(&out, bytes).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("wrote {} records to {}", selected.len(), out.display());
    Ok(())
}

fn order(store: &Store, args: OrderArgs) -> Result<()> {
    let records = store.load_all()?;
    let spec = build_order(&records, &args, today())?;

    let path = args.out_dir.join(spec.file_name());
    fs::write(&path, assemble_document(&spec))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("wrote {} items to {}", spec.items.len(), path.display());
    Ok(())
}

/// Select the records an order covers and build its reviewed document.
fn build_order(records: &[PurchaseRecord], args: &OrderArgs, today: NaiveDate) -> Result<OrderDocumentSpec> {
    let selection = OrderSelection {
        supplier: args.supplier.clone(),
        destination_city: args.destination.clone(),
        date_from: optional_date(args.from.as_deref())?,
        date_to: optional_date(args.to.as_deref())?,
    };
    let selected = selection.to_filter().apply(records);
    if selected.is_empty() {
        bail!(
            "no records for supplier {:?} and destination {:?}",
            selection.supplier,
            selection.destination_city
        );
    }

    let requester = match &args.requester {
        Some(requester) => requester.clone(),
        None => distinct_values(selected.iter().copied(), RecordField::Buyer)
            .into_iter()
            .next()
            .unwrap_or_default(),
    };
    let destination = args
        .pdf_destination
        .clone()
        .unwrap_or_else(|| selection.destination_city.clone());
    let header = OrderHeader {
        order_number: args.number.clone(),
        order_date: optional_date(args.order_date.as_deref())?.unwrap_or(today),
        billing_id: args.billing.clone(),
        requester,
        supplier: selection.supplier.clone(),
        destination,
        notes: args.notes.clone(),
    }
    .normalized();

    let spec = OrderDocumentSpec::from_records(header, selected.iter().copied());
    review_items(&spec.items)?;
    Ok(spec)
}
