use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use custstore::{Customer, CustomerFields, Query, RecordNotFound, SortField, SortOrder, Store, ValidationErrors};
use eyre::Result;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "custstore")]
#[command(about = "custstore CLI - Customer records kept in a single JSON document")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the store directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    store_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List customers, optionally filtered and sorted
    List {
        /// Case-insensitive text to find in name or store
        #[arg(long)]
        search: Option<String>,

        /// Sort by name, store or location
        #[arg(long)]
        sort: Option<String>,

        /// Sort order: asc or desc
        #[arg(long, default_value = "asc")]
        order: String,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Show one customer
    Show {
        id: u64,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Add a customer
    Add(FieldArgs),

    /// Edit a customer; unspecified fields keep their current value
    ///
    /// The current values are read before the write lock is taken, so the
    /// merge is not atomic: a concurrent edit in between is overwritten.
    Edit {
        id: u64,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a customer
    Delete { id: u64 },

    /// Append customers from another JSON document
    Import { file: PathBuf },
}

#[derive(Args)]
struct FieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    store: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl FieldArgs {
    /// Overlay the given flags on `base`
    fn apply_to(self, mut base: CustomerFields) -> CustomerFields {
        if let Some(v) = self.name {
            base.name = v;
        }
        if let Some(v) = self.store {
            base.store = v;
        }
        if let Some(v) = self.location {
            base.location = v;
        }
        if let Some(v) = self.email {
            base.email = v;
        }
        if let Some(v) = self.phone {
            base.phone = v;
        }
        if self.description.is_some() {
            base.description = self.description;
        }
        base
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
    Yaml,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let store = Store::open(&cli.store_path)?;

    if let Err(e) = run(&store, cli.command) {
        if let Some(errors) = e.downcast_ref::<ValidationErrors>() {
            for error in &errors.errors {
                eprintln!("{} {}: {}", "invalid".red().bold(), error.field, error.message);
            }
            process::exit(1);
        }
        if Store::is_not_found(&e) {
            eprintln!("{} {}", "not found".red().bold(), e);
            process::exit(2);
        }
        return Err(e);
    }

    Ok(())
}

fn run(store: &Store, command: Commands) -> Result<()> {
    match command {
        Commands::List {
            search,
            sort,
            order,
            format,
        } => {
            let sort = match sort {
                Some(field) => Some((field.parse::<SortField>()?, order.parse::<SortOrder>()?)),
                None => None,
            };
            let query = Query { search, sort };
            let customers = store.list(&query);
            print_customers(&customers, format)?;
        }
        Commands::Show { id, format } => {
            let customer = store.get(id).ok_or(RecordNotFound { id })?;
            print_customer(&customer, format)?;
        }
        Commands::Add(args) => {
            let customer = store.create(args.apply_to(CustomerFields::default()))?;
            println!("{} customer {}", "Added".green(), customer.id);
        }
        Commands::Edit { id, fields } => {
            let existing = store.get(id).ok_or(RecordNotFound { id })?;
            let customer = store.update(id, fields.apply_to(CustomerFields::from(&existing)))?;
            println!("{} customer {}", "Updated".green(), customer.id);
        }
        Commands::Delete { id } => {
            let customer = store.delete(id)?;
            println!("{} customer {} ({})", "Deleted".green(), customer.id, customer.name);
        }
        Commands::Import { file } => {
            let count = store.import(&file)?;
            println!("{} {} customers from {}", "Imported".green(), count, file.display());
        }
    }

    Ok(())
}

fn print_customers(customers: &[Customer], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(customers)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(customers)?),
        Format::Table => print_table(customers),
    }
    Ok(())
}

fn print_customer(customer: &Customer, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(customer)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(customer)?),
        Format::Table => {
            let rows = [
                ("id", customer.id.to_string()),
                ("name", customer.name.clone()),
                ("store", customer.store.clone()),
                ("location", customer.location.clone()),
                ("email", customer.email.clone()),
                ("phone", customer.phone.clone()),
                ("description", customer.description.clone().unwrap_or_default()),
            ];
            for (label, value) in rows {
                println!("{:>12}  {}", label.bold(), value);
            }
        }
    }
    Ok(())
}

fn print_table(customers: &[Customer]) {
    if customers.is_empty() {
        println!("{}", "No customers".dimmed());
        return;
    }

    let headers = ["ID", "NAME", "STORE", "LOCATION", "EMAIL", "PHONE"];
    let rows: Vec<[String; 6]> = customers
        .iter()
        .map(|c| {
            [
                c.id.to_string(),
                c.name.clone(),
                c.store.clone(),
                c.location.clone(),
                c.email.clone(),
                c.phone.clone(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = headers
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{:<w$}", h, w = w))
        .collect();
    println!("{}", header.join("  ").bold());

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = w))
            .collect();
        println!("{}", line.join("  "));
    }
}
