use clap::{Parser, Subcommand};
use contacts_core::{
    config::schema_from_env_value, repositories::FileContactRepository, ContactError, ContactId,
    ContactRepository, ContactSchema, DEFAULT_CONTACTS_DATA_DIR,
};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "contacts")]
#[command(about = "Inspect the contacts file store")]
struct Cli {
    /// Data directory (defaults to CONTACTS_DATA_DIR, then "contacts_data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// YAML schema file (defaults to CONTACTS_SCHEMA_FILE, then the built-in schema)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all contacts, one JSON object per line
    List,
    /// Show one contact
    Show {
        /// Contact id
        id: String,
    },
    /// Print the effective schema as YAML
    Schema,
}

fn load_schema(cli: &Cli) -> Result<ContactSchema, ContactError> {
    match &cli.schema {
        Some(path) => ContactSchema::load(path),
        None => schema_from_env_value(std::env::var("CONTACTS_SCHEMA_FILE").ok()),
    }
}

fn open_store(cli: &Cli) -> Result<FileContactRepository, ContactError> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| {
        std::env::var("CONTACTS_DATA_DIR")
            .unwrap_or_else(|_| DEFAULT_CONTACTS_DATA_DIR.into())
            .into()
    });
    FileContactRepository::open(&data_dir)
}

fn list_contacts(
    store: &dyn ContactRepository,
    schema: &ContactSchema,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let contacts = store.list()?;
    if contacts.is_empty() {
        writeln!(out, "No contacts found.")?;
    }
    for contact in contacts {
        writeln!(out, "{}", contact.to_wire(schema))?;
    }
    Ok(())
}

/// Prints the contact addressed by `raw_id`. Returns `false` when no such contact exists.
fn show_contact(
    store: &dyn ContactRepository,
    schema: &ContactSchema,
    raw_id: &str,
    out: &mut impl Write,
) -> Result<bool, Box<dyn Error>> {
    let Some(id) = ContactId::parse(raw_id) else {
        return Ok(false);
    };
    match store.get(id) {
        Ok(contact) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&contact.to_wire(schema))?)?;
            Ok(true)
        }
        Err(ContactError::NotFound(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::List) => {
            let schema = load_schema(&cli)?;
            list_contacts(&open_store(&cli)?, &schema, &mut stdout)?;
        }
        Some(Commands::Show { id }) => {
            let schema = load_schema(&cli)?;
            if !show_contact(&open_store(&cli)?, &schema, id, &mut stdout)? {
                eprintln!("Contact {} not found", id);
                std::process::exit(1);
            }
        }
        Some(Commands::Schema) => {
            write!(stdout, "{}", load_schema(&cli)?.render()?)?;
        }
        None => {
            println!("Use --help for usage");
        }
    }

    Ok(())
}
