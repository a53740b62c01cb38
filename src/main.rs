use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use customer_map::assets::ImageAssetStore;
use customer_map::config::{Config, FileConfig};
use customer_map::flow::{self, CaptureForm, ImageUpload};
use customer_map::error::ValidationError;
use customer_map::geo::{capture_provider, ManualEntry};
use customer_map::map::{marker_color, render_document};
use customer_map::state::{CustomerType, LocationRepository};
use customer_map::Error;

#[derive(Parser, Debug)]
#[command(name = "customer-map", version, about = "Capture customer visit locations and map them")]
struct CliArgs {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the database and images
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema and image directory
    Init,
    /// Record a customer visit at the current location
    Capture(CaptureArgs),
    /// Print every stored customer
    List,
    /// Write the customer network map as an HTML page
    Map {
        #[arg(long, short, default_value = "customer_map.html")]
        output: PathBuf,
    },
    /// List stored images that no customer record points at
    Orphans,
}

#[derive(Args, Debug)]
struct CaptureArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    /// Prospect, Existing, VIP or Repeat
    #[arg(long = "type")]
    customer_type: String,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Photo of the storefront or customer
    #[arg(long)]
    image: Option<PathBuf>,
    /// Manual latitude; with --lon it takes priority over the device fix
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Manual longitude; with --lat it takes priority over the device fix
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
}

/// Handles owned by one CLI invocation
struct App {
    config: Config,
    repository: LocationRepository,
    assets: ImageAssetStore,
}

impl App {
    fn open(cli_args: &CliArgs) -> Result<Self> {
        let file_config = match &cli_args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let config = Config::resolve(cli_args.data_dir.clone(), file_config)?;

        let repository = LocationRepository::open(&config.db_path)?;
        let assets = ImageAssetStore::open(&config.assets_dir)?;

        Ok(App {
            config,
            repository,
            assets,
        })
    }

    fn capture(&self, args: CaptureArgs) -> Result<()> {
        let image = args.image.as_deref().map(read_upload).transpose()?;
        let form = CaptureForm {
            name: args.name,
            phone: args.phone,
            customer_type: args.customer_type,
            address: args.address,
            notes: args.notes,
            image,
        };
        let provider = capture_provider(ManualEntry::new(args.lat, args.lon));

        match flow::capture(provider.as_ref(), &self.assets, &self.repository, form) {
            Ok(id) => {
                println!("✅ Customer saved with id {}", id);
                Ok(())
            }
            Err(Error::Validation(err @ ValidationError::UnknownCustomerType(_))) => {
                let known = CustomerType::KNOWN;
                let names: Vec<&str> = known.iter().map(CustomerType::as_str).collect();
                anyhow::bail!("Please fix the form: {} (expected one of {})", err, names.join(", "))
            }
            Err(Error::Validation(err)) => {
                anyhow::bail!("Please fix the form: {}", err)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn list(&self) -> Result<()> {
        let records = self.repository.load_all()?;
        if records.is_empty() {
            println!("No customers in your network yet.");
            return Ok(());
        }

        for record in records {
            println!(
                "{:>4}  {:<24} {:<12} {:<9} {:<6} {}  {}",
                record.id.0,
                record.name,
                record.phone,
                record.customer_type.as_str(),
                marker_color(&record.customer_type).as_str(),
                record.coordinate,
                record.last_visit(),
            );
        }
        Ok(())
    }

    fn map(&self, output: &Path) -> Result<()> {
        let view = flow::view(&self.repository, &self.assets, &self.config)?;
        let html = render_document(&view, &self.config.map);
        std::fs::write(output, html)
            .with_context(|| format!("Failed to write map to {}", output.display()))?;
        println!("🗺️  Map written to {}", output.display());
        Ok(())
    }

    fn orphans(&self) -> Result<()> {
        let referenced = self.repository.referenced_assets()?;
        let orphans = self.assets.orphans(&referenced)?;
        for orphan in &orphans {
            println!("{}", self.assets.dir().join(orphan.as_str()).display());
        }
        println!("{} unreferenced image(s)", orphans.len());
        Ok(())
    }
}

fn read_upload(path: &Path) -> Result<ImageUpload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(ImageUpload { bytes, extension })
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let app = App::open(&cli_args)?;
    let count = app.repository.count()?;
    tracing::debug!("Customer map initialized with {} customers", count);

    match cli_args.command {
        Command::Init => {
            println!(
                "Ready. {} customers in {}, images in {}",
                count,
                app.repository.path().display(),
                app.assets.dir().display()
            );
            Ok(())
        }
        Command::Capture(args) => app.capture(args),
        Command::List => app.list(),
        Command::Map { output } => app.map(&output),
        Command::Orphans => app.orphans(),
    }
}
