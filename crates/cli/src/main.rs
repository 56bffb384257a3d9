use clap::{Args, Parser, Subcommand};
use lablink_client::{HttpLabSearchBackend, LabSearch};
use lablink_core::{
    filter_catalog, rank_by_distance, whatsapp_link, Catalog, CategoryFilter, GeoPoint,
    LabSearchParams, LabSearchResult, LocationBias, NonEmptyText,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lablink")]
#[command(about = "LabLink lab finder CLI")]
struct Cli {
    /// Base URL of a running LabLink REST server
    #[arg(long, env = "LABLINK_SERVER_URL", default_value = "http://localhost:3000")]
    server: String,
    /// Catalog override file (YAML)
    #[arg(long, env = "LABLINK_CATALOG_FILE")]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search labs by area or keyword
    Search(SearchArgs),
    /// List catalog tests
    Tests {
        /// Category name, or "All"
        #[arg(long)]
        category: Option<String>,
        /// Text to look for in names and descriptions
        #[arg(long, default_value = "")]
        query: String,
    },
    /// List test packages
    Packages {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        query: String,
        /// Only popular packages
        #[arg(long)]
        popular: bool,
    },
    /// Print a WhatsApp link for a lab phone number
    Whatsapp {
        phone: String,
        /// Prefilled message
        #[arg(long)]
        text: Option<String>,
    },
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    keyword: Option<String>,
    /// Place type substring, e.g. medical_lab
    #[arg(long = "type")]
    place_type: Option<String>,
    #[arg(long)]
    open_now: bool,
    /// Minimum rating (0-5)
    #[arg(long)]
    rating: Option<f64>,
    /// Your latitude; with --lng, results are ranked by distance
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,
    /// Bias the search around --lat/--lng instead of ranking only
    #[arg(long)]
    near: bool,
    /// Number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: u32,
    /// Only show labs whose name contains this text
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lablink=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Search(args)) => search(&cli.server, args).await?,
        Some(Commands::Tests { category, query }) => {
            let catalog = Catalog::load(cli.catalog.as_deref())?;
            let category = CategoryFilter::parse(category.as_deref());
            let tests = filter_catalog(catalog.tests(), &category, &query);
            if tests.is_empty() {
                println!("No tests found.");
            }
            for test in tests {
                println!(
                    "{:<16} {:<36} {:<22} {}",
                    test.id, test.name, test.category, test.turnaround_time
                );
            }
        }
        Some(Commands::Packages {
            category,
            query,
            popular,
        }) => {
            let catalog = Catalog::load(cli.catalog.as_deref())?;
            let source = if popular {
                catalog.popular_packages()
            } else {
                catalog.packages().to_vec()
            };
            let category = CategoryFilter::parse(category.as_deref());
            for package in filter_catalog(&source, &category, &query) {
                let tests: Vec<String> = catalog
                    .resolve_package(&package)
                    .into_iter()
                    .map(|t| t.name)
                    .collect();
                println!(
                    "{} ({}) NGN {} [{}]",
                    package.name,
                    package.id,
                    package.discounted_price(),
                    tests.join(", ")
                );
            }
        }
        Some(Commands::Whatsapp { phone, text }) => match whatsapp_link(&phone, text.as_deref()) {
            Some(link) => println!("{link}"),
            None => anyhow::bail!("'{phone}' contains no digits"),
        },
        None => {
            println!("Use 'lablink --help' for commands");
        }
    }

    Ok(())
}

async fn search(server: &str, args: SearchArgs) -> anyhow::Result<()> {
    let user = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)?),
        _ => None,
    };

    let params = LabSearchParams {
        city: NonEmptyText::optional(args.city),
        state: NonEmptyText::optional(args.state),
        keyword: NonEmptyText::optional(args.keyword),
        place_type: NonEmptyText::optional(args.place_type),
        open_now: args.open_now,
        min_rating: args.rating,
        near: user.filter(|_| args.near).map(LocationBias::around),
        page_token: None,
    };

    let backend = HttpLabSearchBackend::new(server, Duration::from_secs(30))?;
    let labs = LabSearch::new(backend);

    labs.search(params).await;
    for _ in 1..args.pages {
        if labs.snapshot().next_page_token.is_none() {
            break;
        }
        labs.load_more().await;
    }

    let state = labs.snapshot();
    if let Some(error) = state.error {
        anyhow::bail!("lab search failed: {error}");
    }

    let shown = match args.name.as_deref() {
        Some(name) => rank_by_distance(labs.filter_by_name(name), user),
        None => labs.ranked(user),
    };

    if shown.is_empty() {
        println!("No labs found.");
    }
    for lab in &shown {
        print_lab(lab);
    }
    if state.next_page_token.is_some() {
        println!("(more results available, use --pages to fetch them)");
    }
    Ok(())
}

fn print_lab(lab: &LabSearchResult) {
    let distance = lab
        .distance_km
        .map(|d| format!("{d:.1} km"))
        .unwrap_or_else(|| "-".into());
    let open = match lab.open_now {
        Some(true) => "open",
        Some(false) => "closed",
        None => "hours unknown",
    };
    println!(
        "{:<40} {:>3.1} ({:>4}) {:>9}  {}",
        lab.name, lab.rating, lab.review_count, distance, open
    );
    if !lab.address.is_empty() {
        println!("    {}", lab.address);
    }
    if let Some(phone) = &lab.phone {
        println!("    {phone}");
    }
    if let Some(website) = &lab.website {
        println!("    {website}");
    }
}
