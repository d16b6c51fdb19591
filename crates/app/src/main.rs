//! Ombaro Application CLI

use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::civil::time;
use ombaro::{
    catalog::ProviderCatalog,
    checkout::{CustomerInfo, HomeAddress, ServiceType},
    orders::PaymentMethod,
    pricing::{PricingError, to_money},
};
use ombaro_app::{
    config::AppConfig,
    context::{AppContext, AppInitError},
    lifecycle::OrderView,
    observability::{ObservabilityError, init_logging},
    session::SessionError,
    shutdown::{self, ShutdownSignalError},
};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "ombaro-app", about = "Ombaro booking CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List providers and the services they offer
    Catalog,

    /// Run a scripted booking and follow the order
    Demo(DemoArgs),
}

#[derive(Debug, Args)]
struct DemoArgs {
    /// Where the service takes place (at_home, visit_spa)
    #[arg(long, default_value = "at_home")]
    service_type: ServiceType,

    /// Payment method
    #[arg(long, value_enum, default_value_t = Method::Upi)]
    method: Method,

    /// Provider to book from; defaults to the first available provider
    #[arg(long)]
    provider: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Card,
    Upi,
    Wallet,
}

impl From<Method> for PaymentMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Card => PaymentMethod::Card,
            Method::Upi => PaymentMethod::Upi,
            Method::Wallet => PaymentMethod::Wallet,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Init(#[from] AppInitError),

    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Shutdown(#[from] ShutdownSignalError),

    #[error("invalid date: {0}")]
    Date(#[from] jiff::Error),

    #[error("no available provider named '{0}'")]
    NoProvider(String),
}

#[tokio::main]
pub async fn main() {
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    init_logging(&cli.config.logging)?;

    let ctx = AppContext::from_config(&cli.config)?;

    info!(?ctx, "application context ready");

    match cli.command {
        Commands::Catalog => print_catalog(&ctx),
        Commands::Demo(args) => demo(&ctx, args).await,
    }
}

fn print_catalog(ctx: &AppContext) -> Result<(), CliError> {
    for provider in ctx.catalog.providers() {
        let availability = if provider.is_available {
            ""
        } else {
            " (unavailable)"
        };

        println!(
            "{} [{}] {:.1}★ {:.1} km{availability}",
            provider.name, provider.id, provider.rating, provider.distance_km
        );
        println!("  {}", provider.location.address);

        for service in ctx.catalog.services_for(&provider.id).unwrap_or_default() {
            println!(
                "  - {} [{}] {} min, {}",
                service.name,
                service.id,
                service.duration_minutes,
                to_money(service.price, ctx.currency)?
            );
        }
    }

    Ok(())
}

async fn demo(ctx: &AppContext, args: DemoArgs) -> Result<(), CliError> {
    let provider = ctx
        .catalog
        .providers()
        .filter(|provider| provider.is_available)
        .find(|provider| {
            args.provider
                .as_deref()
                .is_none_or(|id| provider.id.as_str() == id)
        })
        .cloned()
        .ok_or_else(|| CliError::NoProvider(args.provider.clone().unwrap_or_default()))?;

    let mut session = ctx.session();
    let mut updates = ctx.lifecycle.subscribe();

    for service in provider.services.iter().take(2) {
        session.add_to_cart(service, &provider.id);
    }

    let totals = session.totals();

    println!(
        "Cart: {} item(s), {}, {}",
        session.cart().len(),
        to_money(totals.amount, ctx.currency)?,
        totals.duration_label()
    );

    session.set_service_type(args.service_type)?;
    session.set_schedule(ctx.clock.today().tomorrow()?, time(11, 0, 0, 0))?;
    session.set_customer(CustomerInfo {
        name: "Priya Sharma".to_string(),
        phone: "+91 98450 12345".to_string(),
    })?;
    session.set_address(HomeAddress {
        street: "221 Residency Road".to_string(),
        area: "Shanthala Nagar".to_string(),
        landmark: None,
        city: "Bengaluru".to_string(),
        pincode: "560025".to_string(),
    })?;
    session.accept_terms(true)?;

    let verification = session.verify_identity().await?;
    println!("Identity: {verification:?}");

    let preview = session.payment_preview()?;

    println!(
        "Payment: subtotal {} + fee {} + tax {} = {}",
        to_money(preview.subtotal, ctx.currency)?,
        to_money(preview.service_fee, ctx.currency)?,
        to_money(preview.tax, ctx.currency)?,
        preview.total_money(ctx.currency)?
    );

    let order = session.proceed(args.method.into()).await?;

    print_order(&order);

    let stop = shutdown::signal();
    tokio::pin!(stop);

    loop {
        if ctx
            .lifecycle
            .view(order.id)
            .is_none_or(|view| view.status.is_terminal())
            || !ctx.lifecycle.has_pending_timer(order.id)
        {
            break;
        }

        tokio::select! {
            result = &mut stop => {
                result?;
                break;
            }
            update = updates.recv() => match update {
                Ok(update) if update.order_id == order.id => {
                    if let Some(view) = ctx.lifecycle.view(order.id) {
                        print_order(&view);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "order updates lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    ctx.lifecycle.shutdown();

    Ok(())
}

fn print_order(order: &OrderView) {
    println!(
        "[{}] {}: {} (ETA {})",
        order.id, order.title, order.description, order.estimated_arrival
    );
}
