use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use reqwest::Url;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use countries::application::{
    Binding, CountriesDbRepository, ImagesInteractor, MemoryPressure, RealImagesInteractor,
};
use countries::domain::{Country, ImageLoadable, Loadable};
use countries::infrastructure::{
    AppConfig, CliArgs, MemoryImageCache, RealImageWebRepository, ReqwestTransport, SqliteStore,
    StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

async fn import_countries(
    repository: &CountriesDbRepository<SqliteStore>,
    path: &Path,
) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let countries: Vec<Country> =
        serde_json::from_str(&content).wrap_err("failed to parse countries JSON")?;
    let written = repository.store(countries).await?;
    println!("Imported {written} countries");
    Ok(())
}

async fn list_countries(
    repository: &CountriesDbRepository<SqliteStore>,
    search: &str,
    locale: &str,
) -> Result<()> {
    let list = repository.countries(search, locale).await?;
    if !repository.has_loaded_countries() {
        println!("No countries stored yet, use --import <PATH>");
        return Ok(());
    }
    for country in list.iter() {
        println!(
            "{:<4} {:<40} {:>12}",
            country.alpha3_code,
            country.localized_name(locale),
            country.population
        );
    }
    Ok(())
}

async fn load_image(config: &AppConfig, url: Url) -> Result<()> {
    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
        config.images.timeout_secs,
    ))?);
    let web_repository = Arc::new(RealImageWebRepository::new(
        transport,
        config.images.conversion_base_url.clone(),
    ));
    let memory_cache = Arc::new(MemoryImageCache::new(config.images.cache_capacity));
    let memory_pressure = MemoryPressure::new();
    let interactor = RealImagesInteractor::new(
        web_repository,
        Arc::clone(&memory_cache) as _,
        &memory_pressure,
    )
    .with_target_width(config.images.target_width);

    let image: Binding<ImageLoadable> = Binding::new(Loadable::NotRequested);
    let mut updates = image.subscribe();
    let _load = interactor.load(&image, Some(url));

    while let Some(state) = updates.recv().await {
        match state {
            Loadable::NotRequested => {}
            Loadable::IsLoading { .. } => println!("Loading image..."),
            Loadable::Loaded(image) => {
                println!("Loaded image {}x{}", image.width(), image.height());
                break;
            }
            Loadable::Failed(e) => return Err(eyre!(e).wrap_err("failed to load image")),
        }
    }

    info!(stats = %memory_cache.stats().await, "Image cache");
    Ok(())
}

async fn resolve_image_url(
    args: &CliArgs,
    repository: &CountriesDbRepository<SqliteStore>,
) -> Result<Option<Url>> {
    if let Some(url) = &args.image {
        return Ok(Some(Url::parse(url).wrap_err("invalid image URL")?));
    }
    let Some(code) = &args.flag else {
        return Ok(None);
    };
    match repository.country(code).await? {
        Some(country) => Ok(country.flag_url()),
        None => {
            warn!(code = %code, "Country not found");
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = countries::VERSION, "Starting {}", countries::NAME);

    let db_path = config
        .database_path()
        .ok_or_else(|| eyre!("failed to determine data directory"))?;
    let store = Arc::new(SqliteStore::open(db_path, config.store.version));
    let repository = CountriesDbRepository::new(store);

    if let Some(path) = &args.import {
        import_countries(&repository, path).await?;
    }

    match resolve_image_url(&args, &repository).await? {
        Some(url) => load_image(&config, url).await,
        None => list_countries(&repository, &args.search, &args.locale).await,
    }
}
