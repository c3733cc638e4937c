//! Command-line surface for MarketStack catalogs.
//!
//! Argument types and command execution live here so they can be driven
//! from tests; `main.rs` only installs logging and prints the result.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use marketstack_catalog::{CatalogConfig, CatalogStore, MigrationEngine, SearchCriteria};
use marketstack_model::{Price, ProductDraft, ProductKey, ProductRecord};
use marketstack_types::{ActorId, Category, ChangeLogEntry};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "marketstack")]
#[command(about = "Inspect and maintain a MarketStack catalog file")]
pub struct Cli {
    /// Catalog file (default: $MARKETSTACK_CATALOG or data/Sellers.txt)
    #[arg(short, long, global = true)]
    pub catalog: Option<PathBuf>,

    /// SQLite mirror for the change log (default: $MARKETSTACK_MIRROR)
    #[arg(short, long, global = true)]
    pub mirror: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upgrade legacy product lines in place
    Migrate,
    /// List every product
    List,
    /// Find products matching all given filters
    Search(SearchArgs),
    /// Categories that currently have products
    Categories,
    /// Register a seller
    AddSeller { seller: String },
    /// Open an empty store for a seller
    AddStore { seller: String, store: String },
    /// Add a product to a store
    AddProduct {
        seller: String,
        store: String,
        #[command(flatten)]
        product: NewProduct,
    },
    /// Remove a product, identified by its fields
    RemoveProduct {
        seller: String,
        store: String,
        #[command(flatten)]
        product: ExistingProduct,
    },
    /// Change fields of a product and log each change
    EditProduct(EditArgs),
    /// Change history of a product, most recent first
    History { name: String, store: String },
    /// Change log entries, optionally for one actor
    Changes {
        #[arg(long)]
        actor: Option<String>,
    },
    /// Copy every product into the mirror
    SyncMirror,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub price: Option<Price>,
    #[arg(long)]
    pub store: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    /// Only products with stock
    #[arg(long)]
    pub in_stock: bool,
}

impl SearchArgs {
    fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            name: self.name.clone(),
            price: self.price,
            store: self.store.clone(),
            description: self.description.clone(),
            category: self.category,
            in_stock: self.in_stock,
        }
    }
}

#[derive(Args, Debug)]
pub struct NewProduct {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value_t = Category::LEGACY_DEFAULT)]
    pub category: Category,
}

/// The identifying fields of a product already in a store.
#[derive(Args, Debug)]
pub struct ExistingProduct {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    pub description: String,
}

impl ExistingProduct {
    /// Key for this product in `seller`'s store. Products carry the store's
    /// canonical name, which may differ in case from what was typed.
    fn key(&self, catalog: &CatalogStore, seller: &str, store: &str) -> ProductKey {
        let store = catalog.store(seller, store).map_or(store, |s| s.name());
        ProductKey::new(
            self.name.as_str(),
            self.quantity,
            self.price,
            self.description.as_str(),
            store,
        )
    }
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub seller: String,
    pub store: String,
    #[command(flatten)]
    pub product: ExistingProduct,
    #[arg(long)]
    pub new_name: Option<String>,
    #[arg(long)]
    pub new_quantity: Option<u32>,
    #[arg(long)]
    pub new_price: Option<Price>,
    #[arg(long)]
    pub new_description: Option<String>,
    #[arg(long)]
    pub new_category: Option<Category>,
    /// Who is making the change (default: the seller)
    #[arg(long)]
    pub actor: Option<String>,
    /// Reason recorded with each change
    #[arg(long)]
    pub reason: Option<String>,
}

impl Cli {
    /// `base` with the command-line overrides applied.
    #[must_use]
    pub fn config(&self, base: CatalogConfig) -> CatalogConfig {
        let mut config = base;
        if let Some(path) = &self.catalog {
            config.catalog_path = path.clone();
        }
        if let Some(path) = &self.mirror {
            config.mirror_path = Some(path.clone());
        }
        config
    }
}

#[derive(Serialize)]
struct Listing<'a> {
    seller: &'a str,
    store: &'a str,
    #[serde(flatten)]
    product: &'a ProductRecord,
}

/// Runs `cli` against the environment's configuration.
pub fn execute(cli: &Cli) -> Result<String> {
    run(cli, CatalogConfig::from_env())
}

/// Runs `cli` with `base` as the configuration before overrides.
/// Returns the text to print.
pub fn run(cli: &Cli, base: CatalogConfig) -> Result<String> {
    let config = cli.config(base);
    let open = || {
        CatalogStore::open(config.clone())
            .with_context(|| format!("failed to open catalog {}", config.catalog_path.display()))
    };

    match &cli.command {
        Command::Migrate => {
            let report = MigrationEngine::new(&config.catalog_path)
                .run()
                .with_context(|| format!("failed to migrate {}", config.catalog_path.display()))?;
            if cli.json {
                return Ok(serde_json::to_string_pretty(&report)?);
            }
            Ok(format!(
                "migrated {} lines ({} failed, {} ambiguous)",
                report.migrated, report.failed, report.flagged
            ))
        }
        Command::List => render_products(&open()?, &SearchCriteria::default(), cli.json),
        Command::Search(args) => render_products(&open()?, &args.criteria(), cli.json),
        Command::Categories => {
            let categories = open()?.available_categories();
            if cli.json {
                return Ok(serde_json::to_string_pretty(&categories)?);
            }
            Ok(categories
                .iter()
                .map(|c| format!("{} ({})", c.display_name(), c.as_tag()))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::AddSeller { seller } => {
            if open()?.add_seller(seller)? {
                Ok(format!("added seller {}", seller.trim()))
            } else {
                Ok(format!("seller {} already exists", seller.trim()))
            }
        }
        Command::AddStore { seller, store } => {
            open()?.add_store(seller, store)?;
            Ok(format!("added store {} for {}", store.trim(), seller.trim()))
        }
        Command::AddProduct {
            seller,
            store,
            product,
        } => {
            let draft = ProductDraft::new(
                product.name.as_str(),
                product.quantity,
                product.price,
                product.description.as_str(),
                product.category,
            );
            let added = open()?.add_product(seller, store, draft)?;
            Ok(format!("added {}", format_product(&added)))
        }
        Command::RemoveProduct {
            seller,
            store,
            product,
        } => {
            let mut catalog = open()?;
            let key = product.key(&catalog, seller, store);
            let removed = catalog.remove_product(seller, store, &key)?;
            Ok(format!("removed {}", format_product(&removed)))
        }
        Command::EditProduct(args) => edit_product(&mut open()?, args),
        Command::History { name, store } => {
            let catalog = open()?;
            ensure_mirror(&catalog)?;
            render_changes(&catalog.history(name, store), cli.json)
        }
        Command::Changes { actor } => {
            let catalog = open()?;
            ensure_mirror(&catalog)?;
            let changes = match actor {
                Some(actor) => catalog.changes_by_actor(&ActorId::new(actor.as_str())),
                None => catalog.all_changes(),
            };
            render_changes(&changes, cli.json)
        }
        Command::SyncMirror => {
            let catalog = open()?;
            ensure_mirror(&catalog)?;
            let report = catalog.sync_mirror();
            if cli.json {
                return Ok(serde_json::to_string_pretty(&report)?);
            }
            Ok(format!(
                "synced {} products ({} failed)",
                report.synced, report.failed
            ))
        }
    }
}

fn ensure_mirror(catalog: &CatalogStore) -> Result<()> {
    if !catalog.bridge().is_enabled() {
        bail!("no mirror configured; pass --mirror or set MARKETSTACK_MIRROR");
    }
    Ok(())
}

fn edit_product(catalog: &mut CatalogStore, args: &EditArgs) -> Result<String> {
    let key = args.product.key(catalog, &args.seller, &args.store);
    let Some(current) = catalog
        .store(&args.seller, &args.store)
        .and_then(|s| s.get(&key))
        .cloned()
    else {
        bail!(
            "no product {} in store {} of seller {}",
            args.product.name,
            args.store,
            args.seller
        );
    };

    let draft = ProductDraft::new(
        args.new_name.clone().unwrap_or(current.name),
        args.new_quantity.unwrap_or(current.quantity),
        args.new_price.unwrap_or(current.price),
        args.new_description.clone().unwrap_or(current.description),
        args.new_category.unwrap_or(current.category),
    );
    let actor = ActorId::new(args.actor.as_deref().unwrap_or(&args.seller));
    let updated = catalog.edit_product(
        &args.seller,
        &args.store,
        &key,
        draft,
        &actor,
        args.reason.as_deref(),
    )?;
    Ok(format!("updated {}", format_product(&updated)))
}

/// One-line summary: `[Category] Name - $Price (Qty: N) - Store: S - Description`.
#[must_use]
pub fn format_product(product: &ProductRecord) -> String {
    format!(
        "[{}] {} - ${} (Qty: {}) - Store: {} - {}",
        product.category.display_name(),
        product.name,
        product.price,
        product.quantity,
        product.store_name,
        product.description
    )
}

fn render_products(
    catalog: &CatalogStore,
    criteria: &SearchCriteria,
    json: bool,
) -> Result<String> {
    let mut listings = Vec::new();
    for seller in catalog.sellers() {
        for shop in seller.stores() {
            for product in shop.products().iter().filter(|p| criteria.matches(p)) {
                listings.push(Listing {
                    seller: seller.id(),
                    store: shop.name(),
                    product,
                });
            }
        }
    }

    if json {
        return Ok(serde_json::to_string_pretty(&listings)?);
    }
    let mut out = String::new();
    for listing in &listings {
        writeln!(out, "{}: {}", listing.seller, format_product(listing.product))?;
    }
    Ok(out.trim_end().to_string())
}

fn render_changes(changes: &[ChangeLogEntry], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(changes)?);
    }
    let mut out = String::new();
    for change in changes {
        writeln!(
            out,
            "{} {} by {}: {} -> {}",
            change.timestamp.to_rfc3339(),
            change.change_type(),
            change.actor_id,
            change.old_value,
            change.new_value
        )?;
    }
    Ok(out.trim_end().to_string())
}
