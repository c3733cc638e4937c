use clap::Parser;
use marketstack_catalog::CatalogConfig;
use marketstack_cli::{format_product, run, Cli};
use marketstack_model::{Price, ProductRecord};
use marketstack_types::Category;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

const NIKE: &str = "a@x.com,Nike,Air,10,99.99,Running shoe,Nike,SHOES";
const LEGACY: &str = "b@x.com,Puma,Suede,3,65.00,Classic,Puma";

fn catalog(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("Sellers.txt");
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(&path, contents).unwrap();
    path
}

fn invoke(path: &Path, args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec!["marketstack", "--catalog", path.to_str().unwrap()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    run(&cli, CatalogConfig::default())
}

fn file_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn global_flags_parse_after_subcommand() {
    let cli = Cli::try_parse_from(["marketstack", "list", "--json", "-v"]).unwrap();
    assert!(cli.json);
    assert!(cli.verbose);
}

#[test]
fn invalid_price_is_rejected_by_parser() {
    let result = Cli::try_parse_from([
        "marketstack",
        "add-product",
        "a@x.com",
        "Nike",
        "Air",
        "1",
        "free",
    ]);
    assert!(result.is_err());
}

#[test]
fn flags_override_base_config() {
    let cli = Cli::try_parse_from(["marketstack", "-c", "x.txt", "-m", "x.db", "list"]).unwrap();
    let config = cli.config(CatalogConfig::new("ignored.txt"));
    assert_eq!(config.catalog_path, PathBuf::from("x.txt"));
    assert_eq!(config.mirror_path, Some(PathBuf::from("x.db")));
}

// ── Listing ──────────────────────────────────────────────────────

#[test]
fn format_product_matches_listing_layout() {
    let product = ProductRecord::new(
        "Air",
        10,
        Price::parse("99.99").unwrap(),
        "Running shoe",
        "Nike",
        Category::HomeGarden,
    );
    assert_eq!(
        format_product(&product),
        "[Home & Garden] Air - $99.99 (Qty: 10) - Store: Nike - Running shoe"
    );
}

#[test]
fn list_prints_every_product_with_seller() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE, LEGACY]);

    let out = invoke(&path, &["list"]).unwrap();
    assert_eq!(
        out,
        "a@x.com: [Shoes] Air - $99.99 (Qty: 10) - Store: Nike - Running shoe\n\
         b@x.com: [Shoes] Suede - $65.00 (Qty: 3) - Store: Puma - Classic"
    );
}

#[test]
fn list_json_carries_seller_and_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    let out = invoke(&path, &["list", "--json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value[0]["seller"], "a@x.com");
    assert_eq!(value[0]["store"], "Nike");
    assert_eq!(value[0]["name"], "Air");
    assert_eq!(value[0]["quantity"], 10);
}

#[test]
fn search_filters_by_category_and_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(
        dir.path(),
        &[NIKE, "a@x.com,Gadgets,Phone,2,300.00,Smart,Gadgets,ELECTRONICS"],
    );

    let out = invoke(&path, &["search", "--category", "electronics"]).unwrap();
    assert!(out.contains("Phone"));
    assert!(!out.contains("Air"));

    let none = invoke(&path, &["search", "--store", "nike", "--name", "Phone"]).unwrap();
    assert_eq!(none, "");
}

#[test]
fn categories_in_first_seen_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(
        dir.path(),
        &["a@x.com,Gadgets,Phone,2,300.00,Smart,Gadgets,ELECTRONICS", NIKE],
    );

    let out = invoke(&path, &["categories"]).unwrap();
    assert_eq!(out, "Electronics (ELECTRONICS)\nShoes (SHOES)");
}

// ── Migration ────────────────────────────────────────────────────

#[test]
fn migrate_upgrades_legacy_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE, LEGACY]);

    let out = invoke(&path, &["migrate"]).unwrap();
    assert_eq!(out, "migrated 1 lines (0 failed, 0 ambiguous)");
    assert_eq!(
        file_lines(&path),
        vec![NIKE.to_string(), format!("{LEGACY},SHOES")]
    );

    let again = invoke(&path, &["migrate"]).unwrap();
    assert_eq!(again, "migrated 0 lines (0 failed, 0 ambiguous)");
}

#[test]
fn migrate_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[LEGACY]);

    let out = invoke(&path, &["migrate", "--json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["migrated"], 1);
    assert_eq!(value["rewritten"], true);
}

// ── Mutations ────────────────────────────────────────────────────

#[test]
fn add_seller_reports_existing() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    assert_eq!(
        invoke(&path, &["add-seller", "c@x.com"]).unwrap(),
        "added seller c@x.com"
    );
    assert_eq!(
        invoke(&path, &["add-seller", "a@x.com"]).unwrap(),
        "seller a@x.com already exists"
    );
}

#[test]
fn add_store_then_product() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    assert_eq!(
        invoke(&path, &["add-store", "a@x.com", "Reebok"]).unwrap(),
        "added store Reebok for a@x.com"
    );
    let out = invoke(
        &path,
        &[
            "add-product",
            "a@x.com",
            "Reebok",
            "Club C",
            "5",
            "75",
            "--description",
            "Court shoe",
        ],
    )
    .unwrap();
    assert_eq!(
        out,
        "added [Shoes] Club C - $75.00 (Qty: 5) - Store: Reebok - Court shoe"
    );
    assert_eq!(
        file_lines(&path),
        vec![
            NIKE.to_string(),
            "a@x.com,Reebok,Club C,5,75.00,Court shoe,Reebok,SHOES".to_string(),
        ]
    );
}

#[test]
fn add_store_for_unknown_seller_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    assert!(invoke(&path, &["add-store", "nobody@x.com", "Reebok"]).is_err());
}

#[test]
fn remove_product_by_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    let out = invoke(
        &path,
        &[
            "remove-product",
            "a@x.com",
            "Nike",
            "Air",
            "10",
            "99.99",
            "Running shoe",
        ],
    )
    .unwrap();
    assert!(out.starts_with("removed [Shoes] Air"));
    assert_eq!(file_lines(&path), vec!["a@x.com,Nike,".to_string()]);
}

#[test]
fn edit_without_mirror_still_updates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    let out = invoke(
        &path,
        &[
            "edit-product",
            "a@x.com",
            "Nike",
            "Air",
            "10",
            "99.99",
            "Running shoe",
            "--new-quantity",
            "8",
        ],
    )
    .unwrap();
    assert!(out.contains("(Qty: 8)"));
    assert_eq!(
        file_lines(&path),
        vec!["a@x.com,Nike,Air,8,99.99,Running shoe,Nike,SHOES".to_string()]
    );
}

#[test]
fn store_name_case_does_not_matter_for_edit_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    invoke(
        &path,
        &[
            "edit-product",
            "a@x.com",
            "nike",
            "Air",
            "10",
            "99.99",
            "Running shoe",
            "--new-quantity",
            "6",
        ],
    )
    .unwrap();
    assert_eq!(
        file_lines(&path),
        vec!["a@x.com,Nike,Air,6,99.99,Running shoe,Nike,SHOES".to_string()]
    );

    let out = invoke(
        &path,
        &["remove-product", "a@x.com", "NIKE", "Air", "6", "99.99", "Running shoe"],
    )
    .unwrap();
    assert!(out.starts_with("removed [Shoes] Air"));
    assert_eq!(file_lines(&path), vec!["a@x.com,Nike,".to_string()]);
}

#[test]
fn edit_unknown_product_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    let err = invoke(
        &path,
        &[
            "edit-product",
            "a@x.com",
            "Nike",
            "Air",
            "11",
            "99.99",
            "Running shoe",
            "--new-quantity",
            "8",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("no product Air"));
}

// ── Change log ───────────────────────────────────────────────────

#[test]
fn history_requires_mirror() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);

    let err = invoke(&path, &["history", "Air", "Nike"]).unwrap_err();
    assert!(err.to_string().contains("no mirror configured"));
}

#[test]
fn edit_with_mirror_records_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);
    let db = dir.path().join("catalog.db");
    let db = db.to_str().unwrap();

    let synced = invoke(&path, &["--mirror", db, "sync-mirror"]).unwrap();
    assert_eq!(synced, "synced 1 products (0 failed)");

    invoke(
        &path,
        &[
            "--mirror",
            db,
            "edit-product",
            "a@x.com",
            "Nike",
            "Air",
            "10",
            "99.99",
            "Running shoe",
            "--new-price",
            "89.99",
            "--new-quantity",
            "7",
            "--actor",
            "admin",
            "--reason",
            "Spring sale",
        ],
    )
    .unwrap();

    let history = invoke(&path, &["--mirror", db, "history", "Air", "Nike"]).unwrap();
    let lines: Vec<&str> = history.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.contains("by admin")));
    assert!(history.contains("10 -> 7"));
    assert!(history.contains("99.99 -> 89.99"));

    let by_actor = invoke(&path, &["--mirror", db, "changes", "--actor", "admin"]).unwrap();
    assert_eq!(by_actor.lines().count(), 2);
    let by_other = invoke(&path, &["--mirror", db, "changes", "--actor", "a@x.com"]).unwrap();
    assert_eq!(by_other, "");
}

#[test]
fn history_json_is_an_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = catalog(dir.path(), &[NIKE]);
    let db = dir.path().join("catalog.db");
    let db = db.to_str().unwrap();

    let out = invoke(&path, &["--mirror", db, "--json", "history", "Air", "Nike"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value, serde_json::json!([]));
}
