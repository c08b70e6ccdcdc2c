//! sqlite-adapter: SQL implementation of the `ProductRepository` port.
//!
//! Purpose
//! - Persist the product catalog in a SQLite database addressed by a
//!   connection string (`[sqlite:]<path>[;IFEXISTS=TRUE]`).
//! - Implements the `ProductRepository` trait from the `catalog-domain` crate
//!   and passes the same contract suite as the in-memory repository.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - A connection is opened for every operation and closed before it returns.
//! - Prices and quantities are stored as integer thousandths, so values keep
//!   three decimal places. Compare them with `catalog_domain::approx_eq`.
//!   Values that do not fit an `i64` once scaled are rejected, not clamped.

use std::fs;
use std::path::{Path, PathBuf};

use catalog_domain::{CoreError, Product, ProductId, ProductRepository};
use rusqlite::{params, Connection, OpenFlags};
use tracing::debug;

/// Default connection string when `CATALOG_DB_URL` is not set.
pub const DEFAULT_DB_URL: &str = "./data/catalog.db";

/// Where the database lives and how to open it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqliteConfig {
    pub path: PathBuf,
    /// The database file must already exist; it is never created on open.
    pub if_exists: bool,
}

impl SqliteConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            if_exists: false,
        }
    }

    /// Parse a connection string of the form `[sqlite:]<path>[;KEY=VALUE]...`.
    ///
    /// The only recognised option is `IFEXISTS` (`TRUE`/`FALSE`, any case).
    pub fn parse(url: &str) -> Result<Self, CoreError> {
        let rest = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        let mut parts = rest.split(';');
        let path = parts.next().unwrap_or_default().trim();
        if path.is_empty() {
            return Err(bad_url(url, "missing database path"));
        }

        let mut config = Self::new(path);
        for option in parts.map(str::trim).filter(|o| !o.is_empty()) {
            let Some((key, value)) = option.split_once('=') else {
                return Err(bad_url(url, &format!("option '{option}' has no value")));
            };
            if !key.trim().eq_ignore_ascii_case("IFEXISTS") {
                return Err(bad_url(url, &format!("unknown option '{}'", key.trim())));
            }
            config.if_exists = match value.trim().to_ascii_uppercase().as_str() {
                "TRUE" => true,
                "FALSE" => false,
                other => {
                    return Err(bad_url(url, &format!("IFEXISTS must be TRUE or FALSE, got '{other}'")))
                }
            };
        }
        Ok(config)
    }

    fn open_flags(&self) -> OpenFlags {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.if_exists {
            flags
        } else {
            flags | OpenFlags::SQLITE_OPEN_CREATE
        }
    }
}

fn bad_url(url: &str, reason: &str) -> CoreError {
    CoreError::Repository(format!("invalid connection string '{url}': {reason}"))
}

/// SQLite-backed product repository.
pub struct SqliteProductRepo {
    config: SqliteConfig,
}

impl SqliteProductRepo {
    /// Open the store described by `config` and ensure the schema exists.
    ///
    /// Unless `if_exists` is set, missing parent directories are created.
    pub fn new(config: SqliteConfig) -> Result<Self, CoreError> {
        if !config.if_exists {
            ensure_parent_dir(&config.path)?;
        }
        let repo = Self { config };
        let conn = repo.connect()?;
        init_schema(&conn)?;
        debug!(path = %repo.config.path.display(), if_exists = repo.config.if_exists, "sqlite store ready");
        Ok(repo)
    }

    /// Parse a connection string and open the store.
    pub fn open(url: &str) -> Result<Self, CoreError> {
        Self::new(SqliteConfig::parse(url)?)
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    fn connect(&self) -> Result<Connection, CoreError> {
        Connection::open_with_flags(&self.config.path, self.config.open_flags()).map_err(map_sqerr)
    }
}

/// Create the database file (and parent directory) with the product schema.
/// Safe to call on an existing database.
pub fn create_database<P: AsRef<Path>>(path: P) -> Result<(), CoreError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let conn = Connection::open(path).map_err(map_sqerr)?;
    init_schema(&conn)
}

fn ensure_parent_dir(path: &Path) -> Result<(), CoreError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .map_err(|e| CoreError::Repository(format!("create {}: {e}", dir.display()))),
        _ => Ok(()),
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            price INTEGER NOT NULL,
            quantity_in_stock INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn to_thousandths(field: &str, v: f64) -> Result<i64, CoreError> {
    let scaled = (v * 1000.0).round();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
        return Err(CoreError::InvalidProduct(format!(
            "{field} {v} cannot be stored"
        )));
    }
    Ok(scaled as i64)
}

fn from_thousandths(v: i64) -> f64 {
    v as f64 / 1000.0
}

const SELECT_PRODUCT: &str =
    "SELECT id, name, description, category, price, quantity_in_stock FROM products";

fn row_to_product(row: &rusqlite::Row) -> Result<Product, CoreError> {
    let id: i64 = row.get(0).map_err(map_sqerr)?;
    let name: String = row.get(1).map_err(map_sqerr)?;
    let description: String = row.get(2).map_err(map_sqerr)?;
    let category: String = row.get(3).map_err(map_sqerr)?;
    let price: i64 = row.get(4).map_err(map_sqerr)?;
    let quantity: i64 = row.get(5).map_err(map_sqerr)?;
    Ok(Product::new(
        id,
        name,
        description,
        category,
        from_thousandths(price),
        from_thousandths(quantity),
    ))
}

fn collect_products(mut rows: rusqlite::Rows<'_>) -> Result<Vec<Product>, CoreError> {
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_sqerr)? {
        out.push(row_to_product(row)?);
    }
    Ok(out)
}

impl ProductRepository for SqliteProductRepo {
    fn add_product(&self, product: Product) -> Result<(), CoreError> {
        let price = to_thousandths("price", product.price())?;
        let quantity = to_thousandths("quantity_in_stock", product.quantity_in_stock())?;
        let conn = self.connect()?;
        let res = conn.execute(
            "INSERT INTO products(id, name, description, category, price, quantity_in_stock) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                product.id().get(),
                product.name(),
                product.description(),
                product.category(),
                price,
                quantity,
            ],
        );
        match res {
            Ok(_) => {
                debug!(id = %product.id(), "product inserted");
                Ok(())
            }
            Err(e) => {
                if let rusqlite::Error::SqliteFailure(err, _) = &e {
                    if err.code == rusqlite::ErrorCode::ConstraintViolation {
                        return Err(CoreError::AlreadyExists);
                    }
                }
                Err(map_sqerr(e))
            }
        }
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, CoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .map_err(map_sqerr)?;
        let mut rows = stmt.query(params![id.get()]).map_err(map_sqerr)?;
        let product = match rows.next().map_err(map_sqerr)? {
            Some(row) => Some(row_to_product(row)?),
            None => None,
        };
        Ok(product)
    }

    fn list_products(&self) -> Result<Vec<Product>, CoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_PRODUCT} ORDER BY id"))
            .map_err(map_sqerr)?;
        let rows = stmt.query([]).map_err(map_sqerr)?;
        collect_products(rows)
    }

    fn list_categories(&self) -> Result<Vec<String>, CoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT category FROM products ORDER BY category")
            .map_err(map_sqerr)?;
        let mut rows = stmt.query([]).map_err(map_sqerr)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqerr)? {
            out.push(row.get::<_, String>(0).map_err(map_sqerr)?);
        }
        Ok(out)
    }

    fn list_by_category(&self, category: &str) -> Result<Vec<Product>, CoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_PRODUCT} WHERE category = ?1 ORDER BY id"))
            .map_err(map_sqerr)?;
        let rows = stmt.query(params![category]).map_err(map_sqerr)?;
        collect_products(rows)
    }

    fn update_product(&self, product: &Product) -> Result<(), CoreError> {
        let price = to_thousandths("price", product.price())?;
        let quantity = to_thousandths("quantity_in_stock", product.quantity_in_stock())?;
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE products SET name = ?1, description = ?2, category = ?3, price = ?4, quantity_in_stock = ?5 WHERE id = ?6",
                params![
                    product.name(),
                    product.description(),
                    product.category(),
                    price,
                    quantity,
                    product.id().get(),
                ],
            )
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::NotFound)
        } else {
            debug!(id = %product.id(), "product updated");
            Ok(())
        }
    }

    fn delete_product(&self, product: &Product) -> Result<(), CoreError> {
        let conn = self.connect()?;
        let changed = conn
            .execute("DELETE FROM products WHERE id = ?1", params![product.id().get()])
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::NotFound)
        } else {
            debug!(id = %product.id(), "product deleted");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_db() -> (SqliteProductRepo, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let repo = SqliteProductRepo::new(SqliteConfig::new(path)).unwrap();
        (repo, dir)
    }

    catalog_domain::product_repository_contract!(tmp_db());

    #[test]
    fn parse_plain_path() {
        let cfg = SqliteConfig::parse("./data/catalog.db").unwrap();
        assert_eq!(cfg.path, PathBuf::from("./data/catalog.db"));
        assert!(!cfg.if_exists);
    }

    #[test]
    fn parse_prefix_and_ifexists() {
        let cfg = SqliteConfig::parse("sqlite:/tmp/project-testing.db;IFEXISTS=TRUE").unwrap();
        assert_eq!(cfg.path, PathBuf::from("/tmp/project-testing.db"));
        assert!(cfg.if_exists);

        let cfg = SqliteConfig::parse("sqlite:///var/db.sqlite; ifexists = false").unwrap();
        assert_eq!(cfg.path, PathBuf::from("/var/db.sqlite"));
        assert!(!cfg.if_exists);
    }

    #[test]
    fn parse_rejects_bad_strings() {
        assert!(SqliteConfig::parse("").is_err());
        assert!(SqliteConfig::parse("sqlite:;IFEXISTS=TRUE").is_err());
        assert!(SqliteConfig::parse("db.sqlite;IFEXISTS").is_err());
        assert!(SqliteConfig::parse("db.sqlite;IFEXISTS=maybe").is_err());
        assert!(SqliteConfig::parse("db.sqlite;MODE=fast").is_err());
    }

    #[test]
    fn if_exists_refuses_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let mut cfg = SqliteConfig::new(&path);
        cfg.if_exists = true;

        let err = SqliteProductRepo::new(cfg).err().expect("must not open");
        assert!(matches!(err, CoreError::Repository(_)));
        assert!(!path.exists(), "database must not be created");
    }

    #[test]
    fn if_exists_opens_created_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("existing.db");
        create_database(&path).unwrap();

        let url = format!("{};IFEXISTS=TRUE", path.display());
        let repo = SqliteProductRepo::open(&url).unwrap();
        assert!(repo.config().if_exists);
        assert!(repo.list_products().unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let (repo, dir) = tmp_db();
        repo.add_product(Product::new(7, "kept", "on disk", "storage", 1.5, 2.0))
            .unwrap();
        drop(repo);

        let reopened = SqliteProductRepo::new(SqliteConfig::new(dir.path().join("catalog.db"))).unwrap();
        let got = reopened.get_product(ProductId::new(7)).unwrap().unwrap();
        assert_eq!(got.name(), "kept");
        assert_eq!(got.category(), "storage");
    }

    #[test]
    fn numbers_keep_three_decimal_places() {
        let (repo, _dir) = tmp_db();
        repo.add_product(Product::new(1, "p", "", "c", 111.1114, 0.0006))
            .unwrap();
        let got = repo.get_product(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(got.price(), 111.111);
        assert_eq!(got.quantity_in_stock(), 0.001);
    }

    #[test]
    fn thousandths_conversion() {
        assert_eq!(to_thousandths("price", 111.111).unwrap(), 111_111);
        assert_eq!(to_thousandths("price", 222.222).unwrap(), 222_222);
        assert_eq!(from_thousandths(123_123), 123.123);
        assert!(to_thousandths("price", 1.0e17).is_err());
        assert!(to_thousandths("price", f64::NAN).is_err());
        assert!(to_thousandths("price", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected_not_clamped() {
        let (repo, _dir) = tmp_db();
        let err = repo
            .add_product(Product::new(1, "p", "", "c", 1.0e17, 5.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidProduct(_)));
        assert!(repo.get_product(ProductId::new(1)).unwrap().is_none());

        repo.add_product(Product::new(2, "p", "", "c", 1.0, 5.0)).unwrap();
        let mut changed = repo.get_product(ProductId::new(2)).unwrap().unwrap();
        changed.set_quantity_in_stock(f64::NAN);
        let err = repo.update_product(&changed).unwrap_err();
        assert!(matches!(err, CoreError::InvalidProduct(_)));
        let stored = repo.get_product(ProductId::new(2)).unwrap().unwrap();
        assert_eq!(stored.quantity_in_stock(), 5.0);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("x.db");
        let repo = SqliteProductRepo::open(&path.display().to_string()).unwrap();
        assert!(repo.list_products().unwrap().is_empty());
        assert!(path.exists());
    }

    #[test]
    fn if_exists_opens_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uri.db");
        create_database(&path).unwrap();

        let mut cfg = SqliteConfig::new(format!("file:{}", path.display()));
        cfg.if_exists = true;
        let repo = SqliteProductRepo::new(cfg).unwrap();
        repo.add_product(Product::new(1, "p", "", "c", 1.0, 1.0)).unwrap();

        let direct = SqliteProductRepo::new(SqliteConfig::new(&path)).unwrap();
        assert!(direct.get_product(ProductId::new(1)).unwrap().is_some());
    }

    mod properties {
        use super::*;
        use catalog_domain::{approx_eq, contract::product_strategy};
        use proptest::prelude::*;

        proptest! {
            // Each case opens a fresh file-backed database.
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn add_then_get_round_trips(product in product_strategy()) {
                let (repo, _dir) = tmp_db();
                repo.add_product(product.clone()).unwrap();
                let fetched = repo.get_product(product.id()).unwrap().unwrap();
                prop_assert!(fetched.matches(&product));

                repo.delete_product(&product).unwrap();
                prop_assert!(repo.get_product(product.id()).unwrap().is_none());
            }

            #[test]
            fn any_price_is_stored_faithfully_or_rejected(price in any::<f64>()) {
                let (repo, _dir) = tmp_db();
                match repo.add_product(Product::new(1, "p", "", "c", price, 1.0)) {
                    Ok(()) => {
                        let fetched = repo.get_product(ProductId::new(1)).unwrap().unwrap();
                        // Huge magnitudes can only be as exact as f64 allows.
                        let drift = (fetched.price() - price).abs();
                        prop_assert!(approx_eq(fetched.price(), price) || drift <= price.abs() * 4.0 * f64::EPSILON);
                    }
                    Err(err) => {
                        prop_assert!(matches!(err, CoreError::InvalidProduct(_)));
                        prop_assert!(repo.get_product(ProductId::new(1)).unwrap().is_none());
                    }
                }
            }
        }
    }
}
