//! Argument parsing for catalog-cli.

use catalog_domain::{NewProduct, ProductId, ProductUpdate};

pub const USAGE: &str = "Usage:
  catalog-cli init
  catalog-cli add <id> <name> <description> <category> <price> <quantity>
  catalog-cli get <id>
  catalog-cli list
  catalog-cli categories
  catalog-cli category <name>
  catalog-cli update <id> [--name <n>] [--description <d>] [--price <p>] [--quantity <q>]
  catalog-cli delete <id>

Environment:
  STORAGE_PROVIDER  memory | sqlite (default sqlite)
  CATALOG_DB_URL    [sqlite:]<path>[;IFEXISTS=TRUE] (default ./data/catalog.db)
  LOG_FORMAT        pretty | json";

#[derive(Debug, PartialEq)]
pub enum Command {
    Init,
    Add(NewProduct),
    Get(ProductId),
    List,
    Categories,
    Category(String),
    Update(ProductId, ProductUpdate),
    Delete(ProductId),
    Help,
}

pub fn parse_command<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(cmd) = args.next() else {
        return Ok(Command::Help);
    };
    let rest: Vec<String> = args.collect();

    match cmd.as_str() {
        "init" => {
            expect_args(&cmd, &rest, 0)?;
            Ok(Command::Init)
        }
        "add" => {
            expect_args(&cmd, &rest, 6)?;
            Ok(Command::Add(NewProduct {
                id: parse_id(&rest[0])?,
                name: rest[1].clone(),
                description: rest[2].clone(),
                category: rest[3].clone(),
                price: parse_number("price", &rest[4])?,
                quantity_in_stock: parse_number("quantity", &rest[5])?,
            }))
        }
        "get" => {
            expect_args(&cmd, &rest, 1)?;
            Ok(Command::Get(parse_id(&rest[0])?))
        }
        "list" => {
            expect_args(&cmd, &rest, 0)?;
            Ok(Command::List)
        }
        "categories" => {
            expect_args(&cmd, &rest, 0)?;
            Ok(Command::Categories)
        }
        "category" => {
            expect_args(&cmd, &rest, 1)?;
            Ok(Command::Category(rest[0].clone()))
        }
        "update" => {
            let Some((id, flags)) = rest.split_first() else {
                return Err("missing <id> for update".into());
            };
            Ok(Command::Update(parse_id(id)?, parse_changes(flags)?))
        }
        "delete" => {
            expect_args(&cmd, &rest, 1)?;
            Ok(Command::Delete(parse_id(&rest[0])?))
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!("unknown command: {}", other)),
    }
}

fn expect_args(cmd: &str, rest: &[String], n: usize) -> Result<(), String> {
    if rest.len() != n {
        return Err(format!(
            "{} expects {} argument(s), got {}",
            cmd,
            n,
            rest.len()
        ));
    }
    Ok(())
}

fn parse_id(s: &str) -> Result<ProductId, String> {
    s.parse::<i64>()
        .map(ProductId::new)
        .map_err(|_| format!("invalid product id: {}", s))
}

fn parse_number(field: &str, s: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .map_err(|_| format!("invalid {}: {}", field, s))
}

fn parse_changes(flags: &[String]) -> Result<ProductUpdate, String> {
    let mut changes = ProductUpdate::default();
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i].as_str();
        let Some(value) = flags.get(i + 1) else {
            return Err(format!("{} requires a value", flag));
        };
        match flag {
            "--name" => changes.name = Some(value.clone()),
            "--description" => changes.description = Some(value.clone()),
            "--price" => changes.price = Some(parse_number("price", value)?),
            "--quantity" => changes.quantity_in_stock = Some(parse_number("quantity", value)?),
            unk => return Err(format!("unknown argument: {}", unk)),
        }
        i += 2;
    }
    if changes.is_empty() {
        return Err("update needs at least one of --name, --description, --price, --quantity".into());
    }
    Ok(changes)
}
