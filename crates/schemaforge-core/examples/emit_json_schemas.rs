//! Print the JSON Schema of an artifact contract.
//!
//! `cargo run -p schemaforge-core --example emit_json_schemas -- [schema|catalog]`

use schemaforge_core::{CatalogSnapshot, SchemaDocument};
use schemars::schema_for;

fn main() {
    let contract = std::env::args().nth(1).unwrap_or_else(|| "schema".to_string());
    let root = match contract.as_str() {
        "schema" => schema_for!(SchemaDocument),
        "catalog" => schema_for!(CatalogSnapshot),
        other => {
            eprintln!("unknown contract {other:?}; expected `schema` or `catalog`");
            std::process::exit(2);
        }
    };
    let json = serde_json::to_string_pretty(&root).expect("serialize json schema");
    println!("{json}");
}
