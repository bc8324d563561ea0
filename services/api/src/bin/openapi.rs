//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3.0 specification for the dream journal API to
//! `openapi.json`, for clients that generate bindings from it.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const OUTPUT_PATH: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let spec = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(OUTPUT_PATH, spec)?;
    println!("OpenAPI specification written to {}", OUTPUT_PATH);
    Ok(())
}
