//! Print the OpenAPI document as JSON, or write it to a file.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use crm_backend::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Export the CRM OpenAPI document")]
struct Args {
    /// Write to this path instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Emit YAML instead of JSON.
    #[arg(long)]
    yaml: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let doc = ApiDoc::openapi();
    let rendered = if args.yaml {
        doc.to_yaml().wrap_err("failed to render OpenAPI YAML")?
    } else {
        doc.to_pretty_json()
            .wrap_err("failed to render OpenAPI JSON")?
    };

    match args.output {
        Some(path) => std::fs::write(&path, rendered)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{rendered}").wrap_err("failed to write to stdout")?;
        }
    }
    Ok(())
}
