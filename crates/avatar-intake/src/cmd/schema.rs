use anyhow::Result;
use clap::Args;
use intake_spec::CatalogSpec;

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Compact output
    #[arg(long = "compact", default_value_t = false)]
    pub compact: bool,
}

pub fn run(args: &SchemaArgs) -> Result<()> {
    let schema = schemars::schema_for!(CatalogSpec);
    let rendered = if args.compact {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };
    println!("{rendered}");
    Ok(())
}
