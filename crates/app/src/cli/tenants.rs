use std::path::PathBuf;

use checkout_app::fixtures::Fixtures;
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct TenantsArgs {
    /// YAML fixture file describing tenants, catalog and rules
    #[arg(long, env = "CHECKOUT_FIXTURE")]
    fixture: PathBuf,
}

pub(crate) fn run(args: &TenantsArgs) -> Result<(), String> {
    let fixtures = Fixtures::load(&args.fixture)
        .map_err(|error| format!("failed to load {}: {error}", args.fixture.display()))?;

    for tenant in fixtures.tenant_records() {
        println!("{}\t{}", tenant.uuid, tenant.name);
    }

    Ok(())
}
