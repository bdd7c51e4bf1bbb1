use castpos_core::manifest::{build_manifest, start_server};
use castpos_types::constants::{DEFAULT_BINDING_ADDRESS, DEFAULT_MANIFEST_PORT, MANIFEST_PATH};
use console::style;

use crate::Context;

#[derive(Debug, Clone, PartialEq, clap::Args)]
pub struct ServeCommand {
    /// Port to run the manifest service on
    #[arg(long, default_value_t = DEFAULT_MANIFEST_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, default_value = DEFAULT_BINDING_ADDRESS)]
    pub binding_address: String,
}

impl ServeCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let manifest = build_manifest(&ctx.settings);
        if manifest.account_association.signature.is_empty() {
            eprintln!(
                "{} account association is empty; set it in {} or CASTPOS_FARCASTER_*",
                style("Warning:").yellow(),
                ctx.config_path.display()
            );
        }

        println!();
        println!("{}", style("Cast-POS manifest service").bold());
        println!(
            "  {} http://{}:{}{}",
            style("Manifest:").dim(),
            self.binding_address,
            self.port,
            MANIFEST_PATH
        );
        println!(
            "  {} {}",
            style("App URL: ").dim(),
            manifest.frame.home_url
        );
        println!();

        start_server(manifest, &self.binding_address, self.port)
            .await
            .map_err(|e| e.to_string())
    }
}
