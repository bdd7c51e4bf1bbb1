use std::str::FromStr;

use castpos_core::{
    checkout::TreasuryView,
    request::parse_balance,
    settings::Settings,
    wallet::{RpcWallet, WalletProvider},
};
use castpos_types::CurrencyAmount;
use console::style;

use crate::Context;

#[derive(Debug, Clone, PartialEq, clap::Args)]
pub struct SurplusCommand {
    /// Current balance in whole token units, e.g. 1500.25
    #[arg(long, conflicts_with = "balance_units")]
    pub balance: Option<String>,

    /// Current balance in minor units
    #[arg(long)]
    pub balance_units: Option<String>,

    /// Operating target in whole token units (default: operating_target from settings)
    #[arg(long)]
    pub target: Option<String>,
}

impl SurplusCommand {
    async fn resolve_balance(&self, settings: &Settings) -> Result<CurrencyAmount, String> {
        if let Some(balance) = &self.balance {
            return parse_balance(balance, settings.token_decimals).map_err(|e| e.to_string());
        }
        if let Some(units) = &self.balance_units {
            return CurrencyAmount::from_str(units.trim()).map_err(|e| e.to_string());
        }

        let rpc_url = settings.rpc_url.clone().ok_or(
            "No balance given: pass --balance, --balance-units or configure rpc_url",
        )?;
        let merchant = settings
            .merchant_address
            .ok_or("Reading the balance over RPC needs merchant_address to be configured")?;
        RpcWallet::new(rpc_url, Some(merchant))
            .token_balance(settings.token_address, merchant)
            .await
            .map_err(|e| e.to_string())
    }

    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let settings = &ctx.settings;
        let balance = self.resolve_balance(settings).await?;
        let target = self.target.as_deref().unwrap_or(&settings.operating_target);

        let view = TreasuryView::derive(
            balance,
            target,
            settings.reserve_configured(),
            settings.token_decimals,
        );
        print_treasury(&view, target);

        Ok(())
    }
}

pub fn print_treasury(view: &TreasuryView, target: &str) {
    println!();
    println!("{}", style("Treasury").bold());
    println!("  {} ${}", style("Balance:").dim(), view.balance);
    if view.target_degraded {
        println!(
            "  {} {} {}",
            style("Target: ").dim(),
            target,
            style("(not a valid amount, surplus set to zero)").yellow()
        );
    } else {
        println!("  {} ${}", style("Target: ").dim(), target);
    }
    println!("  {} ${}", style("Surplus:").dim(), style(&view.surplus).green());
    if let Some(hint) = view.hint {
        println!("  {}", style(hint).dim());
    }
    println!();
}
