use alloy_primitives::Address;
use castpos_core::{
    checkout::{CheckoutView, new_order_id},
    explorer::{address_url, short_address},
    request::format_amount,
    settings::Settings,
};
use console::style;

use crate::Context;

#[derive(Debug, Clone, PartialEq, clap::Args)]
pub struct RequestCommand {
    /// Amount to charge, e.g. 12.50
    pub amount: String,

    /// Address that receives the payment (default: merchant_address from settings)
    #[arg(long)]
    pub recipient: Option<String>,
}

/// The explicit `--recipient` wins over the configured merchant
fn resolve_recipient(arg: Option<&str>, settings: &Settings) -> Result<Option<Address>, String> {
    match arg {
        Some(value) => value
            .trim()
            .parse::<Address>()
            .map(Some)
            .map_err(|e| format!("Invalid recipient '{}': {}", value, e)),
        None => Ok(settings.merchant_address),
    }
}

impl RequestCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let settings = &ctx.settings;
        let recipient = resolve_recipient(self.recipient.as_deref(), settings)?;

        let view = CheckoutView::derive(&self.amount, recipient, settings);
        let request = match &view {
            CheckoutView::Ready { request, .. } => request,
            CheckoutView::Idle => return Err("Enter an amount to request".to_string()),
            other => {
                return Err(other
                    .error_message()
                    .unwrap_or("Could not build payment request")
                    .to_string());
            }
        };

        let recipient = request.recipient_address.to_checksum(None);
        println!();
        println!("{}", style("Payment request").bold());
        println!("  {} {}", style("Order:    ").dim(), new_order_id());
        println!(
            "  {} ${}",
            style("Amount:   ").dim(),
            format_amount(request.amount, settings.token_decimals)
        );
        println!(
            "  {} {}",
            style("Recipient:").dim(),
            short_address(&recipient, 4)
        );
        println!(
            "  {} {}",
            style("Explorer: ").dim(),
            address_url(settings.block_explorer.as_str(), &recipient)
        );
        println!();
        println!("{}", style(view.uri().unwrap_or_default()).green());
        println!();

        Ok(())
    }
}
