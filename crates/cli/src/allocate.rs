use alloy_primitives::{Address, address};
use castpos_core::{
    checkout::TreasuryView,
    explorer::{short_address, tx_url},
    request::{format_amount, parse_balance},
    settings::Settings,
    treasury::{AllocationState, Allocator, parse_target},
    wallet::{SandboxOutcome, SandboxWallet},
};
use console::style;

use crate::{Context, surplus::print_treasury};

/// Connected wallet used when no merchant_address is configured
const SANDBOX_MERCHANT: Address = address!("0x1111111111111111111111111111111111111111");

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutcomeArg {
    Settle,
    Reject,
    Timeout,
}

impl From<OutcomeArg> for SandboxOutcome {
    fn from(outcome: OutcomeArg) -> Self {
        match outcome {
            OutcomeArg::Settle => SandboxOutcome::Settle,
            OutcomeArg::Reject => SandboxOutcome::RejectSubmission("user rejected the request".to_string()),
            OutcomeArg::Timeout => SandboxOutcome::TimeOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq, clap::Args)]
pub struct AllocateCommand {
    /// Merchant balance held by the sandbox wallet, in whole token units
    #[arg(long)]
    pub sandbox_balance: String,

    /// Operating target in whole token units (default: operating_target from settings)
    #[arg(long)]
    pub target: Option<String>,

    /// How the sandbox wallet answers the transfer
    #[arg(long, value_enum, default_value = "settle")]
    pub outcome: OutcomeArg,
}

fn describe(state: &AllocationState, settings: &Settings) -> String {
    let decimals = settings.token_decimals;
    match state {
        AllocationState::Idle => "idle".to_string(),
        AllocationState::Submitting { amount, reserve } => format!(
            "→ submitting ${} to {}",
            format_amount(*amount, decimals),
            short_address(&reserve.to_checksum(None), 4)
        ),
        AllocationState::Confirming { handle, .. } => {
            format!("→ confirming {}", short_address(&handle.to_string(), 6))
        }
        AllocationState::Settled { amount, handle, .. } => format!(
            "{} ${} transferred to reserve wallet\n  {}",
            style("✓").green(),
            format_amount(*amount, decimals),
            tx_url(settings.block_explorer.as_str(), handle)
        ),
        AllocationState::Failed { failure, .. } => {
            format!("{} {}", style("✗").red(), failure)
        }
    }
}

impl AllocateCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<(), String> {
        let settings = &ctx.settings;
        let balance =
            parse_balance(&self.sandbox_balance, settings.token_decimals).map_err(|e| e.to_string())?;
        let target_input = self.target.as_deref().unwrap_or(&settings.operating_target);

        let merchant = settings.merchant_address.unwrap_or(SANDBOX_MERCHANT);
        let wallet = SandboxWallet::new(Some(merchant))
            .with_balance(settings.token_address, merchant, balance)
            .with_outcome(self.outcome.into());
        let mut allocator = Allocator::new(wallet, settings.token_address, settings.reserve_address);

        let target = parse_target(target_input, settings.token_decimals);
        let result = allocator.refresh(&target).await.map_err(|e| e.to_string())?;
        let view = TreasuryView::derive(
            balance,
            target_input,
            settings.reserve_configured(),
            settings.token_decimals,
        );
        print_treasury(&view, target_input);
        if !result.eligible {
            return Err(
                "Nothing to allocate: no surplus or no reserve address configured".to_string(),
            );
        }

        let end = allocator
            .allocate_with(&result, |state| println!("  {}", describe(state, settings)))
            .await
            .map_err(|e| e.to_string())?
            .clone();
        println!();

        match end {
            AllocationState::Settled { .. } => {
                let after = allocator.refresh(&target).await.map_err(|e| e.to_string())?;
                let remaining = allocator
                    .wallet()
                    .balance_of(settings.token_address, merchant);
                println!(
                    "  {} ${} (surplus ${})",
                    style("Balance now:").dim(),
                    format_amount(remaining, settings.token_decimals),
                    format_amount(after.surplus, settings.token_decimals)
                );
                println!();
                Ok(())
            }
            AllocationState::Failed { failure, .. } => Err(failure.to_string()),
            other => Err(format!("Allocation ended while {}", other.name())),
        }
    }
}
