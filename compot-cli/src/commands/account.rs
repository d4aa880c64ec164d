use super::Context;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use compot_core::views::recent_transactions;
use compot_core::Money;
use dialoguer::Confirm;

pub fn show_balance(ctx: &Context) -> Result<()> {
    let state = ctx.ledger.state()?;

    println!("Account for {} <{}>:", state.user.name, state.user.email);
    println!("  Balance: {}", state.balance);
    println!("  Next ticket: #{}", state.next_ticket_no);
    Ok(())
}

pub fn top_up(ctx: &Context, amount: &str) -> Result<()> {
    let amount: Money = amount.parse()?;
    ctx.ledger.top_up(amount)?;
    println!("Added {} to your account.", amount);
    Ok(())
}

pub fn show_transactions(ctx: &Context) -> Result<()> {
    let state = ctx.ledger.state()?;
    let transactions = recent_transactions(&state);

    if transactions.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Date", "Description", "Amount"]);

    for tx in transactions {
        table.add_row(vec![
            tx.date.clone(),
            tx.description.clone(),
            tx.amount.signed(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn reset(ctx: &Context, force: bool) -> Result<()> {
    if !force {
        let confirm = Confirm::new()
            .with_prompt("Discard your balance, tickets and history? This action cannot be undone.")
            .default(false)
            .interact()?;

        if !confirm {
            println!("Reset cancelled.");
            return Ok(());
        }
    }

    ctx.ledger.reset()?;
    println!("Account reset to the demo data.");
    Ok(())
}
