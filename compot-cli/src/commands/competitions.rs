use super::Context;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use compot_core::views::{active_tickets, progress_percent, recent_tickets};
use compot_core::{buy_from_listing, CoreError, State, TicketRecord};
use dialoguer::Confirm;

pub fn list(ctx: &Context) -> Result<()> {
    let state = ctx.ledger.state()?;

    if state.competitions.is_empty() {
        println!("No competitions running.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Price", "Sold", "Left", "Progress", "Odds", "Ends"]);

    for (id, comp) in &state.competitions {
        let left = if comp.is_sold_out() {
            "Sold out".to_string()
        } else {
            comp.remaining().to_string()
        };
        table.add_row(vec![
            id.clone(),
            comp.price_per_ticket.to_string(),
            format!("{}/{}", comp.sold, comp.cap),
            left,
            format!("{}%", progress_percent(comp)),
            comp.odds.clone(),
            comp.ends_label.clone(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

/// Name shown on tickets: the one used on earlier tickets, else the ID.
fn display_name(state: &State, competition_id: &str) -> String {
    state
        .tickets
        .iter()
        .find(|t| t.competition_id == competition_id)
        .map(|t| t.competition_name.clone())
        .unwrap_or_else(|| competition_id.to_string())
}

pub fn buy(
    ctx: &Context,
    competition_id: &str,
    quantity: u32,
    name: Option<&str>,
    yes: bool,
) -> Result<()> {
    let state = ctx.ledger.state()?;
    let competition =
        state
            .competitions
            .get(competition_id)
            .ok_or_else(|| CoreError::UnknownCompetition {
                id: competition_id.to_string(),
            })?;
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| display_name(&state, competition_id));

    if quantity > competition.remaining() {
        println!(
            "Note: only {} ticket(s) left in '{}'; the draw counter stops at {}.",
            competition.remaining(),
            competition_id,
            competition.cap
        );
    }

    if !yes {
        let total = competition
            .price_per_ticket
            .checked_mul(quantity)
            .ok_or_else(|| CoreError::invalid_amount("order total overflows"))?;
        let confirm = Confirm::new()
            .with_prompt(format!(
                "Buy {} ticket(s) for '{}' at {} each ({} total)?",
                quantity, name, competition.price_per_ticket, total
            ))
            .default(true)
            .interact()?;

        if !confirm {
            println!("Purchase cancelled.");
            return Ok(());
        }
    }

    let record = buy_from_listing(&ctx.ledger, competition_id, &name, quantity)?;
    println!(
        "Purchased {} ticket(s) for '{}': {}",
        record.quantity, record.competition_name, record.range
    );
    Ok(())
}

fn ticket_table<'a>(tickets: impl IntoIterator<Item = &'a TicketRecord>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Competition", "Tickets", "Qty", "Status"]);

    for ticket in tickets {
        table.add_row(vec![
            ticket.competition_name.clone(),
            ticket.range.to_string(),
            ticket.quantity.to_string(),
            format!("{:?}", ticket.status),
        ]);
    }
    table
}

pub fn show_tickets(ctx: &Context, all: bool) -> Result<()> {
    let state = ctx.ledger.state()?;

    let tickets: Vec<&TicketRecord> = if all {
        recent_tickets(&state).iter().collect()
    } else {
        active_tickets(&state)
    };

    if tickets.is_empty() {
        println!("No tickets yet.");
        println!("Buy some with: compot buy <competition> <quantity>");
        return Ok(());
    }

    println!("{}", ticket_table(tickets));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_reuses_earlier_ticket_name() {
        let state = State::default();
        assert_eq!(display_name(&state, "weekly-1000"), "Weekly Community Draw");
        assert_eq!(display_name(&state, "brand-new"), "brand-new");
    }
}
