use super::Context;
use anyhow::Result;
use compot_games::{BoxSlot, GameError, PickABox, ScratchCard, ScratchOutcome, SpinWheel};

/// Brush used when the CLI scratches a card for the player.
const BRUSH_RADIUS: f64 = 20.0;

pub fn scratch(ctx: &mut Context) -> Result<()> {
    let mut card = ScratchCard::new(&ctx.games);
    card.play(&ctx.ledger, ctx.rng.as_mut())?;

    println!("Scratching...");
    let (width, height) = (card.mask().width(), card.mask().height());
    let step = (BRUSH_RADIUS as usize).max(1);

    let mut outcome = None;
    'sweep: for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            let cx = x as f64 + BRUSH_RADIUS / 2.0;
            let cy = y as f64 + BRUSH_RADIUS / 2.0;
            if let Some(resolved) = card.scratch(cx, cy, BRUSH_RADIUS, &ctx.ledger)? {
                outcome = Some(resolved);
                break 'sweep;
            }
        }
    }

    let outcome = outcome.ok_or_else(|| GameError::invalid_state("card never revealed"))?;
    if let Some(symbols) = card.symbols() {
        let glyphs: Vec<&str> = symbols.iter().map(|s| s.glyph()).collect();
        println!("  {}", glyphs.join("  "));
    }

    match outcome {
        ScratchOutcome::Win(prize) => println!("You won {}!", prize),
        ScratchOutcome::Lose => println!("No match this time."),
    }
    Ok(())
}

fn render_box(number: usize, slot: &BoxSlot) -> String {
    match slot.label {
        Some(prize) => format!("[{}]", prize),
        None => format!("[ {} ]", number),
    }
}

pub fn pick_box(ctx: &mut Context, number: usize) -> Result<()> {
    let mut game = PickABox::new(&ctx.games);
    let count = game.boxes().len();
    let index = number
        .checked_sub(1)
        .ok_or(GameError::InvalidBox { index: 0, count })?;

    let pick = game.pick(index, &ctx.ledger, ctx.rng.as_mut())?;

    let row: Vec<String> = game
        .boxes()
        .iter()
        .enumerate()
        .map(|(i, slot)| render_box(i + 1, slot))
        .collect();
    println!("{}", row.join(" "));

    if pick.is_win() {
        println!("Box {} holds {}!", number, pick.prize);
    } else {
        println!("Box {} is empty.", number);
    }
    Ok(())
}

pub async fn spin(ctx: &mut Context) -> Result<()> {
    let mut wheel = SpinWheel::new(&ctx.games)?;
    let plan = wheel.spin(&ctx.ledger, ctx.rng.as_mut())?;
    println!(
        "Spinning {:.0} degrees ({} extra turn(s))...",
        plan.target_angle, plan.extra_turns
    );

    let finished = tokio::select! {
        result = wheel.await_result() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(result) = finished else {
        wheel.teardown();
        println!("Spin abandoned; the stake is not refunded.");
        return Ok(());
    };
    let outcome = result?;

    match outcome {
        Some(outcome) if outcome.is_win() => println!("The wheel stops on {}!", outcome.prize),
        Some(_) => println!("The wheel stops on {}. Better luck next time.", plan.prize),
        None => println!("The wheel stopped without a result."),
    }
    Ok(())
}
