//! The `plotgrade eval` command.

use anyhow::{Context, Result};

use plotgrade_core::expr::Expr;

pub fn execute(expression: String, x: f64) -> Result<()> {
    let expr = Expr::parse(&expression).with_context(|| format!("invalid expression '{expression}'"))?;

    match expr.eval(x) {
        Ok(value) => println!("{value}"),
        Err(e) => println!("undefined at x = {x}: {e}"),
    }

    Ok(())
}
