//! Plain-text rendering of profit and budget tables.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sales_core::{BudgetLine, CurrencyConfig};
use sales_sim::ProfitRow;

const UNIT_SUFFIXES: [&str; 6] = ["", "k", "M", "G", "T", "P"];

/// Default width of the numeric part of a currency cell.
pub const CURRENCY_WIDTH: usize = 11;

/// Shorten a count with a metric suffix, e.g. `814000` -> `814.000 k`.
pub fn units_format(num: f64) -> String {
    let mut n = num;
    let mut magnitude = 0;
    while n.abs() >= 1000.0 && magnitude + 1 < UNIT_SUFFIXES.len() {
        magnitude += 1;
        n /= 1000.0;
    }
    format!("{n:.3} {}", UNIT_SUFFIXES[magnitude])
        .trim_end()
        .to_string()
}

/// Whole currency units with thousands separators, right-aligned after the sign.
pub fn currency_format(amount: Decimal, sign: &str, width: usize) -> String {
    let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let digits = whole.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole.is_sign_negative() && !whole.is_zero() {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign} {grouped:>width$}")
}

/// Truncate a simulated revenue to whole units.
pub fn whole_units(revenue: f64) -> Decimal {
    Decimal::from_f64(revenue.trunc()).unwrap_or(Decimal::ZERO)
}

#[derive(Clone, Copy, PartialEq)]
enum Align {
    Left,
    Right,
}

/// Minimal box-drawn table: header, body sections, optional caption.
struct Table {
    title: Option<String>,
    headers: Vec<String>,
    align: Vec<Align>,
    sections: Vec<Vec<Vec<String>>>,
    caption: Option<String>,
}

impl Table {
    fn new(headers: &[&str], align: &[Align]) -> Self {
        Self {
            title: None,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            align: align.to_vec(),
            sections: vec![Vec::new()],
            caption: None,
        }
    }

    fn add_row(&mut self, row: Vec<String>) {
        if let Some(section) = self.sections.last_mut() {
            section.push(row);
        }
    }

    fn add_section(&mut self) {
        self.sections.push(Vec::new());
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in self.sections.iter().flatten() {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths
    }

    fn line(widths: &[usize], left: char, mid: char, right: char) -> String {
        let mut s = String::new();
        s.push(left);
        for (i, w) in widths.iter().enumerate() {
            if i > 0 {
                s.push(mid);
            }
            s.extend(std::iter::repeat('─').take(w + 2));
        }
        s.push(right);
        s.push('\n');
        s
    }

    fn cells(&self, widths: &[usize], row: &[String]) -> String {
        let mut s = String::from("│");
        for (i, w) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let pad = w - cell.chars().count();
            let (l, r) = match self.align.get(i).copied().unwrap_or(Align::Left) {
                Align::Left => (0, pad),
                Align::Right => (pad, 0),
            };
            s.push(' ');
            s.push_str(&" ".repeat(l));
            s.push_str(cell);
            s.push_str(&" ".repeat(r));
            s.push_str(" │");
        }
        s.push('\n');
        s
    }

    fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        if let Some(title) = &self.title {
            let total: usize = widths.iter().map(|w| w + 3).sum::<usize>() + 1;
            let pad = total.saturating_sub(title.chars().count()) / 2;
            out.push_str(&" ".repeat(pad));
            out.push_str(title);
            out.push('\n');
        }
        out.push_str(&Self::line(&widths, '╭', '┬', '╮'));
        out.push_str(&self.cells(&widths, &self.headers));
        for section in self.sections.iter().filter(|s| !s.is_empty()) {
            out.push_str(&Self::line(&widths, '├', '┼', '┤'));
            for row in section {
                out.push_str(&self.cells(&widths, row));
            }
        }
        out.push_str(&Self::line(&widths, '╰', '┴', '╯'));
        if let Some(caption) = &self.caption {
            out.push_str(caption);
            out.push('\n');
        }
        out
    }
}

/// Revenue per estimate in local and reference currency; summary rows go in their own section.
pub fn profit_table(title: &str, rows: &[ProfitRow], currency: &CurrencyConfig) -> String {
    let local_header = format!("Revenue ({})", currency.local_code);
    let reference_header = format!("Revenue ({})", currency.reference_code);
    let mut table = Table::new(
        &[
            "Source",
            "Units sold",
            local_header.as_str(),
            reference_header.as_str(),
        ],
        &[Align::Right, Align::Right, Align::Right, Align::Right],
    );
    table.title = Some(format!("{title} profit estimate"));
    table.caption = Some("* platform fee is included in the figures".into());

    let mut in_summary = false;
    for row in rows {
        if row.kind.is_derived() && !in_summary {
            table.add_section();
            in_summary = true;
        }
        let local = whole_units(row.net_revenue);
        let reference = whole_units(currency.to_reference(row.net_revenue));
        table.add_row(vec![
            row.label.clone(),
            units_format(row.display_units),
            currency_format(local, &currency.local_sign, CURRENCY_WIDTH),
            currency_format(reference, &currency.reference_sign, CURRENCY_WIDTH),
        ]);
    }
    table.render()
}

pub fn budget_table(title: &str, budget: &[BudgetLine], currency: &CurrencyConfig) -> String {
    let mut table = Table::new(&[title, "Budget"], &[Align::Right, Align::Right]);
    for line in budget {
        table.add_row(vec![
            line.label.clone(),
            currency_format(line.amount, &currency.reference_sign, CURRENCY_WIDTH),
        ]);
    }
    table.render()
}
