//! Plain-text rendering of the view model for the terminal.

use std::fmt::Write as _;

use pricewatch_core::{AppViewModel, Notice, RecordId, ResultRowView, SessionState, Signal};

pub fn notice_line(notice: &Notice) -> String {
    match notice {
        Notice::Info(text) => text.clone(),
        Notice::Error(text) => format!("error: {text}"),
    }
}

/// One line per finished record: `[3/10 30%] #3 Success $12.99 https://...`.
pub fn progress_line(view: &AppViewModel, row: &ResultRowView) -> String {
    format!(
        "[{}/{} {}%] #{} {} {} {}",
        view.stats.processed,
        view.stats.total,
        view.progress_percent,
        row.index,
        row.status_text,
        row.current_price,
        row.url
    )
}

pub fn session_label(session: SessionState) -> &'static str {
    match session {
        SessionState::Idle => "idle",
        SessionState::Running => "running",
        SessionState::Paused => "paused",
        SessionState::Completed => "completed",
    }
}

fn signal_label(signal: Signal) -> &'static str {
    match signal {
        Signal::OutOfStock => "out-of-stock",
        Signal::LowStock => "low-stock",
        Signal::LateDelivery => "late",
        Signal::PriceIncreased => "price-up",
    }
}

pub fn summary(view: &AppViewModel) -> String {
    let stats = view.stats;
    let enhanced = view.enhanced;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Session: {} ({}%)",
        session_label(view.session),
        view.progress_percent
    );
    let _ = writeln!(
        out,
        "Total {} | processed {} | success {} | failed {} | blocked {}",
        stats.total, stats.processed, stats.success, stats.failed, stats.blocked
    );
    let _ = writeln!(
        out,
        "Out of stock {} | late delivery {} | price increased {} | low stock {}",
        enhanced.out_of_stock, enhanced.late_delivery, enhanced.price_increased, enhanced.low_stock
    );
    out
}

pub fn results_table(view: &AppViewModel) -> String {
    rows_table(view.rows.iter())
}

/// Only the rows whose record id is in `ids`, as returned by `AppState::matching`.
pub fn highlighted_table(view: &AppViewModel, ids: &[RecordId]) -> String {
    rows_table(view.rows.iter().filter(|row| ids.contains(&row.id)))
}

fn rows_table<'a>(rows: impl Iterator<Item = &'a ResultRowView>) -> String {
    let mut out = String::new();
    for row in rows {
        let flags = row
            .signals
            .iter()
            .map(|signal| signal_label(*signal))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "{:>4}  {:<12} {:<10} {:<10} {:<26} {:<20} {}  {}",
            row.index,
            row.status_text,
            row.your_price,
            row.current_price,
            row.price_change,
            row.delivery,
            row.url,
            flags
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::{BatchStats, ItemStatus, PriceTrend, StockLevel};

    fn row() -> ResultRowView {
        ResultRowView {
            id: 2,
            index: 3,
            url: "https://www.amazon.com/dp/C".to_string(),
            your_price: "N/A".to_string(),
            current_price: "$12.99".to_string(),
            price_change: "N/A".to_string(),
            price_trend: PriceTrend::Flat,
            availability: "In Stock".to_string(),
            stock: StockLevel::InStock,
            delivery: "N/A".to_string(),
            status: ItemStatus::Success,
            status_text: "Success".to_string(),
            signals: vec![Signal::LowStock, Signal::LateDelivery],
        }
    }

    #[test]
    fn progress_line_shows_counts_and_row() {
        let view = AppViewModel {
            stats: BatchStats {
                total: 10,
                processed: 3,
                success: 3,
                ..BatchStats::default()
            },
            progress_percent: 30,
            ..AppViewModel::default()
        };
        assert_eq!(
            progress_line(&view, &row()),
            "[3/10 30%] #3 Success $12.99 https://www.amazon.com/dp/C"
        );
    }

    #[test]
    fn table_lists_signal_flags() {
        let view = AppViewModel {
            rows: vec![row()],
            ..AppViewModel::default()
        };
        assert!(results_table(&view).trim_end().ends_with("low-stock,late"));
    }

    #[test]
    fn highlighted_table_keeps_matching_rows_only() {
        let other = ResultRowView {
            id: 5,
            index: 6,
            url: "https://www.amazon.com/dp/F".to_string(),
            ..row()
        };
        let view = AppViewModel {
            rows: vec![row(), other],
            ..AppViewModel::default()
        };
        let table = highlighted_table(&view, &[5]);
        assert_eq!(table.lines().count(), 1);
        assert!(table.contains("https://www.amazon.com/dp/F"));
        assert!(highlighted_table(&view, &[]).is_empty());
    }
}
