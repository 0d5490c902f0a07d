use pricewatch_core::{update, AppState, Effect, GridField, GridRow, Msg, Notice, DEFAULT_GRID_ROWS};

#[test]
fn typing_urls_is_not_persisted() {
    let (mut state, effects) = update(AppState::new(), Msg::InputChanged("abc".to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.input_text(), "abc");
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn grid_paste_reports_rows_and_persists() {
    let (state, effects) = update(
        AppState::new(),
        Msg::GridPasted {
            start_row: 0,
            field: GridField::Url,
            text: "https://www.amazon.com/dp/A\t$10\nhttps://www.amazon.com/dp/B\t$20".to_string(),
        },
    );
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.grid()[1], GridRow::new("https://www.amazon.com/dp/B", "$20"));
    assert_eq!(
        state.notice(),
        Some(&Notice::Info("Pasted 2 rows successfully!".to_string()))
    );

    let (_, effects) = update(
        state,
        Msg::GridPasted {
            start_row: 0,
            field: GridField::Url,
            text: "\n  \n".to_string(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn grid_rows_can_be_added_deleted_and_cleared() {
    let (state, effects) = update(AppState::new(), Msg::GridRowAdded);
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.grid().len(), DEFAULT_GRID_ROWS + 1);

    let (state, _) = update(state, Msg::GridRowDeleted(0));
    assert_eq!(state.grid().len(), DEFAULT_GRID_ROWS);

    let (state, effects) = update(state, Msg::GridCleared);
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.grid(), &[GridRow::default()]);

    let (state, effects) = update(state, Msg::GridRowDeleted(0));
    assert!(effects.is_empty());
    assert_eq!(state.grid().len(), 1);
}

#[test]
fn csv_import_replaces_grid_or_reports_error() {
    let csv = "URL,Price\nhttps://www.amazon.com/dp/A,29.99\nhttps://www.amazon.com/dp/B,5";
    let (state, effects) = update(AppState::new(), Msg::CsvImported(csv.to_string()));
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.grid().len(), 2);
    assert_eq!(
        state.notice(),
        Some(&Notice::Info("Imported 2 products from CSV".to_string()))
    );

    let (state, effects) = update(state, Msg::CsvImported("URL,Price\n".to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.grid().len(), 2);
    assert_eq!(
        state.notice(),
        Some(&Notice::Error("No valid Amazon URLs found in CSV file".to_string()))
    );
}

#[test]
fn editing_a_missing_row_is_ignored() {
    let (_, effects) = update(
        AppState::new(),
        Msg::GridCellEdited {
            row: 99,
            field: GridField::Price,
            value: "1".to_string(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn paste_far_below_the_grid_is_ignored() {
    let (state, effects) = update(
        AppState::new(),
        Msg::GridPasted {
            start_row: usize::MAX,
            field: GridField::Url,
            text: "https://www.amazon.com/dp/A".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.grid().len(), DEFAULT_GRID_ROWS);
    assert_eq!(state.notice(), None);
}
