use crate::input::{paste_into_grid, parse_csv_import, GridRow};
use crate::{AppState, Effect, Msg, Notice, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input_text(text);
            Vec::new()
        }
        Msg::InputModeSelected(mode) => {
            state.set_input_mode(mode);
            vec![Effect::Persist]
        }
        Msg::GridCellEdited { row, field, value } => {
            if state.edit_grid_cell(row, field, value) {
                vec![Effect::Persist]
            } else {
                Vec::new()
            }
        }
        Msg::GridPasted {
            start_row,
            field,
            text,
        } => {
            let pasted = paste_into_grid(state.grid_mut(), start_row, field, &text);
            if pasted == 0 {
                return (state, Vec::new());
            }
            state.set_notice(Notice::Info(format!("Pasted {pasted} rows successfully!")));
            vec![Effect::Persist]
        }
        Msg::GridRowAdded => {
            state.grid_mut().push(GridRow::default());
            vec![Effect::Persist]
        }
        Msg::GridRowDeleted(row) => {
            // The grid always keeps at least one row.
            if state.grid().len() > 1 && row < state.grid().len() {
                state.grid_mut().remove(row);
                vec![Effect::Persist]
            } else {
                Vec::new()
            }
        }
        Msg::GridCleared => {
            state.replace_grid(vec![GridRow::default()]);
            vec![Effect::Persist]
        }
        Msg::CsvImported(csv) => match parse_csv_import(&csv) {
            Ok(rows) => {
                let imported = rows.len();
                state.replace_grid(rows);
                state.set_notice(Notice::Info(format!(
                    "Imported {imported} products from CSV"
                )));
                vec![Effect::Persist]
            }
            Err(err) => {
                state.set_notice(Notice::Error(err.to_string()));
                Vec::new()
            }
        },
        Msg::StartClicked { today } => {
            match state.session() {
                SessionState::Idle | SessionState::Completed => {}
                SessionState::Running | SessionState::Paused => return (state, Vec::new()),
            }
            let requests = match state.collect_requests() {
                Ok(requests) => requests,
                Err(err) => {
                    state.set_notice(Notice::Error(err.to_string()));
                    return (state, Vec::new());
                }
            };
            state.set_notice(Notice::Info(format!(
                "Found {} valid products. Starting analysis...",
                requests.len()
            )));
            state.start_batch(requests, today);

            let mut effects = vec![Effect::Persist];
            effects.extend(state.advance());
            effects
        }
        Msg::PauseClicked => {
            if state.pause() {
                vec![Effect::Persist]
            } else {
                Vec::new()
            }
        }
        Msg::ResumeClicked => {
            if !state.resume() {
                return (state, Vec::new());
            }
            let mut effects = vec![Effect::Persist];
            // An outstanding fetch or delay picks the loop back up when it reports.
            if state.in_flight() == crate::InFlight::Nothing {
                effects.extend(state.advance());
            }
            effects
        }
        Msg::ScrapeFinished { id, outcome } => {
            if !state.finish_step(id, outcome) {
                return (state, Vec::new());
            }
            let mut effects = vec![Effect::Persist];
            if state.session() == SessionState::Running {
                if state.has_pending() {
                    state.wait_for_delay();
                    effects.push(Effect::Delay);
                } else {
                    // Completes the batch; the persist above sees the final state.
                    let next = state.advance();
                    debug_assert!(next.is_none());
                }
            }
            effects
        }
        Msg::DelayElapsed => {
            if !state.finish_delay() || state.session() != SessionState::Running {
                return (state, Vec::new());
            }
            match state.advance() {
                Some(scrape) => vec![scrape],
                None => vec![Effect::Persist],
            }
        }
        Msg::AutosaveTick => {
            if state.is_processing() {
                vec![Effect::Persist]
            } else {
                Vec::new()
            }
        }
        Msg::RestoreSnapshot { snapshot, today } => {
            if state.session() != SessionState::Idle {
                return (state, Vec::new());
            }
            state.restore(*snapshot, today);
            if state.session() == SessionState::Running {
                let mut effects = vec![Effect::Persist];
                effects.extend(state.advance());
                effects
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
