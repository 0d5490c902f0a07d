use chrono::NaiveDate;
use pricewatch_core::{
    update, AppState, Effect, InFlight, Msg, ProductFields, ScrapeOutcome, SessionState,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

fn start(input: &str) -> AppState {
    let (state, _) = update(AppState::new(), Msg::InputChanged(input.to_string()));
    let (state, effects) = update(state, Msg::StartClicked { today: today() });
    assert!(matches!(effects.last(), Some(Effect::Scrape { id: 0, .. })));
    state
}

fn finish(state: AppState, id: usize) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::ScrapeFinished {
            id,
            outcome: ScrapeOutcome::Extracted(ProductFields {
                price: Some("$5.00".to_string()),
                ..ProductFields::default()
            }),
        },
    )
}

const THREE_URLS: &str =
    "https://www.amazon.com/dp/A\nhttps://www.amazon.com/dp/B\nhttps://www.amazon.com/dp/C";

#[test]
fn pause_lets_the_current_step_finish_without_scheduling_more() {
    let state = start(THREE_URLS);

    let (state, effects) = update(state, Msg::PauseClicked);
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.session(), SessionState::Paused);

    let (state, effects) = finish(state, 0);
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.in_flight(), InFlight::Nothing);
    assert_eq!(state.stats().processed, 1);

    let (state, effects) = update(state, Msg::ResumeClicked);
    assert_eq!(state.session(), SessionState::Running);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Persist, Effect::Scrape { id: 1, .. }]
    ));
}

#[test]
fn pause_during_delay_holds_the_next_step() {
    let state = start(THREE_URLS);
    let (state, effects) = finish(state, 0);
    assert_eq!(effects, vec![Effect::Persist, Effect::Delay]);

    let (state, _) = update(state, Msg::PauseClicked);
    let (state, effects) = update(state, Msg::DelayElapsed);
    assert!(effects.is_empty());
    assert_eq!(state.in_flight(), InFlight::Nothing);

    let (_, effects) = update(state, Msg::ResumeClicked);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Persist, Effect::Scrape { id: 1, .. }]
    ));
}

#[test]
fn resume_with_step_in_flight_waits_for_its_report() {
    let state = start(THREE_URLS);
    let (state, _) = update(state, Msg::PauseClicked);
    let (state, effects) = update(state, Msg::ResumeClicked);
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.in_flight(), InFlight::Scrape(0));

    let (_, effects) = finish(state, 0);
    assert_eq!(effects, vec![Effect::Persist, Effect::Delay]);
}

#[test]
fn resume_after_last_step_completes_the_batch() {
    let state = start("https://www.amazon.com/dp/A");
    let (state, _) = update(state, Msg::PauseClicked);
    let (state, _) = finish(state, 0);
    assert_eq!(state.session(), SessionState::Paused);

    let (state, effects) = update(state, Msg::ResumeClicked);
    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.session(), SessionState::Completed);
}

#[test]
fn pause_and_resume_are_ignored_in_the_wrong_state() {
    let (state, effects) = update(AppState::new(), Msg::PauseClicked);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::ResumeClicked);
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);

    let state = start(THREE_URLS);
    let (_, effects) = update(state, Msg::ResumeClicked);
    assert!(effects.is_empty());
}

#[test]
fn autosave_fires_only_while_running() {
    let state = start(THREE_URLS);
    let (state, effects) = update(state, Msg::AutosaveTick);
    assert_eq!(effects, vec![Effect::Persist]);

    let (state, _) = update(state, Msg::PauseClicked);
    let (_, effects) = update(state, Msg::AutosaveTick);
    assert!(effects.is_empty());
}
