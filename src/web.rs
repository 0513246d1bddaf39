//! JavaScript bindings for the game's React front end
//!
//! One store of each kind lives per page, bound to LocalStorage.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::records::{PlayerClass, RecordStore};
use crate::tutorial::{Tutorial, TutorialState};

thread_local! {
    static RECORDS: RefCell<RecordStore> = RefCell::new(RecordStore::new());
    static TUTORIAL: RefCell<Tutorial> = RefCell::new(Tutorial::new());
    static TUTORIAL_STATE: RefCell<TutorialState> = RefCell::new(TutorialState::new(false));
}

/// Install the console logger and panic hook. Safe to call more than once.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already installed");
    }
}

/// Save a stage clear. Returns true when it is a new best for the class.
#[wasm_bindgen(js_name = recordClear)]
pub fn record_clear(time_ms: f64, player_class: &str) -> bool {
    let Some(class) = PlayerClass::from_str(player_class) else {
        log::warn!("Unknown player class: {player_class}");
        return false;
    };
    RECORDS.with(|store| store.borrow().record_clear(time_ms.max(0.0) as u64, class).is_new_best)
}

/// Best records as a JSON object keyed by class
#[wasm_bindgen(js_name = bestRecordsJson)]
pub fn best_records_json() -> String {
    RECORDS.with(|store| {
        let records = store.borrow().load_best_records();
        serde_json::to_string(&records).unwrap_or_else(|_| "{}".to_string())
    })
}

#[wasm_bindgen(js_name = clearRecords)]
pub fn clear_records() {
    RECORDS.with(|store| store.borrow().clear_records());
}

#[wasm_bindgen(js_name = initTutorial)]
pub fn init_tutorial() -> bool {
    let state = TUTORIAL.with(|t| t.borrow().init());
    TUTORIAL_STATE.with(|s| *s.borrow_mut() = state);
    state.is_visible
}

/// Report a player action; advances the tutorial when it matches the current step.
/// Returns whether the tutorial advanced.
#[wasm_bindgen(js_name = tutorialAction)]
pub fn tutorial_action(action: &str) -> bool {
    TUTORIAL_STATE.with(|s| {
        let state = *s.borrow();
        if !state.should_advance(action) {
            return false;
        }
        *s.borrow_mut() = TUTORIAL.with(|t| t.borrow().advance(state));
        true
    })
}

#[wasm_bindgen(js_name = skipTutorial)]
pub fn skip_tutorial() {
    TUTORIAL_STATE.with(|s| {
        let state = *s.borrow();
        *s.borrow_mut() = TUTORIAL.with(|t| t.borrow().skip(state));
    });
}

#[wasm_bindgen(js_name = toggleTutorial)]
pub fn toggle_tutorial() -> bool {
    TUTORIAL_STATE.with(|s| {
        let state = s.borrow().toggle_visibility();
        *s.borrow_mut() = state;
        state.is_visible
    })
}

/// Title of the step on screen, if any
#[wasm_bindgen(js_name = tutorialTitle)]
pub fn tutorial_title() -> Option<String> {
    TUTORIAL_STATE.with(|s| s.borrow().text().map(|t| t.title.to_string()))
}

/// Body text of the step on screen, if any
#[wasm_bindgen(js_name = tutorialText)]
pub fn tutorial_text() -> Option<String> {
    TUTORIAL_STATE.with(|s| s.borrow().text().map(|t| t.text.to_string()))
}

#[wasm_bindgen(js_name = tutorialProgress)]
pub fn tutorial_progress() -> f32 {
    TUTORIAL_STATE.with(|s| s.borrow().progress())
}
