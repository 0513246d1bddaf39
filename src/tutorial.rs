//! First-run tutorial
//!
//! A fixed, linear list of steps. State values are replaced on every
//! transition; only the completion flag is persisted.

use std::rc::Rc;

use crate::persistence::{ProviderSlot, keys};
use crate::platform::StorageProvider;

/// Value stored under the completion key
const COMPLETED_FLAG: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TutorialStepId {
    Movement,
    Attack,
    Map,
    Item,
    Trap,
    Goal,
}

/// One instructional step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialStep {
    pub id: TutorialStepId,
    pub title: &'static str,
    pub text: &'static str,
    /// Player action that completes this step
    pub condition: &'static str,
}

/// Title and body of the step on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialText {
    pub title: &'static str,
    pub text: &'static str,
}

pub static TUTORIAL_STEPS: [TutorialStep; 6] = [
    TutorialStep {
        id: TutorialStepId::Movement,
        title: "Movement",
        text: "Move with WASD or the arrow keys.",
        condition: "move",
    },
    TutorialStep {
        id: TutorialStepId::Attack,
        title: "Attack",
        text: "Press Space to attack. Get close to an enemy and strike.",
        condition: "attack",
    },
    TutorialStep {
        id: TutorialStepId::Map,
        title: "Map",
        text: "Press M to toggle the minimap. Hold Tab to see the whole map.",
        condition: "map",
    },
    TutorialStep {
        id: TutorialStepId::Item,
        title: "Items",
        text: "Walk over items to pick them up. Healing items restore HP.",
        condition: "item",
    },
    TutorialStep {
        id: TutorialStepId::Trap,
        title: "Watch for traps",
        text: "Traps are hidden in the floor. Thieves can see them in advance.",
        condition: "trap",
    },
    TutorialStep {
        id: TutorialStepId::Goal,
        title: "Find the goal",
        text: "Explore the labyrinth and reach the goal. Your clear time decides your rank!",
        condition: "goal",
    },
];

/// Index of a step in [`TUTORIAL_STEPS`]
pub fn tutorial_step_index(id: TutorialStepId) -> Option<usize> {
    TUTORIAL_STEPS.iter().position(|step| step.id == id)
}

/// Tutorial progress for the current session
///
/// `current_step` may equal the step count once every step was advanced;
/// lookups check `is_completed` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialState {
    pub current_step: usize,
    pub is_completed: bool,
    pub is_visible: bool,
}

impl TutorialState {
    /// Fresh state given the persisted completion flag
    pub fn new(completed: bool) -> Self {
        Self {
            current_step: 0,
            is_completed: completed,
            is_visible: !completed,
        }
    }

    /// Show/hide the panel. Allowed in any state.
    pub fn toggle_visibility(self) -> Self {
        Self {
            is_visible: !self.is_visible,
            ..self
        }
    }

    pub fn current_step(&self) -> Option<&'static TutorialStep> {
        if self.is_completed {
            return None;
        }
        TUTORIAL_STEPS.get(self.current_step)
    }

    pub fn text(&self) -> Option<TutorialText> {
        self.current_step().map(|step| TutorialText {
            title: step.title,
            text: step.text,
        })
    }

    /// Whether `action` satisfies the current step (exact, case-sensitive)
    pub fn should_advance(&self, action: &str) -> bool {
        self.current_step()
            .is_some_and(|step| !step.condition.is_empty() && step.condition == action)
    }

    /// Fraction of steps done, exactly 1.0 once completed
    pub fn progress(&self) -> f32 {
        if self.is_completed {
            return 1.0;
        }
        self.current_step as f32 / TUTORIAL_STEPS.len() as f32
    }
}

/// Drives tutorial transitions and owns the completion flag's storage
pub struct Tutorial {
    storage: ProviderSlot,
}

impl Tutorial {
    pub fn new() -> Self {
        Self {
            storage: ProviderSlot::new(),
        }
    }

    pub fn with_provider(provider: Rc<dyn StorageProvider>) -> Self {
        Self {
            storage: ProviderSlot::with_provider(provider),
        }
    }

    pub fn set_storage_provider(&mut self, provider: Rc<dyn StorageProvider>) {
        self.storage.set(provider);
    }

    pub fn reset_storage_provider(&mut self) {
        self.storage.reset();
    }

    /// Start-of-session state: hidden and completed if the flag is set
    pub fn init(&self) -> TutorialState {
        TutorialState::new(self.is_completed())
    }

    /// Read the persisted flag. Anything but `"true"` means not completed.
    pub fn is_completed(&self) -> bool {
        match self.storage.get().get(keys::TUTORIAL_COMPLETED) {
            Ok(flag) => flag.as_deref() == Some(COMPLETED_FLAG),
            Err(e) => {
                log::warn!("Failed to read tutorial state: {e}");
                false
            }
        }
    }

    pub fn save_completed(&self) {
        match self.storage.get().set(keys::TUTORIAL_COMPLETED, COMPLETED_FLAG) {
            Ok(()) => log::info!("Tutorial marked completed"),
            Err(e) => log::warn!("Failed to save tutorial completion: {e}"),
        }
    }

    /// Move to the next step; finishing the last one completes and persists
    pub fn advance(&self, state: TutorialState) -> TutorialState {
        // Completed is terminal
        if state.is_completed {
            return state;
        }

        let next = state.current_step + 1;
        if next >= TUTORIAL_STEPS.len() {
            self.save_completed();
            return TutorialState {
                current_step: next,
                is_completed: true,
                is_visible: false,
            };
        }

        log::debug!("Tutorial step {} -> {}", state.current_step, next);
        TutorialState {
            current_step: next,
            ..state
        }
    }

    /// Complete immediately from any step
    pub fn skip(&self, state: TutorialState) -> TutorialState {
        self.save_completed();
        TutorialState {
            is_completed: true,
            is_visible: false,
            ..state
        }
    }
}

impl Default for Tutorial {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorageProvider;
    use proptest::prelude::*;

    fn tutorial() -> (Tutorial, Rc<MemoryStorageProvider>) {
        let storage = Rc::new(MemoryStorageProvider::new());
        (Tutorial::with_provider(storage.clone()), storage)
    }

    #[test]
    fn test_steps_cover_every_id() {
        assert_eq!(TUTORIAL_STEPS.len(), 6);
        let ids: Vec<_> = TUTORIAL_STEPS.iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                TutorialStepId::Movement,
                TutorialStepId::Attack,
                TutorialStepId::Map,
                TutorialStepId::Item,
                TutorialStepId::Trap,
                TutorialStepId::Goal,
            ]
        );
        for step in &TUTORIAL_STEPS {
            assert!(!step.title.is_empty());
            assert!(!step.text.is_empty());
            assert!(!step.condition.is_empty());
        }
    }

    #[test]
    fn test_init_first_run() {
        let (tutorial, _) = tutorial();
        assert_eq!(
            tutorial.init(),
            TutorialState {
                current_step: 0,
                is_completed: false,
                is_visible: true,
            }
        );
    }

    #[test]
    fn test_init_after_completion() {
        let (tutorial, _) = tutorial();
        tutorial.save_completed();
        let state = tutorial.init();
        assert!(state.is_completed);
        assert!(!state.is_visible);
        assert_eq!(state.current_step, 0);
    }

    #[test]
    fn test_flag_must_be_exact() {
        let (tutorial, storage) = tutorial();
        storage.set(keys::TUTORIAL_COMPLETED, "TRUE").unwrap();
        assert!(!tutorial.is_completed());
        storage.set(keys::TUTORIAL_COMPLETED, "1").unwrap();
        assert!(!tutorial.is_completed());
        storage.set(keys::TUTORIAL_COMPLETED, "true").unwrap();
        assert!(tutorial.is_completed());
    }

    #[test]
    fn test_read_failure_is_not_completed() {
        let (tutorial, storage) = tutorial();
        tutorial.save_completed();
        storage.set_failing(true);
        assert!(!tutorial.is_completed());
        assert!(tutorial.init().is_visible);
    }

    #[test]
    fn test_save_completed_writes_literal() {
        let (tutorial, storage) = tutorial();
        tutorial.save_completed();
        assert_eq!(
            storage.get(keys::TUTORIAL_COMPLETED).unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let (tutorial, storage) = tutorial();
        storage.set_failing(true);
        tutorial.save_completed();
        storage.set_failing(false);
        assert!(!tutorial.is_completed());
    }

    #[test]
    fn test_advance_one_step() {
        let (tutorial, storage) = tutorial();
        let state = tutorial.advance(tutorial.init());
        assert_eq!(state.current_step, 1);
        assert!(!state.is_completed);
        assert!(state.is_visible);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_advance_through_all_steps() {
        let (tutorial, _) = tutorial();
        let mut state = tutorial.init();
        for _ in 0..TUTORIAL_STEPS.len() {
            state = tutorial.advance(state);
        }
        assert!(state.is_completed);
        assert!(!state.is_visible);
        assert_eq!(state.current_step, TUTORIAL_STEPS.len());
        assert!(tutorial.is_completed());
        assert_eq!(state.current_step(), None);
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn test_advance_after_completion_is_noop() {
        let (tutorial, storage) = tutorial();
        let mut state = tutorial.init();
        for _ in 0..TUTORIAL_STEPS.len() {
            state = tutorial.advance(state);
        }
        storage.remove(keys::TUTORIAL_COMPLETED).unwrap();

        let again = tutorial.advance(tutorial.advance(state));
        assert_eq!(again, state);
        assert_eq!(again.current_step, TUTORIAL_STEPS.len());
        // No write once terminal
        assert_eq!(storage.get(keys::TUTORIAL_COMPLETED).unwrap(), None);

        // A session that starts completed stays at step 0
        tutorial.save_completed();
        let resumed = tutorial.init();
        assert_eq!(tutorial.advance(resumed), resumed);
    }

    #[test]
    fn test_advance_keeps_hidden_panel_hidden() {
        let (tutorial, _) = tutorial();
        let state = tutorial.init().toggle_visibility();
        let state = tutorial.advance(state);
        assert!(!state.is_visible);
        assert_eq!(state.current_step, 1);
    }

    #[test]
    fn test_skip_from_any_step() {
        let (tutorial, _) = tutorial();
        let mut state = tutorial.init();
        state = tutorial.advance(state);
        state = tutorial.advance(state);

        let skipped = tutorial.skip(state);
        assert!(skipped.is_completed);
        assert!(!skipped.is_visible);
        assert_eq!(skipped.current_step, 2);
        assert!(tutorial.is_completed());
        assert_eq!(skipped.progress(), 1.0);
    }

    #[test]
    fn test_toggle_visibility() {
        let (tutorial, _) = tutorial();
        let state = tutorial.init();
        let hidden = state.toggle_visibility();
        assert!(!hidden.is_visible);
        assert_eq!(hidden.current_step, state.current_step);
        assert!(hidden.toggle_visibility().is_visible);

        // No guard once completed
        let done = tutorial.skip(state).toggle_visibility();
        assert!(done.is_completed);
        assert!(done.is_visible);
    }

    #[test]
    fn test_current_step_and_text() {
        let (tutorial, _) = tutorial();
        let state = tutorial.init();
        assert_eq!(state.current_step().map(|s| s.id), Some(TutorialStepId::Movement));
        assert_eq!(
            state.text(),
            Some(TutorialText {
                title: TUTORIAL_STEPS[0].title,
                text: TUTORIAL_STEPS[0].text,
            })
        );

        let skipped = tutorial.skip(state);
        assert_eq!(skipped.current_step(), None);
        assert_eq!(skipped.text(), None);
    }

    #[test]
    fn test_out_of_range_step_has_no_text() {
        let state = TutorialState {
            current_step: 99,
            is_completed: false,
            is_visible: true,
        };
        assert_eq!(state.current_step(), None);
        assert_eq!(state.text(), None);
        assert!(!state.should_advance("move"));
    }

    #[test]
    fn test_should_advance() {
        let (tutorial, _) = tutorial();
        let state = tutorial.init();
        assert!(state.should_advance("move"));
        assert!(!state.should_advance("attack"));
        assert!(!state.should_advance("Move"));
        assert!(!state.should_advance(""));

        let state = tutorial.advance(state);
        assert!(state.should_advance("attack"));
        assert!(!tutorial.skip(state).should_advance("attack"));
    }

    #[test]
    fn test_step_index() {
        assert_eq!(tutorial_step_index(TutorialStepId::Movement), Some(0));
        assert_eq!(tutorial_step_index(TutorialStepId::Trap), Some(4));
        assert_eq!(tutorial_step_index(TutorialStepId::Goal), Some(5));
    }

    #[test]
    fn test_progress() {
        let (tutorial, _) = tutorial();
        let state = tutorial.init();
        assert_eq!(state.progress(), 0.0);
        let state = tutorial.advance(state);
        assert!(state.progress() > 0.0 && state.progress() < 1.0);
    }

    proptest! {
        #[test]
        fn prop_progress_bounded(steps in 0usize..20) {
            let (tutorial, _) = tutorial();
            let mut state = tutorial.init();
            for _ in 0..steps {
                state = tutorial.advance(state);
            }
            let progress = state.progress();
            prop_assert!((0.0..=1.0).contains(&progress));
            prop_assert!(state.current_step <= TUTORIAL_STEPS.len());
            prop_assert_eq!(state.is_completed, steps >= TUTORIAL_STEPS.len());
            if state.is_completed {
                prop_assert!(!state.is_visible);
                prop_assert_eq!(progress, 1.0);
            }
        }

        #[test]
        fn prop_skip_always_completes(steps in 0usize..TUTORIAL_STEPS.len(), hidden in any::<bool>()) {
            let (tutorial, _) = tutorial();
            let mut state = tutorial.init();
            for _ in 0..steps {
                state = tutorial.advance(state);
            }
            if hidden {
                state = state.toggle_visibility();
            }
            let skipped = tutorial.skip(state);
            prop_assert!(skipped.is_completed);
            prop_assert!(!skipped.is_visible);
            prop_assert!(tutorial.is_completed());
        }
    }
}
