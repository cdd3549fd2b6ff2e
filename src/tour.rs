//! The application layer: routes navigation commands into the transition
//! controller and keeps the [`Navigator`] in sync with its callbacks.

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use crate::{
    clock::{Clock, SystemClock},
    config::TourConfig,
    controller::{SiteSwitch, TransitionController},
    navigation::{LoadingState, Navigator},
    resources::{AssetLoader, LoadProgress, ProgressCallback},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TourCommand {
    Next,
    Previous,
    Select(usize),
    /// A typed character; digits select sites.
    Key(char),
    /// Reloads the active site after a failed load.
    Retry,
    DismissError,
}

pub struct Tour<C: Clock = SystemClock> {
    controller: TransitionController,
    navigator: Rc<RefCell<Navigator>>,
    clock: C,
}

impl<C: Clock> Tour<C> {
    pub fn new(mut controller: TransitionController, clock: C) -> Self {
        let navigator = Rc::new(RefCell::new(Navigator::new(controller.sites().len())));

        let on_complete = Rc::clone(&navigator);
        controller.on_transition_complete(move || on_complete.borrow_mut().finish_transition());
        let on_error = Rc::clone(&navigator);
        controller.on_load_error(move |error| on_error.borrow_mut().fail(error.url()));

        Self {
            controller,
            navigator,
            clock,
        }
    }

    pub fn from_config(config: &TourConfig, loader: Rc<dyn AssetLoader>, clock: C) -> Self {
        Self::new(TransitionController::from_config(config, loader), clock)
    }

    /// Fades in the first site.
    pub fn start(&mut self) -> Option<SiteSwitch> {
        self.switch_to(0, false)
    }

    /// Applies one user command. Returns the accepted switch, if the command caused one.
    pub fn handle(&mut self, command: TourCommand) -> Option<SiteSwitch> {
        if command == TourCommand::DismissError {
            self.navigator.borrow_mut().dismiss_error();
            return None;
        }
        let (target, force) = {
            let navigator = self.navigator.borrow();
            match command {
                TourCommand::Retry => match navigator.loading() {
                    LoadingState::Failed { .. } => (navigator.active(), true),
                    _ => (None, false),
                },
                _ if !navigator.can_navigate() => {
                    log::debug!("ignoring {:?} during a transition", command);
                    (None, false)
                }
                TourCommand::Next => (navigator.next_index(), false),
                TourCommand::Previous => (navigator.previous_index(), false),
                TourCommand::Select(index) => (Some(index), false),
                TourCommand::Key(key) => (navigator.index_for_key(key), false),
                TourCommand::DismissError => (None, false),
            }
        };
        self.switch_to(target?, force)
    }

    fn switch_to(&mut self, index: usize, force: bool) -> Option<SiteSwitch> {
        let navigator = Rc::clone(&self.navigator);
        let on_progress: ProgressCallback =
            Rc::new(move |progress: LoadProgress| navigator.borrow_mut().set_progress(progress));
        let switch = self
            .controller
            .switch_site(index, &self.clock, Some(on_progress), force)?;
        self.navigator
            .borrow_mut()
            .begin_transition(switch.index, switch.description.clone());
        Some(switch)
    }

    /// Runs one tick with the time that passed since the previous frame.
    pub fn frame(&mut self) {
        let delta = self.clock.delta();
        let elapsed = self.clock.elapsed_time();
        self.controller.update(delta, elapsed);
    }

    pub fn controller(&self) -> &TransitionController {
        &self.controller
    }

    pub fn navigator(&self) -> Ref<'_, Navigator> {
        self.navigator.borrow()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
