#[cfg(feature = "dump")]
use core::cell::{Ref, RefCell};

use atomic::{Atomic, Ordering};
#[cfg(feature = "dump")]
use critical_section::{CriticalSection, Mutex};
#[cfg(feature = "dump")]
use heapless::Deque;

use crate::State;

/// Current protocol state, plus a short transition history when the
/// `dump` feature is on.
///
/// The state is a lock-free atomic so the ISRs and the application can
/// read it without a critical section. RAM is scarce on USI parts, so
/// the history only exists in `dump` builds.
pub struct StateHolder<const HISTORY_SIZE: usize> {
    #[cfg(feature = "dump")]
    history: Mutex<RefCell<Deque<State, HISTORY_SIZE>>>,
    state: Atomic<State>,
}

impl<const HISTORY_SIZE: usize> StateHolder<HISTORY_SIZE> {
    pub const fn new() -> Self {
        Self {
            #[cfg(feature = "dump")]
            history: Mutex::new(RefCell::new(Deque::new())),
            state: Atomic::new(State::Idle),
        }
    }

    pub fn transition_to(&self, state: State) {
        self.record(state);
        self.state.store(state, Ordering::SeqCst);
    }

    pub fn current(&self) -> State {
        self.state.load(Ordering::SeqCst)
    }

    #[cfg(feature = "dump")]
    pub fn history<'cs>(
        &'cs self,
        cs: CriticalSection<'cs>,
    ) -> Ref<'cs, Deque<State, HISTORY_SIZE>> {
        self.history.borrow_ref(cs)
    }

    #[cfg(feature = "dump")]
    fn record(&self, state: State) {
        critical_section::with(|cs| {
            let mut history = self.history.borrow_ref_mut(cs);
            if history.is_full() {
                history.pop_front();
            }
            let _ = history.push_back(state);
        });
    }

    #[cfg(not(feature = "dump"))]
    fn record(&self, _state: State) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_follows_transitions() {
        let holder: StateHolder<2> = StateHolder::new();
        assert!(matches!(holder.current(), State::Idle));

        holder.transition_to(State::AddressMatch);
        holder.transition_to(State::MasterRead);
        assert!(matches!(holder.current(), State::MasterRead));
    }

    #[cfg(feature = "dump")]
    #[test]
    fn history_keeps_the_latest_transitions() {
        let holder: StateHolder<2> = StateHolder::new();

        holder.transition_to(State::AddressMatch);
        holder.transition_to(State::RegisterSelect);
        holder.transition_to(State::MasterWrite);

        critical_section::with(|cs| {
            let history = holder.history(cs);
            let mut it = history.iter();
            assert!(matches!(it.next(), Some(State::RegisterSelect)));
            assert!(matches!(it.next(), Some(State::MasterWrite)));
            assert!(it.next().is_none());
        });
    }
}
