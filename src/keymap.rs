use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::{Intent, RoundStatus, SessionSnapshot};

/// What a key press asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    Quit,
}

/// Map a key press to a command for the session's current state.
///
/// Keys with no meaning in the current state map to `None`.
pub fn command_for(key: KeyEvent, snapshot: &SessionSnapshot) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    let status = snapshot.status;
    match key.code {
        KeyCode::Char('r') => return Some(Command::Intent(Intent::RestartSession)),
        KeyCode::Char('q') => return Some(Command::Quit),
        KeyCode::Esc if status != RoundStatus::ConfirmPending => return Some(Command::Quit),
        _ => {}
    }

    let intent = match (status, key.code) {
        (RoundStatus::Idle, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('b')) => {
            Intent::BeginRound
        }
        (RoundStatus::RoundOver, KeyCode::Enter | KeyCode::Char('n')) if snapshot.can_advance => {
            Intent::RequestNextRound
        }
        (RoundStatus::ConfirmPending, KeyCode::Enter | KeyCode::Char('y')) => {
            Intent::ConfirmNextRound
        }
        (RoundStatus::ConfirmPending, KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('c')) => {
            Intent::CancelNextRound
        }
        _ => return None,
    };
    Some(Command::Intent(intent))
}

/// Key hints shown under the combos for each state
pub fn hints(snapshot: &SessionSnapshot) -> &'static str {
    match snapshot.status {
        RoundStatus::Idle => "(enter) begin round  (r) start over  (q) quit",
        RoundStatus::Running => "(r) start over  (q) quit",
        RoundStatus::RoundOver if snapshot.can_advance => {
            "(n) next round  (r) start over  (q) quit"
        }
        RoundStatus::RoundOver => "(r) start over  (q) quit",
        RoundStatus::ConfirmPending => "(y) start next round  (n) cancel",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, ROUND_SECS};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot_in(status: RoundStatus) -> SessionSnapshot {
        let mut session = Session::seeded(4);
        if status != RoundStatus::Idle {
            session.begin_round();
        }
        if matches!(status, RoundStatus::RoundOver | RoundStatus::ConfirmPending) {
            for _ in 0..ROUND_SECS {
                session.on_tick();
            }
        }
        if status == RoundStatus::ConfirmPending {
            session.request_next_round();
        }
        let snap = session.snapshot();
        assert_eq!(snap.status, status);
        snap
    }

    #[test]
    fn test_begin_keys_in_idle() {
        let snap = snapshot_in(RoundStatus::Idle);
        for code in [KeyCode::Enter, KeyCode::Char(' '), KeyCode::Char('b')] {
            assert_eq!(
                command_for(key(code), &snap),
                Some(Command::Intent(Intent::BeginRound))
            );
        }
    }

    #[test]
    fn test_running_only_restarts_or_quits() {
        let snap = snapshot_in(RoundStatus::Running);
        assert_eq!(command_for(key(KeyCode::Enter), &snap), None);
        assert_eq!(command_for(key(KeyCode::Char('n')), &snap), None);
        assert_eq!(
            command_for(key(KeyCode::Char('r')), &snap),
            Some(Command::Intent(Intent::RestartSession))
        );
        assert_eq!(command_for(key(KeyCode::Esc), &snap), Some(Command::Quit));
    }

    #[test]
    fn test_next_round_only_while_stack_can_grow() {
        let mut snap = snapshot_in(RoundStatus::RoundOver);
        assert_eq!(
            command_for(key(KeyCode::Char('n')), &snap),
            Some(Command::Intent(Intent::RequestNextRound))
        );

        snap.can_advance = false;
        assert_eq!(command_for(key(KeyCode::Char('n')), &snap), None);
        assert_eq!(hints(&snap), "(r) start over  (q) quit");
    }

    #[test]
    fn test_confirmation_keys() {
        let snap = snapshot_in(RoundStatus::ConfirmPending);
        assert_eq!(
            command_for(key(KeyCode::Char('y')), &snap),
            Some(Command::Intent(Intent::ConfirmNextRound))
        );
        for code in [KeyCode::Esc, KeyCode::Char('n'), KeyCode::Char('c')] {
            assert_eq!(
                command_for(key(code), &snap),
                Some(Command::Intent(Intent::CancelNextRound))
            );
        }
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let snap = snapshot_in(RoundStatus::ConfirmPending);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for(ctrl_c, &snap), Some(Command::Quit));
    }

    #[test]
    fn test_hints_per_state() {
        assert!(hints(&snapshot_in(RoundStatus::Idle)).contains("begin round"));
        assert!(hints(&snapshot_in(RoundStatus::RoundOver)).contains("next round"));
        assert!(hints(&snapshot_in(RoundStatus::ConfirmPending)).contains("cancel"));
    }
}
