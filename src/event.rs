use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the main loop should do with a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run now, appending these arguments to the configured runner args.
    Run(Vec<String>),
    /// Print the key menu.
    ShowMenu,
    /// Stop watching and exit.
    Quit,
    /// Ctrl-C while the terminal is in raw mode.
    Interrupt,
    /// Not bound to anything.
    Ignore,
}

/// Key bindings shown by the menu: key label, description, extra runner args.
const RUN_KEYS: &[(char, &str, &[&str])] = &[
    ('r', "run tests", &[]),
    ('f', "run only failed tests (--lf)", &["--lf"]),
    ('p', "drop to pdb on failure (--pdb)", &["--pdb"]),
    ('v', "run verbosely (-v)", &["-v"]),
];

/// Map a keystroke to an [`Action`].
pub fn decode(key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Interrupt,
        (KeyCode::Char('q'), _) => Action::Quit,
        (KeyCode::Enter, _) => Action::Run(Vec::new()),
        (KeyCode::Char('w'), KeyModifiers::NONE) => Action::ShowMenu,
        (KeyCode::Char(c), KeyModifiers::NONE) => RUN_KEYS
            .iter()
            .find(|(key, _, _)| *key == c)
            .map_or(Action::Ignore, |(_, _, extra)| {
                Action::Run(extra.iter().map(|arg| arg.to_string()).collect())
            }),
        _ => Action::Ignore,
    }
}

/// Help text listing every bound key.
pub fn menu() -> String {
    let mut text = String::from("Controls:\n");
    text.push_str("  Enter : run tests\n");
    for (key, description, _) in RUN_KEYS {
        text.push_str(&format!("  {key}     : {description}\n"));
    }
    text.push_str("  w     : show this menu\n");
    text.push_str("  q     : quit\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn enter_and_r_run_with_no_extra_args() {
        assert_eq!(decode(key(KeyCode::Enter)), Action::Run(vec![]));
        assert_eq!(decode(key(KeyCode::Char('r'))), Action::Run(vec![]));
    }

    #[test]
    fn argument_keys_add_runner_args() {
        assert_eq!(
            decode(key(KeyCode::Char('f'))),
            Action::Run(vec!["--lf".into()])
        );
        assert_eq!(
            decode(key(KeyCode::Char('p'))),
            Action::Run(vec!["--pdb".into()])
        );
        assert_eq!(decode(key(KeyCode::Char('v'))), Action::Run(vec!["-v".into()]));
    }

    #[test]
    fn q_quits_and_ctrl_c_interrupts() {
        assert_eq!(decode(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(
            decode(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Interrupt
        );
    }

    #[test]
    fn w_shows_menu() {
        assert_eq!(decode(key(KeyCode::Char('w'))), Action::ShowMenu);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(decode(key(KeyCode::Char('z'))), Action::Ignore);
        assert_eq!(decode(key(KeyCode::Tab)), Action::Ignore);
        assert_eq!(
            decode(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Action::Ignore
        );
    }

    #[test]
    fn menu_lists_every_binding() {
        let text = menu();
        for (key, description, _) in RUN_KEYS {
            assert!(text.contains(&format!("{key}     : {description}")));
        }
        assert!(text.contains("q     : quit"));
    }
}
