use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Shift on a character key is already carried by its case, and not
    /// every terminal reports it, so it is dropped
    pub fn from_event(event: &KeyEvent) -> Self {
        let mut modifiers = event.modifiers;
        if matches!(event.code, KeyCode::Char(_)) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        Self {
            code: event.code,
            modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    TraceTable,
    TextInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        let mut table = HashMap::new();
        table.insert(KeyBinding::new(KeyCode::Up), Action::CursorUp(1));
        table.insert(KeyBinding::new(KeyCode::Char('k')), Action::CursorUp(1));
        table.insert(KeyBinding::new(KeyCode::Down), Action::CursorDown(1));
        table.insert(KeyBinding::new(KeyCode::Char('j')), Action::CursorDown(1));
        table.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        table.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        table.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        table.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        table.insert(KeyBinding::new(KeyCode::Home), Action::CursorTop);
        table.insert(KeyBinding::new(KeyCode::End), Action::CursorBottom);
        table.insert(KeyBinding::new(KeyCode::Left), Action::FocusLeft);
        table.insert(KeyBinding::new(KeyCode::Char('h')), Action::FocusLeft);
        table.insert(KeyBinding::new(KeyCode::Right), Action::FocusRight);
        table.insert(KeyBinding::new(KeyCode::Char('l')), Action::FocusRight);
        table.insert(KeyBinding::new(KeyCode::Char('/')), Action::EditFilter);
        table.insert(KeyBinding::new(KeyCode::Char('c')), Action::ActivateColumn);
        table.insert(KeyBinding::new(KeyCode::Char('n')), Action::NextMatch);
        table.insert(KeyBinding::new(KeyCode::Char('N')), Action::PreviousMatch);
        table.insert(KeyBinding::new(KeyCode::Char(' ')), Action::ToggleSelection);
        table.insert(KeyBinding::new(KeyCode::Char('g')), Action::GroupSelection);
        table.insert(KeyBinding::new(KeyCode::Char('C')), Action::StartRecolor);
        table.insert(KeyBinding::new(KeyCode::Char('m')), Action::ToggleFilterMode);
        table.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        table.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportAll);
        table.insert(KeyBinding::new(KeyCode::Char('E')), Action::ExportSelected);
        table.insert(KeyBinding::new(KeyCode::Char('x')), Action::ClearTrace);
        table.insert(KeyBinding::new(KeyCode::Esc), Action::ResetView);
        bindings.insert(KeyContext::TraceTable, table);

        let mut input = HashMap::new();
        input.insert(KeyBinding::new(KeyCode::Enter), Action::InputSubmit);
        input.insert(KeyBinding::new(KeyCode::Esc), Action::InputCancel);
        input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::InputCancel);
        input.insert(KeyBinding::new(KeyCode::Backspace), Action::InputBackspace);
        input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::InputClear);
        bindings.insert(KeyContext::TextInput, input);

        Self { bindings }
    }

    /// Look up the action for a key, falling back to global bindings
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self.bindings.get(&context).and_then(|b| b.get(&binding)) {
            return Some(action.clone());
        }

        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Keys while a text field is open: editing keys, otherwise typed characters.
    /// Global bindings do not apply so `q` and `?` can be typed.
    pub fn get_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::TextInput)
            .and_then(|b| b.get(&binding))
        {
            return Some(action.clone());
        }

        match key.code {
            KeyCode::Char(c) if binding.modifiers.is_empty() => Some(Action::InputChar(c)),
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_table_and_global_lookup() {
        let kb = KeyBindings::new();
        assert_eq!(
            kb.get_action(KeyContext::TraceTable, &key(KeyCode::Char('n'), KeyModifiers::NONE)),
            Some(Action::NextMatch)
        );
        assert_eq!(
            kb.get_action(KeyContext::TraceTable, &key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::Quit)
        );
        assert_eq!(
            kb.get_action(KeyContext::TraceTable, &key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_shifted_letters_match_with_or_without_shift() {
        let kb = KeyBindings::new();
        for modifiers in [KeyModifiers::SHIFT, KeyModifiers::NONE] {
            assert_eq!(
                kb.get_action(KeyContext::TraceTable, &key(KeyCode::Char('N'), modifiers)),
                Some(Action::PreviousMatch)
            );
        }
    }

    #[test]
    fn test_input_mode_types_characters() {
        let kb = KeyBindings::new();
        assert_eq!(
            kb.get_input_action(&key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::InputChar('q'))
        );
        assert_eq!(
            kb.get_input_action(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Action::InputChar('A'))
        );
        assert_eq!(
            kb.get_input_action(&key(KeyCode::Esc, KeyModifiers::NONE)),
            Some(Action::InputCancel)
        );
        assert_eq!(kb.get_input_action(&key(KeyCode::Char('x'), KeyModifiers::ALT)), None);
    }
}
