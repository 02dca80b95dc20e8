/// Everything a key press can ask the application to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,

    // Cursor
    CursorUp(usize),
    CursorDown(usize),
    PageUp,
    PageDown,
    CursorTop,
    CursorBottom,
    FocusLeft,
    FocusRight,

    // Text input (filter edit, color entry)
    EditFilter,
    StartRecolor,
    InputChar(char),
    InputBackspace,
    InputClear,
    InputSubmit,
    InputCancel,

    // Highlighting and search
    ActivateColumn,
    NextMatch,
    PreviousMatch,
    ToggleFilterMode,
    ResetView,

    // Rows
    ToggleSelection,
    GroupSelection,
    ToggleFollow,
    ExportAll,
    ExportSelected,
    ClearTrace,
}
