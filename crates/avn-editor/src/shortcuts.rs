//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Player and
//! editor share one map; the session decides which actions apply in the
//! current mode.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Playback ──
    TogglePlay,
    Advance,
    GoBack,
    ToggleFollow,
    /// Pick option `n` (zero-based) of the open choice prompt.
    Choose(usize),

    // ── Mode ──
    ToggleEditor,

    // ── Edit ──
    Delete,
    SelectAll,
    NewNode,
    ToggleDecorationLock,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetView,

    // ── UI ──
    /// Close the choice prompt, else clear the selection.
    Escape,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"ArrowRight"`, `"3"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd {
            return match key {
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                "e" | "E" => Some(ShortcutAction::ToggleEditor),
                "l" | "L" => Some(ShortcutAction::ToggleDecorationLock),
                _ => None,
            };
        }

        if shift {
            return match key {
                "N" | "n" => Some(ShortcutAction::NewNode),
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        match key {
            " " => Some(ShortcutAction::TogglePlay),
            "ArrowRight" => Some(ShortcutAction::Advance),
            "ArrowLeft" => Some(ShortcutAction::GoBack),
            "f" | "F" => Some(ShortcutAction::ToggleFollow),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Escape),
            "=" => Some(ShortcutAction::ZoomIn),
            "-" => Some(ShortcutAction::ZoomOut),
            k => k
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=9).contains(n))
                .map(|n| ShortcutAction::Choose(n - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_keys() {
        assert_eq!(
            ShortcutMap::resolve(" ", false, false, false, false),
            Some(ShortcutAction::TogglePlay)
        );
        assert_eq!(
            ShortcutMap::resolve("ArrowRight", false, false, false, false),
            Some(ShortcutAction::Advance)
        );
        assert_eq!(
            ShortcutMap::resolve("ArrowLeft", false, false, false, false),
            Some(ShortcutAction::GoBack)
        );
    }

    #[test]
    fn digits_choose_options() {
        assert_eq!(
            ShortcutMap::resolve("1", false, false, false, false),
            Some(ShortcutAction::Choose(0))
        );
        assert_eq!(
            ShortcutMap::resolve("9", false, false, false, false),
            Some(ShortcutAction::Choose(8))
        );
        assert_eq!(ShortcutMap::resolve("0", false, false, false, false), None);
    }

    #[test]
    fn command_modifier_is_platform_neutral() {
        assert_eq!(
            ShortcutMap::resolve("a", true, false, false, false),
            Some(ShortcutAction::SelectAll)
        );
        assert_eq!(
            ShortcutMap::resolve("a", false, false, false, true),
            Some(ShortcutAction::SelectAll)
        );
        assert_eq!(
            ShortcutMap::resolve("0", false, false, false, true),
            Some(ShortcutAction::ResetView)
        );
    }

    #[test]
    fn unbound_keys() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("z", true, false, false, false), None);
    }
}
