//! User configuration — local keybindings, animation timing and persistence.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/ast-tree/config.toml` (default `~/.config/ast-tree/config.toml`).
//! Keys bound here are handled by the frontend itself; every other printable
//! key is relayed to the backend.

use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const DEFAULT_ANIMATION_MS: u64 = 400;
const DEFAULT_TICK_MS: u64 = 16;

// ───────────────────────────────────────── commands ──────────

/// Commands the frontend handles without asking the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    ScrollUp,
    ScrollDown,
    Refresh,
}

impl Command {
    pub const ALL: &[Command] = &[
        Command::Quit,
        Command::ScrollUp,
        Command::ScrollDown,
        Command::Refresh,
    ];

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Command::Quit => "quit",
            Command::ScrollUp => "scroll_up",
            Command::ScrollDown => "scroll_down",
            Command::Refresh => "refresh",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding — key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT modifiers are
    /// compared; SHIFT is already folded into the character.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Config-file / status-bar form (e.g. `"Ctrl+c"`, `"PageUp"`, `"q"`).
    pub fn label(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".into(),
            KeyCode::Down => "Down".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PageUp".into(),
            KeyCode::PageDown => "PageDown".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Parse a key string like `"Ctrl+c"`, `"PageUp"`, `"q"`, `"F5"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                _ => return None,
            }
        }

        // Single characters are case-sensitive; named keys are not.
        if key_part.chars().count() == 1 {
            let c = key_part.chars().next()?;
            return Some(KeyBind::new(KeyCode::Char(c), modifiers));
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            s if s.starts_with('f') && s.len() > 1 => KeyCode::F(s[1..].parse().ok()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Command, Vec<KeyBind>>,
    /// Length of one diagram transition.
    pub animation_ms: u64,
    /// Event poll interval; also the animation frame interval.
    pub tick_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            animation_ms: DEFAULT_ANIMATION_MS,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Command, Vec<KeyBind>> {
        use Command::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(
            Quit,
            vec![
                KeyBind::new(Char('q'), n),
                KeyBind::new(Char('c'), KeyModifiers::CONTROL),
            ],
        );
        m.insert(ScrollUp, vec![KeyBind::new(PageUp, n)]);
        m.insert(ScrollDown, vec![KeyBind::new(PageDown, n)]);
        m.insert(Refresh, vec![KeyBind::new(F(5), n)]);

        m
    }

    /// Find the command bound to a key event.  When several bindings match,
    /// the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Command> {
        let mut best: Option<(Command, u32)> = None;

        for (&command, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.map_or(true, |(_, b)| mc > b) {
                        best = Some((command, mc));
                    }
                }
            }
        }
        best.map(|(c, _)| c)
    }

    fn short_binding(&self, command: Command) -> String {
        match self.bindings.get(&command) {
            Some(binds) if !binds.is_empty() => binds[0].label(),
            _ => "?".into(),
        }
    }

    /// Status-bar hint built from the current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "h/j/k/l: cursor | t / click: toggle | {}: refresh | {}/{}: scroll | {}: quit",
            self.short_binding(Command::Refresh),
            self.short_binding(Command::ScrollUp),
            self.short_binding(Command::ScrollDown),
            self.short_binding(Command::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                tracing::debug!("no config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Persist current config to disk and return where it went.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.serialise())?;
        Ok(path)
    }

    fn parse(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "animation_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.animation_ms = v.min(5000);
                    }
                    continue;
                }
                "tick_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.tick_ms = v.clamp(5, 250);
                    }
                    continue;
                }
                _ => {}
            }

            let Some(command) = Command::from_config_key(key) else {
                tracing::debug!(key, "ignoring unknown config key");
                continue;
            };

            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if !parsed.is_empty() {
                config.bindings.insert(command, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# ast-tree configuration".to_string(),
            String::new(),
            "# Diagram transitions".to_string(),
            format!("animation_ms = {}", self.animation_ms),
            format!("tick_ms = {}", self.tick_ms),
            String::new(),
            "# Local key bindings (everything else goes to the backend)".to_string(),
            "# Format: command = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+ (prefix)".to_string(),
            String::new(),
        ];

        for &command in Command::ALL {
            if let Some(binds) = self.bindings.get(&command) {
                let keys: Vec<String> = binds.iter().map(KeyBind::label).collect();
                lines.push(format!("{} = {}", command.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/ast-tree/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("ast-tree").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn defaults_bind_quit_and_scroll() {
        let config = AppConfig::default();
        assert_eq!(
            config.match_key(key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Command::Quit)
        );
        assert_eq!(
            config.match_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        assert_eq!(
            config.match_key(key(KeyCode::PageDown, KeyModifiers::NONE)),
            Some(Command::ScrollDown)
        );
        // Cursor keys belong to the backend.
        assert_eq!(config.match_key(key(KeyCode::Char('j'), KeyModifiers::NONE)), None);
        assert_eq!(config.match_key(key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn shifted_characters_still_match() {
        let mut config = AppConfig::default();
        config
            .bindings
            .insert(Command::Refresh, vec![KeyBind::new(KeyCode::Char('R'), KeyModifiers::NONE)]);
        assert_eq!(
            config.match_key(key(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            Some(Command::Refresh)
        );
    }

    #[test]
    fn parse_overrides_and_clamps() {
        let config = AppConfig::parse(
            "# comment\n\
             animation_ms = 9000\n\
             tick_ms = 1\n\
             quit = x, Ctrl+d\n\
             refresh = F6\n\
             bogus = y\n",
        );
        assert_eq!(config.animation_ms, 5000);
        assert_eq!(config.tick_ms, 5);
        assert_eq!(
            config.bindings[&Command::Quit],
            vec![
                KeyBind::new(KeyCode::Char('x'), KeyModifiers::NONE),
                KeyBind::new(KeyCode::Char('d'), KeyModifiers::CONTROL),
            ]
        );
        assert_eq!(
            config.bindings[&Command::Refresh],
            vec![KeyBind::new(KeyCode::F(6), KeyModifiers::NONE)]
        );
        // Untouched commands keep their defaults.
        assert_eq!(
            config.bindings[&Command::ScrollUp],
            vec![KeyBind::new(KeyCode::PageUp, KeyModifiers::NONE)]
        );
    }

    #[test]
    fn serialised_config_parses_back() {
        let mut config = AppConfig::default();
        config.animation_ms = 250;
        let reparsed = AppConfig::parse(&config.serialise());
        assert_eq!(reparsed.animation_ms, 250);
        assert_eq!(reparsed.bindings, config.bindings);
    }

    #[test]
    fn status_hint_names_first_bindings() {
        let hint = AppConfig::default().status_bar_hint();
        assert!(hint.contains("F5: refresh"));
        assert!(hint.contains("q: quit"));
    }
}
