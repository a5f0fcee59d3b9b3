use std::collections::HashMap;
use std::sync::Arc;

use super::handler::Handler;
use crate::error::ShellError;

/// Commands the shell always provides unless a user handler takes the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    Exit,
    Clear,
}

impl Builtin {
    pub const ALL: [Builtin; 3] = [Builtin::Help, Builtin::Exit, Builtin::Clear];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Help => "help",
            Builtin::Exit => "exit",
            Builtin::Clear => "clear",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Builtin::Help => "Print help info.",
            Builtin::Exit => "Exit the application.",
            Builtin::Clear => "Clear the screen.",
        }
    }
}

/// A registry slot: either a built-in or a user-supplied handler.
#[derive(Clone)]
pub enum Entry {
    Builtin(Builtin),
    Custom(Arc<dyn Handler>),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Builtin(b) => b.name(),
            Entry::Custom(h) => h.name(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Entry::Builtin(b) => b.description(),
            Entry::Custom(h) => h.description(),
        }
    }
}

/// Command-name to handler mapping that remembers registration order for
/// the help listing.
#[derive(Default, Clone)]
pub struct Registry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user handler. Names are matched case-insensitively, so
    /// they are stored lowercased.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> Result<(), ShellError> {
        self.insert(Entry::Custom(handler))
    }

    /// Register a built-in unless the name is already taken. Returns whether
    /// it was added.
    pub fn register_builtin(&mut self, builtin: Builtin) -> bool {
        if self.contains(builtin.name()) {
            tracing::debug!(command = builtin.name(), "Built-in overridden by user handler");
            return false;
        }
        self.insert(Entry::Builtin(builtin)).is_ok()
    }

    fn insert(&mut self, entry: Entry) -> Result<(), ShellError> {
        let key = entry.name().to_lowercase();
        if self.index.contains_key(&key) {
            return Err(ShellError::DuplicateCommand(key));
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Width of the longest registered name, in characters.
    pub fn name_width(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.name().chars().count())
            .max()
            .unwrap_or(0)
    }
}
