//! Clipboard shared by every editor of an adapter.
//!
//! With the `clipboard` feature the system clipboard is used through arboard,
//! created on first use. When it cannot be opened (no display, feature off)
//! text stays in an in-process buffer so copy and paste keep working inside
//! the application.

pub struct Clipboard {
    #[cfg(feature = "clipboard")]
    system: Option<arboard::Clipboard>,
    use_system: bool,
    local: String,
}

impl Clipboard {
    /// Clipboard backed by the system clipboard when available.
    pub fn system() -> Self {
        Self {
            #[cfg(feature = "clipboard")]
            system: None,
            use_system: cfg!(feature = "clipboard"),
            local: String::new(),
        }
    }

    /// In-process clipboard only.
    pub fn local() -> Self {
        Self {
            #[cfg(feature = "clipboard")]
            system: None,
            use_system: false,
            local: String::new(),
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.local = text.to_string();

        #[cfg(feature = "clipboard")]
        if let Some(clipboard) = self.system_clipboard() {
            if let Err(e) = clipboard.set_text(text) {
                log::warn!("clipboard write failed: {}", e);
            }
        }
    }

    pub fn text(&mut self) -> Option<String> {
        #[cfg(feature = "clipboard")]
        if let Some(clipboard) = self.system_clipboard() {
            match clipboard.get_text() {
                Ok(text) => return Some(text),
                Err(arboard::Error::ContentNotAvailable) => return None,
                Err(e) => log::warn!("clipboard read failed: {}", e),
            }
        }

        (!self.local.is_empty()).then(|| self.local.clone())
    }

    #[cfg(feature = "clipboard")]
    fn system_clipboard(&mut self) -> Option<&mut arboard::Clipboard> {
        if !self.use_system {
            return None;
        }
        if self.system.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => self.system = Some(clipboard),
                Err(e) => {
                    log::warn!("system clipboard unavailable, keeping copies in-process: {}", e);
                    self.use_system = false;
                    return None;
                }
            }
        }
        self.system.as_mut()
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clipboard")
            .field("use_system", &self.use_system)
            .field("local_len", &self.local.len())
            .finish()
    }
}
