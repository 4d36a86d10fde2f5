use std::path::PathBuf;
use std::sync::Arc;

use nimbus_core::{
    BackendError, Config, Conversation, ExchangeController, HealthStatus, HttpBackend,
    WeatherCategory,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Degraded,
    Offline,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input line
    pub input: String,
    pub cursor: usize,

    // Conversation
    pub controller: ExchangeController,
    pub backend_url: String,
    pub backend_status: BackendStatus,
    health_task: Option<JoinHandle<Result<HealthStatus, BackendError>>>,

    // Chat viewport, sizes are filled in by the renderer
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub chat_height: u16,
    pub follow_chat: bool,

    // Presentation
    pub dark_mode: bool,
    pub animation_frame: u8,
    config_path: Option<PathBuf>,
}

impl App {
    /// Must be called from within a tokio runtime; starts a background health probe.
    pub fn new(config: &Config, backend: HttpBackend, config_path: Option<PathBuf>) -> Self {
        let backend_url = backend.base_url().to_string();

        let probe = backend.clone();
        let health_task = Some(tokio::spawn(async move { probe.health().await }));

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            controller: ExchangeController::new(Arc::new(backend)),
            backend_url,
            backend_status: BackendStatus::Checking,
            health_task,

            chat_scroll: 0,
            chat_max_scroll: 0,
            chat_height: 0,
            follow_chat: true,

            dark_mode: config.dark_mode.unwrap_or(true),
            animation_frame: 0,
            config_path,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        self.controller.session().conversation()
    }

    pub fn category(&self) -> WeatherCategory {
        self.controller.session().category()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_in_flight()
    }

    /// Send the input line; it is only cleared when the submission is accepted.
    pub fn submit_input(&mut self) {
        if self.controller.dispatch(&self.input) {
            self.input.clear();
            self.cursor = 0;
            self.follow_chat = true;
        }
    }

    /// Wait for the outstanding weather request and record its reply
    pub async fn settle_reply(&mut self) {
        if let Some(reply) = self.controller.wait_settled().await {
            info!(message_id = %reply.id, "reply shown");
            self.follow_chat = true;
        }
    }

    pub async fn tick(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;

        if self.health_task.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.health_task.take() {
                self.backend_status = match task.await {
                    Ok(Ok(health)) if health.is_healthy() => BackendStatus::Online,
                    Ok(Ok(health)) => {
                        warn!(status = %health.status, "weather backend reports degraded health");
                        BackendStatus::Degraded
                    }
                    Ok(Err(err)) => {
                        warn!(error = %err, "weather backend health check failed");
                        BackendStatus::Offline
                    }
                    Err(err) => {
                        warn!(error = %err, "health check task failed");
                        BackendStatus::Offline
                    }
                };
            }
        }
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;

        if let Some(path) = &self.config_path {
            if let Err(err) = Config::save_dark_mode(path, self.dark_mode) {
                warn!(error = %err, "could not persist theme");
            }
        }
    }

    // Input editing
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    // Chat scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_chat = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        if self.chat_scroll >= self.chat_max_scroll {
            self.follow_chat = true;
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.follow_chat = false;
        self.chat_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_chat = true;
        self.chat_scroll = self.chat_max_scroll;
    }
}
