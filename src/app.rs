use carreira_core::{
    ClientInitError, Conversation, KeySource, PendingTurn, TurnController, TurnFailure,
    TurnResult,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Transcript,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// Diagnostic shown once at startup when the client could not be built.
#[derive(Debug, Clone)]
pub struct StartupNotice {
    pub level: NoticeLevel,
    pub text: String,
}

impl StartupNotice {
    fn from_init_error(err: &ClientInitError) -> Self {
        let level = if err.is_configuration() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Error
        };
        Self {
            level,
            text: err.to_string(),
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Session transcript and the controller that grows it
    pub conversation: Conversation,
    pub controller: TurnController,
    pub turn_task: Option<JoinHandle<TurnResult>>,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript viewport
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Chrome
    pub show_sidebar: bool,
    pub notice: Option<StartupNotice>,
    pub key_source: Option<KeySource>,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub input_area: Option<Rect>,
}

impl App {
    pub fn new(controller: TurnController, key_source: Option<KeySource>) -> Self {
        let notice = controller
            .startup_diagnostic()
            .map(StartupNotice::from_init_error);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            conversation: Conversation::new(),
            controller,
            turn_task: None,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            show_sidebar: true,
            notice,
            key_source,
            animation_frame: 0,

            chat_area: None,
            input_area: None,
        }
    }

    /// A turn is in flight; new input is refused until it lands.
    pub fn is_loading(&self) -> bool {
        self.turn_task.is_some()
    }

    /// Sends the input box as a new turn.
    pub fn submit_input(&mut self) {
        if self.is_loading() || self.input.trim().is_empty() {
            return;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;

        match self.controller.begin(&mut self.conversation, &text) {
            Ok(PendingTurn::Unavailable) => {
                self.controller
                    .finish(&mut self.conversation, Err(TurnFailure::Unavailable));
            }
            Ok(pending) => {
                let controller = self.controller.clone();
                self.turn_task = Some(tokio::spawn(async move {
                    controller.complete(pending).await
                }));
            }
            Err(e) => warn!("input rejected: {}", e),
        }

        // Scroll to bottom so "pensando..." is visible
        self.scroll_chat_to_bottom();
    }

    /// Records the reply of the in-flight turn once its task is done.
    pub async fn poll_turn(&mut self) {
        let finished = self
            .turn_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.turn_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("turn task failed: {}", e);
                    Err(TurnFailure::Interrupted)
                }
            };
            self.controller.finish(&mut self.conversation, result);
            self.animation_frame = 0;
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_add(half);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_sub(half);
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Total rendered rows of the transcript at the current chat width.
    pub fn transcript_lines(&self) -> u16 {
        // Default to 50 columns before the first render
        let width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let rows = crate::ui::transcript_paragraph(self).line_count(width);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = self.transcript_lines().saturating_sub(visible_height);
    }

    pub fn toggle_sidebar(&mut self) {
        self.show_sidebar = !self.show_sidebar;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(task) = self.turn_task.take() {
            task.abort();
        }
    }
}
