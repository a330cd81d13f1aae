use ratatui::widgets::ListState;

use crate::backend::BackendClient;
use crate::catalog::Catalog;
use crate::chat::ConversationStore;
use crate::config::Config;
use crate::selector::CapabilitySelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Blocks,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub input_mode: InputMode,

    // Blocks pane
    pub selector: CapabilitySelector,
    pub blocks_state: ListState,

    // Chat pane
    pub chat: ConversationStore,
    pub message_input: String,
    pub message_cursor: usize, // cursor position in message_input (chars)
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub client: BackendClient,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let selector = CapabilitySelector::new(Catalog::builtin());

        let mut blocks_state = ListState::default();
        if !selector.catalog().is_empty() {
            blocks_state.select(Some(0));
        }

        Self {
            should_quit: false,
            focus: FocusPane::Blocks,
            input_mode: InputMode::Normal,

            selector,
            blocks_state,

            chat: ConversationStore::new(),
            message_input: String::new(),
            message_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            client: BackendClient::new(config.backend_url()),
        }
    }

    // Blocks list navigation
    pub fn blocks_nav_down(&mut self) {
        let len = self.selector.visible().len();
        if len > 0 {
            let i = self.blocks_state.selected().unwrap_or(0);
            self.blocks_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn blocks_nav_up(&mut self) {
        let i = self.blocks_state.selected().unwrap_or(0);
        self.blocks_state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_block_id(&self) -> Option<u32> {
        self.blocks_state
            .selected()
            .and_then(|i| self.selector.visible().get(i).map(|cap| cap.id))
    }

    /// Toggle the highlighted block in or out of the active set.
    pub fn toggle_selected_block(&mut self) {
        if let Some(id) = self.selected_block_id() {
            self.selector.toggle(id);
        }
    }

    // Filter editing (blocks pane)
    pub fn filter_push(&mut self, c: char) {
        let mut filter = self.selector.filter().to_string();
        filter.push(c);
        self.selector.set_filter(filter);
        self.clamp_blocks_selection();
    }

    pub fn filter_pop(&mut self) {
        let mut filter = self.selector.filter().to_string();
        filter.pop();
        self.selector.set_filter(filter);
        self.clamp_blocks_selection();
    }

    pub fn filter_clear(&mut self) {
        self.selector.set_filter(String::new());
        self.clamp_blocks_selection();
    }

    /// Keep the list highlight valid as the filter narrows or widens.
    fn clamp_blocks_selection(&mut self) {
        let len = self.selector.visible().len();
        if len == 0 {
            self.blocks_state.select(None);
        } else {
            let i = self.blocks_state.selected().unwrap_or(0);
            self.blocks_state.select(Some(i.min(len - 1)));
        }
    }

    /// Hand the current input and the active capability list to the store.
    /// The input box only clears when the store accepts the submission.
    pub fn submit_message(&mut self) {
        let accepted = self.chat.submit(
            &self.message_input,
            self.selector.active_internal_names(),
            &self.client,
        );
        if accepted {
            self.message_input.clear();
            self.message_cursor = 0;
            // Each pending phase starts the ellipsis at one dot
            self.animation_frame = 0;
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll chat to bottom so the newest entry (or the thinking
    /// placeholder) is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.chat.messages() {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        // Room for the thinking placeholder
        total_lines += 2;

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }
}
