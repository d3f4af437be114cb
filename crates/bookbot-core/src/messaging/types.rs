/// Chat action shown to the user while the bot works.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadDocument,
}

/// What pressing an inline button does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    /// Send a callback query with this payload back to the bot.
    Callback(String),
    /// Open a URL.
    Url(String),
    /// Prefill an inline query in a chat of the user's choice.
    SwitchInline(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn switch_inline(label: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::SwitchInline(query.into()),
        }
    }
}

/// Inline keyboard as rows of buttons, adapter-agnostic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn single_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A file uploaded from memory.
#[derive(Clone, Debug)]
pub struct OutgoingDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One result entry for an inline query answer.
#[derive(Clone, Debug)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub html: String,
}
