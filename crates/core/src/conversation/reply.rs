use serde::Serialize;

/// How a transport should present a reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Send as a new message.
    #[default]
    NewMessage,
    /// Replace the text (and options) of the message the selection came from.
    EditPrevious,
    /// Keep the previous message's text and replace only its options.
    EditOptions,
}

/// One selectable option attached to a reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyOption {
    pub label: String,
    /// Opaque token sent back as a selection when the option is chosen.
    pub token: String,
}

impl ReplyOption {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Operator-facing output of one conversation step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub options: Vec<ReplyOption>,
    pub delivery: Delivery,
    /// Render as a monospace block.
    pub preformatted: bool,
}

impl Reply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn edit(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delivery: Delivery::EditPrevious,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: Vec<ReplyOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn preformatted(mut self) -> Self {
        self.preformatted = true;
        self
    }
}

/// Result of feeding one input to a flow.
#[derive(Debug)]
pub(crate) enum Step<F> {
    /// The flow continues in the given state.
    Continue(F, Reply),
    /// The flow has ended and its working state is dropped.
    Finish(Reply),
}
