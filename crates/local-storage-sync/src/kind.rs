/// How an attached element is synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `<input>` and `<textarea>`: a single editable value.
    TextInput,
    /// `<fieldset>`: a group of radio buttons or checkboxes, one of which holds the value.
    ChoiceGroup,
    /// Anything else: the element's text content is the value.
    GenericContainer,
}

impl Kind {
    /// Classifies an element by its tag name, case-insensitively.
    pub fn classify(tag_name: &str) -> Self {
        if tag_name.eq_ignore_ascii_case("fieldset") {
            Self::ChoiceGroup
        } else if tag_name.eq_ignore_ascii_case("input") || tag_name.eq_ignore_ascii_case("textarea") {
            Self::TextInput
        } else {
            Self::GenericContainer
        }
    }

    /// Whether seeding is followed by synthetic `input` and `change` signals.
    pub fn reemits_signals(self) -> bool {
        match self {
            Self::TextInput | Self::ChoiceGroup => true,
            Self::GenericContainer => false,
        }
    }
}
