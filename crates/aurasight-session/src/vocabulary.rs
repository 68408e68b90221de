//! Voice command vocabulary.
//!
//! An utterance matches a binding when the binding's phrase occurs anywhere
//! in the lower-cased utterance. Bindings are tried in order and the first
//! hit wins, so a phrase that contains another ("restart" contains
//! "start") must come before it.

use aurasight_core::{CommandBinding, Operation};

/// Ordered phrase → operation table used by the command listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    bindings: Vec<CommandBinding>,
}

impl Vocabulary {
    /// Build a vocabulary from `bindings`, keeping their order.
    ///
    /// Phrases are trimmed and lower-cased; blank phrases are dropped.
    pub fn new(bindings: impl IntoIterator<Item = CommandBinding>) -> Self {
        let bindings = bindings
            .into_iter()
            .filter_map(|b| {
                let phrase = b.phrase.trim().to_lowercase();
                (!phrase.is_empty()).then(|| CommandBinding::new(phrase, b.operation))
            })
            .collect();
        Self { bindings }
    }

    /// The default command set.
    pub fn builtin() -> Self {
        Self::new([
            CommandBinding::new("restart", Operation::Reset),
            CommandBinding::new("start", Operation::Start),
            CommandBinding::new("stop", Operation::Stop),
            CommandBinding::new("follow up", Operation::Followup),
            CommandBinding::new("clear history", Operation::ClearHistory),
            CommandBinding::new("ok", Operation::Off),
            CommandBinding::new("off", Operation::Off),
        ])
    }

    /// Use `bindings` when configured, otherwise the built-in set.
    pub fn from_settings(bindings: Option<&[CommandBinding]>) -> Self {
        bindings.map_or_else(Self::builtin, |b| Self::new(b.iter().cloned()))
    }

    /// First binding whose phrase occurs in `utterance`.
    pub fn match_utterance(&self, utterance: &str) -> Option<&CommandBinding> {
        let text = utterance.to_lowercase();
        self.bindings
            .iter()
            .find(|binding| text.contains(binding.phrase.as_str()))
    }

    pub fn bindings(&self) -> &[CommandBinding] {
        &self.bindings
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(vocabulary: &Vocabulary, text: &str) -> Option<Operation> {
        vocabulary.match_utterance(text).map(|b| b.operation)
    }

    #[test]
    fn test_substring_match() {
        let vocabulary = Vocabulary::builtin();
        assert_eq!(op(&vocabulary, "please stop now"), Some(Operation::Stop));
        assert_eq!(op(&vocabulary, "Start"), Some(Operation::Start));
        assert_eq!(
            op(&vocabulary, "could you follow up on that"),
            Some(Operation::Followup)
        );
        assert_eq!(
            op(&vocabulary, "CLEAR HISTORY"),
            Some(Operation::ClearHistory)
        );
    }

    #[test]
    fn test_restart_wins_over_start() {
        assert_eq!(
            op(&Vocabulary::builtin(), "restart please"),
            Some(Operation::Reset)
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Both "start" and "stop" occur; "start" is listed first.
        assert_eq!(
            op(&Vocabulary::builtin(), "stop and start"),
            Some(Operation::Start)
        );
    }

    #[test]
    fn test_ok_and_off_switch_off() {
        let vocabulary = Vocabulary::builtin();
        assert_eq!(op(&vocabulary, "ok"), Some(Operation::Off));
        assert_eq!(op(&vocabulary, "turn off"), Some(Operation::Off));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(op(&Vocabulary::builtin(), "what time is it"), None);
    }

    #[test]
    fn test_custom_vocabulary_normalized() {
        let vocabulary = Vocabulary::new([
            CommandBinding::new(" Look ", Operation::Start),
            CommandBinding::new("   ", Operation::Stop),
        ]);
        assert_eq!(vocabulary.bindings().len(), 1);
        assert_eq!(op(&vocabulary, "LOOK at this"), Some(Operation::Start));
        assert_eq!(op(&vocabulary, "start"), None);
    }

    #[test]
    fn test_from_settings_defaults_to_builtin() {
        assert_eq!(Vocabulary::from_settings(None), Vocabulary::builtin());
    }
}
