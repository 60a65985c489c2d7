/// A completion request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Sequences at which the model should stop generating.
    ///
    /// Providers that can't honor stop sequences may ignore them, the
    /// caller must tolerate text beyond a stop sequence.
    pub stop: Vec<String>,
}

impl ModelRequest {
    /// Creates a request with the given prompt and no stop sequences.
    #[inline]
    pub fn with_prompt<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            stop: vec![],
        }
    }

    /// Adds a stop sequence.
    #[inline]
    pub fn with_stop<S: Into<String>>(mut self, stop: S) -> Self {
        self.stop.push(stop.into());
        self
    }
}
