use burn::{
    nn::{Lstm, LstmConfig, LstmState},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct RecurrentCoreConfig {
    pub d_input: usize,
    pub d_hidden: usize,
}

/// One LSTM with two access paths sharing the same weight store: a
/// single-step transition for live rollout and a full-sequence scan for
/// warming state up from a burn-in sequence.
#[derive(Module, Debug)]
pub struct RecurrentCore<B: Backend> {
    lstm: Lstm<B>,
    d_hidden: usize,
}

impl RecurrentCoreConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> RecurrentCore<B> {
        RecurrentCore {
            lstm: LstmConfig::new(self.d_input, self.d_hidden, true).init(device),
            d_hidden: self.d_hidden,
        }
    }
}

impl<B: Backend> RecurrentCore<B> {
    pub fn zero_state(&self, batch_size: usize, device: &B::Device) -> LstmState<B, 2> {
        LstmState::new(
            Tensor::zeros([batch_size, self.d_hidden], device),
            Tensor::zeros([batch_size, self.d_hidden], device),
        )
    }

    /// Advance exactly one step from the caller's state.
    pub fn step(&self, input: Tensor<B, 2>, state: LstmState<B, 2>) -> (Tensor<B, 2>, LstmState<B, 2>) {
        let (_, state) = self.lstm.forward(input.unsqueeze_dim(1), Some(state));
        (state.hidden.clone(), state)
    }

    /// Scan a `[batch, time, features]` sequence from the zero state and
    /// return the final hidden output alongside the final state.
    pub fn scan(&self, input: Tensor<B, 3>) -> (Tensor<B, 2>, LstmState<B, 2>) {
        let (_, state) = self.lstm.forward(input, None);
        (state.hidden.clone(), state)
    }
}
