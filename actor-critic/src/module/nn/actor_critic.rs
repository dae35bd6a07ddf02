use burn::{
    nn::{Linear, LinearConfig, LstmState, Relu},
    prelude::*,
};

use crate::module::component::{Actor, Value};
use crate::module::nn::conv_stack::{ConvLayerSpec, ConvStack, ConvStackConfig};
use crate::module::nn::recurrent::{RecurrentCore, RecurrentCoreConfig};

#[derive(Config, Debug)]
pub struct ActorCriticConfig {
    pub num_actions: usize,
    pub input_channels: usize,
    pub input_height: usize,
    pub input_width: usize,
    pub conv_layers: Vec<ConvLayerSpec>,
    pub dense_layers: Vec<usize>,
    pub lstm_units: usize,
}

/// Convolutional-recurrent actor-critic.
///
/// Observations flow through the conv/pool stack and flatten, one LSTM
/// transition (or a full warmup scan), the hidden dense stack, and finally
/// the two linear heads: policy logits and a scalar value estimate. The
/// recurrent state is owned and threaded by the caller.
#[derive(Module, Debug)]
pub struct ActorCritic<B: Backend> {
    conv: ConvStack<B>,
    recurrent: RecurrentCore<B>,
    dense: Vec<Linear<B>>,
    actor: Linear<B>,
    critic: Linear<B>,
    activation: Relu,
}

impl ActorCriticConfig {
    /// Build the layer stack in configuration order. Hyperparameters are not
    /// validated here; incompatible specs fail inside burn at the first
    /// incompatible tensor op.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCritic<B> {
        let conv_config = ConvStackConfig::new(
            self.input_channels,
            self.input_height,
            self.input_width,
            self.conv_layers.clone(),
        );
        let conv = conv_config.init(device);
        let recurrent = RecurrentCoreConfig::new(conv_config.output_len(), self.lstm_units)
            .init(device);

        let mut dense = Vec::new();
        let mut width = self.lstm_units;
        for &units in &self.dense_layers {
            dense.push(LinearConfig::new(width, units).init(device));
            width = units;
        }

        ActorCritic {
            conv,
            recurrent,
            dense,
            actor: LinearConfig::new(width, self.num_actions).init(device),
            critic: LinearConfig::new(width, 1).init(device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> ActorCritic<B> {
    /// Zero recurrent state of the configured width.
    pub fn init_state(&self, batch_size: usize, device: &B::Device) -> LstmState<B, 2> {
        self.recurrent.zero_state(batch_size, device)
    }

    /// Advance one step: `[batch, channels, height, width]` observation plus
    /// the caller's prior state in, `([batch, num_actions], [batch, 1])`
    /// logits/value plus the updated state out.
    pub fn forward_step(
        &self,
        observation: Tensor<B, 4>,
        state: LstmState<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>, LstmState<B, 2>) {
        let x = self.conv.forward(observation);
        let (x, state) = self.recurrent.step(x, state);
        let (actor, critic) = self.forward_heads(x);
        (actor, critic, state)
    }

    /// Warm recurrent state up from a burn-in sequence. The input is a
    /// `[time, channels, height, width]` stack of frames treated as a single
    /// batch-of-one sequence; heads are applied to the final hidden output
    /// and the final state seeds subsequent `forward_step` calls.
    pub fn forward_warmup(
        &self,
        observations: Tensor<B, 4>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>, LstmState<B, 2>) {
        let [time, _, _, _] = observations.dims();
        let features = self.conv.forward(observations);
        let [_, width] = features.dims();
        let (x, state) = self.recurrent.scan(features.reshape([1, time, width]));
        let (actor, critic) = self.forward_heads(x);
        (actor, critic, state)
    }

    fn forward_heads(&self, input: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let mut x = input;
        for dense in &self.dense {
            x = self.activation.forward(dense.forward(x));
        }
        let actor = self.actor.forward(x.clone());
        let critic = self.critic.forward(x);
        (actor, critic)
    }
}

impl<B: Backend> Actor<B> for ActorCritic<B> {
    type OBatch = Tensor<B, 4>;
    type State = LstmState<B, 2>;

    fn logits(
        &self,
        observations: Self::OBatch,
        state: Self::State,
    ) -> (Tensor<B, 2>, Self::State) {
        let (actor, _, state) = self.forward_step(observations, state);
        (actor, state)
    }
}

impl<B: Backend> Value<B> for ActorCritic<B> {
    type OBatch = Tensor<B, 4>;
    type State = LstmState<B, 2>;

    fn v_batch(
        &self,
        observations: Self::OBatch,
        state: Self::State,
    ) -> (Tensor<B, 2>, Self::State) {
        let (_, critic, state) = self.forward_step(observations, state);
        (critic, state)
    }
}
